use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::models::RepeatMode;
use crate::utils::APP_NAME;

#[derive(Parser, Debug)]
#[command(name = APP_NAME, version)]
#[command(about = "Music player with playlists, shuffle/repeat and YouTube audio downloads", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add audio files or folders to the library or a playlist
    Add {
        /// Files or directories (scanned recursively)
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Add to this playlist instead of the library
        #[arg(long, short)]
        playlist: Option<String>,
    },

    /// Remove a track from the library
    Remove {
        /// 1-based index from `list`, a file path or a URL
        entry: String,
    },

    /// List the library
    List,

    /// Manage playlists
    Playlist {
        #[command(subcommand)]
        action: PlaylistAction,
    },

    /// Start the interactive player
    Play {
        /// Play this playlist instead of the library
        #[arg(long, short)]
        playlist: Option<String>,

        /// 1-based track number to start from
        #[arg(long, default_value_t = 1)]
        start: usize,

        #[arg(long)]
        shuffle: bool,

        #[arg(long, value_enum, default_value_t = RepeatMode::Off)]
        repeat: RepeatMode,
    },

    /// Download the audio of a URL into the library or a playlist
    Url {
        url: String,

        #[arg(long, short)]
        playlist: Option<String>,

        /// Start playing the track once it is downloaded
        #[arg(long)]
        play: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum PlaylistAction {
    /// Create an empty playlist
    Create { name: String },

    /// Delete a playlist
    Delete {
        name: String,

        /// Do not ask for confirmation
        #[arg(long, short)]
        yes: bool,
    },

    /// Add files or folders to a playlist
    Add {
        name: String,

        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Remove a track from a playlist
    Remove {
        name: String,

        /// 1-based index, a file path or a URL
        entry: String,
    },

    /// List playlists, or the tracks of one playlist
    List { name: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definitions_are_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn play_defaults() {
        let cli = Cli::try_parse_from([APP_NAME, "play"]).unwrap();
        match cli.command {
            Commands::Play {
                playlist,
                start,
                shuffle,
                repeat,
            } => {
                assert_eq!(playlist, None);
                assert_eq!(start, 1);
                assert!(!shuffle);
                assert_eq!(repeat, RepeatMode::Off);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn play_with_options() {
        let cli = Cli::try_parse_from([
            APP_NAME, "play", "--playlist", "Gym", "--start", "3", "--shuffle", "--repeat", "one",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Play { ref playlist, start: 3, shuffle: true, repeat: RepeatMode::One }
                if playlist.as_deref() == Some("Gym")
        ));
    }

    #[test]
    fn playlist_subcommands() {
        let cli = Cli::try_parse_from([APP_NAME, "playlist", "delete", "Gym", "--yes"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Playlist { action: PlaylistAction::Delete { ref name, yes: true } } if name == "Gym"
        ));

        let cli = Cli::try_parse_from([APP_NAME, "playlist", "list"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Playlist { action: PlaylistAction::List { name: None } }
        ));
    }

    #[test]
    fn add_requires_a_path() {
        assert!(Cli::try_parse_from([APP_NAME, "add"]).is_err());
    }
}
