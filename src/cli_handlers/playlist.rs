use crate::cli::PlaylistAction;
use crate::cli_handlers::{CliCommand, Environment, parse_entry};
use crate::core::error::LibraryError;
use crate::core::traits::Prompt;
use crate::modules::library::LibraryStore;
use crate::modules::library::scanner::collect_tracks;
use crate::modules::ui::terminal::{StdinPrompt, TerminalRenderer};
use anyhow::Result;

pub struct PlaylistCommand {
    pub action: PlaylistAction,
}

/// What a playlist action produced.
#[derive(Debug, PartialEq)]
enum Outcome {
    Done(String),
    Cancelled,
    Listing,
}

impl PlaylistCommand {
    fn apply(
        &self,
        store: &mut LibraryStore,
        prompt: &mut dyn Prompt,
        ui: &TerminalRenderer,
    ) -> Result<Outcome> {
        let outcome = match &self.action {
            PlaylistAction::Create { name } => {
                store.create_playlist(name)?;
                Outcome::Done(format!("Created playlist '{name}'"))
            }

            PlaylistAction::Delete { name, yes } => {
                let Some(tracks) = store.playlist(name) else {
                    return Err(LibraryError::playlist_not_found(name).into());
                };
                let question = format!("Delete playlist '{name}' ({} tracks)?", tracks.len());
                if !*yes && !prompt.confirm(&question)? {
                    return Ok(Outcome::Cancelled);
                }
                store.delete_playlist(name)?;
                Outcome::Done(format!("Deleted playlist '{name}'"))
            }

            PlaylistAction::Add { name, paths } => {
                let tracks = collect_tracks(paths)?;
                let found = tracks.len();
                let added = store.add_tracks_to_playlist(name, tracks)?;
                Outcome::Done(format!("Added {added} of {found} tracks to '{name}'"))
            }

            PlaylistAction::Remove { name, entry } => {
                let selector = parse_entry(entry)?;
                let removed = store.remove_track_from_playlist(name, &selector)?;
                Outcome::Done(format!("Removed {} from '{name}'", removed.display_name()))
            }

            PlaylistAction::List { name: Some(name) } => {
                let tracks = store
                    .playlist(name)
                    .ok_or_else(|| LibraryError::playlist_not_found(name))?;
                if tracks.is_empty() {
                    ui.print_message(&format!("Playlist '{name}' is empty"));
                } else {
                    ui.print_track_list(tracks);
                }
                Outcome::Listing
            }

            PlaylistAction::List { name: None } => {
                let names: Vec<&str> = store.playlist_names().collect();
                if names.is_empty() {
                    ui.print_message("No playlists yet");
                }
                for name in names {
                    let count = store.playlist(name).map_or(0, <[_]>::len);
                    ui.print_message(&format!("{name} ({count} tracks)"));
                }
                Outcome::Listing
            }
        };
        Ok(outcome)
    }
}

impl CliCommand for PlaylistCommand {
    fn execute(self: Box<Self>, env: &Environment) -> Result<()> {
        let mut store = env.open_store();
        let ui = env.renderer();

        match self.apply(&mut store, &mut StdinPrompt, &ui)? {
            Outcome::Done(message) => ui.print_message(&format!("✓ {message}")),
            Outcome::Cancelled => ui.print_message("Cancelled"),
            Outcome::Listing => {}
        }
        Ok(())
    }
}
