use crate::cli_handlers::{CliCommand, Environment, PlayerOptions, run_player};
use crate::core::error::LibraryError;
use crate::core::events::{PlaySource, UiEvent};
use crate::core::models::RepeatMode;
use crate::modules::library::LibraryStore;
use crate::utils::APP_NAME;
use anyhow::{Result, bail};

pub struct PlayCommand {
    pub playlist: Option<String>,
    /// 1-based
    pub start: usize,
    pub shuffle: bool,
    pub repeat: RepeatMode,
}

impl PlayCommand {
    /// Pick the list to play and the 0-based start index.
    fn plan(&self, store: &LibraryStore) -> Result<(PlaySource, usize)> {
        let (source, len) = match &self.playlist {
            Some(name) => {
                let list = store
                    .playlist(name)
                    .ok_or_else(|| LibraryError::playlist_not_found(name))?;
                (PlaySource::Playlist(name.clone()), list.len())
            }
            None => (PlaySource::Library, store.tracks().len()),
        };

        if len == 0 {
            match &self.playlist {
                Some(name) => bail!("Playlist '{name}' is empty. Run '{APP_NAME} playlist add {name} <PATH>' first."),
                None => bail!("Library is empty. Run '{APP_NAME} add <PATH>' first."),
            }
        }
        if self.start == 0 || self.start > len {
            bail!("Start must be between 1 and {len}");
        }
        Ok((source, self.start - 1))
    }
}

impl CliCommand for PlayCommand {
    fn execute(self: Box<Self>, env: &Environment) -> Result<()> {
        let store = env.open_store();
        let (source, start_index) = self.plan(&store)?;

        env.renderer()
            .print_message(&format!("Queueing from track {}...\n", start_index + 1));

        run_player(
            env,
            store,
            PlayerOptions {
                shuffle: self.shuffle,
                repeat: self.repeat,
            },
            UiEvent::PlayListRequested {
                source,
                start_index,
            },
            false,
        )?;
        Ok(())
    }
}
