use crate::cli_handlers::{CliCommand, Environment, parse_entry};
use crate::modules::library::LibraryStore;
use crate::modules::library::scanner::collect_tracks;
use crate::utils::APP_NAME;
use anyhow::Result;
use std::path::PathBuf;

// ── Add ───────────────────────────────────────────────────────────────────────
pub struct AddCommand {
    pub paths: Vec<PathBuf>,
    pub playlist: Option<String>,
}

impl AddCommand {
    fn apply(&self, store: &mut LibraryStore) -> Result<String> {
        let tracks = collect_tracks(&self.paths)?;
        let found = tracks.len();

        let message = match &self.playlist {
            Some(name) => {
                let added = store.add_tracks_to_playlist(name, tracks)?;
                format!("Added {added} of {found} tracks to '{name}'")
            }
            None => {
                let added = store.add_tracks(tracks);
                format!("Added {added} of {found} tracks to the library")
            }
        };
        Ok(message)
    }
}

impl CliCommand for AddCommand {
    fn execute(self: Box<Self>, env: &Environment) -> Result<()> {
        let mut store = env.open_store();
        let message = self.apply(&mut store)?;
        env.renderer().print_message(&format!("✓ {message}"));
        Ok(())
    }
}

// ── Remove ────────────────────────────────────────────────────────────────────
pub struct RemoveCommand {
    pub entry: String,
}

impl RemoveCommand {
    fn apply(&self, store: &mut LibraryStore) -> Result<String> {
        let selector = parse_entry(&self.entry)?;
        let removed = store.remove_track(&selector)?;
        Ok(format!("Removed {}", removed.display_name()))
    }
}

impl CliCommand for RemoveCommand {
    fn execute(self: Box<Self>, env: &Environment) -> Result<()> {
        let mut store = env.open_store();
        let message = self.apply(&mut store)?;
        env.renderer().print_message(&format!("✓ {message}"));
        Ok(())
    }
}

// ── List ──────────────────────────────────────────────────────────────────────
pub struct ListCommand;

impl CliCommand for ListCommand {
    fn execute(self: Box<Self>, env: &Environment) -> Result<()> {
        let store = env.open_store();
        let ui = env.renderer();

        if store.tracks().is_empty() {
            ui.print_error(&format!("Library is empty. Run '{} add <PATH>' first.", APP_NAME));
            return Ok(());
        }

        ui.print_track_list(store.tracks());
        Ok(())
    }
}
