use crate::cli_handlers::{CliCommand, Environment, PlayerOptions, run_player};
use crate::core::error::LibraryError;
use crate::core::events::UiEvent;
use crate::modules::library::LibraryStore;
use anyhow::{Result, bail};

pub struct UrlCommand {
    pub url: String,
    pub playlist: Option<String>,
    pub play: bool,
}

impl UrlCommand {
    fn request(&self, store: &LibraryStore) -> Result<UiEvent> {
        let url = self.url.trim();
        if url.is_empty() {
            bail!("URL is empty");
        }
        if let Some(name) = &self.playlist {
            if store.playlist(name).is_none() {
                return Err(LibraryError::playlist_not_found(name).into());
            }
        }

        Ok(UiEvent::AcquireRequested {
            url: url.to_string(),
            playlist: self.playlist.clone(),
            play: self.play,
        })
    }
}

impl CliCommand for UrlCommand {
    fn execute(self: Box<Self>, env: &Environment) -> Result<()> {
        let store = env.open_store();
        let request = self.request(&store)?;
        let ui = env.renderer();

        ui.print_message(&format!("Downloading {}...", self.url.trim()));

        // Without --play the loop ends when the download does.
        let app = run_player(env, store, PlayerOptions::default(), request, !self.play)?;

        if let Some(error) = &app.view().error_message {
            bail!("{error}");
        }
        if !self.play {
            ui.print_message(&format!("✓ {}", app.view().status_message));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::library::store::testing::empty_store;

    fn command(url: &str, playlist: Option<&str>) -> UrlCommand {
        UrlCommand {
            url: url.to_string(),
            playlist: playlist.map(str::to_string),
            play: false,
        }
    }

    #[test]
    fn request_is_trimmed() {
        let (store, _) = empty_store();
        let request = command("  https://youtu.be/x ", None).request(&store).unwrap();
        assert!(matches!(
            request,
            UiEvent::AcquireRequested { ref url, playlist: None, play: false } if url == "https://youtu.be/x"
        ));
    }

    #[test]
    fn blank_url_or_missing_playlist_is_rejected() {
        let (mut store, _) = empty_store();
        assert!(command("   ", None).request(&store).is_err());
        assert!(command("https://youtu.be/x", Some("Gym")).request(&store).is_err());

        store.create_playlist("Gym").unwrap();
        assert!(command("https://youtu.be/x", Some("Gym")).request(&store).is_ok());
    }
}
