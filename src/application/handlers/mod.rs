pub mod library_handler;
pub mod playback_handler;
pub mod ui_handler;

use crate::core::error::{OpenError, PlaybackError};
use crate::core::events::{AppEvent, EventSender, PlaySource, UiEvent};
use crate::core::models::TrackRef;
use crate::core::traits::Acquirer;
use crate::modules::acquisition::{AcquisitionContext, AcquisitionRegistry, spawn_acquisition};
use crate::modules::library::LibraryStore;
use crate::modules::playback::Sequencer;
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

/// All dependencies that event handlers need to do their work.
///
/// Passed by `&mut` into each handler method, giving handlers access to
/// the control thread's state without coupling them to `Application`.
pub struct HandlerContext<'a> {
    pub event_tx: &'a EventSender,
    pub store: &'a mut LibraryStore,
    pub sequencer: &'a mut Sequencer,
    pub acquisitions: &'a mut AcquisitionRegistry,
    pub acquirer: &'a Arc<dyn Acquirer>,
}

impl HandlerContext<'_> {
    pub fn notify(&self, message: impl Into<String>) -> Result<()> {
        self.event_tx.send(AppEvent::Ui(UiEvent::ShowMessage {
            message: message.into(),
        }))?;
        Ok(())
    }

    pub fn report_error(&self, message: impl Into<String>) -> Result<()> {
        self.event_tx.send(AppEvent::Ui(UiEvent::ShowError {
            message: message.into(),
        }))?;
        Ok(())
    }

    /// Surface the outcome of a sequencer transition.
    ///
    /// A remote track without a downloaded file is fetched again for the
    /// current queue; every other error becomes a message.
    pub fn report_playback(&mut self, result: Result<(), PlaybackError>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(PlaybackError::Open(OpenError::Unresolved(url))) => self.reacquire_current(&url),
            Err(e) => {
                warn!("playback: {e}");
                self.report_error(e.to_string())
            }
        }
    }

    /// Register an acquisition and start its worker.
    pub fn start_acquisition(
        &mut self,
        url: &str,
        context: AcquisitionContext,
        play: bool,
    ) -> Result<()> {
        let (ticket, cancel) = self.acquisitions.register(url, context, play);
        match spawn_acquisition(
            Arc::clone(self.acquirer),
            ticket,
            url.to_string(),
            cancel,
            self.event_tx.clone(),
        ) {
            Ok(_) => Ok(()),
            Err(e) => {
                self.acquisitions.dismiss(ticket);
                self.report_error(format!("Could not start download: {e}"))
            }
        }
    }

    /// Start playing `source` from `index`.
    pub fn play_list(&mut self, source: &PlaySource, index: usize) -> Result<()> {
        let result = match source {
            PlaySource::Library => self.sequencer.start(self.store.tracks(), index),
            PlaySource::Playlist(name) => match self.store.playlist(name) {
                Some(list) => self.sequencer.start(list, index),
                None => {
                    return self.report_error(format!("Playlist not found: {name}"));
                }
            },
        };
        self.report_playback(result)
    }

    fn reacquire_current(&mut self, url: &str) -> Result<()> {
        let generation = self.sequencer.queue_generation();
        let identity = match self.sequencer.current_track() {
            Some(track) if track.identity() == url => track.clone(),
            _ => TrackRef::remote(url),
        };

        if self.acquisitions.is_requeue_pending(generation, &identity) {
            return Ok(());
        }
        info!(%url, generation, "re-acquiring remote track");
        self.notify(format!("Downloading {} again...", identity.display_name()))?;
        self.start_acquisition(
            url,
            AcquisitionContext::Queue {
                generation,
                identity,
            },
            false,
        )
    }
}
