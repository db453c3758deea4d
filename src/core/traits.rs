use crate::application::state::PlayerView;
use crate::core::error::{AcquisitionError, OpenError};
use crate::core::events::{MediaSignal, UiEvent};
use crate::core::models::PersistedLibrary;
use crate::modules::acquisition::AcquisitionProgress;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

/// Abstraction for the audio playback collaborator.
///
/// A backend holds at most one loaded resource. Signals are not delivered by
/// callback; the control thread collects them through [`poll_signals`].
/// Audio output handles are not `Send` on every platform, so neither is this.
///
/// [`poll_signals`]: MediaBackend::poll_signals
pub trait MediaBackend {
    /// Load a resource, replacing whatever was loaded
    fn open(&mut self, locator: &Path) -> Result<(), OpenError>;

    fn play(&mut self);

    fn pause(&mut self);

    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Release the loaded resource
    fn dispose(&mut self);

    /// Set volume (0.0 - 1.0)
    fn set_volume(&mut self, volume: f32);

    /// Drain signals produced since the last call
    fn poll_signals(&mut self) -> Vec<MediaSignal>;
}

/// Abstraction for persistent storage
pub trait StorageBackend: Send {
    /// Load the library
    fn load(&self) -> Result<PersistedLibrary>;

    /// Save the library
    fn save(&self, library: &PersistedLibrary) -> Result<()>;
}

/// Turns a remote URL into a locally playable resource.
///
/// Runs on a worker thread. Implementations should check `cancel` between
/// steps and report progress as they go.
pub trait Acquirer: Send + Sync {
    fn acquire(
        &self,
        url: &str,
        cancel: &AtomicBool,
        progress: &mut dyn FnMut(AcquisitionProgress),
    ) -> Result<PathBuf, AcquisitionError>;
}

/// Abstraction for UI rendering
pub trait UiRenderer: Send {
    /// Initialize the UI (setup terminal, etc.)
    fn init(&mut self) -> Result<()>;

    /// Cleanup the UI (restore terminal, etc.)
    fn cleanup(&mut self) -> Result<()>;

    /// Render current state
    fn render(&mut self, view: &PlayerView) -> Result<()>;

    /// Poll for user input (non-blocking)
    fn poll_input(&mut self) -> Result<Vec<UiEvent>>;
}

/// Yes/no question to the user.
pub trait Prompt {
    fn confirm(&mut self, question: &str) -> Result<bool>;
}
