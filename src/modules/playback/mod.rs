pub mod media_session;
pub mod playback_progress;
pub mod rodio_backend;
pub mod sequencer;
pub mod shuffle_manager;

pub use media_session::{MediaSession, SessionId};
pub use sequencer::{PlaybackState, Sequencer};
