use crate::core::models::TrackTags;
use crate::modules::acquisition::{AcquisitionProgress, AcquisitionTicket};
use crate::modules::playback::media_session::SessionId;
use std::path::PathBuf;
use std::time::Duration;

/// All events that can occur in the application.
///
/// Every event is handled on the control thread; other threads only send.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Signal from the media collaborator, tagged with the session it belongs to
    Media {
        session: SessionId,
        signal: MediaSignal,
    },

    // Acquisition worker messages
    Acquisition(AcquisitionEvent),

    // User intent
    Ui(UiEvent),

    // Application lifecycle
    Shutdown,
}

/// Asynchronous notifications from a media backend.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSignal {
    /// Resource is loaded and can start
    Ready {
        duration: Option<Duration>,
        tags: TrackTags,
    },

    /// Playback position moved (backend cadence)
    PositionChanged { position: Duration },

    /// Reached the end of the resource
    EndOfMedia,

    /// Backend failed while playing
    Error { message: String },
}

#[derive(Debug, Clone)]
pub enum AcquisitionEvent {
    Progress {
        ticket: AcquisitionTicket,
        progress: AcquisitionProgress,
    },

    Completed {
        ticket: AcquisitionTicket,
        url: String,
        location: PathBuf,
    },

    Failed {
        ticket: AcquisitionTicket,
        url: String,
        message: String,
    },
}

/// Which list a "play this list" request refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaySource {
    Library,
    Playlist(String),
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Start playing a list from the given index
    PlayListRequested { source: PlaySource, start_index: usize },

    /// User requested pause/resume toggle
    TogglePauseRequested,

    /// User requested next track
    NextTrackRequested,

    /// User requested previous track
    PreviousTrackRequested,

    ShuffleToggleRequested,

    RepeatCycleRequested,

    /// Absolute seek
    SeekRequested { position: Duration },

    /// Seek relative to the displayed position, in seconds
    SeekByRequested { offset_secs: i64 },

    /// Change the volume by `delta` (fraction of full scale)
    VolumeByRequested { delta: f32 },

    /// Download a remote URL into the library or a playlist
    AcquireRequested {
        url: String,
        playlist: Option<String>,
        play: bool,
    },

    /// User closed the progress view of an acquisition
    AcquisitionDismissed,

    /// Remove the now-playing track from the library
    RemoveCurrentRequested,

    /// Display message to user
    ShowMessage { message: String },

    /// Display error to user
    ShowError { message: String },

    /// User requested quit
    QuitRequested,
}

/// Type alias for event sender
pub type EventSender = crossbeam_channel::Sender<AppEvent>;

/// Type alias for event receiver
pub type EventReceiver = crossbeam_channel::Receiver<AppEvent>;
