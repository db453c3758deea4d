use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by library and playlist operations.
///
/// All of them leave the store unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LibraryError {
    /// Playlist name is empty or whitespace-only
    #[error("Invalid playlist name: '{0}'")]
    InvalidName(String),

    /// A playlist with this name already exists
    #[error("Playlist already exists: '{0}'")]
    DuplicateName(String),

    /// Referenced playlist or track does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },
}

impl LibraryError {
    pub fn playlist_not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Playlist",
            id: name.into(),
        }
    }

    pub fn track_not_found(id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Track",
            id: id.into(),
        }
    }
}

/// The media collaborator could not open a resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    #[error("File not found: {}", .0.display())]
    Missing(PathBuf),

    /// Remote track has no local resource yet
    #[error("URL has not been downloaded yet: {0}")]
    Unresolved(String),

    #[error("Cannot play {}: {reason}", path.display())]
    Unsupported { path: PathBuf, reason: String },

    /// No audio output could be opened
    #[error("Audio output unavailable: {0}")]
    Device(String),
}

/// Sequencer-level errors. Every variant is recoverable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    #[error(transparent)]
    Open(#[from] OpenError),

    /// Reported by the media collaborator while playing
    #[error("Playback error: {0}")]
    Media(String),

    #[error("Track index {index} is out of range for a list of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Download or conversion of a remote URL failed.
#[derive(Error, Debug)]
pub enum AcquisitionError {
    #[error("Failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with {status}: {detail}")]
    Failed {
        tool: String,
        status: String,
        detail: String,
    },

    #[error("{tool} produced no output at {}", path.display())]
    EmptyOutput { tool: String, path: PathBuf },

    #[error("Acquisition cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
