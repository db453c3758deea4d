use crate::core::error::OpenError;
use crate::core::events::MediaSignal;
use crate::core::models::TrackTags;
use crate::core::traits::MediaBackend;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Identifies one opened media session. Signals from a disposed session
/// carry an id that no longer matches and are dropped by the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct ActiveSession {
    id: SessionId,
    duration: Option<Duration>,
    position: Duration,
    tags: TrackTags,
}

/// The single "now playing" handle over a [`MediaBackend`].
///
/// Opening always disposes the previous session first, so at most one is
/// active at a time.
pub struct MediaSession {
    backend: Box<dyn MediaBackend>,
    active: Option<ActiveSession>,
    next_id: u64,
    volume: f32,
}

impl MediaSession {
    pub fn new(backend: Box<dyn MediaBackend>) -> Self {
        Self {
            backend,
            active: None,
            next_id: 1,
            volume: 1.0,
        }
    }

    pub fn open(&mut self, locator: &Path) -> Result<SessionId, OpenError> {
        self.dispose();

        self.backend.open(locator)?;
        let id = SessionId(self.next_id);
        self.next_id += 1;
        self.active = Some(ActiveSession {
            id,
            duration: None,
            position: Duration::ZERO,
            tags: TrackTags::default(),
        });
        debug!(session = %id, locator = %locator.display(), "media session opened");
        Ok(id)
    }

    pub fn play(&mut self) {
        if self.active.is_some() {
            self.backend.play();
        }
    }

    pub fn pause(&mut self) {
        if self.active.is_some() {
            self.backend.pause();
        }
    }

    /// Seek within the active session. Ignored when nothing is open.
    pub fn seek(&mut self, position: Duration) {
        let Some(active) = self.active.as_mut() else {
            return;
        };

        let target = match active.duration {
            Some(total) => position.min(total),
            None => position,
        };
        match self.backend.seek(target) {
            Ok(()) => active.position = target,
            Err(e) => warn!(session = %active.id, "seek failed: {e:#}"),
        }
    }

    pub fn dispose(&mut self) {
        if let Some(active) = self.active.take() {
            self.backend.dispose();
            debug!(session = %active.id, "media session disposed");
        }
    }

    /// Applies to the active session and every later one.
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.backend.set_volume(self.volume);
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn active_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|a| a.id)
    }

    pub fn is_active(&self, id: SessionId) -> bool {
        self.active_id() == Some(id)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.active.as_ref().and_then(|a| a.duration)
    }

    pub fn position(&self) -> Duration {
        self.active.as_ref().map(|a| a.position).unwrap_or(Duration::ZERO)
    }

    /// Tags reported by the backend once the active session is ready.
    pub fn tags(&self) -> Option<&TrackTags> {
        self.active.as_ref().map(|a| &a.tags)
    }

    /// Record timing information carried by a signal of the active session.
    pub(crate) fn record(&mut self, signal: &MediaSignal) {
        let Some(active) = self.active.as_mut() else {
            return;
        };
        match signal {
            MediaSignal::Ready { duration, tags } => {
                active.duration = *duration;
                active.tags = tags.clone();
            }
            MediaSignal::PositionChanged { position } => active.position = *position,
            MediaSignal::EndOfMedia | MediaSignal::Error { .. } => {}
        }
    }

    /// Collect backend signals, tagged with the active session id.
    /// Nothing is returned while no session is open.
    pub fn poll(&mut self) -> Vec<(SessionId, MediaSignal)> {
        let signals = self.backend.poll_signals();
        match self.active_id() {
            Some(id) => signals.into_iter().map(|s| (id, s)).collect(),
            None => Vec::new(),
        }
    }
}

impl Drop for MediaSession {
    fn drop(&mut self) {
        self.dispose();
    }
}
