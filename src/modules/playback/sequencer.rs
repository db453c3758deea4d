//! Playback sequencing: the play queue, the current position, shuffle and
//! repeat, and the decision of what plays next.
//!
//! The sequencer owns the [`MediaSession`] it drives. All of its methods are
//! called from the control thread only.

use crate::core::error::PlaybackError;
use crate::core::events::MediaSignal;
use crate::core::models::{RepeatMode, TrackRef};
use crate::modules::playback::media_session::{MediaSession, SessionId};
use crate::modules::playback::shuffle_manager::ShuffleManager;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded. The queue, if any, is only the last known list.
    Idle,
    /// Queue set and a track selected, waiting for the session to be ready
    /// (or for a retry after a failed open)
    Ready,
    Playing,
    Paused,
}

/// Describes what `execute_nav` should do after navigation logic resolves.
enum NavTarget {
    /// Move to a different track at this index.
    Go(usize),
    /// Replay the current track from the beginning.
    Restart,
    /// Queue exhausted: stop and go idle.
    Stop,
}

pub struct Sequencer {
    queue: Vec<TrackRef>,
    queue_generation: u64,
    current_index: Option<usize>,
    shuffle: ShuffleManager,
    repeat: RepeatMode,
    state: PlaybackState,
    session: MediaSession,
}

impl Sequencer {
    pub fn new(session: MediaSession) -> Self {
        Self {
            queue: Vec::new(),
            queue_generation: 0,
            current_index: None,
            shuffle: ShuffleManager::new(),
            repeat: RepeatMode::Off,
            state: PlaybackState::Idle,
            session,
        }
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Snapshot `source` as the new queue and play from `start_index`.
    pub fn start(&mut self, source: &[TrackRef], start_index: usize) -> Result<(), PlaybackError> {
        if start_index >= source.len() {
            return Err(PlaybackError::IndexOutOfRange {
                index: start_index,
                len: source.len(),
            });
        }

        self.queue = source.to_vec();
        self.queue_generation += 1;
        self.current_index = Some(start_index);
        self.shuffle.clear_played();
        if self.shuffle.is_enabled() {
            self.shuffle.regenerate(start_index, self.queue.len());
        }
        info!(
            tracks = self.queue.len(),
            start_index,
            generation = self.queue_generation,
            "starting queue"
        );

        self.play_current()
    }

    /// Play/pause button. From `Idle` it starts the last known queue, or
    /// `fallback` (the library) when there is none, at index 0.
    pub fn toggle_play_pause(&mut self, fallback: &[TrackRef]) -> Result<(), PlaybackError> {
        match self.state {
            PlaybackState::Idle => {
                if !self.queue.is_empty() {
                    let queue = self.queue.clone();
                    self.start(&queue, 0)
                } else if !fallback.is_empty() {
                    self.start(fallback, 0)
                } else {
                    Ok(())
                }
            }
            PlaybackState::Ready => {
                if self.session.active_id().is_some() {
                    self.session.play();
                    self.state = PlaybackState::Playing;
                    Ok(())
                } else {
                    self.play_current()
                }
            }
            PlaybackState::Playing => {
                self.session.pause();
                self.state = PlaybackState::Paused;
                Ok(())
            }
            PlaybackState::Paused => {
                self.session.play();
                self.state = PlaybackState::Playing;
                Ok(())
            }
        }
    }

    pub fn next(&mut self) -> Result<(), PlaybackError> {
        let (Some(current), len) = (self.current_index, self.queue.len()) else {
            return Ok(());
        };
        if len == 0 {
            return Ok(());
        }

        let target = if self.repeat == RepeatMode::One {
            NavTarget::Restart
        } else if self.shuffle.is_enabled() && !self.shuffle.order().is_empty() {
            if self.shuffle.is_exhausted(len) {
                if self.repeat == RepeatMode::All {
                    debug!("shuffle pass exhausted, reshuffling");
                    self.shuffle.clear_played();
                    self.shuffle.regenerate(current, len);
                    self.shuffle_advance()
                } else {
                    NavTarget::Stop
                }
            } else {
                self.shuffle_advance()
            }
        } else {
            let next = (current + 1) % len;
            if next == 0 && self.repeat == RepeatMode::Off {
                self.current_index = Some(0);
                NavTarget::Stop
            } else {
                NavTarget::Go(next)
            }
        };

        self.execute_nav(target)
    }

    pub fn prev(&mut self) -> Result<(), PlaybackError> {
        let (Some(current), len) = (self.current_index, self.queue.len()) else {
            return Ok(());
        };
        if len == 0 {
            return Ok(());
        }

        let target = if self.shuffle.is_enabled() && !self.shuffle.order().is_empty() {
            match self.shuffle.retreat() {
                Some(index) => NavTarget::Go(index),
                None => NavTarget::Restart,
            }
        } else {
            NavTarget::Go((current + len - 1) % len)
        };

        self.execute_nav(target)
    }

    /// Flip shuffle. Does not move the current index.
    pub fn toggle_shuffle(&mut self) -> bool {
        let enabled = self.shuffle.toggle(self.current_index, self.queue.len());
        debug!(enabled, "shuffle toggled");
        enabled
    }

    pub fn cycle_repeat(&mut self) -> RepeatMode {
        self.repeat = self.repeat.cycle();
        debug!(mode = ?self.repeat, "repeat mode changed");
        self.repeat
    }

    pub fn set_repeat(&mut self, mode: RepeatMode) {
        self.repeat = mode;
    }

    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle
            .set_enabled(enabled, self.current_index, self.queue.len());
    }

    /// Forwarded to the active session; ignored when nothing is open.
    pub fn seek(&mut self, position: Duration) {
        self.session.seek(position);
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.session.set_volume(volume);
    }

    pub fn volume(&self) -> f32 {
        self.session.volume()
    }

    /// React to a media signal. Signals from a session other than the active
    /// one are ignored.
    pub fn on_media_signal(
        &mut self,
        session: SessionId,
        signal: MediaSignal,
    ) -> Result<(), PlaybackError> {
        if !self.session.is_active(session) {
            debug!(%session, ?signal, "ignoring signal from stale session");
            return Ok(());
        }
        self.session.record(&signal);

        match signal {
            MediaSignal::Ready { .. } => {
                if self.state == PlaybackState::Ready {
                    self.session.play();
                    self.state = PlaybackState::Playing;
                }
                Ok(())
            }
            MediaSignal::PositionChanged { .. } => Ok(()),
            MediaSignal::EndOfMedia => {
                if self.repeat == RepeatMode::One {
                    // A drained backend cannot seek back; reopen the resource.
                    self.execute_nav(NavTarget::Restart)
                } else {
                    self.next()
                }
            }
            MediaSignal::Error { message } => {
                self.session.dispose();
                self.state = PlaybackState::Ready;
                Err(PlaybackError::Media(message))
            }
        }
    }

    /// Drop a track the user deleted from the library out of the queue.
    ///
    /// Indices are remapped so shuffle order and played set stay consistent.
    /// Removing the current track disposes its session; the track that took
    /// its place becomes current in `Ready`.
    pub fn remove_from_queue(&mut self, identity: &TrackRef) -> bool {
        let Some(removed) = self.queue.iter().position(|t| t == identity) else {
            return false;
        };
        self.queue.remove(removed);
        let was_current = self.current_index == Some(removed);

        if self.queue.is_empty() {
            self.session.dispose();
            self.shuffle.remove_index(removed);
            self.current_index = None;
            self.state = PlaybackState::Idle;
            return true;
        }

        let under_cursor = self.shuffle.remove_index(removed);
        self.current_index = match (self.shuffle.is_enabled(), under_cursor) {
            (true, Some(index)) => Some(index),
            _ => self.current_index.map(|current| {
                if current > removed {
                    current - 1
                } else {
                    current.min(self.queue.len() - 1)
                }
            }),
        };

        if was_current {
            self.session.dispose();
            if self.state != PlaybackState::Idle {
                self.state = PlaybackState::Ready;
            }
        }
        true
    }

    /// Record a resolved location on matching queue entries.
    pub fn attach_resolved(&mut self, identity: &TrackRef, location: &Path) {
        for track in self.queue.iter_mut().filter(|t| *t == identity) {
            track.set_resolved(location.to_path_buf());
        }
    }

    /// Re-open the current track (after its resource was re-acquired).
    pub fn retry_current(&mut self) -> Result<(), PlaybackError> {
        if self.current_index.is_none() {
            return Ok(());
        }
        self.play_current()
    }

    // ── Queries ──────────────────────────────────────────────────────────────

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn queue(&self) -> &[TrackRef] {
        &self.queue
    }

    pub fn queue_generation(&self) -> u64 {
        self.queue_generation
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_track(&self) -> Option<&TrackRef> {
        self.current_index.and_then(|i| self.queue.get(i))
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat
    }

    pub fn shuffle_enabled(&self) -> bool {
        self.shuffle.is_enabled()
    }

    pub fn shuffle(&self) -> &ShuffleManager {
        &self.shuffle
    }

    pub fn session(&self) -> &MediaSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut MediaSession {
        &mut self.session
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn shuffle_advance(&mut self) -> NavTarget {
        match self.shuffle.advance() {
            Some(index) => NavTarget::Go(index),
            None => NavTarget::Restart,
        }
    }

    fn execute_nav(&mut self, target: NavTarget) -> Result<(), PlaybackError> {
        match target {
            NavTarget::Go(index) => {
                self.current_index = Some(index);
                self.play_current()
            }
            NavTarget::Restart => self.play_current(),
            NavTarget::Stop => {
                info!("end of queue reached");
                self.session.dispose();
                self.state = PlaybackState::Idle;
                Ok(())
            }
        }
    }

    /// Mark the current index played and open a session for it. A failed
    /// open leaves the sequencer in `Ready` at that index.
    fn play_current(&mut self) -> Result<(), PlaybackError> {
        let Some(index) = self.current_index else {
            return Ok(());
        };
        let Some(track) = self.queue.get(index) else {
            return Ok(());
        };

        self.shuffle.mark_played(index);
        self.state = PlaybackState::Ready;

        let opened = track
            .locator()
            .and_then(|locator| self.session.open(locator));
        match opened {
            Ok(_) => Ok(()),
            Err(e) => {
                self.session.dispose();
                Err(e.into())
            }
        }
    }
}
