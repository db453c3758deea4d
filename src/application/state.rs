use crate::core::events::{AcquisitionEvent, AppEvent, UiEvent};
use crate::core::models::RepeatMode;
use crate::modules::acquisition::{AcquisitionProgress, AcquisitionRegistry};
use crate::modules::playback::playback_progress::PlaybackProgress;
use crate::modules::playback::{PlaybackState, Sequencer};
use crate::modules::ui::progress_formatter::{
    PercentageProgressFormatter, ProgressLabelFormatter, format_acquisition,
};
use std::time::Duration;

const ACQUISITION_BAR_WIDTH: usize = 10;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NowPlaying {
    /// Tag title, or the display name when the file has none
    pub title: String,
    pub artist: String,
    /// 1-based position in the queue
    pub position: usize,
    pub queue_len: usize,
    pub remote: bool,
}

/// What the player screen shows.
///
/// Playback fields are derived from the sequencer on every tick; only the
/// status and error lines are driven by events.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerView {
    pub now_playing: Option<NowPlaying>,
    pub state: PlaybackState,
    pub elapsed: Duration,
    pub total: Option<Duration>,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: f32,
    pub acquisition: Option<AcquisitionProgress>,
    pub status_message: String,
    pub error_message: Option<String>,
}

impl Default for PlayerView {
    fn default() -> Self {
        Self {
            now_playing: None,
            state: PlaybackState::Idle,
            elapsed: Duration::ZERO,
            total: None,
            shuffle: false,
            repeat: RepeatMode::Off,
            volume: 1.0,
            acquisition: None,
            status_message: "Welcome".to_string(),
            error_message: None,
        }
    }
}

impl PlayerView {
    /// Update the message lines from an event
    pub fn apply_event(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Ui(UiEvent::ShowMessage { message }) => {
                self.status_message = message.clone();
                self.error_message = None;
            }
            AppEvent::Ui(UiEvent::ShowError { message }) => {
                self.error_message = Some(message.clone());
            }
            AppEvent::Acquisition(AcquisitionEvent::Completed { .. }) => {
                self.error_message = None;
            }
            _ => {}
        }
    }

    /// Copy the display state out of the sequencer and the acquisition registry.
    pub fn sync(&mut self, sequencer: &Sequencer, acquisitions: &AcquisitionRegistry) {
        self.state = sequencer.state();
        self.shuffle = sequencer.shuffle_enabled();
        self.repeat = sequencer.repeat_mode();
        self.volume = sequencer.volume();
        self.elapsed = sequencer.session().position();
        self.total = sequencer.session().duration();

        self.now_playing = match (sequencer.current_index(), sequencer.current_track()) {
            (Some(index), Some(track)) if sequencer.state() != PlaybackState::Idle => {
                let tags = sequencer.session().tags();
                Some(NowPlaying {
                    title: tags
                        .and_then(|t| t.title.clone())
                        .unwrap_or_else(|| track.display_name()),
                    artist: tags
                        .and_then(|t| t.artist.clone())
                        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string()),
                    position: index + 1,
                    queue_len: sequencer.queue().len(),
                    remote: track.is_remote(),
                })
            }
            _ => None,
        };

        self.acquisition = acquisitions.latest().map(|(_, p)| p.progress.clone());
    }

    pub fn progress(&self) -> Option<PlaybackProgress> {
        PlaybackProgress::new(self.elapsed, self.total)
    }

    /// One status line: track, time, modes, download and messages.
    pub fn status_line(&self) -> String {
        let mut parts = Vec::new();

        match &self.now_playing {
            Some(now) => {
                let marker = match self.state {
                    PlaybackState::Playing => "▶",
                    PlaybackState::Paused => "⏸",
                    _ => "■",
                };
                let remote = if now.remote { " [url]" } else { "" };
                parts.push(format!(
                    "{marker} [{}/{}] {} - {}{remote}",
                    now.position, now.queue_len, now.title, now.artist
                ));
                parts.push(PercentageProgressFormatter.format(self.elapsed, self.total));
            }
            None => parts.push("■ Stopped".to_string()),
        }

        let shuffle = if self.shuffle { "Shuffle on" } else { "Shuffle off" };
        parts.push(format!("{shuffle} | {} {}", self.repeat.symbol(), self.repeat.label()));
        parts.push(format!("Vol {}%", (self.volume * 100.0).round() as u8));

        if let Some(progress) = &self.acquisition {
            parts.push(format_acquisition(progress, ACQUISITION_BAR_WIDTH));
        }
        if !self.status_message.is_empty() {
            parts.push(self.status_message.clone());
        }
        if let Some(error) = &self.error_message {
            parts.push(format!("ERROR: {error}"));
        }

        parts.join(" | ")
    }
}
