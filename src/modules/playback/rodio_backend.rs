use crate::core::error::OpenError;
use crate::core::events::MediaSignal;
use crate::core::models::TrackTags;
use crate::core::traits::MediaBackend;
use anyhow::{Result, anyhow};
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::{Accessor, Tag};
use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Minimum movement before another `PositionChanged` is reported.
const POSITION_CADENCE: Duration = Duration::from_millis(250);

struct Loaded {
    sink: Sink,
    path: PathBuf,
    duration: Option<Duration>,
    tags: TrackTags,
    ready_reported: bool,
    end_reported: bool,
    last_position: Duration,
}

impl Loaded {
    /// A sink that played to the end holds no source, so a seek on it lands
    /// nowhere. Decode the file again first. Returns whether it refilled.
    fn refill_if_drained(&mut self) -> Result<bool, OpenError> {
        if !self.sink.empty() {
            return Ok(false);
        }
        self.sink.append(decode(&self.path)?);
        debug!(path = %self.path.display(), "drained sink refilled");
        Ok(true)
    }
}

pub struct RodioBackend {
    // Opened on the first `open`. Dropping it silences every connected sink.
    stream: Option<OutputStream>,
    loaded: Option<Loaded>,
    playing: bool,
    volume: f32,
}

impl RodioBackend {
    /// Creating the backend does not touch the audio device.
    pub fn new() -> Self {
        Self {
            stream: None,
            loaded: None,
            playing: false,
            volume: 1.0,
        }
    }

    fn output(&mut self) -> Result<&OutputStream, OpenError> {
        if self.stream.is_none() {
            let mut stream = OutputStreamBuilder::from_default_device()
                .map_err(|e| OpenError::Device(e.to_string()))?
                .with_error_callback(|_| {})
                .open_stream_or_fallback()
                .map_err(|e| OpenError::Device(e.to_string()))?;
            stream.log_on_drop(false);
            debug!("audio output opened");
            self.stream = Some(stream);
        }
        self.stream
            .as_ref()
            .ok_or_else(|| OpenError::Device("output stream missing".to_string()))
    }

    /// Container duration and tags, read once per open.
    fn read_container(path: &Path) -> (Option<Duration>, TrackTags) {
        let Some(tagged_file) = Probe::open(path).ok().and_then(|p| p.read().ok()) else {
            return (None, TrackTags::default());
        };
        let duration = Some(tagged_file.properties().duration()).filter(|d| !d.is_zero());
        let tag = tagged_file
            .primary_tag()
            .or_else(|| tagged_file.first_tag());
        (duration, tags_from(tag))
    }
}

impl Default for RodioBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode(path: &Path) -> Result<impl Source + Send + 'static, OpenError> {
    let unsupported = |reason: String| OpenError::Unsupported {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| unsupported(e.to_string()))?;
    Decoder::try_from(file).map_err(|e| unsupported(e.to_string()))
}

/// Blank values count as missing.
fn tags_from(tag: Option<&Tag>) -> TrackTags {
    let field = |value: Option<std::borrow::Cow<'_, str>>| {
        value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };
    TrackTags {
        title: tag.and_then(|t| field(t.title())),
        artist: tag.and_then(|t| field(t.artist())),
    }
}

impl MediaBackend for RodioBackend {
    fn open(&mut self, locator: &Path) -> Result<(), OpenError> {
        self.dispose();

        if !locator.is_file() {
            return Err(OpenError::Missing(locator.to_path_buf()));
        }
        let source = decode(locator)?;
        let (container_duration, tags) = Self::read_container(locator);
        let duration = source
            .total_duration()
            .filter(|d| !d.is_zero())
            .or(container_duration);

        let volume = self.volume;
        let sink = Sink::connect_new(self.output()?.mixer());
        sink.pause();
        sink.set_volume(volume);
        sink.append(source);

        debug!(path = %locator.display(), ?duration, ?tags, "resource loaded");
        self.loaded = Some(Loaded {
            sink,
            path: locator.to_path_buf(),
            duration,
            tags,
            ready_reported: false,
            end_reported: false,
            last_position: Duration::ZERO,
        });
        Ok(())
    }

    fn play(&mut self) {
        if let Some(loaded) = &self.loaded {
            loaded.sink.play();
            self.playing = true;
        }
    }

    fn pause(&mut self) {
        if let Some(loaded) = &self.loaded {
            loaded.sink.pause();
            self.playing = false;
        }
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        let loaded = self
            .loaded
            .as_mut()
            .ok_or_else(|| anyhow!("no active track"))?;
        if loaded.refill_if_drained()? {
            self.playing = !loaded.sink.is_paused();
        }
        loaded
            .sink
            .try_seek(position)
            .map_err(|err| anyhow!("failed to seek {}: {err:?}", loaded.path.display()))?;
        loaded.last_position = position;
        loaded.end_reported = false;
        Ok(())
    }

    fn dispose(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            loaded.sink.stop();
        }
        self.playing = false;
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        if let Some(loaded) = &self.loaded {
            loaded.sink.set_volume(self.volume);
        }
    }

    fn poll_signals(&mut self) -> Vec<MediaSignal> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Vec::new();
        };
        let mut signals = Vec::new();

        if !loaded.ready_reported {
            loaded.ready_reported = true;
            signals.push(MediaSignal::Ready {
                duration: loaded.duration,
                tags: loaded.tags.clone(),
            });
            return signals;
        }

        if !self.playing {
            return signals;
        }

        let position = loaded.sink.get_pos();
        if position.abs_diff(loaded.last_position) >= POSITION_CADENCE {
            loaded.last_position = position;
            signals.push(MediaSignal::PositionChanged { position });
        }

        if loaded.sink.empty() && !loaded.end_reported {
            loaded.end_reported = true;
            self.playing = false;
            signals.push(MediaSignal::EndOfMedia);
        }
        signals
    }
}

impl Drop for RodioBackend {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lofty::tag::TagType;
    use tempfile::TempDir;

    /// 16-bit mono PCM of silence.
    fn write_wav(path: &Path, samples: u32) {
        let data_len = samples * 2;
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"RIFF");
        bytes.extend_from_slice(&(36 + data_len).to_le_bytes());
        bytes.extend_from_slice(b"WAVEfmt ");
        bytes.extend_from_slice(&16u32.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&1u16.to_le_bytes());
        bytes.extend_from_slice(&8000u32.to_le_bytes());
        bytes.extend_from_slice(&16000u32.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&16u16.to_le_bytes());
        bytes.extend_from_slice(b"data");
        bytes.extend_from_slice(&data_len.to_le_bytes());
        bytes.resize(bytes.len() + data_len as usize, 0);
        std::fs::write(path, bytes).unwrap();
    }

    // ── Device ────────────────────────────────────────────────────────────────

    #[test]
    fn backend_without_open_never_needs_a_device() {
        let mut backend = RodioBackend::new();
        backend.set_volume(0.5);
        backend.play();
        assert!(backend.poll_signals().is_empty());
        assert!(backend.seek(Duration::ZERO).is_err());
        backend.dispose();
        assert!(backend.stream.is_none());
    }

    #[test]
    fn missing_file_is_reported_before_touching_the_device() {
        let mut backend = RodioBackend::new();
        let err = backend.open(Path::new("/no/such/track.wav")).unwrap_err();
        assert_eq!(err, OpenError::Missing("/no/such/track.wav".into()));
        assert!(backend.stream.is_none());
    }

    // ── Drained sinks ────────────────────────────────────────────────────────

    #[test]
    fn drained_sink_is_refilled_before_seeking() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("blip.wav");
        write_wav(&path, 160);

        let (sink, mut output) = Sink::new();
        sink.append(decode(&path).unwrap());
        for _ in 0..100_000 {
            if sink.empty() {
                break;
            }
            output.next();
        }
        assert!(sink.empty(), "source should have played out");

        let mut loaded = Loaded {
            sink,
            path,
            duration: None,
            tags: TrackTags::default(),
            ready_reported: true,
            end_reported: true,
            last_position: Duration::ZERO,
        };
        assert!(loaded.refill_if_drained().unwrap());
        assert_eq!(loaded.sink.len(), 1);

        assert!(!loaded.refill_if_drained().unwrap(), "only an empty sink is refilled");
        assert_eq!(loaded.sink.len(), 1);
    }

    // ── Tags ─────────────────────────────────────────────────────────────────

    #[test]
    fn tags_are_read_from_the_primary_tag() {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.set_title("Blue in Green".to_string());
        tag.set_artist("Miles Davis".to_string());

        assert_eq!(
            tags_from(Some(&tag)),
            TrackTags {
                title: Some("Blue in Green".into()),
                artist: Some("Miles Davis".into()),
            }
        );
    }

    #[test]
    fn blank_or_missing_tags_are_none() {
        let mut tag = Tag::new(TagType::Id3v2);
        tag.set_title("  ".to_string());
        assert_eq!(tags_from(Some(&tag)), TrackTags::default());
        assert_eq!(tags_from(None), TrackTags::default());
    }

    #[test]
    fn untagged_file_reads_as_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.wav");
        write_wav(&path, 8000);

        let (duration, tags) = RodioBackend::read_container(&path);
        assert_eq!(tags, TrackTags::default());
        let millis = duration.map(|d| d.as_millis()).unwrap_or_default();
        assert!(millis.abs_diff(1000) <= 1, "{duration:?}");
    }
}
