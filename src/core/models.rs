use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::core::error::OpenError;
use crate::utils::{URL_MARKER, display_name, normalize_path};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    LocalFile,
    RemoteUrl,
}

/// A playable item: a local file, or a remote URL that may have been
/// downloaded to a local resource.
///
/// Equality and hashing only look at `kind` and `identity`. The resolved
/// location of a remote track never takes part in dedup.
#[derive(Debug, Clone)]
pub struct TrackRef {
    kind: TrackKind,
    identity: String,
    resolved: Option<PathBuf>,
}

impl TrackRef {
    /// Local file reference keyed by its absolute path.
    pub fn local(path: impl AsRef<Path>) -> Self {
        let absolute = normalize_path(path.as_ref());
        Self {
            kind: TrackKind::LocalFile,
            identity: absolute.to_string_lossy().into_owned(),
            resolved: None,
        }
    }

    /// Remote reference keyed by the URL string as entered.
    pub fn remote(url: impl AsRef<str>) -> Self {
        Self {
            kind: TrackKind::RemoteUrl,
            identity: url.as_ref().trim().to_string(),
            resolved: None,
        }
    }

    /// Attach the local resource produced by the acquisition pipeline.
    /// Ignored for local files.
    pub fn with_resolved(mut self, location: impl Into<PathBuf>) -> Self {
        self.set_resolved(location.into());
        self
    }

    pub(crate) fn set_resolved(&mut self, location: PathBuf) {
        if self.kind == TrackKind::RemoteUrl {
            self.resolved = Some(location);
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn resolved_location(&self) -> Option<&Path> {
        self.resolved.as_deref()
    }

    pub fn is_remote(&self) -> bool {
        self.kind == TrackKind::RemoteUrl
    }

    pub fn display_name(&self) -> String {
        display_name(&self.identity)
    }

    /// The resource the media session should open.
    pub fn locator(&self) -> Result<&Path, OpenError> {
        match self.kind {
            TrackKind::LocalFile => Ok(Path::new(&self.identity)),
            TrackKind::RemoteUrl => self
                .resolved
                .as_deref()
                .ok_or_else(|| OpenError::Unresolved(self.identity.clone())),
        }
    }

    /// Flat-file form: the absolute path, or `URL: <url>`.
    pub fn to_persisted(&self) -> String {
        match self.kind {
            TrackKind::LocalFile => self.identity.clone(),
            TrackKind::RemoteUrl => format!("{URL_MARKER}{}", self.identity),
        }
    }

    /// Inverse of [`TrackRef::to_persisted`]. Local paths are taken as-is;
    /// remote entries come back without a resolved location.
    pub fn from_persisted(raw: &str) -> Self {
        match raw.strip_prefix(URL_MARKER) {
            Some(url) => Self::remote(url),
            None => Self {
                kind: TrackKind::LocalFile,
                identity: raw.to_string(),
                resolved: None,
            },
        }
    }
}

impl PartialEq for TrackRef {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.identity == other.identity
    }
}

impl Eq for TrackRef {}

impl Hash for TrackRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.identity.hash(state);
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TrackKind::LocalFile => write!(f, "{}", self.display_name()),
            TrackKind::RemoteUrl => write!(f, "{} [url]", self.display_name()),
        }
    }
}

impl Serialize for TrackRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_persisted())
    }
}

impl<'de> Deserialize<'de> for TrackRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_persisted(&raw))
    }
}

/// Embedded title and artist of an opened resource. Either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub title: Option<String>,
    pub artist: Option<String>,
}

/// Repeat behaviour of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RepeatMode {
    /// Stop at the end of the queue
    #[default]
    Off,
    /// Loop the whole queue
    All,
    /// Repeat the current track
    One,
}

impl RepeatMode {
    /// Off → All → One → Off
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::Off => RepeatMode::All,
            RepeatMode::All => RepeatMode::One,
            RepeatMode::One => RepeatMode::Off,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RepeatMode::Off => "→",
            RepeatMode::All => "⟳",
            RepeatMode::One => "⟳1",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RepeatMode::Off => "Repeat off",
            RepeatMode::All => "Repeat all",
            RepeatMode::One => "Repeat one",
        }
    }
}

/// On-disk shape of the library: the ordered track list and the playlists.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct PersistedLibrary {
    pub tracks: Vec<TrackRef>,
    pub playlists: BTreeMap<String, Vec<TrackRef>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_tracks_with_same_path_are_equal() {
        let a = TrackRef::local("/music/a.mp3");
        let b = TrackRef::local("/music/a.mp3");
        assert_eq!(a, b);
        assert_eq!(a.kind(), TrackKind::LocalFile);
    }

    #[test]
    fn remote_equality_ignores_resolved_location() {
        let a = TrackRef::remote("https://youtu.be/x").with_resolved("/tmp/one.wav");
        let b = TrackRef::remote("https://youtu.be/x").with_resolved("/tmp/two.wav");
        assert_eq!(a, b);
        assert_ne!(a.resolved_location(), b.resolved_location());
    }

    #[test]
    fn local_and_remote_with_same_identity_differ() {
        let local = TrackRef::from_persisted("https://youtu.be/x");
        let remote = TrackRef::remote("https://youtu.be/x");
        assert_ne!(local, remote);
    }

    #[test]
    fn local_files_ignore_resolved_location() {
        let track = TrackRef::local("/music/a.mp3").with_resolved("/tmp/a.wav");
        assert!(track.resolved_location().is_none());
    }

    #[test]
    fn persisted_form_marks_urls() {
        let remote = TrackRef::remote("https://youtu.be/x");
        assert_eq!(remote.to_persisted(), "URL: https://youtu.be/x");
        assert_eq!(TrackRef::from_persisted("URL: https://youtu.be/x"), remote);

        let local = TrackRef::from_persisted("/music/a.mp3");
        assert_eq!(local.kind(), TrackKind::LocalFile);
        assert_eq!(local.identity(), "/music/a.mp3");
    }

    #[test]
    fn unresolved_remote_has_no_locator() {
        let remote = TrackRef::remote("https://youtu.be/x");
        assert_eq!(
            remote.locator(),
            Err(OpenError::Unresolved("https://youtu.be/x".to_string()))
        );

        let resolved = remote.with_resolved("/tmp/x.wav");
        assert_eq!(resolved.locator(), Ok(Path::new("/tmp/x.wav")));
    }

    #[test]
    fn display_name_strips_directory_and_extension() {
        assert_eq!(TrackRef::from_persisted("/music/Song One.mp3").display_name(), "Song One");
        assert_eq!(
            TrackRef::remote("https://example.com/audio/clip.wav").display_name(),
            "clip"
        );
    }

    #[test]
    fn serde_uses_flat_strings_and_drops_resolution() {
        let library = PersistedLibrary {
            tracks: vec![
                TrackRef::from_persisted("/music/a.mp3"),
                TrackRef::remote("https://youtu.be/x").with_resolved("/tmp/x.wav"),
            ],
            playlists: BTreeMap::new(),
        };

        let json = serde_json::to_string(&library).unwrap();
        assert!(json.contains("\"URL: https://youtu.be/x\""));
        assert!(!json.contains("/tmp/x.wav"));

        let back: PersistedLibrary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, library);
        assert!(back.tracks[1].resolved_location().is_none());
    }

    #[test]
    fn repeat_mode_cycles_through_all_modes() {
        assert_eq!(RepeatMode::Off.cycle(), RepeatMode::All);
        assert_eq!(RepeatMode::All.cycle(), RepeatMode::One);
        assert_eq!(RepeatMode::One.cycle(), RepeatMode::Off);
    }
}
