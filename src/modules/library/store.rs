use crate::core::error::LibraryError;
use crate::core::models::{PersistedLibrary, TrackKind, TrackRef};
use crate::core::traits::StorageBackend;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::{debug, info, warn};

/// How a caller points at an entry of a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSelector {
    /// 0-based position
    Index(usize),
    Identity(TrackRef),
}

/// Owns the library tracks and the named playlists.
///
/// Every mutation is written through the storage backend before returning.
/// Write failures are logged and the in-memory state stays authoritative.
pub struct LibraryStore {
    tracks: Vec<TrackRef>,
    playlists: BTreeMap<String, Vec<TrackRef>>,
    epochs: HashMap<String, u64>,
    next_epoch: u64,
    storage: Box<dyn StorageBackend>,
}

impl LibraryStore {
    /// Load from `storage`, dropping local files that no longer exist.
    /// An unreadable file is logged and yields an empty library.
    pub fn load(storage: Box<dyn StorageBackend>) -> Self {
        let persisted = storage.load().unwrap_or_else(|e| {
            warn!("Failed to load library, starting empty: {e:#}");
            PersistedLibrary::default()
        });

        let mut store = Self {
            tracks: Vec::new(),
            playlists: BTreeMap::new(),
            epochs: HashMap::new(),
            next_epoch: 1,
            storage,
        };

        let mut dropped = 0usize;
        let mut keep = |list: Vec<TrackRef>| -> Vec<TrackRef> {
            let mut kept: Vec<TrackRef> = Vec::with_capacity(list.len());
            for track in list {
                if !still_exists(&track) {
                    dropped += 1;
                } else if !kept.contains(&track) {
                    kept.push(track);
                }
            }
            kept
        };

        store.tracks = keep(persisted.tracks);
        let playlists: Vec<(String, Vec<TrackRef>)> = persisted
            .playlists
            .into_iter()
            .map(|(name, list)| (name, keep(list)))
            .collect();
        for (name, list) in playlists {
            store.register_epoch(&name);
            store.playlists.insert(name, list);
        }

        info!(
            tracks = store.tracks.len(),
            playlists = store.playlists.len(),
            dropped,
            "library loaded"
        );
        store
    }

    // ── Library ───────────────────────────────────────────────────────────────

    /// Append tracks not already present. Returns how many were added.
    pub fn add_tracks(&mut self, tracks: impl IntoIterator<Item = TrackRef>) -> usize {
        let added = push_unique(&mut self.tracks, tracks);
        if added > 0 {
            debug!(added, "tracks added to library");
            self.persist();
        }
        added
    }

    pub fn remove_track(&mut self, selector: &TrackSelector) -> Result<TrackRef, LibraryError> {
        let index = resolve(&self.tracks, selector)?;
        let removed = self.tracks.remove(index);
        debug!(track = %removed.identity(), "track removed from library");
        self.persist();
        Ok(removed)
    }

    // ── Playlists ─────────────────────────────────────────────────────────────

    pub fn create_playlist(&mut self, name: &str) -> Result<(), LibraryError> {
        if name.trim().is_empty() {
            return Err(LibraryError::InvalidName(name.to_string()));
        }
        if self.playlists.contains_key(name) {
            return Err(LibraryError::DuplicateName(name.to_string()));
        }

        self.playlists.insert(name.to_string(), Vec::new());
        self.register_epoch(name);
        info!(playlist = name, "playlist created");
        self.persist();
        Ok(())
    }

    pub fn delete_playlist(&mut self, name: &str) -> Result<(), LibraryError> {
        if self.playlists.remove(name).is_none() {
            return Err(LibraryError::playlist_not_found(name));
        }
        self.epochs.remove(name);
        info!(playlist = name, "playlist deleted");
        self.persist();
        Ok(())
    }

    pub fn add_tracks_to_playlist(
        &mut self,
        name: &str,
        tracks: impl IntoIterator<Item = TrackRef>,
    ) -> Result<usize, LibraryError> {
        let list = self
            .playlists
            .get_mut(name)
            .ok_or_else(|| LibraryError::playlist_not_found(name))?;
        let added = push_unique(list, tracks);
        if added > 0 {
            debug!(playlist = name, added, "tracks added to playlist");
            self.persist();
        }
        Ok(added)
    }

    pub fn remove_track_from_playlist(
        &mut self,
        name: &str,
        selector: &TrackSelector,
    ) -> Result<TrackRef, LibraryError> {
        let list = self
            .playlists
            .get_mut(name)
            .ok_or_else(|| LibraryError::playlist_not_found(name))?;
        let index = resolve(list, selector)?;
        let removed = list.remove(index);
        debug!(playlist = name, track = %removed.identity(), "track removed from playlist");
        self.persist();
        Ok(removed)
    }

    /// Record a downloaded resource on every remote entry with this identity.
    /// Not persisted.
    pub fn attach_resolved(&mut self, identity: &TrackRef, location: &Path) {
        let lists = std::iter::once(&mut self.tracks).chain(self.playlists.values_mut());
        for list in lists {
            for track in list.iter_mut().filter(|t| *t == identity) {
                track.set_resolved(location.to_path_buf());
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn tracks(&self) -> &[TrackRef] {
        &self.tracks
    }

    pub fn playlist(&self, name: &str) -> Option<&[TrackRef]> {
        self.playlists.get(name).map(Vec::as_slice)
    }

    /// Names in sorted order
    pub fn playlist_names(&self) -> impl Iterator<Item = &str> {
        self.playlists.keys().map(String::as_str)
    }

    /// Changes whenever a playlist with this name is deleted or re-created.
    pub fn playlist_epoch(&self, name: &str) -> Option<u64> {
        self.epochs.get(name).copied()
    }

    pub fn position_of(list: &[TrackRef], identity: &TrackRef) -> Option<usize> {
        list.iter().position(|t| t == identity)
    }

    fn register_epoch(&mut self, name: &str) {
        self.epochs.insert(name.to_string(), self.next_epoch);
        self.next_epoch += 1;
    }

    fn snapshot(&self) -> PersistedLibrary {
        PersistedLibrary {
            tracks: self.tracks.clone(),
            playlists: self.playlists.clone(),
        }
    }

    fn persist(&self) {
        if let Err(e) = self.storage.save(&self.snapshot()) {
            warn!("Failed to save library: {e:#}");
        }
    }
}

fn still_exists(track: &TrackRef) -> bool {
    match track.kind() {
        TrackKind::LocalFile => Path::new(track.identity()).exists(),
        TrackKind::RemoteUrl => true,
    }
}

fn push_unique(list: &mut Vec<TrackRef>, tracks: impl IntoIterator<Item = TrackRef>) -> usize {
    let mut added = 0;
    for track in tracks {
        if !list.contains(&track) {
            list.push(track);
            added += 1;
        }
    }
    added
}

fn resolve(list: &[TrackRef], selector: &TrackSelector) -> Result<usize, LibraryError> {
    match selector {
        TrackSelector::Index(index) if *index < list.len() => Ok(*index),
        TrackSelector::Index(index) => Err(LibraryError::track_not_found(format!("#{}", index + 1))),
        TrackSelector::Identity(track) => LibraryStore::position_of(list, track)
            .ok_or_else(|| LibraryError::track_not_found(track.identity())),
    }
}
