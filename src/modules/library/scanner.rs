use crate::core::models::TrackRef;
use crate::utils::is_audio_file;
use anyhow::{Result, bail};
use std::path::Path;
use walkdir::WalkDir;

/// Expand a directory into the supported audio files below it, sorted by path.
pub fn scan_directory(root: &Path) -> Result<Vec<TrackRef>> {
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }

    let mut files: Vec<_> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_audio_file(e.path()))
        .map(|entry| entry.into_path())
        .collect();
    files.sort();

    Ok(files.into_iter().map(TrackRef::local).collect())
}

/// Turn user-supplied paths into tracks. Directories are scanned; files must
/// have a supported extension.
pub fn collect_tracks(paths: &[impl AsRef<Path>]) -> Result<Vec<TrackRef>> {
    let mut tracks = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            tracks.extend(scan_directory(path)?);
        } else if path.is_file() && is_audio_file(path) {
            tracks.push(TrackRef::local(path));
        } else if path.is_file() {
            bail!("Unsupported file type: {}", path.display());
        } else {
            bail!("File not found: {}", path.display());
        }
    }
    Ok(tracks)
}
