use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

pub const APP_NAME: &str = "aurora-player";

pub const SUPPORTED_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "flac", "ogg"];

/// Prefix that marks a remote entry in the flat library file.
pub const URL_MARKER: &str = "URL: ";

/// Human-readable name for a track identity.
///
/// Removes the `URL: ` marker, keeps the last path segment (either separator)
/// and drops the extension. A leading dot is not treated as an extension.
pub fn display_name(raw: &str) -> String {
    let name = raw.strip_prefix(URL_MARKER).unwrap_or(raw);
    let base = match name.rfind(['/', '\\']) {
        Some(sep) => &name[sep + 1..],
        None => name,
    };

    match base.rfind('.') {
        Some(dot) if dot > 0 => base[..dot].to_string(),
        _ => base.to_string(),
    }
}

/// Absolute form of a path: canonical when it exists, otherwise made
/// absolute against the working directory.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = path
        .canonicalize()
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf());
    strip_windows_verbatim_prefix(&absolute)
}

pub fn strip_windows_verbatim_prefix(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();

    if let Some(trimmed) = raw.strip_prefix(r"\\?\UNC\") {
        return PathBuf::from(format!(r"\\{trimmed}"));
    }

    if let Some(trimmed) = raw.strip_prefix(r"\\?\") {
        return PathBuf::from(trimmed);
    }

    path.to_path_buf()
}

pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Delete a file nobody will open again. Failures are only logged.
pub fn remove_quietly(path: &Path) {
    if path.exists()
        && let Err(e) = fs::remove_file(path)
    {
        warn!(path = %path.display(), "Failed to remove file: {e}");
    }
}
