use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV: &str = "AURORA_LOG";

const DEFAULT_FILTER: &str = "warn";

/// Route `tracing` output to `log_path`. The terminal belongs to the player.
///
/// Filter precedence: `AURORA_LOG`, then `configured`, then `warn`.
pub fn init(log_path: &Path, configured: Option<&str>) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create log dir {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("open log file {}", log_path.display()))?;
    let writer = Arc::new(Mutex::new(file));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(std::env::var(LOG_ENV).ok().as_deref(), configured))
        .with_ansi(false)
        .with_writer(move || FileLogWriter::new(Arc::clone(&writer)))
        .try_init();
    Ok(())
}

fn build_filter(from_env: Option<&str>, configured: Option<&str>) -> EnvFilter {
    [from_env, configured]
        .into_iter()
        .flatten()
        .find_map(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

struct FileLogWriter {
    file: Arc<Mutex<File>>,
}

impl FileLogWriter {
    fn new(file: Arc<Mutex<File>>) -> Self {
        Self { file }
    }
}

impl Write for FileLogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut guard) = self.file.lock() {
            guard.write_all(buf)?;
            return Ok(buf.len());
        }
        Err(io::Error::other("failed to lock log file"))
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Ok(mut guard) = self.file.lock() {
            guard.flush()?;
            return Ok(());
        }
        Err(io::Error::other("failed to lock log file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_directive_wins_over_config() {
        let filter = build_filter(Some("debug"), Some("error"));
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn config_directive_used_without_env() {
        let filter = build_filter(None, Some("aurora_player=info"));
        assert_eq!(filter.to_string(), "aurora_player=info");
    }

    #[test]
    fn falls_back_to_warn() {
        assert_eq!(build_filter(None, None).to_string(), "warn");
    }

    #[test]
    fn log_writer_appends_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("aurora.log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .unwrap();
        let mut writer = FileLogWriter::new(Arc::new(Mutex::new(file)));
        writer.write_all(b"first\n").unwrap();
        writer.write_all(b"second\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
    }
}
