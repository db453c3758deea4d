use crate::utils::APP_NAME;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that replaces the configuration directory.
pub const CONFIG_DIR_ENV: &str = "AURORA_CONFIG_DIR";

const CONFIG_FILE: &str = "config.toml";
const LIBRARY_FILE: &str = "library.json";
const LOG_FILE: &str = "aurora.log";

/// User settings from `config.toml`. Every key is optional.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Library file; defaults to `library.json` in the config directory
    pub data_file: Option<PathBuf>,
    /// Where acquired audio is written
    pub cache_dir: Option<PathBuf>,
    pub downloader: String,
    pub transcoder: String,
    /// Output volume (0.0 - 1.0)
    pub volume: f32,
    pub log_filter: Option<String>,
    pub seek_step_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            cache_dir: None,
            downloader: "yt-dlp".to_string(),
            transcoder: "ffmpeg".to_string(),
            volume: 1.0,
            log_filter: None,
            seek_step_secs: 5,
        }
    }
}

/// Concrete locations derived from the config directory and [`AppConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_file: PathBuf,
    pub cache_dir: PathBuf,
    pub log_file: PathBuf,
}

impl AppConfig {
    /// Load `config.toml` from `config_dir`. A missing file yields defaults.
    pub fn load(config_dir: &Path) -> Result<Self> {
        Self::load_from(&config_dir.join(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: AppConfig = toml::from_str(&content)
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Volume clamped to the playable range.
    pub fn effective_volume(&self) -> f32 {
        if self.volume.is_nan() {
            return 1.0;
        }
        self.volume.clamp(0.0, 1.0)
    }

    pub fn paths(&self, config_dir: &Path) -> AppPaths {
        AppPaths {
            config_dir: config_dir.to_path_buf(),
            data_file: self
                .data_file
                .clone()
                .unwrap_or_else(|| config_dir.join(LIBRARY_FILE)),
            cache_dir: self
                .cache_dir
                .clone()
                .or_else(|| dirs::cache_dir().map(|dir| dir.join(APP_NAME)))
                .unwrap_or_else(|| config_dir.join("cache")),
            log_file: config_dir.join(LOG_FILE),
        }
    }
}

/// Configuration directory: `$AURORA_CONFIG_DIR`, else the platform
/// config directory joined with the application name.
pub fn config_dir() -> Result<PathBuf> {
    resolve_config_dir(std::env::var_os(CONFIG_DIR_ENV), dirs::config_dir())
}

fn resolve_config_dir(overridden: Option<OsString>, platform: Option<PathBuf>) -> Result<PathBuf> {
    match overridden.filter(|dir| !dir.is_empty()) {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => platform
            .map(|dir| dir.join(APP_NAME))
            .ok_or_else(|| anyhow!("Could not find config directory")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, content: &str) {
        fs::write(dir.path().join(CONFIG_FILE), content).unwrap();
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.downloader, "yt-dlp");
        assert_eq!(config.seek_step_secs, 5);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
transcoder = "/opt/ffmpeg/bin/ffmpeg"
volume = 0.4
log_filter = "aurora_player=debug"
"#,
        );
        let config = AppConfig::load(dir.path()).unwrap();
        assert_eq!(config.transcoder, "/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(config.downloader, "yt-dlp");
        assert_eq!(config.effective_volume(), 0.4);
        assert_eq!(config.log_filter.as_deref(), Some("aurora_player=debug"));
    }

    #[test]
    fn unknown_keys_are_rejected_with_path() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "colour = \"red\"\n");
        let err = AppConfig::load(dir.path()).unwrap_err();
        assert!(format!("{err}").contains("config.toml"), "{err}");
    }

    #[test]
    fn volume_is_clamped() {
        let loud = AppConfig {
            volume: 3.0,
            ..AppConfig::default()
        };
        assert_eq!(loud.effective_volume(), 1.0);
        let negative = AppConfig {
            volume: -1.0,
            ..AppConfig::default()
        };
        assert_eq!(negative.effective_volume(), 0.0);
    }

    #[test]
    fn paths_default_into_config_dir() {
        let config = AppConfig {
            cache_dir: Some(PathBuf::from("/tmp/aurora-cache")),
            ..AppConfig::default()
        };
        let paths = config.paths(Path::new("/home/u/.config/aurora-player"));
        assert_eq!(
            paths.data_file,
            PathBuf::from("/home/u/.config/aurora-player/library.json")
        );
        assert_eq!(paths.cache_dir, PathBuf::from("/tmp/aurora-cache"));
        assert_eq!(
            paths.log_file,
            PathBuf::from("/home/u/.config/aurora-player/aurora.log")
        );
    }

    #[test]
    fn explicit_data_file_wins() {
        let config = AppConfig {
            data_file: Some(PathBuf::from("/data/lib.json")),
            ..AppConfig::default()
        };
        assert_eq!(
            config.paths(Path::new("/cfg")).data_file,
            PathBuf::from("/data/lib.json")
        );
    }

    #[test]
    fn config_dir_override() {
        let resolved = resolve_config_dir(
            Some(OsString::from("/custom")),
            Some(PathBuf::from("/home/u/.config")),
        )
        .unwrap();
        assert_eq!(resolved, PathBuf::from("/custom"));

        let fallback =
            resolve_config_dir(Some(OsString::new()), Some(PathBuf::from("/home/u/.config")))
                .unwrap();
        assert_eq!(fallback, PathBuf::from("/home/u/.config/aurora-player"));

        assert!(resolve_config_dir(None, None).is_err());
    }
}
