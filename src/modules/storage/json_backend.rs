use crate::core::models::PersistedLibrary;
use crate::core::traits::StorageBackend;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Library persisted as one pretty-printed JSON document.
pub struct JsonStorageBackend {
    file_path: PathBuf,
}

impl JsonStorageBackend {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl StorageBackend for JsonStorageBackend {
    fn load(&self) -> Result<PersistedLibrary> {
        if !self.file_path.exists() {
            return Ok(PersistedLibrary::default());
        }
        let content = fs::read_to_string(&self.file_path)
            .with_context(|| format!("Failed to read {}", self.file_path.display()))?;
        let library: PersistedLibrary = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.file_path.display()))?;
        Ok(library)
    }

    fn save(&self, library: &PersistedLibrary) -> Result<()> {
        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(library)?;
        fs::write(&self.file_path, content)
            .with_context(|| format!("Failed to write {}", self.file_path.display()))?;
        Ok(())
    }
}
