//! Host settings store.
//!
//! Setup writes three string values (`root`, `os`, `pkg`) and the rest of
//! the crate reads them back. The store is passed in explicitly; there is no
//! global preferences node.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ApertiumError, Result};

pub const KEY_ROOT: &str = "root";
pub const KEY_OS: &str = "os";
pub const KEY_PKG: &str = "pkg";

/// Key-value store for the handful of values setup persists
#[cfg_attr(test, mockall::automock)]
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn put(&mut self, key: &str, value: &str) -> Result<()>;

    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Settings kept only for the lifetime of the process
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: HashMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// Settings persisted as a flat TOML table, rewritten on every change
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettings {
    /// Open the store at `path`; a missing file starts out empty
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .map_err(|e| ApertiumError::Settings(format!("Failed to read {}: {}", path.display(), e)))?;
            toml::from_str(&content)?
        } else {
            BTreeMap::new()
        };

        debug!("Loaded {} settings from {}", values.len(), path.display());
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.values)?;
        std::fs::write(&self.path, content)
            .map_err(|e| ApertiumError::Settings(format!("Failed to write {}: {}", self.path.display(), e)))
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn put(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.values.remove(key).is_some() {
            self.save()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_settings() {
        let mut settings = MemorySettings::new();
        assert_eq!(settings.get(KEY_ROOT), None);

        settings.put(KEY_ROOT, "/opt/apz").unwrap();
        assert_eq!(settings.get(KEY_ROOT).as_deref(), Some("/opt/apz"));

        settings.remove(KEY_ROOT).unwrap();
        assert_eq!(settings.get(KEY_ROOT), None);
    }

    #[test]
    fn test_file_settings_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        {
            let mut settings = FileSettings::open(&path).unwrap();
            settings.put(KEY_ROOT, "/opt/apz").unwrap();
            settings.put(KEY_OS, "apt").unwrap();
            settings.put(KEY_PKG, "apt-get").unwrap();
            settings.remove(KEY_PKG).unwrap();
        }

        let settings = FileSettings::open(&path).unwrap();
        assert_eq!(settings.get(KEY_ROOT).as_deref(), Some("/opt/apz"));
        assert_eq!(settings.get(KEY_OS).as_deref(), Some("apt"));
        assert_eq!(settings.get(KEY_PKG), None);
    }

    #[test]
    fn test_file_settings_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "root = [").unwrap();

        assert!(FileSettings::open(&path).is_err());
    }
}
