use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{ApertiumError, Result};

fn default_build_type() -> String {
    "nightly".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_locale() -> String {
    "en_US.UTF-8".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Installation flavour; names the subdirectory of the data root
    #[serde(default = "default_build_type")]
    pub build_type: String,
    /// Data directory override; when unset it is searched in the environment
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Settings file override; defaults to the user config directory
    #[serde(default)]
    pub settings_file: Option<PathBuf>,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Seconds to wait for a pipeline before killing it (0 waits forever)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Value forced into LC_ALL for every pipeline
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Treat a non-zero pipeline exit as an error instead of returning its output
    #[serde(default)]
    pub check_exit_status: bool,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            locale: default_locale(),
            check_exit_status: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            build_type: default_build_type(),
            data_dir: None,
            settings_file: None,
            execution: ExecutionConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ApertiumError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| ApertiumError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ApertiumError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| ApertiumError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Location of the persistent settings file
    pub fn settings_path(&self) -> PathBuf {
        if let Some(path) = &self.settings_file {
            return path.clone();
        }
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("apertium-native")
            .join("settings.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str("[execution]\ncheck_exit_status = true\n").unwrap();
        assert_eq!(config.build_type, "nightly");
        assert_eq!(config.execution.timeout_secs, 300);
        assert_eq!(config.execution.locale, "en_US.UTF-8");
        assert!(config.execution.check_exit_status);
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.build_type = "release".to_string();
        config.data_dir = Some(PathBuf::from("/opt/apz"));
        config.execution.timeout_secs = 5;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.build_type, "release");
        assert_eq!(loaded.data_dir, Some(PathBuf::from("/opt/apz")));
        assert_eq!(loaded.execution.timeout_secs, 5);
    }

    #[test]
    fn test_invalid_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "build_type = [").unwrap();

        assert!(matches!(Config::from_file(&path), Err(ApertiumError::Config(_))));
    }
}
