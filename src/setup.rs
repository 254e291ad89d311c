use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Config;
use crate::error::{ApertiumError, Result};
use crate::platform::PlatformProfile;
use crate::settings::{SettingsStore, KEY_OS, KEY_PKG, KEY_ROOT};

/// Folder created inside the user data directory
pub const DATA_FOLDER_NAME: &str = "apertium-omegat-native";

/// Resolves the data folder and records installation settings
pub struct SetupManager {
    data_dir_override: Option<PathBuf>,
    profile: Option<PlatformProfile>,
}

/// What setup decided
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetupOutcome {
    pub root: PathBuf,
    pub profile: PlatformProfile,
}

impl SetupManager {
    pub fn new(config: &Config) -> Self {
        Self {
            data_dir_override: config.data_dir.clone(),
            profile: None,
        }
    }

    /// Use a fixed profile instead of detecting the host
    pub fn with_profile(mut self, profile: PlatformProfile) -> Self {
        self.profile = Some(profile);
        self
    }

    /// Clear and rewrite the `root`, `os` and `pkg` settings.
    ///
    /// Fails when the data folder cannot be created or written to; callers
    /// should not build a registry in that case.
    pub fn initialize<S: SettingsStore + ?Sized>(&self, settings: &mut S) -> Result<SetupOutcome> {
        settings.remove(KEY_ROOT)?;
        settings.remove(KEY_PKG)?;
        settings.remove(KEY_OS)?;

        let root = match &self.data_dir_override {
            Some(dir) => dir.clone(),
            None => default_data_dir()?,
        };
        prepare_data_dir(&root)?;

        info!("Set root path to: {}", root.display());
        settings.put(KEY_ROOT, &root.to_string_lossy())?;

        let profile = self.profile.unwrap_or_else(PlatformProfile::detect);

        info!("Set package manager to: {}", profile.pkg);
        settings.put(KEY_PKG, profile.pkg.as_str())?;

        info!("Set OS to: {}", profile.os);
        settings.put(KEY_OS, profile.os.as_str())?;

        Ok(SetupOutcome { root, profile })
    }
}

/// `<base>/apertium-omegat-native`, where base is the first of APPDATA (on
/// Windows) or XDG_DATA_HOME, then XDG_CONFIG_HOME, then `~/.local/share`
pub fn default_data_dir() -> Result<PathBuf> {
    let primary = if cfg!(windows) { "APPDATA" } else { "XDG_DATA_HOME" };
    let base = std::env::var_os(primary)
        .or_else(|| std::env::var_os("XDG_CONFIG_HOME"))
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
        .ok_or_else(|| ApertiumError::Setup("Cannot determine a data folder: no home directory".to_string()))?;

    Ok(base.join(DATA_FOLDER_NAME))
}

/// Create the data folder if needed and check it is writable
pub fn prepare_data_dir(root: &Path) -> Result<()> {
    if !root.exists() {
        fs::create_dir_all(root).map_err(|e| {
            ApertiumError::Setup(format!(
                "Missing data folder: {} did not exist and could not be created: {}",
                root.display(),
                e
            ))
        })?;
    }

    if !root.is_dir() {
        return Err(ApertiumError::Setup(format!("{} is not a folder", root.display())));
    }

    let probe = root.join(".write-test");
    fs::write(&probe, b"")
        .and_then(|_| fs::remove_file(&probe))
        .map_err(|e| ApertiumError::Setup(format!("Invalid data folder: {} is not writable: {}", root.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{OsTag, PackageManager};
    use crate::settings::{MemorySettings, MockSettingsStore};

    const UBUNTU: PlatformProfile = PlatformProfile { os: OsTag::Apt, pkg: PackageManager::AptGet };

    fn manager_for(dir: &Path) -> SetupManager {
        let config = Config { data_dir: Some(dir.to_path_buf()), ..Config::default() };
        SetupManager::new(&config).with_profile(UBUNTU)
    }

    #[test]
    fn test_initialize_writes_settings() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().join("data");
        let mut settings = MemorySettings::new();
        settings.put(KEY_PKG, "stale").unwrap();

        let outcome = manager_for(&root).initialize(&mut settings).unwrap();

        assert!(root.is_dir());
        assert_eq!(outcome.root, root);
        assert_eq!(outcome.profile, UBUNTU);
        assert_eq!(settings.get(KEY_ROOT), Some(root.to_string_lossy().into_owned()));
        assert_eq!(settings.get(KEY_OS).as_deref(), Some("apt"));
        assert_eq!(settings.get(KEY_PKG).as_deref(), Some("apt-get"));
    }

    #[test]
    fn test_initialize_clears_before_writing() {
        let temp = tempfile::tempdir().unwrap();
        let root = temp.path().to_path_buf();
        let mut settings = MockSettingsStore::new();
        let mut seq = mockall::Sequence::new();

        for key in [KEY_ROOT, KEY_PKG, KEY_OS] {
            settings
                .expect_remove()
                .withf(move |k| k == key)
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_| Ok(()));
        }
        let root_value = root.to_string_lossy().into_owned();
        settings
            .expect_put()
            .withf(move |key, value| key == KEY_ROOT && value == root_value)
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        settings
            .expect_put()
            .withf(|key, value| key == KEY_PKG && value == "apt-get")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        settings
            .expect_put()
            .withf(|key, value| key == KEY_OS && value == "apt")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        manager_for(&root).initialize(&mut settings).unwrap();
    }

    #[test]
    fn test_uncreatable_data_dir_is_setup_error() {
        let temp = tempfile::tempdir().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();

        let mut settings = MemorySettings::new();
        let err = manager_for(&blocker.join("data")).initialize(&mut settings).unwrap_err();

        assert!(matches!(err, ApertiumError::Setup(_)));
        assert_eq!(settings.get(KEY_ROOT), None);
    }

    #[test]
    fn test_data_dir_that_is_a_file_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let file = temp.path().join("file");
        std::fs::write(&file, "x").unwrap();

        assert!(matches!(prepare_data_dir(&file), Err(ApertiumError::Setup(_))));
    }

    #[test]
    fn test_default_data_dir_ends_with_folder_name() {
        if let Ok(dir) = default_data_dir() {
            assert!(dir.ends_with(DATA_FOLDER_NAME));
        }
    }
}
