use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::executor::{executable_dir, PipelineExecutor, PipelineOutput};
use crate::installer::{InstallContext, Installer};
use crate::language::pair_key;
use crate::modes::{LiveRegistry, ModeRegistry, ModeScanner};
use crate::platform::{OsTag, PackageManager, PlatformProfile};
use crate::setup::{SetupManager, SetupOutcome};
use crate::settings::{SettingsStore, KEY_OS, KEY_PKG, KEY_ROOT};

/// Apertium installation as seen by a host: settings, modes and execution
pub struct ApertiumNative<S: SettingsStore> {
    config: Config,
    settings: S,
    registry: LiveRegistry,
}

impl<S: SettingsStore> ApertiumNative<S> {
    pub fn new(config: Config, settings: S) -> Self {
        Self {
            config,
            settings,
            registry: LiveRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    /// Run setup, then build the registry
    pub fn init(&mut self) -> Result<SetupOutcome> {
        self.init_with(SetupManager::new(&self.config))
    }

    pub fn init_with(&mut self, setup: SetupManager) -> Result<SetupOutcome> {
        let outcome = setup.initialize(&mut self.settings)?;
        self.refresh_modes();
        Ok(outcome)
    }

    /// Installation root from settings, if setup has run
    pub fn root(&self) -> Option<PathBuf> {
        self.settings
            .get(KEY_ROOT)
            .filter(|root| !root.is_empty())
            .map(PathBuf::from)
    }

    /// Platform from settings, falling back to the host when unset or unreadable
    pub fn profile(&self) -> PlatformProfile {
        let (Some(os), Some(pkg)) = (self.settings.get(KEY_OS), self.settings.get(KEY_PKG)) else {
            return PlatformProfile::detect();
        };

        match (os.parse::<OsTag>(), pkg.parse::<PackageManager>()) {
            (Ok(os), Ok(pkg)) => PlatformProfile { os, pkg },
            (Err(e), _) | (_, Err(e)) => {
                warn!("Ignoring stored platform: {}", e);
                PlatformProfile::detect()
            }
        }
    }

    /// Rescan the modes folder and swap in the result; returns the mode count
    pub fn refresh_modes(&self) -> usize {
        let registry = match self.root() {
            Some(root) => ModeScanner::new(&root, &self.config.build_type).scan(),
            None => {
                info!("No installation root configured, no modes available");
                ModeRegistry::new()
            }
        };

        let count = registry.len();
        self.registry.replace(registry);
        info!("Registered {} modes", count);
        count
    }

    /// Current registry snapshot
    pub fn modes(&self) -> Arc<ModeRegistry> {
        self.registry.snapshot()
    }

    /// Invoke the installer for the current root and platform, then rescan
    pub async fn reinstall<I: Installer + ?Sized>(&self, installer: &I) -> Result<usize> {
        let context = InstallContext {
            root: self.root().unwrap_or_default(),
            build_type: self.config.build_type.clone(),
            profile: self.profile(),
        };
        installer.install(&context).await?;
        Ok(self.refresh_modes())
    }

    pub fn executor(&self) -> PipelineExecutor {
        PipelineExecutor::new(
            self.profile().os,
            executable_dir(&self.root().unwrap_or_default(), &self.config.build_type),
            self.config.execution.clone(),
        )
    }

    /// Translate with the legacy combined output, or checked output when
    /// `execution.check_exit_status` is set
    pub async fn translate(&self, source: &str, target: &str, text: &str) -> Result<String> {
        let registry = self.modes();
        let executor = self.executor();
        if self.config.execution.check_exit_status {
            executor.translate_checked(&registry, source, target, text).await
        } else {
            executor.translate(&registry, source, target, text).await
        }
    }

    /// Translate, failing on a non-zero pipeline exit
    pub async fn translate_checked(&self, source: &str, target: &str, text: &str) -> Result<String> {
        self.executor()
            .translate_checked(&self.modes(), source, target, text)
            .await
    }

    /// Structured pipeline result, `None` when the pair has no mode
    pub async fn execute(&self, source: &str, target: &str, text: &str) -> Result<Option<PipelineOutput>> {
        self.executor()
            .execute(&self.modes(), &pair_key(source, target), text)
            .await
    }
}
