//! Installation trigger.
//!
//! Installing the toolchain is left to the host. This module only defines the
//! hook that gets called before modes are rescanned, plus an implementation
//! that hands off to an external script.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{ApertiumError, Result};
use crate::executor::{run_pipeline, ShellInvocation};
use crate::platform::PlatformProfile;

/// Where and for which platform an installation should happen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    pub root: PathBuf,
    pub build_type: String,
    pub profile: PlatformProfile,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Installer: Send + Sync {
    async fn install(&self, context: &InstallContext) -> Result<()>;
}

/// Runs a user-supplied shell command with the install context in its environment
pub struct ScriptInstaller {
    command_line: String,
}

impl ScriptInstaller {
    pub fn new<S: Into<String>>(command_line: S) -> Self {
        Self { command_line: command_line.into() }
    }
}

#[async_trait]
impl Installer for ScriptInstaller {
    async fn install(&self, context: &InstallContext) -> Result<()> {
        info!("Running installer: {}", self.command_line);

        let invocation = ShellInvocation::for_platform(context.profile.os, &self.command_line)
            .env("APERTIUM_ROOT", &context.root)
            .env("APERTIUM_BUILD", &context.build_type)
            .env("APERTIUM_OS", context.profile.os.as_str())
            .env("APERTIUM_PKG", context.profile.pkg.as_str());

        debug!("Executing installer command: {:?}", invocation);

        let output = run_pipeline(&invocation, &[])
            .await
            .map_err(|e| ApertiumError::Install(format!("Failed to execute installer: {}", e)))?;

        if !output.status.success() {
            return Err(ApertiumError::Install(format!(
                "Installer exited with {}: {}",
                output.status,
                output.stderr_text().trim()
            )));
        }

        info!("Installer completed");
        Ok(())
    }
}
