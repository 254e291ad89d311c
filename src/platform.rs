use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::{error, info};

use crate::error::ApertiumError;

pub const OS_RELEASE_PATH: &str = "/etc/os-release";

/// Platform tag persisted under the `os` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsTag {
    Win32,
    Osx,
    Apt,
    Rpm,
    Unknown,
}

/// Package manager persisted under the `pkg` setting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageManager {
    #[serde(rename = "apt-get")]
    AptGet,
    #[serde(rename = "dnf")]
    Dnf,
    #[serde(rename = "zypper")]
    Zypper,
    #[serde(rename = "yum")]
    Yum,
    #[serde(rename = "n/a")]
    NotApplicable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub os: OsTag,
    pub pkg: PackageManager,
}

impl OsTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Osx => "osx",
            Self::Apt => "apt",
            Self::Rpm => "rpm",
            Self::Unknown => "unknown",
        }
    }

    /// Whether pipelines go through `cmd` rather than `/bin/sh`
    pub fn is_windows(&self) -> bool {
        matches!(self, Self::Win32)
    }
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AptGet => "apt-get",
            Self::Dnf => "dnf",
            Self::Zypper => "zypper",
            Self::Yum => "yum",
            Self::NotApplicable => "n/a",
        }
    }
}

impl fmt::Display for OsTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OsTag {
    type Err = ApertiumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "win32" => Ok(Self::Win32),
            "osx" => Ok(Self::Osx),
            "apt" => Ok(Self::Apt),
            "rpm" => Ok(Self::Rpm),
            "unknown" | "" => Ok(Self::Unknown),
            other => Err(ApertiumError::Settings(format!("Unknown os tag '{}'", other))),
        }
    }
}

impl FromStr for PackageManager {
    type Err = ApertiumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apt-get" => Ok(Self::AptGet),
            "dnf" => Ok(Self::Dnf),
            "zypper" => Ok(Self::Zypper),
            "yum" => Ok(Self::Yum),
            "n/a" => Ok(Self::NotApplicable),
            other => Err(ApertiumError::Settings(format!("Unknown package manager '{}'", other))),
        }
    }
}

impl PlatformProfile {
    /// Profile of the running host, reading os-release on Linux
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "linux" => Self::from_os_release(&read_os_release(Path::new(OS_RELEASE_PATH))),
            other => Self::for_os_name(other),
        }
    }

    /// Profile for a non-Linux `std::env::consts::OS` value
    pub fn for_os_name(os_name: &str) -> Self {
        let os = match os_name {
            "windows" => OsTag::Win32,
            "macos" => OsTag::Osx,
            "linux" => return Self::from_os_release(""),
            _ => OsTag::Unknown,
        };
        Self { os, pkg: PackageManager::NotApplicable }
    }

    /// Linux profile from os-release content.
    ///
    /// Anything unrecognised is treated as a yum based distro (RHEL, CentOS
    /// and derivatives). Fedora and openSUSE keep the `rpm` tag.
    pub fn from_os_release(content: &str) -> Self {
        let is_debian = ["Debian", "Ubuntu", "debian", "ubuntu"]
            .iter()
            .any(|name| content.contains(name));

        if is_debian {
            Self { os: OsTag::Apt, pkg: PackageManager::AptGet }
        } else if content.contains("Fedora") {
            Self { os: OsTag::Rpm, pkg: PackageManager::Dnf }
        } else if content.contains("OpenSUSE") {
            Self { os: OsTag::Rpm, pkg: PackageManager::Zypper }
        } else {
            Self { os: OsTag::Rpm, pkg: PackageManager::Yum }
        }
    }
}

fn read_os_release(path: &Path) -> String {
    if !path.is_file() {
        info!("No {} found, assuming a yum based distro", path.display());
        return String::new();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!("Failed to read {}: {}", path.display(), e);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ubuntu_is_apt() {
        let profile = PlatformProfile::from_os_release("NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n");
        assert_eq!(profile, PlatformProfile { os: OsTag::Apt, pkg: PackageManager::AptGet });
    }

    #[test]
    fn test_lowercase_debian_is_apt() {
        let profile = PlatformProfile::from_os_release("ID=raspbian\nID_LIKE=debian\n");
        assert_eq!(profile.os, OsTag::Apt);
        assert_eq!(profile.pkg, PackageManager::AptGet);
    }

    #[test]
    fn test_fedora_keeps_rpm_tag() {
        let profile = PlatformProfile::from_os_release("NAME=Fedora\nVERSION_ID=40\n");
        assert_eq!(profile, PlatformProfile { os: OsTag::Rpm, pkg: PackageManager::Dnf });
    }

    #[test]
    fn test_lowercase_fedora_falls_back_to_yum() {
        let profile = PlatformProfile::from_os_release("ID=fedora\n");
        assert_eq!(profile.pkg, PackageManager::Yum);
    }

    #[test]
    fn test_opensuse_is_zypper() {
        let profile = PlatformProfile::from_os_release("NAME=\"OpenSUSE Leap\"\n");
        assert_eq!(profile, PlatformProfile { os: OsTag::Rpm, pkg: PackageManager::Zypper });
    }

    #[test]
    fn test_unknown_linux_is_yum() {
        let profile = PlatformProfile::from_os_release("NAME=\"CentOS Linux\"\n");
        assert_eq!(profile, PlatformProfile { os: OsTag::Rpm, pkg: PackageManager::Yum });
        assert_eq!(PlatformProfile::from_os_release(""), profile);
    }

    #[test]
    fn test_non_linux_hosts() {
        assert_eq!(PlatformProfile::for_os_name("windows").os, OsTag::Win32);
        assert_eq!(PlatformProfile::for_os_name("macos").os, OsTag::Osx);
        assert_eq!(PlatformProfile::for_os_name("freebsd").os, OsTag::Unknown);
        assert_eq!(PlatformProfile::for_os_name("windows").pkg, PackageManager::NotApplicable);
    }

    #[test]
    fn test_tags_round_trip_through_strings() {
        for tag in [OsTag::Win32, OsTag::Osx, OsTag::Apt, OsTag::Rpm, OsTag::Unknown] {
            assert_eq!(tag.as_str().parse::<OsTag>().unwrap(), tag);
        }
        for pkg in [
            PackageManager::AptGet,
            PackageManager::Dnf,
            PackageManager::Zypper,
            PackageManager::Yum,
            PackageManager::NotApplicable,
        ] {
            assert_eq!(pkg.as_str().parse::<PackageManager>().unwrap(), pkg);
        }
        assert!("beos".parse::<OsTag>().is_err());
    }
}
