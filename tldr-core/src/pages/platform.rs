//! Page platforms

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Platform folder a page lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Linux,
    #[serde(alias = "macos", alias = "darwin")]
    Osx,
    Windows,
    SunOs,
    Android,
    FreeBsd,
    NetBsd,
    OpenBsd,
    /// Pages that apply to every platform
    Common,
}

impl Platform {
    /// All platform folders, `Common` last
    pub const ALL: [Platform; 9] = [
        Platform::Linux,
        Platform::Osx,
        Platform::Windows,
        Platform::SunOs,
        Platform::Android,
        Platform::FreeBsd,
        Platform::NetBsd,
        Platform::OpenBsd,
        Platform::Common,
    ];

    /// Platform of the running OS, `Linux` for anything unrecognised
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::Osx,
            "windows" => Platform::Windows,
            "solaris" | "illumos" => Platform::SunOs,
            "android" => Platform::Android,
            "freebsd" => Platform::FreeBsd,
            "netbsd" => Platform::NetBsd,
            "openbsd" => Platform::OpenBsd,
            _ => Platform::Linux,
        }
    }

    /// Folder name in the page tree
    pub fn folder_name(&self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Osx => "osx",
            Platform::Windows => "windows",
            Platform::SunOs => "sunos",
            Platform::Android => "android",
            Platform::FreeBsd => "freebsd",
            Platform::NetBsd => "netbsd",
            Platform::OpenBsd => "openbsd",
            Platform::Common => "common",
        }
    }

    /// Parse a folder name from the page tree
    pub fn from_folder(name: &str) -> Option<Self> {
        Platform::ALL
            .iter()
            .copied()
            .find(|p| p.folder_name() == name)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.folder_name())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_lowercase();
        match lower.as_str() {
            "macos" | "darwin" => Ok(Platform::Osx),
            "win32" => Ok(Platform::Windows),
            other => Platform::from_folder(other).ok_or_else(|| {
                let supported: Vec<&str> = Platform::ALL.iter().map(|p| p.folder_name()).collect();
                format!(
                    "Unsupported platform '{}'. Supported: {}",
                    s,
                    supported.join(", ")
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_names_round_trip() {
        for platform in Platform::ALL {
            assert_eq!(Platform::from_folder(platform.folder_name()), Some(platform));
        }
        assert_eq!(Platform::from_folder("pages"), None);
    }

    #[test]
    fn test_from_str_aliases() {
        assert_eq!("macos".parse::<Platform>().unwrap(), Platform::Osx);
        assert_eq!("Linux".parse::<Platform>().unwrap(), Platform::Linux);
        assert_eq!("win32".parse::<Platform>().unwrap(), Platform::Windows);
        assert!("amiga".parse::<Platform>().is_err());
    }

    #[test]
    fn test_current_is_not_common() {
        assert_ne!(Platform::current(), Platform::Common);
    }
}
