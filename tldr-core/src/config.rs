//! Client configuration
//!
//! Loaded from `config.yaml` in the platform config directory (or an explicit
//! path). Every field has a default, so a missing file is not an error:
//!
//! ```yaml
//! cache_dir: /home/me/.cache/tldr
//! pages_repository: https://github.com/tldr-pages/tldr
//! archive_url: https://github.com/tldr-pages/tldr/releases/latest/download/tldr.zip
//! freshness_days: 30
//! platform: linux
//! language: de
//! skip_update_when_page_not_found: false
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, TldrError};
use crate::pages::Platform;

/// Default upstream page repository (used in "contribute it" messages)
pub const DEFAULT_PAGES_REPOSITORY: &str = "https://github.com/tldr-pages/tldr";

/// Default archive containing every page
pub const DEFAULT_ARCHIVE_URL: &str =
    "https://github.com/tldr-pages/tldr/releases/latest/download/tldr.zip";

/// Default freshness window in days
pub const DEFAULT_FRESHNESS_DAYS: u64 = 30;

/// Upper bound for `freshness_days` (100 years)
pub const MAX_FRESHNESS_DAYS: u64 = 36_500;

/// Name of the page tree inside the cache directory
const STORE_DIR: &str = "cache";

/// Name of the persisted index inside the cache directory
const INDEX_FILE: &str = "index.json";

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TldrConfig {
    /// Directory holding the page store and the index
    pub cache_dir: PathBuf,

    /// Where missing pages can be contributed
    pub pages_repository: String,

    /// Archive downloaded on refresh (`.zip` or `.tar.gz`)
    pub archive_url: String,

    /// Age in days after which the cache is reported as stale
    pub freshness_days: u64,

    /// Platform override (defaults to the current OS)
    pub platform: Option<Platform>,

    /// Language override (defaults to `$LANG`, then English)
    pub language: Option<String>,

    /// Fail immediately on a missing page instead of refreshing once
    pub skip_update_when_page_not_found: bool,
}

impl Default for TldrConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            pages_repository: DEFAULT_PAGES_REPOSITORY.to_string(),
            archive_url: DEFAULT_ARCHIVE_URL.to_string(),
            freshness_days: DEFAULT_FRESHNESS_DAYS,
            platform: None,
            language: None,
            skip_update_when_page_not_found: false,
        }
    }
}

impl TldrConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path, falling back to defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            TldrError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml(&content)
            .map_err(|e| TldrError::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: TldrConfig = serde_yaml_ng::from_str(content)
            .map_err(|e| TldrError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.freshness_days == 0 {
            return Err(TldrError::Config(
                "freshness_days must be at least 1".to_string(),
            ));
        }
        if self.freshness_days > MAX_FRESHNESS_DAYS {
            return Err(TldrError::Config(format!(
                "freshness_days must be at most {MAX_FRESHNESS_DAYS}"
            )));
        }
        if self.archive_url.trim().is_empty() {
            return Err(TldrError::Config("archive_url must not be empty".to_string()));
        }
        Ok(())
    }

    /// Root of the page store
    pub fn store_root(&self) -> PathBuf {
        self.cache_dir.join(STORE_DIR)
    }

    /// Location of the persisted page index
    pub fn index_path(&self) -> PathBuf {
        self.cache_dir.join(INDEX_FILE)
    }

    /// Freshness window as a duration
    pub fn freshness_window(&self) -> Duration {
        Duration::from_secs(self.freshness_days.saturating_mul(24 * 60 * 60))
    }

    /// Platform to prefer when resolving pages
    pub fn preferred_platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }

    /// Language to prefer when resolving pages
    pub fn preferred_language(&self) -> String {
        self.language
            .clone()
            .or_else(|| std::env::var("LANG").ok().filter(|l| !l.is_empty()))
            .unwrap_or_else(|| "en".to_string())
    }
}

/// Default path of the config file
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tldr")
        .map(|dirs| dirs.config_dir().join("config.yaml"))
}

fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "tldr")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .or_else(|| dirs::home_dir().map(|home| home.join(".tldr")))
        .unwrap_or_else(|| std::env::temp_dir().join("tldr-cache"))
}
