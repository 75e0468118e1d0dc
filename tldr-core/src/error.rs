//! Error types for the page cache with clear, actionable messages

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Step of a cache refresh that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStage {
    /// Creating the staging directory or the store root
    Prepare,
    /// Downloading or extracting the remote archive
    Download,
    /// Copying the staged tree into the store
    Replace,
    /// Removing the staging directory
    Cleanup,
    /// Rebuilding the page index
    Index,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStage::Prepare => "prepare",
            RefreshStage::Download => "download",
            RefreshStage::Replace => "replace",
            RefreshStage::Cleanup => "cleanup",
            RefreshStage::Index => "index",
        };
        f.write_str(name)
    }
}

/// Page cache errors
#[derive(Error, Debug)]
pub enum TldrError {
    /// The cache root does not exist
    #[error("Local cache not found at {path}\n\nPlease run tldr --update")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A listing found no pages at all
    #[error("Local cache is empty\nPlease run tldr --update")]
    EmptyCache,

    /// A page could not be found even after refreshing the cache
    #[error("Page not found.\nIf you want to contribute it, feel free to send a pull request to: {repository}")]
    MissingPage { repository: String },

    /// Any failure while refreshing the cache
    #[error("Failed to update the local cache ({stage} step)")]
    Refresh {
        stage: RefreshStage,
        #[source]
        source: anyhow::Error,
    },

    /// A page exists but could not be read
    #[error("Failed to read page {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The store could not be removed
    #[error("Failed to remove local cache at {path}")]
    Clear {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid or unreadable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Conflicting or malformed lookup options
    #[error("Invalid options: {0}")]
    InvalidOptions(String),
}

impl TldrError {
    pub(crate) fn refresh(stage: RefreshStage, source: impl Into<anyhow::Error>) -> Self {
        TldrError::Refresh {
            stage,
            source: source.into(),
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            TldrError::EmptyCache => 2,
            TldrError::MissingPage { .. } => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, TldrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(TldrError::EmptyCache.exit_code(), 2);
        assert_eq!(
            TldrError::MissingPage {
                repository: "https://example.com/pages".to_string()
            }
            .exit_code(),
            3
        );
        assert_eq!(TldrError::Config("bad".to_string()).exit_code(), 1);
    }

    #[test]
    fn test_missing_page_message_names_repository() {
        let err = TldrError::MissingPage {
            repository: "https://github.com/tldr-pages/tldr".to_string(),
        };
        let message = err.to_string();
        assert!(message.starts_with("Page not found."));
        assert!(message.contains("https://github.com/tldr-pages/tldr"));
    }

    #[test]
    fn test_refresh_error_keeps_source() {
        let err = TldrError::refresh(RefreshStage::Download, anyhow::anyhow!("connection reset"));
        assert_eq!(
            err.to_string(),
            "Failed to update the local cache (download step)"
        );
        let source = std::error::Error::source(&err).unwrap();
        assert_eq!(source.to_string(), "connection reset");
    }
}
