//! Content store - the on-disk page tree
//!
//! The store is replaced as a whole: a new snapshot is assembled next to the
//! root and swapped in with directory renames. The renames run under the write
//! half of a lock shared by every clone of the store, and reads take the read
//! half, so readers in this process see either the previous tree or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::RwLock;
use walkdir::WalkDir;

use crate::error::{RefreshStage, Result, TldrError};
use crate::pages::PageLocation;

/// Owns the cache root directory
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    swap_lock: Arc<RwLock<()>>,
}

impl ContentStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            swap_lock: Arc::new(RwLock::new(())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Read a page; `Ok(None)` when it is not in the store
    pub async fn read(&self, location: &PageLocation) -> Result<Option<String>> {
        let path = self.root.join(location.relative_path());
        let _guard = self.swap_lock.read().await;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Page not in store: {}", path.display());
                Ok(None)
            }
            Err(source) => Err(TldrError::Read { path, source }),
        }
    }

    /// Modification time of the root
    pub async fn last_modified(&self) -> Result<SystemTime> {
        let _guard = self.swap_lock.read().await;
        let metadata = tokio::fs::metadata(&self.root)
            .await
            .map_err(|source| self.unavailable(source))?;
        metadata.modified().map_err(|source| self.unavailable(source))
    }

    /// Remove the whole store. Removing an absent store succeeds.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.swap_lock.write().await;
        match tokio::fs::remove_dir_all(&self.root).await {
            Ok(()) => {
                tracing::debug!("Removed store {}", self.root.display());
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TldrError::Clear {
                path: self.root.clone(),
                source,
            }),
        }
    }

    /// Replace the store with the contents of `staging_root`
    pub async fn staged_replace(&self, staging_root: &Path) -> Result<()> {
        let parent = self
            .root
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = self
            .root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cache".to_string());
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        let incoming = parent.join(format!(".{name}.incoming-{suffix}"));
        let retired = parent.join(format!(".{name}.retired-{suffix}"));

        tokio::fs::create_dir_all(&parent)
            .await
            .map_err(|e| TldrError::refresh(RefreshStage::Replace, e))?;

        // Assemble the new snapshot off-tree
        let source = staging_root.to_path_buf();
        let target = incoming.clone();
        let copied = tokio::task::spawn_blocking(move || copy_tree(&source, &target))
            .await
            .map_err(|e| TldrError::refresh(RefreshStage::Replace, e))?;
        if let Err(e) = copied {
            remove_quietly(&incoming).await;
            return Err(TldrError::refresh(RefreshStage::Replace, e));
        }

        let guard = self.swap_lock.write().await;
        let had_root = match tokio::fs::rename(&self.root, &retired).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(e) => {
                drop(guard);
                remove_quietly(&incoming).await;
                return Err(TldrError::refresh(RefreshStage::Replace, e));
            }
        };

        if let Err(e) = tokio::fs::rename(&incoming, &self.root).await {
            if had_root {
                if let Err(restore) = tokio::fs::rename(&retired, &self.root).await {
                    tracing::error!(
                        "Failed to restore previous store from {}: {}",
                        retired.display(),
                        restore
                    );
                }
            }
            drop(guard);
            remove_quietly(&incoming).await;
            return Err(TldrError::refresh(RefreshStage::Replace, e));
        }
        drop(guard);

        if had_root {
            remove_quietly(&retired).await;
        }
        tracing::debug!("Store replaced from {}", staging_root.display());
        Ok(())
    }

    fn unavailable(&self, source: std::io::Error) -> TldrError {
        TldrError::StoreUnavailable {
            path: self.root.clone(),
            source,
        }
    }
}

/// Recursively copy `source` into the directory `target`, creating it
pub(crate) fn copy_tree(source: &Path, target: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(target)?;
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(std::io::Error::other)?;
        let destination = target.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_dir_all(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
