//! Cache refresh
//!
//! A refresh never writes into the live store until the new tree is fully
//! downloaded and extracted:
//!
//! ```text
//! <tmp>/tldr/<uuid>/   ← download + extract here
//!        │
//!        ▼  ContentStore::staged_replace
//! <cache_dir>/cache/   ← swapped in as a whole
//!        │
//!        ▼
//! index rebuilt, staging removed (together)
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use super::ContentStore;
use crate::error::{RefreshStage, Result, TldrError};
use crate::pages::PageIndex;
use crate::remote::RemoteSource;

/// Sub-directory of the system temp dir holding staging directories
const STAGING_NAMESPACE: &str = "tldr";

/// Refreshes the store from a remote source
pub struct Synchronizer {
    store: ContentStore,
    remote: Box<dyn RemoteSource>,
    index: Arc<dyn PageIndex>,
    staging_parent: PathBuf,
}

impl Synchronizer {
    pub fn new(
        store: ContentStore,
        remote: Box<dyn RemoteSource>,
        index: Arc<dyn PageIndex>,
    ) -> Self {
        Self {
            store,
            remote,
            index,
            staging_parent: std::env::temp_dir().join(STAGING_NAMESPACE),
        }
    }

    /// Use a different parent directory for staging
    pub fn with_staging_parent(mut self, staging_parent: PathBuf) -> Self {
        self.staging_parent = staging_parent;
        self
    }

    /// Fresh, uniquely named staging directory path
    fn staging_dir(&self) -> PathBuf {
        self.staging_parent.join(uuid::Uuid::new_v4().to_string())
    }

    /// Download a new snapshot, swap it into the store and rebuild the index
    pub async fn refresh(&self) -> Result<()> {
        let staging = self.staging_dir();
        tracing::debug!("Staging refresh in {}", staging.display());

        tokio::try_join!(
            tokio::fs::create_dir_all(&staging),
            tokio::fs::create_dir_all(self.store.root()),
        )
        .map_err(|e| TldrError::refresh(RefreshStage::Prepare, e))?;

        if let Err(e) = self.remote.download(&staging).await {
            discard_staging(&staging).await;
            return Err(TldrError::refresh(RefreshStage::Download, e));
        }

        if let Err(e) = self.store.staged_replace(&staging).await {
            discard_staging(&staging).await;
            return Err(e);
        }

        // Both run to completion even if one fails
        let (cleaned, rebuilt) = tokio::join!(
            async {
                tokio::fs::remove_dir_all(&staging)
                    .await
                    .map_err(|e| TldrError::refresh(RefreshStage::Cleanup, e))
            },
            async {
                self.index.rebuild_index().await.map_err(|e| match e {
                    refresh @ TldrError::Refresh { .. } => refresh,
                    other => TldrError::refresh(RefreshStage::Index, other),
                })
            },
        );
        cleaned?;
        rebuilt?;

        tracing::info!("Local cache updated at {}", self.store.root().display());
        Ok(())
    }
}

async fn discard_staging(staging: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_dir_all(staging).await {
        tracing::warn!(
            "Failed to remove staging directory {}: {}",
            staging.display(),
            e
        );
    }
}
