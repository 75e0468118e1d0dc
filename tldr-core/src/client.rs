//! Page client - lookup policy on top of the cache
//!
//! A lookup that misses triggers exactly one refresh and one retry. Listing
//! never refreshes: an empty listing means the cache needs an explicit update.

use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::cache::{ContentStore, StalenessMonitor, Synchronizer};
use crate::config::TldrConfig;
use crate::error::{Result, TldrError};
use crate::pages::{self, FsPageIndex, PageIndex, Platform, RenderMode};
use crate::remote::{self, RemoteSource};

/// Options for a single page lookup
#[derive(Debug, Clone, Default)]
pub struct LookupOptions {
    /// Platform override; the configured/current platform otherwise
    pub platform: Option<Platform>,
    /// Language override; the configured/`$LANG` language otherwise
    pub language: Option<String>,
    pub mode: RenderMode,
}

/// Entry point for lookups, listings and cache maintenance
pub struct Client {
    config: TldrConfig,
    store: ContentStore,
    index: Arc<dyn PageIndex>,
    synchronizer: Synchronizer,
    staleness: StalenessMonitor,
}

impl Client {
    /// Client with the filesystem index and the configured archive source
    pub fn new(config: TldrConfig) -> Result<Self> {
        let index = Arc::new(FsPageIndex::new(&config));
        let remote = remote::source_for(&config)
            .map_err(|e| TldrError::Config(format!("{e:#}")))?;
        Ok(Self::with_collaborators(config, index, remote))
    }

    pub fn with_collaborators(
        config: TldrConfig,
        index: Arc<dyn PageIndex>,
        remote: Box<dyn RemoteSource>,
    ) -> Self {
        let store = ContentStore::new(config.store_root());
        let synchronizer = Synchronizer::new(store.clone(), remote, Arc::clone(&index));
        let staleness = StalenessMonitor::new(store.clone(), config.freshness_window());
        Self {
            config,
            store,
            index,
            synchronizer,
            staleness,
        }
    }

    /// Stage refreshes under `staging_parent` instead of the system temp dir
    pub fn with_staging_parent(mut self, staging_parent: PathBuf) -> Self {
        self.synchronizer = self.synchronizer.with_staging_parent(staging_parent);
        self
    }

    pub fn config(&self) -> &TldrConfig {
        &self.config
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    /// Look up a page by its words (`["git", "checkout"]`) and render it
    pub async fn lookup<S: AsRef<str>>(&self, words: &[S], options: &LookupOptions) -> Result<String> {
        let name = pages::page_name(words);
        if name.is_empty() {
            return Err(TldrError::InvalidOptions("no page name given".to_string()));
        }

        let platform = options
            .platform
            .unwrap_or_else(|| self.config.preferred_platform());
        let language = options
            .language
            .clone()
            .unwrap_or_else(|| self.config.preferred_language());

        let content = self.resolve_best_page(&name, platform, &language).await?;
        Ok(pages::render::render(&content, options.mode))
    }

    /// Content of the best page for `name`, refreshing the cache once on a miss
    pub async fn resolve_best_page(
        &self,
        name: &str,
        platform: Platform,
        language: &str,
    ) -> Result<String> {
        if let Some(content) = self.find_and_read(name, platform, language).await? {
            self.warn_if_stale().await;
            return Ok(content);
        }

        if self.config.skip_update_when_page_not_found {
            tracing::debug!("Page {} not found, cache update skipped by config", name);
            return Err(self.missing_page());
        }

        tracing::info!("Page {} not found. Updating cache...", name);
        self.synchronizer.refresh().await?;

        match self.find_and_read(name, platform, language).await? {
            Some(content) => {
                self.warn_if_stale().await;
                Ok(content)
            }
            None => Err(self.missing_page()),
        }
    }

    async fn find_and_read(
        &self,
        name: &str,
        platform: Platform,
        language: &str,
    ) -> Result<Option<String>> {
        let Some(location) = self.index.find_page(name, platform, language).await? else {
            return Ok(None);
        };
        tracing::debug!("Resolved {} to {}", name, location.relative_path().display());
        self.store.read(&location).await
    }

    /// Pages available for `platform` (the preferred platform if `None`)
    pub async fn list_for_platform(&self, platform: Option<Platform>) -> Result<Vec<String>> {
        let platform = platform.unwrap_or_else(|| self.config.preferred_platform());
        let commands = self.index.commands_for(platform).await?;
        self.checked_listing(commands).await
    }

    /// Every page in the cache
    pub async fn list_all(&self) -> Result<Vec<String>> {
        let commands = self.index.commands().await?;
        self.checked_listing(commands).await
    }

    async fn checked_listing(&self, commands: Vec<String>) -> Result<Vec<String>> {
        if commands.is_empty() {
            return Err(TldrError::EmptyCache);
        }
        self.warn_if_stale().await;
        Ok(commands)
    }

    /// Render a random page for the lookup platform
    pub async fn random_page(&self, options: &LookupOptions) -> Result<String> {
        let commands = self.index.commands_for(
            options
                .platform
                .unwrap_or_else(|| self.config.preferred_platform()),
        )
        .await?;
        let name = commands
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(TldrError::EmptyCache)?;
        tracing::debug!("Random page: {}", name);
        self.lookup(&[name], options).await
    }

    /// Refresh the cache unconditionally
    pub async fn update_cache(&self) -> Result<()> {
        self.synchronizer.refresh().await
    }

    /// Remove the cache and reset the index
    pub async fn clear_cache(&self) -> Result<()> {
        self.store.clear().await?;
        self.index.rebuild_index().await
    }

    /// Render a local page file without touching the cache
    pub async fn render_file(&self, path: &Path, mode: RenderMode) -> Result<String> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| TldrError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(pages::render::render(&content, mode))
    }

    async fn warn_if_stale(&self) {
        match self.staleness.is_stale(SystemTime::now()).await {
            Ok(true) => {
                tracing::warn!("Cache is out of date. You should run \"tldr --update\"")
            }
            Ok(false) => {}
            Err(e) => tracing::debug!("Skipping staleness check: {}", e),
        }
    }

    fn missing_page(&self) -> TldrError {
        TldrError::MissingPage {
            repository: self.config.pages_repository.clone(),
        }
    }
}
