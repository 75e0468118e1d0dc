//! Page index
//!
//! Maps command names to the (platform, language) variants present in the
//! store and picks the best variant for a lookup. The filesystem-backed index
//! is persisted as `index.json` next to the store and rebuilt after every
//! refresh.
//!
//! Store layout scanned by [`FsPageIndex`]:
//!
//! ```text
//! cache/
//! ├── pages/<platform>/<name>.md          ← English
//! └── pages.<lang>/<platform>/<name>.md   ← other languages
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use walkdir::WalkDir;

use super::Platform;
use crate::config::TldrConfig;
use crate::error::{RefreshStage, Result, TldrError};

const DEFAULT_LANGUAGE: &str = "en";
const PAGES_DIR: &str = "pages";
const PAGE_EXTENSION: &str = "md";

/// Storage-relative location of a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Folder relative to the store root, e.g. `pages.de/linux`
    pub folder: PathBuf,
    /// File name, e.g. `tar.md`
    pub file_name: String,
}

impl PageLocation {
    pub fn new(name: &str, target: &PageTarget) -> Self {
        Self {
            folder: PathBuf::from(pages_folder(&target.language)).join(target.platform.folder_name()),
            file_name: format!("{name}.{PAGE_EXTENSION}"),
        }
    }

    /// Path relative to the store root
    pub fn relative_path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

/// One stored variant of a page
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageTarget {
    pub platform: Platform,
    pub language: String,
}

impl PageTarget {
    pub fn new(platform: Platform, language: &str) -> Self {
        Self {
            platform,
            language: language.to_string(),
        }
    }
}

/// Resolver contract consumed by the cache client
#[async_trait]
pub trait PageIndex: Send + Sync {
    /// Location of the best variant of `name`, or `None`
    async fn find_page(
        &self,
        name: &str,
        platform: Platform,
        language: &str,
    ) -> Result<Option<PageLocation>>;

    /// Names available for `platform` (platform-specific or common), sorted
    async fn commands_for(&self, platform: Platform) -> Result<Vec<String>>;

    /// Every name in the store, sorted
    async fn commands(&self) -> Result<Vec<String>>;

    /// Rescan the store; must be called after any store mutation
    async fn rebuild_index(&self) -> Result<()>;
}

/// Serializable index of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShortIndex {
    pub commands: BTreeMap<String, Vec<PageTarget>>,
}

impl ShortIndex {
    /// Scan a store root. A missing root yields an empty index.
    pub fn scan(store_root: &Path) -> Result<Self> {
        let mut index = ShortIndex::default();
        if !store_root.is_dir() {
            return Ok(index);
        }

        let walker = WalkDir::new(store_root)
            .min_depth(3)
            .max_depth(3)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| TldrError::Read {
                path: e.path().map(Path::to_path_buf).unwrap_or_else(|| store_root.to_path_buf()),
                source: std::io::Error::from(e),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(target) = target_for(entry.path()) else {
                continue;
            };
            let Some(name) = entry
                .path()
                .file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
            else {
                continue;
            };
            index.insert(name, target);
        }

        Ok(index)
    }

    pub fn insert(&mut self, name: String, target: PageTarget) {
        let targets = self.commands.entry(name).or_default();
        if !targets.contains(&target) {
            targets.push(target);
            targets.sort();
        }
    }

    pub fn find(&self, name: &str, platform: Platform, language: &str) -> Option<PageLocation> {
        let targets = self.commands.get(name)?;
        select_target(targets, platform, language).map(|t| PageLocation::new(name, t))
    }

    pub fn commands_for(&self, platform: Platform) -> Vec<String> {
        self.commands
            .iter()
            .filter(|(_, targets)| {
                targets
                    .iter()
                    .any(|t| t.platform == platform || t.platform == Platform::Common)
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.commands.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Derive (platform, language) from `<root>/<pages dir>/<platform>/<name>.md`
fn target_for(path: &Path) -> Option<PageTarget> {
    if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
        return None;
    }
    let platform_dir = path.parent()?;
    let pages_dir = platform_dir.parent()?;
    let platform = Platform::from_folder(platform_dir.file_name()?.to_str()?)?;
    let language = language_of_folder(pages_dir.file_name()?.to_str()?)?;
    Some(PageTarget {
        platform,
        language,
    })
}

fn language_of_folder(folder: &str) -> Option<String> {
    if folder == PAGES_DIR {
        return Some(DEFAULT_LANGUAGE.to_string());
    }
    folder
        .strip_prefix("pages.")
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

fn pages_folder(language: &str) -> String {
    if language == DEFAULT_LANGUAGE {
        PAGES_DIR.to_string()
    } else {
        format!("{PAGES_DIR}.{language}")
    }
}

/// Strip encoding and modifier suffixes: `pt_BR.UTF-8@euro` -> `pt_BR`
pub fn normalize_language(raw: &str) -> String {
    let end = raw.find(['.', '@']).unwrap_or(raw.len());
    let trimmed = raw[..end].trim();
    if trimmed.is_empty() || trimmed == "C" || trimmed == "POSIX" {
        DEFAULT_LANGUAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Pick the best variant.
///
/// Precedence, first match wins:
/// 1. preferred platform in the preferred language
/// 2. `common` in the preferred language
/// 3. any other platform in the preferred language
/// 4. steps 1-3 in English
/// 5. steps 1-3 for every remaining language, alphabetically
///
/// A regional language (`pt_BR`) falls back to its base (`pt`) when no
/// variant in the regional language exists.
pub fn select_target<'a>(
    targets: &'a [PageTarget],
    platform: Platform,
    language: &str,
) -> Option<&'a PageTarget> {
    let preferred = effective_language(targets, &normalize_language(language));

    let mut languages = vec![preferred];
    if !languages.iter().any(|l| l == DEFAULT_LANGUAGE) {
        languages.push(DEFAULT_LANGUAGE.to_string());
    }
    let mut remaining: Vec<String> = targets
        .iter()
        .map(|t| t.language.clone())
        .filter(|l| !languages.contains(l))
        .collect();
    remaining.sort();
    remaining.dedup();
    languages.extend(remaining);

    languages
        .iter()
        .find_map(|lang| best_in_language(targets, platform, lang))
}

fn effective_language(targets: &[PageTarget], language: &str) -> String {
    let has = |lang: &str| targets.iter().any(|t| t.language == lang);
    if has(language) {
        return language.to_string();
    }
    match language.split_once('_') {
        Some((base, _)) if has(base) => base.to_string(),
        _ => language.to_string(),
    }
}

fn best_in_language<'a>(
    targets: &'a [PageTarget],
    platform: Platform,
    language: &str,
) -> Option<&'a PageTarget> {
    let in_language = targets.iter().filter(|t| t.language == language);
    let exact = in_language.clone().find(|t| t.platform == platform);
    exact
        .or_else(|| in_language.clone().find(|t| t.platform == Platform::Common))
        .or_else(|| in_language.min_by_key(|t| t.platform))
}

/// Index backed by a scan of the store, persisted as JSON
pub struct FsPageIndex {
    store_root: PathBuf,
    index_path: PathBuf,
    snapshot: RwLock<Option<Arc<ShortIndex>>>,
}

impl FsPageIndex {
    pub fn new(config: &TldrConfig) -> Self {
        Self::with_paths(config.store_root(), config.index_path())
    }

    pub fn with_paths(store_root: PathBuf, index_path: PathBuf) -> Self {
        Self {
            store_root,
            index_path,
            snapshot: RwLock::new(None),
        }
    }

    /// Current snapshot: memory, then `index.json`, then a fresh scan
    async fn snapshot(&self) -> Result<Arc<ShortIndex>> {
        if let Some(index) = self.snapshot.read().await.as_ref() {
            return Ok(Arc::clone(index));
        }

        let mut guard = self.snapshot.write().await;
        if let Some(index) = guard.as_ref() {
            return Ok(Arc::clone(index));
        }

        let index = match self.load_persisted().await {
            Some(index) => index,
            None => self.scan().await?,
        };
        let index = Arc::new(index);
        *guard = Some(Arc::clone(&index));
        Ok(index)
    }

    async fn load_persisted(&self) -> Option<ShortIndex> {
        let content = match tokio::fs::read_to_string(&self.index_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", self.index_path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(index) => Some(index),
            Err(e) => {
                tracing::warn!(
                    "Ignoring corrupt page index {}: {}",
                    self.index_path.display(),
                    e
                );
                None
            }
        }
    }

    async fn scan(&self) -> Result<ShortIndex> {
        let store_root = self.store_root.clone();
        tokio::task::spawn_blocking(move || ShortIndex::scan(&store_root))
            .await
            .map_err(|e| TldrError::refresh(RefreshStage::Index, e))?
    }
}

#[async_trait]
impl PageIndex for FsPageIndex {
    async fn find_page(
        &self,
        name: &str,
        platform: Platform,
        language: &str,
    ) -> Result<Option<PageLocation>> {
        Ok(self.snapshot().await?.find(name, platform, language))
    }

    async fn commands_for(&self, platform: Platform) -> Result<Vec<String>> {
        Ok(self.snapshot().await?.commands_for(platform))
    }

    async fn commands(&self) -> Result<Vec<String>> {
        Ok(self.snapshot().await?.names())
    }

    async fn rebuild_index(&self) -> Result<()> {
        let index = self.scan().await?;
        tracing::debug!(
            "Indexed {} pages from {}",
            index.commands.len(),
            self.store_root.display()
        );

        let json = serde_json::to_string(&index)
            .map_err(|e| TldrError::refresh(RefreshStage::Index, e))?;
        if let Some(parent) = self.index_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TldrError::refresh(RefreshStage::Index, e))?;
        }
        tokio::fs::write(&self.index_path, json)
            .await
            .map_err(|e| TldrError::refresh(RefreshStage::Index, e))?;

        *self.snapshot.write().await = Some(Arc::new(index));
        Ok(())
    }
}
