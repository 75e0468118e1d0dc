//! Remote page archive
//!
//! Downloads the published page archive and extracts it into a destination
//! directory. `.zip` archives are read with `zip`, anything else is treated
//! as a gzip-compressed tarball.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use crate::cache::copy_tree;
use crate::config::TldrConfig;

/// Populates a directory with a fresh copy of the page tree
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// Download and fully extract the archive into `destination`.
    ///
    /// Implementations are not required to clean up `destination` on failure.
    async fn download(&self, destination: &Path) -> Result<()>;
}

/// Source for the configured `archive_url`: a local directory is mirrored
/// as-is, anything else is fetched over HTTP
pub fn source_for(config: &TldrConfig) -> Result<Box<dyn RemoteSource>> {
    let url = config.archive_url.as_str();
    let local = Path::new(url.strip_prefix("file://").unwrap_or(url));
    if local.is_dir() {
        tracing::debug!("Using local page mirror {}", local.display());
        return Ok(Box::new(LocalDirSource::new(local.to_path_buf())));
    }
    Ok(Box::new(HttpArchiveSource::new(config)?))
}

/// Archive format, chosen from the URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url);
        if path.to_lowercase().ends_with(".zip") {
            ArchiveFormat::Zip
        } else {
            ArchiveFormat::TarGz
        }
    }
}

/// Fetches the archive over HTTP(S)
pub struct HttpArchiveSource {
    client: reqwest::Client,
    url: String,
}

impl HttpArchiveSource {
    pub fn new(config: &TldrConfig) -> Result<Self> {
        Self::with_url(config.archive_url.clone())
    }

    pub fn with_url(url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("tldr-rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RemoteSource for HttpArchiveSource {
    async fn download(&self, destination: &Path) -> Result<()> {
        tracing::info!("Downloading pages from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Failed to download page archive")?;

        if !response.status().is_success() {
            anyhow::bail!("Download failed: HTTP {} for {}", response.status(), self.url);
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read download response")?;
        tracing::debug!("Downloaded {} bytes", bytes.len());

        let format = ArchiveFormat::from_url(&self.url);
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || extract_archive(format, &bytes, &destination))
            .await
            .context("Archive extraction task failed")?
    }
}

/// Extract archive bytes into `destination`
pub fn extract_archive(format: ArchiveFormat, bytes: &[u8], destination: &Path) -> Result<()> {
    std::fs::create_dir_all(destination)
        .with_context(|| format!("Failed to create {}", destination.display()))?;

    match format {
        ArchiveFormat::Zip => {
            let mut archive =
                zip::ZipArchive::new(Cursor::new(bytes)).context("Failed to open zip archive")?;
            archive
                .extract(destination)
                .context("Failed to extract zip archive")?;
        }
        ArchiveFormat::TarGz => {
            let gz_decoder = flate2::read::GzDecoder::new(Cursor::new(bytes));
            let mut archive = tar::Archive::new(gz_decoder);
            archive
                .unpack(destination)
                .context("Failed to extract tarball")?;
        }
    }

    Ok(())
}

/// Copies a local page tree, for offline mirrors
pub struct LocalDirSource {
    root: PathBuf,
}

impl LocalDirSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl RemoteSource for LocalDirSource {
    async fn download(&self, destination: &Path) -> Result<()> {
        let source = self.root.clone();
        let destination = destination.to_path_buf();
        tokio::task::spawn_blocking(move || -> Result<()> {
            if !source.is_dir() {
                anyhow::bail!("Page mirror not found: {}", source.display());
            }
            copy_tree(&source, &destination)
                .with_context(|| format!("Failed to copy mirror {}", source.display()))?;
            Ok(())
        })
        .await
        .context("Mirror copy task failed")?
    }
}
