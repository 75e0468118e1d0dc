//! Shared helpers for tldr-core integration tests
//!
//! Mock collaborators record how often they are called so tests can assert
//! the refresh-once policy.

#![allow(dead_code)]

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

use tldr_core::pages::{PageIndex, PageLocation, Platform};
use tldr_core::remote::{LocalDirSource, RemoteSource};
use tldr_core::TldrConfig;

static INIT: Once = Once::new();

/// Initialize logging for tests (only once per test run)
pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Formatted `tracing` output collected for assertions
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Send this thread's events to the capture until the guard drops
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .without_time()
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Occurrences of `needle` in the captured output
    pub fn count(&self, needle: &str) -> usize {
        self.contents().matches(needle).count()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Set the modification time of `path` to `age` ago
pub fn backdate(path: &Path, age: Duration) {
    let file = std::fs::File::open(path).unwrap();
    file.set_modified(SystemTime::now() - age).unwrap();
}

/// Write `<root>/<folder>/<platform>/<name>.md`
pub fn write_page(root: &Path, folder: &str, platform: &str, name: &str, content: &str) {
    let dir = root.join(folder).join(platform);
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(format!("{name}.md")), content).unwrap();
}

/// Temporary layout: cache dir, mirror (remote content) and staging parent
pub struct TestEnv {
    pub temp_dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        init_test_logging();
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn config(&self) -> TldrConfig {
        TldrConfig {
            cache_dir: self.temp_dir.path().join("cache-dir"),
            ..TldrConfig::default()
        }
    }

    pub fn mirror(&self) -> PathBuf {
        self.temp_dir.path().join("mirror")
    }

    pub fn staging_parent(&self) -> PathBuf {
        self.temp_dir.path().join("staging")
    }
}

/// Mirrors a local directory and counts downloads
pub struct CountingSource {
    inner: LocalDirSource,
    pub calls: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(mirror: PathBuf) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                inner: LocalDirSource::new(mirror),
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

#[async_trait]
impl RemoteSource for CountingSource {
    async fn download(&self, destination: &Path) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.download(destination).await
    }
}

/// Writes part of a tree into staging, then fails like a dropped connection
pub struct FailingSource;

#[async_trait]
impl RemoteSource for FailingSource {
    async fn download(&self, destination: &Path) -> Result<()> {
        write_page(destination, "pages", "common", "ls", "# ls (partial)\n");
        anyhow::bail!("connection reset by peer")
    }
}

/// Index returning scripted `find_page` answers; the last answer repeats
pub struct ScriptedIndex {
    answers: Mutex<VecDeque<Option<PageLocation>>>,
    last: Mutex<Option<PageLocation>>,
    pub finds: Arc<AtomicUsize>,
    pub rebuilds: Arc<AtomicUsize>,
}

impl ScriptedIndex {
    pub fn new(answers: Vec<Option<PageLocation>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            last: Mutex::new(None),
            finds: Arc::new(AtomicUsize::new(0)),
            rebuilds: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl PageIndex for ScriptedIndex {
    async fn find_page(
        &self,
        _name: &str,
        _platform: Platform,
        _language: &str,
    ) -> tldr_core::Result<Option<PageLocation>> {
        self.finds.fetch_add(1, Ordering::SeqCst);
        let next = self.answers.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(answer) = next {
            *last = answer;
        }
        Ok(last.clone())
    }

    async fn commands_for(&self, _platform: Platform) -> tldr_core::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn commands(&self) -> tldr_core::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn rebuild_index(&self) -> tldr_core::Result<()> {
        self.rebuilds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
