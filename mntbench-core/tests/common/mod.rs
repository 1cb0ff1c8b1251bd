//! Test helpers shared by the integration tests
//!
//! Not every test file uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use mntbench_core::error::{BenchError, Result};
use mntbench_core::sync::{CorpusVersion, ReleaseSource, RemoteRelease, VersionSync};
use sha2::{Digest, Sha256};
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use zip::write::SimpleFileOptions;

/// Initialize logging for tests (only once per test run)
static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let _ = tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_test_writer()
                    .with_target(true)
                    .with_level(true),
            )
            .with(tracing_subscriber::filter::EnvFilter::from_default_env())
            .try_init();
    });
}

/// The three mux21 files used throughout the tests
pub const MUX21_FILES: &[&str] = &[
    "mux21_ONE_BEST.fgl",
    "mux21_Bestagon_ROW_gold_Opt_Ord_crossings.fgl",
    "mux21.v",
];

/// Write files named `names` under `root`, each containing its own name
pub fn write_corpus(root: &Path, names: &[&str]) {
    for name in names {
        let path = root.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, format!("// {name}\n")).unwrap();
    }
}

/// Zip archive holding `names`, each containing its own name
pub fn zip_bytes(names: &[&str]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for name in names {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(format!("// {name}\n").as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

pub fn sha256(bytes: &[u8]) -> String {
    format!("sha256:{}", hex::encode(Sha256::digest(bytes)))
}

struct Published {
    release: RemoteRelease,
    bytes: Vec<u8>,
}

/// In-memory release source with failure injection
pub struct MockReleaseSource {
    published: Mutex<Published>,
    unreachable: AtomicBool,
    fail_next_download: AtomicBool,
    delay: Mutex<Option<Duration>>,
    download_delay: Mutex<Option<Duration>>,
    checks: AtomicUsize,
    downloads: AtomicUsize,
}

impl MockReleaseSource {
    pub fn new(version: &str, names: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            published: Mutex::new(Self::package(version, names)),
            unreachable: AtomicBool::new(false),
            fail_next_download: AtomicBool::new(false),
            delay: Mutex::new(None),
            download_delay: Mutex::new(None),
            checks: AtomicUsize::new(0),
            downloads: AtomicUsize::new(0),
        })
    }

    fn package(version: &str, names: &[&str]) -> Published {
        let bytes = zip_bytes(names);
        Published {
            release: RemoteRelease {
                version: version.parse().unwrap(),
                asset_name: "MNTBench_all.zip".to_string(),
                download_url: format!("memory://{version}/MNTBench_all.zip"),
                size: Some(bytes.len() as u64),
                digest: Some(sha256(&bytes)),
            },
            bytes,
        }
    }

    /// Publish a new release, replacing the current one
    pub fn publish(&self, version: &str, names: &[&str]) {
        *self.published.lock().unwrap() = Self::package(version, names);
    }

    /// Publish a release whose advertised digest does not match its bytes
    pub fn publish_with_bad_digest(&self, version: &str, names: &[&str]) {
        let mut published = Self::package(version, names);
        published.release.digest = Some(sha256(b"something else"));
        *self.published.lock().unwrap() = published;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Make the next download stop halfway with a network error
    pub fn fail_next_download_midway(&self) {
        self.fail_next_download.store(true, Ordering::SeqCst);
    }

    /// Delay every check by `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Stall every download halfway through for `delay`
    pub fn set_download_delay(&self, delay: Option<Duration>) {
        *self.download_delay.lock().unwrap() = delay;
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }

    pub fn version(&self) -> CorpusVersion {
        self.published.lock().unwrap().release.version.clone()
    }
}

#[async_trait]
impl ReleaseSource for MockReleaseSource {
    async fn latest_release(&self) -> Result<RemoteRelease> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(BenchError::NetworkError {
                url: "memory://".to_string(),
                reason: "connection refused".to_string(),
            });
        }
        Ok(self.published.lock().unwrap().release.clone())
    }

    async fn download(&self, release: &RemoteRelease, dest: &Path) -> Result<u64> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        let bytes = self.published.lock().unwrap().bytes.clone();

        if self.fail_next_download.swap(false, Ordering::SeqCst) {
            std::fs::write(dest, &bytes[..bytes.len() / 2]).unwrap();
            return Err(BenchError::NetworkError {
                url: release.download_url.clone(),
                reason: "connection reset".to_string(),
            });
        }

        let delay = *self.download_delay.lock().unwrap();
        if let Some(delay) = delay {
            std::fs::write(dest, &bytes[..bytes.len() / 2]).unwrap();
            tokio::time::sleep(delay).await;
        }

        std::fs::write(dest, &bytes).map_err(|e| BenchError::Io {
            path: dest.to_path_buf(),
            source: e,
        })?;
        Ok(bytes.len() as u64)
    }
}

/// Sync manager over `data_dir` backed by `source`
pub fn version_sync(source: &Arc<MockReleaseSource>, data_dir: &Path) -> VersionSync {
    VersionSync::new(source.clone(), data_dir)
}

/// Relative paths of every entry in a listing
pub fn paths(entries: &[mntbench_core::catalog::CatalogEntry]) -> Vec<String> {
    entries.iter().map(|e| e.path.clone()).collect()
}
