//! Corpus installation from a release source
//!
//! Handles checking, downloading, verifying and extracting corpus releases
//! into `<data_dir>/corpora/`. The lock file is only rewritten once the new
//! corpus has been extracted and indexed, so a failed sync never disturbs
//! the corpus that is already installed.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use super::lock::CorpusLock;
use super::source::{GithubReleaseSource, ReleaseSource, RemoteRelease};
use super::state::{SyncEvent, SyncState};
use super::version::{compare, CorpusVersion, VersionComparison};
use crate::catalog::CatalogIndex;
use crate::config::SyncConfig;
use crate::error::{BenchError, Result};

/// Extracted corpora, one directory per installed release
pub const CORPORA_DIR: &str = "corpora";

/// Downloads in progress
pub const STAGING_DIR: &str = "staging";

/// A corpus on disk together with its index
#[derive(Debug)]
pub struct InstalledCorpus {
    pub version: CorpusVersion,
    pub root: PathBuf,
    pub index: CatalogIndex,
    pub lock: CorpusLock,
}

/// What a sync call did
#[derive(Debug)]
pub enum SyncResult {
    /// The installed corpus already matches the remote
    UpToDate(CorpusVersion),
    /// A new corpus was installed and is now current
    Installed(InstalledCorpus),
}

struct StagedArchive {
    path: PathBuf,
    digest: String,
}

/// Drives the sync state machine against one data directory
pub struct VersionSync {
    source: Arc<dyn ReleaseSource>,
    data_dir: PathBuf,
    check_timeout: Duration,
    download_timeout: Duration,
    state: Mutex<SyncState>,
}

impl VersionSync {
    pub fn new(source: Arc<dyn ReleaseSource>, data_dir: impl Into<PathBuf>) -> Self {
        let defaults = SyncConfig::default();
        Self {
            source,
            data_dir: data_dir.into(),
            check_timeout: defaults.check_timeout(),
            download_timeout: defaults.download_timeout(),
            state: Mutex::new(SyncState::Unchecked),
        }
    }

    /// Sync against the GitHub releases named in the configuration
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let source = Arc::new(GithubReleaseSource::new(config)?);
        Ok(Self::new(source, config.data_dir()?)
            .with_timeouts(config.check_timeout(), config.download_timeout()))
    }

    pub fn with_timeouts(mut self, check: Duration, download: Duration) -> Self {
        self.check_timeout = check;
        self.download_timeout = download;
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Current state of the machine
    pub fn state(&self) -> SyncState {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn advance(&self, event: SyncEvent) -> SyncState {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let next = state.transition(event);
        if next != *state {
            tracing::debug!("Sync state: {} -> {}", *state, next);
        }
        *state = next.clone();
        next
    }

    /// Lock of the installed corpus, if any
    pub fn installed_lock(&self) -> Result<Option<CorpusLock>> {
        CorpusLock::load(&self.data_dir)
    }

    /// Load and index the installed corpus
    pub async fn load_installed(&self) -> Result<Option<InstalledCorpus>> {
        let Some(lock) = self.installed_lock()? else {
            return Ok(None);
        };
        let root = lock.corpus_root(&self.data_dir);
        if !root.is_dir() {
            tracing::warn!(
                "Corpus lock points at missing directory {}",
                root.display()
            );
            return Ok(None);
        }

        let index = build_index(root.clone()).await?;
        tracing::info!("Loaded corpus {} ({} benchmarks)", lock.version, index.len());

        Ok(Some(InstalledCorpus {
            version: lock.version.clone(),
            root,
            index,
            lock,
        }))
    }

    /// Ask the source for the latest release
    ///
    /// `local` decides whether the machine settles in `UpToDate` or
    /// `UpdateAvailable`.
    pub async fn check(&self, local: Option<&CorpusVersion>) -> Result<RemoteRelease> {
        self.advance(SyncEvent::CheckRequested);

        let result = match tokio::time::timeout(self.check_timeout, self.source.latest_release())
            .await
        {
            Ok(result) => result,
            Err(_) => Err(BenchError::NetworkError {
                url: "release source".to_string(),
                reason: format!("no answer within {}s", self.check_timeout.as_secs()),
            }),
        };

        match result {
            Ok(release) => {
                self.advance(SyncEvent::RemoteResolved {
                    local: local.cloned(),
                    remote: release.version.clone(),
                });
                Ok(release)
            }
            Err(e) => {
                tracing::warn!("Remote version check failed: {}", e);
                self.advance(SyncEvent::CheckFailed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Latest published version, compared against the installed one
    pub async fn check_remote_version(&self) -> Result<CorpusVersion> {
        let local = self.installed_lock()?.map(|lock| lock.version);
        Ok(self.check(local.as_ref()).await?.version)
    }

    /// Bring the data directory up to date with the remote
    ///
    /// `local` is the version currently served; `None` forces an install.
    pub async fn sync(&self, local: Option<&CorpusVersion>) -> Result<SyncResult> {
        match self.collect_garbage() {
            Ok(0) => {}
            Ok(removed) => tracing::debug!("Removed {} stale corpora", removed),
            Err(e) => tracing::warn!("Failed to clean up old corpora: {}", e),
        }

        let release = self.check(local).await?;

        if let Some(local) = local {
            if compare(local, &release.version) == VersionComparison::Same {
                tracing::info!("Corpus {} is up to date", local);
                return Ok(SyncResult::UpToDate(release.version));
            }
        }

        Ok(SyncResult::Installed(self.install(&release).await?))
    }

    async fn install(&self, release: &RemoteRelease) -> Result<InstalledCorpus> {
        self.advance(SyncEvent::DownloadStarted);

        let staged = match self.download(release).await {
            Ok(staged) => staged,
            Err(e) => {
                tracing::warn!("Download of {} failed: {}", release.version, e);
                self.advance(SyncEvent::DownloadFailed(e.to_string()));
                return Err(e);
            }
        };
        self.advance(SyncEvent::DownloadVerified);

        let result = self.unpack(release, &staged).await;
        discard_file(&staged.path);

        match result {
            Ok(installed) => {
                self.advance(SyncEvent::Installed);
                tracing::info!(
                    "Installed corpus {} ({} benchmarks) to {}",
                    installed.version,
                    installed.index.len(),
                    installed.root.display()
                );
                Ok(installed)
            }
            Err(e) => {
                tracing::warn!("Installing {} failed: {}", release.version, e);
                self.advance(SyncEvent::ExtractFailed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn download(&self, release: &RemoteRelease) -> Result<StagedArchive> {
        let staging = self.data_dir.join(STAGING_DIR);
        tokio::fs::create_dir_all(&staging)
            .await
            .map_err(|e| BenchError::io(&staging, e))?;
        let path = staging.join(format!(
            "{}-{}.zip",
            release.version.slug(),
            Uuid::now_v7().simple()
        ));

        let written = match tokio::time::timeout(
            self.download_timeout,
            self.source.download(release, &path),
        )
        .await
        {
            Ok(Ok(written)) => written,
            Ok(Err(e)) => {
                discard_file(&path);
                return Err(e);
            }
            Err(_) => {
                discard_file(&path);
                return Err(BenchError::NetworkError {
                    url: release.download_url.clone(),
                    reason: format!(
                        "download did not finish within {}s",
                        self.download_timeout.as_secs()
                    ),
                });
            }
        };

        let verify_path = path.clone();
        let expected = release.clone();
        let verified =
            tokio::task::spawn_blocking(move || verify_archive(&verify_path, &expected, written))
                .await
                .map_err(|e| BenchError::DownloadFailed {
                    reason: format!("verification task failed: {e}"),
                })
                .and_then(|result| result);

        match verified {
            Ok(digest) => {
                tracing::debug!("Verified {} ({} bytes, {})", path.display(), written, digest);
                Ok(StagedArchive { path, digest })
            }
            Err(e) => {
                discard_file(&path);
                Err(e)
            }
        }
    }

    async fn unpack(
        &self,
        release: &RemoteRelease,
        staged: &StagedArchive,
    ) -> Result<InstalledCorpus> {
        let relative = PathBuf::from(CORPORA_DIR).join(format!(
            "{}-{}",
            release.version.slug(),
            Uuid::now_v7().simple()
        ));
        let root = self.data_dir.join(&relative);

        let archive = staged.path.clone();
        let target = root.clone();
        let built = tokio::task::spawn_blocking(move || {
            let files = extract_archive(&archive, &target)?;
            tracing::debug!("Extracted {} files into {}", files, target.display());
            CatalogIndex::build(&target)
        })
        .await
        .map_err(|e| BenchError::ExtractFailed {
            reason: format!("extraction task failed: {e}"),
        })
        .and_then(|result| result);

        let index = match built {
            Ok(index) if index.is_empty() => {
                discard_dir(&root);
                return Err(BenchError::ExtractFailed {
                    reason: "archive contains no benchmark files".to_string(),
                });
            }
            Ok(index) => index,
            Err(e) => {
                discard_dir(&root);
                return Err(e);
            }
        };

        let lock = CorpusLock::new(
            release.version.clone(),
            relative,
            Some(staged.digest.clone()),
            index.len(),
        );
        if let Err(e) = lock.save(&self.data_dir) {
            discard_dir(&root);
            return Err(e);
        }

        Ok(InstalledCorpus {
            version: release.version.clone(),
            root,
            index,
            lock,
        })
    }

    /// Remove corpora the lock no longer points at and leftover downloads
    ///
    /// Returns the number of corpus directories removed.
    pub fn collect_garbage(&self) -> Result<usize> {
        let current = self
            .installed_lock()?
            .map(|lock| lock.corpus_root(&self.data_dir));

        let mut removed = 0;
        let corpora = self.data_dir.join(CORPORA_DIR);
        if corpora.is_dir() {
            for entry in std::fs::read_dir(&corpora).map_err(|e| BenchError::io(&corpora, e))? {
                let path = entry.map_err(|e| BenchError::io(&corpora, e))?.path();
                if Some(&path) == current.as_ref() || !path.is_dir() {
                    continue;
                }
                std::fs::remove_dir_all(&path).map_err(|e| BenchError::io(&path, e))?;
                tracing::debug!("Removed stale corpus {}", path.display());
                removed += 1;
            }
        }

        let staging = self.data_dir.join(STAGING_DIR);
        if staging.is_dir() {
            std::fs::remove_dir_all(&staging).map_err(|e| BenchError::io(&staging, e))?;
        }

        Ok(removed)
    }
}

async fn build_index(root: PathBuf) -> Result<CatalogIndex> {
    tokio::task::spawn_blocking(move || CatalogIndex::build(&root))
        .await
        .map_err(|e| BenchError::ExtractFailed {
            reason: format!("index task failed: {e}"),
        })?
}

/// Check a downloaded archive before anything is extracted from it
///
/// Returns the archive digest as `sha256:<hex>`.
pub fn verify_archive(path: &Path, release: &RemoteRelease, written: u64) -> Result<String> {
    if let Some(expected) = release.size {
        if expected != written {
            return Err(BenchError::DownloadFailed {
                reason: format!("expected {expected} bytes, received {written}"),
            });
        }
    }

    let mut file = File::open(path).map_err(|e| BenchError::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| BenchError::io(path, e))?;
    let actual = format!("sha256:{}", hex::encode(hasher.finalize()));

    if let Some(expected) = &release.digest {
        if !expected.eq_ignore_ascii_case(&actual) {
            return Err(BenchError::DownloadFailed {
                reason: format!("digest mismatch\nExpected: {expected}\nActual: {actual}"),
            });
        }
    }

    let file = File::open(path).map_err(|e| BenchError::io(path, e))?;
    let archive = zip::ZipArchive::new(file).map_err(|e| BenchError::DownloadFailed {
        reason: format!("not a readable zip archive: {e}"),
    })?;
    if archive.is_empty() {
        return Err(BenchError::DownloadFailed {
            reason: "archive is empty".to_string(),
        });
    }

    Ok(actual)
}

/// Unpack a zip archive into `dest`, returning the number of files written
///
/// Entries whose paths would land outside `dest` abort the extraction.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<usize> {
    let extract_failed = |reason: String| BenchError::ExtractFailed { reason };

    let file = File::open(archive).map_err(|e| BenchError::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| extract_failed(e.to_string()))?;
    std::fs::create_dir_all(dest).map_err(|e| BenchError::io(dest, e))?;

    let mut files = 0;
    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(|e| extract_failed(e.to_string()))?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(extract_failed(format!(
                "entry '{}' escapes the corpus directory",
                entry.name()
            )));
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| BenchError::io(&target, e))?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent).map_err(|e| BenchError::io(parent, e))?;
        }
        let mut out = File::create(&target).map_err(|e| BenchError::io(&target, e))?;
        std::io::copy(&mut entry, &mut out).map_err(|e| BenchError::io(&target, e))?;
        files += 1;
    }

    Ok(files)
}

fn discard_file(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

fn discard_dir(path: &Path) {
    if let Err(e) = std::fs::remove_dir_all(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}
