//! Shared handle on the current corpus
//!
//! [`BenchContext`] owns the immutable snapshot (version, corpus root,
//! index) that queries run against, and the sync manager that may replace
//! it. Readers clone the `Arc` and never see a half-built index; a sync
//! swaps in the new snapshot only after the corpus is installed.

use serde::Serialize;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::archive;
use crate::catalog::{query, Attribute, AttributeValue, CatalogEntry, CatalogIndex, FilterSpec};
use crate::config::SyncConfig;
use crate::error::{BenchError, Result};
use crate::sync::{CorpusVersion, SyncResult, SyncState, VersionSync};

/// One indexed corpus version
#[derive(Debug)]
pub struct CorpusSnapshot {
    pub version: CorpusVersion,
    pub root: PathBuf,
    pub index: CatalogIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// The served corpus already matched the remote
    UpToDate,
    /// A new corpus was installed and swapped in
    Updated,
    /// Another sync was already running; nothing was done
    Coalesced,
}

/// Summary of one sync call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub outcome: SyncOutcome,
    pub version: Option<CorpusVersion>,
    pub entry_count: usize,
    pub state: SyncState,
}

/// Result of the most recent finished sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum LastSyncResult {
    UpToDate {
        version: CorpusVersion,
    },
    Updated {
        from: Option<CorpusVersion>,
        to: CorpusVersion,
    },
    Failed {
        state: SyncState,
        error: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastSync {
    /// RFC 3339 completion time
    pub finished_at: String,
    #[serde(flatten)]
    pub result: LastSyncResult,
}

/// What `status` reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CorpusStatus {
    pub version: Option<CorpusVersion>,
    pub corpus_root: Option<PathBuf>,
    pub entry_count: usize,
    pub skipped_count: usize,
    pub total_size: u64,
    pub last_sync: Option<LastSync>,
}

/// The current corpus and the means to replace it
pub struct BenchContext {
    current: RwLock<Option<Arc<CorpusSnapshot>>>,
    sync: Option<VersionSync>,
    sync_guard: tokio::sync::Mutex<()>,
    last_sync: Mutex<Option<LastSync>>,
}

impl BenchContext {
    /// Context that syncs through `sync`; nothing is loaded yet
    pub fn new(sync: VersionSync) -> Self {
        Self {
            current: RwLock::new(None),
            sync: Some(sync),
            sync_guard: tokio::sync::Mutex::new(()),
            last_sync: Mutex::new(None),
        }
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Ok(Self::new(VersionSync::from_config(config)?))
    }

    /// Serve a corpus directory as-is, without any syncing
    pub fn open_local(corpus_root: &Path) -> Result<Self> {
        if !corpus_root.is_dir() {
            return Err(BenchError::CorpusUnavailable {
                reason: format!("{} is not a directory", corpus_root.display()),
            });
        }
        let index = CatalogIndex::build(corpus_root)?;
        tracing::info!(
            "Using local corpus {} ({} benchmarks)",
            corpus_root.display(),
            index.len()
        );

        let context = Self {
            current: RwLock::new(None),
            sync: None,
            sync_guard: tokio::sync::Mutex::new(()),
            last_sync: Mutex::new(None),
        };
        context.swap(CorpusSnapshot {
            version: CorpusVersion::local(),
            root: corpus_root.to_path_buf(),
            index,
        });
        Ok(context)
    }

    /// Current snapshot, if any corpus is loaded
    pub fn snapshot(&self) -> Option<Arc<CorpusSnapshot>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn require_snapshot(&self) -> Result<Arc<CorpusSnapshot>> {
        self.snapshot().ok_or_else(|| BenchError::CorpusUnavailable {
            reason: "no corpus has been loaded".to_string(),
        })
    }

    fn swap(&self, snapshot: CorpusSnapshot) {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Some(Arc::new(snapshot));
    }

    fn record(&self, result: LastSyncResult) {
        let mut last = self.last_sync.lock().unwrap_or_else(PoisonError::into_inner);
        *last = Some(LastSync {
            finished_at: chrono::Utc::now().to_rfc3339(),
            result,
        });
    }

    fn version_sync(&self) -> Result<&VersionSync> {
        self.sync.as_ref().ok_or_else(|| BenchError::Config {
            path: self
                .snapshot()
                .map(|s| s.root.clone())
                .unwrap_or_default(),
            reason: "syncing is disabled for an explicitly given corpus directory".to_string(),
        })
    }

    /// Distinct values of an attribute in the current corpus
    pub fn list_attribute_values(&self, attribute: Attribute) -> Result<Vec<AttributeValue>> {
        Ok(self.require_snapshot()?.index.values(attribute))
    }

    /// Entries matching a filter, in index order
    pub fn run_query(&self, spec: &FilterSpec) -> Result<Vec<CatalogEntry>> {
        let snapshot = self.require_snapshot()?;
        let matches = query(&snapshot.index, spec);
        tracing::debug!("Query matched {} of {} entries", matches.len(), snapshot.index.len());
        Ok(matches.into_iter().cloned().collect())
    }

    /// Write the selected entries as a zip archive
    ///
    /// Every entry must be a file of the corpus currently served, with the
    /// same identity and path; anything else fails with `UnknownEntry`.
    pub fn download_selection<W: Write + Seek>(
        &self,
        entries: &[CatalogEntry],
        writer: W,
    ) -> Result<W> {
        let snapshot = self.require_snapshot()?;
        let resolved = entries
            .iter()
            .map(|entry| match snapshot.index.get(&entry.identity) {
                Some(found) if found.path == entry.path => Ok(found),
                _ => Err(BenchError::UnknownEntry {
                    path: entry.path.clone(),
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        archive::write_archive(&snapshot.root, resolved, writer)
    }

    pub fn corpus_status(&self) -> CorpusStatus {
        let snapshot = self.snapshot();
        let last_sync = self
            .last_sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        CorpusStatus {
            version: snapshot.as_ref().map(|s| s.version.clone()),
            corpus_root: snapshot.as_ref().map(|s| s.root.clone()),
            entry_count: snapshot.as_ref().map_or(0, |s| s.index.len()),
            skipped_count: snapshot.as_ref().map_or(0, |s| s.index.skipped().len()),
            total_size: snapshot.as_ref().map_or(0, |s| s.index.total_size()),
            last_sync,
        }
    }

    /// Current state of the sync machine
    pub fn sync_state(&self) -> SyncState {
        self.sync
            .as_ref()
            .map_or(SyncState::Unchecked, VersionSync::state)
    }

    /// Load the corpus named by the lock file, if there is one
    pub async fn load_installed(&self) -> Result<bool> {
        let Some(installed) = self.version_sync()?.load_installed().await? else {
            return Ok(false);
        };
        self.swap(CorpusSnapshot {
            version: installed.version,
            root: installed.root,
            index: installed.index,
        });
        Ok(true)
    }

    /// Latest published version
    pub async fn check_remote_version(&self) -> Result<CorpusVersion> {
        let sync = self.version_sync()?;
        let local = self.snapshot().map(|s| s.version.clone());
        Ok(sync.check(local.as_ref()).await?.version)
    }

    /// Sync with the remote, swapping in a new corpus if one was installed
    ///
    /// A call made while another sync is running returns `Coalesced`
    /// immediately.
    pub async fn sync(&self) -> Result<SyncReport> {
        let served = self.snapshot().map(|s| s.version.clone());
        self.sync_from(served).await
    }

    /// Sync assuming `previous` is the version being served
    async fn sync_from(&self, previous: Option<CorpusVersion>) -> Result<SyncReport> {
        let sync = self.version_sync()?;
        let Ok(_guard) = self.sync_guard.try_lock() else {
            tracing::debug!("Sync already in progress");
            let snapshot = self.snapshot();
            return Ok(SyncReport {
                outcome: SyncOutcome::Coalesced,
                version: snapshot.as_ref().map(|s| s.version.clone()),
                entry_count: snapshot.as_ref().map_or(0, |s| s.index.len()),
                state: sync.state(),
            });
        };

        match sync.sync(previous.as_ref()).await {
            Ok(SyncResult::UpToDate(version)) => {
                self.record(LastSyncResult::UpToDate {
                    version: version.clone(),
                });
                Ok(SyncReport {
                    outcome: SyncOutcome::UpToDate,
                    entry_count: self.snapshot().map_or(0, |s| s.index.len()),
                    version: Some(version),
                    state: sync.state(),
                })
            }
            Ok(SyncResult::Installed(installed)) => {
                let version = installed.version.clone();
                let entry_count = installed.index.len();
                self.swap(CorpusSnapshot {
                    version: installed.version,
                    root: installed.root,
                    index: installed.index,
                });
                self.record(LastSyncResult::Updated {
                    from: previous,
                    to: version.clone(),
                });
                Ok(SyncReport {
                    outcome: SyncOutcome::Updated,
                    version: Some(version),
                    entry_count,
                    state: sync.state(),
                })
            }
            Err(e) => {
                self.record(LastSyncResult::Failed {
                    state: sync.state(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Make sure a usable corpus is loaded
    ///
    /// Syncs before anything is indexed, comparing against the version in
    /// the lock file. The installed corpus is only indexed if it is still
    /// current or the sync failed; a failed sync is tolerated as long as
    /// some corpus is available.
    pub async fn ensure_ready(&self) -> Result<CorpusStatus> {
        let Some(sync) = &self.sync else {
            self.require_snapshot()?;
            return Ok(self.corpus_status());
        };

        let served = match self.snapshot() {
            Some(current) => Some(current.version.clone()),
            None => match sync.installed_lock() {
                Ok(lock) => lock
                    .filter(|lock| lock.corpus_root(sync.data_dir()).is_dir())
                    .map(|lock| lock.version),
                Err(e) => {
                    tracing::warn!("Ignoring installed corpus: {}", e);
                    None
                }
            },
        };

        let synced = self.sync_from(served).await;

        if self.snapshot().is_none() {
            if let Err(e) = self.load_installed().await {
                tracing::warn!("Ignoring installed corpus: {}", e);
            }
        }

        if let Err(e) = synced {
            let Some(current) = self.snapshot() else {
                return Err(BenchError::CorpusUnavailable {
                    reason: e.to_string(),
                });
            };
            if e.is_transport() {
                tracing::warn!(
                    "Remote unavailable, continuing with corpus {}: {}",
                    current.version,
                    e
                );
            } else {
                tracing::error!("Sync failed, continuing with corpus {}: {}", current.version, e);
            }
        }

        Ok(self.corpus_status())
    }
}
