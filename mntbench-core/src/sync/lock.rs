//! Corpus lock file management (`corpus.lock`)
//!
//! Records which extracted corpus directory is current. Replacing this file
//! is the commit point of a sync: until the rename lands, readers keep
//! seeing the previous corpus.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::version::CorpusVersion;
use crate::error::{BenchError, Result};

/// Lock file name inside the data directory
pub const LOCK_FILE: &str = "corpus.lock";

const API_VERSION: &str = "mntbench/v1";

/// The current corpus of a data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorpusLock {
    /// API version for schema compatibility
    pub api_version: String,
    /// When this lock file was last written
    pub generated: String,
    /// Release tag of the installed corpus
    pub version: CorpusVersion,
    /// Corpus directory, relative to the data directory
    pub corpus_dir: PathBuf,
    /// Digest of the archive the corpus came from
    pub digest: Option<String>,
    /// Number of indexed benchmark files
    pub entry_count: usize,
    /// When this corpus was installed
    pub installed_at: String,
}

impl CorpusLock {
    pub fn new(
        version: CorpusVersion,
        corpus_dir: PathBuf,
        digest: Option<String>,
        entry_count: usize,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            api_version: API_VERSION.to_string(),
            generated: now.clone(),
            version,
            corpus_dir,
            digest,
            entry_count,
            installed_at: now,
        }
    }

    /// Load the lock of a data directory; `None` if nothing is installed
    pub fn load(data_dir: &Path) -> Result<Option<Self>> {
        Self::load_from_path(&data_dir.join(LOCK_FILE))
    }

    pub fn load_from_path(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
        let lock: Self = serde_yaml_ng::from_str(&content).map_err(|e| BenchError::Config {
            path: path.to_path_buf(),
            reason: format!("failed to parse corpus lock: {e}"),
        })?;

        if lock.api_version != API_VERSION {
            return Err(BenchError::Config {
                path: path.to_path_buf(),
                reason: format!(
                    "unsupported lock apiVersion '{}' (expected '{}')",
                    lock.api_version, API_VERSION
                ),
            });
        }

        Ok(Some(lock))
    }

    /// Write the lock into `data_dir`, replacing any previous one atomically
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir).map_err(|e| BenchError::io(data_dir, e))?;

        let mut lock = self.clone();
        lock.generated = chrono::Utc::now().to_rfc3339();

        let content = serde_yaml_ng::to_string(&lock).map_err(|e| BenchError::Config {
            path: data_dir.join(LOCK_FILE),
            reason: format!("failed to serialize corpus lock: {e}"),
        })?;

        let path = data_dir.join(LOCK_FILE);
        let mut temp =
            tempfile::NamedTempFile::new_in(data_dir).map_err(|e| BenchError::io(data_dir, e))?;
        temp.write_all(content.as_bytes())
            .and_then(|_| temp.as_file().sync_all())
            .map_err(|e| BenchError::io(temp.path(), e))?;
        temp.persist(&path)
            .map_err(|e| BenchError::io(&path, e.error))?;

        Ok(())
    }

    /// Absolute corpus directory
    pub fn corpus_root(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.corpus_dir)
    }
}
