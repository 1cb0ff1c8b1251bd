//! Corpus version synchronization
//!
//! Keeps the local benchmark corpus in step with the published releases.
//!
//! # Architecture
//!
//! ```text
//! GitHub releases (cda-tum/mnt-bench)
//!     │
//!     └── MNTBench_all.zip    ← every benchmark file of one release
//!            │
//!            ▼  download + verify
//!     <data_dir>/staging/
//!            │
//!            ▼  extract + index
//!     <data_dir>/corpora/<version>-<id>/
//!     <data_dir>/corpus.lock  ← points at the current corpus
//! ```

mod lock;
mod manager;
mod source;
mod state;
mod version;

pub use lock::{CorpusLock, LOCK_FILE};
pub use manager::{
    extract_archive, verify_archive, InstalledCorpus, SyncResult, VersionSync, CORPORA_DIR,
    STAGING_DIR,
};
pub use source::{GithubReleaseSource, LocalArchiveSource, ReleaseSource, RemoteRelease};
pub use state::{SyncEvent, SyncState};
pub use version::{compare, CorpusVersion, VersionComparison, LOCAL_VERSION};
