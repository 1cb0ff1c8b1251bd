//! Error types for the benchmark catalog and corpus synchronization

use std::path::PathBuf;
use thiserror::Error;

/// Crate-wide result alias
pub type Result<T, E = BenchError> = std::result::Result<T, E>;

/// Errors raised by the catalog, query engine and sync manager
#[derive(Error, Debug)]
pub enum BenchError {
    /// A file name does not match any of the benchmark grammars
    #[error("Malformed benchmark identifier '{filename}': {reason}")]
    MalformedIdentifier { filename: String, reason: String },

    /// A structured identity violates the level invariant and cannot be encoded
    #[error("Invalid benchmark identity: {reason}")]
    InvalidIdentity { reason: String },

    /// Two corpus files decode to the same identity
    #[error("Duplicate benchmark identity '{identity}' in corpus:\n  {first}\n  {second}")]
    DuplicateIdentity {
        identity: String,
        first: String,
        second: String,
    },

    /// A corpus file was not a benchmark and has been left out of the index
    #[error("Skipped '{path}': {reason}")]
    SkippedEntry { path: String, reason: String },

    /// A filter names an unknown attribute or value
    #[error("Invalid filter for '{attribute}' = '{value}': {reason}")]
    InvalidFilter {
        attribute: String,
        value: String,
        reason: String,
    },

    /// A selected entry does not belong to the corpus being served
    #[error("'{path}' is not a benchmark file of the current corpus")]
    UnknownEntry { path: String },

    /// An archive was requested for an empty selection
    #[error("No benchmarks selected; refusing to build an empty archive")]
    EmptySelection,

    /// The remote release source could not be reached
    #[error("Network error while contacting {url}: {reason}")]
    NetworkError { url: String, reason: String },

    /// The remote answered, but not with something we understand
    #[error("Unexpected response from remote: {reason}")]
    RemoteFormatError { reason: String },

    /// The corpus archive could not be downloaded or failed verification
    #[error("Corpus download failed: {reason}")]
    DownloadFailed { reason: String },

    /// The corpus archive could not be unpacked or indexed
    #[error("Corpus extraction failed: {reason}")]
    ExtractFailed { reason: String },

    /// No local corpus exists and none could be fetched
    #[error("No usable benchmark corpus available.\n\n{reason}\n\nRun `mntbench sync` once network access is available, or pass --corpus <DIR>.")]
    CorpusUnavailable { reason: String },

    /// Configuration could not be read or parsed
    #[error("Invalid configuration at {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    /// Filesystem failure
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BenchError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BenchError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(filename: &str, reason: impl Into<String>) -> Self {
        BenchError::MalformedIdentifier {
            filename: filename.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_filter(
        attribute: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        BenchError::InvalidFilter {
            attribute: attribute.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from talking to the remote or unpacking its archive.
    ///
    /// Such errors never invalidate an already served corpus.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            BenchError::NetworkError { .. }
                | BenchError::RemoteFormatError { .. }
                | BenchError::DownloadFailed { .. }
                | BenchError::ExtractFailed { .. }
        )
    }
}
