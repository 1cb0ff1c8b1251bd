//! Sync state machine
//!
//! A pure transition function over [`SyncState`]. The manager feeds it
//! events as work progresses; callers (the CLI, tests) only observe states.

use serde::Serialize;
use std::fmt;

use super::version::CorpusVersion;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SyncState {
    Unchecked,
    Checking,
    UpToDate { version: CorpusVersion },
    UpdateAvailable {
        local: Option<CorpusVersion>,
        remote: CorpusVersion,
    },
    CheckFailed { reason: String },
    Downloading { version: CorpusVersion },
    DownloadFailed { reason: String },
    Extracting { version: CorpusVersion },
    ExtractFailed { reason: String },
    Ready { version: CorpusVersion },
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// An explicit check or sync call
    CheckRequested,
    RemoteResolved {
        local: Option<CorpusVersion>,
        remote: CorpusVersion,
    },
    CheckFailed(String),
    DownloadStarted,
    DownloadVerified,
    DownloadFailed(String),
    Installed,
    ExtractFailed(String),
}

impl SyncState {
    /// Whether no sync step is in flight
    pub fn is_settled(&self) -> bool {
        !matches!(
            self,
            SyncState::Checking | SyncState::Downloading { .. } | SyncState::Extracting { .. }
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncState::CheckFailed { .. }
                | SyncState::DownloadFailed { .. }
                | SyncState::ExtractFailed { .. }
        )
    }

    /// Apply an event, returning the next state
    ///
    /// Events that make no sense in the current state leave it unchanged.
    pub fn transition(&self, event: SyncEvent) -> SyncState {
        use SyncEvent as E;
        use SyncState as S;

        match (self, event) {
            (state, E::CheckRequested) => {
                if !state.is_settled() {
                    tracing::debug!("Abandoning unfinished sync in state {}", state);
                }
                S::Checking
            }

            (S::Checking, E::RemoteResolved { local, remote }) => {
                if local.as_ref() == Some(&remote) {
                    S::UpToDate { version: remote }
                } else {
                    S::UpdateAvailable { local, remote }
                }
            }
            (S::Checking, E::CheckFailed(reason)) => S::CheckFailed { reason },

            (S::UpdateAvailable { remote, .. }, E::DownloadStarted) => S::Downloading {
                version: remote.clone(),
            },
            (S::Downloading { version }, E::DownloadVerified) => S::Extracting {
                version: version.clone(),
            },
            (S::Downloading { .. }, E::DownloadFailed(reason)) => S::DownloadFailed { reason },
            (S::Extracting { version }, E::Installed) => S::Ready {
                version: version.clone(),
            },
            (S::Extracting { .. }, E::ExtractFailed(reason)) => S::ExtractFailed { reason },

            (state, event) => {
                tracing::debug!("Ignoring {:?} in state {}", event, state);
                state.clone()
            }
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Unchecked => write!(f, "unchecked"),
            SyncState::Checking => write!(f, "checking"),
            SyncState::UpToDate { version } => write!(f, "up to date ({version})"),
            SyncState::UpdateAvailable {
                local: Some(local),
                remote,
            } => write!(f, "update available ({local} -> {remote})"),
            SyncState::UpdateAvailable {
                local: None,
                remote,
            } => write!(f, "update available (none -> {remote})"),
            SyncState::CheckFailed { reason } => write!(f, "check failed: {reason}"),
            SyncState::Downloading { version } => write!(f, "downloading {version}"),
            SyncState::DownloadFailed { reason } => write!(f, "download failed: {reason}"),
            SyncState::Extracting { version } => write!(f, "extracting {version}"),
            SyncState::ExtractFailed { reason } => write!(f, "extract failed: {reason}"),
            SyncState::Ready { version } => write!(f, "ready ({version})"),
        }
    }
}
