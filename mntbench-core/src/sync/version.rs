//! Published corpus versions

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::BenchError;

/// Version label used for a corpus directory given on the command line
pub const LOCAL_VERSION: &str = "local";

/// Release tag of a corpus, e.g. `v1.2.0` or `v1.2.0-4-gabc1234`
///
/// The string form is kept verbatim; two versions are equal only if their
/// tags are identical after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorpusVersion {
    tag: String,
    release: Option<semver::Version>,
}

/// Result of comparing a local and a remote version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionComparison {
    Same,
    Different,
}

/// `v1.2.0`, optionally followed by a `git describe` suffix
const TAG_PATTERN: &str = r"^v?(\d+\.\d+\.\d+)(?:-(\d+)-g([0-9a-f]+))?$";

impl CorpusVersion {
    /// Version of a corpus that was not obtained from a release
    pub fn local() -> Self {
        Self {
            tag: LOCAL_VERSION.to_string(),
            release: None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.tag
    }

    /// The semantic release part, if this is a release tag
    pub fn release(&self) -> Option<&semver::Version> {
        self.release.as_ref()
    }

    pub fn is_local(&self) -> bool {
        self.tag == LOCAL_VERSION
    }

    /// Directory-safe form of the tag
    pub fn slug(&self) -> String {
        self.tag
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
            .collect()
    }
}

/// Equality only; version ordering is never used to decide on a sync
pub fn compare(local: &CorpusVersion, remote: &CorpusVersion) -> VersionComparison {
    if local == remote {
        VersionComparison::Same
    } else {
        VersionComparison::Different
    }
}

impl FromStr for CorpusVersion {
    type Err = BenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        if tag == LOCAL_VERSION {
            return Ok(Self::local());
        }
        let pattern = Regex::new(TAG_PATTERN).map_err(|e| BenchError::RemoteFormatError {
            reason: e.to_string(),
        })?;
        let captures = pattern
            .captures(tag)
            .ok_or_else(|| BenchError::RemoteFormatError {
                reason: format!("'{tag}' is not a release tag"),
            })?;
        let release = semver::Version::parse(&captures[1]).map_err(|e| {
            BenchError::RemoteFormatError {
                reason: format!("'{tag}': {e}"),
            }
        })?;
        Ok(Self {
            tag: tag.to_string(),
            release: Some(release),
        })
    }
}

impl fmt::Display for CorpusVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

impl Serialize for CorpusVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.tag)
    }
}

impl<'de> Deserialize<'de> for CorpusVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
