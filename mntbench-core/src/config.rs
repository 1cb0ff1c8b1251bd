//! Sync configuration (`config.yaml`)
//!
//! Every field has a default, so a missing file or a partial file is fine.
//! The GitHub token is never stored here; it comes from `GITHUB_TOKEN`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BenchError, Result};

/// Repository whose releases carry the corpus
pub const DEFAULT_REPOSITORY: &str = "cda-tum/mnt-bench";

/// GitHub REST endpoint
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Release asset holding every benchmark file
pub const DEFAULT_ASSET_NAME: &str = "MNTBench_all.zip";

/// Config file name inside the platform config directory
const CONFIG_FILE: &str = "config.yaml";

/// Environment variable consulted for an API token
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default, deny_unknown_fields)]
pub struct SyncConfig {
    /// `owner/name` of the GitHub repository
    pub repository: String,
    pub api_url: String,
    pub asset_name: String,
    /// Where corpora, staging files and the lock file live
    pub data_dir: Option<PathBuf>,
    /// Ignore releases newer than this version
    pub max_version: Option<String>,
    pub check_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            repository: DEFAULT_REPOSITORY.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            asset_name: DEFAULT_ASSET_NAME.to_string(),
            data_dir: None,
            max_version: None,
            check_timeout_secs: 30,
            download_timeout_secs: 600,
            user_agent: concat!("mntbench/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SyncConfig {
    /// Load from the platform config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from an explicit path; a missing file yields defaults
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| BenchError::io(path, e))?;
        let config = Self::from_yaml(&content).map_err(|reason| BenchError::Config {
            path: path.to_path_buf(),
            reason,
        })?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse and validate YAML content
    pub fn from_yaml(content: &str) -> std::result::Result<Self, String> {
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml_ng::from_str(content).map_err(|e| e.to_string())?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        match self.repository.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {}
            _ => {
                return Err(format!(
                    "repository must be 'owner/name', got '{}'",
                    self.repository
                ))
            }
        }
        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            return Err("api_url must start with http:// or https://".to_string());
        }
        if self.asset_name.trim().is_empty() {
            return Err("asset_name must not be empty".to_string());
        }
        if let Some(max) = &self.max_version {
            semver::Version::parse(max.trim_start_matches('v'))
                .map_err(|e| format!("max_version '{max}' is not a semantic version: {e}"))?;
        }
        if self.check_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err("timeouts must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Effective data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| BenchError::Config {
                path: PathBuf::from(CONFIG_FILE),
                reason: "could not determine a data directory; set data_dir".to_string(),
            })
    }

    /// Parsed `max_version`, already validated
    pub fn max_version(&self) -> Option<semver::Version> {
        self.max_version
            .as_deref()
            .and_then(|v| semver::Version::parse(v.trim_start_matches('v')).ok())
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.check_timeout_secs)
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    /// API token from the environment, if any
    pub fn token() -> Option<String> {
        std::env::var(TOKEN_ENV)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("edu", "cda-tum", "mntbench")
}

/// `config.yaml` in the platform config directory
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert_eq!(config.repository, DEFAULT_REPOSITORY);
        assert_eq!(config.asset_name, "MNTBench_all.zip");
        assert_eq!(config.check_timeout(), Duration::from_secs(30));
        assert!(config.max_version().is_none());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = SyncConfig::from_yaml("max_version: v1.2.0\ndata_dir: /tmp/mnt\n").unwrap();
        assert_eq!(config.max_version(), Some(semver::Version::new(1, 2, 0)));
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/mnt"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_invalid_yaml_rejected() {
        assert!(SyncConfig::from_yaml("repository: just-a-name\n").is_err());
        assert!(SyncConfig::from_yaml("max_version: latest\n").is_err());
        assert!(SyncConfig::from_yaml("check_timeout_secs: 0\n").is_err());
        assert!(SyncConfig::from_yaml("colour: blue\n").is_err());
    }

    #[test]
    fn test_load_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.yaml");

        let missing = SyncConfig::load_from_path(&path).unwrap();
        assert_eq!(missing, SyncConfig::default());

        std::fs::write(&path, "api_url: ftp://example.com\n").unwrap();
        assert!(matches!(
            SyncConfig::load_from_path(&path),
            Err(BenchError::Config { .. })
        ));
    }
}
