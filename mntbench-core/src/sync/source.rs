//! Where corpus releases come from
//!
//! [`GithubReleaseSource`] talks to the GitHub REST API of the configured
//! repository. [`LocalArchiveSource`] serves an archive that is already on
//! disk, which is also how the sync path is exercised without a network.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use super::version::CorpusVersion;
use crate::config::SyncConfig;
use crate::error::{BenchError, Result};

/// A published corpus archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteRelease {
    pub version: CorpusVersion,
    pub asset_name: String,
    pub download_url: String,
    /// Advertised size in bytes
    pub size: Option<u64>,
    /// Advertised digest, `sha256:<hex>`
    pub digest: Option<String>,
}

/// Source of corpus releases
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Latest release that carries the corpus asset
    async fn latest_release(&self) -> Result<RemoteRelease>;

    /// Write the release asset to `dest`, returning the number of bytes written
    async fn download(&self, release: &RemoteRelease, dest: &Path) -> Result<u64>;
}

#[derive(Debug, Deserialize)]
struct TagRecord {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseRecord {
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    assets: Vec<AssetRecord>,
}

#[derive(Debug, Deserialize)]
struct AssetRecord {
    name: String,
    browser_download_url: String,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    digest: Option<String>,
}

/// Releases of a GitHub repository
pub struct GithubReleaseSource {
    client: reqwest::Client,
    api_url: String,
    repository: String,
    asset_name: String,
    max_version: Option<semver::Version>,
    check_timeout: Duration,
    token: Option<String>,
}

impl GithubReleaseSource {
    pub fn new(config: &SyncConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| BenchError::NetworkError {
                url: config.api_url.clone(),
                reason: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            repository: config.repository.clone(),
            asset_name: config.asset_name.clone(),
            max_version: config.max_version(),
            check_timeout: config.check_timeout(),
            token: SyncConfig::token(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.api_url, self.repository, path)
    }

    fn request(&self, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json");
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }

    /// GET an API endpoint; `Ok(None)` for 404
    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let response = self
            .request(url)
            .timeout(self.check_timeout)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if status == reqwest::StatusCode::FORBIDDEN
            || status == reqwest::StatusCode::TOO_MANY_REQUESTS
        {
            return Err(BenchError::NetworkError {
                url: url.to_string(),
                reason: format!(
                    "HTTP {status}; the GitHub API rate limit may be exhausted. \
                     Set GITHUB_TOKEN to a personal access token to raise it"
                ),
            });
        }
        if !status.is_success() {
            return Err(BenchError::NetworkError {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            });
        }

        let body = response.text().await.map_err(|e| network_error(url, e))?;
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|e| BenchError::RemoteFormatError {
                reason: format!("{url}: {e}"),
            })
    }

    fn admissible(&self, version: &CorpusVersion) -> bool {
        match (&self.max_version, version.release()) {
            (Some(max), Some(release)) => release <= max,
            _ => true,
        }
    }
}

#[async_trait]
impl ReleaseSource for GithubReleaseSource {
    async fn latest_release(&self) -> Result<RemoteRelease> {
        let tags_url = self.endpoint("tags?per_page=100");
        let tags: Vec<TagRecord> = self.get_json(&tags_url).await?.ok_or_else(|| {
            BenchError::RemoteFormatError {
                reason: format!("repository {} not found", self.repository),
            }
        })?;

        for tag in tags {
            let version = match tag.name.parse::<CorpusVersion>() {
                Ok(version) => version,
                Err(e) => {
                    tracing::debug!("Ignoring tag '{}': {}", tag.name, e);
                    continue;
                }
            };
            if !self.admissible(&version) {
                tracing::debug!("Skipping {} (newer than max_version)", version);
                continue;
            }

            let release_url = self.endpoint(&format!("releases/tags/{}", tag.name));
            let Some(release) = self.get_json::<ReleaseRecord>(&release_url).await? else {
                tracing::debug!("Tag {} has no release", version);
                continue;
            };
            if release.draft {
                continue;
            }

            if let Some(asset) = release.assets.into_iter().find(|a| a.name == self.asset_name) {
                tracing::info!(
                    "Found '{}' (version {}, {} bytes)",
                    asset.name,
                    version,
                    asset.size.unwrap_or(0)
                );
                return Ok(RemoteRelease {
                    version,
                    asset_name: asset.name,
                    download_url: asset.browser_download_url,
                    size: asset.size,
                    digest: asset.digest,
                });
            }
        }

        Err(BenchError::RemoteFormatError {
            reason: format!(
                "no release of {} carries the asset '{}'",
                self.repository, self.asset_name
            ),
        })
    }

    async fn download(&self, release: &RemoteRelease, dest: &Path) -> Result<u64> {
        let url = release.download_url.as_str();
        tracing::info!("Downloading {} from {}", release.version, url);

        let mut response = self
            .request(url)
            .header(reqwest::header::ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        if !response.status().is_success() {
            return Err(BenchError::NetworkError {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| BenchError::io(dest, e))?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| network_error(url, e))? {
            file.write_all(&chunk)
                .await
                .map_err(|e| BenchError::io(dest, e))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|e| BenchError::io(dest, e))?;

        Ok(written)
    }
}

fn network_error(url: &str, e: reqwest::Error) -> BenchError {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else {
        e.to_string()
    };
    BenchError::NetworkError {
        url: url.to_string(),
        reason,
    }
}

/// A corpus archive already present on disk
#[derive(Debug, Clone)]
pub struct LocalArchiveSource {
    version: CorpusVersion,
    archive: PathBuf,
}

impl LocalArchiveSource {
    pub fn new(version: CorpusVersion, archive: impl Into<PathBuf>) -> Self {
        Self {
            version,
            archive: archive.into(),
        }
    }
}

#[async_trait]
impl ReleaseSource for LocalArchiveSource {
    async fn latest_release(&self) -> Result<RemoteRelease> {
        let metadata = tokio::fs::metadata(&self.archive)
            .await
            .map_err(|e| BenchError::NetworkError {
                url: self.archive.display().to_string(),
                reason: e.to_string(),
            })?;

        Ok(RemoteRelease {
            version: self.version.clone(),
            asset_name: self
                .archive
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            download_url: self.archive.display().to_string(),
            size: Some(metadata.len()),
            digest: None,
        })
    }

    async fn download(&self, _release: &RemoteRelease, dest: &Path) -> Result<u64> {
        tokio::fs::copy(&self.archive, dest)
            .await
            .map_err(|e| BenchError::io(&self.archive, e))
    }
}
