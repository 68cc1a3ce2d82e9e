//! Blocklist source loading.
//!
//! Pulls domain lists from local files and remote URLs and merges them,
//! together with inline config entries, into one [`DomainBlockSet`].
//! A source that fails to load is logged and skipped so that a dead
//! mirror never prevents startup; an entirely empty result is valid
//! (the pipeline then simply never blocks anything).

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;

use super::parse::parse_lines;
use super::DomainBlockSet;
use crate::config::Config;

/// Timeout for fetching a single remote list.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// User-Agent header for remote fetches.
const USER_AGENT: &str = concat!("tracelight/", env!("CARGO_PKG_VERSION"));

/// Error type for blocklist loading operations.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// File was not found at the specified path.
    #[error("file not found: {0:?}")]
    NotFound(PathBuf),

    /// I/O error while reading a file.
    #[error("I/O error reading {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request completed with a non-success status.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus { url: String, status: u16 },

    /// Network error during an HTTP request.
    #[error("network error fetching {url}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

/// Loads blocklist sources configured for the pipeline.
pub struct SourceLoader {
    client: Client,
}

impl SourceLoader {
    pub fn new() -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(LoadError::ClientBuild)?;

        Ok(Self { client })
    }

    /// Load a blocklist from a local file.
    pub async fn load_file(&self, path: &Path) -> Result<Vec<String>, LoadError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                LoadError::NotFound(path.to_path_buf())
            } else {
                LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Ok(parse_lines(&content))
    }

    /// Fetch a blocklist from a remote URL.
    pub async fn fetch_url(&self, url: &str) -> Result<Vec<String>, LoadError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| LoadError::Network {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| LoadError::Network {
            url: url.to_string(),
            source,
        })?;

        Ok(parse_lines(&body))
    }

    /// Load every configured source and merge into one block set.
    ///
    /// Failed sources are logged and skipped.
    pub async fn load_all(&self, config: &Config) -> DomainBlockSet {
        let mut domains: Vec<String> = config.blocklist.clone();
        tracing::debug!(count = domains.len(), "loaded inline blocklist entries");

        for path in &config.blocklist_files {
            match self.load_file(path).await {
                Ok(loaded) => {
                    tracing::info!(path = ?path, count = loaded.len(), "loaded blocklist file");
                    domains.extend(loaded);
                }
                Err(err) => {
                    tracing::error!(path = ?path, error = %err, "failed to load blocklist file");
                }
            }
        }

        for url in &config.blocklist_urls {
            match self.fetch_url(url).await {
                Ok(loaded) => {
                    tracing::info!(url = %url, count = loaded.len(), "fetched blocklist");
                    domains.extend(loaded);
                }
                Err(err) => {
                    tracing::error!(url = %url, error = %err, "failed to fetch blocklist");
                }
            }
        }

        let set = DomainBlockSet::new(domains);
        tracing::info!(unique_domains = set.len(), "block set ready");
        set
    }
}
