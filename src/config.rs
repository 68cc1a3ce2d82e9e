//! Configuration loading and validation.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConfigError, Result};

/// Main configuration for the tracelight pipeline.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Network interface to capture on. If None, auto-detect.
    pub interface: Option<String>,

    /// Upstream DNS server used to resolve blocked domains
    /// (e.g., "1.1.1.1:53"). Deliberately not the host's resolver.
    #[serde(
        default = "default_upstream_resolver",
        deserialize_with = "deserialize_socket_addr"
    )]
    pub upstream_resolver: SocketAddr,

    /// Timeout for a single resolution, in seconds. A timeout is
    /// reported as a resolution failure.
    #[serde(default = "default_resolve_timeout")]
    pub resolve_timeout_seconds: u64,

    /// Inline blocked domains.
    #[serde(default)]
    pub blocklist: Vec<String>,

    /// Local blocklist files (domain-per-line or hosts format,
    /// detected per line).
    #[serde(default)]
    pub blocklist_files: Vec<PathBuf>,

    /// Remote blocklist URLs fetched at startup.
    #[serde(default)]
    pub blocklist_urls: Vec<String>,

    /// Channel capacity for the captured-frame queue.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Broadcast capacity for the event sink. Lagging subscribers
    /// lose events rather than stalling the pipeline.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Prometheus metrics exporter.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Metrics exporter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Enable the Prometheus scrape endpoint.
    #[serde(default)]
    pub enabled: bool,

    /// Listen address for the scrape endpoint.
    #[serde(
        default = "default_metrics_listen",
        deserialize_with = "deserialize_socket_addr"
    )]
    pub listen: SocketAddr,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen: default_metrics_listen(),
        }
    }
}

fn default_upstream_resolver() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::new(1, 1, 1, 1), 53))
}

fn default_metrics_listen() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 9184))
}

const fn default_resolve_timeout() -> u64 {
    5
}

const fn default_channel_capacity() -> usize {
    1000
}

const fn default_event_capacity() -> usize {
    256
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> std::result::Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.resolve_timeout_seconds == 0 {
            return Err(
                ConfigError::Validation("resolve_timeout_seconds must be > 0".into()).into(),
            );
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::Validation("channel_capacity must be > 0".into()).into());
        }

        if self.event_capacity == 0 {
            return Err(ConfigError::Validation("event_capacity must be > 0".into()).into());
        }

        for domain in &self.blocklist {
            if domain.trim().is_empty() {
                return Err(ConfigError::Validation("empty blocklist entry".into()).into());
            }
        }

        for url in &self.blocklist_urls {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::Validation(format!(
                    "blocklist URL must start with http:// or https://: {url:?}"
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
            interface = "wlan0"
            upstream_resolver = "9.9.9.9:53"
            blocklist = ["ads.example.com", "tracker.net"]
        "#;

        let config = Config::parse(toml).unwrap();
        assert_eq!(config.interface.as_deref(), Some("wlan0"));
        assert_eq!(config.upstream_resolver.to_string(), "9.9.9.9:53");
        assert_eq!(config.blocklist.len(), 2);
    }

    #[test]
    fn test_default_values() {
        let config = Config::parse("").unwrap();
        assert!(config.interface.is_none());
        assert_eq!(config.upstream_resolver.to_string(), "1.1.1.1:53");
        assert_eq!(config.resolve_timeout_seconds, 5);
        assert_eq!(config.channel_capacity, 1000);
        assert_eq!(config.event_capacity, 256);
        assert!(config.blocklist.is_empty());
        assert!(config.blocklist_urls.is_empty());
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_metrics_config() {
        let toml = r#"
            [metrics]
            enabled = true
            listen = "0.0.0.0:9184"
        "#;

        let config = Config::parse(toml).unwrap();
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.listen.to_string(), "0.0.0.0:9184");
    }

    #[test]
    fn test_invalid_resolver_address() {
        let toml = r#"
            upstream_resolver = "not-an-address"
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_zero_resolve_timeout_rejected() {
        let toml = r#"
            resolve_timeout_seconds = 0
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_empty_blocklist_entry_rejected() {
        let toml = r#"
            blocklist = ["ads.example.com", "  "]
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_non_http_blocklist_url_rejected() {
        let toml = r#"
            blocklist_urls = ["ftp://lists.example.com/ads.txt"]
        "#;

        assert!(Config::parse(toml).is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = r#"
            unknown_field = "value"
        "#;

        assert!(Config::parse(toml).is_err());
    }
}
