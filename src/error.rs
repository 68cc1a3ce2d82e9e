//! Error types for the tracelight attribution pipeline.

use std::io;
use std::net::AddrParseError;

use thiserror::Error;

/// Main error type for tracelight operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    #[error("DNS protocol error: {0}")]
    Protocol(#[from] hickory_proto::error::ProtoError),

    #[error("resolution failed: {0}")]
    Resolve(String),

    #[error("blocklist error: {0}")]
    Blocklist(#[from] crate::blocklist::source::LoadError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("metrics error: {0}")]
    Metrics(String),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[source] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("invalid upstream resolver address: {0}")]
    InvalidResolver(#[source] AddrParseError),

    #[error("validation failed: {0}")]
    Validation(String),
}

/// Network-related errors.
///
/// Only the interface/channel variants are fatal; they occur before the
/// first frame is read. Everything after that point is handled per-frame.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no suitable network interface found")]
    NoInterface,

    #[error("failed to open datalink channel: {0}")]
    ChannelOpen(String),

    #[error("unsupported channel type")]
    UnsupportedChannel,
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;
