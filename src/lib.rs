//! Tracelight - passive blocklist-aware traffic attribution.
//!
//! Tracelight watches a single network interface, spots DNS queries for
//! domains on a blocklist, resolves those domains through a fixed
//! upstream, and then attributes later TCP/UDP traffic to the domain by
//! destination address. It observes and reports; it never blocks or
//! rewrites anything.
//!
//! # Architecture
//!
//! - [`config`]: Configuration loading and validation
//! - [`blocklist`]: Block set, line parsers, and source loading
//! - [`network`]: Frame capture and per-frame classification
//! - [`dns`]: Forward resolution against the fixed upstream
//! - [`attribution`]: The IP-to-domain correlation table
//! - [`events`]: Event types and sinks
//! - [`pipeline`]: Orchestration
//! - [`error`]: Error types
//!
//! # Testing
//!
//! The capture source, resolver, and event sink are all traits, so the
//! whole pipeline runs against synthetic frames without touching a real
//! interface:
//!
//! ```rust
//! use tracelight::blocklist::DomainBlockSet;
//!
//! let set = DomainBlockSet::new(["ads.example.com"]);
//! assert!(set.is_blocked("track.ads.example.com"));
//! ```

pub mod attribution;
pub mod blocklist;
pub mod config;
pub mod dns;
pub mod error;
pub mod events;
pub mod metrics;
pub mod network;
pub mod pipeline;

pub use config::Config;
pub use error::{Error, Result};
