//! Event types emitted by the attribution pipeline.
//!
//! Two kinds of events leave the pipeline: a blocked DNS query was
//! observed, or traffic to a previously attributed address was seen.
//! Both are immutable snapshots; downstream fan-out is the sink's
//! problem, not the pipeline's.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::network::Protocol;

/// A DNS query for a domain on the block set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedQueryEvent {
    pub timestamp: DateTime<Utc>,
    /// Question name, lowercase, no trailing dot.
    pub domain: String,
    /// Address the query came from.
    pub source: Ipv4Addr,
    #[serde(rename = "isBlacklisted")]
    pub is_blacklisted: bool,
}

/// A non-DNS packet whose destination address is attributed to a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficEvent {
    pub timestamp: DateTime<Utc>,
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Domain the destination address was attributed to.
    pub domain: String,
    /// Transport payload length in bytes.
    pub bytes: usize,
    pub protocol: Protocol,
}

/// Wire-level event union.
///
/// Serializes with a `type` discriminator so sinks can forward events
/// verbatim to external consumers:
///
/// ```json
/// {"type":"dns_query","timestamp":"...","domain":"ads.example",
///  "source":"10.0.0.5","isBlacklisted":true}
/// {"type":"traffic","timestamp":"...","source":"10.0.0.5",
///  "destination":"93.184.216.34","domain":"ads.example",
///  "bytes":1200,"protocol":"tcp"}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "dns_query")]
    BlockedQuery(BlockedQueryEvent),
    #[serde(rename = "traffic")]
    Traffic(TrafficEvent),
}

impl Event {
    /// Build a blocked-query event stamped with the current time.
    pub fn blocked_query(domain: impl Into<String>, source: Ipv4Addr) -> Self {
        Self::BlockedQuery(BlockedQueryEvent {
            timestamp: Utc::now(),
            domain: domain.into(),
            source,
            is_blacklisted: true,
        })
    }

    /// Serialize to the JSON wire form shown above.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Build a traffic event stamped with the current time.
    pub fn traffic(
        source: Ipv4Addr,
        destination: Ipv4Addr,
        domain: impl Into<String>,
        bytes: usize,
        protocol: Protocol,
    ) -> Self {
        Self::Traffic(TrafficEvent {
            timestamp: Utc::now(),
            source,
            destination,
            domain: domain.into(),
            bytes,
            protocol,
        })
    }
}

/// Consumer of pipeline events.
///
/// `publish` is fire-and-forget: implementations must return promptly
/// and may drop events under pressure, but must never block the caller
/// for unbounded time.
pub trait EventSink: Send + Sync + 'static {
    fn publish(&self, event: Event);
}

/// Fan-out sink over a tokio broadcast channel.
///
/// Publishing with no subscribers is fine (events are discarded), and a
/// lagging subscriber loses old events instead of applying backpressure
/// to the packet path.
#[derive(Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<Event>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: Event) {
        // send only fails when there are no receivers; nothing to do then.
        let _ = self.tx.send(event);
    }
}
