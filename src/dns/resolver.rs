//! Forward DNS resolution for blocked domains.
//!
//! Resolution runs off the packet path: the pipeline fires a task per
//! blocked query and the completion feeds the attribution table, so a
//! slow upstream can never stall frame processing. The upstream server
//! is fixed and explicit; we deliberately bypass the host's configured
//! resolver, which may itself be subject to the blocklist.

use std::future::Future;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{Name, RData, RecordType};
use hickory_proto::serialize::binary::{BinDecodable, BinEncodable};
use tokio::net::UdpSocket;

use crate::error::{Error, Result};

/// Maximum DNS message size over UDP.
const MAX_UDP_DNS_SIZE: usize = 512;

/// Trait for forward resolution of a domain to its IPv4 addresses.
///
/// An empty address list is a successful resolution (the domain simply
/// has no A records); errors cover timeouts, network failures, and
/// negative responses.
pub trait ForwardResolver: Send + Sync + Clone + 'static {
    fn resolve(&self, domain: &str) -> impl Future<Output = Result<Vec<Ipv4Addr>>> + Send;
}

/// Resolver querying a fixed upstream DNS server over UDP.
#[derive(Clone)]
pub struct UpstreamResolver {
    upstream_addr: SocketAddr,
    timeout: Duration,
}

impl UpstreamResolver {
    pub const fn new(upstream_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            upstream_addr,
            timeout,
        }
    }

    async fn exchange(&self, domain: &str) -> Result<Vec<Ipv4Addr>> {
        let name = Name::from_utf8(domain)?;

        let mut query = Message::new();
        query
            .set_id(fastrand::u16(..))
            .set_message_type(MessageType::Query)
            .set_op_code(OpCode::Query)
            .set_recursion_desired(true)
            .add_query(Query::query(name, RecordType::A));

        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(self.upstream_addr).await?;
        socket.send(&query.to_bytes()?).await?;

        let mut buf = [0u8; MAX_UDP_DNS_SIZE];
        let len = socket.recv(&mut buf).await?;
        let response = Message::from_bytes(&buf[..len])?;

        if response.response_code() != ResponseCode::NoError {
            return Err(Error::Resolve(format!(
                "{domain}: {}",
                response.response_code()
            )));
        }

        let addresses = response
            .answers()
            .iter()
            .filter_map(|record| match record.data() {
                Some(RData::A(a)) => Some(a.0),
                _ => None,
            })
            .collect();

        Ok(addresses)
    }
}

impl ForwardResolver for UpstreamResolver {
    async fn resolve(&self, domain: &str) -> Result<Vec<Ipv4Addr>> {
        match tokio::time::timeout(self.timeout, self.exchange(domain)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Resolve(format!("{domain}: timed out"))),
        }
    }
}
