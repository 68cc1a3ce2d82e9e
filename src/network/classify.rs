//! Per-frame classification.
//!
//! Decodes one captured link-layer frame, layer by layer with typed
//! accessors, and routes it to the DNS-query path or the generic
//! traffic path. Every failure is a per-frame [`DecodeError`]; the
//! capture loop drops the frame and keeps going.

use std::net::Ipv4Addr;

use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet;
use serde::Serialize;

/// Destination port identifying DNS query candidates.
pub const DNS_PORT: u16 = 53;

/// Transport protocol of a classified traffic frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => f.write_str("tcp"),
            Self::Udp => f.write_str("udp"),
        }
    }
}

/// What a captured frame turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedFrame {
    /// UDP datagram to port 53: a DNS query candidate. Carries the
    /// UDP payload for DNS decoding.
    DnsQuery {
        source: Ipv4Addr,
        payload: Vec<u8>,
    },
    /// Any other TCP or UDP packet.
    Traffic {
        source: Ipv4Addr,
        destination: Ipv4Addr,
        /// Transport payload length.
        bytes: usize,
        protocol: Protocol,
    },
}

/// Why a frame was dropped instead of classified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("frame too short for an Ethernet header")]
    TruncatedEthernet,

    /// Not an error condition so much as out-of-scope traffic (ARP,
    /// IPv6, ...); surfaced as a distinct variant so callers can keep
    /// it out of their malformed-frame diagnostics.
    #[error("not an IPv4 frame (ethertype {0:#06x})")]
    NotIpv4(u16),

    #[error("truncated IPv4 header")]
    TruncatedIpv4,

    #[error("truncated {0} segment")]
    TruncatedTransport(Protocol),

    #[error("transport protocol {0} not classified")]
    UnhandledTransport(u8),
}

/// Classify one raw Ethernet frame.
pub fn classify(frame: &[u8]) -> Result<ClassifiedFrame, DecodeError> {
    let ethernet = EthernetPacket::new(frame).ok_or(DecodeError::TruncatedEthernet)?;

    if ethernet.get_ethertype() != EtherTypes::Ipv4 {
        return Err(DecodeError::NotIpv4(ethernet.get_ethertype().0));
    }

    let ipv4 = Ipv4Packet::new(ethernet.payload()).ok_or(DecodeError::TruncatedIpv4)?;
    let source = ipv4.get_source();
    let destination = ipv4.get_destination();

    match ipv4.get_next_level_protocol() {
        IpNextHeaderProtocols::Udp => {
            let udp = UdpPacket::new(ipv4.payload())
                .ok_or(DecodeError::TruncatedTransport(Protocol::Udp))?;

            if udp.get_destination() == DNS_PORT {
                Ok(ClassifiedFrame::DnsQuery {
                    source,
                    payload: udp.payload().to_vec(),
                })
            } else {
                Ok(ClassifiedFrame::Traffic {
                    source,
                    destination,
                    bytes: udp.payload().len(),
                    protocol: Protocol::Udp,
                })
            }
        }
        IpNextHeaderProtocols::Tcp => {
            let tcp = TcpPacket::new(ipv4.payload())
                .ok_or(DecodeError::TruncatedTransport(Protocol::Tcp))?;

            Ok(ClassifiedFrame::Traffic {
                source,
                destination,
                bytes: tcp.payload().len(),
                protocol: Protocol::Tcp,
            })
        }
        other => Err(DecodeError::UnhandledTransport(other.0)),
    }
}
