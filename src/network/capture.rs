//! Frame capture abstraction.
//!
//! A trait over the capture source keeps the pipeline testable with
//! synthetic frames and leaves room for other capture backends.

use pnet::datalink::{self, Channel, DataLinkReceiver, NetworkInterface};

use crate::error::{NetworkError, Result};

/// Trait for capture-source implementations.
pub trait FrameCapture: Send {
    /// Receive the next raw frame.
    /// Returns None when the capture has ended.
    fn next_frame(&mut self) -> Option<Vec<u8>>;
}

/// Find a suitable network interface.
///
/// With a name, that exact interface must exist. Without one, the
/// first interface that is up, not loopback, and has an address wins.
pub fn find_interface(name: Option<&str>) -> Result<NetworkInterface> {
    let interfaces = datalink::interfaces();

    if let Some(name) = name {
        interfaces
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| NetworkError::NoInterface.into())
    } else {
        interfaces
            .into_iter()
            .find(|iface| iface.is_up() && !iface.is_loopback() && !iface.ips.is_empty())
            .ok_or_else(|| NetworkError::NoInterface.into())
    }
}

/// Production capture reading from a pnet datalink channel.
///
/// The channel yields every frame on the interface; selection of the
/// traffic we care about happens in [`classify`](super::classify).
pub struct PnetCapture {
    rx: Box<dyn DataLinkReceiver>,
}

impl PnetCapture {
    /// Open a capture on the given interface.
    ///
    /// Failure here (unknown interface, insufficient privilege) is the
    /// one fatal error of the pipeline; it happens before any frame is
    /// processed.
    pub fn open(interface: &NetworkInterface) -> Result<Self> {
        let rx = match datalink::channel(interface, datalink::Config::default()) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => return Err(NetworkError::UnsupportedChannel.into()),
            Err(e) => return Err(NetworkError::ChannelOpen(e.to_string()).into()),
        };

        Ok(Self { rx })
    }
}

impl FrameCapture for PnetCapture {
    fn next_frame(&mut self) -> Option<Vec<u8>> {
        self.rx.next().ok().map(<[u8]>::to_vec)
    }
}
