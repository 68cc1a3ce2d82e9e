//! Network-related modules: frame capture and classification.

pub mod capture;
pub mod classify;

pub use capture::{find_interface, FrameCapture, PnetCapture};
pub use classify::{classify, ClassifiedFrame, DecodeError, Protocol, DNS_PORT};
