//! Error kinds surfaced by frame construction, link handling and address resolution.
use std::net::Ipv4Addr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    /// An address given to a frame builder cannot be encoded on the wire.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// The device could not be opened or has no usable link/IPv4 identity.
    #[error("interface {interface} unavailable: {reason}")]
    InterfaceUnavailable { interface: String, reason: String },
    #[error("cannot install filter {program:?}: {source}")]
    FilterError {
        program: String,
        #[source]
        source: pcap::Error,
    },
    /// A read on the capture handle failed for another reason than its timeout.
    #[error("capture error: {0}")]
    CaptureError(#[source] pcap::Error),
    #[error("cannot transmit frame: {0}")]
    TransmitError(#[source] pcap::Error),
    #[error("no ARP reply from {target} within {timeout:?}")]
    ResolutionTimeout { target: Ipv4Addr, timeout: Duration },
}

impl ProbeError {
    /// A short, stable name for the error kind, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ProbeError::InvalidAddress(_) => "invalid_address",
            ProbeError::InterfaceUnavailable { .. } => "interface_unavailable",
            ProbeError::FilterError { .. } => "filter_error",
            ProbeError::CaptureError(_) => "capture_error",
            ProbeError::TransmitError(_) => "transmit_error",
            ProbeError::ResolutionTimeout { .. } => "resolution_timeout",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProbeError::ResolutionTimeout { .. })
    }
}
