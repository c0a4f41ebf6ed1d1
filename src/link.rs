//! Raw access to a network interface, for capturing and injecting frames.
//!
//! The resolver and the sender only talk to the [`Link`] and [`LinkProvider`]
//! traits; [`PcapProvider`] implements them on top of libpcap.
use log::debug;
use pcap::{Active, Capture, Direction, Linktype};

use crate::error::ProbeError;

/// Number of bytes captured per frame, enough for ARP replies.
pub const DEFAULT_SNAPLEN: i32 = 512;
/// Timeout of a single blocking read, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: i32 = 10;

/// An open capture/transmit handle bound to one interface.
///
/// The handle is closed when dropped.
pub trait Link {
    /// Install a BPF filter on the receive side of the handle.
    fn set_filter(&mut self, program: &str) -> Result<(), ProbeError>;

    /// Wait for the next frame, for at most the handle's read timeout.
    ///
    /// Returns `Ok(None)` when the read timeout expired without a frame.
    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProbeError>;

    /// Write a frame on the wire.
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ProbeError>;
}

/// Opens [`Link`]s on a named interface.
pub trait LinkProvider {
    type Link: Link;

    /// Open a link for capturing and transmitting frames.
    fn open(&self, interface: &str) -> Result<Self::Link, ProbeError>;

    /// Open a link that is only written to; it captures nothing.
    fn open_transmit(&self, interface: &str) -> Result<Self::Link, ProbeError>;
}

/// Opens libpcap handles.
#[derive(Copy, Clone, Debug)]
pub struct PcapProvider {
    pub snaplen: i32,
    pub read_timeout_ms: i32,
    pub promiscuous: bool,
}

impl Default for PcapProvider {
    fn default() -> Self {
        PcapProvider {
            snaplen: DEFAULT_SNAPLEN,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            promiscuous: false,
        }
    }
}

impl LinkProvider for PcapProvider {
    type Link = PcapLink;

    fn open(&self, interface: &str) -> Result<PcapLink, ProbeError> {
        let unavailable = |reason: String| ProbeError::InterfaceUnavailable {
            interface: interface.to_string(),
            reason,
        };

        let cap = Capture::from_device(interface)
            .map_err(|error| unavailable(error.to_string()))?
            .snaplen(self.snaplen)
            .promisc(self.promiscuous)
            .timeout(self.read_timeout_ms)
            .immediate_mode(true)
            .open()
            .map_err(|error| unavailable(error.to_string()))?;
        check_ethernet(&cap, interface)?;

        // Ignore our own requests.
        cap.direction(Direction::In)
            .map_err(|error| unavailable(error.to_string()))?;

        debug!(
            "opened interface={} snaplen={} read_timeout_ms={} promiscuous={}",
            interface, self.snaplen, self.read_timeout_ms, self.promiscuous
        );
        Ok(PcapLink { cap })
    }

    fn open_transmit(&self, interface: &str) -> Result<PcapLink, ProbeError> {
        let cap = Capture::from_device(interface)
            .and_then(|cap| cap.buffer_size(0).snaplen(0).open())
            .map_err(|error| ProbeError::InterfaceUnavailable {
                interface: interface.to_string(),
                reason: error.to_string(),
            })?;
        check_ethernet(&cap, interface)?;
        debug!("opened interface={} transmit_only=true", interface);
        Ok(PcapLink { cap })
    }
}

/// Frames are built with an Ethernet header.
fn check_ethernet(cap: &Capture<Active>, interface: &str) -> Result<(), ProbeError> {
    let linktype = cap.get_datalink();
    if linktype != Linktype::ETHERNET {
        return Err(ProbeError::InterfaceUnavailable {
            interface: interface.to_string(),
            reason: format!(
                "unsupported link type: {} ({})",
                linktype.get_name().unwrap_or_default(),
                linktype.0
            ),
        });
    }
    Ok(())
}

pub struct PcapLink {
    cap: Capture<Active>,
}

impl Link for PcapLink {
    fn set_filter(&mut self, program: &str) -> Result<(), ProbeError> {
        self.cap
            .filter(program, true)
            .map_err(|source| ProbeError::FilterError {
                program: program.to_string(),
                source,
            })
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProbeError> {
        match self.cap.next_packet() {
            Ok(packet) => Ok(Some(packet.data.to_vec())),
            Err(pcap::Error::TimeoutExpired) | Err(pcap::Error::NoMorePackets) => Ok(None),
            Err(error) => Err(ProbeError::CaptureError(error)),
        }
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ProbeError> {
        self.cap
            .sendpacket(frame)
            .map_err(ProbeError::TransmitError)
    }
}
