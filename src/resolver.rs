//! Resolve IPv4 addresses to link-layer addresses with ARP.
//!
//! # Examples
//!
//! ```no_run
//! use std::net::Ipv4Addr;
//! use std::time::Duration;
//! use ipvsping::interface::InterfaceInfo;
//! use ipvsping::link::PcapProvider;
//! use ipvsping::resolver::Resolver;
//!
//! let interface = InterfaceInfo::lookup("eth0").unwrap();
//! let resolver = Resolver::new(PcapProvider::default(), interface, Duration::from_secs(3));
//! let mac = resolver.resolve(Ipv4Addr::new(10, 0, 0, 5)).unwrap();
//! println!("{}", mac);
//! ```
use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use log::trace;
use pnet::datalink::MacAddr;

use crate::builder::{build_arp_request, mac_octets};
use crate::error::ProbeError;
use crate::interface::InterfaceInfo;
use crate::link::{Link, LinkProvider};
use crate::parser::parse_arp_reply;

/// Time to wait for an ARP reply.
pub const DEFAULT_RESOLUTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Only ARP replies reach the receive loop.
pub const ARP_REPLY_FILTER: &str = "arp and arp[6:2] = 2";

/// Sends one ARP request per call and waits for the matching reply.
///
/// Every call opens its own link and closes it before returning,
/// and nothing is cached between calls.
pub struct Resolver<P: LinkProvider> {
    provider: P,
    interface: InterfaceInfo,
    timeout: Duration,
}

impl<P: LinkProvider> Resolver<P> {
    pub fn new(provider: P, interface: InterfaceInfo, timeout: Duration) -> Self {
        Resolver {
            provider,
            interface,
            timeout,
        }
    }

    pub fn interface(&self) -> &InterfaceInfo {
        &self.interface
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Return the hardware address of `target`.
    ///
    /// The result is the sender hardware address of the first ARP reply whose
    /// sender protocol address is `target`. Fails with
    /// [`ProbeError::ResolutionTimeout`] if no such reply is captured before the
    /// deadline; this call never blocks longer than the deadline plus one read
    /// timeout of the link.
    pub fn resolve(&self, target: Ipv4Addr) -> Result<MacAddr, ProbeError> {
        let deadline = Instant::now() + self.timeout;
        let request = build_arp_request(
            &mac_octets(self.interface.mac),
            self.interface.ipv4.into(),
            target.into(),
        )?;

        let mut link = self.provider.open(&self.interface.name)?;
        // Filter, then send, then listen.
        link.set_filter(ARP_REPLY_FILTER)?;
        link.send_frame(&request)?;
        trace!("target={} state=request_sent", target);

        trace!("target={} state=listening", target);
        loop {
            if Instant::now() >= deadline {
                trace!("target={} state=timed_out", target);
                return Err(ProbeError::ResolutionTimeout {
                    target,
                    timeout: self.timeout,
                });
            }
            let frame = match link.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(error) => {
                    trace!("target={} state=failed error={}", target, error);
                    return Err(error);
                }
            };
            match parse_arp_reply(&frame) {
                Some(reply) if reply.sender_proto_addr == target => {
                    trace!(
                        "target={} state=resolved mac={}",
                        target,
                        reply.sender_hw_addr
                    );
                    return Ok(reply.sender_hw_addr);
                }
                Some(reply) => trace!(
                    "target={} ignored_reply_from={}",
                    target,
                    reply.sender_proto_addr
                ),
                None => {}
            }
        }
    }
}
