//! Send probes on the network.
use log::{debug, info};
use pnet::datalink::MacAddr;

use crate::builder::{build_icmp_echo, mac_octets, Frame};
use crate::error::ProbeError;
use crate::flows::FlowPair;
use crate::interface::InterfaceInfo;
use crate::link::{Link, LinkProvider};

/// Writes ICMP echo requests on a link opened once for the whole run.
pub struct Sender<L: Link> {
    dry_run: bool,
    link: L,
    src_mac: MacAddr,
}

impl<L: Link> Sender<L> {
    pub fn new<P: LinkProvider<Link = L>>(
        provider: &P,
        interface: &InterfaceInfo,
        dry_run: bool,
    ) -> Result<Self, ProbeError> {
        let link = provider.open_transmit(&interface.name)?;
        info!("src_mac={} dry_run={}", interface.mac, dry_run);
        Ok(Sender {
            dry_run,
            link,
            src_mac: interface.mac,
        })
    }

    /// Build the echo request of `flow`, addressed to `dst_mac`, and write it on the link.
    ///
    /// The frame is returned, whether it was written or not (dry run).
    pub fn send(&mut self, flow: &FlowPair, dst_mac: MacAddr) -> Result<Frame, ProbeError> {
        let frame = build_icmp_echo(
            &mac_octets(self.src_mac),
            &mac_octets(dst_mac),
            flow.src_addr.into(),
            flow.dst_addr.into(),
        )?;
        if self.dry_run {
            debug!("{} dst_mac={} dry_run=true", flow, dst_mac);
        } else {
            self.link.send_frame(&frame)?;
        }
        Ok(frame)
    }
}
