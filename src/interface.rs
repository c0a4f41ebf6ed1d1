//! Link-layer and IPv4 identity of the local interface.
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr};

use pcap::Device;
use pnet::datalink::MacAddr;

use crate::error::ProbeError;

/// The addresses used as the source of the ARP requests and ICMP probes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterfaceInfo {
    pub name: String,
    pub mac: MacAddr,
    pub ipv4: Ipv4Addr,
}

impl InterfaceInfo {
    pub fn new(name: &str, mac: MacAddr, ipv4: Ipv4Addr) -> Self {
        InterfaceInfo {
            name: name.to_string(),
            mac,
            ipv4,
        }
    }

    /// Look up the hardware address and the first IPv4 address of the interface.
    pub fn lookup(interface: &str) -> Result<Self, ProbeError> {
        let unavailable = |reason: &str| ProbeError::InterfaceUnavailable {
            interface: interface.to_string(),
            reason: reason.to_string(),
        };
        let mac = get_mac_address(interface).ok_or_else(|| unavailable("no MAC address"))?;
        let ipv4 = get_ipv4_address(interface)?.ok_or_else(|| unavailable("no IPv4 address"))?;
        Ok(InterfaceInfo::new(interface, mac, ipv4))
    }
}

impl Display for InterfaceInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "interface={} mac={} ipv4={}", self.name, self.mac, self.ipv4)
    }
}

/// Return the first IPv4 address configured on the interface, if any.
// NOTE: A device created from its name has no addresses,
// so we look it up in the list of all the devices.
pub fn get_ipv4_address(interface: &str) -> Result<Option<Ipv4Addr>, ProbeError> {
    let devices = Device::list().map_err(|error| ProbeError::InterfaceUnavailable {
        interface: interface.to_string(),
        reason: error.to_string(),
    })?;
    Ok(devices
        .into_iter()
        .find(|device| device.name == interface)
        .and_then(|device| {
            device.addresses.iter().find_map(|addr| match addr.addr {
                IpAddr::V4(ip) => Some(ip),
                IpAddr::V6(_) => None,
            })
        }))
}

/// Return the MAC address of the interface, if any.
pub fn get_mac_address(interface: &str) -> Option<MacAddr> {
    pnet::datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == interface)
        .and_then(|iface| iface.mac)
        .filter(|mac| *mac != MacAddr::zero())
}
