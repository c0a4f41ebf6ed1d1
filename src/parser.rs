//! Function for recognizing ARP replies in captured frames.
use std::net::Ipv4Addr;

use pnet::datalink::MacAddr;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket};
use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::Packet as _;

/// The address fields of an ARP reply.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ArpReply {
    pub sender_hw_addr: MacAddr,
    pub sender_proto_addr: Ipv4Addr,
    pub target_hw_addr: MacAddr,
    pub target_proto_addr: Ipv4Addr,
}

/// Parse an Ethernet frame into an ARP reply.
///
/// Returns `None` for truncated frames, non-ARP frames, ARP requests,
/// and ARP packets that do not map IPv4 addresses to Ethernet addresses.
pub fn parse_arp_reply(data: &[u8]) -> Option<ArpReply> {
    let ethernet = EthernetPacket::new(data)?;
    if ethernet.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(ethernet.payload())?;
    if arp.get_operation() != ArpOperations::Reply
        || arp.get_hardware_type() != ArpHardwareTypes::Ethernet
        || arp.get_protocol_type() != EtherTypes::Ipv4
        || arp.get_hw_addr_len() != 6
        || arp.get_proto_addr_len() != 4
    {
        return None;
    }
    Some(ArpReply {
        sender_hw_addr: arp.get_sender_hw_addr(),
        sender_proto_addr: arp.get_sender_proto_addr(),
        target_hw_addr: arp.get_target_hw_addr(),
        target_proto_addr: arp.get_target_proto_addr(),
    })
}
