use std::net::{IpAddr, Ipv4Addr};

use pnet::datalink::MacAddr;
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::icmp::echo_request::{EchoRequestPacket, IcmpCodes, MutableEchoRequestPacket};
use pnet::packet::icmp::IcmpTypes;
use pnet::packet::ip::IpNextHeaderProtocols;
use pnet::packet::ipv4::{self, Ipv4Packet, MutableIpv4Packet};
use pnet::packet::Packet as _;
use pnet::util;

use crate::builder::Frame;
use crate::error::ProbeError;

/// TTL of the probe packets.
pub const PROBE_TTL: u8 = 64;
/// Identifier of the ICMP echo requests, replies are never matched.
pub const ECHO_IDENTIFIER: u16 = 0;
/// Sequence number of the ICMP echo requests.
pub const ECHO_SEQUENCE: u16 = 1;

const ETHERNET_HEADER_SIZE: usize = EthernetPacket::minimum_packet_size();
const IPV4_HEADER_SIZE: usize = Ipv4Packet::minimum_packet_size();

/// Build a broadcast Ethernet frame carrying an ARP request for `target_ip`.
///
/// The sender fields are set to the local interface addresses and the target
/// hardware address is zeroed.
pub fn build_arp_request(
    local_mac: &[u8],
    local_ip: IpAddr,
    target_ip: IpAddr,
) -> Result<Frame, ProbeError> {
    let local_mac = hardware_address(local_mac)?;
    let local_ip = ipv4_address(local_ip)?;
    let target_ip = ipv4_address(target_ip)?;

    let mut buffer = vec![0u8; ETHERNET_HEADER_SIZE + ArpPacket::minimum_packet_size()];
    build_ethernet(&mut buffer, local_mac, MacAddr::broadcast(), EtherTypes::Arp);

    let mut arp = MutableArpPacket::new(&mut buffer[ETHERNET_HEADER_SIZE..])
        .expect("buffer holds an ARP packet");
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(6);
    arp.set_proto_addr_len(4);
    arp.set_operation(ArpOperations::Request);
    arp.set_sender_hw_addr(local_mac);
    arp.set_sender_proto_addr(local_ip);
    arp.set_target_hw_addr(MacAddr::zero());
    arp.set_target_proto_addr(target_ip);

    Ok(Frame::new(buffer))
}

/// Build an Ethernet frame carrying an IPv4 ICMP Echo Request from `src_ip` to `dst_ip`.
///
/// The IPv4 total length, the IPv4 header checksum and the ICMP checksum are
/// computed over the serialized packet. The request carries no payload.
pub fn build_icmp_echo(
    local_mac: &[u8],
    remote_mac: &[u8],
    src_ip: IpAddr,
    dst_ip: IpAddr,
) -> Result<Frame, ProbeError> {
    let local_mac = hardware_address(local_mac)?;
    let remote_mac = hardware_address(remote_mac)?;
    let src_ip = ipv4_address(src_ip)?;
    let dst_ip = ipv4_address(dst_ip)?;

    let icmp_size = EchoRequestPacket::minimum_packet_size();
    let mut buffer = vec![0u8; ETHERNET_HEADER_SIZE + IPV4_HEADER_SIZE + icmp_size];
    build_ethernet(&mut buffer, local_mac, remote_mac, EtherTypes::Ipv4);

    let l4_start = ETHERNET_HEADER_SIZE + IPV4_HEADER_SIZE;
    let mut icmp = MutableEchoRequestPacket::new(&mut buffer[l4_start..])
        .expect("buffer holds an ICMP echo request");
    icmp.set_icmp_type(IcmpTypes::EchoRequest);
    icmp.set_icmp_code(IcmpCodes::NoCode);
    icmp.set_identifier(ECHO_IDENTIFIER);
    icmp.set_sequence_number(ECHO_SEQUENCE);
    icmp.set_checksum(util::checksum(icmp.packet(), 1));

    let mut ip = MutableIpv4Packet::new(&mut buffer[ETHERNET_HEADER_SIZE..])
        .expect("buffer holds an IPv4 packet");
    ip.set_version(4);
    ip.set_header_length(5);
    ip.set_dscp(0);
    ip.set_ecn(0);
    ip.set_total_length((IPV4_HEADER_SIZE + icmp_size) as u16);
    ip.set_ttl(PROBE_TTL);
    ip.set_next_level_protocol(IpNextHeaderProtocols::Icmp);
    ip.set_source(src_ip);
    ip.set_destination(dst_ip);
    ip.set_checksum(ipv4::checksum(&ip.to_immutable()));

    Ok(Frame::new(buffer))
}

fn build_ethernet(buffer: &mut [u8], src_addr: MacAddr, dst_addr: MacAddr, ethertype: EtherType) {
    let mut ethernet = MutableEthernetPacket::new(buffer).expect("buffer holds an Ethernet header");
    ethernet.set_source(src_addr);
    ethernet.set_destination(dst_addr);
    ethernet.set_ethertype(ethertype);
}

/// Validate a 6-byte, non-zero hardware address.
pub fn hardware_address(bytes: &[u8]) -> Result<MacAddr, ProbeError> {
    let octets: [u8; 6] = bytes.try_into().map_err(|_| {
        ProbeError::InvalidAddress(format!(
            "hardware address must be 6 bytes, got {}",
            bytes.len()
        ))
    })?;
    if octets == [0u8; 6] {
        return Err(ProbeError::InvalidAddress(
            "hardware address is all zeros".to_string(),
        ));
    }
    let [a, b, c, d, e, f] = octets;
    Ok(MacAddr::new(a, b, c, d, e, f))
}

/// The six octets of a hardware address, in wire order.
pub fn mac_octets(mac: MacAddr) -> [u8; 6] {
    [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]
}

/// Validate an IPv4 address.
pub fn ipv4_address(addr: IpAddr) -> Result<Ipv4Addr, ProbeError> {
    match addr {
        IpAddr::V4(addr) => Ok(addr),
        IpAddr::V6(addr) => Err(ProbeError::InvalidAddress(format!(
            "{addr} is not an IPv4 address"
        ))),
    }
}
