//! A scripted link that answers ARP requests from a list of responders.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::thread::sleep;
use std::time::{Duration, Instant};

use ipvsping::error::ProbeError;
use ipvsping::interface::InterfaceInfo;
use ipvsping::link::{Link, LinkProvider};
use pnet::packet::arp::{ArpHardwareTypes, ArpOperations, ArpPacket, MutableArpPacket};
use pnet::packet::ethernet::{EtherType, EtherTypes, EthernetPacket, MutableEthernetPacket};
use pnet::packet::Packet as _;
use pnet::util::MacAddr;

pub const READ_TIMEOUT: Duration = Duration::from_millis(10);

pub fn local_interface() -> InterfaceInfo {
    InterfaceInfo::new(
        "test0",
        MacAddr::new(0x02, 0x00, 0x00, 0x00, 0x00, 0x01),
        Ipv4Addr::new(10, 0, 0, 2),
    )
}

/// A host answering ARP requests for `ip` with `mac`, `delay` after the request.
#[derive(Copy, Clone, Debug)]
pub struct Responder {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
    pub delay: Duration,
}

#[derive(Default)]
pub struct State {
    pub responders: Vec<Responder>,
    /// Frames delivered by every new link, before any reply.
    pub noise: Vec<Vec<u8>>,
    pub filters: Vec<String>,
    pub sent: Vec<Vec<u8>>,
    pub opened: usize,
    /// Links opened with `open_transmit`, also counted in `opened`.
    pub transmit_opened: usize,
    pub closed: usize,
    pub fail_open: bool,
    pub fail_filter: bool,
    pub fail_read: bool,
    /// Fail to send the frames with this EtherType.
    pub fail_send: Option<EtherType>,
}

#[derive(Clone, Default)]
pub struct ScriptedProvider {
    pub state: Arc<Mutex<State>>,
}

impl ScriptedProvider {
    pub fn new(responders: &[Responder]) -> Self {
        let provider = ScriptedProvider::default();
        provider.state.lock().unwrap().responders = responders.to_vec();
        provider
    }

    pub fn with_noise(self, noise: Vec<Vec<u8>>) -> Self {
        self.state.lock().unwrap().noise = noise;
        self
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().sent.clone()
    }

    /// The sent frames with the given EtherType.
    pub fn sent_with_ethertype(&self, ethertype: EtherType) -> Vec<Vec<u8>> {
        self.sent()
            .into_iter()
            .filter(|frame| EthernetPacket::new(frame).unwrap().get_ethertype() == ethertype)
            .collect()
    }
}

impl LinkProvider for ScriptedProvider {
    type Link = ScriptedLink;

    fn open(&self, interface: &str) -> Result<ScriptedLink, ProbeError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open {
            return Err(unavailable(interface));
        }
        state.opened += 1;
        let now = Instant::now();
        let pending = state.noise.iter().map(|frame| (now, frame.clone())).collect();
        Ok(ScriptedLink {
            state: self.state.clone(),
            pending,
            filtered: false,
        })
    }

    fn open_transmit(&self, interface: &str) -> Result<ScriptedLink, ProbeError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_open {
            return Err(unavailable(interface));
        }
        state.opened += 1;
        state.transmit_opened += 1;
        Ok(ScriptedLink {
            state: self.state.clone(),
            pending: VecDeque::new(),
            filtered: false,
        })
    }
}

fn unavailable(interface: &str) -> ProbeError {
    ProbeError::InterfaceUnavailable {
        interface: interface.to_string(),
        reason: "scripted failure".to_string(),
    }
}

fn scripted_failure() -> pcap::Error {
    pcap::Error::PcapError("scripted failure".to_string())
}

pub struct ScriptedLink {
    state: Arc<Mutex<State>>,
    pending: VecDeque<(Instant, Vec<u8>)>,
    filtered: bool,
}

impl Link for ScriptedLink {
    fn set_filter(&mut self, program: &str) -> Result<(), ProbeError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_filter {
            return Err(ProbeError::FilterError {
                program: program.to_string(),
                source: scripted_failure(),
            });
        }
        state.filters.push(program.to_string());
        self.filtered = true;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Vec<u8>>, ProbeError> {
        if self.state.lock().unwrap().fail_read {
            return Err(ProbeError::CaptureError(scripted_failure()));
        }
        let now = Instant::now();
        if let Some(index) = self.pending.iter().position(|(due, _)| *due <= now) {
            return Ok(self.pending.remove(index).map(|(_, frame)| frame));
        }
        sleep(READ_TIMEOUT);
        Ok(None)
    }

    fn send_frame(&mut self, frame: &[u8]) -> Result<(), ProbeError> {
        let mut state = self.state.lock().unwrap();
        let ethertype = EthernetPacket::new(frame).map(|ethernet| ethernet.get_ethertype());
        if ethertype.is_some() && ethertype == state.fail_send {
            return Err(ProbeError::TransmitError(scripted_failure()));
        }
        state.sent.push(frame.to_vec());
        // Replies to a request sent before the filter is installed are lost.
        if !self.filtered {
            return Ok(());
        }
        if let Some((sender_mac, sender_ip, target_ip)) = parse_arp_request(frame) {
            let now = Instant::now();
            for responder in state.responders.iter().filter(|r| r.ip == target_ip) {
                self.pending.push_back((
                    now + responder.delay,
                    arp_reply_frame(responder.mac, responder.ip, sender_mac, sender_ip),
                ));
            }
        }
        Ok(())
    }
}

impl Drop for ScriptedLink {
    fn drop(&mut self) {
        self.state.lock().unwrap().closed += 1;
    }
}

fn parse_arp_request(frame: &[u8]) -> Option<(MacAddr, Ipv4Addr, Ipv4Addr)> {
    let ethernet = EthernetPacket::new(frame)?;
    if ethernet.get_ethertype() != EtherTypes::Arp {
        return None;
    }
    let arp = ArpPacket::new(ethernet.payload())?;
    if arp.get_operation() != ArpOperations::Request {
        return None;
    }
    Some((
        arp.get_sender_hw_addr(),
        arp.get_sender_proto_addr(),
        arp.get_target_proto_addr(),
    ))
}

/// Build an Ethernet frame carrying an ARP reply.
pub fn arp_reply_frame(
    sender_mac: MacAddr,
    sender_ip: Ipv4Addr,
    target_mac: MacAddr,
    target_ip: Ipv4Addr,
) -> Vec<u8> {
    let mut buffer =
        vec![0u8; EthernetPacket::minimum_packet_size() + ArpPacket::minimum_packet_size()];
    let mut ethernet = MutableEthernetPacket::new(&mut buffer).unwrap();
    ethernet.set_destination(target_mac);
    ethernet.set_source(sender_mac);
    ethernet.set_ethertype(EtherTypes::Arp);
    let mut arp =
        MutableArpPacket::new(&mut buffer[EthernetPacket::minimum_packet_size()..]).unwrap();
    arp.set_hardware_type(ArpHardwareTypes::Ethernet);
    arp.set_protocol_type(EtherTypes::Ipv4);
    arp.set_hw_addr_len(6);
    arp.set_proto_addr_len(4);
    arp.set_operation(ArpOperations::Reply);
    arp.set_sender_hw_addr(sender_mac);
    arp.set_sender_proto_addr(sender_ip);
    arp.set_target_hw_addr(target_mac);
    arp.set_target_proto_addr(target_ip);
    buffer
}
