//! Functions for building the frames written on the wire.
//!
//! Every builder validates its addresses first and returns a complete, immutable
//! [`Frame`] with its length and checksum fields filled in.
//!
//! # Examples
//!
//! ```
//! use std::net::Ipv4Addr;
//! use ipvsping::builder::{build_arp_request, build_icmp_echo};
//!
//! let local_mac = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];
//! let remote_mac = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];
//! let local_ip = Ipv4Addr::new(10, 0, 0, 2).into();
//! let target_ip = Ipv4Addr::new(10, 0, 0, 5).into();
//!
//! let request = build_arp_request(&local_mac, local_ip, target_ip).unwrap();
//! let probe = build_icmp_echo(&local_mac, &remote_mac, local_ip, target_ip).unwrap();
//!
//! println!("{:?} {:?}", request, probe);
//! ```
mod builders;
mod frame;

pub use builders::*;
pub use frame::*;
