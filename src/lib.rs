//! Active health-checking of the real servers behind an IPVS load balancer.
//!
//! For every flow of the IPVS connection table, the real server address is
//! resolved with ARP and an ICMP echo request is written directly on the link,
//! with the client address of the flow as source.
pub mod builder;
pub mod config;
pub mod error;
pub mod flows;
pub mod interface;
pub mod link;
pub mod parser;
pub mod prober;
pub mod resolver;
pub mod sender;
pub mod utilities;

pub use config::*;
pub use error::*;
pub use prober::*;
