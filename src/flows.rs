//! Discover the flows to probe from the IPVS connection table.
//!
//! ```no_run
//! use ipvsping::flows::ConnectionTable;
//!
//! let table = ConnectionTable::from_native().unwrap();
//! for flow in table.flow_pairs() {
//!     println!("{}", flow);
//! }
//! ```
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::io::Read;
use std::net::Ipv4Addr;
use std::path::Path;

use anyhow::{bail, Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Path to the IPVS connection table in procfs.
pub const DEFAULT_PROCFS_IPVS_CONN: &str = "/proc/net/ip_vs_conn";

/// A real server to probe, and the client address the probe originates from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FlowPair {
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
}

impl FlowPair {
    pub fn new(src_addr: Ipv4Addr, dst_addr: Ipv4Addr) -> Self {
        FlowPair { src_addr, dst_addr }
    }
}

impl Display for FlowPair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "src_addr={} dst_addr={}", self.src_addr, self.dst_addr)
    }
}

/// An entry of `/proc/net/ip_vs_conn`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Connection {
    pub protocol: String,
    pub client_addr: Ipv4Addr,
    pub client_port: u16,
    pub virtual_addr: Ipv4Addr,
    pub virtual_port: u16,
    pub real_addr: Ipv4Addr,
    pub real_port: u16,
    pub state: String,
    /// Seconds before the entry expires.
    pub expires: u64,
}

impl Connection {
    /// Parse an IPv4 entry, e.g.
    /// `TCP 0A040227 C350 0A040264 0050 0A04021E 0050 ESTABLISHED     89`.
    pub fn from_procfs_entry(line: &str) -> Result<Self> {
        let elems: Vec<&str> = line.split_whitespace().collect();
        if elems.len() < 9 {
            bail!("invalid entry")
        }
        Ok(Connection {
            protocol: elems[0].to_string(),
            client_addr: hex_to_ipv4(elems[1])?,
            client_port: hex_to_port(elems[2])?,
            virtual_addr: hex_to_ipv4(elems[3])?,
            virtual_port: hex_to_port(elems[4])?,
            real_addr: hex_to_ipv4(elems[5])?,
            real_port: hex_to_port(elems[6])?,
            state: elems[7].to_string(),
            expires: elems[8].parse()?,
        })
    }

    pub fn flow_pair(&self) -> FlowPair {
        FlowPair::new(self.client_addr, self.real_addr)
    }
}

/// The flows currently handled by the balancer, one per source address.
#[derive(Debug, Default)]
pub struct ConnectionTable {
    flows: BTreeMap<Ipv4Addr, Ipv4Addr>,
}

impl ConnectionTable {
    /// Build a table from flow pairs; a later pair replaces an earlier one with the same source.
    pub fn new(flows: &[FlowPair]) -> Self {
        let mut table = ConnectionTable::default();
        for flow in flows {
            table.insert(*flow);
        }
        table
    }

    /// Read the table of the running kernel.
    pub fn from_native() -> Result<Self> {
        Self::from_procfs(DEFAULT_PROCFS_IPVS_CONN)
    }

    /// Build a table by parsing procfs on Linux.
    ///
    /// The header line is skipped, as well as IPv6 and malformed entries.
    pub fn from_procfs<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let output = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Ok(Self::from_procfs_str(&output))
    }

    pub fn from_procfs_str(output: &str) -> Self {
        let mut table = ConnectionTable::default();
        for line in output.lines().skip(1).filter(|line| !line.trim().is_empty()) {
            match Connection::from_procfs_entry(line) {
                Ok(connection) => {
                    debug!("{:?}", connection);
                    table.insert(connection.flow_pair());
                }
                Err(error) => warn!("skipping ip_vs_conn entry {:?}: {}", line, error),
            }
        }
        table
    }

    /// Build a table from a CSV file of `src_addr,dst_addr` rows.
    ///
    /// Lines starting with `#` are comments, malformed rows are skipped.
    pub fn from_csv<T: Read>(input: T) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .comment(Some(b'#'))
            .flexible(true)
            .has_headers(false)
            .trim(csv::Trim::All)
            .from_reader(input);

        let mut table = ConnectionTable::default();
        for result in reader.deserialize::<FlowPair>() {
            match result {
                Ok(flow) => table.insert(flow),
                Err(error) if error.is_io_error() => {
                    return Err(error).context("cannot read flows file")
                }
                Err(error) => warn!("{}", error),
            }
        }
        Ok(table)
    }

    pub fn insert(&mut self, flow: FlowPair) {
        self.flows.insert(flow.src_addr, flow.dst_addr);
    }

    /// The flow pairs, ordered by source address.
    pub fn flow_pairs(&self) -> Vec<FlowPair> {
        self.flows
            .iter()
            .map(|(src_addr, dst_addr)| FlowPair::new(*src_addr, *dst_addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }
}

/// Convert an 8-digit hexadecimal address in network order to an IPv4 address.
///
/// ```
/// use std::net::Ipv4Addr;
/// use ipvsping::flows::hex_to_ipv4;
///
/// assert_eq!(hex_to_ipv4("0A040227").unwrap(), Ipv4Addr::new(10, 4, 2, 39));
/// assert!(hex_to_ipv4("0A04022").is_err());
/// assert!(hex_to_ipv4("0A04022G").is_err());
/// ```
pub fn hex_to_ipv4(hex_string: &str) -> Result<Ipv4Addr> {
    let bytes = hex::decode(hex_string)
        .with_context(|| format!("invalid hexadecimal address {hex_string:?}"))?;
    let octets: [u8; 4] = match bytes.try_into() {
        Ok(octets) => octets,
        Err(bytes) => bail!("expected 4 bytes in {:?}, got {}", hex_string, bytes.len()),
    };
    Ok(Ipv4Addr::from(octets))
}

/// Convert a hexadecimal port number, e.g. `0050` => `80`.
pub fn hex_to_port(hex_string: &str) -> Result<u16> {
    if hex_string.is_empty()
        || hex_string.len() > 4
        || !hex_string.chars().all(|c| c.is_ascii_hexdigit())
    {
        bail!("invalid hexadecimal port {:?}", hex_string)
    }
    Ok(u16::from_str_radix(hex_string, 16)?)
}
