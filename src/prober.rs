//! High-level interface for probing the real servers of a set of flows.
//!
//! ```no_run
//! use ipvsping::config::Config;
//! use ipvsping::flows::ConnectionTable;
//! use ipvsping::prober::probe;
//!
//! let config = Config::default();
//! let table = ConnectionTable::from_procfs(&config.connection_table).unwrap();
//! let statistics = probe(&config, table.flow_pairs()).unwrap();
//!
//! println!("{}", statistics);
//! ```
use std::fmt::{Display, Formatter};
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, trace};
use pnet::datalink::MacAddr;

use crate::config::{Config, FailurePolicy};
use crate::error::ProbeError;
use crate::flows::FlowPair;
use crate::interface::InterfaceInfo;
use crate::link::{LinkProvider, PcapProvider};
use crate::resolver::Resolver;
use crate::sender::Sender;

/// Probe flows from the interface of the configuration, over libpcap.
pub fn probe<T: IntoIterator<Item = FlowPair>>(
    config: &Config,
    flows: T,
) -> Result<ProbeStatistics> {
    info!("{}", config);
    let interface = InterfaceInfo::lookup(&config.interface)?;
    info!("{}", interface);
    let mut prober = Prober::from_config(PcapProvider::default(), interface, config)?;
    let result = prober.probe(flows);
    info!("{}", prober.statistics());
    result.map(|_| prober.statistics())
}

/// Resolves and probes flows one after the other.
pub struct Prober<P: LinkProvider> {
    failure_policy: FailurePolicy,
    inter_probe_delay: Duration,
    resolver: Resolver<P>,
    sender: Sender<P::Link>,
    statistics: ProbeStatistics,
}

impl<P: LinkProvider> Prober<P> {
    pub fn new(
        resolver: Resolver<P>,
        sender: Sender<P::Link>,
        failure_policy: FailurePolicy,
        inter_probe_delay: Duration,
    ) -> Self {
        Prober {
            failure_policy,
            inter_probe_delay,
            resolver,
            sender,
            statistics: ProbeStatistics::default(),
        }
    }

    /// Open the sender link and build the resolver for `interface`.
    pub fn from_config(provider: P, interface: InterfaceInfo, config: &Config) -> Result<Self> {
        let sender = Sender::new(&provider, &interface, config.dry_run)?;
        let resolver = Resolver::new(provider, interface, config.resolution_timeout);
        Ok(Prober::new(
            resolver,
            sender,
            config.failure_policy,
            config.inter_probe_delay,
        ))
    }

    /// Probe every flow, waiting `inter_probe_delay` between two flows.
    ///
    /// With [`FailurePolicy::Abort`] the first failure stops the run and is returned
    /// with the flow it occurred on; with [`FailurePolicy::Skip`] it is only logged.
    pub fn probe<T: IntoIterator<Item = FlowPair>>(&mut self, flows: T) -> Result<()> {
        let mut flows = flows.into_iter().peekable();
        while let Some(flow) = flows.next() {
            self.statistics.read += 1;
            if let Err(error) = self.probe_one(&flow) {
                error!("{} error={} {}", flow, error.kind(), error);
                if self.failure_policy == FailurePolicy::Abort {
                    return Err(error).with_context(|| format!("cannot probe {}", flow));
                }
            }
            if flows.peek().is_some() {
                sleep(self.inter_probe_delay);
            }
        }
        Ok(())
    }

    /// Resolve the real server of `flow` and send it one echo request.
    pub fn probe_one(&mut self, flow: &FlowPair) -> Result<MacAddr, ProbeError> {
        let dst_mac = match self.resolver.resolve(flow.dst_addr) {
            Ok(dst_mac) => dst_mac,
            Err(error) => {
                if error.is_timeout() {
                    self.statistics.resolution_timeouts += 1;
                } else {
                    self.statistics.resolution_failed += 1;
                }
                return Err(error);
            }
        };
        self.statistics.resolved += 1;
        trace!("{} dst_mac={}", flow, dst_mac);

        match self.sender.send(flow, dst_mac) {
            Ok(_) => {
                self.statistics.sent += 1;
                Ok(dst_mac)
            }
            Err(error) => {
                self.statistics.send_failed += 1;
                Err(error)
            }
        }
    }

    pub fn statistics(&self) -> ProbeStatistics {
        self.statistics
    }
}

#[derive(Copy, Clone, Default, Debug, PartialEq, Eq)]
pub struct ProbeStatistics {
    pub read: u64,
    pub resolved: u64,
    pub resolution_timeouts: u64,
    pub resolution_failed: u64,
    pub sent: u64,
    pub send_failed: u64,
}

impl Display for ProbeStatistics {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "flows_read={} resolved={} resolution_timeouts={} resolution_failed={} packets_sent={} packets_failed={}",
               self.read, self.resolved, self.resolution_timeouts, self.resolution_failed, self.sent, self.send_failed)
    }
}
