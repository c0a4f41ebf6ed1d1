//! Probing configuration.
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

use strum::{Display, EnumString};

use crate::flows::DEFAULT_PROCFS_IPVS_CONN;
use crate::resolver::DEFAULT_RESOLUTION_TIMEOUT;

/// Interface used when none is given.
pub const DEFAULT_INTERFACE: &str = "eth0";
/// Delay between two successive probes.
pub const DEFAULT_INTER_PROBE_DELAY: Duration = Duration::from_millis(100);

/// What to do when a flow cannot be probed.
#[derive(Copy, Clone, Debug, Display, EnumString, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum FailurePolicy {
    /// Stop the run at the first failure.
    Abort,
    /// Log the failure and continue with the next flow.
    Skip,
}

#[derive(Clone, Debug)]
pub struct Config {
    /// Interface from which to resolve addresses and send the probes.
    pub interface: String,
    /// Time to wait for an ARP reply.
    pub resolution_timeout: Duration,
    /// Delay between two successive probes.
    pub inter_probe_delay: Duration,
    /// Whether a failed flow aborts the run or is skipped.
    pub failure_policy: FailurePolicy,
    /// Resolve addresses but do not send the probes.
    pub dry_run: bool,
    /// Connection table to read the flows from.
    pub connection_table: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            interface: DEFAULT_INTERFACE.to_string(),
            resolution_timeout: DEFAULT_RESOLUTION_TIMEOUT,
            inter_probe_delay: DEFAULT_INTER_PROBE_DELAY,
            failure_policy: FailurePolicy::Abort,
            dry_run: false,
            connection_table: PathBuf::from(DEFAULT_PROCFS_IPVS_CONN),
        }
    }
}

impl Display for Config {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "interface={:?}", self.interface)?;
        write!(f, " resolution_timeout={:?}", self.resolution_timeout)?;
        write!(f, " inter_probe_delay={:?}", self.inter_probe_delay)?;
        write!(f, " failure_policy={}", self.failure_policy)?;
        write!(f, " dry_run={:?}", self.dry_run)?;
        write!(f, " connection_table={:?}", self.connection_table)
    }
}
