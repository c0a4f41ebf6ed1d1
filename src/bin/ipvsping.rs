//! Probe the real servers of the flows currently handled by IPVS.
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use ipvsping::config::{Config, FailurePolicy, DEFAULT_INTERFACE};
use ipvsping::flows::{ConnectionTable, DEFAULT_PROCFS_IPVS_CONN};
use ipvsping::prober::probe;
use ipvsping::utilities::configure_logger;
use log::{info, warn, LevelFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Interface from which to resolve addresses and send the probes.
    #[arg(short = 'i', long, default_value_t = DEFAULT_INTERFACE.to_string())]
    interface: String,
    /// IPVS connection table.
    #[arg(short = 'c', long, default_value = DEFAULT_PROCFS_IPVS_CONN)]
    connection_table: PathBuf,
    /// CSV file of `src_addr,dst_addr` flows, read instead of the connection table.
    #[arg(short = 'f', long)]
    flows_file: Option<PathBuf>,
    /// Time in milliseconds to wait for an ARP reply.
    #[arg(short = 't', long, default_value_t = 3000)]
    resolution_timeout: u64,
    /// Time in milliseconds to wait between two probes.
    #[arg(short = 'd', long, default_value_t = 100)]
    inter_probe_delay: u64,
    /// What to do when a flow cannot be probed.
    #[arg(long, default_value_t = FailurePolicy::Abort)]
    on_failure: FailurePolicy,
    /// Minimum log level.
    #[arg(short = 'L', long, default_value_t = LevelFilter::Info)]
    log_level: LevelFilter,
    /// Resolve addresses but do not send the probes.
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    configure_logger(args.log_level);

    let config = Config {
        interface: args.interface,
        resolution_timeout: Duration::from_millis(args.resolution_timeout),
        inter_probe_delay: Duration::from_millis(args.inter_probe_delay),
        failure_policy: args.on_failure,
        dry_run: args.dry_run,
        connection_table: args.connection_table,
    };

    let table = match args.flows_file {
        Some(path) => {
            let file =
                File::open(&path).with_context(|| format!("cannot open {}", path.display()))?;
            ConnectionTable::from_csv(BufReader::new(file))?
        }
        None => ConnectionTable::from_procfs(&config.connection_table)?,
    };
    if table.is_empty() {
        warn!("no flows to probe");
        return Ok(());
    }
    info!("flows={}", table.len());

    probe(&config, table.flow_pairs())?;
    Ok(())
}
