use announce::{AnnounceConfig, Preset};
use anyhow::Context;
use clap::Parser;
use core::time::Duration;

/// Runtime configuration for the `announce-node` binary.
///
/// Sizing starts from a preset (`--low-mem` selects the low-resource one) and
/// each value can then be overridden individually. All values are parsed from
/// CLI arguments or environment variables, and a `.env` file is honoured.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "announce-node",
    version,
    about = "Announces content keys read from stdin to a routing overlay"
)]
pub struct CliArgs {
    /// Use the low-resource preset: smaller buffers and 16 workers.
    ///
    /// Environment variable: `LOW_MEM`
    #[arg(long, env = "LOW_MEM", default_value_t = false)]
    pub low_mem: bool,

    /// Capacity of the intake buffer that producers write into.
    ///
    /// Environment variable: `INTAKE_CAPACITY`
    #[arg(long, env = "INTAKE_CAPACITY")]
    pub intake_capacity: Option<usize>,

    /// Capacity of the dispatch queue workers claim keys from.
    ///
    /// Environment variable: `DISPATCH_CAPACITY`
    #[arg(long, env = "DISPATCH_CAPACITY")]
    pub dispatch_capacity: Option<usize>,

    /// Number of announce workers, which caps concurrent router calls.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS")]
    pub num_workers: Option<usize>,

    /// Upper bound on a single announce call, in milliseconds.
    ///
    /// Environment variable: `ANNOUNCE_TIMEOUT_MS`
    #[arg(long, env = "ANNOUNCE_TIMEOUT_MS")]
    pub announce_timeout_ms: Option<u64>,

    /// Latency of the simulated router, in milliseconds.
    ///
    /// Environment variable: `ROUTER_LATENCY_MS`
    #[arg(long, env = "ROUTER_LATENCY_MS", default_value_t = 50)]
    pub router_latency_ms: u64,

    /// Make the simulated router fail every Nth announce. 0 never fails.
    ///
    /// Environment variable: `ROUTER_FAIL_EVERY`
    #[arg(long, env = "ROUTER_FAIL_EVERY", default_value_t = 0)]
    pub router_fail_every: u64,

    /// Seconds between statistics reports. 0 disables reporting.
    ///
    /// Environment variable: `STAT_INTERVAL_SECS`
    #[arg(long, env = "STAT_INTERVAL_SECS", default_value_t = 10)]
    pub stat_interval_secs: u64,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub announce: AnnounceConfig,
    pub router_latency: Duration,
    pub router_fail_every: u64,
    pub stat_interval: Option<Duration>,
}

impl TryFrom<CliArgs> for NodeConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let preset = if args.low_mem {
            Preset::LowResource
        } else {
            Preset::Standard
        };

        let mut announce = AnnounceConfig::from(preset);
        if let Some(capacity) = args.intake_capacity {
            announce = announce.with_intake_capacity(capacity);
        }
        if let Some(capacity) = args.dispatch_capacity {
            announce = announce.with_dispatch_capacity(capacity);
        }
        if let Some(num_workers) = args.num_workers {
            announce = announce.with_num_workers(num_workers);
        }
        if let Some(ms) = args.announce_timeout_ms {
            announce = announce.with_announce_timeout(Duration::from_millis(ms));
        }
        announce
            .validate()
            .context("invalid announce configuration")?;

        Ok(Self {
            announce,
            router_latency: Duration::from_millis(args.router_latency_ms),
            router_fail_every: args.router_fail_every,
            stat_interval: (args.stat_interval_secs > 0)
                .then(|| Duration::from_secs(args.stat_interval_secs)),
        })
    }
}
