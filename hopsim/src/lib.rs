/*!
# Hop Simulator

Command line front-end of [`hopsim_core`]: the `d2d-sidelink` and
`iab-multihop` binaries run one scenario each, print a short summary and
a single `CSV,` line on the standard output. Logs go to the standard
error, filtered with `RUST_LOG`.

*/

use anyhow::{Context as _, Result};
use clap::{Args, Parser};
use hopsim_core::{LinkModel, SimTime, defaults};
use tracing_subscriber::EnvFilter;

// convenient re-export of `hopsim_core` scenario objects
pub use hopsim_core::scenario::{
    MultiHopConfig, MultiHopReport, SidelinkConfig, SidelinkMode, SidelinkReport,
};

/// log filter used when `RUST_LOG` is not set
pub const DEFAULT_LOG_FILTER: &str = "warn,hopsim=info,hopsim_core=info";

/// Options shared by both binaries.
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Time the client starts sending (e.g. `4s`, `1500ms`)
    #[arg(long)]
    pub start: Option<SimTime>,

    /// Time the client stops sending; the run lasts 2s more
    #[arg(long)]
    pub stop: Option<SimTime>,

    /// Replace the log-distance channel by a fixed range, in meters
    #[arg(long = "max-range")]
    pub max_range: Option<f64>,
}

impl CommonArgs {
    /// the client window, each end falling back to its default
    pub fn window(&self, start: SimTime, stop: SimTime) -> (SimTime, SimTime) {
        (self.start.unwrap_or(start), self.stop.unwrap_or(stop))
    }

    /// the link model selected by `--max-range`, if any
    pub fn link_model(&self) -> Result<Option<LinkModel>> {
        self.max_range
            .map(|range| {
                LinkModel::range_threshold(range)
                    .with_context(|| format!("Invalid --max-range={range}"))
            })
            .transpose()
    }
}

/// Measure throughput, delay and loss between two UEs, directly or
/// through a relay UE.
#[derive(Parser, Debug, Clone)]
#[command(name = "d2d-sidelink")]
#[command(version, about, long_about = None)]
pub struct SidelinkArgs {
    /// Simulation mode: direct or relay
    #[arg(long, default_value = "direct")]
    pub mode: SidelinkMode,

    /// UDP packet interval in microseconds
    #[arg(long = "intervalUs", default_value_t = defaults::SIDELINK_INTERVAL_US)]
    pub interval_us: f64,

    #[command(flatten)]
    pub common: CommonArgs,
}

/// Measure throughput, delay and loss along a chain of 1 to 3 wireless
/// hops.
#[derive(Parser, Debug, Clone)]
#[command(name = "iab-multihop")]
#[command(version, about, long_about = None)]
pub struct MultiHopArgs {
    /// Number of wireless hops (1, 2, or 3)
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    pub hops: i64,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl SidelinkArgs {
    pub fn config(&self) -> Result<SidelinkConfig> {
        let (start, stop) = self.common.window(
            defaults::SIDELINK_CLIENT_START,
            defaults::SIDELINK_CLIENT_STOP,
        );
        let mut config = SidelinkConfig::new()
            .set_mode(self.mode.clone())
            .set_interval_us(self.interval_us)
            .set_window(start, stop);
        if let Some(link_model) = self.common.link_model()? {
            config = config.set_link_model(link_model);
        }
        Ok(config)
    }

    /// the line printed before the run starts
    pub fn banner(&self) -> String {
        format!("Running D2D Sidelink Simulation, mode = {}", self.mode)
    }
}

impl MultiHopArgs {
    /// The scenario configuration. An out of range `--hops` falls back to a
    /// single hop, see [`MultiHopConfig::set_hops`].
    pub fn config(&self) -> Result<MultiHopConfig> {
        let (start, stop) = self.common.window(
            defaults::MULTIHOP_CLIENT_START,
            defaults::MULTIHOP_CLIENT_STOP,
        );
        let mut config = MultiHopConfig::new()
            .set_hops(self.hops)
            .set_window(start, stop);
        if let Some(link_model) = self.common.link_model()? {
            config = config.set_link_model(link_model);
        }
        Ok(config)
    }

    /// The lines printed before the run starts: the clamping warning, if
    /// any, then the banner.
    pub fn preamble(config: &MultiHopConfig) -> Vec<String> {
        let mut lines = Vec::with_capacity(2);
        if let Some(requested) = config.clamped_from() {
            lines.push(format!("Invalid hops={requested}, forcing to 1"));
        }
        lines.push(format!(
            "Running IAB-like multi-hop simulation with {} hop(s)",
            config.hops()
        ));
        lines
    }
}

/// Install the `tracing` subscriber writing to the standard error.
///
/// Calling it more than once is harmless: only the first subscriber is
/// kept.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}
