//! Device-to-device sidelink: UE1 sends to UE2, directly or through a
//! relay UE.
//!
//! | Mode | Geometry (x, meters) | Path |
//! |------|----------------------|------|
//! | `direct` | 0 / 25 / 50 | UE1 → UE2 |
//! | `relay` | 0 / 40 / 80 | UE1 → relay → UE2 |
//! | anything else | 0 / 40 / 80 | UE1 → UE2 |
//!
//! The client sends 1400 byte datagrams every 100µs from 4s to 12s and the
//! run stops at 14s.
use super::{Report, Setup};
use crate::{
    SimError, defaults,
    link::LinkModel,
    node::NodeId,
    time::{SimDelay, SimTime},
    traffic::TrafficConfig,
};
use std::{convert::Infallible, fmt, net::Ipv4Addr, str::FromStr};

const DIRECT_GEOMETRY: [f64; 3] = [0.0, 25.0, 50.0];
const RELAY_GEOMETRY: [f64; 3] = [0.0, 40.0, 80.0];

const ONE_HOP: [usize; 2] = [0, 2];
const TWO_HOPS: [usize; 3] = [0, 1, 2];

/// How UE1 reaches UE2.
///
/// Any string is a valid mode: unknown modes keep their name (it shows in
/// the report) and use the relay geometry without going through the relay.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SidelinkMode {
    #[default]
    Direct,
    Relay,
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SidelinkConfig {
    mode: SidelinkMode,
    interval_us: f64,
    packet_size: u64,
    max_packets: u64,
    start: SimTime,
    stop: SimTime,
    link_model: LinkModel,
}

/// Result of a sidelink run.
///
/// Its [`Display`](fmt::Display) is the console summary; [`csv`](Self::csv)
/// gives the machine readable line.
#[derive(Debug, Clone, PartialEq)]
pub struct SidelinkReport {
    pub mode: SidelinkMode,
    pub interval_us: f64,
    pub report: Report,
}

impl SidelinkMode {
    fn geometry(&self) -> &'static [f64] {
        match self {
            Self::Direct => &DIRECT_GEOMETRY,
            Self::Relay | Self::Other(_) => &RELAY_GEOMETRY,
        }
    }

    fn path(&self) -> &'static [usize] {
        match self {
            Self::Relay => &TWO_HOPS,
            Self::Direct | Self::Other(_) => &ONE_HOP,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Direct => "direct",
            Self::Relay => "relay",
            Self::Other(mode) => mode,
        }
    }
}

impl SidelinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_mode(mut self, mode: SidelinkMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the time between two datagrams, in microseconds.
    pub fn set_interval_us(mut self, interval_us: f64) -> Self {
        self.interval_us = interval_us;
        self
    }

    pub fn set_packet_size(mut self, packet_size: u64) -> Self {
        self.packet_size = packet_size;
        self
    }

    pub fn set_max_packets(mut self, max_packets: u64) -> Self {
        self.max_packets = max_packets;
        self
    }

    /// Set the client window. The run lasts 2s past `stop`.
    pub fn set_window(mut self, start: SimTime, stop: SimTime) -> Self {
        self.start = start;
        self.stop = stop;
        self
    }

    pub fn set_link_model(mut self, link_model: LinkModel) -> Self {
        self.link_model = link_model;
        self
    }

    pub fn mode(&self) -> &SidelinkMode {
        &self.mode
    }

    pub fn interval_us(&self) -> f64 {
        self.interval_us
    }

    pub fn start(&self) -> SimTime {
        self.start
    }

    pub fn stop(&self) -> SimTime {
        self.stop
    }

    pub fn link_model(&self) -> &LinkModel {
        &self.link_model
    }

    /// Run the scenario.
    ///
    /// # Errors
    ///
    /// - [`RouteError::DisconnectedPath`] if the link model cannot cover a
    ///   hop of the path.
    /// - [`ScheduleError::InvalidDelay`] if the interval is negative.
    ///
    /// [`RouteError::DisconnectedPath`]: crate::route::RouteError::DisconnectedPath
    /// [`ScheduleError::InvalidDelay`]: crate::scheduler::ScheduleError::InvalidDelay
    pub fn run(&self) -> Result<SidelinkReport, SimError> {
        tracing::debug!(
            mode = %self.mode,
            interval_us = self.interval_us,
            link_model = %self.link_model,
            "sidelink scenario"
        );

        let traffic = TrafficConfig::new(NodeId::ZERO, Ipv4Addr::UNSPECIFIED)
            .set_packet_size(self.packet_size)
            .set_interval(SimDelay::from_micros_f64(self.interval_us))
            .set_max_packets(self.max_packets)
            .set_window(self.start, self.stop);

        let report = Setup {
            link_model: self.link_model,
            network: defaults::SIDELINK_NETWORK,
            positions: self.mode.geometry(),
            path: self.mode.path(),
            traffic,
        }
        .run()?;

        Ok(SidelinkReport {
            mode: self.mode.clone(),
            interval_us: self.interval_us,
            report,
        })
    }
}

impl SidelinkReport {
    /// `CSV,<mode>,<intervalUs>,<throughputMbps>,<avgDelayMs>,<loss%>`
    pub fn csv(&self) -> String {
        format!(
            "CSV,{},{},{}",
            self.mode,
            super::Significant(self.interval_us),
            self.report.csv_metrics()
        )
    }
}

impl Default for SidelinkConfig {
    fn default() -> Self {
        Self {
            mode: SidelinkMode::default(),
            interval_us: defaults::SIDELINK_INTERVAL_US,
            packet_size: defaults::SIDELINK_PACKET_SIZE,
            max_packets: defaults::DEFAULT_MAX_PACKETS,
            start: defaults::SIDELINK_CLIENT_START,
            stop: defaults::SIDELINK_CLIENT_STOP,
            link_model: LinkModel::default(),
        }
    }
}

impl FromStr for SidelinkMode {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "direct" => Self::Direct,
            "relay" => Self::Relay,
            other => Self::Other(other.to_owned()),
        })
    }
}

impl fmt::Display for SidelinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SidelinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Results ({}) ===", self.mode)?;
        self.report.write_metrics(f)
    }
}
