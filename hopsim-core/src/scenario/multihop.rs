//! IAB-like multi-hop chain.
//!
//! `hops + 1` nodes are placed every 50m on the x axis: the donor at the
//! origin, then the relays, then the UE. The donor sends 1200 byte
//! datagrams to the UE every 200µs from 1s to 11s, forwarded by every relay,
//! and the run stops at 13s.
use super::{Report, Setup};
use crate::{
    SimError, defaults,
    link::LinkModel,
    node::NodeId,
    time::{SimDelay, SimTime},
    traffic::TrafficConfig,
};
use std::{fmt, net::Ipv4Addr};

#[derive(Debug, Clone, PartialEq)]
pub struct MultiHopConfig {
    hops: u32,
    /// the rejected value, when `set_hops` fell back to a single hop
    clamped_from: Option<i64>,
    interval: SimDelay,
    packet_size: u64,
    max_packets: u64,
    start: SimTime,
    stop: SimTime,
    link_model: LinkModel,
}

/// Result of a multi-hop run.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiHopReport {
    pub hops: u32,
    pub report: Report,
}

impl MultiHopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the length of the chain.
    ///
    /// Only 1 to 3 hops are supported: any other value is replaced by a
    /// single hop, and remembered in [`clamped_from`](Self::clamped_from).
    ///
    /// ```
    /// use hopsim_core::scenario::MultiHopConfig;
    ///
    /// let config = MultiHopConfig::new().set_hops(3);
    /// assert_eq!(config.hops(), 3);
    /// assert_eq!(config.clamped_from(), None);
    ///
    /// let config = MultiHopConfig::new().set_hops(5);
    /// assert_eq!(config.hops(), 1);
    /// assert_eq!(config.clamped_from(), Some(5));
    /// ```
    pub fn set_hops(mut self, hops: i64) -> Self {
        match u32::try_from(hops) {
            Ok(hops) if (1..=defaults::MULTIHOP_MAX_HOPS).contains(&hops) => {
                self.hops = hops;
                self.clamped_from = None;
            }
            _ => {
                tracing::warn!(hops, "invalid number of hops, forcing to 1");
                self.hops = 1;
                self.clamped_from = Some(hops);
            }
        }
        self
    }

    pub fn set_interval(mut self, interval: SimDelay) -> Self {
        self.interval = interval;
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

    pub fn hops(&self) -> u32 {
        self.hops
    }

    pub fn clamped_from(&self) -> Option<i64> {
        self.clamped_from
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
    /// [`RouteError::DisconnectedPath`] if the link model cannot cover 50m.
    ///
    /// [`RouteError::DisconnectedPath`]: crate::route::RouteError::DisconnectedPath
    pub fn run(&self) -> Result<MultiHopReport, SimError> {
        tracing::debug!(hops = self.hops, link_model = %self.link_model, "multi-hop scenario");

        let positions: Vec<f64> = (0..=self.hops)
            .map(|i| f64::from(i) * defaults::MULTIHOP_SPACING_M)
            .collect();
        let path: Vec<usize> = (0..positions.len()).collect();

        let traffic = TrafficConfig::new(NodeId::ZERO, Ipv4Addr::UNSPECIFIED)
            .set_packet_size(self.packet_size)
            .set_interval(self.interval)
            .set_max_packets(self.max_packets)
            .set_window(self.start, self.stop);

        let report = Setup {
            link_model: self.link_model,
            network: defaults::MULTIHOP_NETWORK,
            positions: &positions,
            path: &path,
            traffic,
        }
        .run()?;

        Ok(MultiHopReport {
            hops: self.hops,
            report,
        })
    }
}

impl MultiHopReport {
    /// `CSV,<hops>,<throughputMbps>,<avgDelayMs>,<loss%>`
    pub fn csv(&self) -> String {
        format!("CSV,{},{}", self.hops, self.report.csv_metrics())
    }
}

impl Default for MultiHopConfig {
    fn default() -> Self {
        Self {
            hops: 1,
            clamped_from: None,
            interval: defaults::MULTIHOP_INTERVAL,
            packet_size: defaults::MULTIHOP_PACKET_SIZE,
            max_packets: defaults::DEFAULT_MAX_PACKETS,
            start: defaults::MULTIHOP_CLIENT_START,
            stop: defaults::MULTIHOP_CLIENT_STOP,
            link_model: LinkModel::default(),
        }
    }
}

impl fmt::Display for MultiHopReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== IAB-like Multi-hop Results ===")?;
        writeln!(f, "Hops:        {}", self.hops)?;
        self.report.write_metrics(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{link::LinkId, route::RouteError};

    #[test]
    fn clamping() {
        for hops in [1, 2, 3] {
            assert_eq!(MultiHopConfig::new().set_hops(hops).hops(), hops as u32);
        }
        for hops in [0, 4, 5, -1, i64::MAX] {
            let config = MultiHopConfig::new().set_hops(hops);
            assert_eq!(config.hops(), 1);
            assert_eq!(config.clamped_from(), Some(hops));
        }
        // a later valid value clears the warning
        assert_eq!(MultiHopConfig::new().set_hops(9).set_hops(2).clamped_from(), None);
    }

    #[test]
    fn three_hops() {
        let report = MultiHopConfig::new().set_hops(3).run().unwrap();
        let record = &report.report.record;

        // 1s to 11s, one datagram every 200µs
        assert_eq!(record.tx_packets, 50_000);
        assert_eq!(record.rx_packets, 50_000);
        assert_eq!(record.rx_bytes, 50_000 * 1228);
        assert_eq!(record.times_forwarded, 2 * 50_000);
        assert_eq!(report.report.metrics.packet_loss_percent, 0.0);
        assert_eq!(report.report.nodes, 4);

        let routers: Vec<NodeId> = report.report.routes.iter().map(|entry| entry.node).collect();
        assert_eq!(routers, [NodeId::new(0), NodeId::new(1), NodeId::new(2)]);
        let ue = Ipv4Addr::new(10, 1, 0, 4);
        assert!(report.report.routes.iter().all(|entry| entry.destination == ue));
        assert_eq!(report.report.flow.destination, ue);

        assert_eq!(report.report.run.end, SimTime::from_secs(13));
        assert!(report.csv().starts_with("CSV,3,"));
        assert!(report.csv().ends_with(",0,0"));
    }

    #[test]
    fn clamped_chain_has_two_nodes() {
        let report = MultiHopConfig::new()
            .set_hops(5)
            .set_interval(SimDelay::from_millis(10))
            .run()
            .unwrap();

        assert_eq!(report.hops, 1);
        assert_eq!(report.report.nodes, 2);
        assert_eq!(report.report.routes.len(), 1);
        assert_eq!(report.report.record.rx_packets, 1_000);
    }

    #[test]
    fn reports_the_reachable_pairs() {
        let chain = |model| {
            MultiHopConfig::new()
                .set_hops(3)
                .set_interval(SimDelay::from_millis(100))
                .set_link_model(model)
                .run()
                .unwrap()
                .report
                .links
        };
        let link = |a, b| LinkId::new((NodeId::new(a), NodeId::new(b)));

        // 150m between the ends is still within the log-distance range
        assert_eq!(chain(LinkModel::default()).len(), 6);
        assert_eq!(
            chain(LinkModel::range_threshold(60.0).unwrap()),
            [link(0, 1), link(1, 2), link(2, 3)]
        );
    }

    #[test]
    fn short_range_breaks_the_chain() {
        let error = MultiHopConfig::new()
            .set_hops(2)
            .set_link_model(LinkModel::range_threshold(49.0).unwrap())
            .run()
            .unwrap_err();

        assert!(matches!(
            error,
            SimError::Route(RouteError::DisconnectedPath { .. })
        ));
    }

    #[test]
    fn summary_lines() {
        let report = MultiHopConfig::new()
            .set_hops(2)
            .set_window(SimTime::from_secs(2), SimTime::from_secs(2))
            .run()
            .unwrap();

        assert_eq!(report.csv(), "CSV,2,0,0,0");
        assert_eq!(
            report.to_string(),
            "=== IAB-like Multi-hop Results ===\n\
             Hops:        2\n\
             Throughput:  0 Mbps\n\
             Avg delay:   0 ms\n\
             Packet loss: 0 %"
        );
    }
}
