use crate::time::{SimDelay, SimTime};

/// Raw per-flow counters, updated as packets are sent and received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlowRecord {
    pub tx_packets: u64,
    pub tx_bytes: u64,
    pub rx_packets: u64,
    pub rx_bytes: u64,
    pub time_first_tx: Option<SimTime>,
    pub time_last_tx: Option<SimTime>,
    pub time_first_rx: Option<SimTime>,
    pub time_last_rx: Option<SimTime>,
    /// sum of the one-way delays of the received packets
    pub delay_sum: SimDelay,
    /// sum of the differences between consecutive one-way delays
    pub jitter_sum: SimDelay,
    pub last_delay: Option<SimDelay>,
    /// number of times a packet of the flow was forwarded by a relay
    pub times_forwarded: u64,
}

/// The aggregate metrics of a flow.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlowMetrics {
    pub throughput_mbps: f64,
    pub avg_delay_ms: f64,
    pub packet_loss_percent: f64,
}

impl FlowRecord {
    pub(super) fn on_tx(&mut self, time: SimTime, bytes: u64) {
        self.tx_packets += 1;
        self.tx_bytes += bytes;
        self.time_first_tx = Some(self.time_first_tx.map_or(time, |t| t.min(time)));
        self.time_last_tx = Some(self.time_last_tx.map_or(time, |t| t.max(time)));
    }

    pub(super) fn on_rx(&mut self, time: SimTime, bytes: u64, delay: SimDelay) {
        self.rx_packets += 1;
        self.rx_bytes += bytes;
        self.delay_sum += delay;
        if let Some(last) = self.last_delay {
            self.jitter_sum += (delay - last).abs();
        }
        self.last_delay = Some(delay);
        self.time_first_rx = Some(self.time_first_rx.map_or(time, |t| t.min(time)));
        self.time_last_rx = Some(self.time_last_rx.map_or(time, |t| t.max(time)));
    }

    /// packets sent but not (yet) received
    pub fn lost_packets(&self) -> u64 {
        self.tx_packets.saturating_sub(self.rx_packets)
    }

    /// Reduce the counters into the final [`FlowMetrics`].
    ///
    /// * throughput is `0` without receptions or when the last reception
    ///   is not after the first transmission, otherwise
    ///   `rx_bytes * 8 / ((last_rx - first_tx) * 1e6)` Mbps;
    /// * the average delay is `0` without receptions, otherwise
    ///   `delay_sum / rx_packets * 1000` ms;
    /// * the loss is `0` without transmissions, otherwise
    ///   `(tx_packets - rx_packets) * 100 / tx_packets` percent.
    ///
    /// ```
    /// # use hopsim_core::flow::FlowRecord;
    /// let metrics = FlowRecord::default().metrics();
    /// assert_eq!(metrics.throughput_mbps, 0.0);
    /// assert_eq!(metrics.avg_delay_ms, 0.0);
    /// assert_eq!(metrics.packet_loss_percent, 0.0);
    /// ```
    pub fn metrics(&self) -> FlowMetrics {
        let throughput_mbps = match (self.time_first_tx, self.time_last_rx) {
            (Some(first_tx), Some(last_rx)) if self.rx_packets > 0 && last_rx > first_tx => {
                let duration = last_rx.as_secs_f64() - first_tx.as_secs_f64();
                (self.rx_bytes as f64 * 8.0) / (duration * 1e6)
            }
            _ => 0.0,
        };

        let avg_delay_ms = if self.rx_packets == 0 {
            0.0
        } else {
            (self.delay_sum.as_secs_f64() / self.rx_packets as f64) * 1000.0
        };

        let packet_loss_percent = if self.tx_packets == 0 {
            0.0
        } else {
            self.lost_packets() as f64 * 100.0 / self.tx_packets as f64
        };

        FlowMetrics {
            throughput_mbps,
            avg_delay_ms,
            packet_loss_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_extends_time_window() {
        let mut record = FlowRecord::default();
        record.on_tx(SimTime::from_secs(2), 100);
        record.on_tx(SimTime::from_secs(1), 100);
        record.on_tx(SimTime::from_secs(3), 100);

        assert_eq!(record.tx_packets, 3);
        assert_eq!(record.tx_bytes, 300);
        assert_eq!(record.time_first_tx, Some(SimTime::from_secs(1)));
        assert_eq!(record.time_last_tx, Some(SimTime::from_secs(3)));
    }

    #[test]
    fn rx_accumulates_delay_and_jitter() {
        let mut record = FlowRecord::default();
        record.on_rx(SimTime::from_secs(1), 10, SimDelay::from_millis(4));
        record.on_rx(SimTime::from_secs(2), 10, SimDelay::from_millis(1));
        record.on_rx(SimTime::from_secs(3), 10, SimDelay::from_millis(3));

        assert_eq!(record.rx_packets, 3);
        assert_eq!(record.rx_bytes, 30);
        assert_eq!(record.delay_sum, SimDelay::from_millis(8));
        assert_eq!(record.jitter_sum, SimDelay::from_millis(5));
        assert_eq!(record.time_first_rx, Some(SimTime::from_secs(1)));
        assert_eq!(record.time_last_rx, Some(SimTime::from_secs(3)));
    }

    #[test]
    fn metrics_formulas() {
        let mut record = FlowRecord::default();
        // 4 packets sent between 1s and 2.5s, 3 received, last at 3s
        for ms in [1000, 1500, 2000, 2500] {
            record.on_tx(SimTime::from_millis(ms), 1250);
        }
        record.on_rx(SimTime::from_millis(1002), 1250, SimDelay::from_millis(2));
        record.on_rx(SimTime::from_millis(1504), 1250, SimDelay::from_millis(4));
        record.on_rx(SimTime::from_millis(3000), 1250, SimDelay::from_millis(500));

        let metrics = record.metrics();
        // 3750 bytes * 8 / (2s * 1e6)
        assert!((metrics.throughput_mbps - 0.015).abs() < 1e-12);
        // (0.506s / 3) * 1000
        assert!((metrics.avg_delay_ms - 168.666_666_666_666_66).abs() < 1e-9);
        assert_eq!(metrics.packet_loss_percent, 25.0);
    }

    #[test]
    fn nothing_received() {
        let mut record = FlowRecord::default();
        record.on_tx(SimTime::from_secs(1), 1428);
        record.on_tx(SimTime::from_secs(2), 1428);

        let metrics = record.metrics();
        assert_eq!(metrics.throughput_mbps, 0.0);
        assert_eq!(metrics.avg_delay_ms, 0.0);
        assert_eq!(metrics.packet_loss_percent, 100.0);
    }

    #[test]
    fn received_at_first_transmission_time() {
        let mut record = FlowRecord::default();
        record.on_tx(SimTime::from_secs(1), 1428);
        record.on_rx(SimTime::from_secs(1), 1428, SimDelay::ZERO);

        let metrics = record.metrics();
        // zero-length window: no throughput, but the packet is not lost
        assert_eq!(metrics.throughput_mbps, 0.0);
        assert_eq!(metrics.avg_delay_ms, 0.0);
        assert_eq!(metrics.packet_loss_percent, 0.0);
    }

    #[test]
    fn loss_is_bounded() {
        for tx in 0..20u64 {
            for rx in 0..=tx {
                let record = FlowRecord {
                    tx_packets: tx,
                    rx_packets: rx,
                    ..FlowRecord::default()
                };
                let loss = record.metrics().packet_loss_percent;
                assert!((0.0..=100.0).contains(&loss), "tx={tx} rx={rx} loss={loss}");
            }
        }
    }
}
