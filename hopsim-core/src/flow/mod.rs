//! Flow classification and statistics.
//!
//! The [`FlowMonitor`] observes every packet the traffic generators send
//! and every packet that reaches its destination. Packets are grouped by
//! their [`FiveTuple`] into flows and each flow keeps a [`FlowRecord`] of
//! raw counters. Once the run is over the record is reduced into
//! [`FlowMetrics`] with [`FlowMonitor::finalize`].
//!
//! ```
//! use hopsim_core::{
//!     flow::{FiveTuple, FlowMonitor},
//!     time::{SimDelay, SimTime},
//! };
//! use std::net::Ipv4Addr;
//!
//! let key = FiveTuple::udp(Ipv4Addr::new(10, 0, 0, 1), 49153, Ipv4Addr::new(10, 0, 0, 3), 5000);
//! let mut monitor = FlowMonitor::new();
//!
//! monitor.record_tx(&key, SimTime::from_secs(1), 1_000);
//! monitor.record_tx(&key, SimTime::from_secs(2), 1_000);
//! monitor
//!     .record_rx(&key, SimTime::from_secs(3), 1_000, SimDelay::from_millis(10))
//!     .unwrap();
//!
//! let metrics = monitor.finalize(&key);
//! assert_eq!(metrics.packet_loss_percent, 50.0);
//! assert_eq!(metrics.avg_delay_ms, 10.0);
//! assert_eq!(metrics.throughput_mbps, 0.004);
//! ```
mod classifier;
mod stats;

pub use self::{
    classifier::{FiveTuple, FlowClassifier, FlowId},
    stats::{FlowMetrics, FlowRecord},
};
use crate::time::{SimDelay, SimTime};
use std::{collections::BTreeMap, net::Ipv4Addr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A reception without a matching, not yet received, transmission.
    #[error("Reception on flow {flow} does not match any transmitted packet")]
    UnmatchedReception { flow: FiveTuple },
}

#[derive(Debug, Default)]
pub struct FlowMonitor {
    classifier: FlowClassifier,

    records: BTreeMap<FlowId, FlowRecord>,
}

impl FlowMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn classifier(&self) -> &FlowClassifier {
        &self.classifier
    }

    /// Account a packet of `bytes` sent at `time` on the flow `key`.
    pub fn record_tx(&mut self, key: &FiveTuple, time: SimTime, bytes: u64) -> FlowId {
        let id = self.classifier.classify(key);
        self.records.entry(id).or_default().on_tx(time, bytes);
        tracing::trace!(flow = %id, %time, bytes, "tx");
        id
    }

    /// Account a packet of `bytes` received at `time` on the flow `key`,
    /// `delay` after it was sent.
    ///
    /// # Errors
    ///
    /// [`FlowError::UnmatchedReception`] if the flow has no transmitted
    /// packet left to match this reception. Nothing is recorded then.
    pub fn record_rx(
        &mut self,
        key: &FiveTuple,
        time: SimTime,
        bytes: u64,
        delay: SimDelay,
    ) -> Result<FlowId, FlowError> {
        let record = self
            .classifier
            .lookup(key)
            .and_then(|id| self.records.get_mut(&id).map(|record| (id, record)));

        match record {
            Some((id, record)) if record.rx_packets < record.tx_packets => {
                record.on_rx(time, bytes, delay);
                tracing::trace!(flow = %id, %time, bytes, %delay, "rx");
                Ok(id)
            }
            _ => Err(FlowError::UnmatchedReception { flow: *key }),
        }
    }

    /// Account one forwarding of a packet of the flow `key` by a relay.
    pub fn record_forward(&mut self, key: &FiveTuple) {
        if let Some(id) = self.classifier.lookup(key) {
            self.records.entry(id).or_default().times_forwarded += 1;
        }
    }

    pub fn record(&self, key: &FiveTuple) -> Option<&FlowRecord> {
        self.classifier
            .lookup(key)
            .and_then(|id| self.records.get(&id))
    }

    /// The final metrics of the flow `key`.
    ///
    /// A flow that never sent anything yields all-zero metrics.
    pub fn finalize(&self, key: &FiveTuple) -> FlowMetrics {
        self.record(key)
            .map(FlowRecord::metrics)
            .unwrap_or_default()
    }

    /// All the flows, in the order they were first seen.
    pub fn flows(&self) -> impl Iterator<Item = (FlowId, &FiveTuple, &FlowRecord)> + '_ {
        self.records.iter().filter_map(|(id, record)| {
            self.classifier
                .find_flow(*id)
                .map(|tuple| (*id, tuple, record))
        })
    }

    /// The first flow going from `source` to `destination`, whatever the
    /// protocol and ports.
    pub fn find_flow(
        &self,
        source: Ipv4Addr,
        destination: Ipv4Addr,
    ) -> Option<(FlowId, &FiveTuple, &FlowRecord)> {
        self.flows()
            .find(|(_, tuple, _)| tuple.source == source && tuple.destination == destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(port: u16) -> FiveTuple {
        FiveTuple::udp(
            Ipv4Addr::new(10, 1, 0, 1),
            port,
            Ipv4Addr::new(10, 1, 0, 4),
            5000,
        )
    }

    #[test]
    fn reception_requires_a_transmission() {
        let mut monitor = FlowMonitor::new();
        let key = key(49153);

        assert_eq!(
            monitor.record_rx(&key, SimTime::ZERO, 10, SimDelay::ZERO),
            Err(FlowError::UnmatchedReception { flow: key })
        );

        monitor.record_tx(&key, SimTime::ZERO, 10);
        assert!(monitor.record_rx(&key, SimTime::ZERO, 10, SimDelay::ZERO).is_ok());
        // the single transmitted packet was already received
        assert!(monitor.record_rx(&key, SimTime::ZERO, 10, SimDelay::ZERO).is_err());

        let record = monitor.record(&key).unwrap();
        assert_eq!(record.tx_packets, 1);
        assert_eq!(record.rx_packets, 1);
    }

    #[test]
    fn flows_are_kept_apart() {
        let mut monitor = FlowMonitor::new();
        let a = key(49153);
        let b = key(49154);

        let id_a = monitor.record_tx(&a, SimTime::from_secs(1), 100);
        let id_b = monitor.record_tx(&b, SimTime::from_secs(1), 100);
        monitor.record_tx(&b, SimTime::from_secs(2), 100);
        monitor
            .record_rx(&b, SimTime::from_secs(2), 100, SimDelay::ZERO)
            .unwrap();

        assert_ne!(id_a, id_b);
        assert_eq!(monitor.finalize(&a).packet_loss_percent, 100.0);
        assert_eq!(monitor.finalize(&b).packet_loss_percent, 50.0);

        let ids: Vec<_> = monitor.flows().map(|(id, _, _)| id).collect();
        assert_eq!(ids, vec![id_a, id_b]);

        let (found, tuple, _) = monitor.find_flow(a.source, a.destination).unwrap();
        assert_eq!(found, id_a);
        assert_eq!(tuple, &a);
    }

    #[test]
    fn unknown_flow_finalizes_to_zero() {
        let monitor = FlowMonitor::new();
        assert_eq!(monitor.finalize(&key(1)), FlowMetrics::default());
        assert!(monitor.find_flow(Ipv4Addr::LOCALHOST, Ipv4Addr::LOCALHOST).is_none());
    }

    #[test]
    fn forwards_are_counted() {
        let mut monitor = FlowMonitor::new();
        let key = key(49153);
        monitor.record_forward(&key);
        assert!(monitor.record(&key).is_none());

        monitor.record_tx(&key, SimTime::ZERO, 10);
        monitor.record_forward(&key);
        monitor.record_forward(&key);
        assert_eq!(monitor.record(&key).unwrap().times_forwarded, 2);
    }
}
