use crate::{
    flow::{FiveTuple, FlowMetrics, FlowRecord},
    link::LinkId,
    route::RouteEntry,
    scheduler::RunSummary,
    sim_context::Simulation,
};
use std::fmt;

/// number of significant digits of a [`Significant`]
const PRECISION: usize = 6;

/// What a scenario measured on its monitored flow.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// the monitored flow
    pub flow: FiveTuple,
    /// raw counters, all zero if the flow never sent anything
    pub record: FlowRecord,
    pub metrics: FlowMetrics,
    pub run: RunSummary,
    /// the route table of the run, ordered by node
    pub routes: Vec<RouteEntry>,
    /// number of nodes of the topology
    pub nodes: usize,
    /// the pairs of nodes within reach of each other
    pub links: Vec<LinkId>,
}

/// A floating point number displayed with 6 significant digits, trailing
/// zeros removed, in scientific notation when the exponent is below -4 or
/// above 5. This is how a default `std::ostream` prints a `double`, and
/// what the `CSV,` lines use.
///
/// ```
/// use hopsim_core::scenario::Significant;
///
/// assert_eq!(Significant(100.0).to_string(), "100");
/// assert_eq!(Significant(2.0 / 3.0).to_string(), "0.666667");
/// assert_eq!(Significant(123456789.0).to_string(), "1.23457e+08");
/// assert_eq!(Significant(0.00001).to_string(), "1e-05");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Significant(pub f64);

impl Report {
    /// Collect the statistics of `flow` once `simulation` has run.
    pub(crate) fn collect(simulation: &Simulation, flow: FiveTuple, run: RunSummary) -> Self {
        let world = simulation.world();
        let monitor = world.monitor();
        let record = monitor.record(&flow).cloned().unwrap_or_default();
        let metrics = monitor.finalize(&flow);

        tracing::info!(
            %flow,
            tx = record.tx_packets,
            rx = record.rx_packets,
            forwarded = record.times_forwarded,
            executed = run.executed,
            "run complete"
        );

        Self {
            flow,
            record,
            metrics,
            run,
            routes: world.router().entries().collect(),
            nodes: world.topology().len(),
            links: world.topology().links(),
        }
    }

    /// Write the three measurement lines of the console summary.
    pub(crate) fn write_metrics(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Throughput:  {} Mbps", Significant(self.metrics.throughput_mbps))?;
        writeln!(f, "Avg delay:   {} ms", Significant(self.metrics.avg_delay_ms))?;
        write!(f, "Packet loss: {} %", Significant(self.metrics.packet_loss_percent))
    }

    /// The `,`-joined metrics ending a `CSV,` line.
    pub(crate) fn csv_metrics(&self) -> String {
        format!(
            "{},{},{}",
            Significant(self.metrics.throughput_mbps),
            Significant(self.metrics.avg_delay_ms),
            Significant(self.metrics.packet_loss_percent),
        )
    }
}

impl fmt::Display for Significant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            return f.write_str("nan");
        }
        if value.is_infinite() {
            return f.write_str(if value < 0.0 { "-inf" } else { "inf" });
        }
        if value == 0.0 {
            return f.write_str(if value.is_sign_negative() { "-0" } else { "0" });
        }

        // the exponent after rounding to the requested precision
        let scientific = format!("{:.*e}", PRECISION - 1, value);
        let Some((mantissa, exponent)) = scientific
            .split_once('e')
            .and_then(|(m, e)| e.parse::<i32>().ok().map(|e| (m, e)))
        else {
            return f.write_str(&scientific);
        };

        if exponent < -4 || exponent >= PRECISION as i32 {
            let sign = if exponent < 0 { '-' } else { '+' };
            write!(
                f,
                "{}e{sign}{:02}",
                trim_fraction(mantissa),
                exponent.unsigned_abs()
            )
        } else {
            let decimals = (PRECISION as i32 - 1 - exponent) as usize;
            let fixed = format!("{value:.decimals$}");
            f.write_str(trim_fraction(&fixed))
        }
    }
}

fn trim_fraction(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn g(value: f64) -> String {
        Significant(value).to_string()
    }

    #[test]
    fn fixed_notation() {
        assert_eq!(g(0.0), "0");
        assert_eq!(g(1.0), "1");
        assert_eq!(g(-2.5), "-2.5");
        assert_eq!(g(100.0), "100");
        assert_eq!(g(12.5), "12.5");
        assert_eq!(g(0.1), "0.1");
        assert_eq!(g(0.0001), "0.0001");
        assert_eq!(g(33.333333333), "33.3333");
        assert_eq!(g(112.1234567), "112.123");
        assert_eq!(g(999999.0), "999999");
    }

    #[test]
    fn scientific_notation() {
        assert_eq!(g(1_000_000.0), "1e+06");
        assert_eq!(g(999_999.5), "1e+06");
        assert_eq!(g(1_234_567.0), "1.23457e+06");
        assert_eq!(g(0.00001), "1e-05");
        assert_eq!(g(0.000012345678), "1.23457e-05");
        assert_eq!(g(-3.0e-7), "-3e-07");
        assert_eq!(g(1.5e120), "1.5e+120");
    }

    #[test]
    fn non_finite() {
        assert_eq!(g(f64::NAN), "nan");
        assert_eq!(g(f64::INFINITY), "inf");
        assert_eq!(g(f64::NEG_INFINITY), "-inf");
    }
}
