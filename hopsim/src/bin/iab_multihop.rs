//! IAB-like multi-hop measurement.
//!
//! ```bash
//! iab-multihop --hops=3
//! ```

use anyhow::Result;
use clap::Parser as _;
use hopsim::{MultiHopArgs, init_tracing};
use tracing::info;

fn main() -> Result<()> {
    init_tracing();

    let args = MultiHopArgs::parse();
    let config = args.config()?;

    for line in MultiHopArgs::preamble(&config) {
        println!("{line}");
    }
    info!(
        hops = config.hops(),
        start = %config.start(),
        stop = %config.stop(),
        link_model = %config.link_model(),
        "Starting simulation"
    );

    let report = config.run()?;

    println!("{report}");
    println!("{}", report.csv());

    Ok(())
}
