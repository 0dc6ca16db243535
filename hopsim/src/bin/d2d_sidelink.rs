//! D2D sidelink measurement.
//!
//! ```bash
//! d2d-sidelink --mode=relay --intervalUs=200
//! ```

use anyhow::Result;
use clap::Parser as _;
use hopsim::{SidelinkArgs, init_tracing};
use tracing::info;

fn main() -> Result<()> {
    init_tracing();

    let args = SidelinkArgs::parse();
    let config = args.config()?;

    println!("{}", args.banner());
    info!(
        mode = %config.mode(),
        interval_us = config.interval_us(),
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
