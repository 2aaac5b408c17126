//! Measure command handler

use crate::error::Result;
use crate::geo::{Coordinates, Measurement, Unit};
use clap::Args;

/// Measure command arguments
#[derive(Args)]
pub struct MeasureArgs {
    #[arg(allow_negative_numbers = true)]
    pub lat1: f64,

    #[arg(allow_negative_numbers = true)]
    pub lng1: f64,

    #[arg(allow_negative_numbers = true)]
    pub lat2: f64,

    #[arg(allow_negative_numbers = true)]
    pub lng2: f64,

    /// Output unit: km, miles or meters
    #[arg(long, short = 'u', default_value = "meters")]
    pub unit: Unit,
}

/// Run the measure command
pub fn run(args: MeasureArgs) -> Result<()> {
    let from = Coordinates::checked(args.lat1, args.lng1)?;
    let to = Coordinates::checked(args.lat2, args.lng2)?;
    let measurement = Measurement::between(from, to);

    println!("{:.2} {}", measurement.in_unit(args.unit), args.unit.suffix());
    Ok(())
}
