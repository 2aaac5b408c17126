//! Cover command handler
//!
//! Reports which favorite schools' catchments contain a point.

use crate::cli::session::Session;
use crate::error::Result;
use crate::geo::{Coordinates, Unit};
use clap::Args;

/// Cover command arguments
#[derive(Args)]
pub struct CoverArgs {
    #[arg(allow_negative_numbers = true)]
    pub lat: f64,

    #[arg(allow_negative_numbers = true)]
    pub lng: f64,

    /// Show which years cover the point for every school
    #[arg(long, short = 'd')]
    pub detail: bool,
}

/// Run the cover command
pub async fn run(args: CoverArgs) -> Result<()> {
    let point = Coordinates::checked(args.lat, args.lng)?;
    let session = Session::open().await?;

    if args.detail {
        let unit = session.config.display.unit;
        for coverage in session.engine.coverage_by_year(point).await {
            let distance = crate::geo::convert(coverage.distance_meters, Unit::Meters, unit);
            let latest = if coverage.covered_latest() {
                "inside in the latest year"
            } else {
                "outside in the latest year"
            };
            println!(
                "{} ({:.2} {} away, {})\n  covered: {}\n  not covered: {}",
                coverage.name,
                distance,
                unit.suffix(),
                latest,
                join_years(&coverage.covered_years),
                join_years(&coverage.uncovered_years)
            );
        }
        return Ok(());
    }

    let covered = session.engine.schools_covering(point).await;
    if covered.is_empty() {
        println!("{} is not inside any saved catchment.", point);
        return Ok(());
    }

    println!("{} is inside the catchment of:", point);
    for school in session.engine.schools().await {
        if covered.contains(&school.id) {
            println!("  {}", school.name);
        }
    }
    Ok(())
}

fn join_years(years: &[i32]) -> String {
    if years.is_empty() {
        return "-".to_string();
    }
    years
        .iter()
        .map(|y| y.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
