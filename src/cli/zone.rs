//! Zone command handler
//!
//! Record, inspect and remove yearly catchment radii.

use crate::catchment::zones::ZoneChange;
use crate::catchment::{Color, School};
use crate::cli::session::{short_id, Session};
use crate::error::Result;
use crate::geo::{Radius, Unit};
use crate::prefs::ZoneForm;
use clap::{Args, Subcommand};

/// Zone command arguments
#[derive(Args)]
pub struct ZoneArgs {
    #[command(subcommand)]
    pub command: ZoneCommand,
}

/// Zone subcommands
#[derive(Subcommand)]
pub enum ZoneCommand {
    /// Add or replace the zone of a school for a year
    Add {
        /// School id prefix or name
        school: String,

        /// Admission year (defaults to the last year entered)
        #[arg(long, short = 'y')]
        year: Option<i32>,

        /// Radius (defaults to the last radius entered)
        #[arg(long, short = 'r')]
        radius: Option<f64>,

        /// Radius unit: km, miles or meters
        #[arg(long, short = 'u')]
        unit: Option<Unit>,

        /// Explicit color (#rrggbb) instead of the palette color
        #[arg(long, short = 'c')]
        color: Option<Color>,
    },
    /// Remove a zone by id prefix
    Remove {
        zone: String,
    },
    /// Show the zones and average of a school
    Show {
        /// School id prefix or name
        school: String,
    },
    /// Show or hide a zone, or a school's average with --average
    Visibility {
        /// Zone id prefix (school with --average)
        target: String,

        /// true to show, false to hide
        #[arg(action = clap::ArgAction::Set)]
        visible: bool,

        #[arg(long)]
        average: bool,
    },
}

/// Run the zone command
pub async fn run(args: ZoneArgs) -> Result<()> {
    let mut session = Session::open().await?;

    match args.command {
        ZoneCommand::Add {
            school,
            year,
            radius,
            unit,
            color,
        } => {
            let school = session.resolve_school(&school).await?;
            let form = next_form(session.cache.form, year, radius, unit);

            let change = session
                .engine
                .upsert_zone(school.id, form.year, form.radius, form.unit, color)
                .await?;
            session.cache.form = form;

            let verb = match change {
                ZoneChange::Inserted(_) => "Added",
                ZoneChange::Replaced { .. } => "Replaced",
            };
            println!(
                "{} {} zone for {}: {} ({})",
                verb,
                form.year,
                school.name,
                Radius::new(form.radius, form.unit),
                short_id(change.zone_id())
            );
        }
        ZoneCommand::Remove { zone } => {
            let (school, zone) = session.resolve_zone(&zone).await?;
            session.engine.remove_zone(zone.id).await?;
            println!("Removed {} zone of {}", zone.year, school.name);
        }
        ZoneCommand::Show { school } => {
            let school = session.resolve_school(&school).await?;
            show_zones(&session, &school);
        }
        ZoneCommand::Visibility {
            target,
            visible,
            average,
        } => {
            if average {
                let school = session.resolve_school(&target).await?;
                session
                    .engine
                    .set_average_visibility(school.id, visible)
                    .await?;
            } else {
                let (_, zone) = session.resolve_zone(&target).await?;
                session.engine.set_zone_visibility(zone.id, visible).await?;
            }
            println!("{}", if visible { "Shown" } else { "Hidden" });
        }
    }

    session.save().await
}

/// Merge explicit arguments into the remembered form
///
/// Switching units without a new radius re-expresses the remembered radius.
fn next_form(
    mut form: ZoneForm,
    year: Option<i32>,
    radius: Option<f64>,
    unit: Option<Unit>,
) -> ZoneForm {
    if let Some(unit) = unit {
        form.switch_unit(unit);
    }
    if let Some(year) = year {
        form.year = year;
    }
    if let Some(radius) = radius {
        form.radius = radius;
    }
    form
}

fn show_zones(session: &Session, school: &School) {
    let unit = session.config.display.unit;

    println!("{} ({})", school.name, school.coordinates);
    if school.zones.is_empty() {
        println!("  No zones recorded.");
        return;
    }

    for zone in &school.zones {
        println!(
            "  {}  {}  {:>10.2} {:<6} {}{}",
            short_id(zone.id),
            zone.year,
            zone.radius().to(unit).value,
            unit.suffix(),
            zone.color,
            if zone.is_visible { "" } else { "  (hidden)" }
        );
    }

    if let Some(average) = &school.average {
        println!(
            "  {:8}  avg   {:>10.2} {:<6} {}{}",
            "",
            Radius::new(average.radius, Unit::Km).to(unit).value,
            unit.suffix(),
            average.color,
            if average.is_visible { "" } else { "  (hidden)" }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_next_form_switches_unit_then_overrides() {
        let form = ZoneForm {
            year: 2023,
            radius: 2.0,
            unit: Unit::Km,
        };

        let switched = next_form(form, None, None, Some(Unit::Meters));
        assert_eq!(switched.year, 2023);
        assert_eq!(switched.unit, Unit::Meters);
        assert_abs_diff_eq!(switched.radius, 2000.0, epsilon = 1e-9);

        let explicit = next_form(form, Some(2024), Some(1.5), Some(Unit::Miles));
        assert_eq!((explicit.year, explicit.unit), (2024, Unit::Miles));
        assert_abs_diff_eq!(explicit.radius, 1.5);
    }
}
