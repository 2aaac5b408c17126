//! School command handler
//!
//! List, add, move and remove favorite schools.

use crate::cli::session::{short_id, Session};
use crate::error::{Error, Result};
use crate::geo::{get_geocoder, Coordinates, Geocoder, Radius, Unit};
use clap::{Args, Subcommand};
use std::io::{self, BufRead, Write};

/// School command arguments
#[derive(Args)]
pub struct SchoolArgs {
    #[command(subcommand)]
    pub command: Option<SchoolCommand>,
}

/// School subcommands
#[derive(Subcommand)]
pub enum SchoolCommand {
    /// List favorite schools
    List,
    /// Add a favorite school
    Add {
        /// School name
        name: String,

        /// Street address (geocoded when no coordinates are given)
        #[arg(long, short = 'a', default_value = "")]
        address: String,

        /// Latitude
        #[arg(long, requires = "lng", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lng: Option<f64>,

        /// Use the most recently placed school pin
        #[arg(long, conflicts_with_all = ["lat", "lng"])]
        at_pin: bool,
    },
    /// Move a school to new coordinates
    Move {
        /// School id prefix or name
        school: String,

        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Remove a school and its zones
    Remove {
        /// School id prefix or name
        school: String,

        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Run the school command
pub async fn run(args: SchoolArgs) -> Result<()> {
    let mut session = Session::open().await?;

    match args.command.unwrap_or(SchoolCommand::List) {
        SchoolCommand::List => list_schools(&session).await,
        SchoolCommand::Add {
            name,
            address,
            lat,
            lng,
            at_pin,
        } => add_school(&session, &name, &address, lat.zip(lng), at_pin).await?,
        SchoolCommand::Move { school, lat, lng } => {
            let school = session.resolve_school(&school).await?;
            let circles = session
                .engine
                .relocate_school(school.id, Coordinates::checked(lat, lng)?)
                .await?;
            println!(
                "Moved {} to ({:.5}, {:.5}); {} circle(s) re-centered",
                school.name,
                lat,
                lng,
                circles.len()
            );
        }
        SchoolCommand::Remove { school, yes } => {
            let school = session.resolve_school(&school).await?;
            let confirmation = session.engine.prepare_removal(school.id).await?;
            if !yes && !confirm(&confirmation.prompt())? {
                println!("Cancelled.");
                return Ok(());
            }
            let removed = session.engine.remove_school(confirmation).await?;
            println!("Removed {}", removed.name);
        }
    }

    session.save().await
}

/// List favorites with zone summaries
async fn list_schools(session: &Session) {
    let schools = session.engine.schools().await;
    if schools.is_empty() {
        println!("No favorite schools.");
        return;
    }

    let unit = session.config.display.unit;
    println!("Favorite schools ({}):\n", schools.len());
    for school in schools {
        let average = school
            .average
            .as_ref()
            .map(|a| {
                let radius = Radius::new(a.radius, Unit::Km).to(unit);
                format!("{:.2} {}", radius.value, unit.suffix())
            })
            .unwrap_or_else(|| "-".to_string());

        println!(
            "  {} - {}\n    {} ({})\n    Zones: {} | Average: {}\n",
            short_id(school.id),
            school.name,
            if school.address.is_empty() { "(no address)" } else { &school.address },
            school.coordinates,
            school.years().iter().map(|y| y.to_string()).collect::<Vec<_>>().join(", "),
            average
        );
    }
}

async fn add_school(
    session: &Session,
    name: &str,
    address: &str,
    coords: Option<(f64, f64)>,
    at_pin: bool,
) -> Result<()> {
    let school = if at_pin {
        session.engine.add_school_at_pin(name, address).await?
    } else {
        let coordinates = match coords {
            Some((lat, lng)) => Coordinates::checked(lat, lng)?,
            None => geocode(session, name, address).await?,
        };
        session.engine.add_school(name, address, coordinates).await?
    };

    println!("Added {} ({}) at {}", school.name, short_id(school.id), school.coordinates);
    Ok(())
}

/// Look up coordinates for a school without explicit ones
async fn geocode(session: &Session, name: &str, address: &str) -> Result<Coordinates> {
    let geocoder = get_geocoder(&session.config.geocoding)?.ok_or_else(|| {
        Error::Validation("No coordinates given; pass --lat/--lng or --at-pin".to_string())
    })?;

    let query = if address.trim().is_empty() { name } else { address };
    match geocoder.search(query).await? {
        Some(location) => {
            eprintln!("Geocoded to: {}", location.display_name);
            Ok(location.coordinates())
        }
        None => Err(Error::Geocoding(format!("Could not geocode '{}'", query))),
    }
}

/// Ask a yes/no question on stdin
fn confirm(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
