//! Pin command handler
//!
//! Pins are local markers kept in the cache; school pins follow their school.

use crate::cli::session::{short_id, Session};
use crate::error::Result;
use crate::geo::Coordinates;
use crate::pins::{DragOutcome, PinKind};
use clap::{Args, Subcommand};

/// Pin command arguments
#[derive(Args)]
pub struct PinArgs {
    #[command(subcommand)]
    pub command: Option<PinCommand>,
}

/// Pin subcommands
#[derive(Subcommand)]
pub enum PinCommand {
    /// List pins
    List,
    /// Place a pin at exact coordinates
    Place {
        /// school or location
        kind: PinKind,

        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Move a pin; moving a school pin moves its school
    Move {
        /// Pin id prefix
        pin: String,

        #[arg(allow_negative_numbers = true)]
        lat: f64,

        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Remove a pin
    Remove {
        /// Pin id prefix
        pin: String,
    },
}

/// Run the pin command
pub async fn run(args: PinArgs) -> Result<()> {
    let mut session = Session::open().await?;

    match args.command.unwrap_or(PinCommand::List) {
        PinCommand::List => {
            let pins = session.engine.pins().await;
            if pins.is_empty() {
                println!("No pins.");
            }
            for pin in pins {
                println!(
                    "  {}  {:<9} {}{}",
                    short_id(pin.id),
                    pin.kind.to_string(),
                    pin.coordinates,
                    pin.label.map(|l| format!("  {}", l)).unwrap_or_default()
                );
            }
        }
        PinCommand::Place { kind, lat, lng } => {
            let pin = session.engine.place_pin(kind, lat, lng).await?;
            println!("Placed {} pin {} at {}", pin.kind, short_id(pin.id), pin.coordinates);
        }
        PinCommand::Move { pin, lat, lng } => {
            let pin = session.resolve_pin(&pin).await?;
            let coordinates = Coordinates::checked(lat, lng)?;
            match session.engine.drag_pin(pin.id, coordinates).await? {
                DragOutcome::Relocate { .. } => {
                    println!("Moved pin and school to {}", coordinates)
                }
                DragOutcome::Moved { .. } => println!("Moved pin to {}", coordinates),
            }
        }
        PinCommand::Remove { pin } => {
            let pin = session.resolve_pin(&pin).await?;
            session.engine.remove_pin(pin.id).await?;
            println!("Removed pin {}", short_id(pin.id));
        }
    }

    session.save().await
}
