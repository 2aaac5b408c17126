//! Palette command handler
//!
//! Switching palettes recolors every school and persists the new colors.

use crate::catchment::{PaletteKind, PaletteName, PaletteSelection};
use crate::cli::session::Session;
use crate::error::Result;
use crate::sync::RecolorReport;
use clap::{Args, Subcommand};

/// Palette command arguments
#[derive(Args)]
pub struct PaletteArgs {
    #[command(subcommand)]
    pub command: Option<PaletteCommand>,
}

/// Palette subcommands
#[derive(Subcommand)]
pub enum PaletteCommand {
    /// Show palettes and the current selection
    Show,
    /// Select a palette
    Set {
        /// vibrant, pastel, earth, ocean, sunset or contrast
        name: PaletteName,

        /// Index colors by school or by year
        #[arg(long, short = 'k')]
        kind: Option<PaletteKind>,

        /// Apply to one school only (id prefix or name), indexed by year
        #[arg(long, short = 's', conflicts_with = "kind")]
        school: Option<String>,
    },
    /// Drop custom colors and return to the default palette
    Reset,
}

/// Run the palette command
pub async fn run(args: PaletteArgs) -> Result<()> {
    let mut session = Session::open().await?;

    match args.command.unwrap_or(PaletteCommand::Show) {
        PaletteCommand::Show => show_palettes(session.engine.palette().await),
        PaletteCommand::Set { name, kind, school } => match school {
            Some(school) => {
                let school = session.resolve_school(&school).await?;
                session.engine.set_school_palette(school.id, name).await?;
                println!("{} now uses the {} palette", school.name, name);
            }
            None => {
                let selection = PaletteSelection {
                    kind: kind.unwrap_or(session.config.display.palette_kind),
                    name,
                };
                let report = session.engine.select_palette(selection).await;
                session.config.display.palette_kind = selection.kind;
                session.config.display.palette = selection.name;
                session.config.save()?;
                print_report(&report);
            }
        },
        PaletteCommand::Reset => {
            let report = session.engine.reset_colors().await;
            session.config.display.palette_kind = report.selection.kind;
            session.config.display.palette = report.selection.name;
            session.config.save()?;
            print_report(&report);
        }
    }

    session.save().await
}

fn show_palettes(current: PaletteSelection) {
    println!("Current: {} ({})\n", current.name, current.kind);
    for name in PaletteName::all() {
        let colors: Vec<String> = name.colors().iter().map(|c| c.to_string()).collect();
        let marker = if name == current.name { "*" } else { " " };
        println!(" {} {:<9} {}", marker, name.to_string(), colors.join(" "));
    }
}

fn print_report(report: &RecolorReport) {
    println!(
        "Using {} ({}); recolored {} school(s)",
        report.selection.name,
        report.selection.kind,
        report.recolored.len()
    );
    if !report.failed.is_empty() {
        println!(
            "{} school(s) kept their old colors because saving failed; run again to retry",
            report.failed.len()
        );
    }
}
