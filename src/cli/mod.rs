//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod config;
pub mod cover;
pub mod measure;
pub mod palette;
pub mod pin;
pub mod school;
pub mod serve;
pub mod session;
pub mod status;
pub mod zone;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// School catchment zone tracker
#[derive(Parser)]
#[command(name = "catchment")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the favorites API server (foreground)
    Serve(serve::ServeArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Show server and store status
    Status(status::StatusArgs),

    /// Manage favorite schools
    School(school::SchoolArgs),

    /// Manage yearly catchment zones
    Zone(zone::ZoneArgs),

    /// Which schools' catchments cover a point
    Cover(cover::CoverArgs),

    /// Distance between two points
    Measure(measure::MeasureArgs),

    /// Manage map pins
    Pin(pin::PinArgs),

    /// Show or change circle colors
    Palette(palette::PaletteArgs),
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over `default_level`. Later calls are ignored.
pub fn init_logging(default_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    // The server logs requests; other commands only surface problems
    let level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    init_logging(level);

    match cli.command {
        Commands::Serve(args) => serve::run(args).await,
        Commands::Config(args) => config::run(args),
        Commands::Status(args) => status::run(args).await,
        Commands::School(args) => school::run(args).await,
        Commands::Zone(args) => zone::run(args).await,
        Commands::Cover(args) => cover::run(args).await,
        Commands::Measure(args) => measure::run(args),
        Commands::Pin(args) => pin::run(args).await,
        Commands::Palette(args) => palette::run(args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_zone_add() {
        let cli = Cli::try_parse_from([
            "catchment", "zone", "add", "Hillside", "--year", "2024", "--radius", "1.2", "--unit",
            "miles",
        ])
        .unwrap();
        assert!(matches!(cli.command, Commands::Zone(_)));
    }

    #[test]
    fn test_parse_measure_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "catchment", "measure", "51.5074", "-0.1278", "51.5007", "-0.1246",
        ])
        .unwrap();
        match cli.command {
            Commands::Measure(args) => assert_eq!(args.lng1, -0.1278),
            _ => panic!("expected measure"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["catchment", "generate"]).is_err());
    }
}
