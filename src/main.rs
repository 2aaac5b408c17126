//! catchment CLI entry point
//!
//! School catchment tracker - CLI + favorites API server

use catchment::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
