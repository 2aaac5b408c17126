//! Status command handler
//!
//! Shows the configured store, the favorites it holds, and whether the
//! API server is reachable.

use crate::config::Config;
use crate::error::Result;
use crate::server::routes::StatusResponse;
use crate::store::{self, FavoritesStore};
use clap::Args;

/// Status command arguments
#[derive(Args)]
pub struct StatusArgs {
    /// Check if the server is running (tries to connect)
    #[arg(long)]
    pub server: bool,
}

/// Run the status command
pub async fn run(args: StatusArgs) -> Result<()> {
    let config = Config::load()?;

    println!("catchment v{}", env!("CARGO_PKG_VERSION"));
    println!();

    if args.server {
        check_server_status(&config).await;
    }

    println!("Store: {}", config.store.backend);
    let store = store::open(&config)?;
    let listed = tokio::time::timeout(config.store_timeout(), store.list()).await;
    match listed {
        Ok(Ok(schools)) => {
            let zones: usize = schools.iter().map(|s| s.zones.len()).sum();
            println!("  Favorites: {}", schools.len());
            println!("  Zones: {}", zones);
        }
        Ok(Err(e)) => println!("  Error: {}", e),
        Err(_) => println!("  Error: no answer within {}s", config.store.timeout_secs),
    }
    println!();

    println!(
        "Display: {} | palette {} ({})",
        config.display.unit, config.display.palette, config.display.palette_kind
    );

    Ok(())
}

/// Check if the server is running
async fn check_server_status(config: &Config) {
    let url = format!("http://{}/api/status", config.server_addr());

    match reqwest::get(&url).await {
        Ok(response) if response.status().is_success() => {
            println!("Server: RUNNING on {}", config.server_addr());
            if let Ok(status) = response.json::<StatusResponse>().await {
                println!("  Version: {}", status.version);
                if status.configured_backend.is_empty() || status.configured_backend == status.backend {
                    println!("  Backend: {}", status.backend);
                } else {
                    println!(
                        "  Backend: {} (configured: {})",
                        status.backend, status.configured_backend
                    );
                }
                println!("  Favorites: {}", status.favorites);
                println!("  Uptime: {}s", status.uptime_secs);
            }
        }
        Ok(response) => println!("Server: ERROR (status {})", response.status()),
        Err(_) => println!("Server: NOT RUNNING on {}", config.server_addr()),
    }
    println!();
}
