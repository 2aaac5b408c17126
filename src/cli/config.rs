//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::error::{Error, Result};
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "store.backend")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    if args.path {
        println!("{}", Config::config_path()?.display());
        return Ok(());
    }

    if args.reset {
        Config::default().save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;

    match (args.key, args.value) {
        (None, None) => show_all_config(&config),
        (Some(key), None) => {
            let value = config.get(&key).ok_or_else(|| unknown_key(&key))?;
            println!("{}", value);
        }
        (Some(key), Some(value)) => {
            if config.get(&key).is_none() {
                return Err(unknown_key(&key));
            }
            config.set(&key, &value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }
        (None, Some(_)) => {
            return Err(Error::Config("Must specify a key to set a value".to_string()));
        }
    }

    Ok(())
}

fn unknown_key(key: &str) -> Error {
    Error::Config(format!(
        "Unknown config key: {} (available: {})",
        key,
        Config::available_keys().join(", ")
    ))
}

/// Display all configuration values
fn show_all_config(config: &Config) {
    println!("[store]");
    println!("backend = \"{}\"", config.store.backend);
    println!("url = \"{}\"", config.store.url);
    match &config.store.path {
        Some(path) => println!("path = \"{}\"", path),
        None => println!("# path unset, using the XDG data directory"),
    }
    println!("timeout_secs = {}", config.store.timeout_secs);
    println!();

    println!("[server]");
    println!("host = \"{}\"", config.server.host);
    println!("port = {}", config.server.port);
    println!();

    println!("[display]");
    println!("unit = \"{}\"", config.display.unit);
    println!("palette_kind = \"{}\"", config.display.palette_kind);
    println!("palette = \"{}\"", config.display.palette);
    println!();

    println!("[geocoding]");
    println!("enabled = {}", config.geocoding.enabled);
    println!("url = \"{}\"", config.geocoding.url);
}
