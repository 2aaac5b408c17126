//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/catchment/config.toml

pub mod defaults;

use crate::catchment::{PaletteKind, PaletteName, PaletteSelection};
use crate::error::{Error, Result};
use crate::geo::Unit;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Favorites store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Display preferences
    #[serde(default)]
    pub display: DisplayConfig,

    /// Geocoding settings
    #[serde(default)]
    pub geocoding: GeocodingConfig,
}

/// Favorites store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "file", "http" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// Base URL for the http backend
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Favorites file for the file backend (XDG data dir when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Timeout for one store request, in seconds
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Display preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Unit for radius entry and display
    #[serde(default = "default_unit")]
    pub unit: Unit,

    /// Palette indexing: by school or by year
    #[serde(default = "default_palette_kind")]
    pub palette_kind: PaletteKind,

    /// Palette name
    #[serde(default = "default_palette")]
    pub palette: PaletteName,
}

/// Geocoding settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    /// Resolve addresses when no coordinates are given
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Nominatim base URL
    #[serde(default = "default_nominatim_url")]
    pub url: String,
}

// Default value functions for serde
fn default_store_backend() -> String {
    DEFAULT_STORE_BACKEND.to_string()
}
fn default_store_url() -> String {
    DEFAULT_STORE_URL.to_string()
}
fn default_store_timeout() -> u64 {
    DEFAULT_STORE_TIMEOUT_SECS
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_unit() -> Unit {
    DEFAULT_UNIT.parse().unwrap_or_default()
}
fn default_palette_kind() -> PaletteKind {
    DEFAULT_PALETTE_KIND.parse().unwrap_or(PaletteKind::Schools)
}
fn default_palette() -> PaletteName {
    DEFAULT_PALETTE.parse().unwrap_or(PaletteName::Vibrant)
}
fn default_true() -> bool {
    true
}
fn default_nominatim_url() -> String {
    crate::constants::api::NOMINATIM_URL.to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            url: default_store_url(),
            path: None,
            timeout_secs: default_store_timeout(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            unit: default_unit(),
            palette_kind: default_palette_kind(),
            palette: default_palette(),
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_nominatim_url(),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(&path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["store", "backend"] => Some(self.store.backend.clone()),
            ["store", "url"] => Some(self.store.url.clone()),
            ["store", "path"] => Some(self.store.path.clone().unwrap_or_default()),
            ["store", "timeout_secs"] => Some(self.store.timeout_secs.to_string()),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            ["display", "unit"] => Some(self.display.unit.to_string()),
            ["display", "palette_kind"] => Some(self.display.palette_kind.to_string()),
            ["display", "palette"] => Some(self.display.palette.to_string()),

            ["geocoding", "enabled"] => Some(self.geocoding.enabled.to_string()),
            ["geocoding", "url"] => Some(self.geocoding.url.clone()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["store", "backend"] => {
                if !crate::store::available_backends().contains(&value) {
                    return Err(Error::Config(format!("Unknown store backend: {}", value)));
                }
                self.store.backend = value.to_string();
            }
            ["store", "url"] => {
                self.store.url = value.to_string();
            }
            ["store", "path"] => {
                self.store.path = (!value.is_empty()).then(|| value.to_string());
            }
            ["store", "timeout_secs"] => {
                let secs: u64 = value.parse().map_err(|_| {
                    Error::Config(format!("Invalid timeout value: {}", value))
                })?;
                if secs == 0 {
                    return Err(Error::Config("Timeout must be at least 1 second".to_string()));
                }
                self.store.timeout_secs = secs;
            }

            ["server", "host"] => {
                self.server.host = value.to_string();
            }
            ["server", "port"] => {
                self.server.port = value.parse().map_err(|_| {
                    Error::Config(format!("Invalid port value: {}", value))
                })?;
            }

            ["display", "unit"] => {
                self.display.unit = value.parse().map_err(Error::Config)?;
            }
            ["display", "palette_kind"] => {
                self.display.palette_kind = value.parse().map_err(Error::Config)?;
            }
            ["display", "palette"] => {
                self.display.palette = value.parse().map_err(Error::Config)?;
            }

            ["geocoding", "enabled"] => {
                self.geocoding.enabled = value.parse().map_err(|_| {
                    Error::Config(format!("Invalid boolean value: {}", value))
                })?;
            }
            ["geocoding", "url"] => {
                self.geocoding.url = value.to_string();
            }

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "store.backend",
            "store.url",
            "store.path",
            "store.timeout_secs",
            "server.host",
            "server.port",
            "display.unit",
            "display.palette_kind",
            "display.palette",
            "geocoding.enabled",
            "geocoding.url",
        ]
    }

    /// Selected palette as a color-assigner selection
    pub fn palette_selection(&self) -> PaletteSelection {
        PaletteSelection {
            kind: self.display.palette_kind,
            name: self.display.palette,
        }
    }

    /// Per-request store timeout
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store.timeout_secs.max(1))
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use tempfile::TempDir;

    fn with_temp_config<F: FnOnce()>(f: F) {
        let temp_dir = TempDir::new().unwrap();
        env::set_var("XDG_CONFIG_HOME", temp_dir.path());
        f();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.store.backend, "file");
        assert_eq!(config.store.timeout_secs, 10);
        assert_eq!(config.server.port, 7879);
        assert_eq!(config.display.unit, Unit::Km);
        assert_eq!(config.palette_selection(), PaletteSelection::default());
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        assert_eq!(config.get("store.backend"), Some("file".to_string()));

        config.set("store.backend", "http").unwrap();
        assert_eq!(config.get("store.backend"), Some("http".to_string()));

        config.set("display.unit", "miles").unwrap();
        assert_eq!(config.display.unit, Unit::Miles);
        assert_eq!(config.get("display.unit"), Some("miles".to_string()));

        config.set("display.palette", "ocean").unwrap();
        config.set("display.palette_kind", "years").unwrap();
        assert_eq!(
            config.palette_selection(),
            PaletteSelection {
                kind: PaletteKind::Years,
                name: PaletteName::Ocean
            }
        );

        config.set("store.path", "/tmp/favorites.json").unwrap();
        assert_eq!(config.store.path.as_deref(), Some("/tmp/favorites.json"));
        config.set("store.path", "").unwrap();
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_get_invalid_key() {
        let config = Config::default();
        assert_eq!(config.get("invalid.key"), None);
    }

    #[test]
    fn test_set_invalid_key() {
        let mut config = Config::default();
        let result = config.set("invalid.key", "value");
        assert!(result.is_err());
    }

    #[test]
    fn test_set_invalid_values() {
        let mut config = Config::default();
        assert!(config.set("store.timeout_secs", "soon").is_err());
        assert!(config.set("store.timeout_secs", "0").is_err());
        assert!(config.set("store.backend", "ftp").is_err());
        assert!(config.set("display.unit", "furlongs").is_err());
        assert!(config.set("display.palette", "neon").is_err());
        assert!(config.set("server.port", "99999").is_err());
    }

    #[test]
    fn test_save_and_load() {
        with_temp_config(|| {
            let mut config = Config::default();
            config.store.backend = "http".to_string();
            config.display.unit = Unit::Meters;
            config.save().unwrap();

            let loaded = Config::load().unwrap();
            assert_eq!(loaded.store.backend, "http");
            assert_eq!(loaded.display.unit, Unit::Meters);
        });
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let loaded: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(loaded.store.backend, "file");
        assert_eq!(loaded.display.palette, PaletteName::Vibrant);
        assert_eq!(loaded.server.port, 7879);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let loaded: Config = toml::from_str("[display]\nunit = \"miles\"\n").unwrap();
        assert_eq!(loaded.display.unit, Unit::Miles);
        assert_eq!(loaded.display.palette_kind, PaletteKind::Schools);
        assert_eq!(loaded.store.timeout_secs, 10);
    }

    #[test]
    fn test_serialization_format() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();

        assert!(toml.contains("[store]"));
        assert!(toml.contains("[server]"));
        assert!(toml.contains("[display]"));
        assert!(toml.contains("[geocoding]"));
        assert!(!toml.contains("path"));
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        assert_eq!(config.server_addr(), "127.0.0.1:7879");
    }

    #[test]
    fn test_available_keys() {
        let keys = Config::available_keys();
        assert!(keys.contains(&"store.backend"));
        assert!(keys.contains(&"display.palette"));
        for key in keys {
            assert!(Config::default().get(key).is_some(), "no getter for {}", key);
        }
    }
}
