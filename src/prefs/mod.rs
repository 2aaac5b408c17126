//! Locally cached auxiliary data
//!
//! Pins and zone-form preferences live in a small JSON cache
//! (~/.cache/catchment/local_cache.json). It is not authoritative: if the
//! file cannot be parsed it is discarded and defaults are used.

use crate::config::defaults::APP_DIR_NAME;
use crate::constants::cache::LOCAL_CACHE_FILE;
use crate::error::{Error, Result};
use crate::geo::{Radius, Unit};
use crate::pins::PinInfo;
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Last values entered in the add-zone form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneForm {
    pub year: i32,
    pub radius: f64,
    pub unit: Unit,
}

impl Default for ZoneForm {
    fn default() -> Self {
        Self {
            year: Utc::now().year(),
            radius: 1.0,
            unit: Unit::Km,
        }
    }
}

impl ZoneForm {
    /// Change the display unit, re-expressing the current radius
    pub fn switch_unit(&mut self, unit: Unit) {
        let radius = Radius::new(self.radius, self.unit).to(unit);
        self.radius = radius.value;
        self.unit = unit;
    }
}

/// Everything kept in the local cache
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalCache {
    #[serde(default)]
    pub pins: Vec<PinInfo>,
    #[serde(default)]
    pub form: ZoneForm,
}

impl LocalCache {
    /// Default cache file path
    pub fn default_path() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|p| p.join(APP_DIR_NAME).join(LOCAL_CACHE_FILE))
            .ok_or_else(|| Error::Config("Could not determine cache directory".to_string()))
    }

    /// Load the cache, falling back to defaults
    ///
    /// A missing file yields defaults. An unreadable or corrupt file is
    /// deleted and defaults are returned; no partial repair is attempted.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|content| serde_json::from_str::<Self>(&content).map_err(Error::from));

        match parsed {
            Ok(cache) => cache,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "discarding corrupt local cache");
                if let Err(e) = fs::remove_file(path) {
                    warn!(path = %path.display(), error = %e, "failed to remove local cache");
                }
                Self::default()
            }
        }
    }

    /// Write the cache to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
