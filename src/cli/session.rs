//! Engine session shared by the data commands
//!
//! Opens the configured store, restores cached pins, loads favorites, and
//! writes pins and form values back to the local cache when done.

use crate::catchment::{CatchmentZone, School};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::pins::PinInfo;
use crate::prefs::LocalCache;
use crate::store::{self, AnyStore};
use crate::sync::Engine;
use std::path::PathBuf;
use uuid::Uuid;

/// A loaded engine plus the local cache it came from
pub struct Session {
    pub config: Config,
    pub engine: Engine<AnyStore>,
    pub cache: LocalCache,
    cache_path: PathBuf,
}

impl Session {
    pub async fn open() -> Result<Self> {
        let config = Config::load()?;
        let store = store::open(&config)?;
        let cache_path = LocalCache::default_path()?;
        let cache = LocalCache::load_from(&cache_path);

        let engine = Engine::new(store)
            .with_timeout(config.store_timeout())
            .with_palette(config.palette_selection())
            .with_pins(cache.pins.clone());
        engine.load().await?;

        Ok(Self {
            config,
            engine,
            cache,
            cache_path,
        })
    }

    /// Write pins and form values back to the local cache
    pub async fn save(&mut self) -> Result<()> {
        self.cache.pins = self.engine.pins().await;
        self.cache.save_to(&self.cache_path)
    }

    /// Find a school by id prefix or case-insensitive name
    pub async fn resolve_school(&self, query: &str) -> Result<School> {
        let schools = self.engine.schools().await;
        let mut matches: Vec<School> = schools
            .into_iter()
            .filter(|s| id_matches(s.id, query) || s.name.eq_ignore_ascii_case(query.trim()))
            .collect();

        match matches.len() {
            0 => Err(Error::NotFound(format!("No favorite school matches '{}'", query))),
            1 => Ok(matches.remove(0)),
            n => Err(Error::Validation(format!(
                "'{}' matches {} schools, use a longer id prefix",
                query, n
            ))),
        }
    }

    /// Find a zone by id prefix
    pub async fn resolve_zone(&self, query: &str) -> Result<(School, CatchmentZone)> {
        let mut matches: Vec<(School, CatchmentZone)> = Vec::new();
        for school in self.engine.schools().await {
            for zone in &school.zones {
                if id_matches(zone.id, query) {
                    matches.push((school.clone(), zone.clone()));
                }
            }
        }

        match matches.len() {
            0 => Err(Error::NotFound(format!("No zone matches '{}'", query))),
            1 => Ok(matches.remove(0)),
            n => Err(Error::Validation(format!(
                "'{}' matches {} zones, use a longer id prefix",
                query, n
            ))),
        }
    }

    /// Find a pin by id prefix
    pub async fn resolve_pin(&self, query: &str) -> Result<PinInfo> {
        let mut matches: Vec<PinInfo> = self
            .engine
            .pins()
            .await
            .into_iter()
            .filter(|p| id_matches(p.id, query))
            .collect();

        match matches.len() {
            0 => Err(Error::NotFound(format!("No pin matches '{}'", query))),
            1 => Ok(matches.remove(0)),
            n => Err(Error::Validation(format!(
                "'{}' matches {} pins, use a longer id prefix",
                query, n
            ))),
        }
    }
}

/// Whether `query` is a non-empty prefix of `id`
pub fn id_matches(id: Uuid, query: &str) -> bool {
    let query = query.trim().to_ascii_lowercase();
    !query.is_empty() && id.to_string().starts_with(&query)
}

/// First eight characters of an id, for listings
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_matches_prefix() {
        let id = Uuid::parse_str("3f2a9c1e-0000-4000-8000-000000000000").unwrap();
        assert!(id_matches(id, "3f2a"));
        assert!(id_matches(id, "3F2A9C1E"));
        assert!(!id_matches(id, ""));
        assert!(!id_matches(id, "3f2b"));
        assert_eq!(short_id(id), "3f2a9c1e");
    }
}
