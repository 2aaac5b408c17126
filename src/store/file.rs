//! File-backed favorites store
//!
//! Stores favorite schools as a JSON array in the XDG data directory
//! (~/.local/share/catchment/favorites.json). The whole file is rewritten on
//! every mutation; the list is small by construction.

use crate::catchment::{School, SchoolId};
use crate::config::defaults::APP_DIR_NAME;
use crate::constants::cache::FAVORITES_FILE;
use crate::constants::limits::MAX_FAVORITES;
use crate::error::{Error, Result};
use crate::store::FavoritesStore;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Favorites persisted to a JSON file
#[derive(Debug)]
pub struct FileStore {
    schools: Mutex<Vec<School>>,
    path: PathBuf,
}

impl FileStore {
    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine data directory".to_string()))
    }

    /// Default favorites file path
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join(FAVORITES_FILE))
    }

    /// Load favorites from a specific path
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let schools = if path.exists() {
            let content = fs::read_to_string(&path).map_err(|e| {
                Error::Config(format!("Failed to read favorites file: {}", e))
            })?;

            serde_json::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse favorites file: {}", e))
            })?
        } else {
            Vec::new()
        };

        Ok(Self {
            schools: Mutex::new(schools),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write favorites to disk
    fn save(&self, schools: &[School]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::retryable(format!("Failed to create data directory: {}", e))
            })?;
        }

        let content = serde_json::to_string_pretty(schools)?;

        fs::write(&self.path, content).map_err(|e| {
            Error::retryable(format!("Failed to write favorites file: {}", e))
        })?;

        debug!(path = %self.path.display(), count = schools.len(), "saved favorites");
        Ok(())
    }
}

impl FavoritesStore for FileStore {
    async fn list(&self) -> Result<Vec<School>> {
        Ok(self.schools.lock().await.clone())
    }

    async fn create(&self, school: &School) -> Result<()> {
        let mut schools = self.schools.lock().await;

        if schools.iter().any(|s| s.id == school.id) {
            return Err(Error::rejected(format!("School {} already exists", school.id)));
        }
        if schools.iter().filter(|s| s.is_favorite).count() >= MAX_FAVORITES {
            return Err(Error::Capacity(format!(
                "At most {} favorite schools can be stored",
                MAX_FAVORITES
            )));
        }

        let mut next = schools.clone();
        next.push(school.clone());
        self.save(&next)?;
        *schools = next;
        Ok(())
    }

    async fn update(&self, school: &School) -> Result<()> {
        let mut schools = self.schools.lock().await;

        let idx = schools
            .iter()
            .position(|s| s.id == school.id)
            .ok_or_else(|| Error::NotFound(format!("School not found: {}", school.id)))?;

        let mut next = schools.clone();
        next[idx] = school.clone();
        self.save(&next)?;
        *schools = next;
        Ok(())
    }

    async fn delete(&self, id: SchoolId) -> Result<()> {
        let mut schools = self.schools.lock().await;

        let idx = schools
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| Error::NotFound(format!("School not found: {}", id)))?;

        let mut next = schools.clone();
        next.remove(idx);
        self.save(&next)?;
        *schools = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catchment::zones::upsert_zone;
    use crate::catchment::Color;
    use crate::geo::{Coordinates, Unit};
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("favorites.json");
        let store = FileStore::load_from(path).unwrap();
        (store, temp_dir)
    }

    fn school_with_zone() -> School {
        let mut school = School::new("Hillside", "1 Hill Rd", Coordinates::new(51.5, -0.12));
        let c = Color::rgb(10, 20, 30);
        upsert_zone(&mut school, 2024, 1.2, Unit::Km, c, c).unwrap();
        school
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (store, _temp) = create_test_store();
        assert!(store.list().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("favorites.json");
        let school = school_with_zone();

        {
            let store = FileStore::load_from(path.clone()).unwrap();
            store.create(&school).await.unwrap();
        }

        let store = FileStore::load_from(path).unwrap();
        let schools = store.list().await.unwrap();
        assert_eq!(schools, vec![school]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let (store, _temp) = create_test_store();
        let mut school = school_with_zone();
        store.create(&school).await.unwrap();

        school.zones.clear();
        school.average = None;
        store.update(&school).await.unwrap();
        assert!(store.list().await.unwrap()[0].zones.is_empty());

        store.delete(school.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(store.delete(school.id).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_duplicate_create_rejected() {
        let (store, _temp) = create_test_store();
        let school = school_with_zone();
        store.create(&school).await.unwrap();
        assert!(matches!(
            store.create(&school).await,
            Err(Error::Persistence { .. })
        ));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("favorites.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(FileStore::load_from(path), Err(Error::Config(_))));
    }
}
