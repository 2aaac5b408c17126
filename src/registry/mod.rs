//! Favorite school registry
//!
//! Owns the bounded, ordered set of favorite schools together with their
//! zones and averages. The order is the favorites order used by the
//! schools-indexed palette.

use crate::catchment::{RadiusCircle, School, SchoolId, ZoneId};
use crate::constants::limits::MAX_FAVORITES;
use crate::error::{Error, Result};
use crate::geo::Coordinates;
use tracing::warn;

/// In-memory set of favorite schools
#[derive(Debug, Clone, Default)]
pub struct SchoolRegistry {
    schools: Vec<School>,
}

impl SchoolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole registry, keeping at most `MAX_FAVORITES` favorites
    pub fn seed(&mut self, schools: Vec<School>) {
        let total = schools.len();
        self.schools = schools
            .into_iter()
            .filter(|s| s.is_favorite)
            .take(MAX_FAVORITES)
            .collect();

        if self.schools.len() < total {
            warn!(
                kept = self.schools.len(),
                received = total,
                "dropped schools beyond the favorites limit or not marked favorite"
            );
        }
    }

    /// Build a new favorite without committing it
    ///
    /// Fails with `Capacity` when the registry is full and with `Validation`
    /// for an empty name or out-of-range coordinates.
    pub fn add_favorite(
        &self,
        name: &str,
        address: &str,
        coordinates: Coordinates,
    ) -> Result<School> {
        if self.is_full() {
            return Err(Error::Capacity(format!(
                "At most {} favorite schools can be tracked",
                MAX_FAVORITES
            )));
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("School name is required".to_string()));
        }
        coordinates.validate()?;

        Ok(School::new(name, address.trim(), coordinates))
    }

    /// Commit a school built by `add_favorite`
    pub fn insert(&mut self, school: School) -> Result<()> {
        if self.contains(school.id) {
            return Err(Error::Validation(format!("School {} already exists", school.id)));
        }
        if self.is_full() {
            return Err(Error::Capacity(format!(
                "At most {} favorite schools can be tracked",
                MAX_FAVORITES
            )));
        }
        self.schools.push(school);
        Ok(())
    }

    /// Remove a school and everything it owns
    pub fn remove_favorite(&mut self, id: SchoolId) -> Result<School> {
        let idx = self.position(id)?;
        Ok(self.schools.remove(idx))
    }

    /// Swap in a new version of an existing school
    pub fn replace(&mut self, school: School) -> Result<()> {
        let idx = self.position(school.id)?;
        self.schools[idx] = school;
        Ok(())
    }

    /// Move a school and return its re-centered circles
    ///
    /// This is the only place a school's coordinates change.
    pub fn relocate(&mut self, id: SchoolId, coordinates: Coordinates) -> Result<Vec<RadiusCircle>> {
        coordinates.validate()?;
        let idx = self.position(id)?;
        let school = &mut self.schools[idx];
        school.coordinates = coordinates;
        school.touch();
        Ok(school.circles())
    }

    pub fn get(&self, id: SchoolId) -> Option<&School> {
        self.schools.iter().find(|s| s.id == id)
    }

    /// Look up a school or fail with `NotFound`
    pub fn require(&self, id: SchoolId) -> Result<&School> {
        self.get(id)
            .ok_or_else(|| Error::NotFound(format!("School not found: {}", id)))
    }

    /// Position among favorites
    pub fn index_of(&self, id: SchoolId) -> Option<usize> {
        self.schools.iter().position(|s| s.id == id)
    }

    /// School owning a zone
    pub fn find_zone_owner(&self, zone_id: ZoneId) -> Option<&School> {
        self.schools.iter().find(|s| s.zone(zone_id).is_some())
    }

    pub fn contains(&self, id: SchoolId) -> bool {
        self.get(id).is_some()
    }

    pub fn list(&self) -> &[School] {
        &self.schools
    }

    pub fn len(&self) -> usize {
        self.schools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schools.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.schools.len() >= MAX_FAVORITES
    }

    /// Every circle of every school
    pub fn circles(&self) -> Vec<RadiusCircle> {
        self.schools.iter().flat_map(School::circles).collect()
    }

    pub fn circles_for(&self, id: SchoolId) -> Result<Vec<RadiusCircle>> {
        Ok(self.require(id)?.circles())
    }

    fn position(&self, id: SchoolId) -> Result<usize> {
        self.index_of(id)
            .ok_or_else(|| Error::NotFound(format!("School not found: {}", id)))
    }
}
