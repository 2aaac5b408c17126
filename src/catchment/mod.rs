//! Catchment data model and algorithms
//!
//! This module handles:
//! - Schools with their year-keyed catchment zones
//! - Zone upsert/remove with the one-zone-per-year invariant
//! - Average catchment radius
//! - Deterministic color assignment
//! - Coverage queries ("which schools cover this point")

pub mod average;
pub mod color;
pub mod query;
pub mod zones;

use crate::constants::limits::AVERAGE_YEAR;
use crate::geo::{Coordinates, Radius, Unit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use color::{Color, ColorAssigner, PaletteKind, PaletteName, PaletteSelection};

/// Identity of a school
pub type SchoolId = Uuid;

/// Identity of a catchment zone
pub type ZoneId = Uuid;

/// A year-stamped admission radius around a school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatchmentZone {
    pub id: ZoneId,
    pub year: i32,
    pub radius: f64,
    pub unit: Unit,
    pub color: Color,
    /// Color was picked by the user and survives palette changes
    #[serde(default)]
    pub custom_color: bool,
    #[serde(default = "visible")]
    pub is_visible: bool,
}

impl CatchmentZone {
    pub fn new(year: i32, radius: f64, unit: Unit, color: Color) -> Self {
        Self {
            id: Uuid::new_v4(),
            year,
            radius,
            unit,
            color,
            custom_color: false,
            is_visible: true,
        }
    }

    pub fn radius(&self) -> Radius {
        Radius::new(self.radius, self.unit)
    }

    pub fn radius_meters(&self) -> f64 {
        self.radius().meters()
    }
}

/// Mean radius across a school's zones, always in kilometers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageCatchment {
    pub radius: f64,
    pub color: Color,
    #[serde(default = "visible")]
    pub is_visible: bool,
}

fn visible() -> bool {
    true
}

/// A tracked school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    pub coordinates: Coordinates,

    /// Zones, kept sorted by year
    #[serde(default)]
    pub zones: Vec<CatchmentZone>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average: Option<AverageCatchment>,

    /// School-specific palette, indexed by year
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub palette: Option<PaletteName>,

    #[serde(default = "visible")]
    pub is_favorite: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl School {
    /// Create a new favorite school with a fresh identity and no zones
    pub fn new(name: impl Into<String>, address: impl Into<String>, coordinates: Coordinates) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            address: address.into(),
            coordinates,
            zones: Vec::new(),
            average: None,
            palette: None,
            is_favorite: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Zone recorded for a given year
    pub fn zone_for_year(&self, year: i32) -> Option<&CatchmentZone> {
        self.zones.iter().find(|z| z.year == year)
    }

    pub fn zone(&self, id: ZoneId) -> Option<&CatchmentZone> {
        self.zones.iter().find(|z| z.id == id)
    }

    pub fn zone_mut(&mut self, id: ZoneId) -> Option<&mut CatchmentZone> {
        self.zones.iter_mut().find(|z| z.id == id)
    }

    pub fn zone_for_year_mut(&mut self, year: i32) -> Option<&mut CatchmentZone> {
        self.zones.iter_mut().find(|z| z.year == year)
    }

    /// Years recorded more than once, ascending
    pub fn duplicate_years(&self) -> Vec<i32> {
        let mut years = self.years();
        years.sort_unstable();
        let mut duplicates: Vec<i32> = years
            .windows(2)
            .filter(|w| w[0] == w[1])
            .map(|w| w[0])
            .collect();
        duplicates.dedup();
        duplicates
    }

    /// Keep one zone per year, the last one listed wins
    ///
    /// Returns the number of zones dropped. Zones end up sorted by year.
    pub fn dedupe_years(&mut self) -> usize {
        let before = self.zones.len();
        let mut kept: Vec<CatchmentZone> = Vec::with_capacity(before);
        for zone in self.zones.drain(..).rev() {
            if !kept.iter().any(|z| z.year == zone.year) {
                kept.push(zone);
            }
        }
        kept.sort_by_key(|z| z.year);
        self.zones = kept;
        before - self.zones.len()
    }

    /// Years with a recorded zone, ascending
    pub fn years(&self) -> Vec<i32> {
        self.zones.iter().map(|z| z.year).collect()
    }

    /// Map-facing projection of every zone plus the average
    pub fn circles(&self) -> Vec<RadiusCircle> {
        let mut circles: Vec<RadiusCircle> = self
            .zones
            .iter()
            .map(|zone| RadiusCircle {
                school_id: self.id,
                year: zone.year,
                center: self.coordinates,
                radius: zone.radius,
                unit: zone.unit,
                color: zone.color,
                is_visible: zone.is_visible,
            })
            .collect();

        if let Some(average) = &self.average {
            circles.push(RadiusCircle {
                school_id: self.id,
                year: AVERAGE_YEAR,
                center: self.coordinates,
                radius: average.radius,
                unit: Unit::Km,
                color: average.color,
                is_visible: average.is_visible,
            });
        }

        circles
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Render-side key of a circle; year 0 is the average circle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CircleKey {
    pub school_id: SchoolId,
    pub year: i32,
}

impl CircleKey {
    pub fn is_average(&self) -> bool {
        self.year == AVERAGE_YEAR
    }
}

/// Geometry handed to the map surface for one zone or average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiusCircle {
    pub school_id: SchoolId,
    pub year: i32,
    pub center: Coordinates,
    pub radius: f64,
    pub unit: Unit,
    pub color: Color,
    pub is_visible: bool,
}

impl RadiusCircle {
    pub fn key(&self) -> CircleKey {
        CircleKey {
            school_id: self.school_id,
            year: self.year,
        }
    }

    pub fn radius_meters(&self) -> f64 {
        Radius::new(self.radius, self.unit).meters()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn school_with_zones() -> School {
        let mut school = School::new("Hillside", "1 Hill Rd", Coordinates::new(51.5, -0.12));
        school.zones.push(CatchmentZone::new(2023, 1.2, Unit::Km, Color::rgb(255, 0, 0)));
        school.zones.push(CatchmentZone::new(2024, 0.8, Unit::Miles, Color::rgb(0, 255, 0)));
        school.average = Some(AverageCatchment {
            radius: 1.2,
            color: Color::rgb(0, 0, 255),
            is_visible: false,
        });
        school
    }

    #[test]
    fn test_new_school_is_favorite_without_zones() {
        let school = School::new("Hillside", "", Coordinates::new(51.5, -0.12));
        assert!(school.is_favorite);
        assert!(school.zones.is_empty());
        assert!(school.average.is_none());
        assert!(school.circles().is_empty());
    }

    #[test]
    fn test_circles_project_zones_and_average() {
        let school = school_with_zones();
        let circles = school.circles();

        assert_eq!(circles.len(), 3);
        assert!(circles.iter().all(|c| c.center == school.coordinates));
        assert!(circles.iter().all(|c| c.school_id == school.id));

        let average = circles.iter().find(|c| c.key().is_average()).unwrap();
        assert_eq!(average.unit, Unit::Km);
        assert!(!average.is_visible);

        let miles = circles.iter().find(|c| c.year == 2024).unwrap();
        assert!((miles.radius_meters() - 0.8 * 1609.34).abs() < 1e-9);
    }

    #[test]
    fn test_school_serialization() {
        let school = school_with_zones();
        let json = serde_json::to_string(&school).unwrap();
        let parsed: School = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, school);
    }

    #[test]
    fn test_dedupe_years_keeps_last() {
        let mut school = school_with_zones();
        school.zones.push(CatchmentZone::new(2023, 3.0, Unit::Km, Color::rgb(1, 1, 1)));
        assert_eq!(school.duplicate_years(), vec![2023]);

        assert_eq!(school.dedupe_years(), 1);
        assert_eq!(school.years(), vec![2023, 2024]);
        assert!((school.zone_for_year(2023).unwrap().radius - 3.0).abs() < 1e-9);
        assert!(school.duplicate_years().is_empty());
    }

    #[test]
    fn test_color_state_defaults_when_missing() {
        let mut json = serde_json::to_value(school_with_zones()).unwrap();
        json["zones"][0].as_object_mut().unwrap().remove("custom_color");
        let parsed: School = serde_json::from_value(json).unwrap();
        assert!(!parsed.zones[0].custom_color);
        assert!(parsed.palette.is_none());
    }

    #[test]
    fn test_school_without_average_omits_field() {
        let school = School::new("Hillside", "", Coordinates::new(51.5, -0.12));
        let json = serde_json::to_value(&school).unwrap();
        assert!(json.get("average").is_none());
    }
}
