//! Coverage queries
//!
//! A point is covered by a school when it lies inside any of that school's
//! zones, boundary included. Containment is not exclusive: one point can be
//! covered by several schools at once.

use crate::catchment::{School, SchoolId};
use crate::geo::{distance, Coordinates};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Favorite schools whose catchment contains `point`
///
/// Every zone counts regardless of its visibility. A school appears once no
/// matter how many of its zones match.
pub fn schools_covering(schools: &[School], point: Coordinates) -> BTreeSet<SchoolId> {
    schools
        .iter()
        .filter(|school| school.is_favorite)
        .filter(|school| {
            let meters = distance(point, school.coordinates);
            school.zones.iter().any(|zone| meters <= zone.radius_meters())
        })
        .map(|school| school.id)
        .collect()
}

/// Per-year coverage detail for one school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolCoverage {
    pub school_id: SchoolId,
    pub name: String,
    /// Distance from the point to the school, in meters
    pub distance_meters: f64,
    /// Years whose zone contains the point, ascending
    pub covered_years: Vec<i32>,
    /// Years whose zone does not contain the point, ascending
    pub uncovered_years: Vec<i32>,
}

impl SchoolCoverage {
    pub fn is_covered(&self) -> bool {
        !self.covered_years.is_empty()
    }

    /// Covered in the most recent recorded year
    pub fn covered_latest(&self) -> bool {
        match (self.covered_years.last(), self.uncovered_years.last()) {
            (Some(covered), Some(uncovered)) => covered > uncovered,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

/// Coverage of `point` broken down by year, for every favorite with zones
pub fn coverage_by_year(schools: &[School], point: Coordinates) -> Vec<SchoolCoverage> {
    schools
        .iter()
        .filter(|school| school.is_favorite && !school.zones.is_empty())
        .map(|school| {
            let meters = distance(point, school.coordinates);
            let (covered, uncovered): (Vec<_>, Vec<_>) = school
                .zones
                .iter()
                .partition(|zone| meters <= zone.radius_meters());

            let mut covered_years: Vec<i32> = covered.iter().map(|z| z.year).collect();
            let mut uncovered_years: Vec<i32> = uncovered.iter().map(|z| z.year).collect();
            covered_years.sort_unstable();
            uncovered_years.sort_unstable();

            SchoolCoverage {
                school_id: school.id,
                name: school.name.clone(),
                distance_meters: meters,
                covered_years,
                uncovered_years,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catchment::zones::upsert_zone;
    use crate::catchment::Color;
    use crate::geo::Unit;

    const C: Color = Color::rgb(0, 0, 0);

    fn school_at(lat: f64, lng: f64, zones: &[(i32, f64, Unit)]) -> School {
        let mut school = School::new("S", "", Coordinates::new(lat, lng));
        for &(year, radius, unit) in zones {
            upsert_zone(&mut school, year, radius, unit, C, C).unwrap();
        }
        school
    }

    // ~0.0045 degrees of latitude is ~500 m
    fn north_of(center: Coordinates, meters: f64) -> Coordinates {
        Coordinates::new(center.lat + meters / 111_195.0, center.lng)
    }

    #[test]
    fn test_point_inside_and_outside() {
        let school = school_at(51.5, -0.12, &[(2024, 1.0, Unit::Km)]);
        let schools = vec![school.clone()];

        let near = north_of(school.coordinates, 500.0);
        let far = north_of(school.coordinates, 2000.0);

        assert!(schools_covering(&schools, near).contains(&school.id));
        assert!(!schools_covering(&schools, far).contains(&school.id));
    }

    #[test]
    fn test_school_reported_once() {
        let school = school_at(
            51.5,
            -0.12,
            &[(2022, 1.0, Unit::Km), (2023, 1.0, Unit::Miles), (2024, 900.0, Unit::Meters)],
        );
        let covered = schools_covering(&[school.clone()], north_of(school.coordinates, 100.0));
        assert_eq!(covered.len(), 1);
    }

    #[test]
    fn test_multiple_schools_can_cover() {
        let a = school_at(51.5, -0.12, &[(2024, 2.0, Unit::Km)]);
        let b = school_at(51.505, -0.12, &[(2024, 2.0, Unit::Km)]);
        let c = school_at(52.5, -0.12, &[(2024, 2.0, Unit::Km)]);
        let point = Coordinates::new(51.5025, -0.12);

        let covered = schools_covering(&[a.clone(), b.clone(), c.clone()], point);
        assert_eq!(covered.len(), 2);
        assert!(covered.contains(&a.id));
        assert!(covered.contains(&b.id));
        assert!(!covered.contains(&c.id));
    }

    #[test]
    fn test_hidden_zones_still_count_and_non_favorites_do_not() {
        let mut hidden = school_at(51.5, -0.12, &[(2024, 1.0, Unit::Km)]);
        hidden.zones[0].is_visible = false;

        let mut dropped = school_at(51.5, -0.12, &[(2024, 1.0, Unit::Km)]);
        dropped.is_favorite = false;

        let covered = schools_covering(&[hidden.clone(), dropped.clone()], hidden.coordinates);
        assert!(covered.contains(&hidden.id));
        assert!(!covered.contains(&dropped.id));
    }

    #[test]
    fn test_school_without_zones_covers_nothing() {
        let school = school_at(51.5, -0.12, &[]);
        assert!(schools_covering(&[school.clone()], school.coordinates).is_empty());
        assert!(coverage_by_year(&[school], Coordinates::new(51.5, -0.12)).is_empty());
    }

    #[test]
    fn test_coverage_by_year_keeps_temporal_detail() {
        let school = school_at(
            51.5,
            -0.12,
            &[(2021, 2.0, Unit::Km), (2024, 1.0, Unit::Km), (2022, 1.5, Unit::Km)],
        );
        let point = north_of(school.coordinates, 1200.0);

        let report = coverage_by_year(&[school], point);
        assert_eq!(report.len(), 1);

        let coverage = &report[0];
        assert_eq!(coverage.covered_years, vec![2021, 2022]);
        assert_eq!(coverage.uncovered_years, vec![2024]);
        assert!(coverage.is_covered());
        assert!(!coverage.covered_latest());
        assert!((coverage.distance_meters - 1200.0).abs() < 5.0);
    }
}
