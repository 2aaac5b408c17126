//! Great-circle distance
//!
//! Haversine formula on a spherical Earth. Used for containment tests and
//! for two-point measurement mode.

use crate::constants::geo::EARTH_RADIUS_METERS;
use crate::geo::units::{convert, Unit};
use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};

/// Calculate the distance between two points in meters (Haversine formula)
///
/// # Arguments
/// * `p1` - First point
/// * `p2` - Second point
///
/// # Returns
/// Distance in meters
pub fn distance(p1: Coordinates, p2: Coordinates) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let delta_lat = (p2.lat - p1.lat).to_radians();
    let delta_lng = (p2.lng - p1.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Check if a point is within a circle (boundary inclusive)
pub fn is_within(point: Coordinates, center: Coordinates, radius_meters: f64) -> bool {
    distance(point, center) <= radius_meters
}

/// Result of a two-point measurement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub from: Coordinates,
    pub to: Coordinates,
    pub meters: f64,
}

impl Measurement {
    pub fn between(from: Coordinates, to: Coordinates) -> Self {
        Self {
            from,
            to,
            meters: distance(from, to),
        }
    }

    /// Distance expressed in the given unit
    pub fn in_unit(&self, unit: Unit) -> f64 {
        convert(self.meters, Unit::Meters, unit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = Coordinates::new(51.5074, -0.1278);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Coordinates::new(51.5074, -0.1278);
        let b = Coordinates::new(48.8566, 2.3522);
        assert_abs_diff_eq!(distance(a, b), distance(b, a), epsilon = 1e-9);
    }

    #[test]
    fn test_london_fixture() {
        let a = Coordinates::new(51.5074, -0.1278);
        let b = Coordinates::new(51.5007, -0.1246);
        // Haversine on R = 6371 km gives ~777.2 m for this pair
        let d = distance(a, b);
        assert!((770.0..=800.0).contains(&d), "distance was {}", d);
        assert_abs_diff_eq!(d, 777.23, epsilon = 0.5);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        let a = Coordinates::new(40.7128, -74.0060);
        let b = Coordinates::new(41.7128, -74.0060);
        assert!((distance(a, b) - 111_195.0).abs() < 100.0);
    }

    #[test]
    fn test_is_within_boundary_inclusive() {
        let center = Coordinates::new(51.5, -0.12);
        let point = Coordinates::new(51.5045, -0.12);
        let d = distance(point, center);

        assert!(is_within(point, center, d));
        assert!(!is_within(point, center, d - 0.001));
        assert!(is_within(center, center, 0.0));
    }

    #[test]
    fn test_measurement_units() {
        let m = Measurement::between(
            Coordinates::new(51.5074, -0.1278),
            Coordinates::new(51.5007, -0.1246),
        );
        assert_abs_diff_eq!(m.in_unit(Unit::Km), m.meters / 1000.0, epsilon = 1e-12);
        assert!(m.in_unit(Unit::Miles) < m.in_unit(Unit::Km));
    }
}
