//! Geographic primitives and geocoding
//!
//! This module handles:
//! - Coordinates and their validation
//! - Radius unit conversion
//! - Great-circle distance
//! - Address geocoding (Nominatim)

pub mod distance;
pub mod nominatim;
pub mod units;

use crate::config::GeocodingConfig;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub use distance::{distance, is_within, Measurement};
pub use units::{convert, Radius, Unit};

/// A geographic coordinate (latitude, longitude)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Create new coordinates
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validate that coordinates are within valid ranges
    ///
    /// Latitude: -90 to 90
    /// Longitude: -180 to 180
    pub fn validate(&self) -> Result<()> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(Error::Validation(format!(
                "Latitude {} is out of range [-90, 90]",
                self.lat
            )));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(Error::Validation(format!(
                "Longitude {} is out of range [-180, 180]",
                self.lng
            )));
        }
        Ok(())
    }

    /// Build validated coordinates
    pub fn checked(lat: f64, lng: f64) -> Result<Self> {
        let coords = Self::new(lat, lng);
        coords.validate()?;
        Ok(coords)
    }
}

impl std::fmt::Display for Coordinates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// A geocoded location result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
    /// Display name (address or description)
    pub display_name: String,
}

impl GeoLocation {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// Trait for geocoding backends
pub trait Geocoder: Send + Sync {
    /// Search an address string
    ///
    /// Returns the best match for the query, or None if not found
    fn search(
        &self,
        query: &str,
    ) -> impl std::future::Future<Output = Result<Option<GeoLocation>>> + Send;
}

/// Geocoder described by configuration, or None when geocoding is disabled
pub fn get_geocoder(config: &GeocodingConfig) -> Result<Option<nominatim::NominatimGeocoder>> {
    if !config.enabled {
        return Ok(None);
    }
    let geocoder = if config.url.trim().is_empty() {
        nominatim::NominatimGeocoder::new()?
    } else {
        nominatim::NominatimGeocoder::with_base_url(config.url.clone())?
    };
    Ok(Some(geocoder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ranges() {
        assert!(Coordinates::new(51.5, -0.12).validate().is_ok());
        assert!(Coordinates::new(90.0, 180.0).validate().is_ok());
        assert!(Coordinates::new(-90.0, -180.0).validate().is_ok());

        assert!(matches!(
            Coordinates::new(90.1, 0.0).validate(),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            Coordinates::new(0.0, -180.5).validate(),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_geocoder_follows_config() {
        let mut config = GeocodingConfig::default();
        assert!(get_geocoder(&config).unwrap().is_some());

        config.enabled = false;
        assert!(get_geocoder(&config).unwrap().is_none());
    }

    #[test]
    fn test_nan_is_rejected() {
        assert!(Coordinates::checked(f64::NAN, 0.0).is_err());
        assert!(Coordinates::checked(0.0, f64::NAN).is_err());
    }

    #[test]
    fn test_geo_location_serialization() {
        let loc = GeoLocation {
            lat: 51.5074,
            lng: -0.1278,
            display_name: "London".to_string(),
        };

        let json = serde_json::to_string(&loc).unwrap();
        let parsed: GeoLocation = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.coordinates(), Coordinates::new(51.5074, -0.1278));
        assert_eq!(parsed.display_name, "London");
    }
}
