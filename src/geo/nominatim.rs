//! Nominatim geocoder (OpenStreetMap)
//!
//! Uses the free Nominatim API to turn a school address into coordinates.
//! Rate limit: 1 request per second (enforced by User-Agent requirement)

use crate::constants::api::NOMINATIM_URL;
use crate::error::{Error, Result};
use crate::geo::{GeoLocation, Geocoder};
use serde::Deserialize;
use tracing::debug;

const USER_AGENT: &str = concat!("catchment/", env!("CARGO_PKG_VERSION"));

/// Nominatim geocoding backend
#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
}

/// Nominatim search response item
#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
    display_name: String,
}

impl NominatimGeocoder {
    /// Create a geocoder against the public Nominatim instance
    pub fn new() -> Result<Self> {
        Self::with_base_url(NOMINATIM_URL)
    }

    /// Create a geocoder against a self-hosted Nominatim
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Parse lat/lng strings to f64
    fn parse_coords(lat: &str, lng: &str) -> Result<(f64, f64)> {
        let lat: f64 = lat
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid latitude: {}", lat)))?;
        let lng: f64 = lng
            .parse()
            .map_err(|_| Error::Geocoding(format!("Invalid longitude: {}", lng)))?;
        Ok((lat, lng))
    }

    fn search_url(&self, query: &str) -> String {
        format!(
            "{}/search?q={}&format=json&limit=1",
            self.base_url,
            urlencoding::encode(query)
        )
    }
}

impl Geocoder for NominatimGeocoder {
    async fn search(&self, query: &str) -> Result<Option<GeoLocation>> {
        let url = self.search_url(query);
        debug!(%url, "geocoding address");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Geocoding(format!("Nominatim request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::Geocoding(format!(
                "Nominatim returned status: {}",
                response.status()
            )));
        }

        let results: Vec<NominatimResult> = response.json().await.map_err(|e| {
            Error::Geocoding(format!("Failed to parse Nominatim response: {}", e))
        })?;

        match results.into_iter().next() {
            Some(result) => {
                let (lat, lng) = Self::parse_coords(&result.lat, &result.lon)?;
                Ok(Some(GeoLocation {
                    lat,
                    lng,
                    display_name: result.display_name,
                }))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coords() {
        let (lat, lng) = NominatimGeocoder::parse_coords("51.5074", "-0.1278").unwrap();
        assert!((lat - 51.5074).abs() < 0.0001);
        assert!((lng - (-0.1278)).abs() < 0.0001);
    }

    #[test]
    fn test_parse_coords_invalid() {
        assert!(NominatimGeocoder::parse_coords("invalid", "0").is_err());
        assert!(NominatimGeocoder::parse_coords("0", "invalid").is_err());
    }

    #[test]
    fn test_search_url_is_encoded() {
        let geocoder = NominatimGeocoder::with_base_url("http://localhost:8080/").unwrap();
        let url = geocoder.search_url("10 Downing St, London");
        assert_eq!(
            url,
            "http://localhost:8080/search?q=10%20Downing%20St%2C%20London&format=json&limit=1"
        );
    }
}
