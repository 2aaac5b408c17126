//! Centralized constants for the catchment crate
//!
//! This module consolidates constants that are used across multiple modules
//! to avoid duplication and ensure consistency.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in meters (spherical approximation)
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    /// Meters in one kilometer
    pub const METERS_PER_KM: f64 = 1000.0;

    /// Meters in one statute mile
    pub const METERS_PER_MILE: f64 = 1609.34;
}

/// Favorites and catchment limits
pub mod limits {
    /// Maximum number of favorite schools a user can hold
    pub const MAX_FAVORITES: usize = 6;

    /// Year used as the zero point for year-indexed palettes
    pub const PALETTE_BASE_YEAR: i32 = 2020;

    /// Sentinel year identifying the average circle of a school
    pub const AVERAGE_YEAR: i32 = 0;
}

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// Path of the favorites collection on the HTTP store
    pub const FAVORITES_PATH: &str = "/api/favorites";
}

/// Local cache settings
pub mod cache {
    /// Pin and form preference cache file name
    pub const LOCAL_CACHE_FILE: &str = "local_cache.json";

    /// Favorites file used by the file store
    pub const FAVORITES_FILE: &str = "favorites.json";
}
