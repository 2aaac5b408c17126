//! catchment: school catchment zone tracker
//!
//! A library and CLI for tracking favorite schools and the admission radius
//! each school reached in past years, then asking which schools' catchments
//! contain a given point.
//!
//! ## Features
//!
//! - Up to six favorite schools, each with one zone per admission year
//! - Derived average radius per school
//! - Haversine distance and inclusive point-in-circle coverage
//! - Palette-driven circle colors with per-zone overrides
//! - Every mutation persisted to a favorites store before it is applied
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use catchment::geo::{Coordinates, Unit};
//! use catchment::store::memory::MemoryStore;
//! use catchment::sync::Engine;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let engine = Engine::new(MemoryStore::new());
//! engine.load().await.unwrap();
//!
//! let school = engine
//!     .add_school("Hillside Primary", "1 Hill Rd", Coordinates::new(51.5, -0.12))
//!     .await
//!     .unwrap();
//! engine
//!     .upsert_zone(school.id, 2024, 1.0, Unit::Km, None)
//!     .await
//!     .unwrap();
//!
//! // ~500 m north of the school
//! let covered = engine.schools_covering(Coordinates::new(51.5045, -0.12)).await;
//! assert!(covered.contains(&school.id));
//! # }
//! ```

pub mod catchment;
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod geo;
pub mod pins;
pub mod prefs;
pub mod registry;
pub mod render;
pub mod server;
pub mod store;
pub mod sync;

// Re-export commonly used types
pub use crate::catchment::{CatchmentZone, Color, School, SchoolId, ZoneId};
pub use config::Config;
pub use error::{Error, Result};
pub use geo::{Coordinates, Unit};
pub use sync::Engine;
