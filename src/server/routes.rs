//! HTTP API routes
//!
//! Defines all REST API endpoints for the server.

use crate::catchment::query::{coverage_by_year, SchoolCoverage};
use crate::catchment::{zones, School, SchoolId};
use crate::error::Error;
use crate::geo::{Coordinates, Measurement, Unit};
use crate::server::state::AppState;
use crate::store::FavoritesStore;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/status", get(status_handler))
        .route(
            "/api/favorites",
            get(list_handler).post(create_handler),
        )
        .route(
            "/api/favorites/:id",
            put(update_handler).delete(delete_handler),
        )
        .route("/api/coverage", get(coverage_handler))
        .route("/api/distance", get(distance_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip)]
    status: Option<StatusCode>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Error::Capacity(_) => (StatusCode::CONFLICT, "CAPACITY_ERROR"),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            // Clients retry 5xx, so only transient failures get one
            Error::Persistence {
                retryable: true, ..
            } => (StatusCode::SERVICE_UNAVAILABLE, "PERSISTENCE_ERROR"),
            Error::Persistence { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "PERSISTENCE_ERROR"),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };
        ApiError {
            error: err.to_string(),
            code: code.to_string(),
            status: Some(status),
        }
    }
}

/// Reject malformed school payloads before they reach the store
fn validate_school(school: &School) -> Result<(), ApiError> {
    if school.name.trim().is_empty() {
        return Err(Error::Validation("School name is required".to_string()).into());
    }
    school.coordinates.validate()?;
    for zone in &school.zones {
        zones::validate_zone(zone.year, zone.radius)?;
    }
    if let Some(year) = school.duplicate_years().first() {
        return Err(Error::Validation(format!("More than one zone for year {}", year)).into());
    }
    if !school.is_favorite {
        return Err(Error::Validation("Only favorite schools are stored".to_string()).into());
    }
    Ok(())
}

/// Status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Server is running
    pub running: bool,
    /// Server version
    pub version: String,
    /// Backing store
    pub backend: String,
    /// Backend named in the configuration, which may differ from `backend`
    #[serde(default)]
    pub configured_backend: String,
    /// Number of stored favorites
    pub favorites: usize,
    /// Uptime in seconds
    pub uptime_secs: u64,
}

/// Server status endpoint
///
/// GET /api/status
async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let favorites = state.store.list().await?.len();
    let configured_backend = state.config.read().await.store.backend.clone();

    Ok(Json(StatusResponse {
        running: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend_name().to_string(),
        configured_backend,
        favorites,
        uptime_secs: state.uptime_secs(),
    }))
}

/// List favorites
///
/// GET /api/favorites
async fn list_handler(State(state): State<Arc<AppState>>) -> Result<Json<Vec<School>>, ApiError> {
    Ok(Json(state.store.list().await?))
}

/// Store a new favorite
///
/// POST /api/favorites
async fn create_handler(
    State(state): State<Arc<AppState>>,
    Json(school): Json<School>,
) -> Result<(StatusCode, Json<School>), ApiError> {
    validate_school(&school)?;
    state.store.create(&school).await?;
    info!(school = %school.id, name = %school.name, "favorite created");
    Ok((StatusCode::CREATED, Json(school)))
}

/// Overwrite a stored favorite
///
/// PUT /api/favorites/:id
async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SchoolId>,
    Json(school): Json<School>,
) -> Result<Json<School>, ApiError> {
    if school.id != id {
        return Err(Error::Validation(format!(
            "Body id {} does not match path id {}",
            school.id, id
        ))
        .into());
    }
    validate_school(&school)?;
    state.store.update(&school).await?;
    Ok(Json(school))
}

/// Remove a favorite
///
/// DELETE /api/favorites/:id
async fn delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<SchoolId>,
) -> Result<StatusCode, ApiError> {
    state.store.delete(id).await?;
    info!(school = %id, "favorite deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Point query parameters
#[derive(Debug, Deserialize)]
pub struct PointQuery {
    pub lat: f64,
    pub lng: f64,
}

/// Coverage response
#[derive(Debug, Serialize, Deserialize)]
pub struct CoverageResponse {
    pub point: Coordinates,
    /// Schools with at least one zone containing the point
    pub covered: Vec<SchoolId>,
    /// Per-year detail for every favorite
    pub schools: Vec<SchoolCoverage>,
}

/// Which favorites cover a point
///
/// GET /api/coverage?lat=..&lng=..
async fn coverage_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PointQuery>,
) -> Result<Json<CoverageResponse>, ApiError> {
    let point = Coordinates::checked(query.lat, query.lng)?;
    let stored = state.store.list().await?;

    let schools = coverage_by_year(&stored, point);
    let covered = schools
        .iter()
        .filter(|s| s.is_covered())
        .map(|s| s.school_id)
        .collect();

    Ok(Json(CoverageResponse {
        point,
        covered,
        schools,
    }))
}

/// Distance query parameters
#[derive(Debug, Deserialize)]
pub struct DistanceQuery {
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
}

/// Distance response
#[derive(Debug, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub from: Coordinates,
    pub to: Coordinates,
    pub meters: f64,
    pub km: f64,
    pub miles: f64,
}

/// Great-circle distance between two points
///
/// GET /api/distance?from_lat=..&from_lng=..&to_lat=..&to_lng=..
async fn distance_handler(
    Query(query): Query<DistanceQuery>,
) -> Result<Json<DistanceResponse>, ApiError> {
    let from = Coordinates::checked(query.from_lat, query.from_lng)?;
    let to = Coordinates::checked(query.to_lat, query.to_lng)?;
    let measurement = Measurement::between(from, to);

    Ok(Json(DistanceResponse {
        from,
        to,
        meters: measurement.meters,
        km: measurement.in_unit(Unit::Km),
        miles: measurement.in_unit(Unit::Miles),
    }))
}
