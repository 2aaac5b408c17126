//! Zone operations on a single school
//!
//! These mutate a `School` value in place. Callers that persist changes work
//! on a clone and only swap it in once the remote store has accepted it.

use crate::catchment::{average, CatchmentZone, Color, School, ZoneId};
use crate::constants::limits::AVERAGE_YEAR;
use crate::error::{Error, Result};
use crate::geo::Unit;

/// What an upsert did to the zone set
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneChange {
    /// A zone was added for a year that had none
    Inserted(ZoneId),
    /// The year already had a zone; it was overwritten in place
    Replaced { id: ZoneId, previous: CatchmentZone },
}

impl ZoneChange {
    pub fn zone_id(&self) -> ZoneId {
        match self {
            Self::Inserted(id) | Self::Replaced { id, .. } => *id,
        }
    }
}

/// Validate a zone's year and radius
pub fn validate_zone(year: i32, radius: f64) -> Result<()> {
    if year == AVERAGE_YEAR || year < 0 {
        return Err(Error::Validation(format!("Invalid zone year: {}", year)));
    }
    if !radius.is_finite() || radius <= 0.0 {
        return Err(Error::Validation(format!(
            "Radius must be a positive number, got {}",
            radius
        )));
    }
    Ok(())
}

/// Add a zone for `year`, replacing any zone already recorded for that year
///
/// A replaced zone keeps its id and visibility. The average is recomputed
/// afterward; `average_color` is only used if the school had no average yet.
pub fn upsert_zone(
    school: &mut School,
    year: i32,
    radius: f64,
    unit: Unit,
    color: Color,
    average_color: Color,
) -> Result<ZoneChange> {
    validate_zone(year, radius)?;

    let change = match school.zones.iter_mut().find(|z| z.year == year) {
        Some(existing) => {
            let previous = existing.clone();
            existing.radius = radius;
            existing.unit = unit;
            existing.color = color;
            ZoneChange::Replaced {
                id: existing.id,
                previous,
            }
        }
        None => {
            let zone = CatchmentZone::new(year, radius, unit, color);
            let id = zone.id;
            school.zones.push(zone);
            school.zones.sort_by_key(|z| z.year);
            ZoneChange::Inserted(id)
        }
    };

    average::recompute(school, average_color);
    school.touch();
    Ok(change)
}

/// Remove a zone by id, recomputing (or clearing) the average
pub fn remove_zone(school: &mut School, zone_id: ZoneId) -> Result<CatchmentZone> {
    let idx = school
        .zones
        .iter()
        .position(|z| z.id == zone_id)
        .ok_or_else(|| Error::NotFound(format!("Zone not found: {}", zone_id)))?;

    let removed = school.zones.remove(idx);
    // Existing average keeps its color; the fallback is never used here
    average::recompute(school, removed.color);
    school.touch();
    Ok(removed)
}

/// Show or hide one zone
pub fn set_zone_visibility(school: &mut School, zone_id: ZoneId, visible: bool) -> Result<()> {
    let zone = school
        .zone_mut(zone_id)
        .ok_or_else(|| Error::NotFound(format!("Zone not found: {}", zone_id)))?;
    zone.is_visible = visible;
    school.touch();
    Ok(())
}

/// Show or hide the average circle, independent of the zones
pub fn set_average_visibility(school: &mut School, visible: bool) -> Result<()> {
    let average = school.average.as_mut().ok_or_else(|| {
        Error::Validation(format!("School {} has no zones to average", school.name))
    })?;
    average.is_visible = visible;
    school.touch();
    Ok(())
}
