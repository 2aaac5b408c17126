//! Average catchment radius
//!
//! The average is derived data: it is recomputed after every zone change and
//! disappears when the last zone is removed.

use crate::catchment::{AverageCatchment, CatchmentZone, Color, School};

/// Mean of all zone radii in kilometers, rounded to one decimal place
///
/// Returns `None` when there are no zones.
pub fn average_radius_km(zones: &[CatchmentZone]) -> Option<f64> {
    if zones.is_empty() {
        return None;
    }

    let total: f64 = zones.iter().map(|z| z.radius().km()).sum();
    let mean = total / zones.len() as f64;

    Some((mean * 10.0).round() / 10.0)
}

/// Refresh `school.average` from its zones
///
/// An existing average keeps its color and visibility; a new one takes
/// `color` and starts visible.
pub fn recompute(school: &mut School, color: Color) {
    school.average = match average_radius_km(&school.zones) {
        Some(radius) => Some(match school.average.take() {
            Some(previous) => AverageCatchment { radius, ..previous },
            None => AverageCatchment {
                radius,
                color,
                is_visible: true,
            },
        }),
        None => None,
    };
}
