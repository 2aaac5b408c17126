//! Map surface commands
//!
//! The engine never holds map-library handles. It emits `RenderCommand`s
//! keyed by entity id and the surface keeps whatever handle table it needs.

use crate::catchment::{CircleKey, Color, RadiusCircle};
use crate::geo::Coordinates;
use crate::pins::{PinId, PinInfo};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// One instruction for the map surface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    /// Draw a circle, replacing any circle with the same key
    DrawCircle(RadiusCircle),
    RemoveCircle(CircleKey),
    RestyleCircle {
        key: CircleKey,
        color: Color,
        is_visible: bool,
    },
    DrawMarker(PinInfo),
    MoveMarker {
        id: PinId,
        coordinates: Coordinates,
    },
    RemoveMarker {
        id: PinId,
    },
    ShowPopup {
        at: Coordinates,
        text: String,
    },
}

/// Rendering collaborator driven by commands
pub trait MapSurface: Send + Sync {
    fn apply(&self, commands: &[RenderCommand]);
}

/// Surface that discards everything (headless use)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSurface;

impl MapSurface for NullSurface {
    fn apply(&self, _commands: &[RenderCommand]) {}
}

/// Surface that records commands, for inspection and tests
#[derive(Debug, Default)]
pub struct CommandLog {
    commands: Mutex<Vec<RenderCommand>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far
    pub fn drain(&self) -> Vec<RenderCommand> {
        match self.commands.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl MapSurface for CommandLog {
    fn apply(&self, commands: &[RenderCommand]) {
        let mut guard = match self.commands.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.extend_from_slice(commands);
    }
}

/// Commands that bring a school's circles from `before` to `after`
///
/// Circles missing from `after` are removed, new or moved ones drawn, and
/// circles that only changed color or visibility are restyled.
pub fn diff_circles(before: &[RadiusCircle], after: &[RadiusCircle]) -> Vec<RenderCommand> {
    let mut commands = Vec::new();

    for old in before {
        if !after.iter().any(|c| c.key() == old.key()) {
            commands.push(RenderCommand::RemoveCircle(old.key()));
        }
    }

    for new in after {
        match before.iter().find(|c| c.key() == new.key()) {
            None => commands.push(RenderCommand::DrawCircle(new.clone())),
            Some(old) if old == new => {}
            Some(old)
                if old.center == new.center && old.radius == new.radius && old.unit == new.unit =>
            {
                commands.push(RenderCommand::RestyleCircle {
                    key: new.key(),
                    color: new.color,
                    is_visible: new.is_visible,
                })
            }
            Some(_) => commands.push(RenderCommand::DrawCircle(new.clone())),
        }
    }

    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Unit;
    use uuid::Uuid;

    fn circle(school_id: Uuid, year: i32, radius: f64) -> RadiusCircle {
        RadiusCircle {
            school_id,
            year,
            center: Coordinates::new(51.5, -0.12),
            radius,
            unit: Unit::Km,
            color: Color::rgb(0, 0, 0),
            is_visible: true,
        }
    }

    #[test]
    fn test_diff_draws_removes_and_restyles() {
        let id = Uuid::new_v4();
        let before = vec![circle(id, 2023, 1.0), circle(id, 2024, 1.0), circle(id, 0, 1.0)];

        let mut restyled = circle(id, 2024, 1.0);
        restyled.is_visible = false;
        let after = vec![restyled, circle(id, 2025, 2.0), circle(id, 0, 1.5)];

        let commands = diff_circles(&before, &after);
        assert_eq!(commands.len(), 4);
        assert!(commands.contains(&RenderCommand::RemoveCircle(CircleKey {
            school_id: id,
            year: 2023
        })));
        assert!(commands.iter().any(|c| matches!(
            c,
            RenderCommand::RestyleCircle { key, is_visible: false, .. } if key.year == 2024
        )));
        assert!(commands.contains(&RenderCommand::DrawCircle(circle(id, 2025, 2.0))));
        assert!(commands.contains(&RenderCommand::DrawCircle(circle(id, 0, 1.5))));
    }

    #[test]
    fn test_diff_of_identical_is_empty() {
        let id = Uuid::new_v4();
        let circles = vec![circle(id, 2024, 1.0)];
        assert!(diff_circles(&circles, &circles).is_empty());
    }

    #[test]
    fn test_command_log_drains() {
        let log = CommandLog::new();
        log.apply(&[RenderCommand::RemoveMarker { id: Uuid::new_v4() }]);
        log.apply(&[RenderCommand::ShowPopup {
            at: Coordinates::new(0.0, 0.0),
            text: "hi".to_string(),
        }]);

        assert_eq!(log.drain().len(), 2);
        assert!(log.drain().is_empty());
    }

    #[test]
    fn test_command_serialization_is_tagged() {
        let json = serde_json::to_value(RenderCommand::RemoveMarker { id: Uuid::nil() }).unwrap();
        assert_eq!(json["command"], "remove_marker");
    }
}
