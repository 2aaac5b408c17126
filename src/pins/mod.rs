//! User-placed map pins
//!
//! Pins come in three kinds: school locators, generic locations and
//! measurement endpoints. Placement is a small state machine:
//!
//! - `Off -> School | Location` on `begin_placement`, back to `Off` after one
//!   placement or a cancel
//! - measurement mode is orthogonal: it takes exactly two clicks, yields a
//!   `Measurement` and switches itself off
//!
//! Pins only hold a `school_id` back-reference; schools are owned by the
//! registry.

use crate::catchment::SchoolId;
use crate::error::{Error, Result};
use crate::geo::{Coordinates, Measurement};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a pin
pub type PinId = Uuid;

/// Kind of pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinKind {
    School,
    Location,
    Measurement,
}

impl std::fmt::Display for PinKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::School => write!(f, "school"),
            Self::Location => write!(f, "location"),
            Self::Measurement => write!(f, "measurement"),
        }
    }
}

impl std::str::FromStr for PinKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "school" => Ok(Self::School),
            "location" => Ok(Self::Location),
            "measurement" => Ok(Self::Measurement),
            _ => Err(format!("Unknown pin type: {}", s)),
        }
    }
}

/// A map marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PinInfo {
    pub id: PinId,
    #[serde(rename = "type")]
    pub kind: PinKind,
    pub coordinates: Coordinates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school_id: Option<SchoolId>,
    pub draggable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PinInfo {
    pub fn new(kind: PinKind, coordinates: Coordinates) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            coordinates,
            school_id: None,
            draggable: kind != PinKind::Measurement,
            label: None,
        }
    }
}

/// Which kind of pin the next map click places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    #[default]
    Off,
    School,
    Location,
}

/// What a map click did to the pin state
#[derive(Debug, Clone, PartialEq)]
pub enum PinEvent {
    /// A pin was placed and placement mode switched off
    Placed(PinInfo),
    /// First measurement endpoint recorded
    MeasurementStarted(PinInfo),
    /// Second endpoint recorded; measurement mode switched off
    Measured {
        measurement: Measurement,
        end: PinInfo,
    },
}

/// Result of dragging a pin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragOutcome {
    /// A school pin moved; the linked school must follow
    Relocate {
        school_id: SchoolId,
        previous: Coordinates,
    },
    /// Only the pin itself moved
    Moved { previous: Coordinates },
}

/// Owns pins and the placement/measurement modes
#[derive(Debug, Clone, Default)]
pub struct PinManager {
    pins: Vec<PinInfo>,
    mode: PlacementMode,
    measurement: Option<Vec<Coordinates>>,
}

impl PinManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore pins from a cache; modes start off
    pub fn with_pins(pins: Vec<PinInfo>) -> Self {
        Self {
            pins: pins
                .into_iter()
                .filter(|p| p.kind != PinKind::Measurement)
                .collect(),
            ..Self::default()
        }
    }

    pub fn mode(&self) -> PlacementMode {
        self.mode
    }

    pub fn is_measuring(&self) -> bool {
        self.measurement.is_some()
    }

    /// Arm placement of a school or location pin
    pub fn begin_placement(&mut self, kind: PinKind) -> Result<()> {
        self.mode = match kind {
            PinKind::School => PlacementMode::School,
            PinKind::Location => PlacementMode::Location,
            PinKind::Measurement => {
                return Err(Error::Validation(
                    "Measurement pins are placed in measurement mode".to_string(),
                ))
            }
        };
        Ok(())
    }

    pub fn cancel_placement(&mut self) {
        self.mode = PlacementMode::Off;
    }

    /// Start a fresh two-point measurement, clearing old endpoints
    ///
    /// Returns the ids of measurement pins that were removed.
    pub fn begin_measurement(&mut self) -> Vec<PinId> {
        self.measurement = Some(Vec::with_capacity(2));
        self.clear_measurement_pins()
    }

    /// Abort a measurement, clearing its endpoints
    pub fn cancel_measurement(&mut self) -> Vec<PinId> {
        self.measurement = None;
        self.clear_measurement_pins()
    }

    /// Feed a map click into the active mode
    ///
    /// Measurement takes precedence over placement. Returns `None` when no
    /// mode is active, leaving the click to other consumers.
    pub fn handle_click(&mut self, coordinates: Coordinates) -> Option<PinEvent> {
        if let Some(points) = self.measurement.as_mut() {
            points.push(coordinates);
            let pin = PinInfo::new(PinKind::Measurement, coordinates);
            self.pins.push(pin.clone());

            if points.len() < 2 {
                return Some(PinEvent::MeasurementStarted(pin));
            }

            let measurement = Measurement::between(points[0], points[1]);
            self.measurement = None;
            return Some(PinEvent::Measured {
                measurement,
                end: pin,
            });
        }

        let kind = match self.mode {
            PlacementMode::Off => return None,
            PlacementMode::School => PinKind::School,
            PlacementMode::Location => PinKind::Location,
        };
        self.mode = PlacementMode::Off;

        let pin = PinInfo::new(kind, coordinates);
        self.pins.push(pin.clone());
        Some(PinEvent::Placed(pin))
    }

    /// Place a pin from typed coordinates
    ///
    /// Out-of-range values fail with `Validation` and no pin is created.
    pub fn place_precise(&mut self, kind: PinKind, lat: f64, lng: f64) -> Result<PinInfo> {
        let coordinates = Coordinates::checked(lat, lng)?;
        if kind == PinKind::Measurement {
            return Err(Error::Validation(
                "Measurement pins are placed in measurement mode".to_string(),
            ));
        }

        let pin = PinInfo::new(kind, coordinates);
        self.pins.push(pin.clone());
        self.mode = PlacementMode::Off;
        Ok(pin)
    }

    /// Move a pin
    ///
    /// A school pin linked to a school asks the caller to relocate that
    /// school; every other pin just moves.
    pub fn drag(&mut self, pin_id: PinId, coordinates: Coordinates) -> Result<DragOutcome> {
        coordinates.validate()?;
        let pin = self.get_mut(pin_id)?;
        if !pin.draggable {
            return Err(Error::Validation(format!("Pin {} is not draggable", pin_id)));
        }

        let previous = pin.coordinates;
        pin.coordinates = coordinates;

        Ok(match (pin.kind, pin.school_id) {
            (PinKind::School, Some(school_id)) => DragOutcome::Relocate {
                school_id,
                previous,
            },
            _ => DragOutcome::Moved { previous },
        })
    }

    /// Put a pin back where it was (after a failed relocation)
    pub fn revert(&mut self, pin_id: PinId, coordinates: Coordinates) -> Result<()> {
        self.get_mut(pin_id)?.coordinates = coordinates;
        Ok(())
    }

    /// Attach a school pin to a school
    pub fn link(&mut self, pin_id: PinId, school_id: SchoolId, label: &str) -> Result<()> {
        let pin = self.get_mut(pin_id)?;
        if pin.kind != PinKind::School {
            return Err(Error::Validation(format!(
                "Only school pins can be linked, pin {} is a {} pin",
                pin_id, pin.kind
            )));
        }
        pin.school_id = Some(school_id);
        pin.label = Some(label.to_string());
        Ok(())
    }

    /// Most recently placed school pin not yet linked to a school
    pub fn school_pin(&self) -> Option<&PinInfo> {
        self.pins
            .iter()
            .rev()
            .find(|p| p.kind == PinKind::School && p.school_id.is_none())
    }

    /// Pin linked to a school
    pub fn pin_for_school(&self, school_id: SchoolId) -> Option<&PinInfo> {
        self.pins.iter().find(|p| p.school_id == Some(school_id))
    }

    pub fn remove(&mut self, pin_id: PinId) -> Result<PinInfo> {
        let idx = self
            .pins
            .iter()
            .position(|p| p.id == pin_id)
            .ok_or_else(|| Error::NotFound(format!("Pin not found: {}", pin_id)))?;
        Ok(self.pins.remove(idx))
    }

    /// Remove every pin referencing a school
    pub fn remove_for_school(&mut self, school_id: SchoolId) -> Vec<PinInfo> {
        let (removed, kept): (Vec<PinInfo>, Vec<PinInfo>) = std::mem::take(&mut self.pins)
            .into_iter()
            .partition(|p| p.school_id == Some(school_id));
        self.pins = kept;
        removed
    }

    pub fn get(&self, pin_id: PinId) -> Option<&PinInfo> {
        self.pins.iter().find(|p| p.id == pin_id)
    }

    pub fn pins(&self) -> &[PinInfo] {
        &self.pins
    }

    fn get_mut(&mut self, pin_id: PinId) -> Result<&mut PinInfo> {
        self.pins
            .iter_mut()
            .find(|p| p.id == pin_id)
            .ok_or_else(|| Error::NotFound(format!("Pin not found: {}", pin_id)))
    }

    fn clear_measurement_pins(&mut self) -> Vec<PinId> {
        let removed: Vec<PinId> = self
            .pins
            .iter()
            .filter(|p| p.kind == PinKind::Measurement)
            .map(|p| p.id)
            .collect();
        self.pins.retain(|p| p.kind != PinKind::Measurement);
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn here() -> Coordinates {
        Coordinates::new(51.5, -0.12)
    }

    #[test]
    fn test_click_without_mode_is_ignored() {
        let mut pins = PinManager::new();
        assert!(pins.handle_click(here()).is_none());
        assert!(pins.pins().is_empty());
    }

    #[test]
    fn test_placement_mode_is_one_shot() {
        let mut pins = PinManager::new();
        pins.begin_placement(PinKind::Location).unwrap();
        assert_eq!(pins.mode(), PlacementMode::Location);

        match pins.handle_click(here()) {
            Some(PinEvent::Placed(pin)) => {
                assert_eq!(pin.kind, PinKind::Location);
                assert!(pin.draggable);
            }
            other => panic!("expected a placed pin, got {:?}", other),
        }
        assert_eq!(pins.mode(), PlacementMode::Off);
        assert!(pins.handle_click(here()).is_none());
        assert_eq!(pins.pins().len(), 1);
    }

    #[test]
    fn test_cancel_placement() {
        let mut pins = PinManager::new();
        pins.begin_placement(PinKind::School).unwrap();
        pins.cancel_placement();
        assert!(pins.handle_click(here()).is_none());
        assert!(pins.begin_placement(PinKind::Measurement).is_err());
    }

    #[test]
    fn test_measurement_takes_two_clicks() {
        let mut pins = PinManager::new();
        pins.begin_placement(PinKind::School).unwrap();
        pins.begin_measurement();

        let a = Coordinates::new(51.5074, -0.1278);
        let b = Coordinates::new(51.5007, -0.1246);

        assert!(matches!(pins.handle_click(a), Some(PinEvent::MeasurementStarted(_))));
        match pins.handle_click(b) {
            Some(PinEvent::Measured { measurement, .. }) => {
                assert_eq!(measurement.from, a);
                assert_eq!(measurement.to, b);
                assert!((measurement.meters - 777.2).abs() < 1.0);
            }
            other => panic!("expected a measurement, got {:?}", other),
        }
        assert!(!pins.is_measuring());

        // Placement mode was untouched by measuring
        assert!(matches!(pins.handle_click(a), Some(PinEvent::Placed(_))));
    }

    #[test]
    fn test_new_measurement_clears_old_endpoints() {
        let mut pins = PinManager::new();
        pins.begin_measurement();
        pins.handle_click(here());
        pins.handle_click(Coordinates::new(51.51, -0.12));
        assert_eq!(pins.pins().len(), 2);

        let removed = pins.begin_measurement();
        assert_eq!(removed.len(), 2);
        assert!(pins.pins().is_empty());
    }

    #[test]
    fn test_precise_placement_validates() {
        let mut pins = PinManager::new();
        assert!(matches!(
            pins.place_precise(PinKind::Location, 91.0, 0.0),
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            pins.place_precise(PinKind::Location, 0.0, -181.0),
            Err(Error::Validation(_))
        ));
        assert!(pins.pins().is_empty());

        let pin = pins.place_precise(PinKind::School, 90.0, -180.0).unwrap();
        assert_eq!(pin.coordinates, Coordinates::new(90.0, -180.0));
    }

    #[test]
    fn test_drag_linked_school_pin_requests_relocation() {
        let mut pins = PinManager::new();
        let pin = pins.place_precise(PinKind::School, 51.5, -0.12).unwrap();
        let school_id = SchoolId::new_v4();
        pins.link(pin.id, school_id, "Hillside").unwrap();

        let target = Coordinates::new(51.52, -0.11);
        let outcome = pins.drag(pin.id, target).unwrap();
        assert_eq!(
            outcome,
            DragOutcome::Relocate {
                school_id,
                previous: here()
            }
        );
        assert_eq!(pins.get(pin.id).unwrap().coordinates, target);

        pins.revert(pin.id, here()).unwrap();
        assert_eq!(pins.get(pin.id).unwrap().coordinates, here());
    }

    #[test]
    fn test_drag_unlinked_pin_only_moves() {
        let mut pins = PinManager::new();
        let school_pin = pins.place_precise(PinKind::School, 51.5, -0.12).unwrap();
        let location = pins.place_precise(PinKind::Location, 51.5, -0.12).unwrap();
        let target = Coordinates::new(51.52, -0.11);

        assert!(matches!(pins.drag(school_pin.id, target), Ok(DragOutcome::Moved { .. })));
        assert!(matches!(pins.drag(location.id, target), Ok(DragOutcome::Moved { .. })));
        assert!(matches!(pins.drag(PinId::new_v4(), target), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_measurement_pins_are_not_draggable() {
        let mut pins = PinManager::new();
        pins.begin_measurement();
        let pin = match pins.handle_click(here()) {
            Some(PinEvent::MeasurementStarted(pin)) => pin,
            other => panic!("unexpected {:?}", other),
        };
        assert!(matches!(pins.drag(pin.id, here()), Err(Error::Validation(_))));
    }

    #[test]
    fn test_link_rules_and_cascade() {
        let mut pins = PinManager::new();
        let location = pins.place_precise(PinKind::Location, 51.5, -0.12).unwrap();
        let school_pin = pins.place_precise(PinKind::School, 51.5, -0.12).unwrap();
        let school_id = SchoolId::new_v4();

        assert!(pins.link(location.id, school_id, "X").is_err());
        assert_eq!(pins.school_pin().unwrap().id, school_pin.id);

        pins.link(school_pin.id, school_id, "X").unwrap();
        assert!(pins.school_pin().is_none());
        assert_eq!(pins.pin_for_school(school_id).unwrap().id, school_pin.id);

        let removed = pins.remove_for_school(school_id);
        assert_eq!(removed.len(), 1);
        assert_eq!(pins.pins().len(), 1);
    }

    #[test]
    fn test_pin_serialization() {
        let mut pin = PinInfo::new(PinKind::School, here());
        pin.school_id = Some(SchoolId::new_v4());
        let json = serde_json::to_value(&pin).unwrap();
        assert_eq!(json["type"], "school");

        let parsed: PinInfo = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, pin);
    }
}
