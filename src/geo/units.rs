//! Radius unit conversion
//!
//! All conversions normalize through meters, so `convert` is its own inverse
//! up to floating-point error.

use crate::constants::geo::{METERS_PER_KM, METERS_PER_MILE};
use serde::{Deserialize, Serialize};

/// Unit a catchment radius is expressed in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Km,
    Miles,
    Meters,
}

impl Unit {
    /// Meters represented by one of this unit
    pub fn meters_per_unit(self) -> f64 {
        match self {
            Self::Km => METERS_PER_KM,
            Self::Miles => METERS_PER_MILE,
            Self::Meters => 1.0,
        }
    }

    /// Short suffix for display
    pub fn suffix(self) -> &'static str {
        match self {
            Self::Km => "km",
            Self::Miles => "mi",
            Self::Meters => "m",
        }
    }
}

impl Default for Unit {
    fn default() -> Self {
        Self::Km
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Km => write!(f, "km"),
            Self::Miles => write!(f, "miles"),
            Self::Meters => write!(f, "meters"),
        }
    }
}

impl std::str::FromStr for Unit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "km" | "kilometers" | "kilometres" => Ok(Self::Km),
            "mi" | "mile" | "miles" => Ok(Self::Miles),
            "m" | "meters" | "metres" => Ok(Self::Meters),
            _ => Err(format!("Unknown unit: {}", s)),
        }
    }
}

/// Convert a value between units
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    if from == to {
        return value;
    }
    let meters = value * from.meters_per_unit();
    meters / to.meters_per_unit()
}

/// A radius together with its unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Radius {
    pub value: f64,
    pub unit: Unit,
}

impl Radius {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Re-express the same quantity in another unit
    pub fn to(self, unit: Unit) -> Self {
        Self {
            value: convert(self.value, self.unit, unit),
            unit,
        }
    }

    pub fn meters(self) -> f64 {
        convert(self.value, self.unit, Unit::Meters)
    }

    pub fn km(self) -> f64 {
        convert(self.value, self.unit, Unit::Km)
    }
}

impl std::fmt::Display for Radius {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.value, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    const UNITS: [Unit; 3] = [Unit::Km, Unit::Miles, Unit::Meters];

    #[test]
    fn test_known_factors() {
        assert_abs_diff_eq!(convert(1.0, Unit::Km, Unit::Meters), 1000.0);
        assert_abs_diff_eq!(convert(1.0, Unit::Miles, Unit::Meters), 1609.34);
        assert_abs_diff_eq!(convert(1609.34, Unit::Meters, Unit::Miles), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(convert(2.5, Unit::Km, Unit::Km), 2.5);
    }

    #[test]
    fn test_conversion_is_self_inverse() {
        for &a in &UNITS {
            for &b in &UNITS {
                for &x in &[0.001, 0.5, 1.0, 3.7, 250.0, 12_345.678] {
                    let back = convert(convert(x, a, b), b, a);
                    assert_abs_diff_eq!(back, x, epsilon = 1e-6);
                }
            }
        }
    }

    #[test]
    fn test_radius_switch_preserves_quantity() {
        let r = Radius::new(2.0, Unit::Km);
        let miles = r.to(Unit::Miles);
        assert_eq!(miles.unit, Unit::Miles);
        assert_abs_diff_eq!(miles.meters(), 2000.0, epsilon = 1e-9);
        assert_abs_diff_eq!(miles.to(Unit::Km).value, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("KM".parse::<Unit>().unwrap(), Unit::Km);
        assert_eq!("miles".parse::<Unit>().unwrap(), Unit::Miles);
        assert_eq!("m".parse::<Unit>().unwrap(), Unit::Meters);
        assert!("furlongs".parse::<Unit>().is_err());
    }

    #[test]
    fn test_unit_serde_names() {
        assert_eq!(serde_json::to_string(&Unit::Miles).unwrap(), "\"miles\"");
        let unit: Unit = serde_json::from_str("\"meters\"").unwrap();
        assert_eq!(unit, Unit::Meters);
    }
}
