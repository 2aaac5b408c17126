//! Deterministic color assignment for catchment circles
//!
//! Colors resolve in priority order:
//! 1. An explicit override for a (school, year) pair
//! 2. A palette assigned to the school, indexed by year
//! 3. The global palette selection, indexed by school position or by year
//!
//! Palettes are a closed set of fixed tables, so lookups cannot fail.
//! Overrides and per-school palettes are stored on the school itself
//! (`CatchmentZone::custom_color`, `School::palette`); the assigner only
//! mirrors them.

use crate::catchment::{School, SchoolId};
use crate::constants::limits::{AVERAGE_YEAR, PALETTE_BASE_YEAR};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An RGB color, serialized as `#rrggbb`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl std::str::FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!("Invalid color: {}", s));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| format!("Invalid color: {}", s))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Number of colors in every palette
pub const PALETTE_LEN: usize = 8;

/// Named palettes available to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteName {
    Vibrant,
    Pastel,
    Earth,
    Ocean,
    Sunset,
    Contrast,
}

const VIBRANT: [Color; PALETTE_LEN] = [
    Color::rgb(0xe6, 0x19, 0x4b),
    Color::rgb(0x3c, 0xb4, 0x4b),
    Color::rgb(0x43, 0x63, 0xd8),
    Color::rgb(0xf5, 0x82, 0x31),
    Color::rgb(0x91, 0x1e, 0xb4),
    Color::rgb(0x42, 0xd4, 0xf4),
    Color::rgb(0xf0, 0x32, 0xe6),
    Color::rgb(0xbf, 0xef, 0x45),
];

const PASTEL: [Color; PALETTE_LEN] = [
    Color::rgb(0xfb, 0xb4, 0xae),
    Color::rgb(0xb3, 0xcd, 0xe3),
    Color::rgb(0xcc, 0xeb, 0xc5),
    Color::rgb(0xde, 0xcb, 0xe4),
    Color::rgb(0xfe, 0xd9, 0xa6),
    Color::rgb(0xff, 0xff, 0xcc),
    Color::rgb(0xe5, 0xd8, 0xbd),
    Color::rgb(0xfd, 0xda, 0xec),
];

const EARTH: [Color; PALETTE_LEN] = [
    Color::rgb(0x8c, 0x51, 0x0a),
    Color::rgb(0xbf, 0x81, 0x2d),
    Color::rgb(0xdf, 0xc2, 0x7d),
    Color::rgb(0x80, 0xcd, 0xc1),
    Color::rgb(0x35, 0x97, 0x8f),
    Color::rgb(0x01, 0x66, 0x5e),
    Color::rgb(0x54, 0x30, 0x05),
    Color::rgb(0x00, 0x3c, 0x30),
];

const OCEAN: [Color; PALETTE_LEN] = [
    Color::rgb(0x08, 0x45, 0x94),
    Color::rgb(0x21, 0x71, 0xb5),
    Color::rgb(0x42, 0x92, 0xc6),
    Color::rgb(0x6b, 0xae, 0xd6),
    Color::rgb(0x9e, 0xca, 0xe1),
    Color::rgb(0x02, 0x81, 0x8a),
    Color::rgb(0x3f, 0x00, 0x7d),
    Color::rgb(0x00, 0x44, 0x1b),
];

const SUNSET: [Color; PALETTE_LEN] = [
    Color::rgb(0xff, 0xbe, 0x0b),
    Color::rgb(0xfb, 0x56, 0x07),
    Color::rgb(0xff, 0x00, 0x6e),
    Color::rgb(0x83, 0x38, 0xec),
    Color::rgb(0x3a, 0x86, 0xff),
    Color::rgb(0xe7, 0x6f, 0x51),
    Color::rgb(0xf4, 0xa2, 0x61),
    Color::rgb(0x26, 0x46, 0x53),
];

const CONTRAST: [Color; PALETTE_LEN] = [
    Color::rgb(0x00, 0x00, 0x00),
    Color::rgb(0xe6, 0x9f, 0x00),
    Color::rgb(0x56, 0xb4, 0xe9),
    Color::rgb(0x00, 0x9e, 0x73),
    Color::rgb(0xf0, 0xe4, 0x42),
    Color::rgb(0x00, 0x72, 0xb2),
    Color::rgb(0xd5, 0x5e, 0x00),
    Color::rgb(0xcc, 0x79, 0xa7),
];

impl PaletteName {
    /// Color table for this palette
    pub fn colors(self) -> &'static [Color; PALETTE_LEN] {
        match self {
            Self::Vibrant => &VIBRANT,
            Self::Pastel => &PASTEL,
            Self::Earth => &EARTH,
            Self::Ocean => &OCEAN,
            Self::Sunset => &SUNSET,
            Self::Contrast => &CONTRAST,
        }
    }

    pub fn all() -> [PaletteName; 6] {
        [
            Self::Vibrant,
            Self::Pastel,
            Self::Earth,
            Self::Ocean,
            Self::Sunset,
            Self::Contrast,
        ]
    }
}

impl std::fmt::Display for PaletteName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Vibrant => write!(f, "vibrant"),
            Self::Pastel => write!(f, "pastel"),
            Self::Earth => write!(f, "earth"),
            Self::Ocean => write!(f, "ocean"),
            Self::Sunset => write!(f, "sunset"),
            Self::Contrast => write!(f, "contrast"),
        }
    }
}

impl std::str::FromStr for PaletteName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .into_iter()
            .find(|p| p.to_string() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown palette: {}", s))
    }
}

/// Whether the global palette is indexed by school or by year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaletteKind {
    Schools,
    Years,
}

impl std::fmt::Display for PaletteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Schools => write!(f, "schools"),
            Self::Years => write!(f, "years"),
        }
    }
}

impl std::str::FromStr for PaletteKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "schools" | "school" => Ok(Self::Schools),
            "years" | "year" => Ok(Self::Years),
            _ => Err(format!("Unknown palette type: {}", s)),
        }
    }
}

/// The globally selected palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteSelection {
    #[serde(rename = "type")]
    pub kind: PaletteKind,
    pub name: PaletteName,
}

impl Default for PaletteSelection {
    fn default() -> Self {
        Self {
            kind: PaletteKind::Schools,
            name: PaletteName::Vibrant,
        }
    }
}

fn year_index(year: i32) -> usize {
    (year - PALETTE_BASE_YEAR).unsigned_abs() as usize % PALETTE_LEN
}

/// Resolves colors for (school, year) pairs
#[derive(Debug, Clone, Default)]
pub struct ColorAssigner {
    selection: PaletteSelection,
    school_palettes: HashMap<SchoolId, PaletteName>,
    overrides: HashMap<(SchoolId, i32), Color>,
}

impl ColorAssigner {
    pub fn new(selection: PaletteSelection) -> Self {
        Self {
            selection,
            ..Self::default()
        }
    }

    pub fn selection(&self) -> PaletteSelection {
        self.selection
    }

    pub fn select(&mut self, selection: PaletteSelection) {
        self.selection = selection;
    }

    /// Pin a color to one (school, year) pair
    pub fn set_override(&mut self, school_id: SchoolId, year: i32, color: Color) {
        self.overrides.insert((school_id, year), color);
    }

    /// Give a school its own year-indexed palette
    pub fn set_school_palette(&mut self, school_id: SchoolId, palette: PaletteName) {
        self.school_palettes.insert(school_id, palette);
    }

    /// Drop everything tied to a removed school
    pub fn forget_school(&mut self, school_id: SchoolId) {
        self.school_palettes.remove(&school_id);
        self.overrides.retain(|(id, _), _| *id != school_id);
    }

    /// Rebuild a school's overrides and palette from its stored data
    ///
    /// Zones flagged `custom_color` become overrides. Anything previously
    /// recorded for the school is dropped first.
    pub fn restore(&mut self, school: &School) {
        self.forget_school(school.id);
        if let Some(palette) = school.palette {
            self.set_school_palette(school.id, palette);
        }
        for zone in school.zones.iter().filter(|z| z.custom_color) {
            self.set_override(school.id, zone.year, zone.color);
        }
    }

    /// Resolve the color of a circle
    ///
    /// `school_index` is the school's position among favorites.
    pub fn color_for(&self, school_id: SchoolId, school_index: usize, year: i32) -> Color {
        if let Some(color) = self.overrides.get(&(school_id, year)) {
            return *color;
        }

        if let Some(palette) = self.school_palettes.get(&school_id) {
            return palette.colors()[year_index(year)];
        }

        let colors = self.selection.name.colors();
        match self.selection.kind {
            PaletteKind::Schools => colors[school_index % PALETTE_LEN],
            PaletteKind::Years => colors[year_index(year)],
        }
    }

    /// Recolor every zone and the average of a school
    ///
    /// Returns true if any color changed.
    pub fn apply(&self, school: &mut School, school_index: usize) -> bool {
        let mut changed = false;

        for zone in &mut school.zones {
            let color = self.color_for(school.id, school_index, zone.year);
            changed |= zone.color != color;
            zone.color = color;
        }

        if let Some(average) = &mut school.average {
            let color = self.color_for(school.id, school_index, AVERAGE_YEAR);
            changed |= average.color != color;
            average.color = color;
        }

        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catchment::zones::upsert_zone;
    use crate::geo::{Coordinates, Unit};
    use uuid::Uuid;

    #[test]
    fn test_color_hex_roundtrip() {
        let color: Color = "#1A2b3C".parse().unwrap();
        assert_eq!(color, Color::rgb(0x1a, 0x2b, 0x3c));
        assert_eq!(color.to_string(), "#1a2b3c");
        assert!("#12345".parse::<Color>().is_err());
        assert!("#gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_serializes_as_string() {
        let json = serde_json::to_string(&Color::rgb(255, 0, 16)).unwrap();
        assert_eq!(json, "\"#ff0010\"");
        assert!(serde_json::from_str::<Color>("\"red\"").is_err());
    }

    #[test]
    fn test_schools_mode_uses_position() {
        let assigner = ColorAssigner::default();
        let id = Uuid::new_v4();

        assert_eq!(assigner.color_for(id, 0, 2024), VIBRANT[0]);
        assert_eq!(assigner.color_for(id, 0, 2019), VIBRANT[0]);
        assert_eq!(assigner.color_for(id, 3, 2024), VIBRANT[3]);
    }

    #[test]
    fn test_years_mode_uses_distance_from_base_year() {
        let assigner = ColorAssigner::new(PaletteSelection {
            kind: PaletteKind::Years,
            name: PaletteName::Ocean,
        });
        let id = Uuid::new_v4();

        assert_eq!(assigner.color_for(id, 5, 2020), OCEAN[0]);
        assert_eq!(assigner.color_for(id, 5, 2023), OCEAN[3]);
        assert_eq!(assigner.color_for(id, 0, 2017), OCEAN[3]);
        assert_eq!(assigner.color_for(id, 0, 2028), OCEAN[0]);
    }

    #[test]
    fn test_priority_order() {
        let mut assigner = ColorAssigner::default();
        let id = Uuid::new_v4();
        let custom = Color::rgb(1, 2, 3);

        assigner.set_school_palette(id, PaletteName::Earth);
        assert_eq!(assigner.color_for(id, 0, 2022), EARTH[2]);

        assigner.set_override(id, 2022, custom);
        assert_eq!(assigner.color_for(id, 0, 2022), custom);
        assert_eq!(assigner.color_for(id, 0, 2021), EARTH[1]);

        let other = Uuid::new_v4();
        assert_eq!(assigner.color_for(other, 1, 2022), VIBRANT[1]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut school = School::new("A", "", Coordinates::new(51.5, -0.12));
        let grey = Color::rgb(9, 9, 9);
        for year in [2021, 2022, 2024] {
            upsert_zone(&mut school, year, 1.0, Unit::Km, grey, grey).unwrap();
        }

        let assigner = ColorAssigner::new(PaletteSelection {
            kind: PaletteKind::Years,
            name: PaletteName::Sunset,
        });

        assert!(assigner.apply(&mut school, 2));
        let first = school.clone();
        assert!(!assigner.apply(&mut school, 2));
        assert_eq!(school, first);
        assert_eq!(school.zones[0].color, SUNSET[1]);
    }

    #[test]
    fn test_forget_school() {
        let mut assigner = ColorAssigner::new(PaletteSelection {
            kind: PaletteKind::Years,
            name: PaletteName::Pastel,
        });
        let id = Uuid::new_v4();
        assigner.set_override(id, 2024, Color::rgb(1, 1, 1));
        assigner.set_school_palette(id, PaletteName::Earth);
        assigner.forget_school(id);
        assert_eq!(assigner.color_for(id, 0, 2024), PASTEL[4]);
    }

    #[test]
    fn test_restore_from_school_data() {
        let custom = Color::rgb(0x12, 0x34, 0x56);
        let mut school = School::new("A", "", Coordinates::new(51.5, -0.12));
        for year in [2022, 2024] {
            upsert_zone(&mut school, year, 1.0, Unit::Km, custom, custom).unwrap();
        }
        school.zones[1].custom_color = true;
        school.palette = Some(PaletteName::Earth);

        let mut assigner = ColorAssigner::default();
        assigner.set_override(school.id, 2022, Color::rgb(9, 9, 9));
        assigner.restore(&school);

        assert_eq!(assigner.color_for(school.id, 0, 2024), custom);
        assert_eq!(assigner.color_for(school.id, 0, 2022), EARTH[2]);

        // Switching the global palette leaves the restored state alone
        assigner.select(PaletteSelection {
            kind: PaletteKind::Years,
            name: PaletteName::Sunset,
        });
        assert!(assigner.apply(&mut school, 0));
        assert_eq!(school.zone_for_year(2024).unwrap().color, custom);
        assert_eq!(school.zone_for_year(2022).unwrap().color, EARTH[2]);

        school.palette = None;
        school.zones[1].custom_color = false;
        assigner.restore(&school);
        assert_eq!(assigner.color_for(school.id, 0, 2024), SUNSET[4]);
    }

    #[test]
    fn test_palette_parsing() {
        assert_eq!("Ocean".parse::<PaletteName>().unwrap(), PaletteName::Ocean);
        assert!("neon".parse::<PaletteName>().is_err());
        assert_eq!("years".parse::<PaletteKind>().unwrap(), PaletteKind::Years);
    }
}
