// src/config.rs
//! Typed planner input and configuration.
//!
//! `PlannerInputs` is the observed state of the input form. Every field is
//! optional; `normalize` is the only place that applies defaults and clamps,
//! producing the `NormalizedInputs` the estimator and the scene work from.

use std::f64::consts::FRAC_PI_4;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{PlannerError, Result};
use crate::units::{clamp_min, finite_or, RawNumber};

// ─────────────────────────────────────────────────────────────────────────────
// Defaults & floors
// ─────────────────────────────────────────────────────────────────────────────

pub mod defaults {
    pub const ROOM_LENGTH_M: f64 = 5.0;
    pub const ROOM_WIDTH_M: f64 = 4.0;
    pub const TILE_LENGTH_CM: f64 = 60.0;
    pub const TILE_WIDTH_CM: f64 = 60.0;
    pub const GROUT_MM: f64 = 2.0;
    pub const WASTE_PERCENT: f64 = 8.0;
    pub const PRICE_PER_M2: f64 = 3500.0;
    pub const TILES_PER_BOX: f64 = 6.0;

    pub const MIN_ROOM_M: f64 = 0.5;
    pub const MIN_TILE_CM: f64 = 1.0;
    pub const MIN_TILES_PER_BOX: u32 = 1;
}

// ─────────────────────────────────────────────────────────────────────────────
// Normalized specs
// ─────────────────────────────────────────────────────────────────────────────

/// Layout pattern of the tiles on the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    #[default]
    Straight,
    /// Tiles laid at 45°.
    Diagonal,
}

impl Pattern {
    pub fn as_str(self) -> &'static str {
        match self {
            Pattern::Straight => "straight",
            Pattern::Diagonal => "diagonal",
        }
    }

    /// Texture rotation in radians.
    pub fn rotation(self) -> f64 {
        match self {
            Pattern::Straight => 0.0,
            Pattern::Diagonal => FRAC_PI_4,
        }
    }
}

impl FromStr for Pattern {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "straight" => Ok(Pattern::Straight),
            "diagonal" => Ok(Pattern::Diagonal),
            other => Err(PlannerError::InvalidPattern(other.to_string())),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Floor dimensions in meters, both at least 0.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoomSpec {
    pub length_m: f64,
    pub width_m: f64,
}

/// Physical tile size, grout joint and layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSpec {
    pub length_cm: f64,
    pub width_cm: f64,
    pub grout_mm: f64,
    pub pattern: Pattern,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingSpec {
    pub waste_percent: f64,
    pub price_per_m2: f64,
    pub tiles_per_box: u32,
}

/// Output of `PlannerInputs::normalize`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedInputs {
    pub room: RoomSpec,
    pub tile: TileSpec,
    pub pricing: PricingSpec,
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw input
// ─────────────────────────────────────────────────────────────────────────────

/// Recognised form fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputField {
    RoomLength,
    RoomWidth,
    TileLength,
    TileWidth,
    Grout,
    Waste,
    PricePerM2,
    TilesPerBox,
    Pattern,
}

impl InputField {
    pub const ALL: [InputField; 9] = [
        InputField::RoomLength,
        InputField::RoomWidth,
        InputField::TileLength,
        InputField::TileWidth,
        InputField::Grout,
        InputField::Waste,
        InputField::PricePerM2,
        InputField::TilesPerBox,
        InputField::Pattern,
    ];

    /// Accepts the form element ids and their snake_case spellings.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name.trim() {
            "roomLen" | "room_length" => InputField::RoomLength,
            "roomWid" | "room_width" => InputField::RoomWidth,
            "tileLen" | "tile_length" => InputField::TileLength,
            "tileWid" | "tile_width" => InputField::TileWidth,
            "grout" => InputField::Grout,
            "waste" => InputField::Waste,
            "priceM2" | "price_per_m2" => InputField::PricePerM2,
            "perBox" | "tiles_per_box" => InputField::TilesPerBox,
            "pattern" => InputField::Pattern,
            _ => return None,
        };
        Some(field)
    }

    pub fn form_id(self) -> &'static str {
        match self {
            InputField::RoomLength => "roomLen",
            InputField::RoomWidth => "roomWid",
            InputField::TileLength => "tileLen",
            InputField::TileWidth => "tileWid",
            InputField::Grout => "grout",
            InputField::Waste => "waste",
            InputField::PricePerM2 => "priceM2",
            InputField::TilesPerBox => "perBox",
            InputField::Pattern => "pattern",
        }
    }
}

/// Snapshot of the input form. `None` means the field is absent.
///
/// Serialized with the form ids as keys. Numbers may be given as JSON numbers
/// or numeric strings; anything else reads as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerInputs {
    #[serde(rename = "roomLen", alias = "room_length", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_length_m: Option<f64>,
    #[serde(rename = "roomWid", alias = "room_width", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_width_m: Option<f64>,
    #[serde(rename = "tileLen", alias = "tile_length", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_length_cm: Option<f64>,
    #[serde(rename = "tileWid", alias = "tile_width", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_width_cm: Option<f64>,
    #[serde(rename = "grout", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grout_mm: Option<f64>,
    #[serde(rename = "waste", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waste_percent: Option<f64>,
    #[serde(rename = "priceM2", alias = "price_per_m2", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_per_m2: Option<f64>,
    #[serde(rename = "perBox", alias = "tiles_per_box", deserialize_with = "lenient_number")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tiles_per_box: Option<f64>,
    #[serde(deserialize_with = "lenient_pattern", skip_serializing_if = "Option::is_none")]
    pub pattern: Option<Pattern>,
}

/// Any JSON value a form field may carry.
#[derive(Deserialize)]
#[serde(untagged)]
enum Raw {
    Number(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<f64>, D::Error> {
    Ok(Option::<Raw>::deserialize(d)?.and_then(|raw| match raw {
        Raw::Number(v) => Some(v),
        Raw::Text(text) => text.as_number(),
        Raw::Other(_) => None,
    }))
}

/// Same rule as the form: unrecognised patterns are straight.
fn lenient_pattern<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Pattern>, D::Error> {
    Ok(Option::<Raw>::deserialize(d)?.map(|raw| match raw {
        Raw::Text(text) => text.parse().unwrap_or_default(),
        Raw::Number(_) | Raw::Other(_) => Pattern::Straight,
    }))
}

impl PlannerInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room(mut self, length_m: f64, width_m: f64) -> Self {
        self.room_length_m = Some(length_m);
        self.room_width_m = Some(width_m);
        self
    }

    pub fn with_tile(mut self, length_cm: f64, width_cm: f64) -> Self {
        self.tile_length_cm = Some(length_cm);
        self.tile_width_cm = Some(width_cm);
        self
    }

    pub fn with_grout(mut self, grout_mm: f64) -> Self {
        self.grout_mm = Some(grout_mm);
        self
    }

    pub fn with_waste(mut self, waste_percent: f64) -> Self {
        self.waste_percent = Some(waste_percent);
        self
    }

    pub fn with_pricing(mut self, price_per_m2: f64, tiles_per_box: f64) -> Self {
        self.price_per_m2 = Some(price_per_m2);
        self.tiles_per_box = Some(tiles_per_box);
        self
    }

    pub fn with_pattern(mut self, pattern: Pattern) -> Self {
        self.pattern = Some(pattern);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Stores a raw form value. Numeric fields that do not parse become
    /// absent; an unrecognised pattern falls back to straight.
    pub fn set_field(&mut self, field: InputField, raw: &str) {
        let number = raw.as_number();
        match field {
            InputField::RoomLength => self.room_length_m = number,
            InputField::RoomWidth => self.room_width_m = number,
            InputField::TileLength => self.tile_length_cm = number,
            InputField::TileWidth => self.tile_width_cm = number,
            InputField::Grout => self.grout_mm = number,
            InputField::Waste => self.waste_percent = number,
            InputField::PricePerM2 => self.price_per_m2 = number,
            InputField::TilesPerBox => self.tiles_per_box = number,
            InputField::Pattern => {
                self.pattern = Some(raw.parse().unwrap_or_else(|err| {
                    log::debug!("{err}, using straight layout");
                    Pattern::Straight
                }))
            }
        }
    }

    /// `set_field` by form name.
    pub fn set_named(&mut self, name: &str, raw: &str) -> Result<()> {
        let field =
            InputField::from_name(name).ok_or_else(|| PlannerError::UnknownField(name.into()))?;
        self.set_field(field, raw);
        Ok(())
    }

    /// Applies per-field defaults and floors.
    pub fn normalize(&self) -> NormalizedInputs {
        let room = RoomSpec {
            length_m: clamp_min(
                finite_or(&self.room_length_m, defaults::ROOM_LENGTH_M),
                defaults::MIN_ROOM_M,
            ),
            width_m: clamp_min(
                finite_or(&self.room_width_m, defaults::ROOM_WIDTH_M),
                defaults::MIN_ROOM_M,
            ),
        };

        let tile = TileSpec {
            length_cm: clamp_min(
                finite_or(&self.tile_length_cm, defaults::TILE_LENGTH_CM),
                defaults::MIN_TILE_CM,
            ),
            width_cm: clamp_min(
                finite_or(&self.tile_width_cm, defaults::TILE_WIDTH_CM),
                defaults::MIN_TILE_CM,
            ),
            grout_mm: clamp_min(finite_or(&self.grout_mm, defaults::GROUT_MM), 0.0),
            pattern: self.pattern.unwrap_or_default(),
        };

        let per_box = finite_or(&self.tiles_per_box, defaults::TILES_PER_BOX).floor();
        let pricing = PricingSpec {
            waste_percent: clamp_min(finite_or(&self.waste_percent, defaults::WASTE_PERCENT), 0.0),
            price_per_m2: clamp_min(finite_or(&self.price_per_m2, defaults::PRICE_PER_M2), 0.0),
            // Saturating cast; anything below one box size becomes one.
            tiles_per_box: (per_box as u32).max(defaults::MIN_TILES_PER_BOX),
        };

        NormalizedInputs { room, tile, pricing }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Planner configuration
// ─────────────────────────────────────────────────────────────────────────────

/// How numbers are rendered on the output surface.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFormat {
    pub thousands_separator: char,
    pub currency: String,
}

impl Default for DisplayFormat {
    fn default() -> Self {
        Self {
            thousands_separator: '.',
            currency: "RSD".to_string(),
        }
    }
}

/// Static planner settings.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Base location relative texture paths are resolved against.
    pub asset_base: String,
    /// Anisotropy the rendering device supports; prepared textures use at most 16.
    pub max_anisotropy: u16,
    /// Catalog design loaded by `FloorPlanner::init`.
    pub default_tile: String,
    pub display: DisplayFormat,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            asset_base: "file:///".to_string(),
            max_anisotropy: 8,
            default_tile: "Modern Stone".to_string(),
            display: DisplayFormat::default(),
        }
    }
}

impl PlannerConfig {
    pub fn with_asset_base(mut self, base: impl Into<String>) -> Self {
        self.asset_base = base.into();
        self
    }

    pub fn with_max_anisotropy(mut self, max: u16) -> Self {
        self.max_anisotropy = max;
        self
    }

    pub fn with_default_tile(mut self, name: impl Into<String>) -> Self {
        self.default_tile = name.into();
        self
    }

    pub fn with_display(mut self, display: DisplayFormat) -> Self {
        self.display = display;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_absent() {
        let n = PlannerInputs::new().normalize();
        assert_eq!(n.room, RoomSpec { length_m: 5.0, width_m: 4.0 });
        assert_eq!(n.tile.length_cm, 60.0);
        assert_eq!(n.tile.width_cm, 60.0);
        assert_eq!(n.tile.grout_mm, 2.0);
        assert_eq!(n.tile.pattern, Pattern::Straight);
        assert_eq!(n.pricing.waste_percent, 8.0);
        assert_eq!(n.pricing.price_per_m2, 3500.0);
        assert_eq!(n.pricing.tiles_per_box, 6);
    }

    #[test]
    fn test_clamps() {
        let inputs = PlannerInputs::new()
            .with_room(0.1, -3.0)
            .with_tile(0.0, f64::NAN)
            .with_grout(-1.0)
            .with_waste(-5.0)
            .with_pricing(-10.0, 0.4);
        let n = inputs.normalize();
        assert_eq!(n.room.length_m, 0.5);
        assert_eq!(n.room.width_m, 0.5);
        assert_eq!(n.tile.length_cm, 1.0);
        assert_eq!(n.tile.width_cm, 60.0);
        assert_eq!(n.tile.grout_mm, 0.0);
        assert_eq!(n.pricing.waste_percent, 0.0);
        assert_eq!(n.pricing.price_per_m2, 0.0);
        assert_eq!(n.pricing.tiles_per_box, 1);
    }

    #[test]
    fn test_tiles_per_box_floors() {
        let n = PlannerInputs::new().with_pricing(100.0, 7.9).normalize();
        assert_eq!(n.pricing.tiles_per_box, 7);
    }

    #[test]
    fn test_set_named_fields() {
        let mut inputs = PlannerInputs::new();
        inputs.set_named("roomLen", "6.5").unwrap();
        inputs.set_named("tile_width", "30").unwrap();
        inputs.set_named("pattern", "Diagonal").unwrap();
        inputs.set_named("waste", "not a number").unwrap();
        assert!(inputs.set_named("ceiling", "3").is_err());

        let n = inputs.normalize();
        assert_eq!(n.room.length_m, 6.5);
        assert_eq!(n.tile.width_cm, 30.0);
        assert_eq!(n.tile.pattern, Pattern::Diagonal);
        assert_eq!(n.pricing.waste_percent, 8.0);
    }

    #[test]
    fn test_unknown_pattern_is_straight() {
        let mut inputs = PlannerInputs::new();
        inputs.set_field(InputField::Pattern, "herringbone");
        assert_eq!(inputs.normalize().tile.pattern, Pattern::Straight);
        assert!("herringbone".parse::<Pattern>().is_err());
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in InputField::ALL {
            assert_eq!(InputField::from_name(field.form_id()), Some(field));
        }
    }

    #[test]
    fn test_json_uses_form_ids() {
        let inputs = PlannerInputs::from_json(
            r#"{"roomLen": 6, "roomWid": "3,5", "tile_width": 30, "waste": null,
                "perBox": true, "pattern": "herringbone"}"#,
        )
        .unwrap();
        assert_eq!(inputs.room_length_m, Some(6.0));
        assert_eq!(inputs.room_width_m, Some(3.5));
        assert_eq!(inputs.tile_width_cm, Some(30.0));
        assert_eq!(inputs.waste_percent, None);
        assert_eq!(inputs.tiles_per_box, None);
        assert_eq!(inputs.pattern, Some(Pattern::Straight));

        let json = serde_json::to_string(&PlannerInputs::new().with_grout(3.0).with_pattern(Pattern::Diagonal)).unwrap();
        assert_eq!(json, r#"{"grout":3.0,"pattern":"diagonal"}"#);
    }

    #[test]
    fn test_json_non_string_pattern_is_straight() {
        for json in [r#"{"pattern": 1}"#, r#"{"pattern": true}"#, r#"{"pattern": {"kind": "diagonal"}}"#] {
            let inputs = PlannerInputs::from_json(json).unwrap();
            assert_eq!(inputs.pattern, Some(Pattern::Straight), "{json}");
        }
        let inputs = PlannerInputs::from_json(r#"{"pattern": null, "roomLen": 3}"#).unwrap();
        assert_eq!(inputs.pattern, None);
        assert_eq!(inputs.room_length_m, Some(3.0));
    }

    #[test]
    fn test_json_rejects_malformed() {
        assert!(matches!(PlannerInputs::from_json("{roomLen"), Err(PlannerError::Json(_))));
        assert!(matches!(
            PlannerInputs::from_path("/nonexistent/inputs.json"),
            Err(PlannerError::Io(_))
        ));
    }

    #[test]
    fn test_pattern_rotation() {
        assert_eq!(Pattern::Straight.rotation(), 0.0);
        assert_eq!(Pattern::Diagonal.rotation(), std::f64::consts::FRAC_PI_4);
    }
}
