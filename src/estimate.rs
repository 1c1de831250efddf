// src/estimate.rs
//! Tile quantity and cost estimate.
//!
//! The estimate uses the nominal tile area. Grout only changes the rendered
//! layout, never the counts.

use std::fmt;

use serde::Serialize;

use crate::config::{DisplayFormat, PricingSpec, RoomSpec, TileSpec};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Estimate {
    pub area_m2: f64,
    pub tile_area_m2: f64,
    /// Tiles covering the area before waste.
    pub base_tiles: u64,
    pub tiles_needed: u64,
    pub boxes: u64,
    pub cost: u64,
}

/// Inputs are expected to be normalized already; nothing is validated here.
/// Counts and cost saturate at `u64::MAX`.
pub fn estimate(room: &RoomSpec, tile: &TileSpec, pricing: &PricingSpec) -> Estimate {
    let area_m2 = room.length_m * room.width_m;
    let tile_area_m2 = (tile.length_cm / 100.0) * (tile.width_cm / 100.0);

    let base_tiles = (area_m2 / tile_area_m2).ceil();
    let tiles_needed = (base_tiles * (1.0 + pricing.waste_percent / 100.0)).ceil();
    let boxes = (tiles_needed / pricing.tiles_per_box as f64).ceil();
    let cost = (area_m2 * pricing.price_per_m2).round();

    Estimate {
        area_m2,
        tile_area_m2,
        base_tiles: base_tiles as u64,
        tiles_needed: tiles_needed as u64,
        boxes: boxes as u64,
        cost: cost as u64,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output surface
// ─────────────────────────────────────────────────────────────────────────────

/// The four strings shown next to the 3D view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateReport {
    pub area: String,
    pub tiles: String,
    pub boxes: String,
    pub cost: String,
}

impl EstimateReport {
    pub fn new(estimate: &Estimate, format: &DisplayFormat) -> Self {
        Self {
            area: format!("{:.2} m²", estimate.area_m2),
            tiles: group_thousands(estimate.tiles_needed, format.thousands_separator),
            boxes: estimate.boxes.to_string(),
            cost: format!(
                "{} {}",
                group_thousands(estimate.cost, format.thousands_separator),
                format.currency
            ),
        }
    }
}

impl fmt::Display for EstimateReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Area:  {}", self.area)?;
        writeln!(f, "Tiles: {}", self.tiles)?;
        writeln!(f, "Boxes: {}", self.boxes)?;
        write!(f, "Cost:  {}", self.cost)
    }
}

/// `1234567` → `1.234.567` with `sep = '.'`.
pub fn group_thousands(value: u64, sep: char) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}
