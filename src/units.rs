// src/units.rs
//! Unit conversion for planner input.
//!
//! Everything here is total: missing, unparsable or non-finite values fall
//! back to a default and negative values are clamped to zero. Per-field floors
//! (room ≥ 0.5 m, box count ≥ 1, ...) are applied by the caller.

/// Smallest step/repeat the planner will divide by.
pub const EPSILON: f64 = 1e-6;

/// Physical unit of a raw input value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Meters,
    Centimeters,
    Millimeters,
    /// Converted to a ratio (`8 %` → `0.08`).
    Percent,
}

impl Unit {
    /// Multiplier from this unit to meters (or to a ratio for `Percent`).
    #[inline]
    pub fn factor(self) -> f64 {
        match self {
            Unit::Meters => 1.0,
            Unit::Centimeters => 0.01,
            Unit::Millimeters => 0.001,
            Unit::Percent => 0.01,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw numbers
// ─────────────────────────────────────────────────────────────────────────────

/// Anything a form field can hand us: numbers, numeric strings, or nothing.
pub trait RawNumber {
    /// The parsed value, `None` when missing or unparsable. May be non-finite.
    fn as_number(&self) -> Option<f64>;
}

impl RawNumber for f64 {
    fn as_number(&self) -> Option<f64> {
        Some(*self)
    }
}

impl RawNumber for f32 {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl RawNumber for u32 {
    fn as_number(&self) -> Option<f64> {
        Some(*self as f64)
    }
}

impl RawNumber for str {
    fn as_number(&self) -> Option<f64> {
        let trimmed = self.trim();
        if trimmed.is_empty() {
            return None;
        }
        // Accept a decimal comma, forms in sr-RS locale send "2,5".
        trimmed.replace(',', ".").parse::<f64>().ok()
    }
}

impl RawNumber for String {
    fn as_number(&self) -> Option<f64> {
        self.as_str().as_number()
    }
}

impl<T: RawNumber + ?Sized> RawNumber for &T {
    fn as_number(&self) -> Option<f64> {
        (**self).as_number()
    }
}

impl<T: RawNumber> RawNumber for Option<T> {
    fn as_number(&self) -> Option<f64> {
        self.as_ref().and_then(RawNumber::as_number)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Conversions
// ─────────────────────────────────────────────────────────────────────────────

/// `value` if it parses to a finite number, otherwise `fallback`.
#[inline]
pub fn finite_or<V: RawNumber + ?Sized>(value: &V, fallback: f64) -> f64 {
    match value.as_number() {
        Some(v) if v.is_finite() => v,
        _ => fallback,
    }
}

/// Raises `value` to `floor`. NaN collapses to `floor` as well.
#[inline]
pub fn clamp_min(value: f64, floor: f64) -> f64 {
    if value >= floor {
        value
    } else {
        floor
    }
}

/// Converts a raw value in `unit` to meters. `fallback` is in `unit` too.
pub fn to_meters<V: RawNumber + ?Sized>(value: &V, unit: Unit, fallback: f64) -> f64 {
    let raw = finite_or(value, fallback);
    let raw = if raw.is_finite() { raw } else { 0.0 };
    clamp_min(raw, 0.0) * unit.factor()
}

/// Positive step or `EPSILON`.
#[inline]
pub fn safe_step(v: f64) -> f64 {
    if v.is_finite() && v > EPSILON {
        v
    } else {
        EPSILON
    }
}

/// Real-world repeat period of a tile along one axis: tile plus one grout joint.
pub fn effective_step_meters(tile_dimension_cm: f64, grout_mm: f64) -> f64 {
    let tile = to_meters(&tile_dimension_cm, Unit::Centimeters, 0.0);
    let grout = to_meters(&grout_mm, Unit::Millimeters, 0.0);
    safe_step(tile + grout)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_meters_units() {
        assert!((to_meters(&60.0, Unit::Centimeters, 0.0) - 0.6).abs() < 1e-12);
        assert!((to_meters(&2.0, Unit::Millimeters, 0.0) - 0.002).abs() < 1e-12);
        assert_eq!(to_meters(&5.0, Unit::Meters, 0.0), 5.0);
        assert!((to_meters(&8.0, Unit::Percent, 0.0) - 0.08).abs() < 1e-12);
    }

    #[test]
    fn test_to_meters_fallbacks() {
        assert_eq!(to_meters(&f64::NAN, Unit::Meters, 5.0), 5.0);
        assert_eq!(to_meters(&f64::INFINITY, Unit::Meters, 4.0), 4.0);
        assert_eq!(to_meters("", Unit::Meters, 4.0), 4.0);
        assert_eq!(to_meters("abc", Unit::Meters, 4.0), 4.0);
        assert_eq!(to_meters(&None::<f64>, Unit::Meters, 3.0), 3.0);
        assert_eq!(to_meters(&-2.0, Unit::Meters, 3.0), 0.0);
        assert_eq!(to_meters(&1.0, Unit::Meters, f64::NAN), 1.0);
        assert_eq!(to_meters(&f64::NAN, Unit::Meters, f64::NAN), 0.0);
    }

    #[test]
    fn test_raw_strings() {
        assert_eq!(" 2.5 ".as_number(), Some(2.5));
        assert_eq!("2,5".as_number(), Some(2.5));
        assert_eq!(String::from("12").as_number(), Some(12.0));
        assert_eq!("".as_number(), None);
        assert_eq!(Some("7").as_number(), Some(7.0));
    }

    #[test]
    fn test_clamp_min() {
        assert_eq!(clamp_min(0.2, 0.5), 0.5);
        assert_eq!(clamp_min(3.0, 0.5), 3.0);
        assert_eq!(clamp_min(f64::NAN, 1.0), 1.0);
    }

    #[test]
    fn test_effective_step_positive() {
        assert!((effective_step_meters(60.0, 2.0) - 0.602).abs() < 1e-12);
        assert_eq!(effective_step_meters(0.0, 0.0), EPSILON);
        assert_eq!(effective_step_meters(-10.0, -5.0), EPSILON);
        for cm in [0.0, 1e-9, 0.5, 1.0, 30.0, 120.0] {
            for mm in [0.0, 1e-9, 1.0, 3.0, 10.0] {
                assert!(effective_step_meters(cm, mm) > 0.0);
            }
        }
    }

    #[test]
    fn test_safe_step() {
        assert_eq!(safe_step(0.0), EPSILON);
        assert_eq!(safe_step(f64::NAN), EPSILON);
        assert_eq!(safe_step(-1.0), EPSILON);
        assert_eq!(safe_step(0.3), 0.3);
    }
}
