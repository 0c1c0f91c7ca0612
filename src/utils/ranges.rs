//! Nitrogen amount parsing
//!
//! Table cells hold either a single figure ("150") or a range ("100-120",
//! "100 – 120"). Both are stored as a closed range; a single figure has
//! `min == max`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Nitrogen requirement in kg/ha
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NitrogenRange {
    pub min: f64,
    pub max: f64,
}

impl NitrogenRange {
    /// Range collapsed to one value
    pub fn single(value: f64) -> Self {
        Self { min: value, max: value }
    }

    /// Validated range: both bounds finite, non-negative and ordered
    pub fn new(min: f64, max: f64) -> Option<Self> {
        if is_valid_amount(min) && is_valid_amount(max) && min <= max {
            Some(Self { min, max })
        } else {
            None
        }
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn is_single(&self) -> bool {
        self.min == self.max
    }
}

impl fmt::Display for NitrogenRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", format_amount(self.min))
        } else {
            write!(f, "{}-{}", format_amount(self.min), format_amount(self.max))
        }
    }
}

fn is_valid_amount(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Print whole numbers without a trailing ".0"
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

/// Parse a single non-negative amount
pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_matches('"')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| is_valid_amount(*v))
}

/// Parse a single amount or a `min-max` range
///
/// Accepts a hyphen or an en dash as separator, with optional spaces.
pub fn parse_range(raw: &str) -> Option<NitrogenRange> {
    let cell = raw.trim().trim_matches('"').trim();

    if let Some(value) = parse_amount(cell) {
        return Some(NitrogenRange::single(value));
    }

    let (low, high) = cell.split_once(|c| c == '-' || c == '–')?;
    NitrogenRange::new(parse_amount(low)?, parse_amount(high)?)
}
