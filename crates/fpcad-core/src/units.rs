//! Unit-tagged numbers.
//!
//! All geometry is computed in internal units (1 iu = 1 mil); user-facing
//! values carry their unit and are converted at the boundary.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A linear unit with a fixed ratio to internal units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    /// Internal units (mils).
    #[serde(rename = "iu")]
    Iu,
    #[serde(rename = "mil", alias = "mils")]
    Mil,
    #[serde(rename = "in", alias = "inch", alias = "inches")]
    Inch,
    #[serde(rename = "mm")]
    Mm,
    #[serde(rename = "cm")]
    Cm,
}

impl Unit {
    /// Internal units per one of this unit.
    pub fn ratio(self) -> f64 {
        match self {
            Unit::Iu | Unit::Mil => 1.0,
            Unit::Inch => 1000.0,
            Unit::Mm => 39.370078740157,
            Unit::Cm => 393.70078740157,
        }
    }

    /// Parse a unit suffix such as "mm" or "inches".
    pub fn parse(s: &str) -> Option<Unit> {
        match s {
            "iu" => Some(Unit::Iu),
            "mil" | "mils" => Some(Unit::Mil),
            "in" | "inch" | "inches" => Some(Unit::Inch),
            "mm" => Some(Unit::Mm),
            "cm" => Some(Unit::Cm),
            _ => None,
        }
    }

    /// Canonical suffix for display and serialization.
    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Iu => "iu",
            Unit::Mil => "mil",
            Unit::Inch => "in",
            Unit::Mm => "mm",
            Unit::Cm => "cm",
        }
    }
}

/// A numeric value tagged with its unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitNumber {
    pub value: f64,
    pub unit: Unit,
}

impl UnitNumber {
    pub fn new(value: f64, unit: Unit) -> Self {
        Self { value, unit }
    }

    /// Convert to another unit.
    pub fn to(self, unit: Unit) -> f64 {
        self.value * self.unit.ratio() / unit.ratio()
    }

    /// Convert to internal units (the solver boundary).
    pub fn to_iu(self) -> f64 {
        self.value * self.unit.ratio()
    }

    /// Parse strings like "12.5 mm", "12.5mm", or a bare number with a
    /// default unit. A trailing-suffix scan handles the unspaced form.
    pub fn parse(s: &str, default_unit: Option<Unit>) -> Result<UnitNumber> {
        let s = s.trim();
        let parts: Vec<&str> = s.split_whitespace().collect();
        match parts.len() {
            2 => {
                let value: f64 = parts[0]
                    .parse()
                    .map_err(|_| Error::InvalidUnit(s.to_string()))?;
                let unit =
                    Unit::parse(parts[1]).ok_or_else(|| Error::InvalidUnit(s.to_string()))?;
                return Ok(UnitNumber::new(value, unit));
            }
            1 => {}
            _ => return Err(Error::InvalidUnit(s.to_string())),
        }

        if let Some(unit) = default_unit {
            if let Ok(value) = s.parse::<f64>() {
                return Ok(UnitNumber::new(value, unit));
            }
        }
        // Scan for the longest numeric prefix with a known unit suffix.
        for i in (0..s.len()).rev() {
            if !s.is_char_boundary(i) {
                continue;
            }
            let (num, suffix) = s.split_at(i);
            let Some(unit) = Unit::parse(suffix) else {
                continue;
            };
            if let Ok(value) = num.trim().parse::<f64>() {
                return Ok(UnitNumber::new(value, unit));
            }
        }
        Err(Error::InvalidUnit(s.to_string()))
    }
}

impl fmt::Display for UnitNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit.suffix())
    }
}
