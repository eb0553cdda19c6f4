//! Unit interval value object (0.0-1.0 scale).

use serde::{Deserialize, Serialize};
use std::fmt;

/// A finite value between 0.0 and 1.0 inclusive.
///
/// Model output routinely overshoots ("strength": 1.4) or drifts negative,
/// so construction always clamps instead of failing. Non-finite input maps
/// to zero.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct UnitInterval(f64);

impl UnitInterval {
    /// Zero.
    pub const ZERO: Self = Self(0.0);

    /// One.
    pub const ONE: Self = Self(1.0);

    /// Creates a new value, clamping to [0, 1].
    pub fn new(value: f64) -> Self {
        if value.is_finite() {
            Self(value.clamp(0.0, 1.0))
        } else {
            Self::ZERO
        }
    }

    /// Returns the value as f64.
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Returns the value on a 0-100 scale, rounded.
    pub fn as_percent(&self) -> u8 {
        (self.0 * 100.0).round() as u8
    }
}

impl Default for UnitInterval {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<f64> for UnitInterval {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<UnitInterval> for f64 {
    fn from(value: UnitInterval) -> Self {
        value.0
    }
}

impl fmt::Display for UnitInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.as_percent())
    }
}
