//! Semantic unit types for wind-resource quantities
//!
//! Newtype wrappers keep turbine parameters from being mixed up (a hub height
//! passed where a cut-out speed is expected, kW where m/s is expected).
//!
//! # Design Philosophy
//! - All types wrap `f64`: energy integrals accumulate over tens of thousands
//!   of hourly samples and the extra precision is free on the hot path
//! - Total ordering via `Ord` (NaN sorts above all values)
//! - `Deref` to the raw value so formulas read naturally
//! - Serde support, serialized as the bare number and validated on the way in
//!
//! # Usage
//! ```
//! use wind_yield_core::core_types::units::{Kilowatts, MetersPerSecond};
//!
//! let rated = Kilowatts::new(5000.0);
//! let v_rated = MetersPerSecond::new(11.4);
//! assert!(*rated > *v_rated);
//! assert_eq!(rated.to_megawatts(), 5.0);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Deref, Mul};

use crate::error::YieldError;

/// Compare f64 values with total ordering using Rust's built-in `total_cmp`
#[inline]
fn f64_total_cmp(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}

// ============================================================================
// SPEED
// ============================================================================

/// Wind speed in meters per second
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
#[repr(transparent)]
pub struct MetersPerSecond(f64);

impl Eq for MetersPerSecond {}

impl PartialOrd for MetersPerSecond {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetersPerSecond {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for MetersPerSecond {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl MetersPerSecond {
    /// Calm air
    pub const ZERO: MetersPerSecond = MetersPerSecond(0.0);

    /// Create a new wind speed. Asserts the value is finite and non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value >= 0.0,
            "MetersPerSecond::new: wind speed must be finite and non-negative"
        );
        MetersPerSecond(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for MetersPerSecond {
    type Error = YieldError;

    fn try_from(value: f64) -> Result<Self, YieldError> {
        if value.is_finite() && value >= 0.0 {
            Ok(MetersPerSecond(value))
        } else {
            Err(YieldError::invalid_parameter(
                "MetersPerSecond",
                format!("wind speed must be finite and non-negative, got {value}"),
            ))
        }
    }
}

impl From<MetersPerSecond> for f64 {
    fn from(v: MetersPerSecond) -> f64 {
        v.0
    }
}

impl fmt::Display for MetersPerSecond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} m/s", self.0)
    }
}

// ============================================================================
// LENGTH
// ============================================================================

/// Length in meters (heights above ground, rotor diameters)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
#[repr(transparent)]
pub struct Meters(f64);

impl Eq for Meters {}

impl PartialOrd for Meters {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Meters {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Meters {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Meters {
    /// Create a new length in meters. Asserts the value is finite and non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value >= 0.0,
            "Meters::new: length must be finite and non-negative"
        );
        Meters(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Meters {
    type Error = YieldError;

    fn try_from(value: f64) -> Result<Self, YieldError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Meters(value))
        } else {
            Err(YieldError::invalid_parameter(
                "Meters",
                format!("length must be finite and non-negative, got {value}"),
            ))
        }
    }
}

impl From<Meters> for f64 {
    fn from(m: Meters) -> f64 {
        m.0
    }
}

impl fmt::Display for Meters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} m", self.0)
    }
}

// ============================================================================
// POWER
// ============================================================================

/// Electrical power in kilowatts
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
#[repr(transparent)]
pub struct Kilowatts(f64);

impl Eq for Kilowatts {}

impl PartialOrd for Kilowatts {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Kilowatts {
    fn cmp(&self, other: &Self) -> Ordering {
        f64_total_cmp(self.0, other.0)
    }
}

impl Deref for Kilowatts {
    type Target = f64;
    #[inline]
    fn deref(&self) -> &f64 {
        &self.0
    }
}

impl Kilowatts {
    /// Create a new power value. Asserts the value is finite and non-negative.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new(value: f64) -> Self {
        assert!(
            value.is_finite() && value >= 0.0,
            "Kilowatts::new: power must be finite and non-negative"
        );
        Kilowatts(value)
    }

    /// Get the raw f64 value
    #[inline]
    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Convert to megawatts
    #[inline]
    #[must_use]
    pub fn to_megawatts(self) -> f64 {
        self.0 / 1000.0
    }
}

impl TryFrom<f64> for Kilowatts {
    type Error = YieldError;

    fn try_from(value: f64) -> Result<Self, YieldError> {
        if value.is_finite() && value >= 0.0 {
            Ok(Kilowatts(value))
        } else {
            Err(YieldError::invalid_parameter(
                "Kilowatts",
                format!("power must be finite and non-negative, got {value}"),
            ))
        }
    }
}

impl From<Kilowatts> for f64 {
    fn from(p: Kilowatts) -> f64 {
        p.0
    }
}

// Power sustained for a number of hours = energy in kWh
impl Mul<f64> for Kilowatts {
    type Output = f64;
    fn mul(self, hours: f64) -> f64 {
        self.0 * hours
    }
}

impl fmt::Display for Kilowatts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0} kW", self.0)
    }
}

// ============================================================================
// BEARING
// ============================================================================

/// Wrap any angle in degrees into [0, 360)
#[inline]
pub(crate) fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
