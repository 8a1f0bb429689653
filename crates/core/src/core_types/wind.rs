//! Reanalysis wind samples and component conversion
//!
//! Gridded reanalysis products store horizontal wind as eastward (`u`) and
//! northward (`v`) components at fixed heights. Everything downstream works in
//! speed and compass direction, so the conversion lives here together with an
//! explicit choice of direction convention.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::units::normalize_bearing;

/// Which way a compass direction points
///
/// Reanalysis components describe where the air is moving *to*; wind roses and
/// site reports quote where it comes *from*. The two differ by 180°.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DirectionConvention {
    /// Meteorological convention: bearing the wind blows from
    #[default]
    From,
    /// Oceanographic convention: bearing the wind blows towards
    Towards,
}

/// Horizontal wind components at one height (m/s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindComponents {
    /// Eastward component
    pub u: f64,
    /// Northward component
    pub v: f64,
}

impl WindComponents {
    /// Create components from eastward and northward values
    pub fn new(u: f64, v: f64) -> Self {
        Self { u, v }
    }

    /// Horizontal wind speed `sqrt(u² + v²)`
    #[inline]
    pub fn speed(&self) -> f64 {
        self.u.hypot(self.v)
    }

    /// Compass direction in degrees, 0 = North, clockwise, in [0, 360)
    ///
    /// Calm air (u = v = 0) maps to 0° for `Towards` and 180° for `From`,
    /// which is what `atan2(0, 0) = 0` gives; callers that care should
    /// filter on speed first.
    #[inline]
    pub fn direction(&self, convention: DirectionConvention) -> f64 {
        let towards = self.u.atan2(self.v).to_degrees();
        match convention {
            DirectionConvention::Towards => normalize_bearing(towards),
            DirectionConvention::From => normalize_bearing(towards + 180.0),
        }
    }

    /// Build components from a speed and a compass direction
    pub fn from_speed_direction(speed: f64, direction: f64, convention: DirectionConvention) -> Self {
        let towards = match convention {
            DirectionConvention::Towards => direction,
            DirectionConvention::From => direction + 180.0,
        }
        .to_radians();
        Self {
            u: speed * towards.sin(),
            v: speed * towards.cos(),
        }
    }
}

/// One reanalysis record for a single grid point and time
///
/// Carries the components at both reference heights (10 m and 100 m) because
/// the source files deliver them together per row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// Valid time of the record (UTC)
    pub timestamp: NaiveDateTime,
    /// Grid point latitude (degrees north)
    pub latitude: f64,
    /// Grid point longitude (degrees east)
    pub longitude: f64,
    /// Components at 10 m
    pub at_10m: WindComponents,
    /// Components at 100 m
    pub at_100m: WindComponents,
}
