//! Vertical extrapolation with the wind power law
//!
//! Wind speed grows with height above ground. With speeds known at two
//! reference heights `z1 < z2`, the shear exponent
//!
//! ```text
//! α = ln(u(z2) / u(z1)) / ln(z2 / z1)
//! ```
//!
//! fixes the profile `u(h) = u(z) · (h / z)^α` for any hub height `h`, where
//! `z` is the reference height nearer to `h` (the lower one for `h ≤ z1`).
//! Anchoring on the nearer reference returns both reference speeds bit for
//! bit. The exponent is computed per row, so stable nights and mixed
//! afternoons each get their own shear.
//!
//! Direction is linearly interpolated between the reference heights (and
//! extrapolated below `z1`). Above `z2` the upper direction is held: veer
//! is not modeled beyond the data.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::spatial::{lerp, InterpolatedSite};
use crate::error::{Result, YieldError};

/// Lower reference height of the reanalysis product (m)
pub const REFERENCE_HEIGHT_LOW: f64 = 10.0;

/// Upper reference height of the reanalysis product (m)
pub const REFERENCE_HEIGHT_HIGH: f64 = 100.0;

/// Wind series at a caller-chosen height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeightAdjustedSeries {
    /// Target height above ground (m)
    pub height: f64,
    /// Valid times shared with the site series
    pub timestamps: Vec<NaiveDateTime>,
    /// Speed at the target height (m/s)
    pub speed: Vec<f64>,
    /// Direction at the target height (degrees)
    pub direction: Vec<f64>,
    /// Shear exponent α used for each row
    pub shear_exponent: Vec<f64>,
}

impl HeightAdjustedSeries {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series has no rows
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Mean speed over all rows (m/s), NaN for an empty series
    pub fn mean_speed(&self) -> f64 {
        self.speed.iter().sum::<f64>() / self.speed.len() as f64
    }

    /// Mean shear exponent over all rows, NaN for an empty series
    pub fn mean_shear_exponent(&self) -> f64 {
        self.shear_exponent.iter().sum::<f64>() / self.shear_exponent.len() as f64
    }
}

/// Power-law extrapolator between two fixed reference heights
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VerticalExtrapolator {
    /// Lower reference height z1 (m)
    pub lower_height: f64,
    /// Upper reference height z2 (m)
    pub upper_height: f64,
}

impl Default for VerticalExtrapolator {
    fn default() -> Self {
        Self {
            lower_height: REFERENCE_HEIGHT_LOW,
            upper_height: REFERENCE_HEIGHT_HIGH,
        }
    }
}

impl VerticalExtrapolator {
    /// Create an extrapolator for reference heights `z1 < z2`
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless `0 < lower_height < upper_height`,
    /// both finite.
    pub fn new(lower_height: f64, upper_height: f64) -> Result<Self> {
        if !lower_height.is_finite() || lower_height <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "lower_height",
                format!("must be finite and positive, got {lower_height}"),
            ));
        }
        if !upper_height.is_finite() || upper_height <= lower_height {
            return Err(YieldError::invalid_parameter(
                "upper_height",
                format!("must be finite and above {lower_height}, got {upper_height}"),
            ));
        }
        Ok(Self {
            lower_height,
            upper_height,
        })
    }

    /// Shear exponent α from the speeds at the two reference heights
    ///
    /// `None` when either speed is non-positive or non-finite.
    #[inline]
    pub fn shear_exponent(&self, lower_speed: f64, upper_speed: f64) -> Option<f64> {
        let valid = |u: f64| u.is_finite() && u > 0.0;
        if !valid(lower_speed) || !valid(upper_speed) {
            return None;
        }
        Some((upper_speed / lower_speed).ln() / (self.upper_height / self.lower_height).ln())
    }

    /// Speed at `height` from exponent α, anchored on the nearer reference
    #[inline]
    pub fn speed_at(&self, lower_speed: f64, upper_speed: f64, alpha: f64, height: f64) -> f64 {
        if height <= self.lower_height {
            lower_speed * (height / self.lower_height).powf(alpha)
        } else {
            upper_speed * (height / self.upper_height).powf(alpha)
        }
    }

    /// Direction at `height` from the directions at the reference heights
    #[inline]
    pub fn direction_at(&self, lower_direction: f64, upper_direction: f64, height: f64) -> f64 {
        if height <= self.upper_height {
            let fraction = (height - self.lower_height) / (self.upper_height - self.lower_height);
            lerp(lower_direction, upper_direction, fraction)
        } else {
            upper_direction
        }
    }

    /// Extrapolate a site series to `height`
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `height` is not finite and positive, and
    /// `ExtrapolationUndefined` for the first row whose reference speeds do
    /// not admit a shear exponent (zero, negative or non-finite).
    pub fn extrapolate(&self, site: &InterpolatedSite, height: f64) -> Result<HeightAdjustedSeries> {
        if !height.is_finite() || height <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "height",
                format!("must be finite and positive, got {height}"),
            ));
        }

        let n = site.len();
        if [
            site.speed_10m.len(),
            site.speed_100m.len(),
            site.direction_10m.len(),
            site.direction_100m.len(),
        ]
        .iter()
        .any(|&len| len != n)
        {
            return Err(YieldError::invalid_parameter(
                "site",
                format!("value columns differ in length from the {n} timestamps"),
            ));
        }

        let mut speed = Vec::with_capacity(n);
        let mut shear_exponent = Vec::with_capacity(n);
        for (row, (&lower, &upper)) in site.speed_10m.iter().zip(&site.speed_100m).enumerate() {
            let alpha = self.shear_exponent(lower, upper).ok_or(
                YieldError::ExtrapolationUndefined {
                    row,
                    lower_speed: lower,
                    upper_speed: upper,
                },
            )?;
            speed.push(self.speed_at(lower, upper, alpha, height));
            shear_exponent.push(alpha);
        }

        let direction = site
            .direction_10m
            .iter()
            .zip(&site.direction_100m)
            .map(|(&lower, &upper)| self.direction_at(lower, upper, height))
            .collect();

        debug!(height, rows = n, "Extrapolated site series to height");

        Ok(HeightAdjustedSeries {
            height,
            timestamps: site.timestamps.clone(),
            speed,
            direction,
            shear_exponent,
        })
    }
}
