//! Measured power-curve tables
//!
//! Manufacturer and reference-turbine curves are published as `(speed, power)`
//! tables. Between table points the output is linearly interpolated; outside
//! the table the boundary value is held (clamped), never extrapolated.

use serde::{Deserialize, Serialize};

use crate::error::{Result, YieldError};

/// Tabulated power curve, speeds strictly increasing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PowerCurveRecord")]
pub struct PowerCurve {
    speeds: Vec<f64>,
    powers: Vec<f64>,
}

#[derive(Deserialize)]
struct PowerCurveRecord {
    speeds: Vec<f64>,
    powers: Vec<f64>,
}

impl TryFrom<PowerCurveRecord> for PowerCurve {
    type Error = YieldError;

    fn try_from(raw: PowerCurveRecord) -> Result<Self> {
        if raw.speeds.len() != raw.powers.len() {
            return Err(YieldError::invalid_curve(format!(
                "{} speeds but {} powers",
                raw.speeds.len(),
                raw.powers.len()
            )));
        }
        PowerCurve::new(raw.speeds.into_iter().zip(raw.powers))
    }
}

impl PowerCurve {
    /// Build a curve from `(speed m/s, power kW)` pairs
    ///
    /// # Errors
    /// Returns `InvalidCurve` when fewer than two points are given, any value
    /// is non-finite, a power is negative, or speeds are not strictly
    /// increasing.
    pub fn new(points: impl IntoIterator<Item = (f64, f64)>) -> Result<Self> {
        let (speeds, powers): (Vec<f64>, Vec<f64>) = points.into_iter().unzip();

        if speeds.len() < 2 {
            return Err(YieldError::invalid_curve(format!(
                "need at least 2 points, got {}",
                speeds.len()
            )));
        }

        for (i, (&s, &p)) in speeds.iter().zip(&powers).enumerate() {
            if !s.is_finite() || !p.is_finite() {
                return Err(YieldError::invalid_curve(format!(
                    "point {i} is not finite: ({s}, {p})"
                )));
            }
            if p < 0.0 {
                return Err(YieldError::invalid_curve(format!(
                    "point {i} has negative power {p} kW"
                )));
            }
        }

        if let Some(i) = speeds.windows(2).position(|w| w[1] <= w[0]) {
            return Err(YieldError::invalid_curve(format!(
                "speeds must be strictly increasing: {} followed by {} at point {}",
                speeds[i],
                speeds[i + 1],
                i + 1
            )));
        }

        Ok(Self { speeds, powers })
    }

    /// Interpolated power at wind speed `v` (kW)
    ///
    /// Clamps to the first/last power outside the table. NaN in, NaN out.
    #[inline]
    pub fn power(&self, v: f64) -> f64 {
        if v.is_nan() {
            return f64::NAN;
        }
        let last = self.speeds.len() - 1;
        if v <= self.speeds[0] {
            return self.powers[0];
        }
        if v >= self.speeds[last] {
            return self.powers[last];
        }

        // First index with speed > v; v lies in [speeds[hi-1], speeds[hi])
        let hi = self.speeds.partition_point(|&s| s <= v);
        let lo = hi - 1;
        let (x0, x1) = (self.speeds[lo], self.speeds[hi]);
        let (y0, y1) = (self.powers[lo], self.powers[hi]);
        if v == x0 {
            return y0;
        }
        y0 + (y1 - y0) * (v - x0) / (x1 - x0)
    }

    /// Table speeds (m/s)
    pub fn speeds(&self) -> &[f64] {
        &self.speeds
    }

    /// Table powers (kW)
    pub fn powers(&self) -> &[f64] {
        &self.powers
    }

    /// Number of table points
    pub fn len(&self) -> usize {
        self.speeds.len()
    }

    /// Always false: construction rejects tables with fewer than two points
    pub fn is_empty(&self) -> bool {
        self.speeds.is_empty()
    }

    /// Largest tabulated power (kW)
    pub fn max_power(&self) -> f64 {
        self.powers.iter().copied().fold(0.0, f64::max)
    }

    /// Iterate over `(speed, power)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.speeds.iter().copied().zip(self.powers.iter().copied())
    }
}
