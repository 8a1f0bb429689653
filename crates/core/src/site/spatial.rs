//! Bilinear interpolation of a grid cell to an arbitrary site
//!
//! Two sequential linear interpolations: first along latitude at each of the
//! two longitude edges, then along longitude between those results.
//!
//! ```text
//!   HighLatLowLon ●───────────● HighLatHighLon
//!                 │           │
//!           a ────┼──── × ────┼──── b      a, b: latitude pass (x_frac)
//!                 │   site    │            ×:    longitude pass (y_frac)
//!    LowLatLowLon ●───────────● LowLatHighLon
//! ```
//!
//! # Direction limitation
//!
//! Directions are interpolated as plain scalars. Across the 0°/360° seam this
//! is wrong (350° and 10° average to 180°, not 0°); the result is only
//! meaningful when the four corner directions are close together, which holds
//! for neighboring 0.25° reanalysis points most of the time.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::grid::{Corner, GridCell, CELL_SIZE_DEG};
use crate::error::{Result, YieldError};

/// Wind series at an interpolated site, both reference heights
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolatedSite {
    /// Site latitude (degrees north)
    pub latitude: f64,
    /// Site longitude (degrees east)
    pub longitude: f64,
    /// Valid times shared with the source cell
    pub timestamps: Vec<NaiveDateTime>,
    /// Speed at 10 m (m/s)
    pub speed_10m: Vec<f64>,
    /// Speed at 100 m (m/s)
    pub speed_100m: Vec<f64>,
    /// Direction at 10 m (degrees)
    pub direction_10m: Vec<f64>,
    /// Direction at 100 m (degrees)
    pub direction_100m: Vec<f64>,
}

impl InterpolatedSite {
    /// Number of rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the site series has no rows
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}

/// Bilinear interpolator over one regular lat/lon cell
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialInterpolator {
    /// Lattice spacing in both axes (degrees)
    pub cell_size: f64,
}

impl Default for SpatialInterpolator {
    fn default() -> Self {
        Self {
            cell_size: CELL_SIZE_DEG,
        }
    }
}

impl SpatialInterpolator {
    /// Create an interpolator for a lattice of the given spacing
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `cell_size` is not finite and positive.
    pub fn new(cell_size: f64) -> Result<Self> {
        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "cell_size",
                format!("must be finite and positive, got {cell_size}"),
            ));
        }
        Ok(Self { cell_size })
    }

    /// Normalized offsets `(x_frac, y_frac)` of a site within the cell
    ///
    /// `x_frac` runs along latitude, `y_frac` along longitude; both are in
    /// [0, 1] inside the cell and outside it otherwise.
    ///
    /// # Errors
    /// Returns `InvalidParameter` for non-finite coordinates.
    pub fn fractions(&self, cell: &GridCell, lat: f64, lon: f64) -> Result<(f64, f64)> {
        if !lat.is_finite() || !lon.is_finite() {
            return Err(YieldError::invalid_parameter(
                "site",
                format!("coordinates must be finite, got ({lat}, {lon})"),
            ));
        }
        let x_frac = (lat - cell.lat_low()) / self.cell_size;
        let y_frac = (lon - cell.lon_low()) / self.cell_size;
        Ok((x_frac, y_frac))
    }

    /// Interpolate all four corner series to the site `(lat, lon)`
    ///
    /// Sites outside the cell are extrapolated linearly and logged as a
    /// warning; the caller decides whether that is acceptable.
    ///
    /// # Errors
    /// Returns `MisalignedSeries` if the corner series do not share one
    /// timestamp sequence, `InvalidParameter` for non-finite coordinates.
    pub fn interpolate(&self, cell: &GridCell, lat: f64, lon: f64) -> Result<InterpolatedSite> {
        let (x_frac, y_frac) = self.fractions(cell, lat, lon)?;
        if !(0.0..=1.0).contains(&x_frac) || !(0.0..=1.0).contains(&y_frac) {
            warn!(
                lat,
                lon, x_frac, y_frac, "Site lies outside the grid cell; extrapolating linearly"
            );
        }

        check_alignment(cell)?;

        let sw = cell.corner(Corner::LowLatLowLon);
        let se = cell.corner(Corner::LowLatHighLon);
        let nw = cell.corner(Corner::HighLatLowLon);
        let ne = cell.corner(Corner::HighLatHighLon);

        let site = InterpolatedSite {
            latitude: lat,
            longitude: lon,
            timestamps: sw.timestamps.clone(),
            speed_10m: blend_columns(
                [&sw.speed_10m, &se.speed_10m, &nw.speed_10m, &ne.speed_10m],
                x_frac,
                y_frac,
            ),
            speed_100m: blend_columns(
                [&sw.speed_100m, &se.speed_100m, &nw.speed_100m, &ne.speed_100m],
                x_frac,
                y_frac,
            ),
            direction_10m: blend_columns(
                [
                    &sw.direction_10m,
                    &se.direction_10m,
                    &nw.direction_10m,
                    &ne.direction_10m,
                ],
                x_frac,
                y_frac,
            ),
            direction_100m: blend_columns(
                [
                    &sw.direction_100m,
                    &se.direction_100m,
                    &nw.direction_100m,
                    &ne.direction_100m,
                ],
                x_frac,
                y_frac,
            ),
        };

        debug!(lat, lon, rows = site.len(), "Interpolated site series");
        Ok(site)
    }
}

/// Row-wise bilinear blend of four aligned corner columns (sw, se, nw, ne)
fn blend_columns([sw, se, nw, ne]: [&[f64]; 4], x_frac: f64, y_frac: f64) -> Vec<f64> {
    sw.iter()
        .zip(se)
        .zip(nw)
        .zip(ne)
        .map(|(((&a, &b), &c), &d)| bilinear(a, b, c, d, x_frac, y_frac))
        .collect()
}

/// Bilinear blend of corner values
///
/// `sw`/`se`/`nw`/`ne` are the low/high latitude × low/high longitude corners.
/// The weighted form reproduces corner values exactly at fractions 0 and 1.
#[inline]
fn bilinear(sw: f64, se: f64, nw: f64, ne: f64, x_frac: f64, y_frac: f64) -> f64 {
    let at_low_lon = lerp(sw, nw, x_frac);
    let at_high_lon = lerp(se, ne, x_frac);
    lerp(at_low_lon, at_high_lon, y_frac)
}

#[inline]
pub(crate) fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Verify every corner carries the reference corner's timestamps
fn check_alignment(cell: &GridCell) -> Result<()> {
    let reference = cell.corner(Corner::LowLatLowLon);

    for corner in Corner::ALL {
        let series = cell.corner(corner);

        if let Some(row) = series.ragged_len() {
            return Err(YieldError::MisalignedSeries {
                corner,
                row,
                reason: "value columns differ in length from the timestamp column".to_string(),
            });
        }

        if let Some(row) = reference
            .timestamps
            .iter()
            .zip(&series.timestamps)
            .position(|(a, b)| a != b)
        {
            return Err(YieldError::MisalignedSeries {
                corner,
                row,
                reason: format!(
                    "timestamp {} differs from reference {}",
                    series.timestamps[row], reference.timestamps[row]
                ),
            });
        }

        if series.len() != reference.len() {
            return Err(YieldError::MisalignedSeries {
                corner,
                row: series.len().min(reference.len()),
                reason: format!(
                    "{} rows, reference corner has {}",
                    series.len(),
                    reference.len()
                ),
            });
        }
    }
    Ok(())
}
