//! Wind-rose frequency table
//!
//! Joint frequency of (direction sector, speed bin). Sector 0 is centered on
//! North, so with 16 sectors it spans `[348.75°, 11.25°)`.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_types::units::normalize_bearing;
use crate::error::{Result, YieldError};

/// Sector and speed-bin layout of a wind rose
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindRose {
    /// Number of direction sectors
    pub sectors: usize,
    /// Width of each closed speed bin (m/s)
    pub bin_width: f64,
    /// Lower edge of the open top bin (m/s)
    pub max_speed: f64,
}

impl Default for WindRose {
    fn default() -> Self {
        Self {
            sectors: 16,
            bin_width: 5.0,
            max_speed: 25.0,
        }
    }
}

/// Tabulated wind rose
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindRoseTable {
    /// Sector center bearings (degrees)
    pub sector_centers: Vec<f64>,
    /// Lower speed edge of each bin (m/s); the last bin is open above
    pub speed_edges: Vec<f64>,
    /// `frequencies[sector][bin]`, summing to one over the table
    pub frequencies: Vec<Vec<f64>>,
    /// Number of (speed, direction) pairs tabulated
    pub samples: usize,
}

impl WindRoseTable {
    /// Total frequency of each sector
    pub fn sector_totals(&self) -> Vec<f64> {
        self.frequencies.iter().map(|row| row.iter().sum()).collect()
    }

    /// Center bearing of the most frequent sector
    pub fn prevailing_direction(&self) -> Option<f64> {
        self.sector_totals()
            .iter()
            .zip(&self.sector_centers)
            .max_by(|a, b| a.0.total_cmp(b.0))
            .map(|(_, &center)| center)
    }
}

impl WindRose {
    /// Create a layout
    ///
    /// # Errors
    /// Returns `InvalidParameter` for zero sectors, a non-positive bin width,
    /// or a top edge that is not a positive multiple of the bin width.
    pub fn new(sectors: usize, bin_width: f64, max_speed: f64) -> Result<Self> {
        if sectors == 0 {
            return Err(YieldError::invalid_parameter(
                "sectors",
                "must be at least 1",
            ));
        }
        if !bin_width.is_finite() || bin_width <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "bin_width",
                format!("must be finite and positive, got {bin_width}"),
            ));
        }
        let bins = max_speed / bin_width;
        if !bins.is_finite() || bins < 1.0 || (bins - bins.round()).abs() > 1e-9 {
            return Err(YieldError::invalid_parameter(
                "max_speed",
                format!("must be a positive multiple of {bin_width}, got {max_speed}"),
            ));
        }
        Ok(Self {
            sectors,
            bin_width,
            max_speed,
        })
    }

    /// Sector width (degrees)
    pub fn sector_width(&self) -> f64 {
        360.0 / self.sectors as f64
    }

    /// Number of speed bins including the open top bin
    pub fn bin_count(&self) -> usize {
        (self.max_speed / self.bin_width).round() as usize + 1
    }

    /// Sector holding bearing `direction`
    pub fn sector_of(&self, direction: f64) -> usize {
        let width = self.sector_width();
        let shifted = normalize_bearing(direction + 0.5 * width);
        ((shifted / width) as usize).min(self.sectors - 1)
    }

    /// Speed bin holding `speed`
    pub fn bin_of(&self, speed: f64) -> usize {
        ((speed / self.bin_width) as usize).min(self.bin_count() - 1)
    }

    /// Tabulate paired speed and direction series
    ///
    /// Pairs with a non-finite value or a negative speed are skipped.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when the series differ in length or no
    /// usable pair remains.
    pub fn tabulate(&self, speeds: &[f64], directions: &[f64]) -> Result<WindRoseTable> {
        if speeds.len() != directions.len() {
            return Err(YieldError::invalid_parameter(
                "directions",
                format!(
                    "length {} differs from {} speeds",
                    directions.len(),
                    speeds.len()
                ),
            ));
        }

        let bins = self.bin_count();
        let mut counts = vec![vec![0usize; bins]; self.sectors];
        let mut samples = 0;
        for (&speed, &direction) in speeds.iter().zip(directions) {
            if !speed.is_finite() || !direction.is_finite() || speed < 0.0 {
                continue;
            }
            counts[self.sector_of(direction)][self.bin_of(speed)] += 1;
            samples += 1;
        }
        if samples == 0 {
            return Err(YieldError::invalid_parameter(
                "speeds",
                "no finite speed/direction pair to tabulate",
            ));
        }
        if samples < speeds.len() {
            debug!(skipped = speeds.len() - samples, "Skipped unusable wind-rose pairs");
        }

        let total = samples as f64;
        let frequencies = counts
            .iter()
            .map(|row| row.iter().map(|&c| c as f64 / total).collect())
            .collect();
        let width = self.sector_width();

        Ok(WindRoseTable {
            sector_centers: (0..self.sectors).map(|i| i as f64 * width).collect(),
            speed_edges: (0..bins).map(|i| i as f64 * self.bin_width).collect(),
            frequencies,
            samples,
        })
    }
}
