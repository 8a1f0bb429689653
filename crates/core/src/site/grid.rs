//! Four-corner reanalysis grid cell
//!
//! Reanalysis data arrives on a regular 0.25° lattice. A site is always
//! bracketed by exactly one cell, so the cell is stored as a fixed array of
//! four corner series addressed by [`Corner`] rather than a lookup keyed by
//! coordinate strings.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core_types::wind::{DirectionConvention, WindSample};
use crate::error::{Result, YieldError};

/// Lattice spacing of the reanalysis grid (degrees)
pub const CELL_SIZE_DEG: f64 = 0.25;

/// Coordinates closer than this are treated as the same grid point (degrees)
const COORD_TOLERANCE_DEG: f64 = 1e-6;

/// Identity of a grid-cell corner: (low/high latitude) × (low/high longitude)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    LowLatLowLon,
    LowLatHighLon,
    HighLatLowLon,
    HighLatHighLon,
}

impl Corner {
    /// All corners in storage order
    pub const ALL: [Corner; 4] = [
        Corner::LowLatLowLon,
        Corner::LowLatHighLon,
        Corner::HighLatLowLon,
        Corner::HighLatHighLon,
    ];

    /// Position in [`Corner::ALL`]
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Corner::LowLatLowLon => 0,
            Corner::LowLatHighLon => 1,
            Corner::HighLatLowLon => 2,
            Corner::HighLatHighLon => 3,
        }
    }

    /// Whether this corner sits on the northern edge
    pub const fn is_high_lat(self) -> bool {
        matches!(self, Corner::HighLatLowLon | Corner::HighLatHighLon)
    }

    /// Whether this corner sits on the eastern edge
    pub const fn is_high_lon(self) -> bool {
        matches!(self, Corner::LowLatHighLon | Corner::HighLatHighLon)
    }
}

/// Derived wind series of one grid point at the two reference heights
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CornerSeries {
    /// Ordered valid times
    pub timestamps: Vec<NaiveDateTime>,
    /// Speed at 10 m (m/s)
    pub speed_10m: Vec<f64>,
    /// Speed at 100 m (m/s)
    pub speed_100m: Vec<f64>,
    /// Direction at 10 m (degrees, 0 = North, clockwise)
    pub direction_10m: Vec<f64>,
    /// Direction at 100 m (degrees, 0 = North, clockwise)
    pub direction_100m: Vec<f64>,
}

impl CornerSeries {
    /// Convert raw component samples of a single grid point
    ///
    /// Samples are taken in the order given; sort them first if needed.
    pub fn from_samples<'a>(
        samples: impl IntoIterator<Item = &'a WindSample>,
        convention: DirectionConvention,
    ) -> Self {
        let mut series = Self::default();
        for s in samples {
            series.timestamps.push(s.timestamp);
            series.speed_10m.push(s.at_10m.speed());
            series.speed_100m.push(s.at_100m.speed());
            series.direction_10m.push(s.at_10m.direction(convention));
            series.direction_100m.push(s.at_100m.direction(convention));
        }
        series
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Whether the series has no rows
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Length of the shortest value column when it disagrees with the
    /// timestamp column, `None` when the series is internally consistent
    pub(crate) fn ragged_len(&self) -> Option<usize> {
        let n = self.timestamps.len();
        let shortest = [
            self.speed_10m.len(),
            self.speed_100m.len(),
            self.direction_10m.len(),
            self.direction_100m.len(),
        ]
        .into_iter()
        .fold(n, usize::min);
        let consistent = self.speed_10m.len() == n
            && self.speed_100m.len() == n
            && self.direction_10m.len() == n
            && self.direction_100m.len() == n;
        (!consistent).then_some(shortest)
    }
}

/// One reanalysis grid cell: four corner series and the south-west origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    lat_low: f64,
    lon_low: f64,
    corners: [CornerSeries; 4],
}

impl GridCell {
    /// Create a cell from its south-west corner and the four series,
    /// given in [`Corner::ALL`] order
    pub fn new(lat_low: f64, lon_low: f64, corners: [CornerSeries; 4]) -> Self {
        Self {
            lat_low,
            lon_low,
            corners,
        }
    }

    /// Group raw samples of four grid points into a cell
    ///
    /// Each corner series is ordered by timestamp. Alignment across corners is
    /// checked later, by the interpolator.
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless the samples cover exactly four grid
    /// points forming one `0.25°` cell, with two distinct latitudes and two
    /// distinct longitudes, and no grid point repeats a timestamp.
    pub fn from_samples(samples: &[WindSample], convention: DirectionConvention) -> Result<Self> {
        let mut groups: FxHashMap<(i64, i64), Vec<&WindSample>> = FxHashMap::default();
        for s in samples {
            if !s.latitude.is_finite() || !s.longitude.is_finite() {
                return Err(YieldError::invalid_parameter(
                    "samples",
                    format!("non-finite coordinate ({}, {})", s.latitude, s.longitude),
                ));
            }
            groups
                .entry((coord_key(s.latitude), coord_key(s.longitude)))
                .or_default()
                .push(s);
        }

        if groups.len() != 4 {
            return Err(YieldError::invalid_parameter(
                "samples",
                format!("expected 4 grid points, found {}", groups.len()),
            ));
        }

        let mut lats: Vec<i64> = groups.keys().map(|k| k.0).collect();
        let mut lons: Vec<i64> = groups.keys().map(|k| k.1).collect();
        lats.sort_unstable();
        lats.dedup();
        lons.sort_unstable();
        lons.dedup();
        if lats.len() != 2 || lons.len() != 2 {
            return Err(YieldError::invalid_parameter(
                "samples",
                format!(
                    "grid points do not form a cell: {} latitudes, {} longitudes",
                    lats.len(),
                    lons.len()
                ),
            ));
        }

        let lat_low = key_coord(lats[0]);
        let lon_low = key_coord(lons[0]);
        let lat_span = key_coord(lats[1]) - lat_low;
        let lon_span = key_coord(lons[1]) - lon_low;
        if (lat_span - CELL_SIZE_DEG).abs() > COORD_TOLERANCE_DEG
            || (lon_span - CELL_SIZE_DEG).abs() > COORD_TOLERANCE_DEG
        {
            return Err(YieldError::invalid_parameter(
                "samples",
                format!(
                    "cell spans {lat_span}° x {lon_span}°, expected {CELL_SIZE_DEG}° in both axes"
                ),
            ));
        }

        let ordered = Corner::ALL.map(|corner| {
            let lat = lats[usize::from(corner.is_high_lat())];
            let lon = lons[usize::from(corner.is_high_lon())];
            let mut rows = groups.remove(&(lat, lon)).unwrap_or_default();
            rows.sort_by_key(|s| s.timestamp);
            rows
        });

        // Overlapping input files repeat rows; a corner must see each time once
        for rows in &ordered {
            if let Some(pair) = rows.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
                return Err(YieldError::invalid_parameter(
                    "samples",
                    format!(
                        "duplicate timestamp {} at ({}, {})",
                        pair[0].timestamp, pair[0].latitude, pair[0].longitude
                    ),
                ));
            }
        }

        let corners = ordered.map(|rows| CornerSeries::from_samples(rows, convention));

        debug!(
            lat_low,
            lon_low,
            rows = corners[0].len(),
            "Sorted samples into grid cell"
        );

        Ok(Self::new(lat_low, lon_low, corners))
    }

    /// Latitude of the southern edge
    pub fn lat_low(&self) -> f64 {
        self.lat_low
    }

    /// Longitude of the western edge
    pub fn lon_low(&self) -> f64 {
        self.lon_low
    }

    /// Series of one corner
    pub fn corner(&self, corner: Corner) -> &CornerSeries {
        &self.corners[corner.index()]
    }

    /// Coordinates `(lat, lon)` of a corner for a given lattice spacing
    pub fn corner_coordinates(&self, corner: Corner, cell_size: f64) -> (f64, f64) {
        let lat = if corner.is_high_lat() {
            self.lat_low + cell_size
        } else {
            self.lat_low
        };
        let lon = if corner.is_high_lon() {
            self.lon_low + cell_size
        } else {
            self.lon_low
        };
        (lat, lon)
    }
}

/// Quantize a coordinate to micro-degrees for grouping
#[inline]
fn coord_key(deg: f64) -> i64 {
    (deg * 1e6).round() as i64
}

#[inline]
fn key_coord(key: i64) -> f64 {
    key as f64 / 1e6
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::wind::WindComponents;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample(hour: u32, lat: f64, lon: f64, speed: f64) -> WindSample {
        WindSample {
            timestamp: at(hour),
            latitude: lat,
            longitude: lon,
            at_10m: WindComponents::new(0.0, speed),
            at_100m: WindComponents::new(0.0, 2.0 * speed),
        }
    }

    fn cell_samples() -> Vec<WindSample> {
        let mut out = Vec::new();
        // Deliberately reverse time order to exercise sorting
        for hour in [1, 0] {
            for lat in [55.5, 55.75] {
                for lon in [7.75, 8.0] {
                    out.push(sample(hour, lat, lon, lat + lon + f64::from(hour)));
                }
            }
        }
        out
    }

    #[test]
    fn test_from_samples_assigns_corners() {
        let cell = GridCell::from_samples(&cell_samples(), DirectionConvention::From).unwrap();
        assert_eq!(cell.lat_low(), 55.5);
        assert_eq!(cell.lon_low(), 7.75);

        let ne = cell.corner(Corner::HighLatHighLon);
        assert_eq!(ne.len(), 2);
        assert_eq!(ne.timestamps, vec![at(0), at(1)]);
        assert!((ne.speed_10m[0] - (55.75 + 8.0)).abs() < 1e-12);
        assert!((ne.speed_100m[1] - 2.0 * (55.75 + 8.0 + 1.0)).abs() < 1e-12);
        // v > 0 means the air moves north, so it comes from the south
        assert!((ne.direction_10m[0] - 180.0).abs() < 1e-12);

        let sw = cell.corner(Corner::LowLatLowLon);
        assert!((sw.speed_10m[0] - (55.5 + 7.75)).abs() < 1e-12);
    }

    #[test]
    fn test_from_samples_rejects_wrong_point_count() {
        let samples: Vec<WindSample> = cell_samples().into_iter().take(3).collect();
        let err = GridCell::from_samples(&samples, DirectionConvention::From).unwrap_err();
        assert!(matches!(err, YieldError::InvalidParameter { name: "samples", .. }));
    }

    #[test]
    fn test_from_samples_rejects_wrong_spacing() {
        let samples = vec![
            sample(0, 55.5, 7.75, 1.0),
            sample(0, 55.5, 8.25, 1.0),
            sample(0, 56.0, 7.75, 1.0),
            sample(0, 56.0, 8.25, 1.0),
        ];
        let err = GridCell::from_samples(&samples, DirectionConvention::From).unwrap_err();
        assert!(err.to_string().contains("expected 0.25"), "{err}");
    }

    #[test]
    fn test_from_samples_rejects_points_in_a_line() {
        let samples = vec![
            sample(0, 55.5, 7.75, 1.0),
            sample(0, 55.5, 8.0, 1.0),
            sample(0, 55.5, 8.25, 1.0),
            sample(0, 55.5, 8.5, 1.0),
        ];
        assert!(GridCell::from_samples(&samples, DirectionConvention::From).is_err());
    }

    #[test]
    fn test_from_samples_rejects_repeated_timestamps() {
        let mut samples = cell_samples();
        // Second file overlapping the first by one hour at one grid point
        samples.push(sample(1, 55.75, 8.0, 3.0));
        let err = GridCell::from_samples(&samples, DirectionConvention::From).unwrap_err();
        assert!(matches!(err, YieldError::InvalidParameter { name: "samples", .. }));
        assert!(err.to_string().contains("duplicate timestamp"), "{err}");
    }

    #[test]
    fn test_from_samples_joins_consecutive_files() {
        let first = cell_samples();
        let second: Vec<WindSample> = cell_samples()
            .into_iter()
            .map(|mut s| {
                s.timestamp += chrono::Duration::hours(2);
                s
            })
            .collect();
        let joined: Vec<WindSample> = second.into_iter().chain(first).collect();
        let cell = GridCell::from_samples(&joined, DirectionConvention::From).unwrap();
        assert_eq!(
            cell.corner(Corner::LowLatLowLon).timestamps,
            vec![at(0), at(1), at(2), at(3)]
        );
    }

    #[test]
    fn test_corner_coordinates() {
        let cell = GridCell::from_samples(&cell_samples(), DirectionConvention::From).unwrap();
        assert_eq!(
            cell.corner_coordinates(Corner::HighLatLowLon, CELL_SIZE_DEG),
            (55.75, 7.75)
        );
        assert_eq!(Corner::HighLatLowLon.index(), 2);
    }

    #[test]
    fn test_ragged_series_detected() {
        let mut series = CornerSeries::from_samples(&cell_samples()[..1], DirectionConvention::From);
        assert_eq!(series.ragged_len(), None);
        series.speed_100m.clear();
        assert_eq!(series.ragged_len(), Some(0));
    }
}
