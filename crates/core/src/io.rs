//! CSV readers for power curves and reanalysis wind samples
//!
//! Power curve: a header row, then `speed,power` pairs (m/s, kW). Columns
//! after the second are ignored.
//!
//! Wind samples: header `time,latitude,longitude,u10,v10,u100,v100`, one row
//! per grid point and valid time. `time` is `YYYY-MM-DD HH:MM:SS`, ISO 8601
//! without offset, or RFC 3339 (converted to UTC). Long records are often
//! split into several files (one per few years); [`read_wind_samples_from`]
//! concatenates them.

use std::fmt::Display;
use std::io::Read;

use chrono::{DateTime, NaiveDateTime};
use csv::{ReaderBuilder, Trim};
use serde::Deserialize;
use tracing::debug;

use crate::core_types::wind::{WindComponents, WindSample};
use crate::error::{Result, YieldError};
use crate::turbine::PowerCurve;

const TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Deserialize)]
struct SampleRow {
    time: String,
    latitude: f64,
    longitude: f64,
    u10: f64,
    v10: f64,
    u100: f64,
    v100: f64,
}

/// Read a two-column power-curve table
///
/// # Errors
/// Returns `InvalidCurve` when a row cannot be read, has fewer than two
/// columns or a non-numeric value, and when the resulting table fails the
/// [`PowerCurve`] checks.
pub fn read_power_curve<R: Read>(reader: R) -> Result<PowerCurve> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut points = Vec::new();
    for (index, row) in rdr.records().enumerate() {
        let line = index + 1;
        let record =
            row.map_err(|e| YieldError::invalid_curve(format!("row {line}: {e}")))?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let field = |column: usize, name: &str| -> Result<f64> {
            let raw = record.get(column).ok_or_else(|| {
                YieldError::invalid_curve(format!("row {line}: missing {name} column"))
            })?;
            raw.parse::<f64>().map_err(|_| {
                YieldError::invalid_curve(format!("row {line}: {name} '{raw}' is not a number"))
            })
        };
        points.push((field(0, "speed")?, field(1, "power")?));
    }

    debug!(points = points.len(), "Read power curve");
    PowerCurve::new(points)
}

/// Read reanalysis wind samples
///
/// # Errors
/// Returns `DataSource` with the 1-based data row for unreadable rows,
/// missing columns, non-numeric values and unparseable times.
pub fn read_wind_samples<R: Read>(reader: R) -> Result<Vec<WindSample>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .from_reader(reader);

    let mut samples = Vec::new();
    for (index, row) in rdr.deserialize::<SampleRow>().enumerate() {
        let record = index as u64 + 1;
        let row = row.map_err(|e| YieldError::DataSource {
            record: Some(record),
            reason: e.to_string(),
        })?;
        let timestamp = parse_time(&row.time).ok_or_else(|| YieldError::DataSource {
            record: Some(record),
            reason: format!("unrecognized time '{}'", row.time),
        })?;
        samples.push(WindSample {
            timestamp,
            latitude: row.latitude,
            longitude: row.longitude,
            at_10m: WindComponents::new(row.u10, row.v10),
            at_100m: WindComponents::new(row.u100, row.v100),
        });
    }

    debug!(samples = samples.len(), "Read wind samples");
    Ok(samples)
}

/// Read and concatenate wind samples from several labeled sources
///
/// Rows are kept in source order. Overlaps between sources are not resolved
/// here; [`GridCell::from_samples`](crate::GridCell::from_samples)
/// rejects repeated timestamps.
///
/// # Errors
/// Same as [`read_wind_samples`], with the source label prefixed to the
/// reason of `DataSource` errors.
pub fn read_wind_samples_from<I, L, R>(sources: I) -> Result<Vec<WindSample>>
where
    I: IntoIterator<Item = (L, R)>,
    L: Display,
    R: Read,
{
    let mut samples = Vec::new();
    let mut files = 0usize;
    for (label, reader) in sources {
        let part = read_wind_samples(reader).map_err(|e| match e {
            YieldError::DataSource { record, reason } => YieldError::DataSource {
                record,
                reason: format!("{label}: {reason}"),
            },
            other => other,
        })?;
        samples.extend(part);
        files += 1;
    }
    debug!(files, samples = samples.len(), "Concatenated wind sample sources");
    Ok(samples)
}

/// Parse a timestamp in any of the accepted layouts
pub fn parse_time(raw: &str) -> Option<NaiveDateTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .as_ref()
                .map(DateTime::naive_utc)
        })
}
