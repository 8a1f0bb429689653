//! Error types for the yield pipeline
//!
//! Every stage reports failures as a distinct variant carrying enough context
//! (stage, offending input, row) to tell which site/height/period aborted and
//! why. Nothing is coerced to zero or NaN silently.

use crate::site::Corner;

/// Errors raised by the wind-yield computations
#[derive(Debug, Clone, PartialEq)]
pub enum YieldError {
    /// Power-curve table is malformed (too short, unordered, non-finite)
    InvalidCurve {
        /// What is wrong with the table
        reason: String,
    },
    /// Corner series of a grid cell do not share one timestamp sequence
    MisalignedSeries {
        /// Corner whose series disagrees with the reference corner
        corner: Corner,
        /// First row index at which the series differ
        row: usize,
        /// Description of the mismatch
        reason: String,
    },
    /// Power-law shear exponent cannot be computed for a row
    ExtrapolationUndefined {
        /// Row index in the site series
        row: usize,
        /// Speed at the lower reference height (m/s)
        lower_speed: f64,
        /// Speed at the upper reference height (m/s)
        upper_speed: f64,
    },
    /// Weibull maximum-likelihood fit failed
    FitFailure {
        /// Number of usable (finite, positive) values in the sample
        usable: usize,
        /// Why the fit failed
        reason: String,
    },
    /// Integration bounds are inconsistent or the integrand is not finite
    InvalidBounds {
        /// Lower integration bound (m/s)
        lower: f64,
        /// Upper integration bound (m/s)
        upper: f64,
        /// Why the integral is undefined
        reason: String,
    },
    /// A scalar input or configuration value is out of its valid range
    InvalidParameter {
        /// Parameter name as the caller knows it
        name: &'static str,
        /// Constraint that was violated
        reason: String,
    },
    /// Tabular input could not be read or parsed
    DataSource {
        /// 1-based record number, when known
        record: Option<u64>,
        /// Underlying reader or parse failure
        reason: String,
    },
}

impl YieldError {
    /// Create error for an invalid parameter value.
    ///
    /// # Arguments
    /// * `name` - The parameter name (e.g., `"availability"`, `"height"`)
    /// * `reason` - Description of the violated constraint
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        YieldError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Create error for a malformed power curve.
    pub(crate) fn invalid_curve(reason: impl Into<String>) -> Self {
        YieldError::InvalidCurve {
            reason: reason.into(),
        }
    }

    /// Create error for a failed Weibull fit.
    pub(crate) fn fit_failure(usable: usize, reason: impl Into<String>) -> Self {
        YieldError::FitFailure {
            usable,
            reason: reason.into(),
        }
    }

    /// Create error for an undefined AEP integral.
    pub(crate) fn invalid_bounds(lower: f64, upper: f64, reason: impl Into<String>) -> Self {
        YieldError::InvalidBounds {
            lower,
            upper,
            reason: reason.into(),
        }
    }

    /// Pipeline stage that produced this error, for log and report context.
    pub fn stage(&self) -> &'static str {
        match self {
            YieldError::InvalidCurve { .. } => "turbine",
            YieldError::MisalignedSeries { .. } => "spatial interpolation",
            YieldError::ExtrapolationUndefined { .. } => "vertical extrapolation",
            YieldError::FitFailure { .. } => "weibull fit",
            YieldError::InvalidBounds { .. } => "aep integration",
            YieldError::InvalidParameter { .. } => "input validation",
            YieldError::DataSource { .. } => "data source",
        }
    }
}

impl std::fmt::Display for YieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            YieldError::InvalidCurve { reason } => write!(f, "Invalid power curve: {reason}"),
            YieldError::MisalignedSeries {
                corner,
                row,
                reason,
            } => write!(
                f,
                "Misaligned series at corner {corner:?}, row {row}: {reason}"
            ),
            YieldError::ExtrapolationUndefined {
                row,
                lower_speed,
                upper_speed,
            } => write!(
                f,
                "Power-law extrapolation undefined at row {row}: \
                 lower speed {lower_speed} m/s, upper speed {upper_speed} m/s"
            ),
            YieldError::FitFailure { usable, reason } => {
                write!(f, "Weibull fit failed ({usable} usable values): {reason}")
            }
            YieldError::InvalidBounds {
                lower,
                upper,
                reason,
            } => write!(
                f,
                "Invalid AEP integration over [{lower}, {upper}] m/s: {reason}"
            ),
            YieldError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{name}': {reason}")
            }
            YieldError::DataSource { record, reason } => match record {
                Some(n) => write!(f, "Failed to read record {n}: {reason}"),
                None => write!(f, "Failed to read data: {reason}"),
            },
        }
    }
}

impl std::error::Error for YieldError {}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, YieldError>;
