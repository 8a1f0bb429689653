//! Wind climate statistics and annual energy
//!
//! - `weibull`: distribution, maximum-likelihood fitter and histogram table
//! - `aep`: Weibull-weighted integration of the power curve
//! - `rose`: direction/speed frequency table

pub mod aep;
mod quadrature;
pub mod rose;
pub mod weibull;

pub use aep::{AepIntegrator, AepResult};
pub use rose::{WindRose, WindRoseTable};
pub use weibull::{SpeedHistogram, WeibullFitter, WeibullParams};

/// Hours in a (non-leap) year
pub const HOURS_PER_YEAR: f64 = 8760.0;
