//! Wind Yield Core Library
//!
//! Estimates the Annual Energy Production (AEP) of a wind turbine at a site
//! from gridded reanalysis winds on a 0.25° grid with components at 10 m and
//! 100 m above ground.
//!
//! ## Pipeline
//!
//! 1. Sort raw samples into the four corner series of one grid cell
//! 2. Interpolate bilinearly to the site coordinates
//! 3. Extrapolate to hub height with the wind power law
//! 4. Fit a Weibull distribution to the hub-height speeds
//! 5. Integrate the turbine power curve against the fitted distribution
//!
//! Every stage is a pure function of its inputs and reports failures through
//! [`YieldError`].

// Core types and utilities
pub mod core_types;
pub mod error;
pub mod io;

// Site climate: grid cell, spatial and vertical interpolation
pub mod site;

// Turbine power models
pub mod turbine;

// Climate statistics and annual energy
pub mod energy;

// Re-export core types
pub use core_types::{
    DirectionConvention, Kilowatts, Meters, MetersPerSecond, WindComponents, WindSample,
};
pub use error::{Result, YieldError};
pub use io::{read_power_curve, read_wind_samples, read_wind_samples_from};

// Re-export pipeline stages
pub use energy::{
    AepIntegrator, AepResult, SpeedHistogram, WeibullFitter, WeibullParams, WindRose,
    WindRoseTable, HOURS_PER_YEAR,
};
pub use site::{
    Corner, CornerSeries, GridCell, HeightAdjustedSeries, InterpolatedSite, SpatialInterpolator,
    VerticalExtrapolator,
};
pub use turbine::{PowerCurve, TurbineModel, TurbineSpec};
