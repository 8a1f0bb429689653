//! Wind turbine power models
//!
//! Two ways to turn wind speed into electrical output:
//!
//! - [`TurbineModel::Analytical`]: the textbook three-region curve. Zero below
//!   cut-in, cubic growth up to rated speed, flat rated power up to cut-out.
//! - [`TurbineModel::Interpolated`]: a measured [`PowerCurve`] table with
//!   linear interpolation between points.
//!
//! # Boundary convention
//!
//! For the analytical curve both the rated and the cut-out speed belong to the
//! flat region: `power(v_rated) == power(v_out) == rated_power`, and output
//! drops to zero only for `v > v_out`.
//!
//! ```text
//!   P │          ┌──────────┐
//!     │         /           │
//!     │       /             │
//!     │____.-'              └────
//!        v_in  v_rated   v_out    v
//! ```

mod curve;

pub use curve::PowerCurve;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core_types::units::{Kilowatts, Meters, MetersPerSecond};
use crate::error::{Result, YieldError};

/// Nameplate parameters of a wind turbine
///
/// Fields are read through accessors. Deserialization goes through the same
/// checks as [`TurbineSpec::new`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TurbineSpecRecord")]
pub struct TurbineSpec {
    name: Option<String>,
    rotor_diameter: Meters,
    hub_height: Meters,
    rated_power: Kilowatts,
    v_in: MetersPerSecond,
    v_rated: MetersPerSecond,
    v_out: MetersPerSecond,
}

/// Unchecked serialized form of [`TurbineSpec`]
#[derive(Deserialize)]
struct TurbineSpecRecord {
    #[serde(default)]
    name: Option<String>,
    rotor_diameter: Meters,
    hub_height: Meters,
    rated_power: Kilowatts,
    v_in: MetersPerSecond,
    v_rated: MetersPerSecond,
    v_out: MetersPerSecond,
}

impl TryFrom<TurbineSpecRecord> for TurbineSpec {
    type Error = YieldError;

    fn try_from(raw: TurbineSpecRecord) -> Result<Self> {
        let spec = TurbineSpec::new(
            raw.rotor_diameter,
            raw.hub_height,
            raw.rated_power,
            raw.v_in,
            raw.v_rated,
            raw.v_out,
        )?;
        Ok(match raw.name {
            Some(name) => spec.with_name(name),
            None => spec,
        })
    }
}

impl TurbineSpec {
    /// Create a turbine spec
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless `v_in < v_rated <= v_out`, the rated
    /// power is positive and the rotor diameter is positive.
    pub fn new(
        rotor_diameter: Meters,
        hub_height: Meters,
        rated_power: Kilowatts,
        v_in: MetersPerSecond,
        v_rated: MetersPerSecond,
        v_out: MetersPerSecond,
    ) -> Result<Self> {
        if *rated_power <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "rated_power",
                format!("must be positive, got {rated_power}"),
            ));
        }
        if *rotor_diameter <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "rotor_diameter",
                format!("must be positive, got {rotor_diameter}"),
            ));
        }
        if v_in >= v_rated {
            return Err(YieldError::invalid_parameter(
                "v_rated",
                format!("must exceed cut-in speed {v_in}, got {v_rated}"),
            ));
        }
        if v_rated > v_out {
            return Err(YieldError::invalid_parameter(
                "v_out",
                format!("must not be below rated speed {v_rated}, got {v_out}"),
            ));
        }

        Ok(Self {
            name: None,
            rotor_diameter,
            hub_height,
            rated_power,
            v_in,
            v_rated,
            v_out,
        })
    }

    /// Nameplate read off a measured power curve
    ///
    /// Rated power is the table maximum and rated speed the first speed that
    /// reaches it. Cut-in is the last table speed before output turns
    /// positive (the first speed if the table starts producing) and cut-out
    /// the last speed with positive output.
    ///
    /// # Errors
    /// Returns `InvalidParameter` when the table never produces power or the
    /// derived speeds fail the [`TurbineSpec::new`] checks.
    pub fn from_curve(
        curve: &PowerCurve,
        rotor_diameter: Meters,
        hub_height: Meters,
    ) -> Result<Self> {
        let speeds = curve.speeds();
        let powers = curve.powers();
        let rated = curve.max_power();
        let first_on = powers.iter().position(|&p| p > 0.0);
        let last_on = powers.iter().rposition(|&p| p > 0.0);
        let (Some(first_on), Some(last_on)) = (first_on, last_on) else {
            return Err(YieldError::invalid_parameter("curve", "table never produces power"));
        };
        let rated_at = powers.iter().position(|&p| p >= rated).unwrap_or(last_on);

        Self::new(
            rotor_diameter,
            hub_height,
            Kilowatts::try_from(rated)?,
            MetersPerSecond::try_from(speeds[first_on.saturating_sub(1)])?,
            MetersPerSecond::try_from(speeds[rated_at])?,
            MetersPerSecond::try_from(speeds[last_on])?,
        )
    }

    /// Attach a model name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// NREL 5 MW offshore reference turbine (126 m rotor, 90 m hub)
    pub fn nrel_5mw() -> Self {
        Self {
            name: Some("NREL 5MW".to_string()),
            rotor_diameter: Meters::new(126.0),
            hub_height: Meters::new(90.0),
            rated_power: Kilowatts::new(5000.0),
            v_in: MetersPerSecond::new(3.0),
            v_rated: MetersPerSecond::new(11.4),
            v_out: MetersPerSecond::new(25.0),
        }
    }

    /// Model name, if one was attached
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Rotor diameter
    pub fn rotor_diameter(&self) -> Meters {
        self.rotor_diameter
    }

    /// Hub height above ground
    pub fn hub_height(&self) -> Meters {
        self.hub_height
    }

    /// Rated electrical power
    pub fn rated_power(&self) -> Kilowatts {
        self.rated_power
    }

    /// Cut-in wind speed
    pub fn v_in(&self) -> MetersPerSecond {
        self.v_in
    }

    /// Rated wind speed
    pub fn v_rated(&self) -> MetersPerSecond {
        self.v_rated
    }

    /// Cut-out wind speed
    pub fn v_out(&self) -> MetersPerSecond {
        self.v_out
    }

    /// Rotor swept area (m²)
    pub fn swept_area(&self) -> f64 {
        std::f64::consts::PI * (*self.rotor_diameter / 2.0).powi(2)
    }

    /// Energy from running at rated power for a full year (kWh)
    pub fn annual_rated_energy(&self) -> f64 {
        self.rated_power * crate::energy::HOURS_PER_YEAR
    }
}

impl fmt::Display for TurbineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            writeln!(f, "Turbine Name: {name}")?;
        }
        writeln!(f, "Rotor Diameter: {}", self.rotor_diameter)?;
        writeln!(f, "Hub Height: {}", self.hub_height)?;
        writeln!(f, "Rated Power: {}", self.rated_power)?;
        writeln!(f, "Cut-in Wind Speed: {}", self.v_in)?;
        writeln!(f, "Rated Wind Speed: {}", self.v_rated)?;
        write!(f, "Cut-out Wind Speed: {}", self.v_out)
    }
}

/// Power model of a turbine: analytical curve or measured table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TurbineModel {
    /// Three-region cubic curve derived from the nameplate alone
    Analytical(TurbineSpec),
    /// Measured power-curve table
    Interpolated {
        /// Nameplate parameters (cut-in/cut-out define the AEP bounds)
        spec: TurbineSpec,
        /// Tabulated power curve
        curve: PowerCurve,
    },
}

impl TurbineModel {
    /// Analytical model from nameplate parameters
    pub fn analytical(spec: TurbineSpec) -> Self {
        TurbineModel::Analytical(spec)
    }

    /// Table-driven model
    pub fn interpolated(spec: TurbineSpec, curve: PowerCurve) -> Self {
        TurbineModel::Interpolated { spec, curve }
    }

    /// Pick the model from whether a measured curve is available
    pub fn from_spec(spec: TurbineSpec, curve: Option<PowerCurve>) -> Self {
        match curve {
            Some(curve) => Self::interpolated(spec, curve),
            None => Self::analytical(spec),
        }
    }

    /// Nameplate parameters
    pub fn spec(&self) -> &TurbineSpec {
        match self {
            TurbineModel::Analytical(spec) | TurbineModel::Interpolated { spec, .. } => spec,
        }
    }

    /// Short label for reports
    pub fn kind(&self) -> &'static str {
        match self {
            TurbineModel::Analytical(_) => "analytical",
            TurbineModel::Interpolated { .. } => "interpolated",
        }
    }

    /// Electrical output at wind speed `v` (kW)
    #[inline]
    pub fn power(&self, v: f64) -> f64 {
        match self {
            TurbineModel::Analytical(spec) => AnalyticalKernel::from(spec).eval(v),
            TurbineModel::Interpolated { curve, .. } => curve.power(v),
        }
    }

    /// Elementwise output for a series of wind speeds (kW)
    ///
    /// The analytical branch evaluates a branch-free select per element so
    /// the loop vectorizes.
    pub fn power_many(&self, speeds: &[f64]) -> Vec<f64> {
        match self {
            TurbineModel::Analytical(spec) => {
                let kernel = AnalyticalKernel::from(spec);
                speeds.iter().map(|&v| kernel.eval(v)).collect()
            }
            TurbineModel::Interpolated { curve, .. } => {
                speeds.iter().map(|&v| curve.power(v)).collect()
            }
        }
    }

    /// Speeds where the curve's slope jumps (m/s), ascending
    ///
    /// Quadrature splits its interval at these points.
    pub fn breakpoints(&self) -> Vec<f64> {
        match self {
            TurbineModel::Analytical(spec) => vec![*spec.v_in, *spec.v_rated, *spec.v_out],
            TurbineModel::Interpolated { curve, .. } => curve.speeds().to_vec(),
        }
    }
}

/// Scalar constants of the analytical curve, hoisted out of the element loop
#[derive(Clone, Copy)]
struct AnalyticalKernel {
    rated: f64,
    v_in: f64,
    v_rated: f64,
    v_out: f64,
}

impl From<&TurbineSpec> for AnalyticalKernel {
    fn from(spec: &TurbineSpec) -> Self {
        Self {
            rated: *spec.rated_power,
            v_in: *spec.v_in,
            v_rated: *spec.v_rated,
            v_out: *spec.v_out,
        }
    }
}

impl AnalyticalKernel {
    #[inline]
    fn eval(self, v: f64) -> f64 {
        let ratio = v / self.v_rated;
        let cubic = self.rated * ratio * ratio * ratio;
        let operating = v >= self.v_in && v <= self.v_out;
        let region = if v < self.v_rated { cubic } else { self.rated };
        let out = if operating { region } else { 0.0 };
        if v.is_nan() {
            f64::NAN
        } else {
            out
        }
    }
}
