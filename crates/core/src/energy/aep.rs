//! Annual energy production from a power curve and a Weibull climate
//!
//! ```text
//! AEP = availability · 8760 h · ∫[v_in, v_out] P(u) · f(u; k, A) du
//! ```
//!
//! The integrand has kinks wherever the power curve does (cut-in, rated,
//! every table point), so the interval is split at the turbine's breakpoints
//! and each piece is integrated separately with adaptive Simpson. The
//! absolute tolerance handed to the pieces is the relative tolerance scaled
//! by a coarse estimate of the whole integral, shared in proportion to width.
//!
//! For `k < 1` the density diverges at `u = 0`. A piece starting there with
//! non-zero power is integrated over probability instead,
//! `∫ P(u) f(u) du = ∫ P(Q(p)) dp` with `Q` the Weibull quantile, which has
//! no singular endpoint.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::quadrature::{adaptive_simpson, composite_simpson};
use super::weibull::WeibullParams;
use super::HOURS_PER_YEAR;
use crate::error::{Result, YieldError};
use crate::turbine::TurbineModel;

/// Panels per piece for the coarse estimate that scales the tolerance
const COARSE_PANELS: usize = 32;

/// Annual energy production of one turbine in one climate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AepResult {
    /// Net annual energy after availability losses (kWh/year)
    pub energy_kwh: f64,
    /// Annual energy with the turbine always available (kWh/year)
    pub gross_energy_kwh: f64,
    /// Expected power over the climate, `∫ P f du` (kW)
    pub mean_power_kw: f64,
    /// Fraction of the year the turbine is available
    pub availability: f64,
    /// Rated power used for the capacity factor (kW)
    pub rated_power_kw: f64,
    /// Power-curve evaluations spent by the quadrature
    pub evaluations: usize,
}

impl AepResult {
    /// Net energy over the energy of a year at rated power
    pub fn capacity_factor(&self) -> f64 {
        self.energy_kwh / (self.rated_power_kw * HOURS_PER_YEAR)
    }

    /// Net annual energy in megawatt-hours
    pub fn energy_mwh(&self) -> f64 {
        self.energy_kwh / 1000.0
    }

    /// Net annual energy in gigawatt-hours
    pub fn energy_gwh(&self) -> f64 {
        self.energy_kwh / 1.0e6
    }
}

/// Weibull-weighted power-curve integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AepIntegrator {
    /// Target relative error of the integral
    pub tolerance: f64,
    /// Maximum bisection depth of any quadrature panel
    pub max_depth: u32,
}

impl Default for AepIntegrator {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_depth: 40,
        }
    }
}

impl AepIntegrator {
    /// Create an integrator with a custom tolerance and depth limit
    ///
    /// # Errors
    /// Returns `InvalidParameter` for a tolerance outside `(0, 1)` or a zero
    /// depth limit.
    pub fn new(tolerance: f64, max_depth: u32) -> Result<Self> {
        if tolerance.is_nan() || tolerance <= 0.0 || tolerance >= 1.0 {
            return Err(YieldError::invalid_parameter(
                "tolerance",
                format!("must lie in (0, 1), got {tolerance}"),
            ));
        }
        if max_depth == 0 {
            return Err(YieldError::invalid_parameter(
                "max_depth",
                "must be at least 1",
            ));
        }
        Ok(Self {
            tolerance,
            max_depth,
        })
    }

    /// Annual energy of `turbine` between `v_in` and `v_out` (m/s)
    ///
    /// Equal bounds give zero energy. A lower bound of zero is allowed for
    /// any shape, including `k < 1` where the density is infinite there.
    ///
    /// # Errors
    /// Returns `InvalidBounds` when the bounds are non-finite, negative or
    /// reversed, when the integral is not finite, or when a panel fails to
    /// converge within `max_depth`. Returns `InvalidParameter` for an
    /// availability outside `[0, 1]`.
    pub fn compute(
        &self,
        turbine: &TurbineModel,
        params: &WeibullParams,
        v_in: f64,
        v_out: f64,
        availability: f64,
    ) -> Result<AepResult> {
        if !(0.0..=1.0).contains(&availability) {
            return Err(YieldError::invalid_parameter(
                "availability",
                format!("must lie in [0, 1], got {availability}"),
            ));
        }
        if !v_in.is_finite() || !v_out.is_finite() {
            return Err(YieldError::invalid_bounds(v_in, v_out, "bounds must be finite"));
        }
        if v_in < 0.0 {
            return Err(YieldError::invalid_bounds(
                v_in,
                v_out,
                "lower bound must not be negative",
            ));
        }
        if v_out < v_in {
            return Err(YieldError::invalid_bounds(
                v_in,
                v_out,
                "upper bound lies below lower bound",
            ));
        }

        let integrand = |u: f64| {
            let power = turbine.power(u);
            // Zero output contributes nothing even where the density diverges
            if power == 0.0 {
                0.0
            } else {
                power * params.pdf(u)
            }
        };

        let singular = |u: f64| !integrand(u).is_finite();

        let edges = split_points(&turbine.breakpoints(), v_in, v_out);
        let coarse: f64 = edges
            .windows(2)
            .map(|w| {
                if singular(w[0]) {
                    let g = probability_integrand(turbine, params, w[1]);
                    composite_simpson(&g, params.cdf(w[0]), params.cdf(w[1]), COARSE_PANELS)
                } else {
                    composite_simpson(&integrand, w[0], w[1], COARSE_PANELS)
                }
            })
            .sum();
        let span = v_out - v_in;
        let scale = if coarse.is_finite() && coarse != 0.0 {
            coarse.abs()
        } else {
            1.0
        };

        let mut mean_power = 0.0;
        let mut evaluations = 0;
        for piece in edges.windows(2) {
            let share = self.tolerance * scale * (piece[1] - piece[0]) / span;
            let q = if singular(piece[0]) {
                let g = probability_integrand(turbine, params, piece[1]);
                let (lower, upper) = (params.cdf(piece[0]), params.cdf(piece[1]));
                adaptive_simpson(&g, lower, upper, share, self.max_depth)
            } else {
                adaptive_simpson(&integrand, piece[0], piece[1], share, self.max_depth)
            };
            evaluations += q.evaluations;
            if !q.converged {
                warn!(lower = piece[0], upper = piece[1], "Quadrature did not converge");
                return Err(YieldError::invalid_bounds(
                    v_in,
                    v_out,
                    format!(
                        "quadrature on [{}, {}] did not converge within depth {}",
                        piece[0], piece[1], self.max_depth
                    ),
                ));
            }
            mean_power += q.value;
        }

        if !mean_power.is_finite() {
            return Err(YieldError::invalid_bounds(
                v_in,
                v_out,
                format!("integral is not finite ({mean_power})"),
            ));
        }

        let gross_energy_kwh = mean_power * HOURS_PER_YEAR;
        let result = AepResult {
            energy_kwh: availability * gross_energy_kwh,
            gross_energy_kwh,
            mean_power_kw: mean_power,
            availability,
            rated_power_kw: *turbine.spec().rated_power(),
            evaluations,
        };
        debug!(
            turbine = turbine.kind(),
            shape = params.shape,
            scale = params.scale,
            energy_kwh = result.energy_kwh,
            evaluations,
            "Integrated annual energy"
        );
        Ok(result)
    }

    /// Annual energy between the turbine's own cut-in and cut-out speeds
    ///
    /// # Errors
    /// Same as [`AepIntegrator::compute`].
    pub fn compute_nameplate(
        &self,
        turbine: &TurbineModel,
        params: &WeibullParams,
        availability: f64,
    ) -> Result<AepResult> {
        let spec = turbine.spec();
        self.compute(turbine, params, *spec.v_in(), *spec.v_out(), availability)
    }
}

/// Power as a function of cumulative probability, `P(Q(p))`, capped at `upper`
fn probability_integrand<'a>(
    turbine: &'a TurbineModel,
    params: &'a WeibullParams,
    upper: f64,
) -> impl Fn(f64) -> f64 + 'a {
    move |p| {
        let u = if p < 1.0 {
            params.quantile(p).min(upper)
        } else {
            upper
        };
        turbine.power(u)
    }
}

/// Bounds plus every breakpoint strictly inside them, ascending
fn split_points(breakpoints: &[f64], lower: f64, upper: f64) -> Vec<f64> {
    let mut edges = Vec::with_capacity(breakpoints.len() + 2);
    edges.push(lower);
    for &b in breakpoints {
        if b > lower && b < upper && edges.last().is_some_and(|&last| b > last) {
            edges.push(b);
        }
    }
    if upper > lower {
        edges.push(upper);
    }
    edges
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::units::{Kilowatts, Meters, MetersPerSecond};
    use crate::turbine::{PowerCurve, TurbineSpec};
    use approx::assert_relative_eq;

    fn spec(rated: f64, v_in: f64, v_rated: f64, v_out: f64) -> TurbineSpec {
        TurbineSpec::new(
            Meters::new(126.0),
            Meters::new(90.0),
            Kilowatts::new(rated),
            MetersPerSecond::new(v_in),
            MetersPerSecond::new(v_rated),
            MetersPerSecond::new(v_out),
        )
        .unwrap()
    }

    fn constant_power(rated: f64) -> TurbineModel {
        let curve = PowerCurve::new([(0.0, rated), (50.0, rated)]).unwrap();
        TurbineModel::interpolated(spec(rated, 0.0, 1.0, 50.0), curve)
    }

    #[test]
    fn test_split_points() {
        assert_eq!(
            split_points(&[3.0, 11.4, 25.0], 0.0, 30.0),
            vec![0.0, 3.0, 11.4, 25.0, 30.0]
        );
        assert_eq!(split_points(&[3.0, 11.4, 25.0], 3.0, 25.0), vec![3.0, 11.4, 25.0]);
        assert_eq!(split_points(&[3.0, 11.4], 5.0, 5.0), vec![5.0]);
    }

    #[test]
    fn test_constant_power_matches_cdf() {
        let turbine = constant_power(1000.0);
        let params = WeibullParams::new(2.0, 8.0).unwrap();
        let aep = AepIntegrator::default()
            .compute(&turbine, &params, 4.0, 20.0, 1.0)
            .unwrap();

        let expected = 1000.0 * HOURS_PER_YEAR * (params.cdf(20.0) - params.cdf(4.0));
        assert_relative_eq!(aep.energy_kwh, expected, max_relative = 1e-4);
    }

    #[test]
    fn test_calm_lower_bound_with_diverging_density() {
        let turbine = constant_power(1000.0);
        for &shape in &[0.6, 0.8, 0.95] {
            let params = WeibullParams::new(shape, 7.0).unwrap();
            assert!(params.pdf(0.0).is_infinite());
            let aep = AepIntegrator::default()
                .compute(&turbine, &params, 0.0, 20.0, 1.0)
                .unwrap();
            let expected = 1000.0 * HOURS_PER_YEAR * params.cdf(20.0);
            assert_relative_eq!(aep.energy_kwh, expected, max_relative = 1e-9);
        }
    }

    #[test]
    fn test_calm_lower_bound_with_sloped_table() {
        let curve = PowerCurve::new([(0.0, 100.0), (10.0, 1100.0), (30.0, 1100.0)]).unwrap();
        let turbine = TurbineModel::interpolated(spec(1100.0, 0.0, 10.0, 30.0), curve);
        let params = WeibullParams::new(0.8, 6.0).unwrap();
        let aep = AepIntegrator::default()
            .compute_nameplate(&turbine, &params, 1.0)
            .unwrap();

        // Flat part closed form, sloped part on a fine grid away from the pole
        let flat = 1100.0 * (params.cdf(30.0) - params.cdf(10.0));
        let sloped = 100.0 * params.cdf(10.0)
            + composite_simpson(&|u| 100.0 * u * params.pdf(u), 1e-12, 10.0, 200_000);
        assert_relative_eq!(aep.mean_power_kw, flat + sloped, max_relative = 1e-4);
    }

    #[test]
    fn test_availability_scales_linearly() {
        let turbine = TurbineModel::analytical(TurbineSpec::nrel_5mw());
        let params = WeibullParams::new(2.0, 8.0).unwrap();
        let integrator = AepIntegrator::default();

        let full = integrator.compute_nameplate(&turbine, &params, 1.0).unwrap();
        let partial = integrator.compute_nameplate(&turbine, &params, 0.95).unwrap();
        let none = integrator.compute_nameplate(&turbine, &params, 0.0).unwrap();

        assert_relative_eq!(partial.energy_kwh, 0.95 * full.energy_kwh, max_relative = 1e-12);
        assert_eq!(none.energy_kwh, 0.0);
        assert_eq!(partial.gross_energy_kwh, full.gross_energy_kwh);
        let cf = full.capacity_factor();
        assert!(cf > 0.0 && cf < 1.0, "capacity factor {cf}");
    }

    #[test]
    fn test_equal_bounds_give_zero() {
        let turbine = TurbineModel::analytical(TurbineSpec::nrel_5mw());
        let params = WeibullParams::new(2.0, 8.0).unwrap();
        let aep = AepIntegrator::default()
            .compute(&turbine, &params, 7.0, 7.0, 1.0)
            .unwrap();
        assert_eq!(aep.energy_kwh, 0.0);
    }

    #[test]
    fn test_invalid_bounds_and_availability() {
        let turbine = TurbineModel::analytical(TurbineSpec::nrel_5mw());
        let params = WeibullParams::new(2.0, 8.0).unwrap();
        let integrator = AepIntegrator::default();

        assert!(matches!(
            integrator.compute(&turbine, &params, 25.0, 3.0, 1.0),
            Err(YieldError::InvalidBounds { .. })
        ));
        assert!(matches!(
            integrator.compute(&turbine, &params, -1.0, 3.0, 1.0),
            Err(YieldError::InvalidBounds { .. })
        ));
        assert!(matches!(
            integrator.compute(&turbine, &params, 3.0, f64::INFINITY, 1.0),
            Err(YieldError::InvalidBounds { .. })
        ));
        assert!(matches!(
            integrator.compute(&turbine, &params, 3.0, 25.0, 1.2),
            Err(YieldError::InvalidParameter {
                name: "availability",
                ..
            })
        ));
        assert!(integrator.compute(&turbine, &params, 3.0, 25.0, f64::NAN).is_err());
    }

    #[test]
    fn test_analytical_matches_fine_grid() {
        let turbine = TurbineModel::analytical(TurbineSpec::nrel_5mw());
        let params = WeibullParams::new(2.2, 9.0).unwrap();
        let aep = AepIntegrator::default()
            .compute_nameplate(&turbine, &params, 1.0)
            .unwrap();

        let spec = turbine.spec();
        let reference = [*spec.v_in(), *spec.v_rated(), *spec.v_out()]
            .windows(2)
            .map(|w| composite_simpson(&|u| turbine.power(u) * params.pdf(u), w[0], w[1], 4000))
            .sum::<f64>();
        assert_relative_eq!(aep.mean_power_kw, reference, max_relative = 1e-5);
        assert!(aep.evaluations > 0);
    }

    #[test]
    fn test_tolerance_config_validation() {
        assert!(AepIntegrator::new(0.0, 10).is_err());
        assert!(AepIntegrator::new(1.5, 10).is_err());
        assert!(AepIntegrator::new(1e-8, 0).is_err());
        assert!(AepIntegrator::new(1e-8, 30).is_ok());
    }
}
