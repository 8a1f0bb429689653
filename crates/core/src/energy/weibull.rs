//! Two-parameter Weibull wind-speed distribution
//!
//! ```text
//! f(u) = (k / A) · (u / A)^(k-1) · exp(-(u / A)^k),   u ≥ 0
//! F(u) = 1 - exp(-(u / A)^k)
//! ```
//!
//! `k` is the shape (dimensionless), `A` the scale in m/s.
//!
//! # Maximum-likelihood fit
//!
//! The scale is eliminated analytically, leaving one equation in `k`:
//!
//! ```text
//! g(k) = Σ xᵏ ln x / Σ xᵏ - 1/k - mean(ln x) = 0
//! ```
//!
//! `g` is strictly increasing, tends to `-∞` as `k → 0` and to a positive
//! limit as `k → ∞` unless every value is equal. The root is found by Newton
//! iteration kept inside a bracket; a step leaving the bracket falls back to
//! bisection. Values are divided by the sample maximum before raising them to
//! `k`, so no term exceeds one.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, YieldError};

/// Fitted Weibull parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullParams {
    /// Shape parameter k
    pub shape: f64,
    /// Scale parameter A (m/s)
    pub scale: f64,
}

impl WeibullParams {
    /// Create parameters from shape `k` and scale `A`
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless both are finite and positive.
    pub fn new(shape: f64, scale: f64) -> Result<Self> {
        if !shape.is_finite() || shape <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "shape",
                format!("must be finite and positive, got {shape}"),
            ));
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "scale",
                format!("must be finite and positive, got {scale}"),
            ));
        }
        Ok(Self { shape, scale })
    }

    /// Probability density at speed `u`
    ///
    /// Zero for negative speeds. At `u = 0` the density is infinite for
    /// `k < 1`, `1/A` for `k = 1` and zero otherwise.
    #[inline]
    pub fn pdf(&self, u: f64) -> f64 {
        if u < 0.0 {
            return 0.0;
        }
        let x = u / self.scale;
        (self.shape / self.scale) * x.powf(self.shape - 1.0) * (-x.powf(self.shape)).exp()
    }

    /// Cumulative probability `P(U ≤ u)`
    #[inline]
    pub fn cdf(&self, u: f64) -> f64 {
        if u <= 0.0 {
            return 0.0;
        }
        -(-(u / self.scale).powf(self.shape)).exp_m1()
    }

    /// Speed below which a fraction `p` of the time falls
    ///
    /// Returns NaN outside `[0, 1)`.
    #[inline]
    pub fn quantile(&self, p: f64) -> f64 {
        if !(0.0..1.0).contains(&p) {
            return f64::NAN;
        }
        self.scale * (-(-p).ln_1p()).powf(1.0 / self.shape)
    }

    /// Mean speed `A · Γ(1 + 1/k)` (m/s)
    pub fn mean(&self) -> f64 {
        self.scale * gamma(1.0 + 1.0 / self.shape)
    }

    /// Draw `n` speeds by inverse-transform sampling
    pub fn sample<R: Rng>(&self, rng: &mut R, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.quantile(rng.random::<f64>())).collect()
    }
}

/// Gamma function for positive arguments (Lanczos, g = 7)
fn gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const COEFFS: [f64; 9] = [
        0.9999999999998099,
        676.5203681218851,
        -1259.1392167224028,
        771.3234287776531,
        -176.6150291621406,
        12.507343278686905,
        -0.13857109526572012,
        9.984369578019572e-6,
        1.5056327351493116e-7,
    ];

    if x < 0.5 {
        // Reflection formula
        return std::f64::consts::PI / ((std::f64::consts::PI * x).sin() * gamma(1.0 - x));
    }
    let x = x - 1.0;
    let mut acc = COEFFS[0];
    for (i, &c) in COEFFS.iter().enumerate().skip(1) {
        acc += c / (x + i as f64);
    }
    let t = x + G + 0.5;
    (2.0 * std::f64::consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * acc
}

/// Maximum-likelihood Weibull fitter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullFitter {
    /// Relative convergence tolerance on the shape parameter
    pub tolerance: f64,
    /// Iteration limit shared by bracketing and root finding
    pub max_iterations: usize,
}

impl Default for WeibullFitter {
    fn default() -> Self {
        Self {
            tolerance: 1e-10,
            max_iterations: 200,
        }
    }
}

impl WeibullFitter {
    /// Create a fitter with a custom tolerance and iteration limit
    ///
    /// # Errors
    /// Returns `InvalidParameter` for a non-positive tolerance or a zero
    /// iteration limit.
    pub fn new(tolerance: f64, max_iterations: usize) -> Result<Self> {
        if !tolerance.is_finite() || tolerance <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "tolerance",
                format!("must be finite and positive, got {tolerance}"),
            ));
        }
        if max_iterations == 0 {
            return Err(YieldError::invalid_parameter(
                "max_iterations",
                "must be at least 1",
            ));
        }
        Ok(Self {
            tolerance,
            max_iterations,
        })
    }

    /// Fit shape and scale to a speed sample
    ///
    /// Non-finite and non-positive values are dropped before fitting.
    ///
    /// # Errors
    /// Returns `FitFailure` when fewer than two usable values remain, when all
    /// usable values are equal, or when the shape equation does not converge
    /// within `max_iterations`.
    pub fn fit(&self, sample: &[f64]) -> Result<WeibullParams> {
        let values: Vec<f64> = sample
            .iter()
            .copied()
            .filter(|x| x.is_finite() && *x > 0.0)
            .collect();
        let dropped = sample.len() - values.len();
        if dropped > 0 {
            debug!(dropped, kept = values.len(), "Discarded unusable wind speeds");
        }

        let n = values.len();
        if n < 2 {
            return Err(YieldError::fit_failure(
                n,
                "at least two finite positive values are required",
            ));
        }

        let max = values.iter().copied().fold(f64::MIN, f64::max);
        let min = values.iter().copied().fold(f64::MAX, f64::min);
        if max - min <= f64::EPSILON * max {
            return Err(YieldError::fit_failure(
                n,
                format!("degenerate sample, every value equals {max}"),
            ));
        }

        let count = n as f64;
        let logs: Vec<f64> = values.iter().map(|x| (x / max).ln()).collect();
        let mean_log = logs.iter().sum::<f64>() / count;
        let equation = ShapeEquation {
            logs: &logs,
            mean_log,
        };

        let shape = self.solve_shape(&equation, &values)?;
        let (power_sum, _, _) = equation.power_sums(shape);
        let scale = max * (power_sum / count).powf(1.0 / shape);

        debug!(shape, scale, n, "Fitted Weibull distribution");
        WeibullParams::new(shape, scale)
            .map_err(|e| YieldError::fit_failure(n, format!("fit produced {e}")))
    }

    fn solve_shape(&self, equation: &ShapeEquation<'_>, values: &[f64]) -> Result<f64> {
        let n = values.len();
        let not_converged = || {
            YieldError::fit_failure(
                n,
                format!("shape equation did not converge in {} iterations", self.max_iterations),
            )
        };

        // Start from the moment estimate k ≈ (σ/μ)^-1.086
        let count = n as f64;
        let mean = values.iter().sum::<f64>() / count;
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / count;
        let mut shape = (variance.sqrt() / mean).powf(-1.086).clamp(0.05, 100.0);

        // Expand a bracket [lo, hi] with g(lo) < 0 < g(hi)
        let (mut lo, mut hi) = (shape, shape);
        let mut iterations = 0;
        if equation.value(shape) < 0.0 {
            while equation.value(hi) < 0.0 {
                lo = hi;
                hi *= 2.0;
                iterations += 1;
                if iterations >= self.max_iterations || !hi.is_finite() {
                    return Err(not_converged());
                }
            }
        } else {
            while equation.value(lo) > 0.0 {
                hi = lo;
                lo /= 2.0;
                iterations += 1;
                if iterations >= self.max_iterations {
                    return Err(not_converged());
                }
            }
        }

        for _ in iterations..self.max_iterations {
            let (g, slope) = equation.value_and_slope(shape);
            if g == 0.0 {
                return Ok(shape);
            }
            if g < 0.0 {
                lo = shape;
            } else {
                hi = shape;
            }

            let mut next = shape - g / slope;
            if !next.is_finite() || next <= lo || next >= hi {
                next = 0.5 * (lo + hi);
            }
            if (next - shape).abs() <= self.tolerance * next {
                return Ok(next);
            }
            shape = next;
        }
        Err(not_converged())
    }
}

/// Profile likelihood equation in the shape parameter
struct ShapeEquation<'a> {
    /// `ln(x / max)` for every usable value
    logs: &'a [f64],
    mean_log: f64,
}

impl ShapeEquation<'_> {
    /// `(Σ yᵏ, Σ yᵏ ln y, Σ yᵏ ln² y)` with `y = x / max`
    fn power_sums(&self, shape: f64) -> (f64, f64, f64) {
        self.logs.iter().fold((0.0, 0.0, 0.0), |(s0, s1, s2), &l| {
            let w = (shape * l).exp();
            (s0 + w, s1 + w * l, s2 + w * l * l)
        })
    }

    fn value(&self, shape: f64) -> f64 {
        self.value_and_slope(shape).0
    }

    fn value_and_slope(&self, shape: f64) -> (f64, f64) {
        let (s0, s1, s2) = self.power_sums(shape);
        let ratio = s1 / s0;
        let value = ratio - 1.0 / shape - self.mean_log;
        let slope = s2 / s0 - ratio * ratio + 1.0 / (shape * shape);
        (value, slope)
    }
}

/// Density-normalized speed histogram with the fitted PDF alongside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedHistogram {
    /// Bin edges (m/s), one more than the number of bins
    pub edges: Vec<f64>,
    /// Empirical density per bin (1/(m/s)); sums to 1 when weighted by width
    pub density: Vec<f64>,
    /// Fitted PDF at each bin center
    pub fitted: Vec<f64>,
}

impl SpeedHistogram {
    /// Bin `sample` into `bins` equal-width bins from 0 to the sample maximum
    ///
    /// Non-finite and negative values are ignored. Calm (zero) speeds are
    /// kept and land in the first bin, although the fitter drops them.
    ///
    /// # Errors
    /// Returns `InvalidParameter` for zero bins or a sample with no positive
    /// finite value.
    pub fn new(sample: &[f64], bins: usize, params: &WeibullParams) -> Result<Self> {
        if bins == 0 {
            return Err(YieldError::invalid_parameter("bins", "must be at least 1"));
        }
        let values: Vec<f64> = sample
            .iter()
            .copied()
            .filter(|x| x.is_finite() && *x >= 0.0)
            .collect();
        let max = values.iter().copied().fold(0.0, f64::max);
        if max <= 0.0 {
            return Err(YieldError::invalid_parameter(
                "sample",
                "needs at least one finite positive speed",
            ));
        }

        let width = max / bins as f64;
        let edges: Vec<f64> = (0..=bins).map(|i| i as f64 * width).collect();
        let mut counts = vec![0usize; bins];
        for &x in &values {
            // The maximum lands in the last bin
            let index = ((x / width) as usize).min(bins - 1);
            counts[index] += 1;
        }

        let norm = values.len() as f64 * width;
        let density = counts.iter().map(|&c| c as f64 / norm).collect();
        let fitted = edges
            .windows(2)
            .map(|w| params.pdf(0.5 * (w[0] + w[1])))
            .collect();

        Ok(Self {
            edges,
            density,
            fitted,
        })
    }

    /// Bin centers (m/s)
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect()
    }

    /// Bin width (m/s)
    pub fn bin_width(&self) -> f64 {
        self.edges[1] - self.edges[0]
    }
}
