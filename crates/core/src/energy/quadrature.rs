//! Adaptive Simpson quadrature
//!
//! Each panel is compared against its two halves; when the difference is
//! within fifteen times the panel's share of the tolerance the Richardson
//! corrected value is accepted, otherwise both halves are refined with half
//! the tolerance each.

/// Outcome of one adaptive integration
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Quadrature {
    /// Integral estimate
    pub value: f64,
    /// Whether every panel met its tolerance before the depth limit
    pub converged: bool,
    /// Integrand evaluations spent
    pub evaluations: usize,
}

/// Composite Simpson estimate over `panels` equal panels
pub(crate) fn composite_simpson<F>(f: &F, lower: f64, upper: f64, panels: usize) -> f64
where
    F: Fn(f64) -> f64,
{
    let panels = panels.max(1);
    let h = (upper - lower) / panels as f64;
    let mut sum = 0.0;
    for i in 0..panels {
        let left = lower + i as f64 * h;
        let right = left + h;
        sum += simpson(f(left), f(0.5 * (left + right)), f(right), h);
    }
    sum
}

/// Integrate `f` over `[lower, upper]` to an absolute tolerance
pub(crate) fn adaptive_simpson<F>(
    f: &F,
    lower: f64,
    upper: f64,
    tolerance: f64,
    max_depth: u32,
) -> Quadrature
where
    F: Fn(f64) -> f64,
{
    let mut state = Quadrature {
        value: 0.0,
        converged: true,
        evaluations: 3,
    };
    if upper <= lower {
        state.evaluations = 0;
        return state;
    }

    let mid = 0.5 * (lower + upper);
    let panel = Panel {
        lower,
        upper,
        f_lower: f(lower),
        f_mid: f(mid),
        f_upper: f(upper),
    };
    state.value = refine(f, &panel, panel.estimate(), tolerance, max_depth, &mut state);
    state
}

#[derive(Clone, Copy)]
struct Panel {
    lower: f64,
    upper: f64,
    f_lower: f64,
    f_mid: f64,
    f_upper: f64,
}

impl Panel {
    fn estimate(&self) -> f64 {
        simpson(self.f_lower, self.f_mid, self.f_upper, self.upper - self.lower)
    }
}

fn refine<F>(
    f: &F,
    panel: &Panel,
    whole: f64,
    tolerance: f64,
    depth: u32,
    state: &mut Quadrature,
) -> f64
where
    F: Fn(f64) -> f64,
{
    let mid = 0.5 * (panel.lower + panel.upper);
    let left = Panel {
        lower: panel.lower,
        upper: mid,
        f_lower: panel.f_lower,
        f_mid: f(0.5 * (panel.lower + mid)),
        f_upper: panel.f_mid,
    };
    let right = Panel {
        lower: mid,
        upper: panel.upper,
        f_lower: panel.f_mid,
        f_mid: f(0.5 * (mid + panel.upper)),
        f_upper: panel.f_upper,
    };
    state.evaluations += 2;

    let left_estimate = left.estimate();
    let right_estimate = right.estimate();
    let halves = left_estimate + right_estimate;
    let delta = halves - whole;

    if delta.abs() <= 15.0 * tolerance {
        return halves + delta / 15.0;
    }
    if depth == 0 || !delta.is_finite() {
        state.converged = false;
        return halves;
    }

    refine(f, &left, left_estimate, 0.5 * tolerance, depth - 1, state)
        + refine(f, &right, right_estimate, 0.5 * tolerance, depth - 1, state)
}

#[inline]
fn simpson(f_lower: f64, f_mid: f64, f_upper: f64, width: f64) -> f64 {
    width / 6.0 * (f_lower + 4.0 * f_mid + f_upper)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cubic_is_exact() {
        let q = adaptive_simpson(&|x: f64| x.powi(3) - 2.0 * x, 0.0, 2.0, 1e-12, 20);
        assert!(q.converged);
        assert_relative_eq!(q.value, 0.0, epsilon = 1e-12);
        assert_eq!(q.evaluations, 5);
    }

    #[test]
    fn test_smooth_integrand_meets_tolerance() {
        let q = adaptive_simpson(&f64::sin, 0.0, std::f64::consts::PI, 1e-10, 40);
        assert!(q.converged);
        assert_relative_eq!(q.value, 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_depth_limit_flags_non_convergence() {
        let q = adaptive_simpson(&|x: f64| x.sqrt().recip(), 0.0, 1.0, 1e-12, 4);
        assert!(!q.converged);
    }

    #[test]
    fn test_empty_interval() {
        let q = adaptive_simpson(&f64::exp, 3.0, 3.0, 1e-9, 10);
        assert_eq!(q.value, 0.0);
        assert!(q.converged);
        assert_eq!(q.evaluations, 0);
    }

    #[test]
    fn test_composite_estimate() {
        let estimate = composite_simpson(&|x: f64| x * x, 0.0, 3.0, 8);
        assert_relative_eq!(estimate, 9.0, epsilon = 1e-12);
    }
}
