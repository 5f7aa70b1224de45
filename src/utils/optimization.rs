//! Local optimizers used for smoothing-parameter estimation.
//!
//! Nelder-Mead respects box constraints by projection. L-BFGS runs on
//! argmin and leaves feasibility to the objective. Both stop early once an
//! optional wall-clock deadline has passed.

use std::cell::RefCell;
use std::time::Instant;

use argmin::core::{
    CostFunction, Error, Executor, Gradient, State, TerminationReason, TerminationStatus,
};
use argmin::solver::linesearch::MoreThuenteLineSearch;
use argmin::solver::quasinewton::LBFGS;

/// Outcome of a local optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// The best point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the best point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether a convergence criterion was met.
    pub converged: bool,
}

impl OptimizationResult {
    fn empty() -> Self {
        Self {
            optimal_point: vec![],
            optimal_value: f64::NAN,
            iterations: 0,
            converged: false,
        }
    }
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of simplex values.
    pub tolerance: f64,
    /// Reflection coefficient (default: 1.0).
    pub alpha: f64,
    /// Expansion coefficient (default: 2.0).
    pub gamma: f64,
    /// Contraction coefficient (default: 0.5).
    pub rho: f64,
    /// Shrinkage coefficient (default: 0.5).
    pub sigma: f64,
    /// Initial simplex step, relative to the bound width when bounded and to
    /// the coordinate magnitude otherwise (default: 0.05).
    pub initial_step: f64,
    /// Stop once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            deadline: None,
        }
    }
}

/// Perform Nelder-Mead simplex optimization.
///
/// # Arguments
/// * `objective` - The objective function to minimize
/// * `initial` - Initial guess for the optimal point
/// * `bounds` - Optional bounds for each dimension as (min, max) pairs
/// * `config` - Configuration parameters
///
/// # Example
/// ```
/// use anofox_ets::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// // Minimize (x-2)^2 + (y-3)^2
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] - 3.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!(result.converged);
/// assert!((result.optimal_point[0] - 2.0).abs() < 0.01);
/// assert!((result.optimal_point[1] - 3.0).abs() < 0.01);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> OptimizationResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return OptimizationResult::empty();
    }

    let start = project(initial, bounds);
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.clone());
    for i in 0..n {
        let mut vertex = start.clone();
        vertex[i] += simplex_step(&start, i, bounds, config.initial_step);
        simplex.push(vertex);
    }

    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };
    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        if past(config.deadline) {
            break;
        }
        iterations += 1;

        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        if values[worst].is_finite() && values[worst] - values[best] < config.tolerance {
            converged = true;
            break;
        }

        let centroid = centroid_without(&simplex, worst);
        let spread = simplex
            .iter()
            .map(|v| euclidean_distance(v, &centroid))
            .fold(0.0, f64::max);
        if spread < config.tolerance {
            converged = true;
            break;
        }

        let reflected = project(&lerp(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = project(&lerp(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (toward, reference) = if reflected_value < values[worst] {
            (reflected.clone(), reflected_value)
        } else {
            (simplex[worst].clone(), values[worst])
        };
        let contracted = project(&lerp(&centroid, &toward, config.rho), bounds);
        let contracted_value = eval(&contracted);
        if contracted_value < reference {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                simplex[i] = project(&lerp(&anchor, &simplex[i], config.sigma), bounds);
                values[i] = eval(&simplex[i]);
            }
        }
    }

    let best = (0..=n)
        .min_by(|&a, &b| values[a].total_cmp(&values[b]))
        .unwrap_or(0);

    OptimizationResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        converged,
    }
}

/// Configuration for the L-BFGS optimizer.
#[derive(Debug, Clone)]
pub struct LbfgsConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Number of curvature pairs kept.
    pub memory: usize,
    /// Stop when the gradient norm falls below this.
    pub gradient_tolerance: f64,
    /// Stop when the change in objective between iterations falls below this.
    pub value_tolerance: f64,
    /// Stop once this instant has passed.
    pub deadline: Option<Instant>,
}

impl Default for LbfgsConfig {
    fn default() -> Self {
        Self {
            max_iter: 300,
            memory: 6,
            gradient_tolerance: 1e-6,
            value_tolerance: 1e-10,
            deadline: None,
        }
    }
}

type MoreThuente = MoreThuenteLineSearch<Vec<f64>, Vec<f64>, f64>;
type LbfgsMoreThuente = LBFGS<MoreThuente, Vec<f64>, Vec<f64>, f64>;

/// Points seen by the solver: the most recent evaluation and the best finite one.
struct Evaluations {
    last: Option<(Vec<f64>, f64, Vec<f64>)>,
    best: Option<(Vec<f64>, f64)>,
}

/// A value-and-gradient closure exposed to argmin.
///
/// argmin asks for the cost and the gradient separately; both are served from
/// one call of the closure. Non-finite evaluations report `penalty` with a
/// zero gradient.
struct DifferentiableProblem<'a, F> {
    objective: &'a F,
    penalty: f64,
    evaluations: &'a RefCell<Evaluations>,
}

impl<F> DifferentiableProblem<'_, F>
where
    F: Fn(&[f64]) -> (f64, Vec<f64>),
{
    fn evaluate(&self, x: &[f64]) -> (f64, Vec<f64>) {
        if let Some((point, value, gradient)) = &self.evaluations.borrow().last {
            if point.as_slice() == x {
                return (*value, gradient.clone());
            }
        }

        let (value, gradient) = (self.objective)(x);
        let finite = value.is_finite() && gradient.iter().all(|g| g.is_finite());
        let (value, gradient) = if finite {
            (value, gradient)
        } else {
            (self.penalty, vec![0.0; x.len()])
        };

        let mut evaluations = self.evaluations.borrow_mut();
        let improves = evaluations.best.as_ref().map_or(true, |(_, best)| value < *best);
        if finite && improves {
            evaluations.best = Some((x.to_vec(), value));
        }
        evaluations.last = Some((x.to_vec(), value, gradient.clone()));
        (value, gradient)
    }
}

impl<F> CostFunction for DifferentiableProblem<'_, F>
where
    F: Fn(&[f64]) -> (f64, Vec<f64>),
{
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> Result<Self::Output, Error> {
        Ok(self.evaluate(param).0)
    }
}

impl<F> Gradient for DifferentiableProblem<'_, F>
where
    F: Fn(&[f64]) -> (f64, Vec<f64>),
{
    type Param = Vec<f64>;
    type Gradient = Vec<f64>;

    fn gradient(&self, param: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(self.evaluate(param).1)
    }
}

/// Minimize a differentiable function with L-BFGS and a More-Thuente line
/// search.
///
/// `objective` returns the value and gradient at a point. The search is
/// unconstrained, so callers map the raw vector into their feasible region
/// inside `objective`. The best finite point evaluated is returned, which
/// is the start point when the solver makes no progress or fails.
///
/// # Example
/// ```
/// use anofox_ets::utils::optimization::{lbfgs, LbfgsConfig};
///
/// let result = lbfgs(
///     |x| ((x[0] - 1.0).powi(2), vec![2.0 * (x[0] - 1.0)]),
///     &[4.0],
///     LbfgsConfig::default(),
/// );
/// assert!((result.optimal_point[0] - 1.0).abs() < 1e-6);
/// ```
pub fn lbfgs<F>(objective: F, initial: &[f64], config: LbfgsConfig) -> OptimizationResult
where
    F: Fn(&[f64]) -> (f64, Vec<f64>),
{
    if initial.is_empty() {
        return OptimizationResult::empty();
    }

    let (start_value, start_gradient) = objective(initial);
    if !start_value.is_finite()
        || start_gradient.iter().any(|g| !g.is_finite())
        || past(config.deadline)
    {
        return OptimizationResult {
            optimal_point: initial.to_vec(),
            optimal_value: start_value,
            iterations: 0,
            converged: false,
        };
    }

    let evaluations = RefCell::new(Evaluations {
        last: Some((initial.to_vec(), start_value, start_gradient)),
        best: Some((initial.to_vec(), start_value)),
    });
    let problem = DifferentiableProblem {
        objective: &objective,
        penalty: start_value.abs().max(1.0) * 1e6,
        evaluations: &evaluations,
    };

    let (iterations, converged) = run_lbfgs(problem, initial, &config).unwrap_or((0, false));

    let (optimal_point, optimal_value) = evaluations
        .into_inner()
        .best
        .unwrap_or_else(|| (initial.to_vec(), start_value));

    OptimizationResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
    }
}

/// Drive argmin's L-BFGS to termination, returning the iteration count and
/// whether the solver reported convergence.
fn run_lbfgs<F>(
    problem: DifferentiableProblem<'_, F>,
    initial: &[f64],
    config: &LbfgsConfig,
) -> Result<(usize, bool), Error>
where
    F: Fn(&[f64]) -> (f64, Vec<f64>),
{
    let solver = LbfgsMoreThuente::new(MoreThuente::new(), config.memory.max(1))
        .with_tolerance_grad(config.gradient_tolerance)?
        .with_tolerance_cost(config.value_tolerance)?;

    let start = initial.to_vec();
    let max_iters = config.max_iter as u64;
    let mut executor =
        Executor::new(problem, solver).configure(|state| state.param(start).max_iters(max_iters));
    if let Some(deadline) = config.deadline {
        executor = executor.timeout(deadline.saturating_duration_since(Instant::now()));
    }

    let result = executor.run()?;
    let state = result.state();
    let converged = matches!(
        state.get_termination_status(),
        TerminationStatus::Terminated(TerminationReason::SolverConverged)
    );
    Ok((state.get_iter() as usize, converged))
}

/// Initial simplex offset for coordinate `i`, pointing into the box.
fn simplex_step(x: &[f64], i: usize, bounds: Option<&[(f64, f64)]>, relative: f64) -> f64 {
    match bounds.and_then(|b| b.get(i)) {
        Some(&(lo, hi)) if hi > lo => {
            let step = relative * (hi - lo);
            if x[i] + step <= hi {
                step
            } else {
                -step
            }
        }
        _ if x[i].abs() > 1e-10 => relative * x[i].abs(),
        _ => relative,
    }
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

/// `from + t * (to - from)`.
fn lerp(from: &[f64], to: &[f64], t: f64) -> Vec<f64> {
    from.iter().zip(to).map(|(a, b)| a + t * (b - a)).collect()
}

/// Centroid of simplex excluding one vertex.
fn centroid_without(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];
    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v;
            }
        }
    }
    for c in &mut centroid {
        *c /= count;
    }
    centroid
}

/// Clamp a point into the bounds.
fn project(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .enumerate()
            .map(|(i, &x)| match b.get(i) {
                Some(&(lo, hi)) => x.max(lo).min(hi),
                None => x,
            })
            .collect(),
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
