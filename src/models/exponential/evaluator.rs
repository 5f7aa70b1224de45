//! Parameter estimation for a single ETS candidate.
//!
//! Each candidate goes through a coarse grid over the smoothing constants,
//! an optional grid over the starting level and trend, and a bounded local
//! optimizer seeded from the best grid point. Simplex search is used where
//! the objective is well behaved; L-BFGS with forward-mode gradients handles
//! the multiplicative-season and damped additive-season shapes. L-BFGS runs
//! over the raw vector and relies on `decode` to clamp it into the bounds.

use std::time::Instant;

use tracing::trace;

use super::dual::{self, Dual, Real};
use super::ets::{
    apply_overrides, run_recursion, RunSummary, SeasonalType, SmoothingConfig, TREND_RATIO_BOUNDS,
};
use super::init::initial_state;
use super::recursion::{RecursionState, StepParams};
use super::spec::CandidateConfig;
use crate::utils::optimization::{
    lbfgs, nelder_mead, LbfgsConfig, NelderMeadConfig, OptimizationResult,
};

/// Hard bounds for alpha and beta.
pub const ALPHA_BOUNDS: (f64, f64) = (1e-4, 0.9999);
/// Hard bounds for gamma.
pub const GAMMA_BOUNDS: (f64, f64) = (1e-4, 0.9999);
/// Bounds for the damping parameter.
pub const PHI_BOUNDS: (f64, f64) = (0.8, 0.98);

const MULTIPLICATIVE_ALPHA_UPPER: f64 = 0.6;
const MULTIPLICATIVE_GAMMA_UPPER: f64 = 0.2;
const POSITIVE_LEVEL_FLOOR: f64 = 1e-3;
const SIMPLEX_STEP: f64 = 0.1;

const ALPHA_GRID: [f64; 5] = [0.1, 0.3, 0.5, 0.7, 0.9];
const PHI_GRID: [f64; 5] = [0.80, 0.85, 0.90, 0.95, 0.98];
const MULTIPLICATIVE_GAMMA_GRID: [f64; 3] = [0.01, 0.05, 0.10];
const ADDITIVE_GAMMA_GRID: [f64; 4] = [0.05, 0.2, 0.5, 0.8];

/// Quantity minimized when estimating smoothing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OptimizationCriterion {
    /// Negative concentrated log-likelihood
    #[default]
    Likelihood,
    /// In-sample mean squared error
    MSE,
    /// Average multi-step mean squared error
    AMSE,
    /// Residual standard deviation
    Sigma,
}

/// Smoothing parameters held fixed during the search.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PinnedParameters {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    pub phi: Option<f64>,
}

/// Goodness-of-fit summary of one fitted configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoETSMetrics {
    pub log_likelihood: f64,
    pub mse: f64,
    pub amse: f64,
    pub sigma: f64,
    pub aic: f64,
    pub aicc: f64,
    pub bic: f64,
}

impl AutoETSMetrics {
    /// Derive the information criteria for `n` observations and `k` parameters.
    pub fn new(log_likelihood: f64, mse: f64, amse: f64, n: usize, k: usize) -> Self {
        let kf = k as f64;
        let nf = n as f64;
        let (aic, bic) = if log_likelihood.is_finite() {
            (
                -2.0 * log_likelihood + 2.0 * kf,
                -2.0 * log_likelihood + kf * nf.ln(),
            )
        } else {
            (f64::INFINITY, f64::INFINITY)
        };
        let aicc = if n <= k + 1 {
            f64::INFINITY
        } else {
            aic + 2.0 * kf * (kf + 1.0) / (nf - kf - 1.0)
        };
        Self {
            log_likelihood,
            mse,
            amse,
            sigma: mse.sqrt(),
            aic,
            aicc,
            bic,
        }
    }

    fn from_summary<T: Real>(
        summary: &RunSummary<T>,
        config: &SmoothingConfig,
    ) -> Self {
        Self::new(
            summary.log_likelihood(config.error()).value(),
            summary.mse().value(),
            summary.amse.value(),
            summary.n,
            config.parameter_count(),
        )
    }

    /// Whether these metrics rank strictly ahead of `other`.
    ///
    /// A finite AICc beats an infinite one; lower AICc wins between finite
    /// values, and AIC decides when neither AICc is finite.
    pub fn improves_on(&self, other: &AutoETSMetrics) -> bool {
        match (self.aicc.is_finite(), other.aicc.is_finite()) {
            (true, true) => self.aicc < other.aicc,
            (true, false) => true,
            (false, true) => false,
            (false, false) => self.aic < other.aic,
        }
    }

    /// A fit usable by the continuous optimizer.
    fn is_admissible(&self) -> bool {
        self.aicc.is_finite() && self.mse > 0.0 && self.log_likelihood < 0.0
    }

    fn objective(&self, criterion: OptimizationCriterion) -> f64 {
        let value = match criterion {
            OptimizationCriterion::Likelihood => -self.log_likelihood,
            OptimizationCriterion::MSE => self.mse,
            OptimizationCriterion::AMSE => self.amse,
            OptimizationCriterion::Sigma => self.sigma,
        };
        if value.is_finite() {
            value
        } else {
            f64::INFINITY
        }
    }
}

/// Local optimizer used in the continuous stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptimizerKind {
    NelderMead,
    Lbfgs,
}

/// Outcome of the continuous stage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OptimizerRun {
    pub kind: Option<OptimizerKind>,
    pub iterations: usize,
    pub converged: bool,
    pub objective: f64,
}

impl Default for OptimizerRun {
    fn default() -> Self {
        Self {
            kind: None,
            iterations: 0,
            converged: false,
            objective: f64::NAN,
        }
    }
}

/// A fully scored parameterization of one candidate.
#[derive(Debug, Clone)]
pub(crate) struct Scored {
    pub config: SmoothingConfig,
    pub metrics: AutoETSMetrics,
    pub level0: f64,
    pub trend0: Option<f64>,
    /// Whether `level0`/`trend0` differ from the heuristic initial state.
    pub state_override: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct CandidateResult {
    pub candidate: CandidateConfig,
    /// Best admissible parameterization; `None` when the candidate failed.
    pub best: Option<Scored>,
    pub optimizer: OptimizerRun,
}

impl CandidateResult {
    pub fn is_valid(&self) -> bool {
        self.best.is_some()
    }
}

/// Settings shared by every candidate of one search.
#[derive(Debug, Clone)]
pub(crate) struct SearchSettings {
    pub criterion: OptimizationCriterion,
    pub nmse: usize,
    pub max_iterations: usize,
    pub pinned: PinnedParameters,
    pub state_search: bool,
    pub deadline: Option<Instant>,
}

/// Range statistics of the series.
#[derive(Debug, Clone, Copy)]
struct DataSummary {
    min: f64,
    max: f64,
    range: f64,
    trend_base: f64,
    ratio_base: f64,
    non_positive: bool,
}

impl DataSummary {
    fn new(values: &[f64]) -> Self {
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let (trend_base, ratio_base) = match (values, values.last()) {
            ([first, second, ..], Some(last)) => {
                let steps = (values.len() - 1) as f64;
                let ratio = (last.max(1e-3) / first.max(1e-3)).powf(1.0 / steps);
                (
                    second - first,
                    dual::clamp(ratio, TREND_RATIO_BOUNDS.0, TREND_RATIO_BOUNDS.1),
                )
            }
            _ => (0.0, 1.0),
        };
        Self {
            min,
            max,
            range: (max - min).max(1.0),
            trend_base,
            ratio_base,
            non_positive: values.iter().any(|&v| v <= 0.0),
        }
    }
}

/// Per-candidate bounds.
#[derive(Debug, Clone, Copy)]
struct Limits {
    alpha_upper: f64,
    gamma_upper: f64,
    level: (f64, f64),
    trend: (f64, f64),
    requires_positive: bool,
}

/// Which quantities the continuous stage optimizes, in vector order.
#[derive(Debug, Clone, Copy)]
struct Layout {
    alpha: bool,
    beta: bool,
    phi: bool,
    gamma: bool,
    trend: bool,
}

/// Parameters decoded from an optimizer vector.
#[derive(Debug, Clone, Copy)]
struct Point<T> {
    alpha: T,
    beta: T,
    phi: T,
    gamma: T,
    level: T,
    trend: Option<T>,
}

impl<T: Real> Point<T> {
    fn primal(&self) -> Point<f64> {
        Point {
            alpha: self.alpha.value(),
            beta: self.beta.value(),
            phi: self.phi.value(),
            gamma: self.gamma.value(),
            level: self.level.value(),
            trend: self.trend.map(Real::value),
        }
    }
}

/// Continuous problem posed for one seeded candidate.
struct Problem<'p> {
    template: &'p SmoothingConfig,
    base: &'p RecursionState<f64>,
    layout: Layout,
    limits: Limits,
}

/// Admissible gamma range for given alpha and phi.
pub(crate) fn gamma_band(alpha: f64, phi: f64, hard_upper: f64) -> (f64, f64) {
    let lower = (1.0 - 1.0 / phi - alpha).max(0.0).max(GAMMA_BOUNDS.0);
    let upper = (1.0 + 1.0 / phi - alpha).min(hard_upper);
    (lower, upper.max(lower))
}

/// Estimates parameters for candidates over one series.
pub(crate) struct CandidateEvaluator<'a> {
    values: &'a [f64],
    season_length: usize,
    settings: &'a SearchSettings,
    data: DataSummary,
}

impl<'a> CandidateEvaluator<'a> {
    pub fn new(values: &'a [f64], season_length: usize, settings: &'a SearchSettings) -> Self {
        Self {
            values,
            season_length,
            settings,
            data: DataSummary::new(values),
        }
    }

    /// Run all stages for `candidate`.
    pub fn evaluate(&self, candidate: &CandidateConfig) -> CandidateResult {
        let mut result = CandidateResult {
            candidate: *candidate,
            best: None,
            optimizer: OptimizerRun::default(),
        };

        if candidate.requires_positive() && self.data.non_positive {
            return result;
        }
        let season_length = if candidate.season.has_season() {
            self.season_length
        } else {
            1
        };
        let minimum = if candidate.season.has_season() {
            (season_length + 1).max(4)
        } else {
            2
        };
        if self.values.len() < minimum {
            return result;
        }

        let base = initial_state(
            self.values,
            candidate.trend_type(),
            candidate.season,
            season_length,
        );
        let limits = self.limits(candidate);

        let Some(mut seed) = self.coarse_search(candidate, &base, &limits) else {
            return result;
        };

        if self.settings.state_search {
            self.state_search(candidate, &base, &limits, &mut seed);
        }

        let (best, run) = self.refine(&base, &limits, seed);
        result.best = Some(best);
        result.optimizer = run;
        result
    }

    fn limits(&self, candidate: &CandidateConfig) -> Limits {
        let d = &self.data;
        let requires_positive = candidate.requires_positive();
        let (mut lower, upper) = if requires_positive {
            ((0.1 * d.min).max(1.0), 10.0 * d.max)
        } else {
            (d.min - 2.0 * d.range, d.max + 2.0 * d.range)
        };
        if requires_positive {
            lower = lower.max(POSITIVE_LEVEL_FLOOR);
        }

        let trend = if candidate.trend.is_multiplicative() {
            TREND_RATIO_BOUNDS
        } else {
            let bound = (1.5 * d.range).max(1.0);
            (-bound, bound)
        };

        let multiplicative_season = candidate.season == SeasonalType::Multiplicative;
        Limits {
            alpha_upper: if multiplicative_season {
                MULTIPLICATIVE_ALPHA_UPPER
            } else {
                ALPHA_BOUNDS.1
            },
            gamma_upper: if multiplicative_season {
                MULTIPLICATIVE_GAMMA_UPPER
            } else {
                GAMMA_BOUNDS.1
            },
            level: (lower, upper.max(lower)),
            trend,
            requires_positive,
        }
    }

    fn score(
        &self,
        config: &SmoothingConfig,
        base: &RecursionState<f64>,
        level0: Option<f64>,
        trend0: Option<f64>,
    ) -> AutoETSMetrics {
        let start = apply_overrides(config, base, level0, trend0, None);
        let summary = run_recursion(
            self.values,
            config.error(),
            config.shape(),
            &config.step_params(),
            start,
            self.settings.nmse,
            None,
        );
        AutoETSMetrics::from_summary(&summary, config)
    }

    /// Stage A: nested grid over alpha, beta, phi and gamma.
    fn coarse_search(
        &self,
        candidate: &CandidateConfig,
        base: &RecursionState<f64>,
        limits: &Limits,
    ) -> Option<Scored> {
        let pinned = &self.settings.pinned;
        let trend = candidate.trend_type();

        let alphas = match pinned.alpha {
            Some(alpha) => vec![alpha],
            None => ALPHA_GRID.to_vec(),
        };
        let phis = match (trend.is_damped(), pinned.phi) {
            (false, _) => vec![1.0],
            (true, Some(phi)) => vec![phi],
            (true, None) => PHI_GRID.to_vec(),
        };

        let mut best: Option<Scored> = None;
        for &alpha in &alphas {
            let betas: Vec<Option<f64>> = match (trend.has_trend(), pinned.beta) {
                (false, _) => vec![None],
                (true, Some(beta)) => vec![Some(beta)],
                (true, None) => [0.0, 0.3 * alpha, (0.7 * alpha).min(ALPHA_BOUNDS.1)]
                    .iter()
                    .map(|&b| Some(dual::clamp(b, ALPHA_BOUNDS.0, alpha)))
                    .collect(),
            };

            for &beta in &betas {
                for &phi in &phis {
                    for gamma in self.gamma_grid(candidate, alpha, phi, limits) {
                        let Ok(config) = SmoothingConfig::new(
                            candidate.error,
                            trend,
                            candidate.season,
                            self.season_length,
                            alpha,
                            beta,
                            gamma,
                            phi,
                        ) else {
                            continue;
                        };

                        let metrics = self.score(&config, base, None, None);
                        if !metrics.aicc.is_finite() {
                            continue;
                        }
                        if best
                            .as_ref()
                            .map_or(true, |b| metrics.improves_on(&b.metrics))
                        {
                            trace!(
                                model = %candidate,
                                alpha,
                                ?beta,
                                ?gamma,
                                phi,
                                aicc = metrics.aicc,
                                "coarse grid improvement"
                            );
                            best = Some(Scored {
                                config,
                                metrics,
                                level0: base.level,
                                trend0: trend.has_trend().then_some(base.trend),
                                state_override: false,
                            });
                        }
                    }
                }
            }
        }
        best
    }

    fn gamma_grid(
        &self,
        candidate: &CandidateConfig,
        alpha: f64,
        phi: f64,
        limits: &Limits,
    ) -> Vec<Option<f64>> {
        if !candidate.season.has_season() {
            return vec![None];
        }
        if let Some(gamma) = self.settings.pinned.gamma {
            return vec![Some(gamma)];
        }
        let grid: &[f64] = if candidate.season == SeasonalType::Multiplicative {
            &MULTIPLICATIVE_GAMMA_GRID
        } else {
            &ADDITIVE_GAMMA_GRID
        };
        let (lower, upper) = gamma_band(alpha, phi, limits.gamma_upper);
        grid.iter()
            .map(|&g| Some(dual::clamp(g, lower, upper)))
            .collect()
    }

    /// Central level used by the state grid.
    fn level_base(&self, candidate: &CandidateConfig) -> f64 {
        let n = self.values.len();
        let m = self.season_length;
        let mean = |tail: usize| {
            let tail = tail.clamp(1, n);
            self.values[n - tail..].iter().sum::<f64>() / tail as f64
        };

        match candidate.season {
            SeasonalType::Multiplicative if n >= m => mean(n),
            SeasonalType::Additive if n >= m => {
                if candidate.damped && n >= 2 * m {
                    mean(m)
                } else {
                    mean(2 * m)
                }
            }
            _ if n > 1 => mean(10),
            _ => self.values[0],
        }
    }

    /// Stage B: five-point grids around the level and trend seeds.
    fn state_search(
        &self,
        candidate: &CandidateConfig,
        base: &RecursionState<f64>,
        limits: &Limits,
        seed: &mut Scored,
    ) {
        let range = self.data.range;
        let level_base = self.level_base(candidate);
        let offsets = [-0.2, -0.1, 0.0, 0.1, 0.2];

        let trend_seeds: Vec<Option<f64>> = if !candidate.trend.has_trend() {
            vec![None]
        } else if candidate.trend.is_multiplicative() {
            [0.85, 0.95, 1.0, 1.05, 1.15]
                .iter()
                .map(|f| Some(self.data.ratio_base * f))
                .collect()
        } else {
            offsets
                .iter()
                .map(|o| Some(self.data.trend_base + o * range))
                .collect()
        };

        for offset in offsets {
            let mut level = dual::clamp(level_base + offset * range, limits.level.0, limits.level.1);
            if limits.requires_positive {
                level = level.max(POSITIVE_LEVEL_FLOOR);
            }
            for &trend in &trend_seeds {
                let trend = trend.map(|t| dual::clamp(t, limits.trend.0, limits.trend.1));
                let metrics = self.score(&seed.config, base, Some(level), trend);
                if metrics.is_admissible() && metrics.improves_on(&seed.metrics) {
                    trace!(model = %candidate, level, ?trend, aicc = metrics.aicc, "state grid improvement");
                    seed.metrics = metrics;
                    seed.level0 = level;
                    seed.trend0 = trend;
                    seed.state_override = true;
                }
            }
        }
    }

    /// Stage C: bounded local optimization from the seed.
    fn refine(
        &self,
        base: &RecursionState<f64>,
        limits: &Limits,
        seed: Scored,
    ) -> (Scored, OptimizerRun) {
        let pinned = &self.settings.pinned;
        let template = &seed.config;
        let trend = template.trend();
        let layout = Layout {
            alpha: pinned.alpha.is_none(),
            beta: trend.has_trend() && pinned.beta.is_none(),
            phi: trend.is_damped() && pinned.phi.is_none(),
            gamma: template.season().has_season() && pinned.gamma.is_none(),
            trend: trend.has_trend(),
        };

        let mut start = Vec::with_capacity(6);
        let mut bounds = Vec::with_capacity(6);
        let mut push = |value: f64, lower: f64, upper: f64| {
            start.push(dual::clamp(value, lower, upper));
            bounds.push((lower, upper));
        };

        if layout.alpha {
            push(template.alpha(), ALPHA_BOUNDS.0, limits.alpha_upper);
        }
        if layout.beta {
            let beta = template.beta().unwrap_or(0.5 * template.alpha());
            push(
                dual::clamp(beta, ALPHA_BOUNDS.0, template.alpha()),
                ALPHA_BOUNDS.0,
                ALPHA_BOUNDS.1,
            );
        }
        if layout.phi {
            push(template.phi(), PHI_BOUNDS.0, PHI_BOUNDS.1);
        }
        if layout.gamma {
            let gamma = template
                .gamma()
                .unwrap_or((0.1 * template.alpha()).max(GAMMA_BOUNDS.0));
            push(gamma, GAMMA_BOUNDS.0, limits.gamma_upper);
        }
        let mut level = seed.level0;
        if limits.requires_positive {
            level = level.max(POSITIVE_LEVEL_FLOOR);
        }
        push(level, limits.level.0, limits.level.1);
        if layout.trend {
            let fallback = if trend.is_multiplicative() {
                self.data.ratio_base
            } else {
                self.data.trend_base
            };
            push(
                seed.trend0.unwrap_or(fallback),
                limits.trend.0,
                limits.trend.1,
            );
        }

        let problem = Problem {
            template,
            base,
            layout,
            limits: *limits,
        };

        let use_gradient = template.season() == SeasonalType::Multiplicative
            || (trend.is_damped() && template.season() == SeasonalType::Additive);

        let (kind, outcome): (OptimizerKind, OptimizationResult) = if use_gradient {
            let config = LbfgsConfig {
                max_iter: self.settings.max_iterations,
                deadline: self.settings.deadline,
                ..Default::default()
            };
            (
                OptimizerKind::Lbfgs,
                lbfgs(
                    |x| self.objective_with_gradient(&problem, x),
                    &start,
                    config,
                ),
            )
        } else {
            let config = NelderMeadConfig {
                max_iter: self.settings.max_iterations,
                initial_step: SIMPLEX_STEP,
                deadline: self.settings.deadline,
                ..Default::default()
            };
            (
                OptimizerKind::NelderMead,
                nelder_mead(
                    |x| self.objective(&problem, x),
                    &start,
                    Some(&bounds),
                    config,
                ),
            )
        };

        let run = OptimizerRun {
            kind: Some(kind),
            iterations: outcome.iterations,
            converged: outcome.converged,
            objective: outcome.optimal_value,
        };

        let refined = (!outcome.optimal_point.is_empty())
            .then(|| {
                let point = self.decode(&problem, &outcome.optimal_point);
                self.evaluate_point(&problem, &point)
            })
            .flatten();

        match refined {
            Some((config, metrics))
                if metrics.is_admissible() && metrics.improves_on(&seed.metrics) =>
            {
                let point = self.decode(&problem, &outcome.optimal_point);
                trace!(
                    model = %config.label(),
                    before = seed.metrics.aicc,
                    after = metrics.aicc,
                    "optimizer improvement"
                );
                (
                    Scored {
                        config,
                        metrics,
                        level0: point.level,
                        trend0: point.trend,
                        state_override: true,
                    },
                    run,
                )
            }
            _ => (seed, run),
        }
    }

    fn decode<T: Real>(&self, problem: &Problem<'_>, x: &[T]) -> Point<T> {
        let template = problem.template;
        let layout = problem.layout;
        let limits = &problem.limits;
        let mut idx = 0;
        let mut next = || {
            let value = x[idx];
            idx += 1;
            value
        };

        let alpha = if layout.alpha {
            dual::clamp(next(), ALPHA_BOUNDS.0, limits.alpha_upper)
        } else {
            T::from_f64(template.alpha())
        };
        let beta = if layout.beta {
            dual::clamp(next(), ALPHA_BOUNDS.0, alpha.value())
        } else {
            T::from_f64(template.beta().unwrap_or(0.0))
        };
        let phi = if layout.phi {
            dual::clamp(next(), PHI_BOUNDS.0, PHI_BOUNDS.1)
        } else {
            T::from_f64(template.effective_phi())
        };
        let gamma = if layout.gamma {
            let (lower, upper) = gamma_band(alpha.value(), phi.value(), limits.gamma_upper);
            dual::clamp(next(), lower, upper)
        } else {
            T::from_f64(template.gamma().unwrap_or(0.0))
        };

        let mut level = dual::clamp(next(), limits.level.0, limits.level.1);
        if limits.requires_positive {
            level = dual::max(level, T::from_f64(POSITIVE_LEVEL_FLOOR));
        }
        let trend = if layout.trend {
            Some(dual::clamp(next(), limits.trend.0, limits.trend.1))
        } else {
            None
        };

        Point {
            alpha,
            beta,
            phi,
            gamma,
            level,
            trend,
        }
    }

    fn config_for(&self, problem: &Problem<'_>, point: &Point<f64>) -> Option<SmoothingConfig> {
        let template = problem.template;
        SmoothingConfig::new(
            template.error(),
            template.trend(),
            template.season(),
            self.season_length,
            point.alpha,
            template.trend().has_trend().then_some(point.beta),
            template.season().has_season().then_some(point.gamma),
            if template.trend().is_damped() {
                point.phi
            } else {
                1.0
            },
        )
        .ok()
    }

    fn evaluate_point(
        &self,
        problem: &Problem<'_>,
        point: &Point<f64>,
    ) -> Option<(SmoothingConfig, AutoETSMetrics)> {
        let config = self.config_for(problem, point)?;
        let metrics = self.score(&config, problem.base, Some(point.level), point.trend);
        Some((config, metrics))
    }

    /// Derivative-free objective.
    fn objective(&self, problem: &Problem<'_>, x: &[f64]) -> f64 {
        let point = self.decode(problem, x);
        match self.evaluate_point(problem, &point) {
            Some((_, metrics)) if metrics.is_admissible() => {
                metrics.objective(self.settings.criterion)
            }
            _ => f64::INFINITY,
        }
    }

    /// Objective and its gradient, propagated through the recursion in
    /// forward mode.
    fn objective_with_gradient(&self, problem: &Problem<'_>, x: &[f64]) -> (f64, Vec<f64>) {
        let k = x.len();
        let failed = || (f64::INFINITY, vec![0.0; k]);

        let seeded: Vec<Dual> = x
            .iter()
            .enumerate()
            .map(|(i, &v)| Dual::variable(v, i))
            .collect();
        let point = self.decode(problem, &seeded);
        let Some(config) = self.config_for(problem, &point.primal()) else {
            return failed();
        };

        let params = StepParams {
            alpha: point.alpha,
            beta: point.beta,
            gamma: point.gamma,
            phi: point.phi,
        };
        let start = apply_overrides(&config, problem.base, Some(point.level), point.trend, None);
        let criterion = self.settings.criterion;
        let nmse = if criterion == OptimizationCriterion::AMSE {
            self.settings.nmse
        } else {
            0
        };
        let summary = run_recursion(
            self.values,
            config.error(),
            config.shape(),
            &params,
            start,
            nmse,
            None,
        );

        let log_likelihood = summary.log_likelihood(config.error());
        let mse = summary.mse();
        let metrics = AutoETSMetrics::new(
            log_likelihood.value(),
            mse.value(),
            summary.amse.value(),
            summary.n,
            config.parameter_count(),
        );
        if !metrics.is_admissible() {
            return failed();
        }

        let value = match criterion {
            OptimizationCriterion::Likelihood => -log_likelihood,
            OptimizationCriterion::MSE => mse,
            OptimizationCriterion::AMSE => summary.amse,
            OptimizationCriterion::Sigma => mse.sqrt(),
        };
        if !value.re.is_finite() {
            return failed();
        }
        (value.re, value.gradient(k))
    }
}
