//! Automatic ETS model selection.
//!
//! AutoETS enumerates the ETS configurations admitted by a specification
//! string, estimates each one and keeps the candidate with the best AICc.
//! The winning configuration is refitted on the whole series and serves
//! forecasts.

use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use super::ets::{checked_nmse, ErrorType, SeasonalType, TrendType, DEFAULT_NMSE, ETS};
use super::evaluator::{
    AutoETSMetrics, CandidateEvaluator, CandidateResult, OptimizationCriterion, OptimizerKind,
    PinnedParameters, SearchSettings, ALPHA_BOUNDS, GAMMA_BOUNDS, PHI_BOUNDS,
};
use super::spec::{CandidateConfig, CandidateSearchSpace, DampedPolicy};
use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;

/// Shortest series AutoETS accepts.
const MIN_OBSERVATIONS: usize = 4;
/// Default optimizer iteration budget per candidate.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Stop scanning candidates once the best AICc has stalled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EarlyStopping {
    /// Consecutive candidates without sufficient improvement before stopping.
    pub patience: usize,
    /// AICc decrease that counts as an improvement.
    pub min_improvement: f64,
}

impl Default for EarlyStopping {
    fn default() -> Self {
        Self {
            patience: 8,
            min_improvement: 0.01,
        }
    }
}

/// Configuration for AutoETS.
#[derive(Debug, Clone)]
pub struct AutoETSConfig {
    /// Consider multiplicative trends when the trend letter is `Z`.
    pub allow_multiplicative_trend: bool,
    /// Which damping variants to search.
    pub damped_policy: DampedPolicy,
    /// Quantity minimized when estimating parameters.
    pub criterion: OptimizationCriterion,
    /// Horizon of the AMSE metric.
    pub nmse: usize,
    /// Optimizer iteration budget per candidate.
    pub max_iterations: usize,
    /// Smoothing parameters held fixed.
    pub pinned: PinnedParameters,
    /// Early termination of the candidate scan; `None` searches exhaustively.
    pub early_stopping: Option<EarlyStopping>,
    /// Grid over the starting level and trend before continuous optimization.
    pub state_search: bool,
    /// Evaluate candidates on the rayon thread pool.
    pub parallel: bool,
    /// Wall-clock budget after which no new candidate is started.
    pub time_budget: Option<Duration>,
}

impl Default for AutoETSConfig {
    fn default() -> Self {
        Self {
            allow_multiplicative_trend: false,
            damped_policy: DampedPolicy::Auto,
            criterion: OptimizationCriterion::Likelihood,
            nmse: DEFAULT_NMSE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            pinned: PinnedParameters::default(),
            early_stopping: Some(EarlyStopping::default()),
            state_search: false,
            parallel: false,
            time_budget: None,
        }
    }
}

/// Structure of the selected model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoETSComponents {
    pub error: ErrorType,
    /// Trend including damping, e.g. [`TrendType::AdditiveDamped`].
    pub trend: TrendType,
    pub season: SeasonalType,
    pub damped: bool,
    /// Seasonal period; 1 for non-seasonal models.
    pub season_length: usize,
}

/// Smoothing parameters of the selected model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoETSParameters {
    pub alpha: f64,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    /// 1 for undamped models.
    pub phi: f64,
}

/// Search and optimizer bookkeeping of the last fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoETSDiagnostics {
    /// Local optimizer used for the selected candidate.
    pub optimizer: Option<OptimizerKind>,
    pub optimizer_iterations: usize,
    pub optimizer_converged: bool,
    /// Final objective value reported by the optimizer.
    pub optimizer_objective: f64,
    pub training_data_size: usize,
    /// Candidates evaluated, including failed ones.
    pub models_evaluated: usize,
    /// Candidates without an admissible fit.
    pub models_failed: usize,
    /// Whether early termination or the time budget skipped candidates.
    pub stopped_early: bool,
}

#[derive(Debug, Clone)]
struct Selection {
    model: ETS,
    components: AutoETSComponents,
    parameters: AutoETSParameters,
    metrics: AutoETSMetrics,
    diagnostics: AutoETSDiagnostics,
}

#[derive(Debug, Default)]
struct SearchOutcome {
    best: Option<CandidateResult>,
    evaluated: usize,
    failed: usize,
    stopped_early: bool,
}

/// Automatic ETS model selection.
///
/// # Example
/// ```
/// use anofox_ets::core::TimeSeries;
/// use anofox_ets::models::exponential::AutoETS;
/// use anofox_ets::models::Forecaster;
///
/// let values: Vec<f64> = (0..30).map(|i| 10.0 + 0.5 * i as f64).collect();
/// let series = TimeSeries::from_values(values);
///
/// let mut model = AutoETS::new(1, "ZZN").unwrap();
/// model.fit(&series).unwrap();
/// let forecast = model.predict(3).unwrap();
/// assert_eq!(forecast.horizon(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct AutoETS {
    season_length: usize,
    space: CandidateSearchSpace,
    config: AutoETSConfig,
    selection: Option<Selection>,
}

impl AutoETS {
    /// Create a search over the models admitted by `spec`, e.g. `"ZZZ"`.
    pub fn new(season_length: usize, spec: &str) -> Result<Self> {
        let space = CandidateSearchSpace::parse(spec, season_length)?;
        let config = AutoETSConfig {
            damped_policy: space.damped_policy(),
            ..Default::default()
        };
        Ok(Self {
            season_length,
            space,
            config,
            selection: None,
        })
    }

    /// Create a search with an explicit configuration.
    pub fn with_config(season_length: usize, spec: &str, config: AutoETSConfig) -> Result<Self> {
        let model = Self::new(season_length, spec)?;
        let AutoETSConfig {
            allow_multiplicative_trend,
            damped_policy,
            criterion,
            nmse,
            max_iterations,
            pinned,
            early_stopping,
            state_search,
            parallel,
            time_budget,
        } = config;

        let mut model = model
            .with_multiplicative_trend(allow_multiplicative_trend)
            .with_damped_policy(damped_policy)?
            .with_criterion(criterion)
            .with_nmse(nmse)?
            .with_max_iterations(max_iterations)?
            .with_early_stopping(early_stopping)
            .with_state_search(state_search)
            .with_parallel(parallel);
        if let Some(budget) = time_budget {
            model = model.with_time_budget(budget);
        }
        if let Some(alpha) = pinned.alpha {
            model = model.with_pinned_alpha(alpha)?;
        }
        if let Some(beta) = pinned.beta {
            model = model.with_pinned_beta(beta)?;
        }
        if let Some(gamma) = pinned.gamma {
            model = model.with_pinned_gamma(gamma)?;
        }
        if let Some(phi) = pinned.phi {
            model = model.with_pinned_phi(phi)?;
        }
        Ok(model)
    }

    pub fn config(&self) -> &AutoETSConfig {
        &self.config
    }

    pub fn season_length(&self) -> usize {
        self.season_length
    }

    /// Allow multiplicative trends to be searched under a `Z` trend letter.
    pub fn with_multiplicative_trend(mut self, allow: bool) -> Self {
        self.config.allow_multiplicative_trend = allow;
        self
    }

    /// Override the damping policy implied by the specification.
    pub fn with_damped_policy(mut self, policy: DampedPolicy) -> Result<Self> {
        if policy == DampedPolicy::Always && !self.space.has_trend_option() {
            return Err(ForecastError::InvalidParameter(
                "damped trends requested but the specification has no trend".to_string(),
            ));
        }
        self.config.damped_policy = policy;
        Ok(self)
    }

    /// Set the optimization criterion.
    pub fn with_criterion(mut self, criterion: OptimizationCriterion) -> Self {
        self.config.criterion = criterion;
        self
    }

    /// Set the AMSE horizon; must be positive, values above 30 are clamped.
    pub fn with_nmse(mut self, nmse: usize) -> Result<Self> {
        self.config.nmse = checked_nmse(nmse)?;
        Ok(self)
    }

    /// Set the optimizer iteration budget per candidate.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Result<Self> {
        if max_iterations == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_iterations must be positive".to_string(),
            ));
        }
        self.config.max_iterations = max_iterations;
        Ok(self)
    }

    pub fn with_pinned_alpha(mut self, alpha: f64) -> Result<Self> {
        self.config.pinned.alpha = Some(checked_pin("alpha", alpha, ALPHA_BOUNDS)?);
        Ok(self)
    }

    pub fn with_pinned_beta(mut self, beta: f64) -> Result<Self> {
        self.config.pinned.beta = Some(checked_pin("beta", beta, ALPHA_BOUNDS)?);
        Ok(self)
    }

    pub fn with_pinned_gamma(mut self, gamma: f64) -> Result<Self> {
        self.config.pinned.gamma = Some(checked_pin("gamma", gamma, GAMMA_BOUNDS)?);
        Ok(self)
    }

    pub fn with_pinned_phi(mut self, phi: f64) -> Result<Self> {
        self.config.pinned.phi = Some(checked_pin("phi", phi, PHI_BOUNDS)?);
        Ok(self)
    }

    pub fn clear_pinned_alpha(mut self) -> Self {
        self.config.pinned.alpha = None;
        self
    }

    pub fn clear_pinned_beta(mut self) -> Self {
        self.config.pinned.beta = None;
        self
    }

    pub fn clear_pinned_gamma(mut self) -> Self {
        self.config.pinned.gamma = None;
        self
    }

    pub fn clear_pinned_phi(mut self) -> Self {
        self.config.pinned.phi = None;
        self
    }

    /// Set or disable early termination of the candidate scan.
    pub fn with_early_stopping(mut self, rule: Option<EarlyStopping>) -> Self {
        self.config.early_stopping = rule;
        self
    }

    /// Enable the grid over starting level and trend.
    pub fn with_state_search(mut self, enabled: bool) -> Self {
        self.config.state_search = enabled;
        self
    }

    /// Evaluate candidates in parallel. Early termination does not apply.
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.config.parallel = enabled;
        self
    }

    /// Stop starting new candidates once `budget` has elapsed.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.config.time_budget = Some(budget);
        self
    }

    fn selection(&self) -> Result<&Selection> {
        self.selection.as_ref().ok_or(ForecastError::FitRequired)
    }

    /// Structure of the selected model.
    pub fn components(&self) -> Result<&AutoETSComponents> {
        Ok(&self.selection()?.components)
    }

    /// Smoothing parameters of the selected model.
    pub fn parameters(&self) -> Result<&AutoETSParameters> {
        Ok(&self.selection()?.parameters)
    }

    /// Fit statistics of the selected model.
    pub fn metrics(&self) -> Result<&AutoETSMetrics> {
        Ok(&self.selection()?.metrics)
    }

    pub fn diagnostics(&self) -> Result<&AutoETSDiagnostics> {
        Ok(&self.selection()?.diagnostics)
    }

    /// The refitted winning model.
    pub fn model(&self) -> Result<&ETS> {
        Ok(&self.selection()?.model)
    }

    fn search(
        &self,
        evaluator: &CandidateEvaluator<'_>,
        candidates: &[CandidateConfig],
        deadline: Option<Instant>,
    ) -> SearchOutcome {
        if self.config.parallel {
            search_parallel(evaluator, candidates, deadline)
        } else {
            search_sequential(evaluator, candidates, self.config.early_stopping, deadline)
        }
    }
}

fn checked_pin(name: &str, value: f64, (lower, upper): (f64, f64)) -> Result<f64> {
    if value.is_finite() && value >= lower && value <= upper {
        Ok(value)
    } else {
        Err(ForecastError::InvalidParameter(format!(
            "pinned {} must lie in [{}, {}], got {}",
            name, lower, upper, value
        )))
    }
}

fn past(deadline: Option<Instant>) -> bool {
    deadline.is_some_and(|d| Instant::now() >= d)
}

fn log_candidate(result: &CandidateResult) {
    match &result.best {
        Some(best) => debug!(
            model = %result.candidate,
            aicc = best.metrics.aicc,
            optimizer = ?result.optimizer.kind,
            iterations = result.optimizer.iterations,
            converged = result.optimizer.converged,
            "candidate evaluated"
        ),
        None => debug!(model = %result.candidate, "candidate has no admissible fit"),
    }
}

fn search_sequential(
    evaluator: &CandidateEvaluator<'_>,
    candidates: &[CandidateConfig],
    early_stopping: Option<EarlyStopping>,
    deadline: Option<Instant>,
) -> SearchOutcome {
    let mut outcome = SearchOutcome::default();
    let mut since_improvement = 0usize;

    for (index, candidate) in candidates.iter().enumerate() {
        if index > 0 && past(deadline) {
            debug!(evaluated = index, "time budget exhausted");
            outcome.stopped_early = true;
            break;
        }

        let result = evaluator.evaluate(candidate);
        outcome.evaluated += 1;
        log_candidate(&result);

        let Some(scored) = result.best.as_ref() else {
            outcome.failed += 1;
            since_improvement += 1;
            continue;
        };

        let previous = outcome
            .best
            .as_ref()
            .and_then(|b| b.best.as_ref())
            .map(|b| b.metrics);
        let mut improved = false;
        if previous.map_or(true, |p| scored.metrics.improves_on(&p)) {
            let previous_aicc = previous.map_or(f64::MAX, |p| p.aicc);
            let min_improvement = early_stopping.map_or(0.0, |rule| rule.min_improvement);
            if previous_aicc - scored.metrics.aicc > min_improvement {
                since_improvement = 0;
                improved = true;
            }
            outcome.best = Some(result);
        }
        if !improved {
            since_improvement += 1;
        }

        if let Some(rule) = early_stopping {
            if outcome.best.is_some() && since_improvement >= rule.patience {
                if index + 1 < candidates.len() {
                    debug!(
                        evaluated = outcome.evaluated,
                        patience = rule.patience,
                        "early termination"
                    );
                    outcome.stopped_early = true;
                }
                break;
            }
        }
    }

    outcome
}

/// Evaluate every candidate concurrently and reduce in enumeration order.
fn search_parallel(
    evaluator: &CandidateEvaluator<'_>,
    candidates: &[CandidateConfig],
    deadline: Option<Instant>,
) -> SearchOutcome {
    let results: Vec<Option<CandidateResult>> = candidates
        .par_iter()
        .enumerate()
        .map(|(index, candidate)| {
            if index > 0 && past(deadline) {
                None
            } else {
                Some(evaluator.evaluate(candidate))
            }
        })
        .collect();

    let mut outcome = SearchOutcome::default();
    for result in results {
        let Some(result) = result else {
            outcome.stopped_early = true;
            continue;
        };
        outcome.evaluated += 1;
        log_candidate(&result);

        if !result.is_valid() {
            outcome.failed += 1;
            continue;
        }
        let replaces = match (&result.best, outcome.best.as_ref().and_then(|b| b.best.as_ref())) {
            (Some(scored), Some(current)) => scored.metrics.improves_on(&current.metrics),
            _ => true,
        };
        if replaces {
            outcome.best = Some(result);
        }
    }
    outcome
}

impl Forecaster for AutoETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        self.selection = None;

        let values = series.univariate_values()?;
        if values.is_empty() {
            return Err(ForecastError::EmptyData);
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::MissingValues);
        }
        if values.len() < MIN_OBSERVATIONS {
            return Err(ForecastError::InsufficientData {
                needed: MIN_OBSERVATIONS,
                got: values.len(),
            });
        }

        let candidates = self.space.enumerate_candidates(
            values,
            self.config.allow_multiplicative_trend,
            self.config.damped_policy,
        );
        if candidates.is_empty() {
            return Err(ForecastError::NoValidModel {
                evaluated: 0,
                failed: 0,
            });
        }

        let deadline = self.config.time_budget.map(|budget| Instant::now() + budget);
        let settings = SearchSettings {
            criterion: self.config.criterion,
            nmse: self.config.nmse,
            max_iterations: self.config.max_iterations,
            pinned: self.config.pinned,
            state_search: self.config.state_search,
            deadline,
        };
        let evaluator = CandidateEvaluator::new(values, self.season_length, &settings);
        let outcome = self.search(&evaluator, &candidates, deadline);

        let Some((winner, scored)) = outcome
            .best
            .as_ref()
            .and_then(|r| r.best.as_ref().map(|s| (r, s)))
        else {
            return Err(ForecastError::NoValidModel {
                evaluated: outcome.evaluated,
                failed: outcome.failed,
            });
        };

        let mut model = ETS::new(scored.config.clone()).with_nmse(self.config.nmse)?;
        if scored.state_override {
            model.fit_with_initial_state(series, scored.level0, scored.trend0)?;
        } else {
            model.fit(series)?;
        }

        let config = model.config();
        let k = config.parameter_count();
        let metrics = AutoETSMetrics::new(
            model.log_likelihood().unwrap_or(f64::NAN),
            model.mse().unwrap_or(f64::NAN),
            model.amse().unwrap_or(f64::NAN),
            model.sample_size(),
            k,
        );
        let components = AutoETSComponents {
            error: config.error(),
            trend: config.trend(),
            season: config.season(),
            damped: config.trend().is_damped(),
            season_length: config.season_length(),
        };
        let parameters = AutoETSParameters {
            alpha: config.alpha(),
            beta: config.beta(),
            gamma: config.gamma(),
            phi: config.effective_phi(),
        };
        let diagnostics = AutoETSDiagnostics {
            optimizer: winner.optimizer.kind,
            optimizer_iterations: winner.optimizer.iterations,
            optimizer_converged: winner.optimizer.converged,
            optimizer_objective: winner.optimizer.objective,
            training_data_size: values.len(),
            models_evaluated: outcome.evaluated,
            models_failed: outcome.failed,
            stopped_early: outcome.stopped_early,
        };

        info!(
            model = %config.label(),
            aicc = metrics.aicc,
            evaluated = outcome.evaluated,
            failed = outcome.failed,
            "AutoETS selected model"
        );

        self.selection = Some(Selection {
            model,
            components,
            parameters,
            metrics,
            diagnostics,
        });
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selection()?.model.predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selection()?
            .model
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selection.as_ref()?.model.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selection.as_ref()?.model.residuals()
    }

    fn name(&self) -> &str {
        "AutoETS"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn make_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| base + chrono::Duration::hours(i as i64))
            .collect()
    }

    fn trending(n: usize) -> TimeSeries {
        let values = (0..n)
            .map(|i| 10.0 + 1.5 * i as f64 + 0.4 * ((i * 7 % 5) as f64 - 2.0))
            .collect();
        TimeSeries::univariate(make_timestamps(n), values).unwrap()
    }

    #[test]
    fn auto_ets_selects_trend_for_trending_data() {
        let mut model = AutoETS::new(1, "ZZN").unwrap();
        model.fit(&trending(40)).unwrap();

        assert!(model.components().unwrap().trend.has_trend());
        let forecast = model.predict(5).unwrap();
        assert_eq!(forecast.horizon(), 5);
        assert!(forecast.primary()[4] > forecast.primary()[0]);
        assert_eq!(forecast.timestamps().unwrap().len(), 5);
    }

    #[test]
    fn auto_ets_reports_diagnostics() {
        let mut model = AutoETS::new(1, "ZZN").unwrap();
        model.fit(&trending(30)).unwrap();

        let diagnostics = model.diagnostics().unwrap();
        assert_eq!(diagnostics.training_data_size, 30);
        assert!(diagnostics.models_evaluated >= 1);
        assert!(diagnostics.models_failed <= diagnostics.models_evaluated);
        assert!(diagnostics.optimizer.is_some());

        let metrics = model.metrics().unwrap();
        assert!(metrics.aicc.is_finite());
        assert!(metrics.sigma > 0.0);
    }

    #[test]
    fn auto_ets_accessors_require_fit() {
        let model = AutoETS::new(1, "ANN").unwrap();
        assert!(matches!(model.predict(3), Err(ForecastError::FitRequired)));
        assert!(matches!(model.components(), Err(ForecastError::FitRequired)));
        assert!(matches!(model.parameters(), Err(ForecastError::FitRequired)));
        assert!(matches!(model.metrics(), Err(ForecastError::FitRequired)));
        assert!(matches!(model.diagnostics(), Err(ForecastError::FitRequired)));
        assert!(model.fitted_values().is_none());
    }

    #[test]
    fn auto_ets_can_be_refitted() {
        let mut model = AutoETS::new(1, "ANN").unwrap();
        model.fit(&trending(20)).unwrap();
        model.fit(&trending(25)).unwrap();
        assert_eq!(model.diagnostics().unwrap().training_data_size, 25);
    }

    #[test]
    fn auto_ets_insufficient_data() {
        let mut model = AutoETS::new(1, "ANN").unwrap();
        let ts = TimeSeries::from_values(vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InsufficientData { needed: 4, got: 3 })
        ));
    }

    #[test]
    fn auto_ets_rejects_missing_values() {
        let mut model = AutoETS::new(1, "ANN").unwrap();
        let ts = TimeSeries::from_values(vec![1.0, f64::NAN, 3.0, 4.0, 5.0]);
        assert!(matches!(model.fit(&ts), Err(ForecastError::MissingValues)));
    }

    #[test]
    fn auto_ets_no_candidate_for_non_positive_multiplicative_spec() {
        let mut model = AutoETS::new(1, "MNN").unwrap();
        let ts = TimeSeries::from_values(vec![1.0, -2.0, 3.0, 4.0, 5.0]);
        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::NoValidModel { .. })
        ));
    }

    #[test]
    fn setters_validate_their_arguments() {
        let model = || AutoETS::new(1, "ZZN").unwrap();
        assert!(model().with_nmse(0).is_err());
        assert_eq!(model().with_nmse(50).unwrap().config().nmse, 30);
        assert!(model().with_max_iterations(0).is_err());
        assert!(model().with_pinned_alpha(0.0).is_err());
        assert!(model().with_pinned_alpha(f64::NAN).is_err());
        assert!(model().with_pinned_beta(1.0).is_err());
        assert!(model().with_pinned_gamma(0.5).is_ok());
        assert!(model().with_pinned_phi(0.99).is_err());
        assert!(model().with_pinned_phi(0.9).is_ok());

        let cleared = model().with_pinned_alpha(0.3).unwrap().clear_pinned_alpha();
        assert_eq!(cleared.config().pinned.alpha, None);

        assert!(AutoETS::new(1, "ANN")
            .unwrap()
            .with_damped_policy(DampedPolicy::Always)
            .is_err());
        assert!(model().with_damped_policy(DampedPolicy::Always).is_ok());
    }

    #[test]
    fn spec_sets_initial_damped_policy() {
        let model = AutoETS::new(1, "AAdN").unwrap();
        assert_eq!(model.config().damped_policy, DampedPolicy::Always);
    }

    #[test]
    fn with_config_applies_every_field() {
        let config = AutoETSConfig {
            allow_multiplicative_trend: true,
            damped_policy: DampedPolicy::Never,
            criterion: OptimizationCriterion::MSE,
            nmse: 5,
            max_iterations: 50,
            pinned: PinnedParameters {
                alpha: Some(0.2),
                ..Default::default()
            },
            early_stopping: None,
            state_search: true,
            parallel: true,
            time_budget: Some(Duration::from_secs(5)),
        };
        let model = AutoETS::with_config(1, "ZZN", config).unwrap();
        let applied = model.config();
        assert!(applied.allow_multiplicative_trend);
        assert_eq!(applied.damped_policy, DampedPolicy::Never);
        assert_eq!(applied.criterion, OptimizationCriterion::MSE);
        assert_eq!(applied.nmse, 5);
        assert_eq!(applied.max_iterations, 50);
        assert_eq!(applied.pinned.alpha, Some(0.2));
        assert!(applied.early_stopping.is_none());
        assert!(applied.state_search && applied.parallel);
    }

    #[test]
    fn damped_policy_always_selects_damped_trend() {
        let mut model = AutoETS::new(1, "AAN")
            .unwrap()
            .with_damped_policy(DampedPolicy::Always)
            .unwrap();
        model.fit(&trending(30)).unwrap();
        let components = model.components().unwrap();
        assert!(components.damped);
        assert_eq!(components.trend, TrendType::AdditiveDamped);
        assert!(model.parameters().unwrap().phi < 1.0);
    }

    #[test]
    fn pinned_alpha_is_reported() {
        let mut model = AutoETS::new(1, "ANN")
            .unwrap()
            .with_pinned_alpha(0.25)
            .unwrap();
        model.fit(&trending(20)).unwrap();
        assert_eq!(model.parameters().unwrap().alpha, 0.25);
    }

    #[test]
    fn time_budget_evaluates_at_least_one_candidate() {
        let mut model = AutoETS::new(1, "ZZN")
            .unwrap()
            .with_time_budget(Duration::ZERO);
        model.fit(&trending(30)).unwrap();
        let diagnostics = model.diagnostics().unwrap();
        assert_eq!(diagnostics.models_evaluated, 1);
        assert!(diagnostics.stopped_early);
    }

    #[test]
    fn auto_ets_name() {
        let model = AutoETS::new(1, "ANN").unwrap();
        assert_eq!(model.name(), "AutoETS");
    }
}
