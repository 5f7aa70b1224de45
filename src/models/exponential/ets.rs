//! ETS (Error-Trend-Seasonal) state-space forecasting model.
//!
//! An [`ETS`] model is built from a validated [`SmoothingConfig`] and fitted
//! exactly once. Fitting derives a starting state (or takes one supplied by the
//! caller), runs the state recursion over the series and records fitted values,
//! residuals and the concentrated log-likelihood used for model selection.

use chrono::{DateTime, Duration, Utc};
use statrs::distribution::{ContinuousCDF, Normal};

use super::dual::{self, Real};
use super::init::initial_state;
use super::recursion::{self, RecursionState, SeasonalRing, Shape, StepParams};
use crate::core::{extend_timestamps, Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::Forecaster;

/// Smallest level accepted when the model requires positive states.
const POSITIVE_FLOOR: f64 = 1e-6;
/// Admissible range for an explicitly supplied multiplicative trend.
pub(crate) const TREND_RATIO_BOUNDS: (f64, f64) = (0.01, 10.0);
/// Innovation sum of squares used in place of an exact zero.
const ZERO_SSE_FLOOR: f64 = 1e-8;
/// Default number of steps averaged into the AMSE metric.
pub const DEFAULT_NMSE: usize = 3;
/// Longest AMSE horizon.
pub const MAX_NMSE: usize = 30;

/// Validate an AMSE horizon, clamping it to [`MAX_NMSE`].
pub(crate) fn checked_nmse(nmse: usize) -> Result<usize> {
    if nmse == 0 {
        return Err(ForecastError::InvalidParameter(
            "nmse must be at least 1".to_string(),
        ));
    }
    Ok(nmse.min(MAX_NMSE))
}

/// Error component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorType {
    /// Additive errors
    #[default]
    Additive,
    /// Multiplicative errors
    Multiplicative,
}

/// Trend component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TrendType {
    /// No trend
    #[default]
    None,
    /// Additive trend
    Additive,
    /// Additive damped trend
    AdditiveDamped,
    /// Multiplicative trend
    Multiplicative,
    /// Multiplicative damped trend
    MultiplicativeDamped,
}

impl TrendType {
    pub fn has_trend(self) -> bool {
        !matches!(self, TrendType::None)
    }

    pub fn is_damped(self) -> bool {
        matches!(
            self,
            TrendType::AdditiveDamped | TrendType::MultiplicativeDamped
        )
    }

    pub fn is_multiplicative(self) -> bool {
        matches!(
            self,
            TrendType::Multiplicative | TrendType::MultiplicativeDamped
        )
    }

    /// The same trend kind with damping switched on or off.
    pub fn with_damping(self, damped: bool) -> Self {
        match (self, damped) {
            (TrendType::None, _) => TrendType::None,
            (TrendType::Additive | TrendType::AdditiveDamped, false) => TrendType::Additive,
            (TrendType::Additive | TrendType::AdditiveDamped, true) => TrendType::AdditiveDamped,
            (TrendType::Multiplicative | TrendType::MultiplicativeDamped, false) => {
                TrendType::Multiplicative
            }
            (TrendType::Multiplicative | TrendType::MultiplicativeDamped, true) => {
                TrendType::MultiplicativeDamped
            }
        }
    }

    fn code(self) -> &'static str {
        match self {
            TrendType::None => "N",
            TrendType::Additive => "A",
            TrendType::AdditiveDamped => "Ad",
            TrendType::Multiplicative => "M",
            TrendType::MultiplicativeDamped => "Md",
        }
    }
}

/// Seasonal component type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SeasonalType {
    /// No seasonality
    #[default]
    None,
    /// Additive seasonality
    Additive,
    /// Multiplicative seasonality
    Multiplicative,
}

impl SeasonalType {
    pub fn has_season(self) -> bool {
        !matches!(self, SeasonalType::None)
    }
}

/// Fully specified ETS configuration.
///
/// Validated on construction and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SmoothingConfig {
    error: ErrorType,
    trend: TrendType,
    season: SeasonalType,
    season_length: usize,
    alpha: f64,
    beta: Option<f64>,
    gamma: Option<f64>,
    phi: f64,
}

impl SmoothingConfig {
    /// Create and validate a configuration.
    ///
    /// `beta` is required iff the model has a trend, `gamma` iff it has a
    /// season. `phi` must be below 1 for damped trends and is ignored
    /// otherwise.
    pub fn new(
        error: ErrorType,
        trend: TrendType,
        season: SeasonalType,
        season_length: usize,
        alpha: f64,
        beta: Option<f64>,
        gamma: Option<f64>,
        phi: f64,
    ) -> Result<Self> {
        let config = Self {
            error,
            trend,
            season,
            season_length,
            alpha,
            beta,
            gamma,
            phi,
        };
        config.validate()?;
        Ok(config)
    }

    /// Start a builder for the given component structure.
    pub fn builder(
        error: ErrorType,
        trend: TrendType,
        season: SeasonalType,
    ) -> SmoothingConfigBuilder {
        SmoothingConfigBuilder {
            error,
            trend,
            season,
            season_length: 1,
            alpha: 0.5,
            beta: None,
            gamma: None,
            phi: 1.0,
        }
    }

    fn validate(&self) -> Result<()> {
        let unit = |name: &str, v: f64| -> Result<()> {
            if v > 0.0 && v <= 1.0 {
                Ok(())
            } else {
                Err(ForecastError::InvalidParameter(format!(
                    "{} must lie in (0, 1], got {}",
                    name, v
                )))
            }
        };

        unit("alpha", self.alpha)?;

        match (self.trend.has_trend(), self.beta) {
            (true, Some(beta)) => unit("beta", beta)?,
            (true, None) => {
                return Err(ForecastError::InvalidParameter(
                    "beta is required when the model has a trend".to_string(),
                ))
            }
            (false, Some(_)) => {
                return Err(ForecastError::InvalidParameter(
                    "beta given for a model without trend".to_string(),
                ))
            }
            (false, None) => {}
        }

        match (self.season.has_season(), self.gamma) {
            (true, Some(gamma)) => unit("gamma", gamma)?,
            (true, None) => {
                return Err(ForecastError::InvalidParameter(
                    "gamma is required when the model has a season".to_string(),
                ))
            }
            (false, Some(_)) => {
                return Err(ForecastError::InvalidParameter(
                    "gamma given for a model without season".to_string(),
                ))
            }
            (false, None) => {}
        }

        unit("phi", self.phi)?;
        if self.trend.is_damped() && self.phi >= 1.0 {
            return Err(ForecastError::InvalidParameter(
                "damped trend requires phi < 1".to_string(),
            ));
        }

        if self.season.has_season() && self.season_length < 2 {
            return Err(ForecastError::InvalidParameter(format!(
                "season length must be at least 2 for a seasonal model, got {}",
                self.season_length
            )));
        }

        if self.error == ErrorType::Additive
            && (self.trend.is_multiplicative() || self.season == SeasonalType::Multiplicative)
        {
            return Err(ForecastError::InvalidParameter(format!(
                "{} combines additive error with a multiplicative component",
                self.label()
            )));
        }

        if self.error == ErrorType::Multiplicative && self.season == SeasonalType::Additive {
            return Err(ForecastError::InvalidParameter(format!(
                "{} combines multiplicative error with additive season",
                self.label()
            )));
        }

        if self.error == ErrorType::Multiplicative
            && self.trend.is_multiplicative()
            && self.season == SeasonalType::Multiplicative
        {
            return Err(ForecastError::InvalidParameter(
                "fully multiplicative models are not supported".to_string(),
            ));
        }

        Ok(())
    }

    pub fn error(&self) -> ErrorType {
        self.error
    }

    pub fn trend(&self) -> TrendType {
        self.trend
    }

    pub fn season(&self) -> SeasonalType {
        self.season
    }

    /// Seasonal period; 1 for non-seasonal models.
    pub fn season_length(&self) -> usize {
        if self.season.has_season() {
            self.season_length
        } else {
            1
        }
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> Option<f64> {
        self.beta
    }

    pub fn gamma(&self) -> Option<f64> {
        self.gamma
    }

    /// Damping parameter as given.
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Damping applied by the recursion: 1 unless the trend is damped.
    pub fn effective_phi(&self) -> f64 {
        if self.trend.is_damped() {
            self.phi
        } else {
            1.0
        }
    }

    /// Whether the data must be strictly positive.
    pub fn requires_positive(&self) -> bool {
        self.error == ErrorType::Multiplicative
            || self.trend.is_multiplicative()
            || self.season == SeasonalType::Multiplicative
    }

    /// Initial states plus smoothing parameters.
    pub fn parameter_count(&self) -> usize {
        let mut count = 2; // level0, alpha
        if self.trend.has_trend() {
            count += 2; // trend0, beta
        }
        if self.trend.is_damped() {
            count += 1;
        }
        if self.season.has_season() {
            count += self.season_length + 1;
        }
        count
    }

    /// Short name such as `ETS(M,Ad,N)`.
    pub fn label(&self) -> String {
        let e = match self.error {
            ErrorType::Additive => "A",
            ErrorType::Multiplicative => "M",
        };
        let s = match self.season {
            SeasonalType::None => "N",
            SeasonalType::Additive => "A",
            SeasonalType::Multiplicative => "M",
        };
        format!("ETS({},{},{})", e, self.trend.code(), s)
    }

    pub(crate) fn shape(&self) -> Shape {
        Shape {
            trend: self.trend,
            season: self.season,
        }
    }

    pub(crate) fn step_params(&self) -> StepParams<f64> {
        StepParams {
            alpha: self.alpha,
            beta: self.beta.unwrap_or(0.0),
            gamma: self.gamma.unwrap_or(0.0),
            phi: self.effective_phi(),
        }
    }

    /// Shortest series the model can be fitted on.
    pub fn min_observations(&self) -> usize {
        if self.season.has_season() {
            (self.season_length + 1).max(4)
        } else {
            2
        }
    }
}

/// Builder for [`SmoothingConfig`].
#[derive(Debug, Clone)]
pub struct SmoothingConfigBuilder {
    error: ErrorType,
    trend: TrendType,
    season: SeasonalType,
    season_length: usize,
    alpha: f64,
    beta: Option<f64>,
    gamma: Option<f64>,
    phi: f64,
}

impl SmoothingConfigBuilder {
    pub fn season_length(mut self, season_length: usize) -> Self {
        self.season_length = season_length;
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn beta(mut self, beta: f64) -> Self {
        self.beta = Some(beta);
        self
    }

    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = Some(gamma);
        self
    }

    pub fn phi(mut self, phi: f64) -> Self {
        self.phi = phi;
        self
    }

    pub fn build(self) -> Result<SmoothingConfig> {
        SmoothingConfig::new(
            self.error,
            self.trend,
            self.season,
            self.season_length,
            self.alpha,
            self.beta,
            self.gamma,
            self.phi,
        )
    }
}

/// Accumulated statistics of one pass of the recursion.
#[derive(Debug, Clone)]
pub(crate) struct RunSummary<T> {
    pub state: RecursionState<T>,
    pub innovation_sse: T,
    pub sse: T,
    pub sum_log_forecast: T,
    /// Mean over horizons of the in-sample multi-step MSE; zero if not requested.
    pub amse: T,
    pub n: usize,
}

impl<T: Real> RunSummary<T> {
    pub fn log_likelihood(&self, error: ErrorType) -> T {
        let n = self.n as f64;
        let mut lik = if self.innovation_sse.value() > 0.0 {
            self.innovation_sse.ln() * n
        } else {
            T::from_f64(n * ZERO_SSE_FLOOR.ln())
        };
        if error == ErrorType::Multiplicative {
            lik += self.sum_log_forecast * 2.0;
        }
        lik * -0.5
    }

    pub fn mse(&self) -> T {
        self.sse / self.n as f64
    }
}

/// Fitted values and residuals collected during a run.
#[derive(Debug, Default)]
pub(crate) struct Trace {
    pub fitted: Vec<f64>,
    pub residuals: Vec<f64>,
}

/// Run the recursion over `values` from `state`.
///
/// With `nmse > 0` the in-sample 1..=nmse step forecast errors are averaged
/// into `amse`.
pub(crate) fn run_recursion<T: Real>(
    values: &[f64],
    error: ErrorType,
    shape: Shape,
    params: &StepParams<T>,
    mut state: RecursionState<T>,
    nmse: usize,
    mut trace: Option<&mut Trace>,
) -> RunSummary<T> {
    let zero = T::from_f64(0.0);
    let mut innovation_sse = zero;
    let mut sse = zero;
    let mut sum_log_forecast = zero;

    let mut horizon_buf = vec![zero; nmse];
    let mut horizon_sse = vec![zero; nmse];
    let mut horizon_count = vec![0usize; nmse];

    for (t, &y) in values.iter().enumerate() {
        if nmse > 0 {
            recursion::forecast_into(&state, shape, params.phi, &mut horizon_buf);
            for (j, f) in horizon_buf.iter().enumerate() {
                if let Some(&actual) = values.get(t + j) {
                    let e = *f * -1.0 + actual;
                    horizon_sse[j] += e * e;
                    horizon_count[j] += 1;
                }
            }
        }

        let yhat = recursion::update(&mut state, shape, params, y);

        let residual = yhat * -1.0 + y;
        let innovation = match error {
            ErrorType::Additive => residual,
            ErrorType::Multiplicative => {
                if yhat.value() > 1e-10 {
                    T::from_f64(y) / yhat - 1.0
                } else {
                    zero
                }
            }
        };

        innovation_sse += innovation * innovation;
        sse += residual * residual;
        if error == ErrorType::Multiplicative {
            sum_log_forecast += dual::max(yhat.abs(), T::from_f64(1e-10)).ln();
        }

        if let Some(trace) = trace.as_deref_mut() {
            trace.fitted.push(yhat.value());
            trace.residuals.push(residual.value());
        }
    }

    let mut amse = zero;
    let mut used = 0usize;
    for (acc, &count) in horizon_sse.iter().zip(horizon_count.iter()) {
        if count > 0 {
            amse += *acc / count as f64;
            used += 1;
        }
    }
    if used > 0 {
        amse = amse / used as f64;
    }

    RunSummary {
        state,
        innovation_sse,
        sse,
        sum_log_forecast,
        amse,
        n: values.len(),
    }
}

/// Starting state with caller overrides applied.
///
/// The level is floored for positive models, a multiplicative trend is
/// clamped into [`TREND_RATIO_BOUNDS`], and `seasonal0` (newest first) is used
/// only when it has exactly one value per season.
pub(crate) fn apply_overrides<T: Real>(
    config: &SmoothingConfig,
    base: &RecursionState<f64>,
    level0: Option<T>,
    trend0: Option<T>,
    seasonal0: Option<&[f64]>,
) -> RecursionState<T> {
    let mut state = RecursionState::lift(base);

    if let Some(level) = level0 {
        state.level = if config.requires_positive() {
            dual::max(level, T::from_f64(POSITIVE_FLOOR))
        } else {
            level
        };
    }

    if let Some(trend) = trend0 {
        if config.trend().is_multiplicative() {
            state.trend = dual::clamp(trend, TREND_RATIO_BOUNDS.0, TREND_RATIO_BOUNDS.1);
        } else if config.trend().has_trend() {
            state.trend = trend;
        }
    }

    if let Some(seasonal) = seasonal0 {
        if config.season().has_season() && seasonal.len() == config.season_length() {
            state.seasonal = SeasonalRing::from_newest_first(
                seasonal.iter().map(|&s| T::from_f64(s)).collect(),
            );
        }
    }

    state
}

/// Reject series an ETS configuration cannot be fitted on.
pub(crate) fn check_series(config: &SmoothingConfig, values: &[f64]) -> Result<()> {
    if values.is_empty() {
        return Err(ForecastError::EmptyData);
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastError::MissingValues);
    }
    let needed = config.min_observations();
    if values.len() < needed {
        return Err(ForecastError::InsufficientData {
            needed,
            got: values.len(),
        });
    }
    if config.requires_positive() && values.iter().any(|&v| v <= 0.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "{} requires strictly positive observations",
            config.label()
        )));
    }
    Ok(())
}

/// ETS state-space model.
#[derive(Debug, Clone)]
pub struct ETS {
    /// Model configuration.
    config: SmoothingConfig,
    /// Horizon of the AMSE metric.
    nmse: usize,
    /// State the recursion started from.
    initial_state: Option<RecursionState<f64>>,
    /// State after the last observation.
    state: Option<RecursionState<f64>>,
    /// Fitted values.
    fitted: Option<Vec<f64>>,
    /// Residuals.
    residuals: Option<Vec<f64>>,
    /// Concentrated log-likelihood.
    log_likelihood: Option<f64>,
    /// Mean squared residual.
    mse: Option<f64>,
    /// Average multi-step mean squared error.
    amse: Option<f64>,
    /// Innovation variance, used by prediction intervals.
    innovation_variance: Option<f64>,
    /// Last timestamp and spacing of the training series.
    time_anchor: Option<(DateTime<Utc>, Duration)>,
    /// Series length.
    n: usize,
}

impl ETS {
    /// Create an unfitted model.
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            nmse: DEFAULT_NMSE,
            initial_state: None,
            state: None,
            fitted: None,
            residuals: None,
            log_likelihood: None,
            mse: None,
            amse: None,
            innovation_variance: None,
            time_anchor: None,
            n: 0,
        }
    }

    /// Set the horizon of the AMSE metric. Values above [`MAX_NMSE`] are clamped.
    pub fn with_nmse(mut self, nmse: usize) -> Result<Self> {
        self.nmse = checked_nmse(nmse)?;
        Ok(self)
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    /// Fit on a plain value sequence.
    pub fn fit_values(&mut self, values: &[f64]) -> Result<()> {
        self.fit_internal(values, None, None, None)
    }

    /// Fit starting from a caller-supplied level and trend.
    pub fn fit_with_initial_state(
        &mut self,
        series: &TimeSeries,
        level0: f64,
        trend0: Option<f64>,
    ) -> Result<()> {
        let values = series.univariate_values()?;
        self.fit_internal(values, Some(level0), trend0, None)?;
        self.time_anchor = anchor(series);
        Ok(())
    }

    /// Fit starting from a caller-supplied level, trend and seasonal states.
    ///
    /// `seasonal0` is given newest first, i.e. its last element applies to
    /// the first observation.
    pub fn fit_with_full_state(
        &mut self,
        series: &TimeSeries,
        level0: f64,
        trend0: Option<f64>,
        seasonal0: &[f64],
    ) -> Result<()> {
        let values = series.univariate_values()?;
        self.fit_internal(values, Some(level0), trend0, Some(seasonal0))?;
        self.time_anchor = anchor(series);
        Ok(())
    }

    pub(crate) fn fit_internal(
        &mut self,
        values: &[f64],
        level0: Option<f64>,
        trend0: Option<f64>,
        seasonal0: Option<&[f64]>,
    ) -> Result<()> {
        if self.state.is_some() {
            return Err(ForecastError::AlreadyFitted);
        }
        check_series(&self.config, values)?;

        let base = initial_state(
            values,
            self.config.trend(),
            self.config.season(),
            self.config.season_length(),
        );
        let start = apply_overrides(&self.config, &base, level0, trend0, seasonal0);

        let mut trace = Trace {
            fitted: Vec::with_capacity(values.len()),
            residuals: Vec::with_capacity(values.len()),
        };
        let summary = run_recursion(
            values,
            self.config.error(),
            self.config.shape(),
            &self.config.step_params(),
            start.clone(),
            self.nmse,
            Some(&mut trace),
        );

        self.n = values.len();
        self.log_likelihood = Some(summary.log_likelihood(self.config.error()));
        self.mse = Some(summary.mse());
        self.amse = Some(summary.amse);
        self.innovation_variance = Some(summary.innovation_sse / self.n as f64);
        self.initial_state = Some(start);
        self.state = Some(summary.state);
        self.fitted = Some(trace.fitted);
        self.residuals = Some(trace.residuals);
        Ok(())
    }

    /// Get the concentrated log-likelihood.
    pub fn log_likelihood(&self) -> Option<f64> {
        self.log_likelihood
    }

    pub fn mse(&self) -> Option<f64> {
        self.mse
    }

    pub fn amse(&self) -> Option<f64> {
        self.amse
    }

    /// Square root of the in-sample MSE.
    pub fn sigma(&self) -> Option<f64> {
        self.mse.map(f64::sqrt)
    }

    /// Number of observations the model was fitted on (0 before fitting).
    pub fn sample_size(&self) -> usize {
        self.n
    }

    /// Number of estimated quantities for this configuration.
    pub fn parameter_count(&self) -> usize {
        self.config.parameter_count()
    }

    /// Akaike information criterion with `k` parameters.
    pub fn aic(&self, k: usize) -> Option<f64> {
        self.log_likelihood.map(|ll| {
            if ll.is_finite() {
                -2.0 * ll + 2.0 * k as f64
            } else {
                f64::INFINITY
            }
        })
    }

    /// Small-sample corrected AIC; infinite when `n <= k + 1`.
    pub fn aicc(&self, k: usize) -> Option<f64> {
        let aic = self.aic(k)?;
        if self.n <= k + 1 {
            return Some(f64::INFINITY);
        }
        let k = k as f64;
        Some(aic + 2.0 * k * (k + 1.0) / (self.n as f64 - k - 1.0))
    }

    /// Bayesian information criterion with `k` parameters.
    pub fn bic(&self, k: usize) -> Option<f64> {
        self.log_likelihood.map(|ll| {
            if ll.is_finite() {
                -2.0 * ll + k as f64 * (self.n as f64).ln()
            } else {
                f64::INFINITY
            }
        })
    }

    /// State after the last observation.
    pub fn state(&self) -> Option<&RecursionState<f64>> {
        self.state.as_ref()
    }

    /// State the recursion started from.
    pub fn initial_state(&self) -> Option<&RecursionState<f64>> {
        self.initial_state.as_ref()
    }

    /// Variance multipliers `1 + sum c_j^2` for each forecast step.
    fn variance_multipliers(&self, horizon: usize) -> Vec<f64> {
        let alpha = self.config.alpha();
        let beta = self.config.beta().unwrap_or(0.0);
        let gamma = self.config.gamma().unwrap_or(0.0);
        let phi = self.config.effective_phi();
        let m = self.config.season_length();

        let mut out = Vec::with_capacity(horizon);
        let mut total = 1.0;
        let mut phi_sum = 0.0;
        let mut phi_power = 1.0;
        out.push(total);
        for j in 1..horizon {
            phi_power *= phi;
            phi_sum += phi_power;
            let mut c = alpha;
            if self.config.trend().has_trend() {
                c += beta * phi_sum;
            }
            if self.config.season().has_season() && j % m == 0 {
                c += gamma;
            }
            total += c * c;
            out.push(total);
        }
        out
    }
}

fn anchor(series: &TimeSeries) -> Option<(DateTime<Utc>, Duration)> {
    let ts = series.timestamps()?;
    match ts {
        [.., prev, last] => Some((*last, *last - *prev)),
        _ => None,
    }
}

impl Forecaster for ETS {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        let values = series.univariate_values()?;
        self.fit_internal(values, None, None, None)?;
        self.time_anchor = anchor(series);
        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state.as_ref().ok_or(ForecastError::FitRequired)?;

        if horizon == 0 {
            return Ok(Forecast::new());
        }

        let point = recursion::forecast(
            state,
            self.config.shape(),
            self.config.effective_phi(),
            horizon,
        );
        let forecast = Forecast::from_values(point);
        let timestamps = self
            .time_anchor
            .and_then(|(last, step)| extend_timestamps(last, step, horizon));
        Ok(match timestamps {
            Some(timestamps) => forecast.with_timestamps(timestamps),
            None => forecast,
        })
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "interval level must lie in (0, 1), got {}",
                level
            )));
        }
        let point = self.predict(horizon)?;
        let variance = self.innovation_variance.ok_or(ForecastError::FitRequired)?;
        if horizon == 0 {
            return Ok(point);
        }

        let z = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?
            .inverse_cdf((1.0 + level) / 2.0);

        let multiplicative = self.config.error() == ErrorType::Multiplicative;
        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        for (f, k) in point
            .primary()
            .iter()
            .zip(self.variance_multipliers(horizon))
        {
            let mut se = (variance * k).sqrt();
            if multiplicative {
                se *= f.abs();
            }
            lower.push(f - z * se);
            upper.push(f + z * se);
        }

        let values = point.primary().to_vec();
        let forecast = Forecast::from_values_with_intervals(values, lower, upper, level);
        Ok(match point.timestamps() {
            Some(ts) => forecast.with_timestamps(ts.to_vec()),
            None => forecast,
        })
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.fitted.as_deref()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.residuals.as_deref()
    }

    fn name(&self) -> &str {
        "ETS"
    }
}
