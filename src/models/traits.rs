//! Forecaster trait defining the common interface for all models.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;

/// Common interface for all forecasting models.
///
/// This trait is object-safe and can be used with `Box<dyn Forecaster>`.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        // Default implementation just returns point predictions
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// Type alias for boxed forecaster trait objects.
///
/// # Example
///
/// ```
/// use anofox_ets::models::exponential::{ErrorType, SeasonalType, SmoothingConfig, TrendType};
/// use anofox_ets::models::{AutoETS, BoxedForecaster, ETS};
///
/// let config = SmoothingConfig::builder(ErrorType::Additive, TrendType::None, SeasonalType::None)
///     .alpha(0.3)
///     .build()
///     .unwrap();
/// let models: Vec<BoxedForecaster> = vec![
///     Box::new(ETS::new(config)),
///     Box::new(AutoETS::new(1, "ZZN").unwrap()),
/// ];
/// assert_eq!(models[0].name(), "ETS");
/// assert!(!models[1].is_fitted());
/// ```
pub type BoxedForecaster = Box<dyn Forecaster>;
