//! Forecast result structure for holding predictions.

use chrono::{DateTime, Utc};

/// A univariate forecast containing point predictions and optional intervals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Forecast {
    /// Point predictions, one per step.
    point: Vec<f64>,
    /// Lower prediction interval bounds (optional)
    lower: Option<Vec<f64>>,
    /// Upper prediction interval bounds (optional)
    upper: Option<Vec<f64>>,
    /// Coverage of the intervals, e.g. 0.95.
    level: Option<f64>,
    /// Timestamps of the forecast steps, when known.
    timestamps: Option<Vec<DateTime<Utc>>>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a univariate forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Self::default()
        }
    }

    /// Create a univariate forecast with prediction intervals.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Self {
        Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
            level: Some(level),
            timestamps: None,
        }
    }

    /// Attach timestamps to the forecast steps.
    pub fn with_timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Get the point predictions.
    pub fn primary(&self) -> &[f64] {
        &self.point
    }

    /// Check if lower interval is available.
    pub fn has_lower(&self) -> bool {
        self.lower.is_some()
    }

    /// Check if upper interval is available.
    pub fn has_upper(&self) -> bool {
        self.upper.is_some()
    }

    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Coverage level of the intervals, if any.
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }
}
