//! TimeSeries data structure for representing observed values.
//!
//! The models in this crate only read the value columns. Timestamps are
//! optional and carried through for callers that want to label forecasts.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Duration, Utc};

/// Layout of multivariate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueLayout {
    /// Each inner vector is a dimension (column-major).
    #[default]
    Column,
    /// Each inner vector is an observation across dimensions (row-major).
    Row,
}

/// A time series with optional timestamps and one or more value columns.
#[derive(Debug, Clone)]
pub struct TimeSeries {
    timestamps: Option<Vec<DateTime<Utc>>>,
    /// Values stored in column-major format: values[dimension][observation]
    values: Vec<Vec<f64>>,
}

/// Builder for constructing TimeSeries.
#[derive(Debug, Clone, Default)]
pub struct TimeSeriesBuilder {
    timestamps: Option<Vec<DateTime<Utc>>>,
    values: Vec<Vec<f64>>,
    layout: ValueLayout,
}

impl TimeSeriesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamps(mut self, timestamps: Vec<DateTime<Utc>>) -> Self {
        self.timestamps = Some(timestamps);
        self
    }

    /// Set univariate values.
    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = vec![values];
        self.layout = ValueLayout::Column;
        self
    }

    /// Set multivariate values with specified layout.
    pub fn multivariate_values(mut self, values: Vec<Vec<f64>>, layout: ValueLayout) -> Self {
        self.values = values;
        self.layout = layout;
        self
    }

    pub fn build(self) -> Result<TimeSeries> {
        TimeSeries::new(self.timestamps, self.values, self.layout)
    }
}

impl TimeSeries {
    /// Create a new TimeSeries, validating timestamps and column lengths.
    pub fn new(
        timestamps: Option<Vec<DateTime<Utc>>>,
        values: Vec<Vec<f64>>,
        layout: ValueLayout,
    ) -> Result<Self> {
        let values = match layout {
            ValueLayout::Column => values,
            ValueLayout::Row => {
                let dims = values.first().map(|row| row.len()).unwrap_or(0);
                for row in &values {
                    if row.len() != dims {
                        return Err(ForecastError::DimensionMismatch {
                            expected: dims,
                            got: row.len(),
                        });
                    }
                }
                (0..dims)
                    .map(|d| values.iter().map(|row| row[d]).collect())
                    .collect()
            }
        };

        let len = values.first().map(|v| v.len()).unwrap_or(0);
        for column in &values {
            if column.len() != len {
                return Err(ForecastError::DimensionMismatch {
                    expected: len,
                    got: column.len(),
                });
            }
        }

        if let Some(ts) = &timestamps {
            if ts.len() != len {
                return Err(ForecastError::DimensionMismatch {
                    expected: ts.len(),
                    got: len,
                });
            }
            if ts.windows(2).any(|w| w[1] <= w[0]) {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        Ok(Self { timestamps, values })
    }

    /// Create a univariate time series with timestamps.
    pub fn univariate(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        Self::new(Some(timestamps), vec![values], ValueLayout::Column)
    }

    /// Create a univariate time series from a plain value sequence.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            timestamps: None,
            values: vec![values],
        }
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.values.first().map(|v| v.len()).unwrap_or(0)
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the number of dimensions (1 for univariate).
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is multivariate.
    pub fn is_multivariate(&self) -> bool {
        self.values.len() > 1
    }

    /// Get timestamps, if the series carries any.
    pub fn timestamps(&self) -> Option<&[DateTime<Utc>]> {
        self.timestamps.as_deref()
    }

    /// Get values for a specific dimension.
    pub fn values(&self, dimension: usize) -> Result<&[f64]> {
        self.values
            .get(dimension)
            .map(|v| v.as_slice())
            .ok_or(ForecastError::IndexOutOfBounds {
                index: dimension,
                size: self.values.len(),
            })
    }

    /// Get primary (first dimension) values.
    pub fn primary_values(&self) -> &[f64] {
        self.values.first().map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values
            .iter()
            .any(|dim| dim.iter().any(|v| !v.is_finite()))
    }

    /// Returns the values of a univariate series, rejecting anything else.
    pub fn univariate_values(&self) -> Result<&[f64]> {
        if self.dimensions() != 1 {
            return Err(ForecastError::InvalidParameter(format!(
                "expected a univariate series, got {} dimensions",
                self.dimensions()
            )));
        }
        Ok(self.primary_values())
    }

    /// Timestamps for `horizon` steps after the last observation.
    ///
    /// The spacing is taken from the last two timestamps. Returns `None` when
    /// the series has fewer than two timestamps or when a future timestamp
    /// falls outside the representable range.
    pub fn future_timestamps(&self, horizon: usize) -> Option<Vec<DateTime<Utc>>> {
        let ts = self.timestamps.as_ref()?;
        if ts.len() < 2 {
            return None;
        }
        let last = ts[ts.len() - 1];
        let step: Duration = last - ts[ts.len() - 2];
        extend_timestamps(last, step, horizon)
    }
}

/// `last + h * step` for `h` in `1..=horizon`, or `None` on overflow.
pub(crate) fn extend_timestamps(
    last: DateTime<Utc>,
    step: Duration,
    horizon: usize,
) -> Option<Vec<DateTime<Utc>>> {
    let horizon = i32::try_from(horizon).ok()?;
    (1..=horizon)
        .map(|h| {
            step.checked_mul(h)
                .and_then(|offset| last.checked_add_signed(offset))
        })
        .collect()
}
