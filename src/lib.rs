//! # anofox-ets
//!
//! Exponential smoothing state-space models (ETS) for univariate time series.
//!
//! Provides the fifteen-by-two ETS model family with additive or
//! multiplicative errors, a likelihood-based fitting pipeline, and
//! [`AutoETS`](models::exponential::AutoETS), which searches the admissible
//! configurations and keeps the one with the lowest AICc.

// Allow some clippy warnings for cleaner code in specific cases
#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod utils;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::exponential::{
        AutoETS, ErrorType, SeasonalType, SmoothingConfig, TrendType, ETS,
    };
    pub use crate::models::Forecaster;
}
