//! Forecasting models.

mod traits;

pub mod exponential;

pub use exponential::{AutoETS, ETS};
pub use traits::{BoxedForecaster, Forecaster};
