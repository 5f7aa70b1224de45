//! Utility functions for forecasting models.

pub mod optimization;

pub use optimization::{
    lbfgs, nelder_mead, LbfgsConfig, NelderMeadConfig, OptimizationResult,
};
