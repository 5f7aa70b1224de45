//! Exponential smoothing models.
//!
//! This module provides the ETS (Error-Trend-Seasonal) state-space framework:
//! - [`ETS`] for a fixed configuration and fixed smoothing parameters
//! - [`AutoETS`] for automatic model selection by AICc
//!
//! The recursion is generic over [`Real`], so the same code evaluates plain
//! `f64` likelihoods and forward-mode gradients through [`Dual`].

mod auto_ets;
mod dual;
mod ets;
mod evaluator;
mod init;
mod recursion;
mod spec;

pub use auto_ets::{
    AutoETS, AutoETSComponents, AutoETSConfig, AutoETSDiagnostics, AutoETSParameters,
    EarlyStopping, DEFAULT_MAX_ITERATIONS,
};
pub use dual::{Dual, Real};
pub use ets::{
    ErrorType, SeasonalType, SmoothingConfig, SmoothingConfigBuilder, TrendType, DEFAULT_NMSE,
    ETS, MAX_NMSE,
};
pub use evaluator::{
    AutoETSMetrics, OptimizationCriterion, OptimizerKind, PinnedParameters, ALPHA_BOUNDS,
    GAMMA_BOUNDS, PHI_BOUNDS,
};
pub use recursion::{RecursionState, SeasonalRing};
pub use spec::{CandidateConfig, CandidateSearchSpace, DampedPolicy};
