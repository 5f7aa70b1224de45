//! Property-based tests for ETS models.
//!
//! These tests verify invariants that should hold for all valid inputs,
//! using randomly generated time series data.

use anofox_ets::core::TimeSeries;
use anofox_ets::models::exponential::{
    AutoETS, ErrorType, SeasonalType, SmoothingConfig, TrendType, ETS,
};
use anofox_ets::models::Forecaster;
use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

/// Create a TimeSeries from a vector of values.
fn make_ts(values: &[f64]) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<_> = (0..values.len())
        .map(|i| base + Duration::hours(i as i64))
        .collect();
    TimeSeries::univariate(timestamps, values.to_vec()).unwrap()
}

/// Strategy for generating valid time series values.
/// Adds small variation to avoid all-constant series.
fn valid_values_strategy(min_len: usize, max_len: usize) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(|len| {
        prop::collection::vec(1.0..1000.0_f64, len).prop_map(|mut v| {
            for (i, val) in v.iter_mut().enumerate() {
                *val += (i as f64) * 0.001;
            }
            v
        })
    })
}

/// Strategy for generating seasonal time series with a little noise.
fn seasonal_values_strategy(
    min_len: usize,
    max_len: usize,
    period: usize,
) -> impl Strategy<Value = Vec<f64>> {
    (min_len..max_len).prop_flat_map(move |len| {
        (50.0..100.0_f64, 5.0..20.0_f64).prop_map(move |(base, amplitude)| {
            (0..len)
                .map(|i| {
                    let phase = 2.0 * std::f64::consts::PI * i as f64 / period as f64;
                    base + amplitude * phase.sin() + ((i * 7) % 5) as f64 * 0.3
                })
                .collect()
        })
    })
}

fn fixed_model(
    error: ErrorType,
    trend: TrendType,
    alpha: f64,
    beta: Option<f64>,
) -> ETS {
    let mut builder = SmoothingConfig::builder(error, trend, SeasonalType::None).alpha(alpha);
    if let Some(beta) = beta {
        builder = builder.beta(beta);
    }
    ETS::new(builder.build().unwrap())
}

// =============================================================================
// Property: level-only models forecast a flat line
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn ann_forecast_is_constant(
        values in valid_values_strategy(5, 80),
        alpha in 0.01..0.99_f64,
        horizon in 1usize..20
    ) {
        let mut model = fixed_model(ErrorType::Additive, TrendType::None, alpha, None);
        model.fit(&make_ts(&values)).unwrap();
        let forecast = model.predict(horizon).unwrap();

        prop_assert_eq!(forecast.horizon(), horizon);
        let first = forecast.primary()[0];
        for v in forecast.primary() {
            prop_assert!((v - first).abs() < 1e-9);
        }
        let level = model.state().unwrap().level;
        prop_assert!((first - level).abs() < 1e-9);
    }

    #[test]
    fn undamped_additive_trend_forecast_is_linear(
        values in valid_values_strategy(10, 60),
        alpha in 0.05..0.95_f64,
        beta_share in 0.05..0.95_f64,
        horizon in 2usize..15
    ) {
        let mut model = fixed_model(
            ErrorType::Additive,
            TrendType::Additive,
            alpha,
            Some(alpha * beta_share),
        );
        model.fit(&make_ts(&values)).unwrap();
        let state = model.state().unwrap();
        let forecast = model.predict(horizon).unwrap();

        for (h, v) in forecast.primary().iter().enumerate() {
            let expected = state.level + (h + 1) as f64 * state.trend;
            prop_assert!((v - expected).abs() < 1e-6 * (1.0 + expected.abs()));
        }
    }

    #[test]
    fn residuals_are_observation_minus_fit(
        values in valid_values_strategy(5, 60),
        alpha in 0.05..0.95_f64
    ) {
        let mut model = fixed_model(ErrorType::Additive, TrendType::None, alpha, None);
        model.fit(&make_ts(&values)).unwrap();
        let fitted = model.fitted_values().unwrap();
        let residuals = model.residuals().unwrap();

        prop_assert_eq!(fitted.len(), values.len());
        for ((y, f), r) in values.iter().zip(fitted).zip(residuals) {
            prop_assert!((y - f - r).abs() < 1e-9);
        }
    }
}

// =============================================================================
// Property: AutoETS is deterministic and respects its parameter bounds
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn auto_ets_is_deterministic(values in valid_values_strategy(12, 40)) {
        let ts = make_ts(&values);
        let mut first = AutoETS::new(1, "ZZN").unwrap();
        let mut second = AutoETS::new(1, "ZZN").unwrap();
        first.fit(&ts).unwrap();
        second.fit(&ts).unwrap();

        prop_assert_eq!(first.components().unwrap(), second.components().unwrap());
        prop_assert_eq!(first.parameters().unwrap(), second.parameters().unwrap());
        let first_forecast = first.predict(5).unwrap();
        let second_forecast = second.predict(5).unwrap();
        prop_assert_eq!(
            first_forecast.primary(),
            second_forecast.primary()
        );
    }

    #[test]
    fn auto_ets_parameters_within_bounds(values in seasonal_values_strategy(30, 48, 6)) {
        let mut model = AutoETS::new(6, "ZZZ").unwrap();
        model.fit(&make_ts(&values)).unwrap();
        let parameters = model.parameters().unwrap();

        prop_assert!(parameters.alpha >= 1e-4 && parameters.alpha <= 0.9999);
        if let Some(beta) = parameters.beta {
            prop_assert!(beta >= 1e-4 && beta <= parameters.alpha + 1e-12);
        }
        if let Some(gamma) = parameters.gamma {
            prop_assert!(gamma >= 1e-4 && gamma <= 0.9999);
            prop_assert!(gamma <= 1.0 + 1.0 / parameters.phi - parameters.alpha + 1e-9);
        }
        prop_assert!(parameters.phi >= 0.8 && parameters.phi <= 1.0);

        let metrics = model.metrics().unwrap();
        prop_assert!(metrics.aicc.is_finite());
        prop_assert!(metrics.mse > 0.0);
    }
}
