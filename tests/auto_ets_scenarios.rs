//! End-to-end behaviour of ETS and AutoETS on small reference series.

use anofox_ets::core::TimeSeries;
use anofox_ets::models::exponential::{
    AutoETS, DampedPolicy, EarlyStopping, ErrorType, SeasonalType, SmoothingConfig, TrendType, ETS,
};
use anofox_ets::models::Forecaster;
use anofox_ets::ForecastError;
use approx::assert_relative_eq;
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Route search logs to the test output; `RUST_LOG=anofox_ets=debug` shows
/// every candidate.
fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "anofox_ets=warn".into()),
        )
        .try_init();
}

fn make_ts(values: &[f64]) -> TimeSeries {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let timestamps: Vec<_> = (0..values.len())
        .map(|i| base + Duration::days(i as i64))
        .collect();
    TimeSeries::univariate(timestamps, values.to_vec()).unwrap()
}

/// Two cycles of a strong multiplicative monthly pattern with small,
/// non-periodic noise.
fn multiplicative_seasonal() -> Vec<f64> {
    (0..24)
        .map(|t| {
            let season = 1.0 + 0.8 * (2.0 * std::f64::consts::PI * t as f64 / 12.0).sin();
            let noise = 0.01 * (((t * 7) % 5) as f64 - 2.0);
            100.0 * season * (1.0 + noise)
        })
        .collect()
}

fn noisy_trend(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 50.0 + 0.8 * i as f64 + 1.5 * (((i * 11) % 7) as f64 - 3.0) / 3.0)
        .collect()
}

#[test]
fn ann_spec_collapses_to_single_candidate() {
    let ts = make_ts(&[10.0, 12.0, 11.0, 13.0, 12.0, 14.0, 13.0, 15.0]);
    let mut model = AutoETS::new(1, "ANN").unwrap();
    model.fit(&ts).unwrap();

    let components = model.components().unwrap();
    assert_eq!(components.error, ErrorType::Additive);
    assert_eq!(components.trend, TrendType::None);
    assert_eq!(components.season, SeasonalType::None);
    assert_eq!(model.diagnostics().unwrap().models_evaluated, 1);

    let forecast = model.predict(3).unwrap();
    let values = forecast.primary();
    assert_eq!(values.len(), 3);
    assert_relative_eq!(values[0], values[1], epsilon = 1e-12);
    assert_relative_eq!(values[1], values[2], epsilon = 1e-12);
    assert!(values[0] >= 10.0 && values[0] <= 15.0);
}

#[test]
fn seasonal_search_selects_multiplicative_season() {
    init_tracing();
    let ts = make_ts(&multiplicative_seasonal());
    let mut model = AutoETS::new(12, "ZZZ").unwrap();
    model.fit(&ts).unwrap();

    let components = model.components().unwrap();
    assert_eq!(components.season, SeasonalType::Multiplicative);
    assert_eq!(components.season_length, 12);

    let start = model.model().unwrap().initial_state().unwrap();
    let indices = start.seasonal.to_vec();
    assert_eq!(indices.len(), 12);
    let mean = indices.iter().sum::<f64>() / 12.0;
    assert_relative_eq!(mean, 1.0, epsilon = 1e-6);

    assert!(model.parameters().unwrap().gamma.is_some());
    let forecast = model.predict(12).unwrap();
    assert!(forecast.primary().iter().all(|v| v.is_finite() && *v > 0.0));
}

#[test]
fn non_positive_data_rejected_by_multiplicative_configs() {
    let ts = make_ts(&[5.0, 3.0, 0.0, 4.0, 6.0, 5.0, 7.0, 6.0, 8.0, 7.0]);
    let configs = [
        (ErrorType::Multiplicative, TrendType::None, SeasonalType::None, 1),
        (ErrorType::Multiplicative, TrendType::Multiplicative, SeasonalType::None, 1),
        (ErrorType::Multiplicative, TrendType::None, SeasonalType::Multiplicative, 4),
    ];

    for (error, trend, season, m) in configs {
        let mut builder = SmoothingConfig::builder(error, trend, season)
            .season_length(m)
            .alpha(0.3);
        if trend.has_trend() {
            builder = builder.beta(0.1);
        }
        if season.has_season() {
            builder = builder.gamma(0.1);
        }
        let mut model = ETS::new(builder.build().unwrap());

        assert!(matches!(
            model.fit(&ts),
            Err(ForecastError::InvalidParameter(_))
        ));
        assert!(!model.is_fitted());
        assert!(matches!(model.predict(1), Err(ForecastError::FitRequired)));
    }

    let mut auto = AutoETS::new(1, "MNN").unwrap();
    assert!(matches!(
        auto.fit(&ts),
        Err(ForecastError::NoValidModel { .. })
    ));
    assert!(auto.components().is_err());
}

#[test]
fn predict_before_fit_is_an_error() {
    let config =
        SmoothingConfig::builder(ErrorType::Additive, TrendType::None, SeasonalType::None)
            .alpha(0.5)
            .build()
            .unwrap();
    let ets = ETS::new(config);
    assert!(matches!(ets.predict(3), Err(ForecastError::FitRequired)));
    assert!(matches!(
        ets.predict_with_intervals(3, 0.95),
        Err(ForecastError::FitRequired)
    ));

    let auto = AutoETS::new(1, "ZZN").unwrap();
    assert!(matches!(auto.predict(3), Err(ForecastError::FitRequired)));
    assert!(matches!(auto.model(), Err(ForecastError::FitRequired)));
}

#[test]
fn pinned_parameters_survive_selection() {
    let ts = make_ts(&noisy_trend(40));
    let mut model = AutoETS::new(1, "AAN")
        .unwrap()
        .with_damped_policy(DampedPolicy::Always)
        .unwrap()
        .with_pinned_alpha(0.4)
        .unwrap()
        .with_pinned_phi(0.9)
        .unwrap();
    model.fit(&ts).unwrap();

    let parameters = model.parameters().unwrap();
    assert_eq!(parameters.alpha, 0.4);
    assert_eq!(parameters.phi, 0.9);
    let beta = parameters.beta.unwrap();
    assert!(beta > 0.0 && beta <= 0.4);
}

#[test]
fn damped_policy_never_excludes_damped_candidates() {
    let ts = make_ts(&noisy_trend(40));
    let mut model = AutoETS::new(1, "ZZN")
        .unwrap()
        .with_damped_policy(DampedPolicy::Never)
        .unwrap();
    model.fit(&ts).unwrap();

    assert!(!model.components().unwrap().damped);
    assert_eq!(model.parameters().unwrap().phi, 1.0);
}

#[test]
fn invalid_specifications_are_rejected() {
    for spec in ["", "AN", "XNN", "NNN", "AMN", "ANA", "ZZZZZ", "AAXN", "ZZ?Z"] {
        let season_length = if spec == "ANA" { 1 } else { 12 };
        assert!(
            AutoETS::new(season_length, spec).is_err(),
            "spec {:?} should be rejected",
            spec
        );
    }
    assert!(AutoETS::new(0, "ANN").is_err());
    assert!(AutoETS::new(12, "ZZZ").is_ok());
}

/// Early termination trades exhaustiveness for speed, so the selected model
/// may differ from an exhaustive scan. Both runs must still produce a valid
/// fit, and the exhaustive scan can never end with a worse AICc.
#[test]
fn early_stopping_never_beats_exhaustive_search() {
    let ts = make_ts(&multiplicative_seasonal());

    let mut eager = AutoETS::new(12, "ZZZ")
        .unwrap()
        .with_early_stopping(Some(EarlyStopping {
            patience: 1,
            min_improvement: 0.01,
        }));
    eager.fit(&ts).unwrap();

    let mut exhaustive = AutoETS::new(12, "ZZZ").unwrap().with_early_stopping(None);
    exhaustive.fit(&ts).unwrap();

    let eager_stats = eager.diagnostics().unwrap();
    let exhaustive_stats = exhaustive.diagnostics().unwrap();
    assert!(eager_stats.models_evaluated <= exhaustive_stats.models_evaluated);
    assert!(!exhaustive_stats.stopped_early);
    assert!(exhaustive.metrics().unwrap().aicc <= eager.metrics().unwrap().aicc + 1e-9);
}

#[test]
fn parallel_search_matches_exhaustive_sequential_search() {
    init_tracing();
    let ts = make_ts(&multiplicative_seasonal());

    let mut sequential = AutoETS::new(12, "ZZZ").unwrap().with_early_stopping(None);
    sequential.fit(&ts).unwrap();

    let mut parallel = AutoETS::new(12, "ZZZ").unwrap().with_parallel(true);
    parallel.fit(&ts).unwrap();

    assert_eq!(
        sequential.components().unwrap(),
        parallel.components().unwrap()
    );
    assert_eq!(
        sequential.parameters().unwrap(),
        parallel.parameters().unwrap()
    );
    assert_eq!(
        sequential.diagnostics().unwrap().models_evaluated,
        parallel.diagnostics().unwrap().models_evaluated
    );
    assert_eq!(
        sequential.predict(6).unwrap().primary(),
        parallel.predict(6).unwrap().primary()
    );
}

#[test]
fn auto_ets_intervals_bracket_point_forecast() {
    let ts = make_ts(&noisy_trend(36));
    let mut model = AutoETS::new(1, "ZZN").unwrap();
    model.fit(&ts).unwrap();

    let forecast = model.predict_with_intervals(6, 0.9).unwrap();
    let lower = forecast.lower().unwrap();
    let upper = forecast.upper().unwrap();
    for ((l, p), u) in lower.iter().zip(forecast.primary()).zip(upper) {
        assert!(l <= p && p <= u);
    }
    assert_eq!(model.fitted_values().unwrap().len(), 36);
    assert_eq!(model.residuals().unwrap().len(), 36);
}

#[test]
fn state_search_never_worsens_selection() {
    let ts = make_ts(&noisy_trend(30));

    let mut plain = AutoETS::new(1, "AAN").unwrap();
    plain.fit(&ts).unwrap();

    let mut searched = AutoETS::new(1, "AAN").unwrap().with_state_search(true);
    searched.fit(&ts).unwrap();

    assert!(searched.metrics().unwrap().aicc <= plain.metrics().unwrap().aicc + 1e-9);
}
