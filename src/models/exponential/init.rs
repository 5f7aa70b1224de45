//! Heuristic initial states for the ETS recursion.

use super::ets::{SeasonalType, TrendType};
use super::recursion::{RecursionState, SeasonalRing};

/// Floor applied to multiplicative seasonal indices.
const SEASONAL_FLOOR: f64 = 0.01;
const TOL: f64 = 1e-10;

/// Derive level, trend and seasonal states from the observations.
///
/// Callers must ensure `values` is long enough for the requested season
/// (`n >= m + 1`) and non-empty.
pub(crate) fn initial_state(
    values: &[f64],
    trend: TrendType,
    season: SeasonalType,
    season_length: usize,
) -> RecursionState<f64> {
    let (seasonal, adjusted) = match season {
        SeasonalType::None => (Vec::new(), values.to_vec()),
        _ => seasonal_start(values, season, season_length),
    };

    let m = if season == SeasonalType::None {
        1
    } else {
        season_length
    };
    let (level, trend_value) = level_and_trend(&adjusted, trend, m);

    RecursionState {
        level,
        trend: trend_value,
        seasonal: SeasonalRing::from_newest_first(seasonal),
    }
}

/// Per-phase seasonal indices (rotated into newest-first order) and the
/// seasonally adjusted series.
fn seasonal_start(values: &[f64], season: SeasonalType, m: usize) -> (Vec<f64>, Vec<f64>) {
    let n = values.len();
    let multiplicative = season == SeasonalType::Multiplicative;
    let neutral = if multiplicative { 1.0 } else { 0.0 };

    let mut sums = vec![0.0; m];
    let mut counts = vec![0usize; m];

    if n >= 3 * m {
        let moving_average = centered_moving_average(values, m);
        for i in m..n - m {
            let t = moving_average[i];
            if multiplicative && t <= TOL {
                continue;
            }
            sums[i % m] += if multiplicative {
                values[i] / t
            } else {
                values[i] - t
            };
            counts[i % m] += 1;
        }
    } else {
        for (i, &y) in values.iter().enumerate() {
            sums[i % m] += y;
            counts[i % m] += 1;
        }
    }

    let mut phase: Vec<f64> = sums
        .iter()
        .zip(counts.iter())
        .map(|(&s, &c)| if c > 0 { s / c as f64 } else { neutral })
        .collect();

    let centre = phase.iter().sum::<f64>() / m as f64;
    if multiplicative {
        if centre > TOL {
            for s in &mut phase {
                *s /= centre;
            }
        }
        for s in &mut phase {
            *s = s.max(SEASONAL_FLOOR);
        }
    } else {
        for s in &mut phase {
            *s -= centre;
        }
    }

    let adjusted = values
        .iter()
        .enumerate()
        .map(|(i, &y)| {
            if multiplicative {
                y / phase[i % m]
            } else {
                y - phase[i % m]
            }
        })
        .collect();

    // Phase j is consumed j steps from now, so it sits at logical slot m-1-j.
    let rotated = (0..m).map(|slot| phase[m - 1 - slot]).collect();
    (rotated, adjusted)
}

/// Centered moving average of window `m`, zero outside `m..n-m`.
fn centered_moving_average(values: &[f64], m: usize) -> Vec<f64> {
    let n = values.len();
    let half = m / 2;
    let mut out = vec![0.0; n];
    for i in m..n - m {
        let sum = if m % 2 == 0 {
            let inner: f64 = values[i + 1 - half..i + half].iter().sum();
            0.5 * values[i - half] + inner + 0.5 * values[i + half]
        } else {
            values[i - half..=i + half].iter().sum()
        };
        out[i] = sum / m as f64;
    }
    out
}

fn level_and_trend(adjusted: &[f64], trend: TrendType, m: usize) -> (f64, f64) {
    let window = (2 * m).max(10).min(adjusted.len());
    let head = &adjusted[..window];

    if !trend.has_trend() {
        return (head.iter().sum::<f64>() / window as f64, 0.0);
    }

    let (l, b) = least_squares_line(head);

    if trend.is_multiplicative() {
        let mut level = l + b;
        if level.abs() < 1e-8 {
            level = 1e-7;
        }
        let mut ratio = (l + 2.0 * b) / level;
        let divisor = if ratio.abs() > 1e-8 { ratio } else { 1e-8 };
        level /= divisor;
        if ratio.abs() > 1e10 {
            ratio = 1e10_f64.copysign(ratio);
        }
        if level < 1e-8 || ratio < 1e-8 {
            let first = adjusted[0];
            let second = adjusted.get(1).copied().unwrap_or(first);
            level = first.max(1e-3);
            ratio = (second / first.max(1e-8)).max(1e-3);
        }
        (level, ratio)
    } else if (l + b).abs() < 1e-8 {
        (l * (1.0 + 1e-3), b * (1.0 - 1e-3))
    } else {
        (l, b)
    }
}

/// OLS intercept and slope of `y` against `x = 1..=n`.
fn least_squares_line(y: &[f64]) -> (f64, f64) {
    let n = y.len() as f64;
    let (mut sx, mut sy, mut sxy, mut sxx) = (0.0, 0.0, 0.0, 0.0);
    for (i, &v) in y.iter().enumerate() {
        let x = (i + 1) as f64;
        sx += x;
        sy += v;
        sxy += x * v;
        sxx += x * x;
    }
    let denom = n * sxx - sx * sx;
    if denom.abs() > TOL {
        let slope = (n * sxy - sx * sy) / denom;
        ((sy - slope * sx) / n, slope)
    } else {
        (sy / n, 0.0)
    }
}
