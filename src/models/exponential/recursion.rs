//! One-step ETS state update and multi-step point forecasts.

use super::dual::Real;
use super::ets::{SeasonalType, TrendType};

/// Sentinel substituted for a ratio whose denominator is effectively zero.
pub(crate) const HUGE: f64 = 1e10;
/// Denominators below this magnitude are treated as zero.
pub(crate) const NEAR_ZERO: f64 = 1e-10;

/// Seasonal states as a fixed-size ring, newest first.
///
/// Logical index 0 is the most recently updated season and index `m - 1`
/// the one that applies to the next observation. Rotation moves the head
/// instead of shifting the storage.
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalRing<T> {
    slots: Vec<T>,
    head: usize,
}

impl<T: Copy> SeasonalRing<T> {
    /// Build from values in logical (newest-first) order.
    pub fn from_newest_first(values: Vec<T>) -> Self {
        Self {
            slots: values,
            head: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Value at logical position `index`.
    #[inline]
    pub fn get(&self, index: usize) -> T {
        self.slots[(self.head + index) % self.slots.len()]
    }

    /// Season due at the next observation, i.e. logical index `m - 1`.
    #[inline]
    pub fn oldest(&self) -> T {
        self.get(self.slots.len() - 1)
    }

    /// Drop the oldest season and insert `value` as the newest.
    #[inline]
    pub fn rotate_in(&mut self, value: T) {
        let m = self.slots.len();
        self.head = (self.head + m - 1) % m;
        self.slots[self.head] = value;
    }

    /// Values in logical order, newest first.
    pub fn to_vec(&self) -> Vec<T> {
        (0..self.slots.len()).map(|i| self.get(i)).collect()
    }

    pub(crate) fn map<U: Copy>(&self, f: impl Fn(T) -> U) -> SeasonalRing<U> {
        SeasonalRing::from_newest_first(self.to_vec().into_iter().map(f).collect())
    }
}

/// Level, trend and seasonal states of an ETS model.
#[derive(Debug, Clone, PartialEq)]
pub struct RecursionState<T> {
    pub level: T,
    /// Zero when the model has no trend.
    pub trend: T,
    /// Empty when the model has no season.
    pub seasonal: SeasonalRing<T>,
}

impl<T: Real> RecursionState<T> {
    pub(crate) fn lift(state: &RecursionState<f64>) -> Self {
        Self {
            level: T::from_f64(state.level),
            trend: T::from_f64(state.trend),
            seasonal: state.seasonal.map(T::from_f64),
        }
    }

    /// Primal values of this state.
    pub(crate) fn values(&self) -> RecursionState<f64> {
        RecursionState {
            level: self.level.value(),
            trend: self.trend.value(),
            seasonal: self.seasonal.map(|s| s.value()),
        }
    }
}

/// Smoothing constants used by one step of the recursion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StepParams<T> {
    pub alpha: T,
    pub beta: T,
    pub gamma: T,
    pub phi: T,
}

/// Shape of the model the recursion runs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Shape {
    pub trend: TrendType,
    pub season: SeasonalType,
}

#[inline]
fn guarded_ratio<T: Real>(numerator: T, denominator: T) -> T {
    if denominator.value().abs() < NEAR_ZERO {
        T::from_f64(HUGE)
    } else {
        numerator / denominator
    }
}

#[inline]
fn is_unit(phi: f64) -> bool {
    (phi - 1.0).abs() < NEAR_ZERO
}

/// Absorb observation `y`, returning the one-step forecast made before it.
pub(crate) fn update<T: Real>(
    state: &mut RecursionState<T>,
    shape: Shape,
    params: &StepParams<T>,
    y: f64,
) -> T {
    let old_level = state.level;
    let old_trend = state.trend;
    let y = T::from_f64(y);

    let (q, phi_b) = if shape.trend.is_multiplicative() {
        let phi_b = if is_unit(params.phi.value()) {
            old_trend
        } else {
            old_trend.powf(params.phi)
        };
        (old_level * phi_b, phi_b)
    } else if shape.trend.has_trend() {
        let phi_b = params.phi * old_trend;
        (old_level + phi_b, phi_b)
    } else {
        (old_level, T::from_f64(0.0))
    };

    let (p, s_last) = match shape.season {
        SeasonalType::None => (y, T::from_f64(0.0)),
        SeasonalType::Additive => {
            let s = state.seasonal.oldest();
            (y - s, s)
        }
        SeasonalType::Multiplicative => {
            let s = state.seasonal.oldest();
            (guarded_ratio(y, s), s)
        }
    };

    let new_level = q + params.alpha * (p - q);
    state.level = new_level;

    if shape.trend.has_trend() {
        let r = if shape.trend.is_multiplicative() {
            guarded_ratio(new_level, old_level)
        } else {
            new_level - old_level
        };
        state.trend = phi_b + params.beta / params.alpha * (r - phi_b);
    }

    match shape.season {
        SeasonalType::None => q,
        SeasonalType::Additive => {
            let t = y - q;
            state.seasonal.rotate_in(s_last + params.gamma * (t - s_last));
            q + s_last
        }
        SeasonalType::Multiplicative => {
            let t = guarded_ratio(y, q);
            state.seasonal.rotate_in(s_last + params.gamma * (t - s_last));
            q * s_last
        }
    }
}

/// Write `out.len()` point forecasts from `state` without mutating it.
pub(crate) fn forecast_into<T: Real>(
    state: &RecursionState<T>,
    shape: Shape,
    phi: T,
    out: &mut [T],
) {
    let m = state.seasonal.len();
    let unit = is_unit(phi.value());
    let mut phistar = phi;
    let mut phi_power = phi;

    for (i, slot) in out.iter_mut().enumerate() {
        let base = if shape.trend.is_multiplicative() {
            if state.trend.value() < 0.0 {
                T::from_f64(f64::NAN)
            } else {
                state.level * state.trend.powf(phistar)
            }
        } else if shape.trend.has_trend() {
            state.level + phistar * state.trend
        } else {
            state.level
        };

        *slot = match shape.season {
            SeasonalType::None => base,
            SeasonalType::Additive => base + state.seasonal.get((m - 1 - i % m) % m),
            SeasonalType::Multiplicative => base * state.seasonal.get((m - 1 - i % m) % m),
        };

        if unit {
            phistar = phistar + 1.0;
        } else {
            phi_power = phi_power * phi;
            phistar += phi_power;
        }
    }
}

/// `horizon` point forecasts from a fitted state.
pub(crate) fn forecast(
    state: &RecursionState<f64>,
    shape: Shape,
    phi: f64,
    horizon: usize,
) -> Vec<f64> {
    let mut out = vec![0.0; horizon];
    forecast_into(state, shape, phi, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn params(alpha: f64, beta: f64, gamma: f64, phi: f64) -> StepParams<f64> {
        StepParams {
            alpha,
            beta,
            gamma,
            phi,
        }
    }

    fn state(level: f64, trend: f64, seasonal: Vec<f64>) -> RecursionState<f64> {
        RecursionState {
            level,
            trend,
            seasonal: SeasonalRing::from_newest_first(seasonal),
        }
    }

    #[test]
    fn ring_rotates_newest_first() {
        let mut ring = SeasonalRing::from_newest_first(vec![1.0, 2.0, 3.0]);
        assert_eq!(ring.oldest(), 3.0);
        ring.rotate_in(9.0);
        assert_eq!(ring.to_vec(), vec![9.0, 1.0, 2.0]);
        assert_eq!(ring.oldest(), 2.0);
        ring.rotate_in(8.0);
        ring.rotate_in(7.0);
        assert_eq!(ring.to_vec(), vec![7.0, 8.0, 9.0]);
    }

    #[test]
    fn level_only_update_is_exponential_smoothing() {
        let shape = Shape {
            trend: TrendType::None,
            season: SeasonalType::None,
        };
        let mut s = state(10.0, 0.0, vec![]);
        let yhat = update(&mut s, shape, &params(0.5, 0.0, 0.0, 1.0), 14.0);
        assert_eq!(yhat, 10.0);
        assert_relative_eq!(s.level, 12.0);
    }

    #[test]
    fn additive_trend_update() {
        let shape = Shape {
            trend: TrendType::Additive,
            season: SeasonalType::None,
        };
        let mut s = state(10.0, 1.0, vec![]);
        let yhat = update(&mut s, shape, &params(0.5, 0.25, 0.0, 1.0), 13.0);
        assert_relative_eq!(yhat, 11.0);
        assert_relative_eq!(s.level, 12.0);
        // r = 2, new_b = 1 + 0.5 * (2 - 1)
        assert_relative_eq!(s.trend, 1.5);
    }

    #[test]
    fn additive_season_uses_oldest_slot_and_rotates() {
        let shape = Shape {
            trend: TrendType::None,
            season: SeasonalType::Additive,
        };
        let mut s = state(10.0, 0.0, vec![1.0, -2.0, 3.0]);
        let yhat = update(&mut s, shape, &params(0.5, 0.0, 0.5, 1.0), 15.0);
        assert_relative_eq!(yhat, 13.0);
        // p = 12, level = 11; t = 5, s0 = 3 + 0.5 * 2
        assert_relative_eq!(s.level, 11.0);
        assert_eq!(s.seasonal.to_vec(), vec![4.0, 1.0, -2.0]);
    }

    #[test]
    fn multiplicative_season_guards_zero_divisor() {
        let shape = Shape {
            trend: TrendType::None,
            season: SeasonalType::Multiplicative,
        };
        let mut s = state(10.0, 0.0, vec![1.0, 0.0]);
        update(&mut s, shape, &params(0.1, 0.0, 0.1, 1.0), 5.0);
        assert!(s.level.is_finite());
        assert_relative_eq!(s.level, 10.0 + 0.1 * (HUGE - 10.0));
    }

    #[test]
    fn multiplicative_trend_guards_zero_level() {
        let shape = Shape {
            trend: TrendType::Multiplicative,
            season: SeasonalType::None,
        };
        let mut s = state(0.0, 1.0, vec![]);
        update(&mut s, shape, &params(0.5, 0.5, 0.0, 1.0), 2.0);
        assert_relative_eq!(s.trend, 1.0 + 1.0 * (HUGE - 1.0));
    }

    #[test]
    fn undamped_additive_forecast_is_linear() {
        let shape = Shape {
            trend: TrendType::Additive,
            season: SeasonalType::None,
        };
        let s = state(5.0, 0.5, vec![]);
        let f = forecast(&s, shape, 1.0, 6);
        for (h, value) in f.iter().enumerate() {
            assert_eq!(*value, 5.0 + (h as f64 + 1.0) * 0.5);
        }
    }

    #[test]
    fn damped_forecast_accumulates_powers() {
        let shape = Shape {
            trend: TrendType::AdditiveDamped,
            season: SeasonalType::None,
        };
        let s = state(0.0, 1.0, vec![]);
        let f = forecast(&s, shape, 0.5, 3);
        assert_relative_eq!(f[0], 0.5);
        assert_relative_eq!(f[1], 0.75);
        assert_relative_eq!(f[2], 0.875);
    }

    #[test]
    fn seasonal_forecast_cycles_through_ring() {
        let shape = Shape {
            trend: TrendType::None,
            season: SeasonalType::Additive,
        };
        let s = state(10.0, 0.0, vec![3.0, 2.0, 1.0]);
        let f = forecast(&s, shape, 1.0, 5);
        assert_eq!(f, vec![11.0, 12.0, 13.0, 11.0, 12.0]);
    }

    #[test]
    fn negative_multiplicative_trend_forecasts_nan() {
        let shape = Shape {
            trend: TrendType::Multiplicative,
            season: SeasonalType::None,
        };
        let s = state(10.0, -0.5, vec![]);
        assert!(forecast(&s, shape, 1.0, 2).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn one_step_forecast_matches_update() {
        let shape = Shape {
            trend: TrendType::AdditiveDamped,
            season: SeasonalType::Multiplicative,
        };
        let mut s = state(20.0, 0.7, vec![1.1, 0.9, 1.05, 0.95]);
        let f = forecast(&s, shape, 0.9, 1)[0];
        let yhat = update(&mut s, shape, &params(0.3, 0.1, 0.1, 0.9), 21.0);
        assert_relative_eq!(f, yhat, epsilon = 1e-12);
    }
}
