//! Scalar abstraction shared by the state recursion and its gradient.
//!
//! The recursion is written once against [`Real`]. Evaluating it with `f64`
//! gives the plain fit; evaluating it with [`Dual`] carries forward-mode
//! tangents for up to [`MAX_DIRECTIONS`] free parameters, which is what the
//! L-BFGS path uses as its analytical gradient.

use std::fmt::Debug;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

/// Maximum number of simultaneously tracked partial derivatives.
///
/// Enough for alpha, beta, phi, gamma, initial level and initial trend.
pub const MAX_DIRECTIONS: usize = 6;

/// Arithmetic needed by the ETS recursion.
///
/// Comparisons always go through [`Real::value`]; branching on a value never
/// contributes to the derivative.
pub trait Real:
    Copy
    + Debug
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Add<f64, Output = Self>
    + Sub<f64, Output = Self>
    + Mul<f64, Output = Self>
    + Div<f64, Output = Self>
    + AddAssign
{
    /// Lift a constant (zero derivative).
    fn from_f64(value: f64) -> Self;

    /// Primal value.
    fn value(self) -> f64;

    fn ln(self) -> Self;

    fn powf(self, exponent: Self) -> Self;

    fn sqrt(self) -> Self;

    fn abs(self) -> Self {
        if self.value() < 0.0 {
            -self
        } else {
            self
        }
    }
}

impl Real for f64 {
    #[inline]
    fn from_f64(value: f64) -> Self {
        value
    }

    #[inline]
    fn value(self) -> f64 {
        self
    }

    #[inline]
    fn ln(self) -> Self {
        f64::ln(self)
    }

    #[inline]
    fn powf(self, exponent: Self) -> Self {
        f64::powf(self, exponent)
    }

    #[inline]
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }

    #[inline]
    fn abs(self) -> Self {
        f64::abs(self)
    }
}

/// Clamp into `[lower, upper]`; the derivative vanishes outside the interval.
/// NaN maps to `lower`.
#[inline]
pub fn clamp<T: Real>(x: T, lower: f64, upper: f64) -> T {
    let v = x.value();
    if v > upper {
        T::from_f64(upper)
    } else if v >= lower {
        x
    } else {
        T::from_f64(lower)
    }
}

#[inline]
pub fn max<T: Real>(a: T, b: T) -> T {
    if b.value() > a.value() {
        b
    } else {
        a
    }
}

#[inline]
pub fn min<T: Real>(a: T, b: T) -> T {
    if b.value() < a.value() {
        b
    } else {
        a
    }
}

/// Forward-mode dual number with a fixed-width tangent vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dual {
    pub re: f64,
    pub eps: [f64; MAX_DIRECTIONS],
}

impl Dual {
    pub fn constant(re: f64) -> Self {
        Self {
            re,
            eps: [0.0; MAX_DIRECTIONS],
        }
    }

    /// Independent variable seeded along `direction`.
    pub fn variable(re: f64, direction: usize) -> Self {
        let mut eps = [0.0; MAX_DIRECTIONS];
        if direction < MAX_DIRECTIONS {
            eps[direction] = 1.0;
        }
        Self { re, eps }
    }

    /// Scale the tangent by `factor` and set the primal to `re`.
    #[inline]
    fn chain(self, re: f64, factor: f64) -> Self {
        let mut eps = self.eps;
        for e in &mut eps {
            *e *= factor;
        }
        Self { re, eps }
    }

    /// Partial derivatives for the first `k` directions.
    pub fn gradient(&self, k: usize) -> Vec<f64> {
        self.eps[..k.min(MAX_DIRECTIONS)].to_vec()
    }
}

impl Add for Dual {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let mut eps = self.eps;
        for (e, r) in eps.iter_mut().zip(rhs.eps.iter()) {
            *e += r;
        }
        Self {
            re: self.re + rhs.re,
            eps,
        }
    }
}

impl Sub for Dual {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        let mut eps = self.eps;
        for (e, r) in eps.iter_mut().zip(rhs.eps.iter()) {
            *e -= r;
        }
        Self {
            re: self.re - rhs.re,
            eps,
        }
    }
}

impl Mul for Dual {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let mut eps = [0.0; MAX_DIRECTIONS];
        for i in 0..MAX_DIRECTIONS {
            eps[i] = self.eps[i] * rhs.re + rhs.eps[i] * self.re;
        }
        Self {
            re: self.re * rhs.re,
            eps,
        }
    }
}

impl Div for Dual {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = 1.0 / rhs.re;
        let re = self.re * inv;
        let mut eps = [0.0; MAX_DIRECTIONS];
        for i in 0..MAX_DIRECTIONS {
            eps[i] = (self.eps[i] - re * rhs.eps[i]) * inv;
        }
        Self { re, eps }
    }
}

impl Neg for Dual {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.chain(-self.re, -1.0)
    }
}

impl Add<f64> for Dual {
    type Output = Self;

    #[inline]
    fn add(self, rhs: f64) -> Self {
        Self {
            re: self.re + rhs,
            eps: self.eps,
        }
    }
}

impl Sub<f64> for Dual {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: f64) -> Self {
        Self {
            re: self.re - rhs,
            eps: self.eps,
        }
    }
}

impl Mul<f64> for Dual {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: f64) -> Self {
        self.chain(self.re * rhs, rhs)
    }
}

impl Div<f64> for Dual {
    type Output = Self;

    #[inline]
    fn div(self, rhs: f64) -> Self {
        self.chain(self.re / rhs, 1.0 / rhs)
    }
}

impl AddAssign for Dual {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Real for Dual {
    #[inline]
    fn from_f64(value: f64) -> Self {
        Self::constant(value)
    }

    #[inline]
    fn value(self) -> f64 {
        self.re
    }

    #[inline]
    fn ln(self) -> Self {
        self.chain(self.re.ln(), 1.0 / self.re)
    }

    fn powf(self, exponent: Self) -> Self {
        let re = self.re.powf(exponent.re);
        let base_scale = if self.re == 0.0 {
            0.0
        } else {
            exponent.re * re / self.re
        };
        let exponent_is_constant = exponent.eps.iter().all(|e| *e == 0.0);
        let log_base = if exponent_is_constant {
            0.0
        } else {
            re * self.re.ln()
        };
        let mut eps = [0.0; MAX_DIRECTIONS];
        for i in 0..MAX_DIRECTIONS {
            eps[i] = base_scale * self.eps[i] + log_base * exponent.eps[i];
        }
        Self { re, eps }
    }

    #[inline]
    fn sqrt(self) -> Self {
        let re = self.re.sqrt();
        self.chain(re, 0.5 / re)
    }
}
