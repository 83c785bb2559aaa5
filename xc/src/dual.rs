//! Forward-mode dual numbers used to carry XC potentials through the pipeline.
//!
//! Each [`Dual`] holds a value and its partial derivatives with respect to the
//! seven independent density variables, so a single forward pass yields both
//! the energy density and every component of the potential.

extern crate nalgebra as na;

use na::SVector;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};

/// Number of independent variables tracked per point.
pub const NUM_VARIABLES: usize = 7;

/// Index of each independent variable in [`Dual::gradient`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variable {
    RhoA = 0,
    RhoB = 1,
    SigmaAA = 2,
    SigmaAB = 3,
    SigmaBB = 4,
    TauA = 5,
    TauB = 6,
}

pub type Gradient = SVector<f64, NUM_VARIABLES>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Dual {
    value: f64,
    gradient: Gradient,
}

impl Dual {
    /// A value that does not depend on any tracked variable.
    #[inline]
    pub fn constant(value: f64) -> Self {
        Self {
            value,
            gradient: Gradient::zeros(),
        }
    }

    /// Seed an independent variable: d(var)/d(var) = 1.
    #[inline]
    pub fn variable(value: f64, var: Variable) -> Self {
        let mut gradient = Gradient::zeros();
        gradient[var as usize] = 1.0;
        Self { value, gradient }
    }

    #[inline]
    pub fn from_parts(value: f64, gradient: Gradient) -> Self {
        Self { value, gradient }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }

    #[inline]
    pub fn gradient(&self) -> &Gradient {
        &self.gradient
    }

    #[inline]
    pub fn partial(&self, var: Variable) -> f64 {
        self.gradient[var as usize]
    }

    /// True when the value and every partial derivative are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.value.is_finite() && self.gradient.iter().all(|g| g.is_finite())
    }

    /// Apply f with derivative df evaluated at the current value.
    #[inline]
    fn chain(self, f: f64, df: f64) -> Self {
        Self {
            value: f,
            gradient: self.gradient * df,
        }
    }

    #[inline]
    pub fn powf(self, p: f64) -> Self {
        let f = self.value.powf(p);
        let df = p * self.value.powf(p - 1.0);
        self.chain(f, df)
    }

    #[inline]
    pub fn powi(self, n: i32) -> Self {
        let f = self.value.powi(n);
        let df = n as f64 * self.value.powi(n - 1);
        self.chain(f, df)
    }

    #[inline]
    pub fn sqrt(self) -> Self {
        let f = self.value.sqrt();
        self.chain(f, 0.5 / f)
    }

    #[inline]
    pub fn recip(self) -> Self {
        let f = self.value.recip();
        self.chain(f, -f * f)
    }

    #[inline]
    pub fn exp(self) -> Self {
        let f = self.value.exp();
        self.chain(f, f)
    }

    #[inline]
    pub fn exp_m1(self) -> Self {
        self.chain(self.value.exp_m1(), self.value.exp())
    }

    #[inline]
    pub fn ln(self) -> Self {
        self.chain(self.value.ln(), self.value.recip())
    }

    #[inline]
    pub fn ln_1p(self) -> Self {
        self.chain(self.value.ln_1p(), (1.0 + self.value).recip())
    }

    #[inline]
    pub fn tanh(self) -> Self {
        let f = self.value.tanh();
        self.chain(f, 1.0 - f * f)
    }
}

impl From<f64> for Dual {
    fn from(value: f64) -> Self {
        Dual::constant(value)
    }
}

impl Add for Dual {
    type Output = Self;
    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            value: self.value + rhs.value,
            gradient: self.gradient + rhs.gradient,
        }
    }
}

impl Add<f64> for Dual {
    type Output = Self;
    #[inline]
    fn add(self, rhs: f64) -> Self {
        Self {
            value: self.value + rhs,
            gradient: self.gradient,
        }
    }
}

impl Add<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn add(self, rhs: Dual) -> Dual {
        rhs + self
    }
}

impl AddAssign for Dual {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        self.value += rhs.value;
        self.gradient += rhs.gradient;
    }
}

impl Sub for Dual {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            value: self.value - rhs.value,
            gradient: self.gradient - rhs.gradient,
        }
    }
}

impl Sub<f64> for Dual {
    type Output = Self;
    #[inline]
    fn sub(self, rhs: f64) -> Self {
        Self {
            value: self.value - rhs,
            gradient: self.gradient,
        }
    }
}

impl Sub<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn sub(self, rhs: Dual) -> Dual {
        Dual {
            value: self - rhs.value,
            gradient: -rhs.gradient,
        }
    }
}

impl SubAssign for Dual {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        self.value -= rhs.value;
        self.gradient -= rhs.gradient;
    }
}

impl Mul for Dual {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        Self {
            value: self.value * rhs.value,
            gradient: self.gradient * rhs.value + rhs.gradient * self.value,
        }
    }
}

impl Mul<f64> for Dual {
    type Output = Self;
    #[inline]
    fn mul(self, rhs: f64) -> Self {
        Self {
            value: self.value * rhs,
            gradient: self.gradient * rhs,
        }
    }
}

impl Mul<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn mul(self, rhs: Dual) -> Dual {
        rhs * self
    }
}

impl MulAssign for Dual {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl Div for Dual {
    type Output = Self;
    #[inline]
    fn div(self, rhs: Self) -> Self {
        let inv = 1.0 / rhs.value;
        Self {
            value: self.value * inv,
            gradient: (self.gradient - rhs.gradient * (self.value * inv)) * inv,
        }
    }
}

impl Div<f64> for Dual {
    type Output = Self;
    #[inline]
    fn div(self, rhs: f64) -> Self {
        Self {
            value: self.value / rhs,
            gradient: self.gradient / rhs,
        }
    }
}

impl Div<Dual> for f64 {
    type Output = Dual;
    #[inline]
    fn div(self, rhs: Dual) -> Dual {
        rhs.recip() * self
    }
}

impl Neg for Dual {
    type Output = Self;
    #[inline]
    fn neg(self) -> Self {
        Self {
            value: -self.value,
            gradient: -self.gradient,
        }
    }
}

impl Sum for Dual {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Dual::constant(0.0), |acc, x| acc + x)
    }
}
