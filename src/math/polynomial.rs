// src/math/polynomial.rs
//! Dense polynomials over `f64`.
//!
//! Coefficients are stored lowest degree first, so `[1.0, 2.0, 3.0]` is
//! `1 + 2x + 3x²`. Trailing zero coefficients are allowed and carried through
//! arithmetic unchanged; every operation returns a fresh value.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use super::MathError;

/// Leading coefficients smaller than this are treated as zero when classifying
/// a polynomial for root finding.
const LEADING_COEFFICIENT_EPSILON: f64 = 1e-16;

#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Default for Polynomial {
    fn default() -> Self {
        Self::zero()
    }
}

impl From<Vec<f64>> for Polynomial {
    fn from(coefficients: Vec<f64>) -> Self {
        Self::new(coefficients)
    }
}

impl Polynomial {
    /// An empty coefficient vector is normalized to the zero polynomial.
    pub fn new(coefficients: Vec<f64>) -> Self {
        if coefficients.is_empty() {
            return Self::zero();
        }
        Self { coefficients }
    }

    pub fn zero() -> Self {
        Self::constant(0.0)
    }

    pub fn constant(value: f64) -> Self {
        Self { coefficients: vec![value] }
    }

    /// Linear function through `(x0, y0)` and `(x1, y1)`.
    pub fn line_from_to(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        let slope = (y1 - y0) / (x1 - x0);
        let intercept = y0 - slope * x0;
        Self { coefficients: vec![intercept, slope] }
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Nominal degree, including any trailing zero coefficients.
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluate with Horner's method.
    pub fn eval(&self, x: f64) -> f64 {
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * x + c)
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            coefficients: self.coefficients.iter().map(|c| c * factor).collect(),
        }
    }

    pub fn add_scalar(&self, value: f64) -> Self {
        let mut coefficients = self.coefficients.clone();
        coefficients[0] += value;
        Self { coefficients }
    }

    /// Square without going through the generic product: every cross term is
    /// computed once and doubled.
    pub fn square(&self) -> Self {
        let c = &self.coefficients;
        let n = c.len();
        let mut out = vec![0.0; 2 * n - 1];
        for i in 0..n {
            out[2 * i] += c[i] * c[i];
            for j in (i + 1)..n {
                out[i + j] += 2.0 * c[i] * c[j];
            }
        }
        Self { coefficients: out }
    }

    /// Integer power by square-and-multiply.
    pub fn pow(&self, exponent: u32) -> Self {
        let mut result = Self::constant(1.0);
        let mut base = self.clone();
        let mut e = exponent;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            e >>= 1;
            if e > 0 {
                base = base.square();
            }
        }
        result
    }

    pub fn differentiate(&self) -> Self {
        if self.coefficients.len() == 1 {
            return Self::zero();
        }
        let coefficients = self
            .coefficients
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, c)| c * i as f64)
            .collect();
        Self { coefficients }
    }

    /// Antiderivative with a zero constant term. Callers that need continuity
    /// (see [`crate::math::Curve::integrate`]) fix the constant themselves.
    pub fn integrate(&self) -> Self {
        let mut coefficients = Vec::with_capacity(self.coefficients.len() + 1);
        coefficients.push(0.0);
        coefficients.extend(
            self.coefficients
                .iter()
                .enumerate()
                .map(|(i, c)| c / (i as f64 + 1.0)),
        );
        Self { coefficients }
    }

    /// Taylor shift: returns `q` with `q(x) = p(x + x0)`.
    ///
    /// Uses the triangular recurrence `t[i][j+1] = t[i-1][j] + t[i-1][j+1]`
    /// over an `(n+1) x (n+1)` table, O(n²) additions.
    pub fn shift(&self, x0: f64) -> Self {
        let a = &self.coefficients;
        let m = a.len();
        let n = m - 1;
        if x0 == 0.0 || n == 0 {
            return self.clone();
        }

        let mut t = vec![vec![0.0; m]; m];
        for i in 0..n {
            t[i][0] = a[n - i - 1] * x0.powi((n - i - 1) as i32);
            t[i][i + 1] = a[n] * x0.powi(n as i32);
        }
        for j in 0..n {
            for i in (j + 1)..=n {
                t[i][j + 1] = t[i - 1][j] + t[i - 1][j + 1];
            }
        }

        let mut q = vec![0.0; m];
        for (i, qi) in q.iter_mut().enumerate().take(n) {
            *qi = t[n][i + 1] / x0.powi(i as i32);
        }
        q[n] = a[n];
        Self { coefficients: q }
    }

    /// Substitution `f(g(x))`, accumulating `f[i] * g^i` with the powers of
    /// `g` built incrementally.
    pub fn compose(&self, g: &Polynomial) -> Self {
        let mut result = Self::zero();
        let mut power = Self::constant(1.0);
        for (i, &c) in self.coefficients.iter().enumerate() {
            if i > 0 {
                power = &power * g;
            }
            result = &result + &power.scale(c);
        }
        result
    }

    /// Real roots strictly inside `(x_min, x_max)`, in ascending order.
    ///
    /// Only degrees up to two are supported after trimming negligible leading
    /// coefficients; anything higher is reported as
    /// [`MathError::UnsupportedDegree`].
    pub fn find_roots(&self, x_min: f64, x_max: f64) -> Result<Vec<f64>, MathError> {
        let mut c = self.coefficients.as_slice();
        while c.len() > 1 && c[c.len() - 1].abs() < LEADING_COEFFICIENT_EPSILON {
            c = &c[..c.len() - 1];
        }
        let inside = |x: &f64| x_min < *x && *x < x_max;

        let roots = match c.len() {
            0 | 1 => Vec::new(),
            2 => vec![-c[0] / c[1]],
            3 => {
                let b = c[1] / c[2];
                let q = c[0] / c[2];
                let discriminant = b * b - 4.0 * q;
                if discriminant == 0.0 {
                    vec![-b / 2.0]
                } else if discriminant > 0.0 {
                    let sd = discriminant.sqrt();
                    vec![(-b - sd) / 2.0, (-b + sd) / 2.0]
                } else {
                    Vec::new()
                }
            }
            len => return Err(MathError::UnsupportedDegree { degree: len - 1 }),
        };
        Ok(roots.into_iter().filter(inside).collect())
    }

    /// `(min, max)` over the closed interval `[x_min, x_max]`.
    pub fn minmax(&self, x_min: f64, x_max: f64) -> Result<(f64, f64), MathError> {
        let mut candidates = self.differentiate().find_roots(x_min, x_max)?;
        candidates.push(x_min);
        candidates.push(x_max);
        Ok(candidates
            .into_iter()
            .map(|x| self.eval(x))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), y| {
                (lo.min(y), hi.max(y))
            }))
    }
}

/// Free-function form of [`Polynomial::compose`]: `f(g(x))`.
pub fn composite(f: &Polynomial, g: &Polynomial) -> Polynomial {
    f.compose(g)
}

impl Add for &Polynomial {
    type Output = Polynomial;

    fn add(self, other: &Polynomial) -> Polynomial {
        let (long, short) = if self.coefficients.len() >= other.coefficients.len() {
            (self, other)
        } else {
            (other, self)
        };
        let mut coefficients = long.coefficients.clone();
        for (c, s) in coefficients.iter_mut().zip(&short.coefficients) {
            *c += s;
        }
        Polynomial { coefficients }
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;

    fn sub(self, other: &Polynomial) -> Polynomial {
        self + &(-other)
    }
}

impl Neg for &Polynomial {
    type Output = Polynomial;

    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, other: &Polynomial) -> Polynomial {
        let mut out = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in other.coefficients.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial { coefficients: out }
    }
}

/// `value` rounded to `digits` significant digits, trailing zeros dropped,
/// switching to exponent notation for very large or small magnitudes.
fn significant(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return value.to_string();
    }
    let exponent = value.abs().log10().floor() as i32;
    if exponent < -4 || exponent >= digits as i32 {
        let text = format!("{:.*e}", digits - 1, value);
        return match text.split_once('e') {
            Some((mantissa, exp)) if mantissa.contains('.') => {
                format!("{}e{}", mantissa.trim_end_matches('0').trim_end_matches('.'), exp)
            }
            _ => text,
        };
    }
    let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
    let text = format!("{:.*}", decimals, value);
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}

impl fmt::Display for Polynomial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for (i, c) in self.coefficients.iter().enumerate() {
            if i > 0 && *c == 0.0 {
                continue;
            }
            write!(f, "{sep}{}", significant(*c, 8))?;
            match i {
                0 => {}
                1 => write!(f, "x")?,
                _ => write!(f, "x^{i}")?,
            }
            sep = " + ";
        }
        Ok(())
    }
}
