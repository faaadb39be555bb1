// src/math/mod.rs - Exact polynomial and piecewise-polynomial algebra

pub mod polynomial;
pub mod spline;

pub use polynomial::Polynomial;
pub use spline::{combine, composite, harmonize_knots, kinked_line, Curve};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MathError {
    #[error("root finding is not implemented for degree {degree} polynomials")]
    UnsupportedDegree { degree: usize },
    #[error("length mismatch: expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("knots must be strictly increasing (index {index})")]
    KnotsNotIncreasing { index: usize },
}
