// src/discretize.rs
//! Adaptive linear discretization of position curves.
//!
//! Given one curve per axis, all sharing a knot sequence, find the sample
//! times at which straight-line interpolation between consecutive samples
//! stays within each axis' chord tolerance.

use thiserror::Error;

use crate::math::{Curve, MathError, Polynomial};

#[derive(Debug, Error)]
pub enum DiscretizeError {
    #[error("Curve for axis {axis} does not share the knot sequence of axis 0")]
    KnotMismatch { axis: usize },
    #[error("Expected {expected} tolerances, got {actual}")]
    ToleranceCount { expected: usize, actual: usize },
    #[error("Minimum time step must be positive, got {0}")]
    InvalidMinDt(f64),
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

/// Sampled curves: `values[axis][j]` is axis `axis` at `times[j]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Discretization {
    pub values: Vec<Vec<f64>>,
    pub times: Vec<f64>,
}

impl Discretization {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// All axis values at sample `j`.
    pub fn sample(&self, j: usize) -> Vec<f64> {
        self.values.iter().map(|axis| axis[j]).collect()
    }

    /// One row per axis followed by the time row.
    pub fn to_matrix(&self) -> Vec<Vec<f64>> {
        let mut rows = self.values.clone();
        rows.push(self.times.clone());
        rows
    }
}

/// Discretize `curves` so that the chord error on axis `i` stays below
/// `tolerances[i]`, never splitting an interval narrower than `min_dt`.
pub fn linear_interpolate(
    curves: &[Curve],
    tolerances: &[f64],
    min_dt: f64,
) -> Result<Discretization, DiscretizeError> {
    let times = discretization_points(curves, tolerances, min_dt)?;
    let values = curves
        .iter()
        .map(|curve| times.iter().map(|&t| curve.eval(t)).collect())
        .collect();
    Ok(Discretization { values, times })
}

/// Knots of the shared sequence merged with every refinement point.
pub fn discretization_points(
    curves: &[Curve],
    tolerances: &[f64],
    min_dt: f64,
) -> Result<Vec<f64>, DiscretizeError> {
    if tolerances.len() != curves.len() {
        return Err(DiscretizeError::ToleranceCount {
            expected: curves.len(),
            actual: tolerances.len(),
        });
    }
    if !(min_dt > 0.0) {
        return Err(DiscretizeError::InvalidMinDt(min_dt));
    }
    let Some(first) = curves.first() else {
        return Ok(Vec::new());
    };
    if let Some(axis) = curves.iter().position(|c| c.knots() != first.knots()) {
        return Err(DiscretizeError::KnotMismatch { axis });
    }

    let knots = first.knots();
    let mut points = Vec::with_capacity(knots.len());
    for (i, w) in knots.windows(2).enumerate() {
        points.push(w[0]);
        let polys: Vec<&Polynomial> = curves.iter().map(|c| &c.polys()[i + 1]).collect();
        refine(&polys, tolerances, min_dt, w[0], w[1], &mut points)?;
    }
    if let Some(&last) = knots.last() {
        points.push(last);
    }
    Ok(points)
}

// Appends the interior points needed on (a, b) in ascending order.
fn refine(
    polys: &[&Polynomial],
    tolerances: &[f64],
    min_dt: f64,
    a: f64,
    b: f64,
    out: &mut Vec<f64>,
) -> Result<(), MathError> {
    if b - a < min_dt {
        return Ok(());
    }
    if let Some(x) = subdivision_point(polys, tolerances, a, b)? {
        refine(polys, tolerances, min_dt, a, x, out)?;
        out.push(x);
        refine(polys, tolerances, min_dt, x, b, out)?;
    }
    Ok(())
}

/// The point of largest chord error relative to tolerance on `(a, b)`
/// across all axes, if that error exceeds the tolerance.
fn subdivision_point(
    polys: &[&Polynomial],
    tolerances: &[f64],
    a: f64,
    b: f64,
) -> Result<Option<f64>, MathError> {
    let mut worst: Option<f64> = None;
    let mut worst_relative = 1.0;

    for (&poly, tolerance) in polys.iter().zip(tolerances) {
        let chord = Polynomial::line_from_to(a, poly.eval(a), b, poly.eval(b));
        let error = &chord - poly;
        for x in error.differentiate().find_roots(a, b)? {
            let relative = error.eval(x).abs() / tolerance;
            if relative > worst_relative {
                worst_relative = relative;
                worst = Some(x);
            }
        }
    }
    Ok(worst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_gives_empty_timeline() {
        let result = linear_interpolate(&[], &[], 0.01).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.to_matrix(), vec![Vec::<f64>::new()]);
    }

    #[test]
    fn rejects_non_positive_min_dt() {
        let curve = Curve::piecewise_linear(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
        assert!(matches!(
            linear_interpolate(&[curve], &[0.1], 0.0),
            Err(DiscretizeError::InvalidMinDt(_))
        ));
    }
}
