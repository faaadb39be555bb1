// src/math/spline.rs
//! Piecewise-polynomial curves.
//!
//! A [`Curve`] with `n` knots holds `n + 1` polynomial pieces. Piece `i`
//! covers `[knot[i-1], knot[i])` with `knot[-1] = -inf` and `knot[n] = +inf`:
//! a query exactly on a knot is answered by the piece to its right.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul};

use super::{MathError, Polynomial};

#[derive(Debug, Clone, PartialEq)]
pub struct Curve {
    knots: Vec<f64>,
    polys: Vec<Polynomial>,
}

impl Default for Curve {
    fn default() -> Self {
        Self {
            knots: Vec::new(),
            polys: vec![Polynomial::zero()],
        }
    }
}

impl Curve {
    /// Build a curve from explicit pieces.
    pub fn from_parts(knots: Vec<f64>, polys: Vec<Polynomial>) -> Result<Self, MathError> {
        if polys.len() != knots.len() + 1 {
            return Err(MathError::LengthMismatch {
                expected: knots.len() + 1,
                actual: polys.len(),
            });
        }
        check_increasing(&knots)?;
        Ok(Self { knots, polys })
    }

    /// A single polynomial over the whole real line.
    pub fn from_polynomial(poly: Polynomial) -> Self {
        Self {
            knots: Vec::new(),
            polys: vec![poly],
        }
    }

    /// Linear interpolation through `(xs[i], ys[i])`, held constant outside
    /// `[xs[0], xs[n-1]]`.
    ///
    /// A point sharing its abscissa with the previous one would open a
    /// zero-width piece; it is dropped along with that piece.
    pub fn piecewise_linear(xs: &[f64], ys: &[f64]) -> Result<Self, MathError> {
        if xs.len() != ys.len() {
            return Err(MathError::LengthMismatch {
                expected: xs.len(),
                actual: ys.len(),
            });
        }
        if xs.is_empty() {
            return Ok(Self::default());
        }

        let mut knots = vec![xs[0]];
        let mut polys = vec![Polynomial::constant(ys[0])];
        for i in 0..xs.len() - 1 {
            match xs[i + 1].partial_cmp(&xs[i]) {
                Some(Ordering::Greater) => {
                    polys.push(Polynomial::line_from_to(xs[i], ys[i], xs[i + 1], ys[i + 1]));
                    knots.push(xs[i + 1]);
                }
                Some(Ordering::Equal) => {}
                _ => return Err(MathError::KnotsNotIncreasing { index: i + 1 }),
            }
        }
        polys.push(Polynomial::constant(ys[ys.len() - 1]));
        Ok(Self { knots, polys })
    }

    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    pub fn polys(&self) -> &[Polynomial] {
        &self.polys
    }

    /// Index of the piece active at `x`: the first knot strictly greater than `x`.
    pub fn poly_index(&self, x: f64) -> usize {
        self.knots.partition_point(|&k| k <= x)
    }

    pub fn eval(&self, x: f64) -> f64 {
        self.polys[self.poly_index(x)].eval(x)
    }

    /// Domain `(lower, upper)` of piece `i`, infinite at both ends.
    pub fn range(&self, i: usize) -> (f64, f64) {
        let lower = if i > 0 { self.knots[i - 1] } else { f64::NEG_INFINITY };
        let upper = self.knots.get(i).copied().unwrap_or(f64::INFINITY);
        (lower, upper)
    }

    pub fn range_min(&self) -> Option<f64> {
        self.knots.first().copied()
    }

    pub fn range_max(&self) -> Option<f64> {
        self.knots.last().copied()
    }

    pub fn differentiate(&self) -> Self {
        Self {
            knots: self.knots.clone(),
            polys: self.polys.iter().map(Polynomial::differentiate).collect(),
        }
    }

    /// Piecewise antiderivative, continuous across every knot. The leftmost
    /// piece keeps a zero constant term.
    pub fn integrate(&self) -> Self {
        let mut polys: Vec<Polynomial> = Vec::with_capacity(self.polys.len());
        for (i, poly) in self.polys.iter().enumerate() {
            let mut integral = poly.integrate();
            if i > 0 {
                let knot = self.knots[i - 1];
                let offset = polys[i - 1].eval(knot) - integral.eval(knot);
                integral = integral.add_scalar(offset);
            }
            polys.push(integral);
        }
        Self {
            knots: self.knots.clone(),
            polys,
        }
    }

    /// Returns `q` with `q(x) = p(x + x0)`.
    pub fn shift(&self, x0: f64) -> Self {
        if x0 == 0.0 {
            return self.clone();
        }
        Self {
            knots: self.knots.iter().map(|k| k - x0).collect(),
            polys: self.polys.iter().map(|p| p.shift(x0)).collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self {
            knots: self.knots.clone(),
            polys: self.polys.iter().map(|p| p.scale(factor)).collect(),
        }
    }

    pub fn add_scalar(&self, value: f64) -> Self {
        Self {
            knots: self.knots.clone(),
            polys: self.polys.iter().map(|p| p.add_scalar(value)).collect(),
        }
    }

    /// Pointwise sum. Differing knot sets are merged first, so the operands
    /// may come from unrelated constructions.
    pub fn add_curve(&self, other: &Curve) -> Self {
        let (lhs, rhs) = if self.knots == other.knots {
            (self.clone(), other.clone())
        } else {
            let lhs = self.insert_knots(&other.knots);
            let rhs = other.insert_knots(&lhs.knots);
            (lhs, rhs)
        };
        debug_assert_eq!(lhs.knots, rhs.knots);
        Self {
            polys: lhs.polys.iter().zip(&rhs.polys).map(|(a, b)| a + b).collect(),
            knots: lhs.knots,
        }
    }

    /// Refine the knot sequence without changing the represented function.
    ///
    /// `knots` must be strictly increasing. Knots already present are skipped;
    /// each new knot splits the active piece by duplicating it.
    pub fn insert_knots(&self, knots: &[f64]) -> Self {
        debug_assert!(knots.windows(2).all(|w| w[0] < w[1]));

        let mut new_knots = Vec::with_capacity(self.knots.len() + knots.len());
        let mut new_polys = Vec::with_capacity(self.polys.len() + knots.len());
        new_polys.push(self.polys[0].clone());

        let (mut i, mut j) = (0, 0);
        while i < self.knots.len() && j < knots.len() {
            if self.knots[i] <= knots[j] {
                if self.knots[i] == knots[j] {
                    j += 1;
                }
                new_knots.push(self.knots[i]);
                new_polys.push(self.polys[i + 1].clone());
                i += 1;
            } else {
                new_knots.push(knots[j]);
                new_polys.push(new_polys[new_polys.len() - 1].clone());
                j += 1;
            }
        }
        for &knot in &knots[j..] {
            new_knots.push(knot);
            new_polys.push(new_polys[new_polys.len() - 1].clone());
        }
        for i in i..self.knots.len() {
            new_knots.push(self.knots[i]);
            new_polys.push(self.polys[i + 1].clone());
        }

        Self {
            knots: new_knots,
            polys: new_polys,
        }
    }

    /// `(min, max)` over the finite domain `[knot[0], knot[n-1]]`.
    ///
    /// A curve with fewer than two knots has no finite piece and yields
    /// `(+inf, -inf)`.
    pub fn minmax(&self) -> Result<(f64, f64), MathError> {
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for (i, w) in self.knots.windows(2).enumerate() {
            let (lo, hi) = self.polys[i + 1].minmax(w[0], w[1])?;
            y_min = y_min.min(lo);
            y_max = y_max.max(hi);
        }
        Ok((y_min, y_max))
    }

    /// Largest absolute value over the finite domain.
    pub fn peak_magnitude(&self) -> Result<f64, MathError> {
        let (lo, hi) = self.minmax()?;
        Ok(lo.abs().max(hi.abs()))
    }
}

fn check_increasing(knots: &[f64]) -> Result<(), MathError> {
    match knots.windows(2).position(|w| !(w[0] < w[1])) {
        Some(i) => Err(MathError::KnotsNotIncreasing { index: i + 1 }),
        None => Ok(()),
    }
}

/// Concatenate two curves whose finite domains do not overlap. The operands
/// may be passed in either order; a shared boundary knot is merged.
pub fn combine(a: &Curve, b: &Curve) -> Curve {
    let (Some(a_last), Some(b_first)) = (a.range_max(), b.range_min()) else {
        return if a.knots.is_empty() { b.clone() } else { a.clone() };
    };
    let (first, second) = if a_last > b_first { (b, a) } else { (a, b) };
    debug_assert!(first.knots[first.knots.len() - 1] <= second.knots[0]);

    let mut knots = first.knots.clone();
    let mut polys = first.polys.clone();
    if first.knots[first.knots.len() - 1] == second.knots[0] {
        polys.pop();
        knots.extend_from_slice(&second.knots[1..]);
    } else {
        knots.extend_from_slice(&second.knots);
    }
    polys.extend_from_slice(&second.polys[1..]);
    Curve { knots, polys }
}

/// `k_neg * x` for `x < 0` and `k_pos * x` for `x >= 0`.
pub fn kinked_line(k_neg: f64, k_pos: f64) -> Curve {
    Curve {
        knots: vec![0.0],
        polys: vec![
            Polynomial::new(vec![0.0, k_neg]),
            Polynomial::new(vec![0.0, k_pos]),
        ],
    }
}

/// Build `h(x) = f(g(x))`.
///
/// Every piece of `g` is split wherever it crosses a knot of `f`, so each
/// resulting sub-interval maps into a single piece of `f` and the output
/// piece is the exact polynomial composition.
pub fn composite(f: &Curve, g: &Curve) -> Result<Curve, MathError> {
    let mut knots: Vec<f64> = Vec::new();
    let mut polys = Vec::new();

    for (j, gp) in g.polys.iter().enumerate() {
        let (lower, upper) = g.range(j);

        let mut boundaries = Vec::new();
        for &fk in &f.knots {
            boundaries.extend(gp.add_scalar(-fk).find_roots(lower, upper)?);
        }
        boundaries.sort_by(f64::total_cmp);
        boundaries.dedup();
        boundaries.push(upper);

        let mut left = knots.last().copied().unwrap_or(lower);
        for right in boundaries {
            let i = f.poly_index(gp.eval(probe_point(left, right)));
            knots.push(right);
            polys.push(f.polys[i].compose(gp));
            left = right;
        }
    }

    // the last boundary is the synthetic +inf of g's final piece
    knots.pop();
    Ok(Curve { knots, polys })
}

/// A finite point inside `(left, right)`, one unit in from an infinite end.
fn probe_point(left: f64, right: f64) -> f64 {
    match (left.is_finite(), right.is_finite()) {
        (true, true) => 0.5 * (left + right),
        (false, true) => right - 1.0,
        (true, false) => left + 1.0,
        (false, false) => 0.0,
    }
}

/// Bring every curve onto the union of all their knots.
pub fn harmonize_knots(curves: &[Curve]) -> Vec<Curve> {
    if curves.windows(2).all(|w| w[0].knots == w[1].knots) {
        return curves.to_vec();
    }
    let mut union: Vec<f64> = curves.iter().flat_map(|c| c.knots.iter().copied()).collect();
    union.sort_by(f64::total_cmp);
    union.dedup();
    curves.iter().map(|c| c.insert_knots(&union)).collect()
}

impl Add for &Curve {
    type Output = Curve;

    fn add(self, other: &Curve) -> Curve {
        self.add_curve(other)
    }
}

impl Add<f64> for &Curve {
    type Output = Curve;

    fn add(self, value: f64) -> Curve {
        self.add_scalar(value)
    }
}

impl Mul<f64> for &Curve {
    type Output = Curve;

    fn mul(self, factor: f64) -> Curve {
        self.scale(factor)
    }
}

impl fmt::Display for Curve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Spline:")?;
        for (i, poly) in self.polys.iter().enumerate() {
            match self.knots.get(i) {
                Some(knot) => writeln!(f, "    x < {knot:.6}\t{poly}")?,
                None => writeln!(f, "    else    \t{poly}")?,
            }
        }
        Ok(())
    }
}
