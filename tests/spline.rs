// Property tests for piecewise-polynomial curves

use approx::assert_relative_eq;
use krusty_smoother::math::{combine, composite, harmonize_knots, kinked_line, Curve, MathError, Polynomial};

const KNOTS: [f64; 13] = [
    -5.0, -4.9999, -4.0, -1.0, -0.1, -0.00001, 0.0, 0.00001, 0.1, 1.0, 2.0, 4.99999, 5.0,
];
const SHORT_KNOTS: [f64; 5] = [-5.0, -0.00001, 0.0, 0.00001, 5.0];

fn polys() -> Vec<Polynomial> {
    [
        vec![0.0],
        vec![1.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 2.0, 3.0],
        vec![4.0, 2.0, 1.0],
    ]
    .into_iter()
    .map(Polynomial::new)
    .collect()
}

/// Continuous curves with one, two and many knots.
fn sample_curves() -> Vec<Curve> {
    let mut curves = Vec::new();

    for p in polys() {
        curves.push(Curve::from_parts(KNOTS.to_vec(), vec![p.clone(); KNOTS.len() + 1]).unwrap());
        for &k in &SHORT_KNOTS {
            curves.push(Curve::from_parts(vec![k], vec![p.clone(), p.clone()]).unwrap());
        }
    }

    let through_origin: Vec<Polynomial> = polys().iter().map(|p| p.add_scalar(-p.eval(0.0))).collect();
    for p in &through_origin {
        for q in &through_origin {
            for &knot in &SHORT_KNOTS {
                curves.push(Curve::from_parts(vec![knot], vec![p.shift(-knot), q.shift(-knot)]).unwrap());
            }
        }
    }

    for p in &through_origin {
        for q in &through_origin {
            for &knot in &SHORT_KNOTS {
                let knot2 = knot + 1.0;
                let p2 = p.shift(-knot);
                let q2 = q.shift(-knot);
                for r in polys() {
                    let r = r.add_scalar(q2.eval(knot2) - r.eval(knot2));
                    curves.push(Curve::from_parts(vec![knot, knot2], vec![p2.clone(), q2.clone(), r]).unwrap());
                }
            }
        }
    }

    let mut reduced: Vec<Curve> = curves.iter().take(20).cloned().collect();
    reduced.extend(curves.iter().skip(20).step_by(20).cloned());
    reduced
}

fn xs() -> impl Iterator<Item = f64> {
    (-10..10).map(f64::from)
}

macro_rules! assert_close {
    ($a:expr, $b:expr) => {
        assert_relative_eq!($a, $b, epsilon = 1e-9, max_relative = 1e-6)
    };
}

#[test]
fn test_sample_curves_are_continuous() {
    for curve in sample_curves() {
        for (i, &k) in curve.knots().iter().enumerate() {
            assert_close!(curve.polys()[i].eval(k), curve.polys()[i + 1].eval(k));
        }
    }
}

#[test]
fn test_eval_uses_piece_right_of_knot() {
    let curve = Curve::from_parts(
        vec![0.0, 1.0],
        vec![Polynomial::constant(-1.0), Polynomial::constant(0.0), Polynomial::constant(1.0)],
    )
    .unwrap();
    assert_eq!(curve.eval(-0.5), -1.0);
    assert_eq!(curve.eval(0.0), 0.0);
    assert_eq!(curve.eval(1.0), 1.0);
    assert_eq!(curve.poly_index(0.5), 1);
    assert_eq!(curve.range(0), (f64::NEG_INFINITY, 0.0));
    assert_eq!(curve.range(2), (1.0, f64::INFINITY));
}

#[test]
fn test_from_parts_validates() {
    assert_eq!(
        Curve::from_parts(vec![0.0], vec![Polynomial::zero()]),
        Err(MathError::LengthMismatch { expected: 2, actual: 1 })
    );
    assert_eq!(
        Curve::from_parts(vec![1.0, 1.0], vec![Polynomial::zero(); 3]),
        Err(MathError::KnotsNotIncreasing { index: 1 })
    );
}

#[test]
fn test_piecewise_linear() {
    let curve = Curve::piecewise_linear(&[0.0, 1.0, 1.0, 3.0], &[0.0, 2.0, 2.0, 0.0]).unwrap();
    assert_eq!(curve.knots(), &[0.0, 1.0, 3.0]);
    assert_eq!(curve.eval(-1.0), 0.0);
    assert_close!(curve.eval(0.5), 1.0);
    assert_close!(curve.eval(2.0), 1.0);
    assert_eq!(curve.eval(10.0), 0.0);
    assert!(Curve::piecewise_linear(&[0.0, -1.0], &[0.0, 0.0]).is_err());
}

#[test]
fn test_insert_knots_preserves_values() {
    for s in sample_curves() {
        let t = s.insert_knots(&KNOTS);
        for &k in &KNOTS {
            assert!(t.knots().contains(&k));
        }
        assert_eq!(t.polys().len(), t.knots().len() + 1);
        for x in xs() {
            assert_close!(s.eval(x), t.eval(x));
        }
    }
}

#[test]
fn test_add() {
    let curves = sample_curves();
    for f in &curves {
        for g in &curves {
            let h = f + g;
            for x in xs() {
                assert_close!(h.eval(x), f.eval(x) + g.eval(x));
            }
        }
    }
}

#[test]
fn test_integrate_is_continuous_and_differentiates_back() {
    for s in sample_curves() {
        let integral = s.integrate();
        for (i, &k) in integral.knots().iter().enumerate() {
            assert_close!(integral.polys()[i].eval(k), integral.polys()[i + 1].eval(k));
        }
        let back = integral.differentiate();
        for x in xs() {
            assert_close!(back.eval(x), s.eval(x));
        }
    }
}

#[test]
fn test_composite() {
    let curves = sample_curves();
    for s in &curves {
        for t in &curves {
            let u = composite(s, t).unwrap();
            assert_eq!(u.polys().len(), u.knots().len() + 1);
            for x in xs() {
                assert_close!(u.eval(x), s.eval(t.eval(x)));
            }
        }
    }

    for g in &curves {
        for k in [-1.0, 0.0, 1.0] {
            for m in [-1.0, 0.0, 1.0] {
                let f = Curve::from_polynomial(Polynomial::new(vec![m, k]));
                let h = composite(&f, g).unwrap();
                for x in xs() {
                    assert_close!(h.eval(x), k * g.eval(x) + m);
                }
            }
        }
    }
}

#[test]
fn test_composite_with_discontinuous_inner_curve() {
    let g = Curve::from_parts(
        vec![0.0],
        vec![Polynomial::new(vec![-2.0, 1.0]), Polynomial::new(vec![3.0, 1.0])],
    )
    .unwrap();
    let f = kinked_line(0.5, 2.0);
    let h = composite(&f, &g).unwrap();
    for x in xs().chain([-0.25, 0.0, 1.5, 2.0]) {
        let o = g.eval(x);
        let expected = if o < 0.0 { 0.5 * o } else { 2.0 * o };
        assert_close!(h.eval(x), expected);
    }
}

#[test]
fn test_kinked_line() {
    for g in sample_curves() {
        let f = kinked_line(0.7, 1.3);
        let h = composite(&f, &g).unwrap();
        for x in xs() {
            let o = g.eval(x);
            let expected = if o < 0.0 { 0.7 * o } else { 1.3 * o };
            assert_close!(h.eval(x), expected);
        }
    }
}

#[test]
fn test_combine_either_order() {
    let a = Curve::piecewise_linear(&[0.0, 1.0], &[0.0, 1.0]).unwrap();
    let b = Curve::piecewise_linear(&[1.0, 2.0], &[1.0, 3.0])
        .unwrap();
    for joined in [combine(&a, &b), combine(&b, &a)] {
        assert_eq!(joined.knots(), &[0.0, 1.0, 2.0]);
        assert_close!(joined.eval(0.5), 0.5);
        assert_close!(joined.eval(1.5), 2.0);
        assert_eq!(joined.eval(5.0), 3.0);
    }

    let c = Curve::piecewise_linear(&[3.0, 4.0], &[3.0, 3.0]).unwrap();
    let joined = combine(&a, &c);
    assert_eq!(joined.knots(), &[0.0, 1.0, 3.0, 4.0]);
    assert_eq!(joined.polys().len(), 5);
}

#[test]
fn test_harmonize_knots() {
    let a = Curve::piecewise_linear(&[0.0, 2.0], &[0.0, 2.0]).unwrap();
    let b = Curve::piecewise_linear(&[0.0, 1.0, 3.0], &[1.0, 0.0, 1.0]).unwrap();
    let harmonized = harmonize_knots(&[a.clone(), b.clone()]);
    assert_eq!(harmonized[0].knots(), &[0.0, 1.0, 2.0, 3.0]);
    assert_eq!(harmonized[0].knots(), harmonized[1].knots());
    for x in xs() {
        assert_close!(harmonized[0].eval(x), a.eval(x));
        assert_close!(harmonized[1].eval(x), b.eval(x));
    }
}

#[test]
fn test_minmax_over_finite_domain() {
    let curve = Curve::piecewise_linear(&[0.0, 1.0, 2.0], &[0.0, -3.0, 2.0]).unwrap();
    assert_eq!(curve.minmax().unwrap(), (-3.0, 2.0));
    assert_eq!(curve.peak_magnitude().unwrap(), 3.0);

    let (lo, hi) = Curve::default().minmax().unwrap();
    assert!(lo.is_infinite() && hi.is_infinite());
}

#[test]
fn test_scalar_operators_and_display() {
    let curve = Curve::piecewise_linear(&[0.0, 1.0], &[0.0, 2.0]).unwrap();
    let shifted = &(&curve * 3.0) + 1.0;
    assert_close!(shifted.eval(0.5), 4.0);
    assert_eq!(shifted.eval(-1.0), 1.0);

    let moved = curve.shift(2.0);
    assert_eq!(moved.knots(), &[-2.0, -1.0]);
    assert_close!(moved.eval(-1.5), curve.eval(0.5));

    let text = curve.to_string();
    assert!(text.starts_with("Spline:"));
    assert_eq!(text.lines().count(), 4);
}
