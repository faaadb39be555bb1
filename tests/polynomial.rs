// Property tests for dense polynomial algebra

use approx::assert_relative_eq;
use krusty_smoother::math::{polynomial, MathError, Polynomial};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn samples() -> Vec<Polynomial> {
    [
        vec![0.0],
        vec![1.0],
        vec![2.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 2.0, 3.0],
        vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0],
        vec![5.0, 4.0, 3.0, 2.0, 1.0, 0.0],
    ]
    .into_iter()
    .map(Polynomial::new)
    .collect()
}

fn xs() -> impl Iterator<Item = f64> {
    (-10..10).map(f64::from)
}

#[test]
fn test_square_matches_eval_squared() {
    for p in samples() {
        let p2 = p.square();
        for x in xs() {
            assert_relative_eq!(p2.eval(x), p.eval(x).powi(2), max_relative = 1e-12);
        }
    }
}

#[test]
fn test_pow() {
    for p in samples() {
        assert_eq!(p.pow(0), Polynomial::constant(1.0));
        assert_eq!(p.pow(1), p);
        for k in 2..8 {
            let pk = p.pow(k);
            for x in xs() {
                assert_relative_eq!(pk.eval(x), p.eval(x).powi(k as i32), max_relative = 1e-12);
            }
        }
    }
}

#[test]
fn test_composite() {
    for f in samples() {
        for g in samples() {
            let h = polynomial::composite(&f, &g);
            for x in xs() {
                assert_relative_eq!(h.eval(x), f.eval(g.eval(x)), epsilon = 1e-9, max_relative = 1e-10);
            }
        }
    }
}

#[test]
fn test_shift() {
    for f in samples() {
        for b in xs() {
            let g = f.shift(b);
            for x in xs() {
                assert_relative_eq!(g.eval(x - b), f.eval(x), epsilon = 1e-6, max_relative = 1e-10);
            }
        }
    }
}

#[test]
fn test_integrate_then_differentiate() {
    for p in samples() {
        let back = p.integrate().differentiate();
        for x in xs() {
            assert_relative_eq!(back.eval(x), p.eval(x), max_relative = 1e-12);
        }
    }
}

#[test]
fn test_differentiate_then_integrate_drops_constant() {
    let p = Polynomial::new(vec![7.0, -3.0, 0.5, 2.0]);
    let back = p.differentiate().integrate();
    assert_eq!(back.coefficients()[0], 0.0);
    for x in xs() {
        assert_relative_eq!(back.eval(x) + 7.0, p.eval(x), max_relative = 1e-12);
    }
}

#[test]
fn test_find_roots_inside_open_interval() {
    // (x - 1)(x - 3)
    let p = Polynomial::new(vec![3.0, -4.0, 1.0]);
    assert_eq!(p.find_roots(0.0, 4.0).unwrap(), vec![1.0, 3.0]);
    assert_eq!(p.find_roots(1.0, 3.0).unwrap(), Vec::<f64>::new());
    assert_eq!(p.find_roots(2.0, 10.0).unwrap(), vec![3.0]);

    let line = Polynomial::new(vec![-2.0, 4.0]);
    assert_eq!(line.find_roots(f64::NEG_INFINITY, f64::INFINITY).unwrap(), vec![0.5]);

    let no_real = Polynomial::new(vec![1.0, 0.0, 1.0]);
    assert!(no_real.find_roots(-10.0, 10.0).unwrap().is_empty());
    assert!(Polynomial::constant(3.0).find_roots(-1.0, 1.0).unwrap().is_empty());
}

#[test]
fn test_find_roots_trims_negligible_leading_terms() {
    let p = Polynomial::new(vec![-1.0, 1.0, 0.0, 1e-20]);
    assert_eq!(p.find_roots(0.0, 2.0).unwrap(), vec![1.0]);
}

#[test]
fn test_find_roots_rejects_cubic() {
    let cubic = Polynomial::new(vec![0.0, -1.0, 0.0, 1.0]);
    assert_eq!(
        cubic.find_roots(-2.0, 2.0),
        Err(MathError::UnsupportedDegree { degree: 3 })
    );
}

#[test]
fn test_minmax() {
    // 1 - (x - 2)^2 on [0, 3]
    let p = Polynomial::new(vec![-3.0, 4.0, -1.0]);
    let (lo, hi) = p.minmax(0.0, 3.0).unwrap();
    assert_relative_eq!(lo, -3.0);
    assert_relative_eq!(hi, 1.0);

    let (lo, hi) = Polynomial::new(vec![1.0, -2.0]).minmax(-1.0, 1.0).unwrap();
    assert_eq!((lo, hi), (-1.0, 3.0));
}

#[test]
fn test_operators() {
    let a = Polynomial::new(vec![1.0, 2.0]);
    let b = Polynomial::new(vec![0.0, 0.0, 3.0]);
    assert_eq!(&a + &b, Polynomial::new(vec![1.0, 2.0, 3.0]));
    assert_eq!(&a - &a, Polynomial::new(vec![0.0, 0.0]));
    assert_eq!(&a * &a, Polynomial::new(vec![1.0, 4.0, 4.0]));
    assert_eq!(a.add_scalar(1.0).scale(2.0), Polynomial::new(vec![4.0, 4.0]));
}

#[test]
fn test_find_roots_recovers_random_quadratics() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for _ in 0..500 {
        let r1: f64 = rng.random_range(-5.0..5.0);
        let r2: f64 = rng.random_range(-5.0..5.0);
        let scale: f64 = rng.random_range(0.1..10.0);
        let p = Polynomial::new(vec![scale * r1 * r2, -scale * (r1 + r2), scale]);

        let roots = p.find_roots(-10.0, 10.0).unwrap();
        let (lo, hi) = if r1 < r2 { (r1, r2) } else { (r2, r1) };
        if (hi - lo).abs() < 1e-6 {
            continue;
        }
        assert_eq!(roots.len(), 2);
        assert_relative_eq!(roots[0], lo, epsilon = 1e-8, max_relative = 1e-8);
        assert_relative_eq!(roots[1], hi, epsilon = 1e-8, max_relative = 1e-8);
    }
}

#[test]
fn test_display_rounds_to_eight_significant_digits() {
    let p = Polynomial::new(vec![0.1 + 0.2, 1.0 / 3.0, 0.0, 2.5e-7, 123_456_789.0]);
    assert_eq!(p.to_string(), "0.3 + 0.33333333x + 2.5e-7x^3 + 1.2345679e8x^4");
    assert_eq!(Polynomial::new(vec![-1.0, 1000.0]).to_string(), "-1 + 1000x");
}
