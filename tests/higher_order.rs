//! Compressed higher-order tensors from the tape.

use adsweep::{
    address, build_tensor, derivative, higher_order_tensor, record_multi, seed_matrix,
    tensor_size, BReverse, BufferPlanner, DerivativeOptions, Elementary, Engine, Mode,
    TapeRegistry,
};
use approx::assert_relative_eq;
use ndarray::IxDyn;

/// f(x) = [x0 x1 exp(x2), sin(x0) + x1³ / x2, atan(x0 x2)]
fn smooth(x: &[BReverse<f64>]) -> Vec<BReverse<f64>> {
    vec![
        x[0] * x[1] * x[2].exp(),
        x[0].sin() + x[1].powi(3) / x[2],
        (x[0] * x[2]).atan(),
    ]
}

#[test]
fn hessian_sweep_equals_order_two_tensor() {
    let x = [0.4, -0.8, 1.3];
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();

    let hess = derivative(
        &mut engine,
        &planner,
        smooth,
        3,
        3,
        &x,
        Mode::Hess,
        &DerivativeOptions {
            order: 2,
            ..Default::default()
        },
    )
    .unwrap();
    let hess = hess.buffer().and_then(|b| b.as_tensor()).unwrap().clone();

    let reuse = DerivativeOptions {
        reuse_tape: true,
        ..Default::default()
    };
    let dense = higher_order_tensor(&mut engine, smooth, 3, 3, &x, 2, &reuse).unwrap();
    assert_eq!(dense.shape(), &[3, 3, 3]);

    for c in 0..3 {
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    dense[IxDyn(&[i, j, c])],
                    hess[[c, i, j]],
                    epsilon = 1e-10,
                    max_relative = 1e-10
                );
            }
        }
    }
}

#[test]
fn compressed_slots_hold_derivatives() {
    // f(x, y) = x³ y²
    let mut engine = TapeRegistry::<f64>::new();
    engine.record(0, &[1.5, -2.0], |x| vec![x[0].powi(3) * x[1] * x[1]]);
    let (x, y) = (1.5_f64, -2.0_f64);
    let seed = seed_matrix::<f64>(2, &[1, 2]).unwrap();
    let t = engine.tensor_eval(0, 3, &[x, y], seed.view()).unwrap();
    assert_eq!(t.dim(), (1, tensor_size(2, 3)));

    let at = |ms: [usize; 3]| t[[0, address(3, &ms) - 1]];
    assert_relative_eq!(at([0, 0, 0]), x.powi(3) * y * y, max_relative = 1e-12);
    assert_relative_eq!(at([1, 0, 0]), 3.0 * x * x * y * y, max_relative = 1e-12);
    assert_relative_eq!(at([2, 1, 0]), 6.0 * x * x * y, max_relative = 1e-12);
    assert_relative_eq!(at([1, 1, 1]), 6.0 * y * y, max_relative = 1e-12);
    assert_relative_eq!(at([2, 2, 1]), 6.0 * x * x, max_relative = 1e-12);
    assert_relative_eq!(at([2, 2, 2]), 0.0, epsilon = 1e-12);
}

#[test]
fn third_order_tensor_is_symmetric_and_correct() {
    // f(x) = exp(x0) x1 x2
    let x = [0.2, 1.5, -0.7];
    let (tape, _) = record_multi(|v| vec![v[0].exp() * v[1] * v[2]], &x);
    let seed = seed_matrix::<f64>(3, &[1, 2, 3]).unwrap();
    let compressed = tape.tensor_eval(3, &x, seed.view());
    let t = build_tensor(3, 1, 3, compressed.view()).unwrap();

    let e = x[0].exp();
    let value = e * x[1] * x[2];
    assert_relative_eq!(t[IxDyn(&[0, 1, 2, 0])], e, max_relative = 1e-12);
    assert_relative_eq!(t[IxDyn(&[2, 0, 1, 0])], e, max_relative = 1e-12);
    assert_relative_eq!(t[IxDyn(&[0, 0, 0, 0])], value, max_relative = 1e-12);
    assert_relative_eq!(t[IxDyn(&[0, 0, 1, 0])], e * x[2], max_relative = 1e-12);
    assert_relative_eq!(t[IxDyn(&[1, 1, 0, 0])], 0.0, epsilon = 1e-14);
}

#[test]
fn directional_seed_gives_directional_derivatives() {
    // Seeding with a single direction v gives d^k/dt^k f(x + t v).
    let x = [0.3, 0.9];
    let (tape, _) = record_multi(|v| vec![(v[0] * v[1]).sin()], &x);
    let seed = ndarray::arr2(&[[1.0], [2.0]]);
    let t = tape.tensor_eval(2, &x, seed.view());

    // g(t) = sin((x0 + t)(x1 + 2t))
    let u = x[0] * x[1];
    let du = x[1] + 2.0 * x[0];
    let d2u = 4.0;
    assert_relative_eq!(t[[0, 1]], u.cos() * du, max_relative = 1e-12);
    assert_relative_eq!(
        t[[0, 2]],
        -u.sin() * du * du + u.cos() * d2u,
        max_relative = 1e-12
    );
}

#[test]
fn hov_forward_taylor_coefficients() {
    let x = [0.5, 2.0];
    let (tape, _) = record_multi(|v| vec![v[0].ln() * v[1], v[1].sqrt()], &x);
    let dirs = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
    let (y, coeffs) = tape.hov_forward(3, &x, &dirs);
    assert_relative_eq!(y[0], x[0].ln() * x[1], max_relative = 1e-12);
    assert_eq!(coeffs.dim(), (2, 2, 3));

    // ln(x0 + t) x1 = ln x0 x1 + x1 (t/x0 - t²/(2x0²) + t³/(3x0³))
    assert_relative_eq!(coeffs[[0, 0, 0]], x[1] / x[0], max_relative = 1e-12);
    assert_relative_eq!(
        coeffs[[0, 0, 1]],
        -x[1] / (2.0 * x[0] * x[0]),
        max_relative = 1e-12
    );
    assert_relative_eq!(
        coeffs[[0, 0, 2]],
        x[1] / (3.0 * x[0].powi(3)),
        max_relative = 1e-12
    );
    // sqrt(x1 + t): 1/(2 sqrt x1), -1/(8 x1^{3/2})
    assert_relative_eq!(coeffs[[1, 1, 0]], 0.5 / x[1].sqrt(), max_relative = 1e-12);
    assert_relative_eq!(
        coeffs[[1, 1, 1]],
        -0.125 / x[1].powf(1.5),
        max_relative = 1e-12
    );
    assert_eq!(coeffs[[1, 0, 0]], 0.0);
}

#[test]
fn elementary_jets_match_hessian_sweep() {
    // Exercise every unary jet against forward-over-reverse.
    let x = [0.35, 0.6];
    let f = |v: &[BReverse<f64>]| {
        vec![
            v[0].tan() * v[1].cosh()
                + v[0].asin() * v[1].acos()
                + v[0].sinh() / v[1].tanh()
                + v[0].powf(v[1])
                + v[1].powf(BReverse::constant(2.5))
                + v[0].recip() * v[1].exp()
                - (v[0] - v[1]).abs() * v[1].powi(-2),
        ]
    };
    let (tape, _) = record_multi(f, &x);
    let hess = tape.hessian_component(&x, 0);
    let seed = seed_matrix::<f64>(2, &[1, 2]).unwrap();
    let t = tape.tensor_eval(2, &x, seed.view());
    let dense = build_tensor(2, 1, 2, t.view()).unwrap();
    for i in 0..2 {
        for j in 0..2 {
            assert_relative_eq!(dense[IxDyn(&[i, j, 0])], hess[i][j], max_relative = 1e-9);
        }
    }
}
