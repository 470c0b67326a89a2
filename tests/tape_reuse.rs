//! Tests for tape reuse: record once, evaluate many times.

use adsweep::{
    derivative, record, AdError, BReverse, BufferPlanner, DerivativeOptions, Engine, Mode,
    TapeRegistry,
};
use approx::assert_relative_eq;

/// Rosenbrock 2D for BReverse.
fn rosenbrock_brev(x: &[BReverse<f64>]) -> BReverse<f64> {
    let one = BReverse::constant(1.0);
    let hundred = BReverse::constant(100.0);
    let t1 = one - x[0];
    let t2 = x[1] - x[0] * x[0];
    t1 * t1 + hundred * t2 * t2
}

fn rosenbrock_grad(x: &[f64]) -> [f64; 2] {
    [
        -2.0 * (1.0 - x[0]) - 400.0 * x[0] * (x[1] - x[0] * x[0]),
        200.0 * (x[1] - x[0] * x[0]),
    ]
}

fn reuse<'a>(id: usize) -> DerivativeOptions<'a, f64> {
    DerivativeOptions {
        tape_id: id,
        reuse_tape: true,
        ..Default::default()
    }
}

#[test]
fn tape_reuse_rosenbrock_10_points() {
    let (mut tape, _) = record(rosenbrock_brev, &[1.0, 1.0]);

    for i in 0..10 {
        let t = 0.1 * (i as f64 + 1.0);
        let pt = [t, t + 0.5];
        let g = tape.gradient(&pt, 0);
        let expected = rosenbrock_grad(&pt);
        for k in 0..2 {
            assert_relative_eq!(g[k], expected[k], max_relative = 1e-10);
        }
    }
}

#[test]
fn reused_tape_is_evaluated_at_the_new_point() {
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();
    let f = |x: &[BReverse<f64>]| vec![rosenbrock_brev(x)];

    derivative(
        &mut engine,
        &planner,
        f,
        1,
        2,
        &[1.0, 1.0],
        Mode::Jac,
        &DerivativeOptions::default(),
    )
    .unwrap();

    let pt = [-0.5, 2.0];
    let result = derivative(
        &mut engine,
        &planner,
        |_: &[BReverse<f64>]| -> Vec<BReverse<f64>> { unreachable!("tape is reused") },
        1,
        2,
        &pt,
        Mode::Jac,
        &reuse(0),
    )
    .unwrap();
    let jac = result.buffer().and_then(|b| b.as_matrix()).unwrap();
    let expected = rosenbrock_grad(&pt);
    assert_relative_eq!(jac[[0, 0]], expected[0], max_relative = 1e-12);
    assert_relative_eq!(jac[[0, 1]], expected[1], max_relative = 1e-12);
}

#[test]
fn reuse_with_mismatched_input_count_fails() {
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();
    engine.record(7, &[1.0, 2.0, 3.0], |x| vec![x[0] * x[1] * x[2]]);

    let err = derivative(
        &mut engine,
        &planner,
        |x: &[BReverse<f64>]| vec![x[0] * x[1]],
        1,
        2,
        &[1.0, 2.0],
        Mode::Jac,
        &reuse(7),
    )
    .unwrap_err();
    assert_eq!(
        err,
        AdError::DimensionMismatch {
            what: "input count",
            expected: 3,
            found: 2
        }
    );
    // The stored tape is untouched.
    assert_eq!(engine.dimensions(7).unwrap(), (1, 3));
}

#[test]
fn reuse_with_mismatched_output_count_fails() {
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();
    engine.record(0, &[1.0, 2.0], |x| vec![x[0], x[1]]);
    let err = derivative(
        &mut engine,
        &planner,
        |x: &[BReverse<f64>]| vec![x[0]],
        1,
        2,
        &[1.0, 2.0],
        Mode::Jac,
        &reuse(0),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        AdError::DimensionMismatch {
            what: "output count",
            ..
        }
    ));
}

#[test]
fn failed_recording_keeps_the_stored_tape() {
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();
    engine.record(0, &[1.0, 2.0, 3.0], |x| vec![x[0] * x[1] * x[2]]);
    let err = derivative(
        &mut engine,
        &planner,
        |x: &[BReverse<f64>]| vec![x[0], x[1]],
        1,
        2,
        &[1.0, 2.0],
        Mode::Jac,
        &DerivativeOptions::default(),
    )
    .unwrap_err();
    assert_eq!(
        err,
        AdError::DimensionMismatch {
            what: "output count",
            expected: 1,
            found: 2
        }
    );
    assert_eq!(engine.dimensions(0).unwrap(), (1, 3));
    let y = engine.zos_forward(0, &[1.0, 2.0, 3.0]).unwrap();
    assert_eq!(y, vec![6.0]);
}

#[test]
fn reuse_of_unknown_tape_fails() {
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();
    let err = derivative(
        &mut engine,
        &planner,
        |x: &[BReverse<f64>]| vec![x[0]],
        1,
        1,
        &[1.0],
        Mode::Jac,
        &reuse(42),
    )
    .unwrap_err();
    assert_eq!(err, AdError::UnknownTape(42));
}

#[test]
fn recording_overwrites_the_previous_tape() {
    let mut engine = TapeRegistry::<f64>::new();
    engine.record(0, &[1.0], |x| vec![x[0] * x[0]]);
    engine.record(0, &[1.0, 2.0], |x| vec![x[0] + x[1], x[0] - x[1], x[1]]);
    assert_eq!(engine.len(), 1);
    assert_eq!(engine.dimensions(0).unwrap(), (3, 2));
    let y = engine.zos_forward(0, &[4.0, 1.0]).unwrap();
    assert_eq!(y, vec![5.0, 3.0, 1.0]);
}

#[test]
fn tapes_are_independent_per_id() {
    let mut engine = TapeRegistry::<f64>::new();
    engine.record(1, &[2.0], |x| vec![x[0] * x[0]]);
    engine.record(2, &[2.0], |x| vec![x[0] * x[0] * x[0]]);
    assert_eq!(engine.fos_reverse(1, &[3.0], &[1.0]).unwrap(), vec![6.0]);
    assert_eq!(engine.fos_reverse(2, &[3.0], &[1.0]).unwrap(), vec![27.0]);
}
