//! Result shapes and scoped buffer release.

use adsweep::{
    derivative, AdError, AllocationShape, BufferPlanner, DerivativeOptions, Dimensions, Mode,
    Seeds, TapeRegistry,
};

#[test]
fn first_order_shapes() {
    let dims = Dimensions::new(3, 5).with_directions(4).with_weights(2);
    let plan = |mode| BufferPlanner::plan(mode, 1, dims).unwrap();
    assert_eq!(plan(Mode::Jac), Some(AllocationShape::Matrix(3, 5)));
    assert_eq!(plan(Mode::JacVec), Some(AllocationShape::Vector(3)));
    assert_eq!(plan(Mode::JacMat), Some(AllocationShape::Matrix(3, 4)));
    assert_eq!(plan(Mode::VecJac), Some(AllocationShape::Vector(5)));
    assert_eq!(plan(Mode::MatJac), Some(AllocationShape::Matrix(2, 5)));
    assert_eq!(plan(Mode::AbsNormal), None);
}

#[test]
fn single_direction_matrix_stays_a_matrix() {
    let dims = Dimensions::new(3, 5).with_directions(1);
    assert_eq!(
        BufferPlanner::plan(Mode::JacMat, 1, dims).unwrap(),
        Some(AllocationShape::Matrix(3, 1))
    );
}

#[test]
fn second_order_shapes() {
    let dims = Dimensions::new(2, 4).with_directions(3);
    assert_eq!(
        BufferPlanner::plan(Mode::Hess, 2, dims).unwrap(),
        Some(AllocationShape::Tensor(2, 4, 4))
    );
    assert_eq!(
        BufferPlanner::plan(Mode::JacMat, 2, dims).unwrap(),
        Some(AllocationShape::Tensor(2, 3, 2))
    );
    assert_eq!(
        BufferPlanner::plan(Mode::JacVec, 2, dims).unwrap(),
        Some(AllocationShape::Tensor(2, 1, 2))
    );
}

#[test]
fn unsupported_combinations() {
    let dims = Dimensions::new(2, 2);
    for mode in [Mode::Jac, Mode::VecJac, Mode::MatJac, Mode::AbsNormal] {
        assert!(matches!(
            BufferPlanner::plan(mode, 2, dims),
            Err(AdError::NotImplemented(_))
        ));
    }
    assert!(matches!(
        BufferPlanner::plan(Mode::Hess, 1, dims),
        Err(AdError::NotImplemented(_))
    ));
    assert!(matches!(
        BufferPlanner::plan(Mode::Jac, 3, dims),
        Err(AdError::NotImplemented(_))
    ));
}

#[test]
fn successful_dispatch_hands_the_buffer_to_the_caller() {
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();
    let result = derivative(
        &mut engine,
        &planner,
        |x| vec![x[0] * x[1]],
        1,
        2,
        &[2.0, 3.0],
        Mode::Jac,
        &DerivativeOptions::default(),
    )
    .unwrap();
    assert_eq!(planner.live(), 0);
    assert_eq!(
        result.buffer().map(|b| b.shape()),
        Some(AllocationShape::Matrix(1, 2))
    );
}

#[test]
fn failing_dispatch_releases_its_buffer() {
    let mut engine = TapeRegistry::<f64>::new();
    let planner = BufferPlanner::new();
    // Direction of the wrong length: the buffer is allocated, then the sweep fails.
    let bad = [1.0, 0.0, 0.0];
    let options = DerivativeOptions {
        direction: Some(Seeds::One(&bad)),
        ..Default::default()
    };
    let err = derivative(
        &mut engine,
        &planner,
        |x| vec![x[0] * x[1], x[0]],
        2,
        2,
        &[2.0, 3.0],
        Mode::JacVec,
        &options,
    )
    .unwrap_err();
    assert!(matches!(err, AdError::DimensionMismatch { .. }), "{err}");
    assert_eq!(planner.live(), 0);
}
