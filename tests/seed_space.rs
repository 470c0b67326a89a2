//! Seed-index computation and seed-space reduction.

use adsweep::{
    expand_from_seed_space, seed_indices, seed_indices_adolc, seed_matrix, to_adolc_format,
    to_seed_space, to_seed_space_adolc, AdError,
};

#[test]
fn worked_example() {
    let partials = vec![vec![0, 1, 1], vec![0, 2, 0]];
    assert_eq!(seed_indices(&partials), vec![2, 3]);
    assert_eq!(to_seed_space(&partials, None), vec![vec![1, 1], vec![2, 0]]);
}

#[test]
fn seed_indices_are_sorted_unique_union() {
    let partials = vec![
        vec![0, 0, 3, 0, 1],
        vec![2, 0, 1, 0, 0],
        vec![0, 0, 0, 0, 0],
    ];
    assert_eq!(seed_indices(&partials), vec![1, 3, 5]);
    assert!(seed_indices::<Vec<usize>>(&[]).is_empty());
}

#[test]
fn explicit_seed_indices_are_used_as_given() {
    let partials = vec![vec![1, 0, 2]];
    let reduced = to_seed_space(&partials, Some(&[1, 2, 3]));
    assert_eq!(reduced, vec![vec![1, 0, 2]]);
}

#[test]
fn reduction_then_expansion_restores_pattern() {
    let partials = vec![
        vec![0, 0, 3, 0, 1],
        vec![2, 0, 1, 0, 0],
        vec![0, 4, 0, 0, 0],
    ];
    let seeds = seed_indices(&partials);
    let reduced = to_seed_space(&partials, Some(&seeds));
    for (p, r) in partials.iter().zip(&reduced) {
        assert_eq!(&expand_from_seed_space(r, &seeds, 5).unwrap(), p);
    }
}

#[test]
fn adolc_reduction_renumbers_into_seed_ranks() {
    let partials: Vec<Vec<usize>> = vec![
        to_adolc_format(&[0, 1, 1], 3).unwrap(),
        to_adolc_format(&[0, 2, 0], 3).unwrap(),
    ];
    assert_eq!(partials, vec![vec![3, 2, 0], vec![2, 2, 0]]);
    assert_eq!(seed_indices_adolc(&partials), vec![2, 3]);
    assert_eq!(
        to_seed_space_adolc(&partials, None).unwrap(),
        vec![vec![2, 1, 0], vec![1, 1, 0]]
    );
}

#[test]
fn adolc_reduction_rejects_non_seed_entries() {
    let partials = vec![vec![4, 1]];
    assert!(matches!(
        to_seed_space_adolc(&partials, Some(&[1, 2])),
        Err(AdError::InvalidArgument(_))
    ));
}

#[test]
fn seed_matrix_columns_are_unit_vectors() {
    let s = seed_matrix::<f64>(4, &[2, 4]).unwrap();
    assert_eq!(s.dim(), (4, 2));
    assert_eq!(s.column(0).to_vec(), vec![0.0, 1.0, 0.0, 0.0]);
    assert_eq!(s.column(1).to_vec(), vec![0.0, 0.0, 0.0, 1.0]);
}

#[test]
fn seed_matrix_rejects_zero_and_out_of_range() {
    let zero = seed_matrix::<f64>(3, &[0]);
    assert!(matches!(zero, Err(AdError::InvalidArgument(_))));
    let out_of_range = seed_matrix::<f64>(3, &[1, 4]);
    assert!(matches!(out_of_range, Err(AdError::InvalidArgument(_))));
}
