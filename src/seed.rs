//! Seed-space reduction.
//!
//! A batch of partial derivatives usually involves only a few of the `n`
//! variables. The *seed indices* are the variables with a nonzero order in at
//! least one partial; differentiating along just those `k` directions (the
//! columns of [`seed_matrix`]) and renumbering the partials into that reduced
//! space ([`to_seed_space`]) lets the engine do `k`-variable work instead of
//! `n`-variable work.

use std::collections::BTreeSet;

use ndarray::Array2;

use crate::error::{AdError, Result};
use crate::float::Float;

/// 1-based indices of every variable with a nonzero order in some partial
/// (Partial format). Ascending and duplicate-free.
pub fn seed_indices<P: AsRef<[usize]>>(partials: &[P]) -> Vec<usize> {
    let set: BTreeSet<usize> = partials
        .iter()
        .flat_map(|p| {
            p.as_ref()
                .iter()
                .enumerate()
                .filter(|(_, &order)| order != 0)
                .map(|(var, _)| var + 1)
        })
        .collect();
    set.into_iter().collect()
}

/// Seed indices of ADOLC-format partials: every nonzero entry.
pub fn seed_indices_adolc<P: AsRef<[usize]>>(partials: &[P]) -> Vec<usize> {
    let set: BTreeSet<usize> = partials
        .iter()
        .flat_map(|p| p.as_ref().iter().copied().filter(|&idx| idx != 0))
        .collect();
    set.into_iter().collect()
}

/// Restrict each Partial-format partial to the seed variables.
///
/// Entry `j` of each result is the order of variable `seed_indices[j]`. When
/// `seed_indices` is `None` it is computed from `partials` first. An index
/// outside a partial's length contributes order zero.
pub fn to_seed_space<P: AsRef<[usize]>>(
    partials: &[P],
    seed_indices: Option<&[usize]>,
) -> Vec<Vec<usize>> {
    let computed;
    let seeds = match seed_indices {
        Some(s) => s,
        None => {
            computed = self::seed_indices(partials);
            &computed
        }
    };

    partials
        .iter()
        .map(|p| {
            let p = p.as_ref();
            seeds
                .iter()
                .map(|&s| match s {
                    0 => 0,
                    s => p.get(s - 1).copied().unwrap_or(0),
                })
                .collect()
        })
        .collect()
}

/// Renumber canonical ADOLC-format partials into the seed space: each nonzero
/// entry becomes its 1-based rank among `seed_indices`.
///
/// Requires canonical input. Remapping stops at the first zero, so entries
/// after a zero in a non-canonical partial are copied through unchanged.
/// An entry that is not a seed index is an [`AdError::InvalidArgument`].
pub fn to_seed_space_adolc<P: AsRef<[usize]>>(
    partials: &[P],
    seed_indices: Option<&[usize]>,
) -> Result<Vec<Vec<usize>>> {
    let computed;
    let seeds = match seed_indices {
        Some(s) => s,
        None => {
            computed = seed_indices_adolc(partials);
            &computed
        }
    };

    partials
        .iter()
        .map(|p| {
            let mut reduced = p.as_ref().to_vec();
            for entry in reduced.iter_mut() {
                if *entry == 0 {
                    break;
                }
                *entry = match seeds.binary_search(entry) {
                    Ok(pos) => pos + 1,
                    Err(_) => {
                        return Err(AdError::invalid(format!(
                            "variable {} is not among the seed indices {seeds:?}",
                            *entry
                        )))
                    }
                };
            }
            Ok(reduced)
        })
        .collect()
}

/// `n × k` matrix whose column `j` is the unit vector `e_{seed_indices[j]}`.
///
/// Indices are 1-based; `0` and indices above `n` are rejected.
pub fn seed_matrix<F: Float>(n: usize, seed_indices: &[usize]) -> Result<Array2<F>> {
    let mut seed = Array2::zeros((n, seed_indices.len()));
    for (col, &idx) in seed_indices.iter().enumerate() {
        if idx == 0 || idx > n {
            return Err(AdError::invalid(format!(
                "seed index {idx} out of range 1..={n}"
            )));
        }
        seed[[idx - 1, col]] = F::one();
    }
    Ok(seed)
}

/// Inverse of [`to_seed_space`]: put each reduced order back at its variable
/// and fill non-seed positions with zero. Result length is `n`.
pub fn expand_from_seed_space(
    reduced: &[usize],
    seed_indices: &[usize],
    n: usize,
) -> Result<Vec<usize>> {
    if reduced.len() != seed_indices.len() {
        return Err(AdError::mismatch(
            "seed-space partial length",
            seed_indices.len(),
            reduced.len(),
        ));
    }
    let mut partial = vec![0; n];
    for (&order, &idx) in reduced.iter().zip(seed_indices) {
        if idx == 0 || idx > n {
            return Err(AdError::invalid(format!(
                "seed index {idx} out of range 1..={n}"
            )));
        }
        partial[idx - 1] = order;
    }
    Ok(partial)
}
