//! Compressed symmetric tensors: addressing and dense reconstruction.
//!
//! The engine stores the derivatives of degree `≤ d` of each output component
//! once per multiset of variables, in `C(n + d, d)` slots. A slot is named by
//! its 1-based [`address`]; column `address - 1` of a compressed matrix holds
//! it.

use ndarray::{ArrayD, ArrayView2, IxDyn};

use crate::combinatorics::{multiset_rank, num_slots};
use crate::error::{AdError, Result};
use crate::float::Float;
use crate::partial::is_canonical;

/// 1-based address of a canonical ADOLC-format partial of length `degree`.
///
/// The partial is not sorted here: a non-canonical input names a different
/// multiset and silently gets that multiset's address (debug builds assert).
pub fn address(degree: usize, adolc: &[usize]) -> usize {
    debug_assert_eq!(adolc.len(), degree, "partial length must equal degree");
    debug_assert!(is_canonical(adolc), "partial {adolc:?} is not canonical");
    multiset_rank(adolc) + 1
}

/// Number of slots of a compressed tensor over `n` variables up to `degree`.
pub fn tensor_size(n: usize, degree: usize) -> usize {
    num_slots(n, degree)
}

/// Expand the compressed derivatives of order `order` into a dense tensor of
/// shape `[n; order] ++ [m]`.
///
/// `compressed` is `m × C(n + order, order)` (rows may exceed `m`, columns may
/// exceed the slot count). The result is symmetric in its first `order` axes.
pub fn build_tensor<F: Float>(
    order: usize,
    m: usize,
    n: usize,
    compressed: ArrayView2<F>,
) -> Result<ArrayD<F>> {
    let slots = tensor_size(n, order);
    if compressed.nrows() < m || compressed.ncols() < slots {
        return Err(AdError::invalid(format!(
            "compressed tensor is {}×{}, need at least {m}×{slots}",
            compressed.nrows(),
            compressed.ncols()
        )));
    }

    let mut shape = vec![n; order];
    shape.push(m);
    let mut dense = ArrayD::zeros(IxDyn(&shape));

    let mut multiset = vec![0usize; order];
    for (idx, value) in dense.indexed_iter_mut() {
        for (k, slot) in multiset.iter_mut().enumerate() {
            *slot = idx[k] + 1;
        }
        multiset.sort_unstable_by(|a, b| b.cmp(a));
        *value = compressed[[idx[order], address(order, &multiset) - 1]];
    }
    Ok(dense)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_addresses() {
        assert_eq!(address(2, &[0, 0]), 1);
        assert_eq!(address(2, &[1, 0]), 2);
        assert_eq!(address(2, &[1, 1]), 3);
        assert_eq!(address(2, &[2, 0]), 4);
        assert_eq!(address(2, &[2, 1]), 5);
        assert_eq!(address(2, &[2, 2]), 6);
    }
}
