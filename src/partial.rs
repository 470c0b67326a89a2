//! Conversions between the two encodings of a mixed partial derivative.
//!
//! *Partial format* is a per-variable order vector: `[1, 0, 4]` is
//! `∂⁵ / ∂x₁ ∂x₃⁴`. *ADOLC format* is the same derivative as a multiset of
//! 1-based variable indices, sorted non-increasing and zero-padded to the
//! requested degree: `[3, 3, 3, 3, 1]` (degree 5) or `[3, 3, 3, 3, 1, 0]`
//! (degree 6).

use crate::error::{AdError, Result};

/// Partial format → ADOLC format of length `degree`.
///
/// Fails with [`AdError::InvalidArgument`] when `degree` is smaller than the
/// total order of `partial`.
pub fn to_adolc_format(partial: &[usize], degree: usize) -> Result<Vec<usize>> {
    let mut adolc = vec![0; degree];
    to_adolc_format_into(partial, &mut adolc)?;
    Ok(adolc)
}

/// Like [`to_adolc_format`], writing into `buf`; the degree is `buf.len()`.
pub fn to_adolc_format_into(partial: &[usize], buf: &mut [usize]) -> Result<()> {
    let total: usize = partial.iter().sum();
    if total > buf.len() {
        return Err(AdError::invalid(format!(
            "degree {} is smaller than the total order {total} of {partial:?}",
            buf.len()
        )));
    }

    // Highest variable first, so the result is already non-increasing.
    let mut pos = 0;
    for (var, &order) in partial.iter().enumerate().rev() {
        buf[pos..pos + order].fill(var + 1);
        pos += order;
    }
    buf[pos..].fill(0);
    Ok(())
}

/// ADOLC format → Partial format over `n` variables.
///
/// Zero entries are padding. Any index above `n` is an
/// [`AdError::InvalidArgument`]. Order of entries does not matter.
pub fn from_adolc_format(adolc: &[usize], n: usize) -> Result<Vec<usize>> {
    let mut partial = vec![0; n];
    for &idx in adolc.iter().filter(|&&idx| idx != 0) {
        if idx > n {
            return Err(AdError::invalid(format!(
                "variable index {idx} out of range for {n} variables"
            )));
        }
        partial[idx - 1] += 1;
    }
    Ok(partial)
}

/// True when `adolc` is non-increasing (and therefore zero-trailing).
pub fn is_canonical(adolc: &[usize]) -> bool {
    adolc.windows(2).all(|w| w[0] >= w[1])
}
