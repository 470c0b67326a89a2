//! Multiset ranking: the raw addressing primitive behind compressed tensors.
//!
//! A derivative of degree `d` over `n` variables is a multiset of size `d`
//! drawn from `{0, 1, ..., n}`, where `0` pads lower-degree derivatives. Written
//! in non-increasing order `im[0] >= im[1] >= ... >= im[d-1]`, its rank is
//!
//! ```text
//! rank = Σ_{i<d} C(im[i] + d - i - 1, d - i)
//! ```
//!
//! which enumerates all `C(n + d, d)` multisets without gaps; the all-zero
//! multiset (the function value) has rank 0.

/// Binomial coefficient `C(n, k)`; zero when `k > n`.
pub fn binomial(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc = 1usize;
    for i in 0..k {
        // Exact at every step: acc * (n - i) is divisible by (i + 1).
        acc = acc * (n - i) / (i + 1);
    }
    acc
}

/// 0-based rank of a non-increasing multiset of size `multiset.len()`.
///
/// The input is not sorted here: a non-canonical sequence is ranked as if it
/// were canonical and names some other multiset.
pub fn multiset_rank(multiset: &[usize]) -> usize {
    let d = multiset.len();
    multiset
        .iter()
        .enumerate()
        .map(|(i, &v)| binomial(v + d - i - 1, d - i))
        .sum()
}

/// Number of multisets of size `degree` over `{0..=n}`, i.e. the number of
/// slots a compressed tensor of that degree needs.
pub fn num_slots(n: usize, degree: usize) -> usize {
    binomial(n + degree, degree)
}

/// All non-increasing sequences of length `degree` over `{0..=n}`, in rank order.
pub fn canonical_multisets(n: usize, degree: usize) -> Vec<Vec<usize>> {
    let mut out = vec![Vec::new(); num_slots(n, degree)];
    let mut current = vec![0usize; degree];
    fill(&mut out, &mut current, 0, n);
    out
}

fn fill(out: &mut [Vec<usize>], current: &mut [usize], pos: usize, max: usize) {
    if pos == current.len() {
        out[multiset_rank(current)] = current.to_vec();
        return;
    }
    for v in 0..=max {
        current[pos] = v;
        fill(out, current, pos + 1, v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binomial_small_values() {
        assert_eq!(binomial(5, 2), 10);
        assert_eq!(binomial(6, 0), 1);
        assert_eq!(binomial(3, 4), 0);
        assert_eq!(binomial(10, 7), 120);
    }

    #[test]
    fn rank_is_a_bijection_onto_slots() {
        for n in 1..5 {
            for d in 1..5 {
                let all = canonical_multisets(n, d);
                assert_eq!(all.len(), num_slots(n, d));
                for (rank, ms) in all.iter().enumerate() {
                    assert_eq!(ms.len(), d);
                    assert_eq!(multiset_rank(ms), rank);
                }
            }
        }
    }

    #[test]
    fn value_slot_is_rank_zero() {
        assert_eq!(multiset_rank(&[0, 0, 0]), 0);
        assert_eq!(multiset_rank(&[1]), 1);
        assert_eq!(multiset_rank(&[1, 1]), 2);
        assert_eq!(multiset_rank(&[2, 0]), 3);
    }
}
