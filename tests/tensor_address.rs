//! Addresses of canonical multisets in a compressed tensor.

use std::collections::HashSet;

use adsweep::combinatorics::{binomial, canonical_multisets};
use adsweep::{address, multiset_rank, tensor_size};

/// All non-increasing sequences of length `d` over `1..=n` (no padding).
fn exact_degree(n: usize, d: usize) -> Vec<Vec<usize>> {
    canonical_multisets(n, d)
        .into_iter()
        .filter(|ms| ms.iter().all(|&v| v != 0))
        .collect()
}

#[test]
fn exact_degree_addresses_are_distinct_and_counted() {
    for n in 1..=5 {
        for d in 1..=4 {
            let all = exact_degree(n, d);
            let addrs: HashSet<usize> = all.iter().map(|ms| address(d, ms)).collect();
            assert_eq!(addrs.len(), all.len());
            assert_eq!(addrs.len(), binomial(n + d - 1, d), "n = {n}, d = {d}");
        }
    }
}

#[test]
fn padded_partials_fill_the_remaining_slots() {
    let (n, d) = (3, 3);
    let addrs: HashSet<usize> = canonical_multisets(n, d)
        .iter()
        .map(|ms| address(d, ms))
        .collect();
    assert_eq!(addrs.len(), tensor_size(n, d));
    assert_eq!(addrs.iter().copied().min(), Some(1));
    assert_eq!(addrs.iter().copied().max(), Some(tensor_size(n, d)));
}

#[test]
fn value_slot_is_address_one() {
    for d in 0..5 {
        assert_eq!(address(d, &vec![0; d]), 1);
    }
}

#[test]
fn address_is_rank_plus_one() {
    let ms = [4, 2, 2, 1];
    assert_eq!(address(4, &ms), multiset_rank(&ms) + 1);
}

#[test]
fn address_is_deterministic() {
    let ms = [3, 3, 1, 0];
    assert_eq!(address(4, &ms), address(4, &ms));
}
