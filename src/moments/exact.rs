//! Exact frequency moments from full per-item counts

use crate::traits::{MomentSketch, Sketch};
use core::hash::Hash;
use std::collections::HashMap;

/// Exact occurrence counter
///
/// Holds one counter per distinct item, so memory grows linearly with the
/// number of distinct items and is not bounded by anything else. Use it as
/// ground truth for [`AmsEstimator`](super::AmsEstimator), not on streams
/// whose vocabulary does not fit in memory.
///
/// # Example
///
/// ```
/// use streamsketch::moments::ExactMoments;
///
/// let mut exact = ExactMoments::new();
/// for token in ["a", "a", "a", "b", "b", "c"] {
///     exact.add(token);
/// }
///
/// assert_eq!(exact.surprise_number(), 14);
/// assert_eq!(exact.distinct(), 3);
/// assert_eq!(exact.total(), 6);
/// ```
#[derive(Clone, Debug)]
pub struct ExactMoments<T: Hash + Eq + Clone + core::fmt::Debug> {
    counts: HashMap<T, u64>,
    total: u64,
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> Default for ExactMoments<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> ExactMoments<T> {
    pub fn new() -> Self {
        Self {
            counts: HashMap::new(),
            total: 0,
        }
    }

    /// Count one occurrence
    pub fn add(&mut self, item: T) {
        self.add_count(item, 1);
    }

    /// Count `count` occurrences at once (pre-aggregated input)
    pub fn add_count(&mut self, item: T, count: u64) {
        if count == 0 {
            return;
        }
        *self.counts.entry(item).or_insert(0) += count;
        self.total += count;
    }

    /// Occurrences of `item` so far
    pub fn frequency(&self, item: &T) -> u64 {
        self.counts.get(item).copied().unwrap_or(0)
    }

    /// Zeroth moment: number of distinct items
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// First moment: stream length
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Second moment `Σ mᵢ²`
    pub fn surprise_number(&self) -> u128 {
        self.counts
            .values()
            .map(|&m| (m as u128) * (m as u128))
            .sum()
    }
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> Sketch for ExactMoments<T> {
    type Item = T;

    fn update(&mut self, item: &T) {
        self.add(item.clone());
    }

    fn clear(&mut self) {
        self.counts.clear();
        self.total = 0;
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
            + self.counts.capacity() * (core::mem::size_of::<T>() + core::mem::size_of::<u64>())
    }

    fn count(&self) -> u64 {
        self.total
    }
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> MomentSketch for ExactMoments<T> {
    fn second_moment(&self) -> f64 {
        self.surprise_number() as f64
    }
}

/// Exact second moment of a token stream; `0` for an empty stream
pub fn compute_exact<I, T>(tokens: I) -> u128
where
    I: IntoIterator<Item = T>,
    T: Hash + Eq + Clone + core::fmt::Debug,
{
    let mut exact = ExactMoments::new();
    for token in tokens {
        exact.add(token);
    }
    exact.surprise_number()
}

/// Exact second moment from `(item, count)` pairs
///
/// Pairs for the same item are summed before squaring, so the same item may
/// appear many times (e.g. one pair per document it occurs in).
pub fn compute_exact_from_counts<I, T>(pairs: I) -> u128
where
    I: IntoIterator<Item = (T, u64)>,
    T: Hash + Eq + Clone + core::fmt::Debug,
{
    let mut exact = ExactMoments::new();
    for (item, count) in pairs {
        exact.add_count(item, count);
    }
    exact.surprise_number()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surprise_number() {
        assert_eq!(compute_exact(["a", "a", "a", "b", "b", "c"]), 14);
    }

    #[test]
    fn test_empty() {
        assert_eq!(compute_exact(Vec::<u32>::new()), 0);
        assert_eq!(ExactMoments::<u32>::new().second_moment(), 0.0);
    }

    #[test]
    fn test_all_distinct() {
        assert_eq!(compute_exact(0..1000u32), 1000);
    }

    #[test]
    fn test_single_item() {
        assert_eq!(compute_exact(std::iter::repeat(7u8).take(1000)), 1_000_000);
    }

    #[test]
    fn test_from_counts_sums_repeated_items() {
        // word 1 appears in two documents: (3 + 2)^2 + 4^2
        let pairs = [(1u32, 3u64), (2, 4), (1, 2)];
        assert_eq!(compute_exact_from_counts(pairs), 41);
    }

    #[test]
    fn test_zero_count_ignored() {
        let mut exact = ExactMoments::new();
        exact.add_count("x", 0);
        assert_eq!(exact.distinct(), 0);
        assert_eq!(exact.total(), 0);
    }

    #[test]
    fn test_no_overflow_on_large_counts() {
        let mut exact = ExactMoments::new();
        exact.add_count("big", u32::MAX as u64 * 4);
        let m = u32::MAX as u128 * 4;
        assert_eq!(exact.surprise_number(), m * m);
    }

    #[test]
    fn test_clear() {
        let mut exact = ExactMoments::new();
        exact.add("a");
        exact.clear();
        assert!(exact.is_empty());
        assert_eq!(exact.frequency(&"a"), 0);
    }
}
