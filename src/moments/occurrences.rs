//! Reservoir of sampled AMS variables
//!
//! Each variable remembers an item and how many times that item has occurred
//! since the variable was sampled. Variables sit in a flat arena so one can
//! be evicted uniformly at random; a side map from item to arena slots lets
//! every occurrence bump the matching variables in time proportional to
//! their number.

use core::hash::Hash;
use rand::Rng;
use std::collections::HashMap;

/// Algorithm R admission draw for the `seen`-th occurrence (1-based)
///
/// Returns a slot in `[0, capacity)` with probability `capacity / seen`, or
/// `None` if the occurrence is not sampled. Only meaningful once the
/// reservoir is full (`seen > capacity`).
#[inline]
pub(crate) fn replacement_slot<R: Rng + ?Sized>(
    rng: &mut R,
    seen: u64,
    capacity: usize,
) -> Option<usize> {
    let j = rng.gen_range(0..seen);
    if j < capacity as u64 {
        Some(j as usize)
    } else {
        None
    }
}

#[derive(Clone, Debug)]
struct Variable<T> {
    item: T,
    /// Occurrences of `item` since this variable was sampled (c ≥ 1)
    value: u64,
}

impl<T> Variable<T> {
    /// Surprise-number term `2c - 1`
    #[inline]
    fn term(&self) -> u128 {
        2 * self.value as u128 - 1
    }
}

/// Sampled occurrences, grouped by item
///
/// Keeps running sums of `2c - 1` and `(2c - 1)²` over all variables so the
/// estimate and its spread are available in constant time.
#[derive(Clone, Debug)]
pub struct OccurrenceReservoir<T: Hash + Eq + Clone + core::fmt::Debug> {
    variables: Vec<Variable<T>>,
    slots: HashMap<T, Vec<usize>>,
    term_sum: u128,
    square_sum: u128,
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> OccurrenceReservoir<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            variables: Vec::with_capacity(capacity),
            slots: HashMap::new(),
            term_sum: 0,
            square_sum: 0,
        }
    }

    /// Sample a fresh occurrence of `item` (c = 1)
    pub fn add(&mut self, item: T) {
        let idx = self.variables.len();
        self.slots.entry(item.clone()).or_default().push(idx);
        self.variables.push(Variable { item, value: 1 });
        self.term_sum += 1;
        self.square_sum += 1;
    }

    /// Count a new occurrence of `item` in every variable sampled for it
    ///
    /// Returns the number of variables bumped.
    pub fn bump(&mut self, item: &T) -> usize {
        let Some(idxs) = self.slots.get(item) else {
            return 0;
        };

        for &idx in idxs {
            let var = &mut self.variables[idx];
            let t = var.term();
            var.value += 1;
            // (t + 2)² - t² = 4t + 4
            self.term_sum += 2;
            self.square_sum += 4 * t + 4;
        }
        idxs.len()
    }

    /// Evict one variable chosen uniformly at random
    ///
    /// Returns the evicted item and its count, or `None` when empty.
    pub fn remove_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<(T, u64)> {
        if self.variables.is_empty() {
            return None;
        }

        let idx = rng.gen_range(0..self.variables.len());
        let last = self.variables.len() - 1;
        let removed = self.variables.swap_remove(idx);

        if let Some(list) = self.slots.get_mut(&removed.item) {
            list.retain(|&i| i != idx);
            if list.is_empty() {
                self.slots.remove(&removed.item);
            }
        }

        // The former last variable now lives at `idx`
        if idx != last {
            if let Some(list) = self.slots.get_mut(&self.variables[idx].item) {
                if let Some(slot) = list.iter_mut().find(|i| **i == last) {
                    *slot = idx;
                }
            }
        }

        let t = removed.term();
        self.term_sum -= t;
        self.square_sum -= t * t;

        Some((removed.item, removed.value))
    }

    /// Number of sampled variables
    pub fn total_size(&self) -> usize {
        self.variables.len()
    }

    /// Number of distinct items with at least one variable
    #[cfg(test)]
    fn distinct_items(&self) -> usize {
        self.slots.len()
    }

    /// `Σ (2c - 1)` over all variables
    pub(crate) fn term_sum(&self) -> u128 {
        self.term_sum
    }

    /// `Σ (2c - 1)²` over all variables
    pub(crate) fn square_sum(&self) -> u128 {
        self.square_sum
    }

    /// Counts of the variables sampled for `item`
    #[cfg(test)]
    fn counts_for(&self, item: &T) -> Vec<u64> {
        self.slots
            .get(item)
            .map(|idxs| idxs.iter().map(|&i| self.variables[i].value).collect())
            .unwrap_or_default()
    }

    pub(crate) fn clear(&mut self) {
        self.variables.clear();
        self.slots.clear();
        self.term_sum = 0;
        self.square_sum = 0;
    }

    pub(crate) fn heap_bytes(&self) -> usize {
        self.variables.capacity() * core::mem::size_of::<Variable<T>>()
            + self.slots.capacity() * (core::mem::size_of::<T>() + core::mem::size_of::<Vec<usize>>())
            + self.variables.len() * core::mem::size_of::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn recomputed_sums<T: Hash + Eq + Clone + core::fmt::Debug>(
        r: &OccurrenceReservoir<T>,
    ) -> (u128, u128) {
        r.variables.iter().fold((0, 0), |(s, q), v| {
            let t = v.term();
            (s + t, q + t * t)
        })
    }

    fn slots_consistent<T: Hash + Eq + Clone + core::fmt::Debug>(r: &OccurrenceReservoir<T>) {
        let mut seen = 0;
        for (item, idxs) in &r.slots {
            assert!(!idxs.is_empty());
            for &i in idxs {
                assert_eq!(&r.variables[i].item, item);
                seen += 1;
            }
        }
        assert_eq!(seen, r.variables.len());
    }

    #[test]
    fn test_add_and_bump() {
        let mut r = OccurrenceReservoir::with_capacity(4);
        r.add("a");
        r.add("b");
        r.add("a");

        assert_eq!(r.bump(&"a"), 2);
        assert_eq!(r.bump(&"c"), 0);

        assert_eq!(r.total_size(), 3);
        assert_eq!(r.distinct_items(), 2);
        assert_eq!(r.counts_for(&"a"), vec![2, 2]);
        // terms: 3 + 1 + 3
        assert_eq!(r.term_sum(), 7);
        assert_eq!(r.square_sum(), 19);
    }

    #[test]
    fn test_remove_random_keeps_index_consistent() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut r = OccurrenceReservoir::with_capacity(16);

        for i in 0..200u32 {
            let item = i % 5;
            r.bump(&item);
            r.add(item);
            if r.total_size() > 16 {
                r.remove_random(&mut rng).unwrap();
            }
            slots_consistent(&r);
            assert_eq!(recomputed_sums(&r), (r.term_sum(), r.square_sum()));
        }

        assert_eq!(r.total_size(), 16);
    }

    #[test]
    fn test_remove_until_empty() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut r = OccurrenceReservoir::with_capacity(3);
        r.add('x');
        r.add('y');
        r.add('x');

        for _ in 0..3 {
            assert!(r.remove_random(&mut rng).is_some());
        }

        assert!(r.remove_random(&mut rng).is_none());
        assert_eq!(r.distinct_items(), 0);
        assert_eq!(r.term_sum(), 0);
        assert_eq!(r.square_sum(), 0);
    }

    #[test]
    fn test_replacement_slot_probability() {
        let mut rng = StdRng::seed_from_u64(11);
        let trials = 100_000;
        let accepted = (0..trials)
            .filter(|_| replacement_slot(&mut rng, 40, 10).is_some())
            .count();

        // Expect ~25%
        let rate = accepted as f64 / trials as f64;
        assert!((rate - 0.25).abs() < 0.01, "acceptance rate {}", rate);
    }

    #[test]
    fn test_replacement_slot_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        for seen in 11..1000 {
            if let Some(j) = replacement_slot(&mut rng, seen, 10) {
                assert!(j < 10);
            }
        }
    }

    #[test]
    fn test_remove_is_uniform() {
        let mut hits = [0usize; 4];
        let mut rng = StdRng::seed_from_u64(21);

        for _ in 0..20_000 {
            let mut r = OccurrenceReservoir::with_capacity(4);
            for i in 0..4usize {
                r.add(i);
            }
            let (item, _) = r.remove_random(&mut rng).unwrap();
            hits[item] += 1;
        }

        for &h in &hits {
            assert!((4_000..6_000).contains(&h), "hits {:?}", hits);
        }
    }
}
