//! Misra-Gries bounded frequency table
//!
//! Tracks at most `k` items with a counter each. When an untracked item
//! arrives at a full table, every counter is decremented and the ones that
//! reach zero are evicted.

use crate::traits::{ConfigError, FrequentItems, Sketch};
use core::hash::Hash;
use std::collections::HashMap;
use tracing::{debug, trace};

/// What to do with the arriving item after a decrement-all purge
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OnFull {
    /// Drop the item; it is only inserted on a later occurrence
    #[default]
    Discard,
    /// Insert the item with count 1 if the purge freed a slot
    ///
    /// Weakens the guarantee from `n/(k+1)` to `n/k`.
    InsertIfFree,
}

/// Slot in the counter arena
#[derive(Clone, Debug)]
struct Counter<T> {
    item: T,
    /// Always strictly positive
    count: u64,
}

/// Misra-Gries heavy-hitters table with capacity `k`
///
/// Guarantees, for a stream of length `n`:
///
/// - Every item with true frequency `> n/(k+1)` is in the table
/// - Each counter undercounts its item's frequency by at most `n/(k+1)`
///
/// Items below the threshold may also be present (false positives).
///
/// Counters live in a slot arena in insertion order; purges compact it
/// stably, so [`extract_frequent_set`](Self::extract_frequent_set) and
/// [`iter`](Self::iter) return items in the order they were first admitted.
///
/// # Example
///
/// ```
/// use streamsketch::frequency::MisraGries;
///
/// let mut table = MisraGries::new(2).unwrap();
///
/// for item in ["a", "b", "a", "c", "a", "d", "a"] {
///     table.process(item);
/// }
///
/// assert!(table.contains(&"a"));
/// assert!(table.len() <= 2);
/// ```
#[derive(Clone, Debug)]
pub struct MisraGries<T: Hash + Eq + Clone + core::fmt::Debug> {
    /// Maximum number of counters (k)
    capacity: usize,
    /// Behaviour after a purge
    policy: OnFull,
    /// Map from item to slot index
    index: HashMap<T, usize>,
    /// Counter arena
    counters: Vec<Counter<T>>,
    /// Number of items processed
    stream_len: u64,
    /// Number of decrement-all purges performed
    purges: u64,
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> MisraGries<T> {
    /// Create a table with capacity `k` and the default [`OnFull::Discard`] policy
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroCapacity`] if `k == 0`.
    pub fn new(k: usize) -> Result<Self, ConfigError> {
        Self::with_policy(k, OnFull::default())
    }

    /// Create a table with capacity `k` and an explicit purge policy
    pub fn with_policy(k: usize, policy: OnFull) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroCapacity);
        }

        debug!(target: "streamsketch::frequency", k, ?policy, "misra-gries table configured");

        Ok(Self::with_valid_capacity(k, policy))
    }

    /// Build a table for a `k` already known to be positive
    pub(crate) fn with_valid_capacity(k: usize, policy: OnFull) -> Self {
        debug_assert!(k > 0);
        Self {
            capacity: k,
            policy,
            index: HashMap::with_capacity(k),
            counters: Vec::with_capacity(k),
            stream_len: 0,
            purges: 0,
        }
    }

    /// Get the capacity (k)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the purge policy
    pub fn policy(&self) -> OnFull {
        self.policy
    }

    /// Number of items currently tracked
    pub fn len(&self) -> usize {
        self.counters.len()
    }

    /// Check if no item is tracked
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Number of items processed so far (n)
    pub fn stream_len(&self) -> u64 {
        self.stream_len
    }

    /// Number of decrement-all purges so far
    pub fn purges(&self) -> u64 {
        self.purges
    }

    /// Process one occurrence of `item`
    pub fn process(&mut self, item: T) {
        self.stream_len += 1;

        if let Some(&idx) = self.index.get(&item) {
            self.counters[idx].count += 1;
            return;
        }

        if self.counters.len() < self.capacity {
            self.admit(item);
            return;
        }

        self.decrement_all();

        if self.policy == OnFull::InsertIfFree && self.counters.len() < self.capacity {
            self.admit(item);
        }
    }

    fn admit(&mut self, item: T) {
        let idx = self.counters.len();
        self.index.insert(item.clone(), idx);
        self.counters.push(Counter { item, count: 1 });
    }

    /// Decrement every counter and evict those reaching zero
    fn decrement_all(&mut self) {
        self.purges += 1;
        let before = self.counters.len();

        self.counters.retain_mut(|c| {
            c.count -= 1;
            c.count > 0
        });

        let evicted = before - self.counters.len();
        if evicted > 0 {
            self.index.clear();
            for (idx, c) in self.counters.iter().enumerate() {
                self.index.insert(c.item.clone(), idx);
            }
        }

        trace!(
            target: "streamsketch::frequency",
            evicted,
            remaining = self.counters.len(),
            "decrement-all purge"
        );
    }

    /// Current keys, in slot order
    ///
    /// Calling this repeatedly without an intervening [`process`](Self::process)
    /// returns the same items in the same order.
    pub fn extract_frequent_set(&self) -> Vec<T> {
        self.counters.iter().map(|c| c.item.clone()).collect()
    }

    /// Iterate `(item, count)` pairs in slot order
    pub fn iter(&self) -> impl Iterator<Item = (&T, u64)> + '_ {
        self.counters.iter().map(|c| (&c.item, c.count))
    }

    /// Counter value for an item, 0 if untracked
    pub fn estimate(&self, item: &T) -> u64 {
        self.index
            .get(item)
            .map(|&idx| self.counters[idx].count)
            .unwrap_or(0)
    }

    /// Check if an item is currently tracked
    pub fn contains(&self, item: &T) -> bool {
        self.index.contains_key(item)
    }

    /// Frequency above which an item is guaranteed to be tracked: `n/(k+1)`
    pub fn guarantee_threshold(&self) -> f64 {
        self.stream_len as f64 / (self.capacity + 1) as f64
    }
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> Sketch for MisraGries<T> {
    type Item = T;

    fn update(&mut self, item: &T) {
        self.process(item.clone());
    }

    fn clear(&mut self) {
        self.index.clear();
        self.counters.clear();
        self.stream_len = 0;
        self.purges = 0;
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
            + self.counters.capacity() * core::mem::size_of::<Counter<T>>()
            + self.index.capacity() * (core::mem::size_of::<T>() + core::mem::size_of::<usize>())
    }

    fn count(&self) -> u64 {
        self.stream_len
    }
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> FrequentItems for MisraGries<T> {
    fn frequent_items(&self) -> Vec<T> {
        self.extract_frequent_set()
    }

    fn estimate_frequency(&self, item: &T) -> u64 {
        self.estimate(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            MisraGries::<u32>::new(0).unwrap_err(),
            ConfigError::ZeroCapacity
        );
    }

    #[test]
    fn test_basic_counts() {
        let mut table = MisraGries::<String>::new(10).unwrap();

        table.process("apple".to_string());
        table.process("apple".to_string());
        table.process("banana".to_string());

        assert_eq!(table.estimate(&"apple".to_string()), 2);
        assert_eq!(table.estimate(&"banana".to_string()), 1);
        assert_eq!(table.estimate(&"cherry".to_string()), 0);
        assert_eq!(table.stream_len(), 3);
    }

    #[test]
    fn test_full_table_discards_and_decrements() {
        let mut table = MisraGries::new(3).unwrap();

        table.process(1);
        table.process(1);
        table.process(2);
        table.process(3);

        // Table full, 4 is unseen: everything drops by one, 2 and 3 vanish
        table.process(4);

        assert_eq!(table.extract_frequent_set(), vec![1]);
        assert_eq!(table.estimate(&1), 1);
        assert!(!table.contains(&4));
        assert_eq!(table.purges(), 1);

        // Next occurrence of 4 fits
        table.process(4);
        assert_eq!(table.extract_frequent_set(), vec![1, 4]);
    }

    #[test]
    fn test_insert_if_free_policy() {
        let mut table = MisraGries::with_policy(3, OnFull::InsertIfFree).unwrap();

        for item in [1, 1, 2, 3, 4] {
            table.process(item);
        }

        assert_eq!(table.extract_frequent_set(), vec![1, 4]);
        assert_eq!(table.estimate(&4), 1);
    }

    #[test]
    fn test_insert_if_free_no_room() {
        let mut table = MisraGries::with_policy(2, OnFull::InsertIfFree).unwrap();

        for item in [1, 1, 2, 2, 3] {
            table.process(item);
        }

        // Purge left both counters at 1, so 3 is still dropped
        assert_eq!(table.extract_frequent_set(), vec![1, 2]);
    }

    #[test]
    fn test_slot_order_stable_after_purge() {
        let mut table = MisraGries::new(4).unwrap();

        for item in ["a", "b", "b", "c", "d", "d", "e"] {
            table.process(item);
        }

        // a and c had count 1 and were purged; b and d keep their relative order
        assert_eq!(table.extract_frequent_set(), vec!["b", "d"]);
        assert_eq!(table.estimate(&"b"), 1);
        assert_eq!(table.estimate(&"d"), 1);

        table.process("f");
        assert_eq!(table.extract_frequent_set(), vec!["b", "d", "f"]);
    }

    #[test]
    fn test_extract_is_idempotent() {
        let mut table = MisraGries::new(5).unwrap();
        for i in 0..100u32 {
            table.process(i % 7);
        }

        let first = table.extract_frequent_set();
        let second = table.extract_frequent_set();
        assert_eq!(first, second);
    }

    #[test]
    fn test_heavy_hitter_survives() {
        let k = 4;
        let mut table = MisraGries::new(k).unwrap();

        // 300 occurrences of 0 among 1000 items; n/(k+1) = 200
        for i in 0..1000u32 {
            if i % 10 < 3 {
                table.process(0);
            } else {
                table.process(i + 1);
            }
        }

        assert!(table.contains(&0));
        assert!(table.estimate(&0) as f64 >= 300.0 - table.guarantee_threshold());
    }

    #[test]
    fn test_size_never_exceeds_capacity() {
        let mut table = MisraGries::new(3).unwrap();
        for i in 0..500u64 {
            table.process(i * 7919 % 13);
            assert!(table.len() <= 3);
        }
    }

    #[test]
    fn test_trait_view() {
        let mut table = MisraGries::new(2).unwrap();
        table.update(&"x");
        table.update(&"x");

        assert_eq!(table.frequent_items(), vec!["x"]);
        assert_eq!(table.estimate_frequency(&"x"), 2);
        assert_eq!(table.count(), 2);
    }

    #[test]
    fn test_clear() {
        let mut table = MisraGries::new(10).unwrap();

        table.process("apple");
        table.process("banana");

        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.stream_len(), 0);
        assert!(!table.contains(&"apple"));
    }
}
