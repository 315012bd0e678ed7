//! Cardinality (distinct count) estimation
//!
//! This module provides a hash-minimum sketch for estimating the number of
//! distinct tokens in a stream, the hash family it is built on, and an exact
//! counter to serve as ground truth.
//!
//! # Algorithms
//!
//! - [`DistinctCounter`]: median of independent hash minima
//! - [`exact_distinct`]: exact count with a hash set (unbounded memory)
//!
//! # Example
//!
//! ```
//! use streamsketch::cardinality::DistinctCounter;
//! use streamsketch::traits::CardinalitySketch;
//!
//! let mut counter = DistinctCounter::new(64).unwrap();
//!
//! for i in 0..10000 {
//!     counter.insert(&i.to_string());
//! }
//!
//! let estimate = counter.estimate();
//! println!("estimated distinct count: {}", estimate);
//! ```

mod hash;
mod min_hash;

use std::collections::HashSet;

pub use hash::{is_prime, HashFamily, HashFunction, DEFAULT_MODULUS, MIN_MODULUS};
pub use min_hash::{estimate_distinct, estimate_distinct_seeded, DistinctCounter};

/// Exact number of distinct tokens, after the same lower-casing the
/// estimator applies
///
/// Memory grows with the number of distinct tokens.
pub fn exact_distinct<I, S>(tokens: I) -> usize
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::new();
    for token in tokens {
        let normalized = min_hash::normalize(token.as_ref());
        if !seen.contains(&*normalized) {
            seen.insert(normalized.into_owned());
        }
    }
    seen.len()
}
