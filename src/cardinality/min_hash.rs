//! Hash-minimum distinct-count estimator
//!
//! Each of `k` independent hash functions keeps the smallest value it has
//! produced. With `d` distinct tokens hashed uniformly into `[0, M)`, the
//! minimum concentrates around `M / d`, so `M / median(minima)` estimates `d`.

use super::hash::{HashFamily, HashFunction, DEFAULT_MODULUS};
use crate::traits::{CardinalitySketch, ConfigError, Sketch};
use crate::DEFAULT_SEED;
use std::borrow::Cow;
use tracing::debug;

/// Distinct-count sketch built from independent hash minima
///
/// Memory is `O(k)` regardless of stream length. Accuracy improves with the
/// number of hash functions `k`; no finite `k` makes the estimate exact.
///
/// # Example
///
/// ```
/// use streamsketch::cardinality::DistinctCounter;
/// use streamsketch::traits::CardinalitySketch;
///
/// let mut counter = DistinctCounter::new(64).unwrap();
/// for word in "the cat and The Dog and THE bird".split_whitespace() {
///     counter.insert(word);
/// }
///
/// println!("~{} distinct words", counter.estimate());
/// ```
#[derive(Clone, Debug)]
pub struct DistinctCounter {
    /// Prime modulus shared by every function
    modulus: u64,
    /// Hash functions, paired index-wise with `minima`
    functions: Vec<HashFunction>,
    /// Running minimum per function; `modulus + 1` until the first token
    minima: Vec<u64>,
    /// Number of tokens inserted
    count: u64,
}

impl DistinctCounter {
    /// Create a counter with `num_hash_functions` functions over the default
    /// modulus and seed
    pub fn new(num_hash_functions: usize) -> Result<Self, ConfigError> {
        Self::with_config(num_hash_functions, DEFAULT_MODULUS, DEFAULT_SEED)
    }

    /// Create a counter with the default modulus and an explicit seed
    pub fn with_seed(num_hash_functions: usize, seed: u64) -> Result<Self, ConfigError> {
        Self::with_config(num_hash_functions, DEFAULT_MODULUS, seed)
    }

    /// Create a counter with an explicit prime modulus and seed
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroHashFunctions`] if `num_hash_functions == 0`, or
    /// any error from [`HashFamily::new`] for an unusable modulus.
    pub fn with_config(
        num_hash_functions: usize,
        modulus: u64,
        seed: u64,
    ) -> Result<Self, ConfigError> {
        if num_hash_functions == 0 {
            return Err(ConfigError::ZeroHashFunctions);
        }

        let mut family = HashFamily::new(modulus, seed)?;
        let functions: Vec<HashFunction> =
            (0..num_hash_functions).map(|_| family.draw()).collect();

        debug!(
            target: "streamsketch::cardinality",
            num_hash_functions,
            modulus,
            seed,
            "distinct counter configured"
        );

        Ok(Self {
            modulus,
            functions,
            minima: vec![Self::sentinel(modulus); num_hash_functions],
            count: 0,
        })
    }

    #[inline]
    fn sentinel(modulus: u64) -> u64 {
        modulus + 1
    }

    /// Number of hash functions
    pub fn num_hash_functions(&self) -> usize {
        self.functions.len()
    }

    /// The prime modulus
    pub fn modulus(&self) -> u64 {
        self.modulus
    }

    /// Current per-function minima, in function order
    pub fn minima(&self) -> &[u64] {
        &self.minima
    }

    /// Insert a token, lower-casing it first
    pub fn insert(&mut self, token: &str) {
        let normalized = normalize(token);
        self.insert_normalized(normalized.as_bytes());
    }

    /// Insert raw bytes that are already normalized
    pub fn insert_normalized(&mut self, bytes: &[u8]) {
        self.count += 1;
        for (h, min) in self.functions.iter().zip(self.minima.iter_mut()) {
            let v = h.apply(bytes);
            if v < *min {
                *min = v;
            }
        }
    }

    /// Median of the per-function minima
    ///
    /// For an even number of functions this is the mean of the two middle
    /// values.
    fn median_minimum(&self) -> f64 {
        let mut sorted = self.minima.clone();
        sorted.sort_unstable();
        let mid = sorted.len() / 2;
        if sorted.len() % 2 == 1 {
            sorted[mid] as f64
        } else {
            (sorted[mid - 1] as f64 + sorted[mid] as f64) / 2.0
        }
    }

    /// Estimate `ln 2 · M / median`
    ///
    /// The median of the minimum of `d` uniforms sits near `M·ln2 / d`, so
    /// the plain [`estimate`](CardinalitySketch::estimate) converges to
    /// `d / ln 2`. This variant removes that factor.
    pub fn bias_corrected_estimate(&self) -> f64 {
        self.estimate() * core::f64::consts::LN_2
    }
}

/// Lower-case a token, borrowing when it is already lower-case
pub(crate) fn normalize(token: &str) -> Cow<'_, str> {
    if token.chars().any(char::is_uppercase) {
        Cow::Owned(token.to_lowercase())
    } else {
        Cow::Borrowed(token)
    }
}

impl Sketch for DistinctCounter {
    type Item = str;

    fn update(&mut self, item: &str) {
        self.insert(item);
    }

    fn clear(&mut self) {
        self.minima.fill(Self::sentinel(self.modulus));
        self.count = 0;
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>()
            + self.functions.capacity() * core::mem::size_of::<HashFunction>()
            + self.minima.capacity() * core::mem::size_of::<u64>()
    }

    fn count(&self) -> u64 {
        self.count
    }
}

impl CardinalitySketch for DistinctCounter {
    /// `M / median(minima)`; `0.0` when no token has been inserted
    fn estimate(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }

        // A zero minimum is a legitimate hash value; clamp to keep the ratio finite
        let median = self.median_minimum().max(1.0);
        self.modulus as f64 / median
    }
}

/// One-shot distinct-count estimate over a token stream
///
/// Uses the default modulus and seed. Returns `0.0` for an empty stream.
///
/// ```
/// let tokens = ["a", "b", "A", "c", "b"];
/// let estimate = streamsketch::cardinality::estimate_distinct(tokens, 32).unwrap();
/// assert!(estimate > 0.0);
/// ```
pub fn estimate_distinct<I, S>(tokens: I, num_hash_functions: usize) -> Result<f64, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    estimate_distinct_seeded(tokens, num_hash_functions, DEFAULT_SEED)
}

/// [`estimate_distinct`] with an explicit seed
pub fn estimate_distinct_seeded<I, S>(
    tokens: I,
    num_hash_functions: usize,
    seed: u64,
) -> Result<f64, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counter = DistinctCounter::with_seed(num_hash_functions, seed)?;
    for token in tokens {
        counter.insert(token.as_ref());
    }
    Ok(counter.estimate())
}
