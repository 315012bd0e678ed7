//! Alon-Matias-Szegedy second-moment estimator
//!
//! A variable sampled at some position of the stream counts the occurrences
//! `c` of its item from that position on. For a position chosen uniformly
//! among the `n` seen so far, `n·(2c - 1)` is an unbiased estimate of the
//! second moment `Σ mᵢ²`: summing `2c - 1` over the `mᵢ` positions of item
//! `i` gives `1 + 3 + ... + (2mᵢ - 1) = mᵢ²`.
//!
//! The estimator keeps `s` such variables in a reservoir, so every position
//! seen so far is sampled with the same probability `s/n`, and averages
//! their estimates.

use super::occurrences::{replacement_slot, OccurrenceReservoir};
use crate::traits::{z_score, ConfigError, ErrorBounds, MomentSketch, Sketch};
use crate::DEFAULT_SEED;
use core::hash::Hash;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

/// Streaming second-moment estimator using `O(s)` space
///
/// # Example
///
/// ```
/// use streamsketch::moments::AmsEstimator;
///
/// let mut ams = AmsEstimator::new(64).unwrap();
/// for token in ["a", "a", "a", "b", "b", "c"] {
///     ams.add(token);
/// }
///
/// // Fewer occurrences than sample size: every position is sampled, so the
/// // estimate is exact
/// assert_eq!(ams.estimate(), 14.0);
/// ```
#[derive(Clone, Debug)]
pub struct AmsEstimator<T: Hash + Eq + Clone + core::fmt::Debug> {
    /// Number of variables (s)
    sample_size: usize,
    reservoir: OccurrenceReservoir<T>,
    /// Occurrences seen (n)
    seen: u64,
    /// Variables evicted to make room for newer ones
    replacements: u64,
    rng: StdRng,
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> AmsEstimator<T> {
    /// Create an estimator with `sample_size` variables and the default seed
    pub fn new(sample_size: usize) -> Result<Self, ConfigError> {
        Self::with_seed(sample_size, DEFAULT_SEED)
    }

    /// Create an estimator with `sample_size` variables and an explicit seed
    ///
    /// # Errors
    ///
    /// [`ConfigError::ZeroSampleSize`] if `sample_size == 0`.
    pub fn with_seed(sample_size: usize, seed: u64) -> Result<Self, ConfigError> {
        if sample_size == 0 {
            return Err(ConfigError::ZeroSampleSize);
        }

        debug!(target: "streamsketch::moments", sample_size, seed, "ams estimator configured");

        Ok(Self {
            sample_size,
            reservoir: OccurrenceReservoir::with_capacity(sample_size),
            seen: 0,
            replacements: 0,
            rng: StdRng::seed_from_u64(seed),
        })
    }

    /// Configured number of variables (s)
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Occurrences processed so far (n)
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Number of evictions so far
    pub fn replacements(&self) -> u64 {
        self.replacements
    }

    /// The sampled variables
    pub fn reservoir(&self) -> &OccurrenceReservoir<T> {
        &self.reservoir
    }

    /// Process one occurrence of `item`
    pub fn add(&mut self, item: T) {
        self.seen += 1;

        // Existing variables count this occurrence before it can be sampled
        self.reservoir.bump(&item);

        if self.reservoir.total_size() < self.sample_size {
            self.reservoir.add(item);
        } else if replacement_slot(&mut self.rng, self.seen, self.sample_size).is_some() {
            if let Some((evicted, value)) = self.reservoir.remove_random(&mut self.rng) {
                trace!(
                    target: "streamsketch::moments",
                    ?evicted,
                    value,
                    seen = self.seen,
                    "ams variable replaced"
                );
            }
            self.reservoir.add(item);
            self.replacements += 1;
        }
    }

    /// Process `count` occurrences of `item` (pre-aggregated input)
    pub fn add_count(&mut self, item: T, count: u64) {
        for _ in 0..count {
            self.add(item.clone());
        }
    }

    /// `n · Σ(2c - 1) / |sample|`; `0.0` before the first occurrence
    ///
    /// While the reservoir is still filling every position is sampled and the
    /// result equals the exact second moment.
    pub fn estimate(&self) -> f64 {
        let size = self.reservoir.total_size();
        if size == 0 {
            return 0.0;
        }
        self.seen as f64 * self.reservoir.term_sum() as f64 / size as f64
    }

    /// Confidence interval from the spread of the per-variable estimates
    ///
    /// Degenerates to a zero-width interval while every position is sampled.
    pub fn error_bounds(&self, confidence: f64) -> ErrorBounds {
        let estimate = self.estimate();
        let size = self.reservoir.total_size();
        if size < 2 || (size as u64) >= self.seen {
            return ErrorBounds::new(estimate, estimate, estimate, confidence);
        }

        let s = size as f64;
        let n = self.seen as f64;
        let mean_term = self.reservoir.term_sum() as f64 / s;
        let mean_square = self.reservoir.square_sum() as f64 / s;
        let term_variance = (mean_square - mean_term * mean_term).max(0.0) * s / (s - 1.0);
        let std_error = n * (term_variance / s).sqrt();

        let margin = z_score(confidence) * std_error;
        ErrorBounds::new(
            (estimate - margin).max(0.0),
            estimate,
            estimate + margin,
            confidence,
        )
    }
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> Sketch for AmsEstimator<T> {
    type Item = T;

    fn update(&mut self, item: &T) {
        self.add(item.clone());
    }

    fn clear(&mut self) {
        self.reservoir.clear();
        self.seen = 0;
        self.replacements = 0;
    }

    fn size_bytes(&self) -> usize {
        core::mem::size_of::<Self>() + self.reservoir.heap_bytes()
    }

    fn count(&self) -> u64 {
        self.seen
    }
}

impl<T: Hash + Eq + Clone + core::fmt::Debug> MomentSketch for AmsEstimator<T> {
    fn second_moment(&self) -> f64 {
        self.estimate()
    }
}

/// One-shot AMS estimate of the second moment with the default seed
///
/// Returns `0.0` for an empty stream.
pub fn compute_ams<I, T>(tokens: I, sample_size: usize) -> Result<f64, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Hash + Eq + Clone + core::fmt::Debug,
{
    compute_ams_seeded(tokens, sample_size, DEFAULT_SEED)
}

/// [`compute_ams`] with an explicit seed
pub fn compute_ams_seeded<I, T>(tokens: I, sample_size: usize, seed: u64) -> Result<f64, ConfigError>
where
    I: IntoIterator<Item = T>,
    T: Hash + Eq + Clone + core::fmt::Debug,
{
    let mut ams = AmsEstimator::with_seed(sample_size, seed)?;
    for token in tokens {
        ams.add(token);
    }
    Ok(ams.estimate())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moments::compute_exact;

    #[test]
    fn test_zero_sample_size_rejected() {
        assert_eq!(
            AmsEstimator::<u32>::new(0).unwrap_err(),
            ConfigError::ZeroSampleSize
        );
        assert!(compute_ams(["a"], 0).is_err());
    }

    #[test]
    fn test_empty() {
        let ams = AmsEstimator::<u32>::new(10).unwrap();
        assert_eq!(ams.estimate(), 0.0);
        assert_eq!(compute_ams(Vec::<u32>::new(), 10).unwrap(), 0.0);
    }

    #[test]
    fn test_exact_while_filling() {
        let tokens = ["a", "a", "a", "b", "b", "c"];
        let mut ams = AmsEstimator::new(10).unwrap();

        for (i, &t) in tokens.iter().enumerate() {
            ams.add(t);
            let exact = compute_exact(tokens[..=i].iter().copied());
            assert_eq!(ams.estimate(), exact as f64);
        }
        assert_eq!(ams.replacements(), 0);
    }

    #[test]
    fn test_reservoir_bounded() {
        let mut ams = AmsEstimator::new(50).unwrap();
        for i in 0..10_000u32 {
            ams.add(i % 97);
            assert!(ams.reservoir().total_size() <= 50);
        }
        assert_eq!(ams.reservoir().total_size(), 50);
        assert!(ams.replacements() > 0);
    }

    #[test]
    fn test_single_item_stream_close() {
        // A variable sampled at position p of a constant stream has c = n - p + 1
        let n = 5_000u64;
        let mut ams = AmsEstimator::new(500).unwrap();
        ams.add_count("x", n);

        let exact = (n * n) as f64;
        let rel = (ams.estimate() - exact).abs() / exact;
        assert!(rel < 0.15, "relative error {}", rel);
    }

    #[test]
    fn test_reproducible_with_seed() {
        let tokens: Vec<u32> = (0..5000).map(|i| i % 31).collect();
        let a = compute_ams_seeded(tokens.iter().copied(), 40, 5).unwrap();
        let b = compute_ams_seeded(tokens.iter().copied(), 40, 5).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_bounds_near_exact() {
        let tokens: Vec<u32> = (0..20_000u32).map(|i| (i * i) % 211).collect();
        let exact = compute_exact(tokens.iter().copied()) as f64;

        let mut ams = AmsEstimator::with_seed(2_000, 17).unwrap();
        for &t in &tokens {
            ams.add(t);
        }

        let bounds = ams.error_bounds(0.99);
        assert!(bounds.lower <= bounds.estimate && bounds.estimate <= bounds.upper);
        assert!(bounds.width() > 0.0);

        // Twice the 99% margin
        let margin = bounds.upper - bounds.estimate;
        assert!(
            (bounds.estimate - exact).abs() <= 2.0 * margin,
            "exact {} too far from [{}, {}]",
            exact,
            bounds.lower,
            bounds.upper
        );
    }

    #[test]
    fn test_error_bounds_zero_width_while_filling() {
        let mut ams = AmsEstimator::new(100).unwrap();
        for t in ["a", "b", "a"] {
            ams.add(t);
        }
        let bounds = ams.error_bounds(0.95);
        assert_eq!(bounds.width(), 0.0);
        assert_eq!(bounds.estimate, 5.0);
    }

    #[test]
    fn test_clear() {
        let mut ams = AmsEstimator::new(10).unwrap();
        ams.add_count(1u8, 100);
        ams.clear();
        assert!(ams.is_empty());
        assert_eq!(ams.estimate(), 0.0);
        assert_eq!(ams.reservoir().total_size(), 0);
    }
}
