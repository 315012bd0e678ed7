//! Core traits for streaming estimators
//!
//! Every estimator implements the base [`Sketch`] trait, with specialized
//! traits for each algorithm family (cardinality, frequent items, moments).

use core::fmt::Debug;
use thiserror::Error;

/// Error raised when an estimator is constructed with an unusable configuration
///
/// These are the only fatal errors in the crate; they surface at construction
/// time, never mid-stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Hash modulus is not prime
    #[error("hash modulus {0} is not prime")]
    NonPrimeModulus(u64),
    /// Hash modulus is below the supported minimum
    #[error("hash modulus {modulus} is too small: must be at least {minimum}")]
    ModulusTooSmall { modulus: u64, minimum: u64 },
    /// Distinct counter asked for zero hash functions
    #[error("number of hash functions must be positive")]
    ZeroHashFunctions,
    /// Counter table capacity (k) of zero
    #[error("capacity must be positive")]
    ZeroCapacity,
    /// AMS sample size (s) of zero
    #[error("sample size must be positive")]
    ZeroSampleSize,
    /// Sliding window of zero stream positions
    #[error("window size must be positive")]
    ZeroWindow,
}

/// Error bounds for an estimate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorBounds {
    /// Lower bound of the estimate
    pub lower: f64,
    /// Point estimate
    pub estimate: f64,
    /// Upper bound of the estimate
    pub upper: f64,
    /// Confidence level (e.g., 0.95 for 95%)
    pub confidence: f64,
}

impl ErrorBounds {
    /// Create new error bounds
    pub fn new(lower: f64, estimate: f64, upper: f64, confidence: f64) -> Self {
        Self {
            lower,
            estimate,
            upper,
            confidence,
        }
    }

    /// Check if a value falls within bounds
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }

    /// Width of the confidence interval
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Relative width (width / estimate)
    pub fn relative_width(&self) -> f64 {
        if self.estimate == 0.0 {
            0.0
        } else {
            self.width() / self.estimate
        }
    }
}

/// Two-sided z-score for a confidence level (approximate)
#[cfg_attr(not(feature = "moments"), allow(dead_code))]
pub(crate) fn z_score(confidence: f64) -> f64 {
    match confidence {
        c if c >= 0.99 => 2.576,
        c if c >= 0.95 => 1.96,
        c if c >= 0.90 => 1.645,
        c if c >= 0.80 => 1.282,
        _ => 1.0,
    }
}

/// Core trait for all single-pass estimators
pub trait Sketch: Debug {
    /// The type of item this sketch processes
    type Item: ?Sized;

    /// Feed one stream item
    fn update(&mut self, item: &Self::Item);

    /// Reset to the empty state, keeping the configuration
    fn clear(&mut self);

    /// Approximate memory usage in bytes
    fn size_bytes(&self) -> usize;

    /// Number of items processed
    fn count(&self) -> u64;

    /// Check if sketch is empty
    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

/// Cardinality (distinct count) estimation sketches
pub trait CardinalitySketch: Sketch {
    /// Estimate number of distinct items seen
    ///
    /// Returns `0.0` for an empty stream.
    fn estimate(&self) -> f64;
}

/// Bounded frequent-item (heavy hitters) tables
pub trait FrequentItems: Sketch
where
    Self::Item: Sized + Clone,
{
    /// Items currently held by the table
    fn frequent_items(&self) -> Vec<Self::Item>;

    /// Counter value for an item (0 when untracked)
    ///
    /// This is a lower bound on the item's true frequency.
    fn estimate_frequency(&self, item: &Self::Item) -> u64;
}

/// Frequency-moment estimators
pub trait MomentSketch: Sketch {
    /// Second moment (surprise number) `Σ mᵢ²` of the stream so far
    fn second_moment(&self) -> f64;
}
