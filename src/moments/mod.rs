//! Frequency moments
//!
//! This module computes the second frequency moment ("surprise number")
//! `Σ mᵢ²` of a stream, where `mᵢ` is the number of occurrences of item `i`.
//!
//! # Algorithms
//!
//! - [`ExactMoments`]: exact per-item counts (memory linear in distinct items)
//! - [`AmsEstimator`]: Alon-Matias-Szegedy estimate from `s` reservoir-sampled
//!   variables (memory `O(s)`)
//!
//! # Example
//!
//! ```
//! use streamsketch::moments::{compute_ams, compute_exact};
//!
//! let tokens: Vec<u32> = (0..10_000).map(|i| i % 100).collect();
//!
//! let exact = compute_exact(tokens.iter().copied());
//! assert_eq!(exact, 100 * 100 * 100);
//!
//! let approx = compute_ams(tokens.iter().copied(), 500).unwrap();
//! println!("exact {} vs AMS {:.0}", exact, approx);
//! ```

mod ams;
mod exact;
mod occurrences;

pub use ams::{compute_ams, compute_ams_seeded, AmsEstimator};
pub use exact::{compute_exact, compute_exact_from_counts, ExactMoments};
pub use occurrences::OccurrenceReservoir;
