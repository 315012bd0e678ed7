//! # Streamsketch
//!
//! Single-pass estimators for streams too large to hold in memory.
//!
//! Every estimator consumes a stream of tokens left to right exactly once and
//! keeps only a bounded summary. Token sources, tokenization and result
//! files belong to the caller.
//!
//! ## Features
//!
//! - **Distinct counting**: median of independent hash minima
//! - **Heavy hitters**: Misra-Gries bounded counter table
//! - **Sliding-window top-k**: Misra-Gries recomputed over a trailing window
//!   of timestamped readings, with missing-reading bookkeeping
//! - **Second moment**: exact counts, or the AMS reservoir estimator
//! - **Reproducible**: every randomized estimator takes a `u64` seed
//!
//! ## Quick Start
//!
//! ```rust
//! use streamsketch::prelude::*;
//!
//! let text = "the cat sat on the mat and the dog sat too";
//!
//! let distinct = estimate_distinct(text.split_whitespace(), 32).unwrap();
//! println!("~{:.0} distinct words", distinct);
//!
//! let mut table = MisraGries::new(2).unwrap();
//! for word in text.split_whitespace() {
//!     table.process(word);
//! }
//! println!("frequent: {:?}", table.extract_frequent_set());
//!
//! let exact = compute_exact(text.split_whitespace());
//! let approx = compute_ams(text.split_whitespace(), 4).unwrap();
//! println!("surprise number {} (AMS ~{:.0})", exact, approx);
//! ```
//!
//! ## Feature Flags
//!
//! Algorithm families (all enabled by default):
//! - `cardinality`: hash family and distinct counting
//! - `frequency`: Misra-Gries table
//! - `window`: sliding-window tracker (implies `frequency`)
//! - `moments`: exact and AMS second moment
//! - `full`: enable all algorithm families
//!
//! Platform features:
//! - `serde`: serialization of configuration types

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Seed used by constructors that do not take one
pub const DEFAULT_SEED: u64 = 0x12345678;

// Core traits always available
pub mod traits;

#[cfg(feature = "cardinality")]
#[cfg_attr(docsrs, doc(cfg(feature = "cardinality")))]
pub mod cardinality;

#[cfg(feature = "frequency")]
#[cfg_attr(docsrs, doc(cfg(feature = "frequency")))]
pub mod frequency;

#[cfg(feature = "moments")]
#[cfg_attr(docsrs, doc(cfg(feature = "moments")))]
pub mod moments;

pub mod prelude {
    pub use crate::traits::*;

    #[cfg(feature = "cardinality")]
    pub use crate::cardinality::{estimate_distinct, exact_distinct, DistinctCounter};

    #[cfg(feature = "frequency")]
    pub use crate::frequency::{MisraGries, OnFull};

    #[cfg(feature = "window")]
    pub use crate::frequency::{SlidingWindowTracker, TrackerConfig};

    #[cfg(feature = "moments")]
    pub use crate::moments::{compute_ams, compute_exact, AmsEstimator, ExactMoments};
}

#[cfg(feature = "cardinality")]
pub use cardinality::DistinctCounter;

#[cfg(feature = "frequency")]
pub use frequency::MisraGries;

#[cfg(feature = "moments")]
pub use moments::AmsEstimator;
