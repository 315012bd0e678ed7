//! Frequent-item (heavy hitters) tracking
//!
//! This module provides a bounded counter table for finding the most
//! frequent items of a stream, and a tracker that applies it over a sliding
//! window of timestamped readings.
//!
//! # Algorithms
//!
//! - [`MisraGries`]: capacity-k counter table with decrement-all eviction
//! - [`SlidingWindowTracker`]: top-k recomputed over the trailing window
//!   (feature `window`)
//!
//! # Example
//!
//! ```
//! use streamsketch::frequency::MisraGries;
//!
//! let mut table = MisraGries::new(3).unwrap();
//!
//! for word in "a b a c a d a e a".split_whitespace() {
//!     table.process(word);
//! }
//!
//! // "a" occurs 5 times out of 9, well above 9 / (3 + 1)
//! assert!(table.extract_frequent_set().contains(&"a"));
//! ```

mod misra_gries;
#[cfg(feature = "window")]
#[cfg_attr(docsrs, doc(cfg(feature = "window")))]
mod window;

pub use misra_gries::{MisraGries, OnFull};
#[cfg(feature = "window")]
pub use window::{
    MissingValueLedger, RecordError, RecordOutcome, SlidingWindowTracker, TrackerConfig,
    DEFAULT_WINDOW,
};
