//! # Msdsort
//!
//! `msdsort` is a parallel sorting library for arrays of 64-bit signed
//! integer keys, optionally paired with opaque satellite data.
//!
//! It implements a most-significant-digit (MSD) **radix sort** that recurses
//! byte by byte through the keys, fanning each recursion level out over a
//! shrinking thread budget and falling back to comparison sorts once a
//! subrange is too small to amortize another radix pass.
//!
//! ## Key Features
//!
//! - **Lock-free parallelism**: counting and scattering are split across
//!   worker threads whose write ranges are made disjoint by exact prefix-sum
//!   planning, so no locks or atomics appear anywhere in the engine.
//! - **Signed keys**: a sign-bit flip at the most significant digit puts all
//!   negative keys below all non-negative ones, giving true `i64` order.
//! - **Stable satellite data**: sorting [`Entry`] pairs preserves the
//!   relative order of equal keys and never touches the payload.
//! - **Load-balanced recursion**: non-empty buckets are packed into groups
//!   of near-equal element count before the thread budget is divided, so
//!   skewed distributions do not strand workers.
//! - **Deterministic results**: the output is byte-identical whether the
//!   sort runs on one thread or many.
//!
//! ## Usage
//!
//! ### Sorting keys
//!
//! ```rust
//! use msdsort::parallel_sort;
//!
//! let mut data: Vec<i64> = vec![5, -3, 0, i64::MAX, i64::MIN, 2];
//! parallel_sort(&mut data, 0, 6).unwrap();
//!
//! assert_eq!(data, vec![i64::MIN, -3, 0, 2, 5, i64::MAX]);
//! ```
//!
//! ### Sorting keys with satellite data
//!
//! ```rust
//! use msdsort::{parallel_sort, Entry};
//!
//! let mut entries = vec![
//!     Entry::new(3, "c"),
//!     Entry::new(1, "a"),
//!     Entry::new(2, "b"),
//! ];
//! parallel_sort(&mut entries, 0, 3).unwrap();
//!
//! let values: Vec<&str> = entries.iter().map(|e| e.value).collect();
//! assert_eq!(values, vec!["a", "b", "c"]);
//! ```
//!
//! ### Sub-range sorts
//!
//! Every operation takes a half-open `[from_index, to_index)` range and
//! leaves elements outside it untouched:
//!
//! ```rust
//! use msdsort::sort;
//!
//! let mut data: Vec<i64> = vec![9, 4, 3, 2, 9];
//! sort(&mut data, 1, 4).unwrap();
//!
//! assert_eq!(data, vec![9, 2, 3, 4, 9]);
//! ```
//!
//! ## Performance Characteristics
//!
//! - **Complexity**: O(kN) with k between 1 and 8 radix passes; small
//!   subranges finish in the comparison fallback at O(n log n).
//! - **Parallelism**: the top-level thread budget defaults to
//!   `min(available cores, N / 65536)` and is consumed as it is subdivided
//!   across recursion branches, bounding concurrently live threads.
//! - **Memory overhead**: one auxiliary buffer of the input's length,
//!   allocated per top-level call; histograms and offset tables are
//!   per-recursion-node and short-lived.
//!
//! The engine shines on large arrays (millions of keys) where comparison
//! sorts become memory-bound; below the parallel threshold it transparently
//! degrades to a tuned sequential hybrid.

pub mod algo;
pub mod core;
pub mod parallel;

pub use algo::sort;
pub use core::{Entry, RadixKey, SortError, bucket_of};
pub use parallel::{parallel_sort, parallel_sort_with_threads};

pub mod prelude {
    pub use crate::algo::sort;
    pub use crate::core::{Entry, RadixKey, SortError};
    pub use crate::parallel::{parallel_sort, parallel_sort_with_threads};
}
