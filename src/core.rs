//! Core types and primitives for msdsort.
//!
//! This module defines:
//! - [`RadixKey`]: the trait sortable elements implement.
//! - [`Entry`]: a key/satellite pair relocated (never inspected) by the engine.
//! - [`SortError`]: the public error type.
//! - Histogram/prefix-sum primitives and the internal buffer-pair handle.

use cuneiform::cuneiform;
use thiserror::Error;

/// Number of bits consumed per radix pass.
pub const BITS_PER_BUCKET: u32 = 8;

/// Number of buckets per radix pass (one per byte value).
pub const BUCKETS: usize = 1 << BITS_PER_BUCKET;

/// Mask extracting the bucket bits.
const BUCKET_MASK: u64 = (BUCKETS - 1) as u64;

/// Mask of the sign bit of an `i64` key.
const SIGN_MASK: u64 = 1 << 63;

/// Index of the least significant digit; the most significant digit is 0.
pub(crate) const LEAST_SIGNIFICANT_DIGIT: usize = 7;

/// Ranges shorter than this are finished with insertion sort.
pub(crate) const INSERTION_SORT_THRESHOLD: usize = 16;

/// Ranges shorter than this leave the radix recursion for the
/// comparison-based fallback.
pub(crate) const QUICKSORT_THRESHOLD: usize = 4096;

/// Minimum number of elements worth a thread of its own.
pub(crate) const THREAD_THRESHOLD: usize = 65536;

/// Maps a key and digit depth to a bucket index in `0..256`.
///
/// The sign bit is flipped before the byte is extracted, so all negative keys
/// land in buckets below all non-negative keys at depth 0. For deeper digits
/// the flipped bit is shifted past the mask and the expression degenerates to
/// a plain byte extraction, which is exactly the required behavior.
///
/// Every counting and scatter site, sequential or parallel, goes through this
/// one function.
#[inline(always)]
pub fn bucket_of(key: i64, depth: usize) -> usize {
    let shift = 64 - (depth as u32 + 1) * BITS_PER_BUCKET;
    (((key as u64 ^ SIGN_MASK) >> shift) & BUCKET_MASK) as usize
}

/// Errors surfaced by the public sorting operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    /// The requested range does not satisfy
    /// `from_index <= to_index <= buffer length`.
    #[error("invalid range {from_index}..{to_index} for a buffer of length {len}")]
    InvalidRange {
        from_index: usize,
        to_index: usize,
        len: usize,
    },
    /// A worker thread terminated abnormally. The sort is aborted and the
    /// buffer may be left in an intermediate state; there is no partial
    /// result to recover.
    #[error("worker thread failed: {0}")]
    Worker(String),
}

/// Validates a half-open range against a buffer length.
pub(crate) fn check_range(len: usize, from_index: usize, to_index: usize) -> Result<(), SortError> {
    if from_index > to_index || to_index > len {
        return Err(SortError::InvalidRange {
            from_index,
            to_index,
            len,
        });
    }
    Ok(())
}

/// A 64-bit key paired with opaque satellite data.
///
/// The engine only relocates the value alongside its key; it never reads or
/// mutates it. Sorting entries is stable: entries with equal keys keep their
/// relative order.
///
/// # Examples
///
/// ```
/// use msdsort::{parallel_sort, Entry};
///
/// let mut entries = vec![
///     Entry::new(2, "late"),
///     Entry::new(1, "early"),
///     Entry::new(2, "later"),
/// ];
/// parallel_sort(&mut entries, 0, 3).unwrap();
///
/// let values: Vec<&str> = entries.iter().map(|e| e.value).collect();
/// assert_eq!(values, vec!["early", "late", "later"]);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Entry<V> {
    /// The sort key.
    pub key: i64,
    /// The satellite payload; opaque to the engine.
    pub value: V,
}

impl<V> Entry<V> {
    /// Creates an entry from a key and its satellite value.
    pub fn new(key: i64, value: V) -> Self {
        Entry { key, value }
    }
}

/// A sortable element: a copyable item exposing an `i64` sort key.
///
/// Implemented for bare `i64` keys and for [`Entry<V>`]; external types can
/// implement it to sort their own key-carrying records — only [`key`] is
/// required.
///
/// [`key`]: RadixKey::key
pub trait RadixKey: Copy + Send + Sync {
    /// Returns the sort key of this element.
    fn key(&self) -> i64;

    /// Sorts a small range in place by key.
    ///
    /// `scratch` is a same-length slice whose contents are unspecified and
    /// may be clobbered. The default is an unstable three-way quicksort;
    /// element types that promise stability must override it with a stable
    /// sort, as [`Entry`] does with a bottom-up merge sort.
    fn fallback_sort(range: &mut [Self], _scratch: &mut [Self]) {
        crate::algo::quicksort_by(range, &Self::key);
    }
}

// Bare keys carry no identity, so the default unstable quicksort fallback is
// observably equivalent to a stable sort.
impl RadixKey for i64 {
    #[inline(always)]
    fn key(&self) -> i64 {
        *self
    }
}

impl<V: Copy + Send + Sync> RadixKey for Entry<V> {
    #[inline(always)]
    fn key(&self) -> i64 {
        self.key
    }

    // Entries promise stability, so the fallback is a bottom-up merge sort.
    fn fallback_sort(range: &mut [Self], scratch: &mut [Self]) {
        crate::algo::merge_sort_by(range, scratch, &|entry: &Self| entry.key);
    }
}

// Cache-aligned bucket counts for one radix pass.
#[cuneiform]
pub(crate) struct Histogram {
    pub(crate) counts: [usize; BUCKETS],
}

impl Histogram {
    pub(crate) fn new() -> Self {
        Histogram {
            counts: [0; BUCKETS],
        }
    }
}

/// Counts bucket occupancy over a slice for the given digit, in one pass.
pub(crate) fn count_buckets<T: RadixKey>(slice: &[T], depth: usize) -> Histogram {
    let mut histogram = Histogram::new();
    for element in slice {
        histogram.counts[bucket_of(element.key(), depth)] += 1;
    }
    histogram
}

/// Converts a histogram into absolute bucket start offsets.
///
/// `map[0] = from_index` and `map[b] = map[b - 1] + histogram[b - 1]`; the
/// result is non-decreasing and its final entry plus the last count equals
/// the range end.
pub(crate) fn start_index_map(histogram: &Histogram, from_index: usize) -> [usize; BUCKETS] {
    let mut map = [0usize; BUCKETS];
    map[0] = from_index;
    for bucket in 1..BUCKETS {
        map[bucket] = map[bucket - 1] + histogram.counts[bucket - 1];
    }
    map
}

/// The two equal-length buffers a top-level sort ping-pongs between.
///
/// Which buffer holds the authoritative contents of a subrange is a pure
/// function of digit depth: even depths read the primary (caller's) buffer,
/// odd depths the auxiliary clone. The pair is a copyable pair of raw
/// pointers so that sibling recursion branches can operate on disjoint
/// subranges of both buffers concurrently.
///
/// Safety contract for every accessor: the caller must own `[from_index,
/// to_index)` exclusively within the recursion tree, i.e. no concurrently
/// running node overlaps it. The scheduler guarantees this by construction:
/// buckets partition their parent range, and during a scatter every
/// (worker, bucket) destination sub-range is disjoint from every other.
pub(crate) struct BufferPair<T> {
    primary: *mut T,
    auxiliary: *mut T,
    len: usize,
}

impl<T> Clone for BufferPair<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for BufferPair<T> {}

// A BufferPair is only ever handed to scoped workers together with a range
// they own exclusively; the pointers themselves are plain addresses.
unsafe impl<T: Send> Send for BufferPair<T> {}

impl<T> BufferPair<T> {
    pub(crate) fn new(primary: &mut [T], auxiliary: &mut [T]) -> Self {
        debug_assert_eq!(primary.len(), auxiliary.len());
        BufferPair {
            primary: primary.as_mut_ptr(),
            auxiliary: auxiliary.as_mut_ptr(),
            len: primary.len(),
        }
    }

    #[inline(always)]
    fn buffer(&self, depth: usize) -> *mut T {
        if depth % 2 == 0 {
            self.primary
        } else {
            self.auxiliary
        }
    }

    /// Shared view of the authoritative contents of a subrange at `depth`.
    #[inline(always)]
    pub(crate) unsafe fn source(&self, depth: usize, from_index: usize, to_index: usize) -> &[T] {
        debug_assert!(from_index <= to_index && to_index <= self.len);
        unsafe {
            std::slice::from_raw_parts(self.buffer(depth).add(from_index), to_index - from_index)
        }
    }

    /// Writes one element into the buffer that pass `depth` scatters into.
    #[inline(always)]
    pub(crate) unsafe fn scatter_write(&self, depth: usize, index: usize, value: T) {
        debug_assert!(index < self.len);
        unsafe { self.buffer(depth + 1).add(index).write(value) }
    }

    /// Exclusive views of a subrange in the authoritative buffer and, as
    /// scratch space, the same subrange of the opposite buffer.
    pub(crate) unsafe fn fallback_views(
        &self,
        depth: usize,
        from_index: usize,
        to_index: usize,
    ) -> (&mut [T], &mut [T]) {
        debug_assert!(from_index <= to_index && to_index <= self.len);
        let range_len = to_index - from_index;
        let range =
            unsafe { std::slice::from_raw_parts_mut(self.buffer(depth).add(from_index), range_len) };
        let scratch = unsafe {
            std::slice::from_raw_parts_mut(self.buffer(depth + 1).add(from_index), range_len)
        };
        (range, scratch)
    }

    /// Copies a subrange back into the primary buffer when the auxiliary
    /// buffer is authoritative at `depth`. The sorted result must always end
    /// up in the caller's buffer.
    pub(crate) unsafe fn normalize(&self, depth: usize, from_index: usize, to_index: usize) {
        if depth % 2 == 1 {
            unsafe {
                std::ptr::copy_nonoverlapping(
                    self.auxiliary.add(from_index),
                    self.primary.add(from_index),
                    to_index - from_index,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_flip_orders_negative_keys_first() {
        assert_eq!(bucket_of(i64::MIN, 0), 0);
        assert_eq!(bucket_of(-1, 0), 127);
        assert_eq!(bucket_of(0, 0), 128);
        assert_eq!(bucket_of(i64::MAX, 0), 255);
    }

    #[test]
    fn deeper_digits_are_plain_bytes() {
        let key = 0x0123_4567_89AB_CDEF_i64;
        assert_eq!(bucket_of(key, 1), 0x23);
        assert_eq!(bucket_of(key, 4), 0x89);
        assert_eq!(bucket_of(key, 7), 0xEF);
        // No sign adjustment below the top byte.
        assert_eq!(bucket_of(-1, 7), 0xFF);
    }

    #[test]
    fn start_map_is_an_exact_prefix_sum() {
        let data: Vec<i64> = (0..1000).map(|i| i * 7919).collect();
        let histogram = count_buckets(&data, 1);
        let map = start_index_map(&histogram, 42);

        assert_eq!(map[0], 42);
        for bucket in 1..BUCKETS {
            assert_eq!(map[bucket], map[bucket - 1] + histogram.counts[bucket - 1]);
        }
        assert_eq!(
            map[BUCKETS - 1] + histogram.counts[BUCKETS - 1],
            42 + data.len()
        );
    }

    #[test]
    fn range_checks() {
        assert!(check_range(10, 0, 10).is_ok());
        assert!(check_range(10, 10, 10).is_ok());
        assert!(check_range(10, 3, 2).is_err());
        assert!(check_range(10, 0, 11).is_err());
        assert!(check_range(0, 0, 0).is_ok());
    }
}
