//! Sequential sorting algorithms.
//!
//! This module implements the single-threaded half of the engine:
//! - **Insertion sort** and a **three-way quicksort** (median-of-three pivot,
//!   Dutch-national-flag partition), both generalized over an external key
//!   lookup so the same code orders key slices and the bucket-index array
//!   used for load balancing.
//! - A stable **bottom-up merge sort**, the small-range fallback for
//!   [`Entry`](crate::Entry) slices.
//! - The sequential **MSD radix recursion**, reached directly through
//!   [`sort`] or whenever the parallel scheduler's thread budget drops
//!   below 2.

use crate::core::{
    BUCKETS, BufferPair, INSERTION_SORT_THRESHOLD, LEAST_SIGNIFICANT_DIGIT, QUICKSORT_THRESHOLD,
    RadixKey, SortError, bucket_of, check_range, count_buckets, start_index_map,
};

/// Sorts `array[from_index..to_index]` ascending by key, sequentially.
///
/// The range is sorted in place; elements outside it are untouched. For
/// [`Entry`](crate::Entry) slices the sort is stable.
///
/// # Errors
///
/// Returns [`SortError::InvalidRange`] unless
/// `from_index <= to_index <= array.len()`.
///
/// # Examples
///
/// ```
/// use msdsort::sort;
///
/// let mut data: Vec<i64> = vec![5, -3, 0, i64::MAX, i64::MIN, 2];
/// sort(&mut data, 0, 6).unwrap();
/// assert_eq!(data, vec![i64::MIN, -3, 0, 2, 5, i64::MAX]);
/// ```
pub fn sort<T: RadixKey>(array: &mut [T], from_index: usize, to_index: usize) -> Result<(), SortError> {
    check_range(array.len(), from_index, to_index)?;
    let range_len = to_index - from_index;

    if range_len < 2 {
        return Ok(());
    }

    if range_len < QUICKSORT_THRESHOLD {
        // Not worth a radix pass; skip the auxiliary allocation as well.
        let mut scratch = array[from_index..to_index].to_vec();
        T::fallback_sort(&mut array[from_index..to_index], &mut scratch);
        return Ok(());
    }

    let mut auxiliary = array.to_vec();
    let pair = BufferPair::new(array, &mut auxiliary);
    // Safety: both buffers live for the duration of this call and the
    // recursion is handed the whole range exclusively.
    unsafe { sequential_radix(pair, 0, from_index, to_index) };
    Ok(())
}

/// One node of the sequential MSD radix recursion.
///
/// Counts the digit histogram, scatters into the opposite buffer, then
/// recurses into each non-empty bucket at `depth + 1`, terminating on the
/// comparison fallback for short ranges and on the least significant digit.
///
/// # Safety
///
/// The caller must own `[from_index, to_index)` of both buffers exclusively.
pub(crate) unsafe fn sequential_radix<T: RadixKey>(
    pair: BufferPair<T>,
    depth: usize,
    from_index: usize,
    to_index: usize,
) {
    let range_len = to_index - from_index;

    if range_len < QUICKSORT_THRESHOLD {
        unsafe { fallback(pair, depth, from_index, to_index) };
        return;
    }

    let source = unsafe { pair.source(depth, from_index, to_index) };
    let histogram = count_buckets(source, depth);
    let start_map = start_index_map(&histogram, from_index);

    let mut processed = [0usize; BUCKETS];
    for element in source {
        let bucket = bucket_of(element.key(), depth);
        unsafe { pair.scatter_write(depth, start_map[bucket] + processed[bucket], *element) };
        processed[bucket] += 1;
    }

    if depth == LEAST_SIGNIFICANT_DIGIT {
        // The final pass always lands in the primary buffer.
        return;
    }

    for bucket in 0..BUCKETS {
        if histogram.counts[bucket] != 0 {
            unsafe {
                sequential_radix(
                    pair,
                    depth + 1,
                    start_map[bucket],
                    start_map[bucket] + histogram.counts[bucket],
                )
            };
        }
    }
}

/// Terminal case of the radix recursion: sorts the authoritative copy of the
/// subrange with the element type's comparison fallback and normalizes the
/// result into the caller's buffer.
///
/// # Safety
///
/// The caller must own `[from_index, to_index)` of both buffers exclusively.
pub(crate) unsafe fn fallback<T: RadixKey>(
    pair: BufferPair<T>,
    depth: usize,
    from_index: usize,
    to_index: usize,
) {
    let (range, scratch) = unsafe { pair.fallback_views(depth, from_index, to_index) };
    T::fallback_sort(range, scratch);
    unsafe { pair.normalize(depth, from_index, to_index) };
}

/// Three-way quicksort over an external key lookup.
///
/// Pivot is the median of the elements at the 1/4, 1/2 and 3/4 offsets; the
/// partition is three-way so runs of duplicate keys collapse in one pass.
/// Recurses into the smaller partition and loops on the larger, bounding the
/// stack to O(log n). Ranges below the insertion threshold are finished by
/// [`insertion_sort_by`].
pub(crate) fn quicksort_by<T, K>(mut range: &mut [T], key: &K)
where
    T: Copy,
    K: Fn(&T) -> i64,
{
    while range.len() >= INSERTION_SORT_THRESHOLD {
        let pivot = median_of_three(range, key);
        let (lt, gt) = partition_three_way(range, pivot, key);

        let (left, rest) = range.split_at_mut(lt);
        let (_, right) = rest.split_at_mut(gt - lt);

        if left.len() < right.len() {
            quicksort_by(left, key);
            range = right;
        } else {
            quicksort_by(right, key);
            range = left;
        }
    }

    insertion_sort_by(range, key);
}

fn median_of_three<T, K>(range: &[T], key: &K) -> i64
where
    K: Fn(&T) -> i64,
{
    let distance = range.len() / 4;
    let a = key(&range[distance]);
    let b = key(&range[range.len() / 2]);
    let c = key(&range[range.len() - distance]);
    median(a, b, c)
}

/// Partitions `range` into `< pivot`, `== pivot` and `> pivot` zones and
/// returns their boundaries `(lt, gt)`.
fn partition_three_way<T, K>(range: &mut [T], pivot: i64, key: &K) -> (usize, usize)
where
    T: Copy,
    K: Fn(&T) -> i64,
{
    let range_len = range.len();
    let mut left = 0;
    let mut right = 0;
    let mut index = 0;

    while index < range_len - right {
        let current = key(&range[index]);
        if current > pivot {
            right += 1;
            range.swap(range_len - right, index);
        } else if current < pivot {
            range.swap(left, index);
            index += 1;
            left += 1;
        } else {
            index += 1;
        }
    }

    (left, range_len - right)
}

fn median(a: i64, b: i64, c: i64) -> i64 {
    if a <= b {
        if c <= a {
            return a;
        }
        return if b <= c { b } else { c };
    }
    if c <= b {
        return b;
    }
    if a <= c { a } else { c }
}

/// Stable insertion sort over an external key lookup.
pub(crate) fn insertion_sort_by<T, K>(range: &mut [T], key: &K)
where
    T: Copy,
    K: Fn(&T) -> i64,
{
    for i in 1..range.len() {
        let current = range[i];
        let current_key = key(&current);
        let mut j = i;
        while j > 0 && key(&range[j - 1]) > current_key {
            range[j] = range[j - 1];
            j -= 1;
        }
        range[j] = current;
    }
}

/// Stable bottom-up merge sort over an external key lookup.
///
/// Ping-pongs whole passes between `range` and `scratch` and copies back when
/// an odd number of passes left the result in the scratch buffer, so the
/// sorted range always ends up in `range`. Ranges below the insertion
/// threshold never leave `range` at all.
pub(crate) fn merge_sort_by<T, K>(range: &mut [T], scratch: &mut [T], key: &K)
where
    T: Copy,
    K: Fn(&T) -> i64,
{
    let range_len = range.len();
    if range_len < INSERTION_SORT_THRESHOLD {
        insertion_sort_by(range, key);
        return;
    }

    debug_assert!(scratch.len() >= range_len);
    let scratch = &mut scratch[..range_len];

    let mut width = 1;
    let mut source_is_range = true;
    while width < range_len {
        if source_is_range {
            merge_pass(range, scratch, width, key);
        } else {
            merge_pass(scratch, range, width, key);
        }
        source_is_range = !source_is_range;
        width <<= 1;
    }

    if !source_is_range {
        range.copy_from_slice(scratch);
    }
}

fn merge_pass<T, K>(source: &[T], target: &mut [T], width: usize, key: &K)
where
    T: Copy,
    K: Fn(&T) -> i64,
{
    let len = source.len();
    let mut left = 0;

    while left < len {
        let mid = (left + width).min(len);
        let right = (left + 2 * width).min(len);

        let mut i = left;
        let mut j = mid;
        let mut out = left;
        while i < mid && j < right {
            // Ties take the left run, which is what keeps the merge stable.
            if key(&source[j]) < key(&source[i]) {
                target[out] = source[j];
                j += 1;
            } else {
                target[out] = source[i];
                i += 1;
            }
            out += 1;
        }
        while i < mid {
            target[out] = source[i];
            i += 1;
            out += 1;
        }
        while j < right {
            target[out] = source[j];
            j += 1;
            out += 1;
        }

        left = right;
    }
}
