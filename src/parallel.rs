//! Parallel MSD radix sort engine.
//!
//! The engine forks worker threads per recursion branch and joins them
//! before returning; there is no persistent pool. A call at digit `depth`
//! runs three phases over its subrange:
//!
//! 1. **Count** — the subrange is split into one contiguous slice per
//!    worker; each worker returns an owned bucket histogram.
//! 2. **Plan + scatter** — the histograms are reduced into absolute bucket
//!    start offsets plus a per-worker processed-offset table. The table
//!    assigns every (worker, bucket) pair a disjoint destination sub-range,
//!    ordered by original slice order, which makes the concurrent scatter
//!    both race-free and stable without a single lock or atomic.
//! 3. **Recurse** — non-empty buckets are ordered by descending size and
//!    greedily packed into balanced groups; the remaining thread budget is
//!    divided across the groups, and each group recurses at `depth + 1`.
//!
//! Small ranges fall back to the sequential engine in [`crate::algo`], so
//! concurrency only ever changes wall-clock time, never the result.

use std::any::Any;
use std::thread;

use log::{debug, trace};

use crate::algo::{fallback, quicksort_by, sequential_radix, sort};
use crate::core::{
    BUCKETS, BufferPair, Histogram, LEAST_SIGNIFICANT_DIGIT, QUICKSORT_THRESHOLD, RadixKey,
    SortError, THREAD_THRESHOLD, bucket_of, check_range, count_buckets, start_index_map,
};

/// Sorts `array[from_index..to_index]` ascending by key, using up to
/// `min(available cores, range length / 65536)` threads.
///
/// The postcondition is identical to [`sort`]: the range is sorted in place,
/// elements outside it are untouched, and [`Entry`](crate::Entry) slices are
/// sorted stably. Ranges too short to amortize thread startup silently run
/// the sequential path; the result never depends on the thread count.
///
/// # Errors
///
/// Returns [`SortError::InvalidRange`] for an out-of-bounds or inverted
/// range and [`SortError::Worker`] if a worker thread fails, in which case
/// the range contents are unspecified.
///
/// # Examples
///
/// ```
/// use msdsort::parallel_sort;
///
/// let mut data: Vec<i64> = vec![5, -3, 0, i64::MAX, i64::MIN, 2];
/// parallel_sort(&mut data, 0, 6).unwrap();
/// assert_eq!(data, vec![i64::MIN, -3, 0, 2, 5, i64::MAX]);
/// ```
pub fn parallel_sort<T: RadixKey>(
    array: &mut [T],
    from_index: usize,
    to_index: usize,
) -> Result<(), SortError> {
    check_range(array.len(), from_index, to_index)?;
    let range_len = to_index - from_index;
    if range_len < 2 {
        return Ok(());
    }

    let available = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    let threads = (range_len / THREAD_THRESHOLD).min(available).max(1);
    run(array, from_index, to_index, threads)
}

/// [`parallel_sort`] with an explicit thread budget.
///
/// The budget is the maximum number of concurrently live threads; it is
/// consumed as it is subdivided across recursion branches and never grows.
/// A budget of 0 is treated as 1. With a budget of 1 this is exactly the
/// sequential sort.
pub fn parallel_sort_with_threads<T: RadixKey>(
    array: &mut [T],
    from_index: usize,
    to_index: usize,
    threads: usize,
) -> Result<(), SortError> {
    check_range(array.len(), from_index, to_index)?;
    if to_index - from_index < 2 {
        return Ok(());
    }
    run(array, from_index, to_index, threads.max(1))
}

fn run<T: RadixKey>(
    array: &mut [T],
    from_index: usize,
    to_index: usize,
    threads: usize,
) -> Result<(), SortError> {
    let range_len = to_index - from_index;
    if threads < 2 || range_len < QUICKSORT_THRESHOLD {
        return sort(array, from_index, to_index);
    }

    debug!(
        "parallel sort of {} elements with a budget of {} threads",
        range_len, threads
    );

    let mut auxiliary = array.to_vec();
    let pair = BufferPair::new(array, &mut auxiliary);
    // Safety: both buffers live until this call returns, after all workers
    // have been joined, and the root node owns the whole range.
    unsafe { parallel_radix(pair, threads, 0, from_index, to_index) }
}

/// A deferred recursion node: one bucket of a finished pass.
struct Task {
    depth: usize,
    from_index: usize,
    to_index: usize,
}

/// One node of the parallel radix recursion.
///
/// # Safety
///
/// The caller must own `[from_index, to_index)` of both buffers exclusively;
/// no concurrently running node may overlap it.
pub(crate) unsafe fn parallel_radix<T: RadixKey>(
    pair: BufferPair<T>,
    threads: usize,
    depth: usize,
    from_index: usize,
    to_index: usize,
) -> Result<(), SortError> {
    let range_len = to_index - from_index;

    if range_len < QUICKSORT_THRESHOLD {
        unsafe { fallback(pair, depth, from_index, to_index) };
        return Ok(());
    }

    if threads < 2 {
        unsafe { sequential_radix(pair, depth, from_index, to_index) };
        return Ok(());
    }

    let worker_len = range_len / threads;

    // Counting: every worker scans its own slice and returns an owned
    // histogram; the last slice (plus the division remainder) runs on the
    // calling thread while the spawned workers are already under way.
    let locals = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(threads - 1);
        for worker in 0..threads - 1 {
            let slice_from = from_index + worker * worker_len;
            handles.push(scope.spawn(move || {
                // Safety: shared read of a slice no one mutates during this
                // phase.
                let slice = unsafe { pair.source(depth, slice_from, slice_from + worker_len) };
                count_buckets(slice, depth)
            }));
        }

        let last_from = from_index + (threads - 1) * worker_len;
        let last = count_buckets(unsafe { pair.source(depth, last_from, to_index) }, depth);

        let mut locals = Vec::with_capacity(threads);
        let mut failure = None;
        for handle in handles {
            match handle.join() {
                Ok(histogram) => locals.push(histogram),
                Err(panic) => failure = failure.or(Some(worker_failure(panic))),
            }
        }
        locals.push(last);

        match failure {
            None => Ok(locals),
            Some(error) => Err(error),
        }
    })?;

    let mut global = Histogram::new();
    for local in &locals {
        for bucket in 0..BUCKETS {
            global.counts[bucket] += local.counts[bucket];
        }
    }
    let start_map = start_index_map(&global, from_index);
    let processed = processed_offsets(&locals);

    // Scatter: each worker re-scans its slice and writes every element into
    // its precomputed slot in the opposite buffer.
    thread::scope(|scope| {
        let start_map = &start_map;
        let mut handles = Vec::with_capacity(threads - 1);
        for worker in 0..threads - 1 {
            let slice_from = from_index + worker * worker_len;
            let offsets = processed[worker];
            handles.push(scope.spawn(move || {
                unsafe {
                    scatter_slice(
                        pair,
                        depth,
                        slice_from,
                        slice_from + worker_len,
                        start_map,
                        offsets,
                    )
                };
            }));
        }

        let last_from = from_index + (threads - 1) * worker_len;
        unsafe {
            scatter_slice(
                pair,
                depth,
                last_from,
                to_index,
                start_map,
                processed[threads - 1],
            )
        };

        let mut failure = None;
        for handle in handles {
            if let Err(panic) = handle.join() {
                failure = failure.or(Some(worker_failure(panic)));
            }
        }
        match failure {
            None => Ok(()),
            Some(error) => Err(error),
        }
    })?;

    if depth == LEAST_SIGNIFICANT_DIGIT {
        // The final pass scattered into the primary buffer; nowhere to recur.
        return Ok(());
    }

    let mut bucket_indices: Vec<usize> = (0..BUCKETS).filter(|&b| global.counts[b] != 0).collect();
    let spawn_degree = bucket_indices.len().min(threads);
    trace!(
        "depth {}: {} non-empty buckets over {} elements, spawn degree {}",
        depth,
        bucket_indices.len(),
        range_len,
        spawn_degree
    );

    // Largest buckets first so the greedy packer sees them while every group
    // is still open.
    quicksort_by(&mut bucket_indices, &|&bucket: &usize| {
        -(global.counts[bucket] as i64)
    });

    let mut group_budgets = vec![threads / spawn_degree; spawn_degree];
    for group in group_budgets.iter_mut().take(threads % spawn_degree) {
        *group += 1;
    }

    let groups = pack_buckets(&bucket_indices, &global, spawn_degree, range_len);

    let mut task_lists: Vec<(usize, Vec<Task>)> = group_budgets
        .into_iter()
        .zip(groups)
        .map(|(budget, buckets)| {
            let tasks = buckets
                .into_iter()
                .map(|bucket| Task {
                    depth: depth + 1,
                    from_index: start_map[bucket],
                    to_index: start_map[bucket] + global.counts[bucket],
                })
                .collect();
            (budget, tasks)
        })
        .collect();

    thread::scope(|scope| {
        let inline_group = task_lists.pop();
        let mut handles = Vec::with_capacity(task_lists.len());
        for (budget, tasks) in task_lists {
            handles.push(scope.spawn(move || unsafe { run_tasks(pair, budget, &tasks) }));
        }

        let mut result = match inline_group {
            Some((budget, tasks)) => unsafe { run_tasks(pair, budget, &tasks) },
            None => Ok(()),
        };

        // Join everything before surfacing the first failure; an unjoined
        // panicking worker would otherwise re-panic out of the scope.
        for handle in handles {
            let joined = handle.join().map_err(worker_failure).and_then(|r| r);
            if result.is_ok() {
                result = joined;
            }
        }
        result
    })
}

/// Sorts a worker's task list, recursing in parallel while its budget
/// allows and sequentially once it is down to one thread.
///
/// # Safety
///
/// Every task range must be owned exclusively by this worker.
unsafe fn run_tasks<T: RadixKey>(
    pair: BufferPair<T>,
    budget: usize,
    tasks: &[Task],
) -> Result<(), SortError> {
    for task in tasks {
        if budget > 1 {
            unsafe { parallel_radix(pair, budget, task.depth, task.from_index, task.to_index)? };
        } else {
            unsafe { sequential_radix(pair, task.depth, task.from_index, task.to_index) };
        }
    }
    Ok(())
}

/// Scatters one worker's slice into its precomputed destination slots.
///
/// # Safety
///
/// `processed` must be this worker's row of the processed-offset table for
/// the current pass; combined with `start_map` it keeps every write inside
/// the worker's disjoint portion of each bucket.
unsafe fn scatter_slice<T: RadixKey>(
    pair: BufferPair<T>,
    depth: usize,
    from_index: usize,
    to_index: usize,
    start_map: &[usize; BUCKETS],
    mut processed: [usize; BUCKETS],
) {
    let source = unsafe { pair.source(depth, from_index, to_index) };
    for element in source {
        let bucket = bucket_of(element.key(), depth);
        unsafe { pair.scatter_write(depth, start_map[bucket] + processed[bucket], *element) };
        processed[bucket] += 1;
    }
}

/// Builds the per-worker processed-offset table: `offsets[k][b]` is the
/// number of bucket-`b` elements held by workers left of `k`. Together with
/// the start index map this hands every (worker, bucket) pair a disjoint,
/// contiguous destination range ordered by worker index, which is what makes
/// the lock-free scatter stable.
fn processed_offsets(locals: &[Histogram]) -> Vec<[usize; BUCKETS]> {
    let mut offsets = Vec::with_capacity(locals.len());
    let mut running = [0usize; BUCKETS];
    for local in locals {
        offsets.push(running);
        for bucket in 0..BUCKETS {
            running[bucket] += local.counts[bucket];
        }
    }
    offsets
}

/// Greedy first-fit packing of size-ordered buckets into `spawn_degree`
/// groups of roughly `range_len / spawn_degree` elements each.
///
/// Optimal balancing is bin packing; one linear pass is close enough because
/// skew is bounded by at most 256 buckets per level. Trailing groups may
/// stay empty when a few huge buckets absorb everything.
fn pack_buckets(
    bucket_indices: &[usize],
    global: &Histogram,
    spawn_degree: usize,
    range_len: usize,
) -> Vec<Vec<usize>> {
    let optimal = range_len / spawn_degree;
    let mut groups: Vec<Vec<usize>> = Vec::new();
    groups.resize_with(spawn_degree, Vec::new);

    let mut group = 0;
    let mut packed = 0;
    for &bucket in bucket_indices {
        groups[group.min(spawn_degree - 1)].push(bucket);
        packed += global.counts[bucket];
        if packed >= optimal {
            packed = 0;
            group += 1;
        }
    }
    groups
}

fn worker_failure(panic: Box<dyn Any + Send>) -> SortError {
    let message = if let Some(text) = panic.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = panic.downcast_ref::<String>() {
        text.clone()
    } else {
        "worker panicked".to_string()
    };
    SortError::Worker(message)
}
