use msdsort::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// Duplicate-heavy keys over random sub-ranges and forced thread budgets.
// Narrow key domains concentrate entire sub-ranges into a single bucket per
// digit, which is the distribution most likely to expose planner or
// parity mistakes.
#[test]
fn test_duplicate_heavy_subranges() {
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..10 {
        let count = rng.random_range(5_000..40_000);
        let input: Vec<i64> = (0..count)
            .map(|_| rng.random_range(-3..3) * 1_000_000_007)
            .collect();

        let from_index = rng.random_range(0..=count / 2);
        let to_index = rng.random_range(from_index..=count);

        let mut expected = input.clone();
        expected[from_index..to_index].sort_unstable();

        for threads in [1, 2, 5] {
            let mut actual = input.clone();
            parallel_sort_with_threads(&mut actual, from_index, to_index, threads).unwrap();
            assert_eq!(
                actual, expected,
                "threads {}, range {}..{}",
                threads, from_index, to_index
            );
        }
    }
}

// Keys sharing all but the lowest byte push the recursion to the final
// digit with a single bucket at every level in between.
#[test]
fn test_single_bucket_chain_to_last_digit() {
    let mut rng = StdRng::seed_from_u64(7);
    let count = 30_000;

    let base = 0x1122_3344_5566_7700_u64 as i64;
    let input: Vec<i64> = (0..count)
        .map(|_| base | rng.random_range(0..256))
        .collect();

    let mut expected = input.clone();
    expected.sort_unstable();

    let mut actual = input.clone();
    parallel_sort_with_threads(&mut actual, 0, count, 4).unwrap();
    assert_eq!(actual, expected);
}

#[test]
fn test_entry_stability_under_seeded_shuffle() {
    let mut rng = StdRng::seed_from_u64(0xBEEF);
    let count = 8_192;

    let mut entries: Vec<Entry<u32>> = (0..count)
        .map(|i| Entry::new(rng.random_range(0..4), i as u32))
        .collect();

    parallel_sort_with_threads(&mut entries, 0, count, 3).unwrap();

    for window in entries.windows(2) {
        assert!(window[0].key <= window[1].key);
        if window[0].key == window[1].key {
            assert!(window[0].value < window[1].value);
        }
    }
}
