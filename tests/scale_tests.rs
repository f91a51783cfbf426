use msdsort::prelude::*;
use rand::Rng;
use std::time::Instant;

#[test]
fn test_sort_1m() {
    let count = 1_000_000;
    println!("Generating {} random keys...", count);

    let mut rng = rand::rng();
    let input: Vec<i64> = (0..count).map(|_| rng.random()).collect();

    let mut expected = input.clone();
    expected.sort_unstable();

    println!("Sorting {} keys sequentially...", count);
    let start = Instant::now();
    let mut sequential = input.clone();
    sort(&mut sequential, 0, count).unwrap();
    println!("Sequential sort took {:?}", start.elapsed());
    assert_eq!(sequential, expected);

    println!("Sorting {} keys in parallel...", count);
    let start = Instant::now();
    let mut parallel = input.clone();
    parallel_sort(&mut parallel, 0, count).unwrap();
    println!("Parallel sort took {:?}", start.elapsed());
    assert_eq!(parallel, expected);
}

#[test]
fn test_sort_1m_entries() {
    let count = 1_000_000;
    let mut rng = rand::rng();

    // Narrow key domain so stability actually matters at this scale.
    let mut entries: Vec<Entry<usize>> = (0..count)
        .map(|i| Entry::new(rng.random_range(-1024..1024), i))
        .collect();

    let start = Instant::now();
    parallel_sort(&mut entries, 0, count).unwrap();
    println!("Sorted 1M entries in {:?}", start.elapsed());

    for window in entries.windows(2) {
        assert!(window[0].key <= window[1].key, "keys out of order");
        if window[0].key == window[1].key {
            assert!(window[0].value < window[1].value, "stability violated");
        }
    }
}

#[test]
#[ignore]
fn test_sort_100m() {
    // WARNING: needs ~2.4GB of RAM (input + expected copy + auxiliary
    // buffer, 800MB each).
    let count = 100_000_000;
    println!("Generating {} random keys...", count);

    let mut rng = rand::rng();
    let input: Vec<i64> = (0..count).map(|_| rng.random()).collect();

    let mut expected = input.clone();
    let start = Instant::now();
    expected.sort_unstable();
    println!("slice::sort_unstable took {:?}", start.elapsed());

    let mut parallel = input;
    let start = Instant::now();
    parallel_sort(&mut parallel, 0, count).unwrap();
    println!("Parallel sort took {:?}", start.elapsed());

    assert_eq!(parallel, expected);
}
