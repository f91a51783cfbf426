use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use msdsort::prelude::*;
use rand::Rng;
use std::hint::black_box;

fn bench_random_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("1M Random Keys");
    group.sample_size(10);

    // Dataset generation
    let mut rng = rand::rng();
    let count = 1_000_000;

    let random_keys: Vec<i64> = (0..count).map(|_| rng.random()).collect();

    // Sequential radix
    group.bench_function("msdsort::sort", |b| {
        b.iter_batched(
            || random_keys.clone(),
            |mut data| sort(black_box(&mut data), 0, count).unwrap(),
            BatchSize::LargeInput,
        )
    });

    // Parallel radix
    group.bench_function("msdsort::parallel_sort", |b| {
        b.iter_batched(
            || random_keys.clone(),
            |mut data| parallel_sort(black_box(&mut data), 0, count).unwrap(),
            BatchSize::LargeInput,
        )
    });

    // Std Sort Unstable (pdqsort)
    group.bench_function("slice::sort_unstable", |b| {
        b.iter_batched(
            || random_keys.clone(),
            |mut data| data.sort_unstable(),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn bench_duplicate_heavy(c: &mut Criterion) {
    let mut group = c.benchmark_group("1M Duplicate-Heavy Keys");
    group.sample_size(10);

    // 64 distinct keys; every radix pass collapses into a handful of buckets.
    let mut rng = rand::rng();
    let count = 1_000_000;

    let input: Vec<i64> = (0..count)
        .map(|_| rng.random_range(-32..32) * 0x0101_0101_0101)
        .collect();

    group.bench_function("msdsort::parallel_sort", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| parallel_sort(black_box(&mut data), 0, count).unwrap(),
            BatchSize::LargeInput,
        )
    });

    group.bench_function("slice::sort_unstable", |b| {
        b.iter_batched(
            || input.clone(),
            |mut data| data.sort_unstable(),
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(benches, bench_random_keys, bench_duplicate_heavy);
criterion_main!(benches);
