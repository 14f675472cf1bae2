//! Benchmarks for fiber merge operators
//!
//! Measures the two-pointer merges over random fibers of growing length,
//! with and without an active metrics session.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use fibertrace_core::{Fiber, RankAttrs};
use fibertrace_merge::{assign_from, intersect, union, union_all};
use fibertrace_metrics::Metrics;
use std::hint::black_box;

/// Random ordered fiber holding about `density * extent` entries
fn random_fiber(extent: usize, density: f64, seed: u64) -> Fiber<f64> {
    let mut seed = seed;
    let threshold = (density * 10000.0) as u64;
    let pairs = (0..extent).filter_map(|c| {
        seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
        (seed % 10000 < threshold).then(|| (c, (seed % 997) as f64 + 1.0))
    });
    Fiber::from_pairs(RankAttrs::new("K").shared(), pairs.collect::<Vec<_>>(), 0.0)
}

fn bench_intersect(c: &mut Criterion) {
    let mut group = c.benchmark_group("intersect");

    for extent in [1_000, 10_000, 100_000].iter() {
        let a = random_fiber(*extent, 0.1, 12345);
        let b = random_fiber(*extent, 0.1, 54321);
        group.throughput(Throughput::Elements((a.len() + b.len()) as u64));

        group.bench_with_input(BenchmarkId::new("plain", extent), extent, |bench, _| {
            let metrics = Metrics::new();
            bench.iter(|| {
                let dot: f64 = intersect(&metrics, &a, &b)
                    .unwrap()
                    .map(|(_, (x, y))| x * y)
                    .sum();
                black_box(dot)
            });
        });

        group.bench_with_input(BenchmarkId::new("collecting", extent), extent, |bench, _| {
            let metrics = Metrics::new();
            metrics.begin_collect("bench", &["K"]);
            bench.iter(|| black_box(intersect(&metrics, &a, &b).unwrap().count()));
        });
    }

    group.finish();
}

fn bench_union(c: &mut Criterion) {
    let mut group = c.benchmark_group("union");

    for extent in [1_000, 10_000, 100_000].iter() {
        let a = random_fiber(*extent, 0.05, 111);
        let b = random_fiber(*extent, 0.05, 222);
        let c3 = random_fiber(*extent, 0.05, 333);
        group.throughput(Throughput::Elements((a.len() + b.len()) as u64));

        group.bench_with_input(BenchmarkId::new("binary", extent), extent, |bench, _| {
            let metrics = Metrics::new();
            bench.iter(|| black_box(union(&metrics, &a, &b).unwrap().count()));
        });

        group.bench_with_input(BenchmarkId::new("three_way", extent), extent, |bench, _| {
            let metrics = Metrics::new();
            bench.iter(|| black_box(union_all(&metrics, vec![&a, &b, &c3]).unwrap().count()));
        });
    }

    group.finish();
}

fn bench_assign(c: &mut Criterion) {
    let mut group = c.benchmark_group("assign");

    for extent in [1_000, 10_000].iter() {
        let a = random_fiber(*extent, 0.1, 777);
        group.throughput(Throughput::Elements(a.len() as u64));

        group.bench_with_input(BenchmarkId::new("into_empty", extent), extent, |bench, _| {
            let metrics = Metrics::new();
            bench.iter(|| {
                let mut z = Fiber::empty(RankAttrs::new("K").shared(), 0.0);
                assign_from(&metrics, &mut z, &a)
                    .unwrap()
                    .for_each(|_, z, a| *z += **a);
                black_box(z.len())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_intersect, bench_union, bench_assign);
criterion_main!(benches);
