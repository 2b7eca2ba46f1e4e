//! Criterion micro-benchmarks for k-nearest neighbour search and steering.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use flock_bench::FLOCK_CENTRE;
use flock_core::AgentRecord;
use flock_space::{GridLayout, NeighbourBuffer, NeighbourSearch, SpatialGrid, TransformCache};
use flock_steering::{integrate, BoundaryConfig};
use flock_test_utils::random_flock;

fn world(n: u64) -> (Vec<AgentRecord>, TransformCache, SpatialGrid) {
    let records = random_flock(n, 7, FLOCK_CENTRE, 40.0);
    let cache = TransformCache::from_records(&records);
    let grid = SpatialGrid::build(GridLayout::default(), &cache).unwrap();
    (records, cache, grid)
}

/// Benchmark: grid k-nearest for the first 1000 of 5K agents.
fn bench_k_nearest_grid(c: &mut Criterion) {
    let (records, cache, grid) = world(5_000);
    let search = NeighbourSearch::new(&grid, &cache);
    let mut buffer = NeighbourBuffer::with_capacity(32);

    c.bench_function("k_nearest_grid_1000_of_5k", |b| {
        b.iter(|| {
            for r in &records[..1000] {
                let (Some(t), Some(p)) = (&r.transform, &r.params) else {
                    continue;
                };
                black_box(search.k_nearest(r.id, t, p, &mut buffer));
            }
        });
    });
}

/// Benchmark: linear-scan k-nearest for the first 100 of 5K agents.
fn bench_k_nearest_linear(c: &mut Criterion) {
    let (records, cache, grid) = world(5_000);
    let search = NeighbourSearch::new(&grid, &cache);
    let mut buffer = NeighbourBuffer::with_capacity(32);

    c.bench_function("k_nearest_linear_100_of_5k", |b| {
        b.iter(|| {
            for r in &records[..100] {
                let (Some(t), Some(p)) = (&r.transform, &r.params) else {
                    continue;
                };
                black_box(search.k_nearest_linear(r.id, t, p, &mut buffer));
            }
        });
    });
}

/// Benchmark: search plus steering and integration for 1000 agents.
fn bench_search_and_integrate(c: &mut Criterion) {
    let (records, cache, grid) = world(5_000);
    let search = NeighbourSearch::new(&grid, &cache);
    let mut buffer = NeighbourBuffer::with_capacity(32);
    let boundary = BoundaryConfig::default();

    c.bench_function("search_and_integrate_1000", |b| {
        b.iter(|| {
            for r in &records[..1000] {
                let (Some(t), Some(p)) = (&r.transform, &r.params) else {
                    continue;
                };
                search.k_nearest(r.id, t, p, &mut buffer);
                black_box(integrate(t, p, buffer.as_slice(), &boundary, 0.125));
            }
        });
    });
}

criterion_group!(
    benches,
    bench_k_nearest_grid,
    bench_k_nearest_linear,
    bench_search_and_integrate
);
criterion_main!(benches);
