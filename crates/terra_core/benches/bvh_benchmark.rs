//! Benchmark for BVH construction and queries.
//!
//! Run with: cargo bench --package terra_core --bench bvh_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use terra_core::{Bounds2d, Bvh};

/// Grid of small boxes, similar to road segments in a city-sized region.
fn segment_grid(side: usize) -> Vec<Bounds2d> {
    let mut boxes = Vec::with_capacity(side * side);
    for z in 0..side {
        for x in 0..side {
            let fx = x as f64 * 8.0;
            let fz = z as f64 * 8.0;
            boxes.push(Bounds2d::of(fx, fx + 6.0, fz, fz + 3.0));
        }
    }
    boxes
}

fn benchmark_build(c: &mut Criterion) {
    let boxes = segment_grid(256);

    let mut group = c.benchmark_group("bvh_build");
    group.throughput(Throughput::Elements(boxes.len() as u64));
    group.bench_function("65536_boxes", |b| {
        b.iter(|| black_box(Bvh::new(boxes.clone())));
    });
    group.finish();
}

fn benchmark_column_query(c: &mut Criterion) {
    let bvh = Bvh::new(segment_grid(256));

    c.bench_function("column_query_16x16", |b| {
        let mut i = 0usize;
        b.iter(|| {
            i = (i + 1) % 128;
            let origin = (i * 16) as f64;
            let q = Bounds2d::of(origin, origin + 16.0, origin, origin + 16.0);
            black_box(bvh.get_all_intersecting(&q).len())
        });
    });
}

criterion_group!(benches, benchmark_build, benchmark_column_query);
criterion_main!(benches);
