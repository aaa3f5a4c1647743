//! Benchmark for vector rasterization onto columns.
//!
//! A busy city column sees a few hundred geometries; each must rasterize in
//! microseconds to keep column baking off the critical path.
//!
//! Run with: cargo bench --package terra_procedural --bench rasterize_benchmark

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use terra_procedural::{
    rasterize_column, BlockState, ColumnCoord, ColumnDataBuilder, DrawFunction, Point, Polygon, VectorGeometry,
};

/// A winding polyline of `points` vertices crossing column (0, 0).
fn river(points: usize) -> Vec<Point> {
    (0..points)
        .map(|i| {
            let t = i as f64 / (points - 1) as f64;
            Point::new(-32.0 + t * 80.0, 8.0 + (t * 12.0).sin() * 4.0)
        })
        .collect()
}

/// A regular `sides`-gon around the column center.
fn plaza(sides: usize, radius: f64) -> Polygon {
    let outer = (0..sides)
        .map(|i| {
            let a = i as f64 / sides as f64 * std::f64::consts::TAU;
            Point::new(8.0 + a.cos() * radius, 8.0 + a.sin() * radius)
        })
        .collect();
    Polygon {
        outer,
        inners: Vec::new(),
    }
}

fn benchmark_lines(c: &mut Criterion) {
    let coord = ColumnCoord::chunk(0, 0);
    let line = [river(200)];

    let wide = VectorGeometry::wide_line("river", 0.0, DrawFunction::Water, &line, 3.0);
    let narrow = VectorGeometry::narrow_line("stream", 0.0, DrawFunction::Water, &line);
    let sharp = VectorGeometry::sharp_line("rail", 0.0, DrawFunction::Block(BlockState::GRAVEL), &line);

    let mut group = c.benchmark_group("lines");
    group.throughput(Throughput::Elements(1));
    for (name, geometry) in [("wide_200_points", &wide), ("narrow_200_points", &narrow), ("sharp_200_points", &sharp)] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let mut builder = ColumnDataBuilder::new();
                geometry.apply(&mut builder, black_box(coord));
                black_box(builder)
            });
        });
    }
    group.finish();
}

fn benchmark_polygons(c: &mut Criterion) {
    let coord = ColumnCoord::chunk(0, 0);
    let polygons = [plaza(64, 7.0)];

    let fill = VectorGeometry::fill_polygon("plaza", 0.0, DrawFunction::Block(BlockState::CONCRETE), &polygons);
    let distance = VectorGeometry::distance_polygon("lake", 0.0, DrawFunction::Water, &polygons, 8.0);

    let mut group = c.benchmark_group("polygons");
    group.bench_function("fill_64_sides", |b| {
        b.iter(|| {
            let mut builder = ColumnDataBuilder::new();
            fill.apply(&mut builder, black_box(coord));
            black_box(builder)
        });
    });
    group.bench_function("distance_64_sides", |b| {
        b.iter(|| {
            let mut builder = ColumnDataBuilder::new();
            distance.apply(&mut builder, black_box(coord));
            black_box(builder)
        });
    });
    group.finish();
}

fn benchmark_busy_column(c: &mut Criterion) {
    let coord = ColumnCoord::chunk(0, 0);

    // 300 overlapping features in mixed styles
    let geometries: Vec<Arc<VectorGeometry>> = (0..300)
        .map(|i| {
            let layer = f64::from(i % 7);
            let id = format!("feature-{i}");
            if i % 2 == 0 {
                Arc::new(VectorGeometry::wide_line(id, layer, DrawFunction::Water, &[river(20)], 2.0))
            } else {
                Arc::new(VectorGeometry::fill_polygon(
                    id,
                    layer,
                    DrawFunction::Block(BlockState::STONE),
                    &[plaza(8, 3.0 + f64::from(i % 5))],
                ))
            }
        })
        .collect();

    let mut group = c.benchmark_group("column");
    group.throughput(Throughput::Elements(geometries.len() as u64));
    group.sample_size(20);
    group.bench_function("300_geometries", |b| {
        b.iter(|| {
            let mut builder = ColumnDataBuilder::new();
            rasterize_column(&geometries, &mut builder, black_box(coord));
            black_box(builder)
        });
    });
    group.finish();
}

criterion_group!(benches, benchmark_lines, benchmark_polygons, benchmark_busy_column);
criterion_main!(benches);
