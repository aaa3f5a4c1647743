//! Line rasterizers.

use terra_core::{Bounded, Bounds2d, Bvh};

use super::{CellFrame, Point, Segment};
use crate::column::{COLUMN_AREA, COLUMN_SIZE};

/// Smallest X extent a segment is treated as having.
const MIN_DELTA_X: f64 = 0.01;

#[allow(clippy::cast_precision_loss)]
const COLUMN_EDGE: f64 = COLUMN_SIZE as f64;

/// Draws every cell the segment passes through, column by column.
pub(super) fn rasterize_narrow<F>(segments: &Bvh<Segment>, column: &Bounds2d, frame: &CellFrame, emit: &mut F)
where
    F: FnMut(usize, usize, i32),
{
    segments.for_each_intersecting(column, |segment| {
        narrow_segment(frame.to_local(segment.a), frame.to_local(segment.b), emit);
    });
}

fn narrow_segment<F>(a: (f64, f64), b: (f64, f64), emit: &mut F)
where
    F: FnMut(usize, usize, i32),
{
    let ((x0, z0), (mut x1, z1)) = if a.0 <= b.0 { (a, b) } else { (b, a) };
    if x1 - x0 < MIN_DELTA_X {
        x1 = x0 + MIN_DELTA_X;
    }
    if x1 < 0.0 || x0 >= COLUMN_EDGE {
        return;
    }
    let slope = (z1 - z0) / (x1 - x0);

    let first = x0.floor().max(0.0);
    let last = x1.floor().min(COLUMN_EDGE - 1.0);
    let mut x = first;
    while x <= last {
        let xa = x.max(x0);
        let xb = (x + 1.0).min(x1);
        let za = z0 + (xa - x0) * slope;
        let zb = z0 + (xb - x0) * slope;

        let z_lo = za.min(zb).floor();
        let z_hi = za.max(zb).ceil().max(z_lo + 1.0);

        let z_from = z_lo.max(0.0);
        let z_to = z_hi.min(COLUMN_EDGE);
        if z_from < z_to {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let (cx, from, to) = (x as usize, z_from as usize, z_to as usize);
            for cz in from..to {
                emit(cx, cz, 1);
            }
        }
        x += 1.0;
    }
}

/// Draws a single-cell-wide line by stepping along the major axis.
pub(super) fn rasterize_sharp<F>(segments: &Bvh<Segment>, column: &Bounds2d, frame: &CellFrame, emit: &mut F)
where
    F: FnMut(usize, usize, i32),
{
    segments.for_each_intersecting(column, |segment| {
        let (a, b) = (frame.to_local(segment.a), frame.to_local(segment.b));
        if let Some(range) = clip_to_column(a, b) {
            sharp_segment(a, b, range, emit);
        }
    });
}

/// Steps the whole segment `a`-`b` but only samples the steps whose
/// parameter falls in `range`, so every column sees the same lattice.
fn sharp_segment<F>(a: (f64, f64), b: (f64, f64), range: (f64, f64), emit: &mut F)
where
    F: FnMut(usize, usize, i32),
{
    let (dx, dz) = (b.0 - a.0, b.1 - a.1);
    let steps = dx.abs().max(dz.abs()).ceil().max(1.0);
    let first = (range.0 * steps).floor().max(0.0);
    let last = (range.1 * steps).ceil().min(steps);

    let mut previous = None;
    let mut i = first;
    while i <= last {
        let t = i / steps;
        let cell = ((a.0 + dx * t).floor(), (a.1 + dz * t).floor());
        if previous != Some(cell) && (0.0..COLUMN_EDGE).contains(&cell.0) && (0.0..COLUMN_EDGE).contains(&cell.1) {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            emit(cell.0 as usize, cell.1 as usize, 1);
        }
        previous = Some(cell);
        i += 1.0;
    }
}

/// Parameter range of a local-space segment inside the column plus a
/// one-cell margin (Liang-Barsky).
fn clip_to_column(a: (f64, f64), b: (f64, f64)) -> Option<(f64, f64)> {
    let (min, max) = (-1.0, COLUMN_EDGE + 1.0);
    let (dx, dz) = (b.0 - a.0, b.1 - a.1);
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    for (p, q) in [(-dx, a.0 - min), (dx, max - a.0), (-dz, a.1 - min), (dz, max - a.1)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }

    if t0 > t1 {
        return None;
    }
    Some((t0, t1))
}

/// Weight a wide line of `radius` draws at world point `p`, if any.
///
/// The weight is `floor(radius - d)` where `d` is the distance from `p` to
/// the segment `a`-`b`; points at `radius` or farther draw nothing.
#[must_use]
pub fn wide_line_weight(a: Point, b: Point, radius: f64, p: Point) -> Option<i32> {
    let (dx, dz) = (b.x - a.x, b.z - a.z);
    let len2 = dx * dx + dz * dz;
    let r = if len2 > 0.0 {
        (((p.x - a.x) * dx + (p.z - a.z) * dz) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (ex, ez) = (p.x - (a.x + r * dx), p.z - (a.z + r * dz));
    let distance2 = ex * ex + ez * ez;

    if distance2 < radius * radius {
        #[allow(clippy::cast_possible_truncation)]
        Some((radius - distance2.sqrt()).floor() as i32)
    } else {
        None
    }
}

/// Draws cells near the line with a linear falloff. A cell touched by
/// several segments keeps its largest weight.
pub(super) fn rasterize_wide<F>(
    segments: &Bvh<Segment>,
    column: &Bounds2d,
    frame: &CellFrame,
    radius: f64,
    emit: &mut F,
) where
    F: FnMut(usize, usize, i32),
{
    let mut weights: [Option<i32>; COLUMN_AREA] = [None; COLUMN_AREA];

    segments.for_each_intersecting(&column.expand(radius), |segment| {
        let reach = segment.bounds().expand(radius);
        let (Some((x_first, x_last)), Some((z_first, z_last))) = (
            frame.corner_range(reach.min_x(), reach.max_x(), true),
            frame.corner_range(reach.min_z(), reach.max_z(), false),
        ) else {
            return;
        };

        for cz in z_first..=z_last {
            for cx in x_first..=x_last {
                if let Some(weight) = wide_line_weight(segment.a, segment.b, radius, frame.corner(cx, cz)) {
                    let cell = &mut weights[cz * COLUMN_SIZE + cx];
                    *cell = Some(cell.map_or(weight, |w| w.max(weight)));
                }
            }
        }
    });

    for (i, weight) in weights.iter().enumerate() {
        if let Some(weight) = *weight {
            emit(i % COLUMN_SIZE, i / COLUMN_SIZE, weight);
        }
    }
}
