//! Polygon rasterizers.
//!
//! Membership is even-odd over every ring, which is exactly "inside the
//! outer ring and outside all holes" for well-formed polygons. Cells are
//! sampled at their centers.

use terra_core::{Bounds2d, Bvh};

use super::{CellFrame, Point, Segment};
use crate::column::{COLUMN_AREA, COLUMN_SIZE};

/// Marks the cells whose center lies inside the polygon.
fn interior_cells(edges: &Bvh<Segment>, polygon_bounds: &Bounds2d, frame: &CellFrame) -> [bool; COLUMN_AREA] {
    let mut inside = [false; COLUMN_AREA];
    let row_end = frame.center(COLUMN_SIZE - 1, 0).x;
    let mut crossings = Vec::new();

    for cz in 0..COLUMN_SIZE {
        let z = frame.center(0, cz).z;
        // Edges left of the column still count towards parity
        let scanline = Bounds2d::of(polygon_bounds.min_x(), row_end, z, z);

        crossings.clear();
        edges.for_each_intersecting(&scanline, |edge| {
            if (edge.a.z > z) != (edge.b.z > z) {
                crossings.push(edge.a.x + (z - edge.a.z) * (edge.b.x - edge.a.x) / (edge.b.z - edge.a.z));
            }
        });
        if crossings.is_empty() {
            continue;
        }
        crossings.sort_by(f64::total_cmp);

        for cx in 0..COLUMN_SIZE {
            let x = frame.center(cx, cz).x;
            if crossings.partition_point(|&c| c < x) % 2 == 1 {
                inside[cz * COLUMN_SIZE + cx] = true;
            }
        }
    }
    inside
}

/// Draws weight 1 on every interior cell.
pub(super) fn rasterize_fill<F>(edges: &Bvh<Segment>, polygon_bounds: &Bounds2d, frame: &CellFrame, emit: &mut F)
where
    F: FnMut(usize, usize, i32),
{
    let inside = interior_cells(edges, polygon_bounds, frame);
    for (i, &is_inside) in inside.iter().enumerate() {
        if is_inside {
            emit(i % COLUMN_SIZE, i / COLUMN_SIZE, 1);
        }
    }
}

/// Distance from `p` to the nearest edge, capped at `max_distance`.
fn edge_distance(edges: &Bvh<Segment>, p: Point, max_distance: f64) -> f64 {
    let mut nearest = max_distance;
    edges.for_each_intersecting(&Bounds2d::point(p.x, p.z).expand(max_distance), |edge| {
        nearest = nearest.min(edge.distance_to(p));
    });
    nearest
}

/// Draws interior cells weighted by their distance to the edge.
pub(super) fn rasterize_distance<F>(
    edges: &Bvh<Segment>,
    polygon_bounds: &Bounds2d,
    frame: &CellFrame,
    max_distance: f64,
    emit: &mut F,
) where
    F: FnMut(usize, usize, i32),
{
    let inside = interior_cells(edges, polygon_bounds, frame);
    for (i, &is_inside) in inside.iter().enumerate() {
        if !is_inside {
            continue;
        }
        let (cx, cz) = (i % COLUMN_SIZE, i / COLUMN_SIZE);
        let distance = edge_distance(edges, frame.center(cx, cz), max_distance);
        #[allow(clippy::cast_possible_truncation)]
        emit(cx, cz, distance.floor() as i32);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnCoord;
    use crate::geometry::{ring_edges, Polygon};

    fn square(min: f64, max: f64) -> Vec<Point> {
        vec![
            Point::new(min, min),
            Point::new(max, min),
            Point::new(max, max),
            Point::new(min, max),
        ]
    }

    #[test]
    fn test_hole_is_excluded() {
        let edges = Bvh::new(ring_edges(&[Polygon {
            outer: square(0.0, 16.0),
            inners: vec![square(4.0, 12.0)],
        }]));
        let bounds = edges.bounds().unwrap();
        let inside = interior_cells(&edges, &bounds, &CellFrame::new(ColumnCoord::chunk(0, 0)));

        assert!(inside[0], "corner cell is inside the outer ring");
        assert!(!inside[8 * COLUMN_SIZE + 8], "center cell is in the hole");
        assert_eq!(inside.iter().filter(|&&c| c).count(), 256 - 64);
    }

    #[test]
    fn test_polygon_left_of_column_counts() {
        // The column is deep inside a large polygon with no edge nearby
        let edges = Bvh::new(ring_edges(&[Polygon {
            outer: square(-1000.0, 1000.0),
            inners: Vec::new(),
        }]));
        let bounds = edges.bounds().unwrap();
        let inside = interior_cells(&edges, &bounds, &CellFrame::new(ColumnCoord::chunk(3, 3)));
        assert!(inside.iter().all(|&c| c));
    }

    #[test]
    fn test_edge_distance_is_capped() {
        let edges = Bvh::new(ring_edges(&[Polygon {
            outer: square(0.0, 100.0),
            inners: Vec::new(),
        }]));
        assert_eq!(edge_distance(&edges, Point::new(2.5, 50.0), 8.0), 2.5);
        assert_eq!(edge_distance(&edges, Point::new(50.0, 50.0), 8.0), 8.0);
    }
}
