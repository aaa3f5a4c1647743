//! # Vector Geometry
//!
//! Line and polygon features (roads, rivers, buildings, lakes...) in world
//! block coordinates, rasterized onto columns.
//!
//! Each geometry owns a BVH of its own segments (for polygons: ring edges)
//! so a column only visits the part of a long river or coastline near it.
//!
//! ## Styles
//!
//! | Style             | Cells drawn                          | Weight                 |
//! |-------------------|--------------------------------------|------------------------|
//! | `NarrowLine`      | every cell the line passes through   | 1                      |
//! | `SharpLine`       | one cell per step along the major axis | 1                    |
//! | `WideLine`        | cells within `radius` of the line    | `floor(radius - dist)` |
//! | `FillPolygon`     | cells whose center is inside         | 1                      |
//! | `DistancePolygon` | cells whose center is inside         | `floor(min(dist to edge, max))` |
//!
//! ## Draw Order
//!
//! Overlapping geometries are applied by ascending `layer`, ties broken by
//! `id`, so the same inputs always paint the same column.

pub mod draw;
mod line;
mod polygon;

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;

use terra_core::{Bounded, Bounds2d, Bvh};

use crate::column::{ColumnCoord, ColumnDataBuilder};

pub use draw::DrawFunction;
pub use line::wide_line_weight;

/// A point in world block coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    /// World X.
    pub x: f64,
    /// World Z.
    pub z: f64,
}

impl Point {
    /// Creates a point.
    #[inline]
    #[must_use]
    pub const fn new(x: f64, z: f64) -> Self {
        Self { x, z }
    }
}

/// A line segment; also used for polygon ring edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Start.
    pub a: Point,
    /// End.
    pub b: Point,
}

impl Segment {
    /// Creates a segment.
    #[inline]
    #[must_use]
    pub const fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Distance from `p` to the closest point of the segment.
    #[must_use]
    pub fn distance_to(&self, p: Point) -> f64 {
        let (dx, dz) = (self.b.x - self.a.x, self.b.z - self.a.z);
        let len2 = dx * dx + dz * dz;
        let r = if len2 > 0.0 {
            (((p.x - self.a.x) * dx + (p.z - self.a.z) * dz) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (qx, qz) = (self.a.x + r * dx, self.a.z + r * dz);
        (p.x - qx).hypot(p.z - qz)
    }
}

impl Bounded for Segment {
    fn bounds(&self) -> Bounds2d {
        Bounds2d::of(self.a.x, self.b.x, self.a.z, self.b.z)
    }
}

/// A polygon: one outer ring minus any number of holes.
///
/// Rings are closed implicitly; repeating the first point is allowed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    /// Outer boundary.
    pub outer: Vec<Point>,
    /// Holes.
    pub inners: Vec<Vec<Point>>,
}

/// Several polylines forming one feature.
pub type MultiLineString = Vec<Vec<Point>>;

/// Several polygons forming one feature.
pub type MultiPolygon = Vec<Polygon>;

/// How a geometry is rasterized.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum GeometryStyle {
    /// Every cell the line touches.
    NarrowLine,
    /// A single-cell-wide line.
    SharpLine,
    /// A line with width and linear falloff.
    WideLine {
        /// Half-width in blocks.
        radius: f64,
    },
    /// Polygon interior.
    FillPolygon,
    /// Polygon interior with a feathered border.
    DistancePolygon {
        /// Distance from the edge at which the weight stops growing.
        max_distance: f64,
    },
}

/// One vector feature with its draw order and draw function.
#[derive(Clone, Debug)]
pub struct VectorGeometry {
    id: String,
    layer: f64,
    draw: DrawFunction,
    style: GeometryStyle,
    segments: Bvh<Segment>,
    bounds: Bounds2d,
}

impl VectorGeometry {
    fn from_segments(
        id: impl Into<String>,
        layer: f64,
        draw: DrawFunction,
        style: GeometryStyle,
        segments: Vec<Segment>,
    ) -> Self {
        let segments = Bvh::new(segments);
        let base = segments.bounds().unwrap_or_else(|| Bounds2d::point(0.0, 0.0));
        let bounds = match style {
            GeometryStyle::WideLine { radius } => base.expand(radius),
            _ => base,
        };
        Self {
            id: id.into(),
            layer,
            draw,
            style,
            segments,
            bounds,
        }
    }

    /// A line drawn through every cell it passes.
    pub fn narrow_line(id: impl Into<String>, layer: f64, draw: DrawFunction, lines: &[Vec<Point>]) -> Self {
        Self::from_segments(id, layer, draw, GeometryStyle::NarrowLine, line_segments(lines))
    }

    /// A single-cell-wide line.
    pub fn sharp_line(id: impl Into<String>, layer: f64, draw: DrawFunction, lines: &[Vec<Point>]) -> Self {
        Self::from_segments(id, layer, draw, GeometryStyle::SharpLine, line_segments(lines))
    }

    /// A line `2 * radius` blocks wide whose weight falls off from the center.
    pub fn wide_line(
        id: impl Into<String>,
        layer: f64,
        draw: DrawFunction,
        lines: &[Vec<Point>],
        radius: f64,
    ) -> Self {
        Self::from_segments(id, layer, draw, GeometryStyle::WideLine { radius }, line_segments(lines))
    }

    /// A filled polygon.
    pub fn fill_polygon(id: impl Into<String>, layer: f64, draw: DrawFunction, polygons: &[Polygon]) -> Self {
        Self::from_segments(id, layer, draw, GeometryStyle::FillPolygon, ring_edges(polygons))
    }

    /// A filled polygon weighted by distance to its edge, up to `max_distance`.
    pub fn distance_polygon(
        id: impl Into<String>,
        layer: f64,
        draw: DrawFunction,
        polygons: &[Polygon],
        max_distance: f64,
    ) -> Self {
        Self::from_segments(
            id,
            layer,
            draw,
            GeometryStyle::DistancePolygon { max_distance },
            ring_edges(polygons),
        )
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Draw order key.
    #[must_use]
    pub const fn layer(&self) -> f64 {
        self.layer
    }

    /// Rasterization style.
    #[must_use]
    pub const fn style(&self) -> GeometryStyle {
        self.style
    }

    /// Draw function applied to every rasterized cell.
    #[must_use]
    pub const fn draw_function(&self) -> &DrawFunction {
        &self.draw
    }

    /// Rasterizes this geometry onto the column at `coord`.
    pub fn apply(&self, builder: &mut ColumnDataBuilder, coord: ColumnCoord) {
        let column = coord.bounds();
        if !self.bounds.intersects(&column) {
            return;
        }

        let frame = CellFrame::new(coord);
        let draw = &self.draw;
        let mut emit = |x: usize, z: usize, weight: i32| draw.draw_onto(builder, x, z, weight);

        match self.style {
            GeometryStyle::NarrowLine => line::rasterize_narrow(&self.segments, &column, &frame, &mut emit),
            GeometryStyle::SharpLine => line::rasterize_sharp(&self.segments, &column, &frame, &mut emit),
            GeometryStyle::WideLine { radius } => {
                line::rasterize_wide(&self.segments, &column, &frame, radius, &mut emit);
            }
            GeometryStyle::FillPolygon => {
                polygon::rasterize_fill(&self.segments, &self.bounds, &frame, &mut emit);
            }
            GeometryStyle::DistancePolygon { max_distance } => {
                polygon::rasterize_distance(&self.segments, &self.bounds, &frame, max_distance, &mut emit);
            }
        }
    }
}

impl Bounded for VectorGeometry {
    fn bounds(&self) -> Bounds2d {
        self.bounds
    }
}

fn line_segments(lines: &[Vec<Point>]) -> Vec<Segment> {
    let mut out = Vec::new();
    for line in lines {
        match line.as_slice() {
            [] => {}
            [single] => out.push(Segment::new(*single, *single)),
            points => out.extend(points.windows(2).map(|w| Segment::new(w[0], w[1]))),
        }
    }
    out
}

fn ring_edges(polygons: &[Polygon]) -> Vec<Segment> {
    let mut out = Vec::new();
    for polygon in polygons {
        for ring in std::iter::once(&polygon.outer).chain(&polygon.inners) {
            for (i, &a) in ring.iter().enumerate() {
                let b = ring[(i + 1) % ring.len()];
                // Zero-length edges, including an explicit closing point
                if a != b {
                    out.push(Segment::new(a, b));
                }
            }
        }
    }
    out
}

/// Maps between world blocks and the cells of one column.
#[derive(Clone, Copy, Debug)]
pub(crate) struct CellFrame {
    origin_x: f64,
    origin_z: f64,
    step: f64,
}

impl CellFrame {
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn new(coord: ColumnCoord) -> Self {
        Self {
            origin_x: coord.world_x() as f64,
            origin_z: coord.world_z() as f64,
            step: coord.cell_step() as f64,
        }
    }

    /// `p` in cell units relative to the column origin.
    pub(crate) fn to_local(self, p: Point) -> (f64, f64) {
        ((p.x - self.origin_x) / self.step, (p.z - self.origin_z) / self.step)
    }

    /// World position of the corner of cell `(x, z)`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn corner(self, x: usize, z: usize) -> Point {
        Point::new(
            self.origin_x + x as f64 * self.step,
            self.origin_z + z as f64 * self.step,
        )
    }

    /// World position of the center of cell `(x, z)`.
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn center(self, x: usize, z: usize) -> Point {
        Point::new(
            self.origin_x + (x as f64 + 0.5) * self.step,
            self.origin_z + (z as f64 + 0.5) * self.step,
        )
    }

    /// Cell index range `[first, last]` whose corners lie in `[min, max]`
    /// world blocks on one axis, clipped to the column.
    pub(crate) fn corner_range(self, min: f64, max: f64, x_axis: bool) -> Option<(usize, usize)> {
        let origin = if x_axis { self.origin_x } else { self.origin_z };
        let first = ((min - origin) / self.step).ceil().max(0.0);
        let last = ((max - origin) / self.step).floor().min(15.0);
        if first > last || first.is_nan() || last.is_nan() {
            return None;
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Some((first as usize, last as usize))
    }
}

/// Orders geometries by `(layer, id)`.
struct DrawOrder<'a>(&'a Arc<VectorGeometry>);

impl PartialEq for DrawOrder<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DrawOrder<'_> {}

impl PartialOrd for DrawOrder<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DrawOrder<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .layer
            .total_cmp(&other.0.layer)
            .then_with(|| self.0.id.cmp(&other.0.id))
    }
}

/// Applies `geometries` to the column in draw order.
///
/// Geometries with the same `(layer, id)` are drawn once, so features
/// repeated across neighbouring regions do not double up.
pub fn rasterize_column<'a, I>(geometries: I, builder: &mut ColumnDataBuilder, coord: ColumnCoord)
where
    I: IntoIterator<Item = &'a Arc<VectorGeometry>>,
{
    let ordered: BTreeSet<DrawOrder<'a>> = geometries.into_iter().map(DrawOrder).collect();
    for DrawOrder(geometry) in ordered {
        tracing::trace!(column = %coord, id = %geometry.id, layer = geometry.layer, "rasterizing geometry");
        geometry.apply(builder, coord);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_distance() {
        let s = Segment::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(s.distance_to(Point::new(5.0, 3.0)), 3.0);
        assert_eq!(s.distance_to(Point::new(-3.0, 4.0)), 5.0);
        let degenerate = Segment::new(Point::new(1.0, 1.0), Point::new(1.0, 1.0));
        assert_eq!(degenerate.distance_to(Point::new(4.0, 5.0)), 5.0);
    }

    #[test]
    fn test_wide_line_bounds_expanded() {
        let line = VectorGeometry::wide_line(
            "road",
            0.0,
            DrawFunction::Water,
            &[vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)]],
            2.0,
        );
        assert_eq!(line.bounds(), Bounds2d::of(-2.0, 12.0, -2.0, 2.0));
    }

    #[test]
    fn test_ring_edges_close_rings() {
        let square = vec![
            Point::new(0.0, 0.0),
            Point::new(4.0, 0.0),
            Point::new(4.0, 4.0),
            Point::new(0.0, 4.0),
        ];
        let open = ring_edges(&[Polygon {
            outer: square.clone(),
            inners: Vec::new(),
        }]);
        let mut closed_ring = square;
        closed_ring.push(Point::new(0.0, 0.0));
        let closed = ring_edges(&[Polygon {
            outer: closed_ring,
            inners: Vec::new(),
        }]);
        assert_eq!(open.len(), 4);
        assert_eq!(closed.len(), 4, "an explicit closing point adds no edge");
    }

    #[test]
    fn test_cell_frame() {
        let frame = CellFrame::new(ColumnCoord::new(1, -1, 1));
        assert_eq!(frame.to_local(Point::new(34.0, -31.0)), (1.0, 0.5));
        assert_eq!(frame.corner(1, 1), Point::new(34.0, -30.0));
        assert_eq!(frame.center(0, 0), Point::new(33.0, -31.0));
        assert_eq!(frame.corner_range(35.0, 1000.0, true), Some((2, 15)));
        assert_eq!(frame.corner_range(0.0, 10.0, true), None);
    }
}
