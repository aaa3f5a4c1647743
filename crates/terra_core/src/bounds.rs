//! # Axis-Aligned Bounds
//!
//! `Bounds2d` is the box type every spatial query in TERRA is expressed in.
//! Coordinates live on the horizontal X/Z plane; Y never appears here.
//!
//! All comparisons are closed: two boxes that share only an edge intersect.

use crate::error::{CoreError, CoreResult};

/// Axis-aligned bounding box on the X/Z plane.
///
/// Invariant: `min_x <= max_x` and `min_z <= max_z`. Infinite extents are
/// allowed so a box can mean "everywhere".
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds2d {
    min_x: f64,
    max_x: f64,
    min_z: f64,
    max_z: f64,
}

impl Bounds2d {
    /// A box covering the entire plane.
    pub const EVERYTHING: Self = Self {
        min_x: f64::NEG_INFINITY,
        max_x: f64::INFINITY,
        min_z: f64::NEG_INFINITY,
        max_z: f64::INFINITY,
    };

    /// Creates a box from explicit minimum and maximum coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidBounds`] if `min > max` on either axis or
    /// any coordinate is NaN.
    pub fn new(min_x: f64, max_x: f64, min_z: f64, max_z: f64) -> CoreResult<Self> {
        // NaN fails both comparisons, so it is rejected here as well
        if min_x <= max_x && min_z <= max_z {
            Ok(Self { min_x, max_x, min_z, max_z })
        } else {
            Err(CoreError::InvalidBounds { min_x, max_x, min_z, max_z })
        }
    }

    /// Creates a box spanning two arbitrary values per axis, in any order.
    #[inline]
    #[must_use]
    pub fn of(x0: f64, x1: f64, z0: f64, z1: f64) -> Self {
        Self {
            min_x: x0.min(x1),
            max_x: x0.max(x1),
            min_z: z0.min(z1),
            max_z: z0.max(z1),
        }
    }

    /// Creates a degenerate box around a single point.
    #[inline]
    #[must_use]
    pub const fn point(x: f64, z: f64) -> Self {
        Self { min_x: x, max_x: x, min_z: z, max_z: z }
    }

    /// Minimum X coordinate.
    #[inline]
    #[must_use]
    pub const fn min_x(&self) -> f64 {
        self.min_x
    }

    /// Maximum X coordinate.
    #[inline]
    #[must_use]
    pub const fn max_x(&self) -> f64 {
        self.max_x
    }

    /// Minimum Z coordinate.
    #[inline]
    #[must_use]
    pub const fn min_z(&self) -> f64 {
        self.min_z
    }

    /// Maximum Z coordinate.
    #[inline]
    #[must_use]
    pub const fn max_z(&self) -> f64 {
        self.max_z
    }

    /// Extent along X.
    #[inline]
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Extent along Z.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// Center point as `(x, z)`.
    #[inline]
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) * 0.5, (self.min_z + self.max_z) * 0.5)
    }

    /// Returns true if the two boxes overlap or touch.
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_z <= other.max_z
            && self.max_z >= other.min_z
    }

    /// Returns true if `other` lies entirely within this box.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_z <= other.min_z
            && self.max_z >= other.max_z
    }

    /// Returns true if the point lies within this box.
    #[inline]
    #[must_use]
    pub fn contains_point(&self, x: f64, z: f64) -> bool {
        self.min_x <= x && self.max_x >= x && self.min_z <= z && self.max_z >= z
    }

    /// Smallest box containing both boxes.
    #[inline]
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_z: self.min_z.min(other.min_z),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// Overlapping region of both boxes, if any.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if self.intersects(other) {
            Some(Self {
                min_x: self.min_x.max(other.min_x),
                max_x: self.max_x.min(other.max_x),
                min_z: self.min_z.max(other.min_z),
                max_z: self.max_z.min(other.max_z),
            })
        } else {
            None
        }
    }

    /// Grows the box by `amount` on every side.
    ///
    /// A negative amount shrinks it; an axis that would invert collapses to
    /// its center instead.
    #[must_use]
    pub fn expand(&self, amount: f64) -> Self {
        let (cx, cz) = self.center();
        let (min_x, max_x) = if self.width() + 2.0 * amount >= 0.0 {
            (self.min_x - amount, self.max_x + amount)
        } else {
            (cx, cx)
        };
        let (min_z, max_z) = if self.depth() + 2.0 * amount >= 0.0 {
            (self.min_z - amount, self.max_z + amount)
        } else {
            (cz, cz)
        };
        Self { min_x, max_x, min_z, max_z }
    }

    /// Integer coordinates of every `tile_size` square tile this box touches.
    ///
    /// Tile `(tx, tz)` covers `[tx * tile_size, (tx + 1) * tile_size)` on X
    /// (likewise Z). The range is `floor(min / size) .. ceil(max / size)`,
    /// widened to at least one tile per axis so a box lying exactly on a tile
    /// edge still maps to the tile it starts in. Tiles are returned in
    /// row-major order (Z outer, X inner).
    ///
    /// Infinite boxes are not tileable and yield nothing.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_tiles(&self, tile_size: f64) -> Vec<(i32, i32)> {
        let Some((x0, x1)) = tile_range(self.min_x, self.max_x, tile_size) else {
            return Vec::new();
        };
        let Some((z0, z1)) = tile_range(self.min_z, self.max_z, tile_size) else {
            return Vec::new();
        };

        let mut tiles = Vec::with_capacity(((x1 - x0) * (z1 - z0)).max(0) as usize);
        for tz in z0..z1 {
            for tx in x0..x1 {
                tiles.push((tx as i32, tz as i32));
            }
        }
        tiles
    }
}

/// Half-open tile index range covering `[min, max]`.
#[allow(clippy::cast_possible_truncation)]
fn tile_range(min: f64, max: f64, tile_size: f64) -> Option<(i64, i64)> {
    if !(min.is_finite() && max.is_finite() && tile_size > 0.0) {
        return None;
    }
    let start = (min / tile_size).floor() as i64;
    let end = ((max / tile_size).ceil() as i64).max(start + 1);
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_inverted() {
        assert!(Bounds2d::new(0.0, 1.0, 0.0, 1.0).is_ok());
        assert!(Bounds2d::new(0.0, 0.0, 0.0, 0.0).is_ok());
        assert!(matches!(
            Bounds2d::new(2.0, 1.0, 0.0, 1.0),
            Err(CoreError::InvalidBounds { .. })
        ));
        assert!(Bounds2d::new(0.0, 1.0, 5.0, -5.0).is_err());
        assert!(Bounds2d::new(f64::NAN, 1.0, 0.0, 1.0).is_err());
    }

    #[test]
    fn test_of_orders_any_input() {
        let inputs = [
            (0.0, 1.0, 0.0, 1.0),
            (1.0, 0.0, 1.0, 0.0),
            (-5.0, 3.0, 7.0, -7.0),
            (2.5, 2.5, -1.0, -1.0),
        ];
        for (x0, x1, z0, z1) in inputs {
            let b = Bounds2d::of(x0, x1, z0, z1);
            assert!(b.min_x() <= b.max_x(), "x inverted for {x0},{x1}");
            assert!(b.min_z() <= b.max_z(), "z inverted for {z0},{z1}");
        }
    }

    #[test]
    fn test_intersects_is_closed() {
        let a = Bounds2d::of(0.0, 10.0, 0.0, 10.0);
        let touching = Bounds2d::of(10.0, 20.0, 0.0, 10.0);
        let apart = Bounds2d::of(10.5, 20.0, 0.0, 10.0);

        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
        assert!(Bounds2d::EVERYTHING.intersects(&a));
    }

    #[test]
    fn test_contains_and_union() {
        let a = Bounds2d::of(0.0, 10.0, 0.0, 10.0);
        let inner = Bounds2d::of(2.0, 3.0, 4.0, 5.0);
        let b = Bounds2d::of(-5.0, 1.0, 8.0, 12.0);

        assert!(a.contains(&inner));
        assert!(!inner.contains(&a));
        assert!(a.contains(&a));

        let u = a.union(&b);
        assert_eq!(u, Bounds2d::of(-5.0, 10.0, 0.0, 12.0));
        assert!(u.contains(&a) && u.contains(&b));
    }

    #[test]
    fn test_expand_and_shrink() {
        let a = Bounds2d::of(0.0, 10.0, 0.0, 2.0);
        assert_eq!(a.expand(2.0), Bounds2d::of(-2.0, 12.0, -2.0, 4.0));
        assert_eq!(a.expand(-1.0), Bounds2d::of(1.0, 9.0, 1.0, 1.0));

        let collapsed = a.expand(-3.0);
        assert!(collapsed.min_z() <= collapsed.max_z());
        assert_eq!(collapsed.min_z(), 1.0);
    }

    #[test]
    fn test_to_tiles() {
        let b = Bounds2d::of(0.0, 15.0, 0.0, 15.0);
        assert_eq!(b.to_tiles(16.0), vec![(0, 0)]);

        let b = Bounds2d::of(-1.0, 17.0, 0.0, 1.0);
        assert_eq!(b.to_tiles(16.0), vec![(-1, 0), (0, 0), (1, 0)]);

        // A box on a tile edge still belongs to the tile it starts in
        let edge = Bounds2d::point(32.0, 32.0);
        assert_eq!(edge.to_tiles(16.0), vec![(2, 2)]);

        assert!(Bounds2d::EVERYTHING.to_tiles(16.0).is_empty());
    }

    #[test]
    fn test_intersection() {
        let a = Bounds2d::of(0.0, 10.0, 0.0, 10.0);
        let b = Bounds2d::of(5.0, 15.0, -5.0, 5.0);
        assert_eq!(a.intersection(&b), Some(Bounds2d::of(5.0, 10.0, 0.0, 5.0)));
        assert_eq!(a.intersection(&Bounds2d::point(20.0, 20.0)), None);
    }
}
