//! # Bounding Volume Hierarchy
//!
//! Immutable spatial index over values that expose a [`Bounds2d`].
//!
//! ## Layout
//!
//! ```text
//!   Bvh::Empty          0 values
//!   Bvh::Singleton      1 value
//!   Bvh::Quadtree       N values
//!
//!        ┌───────────── root (union of all boxes) ─────────────┐
//!        │ values straddling the midpoint stay here             │
//!        ├──────────────┬──────────────┬────────────┬──────────┤
//!        │   NW child   │   NE child   │  SW child  │ SE child │
//!        └──────────────┴──────────────┴────────────┴──────────┘
//! ```
//!
//! A node keeps up to `node_capacity` values in a flat buffer. Once that
//! overflows, and the node's shorter side is still larger than
//! `min_leaf_size`, it splits once into four quadrants and re-routes its
//! buffer. A value moves into a child only if its box fits entirely inside
//! exactly one quadrant, so values are never duplicated.
//!
//! ## Query Guarantee
//!
//! `get_all_intersecting(q)` returns exactly the values whose box
//! intersects `q`, each once.

use std::sync::Arc;

use crate::bounds::Bounds2d;

/// A value with a bounding box.
pub trait Bounded {
    /// The axis-aligned box enclosing this value.
    fn bounds(&self) -> Bounds2d;
}

impl Bounded for Bounds2d {
    #[inline]
    fn bounds(&self) -> Bounds2d {
        *self
    }
}

impl<T: Bounded + ?Sized> Bounded for Arc<T> {
    #[inline]
    fn bounds(&self) -> Bounds2d {
        (**self).bounds()
    }
}

impl<T: Bounded + ?Sized> Bounded for Box<T> {
    #[inline]
    fn bounds(&self) -> Bounds2d {
        (**self).bounds()
    }
}

/// Quadtree construction parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BvhSettings {
    /// Values a node holds before it tries to split.
    pub node_capacity: usize,
    /// A node whose shorter side is at or below this never splits.
    pub min_leaf_size: f64,
}

impl Default for BvhSettings {
    fn default() -> Self {
        Self {
            node_capacity: 8,
            min_leaf_size: 16.0,
        }
    }
}

/// Immutable spatial index.
#[derive(Debug, Clone)]
pub enum Bvh<V> {
    /// No values.
    Empty,
    /// Exactly one value.
    Singleton {
        /// The value.
        value: V,
        /// Its cached box.
        bounds: Bounds2d,
    },
    /// Two or more values, indexed by a quadtree.
    Quadtree {
        /// Root node, covering the union of all value boxes.
        root: Box<Node<V>>,
        /// Total number of values.
        len: usize,
    },
}

impl<V> Default for Bvh<V> {
    fn default() -> Self {
        Self::Empty
    }
}

/// A quadtree node.
#[derive(Debug, Clone)]
pub struct Node<V> {
    bounds: Bounds2d,
    values: Vec<(Bounds2d, V)>,
    /// `None` until the node splits. Empty slots are trimmed after build.
    children: Option<Box<[Option<Node<V>>; 4]>>,
}

impl<V: Bounded> Bvh<V> {
    /// Builds an index with default settings.
    #[must_use]
    pub fn new(values: Vec<V>) -> Self {
        Self::with_settings(values, BvhSettings::default())
    }

    /// Builds an index with explicit quadtree settings.
    #[must_use]
    pub fn with_settings(values: Vec<V>, settings: BvhSettings) -> Self {
        let mut values = values;
        match values.len() {
            0 => Self::Empty,
            1 => {
                let Some(value) = values.pop() else {
                    return Self::Empty;
                };
                let bounds = value.bounds();
                Self::Singleton { value, bounds }
            }
            len => {
                let boxed: Vec<(Bounds2d, V)> =
                    values.into_iter().map(|v| (v.bounds(), v)).collect();
                let root_bounds = boxed
                    .iter()
                    .skip(1)
                    .fold(boxed[0].0, |acc, (b, _)| acc.union(b));

                let mut root = Node::new(root_bounds, settings.node_capacity);
                for (b, v) in boxed {
                    root.insert(b, v, &settings);
                }
                root.cleanup();

                Self::Quadtree {
                    root: Box::new(root),
                    len,
                }
            }
        }
    }
}

impl<V> Bvh<V> {
    /// Number of values in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Singleton { .. } => 1,
            Self::Quadtree { len, .. } => *len,
        }
    }

    /// Returns true if the index holds no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Union of all value boxes, or `None` when empty.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds2d> {
        match self {
            Self::Empty => None,
            Self::Singleton { bounds, .. } => Some(*bounds),
            Self::Quadtree { root, .. } => Some(root.bounds),
        }
    }

    /// Calls `f` once for every value whose box intersects `query`.
    pub fn for_each_intersecting<'a, F>(&'a self, query: &Bounds2d, mut f: F)
    where
        F: FnMut(&'a V),
    {
        match self {
            Self::Empty => {}
            Self::Singleton { value, bounds } => {
                if bounds.intersects(query) {
                    f(value);
                }
            }
            Self::Quadtree { root, .. } => root.for_each_intersecting(query, &mut f),
        }
    }

    /// Collects every value whose box intersects `query`.
    #[must_use]
    pub fn get_all_intersecting(&self, query: &Bounds2d) -> Vec<&V> {
        let mut out = Vec::new();
        self.for_each_intersecting(query, |v| out.push(v));
        out
    }

    /// Returns true if any value's box intersects `query`.
    #[must_use]
    pub fn any_intersecting(&self, query: &Bounds2d) -> bool {
        let mut found = false;
        self.for_each_intersecting(query, |_| found = true);
        found
    }

    /// Calls `f` for every value, in no particular order.
    pub fn for_each<'a, F>(&'a self, mut f: F)
    where
        F: FnMut(&'a V),
    {
        match self {
            Self::Empty => {}
            Self::Singleton { value, .. } => f(value),
            Self::Quadtree { root, .. } => root.for_each(&mut f),
        }
    }
}

impl<V> Node<V> {
    fn new(bounds: Bounds2d, capacity: usize) -> Self {
        Self {
            bounds,
            values: Vec::with_capacity(capacity),
            children: None,
        }
    }

    /// Quadrant index fully containing `b`, or `None` if `b` straddles.
    ///
    /// Quadrants: 0 = (-x, -z), 1 = (+x, -z), 2 = (-x, +z), 3 = (+x, +z).
    fn quadrant_of(&self, b: &Bounds2d) -> Option<usize> {
        let (mid_x, mid_z) = self.bounds.center();

        let east = if b.max_x() < mid_x {
            0
        } else if b.min_x() > mid_x {
            1
        } else {
            return None;
        };
        let south = if b.max_z() < mid_z {
            0
        } else if b.min_z() > mid_z {
            2
        } else {
            return None;
        };
        Some(east | south)
    }

    fn quadrant_bounds(&self, quadrant: usize) -> Bounds2d {
        let (mid_x, mid_z) = self.bounds.center();
        let (min_x, max_x) = if quadrant & 1 == 0 {
            (self.bounds.min_x(), mid_x)
        } else {
            (mid_x, self.bounds.max_x())
        };
        let (min_z, max_z) = if quadrant & 2 == 0 {
            (self.bounds.min_z(), mid_z)
        } else {
            (mid_z, self.bounds.max_z())
        };
        Bounds2d::of(min_x, max_x, min_z, max_z)
    }

    fn insert(&mut self, b: Bounds2d, value: V, settings: &BvhSettings) {
        if self.children.is_some() {
            self.route(b, value, settings);
            return;
        }

        self.values.push((b, value));

        let shorter_side = self.bounds.width().min(self.bounds.depth());
        if self.values.len() > settings.node_capacity && shorter_side > settings.min_leaf_size {
            self.split(settings);
        }
    }

    fn split(&mut self, settings: &BvhSettings) {
        self.children = Some(Box::new([None, None, None, None]));
        let buffered = std::mem::take(&mut self.values);
        for (b, v) in buffered {
            self.route(b, v, settings);
        }
    }

    /// Places a value in the matching child, or keeps it here if it straddles.
    fn route(&mut self, b: Bounds2d, value: V, settings: &BvhSettings) {
        let Some(quadrant) = self.quadrant_of(&b) else {
            self.values.push((b, value));
            return;
        };
        let child_bounds = self.quadrant_bounds(quadrant);
        if let Some(children) = self.children.as_mut() {
            children[quadrant]
                .get_or_insert_with(|| Node::new(child_bounds, settings.node_capacity))
                .insert(b, value, settings);
        } else {
            self.values.push((b, value));
        }
    }

    /// Drops empty child slots and shrinks over-allocated buffers.
    fn cleanup(&mut self) {
        self.values.shrink_to_fit();
        if let Some(children) = self.children.as_mut() {
            for slot in children.iter_mut() {
                if let Some(child) = slot {
                    child.cleanup();
                    if child.values.is_empty() && child.children.is_none() {
                        *slot = None;
                    }
                }
            }
            if children.iter().all(Option::is_none) {
                self.children = None;
            }
        }
    }

    fn for_each_intersecting<'a, F>(&'a self, query: &Bounds2d, f: &mut F)
    where
        F: FnMut(&'a V),
    {
        if !self.bounds.intersects(query) {
            return;
        }

        if query.contains(&self.bounds) {
            for (_, v) in &self.values {
                f(v);
            }
        } else {
            for (b, v) in &self.values {
                if b.intersects(query) {
                    f(v);
                }
            }
        }

        if let Some(children) = &self.children {
            for child in children.iter().flatten() {
                child.for_each_intersecting(query, f);
            }
        }
    }

    fn for_each<'a, F>(&'a self, f: &mut F)
    where
        F: FnMut(&'a V),
    {
        for (_, v) in &self.values {
            f(v);
        }
        if let Some(children) = &self.children {
            for child in children.iter().flatten() {
                child.for_each(f);
            }
        }
    }
}
