//! # Draw Functions
//!
//! What a rasterized cell does to the column. Rasterizers produce
//! `(x, z, weight)` triples; a draw function tree filters or rewrites the
//! weight and finally acts on the builder.
//!
//! ```text
//!  WeightGreaterThan(0) ─► WeightAdd(-1) ─► Water
//!  (skip the rim)          (shallower)      (carve river)
//! ```

use crate::column::{BlockState, ColumnDataBuilder, COLUMN_SIZE, TREE_COVER_KEY};

/// A composable per-cell action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DrawFunction {
    /// Runs every child in order.
    All(Vec<DrawFunction>),
    /// Clamps the weight into `[min, max]`.
    WeightClamp {
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
        /// Receives the clamped weight.
        child: Box<DrawFunction>,
    },
    /// Forwards only weights strictly above `threshold`.
    WeightGreaterThan {
        /// Exclusive lower limit.
        threshold: i32,
        /// Receives passing weights.
        child: Box<DrawFunction>,
    },
    /// Forwards only weights strictly below `threshold`.
    WeightLessThan {
        /// Exclusive upper limit.
        threshold: i32,
        /// Receives passing weights.
        child: Box<DrawFunction>,
    },
    /// Adds `delta` to the weight.
    WeightAdd {
        /// Added to every weight.
        delta: i32,
        /// Receives the shifted weight.
        child: Box<DrawFunction>,
    },
    /// Places a surface block, ignoring the weight.
    Block(BlockState),
    /// River water; the weight is the depth.
    Water,
    /// Ocean water; the weight is the depth.
    Ocean,
    /// Removes tree cover from the cell.
    NoTrees,
}

impl DrawFunction {
    /// `WeightClamp` around `child`.
    #[must_use]
    pub fn clamp(min: i32, max: i32, child: Self) -> Self {
        Self::WeightClamp {
            min,
            max,
            child: Box::new(child),
        }
    }

    /// `WeightGreaterThan` around `child`.
    #[must_use]
    pub fn greater_than(threshold: i32, child: Self) -> Self {
        Self::WeightGreaterThan {
            threshold,
            child: Box::new(child),
        }
    }

    /// `WeightLessThan` around `child`.
    #[must_use]
    pub fn less_than(threshold: i32, child: Self) -> Self {
        Self::WeightLessThan {
            threshold,
            child: Box::new(child),
        }
    }

    /// `WeightAdd` around `child`.
    #[must_use]
    pub fn add(delta: i32, child: Self) -> Self {
        Self::WeightAdd {
            delta,
            child: Box::new(child),
        }
    }

    /// Applies this function to cell `(x, z)` of `builder`.
    pub fn draw_onto(&self, builder: &mut ColumnDataBuilder, x: usize, z: usize, weight: i32) {
        match self {
            Self::All(children) => {
                for child in children {
                    child.draw_onto(builder, x, z, weight);
                }
            }
            Self::WeightClamp { min, max, child } => {
                child.draw_onto(builder, x, z, weight.clamp(*min, (*max).max(*min)));
            }
            Self::WeightGreaterThan { threshold, child } => {
                if weight > *threshold {
                    child.draw_onto(builder, x, z, weight);
                }
            }
            Self::WeightLessThan { threshold, child } => {
                if weight < *threshold {
                    child.draw_onto(builder, x, z, weight);
                }
            }
            Self::WeightAdd { delta, child } => {
                child.draw_onto(builder, x, z, weight.saturating_add(*delta));
            }
            Self::Block(state) => builder.set_surface_block(x, z, *state),
            Self::Water => builder.update_water_depth(x, z, weight),
            Self::Ocean => builder.update_ocean_depth(x, z, weight),
            Self::NoTrees => {
                if x < COLUMN_SIZE && z < COLUMN_SIZE {
                    if let Some(cover) = builder.custom_mut(TREE_COVER_KEY) {
                        if let Some(cell) = cover.get_mut(z * COLUMN_SIZE + x) {
                            *cell = 0;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{COLUMN_AREA, WATER_OCEAN, WATER_RIVER};

    #[test]
    fn test_weight_filters() {
        let draw = DrawFunction::greater_than(1, DrawFunction::less_than(4, DrawFunction::Water));
        let mut builder = ColumnDataBuilder::new();
        for (x, weight) in [(0, 1), (1, 2), (2, 3), (3, 4)] {
            draw.draw_onto(&mut builder, x, 0, weight);
        }
        assert_eq!(builder.water_depth(0, 0), 0, "weight 1 is not above 1");
        assert_eq!(builder.water_depth(1, 0), WATER_RIVER | 2);
        assert_eq!(builder.water_depth(2, 0), WATER_RIVER | 3);
        assert_eq!(builder.water_depth(3, 0), 0, "weight 4 is not below 4");
    }

    #[test]
    fn test_add_and_clamp() {
        let draw = DrawFunction::add(10, DrawFunction::clamp(0, 12, DrawFunction::Ocean));
        let mut builder = ColumnDataBuilder::new();
        draw.draw_onto(&mut builder, 0, 0, 1);
        draw.draw_onto(&mut builder, 1, 0, 7);
        assert_eq!(builder.water_depth(0, 0), WATER_OCEAN | 11);
        assert_eq!(builder.water_depth(1, 0), WATER_OCEAN | 12);
    }

    #[test]
    fn test_all_runs_children_in_order() {
        let road = BlockState::new(13, 0);
        let draw = DrawFunction::All(vec![
            DrawFunction::Block(BlockState::STONE),
            DrawFunction::Block(road),
            DrawFunction::NoTrees,
        ]);
        let mut builder = ColumnDataBuilder::new();
        builder.put_custom(TREE_COVER_KEY, vec![200; COLUMN_AREA]);

        draw.draw_onto(&mut builder, 2, 3, 0);

        let data = builder.build();
        assert_eq!(data.surface_block(2, 3), Some(road));
        assert_eq!(data.get_custom(TREE_COVER_KEY, &[])[3 * COLUMN_SIZE + 2], 0);
        assert_eq!(data.get_custom(TREE_COVER_KEY, &[])[0], 200);
    }

    #[test]
    fn test_no_trees_without_buffer() {
        let mut builder = ColumnDataBuilder::new();
        DrawFunction::NoTrees.draw_onto(&mut builder, 0, 0, 1);
        assert!(builder.custom_mut(TREE_COVER_KEY).is_none());
    }
}
