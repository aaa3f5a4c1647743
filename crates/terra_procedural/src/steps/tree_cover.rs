//! Tree cover from a canopy raster.

use futures::future::BoxFuture;

use terra_dataset::TiledRasterDataset;

use super::request_grid;
use crate::column::{ColumnCoord, ColumnDataBuilder, COLUMN_AREA, TREE_COVER_KEY};
use crate::error::PipelineResult;
use crate::pipeline::BakingStep;

/// Scale applied to raw cover fractions before quantizing.
pub const TREE_COVER_BOOST: f64 = 1.5;

/// Bakes the `"tree_cover"` buffer: one byte per cell, 255 = full canopy.
#[derive(Debug, Clone)]
pub struct TreeCoverStep {
    cover: TiledRasterDataset,
}

impl TreeCoverStep {
    /// Creates the step over a cover dataset (fractions 0..1).
    #[must_use]
    pub fn new(cover: TiledRasterDataset) -> Self {
        Self { cover }
    }
}

fn quantize(fraction: f64) -> u8 {
    if fraction.is_nan() {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let byte = ((fraction * TREE_COVER_BOOST).clamp(0.0, 1.0) * 255.0) as u8;
    byte
}

impl BakingStep for TreeCoverStep {
    type Data = Option<Vec<f64>>;

    fn name(&self) -> &'static str {
        "tree_cover"
    }

    fn request_data(&self, coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<Self::Data>> {
        request_grid(&self.cover, coord, "tree_cover")
    }

    fn bake(&self, _coord: ColumnCoord, builder: &mut ColumnDataBuilder, data: Self::Data) {
        let cover = match data {
            Some(grid) => grid.into_iter().map(quantize).collect(),
            None => vec![0; COLUMN_AREA],
        };
        builder.put_custom(TREE_COVER_KEY, cover);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize() {
        assert_eq!(quantize(f64::NAN), 0);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(-0.5), 0);
        assert_eq!(quantize(0.5), 191);
        assert_eq!(quantize(0.8), 255, "boosted cover saturates");
    }
}
