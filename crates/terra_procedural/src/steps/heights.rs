//! Surface heights from an elevation raster.

use futures::future::BoxFuture;

use terra_dataset::TiledRasterDataset;

use super::request_grid;
use crate::column::{ColumnCoord, ColumnDataBuilder, COLUMN_SIZE, SEA_LEVEL};
use crate::error::PipelineResult;
use crate::pipeline::BakingStep;

/// Bakes surface heights; below sea level and missing data become ocean.
#[derive(Debug, Clone)]
pub struct HeightsStep {
    heights: TiledRasterDataset,
}

impl HeightsStep {
    /// Creates the step over an elevation dataset (values in blocks).
    #[must_use]
    pub fn new(heights: TiledRasterDataset) -> Self {
        Self { heights }
    }
}

impl BakingStep for HeightsStep {
    type Data = Option<Vec<f64>>;

    fn name(&self) -> &'static str {
        "heights"
    }

    fn request_data(&self, coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<Self::Data>> {
        request_grid(&self.heights, coord, "heights")
    }

    fn bake(&self, _coord: ColumnCoord, builder: &mut ColumnDataBuilder, data: Self::Data) {
        for z in 0..COLUMN_SIZE {
            for x in 0..COLUMN_SIZE {
                let sample = data.as_ref().map_or(f64::NAN, |grid| grid[z * COLUMN_SIZE + x]);
                if sample.is_nan() {
                    // No elevation: ocean of unknown depth, height stays unset
                    builder.update_ocean_depth(x, z, 0);
                    continue;
                }

                #[allow(clippy::cast_possible_truncation)]
                let height = sample.floor() as i32;
                if height < SEA_LEVEL {
                    builder.set_surface_height(x, z, SEA_LEVEL);
                    builder.update_ocean_depth(x, z, SEA_LEVEL - height);
                } else {
                    builder.set_surface_height(x, z, height);
                }
            }
        }
    }
}
