//! # Built-in Steps
//!
//! The steps of the standard pipeline, in bake order:
//!
//! 1. [`HeightsStep`]: surface heights and ocean from elevation data
//! 2. [`TreeCoverStep`]: the `"tree_cover"` buffer
//! 3. [`OsmStep`]: roads, rivers, buildings, lakes
//! 4. [`BiomesStep`]: biome classification from everything above
//! 5. [`NullIslandStep`]: the fixed island at 0°, 0°
//!
//! Dataset failures never abort a column here: a step that cannot load its
//! data logs a warning and bakes its defaults.

mod biomes;
mod heights;
mod null_island;
mod osm;
mod tree_cover;

pub use biomes::{classify_biome, BiomesStep, BEACH_MAX_HEIGHT, DEEP_OCEAN_DEPTH};
pub use heights::HeightsStep;
pub use null_island::NullIslandStep;
pub use osm::{GeometryRegions, OsmStep};
pub use tree_cover::{TreeCoverStep, TREE_COVER_BOOST};

use futures::future::{BoxFuture, FutureExt};

use terra_dataset::TiledRasterDataset;

use crate::column::{ColumnCoord, COLUMN_SIZE};
use crate::error::PipelineResult;

#[allow(clippy::cast_possible_truncation)]
const GRID_SIZE: u32 = COLUMN_SIZE as u32;

/// Samples the column's grid from `dataset`, degrading any failure to `None`.
fn request_grid(
    dataset: &TiledRasterDataset,
    coord: ColumnCoord,
    what: &'static str,
) -> BoxFuture<'static, PipelineResult<Option<Vec<f64>>>> {
    let (x, z) = coord.sample_origin();
    let grid = dataset.sample_grid(x, z, coord.zoom, GRID_SIZE);
    async move {
        match grid.await {
            Ok(samples) => Ok(Some(samples)),
            Err(error) => {
                tracing::warn!(column = %coord, dataset = what, %error, "dataset unavailable, baking defaults");
                Ok(None)
            }
        }
    }
    .boxed()
}
