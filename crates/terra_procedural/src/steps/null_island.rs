//! A fixed island at longitude 0, latitude 0.

use futures::future::{self, BoxFuture, FutureExt};

use terra_core::Bounds2d;
use terra_dataset::{DatasetResult, GeographicProjection};

use crate::biome::Biome;
use crate::column::{
    ColumnCoord, ColumnDataBuilder, COLUMN_SIZE, SEA_LEVEL, TREE_COVER_KEY, WATER_NONE, WATER_OCEAN,
};
use crate::error::PipelineResult;
use crate::pipeline::BakingStep;

/// Half the island's edge length in blocks (2x2 chunks).
#[allow(clippy::cast_possible_wrap)]
const HALF_SIZE: i64 = COLUMN_SIZE as i64;

/// Stamps the island over whatever earlier steps baked.
///
/// Interior cells are forest at height 1; the outermost ring of blocks is
/// ocean at sea level, one block deep over ground at -1.
#[derive(Debug, Clone, Copy)]
pub struct NullIslandStep {
    center_x: i64,
    center_z: i64,
}

impl NullIslandStep {
    /// Places the island on the chunk corner nearest to (0°, 0°).
    ///
    /// # Errors
    ///
    /// Fails if the projection cannot map the origin.
    pub fn new(projection: &dyn GeographicProjection) -> DatasetResult<Self> {
        let (x, z) = projection.from_geo(0.0, 0.0)?;
        #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
        let snap = |v: f64| (v / HALF_SIZE as f64).round() as i64 * HALF_SIZE;
        Ok(Self {
            center_x: snap(x),
            center_z: snap(z),
        })
    }

    /// World-space extent of the island.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self) -> Bounds2d {
        Bounds2d::of(
            (self.center_x - HALF_SIZE) as f64,
            (self.center_x + HALF_SIZE) as f64,
            (self.center_z - HALF_SIZE) as f64,
            (self.center_z + HALF_SIZE) as f64,
        )
    }
}

impl BakingStep for NullIslandStep {
    type Data = ();

    fn name(&self) -> &'static str {
        "null_island"
    }

    fn request_data(&self, _coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<()>> {
        future::ready(Ok(())).boxed()
    }

    fn bake(&self, coord: ColumnCoord, builder: &mut ColumnDataBuilder, (): ()) {
        if !self.bounds().intersects(&coord.bounds()) {
            return;
        }

        let step = coord.cell_step();
        let (min_x, max_x) = (self.center_x - HALF_SIZE, self.center_x + HALF_SIZE);
        let (min_z, max_z) = (self.center_z - HALF_SIZE, self.center_z + HALF_SIZE);
        let mut stamped = Vec::new();

        for z in 0..COLUMN_SIZE {
            #[allow(clippy::cast_possible_wrap)]
            let block_z = coord.world_z() + z as i64 * step;
            if !(min_z..max_z).contains(&block_z) {
                continue;
            }
            for x in 0..COLUMN_SIZE {
                #[allow(clippy::cast_possible_wrap)]
                let block_x = coord.world_x() + x as i64 * step;
                if !(min_x..max_x).contains(&block_x) {
                    continue;
                }

                let ring = block_x < min_x + step
                    || block_x >= max_x - step
                    || block_z < min_z + step
                    || block_z >= max_z - step;
                let i = z * COLUMN_SIZE + x;
                if ring {
                    builder.set_surface_height(x, z, SEA_LEVEL);
                    builder.water_depth_mut()[i] = WATER_OCEAN | 1;
                    builder.set_biome(x, z, Biome::Ocean);
                } else {
                    builder.set_surface_height(x, z, 1);
                    builder.water_depth_mut()[i] = WATER_NONE;
                    builder.set_biome(x, z, Biome::Forest);
                }
                stamped.push(i);
            }
        }

        if let Some(cover) = builder.custom_mut(TREE_COVER_KEY) {
            for i in stamped {
                if let Some(cell) = cover.get_mut(i) {
                    *cell = 0;
                }
            }
        }
    }
}
