//! Biome classification from baked heights, water and tree cover.

use futures::future::{self, BoxFuture, FutureExt};

use crate::biome::Biome;
use crate::column::{
    ColumnCoord, ColumnDataBuilder, COLUMN_AREA, COLUMN_SIZE, SEA_LEVEL, TREE_COVER_KEY, WATER_DEPTH_MASK,
    WATER_OCEAN, WATER_RIVER, WATER_TYPE_MASK,
};
use crate::error::PipelineResult;
use crate::pipeline::BakingStep;

/// Ocean at least this deep is deep ocean.
pub const DEEP_OCEAN_DEPTH: u8 = 16;

/// Highest land above sea level that counts as beach.
pub const BEACH_MAX_HEIGHT: i32 = 2;

/// Biome of one cell.
#[must_use]
pub fn classify_biome(water: u8, surface_height: i32, tree_cover: u8) -> Biome {
    match water & WATER_TYPE_MASK {
        WATER_OCEAN if water & WATER_DEPTH_MASK >= DEEP_OCEAN_DEPTH => Biome::DeepOcean,
        WATER_OCEAN => Biome::Ocean,
        WATER_RIVER => Biome::River,
        _ if (SEA_LEVEL..=SEA_LEVEL + BEACH_MAX_HEIGHT).contains(&surface_height) => Biome::Beach,
        _ if u16::from(tree_cover) * 2 > 255 => Biome::Forest,
        _ => Biome::Plains,
    }
}

/// Fills every cell's biome. Needs no data of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct BiomesStep;

impl BakingStep for BiomesStep {
    type Data = ();

    fn name(&self) -> &'static str {
        "biomes"
    }

    fn request_data(&self, _coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<()>> {
        future::ready(Ok(())).boxed()
    }

    fn bake(&self, _coord: ColumnCoord, builder: &mut ColumnDataBuilder, (): ()) {
        let mut biomes = [Biome::Unset; COLUMN_AREA];
        let cover = builder.get_custom(TREE_COVER_KEY, &[]);
        for z in 0..COLUMN_SIZE {
            for x in 0..COLUMN_SIZE {
                let i = z * COLUMN_SIZE + x;
                let trees = cover.get(i).copied().unwrap_or(0);
                biomes[i] = classify_biome(builder.water_depth(x, z), builder.surface_height(x, z), trees);
            }
        }
        *builder.biomes_mut() = biomes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{HEIGHT_UNSET, WATER_NONE};

    #[test]
    fn test_water_biomes() {
        assert_eq!(classify_biome(WATER_OCEAN | 3, 0, 255), Biome::Ocean);
        assert_eq!(classify_biome(WATER_OCEAN | 16, 0, 0), Biome::DeepOcean);
        assert_eq!(classify_biome(WATER_OCEAN, HEIGHT_UNSET, 0), Biome::Ocean);
        assert_eq!(classify_biome(WATER_RIVER | 2, 40, 255), Biome::River);
    }

    #[test]
    fn test_land_biomes() {
        assert_eq!(classify_biome(WATER_NONE, 1, 255), Biome::Beach, "beach wins over forest");
        assert_eq!(classify_biome(WATER_NONE, 3, 128), Biome::Forest);
        assert_eq!(classify_biome(WATER_NONE, 3, 127), Biome::Plains);
        assert_eq!(classify_biome(WATER_NONE, HEIGHT_UNSET, 0), Biome::Plains);
    }
}
