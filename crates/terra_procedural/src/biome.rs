//! # Biome Classification
//!
//! Biome ids stored per cell of a column. Classification itself happens in
//! the biomes step, from the heights, water and tree cover baked before it.

/// Biome types in the world.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Biome {
    /// Deep ocean (water depth >= 16)
    DeepOcean = 0,
    /// Shallow ocean
    Ocean = 1,
    /// Beach/coastline
    Beach = 2,
    /// Plains/grassland
    Plains = 3,
    /// Forest
    Forest = 4,
    /// River
    River = 5,
    /// Not classified yet
    #[default]
    Unset = 255,
}
