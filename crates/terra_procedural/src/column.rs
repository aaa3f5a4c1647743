//! # Column Data
//!
//! The output of the baking pipeline: one immutable record per 16x16
//! column, built through a mutable [`ColumnDataBuilder`].
//!
//! ## Layout
//!
//! Every per-cell array is indexed `[z * 16 + x]`. A column at zoom `n`
//! covers `16 << n` blocks on each axis, one cell every `2^n` blocks.
//!
//! ## Water Byte
//!
//! ```text
//!   7 6 5 4 3 2 1 0
//!  [type][  depth   ]    type: 00 none, 01 river, 10 ocean
//! ```

use std::collections::BTreeMap;
use std::fmt;

use terra_core::Bounds2d;

use crate::biome::Biome;

/// Column width/depth in cells.
pub const COLUMN_SIZE: usize = 16;

/// Cells per column.
pub const COLUMN_AREA: usize = COLUMN_SIZE * COLUMN_SIZE;

/// Surface height of a cell nothing has written to.
pub const HEIGHT_UNSET: i32 = i32::MIN;

/// Y level of the ocean surface.
pub const SEA_LEVEL: i32 = 0;

/// Water type bits of the water byte.
pub const WATER_TYPE_MASK: u8 = 0xC0;
/// Dry land.
pub const WATER_NONE: u8 = 0x00;
/// River or lake water.
pub const WATER_RIVER: u8 = 0x40;
/// Ocean water.
pub const WATER_OCEAN: u8 = 0x80;
/// Depth bits of the water byte.
pub const WATER_DEPTH_MASK: u8 = 0x3F;

/// Deepest zoom level with distinct geometry; any `i32` column origin
/// still fits in an `i64` block coordinate.
const MAX_ZOOM: u8 = 27;

/// Custom buffer holding per-cell tree cover (0-255).
pub const TREE_COVER_KEY: &str = "tree_cover";

#[inline]
const fn index(x: usize, z: usize) -> Option<usize> {
    if x < COLUMN_SIZE && z < COLUMN_SIZE {
        Some(z * COLUMN_SIZE + x)
    } else {
        None
    }
}

/// Identifies one column in the zoom-specific column grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnCoord {
    /// X coordinate (in columns, not blocks).
    pub x: i32,
    /// Z coordinate (in columns, not blocks).
    pub z: i32,
    /// Zoom level; 0 is one chunk column.
    pub zoom: u8,
}

impl ColumnCoord {
    /// Creates a column coordinate.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32, zoom: u8) -> Self {
        Self { x, z, zoom }
    }

    /// A chunk column (zoom 0).
    #[inline]
    #[must_use]
    pub const fn chunk(x: i32, z: i32) -> Self {
        Self { x, z, zoom: 0 }
    }

    /// Blocks between two neighbouring cells.
    #[inline]
    #[must_use]
    pub const fn cell_step(self) -> i64 {
        1 << self.shift()
    }

    /// Blocks along one edge of the column.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn span(self) -> i64 {
        (COLUMN_SIZE as i64) << self.shift()
    }

    /// Zoom as a shift amount; deeper zooms behave as [`MAX_ZOOM`].
    const fn shift(self) -> u8 {
        if self.zoom > MAX_ZOOM {
            MAX_ZOOM
        } else {
            self.zoom
        }
    }

    /// World X of the column's origin (corner).
    #[inline]
    #[must_use]
    pub const fn world_x(self) -> i64 {
        self.x as i64 * self.span()
    }

    /// World Z of the column's origin.
    #[inline]
    #[must_use]
    pub const fn world_z(self) -> i64 {
        self.z as i64 * self.span()
    }

    /// First sample of this column in a zoom-`n` raster.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn sample_origin(self) -> (i64, i64) {
        (self.x as i64 * COLUMN_SIZE as i64, self.z as i64 * COLUMN_SIZE as i64)
    }

    /// World-space extent of the column.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(self) -> Bounds2d {
        let (x, z, span) = (self.world_x() as f64, self.world_z() as f64, self.span() as f64);
        Bounds2d::of(x, x + span, z, z + span)
    }
}

impl fmt::Display for ColumnCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}@{}", self.x, self.z, self.zoom)
    }
}

/// A block placed on top of a cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct BlockState {
    /// Block type ID.
    pub id: u16,
    /// Block metadata (variant, rotation, etc.).
    pub meta: u16,
}

impl BlockState {
    /// Stone block.
    pub const STONE: Self = Self { id: 2, meta: 0 };
    /// Gravel/road surface.
    pub const GRAVEL: Self = Self { id: 13, meta: 0 };
    /// Concrete (buildings).
    pub const CONCRETE: Self = Self { id: 251, meta: 0 };

    /// Creates a block state with ID and metadata.
    #[inline]
    #[must_use]
    pub const fn new(id: u16, meta: u16) -> Self {
        Self { id, meta }
    }
}

/// Frozen per-column terrain record.
#[derive(Clone, PartialEq, Eq)]
pub struct ColumnData {
    surface_height: [i32; COLUMN_AREA],
    biomes: [Biome; COLUMN_AREA],
    water_depth: [u8; COLUMN_AREA],
    surface_blocks: [Option<BlockState>; COLUMN_AREA],
    custom: BTreeMap<String, Box<[u8]>>,
    surface_min: i32,
    surface_max: i32,
}

impl ColumnData {
    /// A column with no data at all: unset heights under ocean.
    #[must_use]
    pub fn blank() -> Self {
        let mut builder = ColumnDataBuilder::new();
        builder.water_depth_mut().fill(WATER_OCEAN);
        builder.biomes_mut().fill(Biome::Ocean);
        builder.build()
    }

    /// Top of the column at `(x, z)`: the water surface for water cells.
    #[must_use]
    pub fn surface_height(&self, x: usize, z: usize) -> i32 {
        index(x, z).map_or(HEIGHT_UNSET, |i| self.surface_height[i])
    }

    /// Height of the solid ground at `(x, z)`, below any water.
    #[must_use]
    pub fn ground_height(&self, x: usize, z: usize) -> i32 {
        index(x, z).map_or(HEIGHT_UNSET, |i| ground(self.surface_height[i], self.water_depth[i]))
    }

    /// Biome at `(x, z)`.
    #[must_use]
    pub fn biome(&self, x: usize, z: usize) -> Biome {
        index(x, z).map_or(Biome::Unset, |i| self.biomes[i])
    }

    /// Packed water byte at `(x, z)`.
    #[must_use]
    pub fn water_depth(&self, x: usize, z: usize) -> u8 {
        index(x, z).map_or(WATER_NONE, |i| self.water_depth[i])
    }

    /// Water type bits at `(x, z)`.
    #[must_use]
    pub fn water_type(&self, x: usize, z: usize) -> u8 {
        self.water_depth(x, z) & WATER_TYPE_MASK
    }

    /// Water depth at `(x, z)`, 0 for land.
    #[must_use]
    pub fn water_depth_magnitude(&self, x: usize, z: usize) -> u8 {
        self.water_depth(x, z) & WATER_DEPTH_MASK
    }

    /// Surface block override at `(x, z)`.
    #[must_use]
    pub fn surface_block(&self, x: usize, z: usize) -> Option<BlockState> {
        index(x, z).and_then(|i| self.surface_blocks[i])
    }

    /// Custom buffer stored under `key`, or `fallback`.
    #[must_use]
    pub fn get_custom<'a>(&'a self, key: &str, fallback: &'a [u8]) -> &'a [u8] {
        self.custom.get(key).map_or(fallback, |bytes| &bytes[..])
    }

    /// Lowest ground level in the column (unset cells count as sea level).
    #[must_use]
    pub const fn surface_min(&self) -> i32 {
        self.surface_min
    }

    /// Highest surface level in the column (unset cells count as sea level).
    #[must_use]
    pub const fn surface_max(&self) -> i32 {
        self.surface_max
    }

    /// Whether the Y range `[min_y, max_y]` touches the terrain surface
    /// anywhere in this column, water included.
    #[must_use]
    pub const fn intersects_surface(&self, min_y: i32, max_y: i32) -> bool {
        min_y <= self.surface_max && max_y >= self.surface_min
    }
}

impl fmt::Debug for ColumnData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnData")
            .field("surface_min", &self.surface_min)
            .field("surface_max", &self.surface_max)
            .field("custom", &self.custom.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

fn ground(surface: i32, water: u8) -> i32 {
    if surface == HEIGHT_UNSET {
        surface
    } else {
        surface - i32::from(water & WATER_DEPTH_MASK)
    }
}

/// Mutable column under construction. One builder per column, never shared.
#[derive(Clone, Debug)]
pub struct ColumnDataBuilder {
    surface_height: [i32; COLUMN_AREA],
    biomes: [Biome; COLUMN_AREA],
    water_depth: [u8; COLUMN_AREA],
    surface_blocks: [Option<BlockState>; COLUMN_AREA],
    custom: BTreeMap<String, Vec<u8>>,
}

impl Default for ColumnDataBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnDataBuilder {
    /// Creates a builder with every cell unset, dry and unclassified.
    #[must_use]
    pub fn new() -> Self {
        Self {
            surface_height: [HEIGHT_UNSET; COLUMN_AREA],
            biomes: [Biome::Unset; COLUMN_AREA],
            water_depth: [WATER_NONE; COLUMN_AREA],
            surface_blocks: [None; COLUMN_AREA],
            custom: BTreeMap::new(),
        }
    }

    /// Surface height at `(x, z)`.
    #[must_use]
    pub fn surface_height(&self, x: usize, z: usize) -> i32 {
        index(x, z).map_or(HEIGHT_UNSET, |i| self.surface_height[i])
    }

    /// Sets the surface height at `(x, z)`. Out-of-range cells are ignored.
    pub fn set_surface_height(&mut self, x: usize, z: usize, height: i32) {
        if let Some(i) = index(x, z) {
            self.surface_height[i] = height;
        }
    }

    /// Direct access to all surface heights.
    pub fn surface_heights_mut(&mut self) -> &mut [i32; COLUMN_AREA] {
        &mut self.surface_height
    }

    /// Biome at `(x, z)`.
    #[must_use]
    pub fn biome(&self, x: usize, z: usize) -> Biome {
        index(x, z).map_or(Biome::Unset, |i| self.biomes[i])
    }

    /// Sets the biome at `(x, z)`.
    pub fn set_biome(&mut self, x: usize, z: usize, biome: Biome) {
        if let Some(i) = index(x, z) {
            self.biomes[i] = biome;
        }
    }

    /// Direct access to all biomes.
    pub fn biomes_mut(&mut self) -> &mut [Biome; COLUMN_AREA] {
        &mut self.biomes
    }

    /// Packed water byte at `(x, z)`.
    #[must_use]
    pub fn water_depth(&self, x: usize, z: usize) -> u8 {
        index(x, z).map_or(WATER_NONE, |i| self.water_depth[i])
    }

    /// Direct access to all packed water bytes.
    pub fn water_depth_mut(&mut self) -> &mut [u8; COLUMN_AREA] {
        &mut self.water_depth
    }

    /// Marks `(x, z)` as river water of depth `weight`.
    ///
    /// Deepens existing river water; replaces any other type.
    pub fn update_water_depth(&mut self, x: usize, z: usize, weight: i32) {
        self.update_water(x, z, WATER_RIVER, weight);
    }

    /// Marks `(x, z)` as ocean of depth `weight`.
    ///
    /// Deepens existing ocean; replaces any other type.
    pub fn update_ocean_depth(&mut self, x: usize, z: usize, weight: i32) {
        self.update_water(x, z, WATER_OCEAN, weight);
    }

    fn update_water(&mut self, x: usize, z: usize, kind: u8, weight: i32) {
        let Some(i) = index(x, z) else { return };
        let depth = u8::try_from(weight.clamp(0, i32::from(WATER_DEPTH_MASK))).unwrap_or(0);
        let current = self.water_depth[i];

        self.water_depth[i] = if current & WATER_TYPE_MASK == kind {
            kind | (current & WATER_DEPTH_MASK).max(depth)
        } else {
            kind | depth
        };
    }

    /// Sets the surface block at `(x, z)`.
    pub fn set_surface_block(&mut self, x: usize, z: usize, block: BlockState) {
        if let Some(i) = index(x, z) {
            self.surface_blocks[i] = Some(block);
        }
    }

    /// Stores a custom buffer, replacing any previous one.
    pub fn put_custom(&mut self, key: impl Into<String>, bytes: Vec<u8>) {
        self.custom.insert(key.into(), bytes);
    }

    /// Custom buffer stored under `key`, or `fallback`.
    #[must_use]
    pub fn get_custom<'a>(&'a self, key: &str, fallback: &'a [u8]) -> &'a [u8] {
        self.custom.get(key).map_or(fallback, Vec::as_slice)
    }

    /// Mutable access to a custom buffer, if present.
    pub fn custom_mut(&mut self, key: &str) -> Option<&mut Vec<u8>> {
        self.custom.get_mut(key)
    }

    /// Freezes the builder. Unset cells stay unset.
    #[must_use]
    pub fn build(self) -> ColumnData {
        let mut surface_min = i32::MAX;
        let mut surface_max = i32::MIN;
        for (&surface, &water) in self.surface_height.iter().zip(&self.water_depth) {
            let (top, bottom) = if surface == HEIGHT_UNSET {
                (SEA_LEVEL, SEA_LEVEL)
            } else {
                (surface, ground(surface, water))
            };
            surface_min = surface_min.min(bottom);
            surface_max = surface_max.max(top);
        }

        ColumnData {
            surface_height: self.surface_height,
            biomes: self.biomes,
            water_depth: self.water_depth,
            surface_blocks: self.surface_blocks,
            custom: self
                .custom
                .into_iter()
                .map(|(key, bytes)| (key, bytes.into_boxed_slice()))
                .collect(),
            surface_min,
            surface_max,
        }
    }
}
