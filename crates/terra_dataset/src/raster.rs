//! # Scalar Rasters
//!
//! Tiled datasets of one `f64` per sample (elevation in blocks, tree cover
//! as a 0..1 fraction, ...).
//!
//! ## Sample Space
//!
//! At zoom `n` one sample covers `2^n` blocks. A tile holds
//! `tile_size x tile_size` samples, so tile `(tx, tz)` starts at sample
//! `(tx * tile_size, tz * tile_size)`. Missing samples are `NaN`.

use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};

use terra_core::Bounds2d;

use crate::error::{DatasetResult, DecodeError};
use crate::tile::{TileCache, TileKey};

/// A square grid of scalar samples, indexed `[z * size + x]`.
#[derive(Clone, Debug, PartialEq)]
pub struct ScalarRaster {
    size: u32,
    samples: Vec<f64>,
}

impl ScalarRaster {
    /// Wraps `samples` as a `size x size` raster.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the sample count is not `size * size`.
    pub fn new(size: u32, samples: Vec<f64>) -> Result<Self, DecodeError> {
        let expected = size as usize * size as usize;
        if samples.len() == expected {
            Ok(Self { size, samples })
        } else {
            Err(DecodeError::new(format!(
                "raster of size {size} needs {expected} samples, got {}",
                samples.len()
            )))
        }
    }

    /// A raster with every sample set to `value`.
    #[must_use]
    pub fn filled(size: u32, value: f64) -> Self {
        Self {
            size,
            samples: vec![value; size as usize * size as usize],
        }
    }

    /// Samples along one edge.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Sample at `(x, z)`, or `NaN` outside the raster.
    #[must_use]
    pub fn get(&self, x: u32, z: u32) -> f64 {
        if x < self.size && z < self.size {
            self.samples[(z * self.size + x) as usize]
        } else {
            f64::NAN
        }
    }
}

/// A tiled scalar dataset sampled in per-column grids.
#[derive(Debug, Clone)]
pub struct TiledRasterDataset {
    tiles: Arc<TileCache<ScalarRaster>>,
}

impl TiledRasterDataset {
    /// Wraps a tile cache of rasters.
    #[must_use]
    pub fn new(tiles: Arc<TileCache<ScalarRaster>>) -> Self {
        Self { tiles }
    }

    /// The underlying tile cache.
    #[must_use]
    pub fn tiles(&self) -> &Arc<TileCache<ScalarRaster>> {
        &self.tiles
    }

    /// Reads a `size x size` grid of samples starting at sample
    /// `(origin_x, origin_z)` of zoom level `zoom`.
    ///
    /// The result is indexed `[z * size + x]`; samples in tiles without
    /// configured data are `NaN`. Fails if any covering tile failed to load.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn sample_grid(
        &self,
        origin_x: i64,
        origin_z: i64,
        zoom: u8,
        size: u32,
    ) -> BoxFuture<'static, DatasetResult<Vec<f64>>> {
        let tile_size = i64::from(self.tiles.tile_size().max(1));
        let extent = i64::from(size);
        // Samples [origin, origin + size) cover the continuous span [origin, origin + size]
        #[allow(clippy::cast_precision_loss)]
        let footprint = Bounds2d::of(
            origin_x as f64,
            (origin_x + extent) as f64,
            origin_z as f64,
            (origin_z + extent) as f64,
        );

        #[allow(clippy::cast_precision_loss)]
        let keys: Vec<TileKey> = footprint
            .to_tiles(tile_size as f64)
            .into_iter()
            .map(|(tx, tz)| TileKey::new(tx, tz, zoom))
            .collect();
        let pending: Vec<_> = keys.iter().map(|&key| self.tiles.get(key)).collect();

        async move {
            let loaded = try_join_all(pending).await?;
            let mut grid = vec![f64::NAN; size as usize * size as usize];

            for (key, tile) in keys.iter().zip(loaded) {
                let Some(tile) = tile else { continue };
                let tile_x0 = i64::from(key.x) * tile_size;
                let tile_z0 = i64::from(key.z) * tile_size;

                for gz in 0..i64::from(size) {
                    let sz = origin_z + gz - tile_z0;
                    if !(0..tile_size).contains(&sz) {
                        continue;
                    }
                    for gx in 0..i64::from(size) {
                        let sx = origin_x + gx - tile_x0;
                        if !(0..tile_size).contains(&sx) {
                            continue;
                        }
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let value = tile.get(sx as u32, sz as u32);
                        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                        let index = (gz * i64::from(size) + gx) as usize;
                        grid[index] = value;
                    }
                }
            }
            Ok(grid)
        }
        .boxed()
    }
}
