//! # TERRA Dataset
//!
//! Access to remote, tiled geographic datasets.
//!
//! ## Core Components
//!
//! - `GeographicProjection`: world blocks <-> longitude/latitude
//! - `UrlTable`: per-zoom BVH of candidate URL templates
//! - `TileCache`: single-flight fetch + decode with prioritized fallback
//! - `TiledRasterDataset`: per-column sample grids from scalar tiles
//! - `DatasetConfig`: TOML dataset definitions
//!
//! ## Example
//!
//! ```rust,ignore
//! use terra_dataset::{DatasetConfig, TileCache, TileKey, UrlTable};
//!
//! let config = DatasetConfig::from_toml_str(&std::fs::read_to_string("elevation.toml")?)?;
//! let urls = Arc::new(UrlTable::new(config.wrapped_urls()?, config.tile_size, projection));
//! let tiles = TileCache::new("elevation", urls, fetcher, decoder, config.cache.settings());
//!
//! match tiles.get(TileKey::new(12, -4, 0)).await? {
//!     Some(tile) => use_tile(&tile),
//!     None => {} // nothing configured here
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod projection;
pub mod raster;
pub mod tile;
pub mod url;

pub use config::{CacheConfig, DatasetConfig, UrlConfig};
pub use error::{DatasetError, DatasetResult, DecodeError, FetchError, UrlFailure};
pub use projection::{geo_bounds, EquirectangularProjection, GeoBounds, GeographicProjection};
pub use raster::{ScalarRaster, TiledRasterDataset};
pub use tile::{TileCache, TileDecoder, TileFetcher, TileFuture, TileKey};
pub use url::{UrlTable, WrappedUrl};
