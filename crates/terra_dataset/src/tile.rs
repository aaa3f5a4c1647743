//! # Tile Cache
//!
//! Maps `(x, z, zoom)` tile keys to decoded payloads.
//!
//! ## Pipeline
//!
//! ```text
//!  get(key) ──► AsyncCache (single-flight, TTL)
//!                   │ miss
//!                   ▼
//!              UrlTable::urls_for(key) ── empty ──► Ok(None)
//!                   │ candidates, best first
//!                   ▼
//!              fetch(url) ─► decode(key, bytes) ── ok ──► Ok(Some(tile))
//!                   │ error: try next candidate
//!                   ▼
//!              Err(FetchAggregateFailure { causes })
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::BoxFuture;

use terra_core::{AsyncCache, CacheFuture, CacheSettings};

use crate::error::{DatasetError, DecodeError, FetchError, UrlFailure};
use crate::url::UrlTable;

/// Identifies one tile in a zoom-specific grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Tile X.
    pub x: i32,
    /// Tile Z.
    pub z: i32,
    /// Zoom level; a tile at zoom `n` spans `tile_size << n` blocks.
    pub zoom: u8,
}

impl TileKey {
    /// Creates a tile key.
    #[inline]
    #[must_use]
    pub const fn new(x: i32, z: i32, zoom: u8) -> Self {
        Self { x, z, zoom }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}@{}", self.x, self.z, self.zoom)
    }
}

/// Transport collaborator: retrieves raw bytes for a URL.
///
/// Retries and timeouts belong to the implementation.
pub trait TileFetcher: Send + Sync + 'static {
    /// Fetches the body behind `url`.
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, FetchError>>;
}

/// Per-dataset decoder: turns fetched bytes into a tile payload.
pub trait TileDecoder<T>: Send + Sync + 'static {
    /// Decodes the payload of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the bytes are not a valid tile.
    fn decode(&self, key: TileKey, bytes: &[u8]) -> Result<T, DecodeError>;
}

impl<T, F> TileDecoder<T> for F
where
    F: Fn(TileKey, &[u8]) -> Result<T, DecodeError> + Send + Sync + 'static,
{
    fn decode(&self, key: TileKey, bytes: &[u8]) -> Result<T, DecodeError> {
        self(key, bytes)
    }
}

/// A decoded tile, or `None` when no URL is configured for it.
pub type TileFuture<T> = CacheFuture<Option<Arc<T>>, DatasetError>;

/// Single-flight cache of decoded tiles for one dataset.
pub struct TileCache<T> {
    name: &'static str,
    urls: Arc<UrlTable>,
    fetcher: Arc<dyn TileFetcher>,
    decoder: Arc<dyn TileDecoder<T>>,
    cache: AsyncCache<TileKey, Option<Arc<T>>, DatasetError>,
}

impl<T: Send + Sync + 'static> TileCache<T> {
    /// Creates a tile cache for one dataset. `name` tags log output.
    pub fn new(
        name: &'static str,
        urls: Arc<UrlTable>,
        fetcher: Arc<dyn TileFetcher>,
        decoder: Arc<dyn TileDecoder<T>>,
        settings: CacheSettings,
    ) -> Self {
        Self {
            name,
            urls,
            fetcher,
            decoder,
            cache: AsyncCache::new(name, settings),
        }
    }

    /// The URL table tiles are resolved against.
    #[must_use]
    pub fn urls(&self) -> &Arc<UrlTable> {
        &self.urls
    }

    /// Samples along one tile edge.
    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.urls.tile_size()
    }

    /// Number of tiles currently cached or in flight.
    #[must_use]
    pub fn cached_tiles(&self) -> usize {
        self.cache.len()
    }

    /// Drops idle tiles now instead of waiting for the next lazy sweep.
    pub fn evict_expired(&self) {
        self.cache.evict_expired();
    }

    /// Returns the tile for `key`.
    ///
    /// Concurrent calls for the same key share one fetch. Resolves to
    /// `Ok(None)` when no URL serves the tile, and fails with
    /// [`DatasetError::FetchAggregateFailure`] when every candidate failed.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn get(&self, key: TileKey) -> TileFuture<T> {
        self.cache.get_or_insert_with(key, || {
            let name = self.name;
            let urls = self.urls.urls_for(key);
            let fetcher = Arc::clone(&self.fetcher);
            let decoder = Arc::clone(&self.decoder);
            async move { load_tile(name, key, urls, fetcher.as_ref(), decoder.as_ref()).await }
        })
    }
}

impl<T> fmt::Debug for TileCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileCache")
            .field("name", &self.name)
            .field("urls", &self.urls)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

/// Tries each candidate in order and returns the first tile that decodes.
async fn load_tile<T: Send + Sync + 'static>(
    name: &'static str,
    key: TileKey,
    urls: Vec<String>,
    fetcher: &dyn TileFetcher,
    decoder: &dyn TileDecoder<T>,
) -> Result<Option<Arc<T>>, DatasetError> {
    if urls.is_empty() {
        tracing::trace!(dataset = name, tile = %key, "no candidate urls");
        return Ok(None);
    }

    let mut causes = Vec::new();
    for url in urls {
        let attempt = match fetcher.fetch(&url).await {
            Ok(bytes) => decoder.decode(key, &bytes).map_err(DatasetError::from),
            Err(error) => Err(DatasetError::from(error)),
        };

        match attempt {
            Ok(tile) => {
                tracing::trace!(dataset = name, tile = %key, %url, "tile loaded");
                return Ok(Some(Arc::new(tile)));
            }
            Err(cause) => {
                tracing::warn!(dataset = name, tile = %key, %url, error = %cause, "tile url failed");
                causes.push(UrlFailure { url, cause });
            }
        }
    }

    Err(DatasetError::FetchAggregateFailure { key, causes })
}
