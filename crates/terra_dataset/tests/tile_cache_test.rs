//! Integration tests for tile fetching, fallback and raster sampling.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::{join_all, BoxFuture, FutureExt};

use terra_core::{Bounds2d, CacheSettings};
use terra_dataset::{
    DatasetError, DecodeError, EquirectangularProjection, FetchError, ScalarRaster, TileCache, TileFetcher, TileKey,
    TiledRasterDataset, UrlTable, WrappedUrl,
};

/// In-memory transport that records every request.
#[derive(Default)]
struct MockFetcher {
    responses: HashMap<String, Vec<u8>>,
    requests: Mutex<Vec<String>>,
}

impl MockFetcher {
    fn with(mut self, url: &str, body: &str) -> Self {
        self.responses.insert(url.to_string(), body.as_bytes().to_vec());
        self
    }

    fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl TileFetcher for MockFetcher {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Vec<u8>, FetchError>> {
        self.requests.lock().unwrap().push(url.to_string());
        let response = self
            .responses
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new(url, "404"));
        async move {
            tokio::task::yield_now().await;
            response
        }
        .boxed()
    }
}

/// Bodies are a single number; every sample of the tile gets that value.
fn decode_filled(_key: TileKey, bytes: &[u8]) -> Result<ScalarRaster, DecodeError> {
    let text = std::str::from_utf8(bytes).map_err(|e| DecodeError::new(e.to_string()))?;
    let value: f64 = text.trim().parse().map_err(|_| DecodeError::new(format!("not a number: {text}")))?;
    Ok(ScalarRaster::filled(2, value))
}

fn tile_cache(urls: Vec<WrappedUrl>, fetcher: Arc<MockFetcher>) -> TileCache<ScalarRaster> {
    let projection = Arc::new(EquirectangularProjection::new(256.0).unwrap());
    let table = Arc::new(UrlTable::new(urls, 2, projection));
    TileCache::new("test", table, fetcher, Arc::new(decode_filled), CacheSettings::default())
}

#[tokio::test]
async fn test_concurrent_gets_share_one_fetch() {
    let fetcher = Arc::new(MockFetcher::default().with("mem/3/4", "7"));
    let cache = tile_cache(vec![WrappedUrl::unbounded("mem/${x}/${z}", 0, 1.0)], Arc::clone(&fetcher));

    let results = join_all((0..100).map(|_| cache.get(TileKey::new(3, 4, 0)))).await;

    for result in results {
        let tile = result.unwrap().expect("tile should be configured");
        assert_eq!(tile.get(0, 0), 7.0);
    }
    assert_eq!(fetcher.requests().len(), 1, "100 concurrent requests should cause one fetch");
    assert_eq!(cache.cached_tiles(), 1);
}

#[tokio::test]
async fn test_falls_back_to_lower_priority_url() {
    let fetcher = Arc::new(MockFetcher::default().with("backup/1", "2"));
    let cache = tile_cache(
        vec![
            WrappedUrl::unbounded("backup/${x}", 0, 1.0),
            WrappedUrl::unbounded("primary/${x}", 0, 9.0),
        ],
        Arc::clone(&fetcher),
    );

    let tile = cache.get(TileKey::new(1, 0, 0)).await.unwrap().unwrap();
    assert_eq!(tile.get(1, 1), 2.0);
    assert_eq!(fetcher.requests(), vec!["primary/1".to_string(), "backup/1".to_string()]);
}

#[tokio::test]
async fn test_all_urls_failing_reports_every_cause() {
    // First candidate fetches but does not decode, second is missing
    let fetcher = Arc::new(MockFetcher::default().with("a/0", "garbage"));
    let cache = tile_cache(
        vec![
            WrappedUrl::unbounded("a/${x}", 0, 2.0),
            WrappedUrl::unbounded("b/${x}", 0, 1.0),
        ],
        Arc::clone(&fetcher),
    );

    let err = cache.get(TileKey::new(0, 0, 0)).await.unwrap_err();
    match err {
        DatasetError::FetchAggregateFailure { key, causes } => {
            assert_eq!(key, TileKey::new(0, 0, 0));
            assert_eq!(causes.len(), 2);
            assert_eq!(causes[0].url, "a/0");
            assert!(matches!(causes[0].cause, DatasetError::Decode(_)));
            assert_eq!(causes[1].url, "b/0");
            assert!(matches!(causes[1].cause, DatasetError::Fetch(_)));
        }
        other => panic!("expected aggregate failure, got {other:?}"),
    }

    // Failures are not cached: the next request tries again
    let _ = cache.get(TileKey::new(0, 0, 0)).await;
    assert_eq!(fetcher.requests().len(), 4);
}

#[tokio::test]
async fn test_unconfigured_tile_is_none() {
    let fetcher = Arc::new(MockFetcher::default());
    let cache = tile_cache(
        vec![WrappedUrl::new("mem/${x}", Bounds2d::of(0.0, 10.0, 0.0, 10.0), 0, 1.0)],
        Arc::clone(&fetcher),
    );

    assert!(cache.get(TileKey::new(50, 50, 0)).await.unwrap().is_none());
    assert!(cache.get(TileKey::new(0, 0, 5)).await.unwrap().is_none());
    assert!(fetcher.requests().is_empty(), "nothing should be fetched without a url");
}

#[tokio::test]
async fn test_sample_grid_spans_tiles() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with("mem/0/0", "0")
            .with("mem/1/0", "1"),
    );
    // Only samples with z in [0, 1] are served, so tile row z = 1 has no data
    let cache = tile_cache(
        vec![WrappedUrl::new("mem/${x}/${z}", Bounds2d::of(0.0, 3.0, 0.0, 1.0), 0, 1.0)],
        Arc::clone(&fetcher),
    );
    let dataset = TiledRasterDataset::new(Arc::new(cache));

    let grid = dataset.sample_grid(1, 1, 0, 2).await.unwrap();

    assert_eq!(grid.len(), 4);
    assert_eq!(grid[0], 0.0, "sample (1, 1) lies in tile (0, 0)");
    assert_eq!(grid[1], 1.0, "sample (2, 1) lies in tile (1, 0)");
    assert!(grid[2].is_nan(), "tile (0, 1) has no configured url");
    assert!(grid[3].is_nan(), "tile (1, 1) has no configured url");

    let mut requested = fetcher.requests();
    requested.sort();
    assert_eq!(requested, vec!["mem/0/0".to_string(), "mem/1/0".to_string()]);
}

#[tokio::test]
async fn test_sample_grid_fails_when_a_tile_fails() {
    let fetcher = Arc::new(MockFetcher::default().with("mem/0/0", "0"));
    let cache = tile_cache(vec![WrappedUrl::unbounded("mem/${x}/${z}", 0, 1.0)], fetcher);
    let dataset = TiledRasterDataset::new(Arc::new(cache));

    let result = dataset.sample_grid(0, 0, 0, 4).await;
    assert!(matches!(result, Err(DatasetError::FetchAggregateFailure { .. })));
}
