//! # Tile URL Selection
//!
//! A dataset may be served by several URL templates, each covering a
//! region of the world at one zoom level. `UrlTable` keeps one BVH of
//! templates per zoom and answers "which URLs could serve this tile, best
//! first".
//!
//! ## Template Placeholders
//!
//! | Placeholder  | Value                                  |
//! |--------------|----------------------------------------|
//! | `${x}`       | tile X                                 |
//! | `${z}`       | tile Z                                 |
//! | `${zoom}`    | zoom level                             |
//! | `${lon.min}` | western edge of the tile, in degrees   |
//! | `${lon.max}` | eastern edge                           |
//! | `${lat.min}` | southern edge                          |
//! | `${lat.max}` | northern edge                          |

use std::collections::BTreeMap;
use std::sync::Arc;

use terra_core::{Bounded, Bounds2d, Bvh};

use crate::projection::{geo_bounds, GeoBounds, GeographicProjection};
use crate::tile::TileKey;

/// A URL template with the region and zoom level it serves.
#[derive(Clone, Debug, PartialEq)]
pub struct WrappedUrl {
    template: String,
    bounds: Bounds2d,
    zoom: u8,
    priority: f64,
    /// Position in the configured list; breaks priority ties.
    order: usize,
}

impl WrappedUrl {
    /// Creates a URL entry. `bounds` is in world block coordinates.
    pub fn new(template: impl Into<String>, bounds: Bounds2d, zoom: u8, priority: f64) -> Self {
        Self {
            template: template.into(),
            bounds,
            zoom,
            priority,
            order: 0,
        }
    }

    /// Creates a URL entry that serves the whole world.
    pub fn unbounded(template: impl Into<String>, zoom: u8, priority: f64) -> Self {
        Self::new(template, Bounds2d::EVERYTHING, zoom, priority)
    }

    /// The raw template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Zoom level served.
    #[must_use]
    pub const fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Higher priorities are tried first.
    #[must_use]
    pub const fn priority(&self) -> f64 {
        self.priority
    }

    /// Expands every placeholder for one tile.
    #[must_use]
    pub fn expand(&self, key: TileKey, geo: Option<&GeoBounds>) -> String {
        let mut url = self
            .template
            .replace("${x}", &key.x.to_string())
            .replace("${z}", &key.z.to_string())
            .replace("${zoom}", &key.zoom.to_string());
        if let Some(geo) = geo {
            url = url
                .replace("${lon.min}", &geo.lon_min.to_string())
                .replace("${lon.max}", &geo.lon_max.to_string())
                .replace("${lat.min}", &geo.lat_min.to_string())
                .replace("${lat.max}", &geo.lat_max.to_string());
        }
        url
    }
}

impl Bounded for WrappedUrl {
    fn bounds(&self) -> Bounds2d {
        self.bounds
    }
}

/// Per-zoom BVHs of URL templates for one dataset.
#[derive(Debug)]
pub struct UrlTable {
    tile_size: u32,
    by_zoom: BTreeMap<u8, Bvh<Arc<WrappedUrl>>>,
    projection: Arc<dyn GeographicProjection>,
}

impl UrlTable {
    /// Groups `urls` by zoom and indexes each group.
    ///
    /// `tile_size` is the number of samples along one tile edge; a tile at
    /// zoom `z` spans `tile_size << z` blocks.
    #[must_use]
    pub fn new(urls: Vec<WrappedUrl>, tile_size: u32, projection: Arc<dyn GeographicProjection>) -> Self {
        let mut grouped: BTreeMap<u8, Vec<Arc<WrappedUrl>>> = BTreeMap::new();
        for (order, mut url) in urls.into_iter().enumerate() {
            url.order = order;
            grouped.entry(url.zoom).or_default().push(Arc::new(url));
        }

        let by_zoom = grouped
            .into_iter()
            .map(|(zoom, urls)| (zoom, Bvh::new(urls)))
            .collect();

        Self {
            tile_size,
            by_zoom,
            projection,
        }
    }

    /// Samples along one tile edge.
    #[must_use]
    pub const fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Zoom levels that have at least one URL.
    pub fn zoom_levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.by_zoom.keys().copied()
    }

    /// The projection placeholders are computed with.
    #[must_use]
    pub fn projection(&self) -> &Arc<dyn GeographicProjection> {
        &self.projection
    }

    /// World-space extent of a tile.
    #[must_use]
    pub fn tile_bounds(&self, key: TileKey) -> Bounds2d {
        let span = f64::from(self.tile_size) * f64::from(1u32 << key.zoom.min(31));
        let x = f64::from(key.x) * span;
        let z = f64::from(key.z) * span;
        Bounds2d::of(x, x + span, z, z + span)
    }

    /// Expanded candidate URLs for a tile, highest priority first.
    ///
    /// Empty when nothing is configured for the zoom level, when no template
    /// covers the tile, or when the tile lies outside the projection domain.
    #[must_use]
    pub fn urls_for(&self, key: TileKey) -> Vec<String> {
        let Some(bvh) = self.by_zoom.get(&key.zoom) else {
            return Vec::new();
        };

        let full = self.tile_bounds(key);
        // Only the sample positions matter: the far edge belongs to the next tile
        let step = f64::from(1u32 << key.zoom.min(31));
        let samples = Bounds2d::of(full.min_x(), full.max_x() - step, full.min_z(), full.max_z() - step);

        let mut matches: Vec<&Arc<WrappedUrl>> = bvh.get_all_intersecting(&samples);
        if matches.is_empty() {
            return Vec::new();
        }

        let geo = match geo_bounds(self.projection.as_ref(), &full) {
            Ok(geo) => geo,
            Err(error) => {
                tracing::debug!(tile = %key, %error, "tile outside projection domain");
                return Vec::new();
            }
        };

        matches.sort_by(|a, b| b.priority.total_cmp(&a.priority).then(a.order.cmp(&b.order)));
        matches.into_iter().map(|url| url.expand(key, Some(&geo))).collect()
    }
}
