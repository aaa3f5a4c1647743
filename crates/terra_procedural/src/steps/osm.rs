//! Vector features (OpenStreetMap roads, waterways, buildings...).
//!
//! Geometries are distributed in square regions; each region tile decodes
//! to a BVH of the geometries touching it. A geometry crossing a region
//! border appears in several regions and is drawn once.

use std::sync::Arc;

use futures::future::{join_all, BoxFuture, FutureExt};

use terra_core::Bvh;
use terra_dataset::{TileCache, TileKey};

use crate::column::{ColumnCoord, ColumnDataBuilder};
use crate::error::PipelineResult;
use crate::geometry::{rasterize_column, VectorGeometry};
use crate::pipeline::BakingStep;

/// Decoded payload of one geometry region.
pub type GeometryRegions = Bvh<Arc<VectorGeometry>>;

/// Rasterizes every geometry touching the column, in draw order.
#[derive(Debug, Clone)]
pub struct OsmStep {
    regions: Arc<TileCache<GeometryRegions>>,
}

impl OsmStep {
    /// Creates the step. Region tiles are zoom 0, `tile_size` blocks wide.
    #[must_use]
    pub fn new(regions: Arc<TileCache<GeometryRegions>>) -> Self {
        Self { regions }
    }
}

impl BakingStep for OsmStep {
    type Data = Vec<Arc<GeometryRegions>>;

    fn name(&self) -> &'static str {
        "osm"
    }

    fn request_data(&self, coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<Self::Data>> {
        let region_size = f64::from(self.regions.tile_size().max(1));
        let pending: Vec<_> = coord
            .bounds()
            .to_tiles(region_size)
            .into_iter()
            .map(|(x, z)| {
                let key = TileKey::new(x, z, 0);
                self.regions.get(key).map(move |result| (key, result))
            })
            .collect();

        async move {
            let mut regions = Vec::with_capacity(pending.len());
            for (key, result) in join_all(pending).await {
                match result {
                    Ok(Some(region)) => regions.push(region),
                    Ok(None) => {}
                    Err(error) => {
                        tracing::warn!(column = %coord, region = %key, %error, "geometry region unavailable, skipping");
                    }
                }
            }
            Ok(regions)
        }
        .boxed()
    }

    fn bake(&self, coord: ColumnCoord, builder: &mut ColumnDataBuilder, data: Self::Data) {
        let column = coord.bounds();
        let mut hits = Vec::new();
        for region in &data {
            region.for_each_intersecting(&column, |geometry| hits.push(geometry));
        }
        rasterize_column(hits, builder, coord);
    }
}
