//! # Column Pipeline
//!
//! Produces one [`ColumnData`] per column from an ordered list of steps.
//!
//! ## Bake Sequence
//!
//! ```text
//!  get(coord) ──► AsyncCache (single-flight, TTL)
//!                   │ miss
//!                   ▼
//!   request_data(coord) for every step, concurrently
//!                   │ join all; first error aborts the column
//!                   ▼
//!   bake(step 1) → bake(step 2) → ... → bake(step n)    (declared order)
//!                   │
//!                   ▼
//!           builder.build() ──► Arc<ColumnData>
//! ```

use std::fmt;
use std::sync::Arc;

use futures::future::{try_join_all, BoxFuture, FutureExt};

use terra_core::{AsyncCache, CacheFuture, CacheSettings};
use terra_dataset::{GeographicProjection, TileCache, TiledRasterDataset};

use crate::column::{ColumnCoord, ColumnData, ColumnDataBuilder};
use crate::error::{PipelineError, PipelineResult};
use crate::steps::{BiomesStep, GeometryRegions, HeightsStep, NullIslandStep, OsmStep, TreeCoverStep};

/// One stage of column generation.
///
/// `request_data` gathers whatever the step needs (possibly remote) without
/// touching shared state; `bake` then writes it into the column. Bakes run
/// sequentially in declared order, so a later step may override an earlier
/// one.
pub trait BakingStep: Send + Sync + 'static {
    /// Data handed from `request_data` to `bake`.
    type Data: Send + 'static;

    /// Short name for logs and errors.
    fn name(&self) -> &'static str;

    /// Loads the data for `coord`.
    ///
    /// # Errors
    ///
    /// Any error aborts the whole column.
    fn request_data(&self, coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<Self::Data>>;

    /// Writes `data` into the column under construction.
    fn bake(&self, coord: ColumnCoord, builder: &mut ColumnDataBuilder, data: Self::Data);
}

type BakeFn = Box<dyn FnOnce(&mut ColumnDataBuilder) + Send>;

/// Object-safe view of a [`BakingStep`]: the request resolves to a closure
/// that bakes the loaded data.
trait ErasedStep: Send + Sync {
    fn name(&self) -> &'static str;
    fn request(self: Arc<Self>, coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<BakeFn>>;
}

impl<S: BakingStep> ErasedStep for S {
    fn name(&self) -> &'static str {
        BakingStep::name(self)
    }

    fn request(self: Arc<Self>, coord: ColumnCoord) -> BoxFuture<'static, PipelineResult<BakeFn>> {
        let pending = self.request_data(coord);
        async move {
            let data = pending.await?;
            let bake: BakeFn = Box::new(move |builder| self.bake(coord, builder, data));
            Ok(bake)
        }
        .boxed()
    }
}

/// Builder for a [`ColumnPipeline`].
pub struct ColumnPipelineBuilder {
    steps: Vec<Arc<dyn ErasedStep>>,
    projection: Option<Arc<dyn GeographicProjection>>,
    settings: CacheSettings,
}

impl ColumnPipelineBuilder {
    /// Appends a step; steps bake in the order they are added.
    #[must_use]
    pub fn step<S: BakingStep>(mut self, step: S) -> Self {
        self.steps.push(Arc::new(step));
        self
    }

    /// Columns entirely outside this projection's domain skip every step and
    /// resolve to [`ColumnData::blank`].
    #[must_use]
    pub fn projection(mut self, projection: Arc<dyn GeographicProjection>) -> Self {
        self.projection = Some(projection);
        self
    }

    /// Column cache policy.
    #[must_use]
    pub fn cache_settings(mut self, settings: CacheSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Finishes the pipeline.
    #[must_use]
    pub fn build(self) -> ColumnPipeline {
        ColumnPipeline {
            steps: self.steps.into(),
            projection: self.projection,
            cache: AsyncCache::new("columns", self.settings),
        }
    }
}

/// Generates and caches [`ColumnData`].
pub struct ColumnPipeline {
    steps: Arc<[Arc<dyn ErasedStep>]>,
    projection: Option<Arc<dyn GeographicProjection>>,
    cache: AsyncCache<ColumnCoord, Arc<ColumnData>, PipelineError>,
}

impl ColumnPipeline {
    /// Starts an empty pipeline.
    #[must_use]
    pub fn builder() -> ColumnPipelineBuilder {
        ColumnPipelineBuilder {
            steps: Vec::new(),
            projection: None,
            settings: CacheSettings::default(),
        }
    }

    /// The built-in generator: heights, tree cover, OSM features, biomes
    /// and the null island, in that order.
    ///
    /// # Errors
    ///
    /// Fails if the projection cannot place the geographic origin.
    pub fn standard(
        heights: TiledRasterDataset,
        tree_cover: TiledRasterDataset,
        osm: Arc<TileCache<GeometryRegions>>,
        projection: Arc<dyn GeographicProjection>,
        settings: CacheSettings,
    ) -> PipelineResult<Self> {
        let null_island = NullIslandStep::new(projection.as_ref())?;
        Ok(Self::builder()
            .step(HeightsStep::new(heights))
            .step(TreeCoverStep::new(tree_cover))
            .step(OsmStep::new(osm))
            .step(BiomesStep)
            .step(null_island)
            .projection(projection)
            .cache_settings(settings)
            .build())
    }

    /// Names of the configured steps, in bake order.
    pub fn step_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(|step| step.name())
    }

    /// Number of columns currently cached or in flight.
    #[must_use]
    pub fn cached_columns(&self) -> usize {
        self.cache.len()
    }

    /// Returns the column at `coord`.
    ///
    /// Concurrent calls for the same column share one bake. A failed bake is
    /// reported to every waiter and retried on the next call.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn get(&self, coord: ColumnCoord) -> CacheFuture<Arc<ColumnData>, PipelineError> {
        self.cache.get_or_insert_with(coord, || {
            let steps = Arc::clone(&self.steps);
            let outside = self
                .projection
                .as_ref()
                .is_some_and(|p| p.bounds().intersection(&coord.bounds()).is_none());
            async move {
                if outside {
                    tracing::debug!(column = %coord, "column outside projection, using blank data");
                    return Ok(Arc::new(ColumnData::blank()));
                }
                bake_column(coord, &steps).await.map(Arc::new)
            }
        })
    }
}

impl fmt::Debug for ColumnPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnPipeline")
            .field("steps", &self.step_names().collect::<Vec<_>>())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

async fn bake_column(coord: ColumnCoord, steps: &[Arc<dyn ErasedStep>]) -> PipelineResult<ColumnData> {
    let requests = steps.iter().map(|step| Arc::clone(step).request(coord));
    let bakes = match try_join_all(requests).await {
        Ok(bakes) => bakes,
        Err(error) => {
            tracing::error!(column = %coord, %error, "column data request failed, column not baked");
            return Err(error);
        }
    };

    let mut builder = ColumnDataBuilder::new();
    for bake in bakes {
        bake(&mut builder);
    }
    tracing::trace!(column = %coord, "column baked");
    Ok(builder.build())
}
