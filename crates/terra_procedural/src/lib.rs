//! # TERRA Procedural Generation
//!
//! Turns geographic datasets into per-column terrain for a voxel world.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: same column + same data = same `ColumnData`
//! 2. **Ordered**: steps bake in declared order, later steps override
//! 3. **All or nothing**: a column either bakes fully or fails
//! 4. **Degrading**: a missing tile becomes ocean or bare land, never a crash
//!
//! ## Core Components
//!
//! - `ColumnPipeline`: concurrent data requests, ordered bakes, column cache
//! - `ColumnData`: immutable 16x16 heights, biomes, water, custom buffers
//! - `VectorGeometry`: line/polygon rasterization through `DrawFunction`s
//! - `steps`: heights, tree cover, OSM, biomes, null island
//!
//! ## Example
//!
//! ```rust,ignore
//! use terra_procedural::{ColumnCoord, ColumnPipeline};
//!
//! let pipeline = ColumnPipeline::standard(heights, tree_cover, osm, projection, settings)?;
//! let column = pipeline.get(ColumnCoord::chunk(120, -45)).await?;
//!
//! if column.intersects_surface(cube_min_y, cube_max_y) {
//!     place_surface(&column);
//! }
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod column;
pub mod error;
pub mod geometry;
pub mod pipeline;
pub mod steps;

pub use biome::Biome;
pub use column::{
    BlockState, ColumnCoord, ColumnData, ColumnDataBuilder, COLUMN_AREA, COLUMN_SIZE, HEIGHT_UNSET, SEA_LEVEL,
    TREE_COVER_KEY, WATER_DEPTH_MASK, WATER_NONE, WATER_OCEAN, WATER_RIVER, WATER_TYPE_MASK,
};
pub use error::{PipelineError, PipelineResult};
pub use geometry::{
    rasterize_column, wide_line_weight, DrawFunction, GeometryStyle, MultiLineString, MultiPolygon, Point, Polygon,
    Segment, VectorGeometry,
};
pub use pipeline::{BakingStep, ColumnPipeline, ColumnPipelineBuilder};
pub use steps::{BiomesStep, GeometryRegions, HeightsStep, NullIslandStep, OsmStep, TreeCoverStep};
