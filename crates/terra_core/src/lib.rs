//! # TERRA Core
//!
//! Spatial primitives and caching shared by every TERRA crate.
//!
//! ## Core Components
//!
//! - `Bounds2d`: axis-aligned box on the X/Z plane
//! - `Bvh`: immutable quadtree index over anything `Bounded`
//! - `AsyncCache`: single-flight cache with idle expiry and a size bound
//!
//! ## Example
//!
//! ```rust,ignore
//! use terra_core::{Bounds2d, Bvh};
//!
//! let boxes = vec![
//!     Bounds2d::of(0.0, 10.0, 0.0, 10.0),
//!     Bounds2d::of(50.0, 60.0, 50.0, 60.0),
//! ];
//! let bvh = Bvh::new(boxes);
//! let hits = bvh.get_all_intersecting(&Bounds2d::point(5.0, 5.0));
//! assert_eq!(hits.len(), 1);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bounds;
pub mod bvh;
pub mod cache;
pub mod error;

pub use bounds::Bounds2d;
pub use bvh::{Bounded, Bvh, BvhSettings};
pub use cache::{AsyncCache, CacheFuture, CacheSettings};
pub use error::{CoreError, CoreResult};
