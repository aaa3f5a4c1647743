//! # Core Error Types
//!
//! Errors produced by the spatial primitives and the async cache.

use thiserror::Error;

/// Errors that can occur in the core crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A bounding box was constructed with `min > max` on some axis, or with
    /// a NaN coordinate.
    #[error("invalid bounds: x [{min_x}, {max_x}], z [{min_z}, {max_z}]")]
    InvalidBounds {
        /// Requested minimum X.
        min_x: f64,
        /// Requested maximum X.
        max_x: f64,
        /// Requested minimum Z.
        min_z: f64,
        /// Requested maximum Z.
        max_z: f64,
    },

    /// A spawned cache computation panicked or was aborted by the runtime.
    #[error("cache computation failed: {0}")]
    TaskFailed(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
