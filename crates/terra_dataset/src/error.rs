//! # Dataset Error Types
//!
//! All errors that can occur while locating, fetching and decoding tiles.
//!
//! Every type here is `Clone`: one failed tile computation is shared by all
//! of its waiters.

use thiserror::Error;

use terra_core::CoreError;

use crate::tile::TileKey;

/// A transport-level failure for one URL.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("fetch failed for {url}: {message}")]
pub struct FetchError {
    /// URL that was requested.
    pub url: String,
    /// Transport error description.
    pub message: String,
}

impl FetchError {
    /// Creates a fetch error.
    pub fn new(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            message: message.into(),
        }
    }
}

/// A payload that could not be decoded into a tile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("decode failed: {message}")]
pub struct DecodeError {
    /// Decoder error description.
    pub message: String,
}

impl DecodeError {
    /// Creates a decode error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// One failed candidate URL of a tile.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFailure {
    /// The expanded URL.
    pub url: String,
    /// Why it failed.
    pub cause: DatasetError,
}

/// Errors that can occur in the dataset layer.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    /// A coordinate lies outside the projection's valid domain.
    ///
    /// Expected during generation; callers treat it as "no data".
    #[error("({x}, {z}) is outside the projection domain")]
    OutOfProjectionDomain {
        /// First coordinate (X or longitude).
        x: f64,
        /// Second coordinate (Z or latitude).
        z: f64,
    },

    /// A single fetch failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// A fetched payload failed to decode.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Every candidate URL for a tile failed.
    #[error("all {} candidate urls failed for tile {key}", .causes.len())]
    FetchAggregateFailure {
        /// The tile that could not be loaded.
        key: TileKey,
        /// Per-URL failures, in attempt order.
        causes: Vec<UrlFailure>,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Core primitive failure (bounds, cache task).
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;
