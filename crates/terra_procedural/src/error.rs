//! # Pipeline Error Types
//!
//! Errors that abort a column bake.
//!
//! Dataset failures normally never get here: steps degrade to defaults
//! (missing elevation is ocean, missing tree cover is empty). What remains
//! are failures a step cannot paper over.

use thiserror::Error;

use terra_core::CoreError;
use terra_dataset::DatasetError;

/// Errors that can occur while baking a column.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A dataset error a step chose to propagate.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Core primitive failure (bounds, cache task).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A step failed to produce its data.
    #[error("step {step} failed: {reason}")]
    Step {
        /// Name of the failing step.
        step: &'static str,
        /// Failure description.
        reason: String,
    },
}

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
