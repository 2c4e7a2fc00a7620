//! Error types for the analysis stages.

use thiserror::Error;

use appsheet_nav_store::StoreError;

use crate::report::Stage;

/// Errors that stop a stage.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Reading or writing an artifact failed, including a missing required
    /// input.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The stage was not run because a stage it depends on failed.
    #[error("{stage} stage skipped: {reason}")]
    StageSkipped { stage: Stage, reason: String },
}

/// Convenience alias for results with [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;
