use thiserror::Error;

use ccl_chain::ChainError;

/// Errors produced while reconciling a timeline.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimelineError {
    #[error("hash chain verification failed: {0}")]
    Chain(#[from] ChainError),
}

pub type TimelineResult<T> = Result<T, TimelineError>;
