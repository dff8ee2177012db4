use thiserror::Error;

/// Errors produced by custody store operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("batch not found")]
    MissingBatch,

    #[error("batch identity already registered")]
    DuplicateBatch,

    #[error("event already recorded")]
    DuplicateEvent,

    /// The conditional batch write lost the race: the row moved since it was
    /// read. The caller's advisory validation is no longer trustworthy.
    #[error("stale batch version: expected {expected}, found {found}")]
    StaleBatch { expected: u64, found: u64 },

    #[error("idempotency key was not claimed")]
    KeyNotClaimed,

    #[error("idempotency key already finalized")]
    KeyAlreadyFinalized,

    #[error("store backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
