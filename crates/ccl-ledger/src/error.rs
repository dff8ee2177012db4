use thiserror::Error;

use ccl_codec::CodecError;
use ccl_store::StoreError;
use ccl_types::{CustodyEventKind, FacilityId};

/// Errors produced by the custody state machine and event recorder.
///
/// Every rejected transition names the specific invariant that blocked it;
/// the caller decides whether a retry can ever succeed. Conflicts
/// (`PendingReceipt`, `TerminalLock`, `DuplicateInFlight`, `StaleBatch`)
/// carry that context; validation and authorization failures never clear up
/// on retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("invalid identifier: {0}")]
    Identifier(#[from] CodecError),

    #[error("{0}")]
    Validation(String),

    #[error("not authorized: {reason}")]
    Unauthorized { reason: String },

    /// A handover is outstanding; nothing else may happen to the batch until
    /// the named facility confirms receipt.
    #[error("awaiting receipt confirmation from facility {awaiting}")]
    PendingReceipt { awaiting: FacilityId },

    #[error("batch is locked by a terminal {kind} event")]
    TerminalLock { kind: CustodyEventKind },

    #[error("a request with this idempotency key is already in flight")]
    DuplicateInFlight,

    /// The batch row moved between the advisory check and the commit; the
    /// caller may re-read and retry.
    #[error("batch was modified concurrently; retry")]
    StaleBatch,

    #[error("batch not found")]
    UnknownBatch,

    #[error("facility {0} is not registered")]
    UnknownFacility(FacilityId),

    /// The batch claims a pending receipt but its handover event is missing
    /// or malformed.
    #[error("referenced handover event is missing or malformed")]
    MissingHandover,

    #[error("facility directory error: {0}")]
    Directory(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<StoreError> for RecorderError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::StaleBatch { .. } => Self::StaleBatch,
            StoreError::MissingBatch => Self::UnknownBatch,
            StoreError::DuplicateBatch => {
                Self::Validation("batch identity is already registered".into())
            }
            other => Self::Store(other),
        }
    }
}

pub type RecorderResult<T> = Result<T, RecorderError>;
