use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid expiry date: {0}")]
    InvalidExpiry(String),

    #[error("unknown facility type: {0}")]
    InvalidFacilityType(String),

    #[error("unknown role: {0}")]
    InvalidRole(String),

    #[error("unknown custody event kind: {0}")]
    InvalidEventKind(String),

    #[error("unsupported payload version: {0}")]
    UnsupportedPayloadVersion(u32),

    #[error("serialization error: {0}")]
    Serialization(String),
}
