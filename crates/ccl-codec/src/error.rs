use thiserror::Error;

/// Errors produced while encoding or decoding product identifiers.
///
/// All variants are malformed-identifier (validation) failures: surfaced to
/// the caller, never retried, never substituted with defaults.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("malformed GTIN: {0}")]
    InvalidGtin(String),

    #[error("GTIN check digit mismatch: expected {expected}, found {found}")]
    CheckDigitMismatch { expected: u8, found: u8 },

    #[error("malformed expiry: {0}")]
    InvalidExpiry(String),

    #[error("malformed lot: {0}")]
    InvalidLot(String),

    #[error("malformed serial: {0}")]
    InvalidSerial(String),

    #[error("unrecognized identifier form: {0}")]
    UnrecognizedForm(String),
}
