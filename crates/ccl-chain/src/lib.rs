//! Hash chaining for the Chain-of-Custody Ledger.
//!
//! - [`payload_digest`] — deterministic digest over the exact bytes
//!   transmitted to the consensus log
//! - [`ChainLink`] / [`ChainVerifier`] — tamper-evidence over a batch's
//!   event sequence

pub mod digest;
pub mod verify;

pub use digest::payload_digest;
pub use verify::{ChainError, ChainLink, ChainVerifier};
