//! Custody store boundary for the Chain-of-Custody Ledger.
//!
//! Defines the [`CustodyStore`] trait — batch and event persistence, the
//! conditional batch-pointer write, and atomic idempotency-key claiming —
//! plus [`MemoryStore`], the in-memory implementation used by tests and
//! embedded deployments. A production SQL store implements the same trait
//! with one transaction per `commit_event`.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use traits::{BatchWrite, CustodyStore, KeyClaim};
