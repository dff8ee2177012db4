//! Foundation types for the Chain-of-Custody Ledger (CCL).
//!
//! This crate provides the identity, actor, and record types used throughout
//! the CCL system. Every other CCL crate depends on `ccl-types`.
//!
//! # Key Types
//!
//! - [`ProductIdentity`] — the (GTIN, lot, expiry) triple that names a batch
//! - [`ExpiryDate`] — expiry in both ISO and compact (YYMMDD) forms
//! - [`Actor`] — caller identity as supplied by the external identity provider
//! - [`Batch`] — the mutable custody row for one trackable quantity of product
//! - [`CustodyEvent`] — an immutable, append-only custody fact
//! - [`ConsensusPayload`] — the versioned wire shape hashed and published to
//!   the external consensus log

pub mod actor;
pub mod batch;
pub mod error;
pub mod event;
pub mod identity;
pub mod payload;

pub use actor::{Actor, FacilityId, FacilityType, Role};
pub use batch::{Batch, BatchId, LogId};
pub use error::TypeError;
pub use event::{CustodyEvent, CustodyEventKind, EventId, IdempotencyKey};
pub use identity::{ExpiryDate, ProductIdentity};
pub use payload::{ConsensusPayload, PayloadActor, PayloadBatch, PayloadTo, PAYLOAD_VERSION};
