//! Consensus log boundary for the Chain-of-Custody Ledger.
//!
//! The external consensus log is a shared, append-only, sequence-numbered
//! message store. This crate provides:
//! - [`ConsensusLog`] — the transport trait (submit + paginated read)
//! - [`Publisher`] — size-gated, timeout-bounded submission
//! - [`LedgerReader`] — paginated fetch + decode, single page or complete walk
//! - [`InMemoryConsensusLog`] — implementation for tests and embedding, with
//!   an offline switch for exercising delivery failure

pub mod client;
pub mod error;
pub mod memory;
pub mod publisher;
pub mod reader;
pub mod types;

pub use client::ConsensusLog;
pub use error::{ConsensusError, DeliveryFault};
pub use memory::InMemoryConsensusLog;
pub use publisher::{Publisher, MAX_MESSAGE_BYTES};
pub use reader::{LedgerReader, PageRequest, DEFAULT_MAX_WALK_PAGES, DEFAULT_PAGE_LIMIT};
pub use types::{
    CompleteFetch, ConsensusEntry, Cursor, DecodedPage, PageOrder, RawMessage, RawPage,
    SubmitReceipt,
};
