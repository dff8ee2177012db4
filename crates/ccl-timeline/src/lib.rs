//! Timeline reconciliation for the Chain-of-Custody Ledger.
//!
//! The external consensus log is shared across all batches, so a batch's
//! history must be filtered out of it. This crate keeps only the entries
//! whose embedded identity triple matches the query, pairs them with local
//! event rows by payload digest, and verifies the resulting hash chain.

pub mod error;
pub mod merge;
pub mod reconcile;

pub use error::{TimelineError, TimelineResult};
pub use merge::{merge_local, MergedEntry, MergedTimeline};
pub use reconcile::{reconcile_complete, reconcile_page, ReconciledTimeline, TimelineNote};
