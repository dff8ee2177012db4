//! Custody state machine and event recorder for the Chain-of-Custody Ledger.
//!
//! The write path of the system: [`EventRecorder`] resolves idempotency
//! keys, validates transitions against the per-batch custody state machine,
//! publishes the canonical payload to the external consensus log (falling
//! back to a local-only commit when the log is unreachable), and commits the
//! event atomically with the batch pointer update.

pub mod directory;
pub mod error;
pub mod recorder;
pub mod state;

pub use directory::{FacilityDirectory, MemoryDirectory};
pub use error::{RecorderError, RecorderResult};
pub use recorder::{BatchRef, EventRecorder, EventRequest, RecordOutcome};
pub use state::BatchState;
