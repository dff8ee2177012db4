use std::fmt;

use serde::{Deserialize, Serialize};

use crate::actor::FacilityId;
use crate::event::EventId;
use crate::identity::ProductIdentity;

/// Unique identifier for a batch (UUID v7 for time-ordering).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BatchId(uuid::Uuid);

impl BatchId {
    /// Generate a new time-ordered batch ID (UUID v7).
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BatchId({})", self.short_id())
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of an external consensus log (topic) that anchors batches.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogId(String);

impl LogId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogId({})", self.0)
    }
}

impl fmt::Display for LogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Custody row for one trackable quantity of product.
///
/// Mutated by every accepted custody event and never deleted. The pointer
/// fields (`current_owner`, `pending_receipt_to`, `last_handover_event`)
/// encode the batch's custody state; `version` is the optimistic concurrency
/// token that makes pointer updates a conditional write — the row itself is
/// the lock, valid across process instances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub identity: ProductIdentity,
    pub quantity: u32,
    /// Current custodian; `None` iff the batch has been dispensed.
    pub current_owner: Option<FacilityId>,
    /// Destination of the outstanding handover, if one is awaiting receipt.
    pub pending_receipt_to: Option<FacilityId>,
    /// The HANDOVER event a RECEIVED must confirm.
    pub last_handover_event: Option<EventId>,
    /// The external consensus log this batch's events are anchored to.
    pub external_log: LogId,
    /// Optimistic concurrency token, bumped on every accepted event.
    pub version: u64,
}

impl Batch {
    /// Create a fresh, unassigned batch row at version 0.
    pub fn new(identity: ProductIdentity, quantity: u32, external_log: LogId) -> Self {
        Self {
            id: BatchId::new(),
            identity,
            quantity,
            current_owner: None,
            pending_receipt_to: None,
            last_handover_event: None,
            external_log,
            version: 0,
        }
    }

    /// Whether a handover is awaiting receipt confirmation.
    pub fn has_pending_receipt(&self) -> bool {
        self.pending_receipt_to.is_some()
    }
}
