use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::FacilityId;
use crate::batch::BatchId;
use crate::error::TypeError;

/// Unique identifier for a custody event (UUID v7 for time-ordering).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(uuid::Uuid);

impl EventId {
    /// Generate a new time-ordered event ID (UUID v7).
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

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.short_id())
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The five custody transitions.
///
/// DISPENSED and RECALLED are terminal: once recorded, no further events may
/// be appended to the batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustodyEventKind {
    Manufactured,
    Received,
    Handover,
    Dispensed,
    Recalled,
}

impl CustodyEventKind {
    /// Whether this kind locks the batch against further events.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Dispensed | Self::Recalled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manufactured => "MANUFACTURED",
            Self::Received => "RECEIVED",
            Self::Handover => "HANDOVER",
            Self::Dispensed => "DISPENSED",
            Self::Recalled => "RECALLED",
        }
    }
}

impl FromStr for CustodyEventKind {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MANUFACTURED" => Ok(Self::Manufactured),
            "RECEIVED" => Ok(Self::Received),
            "HANDOVER" => Ok(Self::Handover),
            "DISPENSED" => Ok(Self::Dispensed),
            "RECALLED" => Ok(Self::Recalled),
            other => Err(TypeError::InvalidEventKind(other.to_string())),
        }
    }
}

impl fmt::Display for CustodyEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Client-supplied token guaranteeing at-most-one committed effect.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdempotencyKey({})", self.0)
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable custody fact, appended to local storage and (when reachable)
/// the external consensus log.
///
/// `external_sequence` and `external_running_hash` are `None` for events
/// committed through the local fallback path while the log was unreachable;
/// out-of-band reconciliation fills them in later, matching by
/// `payload_hash`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyEvent {
    pub id: EventId,
    pub batch: BatchId,
    pub kind: CustodyEventKind,
    pub from_facility: Option<FacilityId>,
    pub to_facility: Option<FacilityId>,
    /// For RECEIVED: the HANDOVER event this receipt confirms.
    pub handover_event: Option<EventId>,
    /// Consensus transaction reference, or a synthetic `local-` reference
    /// when the event was committed through the fallback path.
    pub external_tx_ref: String,
    pub external_sequence: Option<u64>,
    pub external_running_hash: Option<String>,
    /// Hex digest of the canonical payload bytes submitted to the log.
    pub payload_hash: String,
    /// Digest of the logical predecessor's payload; `None` for the batch's
    /// first event.
    pub prev_hash: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl CustodyEvent {
    /// Whether the event reached the external consensus log.
    pub fn delivered(&self) -> bool {
        self.external_sequence.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_kinds() {
        assert!(CustodyEventKind::Dispensed.is_terminal());
        assert!(CustodyEventKind::Recalled.is_terminal());
        assert!(!CustodyEventKind::Manufactured.is_terminal());
        assert!(!CustodyEventKind::Handover.is_terminal());
        assert!(!CustodyEventKind::Received.is_terminal());
    }

    #[test]
    fn kind_serializes_screaming_snake() {
        let json = serde_json::to_string(&CustodyEventKind::Manufactured).unwrap();
        assert_eq!(json, "\"MANUFACTURED\"");
    }

    #[test]
    fn kind_parse_roundtrip() {
        for kind in [
            CustodyEventKind::Manufactured,
            CustodyEventKind::Received,
            CustodyEventKind::Handover,
            CustodyEventKind::Dispensed,
            CustodyEventKind::Recalled,
        ] {
            assert_eq!(kind.as_str().parse::<CustodyEventKind>().unwrap(), kind);
        }
        assert!("SHIPPED".parse::<CustodyEventKind>().is_err());
    }

    #[test]
    fn event_ids_are_unique() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn delivered_follows_sequence_presence() {
        let mut event = CustodyEvent {
            id: EventId::new(),
            batch: BatchId::new(),
            kind: CustodyEventKind::Manufactured,
            from_facility: None,
            to_facility: None,
            handover_event: None,
            external_tx_ref: "local-0191".into(),
            external_sequence: None,
            external_running_hash: None,
            payload_hash: "ab".into(),
            prev_hash: None,
            created_by: "u1".into(),
            created_at: Utc::now(),
        };
        assert!(!event.delivered());
        event.external_sequence = Some(7);
        assert!(event.delivered());
    }
}
