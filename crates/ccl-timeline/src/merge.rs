use std::collections::HashMap;

use ccl_consensus::ConsensusEntry;
use ccl_types::CustodyEvent;

use crate::reconcile::ReconciledTimeline;

/// One merged timeline entry: a local row, a log entry, or both.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MergedEntry {
    /// A local event paired with the log entry carrying the same payload
    /// digest.
    Confirmed {
        local: CustodyEvent,
        entry: ConsensusEntry,
    },
    /// A local event with no log counterpart — typically a fallback commit
    /// whose reconciliation is still pending.
    LocalOnly(CustodyEvent),
    /// A log entry with no local row — published by another process
    /// instance, or local data was lost.
    LogOnly(ConsensusEntry),
}

/// The batch's local history merged with its reconciled log history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MergedTimeline {
    /// Log entries in sequence order, then unmatched local events in append
    /// order.
    pub entries: Vec<MergedEntry>,
    pub truncated: bool,
}

impl MergedTimeline {
    pub fn local_only_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e, MergedEntry::LocalOnly(_)))
            .count()
    }
}

/// Pair reconciled log entries with local event rows by payload digest.
///
/// Tolerates missing data on either side: fallback commits surface as
/// `LocalOnly`, and log entries the local store never saw surface as
/// `LogOnly`. Nothing is dropped.
pub fn merge_local(reconciled: &ReconciledTimeline, local: &[CustodyEvent]) -> MergedTimeline {
    let by_digest: HashMap<&str, &CustodyEvent> = local
        .iter()
        .map(|event| (event.payload_hash.as_str(), event))
        .collect();

    let mut matched: Vec<&str> = Vec::new();
    let mut entries: Vec<MergedEntry> = reconciled
        .entries
        .iter()
        .map(|entry| match by_digest.get(entry.payload_digest.as_str()) {
            Some(event) => {
                matched.push(entry.payload_digest.as_str());
                MergedEntry::Confirmed {
                    local: (*event).clone(),
                    entry: entry.clone(),
                }
            }
            None => MergedEntry::LogOnly(entry.clone()),
        })
        .collect();

    for event in local {
        if !matched.contains(&event.payload_hash.as_str()) {
            entries.push(MergedEntry::LocalOnly(event.clone()));
        }
    }

    MergedTimeline {
        entries,
        truncated: reconciled.truncated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccl_chain::payload_digest;
    use ccl_types::{
        Actor, BatchId, ConsensusPayload, CustodyEventKind, EventId, ExpiryDate, FacilityId,
        FacilityType, ProductIdentity, Role,
    };
    use chrono::Utc;

    fn identity() -> ProductIdentity {
        ProductIdentity::new(
            "09506000134352",
            "LOT1",
            ExpiryDate::parse_compact("270101").unwrap(),
        )
    }

    fn entry(sequence: u64, lot_suffix: &str) -> ConsensusEntry {
        let actor = Actor::new(
            "u1",
            FacilityId::new(format!("fac-{lot_suffix}")),
            FacilityType::Manufacturer,
            Role::Operator,
        );
        let payload = ConsensusPayload::for_event(
            CustodyEventKind::Manufactured,
            &identity(),
            &actor,
            None,
            Utc::now(),
            None,
            None,
        );
        let raw = payload.canonical_bytes().unwrap();
        let digest = payload_digest(&raw);
        ConsensusEntry {
            sequence_number: sequence,
            consensus_timestamp: Utc::now(),
            running_hash: format!("rh-{sequence}"),
            raw,
            payload,
            payload_digest: digest,
        }
    }

    fn local(payload_hash: &str, delivered: bool) -> CustodyEvent {
        CustodyEvent {
            id: EventId::new(),
            batch: BatchId::new(),
            kind: CustodyEventKind::Manufactured,
            from_facility: None,
            to_facility: None,
            handover_event: None,
            external_tx_ref: if delivered {
                "0.0.1@1".into()
            } else {
                "local-0191".into()
            },
            external_sequence: delivered.then_some(1),
            external_running_hash: delivered.then(|| "rh".to_string()),
            payload_hash: payload_hash.into(),
            prev_hash: None,
            created_by: "u1".into(),
            created_at: Utc::now(),
        }
    }

    fn reconciled(entries: Vec<ConsensusEntry>, truncated: bool) -> ReconciledTimeline {
        ReconciledTimeline {
            entries,
            scanned: 0,
            truncated,
            next_cursor: None,
            note: None,
        }
    }

    #[test]
    fn pairs_by_payload_digest() {
        let e = entry(1, "a");
        let l = local(&e.payload_digest, true);
        let merged = merge_local(&reconciled(vec![e.clone()], false), &[l.clone()]);

        assert_eq!(merged.entries.len(), 1);
        assert_eq!(
            merged.entries[0],
            MergedEntry::Confirmed {
                local: l,
                entry: e
            }
        );
        assert_eq!(merged.local_only_count(), 0);
    }

    #[test]
    fn fallback_commit_surfaces_as_local_only() {
        let e = entry(1, "a");
        let confirmed = local(&e.payload_digest, true);
        let fallback = local("digest-never-published", false);

        let merged = merge_local(
            &reconciled(vec![e], false),
            &[confirmed, fallback.clone()],
        );
        assert_eq!(merged.entries.len(), 2);
        assert_eq!(merged.entries[1], MergedEntry::LocalOnly(fallback));
        assert_eq!(merged.local_only_count(), 1);
    }

    #[test]
    fn foreign_log_entry_surfaces_as_log_only() {
        let e = entry(2, "b");
        let merged = merge_local(&reconciled(vec![e.clone()], false), &[]);
        assert_eq!(merged.entries, vec![MergedEntry::LogOnly(e)]);
    }

    #[test]
    fn truncation_flag_carries_through() {
        let merged = merge_local(&reconciled(vec![], true), &[]);
        assert!(merged.truncated);
    }
}
