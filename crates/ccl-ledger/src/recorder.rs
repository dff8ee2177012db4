use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;

use ccl_chain::payload_digest;
use ccl_consensus::{ConsensusError, Publisher};
use ccl_store::{BatchWrite, CustodyStore, KeyClaim, StoreError};
use ccl_types::{
    Actor, Batch, BatchId, ConsensusPayload, CustodyEvent, CustodyEventKind, EventId, FacilityId,
    IdempotencyKey, LogId, ProductIdentity,
};

use crate::directory::FacilityDirectory;
use crate::error::{RecorderError, RecorderResult};
use crate::state::{self, BatchState};

/// Reference to the batch a custody event targets.
#[derive(Clone, Debug)]
pub enum BatchRef {
    Id(BatchId),
    Identity(ProductIdentity),
}

/// One custody-event submission.
#[derive(Clone, Debug)]
pub struct EventRequest {
    pub kind: CustodyEventKind,
    pub batch: BatchRef,
    /// Destination facility; required for HANDOVER.
    pub to: Option<FacilityId>,
    /// Required when a MANUFACTURED event registers a new batch.
    pub quantity: Option<u32>,
    pub meta: Option<BTreeMap<String, String>>,
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Result of a recorded (or replayed) custody event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordOutcome {
    pub event_id: EventId,
    pub external_tx_ref: String,
    pub sequence_number: Option<u64>,
    pub running_hash: Option<String>,
    pub payload_hash: String,
    /// Whether the event reached the external consensus log. `false` means
    /// the local fallback path committed it and reconciliation will fill in
    /// the log data later.
    pub delivered: bool,
    /// Whether this outcome is a replay of a previously committed request.
    pub idempotent: bool,
    pub warning: Option<String>,
}

const FALLBACK_WARNING: &str =
    "event committed locally; consensus delivery pending reconciliation";

/// The custody event recorder: idempotency, state machine, publish with
/// local fallback, and the atomic commit.
///
/// Steps behave as if serialized per batch even across process instances:
/// the legality check here is advisory, and the store's conditional write
/// re-validates it by rejecting any commit whose batch version moved.
pub struct EventRecorder {
    store: Arc<dyn CustodyStore>,
    directory: Arc<dyn FacilityDirectory>,
    publisher: Publisher,
    /// Consensus log new batches are anchored to.
    default_log: LogId,
}

impl EventRecorder {
    pub fn new(
        store: Arc<dyn CustodyStore>,
        directory: Arc<dyn FacilityDirectory>,
        publisher: Publisher,
        default_log: LogId,
    ) -> Self {
        Self {
            store,
            directory,
            publisher,
            default_log,
        }
    }

    /// Record a custody event on behalf of `actor`.
    pub async fn record(
        &self,
        request: EventRequest,
        actor: &Actor,
    ) -> RecorderResult<RecordOutcome> {
        let key = match &request.idempotency_key {
            None => return self.record_inner(&request, actor).await,
            Some(key) => key.clone(),
        };

        match self.store.claim_key(&key).await? {
            KeyClaim::Completed(event_id) => self.replay(event_id).await,
            KeyClaim::InFlight => Err(RecorderError::DuplicateInFlight),
            KeyClaim::Claimed => match self.record_inner(&request, actor).await {
                Ok(outcome) => {
                    // The event is already committed; a finalize failure
                    // must not surface as an error for work that landed.
                    if let Err(finalize_err) =
                        self.store.finalize_key(&key, &outcome.event_id).await
                    {
                        tracing::warn!(
                            key = %key,
                            event = %outcome.event_id,
                            error = %finalize_err,
                            "failed to finalize idempotency key"
                        );
                    }
                    Ok(outcome)
                }
                Err(err) => {
                    // Release on every rejected path so the client can retry
                    // with the same key; a release failure must not mask the
                    // original rejection.
                    if let Err(release_err) = self.store.release_key(&key).await {
                        tracing::warn!(key = %key, error = %release_err, "failed to release idempotency key");
                    }
                    Err(err)
                }
            },
        }
    }

    /// Rebuild the original outcome for a replayed idempotency key.
    async fn replay(&self, event_id: EventId) -> RecorderResult<RecordOutcome> {
        let event = self.store.event(&event_id).await?.ok_or_else(|| {
            RecorderError::Store(StoreError::Backend(
                "idempotency key resolves to a missing event".into(),
            ))
        })?;
        let delivered = event.delivered();
        Ok(RecordOutcome {
            event_id: event.id,
            external_tx_ref: event.external_tx_ref,
            sequence_number: event.external_sequence,
            running_hash: event.external_running_hash,
            payload_hash: event.payload_hash,
            delivered,
            idempotent: true,
            warning: (!delivered).then(|| FALLBACK_WARNING.to_string()),
        })
    }

    async fn record_inner(
        &self,
        request: &EventRequest,
        actor: &Actor,
    ) -> RecorderResult<RecordOutcome> {
        let event_id = EventId::new();

        // Resolve the batch; a MANUFACTURED event referencing an unknown
        // identity registers it.
        let existing = match &request.batch {
            BatchRef::Id(id) => Some(self.store.batch(id).await?.ok_or(RecorderError::UnknownBatch)?),
            BatchRef::Identity(identity) => self.store.batch_by_identity(identity).await?,
        };

        let (batch, write, from, to, handover_ref, prev_hash) = match existing {
            None => {
                let identity = match &request.batch {
                    BatchRef::Identity(identity) => identity.clone(),
                    BatchRef::Id(_) => return Err(RecorderError::UnknownBatch),
                };
                if request.kind != CustodyEventKind::Manufactured {
                    return Err(RecorderError::UnknownBatch);
                }
                let quantity = request.quantity.ok_or_else(|| {
                    RecorderError::Validation(
                        "quantity is required when registering a new batch".into(),
                    )
                })?;
                if quantity == 0 {
                    return Err(RecorderError::Validation(
                        "quantity must be at least 1".into(),
                    ));
                }
                let mut batch = Batch::new(identity, quantity, self.default_log.clone());
                batch.current_owner = Some(actor.facility.clone());
                let write = BatchWrite::Insert(batch.clone());
                (batch, write, None, None, None, None)
            }
            Some(batch) => {
                let latest = self.store.latest_event(&batch.id).await?;
                let batch_state = BatchState::of(&batch, latest.as_ref());
                batch_state.ensure_open()?;
                let latest_hash = latest.as_ref().map(|e| e.payload_hash.clone());

                let (updated, from, to, handover_ref, prev_hash) = match request.kind {
                    CustodyEventKind::Manufactured => {
                        let updated = state::apply_manufactured(&batch, &batch_state, actor)?;
                        (updated, None, None, None, latest_hash)
                    }
                    CustodyEventKind::Handover => {
                        let to = request.to.clone().ok_or_else(|| {
                            RecorderError::Validation(
                                "a destination facility is required for a handover".into(),
                            )
                        })?;
                        if self.directory.facility_type(&to).await?.is_none() {
                            return Err(RecorderError::UnknownFacility(to));
                        }
                        let updated =
                            state::apply_handover(&batch, &batch_state, actor, &to, event_id)?;
                        (
                            updated,
                            batch.current_owner.clone(),
                            Some(to),
                            None,
                            latest_hash,
                        )
                    }
                    CustodyEventKind::Received => {
                        let handover_id = batch
                            .last_handover_event
                            .ok_or(RecorderError::MissingHandover)?;
                        let handover = self
                            .store
                            .event(&handover_id)
                            .await?
                            .ok_or(RecorderError::MissingHandover)?;
                        let updated =
                            state::apply_received(&batch, &batch_state, actor, &handover)?;
                        // The chain ties the receipt to the handover it
                        // confirms, not to whatever was appended last; safe
                        // because the pending-receipt lock kept the chain
                        // quiet in between.
                        (
                            updated.clone(),
                            batch.current_owner.clone(),
                            updated.current_owner.clone(),
                            Some(handover_id),
                            Some(handover.payload_hash),
                        )
                    }
                    CustodyEventKind::Dispensed => {
                        let updated = state::apply_dispensed(&batch, &batch_state, actor)?;
                        (updated, batch.current_owner.clone(), None, None, latest_hash)
                    }
                    CustodyEventKind::Recalled => {
                        let updated = state::apply_recalled(&batch, &batch_state, actor)?;
                        (updated, batch.current_owner.clone(), None, None, latest_hash)
                    }
                };
                let write = BatchWrite::Update {
                    expected_version: batch.version,
                    batch: updated,
                };
                (batch, write, from, to, handover_ref, prev_hash)
            }
        };

        let ts = Utc::now();
        let payload = ConsensusPayload::for_event(
            request.kind,
            &batch.identity,
            actor,
            to.as_ref(),
            ts,
            prev_hash.clone(),
            request.meta.clone(),
        );
        let bytes = payload
            .canonical_bytes()
            .map_err(|e| RecorderError::Serialization(e.to_string()))?;
        let payload_hash = payload_digest(&bytes);

        let (external_tx_ref, external_sequence, external_running_hash, delivered, warning) =
            match self
                .publisher
                .publish(&batch.external_log, &payload, Some(request.kind.as_str()))
                .await
            {
                Ok(receipt) => (
                    receipt.tx_ref,
                    Some(receipt.sequence_number),
                    Some(receipt.running_hash),
                    true,
                    None,
                ),
                Err(err) if err.is_recoverable_delivery() => {
                    tracing::warn!(
                        batch = %batch.id,
                        kind = %request.kind,
                        error = %err,
                        "consensus log unreachable; committing event locally"
                    );
                    (
                        format!("local-{}", uuid::Uuid::now_v7()),
                        None,
                        None,
                        false,
                        Some(FALLBACK_WARNING.to_string()),
                    )
                }
                Err(ConsensusError::PayloadTooLarge { size, max }) => {
                    return Err(RecorderError::Validation(format!(
                        "payload of {size} bytes exceeds the {max}-byte message ceiling"
                    )))
                }
                Err(err) => return Err(RecorderError::Serialization(err.to_string())),
            };

        let event = CustodyEvent {
            id: event_id,
            batch: batch.id,
            kind: request.kind,
            from_facility: from,
            to_facility: to,
            handover_event: handover_ref,
            external_tx_ref: external_tx_ref.clone(),
            external_sequence,
            external_running_hash: external_running_hash.clone(),
            payload_hash: payload_hash.clone(),
            prev_hash,
            created_by: actor.user_id.clone(),
            created_at: ts,
        };
        self.store.commit_event(&event, &write).await?;

        tracing::info!(
            event = %event.id,
            batch = %batch.id,
            kind = %request.kind,
            delivered,
            "custody event committed"
        );

        Ok(RecordOutcome {
            event_id,
            external_tx_ref,
            sequence_number: external_sequence,
            running_hash: external_running_hash,
            payload_hash,
            delivered,
            idempotent: false,
            warning,
        })
    }
}
