use ccl_types::{Actor, Batch, CustodyEvent, CustodyEventKind, EventId, FacilityId};

use crate::error::{RecorderError, RecorderResult};

/// Custody state of a batch, derived from the batch row and its latest
/// event. Never stored; the row's pointer fields are the source of truth.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchState {
    /// Registered but without a custodian yet.
    Unassigned,
    /// In the custody of one facility.
    Owned(FacilityId),
    /// A handover is outstanding; `to` must confirm receipt before anything
    /// else may happen to the batch.
    PendingReceipt { from: FacilityId, to: FacilityId },
    /// Dispensed to an end user. Terminal.
    Dispensed,
    /// Recalled by a regulator. Terminal.
    Recalled,
}

impl BatchState {
    /// Derive the state from the batch row and its most recent event.
    pub fn of(batch: &Batch, latest: Option<&CustodyEvent>) -> Self {
        match latest.map(|e| e.kind) {
            Some(CustodyEventKind::Dispensed) => return Self::Dispensed,
            Some(CustodyEventKind::Recalled) => return Self::Recalled,
            _ => {}
        }
        match (&batch.current_owner, &batch.pending_receipt_to) {
            (Some(from), Some(to)) => Self::PendingReceipt {
                from: from.clone(),
                to: to.clone(),
            },
            (Some(owner), None) => Self::Owned(owner.clone()),
            (None, _) => Self::Unassigned,
        }
    }

    /// Reject any further event once a terminal event is on record.
    pub fn ensure_open(&self) -> RecorderResult<()> {
        match self {
            Self::Dispensed => Err(RecorderError::TerminalLock {
                kind: CustodyEventKind::Dispensed,
            }),
            Self::Recalled => Err(RecorderError::TerminalLock {
                kind: CustodyEventKind::Recalled,
            }),
            _ => Ok(()),
        }
    }
}

fn ensure_no_pending(state: &BatchState) -> RecorderResult<()> {
    if let BatchState::PendingReceipt { to, .. } = state {
        return Err(RecorderError::PendingReceipt {
            awaiting: to.clone(),
        });
    }
    Ok(())
}

fn ensure_custodian(state: &BatchState, actor: &Actor) -> RecorderResult<()> {
    if actor.is_auditor() {
        return Ok(());
    }
    match state {
        BatchState::Owned(owner) | BatchState::PendingReceipt { from: owner, .. }
            if *owner == actor.facility =>
        {
            Ok(())
        }
        BatchState::Owned(owner) | BatchState::PendingReceipt { from: owner, .. } => {
            Err(RecorderError::Unauthorized {
                reason: format!(
                    "facility {} is not the custodian ({})",
                    actor.facility, owner
                ),
            })
        }
        _ => Err(RecorderError::Unauthorized {
            reason: format!(
                "facility {} is not the custodian (batch has no custodian)",
                actor.facility
            ),
        }),
    }
}

fn bumped(batch: &Batch) -> Batch {
    let mut next = batch.clone();
    next.version += 1;
    next
}

/// MANUFACTURED on an existing batch: legal from unassigned, or when the
/// actor is the current owner or an auditor. Claims ownership if unset.
pub fn apply_manufactured(batch: &Batch, state: &BatchState, actor: &Actor) -> RecorderResult<Batch> {
    state.ensure_open()?;
    if !matches!(state, BatchState::Unassigned) {
        ensure_custodian(state, actor)?;
    }
    let mut next = bumped(batch);
    if next.current_owner.is_none() {
        next.current_owner = Some(actor.facility.clone());
    }
    Ok(next)
}

/// HANDOVER: no pending receipt, actor is owner or auditor, destination is a
/// different facility. Marks the batch as awaiting receipt and records the
/// handover event the receipt must confirm.
pub fn apply_handover(
    batch: &Batch,
    state: &BatchState,
    actor: &Actor,
    to: &FacilityId,
    handover_event: EventId,
) -> RecorderResult<Batch> {
    state.ensure_open()?;
    ensure_no_pending(state)?;
    let owner = match state {
        BatchState::Owned(owner) => owner,
        _ => {
            return Err(RecorderError::Validation(
                "batch has no current custodian to hand over from".into(),
            ))
        }
    };
    ensure_custodian(state, actor)?;
    if to == owner {
        return Err(RecorderError::Validation(format!(
            "destination facility {to} already holds the batch"
        )));
    }
    let mut next = bumped(batch);
    next.pending_receipt_to = Some(to.clone());
    next.last_handover_event = Some(handover_event);
    Ok(next)
}

/// RECEIVED: a pending receipt must exist with the actor as its recipient
/// (auditors may confirm on behalf), and the referenced handover must be
/// well-formed. Transfers ownership to the recipient.
pub fn apply_received(
    batch: &Batch,
    state: &BatchState,
    actor: &Actor,
    handover: &CustodyEvent,
) -> RecorderResult<Batch> {
    state.ensure_open()?;
    let to = match state {
        BatchState::PendingReceipt { to, .. } => to,
        _ => {
            return Err(RecorderError::Validation(
                "no handover is awaiting receipt for this batch".into(),
            ))
        }
    };
    if !actor.is_auditor() && actor.facility != *to {
        return Err(RecorderError::Unauthorized {
            reason: format!(
                "receipt must be confirmed by facility {to}, not {}",
                actor.facility
            ),
        });
    }
    let well_formed = handover.kind == CustodyEventKind::Handover
        && handover.batch == batch.id
        && handover.to_facility.as_ref() == Some(to)
        && batch.last_handover_event == Some(handover.id);
    if !well_formed {
        return Err(RecorderError::MissingHandover);
    }
    let mut next = bumped(batch);
    next.current_owner = Some(to.clone());
    next.pending_receipt_to = None;
    next.last_handover_event = None;
    Ok(next)
}

/// DISPENSED: no pending receipt, actor is owner or auditor, and unless the
/// actor is an auditor their facility type must be dispensing-capable.
/// Clears ownership. Terminal.
pub fn apply_dispensed(batch: &Batch, state: &BatchState, actor: &Actor) -> RecorderResult<Batch> {
    state.ensure_open()?;
    ensure_no_pending(state)?;
    if !matches!(state, BatchState::Owned(_)) {
        return Err(RecorderError::Validation(
            "batch has no current custodian to dispense from".into(),
        ));
    }
    ensure_custodian(state, actor)?;
    if !actor.is_auditor() && !actor.facility_type.can_dispense() {
        return Err(RecorderError::Unauthorized {
            reason: format!(
                "facility type {} cannot dispense product",
                actor.facility_type
            ),
        });
    }
    let mut next = bumped(batch);
    next.current_owner = None;
    Ok(next)
}

/// RECALLED: auditors only, with no pending receipt. Terminal.
pub fn apply_recalled(batch: &Batch, state: &BatchState, actor: &Actor) -> RecorderResult<Batch> {
    state.ensure_open()?;
    ensure_no_pending(state)?;
    if !actor.is_auditor() {
        return Err(RecorderError::Unauthorized {
            reason: "only an auditor may recall a batch".into(),
        });
    }
    Ok(bumped(batch))
}
