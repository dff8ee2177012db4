use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use ccl_types::{Batch, BatchId, CustodyEvent, EventId, IdempotencyKey, ProductIdentity};

use crate::error::{StoreError, StoreResult};
use crate::traits::{BatchWrite, CustodyStore, KeyClaim};

/// In-memory custody store for tests, local demos, and embedding.
///
/// A single `RwLock` over the whole state gives `commit_event` and
/// `claim_key` the same atomicity a SQL implementation gets from a
/// transaction and a unique constraint.
pub struct MemoryStore {
    inner: RwLock<StoreState>,
}

#[derive(Default)]
struct StoreState {
    batches: HashMap<BatchId, Batch>,
    identity_index: HashMap<ProductIdentity, BatchId>,
    events: HashMap<EventId, CustodyEvent>,
    events_by_batch: HashMap<BatchId, Vec<EventId>>,
    keys: HashMap<IdempotencyKey, Option<EventId>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreState::default()),
        }
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, StoreState>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, StoreState>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CustodyStore for MemoryStore {
    async fn batch(&self, id: &BatchId) -> StoreResult<Option<Batch>> {
        Ok(self.read()?.batches.get(id).cloned())
    }

    async fn batch_by_identity(&self, identity: &ProductIdentity) -> StoreResult<Option<Batch>> {
        let state = self.read()?;
        Ok(state
            .identity_index
            .get(identity)
            .and_then(|id| state.batches.get(id))
            .cloned())
    }

    async fn event(&self, id: &EventId) -> StoreResult<Option<CustodyEvent>> {
        Ok(self.read()?.events.get(id).cloned())
    }

    async fn events_for_batch(&self, batch: &BatchId) -> StoreResult<Vec<CustodyEvent>> {
        let state = self.read()?;
        Ok(state
            .events_by_batch
            .get(batch)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| state.events.get(id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn latest_event(&self, batch: &BatchId) -> StoreResult<Option<CustodyEvent>> {
        let state = self.read()?;
        Ok(state
            .events_by_batch
            .get(batch)
            .and_then(|ids| ids.last())
            .and_then(|id| state.events.get(id))
            .cloned())
    }

    async fn commit_event(&self, event: &CustodyEvent, write: &BatchWrite) -> StoreResult<()> {
        let mut state = self.write()?;

        if state.events.contains_key(&event.id) {
            return Err(StoreError::DuplicateEvent);
        }

        match write {
            BatchWrite::Insert(batch) => {
                if state.identity_index.contains_key(&batch.identity)
                    || state.batches.contains_key(&batch.id)
                {
                    return Err(StoreError::DuplicateBatch);
                }
                state.identity_index.insert(batch.identity.clone(), batch.id);
                state.batches.insert(batch.id, batch.clone());
            }
            BatchWrite::Update {
                expected_version,
                batch,
            } => {
                let stored = state
                    .batches
                    .get(&batch.id)
                    .ok_or(StoreError::MissingBatch)?;
                if stored.version != *expected_version {
                    return Err(StoreError::StaleBatch {
                        expected: *expected_version,
                        found: stored.version,
                    });
                }
                state.batches.insert(batch.id, batch.clone());
            }
        }

        state.events.insert(event.id, event.clone());
        state
            .events_by_batch
            .entry(event.batch)
            .or_default()
            .push(event.id);
        Ok(())
    }

    async fn claim_key(&self, key: &IdempotencyKey) -> StoreResult<KeyClaim> {
        let mut state = self.write()?;
        match state.keys.get(key) {
            None => {
                state.keys.insert(key.clone(), None);
                Ok(KeyClaim::Claimed)
            }
            Some(None) => Ok(KeyClaim::InFlight),
            Some(Some(event)) => Ok(KeyClaim::Completed(*event)),
        }
    }

    async fn finalize_key(&self, key: &IdempotencyKey, event: &EventId) -> StoreResult<()> {
        let mut state = self.write()?;
        match state.keys.get_mut(key) {
            None => Err(StoreError::KeyNotClaimed),
            Some(slot @ None) => {
                *slot = Some(*event);
                Ok(())
            }
            Some(Some(_)) => Err(StoreError::KeyAlreadyFinalized),
        }
    }

    async fn release_key(&self, key: &IdempotencyKey) -> StoreResult<()> {
        let mut state = self.write()?;
        if let Some(None) = state.keys.get(key) {
            state.keys.remove(key);
        }
        Ok(())
    }
}
