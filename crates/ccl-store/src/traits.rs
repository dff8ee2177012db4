use async_trait::async_trait;

use ccl_types::{Batch, BatchId, CustodyEvent, EventId, IdempotencyKey, ProductIdentity};

use crate::error::StoreResult;

/// Batch row write accompanying an event insert.
#[derive(Clone, Debug)]
pub enum BatchWrite {
    /// Register a new batch (first MANUFACTURED event). Fails with
    /// `DuplicateBatch` if the identity is already registered.
    Insert(Batch),
    /// Conditionally replace the batch row. Fails with `StaleBatch` when the
    /// stored version differs from `expected_version`; the caller must have
    /// set `batch.version = expected_version + 1`.
    Update { expected_version: u64, batch: Batch },
}

/// Outcome of claiming an idempotency key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyClaim {
    /// The key is now held by this request.
    Claimed,
    /// Another request holds the key and has not finished.
    InFlight,
    /// The key already resolved to a committed event.
    Completed(EventId),
}

/// Persistence boundary for batches, custody events, and idempotency keys.
///
/// All implementations must satisfy these invariants:
/// - Events are append-only and immutable once inserted; batches are
///   mutated only through `commit_event` and never deleted.
/// - `commit_event` is atomic: the event insert and the batch write land
///   together or not at all, and the version condition is evaluated inside
///   that same atomic step. This is what makes batch pointer mutation
///   linearizable across process instances — the row is the lock, never an
///   in-process mutex.
/// - `claim_key` has unique-insert semantics: of N concurrent claims for
///   one key, exactly one observes `Claimed`.
/// - All I/O errors are propagated, never silently ignored.
#[async_trait]
pub trait CustodyStore: Send + Sync {
    /// Look up a batch by id. Returns `Ok(None)` if absent.
    async fn batch(&self, id: &BatchId) -> StoreResult<Option<Batch>>;

    /// Look up a batch by its identity triple.
    async fn batch_by_identity(&self, identity: &ProductIdentity) -> StoreResult<Option<Batch>>;

    /// Look up a single event by id.
    async fn event(&self, id: &EventId) -> StoreResult<Option<CustodyEvent>>;

    /// All events for a batch, in append order.
    async fn events_for_batch(&self, batch: &BatchId) -> StoreResult<Vec<CustodyEvent>>;

    /// The most recently appended event for a batch.
    async fn latest_event(&self, batch: &BatchId) -> StoreResult<Option<CustodyEvent>>;

    /// Atomically insert an event and apply the accompanying batch write.
    async fn commit_event(&self, event: &CustodyEvent, write: &BatchWrite) -> StoreResult<()>;

    /// Atomically claim an idempotency key.
    async fn claim_key(&self, key: &IdempotencyKey) -> StoreResult<KeyClaim>;

    /// Resolve a claimed key to its committed event. At most once per key.
    async fn finalize_key(&self, key: &IdempotencyKey, event: &EventId) -> StoreResult<()>;

    /// Release an unfinalized claim so the client may retry with the same
    /// key. Called on every rejected-transition return path; a finalized
    /// key is left untouched.
    async fn release_key(&self, key: &IdempotencyKey) -> StoreResult<()>;
}
