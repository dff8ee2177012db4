use async_trait::async_trait;

use ccl_types::LogId;

use crate::error::ConsensusError;
use crate::types::{Cursor, PageOrder, RawPage, SubmitReceipt};

/// Transport boundary to the external consensus log.
///
/// Implementations must satisfy:
/// - `submit` has no local side effects; it either delivers the message and
///   returns its consensus acknowledgement or fails with a typed error.
/// - No synchronous retry inside `submit`; fallback policy belongs to the
///   caller.
/// - Appends are self-describing and independently ordered by the log, so no
///   mutual exclusion is required around `submit`.
/// - `read_page` returns raw message bytes verbatim; decoding belongs to the
///   reader.
#[async_trait]
pub trait ConsensusLog: Send + Sync {
    /// Append a message to the given log.
    async fn submit(
        &self,
        log: &LogId,
        message: &[u8],
        memo: Option<&str>,
    ) -> Result<SubmitReceipt, ConsensusError>;

    /// Read one page of messages from the given log.
    async fn read_page(
        &self,
        log: &LogId,
        cursor: Option<Cursor>,
        limit: u32,
        order: PageOrder,
    ) -> Result<RawPage, ConsensusError>;
}
