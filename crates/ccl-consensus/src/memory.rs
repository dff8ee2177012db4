use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use ccl_chain::payload_digest;
use ccl_types::LogId;

use crate::client::ConsensusLog;
use crate::error::{ConsensusError, DeliveryFault};
use crate::publisher::MAX_MESSAGE_BYTES;
use crate::types::{Cursor, PageOrder, RawMessage, RawPage, SubmitReceipt};

/// In-memory consensus log for tests, local demos, and embedding.
///
/// Mimics the external log's observable behaviour: sequence numbers from 1,
/// a running hash chained over message bytes, and cursor-based pagination.
/// The `offline` switch injects delivery failures so callers can exercise
/// the local-fallback path without a network.
pub struct InMemoryConsensusLog {
    inner: RwLock<HashMap<LogId, Vec<StoredMessage>>>,
    offline: AtomicBool,
}

struct StoredMessage {
    sequence_number: u64,
    consensus_timestamp: DateTime<Utc>,
    running_hash: String,
    contents: Vec<u8>,
}

impl InMemoryConsensusLog {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Make subsequent submissions fail with a network delivery error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of messages appended to the given log.
    pub fn message_count(&self, log: &LogId) -> usize {
        self.inner
            .read()
            .map(|state| state.get(log).map(Vec::len).unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Default for InMemoryConsensusLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConsensusLog for InMemoryConsensusLog {
    async fn submit(
        &self,
        log: &LogId,
        message: &[u8],
        _memo: Option<&str>,
    ) -> Result<SubmitReceipt, ConsensusError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ConsensusError::Delivery {
                fault: DeliveryFault::Network,
                message: "consensus node unreachable".into(),
            });
        }
        if message.len() > MAX_MESSAGE_BYTES {
            // The node enforces the ceiling too; callers should have gated
            // earlier.
            return Err(ConsensusError::Delivery {
                fault: DeliveryFault::Oversize,
                message: format!("{} bytes over the node limit", message.len()),
            });
        }

        let mut state = self
            .inner
            .write()
            .map_err(|_| ConsensusError::Unavailable("log lock poisoned".into()))?;
        let stream = state.entry(log.clone()).or_default();

        let sequence_number = stream.len() as u64 + 1;
        let consensus_timestamp = Utc::now();
        let prev_running = stream
            .last()
            .map(|m| m.running_hash.clone())
            .unwrap_or_default();

        let mut hasher = blake3::Hasher::new();
        hasher.update(prev_running.as_bytes());
        hasher.update(message);
        let running_hash = hex::encode(hasher.finalize().as_bytes());

        stream.push(StoredMessage {
            sequence_number,
            consensus_timestamp,
            running_hash: running_hash.clone(),
            contents: message.to_vec(),
        });

        Ok(SubmitReceipt {
            log: log.clone(),
            tx_ref: format!("{}@{}", log, consensus_timestamp.timestamp_micros()),
            sequence_number,
            running_hash,
            consensus_timestamp,
            payload_digest: payload_digest(message),
        })
    }

    async fn read_page(
        &self,
        log: &LogId,
        cursor: Option<Cursor>,
        limit: u32,
        order: PageOrder,
    ) -> Result<RawPage, ConsensusError> {
        let state = self
            .inner
            .read()
            .map_err(|_| ConsensusError::Unavailable("log lock poisoned".into()))?;
        let Some(stream) = state.get(log) else {
            return Ok(RawPage {
                messages: vec![],
                next_cursor: None,
            });
        };

        let limit = limit.max(1) as usize;
        let (window, next_cursor) = match order {
            PageOrder::Ascending => {
                let from = cursor.map(|c| c.sequence()).unwrap_or(1);
                let selected: Vec<&StoredMessage> = stream
                    .iter()
                    .filter(|m| m.sequence_number >= from)
                    .collect();
                let page: Vec<&StoredMessage> = selected.iter().take(limit).copied().collect();
                let next = if selected.len() > limit {
                    page.last().map(|m| Cursor::new(m.sequence_number + 1))
                } else {
                    None
                };
                (page, next)
            }
            PageOrder::Descending => {
                let from = cursor
                    .map(|c| c.sequence())
                    .unwrap_or(stream.len() as u64);
                let selected: Vec<&StoredMessage> = stream
                    .iter()
                    .rev()
                    .filter(|m| m.sequence_number <= from)
                    .collect();
                let page: Vec<&StoredMessage> = selected.iter().take(limit).copied().collect();
                let next = if selected.len() > limit {
                    page.last().and_then(|m| {
                        (m.sequence_number > 1).then(|| Cursor::new(m.sequence_number - 1))
                    })
                } else {
                    None
                };
                (page, next)
            }
        };

        Ok(RawPage {
            messages: window
                .into_iter()
                .map(|m| RawMessage {
                    sequence_number: m.sequence_number,
                    consensus_timestamp: m.consensus_timestamp,
                    running_hash: m.running_hash.clone(),
                    contents: m.contents.clone(),
                })
                .collect(),
            next_cursor,
        })
    }
}
