use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ccl_chain::ChainLink;
use ccl_types::{ConsensusPayload, LogId};

/// Acknowledgement returned by a successful consensus submission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmitReceipt {
    pub log: LogId,
    pub tx_ref: String,
    pub sequence_number: u64,
    pub running_hash: String,
    pub consensus_timestamp: DateTime<Utc>,
    pub payload_digest: String,
}

/// Read direction over a log's sequence numbers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageOrder {
    Ascending,
    Descending,
}

/// Opaque continuation token: the sequence number to resume reading from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(u64);

impl Cursor {
    pub fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// A raw, undecoded log message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawMessage {
    pub sequence_number: u64,
    pub consensus_timestamp: DateTime<Utc>,
    pub running_hash: String,
    pub contents: Vec<u8>,
}

/// One page of raw messages plus the continuation cursor, if more remain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawPage {
    pub messages: Vec<RawMessage>,
    pub next_cursor: Option<Cursor>,
}

/// A decoded log message: consensus metadata plus the parsed custody payload.
///
/// Ephemeral — reconstructed on every read, never persisted. `raw` keeps the
/// exact transmitted bytes so the digest stays independently recomputable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConsensusEntry {
    pub sequence_number: u64,
    pub consensus_timestamp: DateTime<Utc>,
    pub running_hash: String,
    pub raw: Vec<u8>,
    pub payload: ConsensusPayload,
    pub payload_digest: String,
}

impl ChainLink for ConsensusEntry {
    fn digest(&self) -> &str {
        &self.payload_digest
    }

    fn prev_digest(&self) -> Option<&str> {
        self.payload.prev.as_deref()
    }

    fn canonical_bytes(&self) -> &[u8] {
        &self.raw
    }
}

/// One decoded page plus the continuation cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedPage {
    pub entries: Vec<ConsensusEntry>,
    pub next_cursor: Option<Cursor>,
}

/// Result of a complete (multi-page) walk of a log.
///
/// Entries are de-duplicated by sequence number and sorted ascending.
/// `truncated` is set when the page-count ceiling was hit before the log was
/// exhausted; callers must surface it rather than present a silently
/// incomplete history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompleteFetch {
    pub entries: Vec<ConsensusEntry>,
    pub truncated: bool,
    pub pages_fetched: u32,
}
