use std::collections::BTreeMap;
use std::sync::Arc;

use ccl_chain::payload_digest;
use ccl_types::{ConsensusPayload, LogId};

use crate::client::ConsensusLog;
use crate::error::ConsensusError;
use crate::types::{CompleteFetch, ConsensusEntry, Cursor, DecodedPage, PageOrder, RawMessage};

/// Default page size for ledger reads.
pub const DEFAULT_PAGE_LIMIT: u32 = 25;

/// Default ceiling on pages fetched by a complete walk.
pub const DEFAULT_MAX_WALK_PAGES: u32 = 16;

/// Parameters for a bounded single-page fetch.
#[derive(Clone, Debug)]
pub struct PageRequest {
    pub cursor: Option<Cursor>,
    pub limit: u32,
    pub order: PageOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: DEFAULT_PAGE_LIMIT,
            order: PageOrder::Ascending,
        }
    }
}

/// Paginated fetch + decode over the consensus log's history.
///
/// The reader is read-only and log-wide: the log is shared across all
/// batches, so identity filtering belongs to the timeline reconciler, not
/// here.
pub struct LedgerReader {
    client: Arc<dyn ConsensusLog>,
}

impl LedgerReader {
    pub fn new(client: Arc<dyn ConsensusLog>) -> Self {
        Self { client }
    }

    /// Fetch and decode one page.
    ///
    /// A single malformed message aborts the whole page with a decode
    /// error — corrupted pages are never silently dropped.
    pub async fn fetch_page(
        &self,
        log: &LogId,
        request: &PageRequest,
    ) -> Result<DecodedPage, ConsensusError> {
        let raw = self
            .client
            .read_page(log, request.cursor, request.limit, request.order)
            .await?;

        let mut entries = Vec::with_capacity(raw.messages.len());
        for message in raw.messages {
            entries.push(decode_message(message)?);
        }

        Ok(DecodedPage {
            entries,
            next_cursor: raw.next_cursor,
        })
    }

    /// Walk the log from the start, up to `max_pages` pages of `page_limit`
    /// messages each.
    ///
    /// Entries are de-duplicated by sequence number. If the ceiling is hit
    /// with data remaining, the partial entries collected so far are
    /// returned with `truncated = true` — never an empty result.
    pub async fn fetch_complete(
        &self,
        log: &LogId,
        page_limit: u32,
        max_pages: u32,
    ) -> Result<CompleteFetch, ConsensusError> {
        let mut by_sequence: BTreeMap<u64, ConsensusEntry> = BTreeMap::new();
        let mut cursor: Option<Cursor> = None;
        let mut pages_fetched = 0u32;
        let mut truncated = false;

        loop {
            let page = self
                .fetch_page(
                    log,
                    &PageRequest {
                        cursor,
                        limit: page_limit,
                        order: PageOrder::Ascending,
                    },
                )
                .await?;
            pages_fetched += 1;

            for entry in page.entries {
                by_sequence.entry(entry.sequence_number).or_insert(entry);
            }

            match page.next_cursor {
                None => break,
                Some(next) => {
                    if pages_fetched >= max_pages {
                        truncated = true;
                        tracing::warn!(
                            log = %log,
                            pages = pages_fetched,
                            "complete walk hit the page ceiling; history truncated"
                        );
                        break;
                    }
                    cursor = Some(next);
                }
            }
        }

        Ok(CompleteFetch {
            entries: by_sequence.into_values().collect(),
            truncated,
            pages_fetched,
        })
    }
}

fn decode_message(message: RawMessage) -> Result<ConsensusEntry, ConsensusError> {
    let payload =
        ConsensusPayload::from_bytes(&message.contents).map_err(|e| ConsensusError::Decode {
            sequence: message.sequence_number,
            reason: e.to_string(),
        })?;
    let digest = payload_digest(&message.contents);
    Ok(ConsensusEntry {
        sequence_number: message.sequence_number,
        consensus_timestamp: message.consensus_timestamp,
        running_hash: message.running_hash,
        raw: message.contents,
        payload,
        payload_digest: digest,
    })
}
