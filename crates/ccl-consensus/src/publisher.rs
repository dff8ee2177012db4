use std::sync::Arc;
use std::time::Duration;

use ccl_chain::payload_digest;
use ccl_types::{ConsensusPayload, LogId};

use crate::client::ConsensusLog;
use crate::error::ConsensusError;
use crate::types::SubmitReceipt;

/// Fixed single-message byte ceiling. Exceeding it is a client-side
/// validation error, never sent upstream.
pub const MAX_MESSAGE_BYTES: usize = 4096;

/// Size-gated, timeout-bounded submission to the consensus log.
///
/// The publisher never retries and never falls back on its own: a delivery
/// failure is returned to the caller (the event recorder), which owns the
/// local-fallback decision. Exceeding the submit timeout is an immediate
/// delivery failure, never an unbounded wait inside a request handler.
pub struct Publisher {
    client: Arc<dyn ConsensusLog>,
    submit_timeout: Duration,
}

impl Publisher {
    pub fn new(client: Arc<dyn ConsensusLog>, submit_timeout: Duration) -> Self {
        Self {
            client,
            submit_timeout,
        }
    }

    /// Serialize, size-check, and submit a payload.
    pub async fn publish(
        &self,
        log: &LogId,
        payload: &ConsensusPayload,
        memo: Option<&str>,
    ) -> Result<SubmitReceipt, ConsensusError> {
        let bytes = payload
            .canonical_bytes()
            .map_err(|e| ConsensusError::Serialization(e.to_string()))?;
        if bytes.len() > MAX_MESSAGE_BYTES {
            return Err(ConsensusError::PayloadTooLarge {
                size: bytes.len(),
                max: MAX_MESSAGE_BYTES,
            });
        }
        let digest = payload_digest(&bytes);

        let submit = self.client.submit(log, &bytes, memo);
        let receipt = match tokio::time::timeout(self.submit_timeout, submit).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(ConsensusError::Timeout {
                    ms: self.submit_timeout.as_millis() as u64,
                })
            }
        };

        tracing::debug!(
            log = %log,
            seq = receipt.sequence_number,
            digest = %digest,
            "payload published to consensus log"
        );
        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ccl_types::{Actor, CustodyEventKind, ExpiryDate, FacilityId, FacilityType, ProductIdentity, Role};
    use chrono::Utc;

    use crate::memory::InMemoryConsensusLog;
    use crate::types::{Cursor, PageOrder, RawPage};

    fn payload() -> ConsensusPayload {
        let identity = ProductIdentity::new(
            "09506000134352",
            "LOT1",
            ExpiryDate::parse_compact("270101").unwrap(),
        );
        let actor = Actor::new(
            "u1",
            FacilityId::new("fac-mfg"),
            FacilityType::Manufacturer,
            Role::Operator,
        );
        ConsensusPayload::for_event(
            CustodyEventKind::Manufactured,
            &identity,
            &actor,
            None,
            Utc::now(),
            None,
            None,
        )
    }

    #[tokio::test]
    async fn publish_returns_receipt() {
        let log = Arc::new(InMemoryConsensusLog::new());
        let publisher = Publisher::new(log, Duration::from_secs(2));
        let receipt = publisher
            .publish(&LogId::new("0.0.1"), &payload(), None)
            .await
            .unwrap();
        assert_eq!(receipt.sequence_number, 1);
        assert!(!receipt.running_hash.is_empty());
    }

    #[tokio::test]
    async fn oversize_fails_before_any_network_call() {
        // An offline transport would fail with a delivery error; the size
        // gate must fire first.
        let log = Arc::new(InMemoryConsensusLog::new());
        log.set_offline(true);
        let publisher = Publisher::new(log, Duration::from_secs(2));

        let mut big = payload();
        let mut meta = std::collections::BTreeMap::new();
        meta.insert("note".to_string(), "x".repeat(MAX_MESSAGE_BYTES));
        big.meta = Some(meta);

        let err = publisher
            .publish(&LogId::new("0.0.1"), &big, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsensusError::PayloadTooLarge { .. }));
    }

    #[tokio::test]
    async fn delivery_failure_propagates() {
        let log = Arc::new(InMemoryConsensusLog::new());
        log.set_offline(true);
        let publisher = Publisher::new(log, Duration::from_secs(2));
        let err = publisher
            .publish(&LogId::new("0.0.1"), &payload(), None)
            .await
            .unwrap_err();
        assert!(err.is_recoverable_delivery());
    }

    struct StalledLog;

    #[async_trait]
    impl ConsensusLog for StalledLog {
        async fn submit(
            &self,
            _log: &LogId,
            _message: &[u8],
            _memo: Option<&str>,
        ) -> Result<SubmitReceipt, ConsensusError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("submit should have timed out")
        }

        async fn read_page(
            &self,
            _log: &LogId,
            _cursor: Option<Cursor>,
            _limit: u32,
            _order: PageOrder,
        ) -> Result<RawPage, ConsensusError> {
            Ok(RawPage {
                messages: vec![],
                next_cursor: None,
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_submit_times_out() {
        let publisher = Publisher::new(Arc::new(StalledLog), Duration::from_millis(250));
        let err = publisher
            .publish(&LogId::new("0.0.1"), &payload(), None)
            .await
            .unwrap_err();
        assert_eq!(err, ConsensusError::Timeout { ms: 250 });
    }
}
