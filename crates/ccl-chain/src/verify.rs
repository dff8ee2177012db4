use crate::digest::payload_digest;

/// A custody event's view into the hash chain.
///
/// The prev reference is an explicit optional string, not a pointer: it must
/// survive serialization to the external log and be reconstructable by any
/// independent reader of that log alone.
pub trait ChainLink {
    /// The link's own payload digest (hex).
    fn digest(&self) -> &str;
    /// The predecessor's digest; `None` for the batch's first event.
    fn prev_digest(&self) -> Option<&str>;
    /// The canonical payload bytes the digest was computed over.
    fn canonical_bytes(&self) -> &[u8];
}

/// Hash chain integrity verifier.
///
/// Verifies that a batch's event sequence forms a valid chain: the first
/// link has no predecessor, each later link's prev matches its predecessor's
/// digest, and every digest is correctly recomputed from its payload bytes.
pub struct ChainVerifier;

impl ChainVerifier {
    pub fn verify(links: &[impl ChainLink]) -> Result<(), ChainError> {
        let Some(first) = links.first() else {
            return Ok(());
        };

        if first.prev_digest().is_some() {
            return Err(ChainError::GenesisHasPrev);
        }

        for (index, link) in links.iter().enumerate() {
            let computed = payload_digest(link.canonical_bytes());
            if computed != link.digest() {
                return Err(ChainError::DigestMismatch { index });
            }

            if index == 0 {
                continue;
            }
            let expected_prev = links[index - 1].digest();
            match link.prev_digest() {
                Some(prev) if prev == expected_prev => {}
                Some(_) => return Err(ChainError::BrokenLink { index }),
                None => return Err(ChainError::MissingPrev { index }),
            }
        }

        Ok(())
    }
}

/// Errors from chain verification.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("first event has a prev digest (should be absent)")]
    GenesisHasPrev,

    #[error("broken link at index {index}: prev digest does not match predecessor")]
    BrokenLink { index: usize },

    #[error("missing prev digest at index {index}")]
    MissingPrev { index: usize },

    #[error("digest mismatch at index {index}: recomputed digest differs from stored")]
    DigestMismatch { index: usize },
}
