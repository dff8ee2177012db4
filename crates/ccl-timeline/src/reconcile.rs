use ccl_chain::ChainVerifier;
use ccl_consensus::{CompleteFetch, ConsensusEntry, Cursor, DecodedPage};
use ccl_types::ProductIdentity;

use crate::error::TimelineResult;

/// Hint attached to a timeline with no matching entries, so the caller can
/// tell "look further back" apart from "nothing was ever published".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimelineNote {
    /// Other batches' events were scanned but none matched; the identity's
    /// history may live on pages not yet fetched.
    TryOlderPages,
    /// Nothing has been published for this identity.
    NothingPublished,
}

/// A batch's consensus history, filtered out of the shared log.
#[derive(Debug, PartialEq, Eq)]
pub struct ReconciledTimeline {
    /// Entries whose embedded identity triple matches the query, with their
    /// original sequence numbers.
    pub entries: Vec<ConsensusEntry>,
    /// How many decoded entries were scanned, matching or not.
    pub scanned: usize,
    /// Whether the underlying walk hit its page ceiling before exhausting
    /// the log.
    pub truncated: bool,
    pub next_cursor: Option<Cursor>,
    pub note: Option<TimelineNote>,
}

impl ReconciledTimeline {
    /// Verify the filtered entries form a valid hash chain.
    pub fn verify_chain(&self) -> TimelineResult<()> {
        ChainVerifier::verify(&self.entries)?;
        Ok(())
    }
}

fn filter(entries: &[ConsensusEntry], identity: &ProductIdentity) -> Vec<ConsensusEntry> {
    entries
        .iter()
        .filter(|entry| entry.payload.matches_identity(identity))
        .cloned()
        .collect()
}

/// Reconcile one page of the shared log against a batch identity.
pub fn reconcile_page(page: &DecodedPage, identity: &ProductIdentity) -> ReconciledTimeline {
    let entries = filter(&page.entries, identity);
    let scanned = page.entries.len();
    let note = if entries.is_empty() {
        if scanned > 0 {
            Some(TimelineNote::TryOlderPages)
        } else {
            Some(TimelineNote::NothingPublished)
        }
    } else {
        None
    };
    ReconciledTimeline {
        entries,
        scanned,
        truncated: false,
        next_cursor: page.next_cursor,
        note,
    }
}

/// Reconcile a complete walk of the shared log against a batch identity.
///
/// A truncated walk with no matches yields `TryOlderPages` (the history may
/// be past the ceiling); an exhaustive walk with no matches is genuinely
/// `NothingPublished`.
pub fn reconcile_complete(fetch: &CompleteFetch, identity: &ProductIdentity) -> ReconciledTimeline {
    let entries = filter(&fetch.entries, identity);
    let scanned = fetch.entries.len();
    let note = if entries.is_empty() {
        if fetch.truncated && scanned > 0 {
            Some(TimelineNote::TryOlderPages)
        } else {
            Some(TimelineNote::NothingPublished)
        }
    } else {
        None
    };
    ReconciledTimeline {
        entries,
        scanned,
        truncated: fetch.truncated,
        next_cursor: None,
        note,
    }
}
