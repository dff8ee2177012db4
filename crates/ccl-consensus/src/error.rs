use std::fmt;

use thiserror::Error;

/// Category of a delivery failure reported by the consensus transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFault {
    Network,
    Auth,
    RateLimited,
    Oversize,
}

impl fmt::Display for DeliveryFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Network => "network",
            Self::Auth => "auth",
            Self::RateLimited => "rate-limited",
            Self::Oversize => "oversize",
        };
        write!(f, "{s}")
    }
}

/// Errors produced at the consensus log boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    /// Local validation failure, raised before any network call.
    #[error("payload of {size} bytes exceeds the {max}-byte message ceiling")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("delivery failed ({fault}): {message}")]
    Delivery {
        fault: DeliveryFault,
        message: String,
    },

    #[error("submit timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("consensus log unavailable: {0}")]
    Unavailable(String),

    /// A corrupt ledger message; aborts only the affected page.
    #[error("corrupt message at sequence {sequence}: {reason}")]
    Decode { sequence: u64, reason: String },

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ConsensusError {
    /// Whether this failure is the recoverable delivery class the event
    /// recorder absorbs into local fallback. Validation and decode failures
    /// are not recoverable and must surface.
    pub fn is_recoverable_delivery(&self) -> bool {
        matches!(
            self,
            Self::Delivery { .. } | Self::Timeout { .. } | Self::Unavailable(_)
        )
    }
}
