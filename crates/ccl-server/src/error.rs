use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use ccl_consensus::ConsensusError;
use ccl_ledger::RecorderError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Recorder(#[from] RecorderError),

    /// Read-side consensus failure; page-level and recoverable.
    #[error("consensus log unavailable: {0}")]
    Upstream(String),

    #[error("corrupt ledger message at sequence {sequence}: {reason}")]
    Decode { sequence: u64, reason: String },

    #[error("{0}")]
    BadRequest(String),

    #[error("caller identity missing or malformed: {0}")]
    Unauthenticated(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// Lift a read-side consensus failure; decode errors keep their
    /// sequence context.
    pub fn from_read(err: ConsensusError) -> Self {
        match err {
            ConsensusError::Decode { sequence, reason } => Self::Decode { sequence, reason },
            other => Self::Upstream(other.to_string()),
        }
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Recorder(err) => match err {
                RecorderError::Identifier(_) | RecorderError::Validation(_) => {
                    (StatusCode::BAD_REQUEST, "validation")
                }
                RecorderError::Unauthorized { .. } => (StatusCode::FORBIDDEN, "authorization"),
                RecorderError::PendingReceipt { .. } => (StatusCode::CONFLICT, "pending_receipt"),
                RecorderError::TerminalLock { .. } => (StatusCode::CONFLICT, "terminal_lock"),
                RecorderError::DuplicateInFlight => (StatusCode::CONFLICT, "duplicate_in_flight"),
                RecorderError::StaleBatch => (StatusCode::CONFLICT, "conflict"),
                RecorderError::MissingHandover => (StatusCode::CONFLICT, "conflict"),
                RecorderError::UnknownBatch => (StatusCode::NOT_FOUND, "unknown_batch"),
                RecorderError::UnknownFacility(_) => (StatusCode::BAD_REQUEST, "validation"),
                RecorderError::Directory(_)
                | RecorderError::Store(_)
                | RecorderError::Serialization(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "internal")
                }
            },
            Self::Upstream(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
            Self::Decode { .. } => (StatusCode::BAD_GATEWAY, "decode"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation"),
            Self::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, "unauthenticated"),
            Self::Config(_) | Self::Io(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(json!({
            "error": { "code": code, "message": self.to_string() }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccl_types::{CustodyEventKind, FacilityId};

    #[test]
    fn taxonomy_maps_to_statuses() {
        let cases = [
            (
                ServerError::Recorder(RecorderError::Validation("bad".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                ServerError::Recorder(RecorderError::Unauthorized {
                    reason: "nope".into(),
                }),
                StatusCode::FORBIDDEN,
            ),
            (
                ServerError::Recorder(RecorderError::PendingReceipt {
                    awaiting: FacilityId::new("fac-1"),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ServerError::Recorder(RecorderError::TerminalLock {
                    kind: CustodyEventKind::Recalled,
                }),
                StatusCode::CONFLICT,
            ),
            (
                ServerError::Recorder(RecorderError::UnknownBatch),
                StatusCode::NOT_FOUND,
            ),
            (
                ServerError::Upstream("down".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (
                ServerError::Decode {
                    sequence: 3,
                    reason: "bad json".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                ServerError::Unauthenticated("missing header".into()),
                StatusCode::UNAUTHORIZED,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_and_code().0, expected, "{err}");
        }
    }

    #[test]
    fn read_errors_keep_decode_context() {
        let err = ServerError::from_read(ConsensusError::Decode {
            sequence: 9,
            reason: "truncated".into(),
        });
        assert!(matches!(err, ServerError::Decode { sequence: 9, .. }));

        let err = ServerError::from_read(ConsensusError::Unavailable("offline".into()));
        assert!(matches!(err, ServerError::Upstream(_)));
    }
}
