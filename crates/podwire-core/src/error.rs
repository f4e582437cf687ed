//! Shared error type across podwire crates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClientCode {
    /// Invalid input / malformed message.
    BadRequest,
    /// Workload or route target does not exist.
    NotFound,
    /// Frame grew past the configured limit.
    PayloadTooLarge,
    /// Unsupported protocol version.
    UnsupportedVersion,
    /// No reply arrived in time.
    Timeout,
    /// Remote peer went away before replying.
    PeerClosed,
    /// Stream read/write failure.
    Transport,
    /// Container engine rejected the operation.
    Backend,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::NotFound => "NOT_FOUND",
            ClientCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::PeerClosed => "PEER_CLOSED",
            ClientCode::Transport => "TRANSPORT",
            ClientCode::Backend => "BACKEND",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, PodwireError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum PodwireError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("payload too large")]
    PayloadTooLarge,
    #[error("unsupported protocol version")]
    UnsupportedVersion,
    #[error("timed out waiting for reply")]
    Timeout,
    #[error("peer closed the stream")]
    PeerClosed,
    #[error("transport: {0}")]
    Transport(#[from] std::io::Error),
    #[error("backend: {0}")]
    Backend(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl PodwireError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            PodwireError::BadRequest(_) => ClientCode::BadRequest,
            PodwireError::NotFound(_) => ClientCode::NotFound,
            PodwireError::PayloadTooLarge => ClientCode::PayloadTooLarge,
            PodwireError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            PodwireError::Timeout => ClientCode::Timeout,
            PodwireError::PeerClosed => ClientCode::PeerClosed,
            PodwireError::Transport(_) => ClientCode::Transport,
            PodwireError::Backend(_) => ClientCode::Backend,
            PodwireError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Message without the variant prefix, for re-wrapping on the other side of a tunnel.
    pub fn detail(&self) -> String {
        match self {
            PodwireError::BadRequest(m)
            | PodwireError::NotFound(m)
            | PodwireError::Backend(m)
            | PodwireError::Internal(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

/// Failure reported by the remote side of a tunnel, as carried in a tagged reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFailure {
    pub code: ClientCode,
    pub message: String,
}

impl From<&PodwireError> for RemoteFailure {
    fn from(e: &PodwireError) -> Self {
        Self {
            code: e.client_code(),
            message: e.detail(),
        }
    }
}

impl From<RemoteFailure> for PodwireError {
    fn from(f: RemoteFailure) -> Self {
        match f.code {
            ClientCode::BadRequest => PodwireError::BadRequest(f.message),
            ClientCode::NotFound => PodwireError::NotFound(f.message),
            ClientCode::Timeout => PodwireError::Timeout,
            _ => PodwireError::Backend(f.message),
        }
    }
}
