//! Error taxonomy for the client session.
//!
//! None of these are fatal to the process: every variant is rendered into the
//! store's current-error slot and shown in the error banner.

use shared::ABNORMAL_CLOSURE;
use thiserror::Error;

/// Problems with the externally supplied session configuration.
/// Never retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("server endpoint is not configured; pass --server or set ARENA_WS_URL")]
    MissingEndpoint,

    #[error("server endpoint must start with ws:// or wss:// (got {0})")]
    InvalidScheme(String),

    #[error("display name cannot be empty")]
    EmptyName,

    #[error("room id must be letters and digits only (got {0:?})")]
    InvalidRoomId(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    /// Low-level socket failure. Logged only; the close that follows decides
    /// what happens next.
    #[error("transport error: {0}")]
    Transport(String),

    /// An inbound frame that could not be decoded. The connection stays open.
    #[error("malformed server message: {0}")]
    Protocol(String),

    /// Any close other than a normal closure.
    #[error("{}", describe_close(.code, .reason))]
    Disconnected { code: u16, reason: String },
}

fn describe_close(code: &u16, reason: &str) -> String {
    if *code == ABNORMAL_CLOSURE {
        "server unreachable".to_string()
    } else if !reason.is_empty() {
        reason.to_string()
    } else {
        format!("connection closed unexpectedly (code {})", code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abnormal_closure_message() {
        let err = ClientError::Disconnected {
            code: 1006,
            reason: "ignored".to_string(),
        };
        assert_eq!(err.to_string(), "server unreachable");
    }

    #[test]
    fn test_close_reason_is_verbatim() {
        let err = ClientError::Disconnected {
            code: 4001,
            reason: "room is full".to_string(),
        };
        assert_eq!(err.to_string(), "room is full");
    }

    #[test]
    fn test_generic_close_message() {
        let err = ClientError::Disconnected {
            code: 1011,
            reason: String::new(),
        };
        assert_eq!(
            err.to_string(),
            "connection closed unexpectedly (code 1011)"
        );
    }

    #[test]
    fn test_configuration_error_is_transparent() {
        let err: ClientError = ConfigError::InvalidScheme("http://x".to_string()).into();
        assert_eq!(
            err.to_string(),
            "server endpoint must start with ws:// or wss:// (got http://x)"
        );
    }
}
