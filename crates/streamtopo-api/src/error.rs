use thiserror::Error;

/// Top-level error type for the `streamtopo-api` crate.
///
/// Covers every failure mode across the controller surfaces: the snapshot
/// REST endpoints, the streaming action endpoints, and the notification
/// WebSocket. `streamtopo-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request exceeded the client's configured timeout.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Non-success HTTP status from the controller.
    #[error("Controller returned HTTP {status} for {path}")]
    Status { status: u16, path: String },

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    /// Writing a reply frame failed.
    #[error("WebSocket send failed: {0}")]
    WebSocketSend(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    /// Server-side failures and dropped connections qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Self::Timeout { .. } | Self::WebSocketConnect(_) | Self::WebSocketSend(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidUrl(_) | Self::Deserialization { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = Error::Status {
            status: 503,
            path: "/topology/switches".into(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = Error::Status {
            status: 404,
            path: "/topology/hosts".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn timeouts_are_transient() {
        assert!(Error::Timeout { timeout_secs: 5 }.is_transient());
    }

    #[test]
    fn deserialization_is_permanent() {
        let err = Error::Deserialization {
            message: "expected value".into(),
            body: "<html>".into(),
        };
        assert!(!err.is_transient());
    }
}
