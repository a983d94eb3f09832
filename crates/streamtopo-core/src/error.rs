// ── Core error types ──
//
// User-facing errors from streamtopo-core. Consumers never see reqwest
// or tungstenite errors directly; `From<streamtopo_api::Error>` maps
// transport failures into domain variants.
//
// Referential misses inside the store (unknown dpid/mac on update or
// delete) are logged and skipped, not surfaced here.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot connect to controller at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Controller disconnected")]
    ControllerDisconnected,

    #[error("Controller request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    // ── Lookup errors ────────────────────────────────────────────────
    #[error("Switch not found: {dpid}")]
    SwitchNotFound { dpid: String },

    #[error("Host not found: {mac}")]
    HostNotFound { mac: String },

    #[error("Stream {stream_id} is not sourced by any host")]
    UnknownStream { stream_id: u32 },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Controller rejected {action}: {stat}")]
    Rejected { action: String, stat: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<streamtopo_api::Error> for CoreError {
    fn from(err: streamtopo_api::Error) -> Self {
        use streamtopo_api::Error as ApiError;

        match err {
            ApiError::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            ApiError::Status { status, path } => CoreError::Api {
                message: format!("HTTP {status} from /{path}"),
                status: Some(status),
            },
            ApiError::WebSocketConnect(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket connection failed: {reason}"),
            },
            ApiError::WebSocketSend(reason) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("WebSocket send failed: {reason}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_maps_to_api_error() {
        let err: CoreError = streamtopo_api::Error::Status {
            status: 502,
            path: "topology/switches".into(),
        }
        .into();
        match err {
            CoreError::Api { status, message } => {
                assert_eq!(status, Some(502));
                assert!(message.contains("/topology/switches"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn timeout_keeps_configured_seconds() {
        let err: CoreError = streamtopo_api::Error::Timeout { timeout_secs: 30 }.into();
        assert!(matches!(err, CoreError::Timeout { timeout_secs: 30 }));
        assert_eq!(err.to_string(), "Controller request timed out after 30s");
    }

    #[test]
    fn websocket_failures_are_connection_errors() {
        let err: CoreError = streamtopo_api::Error::WebSocketConnect("refused".into()).into();
        assert!(matches!(err, CoreError::ConnectionFailed { .. }));
    }
}
