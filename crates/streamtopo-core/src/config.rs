// ── Runtime connection configuration ──
//
// Describes *how* to reach a topology controller. Never touches disk:
// the CLI builds a `ControllerConfig` (usually from a streamtopo-config
// profile) and hands it in.

use std::time::Duration;

use streamtopo_api::transport::TransportConfig;
use url::Url;

pub use streamtopo_api::transport::TlsMode;
pub use streamtopo_api::websocket::ReconnectConfig;

use crate::error::CoreError;

/// Path of the notification socket on the controller.
pub const DEFAULT_WS_PATH: &str = "/topology/ws";

/// Configuration for one controller session.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Controller base URL (e.g., `http://127.0.0.1:8080`).
    pub url: Url,
    /// Notification socket path, joined onto `url`.
    pub ws_path: String,
    /// TLS verification strategy.
    pub tls: TlsMode,
    /// REST request timeout.
    pub timeout: Duration,
    /// Query `/topology/disc` before loading the snapshot.
    pub wait_for_discovery: bool,
    /// Backoff between notification socket reconnects.
    pub reconnect: ReconnectConfig,
}

impl ControllerConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            ws_path: DEFAULT_WS_PATH.into(),
            tls: TlsMode::default(),
            timeout: Duration::from_secs(30),
            wait_for_discovery: true,
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Parse `url` and apply defaults for everything else.
    pub fn from_url(url: &str) -> Result<Self, CoreError> {
        let url = Url::parse(url).map_err(|e| CoreError::Config {
            message: format!("invalid controller URL '{url}': {e}"),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self::new(url)),
            other => Err(CoreError::Config {
                message: format!("unsupported URL scheme '{other}' (expected http or https)"),
            }),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls,
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_url() {
        let config = ControllerConfig::from_url("http://127.0.0.1:8080").unwrap();
        assert_eq!(config.ws_path, "/topology/ws");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.wait_for_discovery);
        assert_eq!(config.transport().tls, TlsMode::System);
    }

    #[test]
    fn rejects_non_http_scheme() {
        assert!(ControllerConfig::from_url("ws://127.0.0.1:8080").is_err());
        assert!(ControllerConfig::from_url("not a url").is_err());
    }
}
