//! Duplex JSON-RPC notification socket.
//!
//! The controller pushes topology notifications as JSON-RPC requests over a
//! WebSocket and expects a reply for each one on the same socket. This
//! module owns a single connection's lifecycle: it reads text frames in
//! arrival order, hands each to a [`FrameHandler`], and writes the handler's
//! reply before reading the next frame.
//!
//! Reconnection policy lives with the caller (the session needs to reload a
//! snapshot between connections), but the backoff math is shared from here.
//!
//! # Example
//!
//! ```rust,ignore
//! use streamtopo_api::websocket::{serve_connection, FrameHandler};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Echo;
//! impl FrameHandler for Echo {
//!     fn handle_frame(&mut self, text: &str) -> Option<String> {
//!         Some(text.to_owned())
//!     }
//! }
//!
//! let url = url::Url::parse("ws://127.0.0.1:8080/topology/ws")?;
//! serve_connection(&url, &mut Echo, &CancellationToken::new()).await?;
//! ```

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;

// ── FrameHandler ─────────────────────────────────────────────────────

/// Consumer of inbound text frames.
///
/// Called synchronously, one frame at a time. Returning `Some` writes the
/// string back as a text frame before the next frame is read.
pub trait FrameHandler {
    /// The handshake completed; frames follow.
    fn on_open(&mut self) {}

    fn handle_frame(&mut self, text: &str) -> Option<String>;
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for WebSocket reconnection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish a single WebSocket connection and serve frames until it drops.
///
/// Returns `Ok(())` on a clean close (close frame, end of stream, or
/// cancellation) and `Err` on connect/read/write failures.
pub async fn serve_connection<H>(
    url: &Url,
    handler: &mut H,
    cancel: &CancellationToken,
) -> Result<(), Error>
where
    H: FrameHandler + Send,
{
    tracing::info!(url = %url, "Connecting to notification socket");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

    tracing::info!("Notification socket connected");
    handler.on_open();

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return Ok(());
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(reply) = handler.handle_frame(text.as_str()) {
                            write
                                .send(Message::Text(reply.into()))
                                .await
                                .map_err(|e| Error::WebSocketSend(e.to_string()))?;
                        }
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // tungstenite queues the pong; it goes out with the next write
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::WebSocketConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25%, seeded from the attempt number.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap, clippy::as_conversions)]
pub fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt.min(30) as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter_factor = 1.0 + 0.25 * (f64::from(attempt) * 7.3).sin();
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reconnect_config() {
        let config = ReconnectConfig::default();
        assert_eq!(config.initial_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert!(config.max_retries.is_none());
    }

    #[test]
    fn backoff_increases_exponentially() {
        let config = ReconnectConfig::default();

        let d0 = calculate_backoff(0, &config);
        let d1 = calculate_backoff(1, &config);
        let d2 = calculate_backoff(2, &config);

        assert!(d1 > d0, "d1 ({d1:?}) should be greater than d0 ({d0:?})");
        assert!(d2 > d1, "d2 ({d2:?}) should be greater than d1 ({d1:?})");
    }

    #[test]
    fn backoff_caps_at_max_delay() {
        let config = ReconnectConfig {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(10),
            max_retries: None,
        };

        let d10 = calculate_backoff(10, &config);
        assert!(
            d10 <= Duration::from_secs(13),
            "delay at attempt 10 ({d10:?}) should be capped near max_delay"
        );
    }

    #[test]
    fn backoff_survives_huge_attempt_counts() {
        let config = ReconnectConfig::default();
        let d = calculate_backoff(u32::MAX, &config);
        assert!(d <= Duration::from_secs(38));
    }
}
