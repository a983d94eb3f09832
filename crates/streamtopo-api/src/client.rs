// Controller HTTP client
//
// Wraps `reqwest::Client` with URL construction for the topology snapshot
// endpoints and the streaming action endpoints. Responses are plain JSON
// (no envelope); non-2xx statuses surface as `Error::Status`.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ActionReply, HostMsg, LinkMsg, PriorityChangeBody, StreamBindingBody, SwitchMsg};
use crate::transport::TransportConfig;

/// Raw HTTP client for the controller's REST surface.
#[derive(Debug, Clone)]
pub struct ControllerClient {
    http: reqwest::Client,
    base_url: Url,
    /// Request timeout the client was built with.
    timeout: Duration,
}

impl ControllerClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the controller root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url,
            timeout: transport.timeout,
        })
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Join `path` onto the base URL, keeping any path prefix the base has.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        let full = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Ok(Url::parse(&full)?)
    }

    /// The notification socket URL: same host, `ws`/`wss` scheme.
    pub fn ws_url(&self, path: &str) -> Result<Url, Error> {
        let mut url = self.url(path)?;
        let scheme = if url.scheme() == "https" { "wss" } else { "ws" };
        url.set_scheme(scheme)
            .map_err(|()| Error::WebSocketConnect(format!("cannot derive websocket URL from {url}")))?;
        Ok(url)
    }

    // ── Snapshot endpoints ───────────────────────────────────────────

    /// `GET /topology/disc` -- discovery readiness, returned raw.
    pub async fn discovery_status(&self) -> Result<serde_json::Value, Error> {
        self.get("topology/disc").await
    }

    /// `GET /topology/switches`
    pub async fn list_switches(&self) -> Result<Vec<SwitchMsg>, Error> {
        self.get::<Option<Vec<SwitchMsg>>>("topology/switches")
            .await
            .map(Option::unwrap_or_default)
    }

    /// `GET /topology/links`
    pub async fn list_links(&self) -> Result<Vec<LinkMsg>, Error> {
        self.get::<Option<Vec<LinkMsg>>>("topology/links")
            .await
            .map(Option::unwrap_or_default)
    }

    /// `GET /topology/hosts` -- the controller answers `null` when it has
    /// no host table yet, which is treated as empty.
    pub async fn list_hosts(&self) -> Result<Vec<HostMsg>, Error> {
        self.get::<Option<Vec<HostMsg>>>("topology/hosts")
            .await
            .map(Option::unwrap_or_default)
    }

    // ── Streaming actions ────────────────────────────────────────────

    /// `POST /streaming/source_for`
    pub async fn source_for(&self, body: &StreamBindingBody) -> Result<ActionReply, Error> {
        self.post("streaming/source_for", body).await
    }

    /// `POST /streaming/receive_from`
    pub async fn receive_from(&self, body: &StreamBindingBody) -> Result<ActionReply, Error> {
        self.post("streaming/receive_from", body).await
    }

    /// `POST /streaming/priority_change`
    pub async fn priority_change(&self, body: &PriorityChangeBody) -> Result<ActionReply, Error> {
        self.post("streaming/priority_change", body).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await.map_err(|e| self.transport_error(e))?;
        self.parse_json(path, resp).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &impl Serialize) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;
        self.parse_json(path, resp).await
    }

    async fn parse_json<T: DeserializeOwned>(&self, path: &str, resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                path: path.to_owned(),
            });
        }

        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ControllerClient {
        ControllerClient::new(Url::parse(base).unwrap(), &TransportConfig::default()).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let c = client("http://10.0.0.1:8080/");
        assert_eq!(
            c.url("/topology/switches").unwrap().as_str(),
            "http://10.0.0.1:8080/topology/switches"
        );
    }

    #[test]
    fn url_keeps_base_prefix() {
        let c = client("http://10.0.0.1/ryu");
        assert_eq!(
            c.url("topology/links").unwrap().as_str(),
            "http://10.0.0.1/ryu/topology/links"
        );
    }

    #[test]
    fn ws_url_swaps_scheme() {
        assert_eq!(
            client("http://10.0.0.1").ws_url("/topology/ws").unwrap().as_str(),
            "ws://10.0.0.1/topology/ws"
        );
        assert_eq!(
            client("https://ctl.example").ws_url("/topology/ws").unwrap().as_str(),
            "wss://ctl.example/topology/ws"
        );
    }
}
