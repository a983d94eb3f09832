// ── Controller abstraction ──
//
// Full lifecycle for one topology controller: snapshot load, the
// notification session with reconnect, command routing, and publication
// of topology snapshots.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use streamtopo_api::ControllerClient;
use streamtopo_api::websocket::{FrameHandler, calculate_backoff, serve_connection};
use url::Url;

use crate::command::{self, Command, CommandEnvelope, CommandResult};
use crate::config::ControllerConfig;
use crate::dispatch::Topology;
use crate::error::CoreError;
use crate::model::{Host, Switch, SwitchLink};
use crate::render::{NullRenderer, Renderer, TopologySnapshot, WatchRenderer};
use crate::stream::TopologyStream;

const COMMAND_CHANNEL_SIZE: usize = 64;

// ── ConnectionState ──────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting { attempt: u32 },
    Failed,
}

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. One background session
/// task owns the topology replica; everyone else reads published
/// snapshots.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: ControllerClient,
    snapshot: watch::Sender<Arc<TopologySnapshot>>,
    connection_state: watch::Sender<ConnectionState>,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller. Does NOT connect; call
    /// [`connect()`](Self::connect) to load the topology and start tasks.
    pub fn new(config: ControllerConfig) -> Result<Self, CoreError> {
        let client = ControllerClient::new(config.url.clone(), &config.transport())?;
        let (snapshot, _) = watch::channel(Arc::new(TopologySnapshot::empty()));
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Ok(Self {
            inner: Arc::new(ControllerInner {
                config,
                client,
                snapshot,
                connection_state,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Load the initial snapshot, then spawn the notification session and
    /// the command processor.
    ///
    /// The state stays `Connecting` until the notification socket's
    /// handshake completes.
    pub async fn connect(&self) -> Result<(), CoreError> {
        let ws_url = self.inner.client.ws_url(&self.inner.config.ws_path)?;
        self.inner.connection_state.send_replace(ConnectionState::Connecting);

        let mut topology = Topology::new(WatchRenderer::from_sender(self.inner.snapshot.clone()));
        if let Err(e) = load_into(&self.inner.client, &self.inner.config, &mut topology).await {
            self.inner.connection_state.send_replace(ConnectionState::Failed);
            return Err(e);
        }

        let mut handles = self.inner.task_handles.lock().await;

        if let Some(rx) = self.inner.command_rx.lock().await.take() {
            let ctrl = self.clone();
            handles.push(tokio::spawn(command_processor_task(ctrl, rx)));
        }
        handles.push(tokio::spawn(session_task(self.clone(), topology, ws_url)));

        info!(url = %self.inner.config.url, "topology loaded");
        Ok(())
    }

    /// Cancel background tasks and wait for them to finish.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }

        self.inner
            .connection_state
            .send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    // ── Command execution ────────────────────────────────────────

    /// Send a command through the command processor and await the reply.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let state = self.inner.connection_state.borrow().clone();
        if matches!(state, ConnectionState::Disconnected | ConnectionState::Failed) {
            return Err(CoreError::ControllerDisconnected);
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::ControllerDisconnected)?;

        rx.await.map_err(|_| CoreError::ControllerDisconnected)?
    }

    // ── One-shot convenience ─────────────────────────────────────

    /// Fetch one snapshot without opening the notification socket.
    pub async fn snapshot_once(config: &ControllerConfig) -> Result<Topology<NullRenderer>, CoreError> {
        let client = ControllerClient::new(config.url.clone(), &config.transport())?;
        let mut topology = Topology::new(NullRenderer);
        load_into(&client, config, &mut topology).await?;
        Ok(topology)
    }

    /// Send one command without a session.
    pub async fn execute_once(config: &ControllerConfig, cmd: &Command) -> Result<CommandResult, CoreError> {
        let client = ControllerClient::new(config.url.clone(), &config.transport())?;
        command::execute(&client, cmd).await
    }

    // ── State observation ────────────────────────────────────────

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<TopologySnapshot> {
        self.inner.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot publications.
    pub fn topology(&self) -> TopologyStream {
        TopologyStream::new(self.inner.snapshot.subscribe())
    }
}

// ── Snapshot load ────────────────────────────────────────────────

/// The three REST collections that make up one snapshot.
struct FetchedTopology {
    switches: Vec<Switch>,
    links: Vec<SwitchLink>,
    hosts: Vec<Host>,
}

impl FetchedTopology {
    fn apply_to<R: Renderer>(self, topology: &mut Topology<R>) {
        topology.initialize(self.switches, self.links, self.hosts);
    }
}

/// Fetch the full topology over REST.
///
/// The discovery status is informational; failure to read it is logged
/// and the fetch continues.
async fn fetch_topology(
    client: &ControllerClient,
    config: &ControllerConfig,
) -> Result<FetchedTopology, streamtopo_api::Error> {
    if config.wait_for_discovery {
        match client.discovery_status().await {
            Ok(status) => debug!(%status, "discovery status"),
            Err(e) => warn!(error = %e, "discovery status unavailable"),
        }
    }

    let (switches, links, hosts) = tokio::try_join!(
        client.list_switches(),
        client.list_links(),
        client.list_hosts(),
    )?;

    let fetched = FetchedTopology {
        switches: switches.into_iter().map(Switch::from).collect(),
        links: links.into_iter().map(SwitchLink::from).collect(),
        hosts: hosts.into_iter().map(Host::from).collect(),
    };
    debug!(
        switches = fetched.switches.len(),
        links = fetched.links.len(),
        hosts = fetched.hosts.len(),
        "snapshot fetched"
    );
    Ok(fetched)
}

/// Fetch the full topology over REST and load it into `topology`.
async fn load_into<R: Renderer + Send>(
    client: &ControllerClient,
    config: &ControllerConfig,
    topology: &mut Topology<R>,
) -> Result<(), CoreError> {
    fetch_topology(client, config).await?.apply_to(topology);
    Ok(())
}

// ── Background tasks ─────────────────────────────────────────────

/// Frame handler for one socket connection: feeds the replica and
/// publishes `Connected` once the handshake completes.
struct SessionHandler<'a> {
    topology: &'a mut Topology<WatchRenderer>,
    state: &'a watch::Sender<ConnectionState>,
    opened: bool,
}

impl FrameHandler for SessionHandler<'_> {
    fn on_open(&mut self) {
        self.opened = true;
        self.state.send_replace(ConnectionState::Connected);
    }

    fn handle_frame(&mut self, text: &str) -> Option<String> {
        self.topology.handle_frame(text)
    }
}

/// Serve the notification socket, reconnecting with backoff.
///
/// After any disconnect the replica is stale: the snapshot is reloaded,
/// with backoff between failed attempts, before the socket is reopened.
/// Permanent errors and exhausted retries publish `Failed`.
async fn session_task(controller: Controller, mut topology: Topology<WatchRenderer>, ws_url: Url) {
    let inner = &controller.inner;
    let cancel = inner.cancel.clone();
    let reconnect = inner.config.reconnect.clone();

    let mut attempt: u32 = 0;
    let mut stale = false;

    loop {
        if cancel.is_cancelled() {
            break;
        }

        if stale {
            match fetch_topology(&inner.client, &inner.config).await {
                Ok(fetched) => {
                    fetched.apply_to(&mut topology);
                    stale = false;
                    debug!(attempt, "snapshot reloaded");
                }
                Err(e) if e.is_transient() => {
                    warn!(error = %e, attempt, "snapshot reload failed; retrying");
                }
                Err(e) => {
                    warn!(error = %e, "snapshot reload failed permanently");
                    inner.connection_state.send_replace(ConnectionState::Failed);
                    break;
                }
            }
        }

        if !stale {
            let mut handler = SessionHandler {
                topology: &mut topology,
                state: &inner.connection_state,
                opened: false,
            };
            let result = serve_connection(&ws_url, &mut handler, &cancel).await;
            if handler.opened {
                attempt = 0;
            }
            stale = true;

            match result {
                Ok(()) if cancel.is_cancelled() => break,
                Ok(()) => info!("notification socket closed by controller"),
                Err(e) if e.is_transient() => warn!(error = %e, attempt, "notification socket failed"),
                Err(e) => {
                    warn!(error = %e, "notification socket failed permanently");
                    inner.connection_state.send_replace(ConnectionState::Failed);
                    break;
                }
            }
        }

        if let Some(max) = reconnect.max_retries {
            if attempt >= max {
                warn!(max_retries = max, "giving up on controller session");
                inner.connection_state.send_replace(ConnectionState::Failed);
                break;
            }
        }

        let delay = calculate_backoff(attempt, &reconnect);
        attempt = attempt.saturating_add(1);
        inner
            .connection_state
            .send_replace(ConnectionState::Reconnecting { attempt });
        debug!(?delay, attempt, "reconnecting after backoff");

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = tokio::time::sleep(delay) => {}
        }
    }
}

/// Process commands from the mpsc channel one at a time.
async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let result = command::execute(&controller.inner.client, &envelope.command).await;
                if let Err(ref e) = result {
                    warn!(action = envelope.command.action(), error = %e, "command failed");
                }
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde_json::json;
    use streamtopo_api::websocket::ReconnectConfig;
    use tokio::net::TcpListener;
    use tokio_stream::StreamExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::model::{Dpid, Mac, StreamId};

    async fn mount_snapshot(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/topology/switches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "dpid": "0000000000000001", "priority": { "3": 5 } },
                { "dpid": "0000000000000002" }
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/topology/links"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "src": { "dpid": "0000000000000001", "port_no": "00000001" },
                    "dst": { "dpid": "0000000000000002", "port_no": "00000001" }
                },
                {
                    "src": { "dpid": "0000000000000002", "port_no": "00000001" },
                    "dst": { "dpid": "0000000000000001", "port_no": "00000001" }
                }
            ])))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/topology/hosts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "mac": "00:00:00:00:00:01", "dpid": "0000000000000001", "port_no": "00000002", "sourcing": [3] }
            ])))
            .mount(server)
            .await;
    }

    fn config_for(server: &MockServer) -> ControllerConfig {
        let mut config = ControllerConfig::from_url(&server.uri()).unwrap();
        config.reconnect = ReconnectConfig {
            initial_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(20),
            max_retries: Some(0),
        };
        config
    }

    #[tokio::test]
    async fn snapshot_once_loads_topology_without_discovery_endpoint() {
        let server = MockServer::start().await;
        mount_snapshot(&server).await;

        let topology = Controller::snapshot_once(&config_for(&server)).await.unwrap();
        let store = topology.store();

        assert_eq!(store.switch_count(), 2);
        assert_eq!(store.host_count(), 1);
        // One canonical switch link plus one host attachment.
        assert_eq!(store.links().len(), 2);
        assert!(store.switch(&Dpid::from("0000000000000001")).is_some());
        assert!(store.host(&Mac::from("00:00:00:00:00:01")).is_some());
        assert_eq!(topology.streams().ids(), &[StreamId(3)]);
    }

    #[tokio::test]
    async fn snapshot_once_propagates_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = Controller::snapshot_once(&config_for(&server))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, CoreError::Api { status: Some(500), .. }));
    }

    #[tokio::test]
    async fn connect_publishes_snapshot_then_fails_without_socket() {
        let server = MockServer::start().await;
        mount_snapshot(&server).await;

        let controller = Controller::new(config_for(&server)).unwrap();
        let mut state = controller.connection_state();
        controller.connect().await.unwrap();

        let snap = controller.snapshot();
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.switch_count(), 2);
        assert_eq!(snap.stream_ids, vec![StreamId(3)]);

        // The mock server has no WebSocket endpoint and retries are capped at 0.
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == ConnectionState::Failed),
        )
        .await
        .unwrap()
        .unwrap();

        assert!(matches!(
            controller
                .execute(Command::PriorityChange {
                    dpid: Dpid::from("0000000000000001"),
                    stream_id: StreamId(3),
                    priority: 5,
                })
                .await,
            Err(CoreError::ControllerDisconnected)
        ));

        controller.disconnect().await;
        assert_eq!(*state.borrow(), ConnectionState::Disconnected);
    }

    // ── Reconnect ───────────────────────────────────────────────────

    /// Mount `/topology/switches` answers in order; the last one repeats.
    async fn mount_switch_sequence(server: &MockServer, answers: Vec<ResponseTemplate>) {
        let last = answers.len() - 1;
        for (i, answer) in answers.into_iter().enumerate() {
            let mock = Mock::given(method("GET"))
                .and(path("/topology/switches"))
                .respond_with(answer);
            let mock = if i == last { mock } else { mock.up_to_n_times(1) };
            mock.mount(server).await;
        }
        for empty in ["/topology/links", "/topology/hosts"] {
            Mock::given(method("GET"))
                .and(path(empty))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
                .mount(server)
                .await;
        }
    }

    fn switches(dpids: &[&str]) -> ResponseTemplate {
        let body: Vec<_> = dpids.iter().map(|d| json!({ "dpid": d })).collect();
        ResponseTemplate::new(200).set_body_json(body)
    }

    async fn switch_requests(server: &MockServer) -> usize {
        server
            .received_requests()
            .await
            .unwrap()
            .iter()
            .filter(|r| r.url.path() == "/topology/switches")
            .count()
    }

    /// Notification socket that drops its first client at once and holds
    /// the second until the client leaves. Yields the number accepted.
    async fn flaky_socket() -> (Url, JoinHandle<u32>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = Url::parse(&format!("ws://{}/topology/ws", listener.local_addr().unwrap())).unwrap();
        let handle = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut first = tokio_tungstenite::accept_async(stream).await.unwrap();
            let _ = first.close(None).await;
            drop(first);

            let (stream, _) = listener.accept().await.unwrap();
            let mut second = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(_)) = second.next().await {}
            2
        });
        (url, handle)
    }

    /// Load the initial snapshot the way `connect` does and start the
    /// session against `ws_url`.
    async fn start_session(controller: &Controller, ws_url: Url) -> JoinHandle<()> {
        let mut topology = Topology::new(WatchRenderer::from_sender(controller.inner.snapshot.clone()));
        load_into(&controller.inner.client, &controller.inner.config, &mut topology)
            .await
            .unwrap();
        tokio::spawn(session_task(controller.clone(), topology, ws_url))
    }

    #[tokio::test]
    async fn failed_reload_is_retried_before_socket_reopens() {
        let server = MockServer::start().await;
        mount_switch_sequence(
            &server,
            vec![
                switches(&["0000000000000001"]),
                ResponseTemplate::new(500),
                switches(&["0000000000000001", "0000000000000002"]),
            ],
        )
        .await;

        let mut config = config_for(&server);
        config.reconnect.max_retries = Some(5);
        let controller = Controller::new(config).unwrap();
        let mut state = controller.connection_state();
        let mut snapshots = controller.inner.snapshot.subscribe();

        let (ws_url, socket) = flaky_socket().await;
        let session = start_session(&controller, ws_url).await;
        assert_eq!(controller.snapshot().switch_count(), 1);

        // The switch that joined during the outage shows up only after the
        // retried reload.
        tokio::time::timeout(
            Duration::from_secs(5),
            snapshots.wait_for(|s| s.switch_count() == 2),
        )
        .await
        .unwrap()
        .unwrap();
        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == ConnectionState::Connected),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(switch_requests(&server).await, 3);
        // Initial load and the successful reload; the failed one published nothing.
        assert_eq!(controller.snapshot().generation, 2);

        controller.inner.cancel.cancel();
        session.await.unwrap();
        let accepted = tokio::time::timeout(Duration::from_secs(5), socket)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(accepted, 2);
    }

    #[tokio::test]
    async fn permanent_reload_failure_publishes_failed() {
        let server = MockServer::start().await;
        mount_switch_sequence(
            &server,
            vec![switches(&["0000000000000001"]), ResponseTemplate::new(404)],
        )
        .await;

        let mut config = config_for(&server);
        config.reconnect.max_retries = Some(5);
        let controller = Controller::new(config).unwrap();
        let mut state = controller.connection_state();

        let (ws_url, socket) = flaky_socket().await;
        let session = start_session(&controller, ws_url).await;

        tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == ConnectionState::Failed),
        )
        .await
        .unwrap()
        .unwrap();
        session.await.unwrap();

        // No second socket on a replica that could not be refreshed.
        assert_eq!(switch_requests(&server).await, 2);
        assert_eq!(controller.snapshot().generation, 1);
        assert_eq!(controller.snapshot().switch_count(), 1);
        socket.abort();
    }
}
