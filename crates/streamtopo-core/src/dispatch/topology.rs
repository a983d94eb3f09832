// ── Topology context ──
//
// Owns the entity store, the stream bindings, and the renderer. Every
// notification is applied to completion and followed by exactly one
// render signal.

use std::collections::{BTreeSet, HashSet};

use tracing::{debug, warn};

use streamtopo_api::models::{RpcRequest, RpcResponse};
use streamtopo_api::websocket::FrameHandler;

use super::Notification;
use crate::error::CoreError;
use crate::model::{Host, Mac, StreamId, Switch, SwitchLink};
use crate::render::Renderer;
use crate::store::EntityStore;
use crate::streams::{Selection, StreamBindings};

pub struct Topology<R> {
    store: EntityStore,
    streams: StreamBindings,
    renderer: R,
}

impl<R: Renderer> Topology<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            store: EntityStore::new(),
            streams: StreamBindings::new(),
            renderer,
        }
    }

    /// Load a full snapshot, reseed the stream bindings from the hosts'
    /// sourcing sets, and render once.
    pub fn initialize(&mut self, switches: Vec<Switch>, links: Vec<SwitchLink>, hosts: Vec<Host>) {
        self.store.initialize(switches, links, hosts);

        let previous = self.streams.selected();
        self.streams.clear();
        let seeds: Vec<(Mac, BTreeSet<StreamId>)> = self
            .store
            .hosts()
            .filter(|h| !h.sourcing.is_empty())
            .map(|h| (h.mac.clone(), h.sourcing.clone()))
            .collect();
        for (mac, ids) in seeds {
            self.streams.update(mac, ids);
        }
        // Keep the user's overlay across a reload when the stream survived.
        if self.streams.select(previous).is_err() {
            debug!(selection = %previous, "selection dropped after reload");
        }

        self.renderer.refresh(&self.store, &self.streams);
    }

    /// Apply one notification, then render.
    pub fn apply(&mut self, notification: Notification) {
        match notification {
            Notification::SwitchEnter(switches) => {
                self.store.add_switches(switches);
            }
            Notification::SwitchLeave(dpids) => {
                for mac in self.store.delete_switches(&dpids) {
                    self.streams.forget(&mac);
                }
            }
            Notification::LinkAdd(links) => {
                self.store.add_links(links);
            }
            Notification::LinkDelete(links) => {
                self.store.delete_links(links);
            }
            Notification::HostReg(hosts) => {
                let mut seen = HashSet::new();
                let seeds: Vec<(Mac, BTreeSet<StreamId>)> = hosts
                    .iter()
                    .filter(|h| self.store.host(&h.mac).is_none() && seen.insert(h.mac.clone()))
                    .filter(|h| !h.sourcing.is_empty())
                    .map(|h| (h.mac.clone(), h.sourcing.clone()))
                    .collect();
                self.store.add_hosts(hosts);
                for (mac, ids) in seeds {
                    self.streams.update(mac, ids);
                }
            }
            Notification::SwitchStatChanged(switches) => {
                self.store.update_switches(switches);
            }
            Notification::HostStatChanged(hosts) => {
                for (mac, ids) in self.store.update_hosts(hosts) {
                    self.streams.update(mac, ids);
                }
            }
        }
        self.renderer.refresh(&self.store, &self.streams);
    }

    /// Process one inbound text frame and build the reply.
    ///
    /// Frames that are not JSON-RPC requests are dropped (`None`). Unknown
    /// methods and bad params get an error reply; nothing is applied.
    pub fn handle_message(&mut self, text: &str) -> Option<RpcResponse> {
        let request: RpcRequest = match serde_json::from_str(text) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "dropping frame that is not a JSON-RPC request");
                return None;
            }
        };

        match Notification::decode(&request.method, request.params) {
            Ok(notification) => {
                debug!(method = %notification.method(), id = %request.id, "notification");
                self.apply(notification);
                Some(RpcResponse::ack(request.id))
            }
            Err(e) => {
                warn!(method = %request.method, id = %request.id, error = %e, "notification rejected");
                Some(RpcResponse::error(request.id, e.code(), e.to_string()))
            }
        }
    }

    /// Change the stream overlay and render.
    pub fn select(&mut self, selection: Selection) -> Result<(), CoreError> {
        self.streams.select(selection)?;
        self.renderer.refresh(&self.store, &self.streams);
        Ok(())
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn streams(&self) -> &StreamBindings {
        &self.streams
    }
}

impl<R: Renderer> FrameHandler for Topology<R> {
    fn handle_frame(&mut self, text: &str) -> Option<String> {
        let reply = self.handle_message(text)?;
        match serde_json::to_string(&reply) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!(error = %e, "failed to encode reply");
                None
            }
        }
    }
}
