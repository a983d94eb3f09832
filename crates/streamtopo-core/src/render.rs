// ── Render capability ──
//
// The dispatcher signals a `Renderer` once per notification, after every
// mutation for that notification has been applied. `WatchRenderer`
// publishes an immutable `TopologySnapshot` through a `watch` channel so
// readers never observe a partial update.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;

use crate::model::{Link, Node, StreamId};
use crate::store::EntityStore;
use crate::streams::{Selection, StreamBindings};
use crate::view::{self, LinkStyle, Port};

/// Receiver of the "state changed, redraw" signal.
pub trait Renderer {
    fn refresh(&mut self, store: &EntityStore, streams: &StreamBindings);
}

/// Renderer that draws nothing. For one-shot loads.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn refresh(&mut self, _store: &EntityStore, _streams: &StreamBindings) {}
}

/// Point-in-time copy of everything a view needs.
#[derive(Debug, Clone, Serialize)]
pub struct TopologySnapshot {
    /// Incremented on every refresh; 0 is the empty pre-load snapshot.
    pub generation: u64,
    pub taken_at: DateTime<Utc>,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Parallel to `links`.
    pub link_styles: Vec<LinkStyle>,
    pub ports: Vec<Port>,
    pub stream_ids: Vec<StreamId>,
    pub selection: Selection,
}

impl TopologySnapshot {
    pub fn empty() -> Self {
        Self {
            generation: 0,
            taken_at: Utc::now(),
            nodes: Vec::new(),
            links: Vec::new(),
            link_styles: Vec::new(),
            ports: Vec::new(),
            stream_ids: Vec::new(),
            selection: Selection::Topology,
        }
    }

    pub fn capture(store: &EntityStore, streams: &StreamBindings, generation: u64) -> Self {
        let selection = streams.selected();
        Self {
            generation,
            taken_at: Utc::now(),
            nodes: store.nodes().to_vec(),
            links: store.links().to_vec(),
            link_styles: store
                .links()
                .iter()
                .map(|l| view::link_style(store, l, selection))
                .collect(),
            ports: view::get_ports(store),
            stream_ids: streams.ids().to_vec(),
            selection,
        }
    }

    pub fn switch_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.as_switch().is_some()).count()
    }

    pub fn host_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.as_host().is_some()).count()
    }
}

/// Publishes a fresh snapshot on every refresh.
#[derive(Debug)]
pub struct WatchRenderer {
    tx: watch::Sender<Arc<TopologySnapshot>>,
    generation: u64,
}

impl WatchRenderer {
    pub fn new() -> (Self, watch::Receiver<Arc<TopologySnapshot>>) {
        let (tx, rx) = watch::channel(Arc::new(TopologySnapshot::empty()));
        (Self { tx, generation: 0 }, rx)
    }

    /// Wrap an existing sender, continuing from its current generation.
    pub fn from_sender(tx: watch::Sender<Arc<TopologySnapshot>>) -> Self {
        let generation = tx.borrow().generation;
        Self { tx, generation }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<TopologySnapshot>> {
        self.tx.subscribe()
    }
}

impl Renderer for WatchRenderer {
    fn refresh(&mut self, store: &EntityStore, streams: &StreamBindings) {
        self.generation += 1;
        let snapshot = TopologySnapshot::capture(store, streams, self.generation);
        tracing::trace!(
            generation = self.generation,
            nodes = snapshot.nodes.len(),
            links = snapshot.links.len(),
            "snapshot published"
        );
        self.tx.send_replace(Arc::new(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Host, Switch};

    #[test]
    fn refresh_publishes_new_generation() {
        let (mut renderer, rx) = WatchRenderer::new();
        assert_eq!(rx.borrow().generation, 0);

        let mut store = EntityStore::new();
        store.add_switches(vec![Switch::new("1")]);
        store.add_hosts(vec![Host::new("aa", "1", "2")]);
        renderer.refresh(&store, &StreamBindings::new());

        let snap = rx.borrow().clone();
        assert_eq!(snap.generation, 1);
        assert_eq!(snap.switch_count(), 1);
        assert_eq!(snap.host_count(), 1);
        assert_eq!(snap.links.len(), snap.link_styles.len());
    }

    #[test]
    fn from_sender_continues_generation() {
        let (mut first, rx) = WatchRenderer::new();
        let store = EntityStore::new();
        first.refresh(&store, &StreamBindings::new());
        first.refresh(&store, &StreamBindings::new());

        let mut second = WatchRenderer::from_sender(first.tx.clone());
        second.refresh(&store, &StreamBindings::new());
        assert_eq!(rx.borrow().generation, 3);
    }
}
