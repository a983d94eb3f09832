// ── Derived views ──
//
// Stateless computations over the entity store: the deduplicated port
// list, port marker placement, and per-link stream priority.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::{Dpid, Link, LinkKind, Node, PortNo};
use crate::store::EntityStore;
use crate::streams::Selection;

/// Weight toward the `source` node for a source-side port marker.
pub const PORT_WEIGHT: f64 = 0.9;

/// Hue degrees per priority level.
pub const HUE_PER_LEVEL: u32 = 15;

/// Which end of its link a port sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkEnd {
    Source,
    Target,
}

/// A switch port exposed by a switch-to-switch link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    pub dpid: Dpid,
    pub port_no: PortNo,
    /// Position of the link the port was first seen on.
    pub link: usize,
    pub end: LinkEnd,
}

/// One port per distinct `(dpid, port_no)` across all switch-to-switch links.
pub fn get_ports(store: &EntityStore) -> Vec<Port> {
    let mut seen = HashSet::new();
    let mut ports = Vec::new();

    for (i, link) in store.links().iter().enumerate() {
        let LinkKind::SwitchToSwitch(s2s) = &link.kind else {
            continue;
        };
        for (end, port) in [(LinkEnd::Source, &s2s.src), (LinkEnd::Target, &s2s.dst)] {
            if seen.insert((&port.dpid, &port.port_no)) {
                ports.push(Port {
                    dpid: port.dpid.clone(),
                    port_no: port.port_no.clone(),
                    link: i,
                    end,
                });
            }
        }
    }
    ports
}

// ── Placement ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Node coordinates maintained by an external layout engine, keyed by
/// node position.
pub trait Layout {
    fn position(&self, node: usize) -> Option<Point>;
}

impl Layout for [Point] {
    fn position(&self, node: usize) -> Option<Point> {
        self.get(node).copied()
    }
}

impl Layout for Vec<Point> {
    fn position(&self, node: usize) -> Option<Point> {
        <[Point] as Layout>::position(self, node)
    }
}

/// Point between `src` and `dst`: 0.9 toward `src` for a source port,
/// 0.1 toward it for a target port.
pub fn interpolate(src: Point, dst: Point, end: LinkEnd) -> Point {
    let w = match end {
        LinkEnd::Source => PORT_WEIGHT,
        LinkEnd::Target => 1.0 - PORT_WEIGHT,
    };
    Point {
        x: src.x * w + dst.x * (1.0 - w),
        y: src.y * w + dst.y * (1.0 - w),
    }
}

/// Where to draw `port`, or `None` if its link or endpoints have no position.
pub fn get_port_point<L: Layout + ?Sized>(
    port: &Port,
    store: &EntityStore,
    layout: &L,
) -> Option<Point> {
    let link = store.links().get(port.link)?;
    let src = layout.position(link.source)?;
    let dst = layout.position(link.target)?;
    Some(interpolate(src, dst, port.end))
}

// ── Stream priority ──────────────────────────────────────────────────

/// Priority a link carries for the selected stream, or `None` when the
/// link is inactive for it.
///
/// Switch-to-switch links take the lower of the two switches' levels.
/// Host links take the switch level when the host sources or receives the
/// stream. The plain topology selection has no active links.
pub fn link_priority(store: &EntityStore, link: &Link, selection: Selection) -> Option<u32> {
    let stream = selection.stream()?;
    let source = store.nodes().get(link.source)?;
    let target = store.nodes().get(link.target)?;

    match (&link.kind, source, target) {
        (LinkKind::SwitchToSwitch(_), Node::Switch(a), Node::Switch(b)) => {
            Some(a.priority_for(stream)?.min(b.priority_for(stream)?))
        }
        (LinkKind::SwitchToHost(_), Node::Switch(s), Node::Host(h)) if h.carries(stream) => {
            s.priority_for(stream)
        }
        _ => None,
    }
}

/// How a renderer should draw a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum LinkStyle {
    /// Solid stroke at `hue` degrees.
    Active { priority: u32, hue: u32 },
    /// Dashed gray stroke.
    Inactive,
}

impl LinkStyle {
    pub fn from_priority(priority: Option<u32>) -> Self {
        match priority {
            Some(p) => Self::Active {
                priority: p,
                hue: p.saturating_mul(HUE_PER_LEVEL),
            },
            None => Self::Inactive,
        }
    }
}

pub fn link_style(store: &EntityStore, link: &Link, selection: Selection) -> LinkStyle {
    LinkStyle::from_priority(link_priority(store, link, selection))
}
