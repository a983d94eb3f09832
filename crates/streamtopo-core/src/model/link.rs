// ── Links ──
//
// A link's identity is its endpoint handles (dpid/port or mac). The
// `source`/`target` positions on `Link` are a cache over the node
// collection, rebuilt by the store after every structural change.

use serde::{Deserialize, Serialize};

use super::identity::{Dpid, Mac, NodeKey, PortNo};

/// A switch port: `(dpid, port_no)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortRef {
    pub dpid: Dpid,
    pub port_no: PortNo,
}

impl PortRef {
    pub fn new(dpid: impl Into<Dpid>, port_no: impl Into<PortNo>) -> Self {
        Self {
            dpid: dpid.into(),
            port_no: port_no.into(),
        }
    }
}

/// A switch-to-switch connection as reported by the controller.
///
/// The controller reports each physical connection once per direction.
/// Only the direction with `src.dpid < dst.dpid` is stored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwitchLink {
    pub src: PortRef,
    pub dst: PortRef,
}

impl SwitchLink {
    pub fn new(src: PortRef, dst: PortRef) -> Self {
        Self { src, dst }
    }

    /// Strict less-than on dpid. Self-loops are never canonical.
    pub fn is_canonical(&self) -> bool {
        self.src.dpid < self.dst.dpid
    }

    /// Same link with endpoints swapped if needed so `src` has the smaller dpid.
    #[must_use]
    pub fn canonical(self) -> Self {
        if self.dst.dpid < self.src.dpid {
            Self {
                src: self.dst,
                dst: self.src,
            }
        } else {
            self
        }
    }
}

/// A host attachment, derived when the host is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostLink {
    pub switch: PortRef,
    pub mac: Mac,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LinkKind {
    SwitchToSwitch(SwitchLink),
    SwitchToHost(HostLink),
}

impl LinkKind {
    /// Identity of the node at the `source` end.
    pub fn source_key(&self) -> NodeKey {
        match self {
            Self::SwitchToSwitch(l) => NodeKey::Switch(l.src.dpid.clone()),
            Self::SwitchToHost(l) => NodeKey::Switch(l.switch.dpid.clone()),
        }
    }

    /// Identity of the node at the `target` end.
    pub fn target_key(&self) -> NodeKey {
        match self {
            Self::SwitchToSwitch(l) => NodeKey::Switch(l.dst.dpid.clone()),
            Self::SwitchToHost(l) => NodeKey::Host(l.mac.clone()),
        }
    }

    /// Whether either endpoint is on switch `dpid`.
    pub fn touches(&self, dpid: &Dpid) -> bool {
        match self {
            Self::SwitchToSwitch(l) => &l.src.dpid == dpid || &l.dst.dpid == dpid,
            Self::SwitchToHost(l) => &l.switch.dpid == dpid,
        }
    }

    pub fn as_switch_link(&self) -> Option<&SwitchLink> {
        match self {
            Self::SwitchToSwitch(l) => Some(l),
            Self::SwitchToHost(_) => None,
        }
    }
}

/// A stored link: identity plus cached node positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(flatten)]
    pub kind: LinkKind,
    pub source: usize,
    pub target: usize,
}
