// ── Switch and host nodes ──

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::identity::{Dpid, Mac, NodeKey, PortNo, StreamId};

/// An OpenFlow switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Switch {
    pub dpid: Dpid,
    /// Stream id -> priority level. A missing entry means the switch does
    /// not carry that stream.
    #[serde(default)]
    pub priority: BTreeMap<StreamId, u32>,
}

impl Switch {
    pub fn new(dpid: impl Into<Dpid>) -> Self {
        Self {
            dpid: dpid.into(),
            priority: BTreeMap::new(),
        }
    }

    /// Priority for `stream`, treating a zero level as absent.
    pub fn priority_for(&self, stream: StreamId) -> Option<u32> {
        self.priority.get(&stream).copied().filter(|p| *p != 0)
    }
}

/// An end host with a single fixed attachment point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub mac: Mac,
    pub dpid: Dpid,
    pub port: PortNo,
    #[serde(default)]
    pub sourcing: BTreeSet<StreamId>,
    #[serde(default)]
    pub receiving: BTreeSet<StreamId>,
}

impl Host {
    pub fn new(mac: impl Into<Mac>, dpid: impl Into<Dpid>, port: impl Into<PortNo>) -> Self {
        Self {
            mac: mac.into(),
            dpid: dpid.into(),
            port: port.into(),
            sourcing: BTreeSet::new(),
            receiving: BTreeSet::new(),
        }
    }

    /// Whether this host sources or receives `stream`.
    pub fn carries(&self, stream: StreamId) -> bool {
        self.sourcing.contains(&stream) || self.receiving.contains(&stream)
    }

    /// Controller-relative path of the HLS playlist this host publishes,
    /// named after its switch (`streaming/h<dpid as int>/stream.m3u8`).
    pub fn playlist_path(&self) -> Option<String> {
        self.dpid
            .to_int()
            .map(|n| format!("streaming/h{n}/stream.m3u8"))
    }
}

/// A member of the node collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Switch(Switch),
    Host(Host),
}

impl Node {
    pub fn key(&self) -> NodeKey {
        match self {
            Self::Switch(s) => NodeKey::Switch(s.dpid.clone()),
            Self::Host(h) => NodeKey::Host(h.mac.clone()),
        }
    }

    /// The switch a node belongs to: its own dpid, or a host's attachment.
    pub fn dpid(&self) -> &Dpid {
        match self {
            Self::Switch(s) => &s.dpid,
            Self::Host(h) => &h.dpid,
        }
    }

    /// Short display label: trimmed dpid for switches, mac for hosts.
    pub fn label(&self) -> &str {
        match self {
            Self::Switch(s) => s.dpid.trimmed(),
            Self::Host(h) => h.mac.as_str(),
        }
    }

    pub fn as_switch(&self) -> Option<&Switch> {
        match self {
            Self::Switch(s) => Some(s),
            Self::Host(_) => None,
        }
    }

    pub fn as_host(&self) -> Option<&Host> {
        match self {
            Self::Host(h) => Some(h),
            Self::Switch(_) => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn zero_priority_is_absent() {
        let mut sw = Switch::new("1");
        sw.priority.insert(StreamId(1), 0);
        sw.priority.insert(StreamId(2), 5);
        assert_eq!(sw.priority_for(StreamId(1)), None);
        assert_eq!(sw.priority_for(StreamId(2)), Some(5));
        assert_eq!(sw.priority_for(StreamId(3)), None);
    }

    #[test]
    fn node_serializes_with_type_tag() {
        let node = Node::Switch(Switch::new("0000000000000001"));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "switch");
        assert_eq!(json["dpid"], "0000000000000001");
    }

    #[test]
    fn playlist_path_uses_numeric_dpid() {
        let host = Host::new("aa", "0000000000000010", "1");
        assert_eq!(host.playlist_path().as_deref(), Some("streaming/h16/stream.m3u8"));
        assert_eq!(Host::new("aa", "not-hex", "1").playlist_path(), None);
    }

    #[test]
    fn host_label_and_key() {
        let node = Node::Host(Host::new("aa", "1", "3"));
        assert_eq!(node.label(), "aa");
        assert_eq!(node.key(), NodeKey::Host(Mac::from("aa")));
        assert_eq!(node.dpid(), &Dpid::from("1"));
    }
}
