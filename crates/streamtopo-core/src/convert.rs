// ── API-to-domain type conversions ──
//
// Bridges raw `streamtopo_api` wire records into `streamtopo_core::model`
// types. Missing optional collections become empty; stream id lists
// become sorted, deduplicated sets.

use std::collections::BTreeSet;

use streamtopo_api::models::{HostMsg, LinkMsg, PortMsg, SwitchMsg};

use crate::model::{Dpid, Host, Mac, PortNo, PortRef, StreamId, Switch, SwitchLink};

fn id_set(raw: Option<Vec<u32>>) -> BTreeSet<StreamId> {
    raw.unwrap_or_default().into_iter().map(StreamId).collect()
}

impl From<SwitchMsg> for Switch {
    fn from(msg: SwitchMsg) -> Self {
        Self {
            dpid: Dpid::new(msg.dpid),
            priority: msg
                .priority
                .unwrap_or_default()
                .into_iter()
                .map(|(stream, level)| (StreamId(stream), level))
                .collect(),
        }
    }
}

impl From<PortMsg> for PortRef {
    fn from(msg: PortMsg) -> Self {
        Self {
            dpid: Dpid::new(msg.dpid),
            port_no: PortNo::new(msg.port_no),
        }
    }
}

/// Endpoints are kept in reported order; the store applies canonical filtering.
impl From<LinkMsg> for SwitchLink {
    fn from(msg: LinkMsg) -> Self {
        Self {
            src: msg.src.into(),
            dst: msg.dst.into(),
        }
    }
}

impl From<HostMsg> for Host {
    fn from(msg: HostMsg) -> Self {
        Self {
            mac: Mac::new(&msg.mac),
            dpid: Dpid::new(msg.dpid),
            port: PortNo::new(msg.port),
            sourcing: id_set(msg.sourcing),
            receiving: id_set(msg.receiving),
        }
    }
}

/// Dpids named by a `switch_leave` payload.
pub fn dpids(switches: Vec<SwitchMsg>) -> Vec<Dpid> {
    switches.into_iter().map(|s| Dpid::new(s.dpid)).collect()
}
