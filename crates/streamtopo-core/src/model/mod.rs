// ── Domain model ──
//
// Canonical types for the topology replica. These are what consumers
// see; the controller's wire shapes stay in streamtopo-api.

pub mod identity;
pub mod link;
pub mod node;

pub use identity::{Dpid, Mac, NodeKey, PortNo, StreamId};
pub use link::{HostLink, Link, LinkKind, PortRef, SwitchLink};
pub use node::{Host, Node, Switch};
