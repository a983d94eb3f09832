// streamtopo-core: Topology replica, stream bindings, and notification dispatch.

pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod dispatch;
pub mod error;
pub mod model;
pub mod render;
pub mod store;
pub mod stream;
pub mod streams;
pub mod view;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{Command, CommandIssuer, CommandResult, PriorityLevel};
pub use config::{ControllerConfig, ReconnectConfig, TlsMode};
pub use controller::{ConnectionState, Controller};
pub use dispatch::{DispatchError, Method, Notification, Topology};
pub use error::CoreError;
pub use render::{NullRenderer, Renderer, TopologySnapshot, WatchRenderer};
pub use store::EntityStore;
pub use stream::{TopologyStream, TopologyWatchStream};
pub use streams::{Selection, StreamBindings};
pub use view::{LinkStyle, Point, Port};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    Dpid, Host, HostLink, Link, LinkKind, Mac, Node, NodeKey, PortNo, PortRef, StreamId, Switch,
    SwitchLink,
};
