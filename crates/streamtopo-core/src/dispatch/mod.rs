// ── Notification dispatch ──
//
// Decodes controller JSON-RPC notifications into typed `Notification`
// values and applies them to a `Topology` context.

mod topology;

use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use thiserror::Error;

use streamtopo_api::models::{HostMsg, LinkMsg, SwitchMsg};

use crate::convert;
use crate::model::{Dpid, Host, Switch, SwitchLink};

pub use topology::Topology;

/// Prefix some controller builds put on every method name.
const LEGACY_PREFIX: &str = "event_";

/// The fixed set of notification methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Method {
    SwitchEnter,
    SwitchLeave,
    LinkAdd,
    LinkDelete,
    HostReg,
    SwitchStatChanged,
    HostStatChanged,
}

impl Method {
    /// Parse a wire method name, with or without the `event_` prefix.
    pub fn from_wire(name: &str) -> Option<Self> {
        name.strip_prefix(LEGACY_PREFIX)
            .unwrap_or(name)
            .parse()
            .ok()
    }
}

/// A decoded notification, one variant per method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    SwitchEnter(Vec<Switch>),
    SwitchLeave(Vec<Dpid>),
    LinkAdd(Vec<SwitchLink>),
    LinkDelete(Vec<SwitchLink>),
    HostReg(Vec<Host>),
    SwitchStatChanged(Vec<Switch>),
    HostStatChanged(Vec<Host>),
}

/// Protocol violations in an inbound frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid params for {method}: {message}")]
    InvalidParams { method: Method, message: String },
}

impl DispatchError {
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;

    /// JSON-RPC error code for the reply frame.
    pub fn code(&self) -> i64 {
        match self {
            Self::MethodNotFound { .. } => Self::METHOD_NOT_FOUND,
            Self::InvalidParams { .. } => Self::INVALID_PARAMS,
        }
    }
}

impl Notification {
    /// Decode `params` for `method`.
    ///
    /// `params` is a list of records. A bare record is accepted as a
    /// one-element list.
    pub fn decode(method: &str, params: Value) -> Result<Self, DispatchError> {
        let Some(kind) = Method::from_wire(method) else {
            return Err(DispatchError::MethodNotFound {
                method: method.to_owned(),
            });
        };

        let notification = match kind {
            Method::SwitchEnter => {
                Self::SwitchEnter(records::<SwitchMsg, _>(kind, params, Switch::from)?)
            }
            Method::SwitchLeave => Self::SwitchLeave(convert::dpids(records::<SwitchMsg, _>(
                kind,
                params,
                std::convert::identity,
            )?)),
            Method::LinkAdd => Self::LinkAdd(records::<LinkMsg, _>(kind, params, SwitchLink::from)?),
            Method::LinkDelete => {
                Self::LinkDelete(records::<LinkMsg, _>(kind, params, SwitchLink::from)?)
            }
            Method::HostReg => Self::HostReg(records::<HostMsg, _>(kind, params, Host::from)?),
            Method::SwitchStatChanged => {
                Self::SwitchStatChanged(records::<SwitchMsg, _>(kind, params, Switch::from)?)
            }
            Method::HostStatChanged => {
                Self::HostStatChanged(records::<HostMsg, _>(kind, params, Host::from)?)
            }
        };
        Ok(notification)
    }

    pub fn method(&self) -> Method {
        match self {
            Self::SwitchEnter(_) => Method::SwitchEnter,
            Self::SwitchLeave(_) => Method::SwitchLeave,
            Self::LinkAdd(_) => Method::LinkAdd,
            Self::LinkDelete(_) => Method::LinkDelete,
            Self::HostReg(_) => Method::HostReg,
            Self::SwitchStatChanged(_) => Method::SwitchStatChanged,
            Self::HostStatChanged(_) => Method::HostStatChanged,
        }
    }
}

fn records<W, T>(method: Method, params: Value, convert: fn(W) -> T) -> Result<Vec<T>, DispatchError>
where
    W: DeserializeOwned,
{
    let list = match params {
        Value::Array(items) => items,
        Value::Object(_) => vec![params],
        other => {
            return Err(DispatchError::InvalidParams {
                method,
                message: format!("expected a list of records, got {other}"),
            });
        }
    };

    list.into_iter()
        .map(|item| {
            serde_json::from_value::<W>(item)
                .map(convert)
                .map_err(|e| DispatchError::InvalidParams {
                    method,
                    message: e.to_string(),
                })
        })
        .collect()
}
