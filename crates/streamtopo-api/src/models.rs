// Wire types for the controller's REST and JSON-RPC surfaces.
//
// These mirror the controller's JSON exactly. Domain conversion
// (canonical ordering, identity newtypes) happens in streamtopo-core.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ── Topology records ─────────────────────────────────────────────────

/// A switch as reported by `switch_enter`, `switch_stat_changed`, and
/// `/topology/switches`. Extra fields (`ports`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwitchMsg {
    pub dpid: String,
    /// Stream id -> priority level. Object keys arrive as strings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<BTreeMap<u32, u32>>,
}

/// One end of a switch-to-switch link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMsg {
    pub dpid: String,
    #[serde(deserialize_with = "string_or_number")]
    pub port_no: String,
}

/// A link as reported by `link_add`, `link_delete`, and `/topology/links`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkMsg {
    pub src: PortMsg,
    pub dst: PortMsg,
}

/// A host as reported by `host_reg`, `host_stat_changed`, and `/topology/hosts`.
///
/// The controller has shipped both `port` and `port_no`, and both
/// `receiving` and the misspelled `receving`; all are accepted, and when a
/// record carries both spellings the first one wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HostWire")]
pub struct HostMsg {
    pub mac: String,
    pub dpid: String,
    pub port: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sourcing: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiving: Option<Vec<u32>>,
}

#[derive(Deserialize)]
struct HostWire {
    mac: String,
    dpid: String,
    #[serde(default, deserialize_with = "some_string_or_number")]
    port: Option<String>,
    #[serde(default, deserialize_with = "some_string_or_number")]
    port_no: Option<String>,
    #[serde(default)]
    sourcing: Option<Vec<u32>>,
    #[serde(default)]
    receiving: Option<Vec<u32>>,
    #[serde(default)]
    receving: Option<Vec<u32>>,
}

impl TryFrom<HostWire> for HostMsg {
    type Error = String;

    fn try_from(wire: HostWire) -> Result<Self, Self::Error> {
        let port = wire
            .port
            .or(wire.port_no)
            .ok_or_else(|| format!("missing field `port` for host {}", wire.mac))?;
        Ok(Self {
            mac: wire.mac,
            dpid: wire.dpid,
            port,
            sourcing: wire.sourcing,
            receiving: wire.receiving.or(wire.receving),
        })
    }
}

fn some_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_number(deserializer).map(Some)
}

/// Accept a port number as either a JSON string (`"00000001"`) or an integer.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    struct PortVisitor;

    impl Visitor<'_> for PortVisitor {
        type Value = String;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a port number as string or integer")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<String, E> {
            Ok(v.to_owned())
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<String, E> {
            Ok(v)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(PortVisitor)
}

// ── JSON-RPC envelope ────────────────────────────────────────────────

pub const JSONRPC_VERSION: &str = "2.0";

/// Inbound notification frame: `{id, method, params}`.
///
/// `params` stays raw here; the dispatcher decodes it per method.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Outbound reply frame written back on the same socket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcResponse {
    pub id: Value,
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    /// The acknowledgement for a processed notification: `result: ""`.
    pub fn ack(id: Value) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION,
            result: Some(Value::String(String::new())),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            id,
            jsonrpc: JSONRPC_VERSION,
            result: None,
            error: Some(RpcErrorObject {
                code,
                message: message.into(),
            }),
        }
    }
}

// ── Streaming actions ────────────────────────────────────────────────

/// Body for `/streaming/source_for` and `/streaming/receive_from`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamBindingBody {
    pub mac: String,
    pub dpid: String,
    pub port_no: String,
    pub stream_id: u32,
}

/// Body for `/streaming/priority_change`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityChangeBody {
    pub dpid: String,
    pub stream_id: u32,
    pub priority: u32,
}

/// `{stat}` reply shared by all action endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionReply {
    #[serde(default)]
    pub stat: String,
}

impl ActionReply {
    /// The only status the controller uses for success.
    pub const SUCCESS: &'static str = "succ";

    pub fn is_success(&self) -> bool {
        self.stat == Self::SUCCESS
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn switch_priority_keys_parse_from_strings() {
        let msg: SwitchMsg = serde_json::from_value(json!({
            "dpid": "0000000000000001",
            "priority": { "3": 5, "10": 9 },
            "ports": []
        }))
        .unwrap();
        let priority = msg.priority.unwrap();
        assert_eq!(priority.get(&3), Some(&5));
        assert_eq!(priority.get(&10), Some(&9));
    }

    #[test]
    fn switch_without_priority() {
        let msg: SwitchMsg = serde_json::from_value(json!({ "dpid": "1" })).unwrap();
        assert!(msg.priority.is_none());
    }

    #[test]
    fn port_no_accepts_string_and_integer() {
        let link: LinkMsg = serde_json::from_value(json!({
            "src": { "dpid": "1", "port_no": 1 },
            "dst": { "dpid": "2", "port_no": "00000003", "hw_addr": "aa", "name": "s2-eth3" }
        }))
        .unwrap();
        assert_eq!(link.src.port_no, "1");
        assert_eq!(link.dst.port_no, "00000003");
    }

    #[test]
    fn host_accepts_legacy_field_names() {
        let host: HostMsg = serde_json::from_value(json!({
            "mac": "aa",
            "dpid": "1",
            "port_no": "00000002",
            "receving": [4]
        }))
        .unwrap();
        assert_eq!(host.port, "00000002");
        assert_eq!(host.receiving, Some(vec![4]));
        assert!(host.sourcing.is_none());
    }

    #[test]
    fn host_with_both_port_spellings_prefers_port() {
        let hosts: Vec<HostMsg> = serde_json::from_value(json!([
            {
                "mac": "aa",
                "dpid": "1",
                "port": 2,
                "port_no": "00000002",
                "receiving": [4],
                "receving": [5]
            },
            { "mac": "bb", "dpid": "1", "port_no": "00000003" }
        ]))
        .unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].port, "2");
        assert_eq!(hosts[0].receiving, Some(vec![4]));
        assert_eq!(hosts[1].port, "00000003");
    }

    #[test]
    fn host_without_any_port_is_rejected() {
        let err = serde_json::from_value::<HostMsg>(json!({ "mac": "aa", "dpid": "1" })).unwrap_err();
        assert!(err.to_string().contains("missing field `port`"));
    }

    #[test]
    fn ack_shape() {
        let ack = RpcResponse::ack(json!(7));
        assert_eq!(
            serde_json::to_value(&ack).unwrap(),
            json!({ "id": 7, "jsonrpc": "2.0", "result": "" })
        );
    }

    #[test]
    fn error_reply_shape() {
        let reply = RpcResponse::error(json!("abc"), -32601, "method not found");
        assert_eq!(
            serde_json::to_value(&reply).unwrap(),
            json!({
                "id": "abc",
                "jsonrpc": "2.0",
                "error": { "code": -32601, "message": "method not found" }
            })
        );
    }

    #[test]
    fn request_without_params() {
        let req: RpcRequest =
            serde_json::from_str(r#"{"id": 1, "method": "switch_enter"}"#).unwrap();
        assert_eq!(req.method, "switch_enter");
        assert!(req.params.is_null());
    }

    #[test]
    fn only_succ_is_success() {
        assert!(ActionReply { stat: "succ".into() }.is_success());
        assert!(!ActionReply { stat: "fail".into() }.is_success());
        assert!(!ActionReply { stat: String::new() }.is_success());
    }
}
