// ── Command API ──
//
// Outbound streaming actions. Commands are built by `CommandIssuer` from
// the current replica and sent once; replies are logged and never merged
// back (state changes arrive through the notification socket).

mod issuer;

use serde::Serialize;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};
use tracing::{info, warn};

use streamtopo_api::ControllerClient;
use streamtopo_api::models::{ActionReply, PriorityChangeBody, StreamBindingBody};

use crate::error::CoreError;
use crate::model::{Dpid, Mac, PortNo, StreamId};

pub use issuer::CommandIssuer;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// Discrete priority choice offered to users.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString, EnumIter, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum PriorityLevel {
    Low,
    Mid,
    High,
}

impl PriorityLevel {
    /// Position in the Low/Mid/High menu.
    pub fn index(self) -> u32 {
        match self {
            Self::Low => 0,
            Self::Mid => 1,
            Self::High => 2,
        }
    }

    pub fn from_index(index: u32) -> Option<Self> {
        Self::iter().find(|l| l.index() == index)
    }

    /// Wire priority: `1 + index * 4`, so 1, 5 or 9.
    pub fn priority(self) -> u32 {
        1 + self.index() * 4
    }
}

/// A streaming action against the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    /// Make `mac` the source of `stream_id`.
    SourceFor {
        mac: Mac,
        dpid: Dpid,
        port_no: PortNo,
        stream_id: StreamId,
    },
    /// Subscribe `mac` to `stream_id`.
    ReceiveFrom {
        mac: Mac,
        dpid: Dpid,
        port_no: PortNo,
        stream_id: StreamId,
    },
    /// Set a switch's priority for a stream.
    PriorityChange {
        dpid: Dpid,
        stream_id: StreamId,
        priority: u32,
    },
}

impl Command {
    /// Endpoint name, used in logs and errors.
    pub fn action(&self) -> &'static str {
        match self {
            Self::SourceFor { .. } => "source_for",
            Self::ReceiveFrom { .. } => "receive_from",
            Self::PriorityChange { .. } => "priority_change",
        }
    }
}

/// Outcome of a command the controller answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum CommandResult {
    /// `stat == "succ"`.
    Accepted,
    /// Any other `stat`.
    Rejected { stat: String },
}

impl CommandResult {
    /// Turn a rejection into an error for callers that want one.
    pub fn into_result(self, action: &str) -> Result<(), CoreError> {
        match self {
            Self::Accepted => Ok(()),
            Self::Rejected { stat } => Err(CoreError::Rejected {
                action: action.to_owned(),
                stat,
            }),
        }
    }
}

fn binding_body(mac: &Mac, dpid: &Dpid, port_no: &PortNo, stream_id: StreamId) -> StreamBindingBody {
    StreamBindingBody {
        mac: mac.to_string(),
        dpid: dpid.to_string(),
        port_no: port_no.to_string(),
        stream_id: stream_id.get(),
    }
}

/// Send `command` once. Transport errors propagate; a non-success `stat`
/// is logged and reported as `Rejected`. Never retried.
pub async fn execute(client: &ControllerClient, command: &Command) -> Result<CommandResult, CoreError> {
    let reply: ActionReply = match command {
        Command::SourceFor {
            mac,
            dpid,
            port_no,
            stream_id,
        } => {
            client
                .source_for(&binding_body(mac, dpid, port_no, *stream_id))
                .await?
        }
        Command::ReceiveFrom {
            mac,
            dpid,
            port_no,
            stream_id,
        } => {
            client
                .receive_from(&binding_body(mac, dpid, port_no, *stream_id))
                .await?
        }
        Command::PriorityChange {
            dpid,
            stream_id,
            priority,
        } => {
            client
                .priority_change(&PriorityChangeBody {
                    dpid: dpid.to_string(),
                    stream_id: stream_id.get(),
                    priority: *priority,
                })
                .await?
        }
    };

    if reply.is_success() {
        info!(action = command.action(), "command accepted");
        Ok(CommandResult::Accepted)
    } else {
        warn!(action = command.action(), stat = %reply.stat, "command rejected by controller");
        Ok(CommandResult::Rejected { stat: reply.stat })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[test]
    fn priority_levels_map_to_1_5_9() {
        let mapped: Vec<(u32, u32)> = PriorityLevel::iter()
            .map(|l| (l.index(), l.priority()))
            .collect();
        assert_eq!(mapped, vec![(0, 1), (1, 5), (2, 9)]);
    }

    #[test]
    fn priority_level_parsing() {
        assert_eq!("high".parse::<PriorityLevel>().unwrap(), PriorityLevel::High);
        assert_eq!("Mid".parse::<PriorityLevel>().unwrap(), PriorityLevel::Mid);
        assert_eq!(PriorityLevel::from_index(0), Some(PriorityLevel::Low));
        assert_eq!(PriorityLevel::from_index(3), None);
        assert_eq!(PriorityLevel::Low.to_string(), "low");
    }

    #[test]
    fn rejection_becomes_error_on_request() {
        let err = CommandResult::Rejected { stat: "fail".into() }
            .into_result("source_for")
            .unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));
        assert!(CommandResult::Accepted.into_result("x").is_ok());
    }

    #[tokio::test]
    async fn execute_posts_priority_change() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/streaming/priority_change"))
            .and(body_json(json!({ "dpid": "0000000000000001", "stream_id": 3, "priority": 5 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stat": "succ" })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = execute(
            &client,
            &Command::PriorityChange {
                dpid: Dpid::from("0000000000000001"),
                stream_id: StreamId(3),
                priority: PriorityLevel::Mid.priority(),
            },
        )
        .await
        .unwrap();
        assert_eq!(result, CommandResult::Accepted);
    }

    #[tokio::test]
    async fn execute_reports_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/streaming/receive_from"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "stat": "no source" })))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let result = execute(
            &client,
            &Command::ReceiveFrom {
                mac: Mac::from("aa"),
                dpid: Dpid::from("1"),
                port_no: PortNo::from("2"),
                stream_id: StreamId(3),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            result,
            CommandResult::Rejected {
                stat: "no source".into()
            }
        );
    }

    fn client_for(server: &MockServer) -> ControllerClient {
        let url = url::Url::parse(&server.uri()).unwrap();
        ControllerClient::new(url, &streamtopo_api::transport::TransportConfig::default()).unwrap()
    }
}
