// Builds commands from the current replica. Read-only.

use crate::error::CoreError;
use crate::model::{Dpid, Host, Mac, StreamId};
use crate::store::EntityStore;
use crate::streams::StreamBindings;

use super::{Command, PriorityLevel};

/// Translates user intent (a host or switch, a stream id, a priority
/// level) into a `Command`, filling the host's attachment point from the
/// store.
#[derive(Debug, Clone, Copy)]
pub struct CommandIssuer<'a> {
    store: &'a EntityStore,
    streams: &'a StreamBindings,
}

impl<'a> CommandIssuer<'a> {
    pub fn new(store: &'a EntityStore, streams: &'a StreamBindings) -> Self {
        Self { store, streams }
    }

    /// `mac` becomes a source of `stream_id`. The stream may be new.
    pub fn source_for(&self, mac: &Mac, stream_id: StreamId) -> Result<Command, CoreError> {
        let host = self.host(mac)?;
        Ok(Command::SourceFor {
            mac: host.mac.clone(),
            dpid: host.dpid.clone(),
            port_no: host.port.clone(),
            stream_id,
        })
    }

    /// `mac` receives `stream_id`, which some host must already source.
    pub fn receive_from(&self, mac: &Mac, stream_id: StreamId) -> Result<Command, CoreError> {
        let host = self.host(mac)?;
        self.require_stream(stream_id)?;
        Ok(Command::ReceiveFrom {
            mac: host.mac.clone(),
            dpid: host.dpid.clone(),
            port_no: host.port.clone(),
            stream_id,
        })
    }

    pub fn priority_change(
        &self,
        dpid: &Dpid,
        stream_id: StreamId,
        level: PriorityLevel,
    ) -> Result<Command, CoreError> {
        if self.store.switch(dpid).is_none() {
            return Err(CoreError::SwitchNotFound {
                dpid: dpid.to_string(),
            });
        }
        self.require_stream(stream_id)?;
        Ok(Command::PriorityChange {
            dpid: dpid.clone(),
            stream_id,
            priority: level.priority(),
        })
    }

    fn host(&self, mac: &Mac) -> Result<&'a Host, CoreError> {
        self.store.host(mac).ok_or_else(|| CoreError::HostNotFound {
            mac: mac.to_string(),
        })
    }

    fn require_stream(&self, stream_id: StreamId) -> Result<(), CoreError> {
        if self.streams.contains(stream_id) {
            Ok(())
        } else {
            Err(CoreError::UnknownStream {
                stream_id: stream_id.get(),
            })
        }
    }
}
