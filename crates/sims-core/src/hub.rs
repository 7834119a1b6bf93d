//! Hub API (C3): connect, heartbeat, disconnect, list. Thin validation and
//! dispatch in front of `Registry` -- grounded on `registrar.go`'s
//! `Connect`/`Heartbeat`/`Disconnect`/`List` RPC handlers, minus the
//! service-discovery lookup those wrap (out of scope, see SPEC_FULL.md §10).

use sims_protocol::{ChannelInfo, Event, Header, SimsError};

use crate::identity::key_from_header;
use crate::registry::Registry;

pub struct Hub<'a> {
    registry: &'a Registry,
}

impl<'a> Hub<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Hub { registry }
    }

    /// Idempotent: connecting twice for the same user just keeps the
    /// existing channel.
    pub fn connect(&self, header: Option<&Header>) -> Result<(), SimsError> {
        let key = key_from_header(header)?;
        self.registry.create_event_queue(&key);
        Ok(())
    }

    /// Stamps `last_heartbeat` and best-effort delivers a `HEARTBEAT` event
    /// to whatever stream is currently draining the queue. A stream with no
    /// active reader surfaces as `NoConsumer`, matching the original.
    pub fn heartbeat(&self, header: Option<&Header>) -> Result<(), SimsError> {
        let key = key_from_header(header)?;
        if !self.registry.heartbeat(&key) {
            return Err(SimsError::NotFound);
        }
        let channel = self.registry.find_channel(&key).ok_or(SimsError::NotFound)?;
        channel
            .try_send(Event::heartbeat())
            .map_err(|_| SimsError::NoConsumer)?;
        Ok(())
    }

    /// Idempotent: disconnecting an unknown user is not an error.
    pub fn disconnect(&self, header: Option<&Header>) -> Result<(), SimsError> {
        let key = key_from_header(header)?;
        self.registry.delete_event_queue(&key);
        Ok(())
    }

    pub fn list(&self) -> Vec<ChannelInfo> {
        self.registry.list()
    }
}
