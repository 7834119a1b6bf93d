//! Streamer API (C4): the long-lived per-user event stream. Grounded on
//! `registrar.go`'s `Events` RPC: increment `active` on entry, `for event :=
//! range channel.EventQueue { stream.Send(event) }`, clean return when the
//! queue closes (disconnect or housekeep eviction).

use sims_protocol::{Event, Header, SimsError};

use crate::channel::ActiveGuard;
use crate::identity::key_from_header;
use crate::registry::Registry;

/// A handle on one user's live event feed. Transports drive `recv()` in a
/// loop and forward whatever comes back to their wire; `None` means the
/// channel was torn down (disconnect or housekeep) and the transport should
/// close its connection cleanly, not surface an error.
pub struct EventStream {
    guard: ActiveGuard,
}

impl EventStream {
    pub async fn recv(&self) -> Option<Event> {
        self.guard.channel().recv().await
    }
}

pub struct Streamer<'a> {
    registry: &'a Registry,
}

impl<'a> Streamer<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Streamer { registry }
    }

    pub fn events(&self, header: Option<&Header>) -> Result<EventStream, SimsError> {
        let key = key_from_header(header)?;
        let channel = self.registry.find_channel(&key).ok_or(SimsError::NotFound)?;
        Ok(EventStream {
            guard: ActiveGuard::enter(channel),
        })
    }
}
