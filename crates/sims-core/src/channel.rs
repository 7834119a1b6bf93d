//! A single user's channel (C1): a rendezvous event queue plus liveness
//! timestamps and an active-stream counter.
//!
//! `async-channel`'s `bounded` panics if asked for capacity 0 ("capacity
//! cannot be zero") -- it has no built-in rendezvous mode. A capacity-1
//! queue alone is the wrong fix too: it would let one event buffer up with
//! no reader, turning a `NO_CONSUMER` into a silent success. Instead this
//! pairs a capacity-1 `async_channel` with an explicit count of parked
//! receivers: `try_send` only attempts the underlying send when at least
//! one `recv` call is currently awaiting, so "a channel exists but nothing
//! is draining it" still fails fast exactly as spec requires.

use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use sims_protocol::Event;

pub use async_channel::TrySendError;

/// Shared via `Arc<Channel>` once inserted into the registry, so the
/// liveness timestamp needs its own lock independent of the registry's map
/// lock -- `heartbeat()` must not hold the map lock for the duration.
pub struct Channel {
    queue: async_channel::Sender<Event>,
    receiver: async_channel::Receiver<Event>,
    waiting_receivers: AtomicUsize,
    pub birth: DateTime<Utc>,
    last_heartbeat: Mutex<DateTime<Utc>>,
    pub active: AtomicU32,
}

impl Channel {
    pub fn new(now: DateTime<Utc>) -> Self {
        let (queue, receiver) = async_channel::bounded(1);
        Channel {
            queue,
            receiver,
            waiting_receivers: AtomicUsize::new(0),
            birth: now,
            last_heartbeat: Mutex::new(now),
            active: AtomicU32::new(0),
        }
    }

    /// Non-blocking. Fails with `TrySendError::Full` unless a `recv()` call
    /// is currently parked -- a connected-but-undrained channel behaves
    /// exactly like one with no reader at all.
    pub fn try_send(&self, event: Event) -> Result<(), TrySendError<Event>> {
        if self.waiting_receivers.load(Ordering::SeqCst) == 0 {
            return Err(TrySendError::Full(event));
        }
        self.queue.try_send(event)
    }

    /// Awaits the next event. Returns `None` once the channel is closed
    /// (disconnect or housekeep eviction).
    pub async fn recv(&self) -> Option<Event> {
        self.waiting_receivers.fetch_add(1, Ordering::SeqCst);
        let result = self.receiver.recv().await;
        self.waiting_receivers.fetch_sub(1, Ordering::SeqCst);
        result.ok()
    }

    pub fn active_count(&self) -> u32 {
        self.active.load(Ordering::SeqCst)
    }

    pub fn last_heartbeat(&self) -> DateTime<Utc> {
        *self.last_heartbeat.lock().expect("last_heartbeat lock poisoned")
    }

    pub fn touch_heartbeat(&self, now: DateTime<Utc>) {
        *self.last_heartbeat.lock().expect("last_heartbeat lock poisoned") = now;
    }

    pub fn close(&self) {
        self.queue.close();
        self.receiver.close();
    }
}

/// Increments `Channel::active` on construction and decrements it on drop,
/// so a panicking stream consumer cannot leak the counter. Owns the `Arc`
/// so it can outlive a single registry lookup without borrowing anything.
pub struct ActiveGuard {
    channel: Arc<Channel>,
}

impl ActiveGuard {
    pub fn enter(channel: Arc<Channel>) -> Self {
        channel.active.fetch_add(1, Ordering::SeqCst);
        ActiveGuard { channel }
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.channel.active.fetch_sub(1, Ordering::SeqCst);
    }
}
