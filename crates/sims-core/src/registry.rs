//! The channel registry (C2). Grounded on the original `Registrar` (a
//! single mutex guarding a `map[UniqueID]*Channel`) and on this codebase's
//! own `AppState` convention of wrapping a shared map in a lock behind an
//! `Arc`. Every entry is `Arc<Channel>` so lookups can clone the handle and
//! drop the map lock before doing anything that might contend or await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use sims_protocol::ChannelInfo;

use crate::channel::Channel;
use crate::config::RegistryConfig;
use crate::identity::UserKey;

pub struct Registry {
    channels: Mutex<HashMap<UserKey, Arc<Channel>>>,
    config: RegistryConfig,
}

impl Registry {
    pub fn new(config: RegistryConfig) -> Self {
        Registry {
            channels: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> RegistryConfig {
        self.config
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<UserKey, Arc<Channel>>> {
        self.channels.lock().expect("registry lock poisoned")
    }

    /// Idempotent: a second `create_event_queue` for an already-connected
    /// user is a no-op, matching the original's `createEventQueue`.
    pub fn create_event_queue(&self, key: &UserKey) {
        let mut channels = self.lock();
        channels
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Channel::new(Utc::now())));
    }

    pub fn find_event_queue(&self, key: &UserKey) -> Option<Arc<Channel>> {
        self.lock().get(key).cloned()
    }

    pub fn find_channel(&self, key: &UserKey) -> Option<Arc<Channel>> {
        self.find_event_queue(key)
    }

    /// Returns `true` if a channel existed to stamp. Callers translate a
    /// `false` into `ErrorCode::NotFound`.
    pub fn heartbeat(&self, key: &UserKey) -> bool {
        match self.find_channel(key) {
            Some(channel) => {
                channel.touch_heartbeat(Utc::now());
                true
            }
            None => false,
        }
    }

    /// Idempotent: closes and removes the channel if present, does nothing
    /// otherwise. Closing wakes any parked `Streamer::events` loop so it can
    /// return cleanly instead of hanging forever.
    pub fn delete_event_queue(&self, key: &UserKey) {
        let removed = self.lock().remove(key);
        if let Some(channel) = removed {
            channel.close();
        }
    }

    /// Evicts every channel whose `last_heartbeat` is older than
    /// `config.channel_inactivity`. Runs under the map lock the whole time,
    /// same as the original -- housekeeping is not expected to be hot enough
    /// to justify finer-grained locking.
    pub fn housekeep(&self) {
        let deadline = Utc::now()
            - chrono::Duration::from_std(self.config.channel_inactivity)
                .unwrap_or(chrono::Duration::zero());
        let mut channels = self.lock();
        let stale: Vec<UserKey> = channels
            .iter()
            .filter(|(_, channel)| channel.last_heartbeat() < deadline)
            .map(|(key, _)| key.clone())
            .collect();
        for key in stale {
            if let Some(channel) = channels.remove(&key) {
                tracing::info!(user_id = %key, "housekeep: evicting inactive channel");
                channel.close();
            }
        }
    }

    /// Closes every channel without removing it from the map -- used on
    /// shutdown, where no further lookups will happen anyway.
    pub fn close(&self) {
        let channels = self.lock();
        for channel in channels.values() {
            channel.close();
        }
    }

    /// Snapshot sorted by `last_heartbeat` descending, matching the
    /// original's `ListChannels`.
    pub fn list(&self) -> Vec<ChannelInfo> {
        let channels = self.lock();
        let mut infos: Vec<ChannelInfo> = channels
            .iter()
            .map(|(key, channel)| ChannelInfo {
                user_id: key.as_str().to_owned(),
                birth: channel.birth,
                last_heartbeat: channel.last_heartbeat(),
                active: channel.active_count(),
            })
            .collect();
        infos.sort_by(|a, b| b.last_heartbeat.cmp(&a.last_heartbeat));
        infos
    }
}
