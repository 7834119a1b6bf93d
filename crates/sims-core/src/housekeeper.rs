//! Housekeeper (C6). Grounded on `server/main.go`'s ticker goroutine
//! (`time.NewTicker(HousekeepInterval)` calling `reg.housekeep()` on each
//! tick, stopped once the service's run loop returns) and on this
//! codebase's `tokio::sync::watch` shutdown convention.

use std::sync::Arc;

use tokio::sync::watch;

use crate::registry::Registry;

/// Spawns the periodic eviction sweep. The returned `JoinHandle` resolves
/// once `shutdown` is set to `true`.
pub fn spawn(registry: Arc<Registry>, mut shutdown: watch::Receiver<bool>) -> tokio::task::JoinHandle<()> {
    let interval = registry.config().housekeep_interval;
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    registry.housekeep();
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("housekeeper: shutting down");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::identity::key_from_header;
    use sims_protocol::Header;

    #[tokio::test(start_paused = true)]
    async fn housekeeper_evicts_stale_channels_on_tick() {
        let config = RegistryConfig {
            housekeep_interval: std::time::Duration::from_millis(50),
            channel_inactivity: std::time::Duration::from_millis(10),
        };
        let registry = Arc::new(Registry::new(config));
        let key = key_from_header(Some(&Header {
            user_id: "alice".to_owned(),
            request_id: None,
        }))
        .unwrap();
        registry.create_event_queue(&key);

        let (tx, rx) = watch::channel(false);
        let handle = spawn(Arc::clone(&registry), rx);

        tokio::time::advance(std::time::Duration::from_millis(100)).await;
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
        assert!(registry.find_channel(&key).is_none());

        tx.send(true).unwrap();
        handle.await.unwrap();
    }
}
