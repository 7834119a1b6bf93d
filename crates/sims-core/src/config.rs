//! Registry tuning. Mirrors the original's package-level constants
//! (`HousekeepInterval`, `ChannelInactivity`) but exposes them as runtime
//! configuration, as spec requires ("MUST make these configurable at one
//! point").

use std::time::Duration;

pub mod defaults {
    use super::Duration;

    pub const HOUSEKEEP_INTERVAL: Duration = Duration::from_secs(5);
    pub const CHANNEL_INACTIVITY: Duration = Duration::from_secs(10);
}

#[derive(Debug, Clone, Copy)]
pub struct RegistryConfig {
    pub housekeep_interval: Duration,
    pub channel_inactivity: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            housekeep_interval: defaults::HOUSEKEEP_INTERVAL,
            channel_inactivity: defaults::CHANNEL_INACTIVITY,
        }
    }
}
