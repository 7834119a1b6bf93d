//! sims-core: the in-memory presence registry and event-routing engine.
//!
//! This crate knows nothing about transports -- no axum, no wire framing.
//! `services/sims-server` and `services/sims-rpc` each hold one
//! `sims_core::Registry` and drive it through `Hub`, `Streamer`, and
//! `Publisher`, the three façades that mirror the original RPC surface.

pub mod channel;
pub mod config;
pub mod housekeeper;
pub mod hub;
pub mod identity;
pub mod publisher;
pub mod registry;
pub mod streamer;

pub use channel::Channel;
pub use config::RegistryConfig;
pub use hub::Hub;
pub use identity::{key_from_header, UserKey};
pub use publisher::Publisher;
pub use registry::Registry;
pub use streamer::{EventStream, Streamer};
