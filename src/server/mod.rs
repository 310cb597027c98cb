//! Server half of the plugin.
//!
//! - `configuration`: allow-listed durations and the master switch
//! - `hooks`: validation and stamping of `props.ttl`
//! - `expiration`: per-minute KV buckets and the sweeping job
//! - `plugin`: activation, deactivation and hook entry points

pub mod configuration;
pub mod expiration;
pub mod hooks;
pub mod plugin;

pub use configuration::PluginConfiguration;
pub use expiration::{ExpirationJob, SweepReport};
pub use hooks::HookRejection;
pub use plugin::ServerPlugin;
