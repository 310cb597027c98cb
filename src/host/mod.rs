//! Chat host integration.
//!
//! The plugin talks to its host only through the traits in `traits`:
//! a client-side `PluginRegistry` and a server-side `HostApi`.

pub mod mock;
pub mod sqlite;
pub mod traits;

pub use mock::{MockHost, MockRegistry};
pub use sqlite::SqliteHost;
pub use traits::{HostApi, HostError, HostResult, PluginRegistry};
