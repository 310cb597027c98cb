//! Client half of the plugin.
//!
//! The composer button writes the user's choice into a shared
//! [`SelectionSlot`]; the before-send hook consumes it and tags the outgoing
//! message. Post-side views of a post share one timer that re-derives the
//! expiry state once a second.

pub mod components;
pub mod composer;
pub mod hooks;
pub mod plugin;
pub mod selection;
pub mod ticker;

pub use components::{ExpiringPost, PostTtlIndicator, RemovingPlaceholder, Rendered, ViewContext};
pub use composer::{ComposerButton, ComposerTtlButton, DurationOption};
pub use hooks::before_send;
pub use plugin::WebappPlugin;
pub use selection::{SelectionEvent, SelectionSlot};
pub use ticker::{MountedView, Ticker};
