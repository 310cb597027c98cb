//! TTL model shared by the client and server halves.
//!
//! - `duration`: duration tags ("5m") and countdown labels
//! - `descriptor`: posts and their `props.ttl` metadata
//! - `expiry`: countdown state derived from a descriptor and "now"

pub mod descriptor;
pub mod duration;
pub mod expiry;

pub use descriptor::{Post, PostId, TtlDescriptor};
pub use duration::{format_time_remaining, parse_duration, DurationError, DurationTag};
pub use expiry::{derive, Clock, CountdownState, ExpiryState, ManualClock, SystemClock};
