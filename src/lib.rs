//! Expiring Messages - self-deleting chat posts
//!
//! A chat-server plugin that lets authors give a message a time-to-live.
//! The client half tags outgoing messages and counts down in the UI; the
//! server half validates the request, stamps the absolute expiry and deletes
//! the post once it has passed.
//!
//! Key principles:
//! - The client records intent only; the server owns `expires_at`
//! - Deletion is queued in per-minute KV buckets and swept every minute
//! - Malformed TTL metadata degrades to "no TTL", never to an error

pub mod host;
pub mod server;
pub mod ttl;
pub mod webapp;
