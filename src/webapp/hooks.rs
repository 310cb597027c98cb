//! Before-send interceptor.
//!
//! Turns the composer's pending selection into `props.ttl` on the outgoing
//! message. The absolute `expires_at` is left to the server, which stamps it
//! when it accepts the post.

use super::selection::SelectionSlot;
use crate::ttl::{Post, TtlDescriptor};

/// Attach the pending selection to `post`.
///
/// - A post that explicitly carries `ttl.enabled == false` has its `ttl`
///   stripped and the slot is left alone.
/// - Otherwise a pending selection is consumed and becomes
///   `{ enabled: true, duration }`.
/// - With nothing pending the post passes through unchanged.
pub fn before_send(slot: &SelectionSlot, mut post: Post) -> Post {
    if post.ttl().is_some_and(|ttl| !ttl.enabled) {
        post.remove_ttl();
        return post;
    }

    if let Some(duration) = slot.consume_if_pending() {
        tracing::debug!(post_id = %post.id, duration = %duration, "attaching ttl");
        post.set_ttl(&TtlDescriptor::requested(duration));
    }

    post
}
