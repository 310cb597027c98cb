//! Server-side message hooks.
//!
//! The client only records intent (`enabled` + `duration`). These hooks
//! validate that intent against the plugin configuration, stamp the
//! authoritative `expires_at` and mark the post as `custom_expiring`.

use crate::server::configuration::PluginConfiguration;
use crate::ttl::descriptor::EXPIRING_POST_TYPE;
use crate::ttl::duration::calculate_expires_at;
use crate::ttl::{Post, TtlDescriptor};

/// Reason a post was refused; shown to the author by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HookRejection {
    #[error("TTL duration is required when TTL is enabled")]
    MissingDuration,

    #[error("TTL duration '{0}' is not allowed")]
    DurationNotAllowed(String),
}

/// What the validation step decided for a post.
#[derive(Debug, Clone, PartialEq)]
pub enum TtlDecision {
    /// Leave the post as it is.
    Untouched(Post),
    /// TTL stripped (explicit opt-out).
    Stripped(Post),
    /// TTL accepted and stamped.
    Stamped { post: Post, expires_at: i64 },
}

impl TtlDecision {
    pub fn into_post(self) -> Post {
        match self {
            Self::Untouched(post) | Self::Stripped(post) => post,
            Self::Stamped { post, .. } => post,
        }
    }
}

/// Validate and stamp the TTL on a post being created or edited.
pub fn apply_ttl(
    config: &PluginConfiguration,
    mut post: Post,
    now_ms: i64,
) -> Result<TtlDecision, HookRejection> {
    if !config.enabled {
        return Ok(TtlDecision::Untouched(post));
    }

    let Some(ttl) = post.ttl() else {
        return Ok(TtlDecision::Untouched(post));
    };

    if !ttl.enabled {
        post.remove_ttl();
        return Ok(TtlDecision::Stripped(post));
    }

    if ttl.duration.is_empty() {
        return Err(HookRejection::MissingDuration);
    }
    if !config.is_duration_allowed(&ttl.duration) {
        return Err(HookRejection::DurationNotAllowed(ttl.duration));
    }

    let expires_at = calculate_expires_at(&ttl.duration, now_ms);
    post.set_ttl(&TtlDescriptor {
        enabled: true,
        duration: ttl.duration,
        expires_at: Some(expires_at),
    });
    post.post_type = EXPIRING_POST_TYPE.to_string();

    Ok(TtlDecision::Stamped { post, expires_at })
}

/// Expiry to queue for a post that has just been stored, if any.
pub fn expiry_to_queue(post: &Post) -> Option<i64> {
    post.ttl()
        .filter(|ttl| ttl.enabled)
        .and_then(|ttl| ttl.expires_at)
}
