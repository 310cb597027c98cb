//! Expiration queue and the background job that drains it.
//!
//! Posts are queued in the host KV store under per-minute buckets:
//! `expiration_bucket_<unix minute>_<post id>` → post id. Every minute the
//! job deletes the posts in the current and previous bucket, then prunes
//! bucket keys older than a day that were never drained.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, warn};

use crate::host::traits::{HostApi, HostResult};
use crate::ttl::{Clock, PostId};

/// Prefix shared by every queue key.
pub const EXPIRATION_PREFIX: &str = "expiration_bucket_";

/// Keys fetched per KV listing page.
pub const MAX_POSTS_PER_DELETION: usize = 100;

/// Default cadence of the expiration job.
pub const DEFAULT_JOB_INTERVAL: Duration = Duration::from_secs(60);

const SWEEP_PAGES: usize = 10;
const CLEANUP_PAGES: usize = 100;
const CLEANUP_PAGE_SIZE: usize = 100;
const BUCKET_RETENTION_MS: i64 = 24 * 60 * 60 * 1000;

/// Unix minute containing `at_ms`.
fn bucket_minute(at_ms: i64) -> i64 {
    at_ms.div_euclid(60 * 1000)
}

/// Key prefix of the bucket containing `at_ms` (includes the trailing `_`).
pub fn bucket_key(at_ms: i64) -> String {
    format!("{}{}_", EXPIRATION_PREFIX, bucket_minute(at_ms))
}

/// Full queue key for `post_id` expiring at `expires_at`.
pub fn queue_key(post_id: &PostId, expires_at: i64) -> String {
    format!("{}{}", bucket_key(expires_at), post_id)
}

/// Bucket minute encoded in a queue key, if it is one.
pub fn extract_bucket_number(key: &str) -> Option<i64> {
    let rest = key.strip_prefix(EXPIRATION_PREFIX)?;
    let (minute, _post_id) = rest.split_once('_')?;
    minute.parse().ok()
}

/// Queue `post_id` for deletion once `expires_at` has passed.
pub async fn queue_post_for_deletion(
    host: &dyn HostApi,
    post_id: &PostId,
    expires_at: i64,
) -> HostResult<()> {
    host.kv_set(&queue_key(post_id, expires_at), post_id.0.as_bytes())
        .await
}

/// Outcome of one sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub deleted: Vec<PostId>,
    pub failed: Vec<PostId>,
    pub pruned: usize,
}

/// Delete posts queued in the current and previous minute bucket, then prune
/// stale buckets.
///
/// Host failures are logged and skipped; a sweep never aborts half way.
pub async fn delete_expired_posts(host: &dyn HostApi, now_ms: i64) -> SweepReport {
    let due = [bucket_key(now_ms), bucket_key(now_ms - 60 * 1000)];

    // Collect first: deleting while paging would shift later pages.
    let mut keys = Vec::new();
    for page in 0..SWEEP_PAGES {
        let listed = match host.kv_list(page, MAX_POSTS_PER_DELETION).await {
            Ok(listed) => listed,
            Err(e) => {
                error!(error = %e, "failed to list KV keys");
                break;
            }
        };
        if listed.is_empty() {
            break;
        }
        keys.extend(
            listed
                .into_iter()
                .filter(|key| due.iter().any(|bucket| key.starts_with(bucket.as_str()))),
        );
    }

    let mut report = SweepReport::default();
    for key in keys {
        let post_id = match host.kv_get(&key).await {
            Ok(Some(value)) => String::from_utf8_lossy(&value).into_owned(),
            Ok(None) => continue,
            Err(e) => {
                warn!(key = %key, error = %e, "failed to read expiration key");
                continue;
            }
        };
        if post_id.is_empty() {
            continue;
        }
        let post_id = PostId(post_id);

        match host.delete_post(&post_id).await {
            Ok(()) => {
                info!(post_id = %post_id, "deleted expired post");
                report.deleted.push(post_id);
            }
            Err(e) => {
                error!(post_id = %post_id, error = %e, "failed to delete expired post");
                report.failed.push(post_id);
            }
        }

        if let Err(e) = host.kv_delete(&key).await {
            error!(key = %key, error = %e, "failed to delete expiration key");
        }
    }

    report.pruned = cleanup_old_buckets(host, now_ms).await;
    report
}

/// Delete queue keys whose bucket is more than a day old. Returns how many
/// keys were removed.
pub async fn cleanup_old_buckets(host: &dyn HostApi, now_ms: i64) -> usize {
    let cutoff = bucket_minute(now_ms - BUCKET_RETENTION_MS);

    let mut stale = Vec::new();
    for page in 0..CLEANUP_PAGES {
        let listed = match host.kv_list(page, CLEANUP_PAGE_SIZE).await {
            Ok(listed) => listed,
            Err(e) => {
                error!(error = %e, "failed to list KV keys");
                break;
            }
        };
        if listed.is_empty() {
            break;
        }
        stale.extend(listed.into_iter().filter(|key| {
            extract_bucket_number(key).is_some_and(|minute| minute < cutoff)
        }));
    }

    let mut pruned = 0;
    for key in stale {
        match host.kv_delete(&key).await {
            Ok(()) => pruned += 1,
            Err(e) => error!(key = %key, error = %e, "failed to delete old bucket"),
        }
    }
    pruned
}

/// Background task running [`delete_expired_posts`] on a fixed interval.
pub struct ExpirationJob {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl ExpirationJob {
    /// Start the job. The first sweep happens one `interval` from now.
    pub fn spawn(host: Arc<dyn HostApi>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        let (shutdown, mut stop) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let report = delete_expired_posts(host.as_ref(), clock.now_ms()).await;
                        if !report.deleted.is_empty() || !report.failed.is_empty() {
                            info!(
                                deleted = report.deleted.len(),
                                failed = report.failed.len(),
                                pruned = report.pruned,
                                "expiration sweep finished"
                            );
                        }
                    }
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        Self { shutdown, handle }
    }

    /// Signal the job to stop and wait for it. A sweep in progress finishes
    /// first.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "expiration job ended abnormally");
        }
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}
