//! Server plugin lifecycle and hook entry points.

use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use tracing::{error, info};

use super::configuration::PluginConfiguration;
use super::expiration::{queue_post_for_deletion, ExpirationJob, DEFAULT_JOB_INTERVAL};
use super::hooks::{apply_ttl, expiry_to_queue, HookRejection, TtlDecision};
use crate::host::traits::{HostApi, HostResult};
use crate::ttl::{Clock, Post, SystemClock};

/// Server half of the plugin.
pub struct ServerPlugin {
    host: Arc<dyn HostApi>,
    clock: Arc<dyn Clock>,
    configuration: RwLock<PluginConfiguration>,
    job: Mutex<Option<ExpirationJob>>,
    job_interval: Duration,
}

impl ServerPlugin {
    pub fn new(host: Arc<dyn HostApi>) -> Self {
        Self::with_clock(host, Arc::new(SystemClock))
    }

    pub fn with_clock(host: Arc<dyn HostApi>, clock: Arc<dyn Clock>) -> Self {
        Self {
            host,
            clock,
            configuration: RwLock::new(PluginConfiguration::default()),
            job: Mutex::new(None),
            job_interval: DEFAULT_JOB_INTERVAL,
        }
    }

    /// Run the expiration job every `interval` instead of every minute.
    pub fn with_job_interval(mut self, interval: Duration) -> Self {
        self.job_interval = interval;
        self
    }

    /// Load the configuration and start the expiration job.
    pub async fn on_activate(&self) -> HostResult<()> {
        if let Err(e) = self.on_configuration_change().await {
            error!(error = %e, "failed to initialize plugin");
            return Err(e);
        }

        let job = ExpirationJob::spawn(self.host.clone(), self.clock.clone(), self.job_interval);
        let previous = self.job_slot().replace(job);
        if let Some(previous) = previous {
            previous.stop().await;
        }

        info!("expiring messages plugin initialized");
        Ok(())
    }

    /// Stop the expiration job. Safe to call when not active.
    pub async fn on_deactivate(&self) {
        let job = self.job_slot().take();
        if let Some(job) = job {
            job.stop().await;
        }
    }

    pub fn is_active(&self) -> bool {
        self.job_slot().as_ref().is_some_and(ExpirationJob::is_running)
    }

    /// Reload settings from the host.
    pub async fn on_configuration_change(&self) -> HostResult<()> {
        let configuration = self.host.load_plugin_configuration().await?;
        *self
            .configuration
            .write()
            .unwrap_or_else(PoisonError::into_inner) = configuration;
        Ok(())
    }

    pub fn configuration(&self) -> PluginConfiguration {
        self.configuration
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Validate and stamp a new post before the host stores it.
    pub fn message_will_be_posted(&self, post: Post) -> Result<Post, HookRejection> {
        let configuration = self.configuration();
        apply_ttl(&configuration, post, self.clock.now_ms()).map(TtlDecision::into_post)
    }

    /// Queue a stored post for deletion if it carries a stamped TTL.
    pub async fn message_has_been_posted(&self, post: &Post) {
        let Some(expires_at) = expiry_to_queue(post) else {
            return;
        };
        if let Err(e) = queue_post_for_deletion(self.host.as_ref(), &post.id, expires_at).await {
            error!(post_id = %post.id, error = %e, "failed to queue post for deletion");
        }
    }

    /// Validate an edit. An edit that still carries a TTL restarts the
    /// countdown; the post is re-queued only if its expiry moved.
    pub async fn message_will_be_updated(
        &self,
        new_post: Post,
        old_post: Option<&Post>,
    ) -> Result<Post, HookRejection> {
        let configuration = self.configuration();
        let decision = apply_ttl(&configuration, new_post, self.clock.now_ms())?;

        let TtlDecision::Stamped { post, expires_at } = decision else {
            return Ok(decision.into_post());
        };

        let old_expires_at = old_post
            .and_then(Post::ttl)
            .and_then(|ttl| ttl.expires_at)
            .unwrap_or(0);
        if expires_at != old_expires_at {
            if let Err(e) = queue_post_for_deletion(self.host.as_ref(), &post.id, expires_at).await
            {
                error!(post_id = %post.id, error = %e, "failed to queue post for deletion");
            }
        }

        Ok(post)
    }

    fn job_slot(&self) -> std::sync::MutexGuard<'_, Option<ExpirationJob>> {
        self.job.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
