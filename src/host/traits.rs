//! Host capability traits.
//!
//! The plugin only sees the chat host through these narrow interfaces, which
//! lets `MockHost`/`MockRegistry` stand in for the real host in tests and
//! `SqliteHost` run the server half standalone.

use async_trait::async_trait;
use std::sync::Arc;

use crate::server::configuration::PluginConfiguration;
use crate::ttl::{Post, PostId};
use crate::webapp::composer::ComposerButton;
use crate::webapp::ticker::MountedView;

/// Result type for host operations
pub type HostResult<T> = Result<T, HostError>;

/// Host errors
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("KV store error: {0}")]
    Kv(String),

    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Server-side host API used by the hooks and the expiration job.
#[async_trait]
pub trait HostApi: Send + Sync {
    /// Store `value` under `key` in the plugin's KV namespace (upsert).
    async fn kv_set(&self, key: &str, value: &[u8]) -> HostResult<()>;

    async fn kv_get(&self, key: &str) -> HostResult<Option<Vec<u8>>>;

    /// Deleting a missing key is not an error.
    async fn kv_delete(&self, key: &str) -> HostResult<()>;

    /// List keys in a stable order, `per_page` at a time.
    ///
    /// An empty page means the listing is exhausted.
    async fn kv_list(&self, page: usize, per_page: usize) -> HostResult<Vec<String>>;

    /// Read a message by id
    async fn get_post(&self, id: &PostId) -> HostResult<Post>;

    async fn delete_post(&self, id: &PostId) -> HostResult<()>;

    /// Current plugin settings as configured on the host.
    async fn load_plugin_configuration(&self) -> HostResult<PluginConfiguration>;
}

/// A view the host mounts next to a post (post-action slot).
///
/// Mounting starts whatever timer the view needs; dropping or unmounting the
/// returned guard stops it.
pub trait PostComponent: Send + Sync {
    fn mount(&self, post: &Post) -> MountedView;
}

/// A view the host mounts in the message composer.
pub trait ComposerComponent: Send + Sync {
    fn mount(&self) -> ComposerButton;
}

/// Interceptor run on every outgoing message. Returning the post unchanged is
/// always valid.
pub type MessageWillBePostedHook = Arc<dyn Fn(Post) -> Post + Send + Sync>;

/// Client-side plugin registry.
pub trait PluginRegistry {
    fn register_post_action_component(&mut self, component: Arc<dyn PostComponent>);

    /// Render posts of `post_type` with `component` instead of the default body.
    fn register_post_type_component(&mut self, post_type: &str, component: Arc<dyn PostComponent>);

    fn register_post_editor_action_component(&mut self, component: Arc<dyn ComposerComponent>);

    fn register_message_will_be_posted_hook(&mut self, hook: MessageWillBePostedHook);
}
