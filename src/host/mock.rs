//! In-memory host for tests.
//!
//! `MockHost` implements [`HostApi`] over a `BTreeMap` KV store and a post
//! table; `MockRegistry` records what the client plugin registers and lets
//! tests drive it the way the host would.

use super::traits::*;
use crate::server::configuration::PluginConfiguration;
use crate::ttl::{Post, PostId};
use crate::webapp::composer::ComposerButton;
use crate::webapp::ticker::MountedView;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock host for testing
#[derive(Clone, Default)]
pub struct MockHost {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    kv: BTreeMap<String, Vec<u8>>,
    posts: HashMap<PostId, Post>,
    deleted_posts: Vec<PostId>,
    configuration: PluginConfiguration,
    fail_kv_list: bool,
    fail_configuration: bool,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_post(&self, post: Post) {
        self.lock().posts.insert(post.id.clone(), post);
    }

    pub fn has_post(&self, id: &PostId) -> bool {
        self.lock().posts.contains_key(id)
    }

    /// Posts deleted through the API, in order
    pub fn deleted_posts(&self) -> Vec<PostId> {
        self.lock().deleted_posts.clone()
    }

    /// All KV keys, sorted
    pub fn kv_keys(&self) -> Vec<String> {
        self.lock().kv.keys().cloned().collect()
    }

    pub fn set_configuration(&self, configuration: PluginConfiguration) {
        self.lock().configuration = configuration;
    }

    /// Make `kv_list` fail until reset
    pub fn fail_kv_list(&self, fail: bool) {
        self.lock().fail_kv_list = fail;
    }

    /// Make `load_plugin_configuration` fail until reset
    pub fn fail_configuration(&self, fail: bool) {
        self.lock().fail_configuration = fail;
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl HostApi for MockHost {
    async fn kv_set(&self, key: &str, value: &[u8]) -> HostResult<()> {
        self.lock().kv.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn kv_get(&self, key: &str) -> HostResult<Option<Vec<u8>>> {
        Ok(self.lock().kv.get(key).cloned())
    }

    async fn kv_delete(&self, key: &str) -> HostResult<()> {
        self.lock().kv.remove(key);
        Ok(())
    }

    async fn kv_list(&self, page: usize, per_page: usize) -> HostResult<Vec<String>> {
        let state = self.lock();
        if state.fail_kv_list {
            return Err(HostError::Kv("listing unavailable".to_string()));
        }
        Ok(state
            .kv
            .keys()
            .skip(page * per_page)
            .take(per_page)
            .cloned()
            .collect())
    }

    async fn get_post(&self, id: &PostId) -> HostResult<Post> {
        self.lock()
            .posts
            .get(id)
            .cloned()
            .ok_or_else(|| HostError::PostNotFound(id.clone()))
    }

    async fn delete_post(&self, id: &PostId) -> HostResult<()> {
        let mut state = self.lock();
        state
            .posts
            .remove(id)
            .ok_or_else(|| HostError::PostNotFound(id.clone()))?;
        state.deleted_posts.push(id.clone());
        Ok(())
    }

    async fn load_plugin_configuration(&self) -> HostResult<PluginConfiguration> {
        let state = self.lock();
        if state.fail_configuration {
            return Err(HostError::Configuration("configuration unavailable".to_string()));
        }
        Ok(state.configuration.clone())
    }
}

/// Mock client registry for testing
#[derive(Default)]
pub struct MockRegistry {
    post_actions: Vec<Arc<dyn PostComponent>>,
    post_types: HashMap<String, Arc<dyn PostComponent>>,
    composer_actions: Vec<Arc<dyn ComposerComponent>>,
    hooks: Vec<MessageWillBePostedHook>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn post_action_count(&self) -> usize {
        self.post_actions.len()
    }

    pub fn composer_action_count(&self) -> usize {
        self.composer_actions.len()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn has_post_type(&self, post_type: &str) -> bool {
        self.post_types.contains_key(post_type)
    }

    /// Mount every post-action component for `post`, as the host does when
    /// the post scrolls into view.
    pub fn mount_post_actions(&self, post: &Post) -> Vec<MountedView> {
        self.post_actions
            .iter()
            .map(|component| component.mount(post))
            .collect()
    }

    /// Mount the custom body renderer for the post's type, if registered.
    pub fn mount_post_body(&self, post: &Post) -> Option<MountedView> {
        self.post_types
            .get(&post.post_type)
            .map(|component| component.mount(post))
    }

    /// Mount the first composer action.
    pub fn mount_composer(&self) -> Option<ComposerButton> {
        self.composer_actions.first().map(|component| component.mount())
    }

    /// Run the before-send hooks in registration order.
    pub fn run_message_will_be_posted(&self, post: Post) -> Post {
        self.hooks.iter().fold(post, |post, hook| hook(post))
    }
}

impl PluginRegistry for MockRegistry {
    fn register_post_action_component(&mut self, component: Arc<dyn PostComponent>) {
        self.post_actions.push(component);
    }

    fn register_post_type_component(&mut self, post_type: &str, component: Arc<dyn PostComponent>) {
        self.post_types.insert(post_type.to_string(), component);
    }

    fn register_post_editor_action_component(&mut self, component: Arc<dyn ComposerComponent>) {
        self.composer_actions.push(component);
    }

    fn register_message_will_be_posted_hook(&mut self, hook: MessageWillBePostedHook) {
        self.hooks.push(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_kv_list_pages_in_key_order() {
        let host = MockHost::new();
        for key in ["c", "a", "b"] {
            host.kv_set(key, b"v").await.unwrap();
        }

        assert_eq!(host.kv_list(0, 2).await.unwrap(), vec!["a", "b"]);
        assert_eq!(host.kv_list(1, 2).await.unwrap(), vec!["c"]);
        assert!(host.kv_list(2, 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_post() {
        let host = MockHost::new();
        host.insert_post(Post::new("p1", "x"));

        assert_eq!(host.get_post(&PostId::from("p1")).await.unwrap().message, "x");
        host.delete_post(&PostId::from("p1")).await.unwrap();

        assert!(matches!(
            host.delete_post(&PostId::from("p1")).await,
            Err(HostError::PostNotFound(_))
        ));
        assert_eq!(host.deleted_posts(), vec![PostId::from("p1")]);
    }
}
