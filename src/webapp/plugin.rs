//! Client plugin entry point.

use std::sync::Arc;

use super::components::{ExpiringPost, PostTtlIndicator, RemovingPlaceholder, ViewContext};
use super::composer::{default_options, ComposerTtlButton, DurationOption};
use super::hooks::before_send;
use super::selection::SelectionSlot;
use super::ticker::Ticker;
use crate::host::traits::PluginRegistry;
use crate::ttl::descriptor::EXPIRING_POST_TYPE;

/// Client half of the plugin.
///
/// Owns the selection slot and hands clones of it to the composer button and
/// the before-send hook, which are the only two places that touch it.
pub struct WebappPlugin {
    slot: SelectionSlot,
    context: ViewContext,
    options: Vec<DurationOption>,
}

impl WebappPlugin {
    pub fn new(context: ViewContext) -> Self {
        Self {
            slot: SelectionSlot::new(),
            context,
            options: default_options(),
        }
    }

    /// Replace the composer menu entries.
    pub fn with_options(mut self, options: Vec<DurationOption>) -> Self {
        self.options = options;
        self
    }

    pub fn selection(&self) -> &SelectionSlot {
        &self.slot
    }

    /// Timers behind the post views this plugin registered.
    pub fn ticker(&self) -> &Ticker {
        &self.context.ticker
    }

    /// Register the post views, the composer button and the before-send hook.
    pub fn initialize<R: PluginRegistry>(&self, registry: &mut R) {
        registry.register_post_action_component(Arc::new(PostTtlIndicator::new(
            self.context.clone(),
        )));
        registry.register_post_action_component(Arc::new(RemovingPlaceholder::new(
            self.context.clone(),
        )));
        registry.register_post_type_component(
            EXPIRING_POST_TYPE,
            Arc::new(ExpiringPost::new(self.context.clone())),
        );
        registry.register_post_editor_action_component(Arc::new(ComposerTtlButton::with_options(
            self.slot.clone(),
            self.options.clone(),
        )));

        let slot = self.slot.clone();
        registry
            .register_message_will_be_posted_hook(Arc::new(move |post| before_send(&slot, post)));

        tracing::info!("expiring messages webapp plugin initialized");
    }
}

impl Default for WebappPlugin {
    fn default() -> Self {
        Self::new(ViewContext::default())
    }
}
