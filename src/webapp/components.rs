//! Post-side views: countdown indicator, removal placeholder, expiring post.
//!
//! Rendering is a pure function of [`ExpiryState`]; the components only
//! bind those functions to the shared [`Ticker`] when the host mounts them,
//! so all views of one post follow a single timer.

use std::sync::Arc;
use std::time::Duration;

use super::ticker::{MountedView, Ticker};
use crate::host::traits::PostComponent;
use crate::ttl::duration::format_compact;
use crate::ttl::{Clock, ExpiryState, Post, SystemClock};

/// Icon shown next to posts with an active TTL.
pub const TTL_ICON: &str = "🔥";

/// Text shown in place of a post whose TTL has run out.
pub const REMOVING_TEXT: &str = "removing...";

/// Output of a mounted view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    Nothing,
    Indicator(IndicatorView),
    Placeholder(PlaceholderView),
    ExpiringPost(ExpiringPostView),
}

/// Flame icon plus an optional `MM:SS` / `H:MM:SS` countdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorView {
    pub countdown: Option<String>,
    pub expired: bool,
    pub urgent: bool,
}

impl IndicatorView {
    pub fn class_name(&self) -> String {
        css_classes("ttl-indicator", self.expired, self.urgent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderView {
    pub text: &'static str,
}

/// Post body with a coarse countdown header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiringPostView {
    /// `None` until the server has stamped an expiry.
    pub header: Option<String>,
    /// The message, or [`REMOVING_TEXT`] once expired.
    pub body: String,
    pub expired: bool,
    pub urgent: bool,
}

impl ExpiringPostView {
    pub fn class_name(&self) -> String {
        css_classes("expiring-post", self.expired, self.urgent)
    }
}

fn css_classes(base: &str, expired: bool, urgent: bool) -> String {
    let mut classes = base.to_string();
    if expired {
        classes.push_str(" expired");
    }
    if urgent {
        classes.push_str(" urgent");
    }
    classes
}

pub fn render_indicator(state: ExpiryState) -> Rendered {
    match state {
        ExpiryState::NotApplicable => Rendered::Nothing,
        ExpiryState::Untimed => Rendered::Indicator(IndicatorView {
            countdown: None,
            expired: false,
            urgent: false,
        }),
        ExpiryState::Countdown(countdown) => Rendered::Indicator(IndicatorView {
            countdown: Some(countdown.label()),
            expired: countdown.is_expired,
            urgent: countdown.is_urgent,
        }),
    }
}

pub fn render_placeholder(state: ExpiryState) -> Rendered {
    if state.is_expired() {
        Rendered::Placeholder(PlaceholderView {
            text: REMOVING_TEXT,
        })
    } else {
        Rendered::Nothing
    }
}

pub fn render_expiring_post(message: &str, state: ExpiryState) -> Rendered {
    let countdown = match state {
        ExpiryState::NotApplicable => return Rendered::Nothing,
        ExpiryState::Untimed => None,
        ExpiryState::Countdown(countdown) => Some(countdown),
    };

    let expired = state.is_expired();
    Rendered::ExpiringPost(ExpiringPostView {
        header: countdown.map(|c| format!("{} {}", TTL_ICON, format_compact(c.remaining_ms))),
        body: if expired {
            REMOVING_TEXT.to_string()
        } else {
            message.to_string()
        },
        expired,
        urgent: state.is_urgent(),
    })
}

/// Timers shared by the post-side components.
#[derive(Clone)]
pub struct ViewContext {
    pub ticker: Ticker,
}

impl ViewContext {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            ticker: Ticker::new(clock),
        }
    }

    /// Re-render every `period` instead of every second.
    pub fn with_period(mut self, period: Duration) -> Self {
        self.ticker = self.ticker.with_period(period);
        self
    }
}

impl Default for ViewContext {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

/// Countdown shown in the post-action slot.
#[derive(Clone, Default)]
pub struct PostTtlIndicator {
    context: ViewContext,
}

impl PostTtlIndicator {
    pub fn new(context: ViewContext) -> Self {
        Self { context }
    }
}

impl PostComponent for PostTtlIndicator {
    fn mount(&self, post: &Post) -> MountedView {
        self.context.ticker.mount(post, render_indicator)
    }
}

/// Renders only once the post has expired.
#[derive(Clone, Default)]
pub struct RemovingPlaceholder {
    context: ViewContext,
}

impl RemovingPlaceholder {
    pub fn new(context: ViewContext) -> Self {
        Self { context }
    }
}

impl PostComponent for RemovingPlaceholder {
    fn mount(&self, post: &Post) -> MountedView {
        self.context.ticker.mount(post, render_placeholder)
    }
}

/// Full renderer for `custom_expiring` posts.
#[derive(Clone, Default)]
pub struct ExpiringPost {
    context: ViewContext,
}

impl ExpiringPost {
    pub fn new(context: ViewContext) -> Self {
        Self { context }
    }
}

impl PostComponent for ExpiringPost {
    fn mount(&self, post: &Post) -> MountedView {
        let message = post.message.clone();
        self.context
            .ticker
            .mount(post, move |state| render_expiring_post(&message, state))
    }
}
