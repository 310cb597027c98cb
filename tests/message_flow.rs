//! Integration test for the end-to-end life of an expiring message.
//!
//! Tests the complete lifecycle:
//! 1. Pick a duration in the composer
//! 2. Before-send hook tags the outgoing post
//! 3. Server hook validates and stamps `expires_at`
//! 4. Stored post is queued in its minute bucket
//! 5. Views count down, then show the removal placeholder
//! 6. Expiration sweep deletes the post and its queue key

use std::sync::Arc;
use std::time::Duration;

use expiring_messages::host::{HostApi, MockHost, MockRegistry};
use expiring_messages::server::expiration::{delete_expired_posts, queue_key};
use expiring_messages::server::{HookRejection, PluginConfiguration, ServerPlugin};
use expiring_messages::ttl::descriptor::{EXPIRING_POST_TYPE, TTL_PROP};
use expiring_messages::ttl::{Clock, ManualClock, Post, PostId, TtlDescriptor};
use expiring_messages::webapp::components::{
    ExpiringPostView, IndicatorView, PlaceholderView, REMOVING_TEXT,
};
use expiring_messages::webapp::{Rendered, ViewContext, WebappPlugin};
use serde_json::json;

/// Not on a minute boundary, so bucket edges get exercised.
const NOW: i64 = 1_700_000_000_000;

struct Harness {
    clock: ManualClock,
    host: MockHost,
    registry: MockRegistry,
    webapp: WebappPlugin,
    server: ServerPlugin,
}

async fn harness(configuration: PluginConfiguration) -> Harness {
    let clock = ManualClock::new(NOW);
    let host = MockHost::new();
    host.set_configuration(configuration);

    let webapp = WebappPlugin::new(ViewContext::new(Arc::new(clock.clone())));
    let mut registry = MockRegistry::new();
    webapp.initialize(&mut registry);

    let server = ServerPlugin::with_clock(Arc::new(host.clone()), Arc::new(clock.clone()));
    server.on_configuration_change().await.unwrap();

    Harness {
        clock,
        host,
        registry,
        webapp,
        server,
    }
}

impl Harness {
    /// Compose, intercept, validate and store a message the way the host would.
    async fn send(&self, id: &str, message: &str) -> Result<Post, HookRejection> {
        let post = self.registry.run_message_will_be_posted(Post::new(id, message));
        let post = self.server.message_will_be_posted(post)?;
        self.host.insert_post(post.clone());
        self.server.message_has_been_posted(&post).await;
        Ok(post)
    }
}

#[tokio::test]
async fn test_message_expires_end_to_end() {
    let h = harness(PluginConfiguration::enabled()).await;

    let mut composer = h.registry.mount_composer().unwrap();
    composer.select("5m");
    assert_eq!(composer.title(), "TTL: 5 minutes");

    let post = h.send("p1", "self destructing").await.unwrap();

    // Stamped by the server
    let expires_at = NOW + 5 * 60 * 1000;
    assert_eq!(
        post.props[TTL_PROP],
        json!({"enabled": true, "duration": "5m", "expires_at": expires_at})
    );
    assert_eq!(post.post_type, EXPIRING_POST_TYPE);
    assert_eq!(h.host.kv_keys(), vec![queue_key(&post.id, expires_at)]);

    // Selection is single-use
    assert_eq!(h.webapp.selection().pending(), None);
    assert!(composer.sync());
    assert!(!composer.is_active());

    // Views while live
    let body = h.registry.mount_post_body(&post).unwrap();
    assert_eq!(
        body.current(),
        Rendered::ExpiringPost(ExpiringPostView {
            header: Some("🔥 5m 0s".to_string()),
            body: "self destructing".to_string(),
            expired: false,
            urgent: false,
        })
    );
    let actions = h.registry.mount_post_actions(&post);
    assert_eq!(
        actions[0].current(),
        Rendered::Indicator(IndicatorView {
            countdown: Some("05:00".to_string()),
            expired: false,
            urgent: false,
        })
    );
    assert_eq!(actions[1].current(), Rendered::Nothing);

    // Past expiry the placeholder shows up
    h.clock.advance(5 * 60 * 1000 + 1000);
    let actions = h.registry.mount_post_actions(&post);
    assert_eq!(
        actions[1].current(),
        Rendered::Placeholder(PlaceholderView {
            text: REMOVING_TEXT
        })
    );

    // The sweep removes the post and its queue entry
    let report = delete_expired_posts(&h.host, h.clock.now_ms()).await;
    assert_eq!(report.deleted, vec![PostId::from("p1")]);
    assert!(!h.host.has_post(&post.id));
    assert!(h.host.kv_keys().is_empty());
}

#[tokio::test]
async fn test_message_without_selection_is_left_alone() {
    let h = harness(PluginConfiguration::enabled()).await;

    let post = h.send("p1", "plain").await.unwrap();

    assert!(!post.has_ttl_prop());
    assert_eq!(post.post_type, "");
    assert!(h.host.kv_keys().is_empty());
    assert!(h.registry.mount_post_body(&post).is_none());
    for view in h.registry.mount_post_actions(&post) {
        assert_eq!(view.current(), Rendered::Nothing);
        assert!(!view.is_ticking());
    }
}

#[tokio::test]
async fn test_only_next_message_is_tagged() {
    let h = harness(PluginConfiguration::enabled()).await;

    h.webapp.selection().select("1h");
    let first = h.send("p1", "first").await.unwrap();
    let second = h.send("p2", "second").await.unwrap();

    assert!(first.ttl().is_some_and(|ttl| ttl.expires_at.is_some()));
    assert!(!second.has_ttl_prop());
    assert_eq!(h.host.kv_keys().len(), 1);
}

#[tokio::test]
async fn test_disallowed_duration_is_rejected() {
    let h = harness(PluginConfiguration {
        enabled: true,
        allowed_durations: "1h,1d".to_string(),
    })
    .await;

    h.webapp.selection().select("5m");
    let err = h.send("p1", "too short").await.unwrap_err();

    assert_eq!(err, HookRejection::DurationNotAllowed("5m".to_string()));
    assert_eq!(err.to_string(), "TTL duration '5m' is not allowed");
    assert!(!h.host.has_post(&PostId::from("p1")));
    assert!(h.host.kv_keys().is_empty());
}

#[tokio::test]
async fn test_disabled_plugin_passes_posts_through() {
    let h = harness(PluginConfiguration::default()).await;

    h.webapp.selection().select("5m");
    let post = h.send("p1", "unstamped").await.unwrap();

    // Client intent stays, but nothing is stamped or queued
    assert_eq!(post.ttl(), Some(TtlDescriptor::requested("5m")));
    assert_eq!(post.post_type, "");
    assert!(h.host.kv_keys().is_empty());
}

#[tokio::test]
async fn test_edit_restarts_countdown() {
    let h = harness(PluginConfiguration::enabled()).await;

    h.webapp.selection().select("15m");
    let original = h.send("p1", "draft").await.unwrap();

    h.clock.advance(60 * 1000);
    let mut edited = original.clone();
    edited.message = "final".to_string();
    let edited = h
        .server
        .message_will_be_updated(edited, Some(&original))
        .await
        .unwrap();

    let new_expiry = NOW + 60 * 1000 + 15 * 60 * 1000;
    assert_eq!(edited.ttl().unwrap().expires_at, Some(new_expiry));
    assert!(h
        .host
        .kv_keys()
        .contains(&queue_key(&edited.id, new_expiry)));
}

#[tokio::test(start_paused = true)]
async fn test_countdown_ticks_until_expiry() {
    let h = harness(PluginConfiguration::enabled()).await;

    let mut post = Post::new("p1", "ticking");
    post.set_ttl(&TtlDescriptor::requested("1m").with_expires_at(NOW + 2000));

    let mut actions = h.registry.mount_post_actions(&post);
    assert_eq!(h.webapp.ticker().active_timers(), 1);
    let indicator = &mut actions[0];
    assert!(indicator.is_ticking());
    assert_eq!(
        indicator.current(),
        Rendered::Indicator(IndicatorView {
            countdown: Some("00:02".to_string()),
            expired: false,
            urgent: true,
        })
    );

    h.clock.advance(1000);
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(indicator.changed().await);
    assert_eq!(
        indicator.current(),
        Rendered::Indicator(IndicatorView {
            countdown: Some("00:01".to_string()),
            expired: false,
            urgent: true,
        })
    );

    h.clock.advance(1000);
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(indicator.changed().await);
    assert_eq!(
        indicator.current(),
        Rendered::Indicator(IndicatorView {
            countdown: Some("00:00".to_string()),
            expired: true,
            urgent: false,
        })
    );

    // The timer stops once expired
    assert!(!indicator.changed().await);
    assert!(!indicator.is_ticking());
    assert_eq!(
        actions[1].current(),
        Rendered::Placeholder(PlaceholderView {
            text: REMOVING_TEXT
        })
    );
}

#[tokio::test(start_paused = true)]
async fn test_activated_job_sweeps_expired_posts() {
    let h = harness(PluginConfiguration::enabled()).await;
    h.server.on_activate().await.unwrap();
    assert!(h.server.is_active());

    h.webapp.selection().select("5m");
    let post = h.send("p1", "swept").await.unwrap();

    h.clock.advance(5 * 60 * 1000);
    // Let the job's minute ticks fire on paused time.
    for _ in 0..6 {
        if !h.host.has_post(&post.id) {
            break;
        }
        tokio::time::sleep(Duration::from_secs(60)).await;
    }

    assert!(!h.host.has_post(&post.id));
    assert_eq!(h.host.deleted_posts(), vec![post.id.clone()]);

    h.server.on_deactivate().await;
    assert!(!h.server.is_active());
}

#[tokio::test]
async fn test_explicit_opt_out_strips_ttl() {
    let h = harness(PluginConfiguration::enabled()).await;
    h.webapp.selection().select("5m");

    let mut post = Post::new("p1", "keep me");
    post.set_ttl(&TtlDescriptor::disabled());
    let post = h.registry.run_message_will_be_posted(post);

    assert!(!post.has_ttl_prop());
    // The selection survives for the next message
    assert_eq!(h.webapp.selection().pending(), Some("5m".to_string()));

    let stored = h.server.message_will_be_posted(post).unwrap();
    assert!(!stored.has_ttl_prop());
    h.server.message_has_been_posted(&stored).await;
    assert!(h.host.kv_keys().is_empty());
}

#[tokio::test]
async fn test_stale_buckets_are_pruned() {
    let h = harness(PluginConfiguration::enabled()).await;

    // Queued two days ago and never drained
    let stale_post = PostId::from("old");
    h.host
        .kv_set(
            &queue_key(&stale_post, NOW - 2 * 24 * 60 * 60 * 1000),
            stale_post.0.as_bytes(),
        )
        .await
        .unwrap();

    let report = delete_expired_posts(&h.host, NOW).await;

    assert!(report.deleted.is_empty());
    assert_eq!(report.pruned, 1);
    assert!(h.host.kv_keys().is_empty());
}
