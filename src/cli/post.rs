use super::init_logging;
use super::run::load_or_create;
use expiring_messages::host::SqliteHost;
use expiring_messages::server::{PluginConfiguration, ServerPlugin};
use expiring_messages::ttl::Post;
use expiring_messages::webapp::{before_send, SelectionSlot};
use std::path::Path;
use std::sync::Arc;

/// Submit a message through both plugin halves
///
/// The composer selection (`--ttl`) is attached by the client hook, then the
/// server hook validates and stamps it. Accepted posts are stored and, if they
/// expire, queued for the running service to delete.
pub async fn execute(
    config_path: Option<String>,
    message: String,
    ttl: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let (config, _) = load_or_create(config_path)?;
    init_logging(&config.logging.level);

    let post = submit(&config.store.path, config.plugin.clone(), message, ttl).await?;

    println!("Posted {}", post.id);
    match post.ttl().and_then(|ttl| ttl.expires_at.map(|at| (ttl.duration, at))) {
        Some((duration, expires_at)) => {
            println!("Expires in {} (at {} ms)", duration, expires_at);
        }
        None => println!("No expiry"),
    }
    Ok(())
}

/// Run a new message through the before-send and server hooks and store it.
pub async fn submit(
    db_path: &Path,
    configuration: PluginConfiguration,
    message: String,
    ttl: Option<String>,
) -> Result<Post, Box<dyn std::error::Error>> {
    let host = SqliteHost::open(db_path, configuration).await?;
    let plugin = ServerPlugin::new(Arc::new(host.clone()));
    plugin.on_configuration_change().await?;

    let slot = SelectionSlot::new();
    if let Some(ttl) = ttl {
        slot.select(ttl);
    }

    let post = Post::new(uuid::Uuid::new_v4().to_string(), message);
    let post = before_send(&slot, post);
    let post = plugin.message_will_be_posted(post)?;

    host.save_post(&post).await?;
    plugin.message_has_been_posted(&post).await;
    host.close().await;

    Ok(post)
}

#[cfg(test)]
mod tests {
    use super::*;
    use expiring_messages::host::HostApi;
    use expiring_messages::ttl::descriptor::EXPIRING_POST_TYPE;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_submit_with_ttl_is_stamped_and_queued() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("host.db");

        let post = submit(
            &db_path,
            PluginConfiguration::enabled(),
            "boom".to_string(),
            Some("5m".to_string()),
        )
        .await
        .unwrap();

        let ttl = post.ttl().unwrap();
        assert!(ttl.enabled);
        assert_eq!(ttl.duration, "5m");
        assert!(ttl.expires_at.is_some());
        assert_eq!(post.post_type, EXPIRING_POST_TYPE);

        let host = SqliteHost::open(&db_path, PluginConfiguration::enabled())
            .await
            .unwrap();
        assert_eq!(host.get_post(&post.id).await.unwrap(), post);
        let keys = host.kv_list(0, 10).await.unwrap();
        assert_eq!(keys.len(), 1);
        assert!(keys[0].ends_with(&post.id.0));
    }

    #[tokio::test]
    async fn test_submit_without_ttl() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("host.db");

        let post = submit(&db_path, PluginConfiguration::enabled(), "hi".to_string(), None)
            .await
            .unwrap();

        assert!(!post.has_ttl_prop());
        let host = SqliteHost::open(&db_path, PluginConfiguration::enabled())
            .await
            .unwrap();
        assert!(host.kv_list(0, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_rejects_disallowed_duration() {
        let temp_dir = TempDir::new().unwrap();
        let configuration = PluginConfiguration {
            enabled: true,
            allowed_durations: "1h".to_string(),
        };

        let err = submit(
            &temp_dir.path().join("host.db"),
            configuration,
            "nope".to_string(),
            Some("5m".to_string()),
        )
        .await
        .unwrap_err();

        assert_eq!(err.to_string(), "TTL duration '5m' is not allowed");
    }
}
