use super::config::{default_config_path, default_db_path, OperatorConfig};
use super::init_logging;
use expiring_messages::host::SqliteHost;
use expiring_messages::server::ServerPlugin;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Run the expiration service
///
/// Opens the SQLite host named in the configuration, activates the server
/// plugin and keeps its expiration job sweeping until Ctrl-C.
///
/// ## Configuration Loading
///
/// 1. `--config` flag if provided
/// 2. Default config at `~/.local/share/expiring-messages/config.toml`
///
/// If the config file doesn't exist, a default one is generated with the
/// database next to it.
pub async fn execute(config_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🚀 Starting expiring messages service...");
    println!();

    let (config, config_path) = load_or_create(config_path)?;
    init_logging(&config.logging.level);

    println!("Config: {}", config_path.display());
    println!("Store: {}", config.store.path.display());
    println!("Sweep interval: {}", config.job.interval);
    println!();
    println!("Press Ctrl-C to stop.");

    serve(&config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
        }
    })
    .await?;

    println!("👋 Stopped.");
    Ok(())
}

/// Activate the plugin against the configured store and run until
/// `shutdown` resolves.
pub async fn serve(
    config: &OperatorConfig,
    shutdown: impl Future<Output = ()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let host = SqliteHost::open(&config.store.path, config.plugin.clone()).await?;
    let plugin =
        ServerPlugin::new(Arc::new(host.clone())).with_job_interval(config.job.interval()?);

    plugin.on_activate().await?;
    info!(store = %config.store.path.display(), "expiration service running");

    shutdown.await;

    plugin.on_deactivate().await;
    host.close().await;
    info!("expiration service stopped");
    Ok(())
}

/// Load the configuration at `config_path` (or the default location),
/// writing a default file first if none exists.
pub fn load_or_create(
    config_path: Option<String>,
) -> Result<(OperatorConfig, PathBuf), Box<dyn std::error::Error>> {
    let config_path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(default_config_path);

    if !config_path.exists() {
        println!("📝 No config file found. Creating default configuration...");
        create_default(&config_path)?;
        println!("   Created: {}", config_path.display());
    }

    Ok((OperatorConfig::load(&config_path)?, config_path))
}

fn create_default(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    OperatorConfig::create_default(config_path, &default_db_path(config_path))?;
    Ok(())
}
