use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

pub mod config;
pub mod inspect;
pub mod post;
pub mod run;
pub mod version;

#[derive(Parser)]
#[command(name = "expiring-messages")]
#[command(author = "Expiring Messages Project")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Operator CLI for self-deleting chat messages", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the expiration service against the SQLite host
    Run {
        /// Path to config file (default: ~/.local/share/expiring-messages/config.toml)
        #[arg(long)]
        config: Option<String>,
    },

    /// Submit a message through both plugin halves and store it
    Post {
        /// Path to config file (default: ~/.local/share/expiring-messages/config.toml)
        #[arg(long)]
        config: Option<String>,

        /// Message text
        #[arg(long)]
        message: String,

        /// Duration tag picked in the composer (e.g. 5m, 1h, 1d)
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Parse a duration tag and print its length
    Parse {
        /// Duration tag (<n>m, <n>h or <n>d)
        tag: String,
    },

    /// Format a remaining time the way the countdown shows it
    Format {
        /// Remaining milliseconds (negative values clamp to zero)
        #[arg(allow_hyphen_values = true)]
        ms: i64,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Write a commented default configuration
    Init {
        /// Where to write it (default: ~/.local/share/expiring-messages/config.toml)
        #[arg(long)]
        path: Option<String>,
    },
}

pub async fn execute(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Run { config } => run::execute(config).await,
        Commands::Post {
            config,
            message,
            ttl,
        } => post::execute(config, message, ttl).await,
        Commands::Parse { tag } => inspect::parse(&tag),
        Commands::Format { ms } => {
            inspect::format(ms);
            Ok(())
        }
        Commands::Config {
            action: ConfigAction::Init { path },
        } => config_init(path),
        Commands::Version => {
            version::execute();
            Ok(())
        }
    }
}

fn config_init(path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(config::default_config_path);
    let db_path = config::default_db_path(&config_path);

    config::OperatorConfig::create_default(&config_path, &db_path)?;
    println!("Created: {}", config_path.display());
    println!("Database: {}", db_path.display());
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Only the first call installs anything; later calls are no-ops.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
