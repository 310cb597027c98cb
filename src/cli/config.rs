//! Operator configuration file handling
//!
//! Provides default configuration generation and loading for the standalone
//! expiration service. Configuration files are TOML and stored next to the
//! SQLite database by default.
//!
//! The `[plugin]` table mirrors what a chat host would hand the plugin
//! (master switch and allowed durations); the other tables are deployment
//! settings that only the standalone service uses.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use expiring_messages::server::PluginConfiguration;

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Default sweep cadence
const DEFAULT_JOB_INTERVAL: &str = "1m";

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("Failed to write config file '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid job interval '{value}': {source}")]
    Interval {
        value: String,
        source: humantime::DurationError,
    },

    #[error("Config file already exists: {0}")]
    AlreadyExists(PathBuf),
}

/// Standalone service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Plugin settings (what the host admin would configure)
    #[serde(default)]
    pub plugin: PluginConfiguration,

    /// SQLite host database
    pub store: StoreConfig,

    /// Expiration job settings
    #[serde(default)]
    pub job: JobConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database holding posts and plugin KV
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    /// How often expired posts are swept ("1m", "30s", ...)
    #[serde(default = "default_job_interval")]
    pub interval: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_job_interval() -> String {
    DEFAULT_JOB_INTERVAL.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            interval: default_job_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl JobConfig {
    pub fn interval(&self) -> Result<Duration, ConfigError> {
        humantime::parse_duration(&self.interval).map_err(|source| ConfigError::Interval {
            value: self.interval.clone(),
            source,
        })
    }
}

impl OperatorConfig {
    /// Create a new configuration with the given database path
    pub fn new(db_path: PathBuf) -> Self {
        Self {
            plugin: PluginConfiguration::enabled(),
            store: StoreConfig { path: db_path },
            job: JobConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: OperatorConfig =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        // Fail at load time rather than when the job starts
        config.job.interval()?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        write_file(path, &contents)
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(db_path: &Path) -> String {
        format!(
            r#"# Expiring Messages service configuration
#
# [plugin] holds the settings a chat host administrator would normally set
# for the plugin. The remaining tables only matter for the standalone
# service started with `expiring-messages run`.

[plugin]
# Master switch: when false, TTL metadata on posts is left untouched
enabled = true

# Comma separated durations users may choose (<n>m, <n>h or <n>d)
# Leave empty for the default list
allowed_durations = "5m,15m,1h,1d"

[store]
# SQLite database holding posts and the plugin KV namespace
path = "{db_path}"

[job]
# How often expired posts are swept
interval = "{interval}"

[logging]
# Log level: trace, debug, info, warn, error (RUST_LOG takes precedence)
level = "{level}"
"#,
            db_path = db_path.display(),
            interval = DEFAULT_JOB_INTERVAL,
            level = DEFAULT_LOG_LEVEL,
        )
    }

    /// Create and save a default configuration file
    ///
    /// Refuses to overwrite an existing file.
    pub fn create_default(config_path: &Path, db_path: &Path) -> Result<(), ConfigError> {
        if config_path.exists() {
            return Err(ConfigError::AlreadyExists(config_path.to_path_buf()));
        }
        write_file(config_path, &Self::generate_default_toml(db_path))
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), ConfigError> {
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    // Create parent directory if needed
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}

/// Get the default data directory
///
/// - Linux: ~/.local/share/expiring-messages/
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("expiring-messages")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Get the default database path, next to the config
pub fn default_db_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("host.db")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = OperatorConfig::new(PathBuf::from("/data/em/host.db"));

        assert!(config.plugin.enabled);
        assert_eq!(config.job.interval().unwrap(), Duration::from_secs(60));
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = OperatorConfig::new(PathBuf::from("/data/em/host.db"));
        config.plugin.allowed_durations = "1h,2h".to_string();
        config.job.interval = "30s".to_string();
        config.save(&config_path).unwrap();

        let loaded = OperatorConfig::load(&config_path).unwrap();
        assert_eq!(loaded.store.path, PathBuf::from("/data/em/host.db"));
        assert_eq!(loaded.plugin, config.plugin);
        assert_eq!(loaded.job.interval().unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn test_create_default_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let db_path = temp_dir.path().join("host.db");

        OperatorConfig::create_default(&config_path, &db_path).unwrap();

        let config = OperatorConfig::load(&config_path).unwrap();
        assert_eq!(config.store.path, db_path);
        assert_eq!(
            config.plugin.allowed_durations(),
            vec!["5m", "15m", "1h", "1d"]
        );

        assert!(matches!(
            OperatorConfig::create_default(&config_path, &db_path),
            Err(ConfigError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_load_config_with_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        // Write minimal config (only required fields)
        fs::write(&config_path, "[store]\npath = \"/tmp/host.db\"\n").unwrap();

        let config = OperatorConfig::load(&config_path).unwrap();

        assert!(!config.plugin.enabled);
        assert_eq!(config.job.interval, "1m");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_rejects_bad_interval() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[store]\npath = \"/tmp/host.db\"\n[job]\ninterval = \"soon\"\n",
        )
        .unwrap();

        assert!(matches!(
            OperatorConfig::load(&config_path),
            Err(ConfigError::Interval { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = OperatorConfig::load(Path::new("/nonexistent/config.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/config.toml"));
    }

    #[test]
    fn test_default_db_path() {
        assert_eq!(
            default_db_path(Path::new("/data/em/config.toml")),
            PathBuf::from("/data/em/host.db")
        );
    }
}
