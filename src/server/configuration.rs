//! Plugin settings as configured by the host administrator.

use serde::{Deserialize, Serialize};

/// Allow-list used when none is configured.
pub const DEFAULT_DURATIONS: &str = "5m,15m,1h,1d";

/// Server-side plugin configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginConfiguration {
    /// Master switch; when off, posts pass through the hooks untouched.
    #[serde(default)]
    pub enabled: bool,

    /// Comma separated duration tags users may pick ("5m,15m,1h,1d").
    #[serde(default)]
    pub allowed_durations: String,
}

impl PluginConfiguration {
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            allowed_durations: String::new(),
        }
    }

    /// Configured durations, trimmed, empties dropped.
    ///
    /// An empty setting falls back to [`DEFAULT_DURATIONS`].
    pub fn allowed_durations(&self) -> Vec<String> {
        let durations = if self.allowed_durations.trim().is_empty() {
            DEFAULT_DURATIONS
        } else {
            &self.allowed_durations
        };

        durations
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Whether `duration` is on the allow-list. A list that parses to nothing
    /// (e.g. ",,") allows everything.
    pub fn is_duration_allowed(&self, duration: &str) -> bool {
        let allowed = self.allowed_durations();
        allowed.is_empty() || allowed.iter().any(|a| a == duration)
    }
}
