//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use pt_core::{AggregationConfig, DEFAULT_GAP_THRESHOLD_MS, UserId, ValidationError};
use pt_db::DEFAULT_RETENTION_DAYS;
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file.
    pub database_path: PathBuf,

    /// User that pulses are stored and queried for.
    pub user_id: String,

    /// Maximum gap between pulses that still counts as work.
    pub gap_threshold_ms: i64,

    /// Days of pulses kept by `pt prune` and the in-memory store.
    pub retention_days: i64,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_path", &self.database_path)
            .field("user_id", &self.user_id)
            .field("gap_threshold_ms", &self.gap_threshold_ms)
            .field("retention_days", &self.retention_days)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: data_dir.join("pt.db"),
            user_id: "local".to_string(),
            gap_threshold_ms: DEFAULT_GAP_THRESHOLD_MS,
            retention_days: DEFAULT_RETENTION_DAYS,
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (PT_*)
        figment = figment.merge(Env::prefixed("PT_"));

        figment.extract()
    }

    /// The configured user, or `user_override` when given.
    pub fn user(&self, user_override: Option<&str>) -> Result<UserId, ValidationError> {
        UserId::new(user_override.unwrap_or(&self.user_id))
    }

    /// Aggregation settings derived from this config.
    pub const fn aggregation(&self) -> AggregationConfig {
        AggregationConfig {
            gap_threshold_ms: self.gap_threshold_ms,
        }
    }
}

/// Returns the platform-specific config directory for pt.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("pt"))
}

/// Returns the platform-specific data directory for pt.
///
/// On Linux: `~/.local/share/pt`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("pt"))
}
