use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variable naming the config file (without extension).
pub const CONFIG_PATH_ENV: &str = "AICON_CONFIG";

/// Prefix of environment overrides, e.g. `AICON__STORAGE__ROOT`.
pub const ENV_PREFIX: &str = "AICON";

/// Start a config builder carrying the shared defaults.
///
/// Callers add their own defaults, then finish with [`with_sources`].
pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("storage.root", "data/archives")?
        .set_default("storage.max_archive_size", default_max_archive_size() as i64)?
        .set_default("logging.level", default_log_level())
}

/// Config file named by `AICON_CONFIG`, or `config/config`.
pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/config".to_string())
}

/// Layer the config file and environment overrides on top of `builder`.
/// A missing file is not an error.
pub fn with_sources(
    builder: ConfigBuilder<DefaultState>,
    config_path: &str,
) -> ConfigBuilder<DefaultState> {
    builder
        .add_source(File::with_name(config_path).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
}

/// Archive storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Directory holding the content-addressed archive blobs. Default: "data/archives".
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    /// Largest archive accepted by the store, in bytes. Default: 64 MiB.
    #[serde(default = "default_max_archive_size")]
    pub max_archive_size: u64,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("data/archives")
}
fn default_max_archive_size() -> u64 {
    64 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            max_archive_size: default_max_archive_size(),
        }
    }
}

/// Log output configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Maximum level emitted ("error", "warn", "info", "debug", "trace"). Default: "info".
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
