use common::config::{LoggingConfig, StorageConfig};
use config::ConfigError;
use serde::Deserialize;

use crate::layout::PackageLayouts;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub layouts: PackageLayouts,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from `config/config` (or `AICON_CONFIG`) and `AICON__*` variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&common::config::config_path())
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let builder = common::config::builder()?
            .set_default("layouts.evaluation.main_file", "task/main.py")?
            .set_default("layouts.evaluation.setup_file", "task/setup.sh")?
            .set_default("layouts.evaluation.upload_dir", "task")?
            .set_default("layouts.template.main_file", "submission/main.py")?
            .set_default("layouts.template.upload_dir", "submission")?
            .set_default("layouts.submission.main_file", "submission/main.py")?
            .set_default("layouts.submission.upload_dir", "submission")?;

        common::config::with_sources(builder, path)
            .build()?
            .try_deserialize()
    }
}
