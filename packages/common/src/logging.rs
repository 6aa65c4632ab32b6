use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Install the global `tracing` subscriber.
///
/// Unknown level strings fall back to `info`. Calling this twice is harmless;
/// the second registration is ignored.
pub fn init(config: &LoggingConfig) {
    let level = LevelFilter::from_str(&config.level).unwrap_or(LevelFilter::INFO);

    let targets = Targets::new()
        .with_target("zip", Level::WARN)
        .with_default(level);

    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).compact())
        .with(targets)
        .try_init();
}
