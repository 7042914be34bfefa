use crate::config::LoggingConfig;
use crate::error::{CoreError, Result};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber (local timestamps, target and level shown).
///
/// Meant for the composition root; fails if a subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| CoreError::Logging(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new(config.timestamp_format.clone()))
        .with_target(true)
        .with_level(true)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| CoreError::Logging(e.to_string()))
}
