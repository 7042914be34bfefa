use thiserror::Error;

/// Failures that reach the caller.
///
/// Gaps in business data (unparseable lines, unknown aliases, missing
/// reference prices, missing threshold profiles) are never errors; they are
/// carried as statuses and notes on the returned records.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid offer '{alias}': {reason}")]
    InvalidOffer { alias: String, reason: String },

    #[error("logging setup failed: {0}")]
    Logging(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
