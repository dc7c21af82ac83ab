use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file is missing or unreadable, or a value has the wrong type.
    #[error("Failed to load configuration (file or CAMPAIGN__* environment): {0}")]
    LoadError(#[from] config::ConfigError),

    /// Parsed fine but cannot be used, e.g. a pool of size 0.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Failed to initialise logging: {0}")]
    LoggingError(String),
}
