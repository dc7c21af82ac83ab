use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod settings;
pub mod telemetry;

// Re-export the core types to provide a clean public API.
pub use settings::{Config, ConnectionConfig, DatabaseConfig, LogLevel, Meta, PoolConfig};
pub use telemetry::init_tracing;
pub use tracing_appender::non_blocking::WorkerGuard;

/// Prefix for environment variables that override file settings,
/// e.g. `CAMPAIGN__DATABASE__POOL__SIZE=4`.
pub const ENV_PREFIX: &str = "CAMPAIGN";

/// Loads the configuration from `path`, then applies environment overrides.
///
/// The result is validated before it is returned, so callers can hand it
/// straight to the connection pool.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path))
        .add_source(environment())
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

/// Parses configuration from TOML text without touching the environment.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [meta]
        log_prefix = "campaign_app"

        [database.connection]
        host = "localhost"
        database = "campaigns"
        user = "campaign_user"
        password = "secret"

        [database.pool]
        name = "campaign_pool"
        size = 3
        reset_session = false
    "#;

    #[test]
    fn sample_config_loads_with_defaults() {
        let config = load_config_from_str(SAMPLE).unwrap();
        assert_eq!(config.meta.log_prefix, "campaign_app");
        assert_eq!(config.meta.log_level, LogLevel::Info);
        assert_eq!(config.meta.log_dir, std::path::PathBuf::from("logs"));
        assert_eq!(config.database.connection.port, 5432);
        assert_eq!(config.database.pool.size, 3);
        assert!(!config.database.pool.reset_session);
        assert_eq!(config.database.pool.acquire_timeout().as_secs(), 5);
        assert_eq!(config.database.pool.retry_attempts, 2);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let toml = SAMPLE.replace("size = 3", "size = 0");
        let err = load_config_from_str(&toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn retry_attempts_are_bounded() {
        let at_limit = SAMPLE.replace("size = 3", "size = 3\nretry_attempts = 10");
        assert_eq!(load_config_from_str(&at_limit).unwrap().database.pool.retry_attempts, 10);

        let too_many = SAMPLE.replace("size = 3", "size = 3\nretry_attempts = 25");
        match load_config_from_str(&too_many) {
            Err(ConfigError::ValidationError(msg)) => assert!(msg.contains("retry_attempts"), "{}", msg),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_section_is_a_load_error() {
        let err = load_config_from_str("[meta]\nlog_prefix = \"x\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn log_level_parses_lowercase() {
        let toml = SAMPLE.replace(
            "log_prefix = \"campaign_app\"",
            "log_prefix = \"campaign_app\"\nlog_level = \"debug\"",
        );
        let config = load_config_from_str(&toml).unwrap();
        assert_eq!(config.meta.log_level.as_directive(), "debug");
    }

    #[test]
    fn password_is_redacted_in_debug_output() {
        let config = load_config_from_str(SAMPLE).unwrap();
        let rendered = format!("{:?}", config.database.connection);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("campaign_user"));
    }
}
