use crate::error::ConfigError;
use crate::settings::{LogLevel, Meta};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global `tracing` subscriber, writing to a daily-rolling file
/// under `meta.log_dir` named after `meta.log_prefix`.
///
/// An explicit `level_override` wins over `RUST_LOG`, which wins over the
/// configured level. Keep the returned guard alive for the life of the
/// process; dropping it flushes buffered lines.
pub fn init_tracing(meta: &Meta, level_override: Option<LogLevel>) -> Result<WorkerGuard, ConfigError> {
    std::fs::create_dir_all(&meta.log_dir).map_err(|e| {
        ConfigError::LoggingError(format!("cannot create {}: {}", meta.log_dir.display(), e))
    })?;

    let appender = tracing_appender::rolling::daily(&meta.log_dir, format!("{}.log", meta.log_prefix));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let directive = filter_directive(
        meta.log_level,
        level_override,
        std::env::var(EnvFilter::DEFAULT_ENV).ok(),
    );
    let filter = EnvFilter::try_new(&directive)
        .unwrap_or_else(|_| EnvFilter::new(meta.log_level.as_directive()));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .try_init()
        .map_err(|e| ConfigError::LoggingError(e.to_string()))?;

    tracing::debug!(dir = %meta.log_dir.display(), prefix = %meta.log_prefix, "File logging initialised.");
    Ok(guard)
}

fn filter_directive(configured: LogLevel, level_override: Option<LogLevel>, rust_log: Option<String>) -> String {
    match (level_override, rust_log) {
        (Some(level), _) => level.as_directive().to_string(),
        (None, Some(env)) if !env.trim().is_empty() => env,
        _ => configured.as_directive().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_rust_log() {
        let directive = filter_directive(LogLevel::Info, Some(LogLevel::Trace), Some("warn".to_string()));
        assert_eq!(directive, "trace");
    }

    #[test]
    fn rust_log_wins_over_config() {
        let directive = filter_directive(LogLevel::Info, None, Some("database=debug".to_string()));
        assert_eq!(directive, "database=debug");
    }

    #[test]
    fn config_level_applies_without_flag_or_env() {
        assert_eq!(filter_directive(LogLevel::Warn, None, None), "warn");
        assert_eq!(filter_directive(LogLevel::Warn, None, Some("  ".to_string())), "warn");
    }
}
