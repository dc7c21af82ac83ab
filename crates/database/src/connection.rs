use crate::error::RepositoryError;
use configuration::{ConnectionConfig, DatabaseConfig, PoolConfig};
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};
use std::str::FromStr;

/// Establishes the connection pool described by `config`.
///
/// The pool opens all of its connections up front, so an unreachable server
/// or rejected credentials fail here, at startup, rather than on the first
/// menu action. The caller is expected to treat that as fatal.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, RepositoryError> {
    let options = connect_options(&config.connection, &config.pool);
    open_pool(options, &config.pool).await
}

/// Same as [`connect`], but for a `postgres://` URL such as `DATABASE_URL`.
pub async fn connect_url(url: &str, pool: &PoolConfig) -> Result<PgPool, RepositoryError> {
    let options = PgConnectOptions::from_str(url)
        .map_err(RepositoryError::Connection)?
        .application_name(&pool.name);
    open_pool(options, pool).await
}

/// Connection parameters for a single pooled connection.
pub fn connect_options(conn: &ConnectionConfig, pool: &PoolConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&conn.host)
        .port(conn.port)
        .database(&conn.database)
        .username(&conn.user)
        .password(&conn.password)
        .application_name(&pool.name)
}

/// Pool sizing and checkout policy.
pub fn pool_options(pool: &PoolConfig) -> PgPoolOptions {
    let options = PgPoolOptions::new()
        .max_connections(pool.size)
        .min_connections(pool.size)
        .acquire_timeout(pool.acquire_timeout());

    if pool.reset_session {
        options.after_release(|conn, _meta| {
            Box::pin(async move {
                // Keep the connection only if the reset succeeded.
                conn.execute("RESET ALL").await?;
                Ok(true)
            })
        })
    } else {
        options
    }
}

async fn open_pool(options: PgConnectOptions, pool: &PoolConfig) -> Result<PgPool, RepositoryError> {
    tracing::debug!(pool = %pool.name, size = pool.size, "Creating connection pool...");

    match pool_options(pool).connect_with(options).await {
        Ok(db_pool) => {
            tracing::info!(pool = %pool.name, size = pool.size, "Connection pool created.");
            Ok(db_pool)
        }
        Err(e) => {
            let err = RepositoryError::from(e);
            tracing::error!(pool = %pool.name, error = %err, "Problem creating connection pool. Check the [database] settings.");
            Err(match err {
                // A timeout while opening the first connections is still "cannot reach the database".
                RepositoryError::Timeout(what) => RepositoryError::Connection(sqlx::Error::Protocol(format!(
                    "timed out opening the pool ({})",
                    what
                ))),
                other => other,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool_config(size: u32) -> PoolConfig {
        PoolConfig {
            name: "campaign_pool".to_string(),
            size,
            reset_session: true,
            acquire_timeout_secs: 3,
            operation_timeout_secs: 10,
            retry_attempts: 1,
            retry_backoff_ms: 50,
        }
    }

    #[test]
    fn pool_is_fixed_size() {
        let options = pool_options(&pool_config(4));
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 4);
        assert_eq!(options.get_acquire_timeout().as_secs(), 3);
    }

    #[test]
    fn connect_options_carry_the_config() {
        let conn = ConnectionConfig {
            host: "db.internal".to_string(),
            port: 6543,
            database: "campaigns".to_string(),
            user: "campaign_user".to_string(),
            password: "secret".to_string(),
        };
        let options = connect_options(&conn, &pool_config(1));
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 6543);
        assert_eq!(options.get_database(), Some("campaigns"));
        assert_eq!(options.get_username(), "campaign_user");
        assert_eq!(options.get_application_name(), Some("campaign_pool"));
    }

    #[tokio::test]
    async fn malformed_url_is_a_connection_error() {
        let err = connect_url("not a url", &pool_config(1)).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Connection(_)));
    }
}
