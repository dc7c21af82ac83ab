use sqlx::error::ErrorKind;
use thiserror::Error;

/// PostgreSQL `query_canceled`, raised when `statement_timeout` fires.
const QUERY_CANCELED: &str = "57014";

#[derive(Error, Debug)]
pub enum RepositoryError {
    /// The database is unreachable, refused the credentials, or dropped the connection.
    #[error("Failed to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    /// Duplicate key, dangling foreign key, or a NOT NULL / CHECK failure.
    #[error("The database rejected the change: {0}")]
    ConstraintViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// The result columns do not match what the mapping expects.
    #[error("Malformed row: {0}")]
    MalformedRow(String),

    #[error("Timed out during {0}")]
    Timeout(String),

    /// Anything the categories above do not cover, such as SQL syntax errors.
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

impl RepositoryError {
    /// Whether the failed operation may succeed if simply tried again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepositoryError::Connection(_))
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => {
                RepositoryError::Timeout("wait for a pooled connection".to_string())
            }
            sqlx::Error::RowNotFound => RepositoryError::NotFound("no matching row".to_string()),
            sqlx::Error::ColumnNotFound(column) => {
                RepositoryError::MalformedRow(format!("column '{}' is missing from the result", column))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => RepositoryError::MalformedRow(
                format!("column index {} is out of bounds for a row of {} columns", index, len),
            ),
            sqlx::Error::ColumnDecode { index, source } => {
                RepositoryError::MalformedRow(format!("column {} could not be decoded: {}", index, source))
            }
            sqlx::Error::Decode(source) => RepositoryError::MalformedRow(source.to_string()),
            sqlx::Error::TypeNotFound { type_name } => {
                RepositoryError::MalformedRow(format!("unknown column type '{}'", type_name))
            }
            sqlx::Error::Database(db_err) => classify_database_error(db_err),
            err @ (sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::Configuration(_)
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed) => RepositoryError::Connection(err),
            other => RepositoryError::Database(other),
        }
    }
}

fn classify_database_error(db_err: Box<dyn sqlx::error::DatabaseError>) -> RepositoryError {
    let code = db_err.code().map(|c| c.into_owned());
    match code.as_deref() {
        Some(QUERY_CANCELED) => {
            return RepositoryError::Timeout(format!("statement execution ({})", db_err.message()));
        }
        // Class 08 is connection exceptions, 28 is bad credentials, 3D000 an unknown database.
        Some(c) if c.starts_with("08") || c.starts_with("28") || c == "3D000" => {
            return RepositoryError::Connection(sqlx::Error::Database(db_err));
        }
        _ => {}
    }

    match db_err.kind() {
        ErrorKind::UniqueViolation
        | ErrorKind::ForeignKeyViolation
        | ErrorKind::NotNullViolation
        | ErrorKind::CheckViolation => {
            let detail = match db_err.constraint() {
                Some(constraint) => format!("{} ({})", db_err.message(), constraint),
                None => db_err.message().to_string(),
            };
            RepositoryError::ConstraintViolation(detail)
        }
        _ => RepositoryError::Database(sqlx::Error::Database(db_err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_timeout_is_a_timeout() {
        let err = RepositoryError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepositoryError::Timeout(_)));
        assert!(!err.is_retryable());
    }

    #[test]
    fn missing_column_is_a_malformed_row() {
        let err = RepositoryError::from(sqlx::Error::ColumnNotFound("budget".to_string()));
        match err {
            RepositoryError::MalformedRow(msg) => assert!(msg.contains("budget")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn closed_pool_is_a_retryable_connection_failure() {
        let err = RepositoryError::from(sqlx::Error::PoolClosed);
        assert!(matches!(err, RepositoryError::Connection(_)));
        assert!(err.is_retryable());
    }

    #[test]
    fn io_error_is_a_connection_failure() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = RepositoryError::from(sqlx::Error::Io(io));
        assert!(matches!(err, RepositoryError::Connection(_)));
    }

    #[test]
    fn row_not_found_is_not_found() {
        let err = RepositoryError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::NotFound(_)));
    }
}
