use core_types::CoreError;
use database::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Validation(#[from] CoreError),
}

/// What went wrong, at the granularity the console reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Connection,
    ConstraintViolation,
    NotFound,
    MalformedRow,
    Timeout,
    InvalidInput,
    Database,
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::Repository(err) => match err {
                RepositoryError::Connection(_) => ErrorKind::Connection,
                RepositoryError::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
                RepositoryError::NotFound(_) => ErrorKind::NotFound,
                RepositoryError::MalformedRow(_) => ErrorKind::MalformedRow,
                RepositoryError::Timeout(_) => ErrorKind::Timeout,
                RepositoryError::Database(_) => ErrorKind::Database,
            },
            // Duplicate names are rejected by the application instead of a database constraint.
            ServiceError::Validation(CoreError::DuplicateName { .. }) => ErrorKind::ConstraintViolation,
            ServiceError::Validation(CoreError::InvalidInput(..)) => ErrorKind::InvalidInput,
        }
    }
}
