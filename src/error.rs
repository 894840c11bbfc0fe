use thiserror::Error;

#[cfg(feature = "sqlite")]
use deadpool_sqlite::rusqlite;

/// Unified error type for every fallible operation in the crate.
///
/// Backend and pool errors pass through transparently; the remaining
/// variants carry the failure classes raised by the builder, the
/// validator, and the backup engine themselves.
#[derive(Debug, Error)]
pub enum SqlFluentError {
    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PostgresError(#[from] tokio_postgres::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    PoolErrorPostgres(#[from] deadpool_postgres::PoolError),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    PoolErrorSqlite(#[from] deadpool_sqlite::PoolError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// A validated table or column is absent from the catalog.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed clause input: empty required field, wrong cardinality,
    /// or an unrecognized direction/operator shape.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The action or capability is not available on the active driver.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

#[cfg(feature = "sqlite")]
impl From<deadpool_sqlite::InteractError> for SqlFluentError {
    fn from(err: deadpool_sqlite::InteractError) -> Self {
        SqlFluentError::ExecutionError(format!("SQLite interact error: {err}"))
    }
}
