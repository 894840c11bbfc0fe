use async_trait::async_trait;

#[cfg(feature = "postgres")]
use deadpool_postgres::{Object as PostgresObject, Pool as DeadpoolPostgresPool};

#[cfg(feature = "sqlite")]
use deadpool_sqlite::{Object as SqliteObject, Pool as DeadpoolSqlitePool};

use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;
use crate::results::ResultSet;
use crate::translation::PlaceholderStyle;
use crate::types::SqlValue;

/// Connection pool for database access.
///
/// This enum wraps the different connection pool types for the supported
/// database engines.
#[derive(Clone, Debug)]
pub enum DbPool {
    /// `PostgreSQL` connection pool
    #[cfg(feature = "postgres")]
    Postgres(DeadpoolPostgresPool),
    /// `SQLite` connection pool
    #[cfg(feature = "sqlite")]
    Sqlite(DeadpoolSqlitePool),
}

impl DbPool {
    /// Check out one connection from the pool.
    ///
    /// Pools hand out connections lazily; the first checkout is what
    /// actually opens a connection to the engine.
    ///
    /// # Errors
    /// Returns a pool error when no connection could be established.
    pub async fn connection(&self) -> Result<PoolConnection, SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            DbPool::Postgres(pool) => {
                let conn: PostgresObject = pool
                    .get()
                    .await
                    .map_err(SqlFluentError::PoolErrorPostgres)?;
                Ok(PoolConnection::Postgres(conn))
            }
            #[cfg(feature = "sqlite")]
            DbPool::Sqlite(pool) => {
                let conn: SqliteObject =
                    pool.get().await.map_err(SqlFluentError::PoolErrorSqlite)?;
                Ok(PoolConnection::Sqlite(conn))
            }
        }
    }
}

/// One checked-out connection, generic over the backing engine.
///
/// A builder owns its connection for the whole chain-then-run sequence, so
/// follow-up calls such as `last_insert_id` observe the same session.
pub enum PoolConnection {
    #[cfg(feature = "postgres")]
    Postgres(PostgresObject),
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteObject),
}

impl std::fmt::Debug for PoolConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            #[cfg(feature = "postgres")]
            Self::Postgres(_) => f.debug_tuple("Postgres").finish(),
            #[cfg(feature = "sqlite")]
            Self::Sqlite(_) => f.debug_tuple("Sqlite").finish(),
        }
    }
}

#[async_trait]
impl DatabaseHandle for PoolConnection {
    fn placeholder_style(&self) -> PlaceholderStyle {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(_) => PlaceholderStyle::Postgres,
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(_) => PlaceholderStyle::Sqlite,
        }
    }

    fn supports_introspection(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(_) => true,
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(_) => false,
        }
    }

    fn supports_backup(&self) -> bool {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(_) => true,
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(_) => false,
        }
    }

    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => crate::postgres::execute_batch(client, sql).await,
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(client) => crate::sqlite::execute_batch(client, sql).await,
        }
    }

    async fn execute_select(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<ResultSet, SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                crate::postgres::execute_select(client, sql, params).await
            }
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(client) => {
                crate::sqlite::execute_select(client, sql, params).await
            }
        }
    }

    async fn execute_dml(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<usize, SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                crate::postgres::execute_dml(client, sql, params).await
            }
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(client) => {
                crate::sqlite::execute_dml(client, sql, params).await
            }
        }
    }

    async fn last_insert_id(&mut self) -> Result<Option<i64>, SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => crate::postgres::last_insert_id(client).await,
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(client) => crate::sqlite::last_insert_id(client).await,
        }
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => crate::postgres::list_tables(client).await,
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(_) => Err(SqlFluentError::Unsupported(
                "catalog introspection is not available for SQLite".to_string(),
            )),
        }
    }

    async fn table_columns(&mut self, table: &str) -> Result<Vec<String>, SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                crate::postgres::table_columns(client, table).await
            }
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(_) => {
                let _ = table;
                Err(SqlFluentError::Unsupported(
                    "catalog introspection is not available for SQLite".to_string(),
                ))
            }
        }
    }

    async fn table_definition(&mut self, table: &str) -> Result<String, SqlFluentError> {
        match self {
            #[cfg(feature = "postgres")]
            PoolConnection::Postgres(client) => {
                crate::postgres::table_definition(client, table).await
            }
            #[cfg(feature = "sqlite")]
            PoolConnection::Sqlite(_) => {
                let _ = table;
                Err(SqlFluentError::Unsupported(
                    "table dumps are not available for SQLite".to_string(),
                ))
            }
        }
    }
}
