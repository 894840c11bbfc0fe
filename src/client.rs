//! The top-level client: engine configuration, pool ownership, and the
//! statement-initiating surface.

use crate::backup::{BackupOptions, BackupOutput, run_backup};
use crate::builder::QueryBuilder;
use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;
use crate::pool::{DbPool, PoolConnection};
use crate::types::{DatabaseType, SqlValue};
use crate::validate::ValidationOptions;

/// A database client owning one connection pool.
///
/// Constructed per engine (`new_postgres`, `new_sqlite`). Every
/// statement-initiating method checks out its own pooled connection and
/// returns an independent [`QueryBuilder`], so a client can be shared
/// freely across tasks.
#[derive(Debug)]
pub struct DbClient {
    pool: DbPool,
    db_type: DatabaseType,
    checks: ValidationOptions,
}

impl DbClient {
    pub(crate) fn from_parts(
        pool: DbPool,
        db_type: DatabaseType,
        checks: ValidationOptions,
    ) -> Self {
        Self {
            pool,
            db_type,
            checks,
        }
    }

    /// The engine this client talks to.
    #[must_use]
    pub fn database_type(&self) -> DatabaseType {
        self.db_type
    }

    /// Toggle pre-flight table existence checks.
    #[must_use]
    pub fn check_tables(mut self, enabled: bool) -> Self {
        self.checks.tables = enabled;
        self
    }

    /// Toggle pre-flight column existence checks.
    #[must_use]
    pub fn check_columns(mut self, enabled: bool) -> Self {
        self.checks.columns = enabled;
        self
    }

    /// Check out one pooled connection, for callers that want direct
    /// [`DatabaseHandle`] access.
    ///
    /// # Errors
    /// Returns a pool error when no connection could be established.
    pub async fn connection(&self) -> Result<PoolConnection, SqlFluentError> {
        self.pool.connection().await
    }

    /// Start a SELECT statement. An empty column list selects `*`.
    ///
    /// # Errors
    /// See [`QueryBuilder::select`].
    pub async fn select(
        &self,
        table: &str,
        columns: &[&str],
    ) -> Result<QueryBuilder<PoolConnection>, SqlFluentError> {
        let conn = self.pool.connection().await?;
        QueryBuilder::select(conn, self.checks, table, columns).await
    }

    /// Start an INSERT with an explicit column list.
    ///
    /// # Errors
    /// See [`QueryBuilder::insert`].
    pub async fn insert(
        &self,
        table: &str,
        data: &[(&str, SqlValue)],
    ) -> Result<QueryBuilder<PoolConnection>, SqlFluentError> {
        let conn = self.pool.connection().await?;
        QueryBuilder::insert(conn, self.checks, table, data).await
    }

    /// Start an INSERT in the column-omitted positional form.
    ///
    /// # Errors
    /// See [`QueryBuilder::insert_values`].
    pub async fn insert_values(
        &self,
        table: &str,
        values: &[SqlValue],
    ) -> Result<QueryBuilder<PoolConnection>, SqlFluentError> {
        let conn = self.pool.connection().await?;
        QueryBuilder::insert_values(conn, self.checks, table, values).await
    }

    /// Start an UPDATE statement.
    ///
    /// # Errors
    /// See [`QueryBuilder::update`].
    pub async fn update(
        &self,
        table: &str,
        data: &[(&str, SqlValue)],
    ) -> Result<QueryBuilder<PoolConnection>, SqlFluentError> {
        let conn = self.pool.connection().await?;
        QueryBuilder::update(conn, self.checks, table, data).await
    }

    /// Start a DELETE statement.
    ///
    /// # Errors
    /// See [`QueryBuilder::delete`].
    pub async fn delete(
        &self,
        table: &str,
    ) -> Result<QueryBuilder<PoolConnection>, SqlFluentError> {
        let conn = self.pool.connection().await?;
        QueryBuilder::delete(conn, self.checks, table).await
    }

    /// Start a raw statement: literal SQL plus bind values, bypassing
    /// clause building entirely.
    ///
    /// # Errors
    /// Returns a pool error when no connection could be established.
    pub async fn raw_query(
        &self,
        sql: &str,
        params: Vec<SqlValue>,
    ) -> Result<QueryBuilder<PoolConnection>, SqlFluentError> {
        let conn = self.pool.connection().await?;
        Ok(QueryBuilder::raw(conn, self.checks, sql, params))
    }

    /// Execute a batch of SQL statements (no parameters) within one
    /// transaction. Intended for DDL and fixtures.
    ///
    /// # Errors
    /// Propagates the first failing statement's error.
    pub async fn execute_batch(&self, sql: &str) -> Result<(), SqlFluentError> {
        let mut conn = self.pool.connection().await?;
        conn.execute_batch(sql).await
    }

    /// Total record count of one table.
    ///
    /// # Errors
    /// `NotFound` when table validation rejects the table; otherwise
    /// propagates execution errors.
    pub async fn table_count(&self, table: &str) -> Result<i64, SqlFluentError> {
        let outcome = self
            .select(table, &["count(*) AS total"])
            .await?
            .run()
            .await?;
        let count = outcome
            .rows()
            .and_then(|rs| rs.rows.first())
            .and_then(|row| row.get("total"))
            .and_then(|value| value.as_int().copied());
        count.ok_or_else(|| {
            SqlFluentError::ExecutionError(format!("count(*) on \"{table}\" returned no rows"))
        })
    }

    /// Refresh planner statistics and run the engine's lightweight
    /// housekeeping statements.
    ///
    /// # Errors
    /// Propagates execution errors from the engine.
    pub async fn maintenance(&self) -> Result<(), SqlFluentError> {
        let statements = match self.db_type {
            #[cfg(feature = "postgres")]
            DatabaseType::Postgres => "ANALYZE;",
            #[cfg(feature = "sqlite")]
            DatabaseType::Sqlite => "PRAGMA optimize;\nANALYZE;",
        };
        self.execute_batch(statements).await
    }

    /// Export the database as SQL text; see [`crate::backup`] for the
    /// format and its trust boundary.
    ///
    /// # Errors
    /// See [`run_backup`].
    pub async fn backup(&self, options: &BackupOptions) -> Result<BackupOutput, SqlFluentError> {
        let mut conn = self.pool.connection().await?;
        run_backup(&mut conn, options).await
    }
}
