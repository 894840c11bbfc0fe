use async_trait::async_trait;

use crate::error::SqlFluentError;
use crate::results::ResultSet;
use crate::translation::PlaceholderStyle;
use crate::types::SqlValue;

/// The database-handle contract the builder, validator, and backup engine
/// are written against.
///
/// Production code gets this from [`crate::pool::PoolConnection`]; tests can
/// implement it on a stub to observe exactly which statements reach the
/// engine.
#[async_trait]
pub trait DatabaseHandle: Send {
    /// Placeholder style the engine expects in final SQL text.
    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Whether the engine exposes a catalog the identifier validator can
    /// query. Embedded file-based engines report `false` and validation is
    /// skipped for them unconditionally.
    fn supports_introspection(&self) -> bool;

    /// Whether the engine can serve table dumps for the backup routine.
    fn supports_backup(&self) -> bool;

    /// Executes a batch of SQL statements (no parameters) within a
    /// transaction.
    async fn execute_batch(&mut self, sql: &str) -> Result<(), SqlFluentError>;

    /// Executes a single SELECT statement and returns the result set.
    async fn execute_select(
        &mut self,
        sql: &str,
        params: &[SqlValue],
    ) -> Result<ResultSet, SqlFluentError>;

    /// Executes a single DML statement (INSERT, UPDATE, DELETE, etc.) and
    /// returns the number of rows affected.
    async fn execute_dml(&mut self, sql: &str, params: &[SqlValue])
    -> Result<usize, SqlFluentError>;

    /// The auto-generated identifier from the most recent insert on this
    /// connection, when the engine tracked one.
    async fn last_insert_id(&mut self) -> Result<Option<i64>, SqlFluentError>;

    /// All table names visible to the connection.
    async fn list_tables(&mut self) -> Result<Vec<String>, SqlFluentError>;

    /// The column names of one table, in ordinal position order.
    async fn table_columns(&mut self, table: &str) -> Result<Vec<String>, SqlFluentError>;

    /// DDL text recreating one table's definition.
    async fn table_definition(&mut self, table: &str) -> Result<String, SqlFluentError>;
}
