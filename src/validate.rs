//! Pre-flight identifier validation against the engine catalog.
//!
//! Checks run at clause-building time, before the statement is ever
//! dispatched. They are skipped unconditionally for engines without a
//! catalog surface (SQLite), and can be switched off per client for
//! engines that have one.

use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;

/// Which identifier checks a client performs, independently switchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    /// Verify referenced tables exist before building a statement.
    pub tables: bool,
    /// Verify referenced columns exist before building a clause.
    pub columns: bool,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            tables: true,
            columns: true,
        }
    }
}

/// Check that exactly one table with this name exists.
///
/// # Errors
/// Returns `NotFound` when the match count is not exactly one.
pub async fn table_exists<H: DatabaseHandle>(
    handle: &mut H,
    table: &str,
) -> Result<(), SqlFluentError> {
    let matches = handle
        .list_tables()
        .await?
        .iter()
        .filter(|name| name.as_str() == table)
        .count();
    if matches != 1 {
        return Err(SqlFluentError::NotFound(format!(
            "table \"{table}\" does not exist"
        )));
    }
    Ok(())
}

/// Check that exactly one column with this name exists on the table.
///
/// # Errors
/// Returns `NotFound` when the match count is not exactly one.
pub async fn column_exists<H: DatabaseHandle>(
    handle: &mut H,
    table: &str,
    column: &str,
) -> Result<(), SqlFluentError> {
    let matches = handle
        .table_columns(table)
        .await?
        .iter()
        .filter(|name| name.as_str() == column)
        .count();
    if matches != 1 {
        return Err(SqlFluentError::NotFound(format!(
            "column \"{column}\" does not exist on table \"{table}\""
        )));
    }
    Ok(())
}

pub(crate) async fn ensure_table<H: DatabaseHandle>(
    handle: &mut H,
    checks: ValidationOptions,
    table: &str,
) -> Result<(), SqlFluentError> {
    if checks.tables && handle.supports_introspection() {
        table_exists(handle, table).await
    } else {
        Ok(())
    }
}

pub(crate) async fn ensure_column<H: DatabaseHandle>(
    handle: &mut H,
    checks: ValidationOptions,
    table: &str,
    column: &str,
) -> Result<(), SqlFluentError> {
    if checks.columns && handle.supports_introspection() {
        column_exists(handle, table, column).await
    } else {
        Ok(())
    }
}
