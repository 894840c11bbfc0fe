use deadpool_sqlite::rusqlite;
use deadpool_sqlite::{Config as DeadpoolSqliteConfig, Object, Runtime};
use rusqlite::Statement;
use rusqlite::ToSql;
use rusqlite::types::Value;

use crate::client::DbClient;
use crate::error::SqlFluentError;
use crate::pool::DbPool;
use crate::results::ResultSet;
use crate::types::{DatabaseType, SqlValue};
use crate::validate::ValidationOptions;

impl DbClient {
    /// Build a client backed by a `SQLite` database file (or `:memory:`).
    ///
    /// SQLite carries no queryable catalog surface in this crate, so
    /// identifier validation is skipped for it regardless of the client's
    /// validation toggles.
    ///
    /// # Errors
    /// Returns an error when the pool cannot be created or the WAL pragma
    /// cannot be applied.
    pub async fn new_sqlite(db_path: impl Into<String>) -> Result<Self, SqlFluentError> {
        let cfg: DeadpoolSqliteConfig = DeadpoolSqliteConfig::new(db_path.into());

        let pool = cfg.create_pool(Runtime::Tokio1).map_err(|e| {
            SqlFluentError::ConnectionError(format!("Failed to create SQLite pool: {e}"))
        })?;

        // Initialize the database
        {
            let conn = pool
                .get()
                .await
                .map_err(SqlFluentError::PoolErrorSqlite)?;
            conn.interact(|conn| {
                conn.execute_batch(
                    "
                    PRAGMA journal_mode = WAL;
                ",
                )
                .map_err(SqlFluentError::SqliteError)
            })
            .await??;
        }

        Ok(DbClient::from_parts(
            DbPool::Sqlite(pool),
            DatabaseType::Sqlite,
            ValidationOptions::default(),
        ))
    }
}

/// Bind middleware params to `SQLite` types.
pub fn convert_params(params: &[SqlValue]) -> Result<Vec<Value>, SqlFluentError> {
    let mut vec_values = Vec::with_capacity(params.len());
    for p in params {
        let v = match p {
            SqlValue::Int(i) => Value::Integer(*i),
            SqlValue::Float(f) => Value::Real(*f),
            SqlValue::Text(s) => Value::Text(s.to_string()),
            SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
            SqlValue::Timestamp(dt) => {
                let formatted = dt.format("%F %T%.f").to_string();
                Value::Text(formatted)
            }
            SqlValue::Null => Value::Null,
            SqlValue::Json(jsval) => Value::Text(jsval.to_string()),
            SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
        };
        vec_values.push(v);
    }
    Ok(vec_values)
}

fn extract_value(row: &rusqlite::Row, idx: usize) -> Result<SqlValue, SqlFluentError> {
    match row.get_ref(idx) {
        Err(e) => Err(SqlFluentError::SqliteError(e)),
        Ok(rusqlite::types::ValueRef::Null) => Ok(SqlValue::Null),
        Ok(rusqlite::types::ValueRef::Integer(i)) => Ok(SqlValue::Int(i)),
        Ok(rusqlite::types::ValueRef::Real(f)) => Ok(SqlValue::Float(f)),
        Ok(rusqlite::types::ValueRef::Text(bytes)) => {
            let s = String::from_utf8_lossy(bytes).into_owned();
            Ok(SqlValue::Text(s))
        }
        Ok(rusqlite::types::ValueRef::Blob(b)) => Ok(SqlValue::Blob(b.to_vec())),
    }
}

/// Run a prepared SELECT and collect every row into a [`ResultSet`].
///
/// # Errors
/// Returns an error when the statement fails or a value cannot be read.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[Value],
) -> Result<ResultSet, SqlFluentError> {
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|v| v as &dyn ToSql).collect();
    let column_names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();

    let mut result_set = ResultSet::with_capacity(8);
    result_set.set_column_names(std::sync::Arc::new(column_names));

    let mut rows_iter = stmt.query(&param_refs[..])?;
    while let Some(row) = rows_iter.next()? {
        let col_count = result_set
            .column_names()
            .map(|names| names.len())
            .unwrap_or_default();
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(extract_value(row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Execute a batch of statements inside one transaction.
///
/// # Errors
/// Returns an error when any statement in the batch fails.
pub async fn execute_batch(sqlite_client: &Object, sql: &str) -> Result<(), SqlFluentError> {
    let sql_owned = sql.to_owned();

    sqlite_client
        .interact(move |conn| -> rusqlite::Result<()> {
            let tx = conn.transaction()?;
            tx.execute_batch(&sql_owned)?;
            tx.commit()?;
            Ok(())
        })
        .await?
        .map_err(SqlFluentError::SqliteError)
}

/// Execute a single SELECT with parameters.
///
/// # Errors
/// Returns an error when parameter conversion or execution fails.
pub async fn execute_select(
    sqlite_client: &Object,
    sql: &str,
    params: &[SqlValue],
) -> Result<ResultSet, SqlFluentError> {
    let sql_owned = sql.to_owned();
    let params_owned = convert_params(params)?;

    sqlite_client
        .interact(move |conn| -> rusqlite::Result<ResultSet> {
            let mut stmt = conn.prepare(&sql_owned)?;
            build_result_set(&mut stmt, &params_owned).map_err(|e| {
                if let SqlFluentError::SqliteError(sqlite_err) = e {
                    sqlite_err
                } else {
                    rusqlite::Error::InvalidParameterName(format!("{e:?}"))
                }
            })
        })
        .await?
        .map_err(SqlFluentError::SqliteError)
}

/// Execute a single DML statement with parameters, returning rows affected.
///
/// # Errors
/// Returns an error when parameter conversion or execution fails.
pub async fn execute_dml(
    sqlite_client: &Object,
    sql: &str,
    params: &[SqlValue],
) -> Result<usize, SqlFluentError> {
    let sql_owned = sql.to_owned();
    let params_owned = convert_params(params)?;

    sqlite_client
        .interact(move |conn| -> rusqlite::Result<usize> {
            let tx = conn.transaction()?;
            let param_refs: Vec<&dyn ToSql> =
                params_owned.iter().map(|v| v as &dyn ToSql).collect();
            let rows = {
                let mut stmt = tx.prepare(&sql_owned)?;
                stmt.execute(&param_refs[..])?
            };
            tx.commit()?;
            Ok(rows)
        })
        .await?
        .map_err(SqlFluentError::SqliteError)
}

/// The rowid generated by the most recent insert on this connection.
///
/// # Errors
/// Returns an error when the interact call fails.
pub async fn last_insert_id(sqlite_client: &Object) -> Result<Option<i64>, SqlFluentError> {
    let id = sqlite_client
        .interact(|conn| conn.last_insert_rowid())
        .await?;
    Ok((id > 0).then_some(id))
}
