use std::error::Error;

use chrono::NaiveDateTime;
use deadpool_postgres::{Config as PgConfig, Object};
use serde_json::Value;
use tokio_postgres::{
    NoTls, Statement,
    types::{IsNull, ToSql, Type, to_sql_checked},
};
use tokio_util::bytes;

use crate::client::DbClient;
use crate::error::SqlFluentError;
use crate::pool::DbPool;
use crate::results::ResultSet;
use crate::types::{DatabaseType, SqlValue};
use crate::validate::ValidationOptions;

impl DbClient {
    /// Build a client backed by a `PostgreSQL` server.
    ///
    /// # Errors
    /// Returns a `ConfigError` when a required field is missing, or a
    /// `ConnectionError` when the pool cannot be created.
    pub async fn new_postgres(pg_config: PgConfig) -> Result<Self, SqlFluentError> {
        // Validate all required config fields are present
        if pg_config.dbname.is_none() {
            return Err(SqlFluentError::ConfigError("dbname is required".to_string()));
        }
        if pg_config.host.is_none() {
            return Err(SqlFluentError::ConfigError("host is required".to_string()));
        }
        if pg_config.port.is_none() {
            return Err(SqlFluentError::ConfigError("port is required".to_string()));
        }
        if pg_config.user.is_none() {
            return Err(SqlFluentError::ConfigError("user is required".to_string()));
        }
        if pg_config.password.is_none() {
            return Err(SqlFluentError::ConfigError("password is required".to_string()));
        }

        let pg_pool = pg_config
            .create_pool(Some(deadpool_postgres::Runtime::Tokio1), NoTls)
            .map_err(|e| {
                SqlFluentError::ConnectionError(format!("Failed to create Postgres pool: {e}"))
            })?;

        Ok(DbClient::from_parts(
            DbPool::Postgres(pg_pool),
            DatabaseType::Postgres,
            ValidationOptions::default(),
        ))
    }
}

/// Container for Postgres parameters with lifetime tracking.
pub struct Params<'a> {
    references: Vec<&'a (dyn ToSql + Sync)>,
}

impl<'a> Params<'a> {
    /// Convert from a slice of [`SqlValue`] to Postgres parameters.
    ///
    /// # Errors
    /// Currently infallible; kept fallible for parity with other backends.
    pub fn convert(params: &'a [SqlValue]) -> Result<Params<'a>, SqlFluentError> {
        let references: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        Ok(Params { references })
    }

    /// Get a reference to the underlying parameter array.
    #[must_use]
    pub fn as_refs(&self) -> &[&'a (dyn ToSql + Sync)] {
        &self.references
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut bytes::BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            SqlValue::Int(i) => (*i).to_sql(ty, out),
            SqlValue::Float(f) => (*f).to_sql(ty, out),
            SqlValue::Text(s) => s.to_sql(ty, out),
            SqlValue::Bool(b) => (*b).to_sql(ty, out),
            SqlValue::Timestamp(dt) => dt.to_sql(ty, out),
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Json(jsval) => jsval.to_sql(ty, out),
            SqlValue::Blob(bytes) => bytes.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        match *ty {
            // Integer types
            Type::INT2 | Type::INT4 | Type::INT8 => true,
            // Floating point types
            Type::FLOAT4 | Type::FLOAT8 => true,
            // Text types
            Type::TEXT | Type::VARCHAR | Type::CHAR | Type::NAME => true,
            // Boolean type
            Type::BOOL => true,
            // Date/time types
            Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => true,
            // JSON types
            Type::JSON | Type::JSONB => true,
            // Binary data
            Type::BYTEA => true,
            _ => false,
        }
    }

    to_sql_checked!();
}

/// Extracts a [`SqlValue`] from a row at the given index.
fn extract_value(row: &tokio_postgres::Row, idx: usize) -> Result<SqlValue, SqlFluentError> {
    let type_info = row.columns()[idx].type_();

    if type_info.name() == "int2" {
        let val: Option<i16> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))))
    } else if type_info.name() == "int4" {
        let val: Option<i32> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, |v| SqlValue::Int(i64::from(v))))
    } else if type_info.name() == "int8" {
        let val: Option<i64> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, SqlValue::Int))
    } else if type_info.name() == "float4" {
        let val: Option<f32> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, |v| SqlValue::Float(f64::from(v))))
    } else if type_info.name() == "float8" {
        let val: Option<f64> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, SqlValue::Float))
    } else if type_info.name() == "bool" {
        let val: Option<bool> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, SqlValue::Bool))
    } else if type_info.name() == "timestamp" || type_info.name() == "timestamptz" {
        let val: Option<NaiveDateTime> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, SqlValue::Timestamp))
    } else if type_info.name() == "json" || type_info.name() == "jsonb" {
        let val: Option<Value> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, SqlValue::Json))
    } else if type_info.name() == "bytea" {
        let val: Option<Vec<u8>> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, SqlValue::Blob))
    } else {
        // Everything else is read back as text
        let val: Option<String> = row.try_get(idx)?;
        Ok(val.map_or(SqlValue::Null, SqlValue::Text))
    }
}

/// Build a result set from a prepared statement inside a transaction.
///
/// # Errors
/// Returns an error when the query fails or a value cannot be read.
pub async fn build_result_set(
    stmt: &Statement,
    params: &[&(dyn ToSql + Sync)],
    transaction: &deadpool_postgres::Transaction<'_>,
) -> Result<ResultSet, SqlFluentError> {
    let rows = transaction.query(stmt, params).await?;

    let column_names: Vec<String> = stmt
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();

    let mut result_set = ResultSet::with_capacity(rows.len());
    result_set.set_column_names(std::sync::Arc::new(column_names));

    for row in rows {
        let col_count = result_set
            .column_names()
            .map(|names| names.len())
            .unwrap_or_default();
        let mut row_values = Vec::with_capacity(col_count);
        for i in 0..col_count {
            row_values.push(extract_value(&row, i)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Execute a batch of SQL statements inside one transaction.
///
/// # Errors
/// Returns an error when any statement in the batch fails.
pub async fn execute_batch(pg_client: &mut Object, sql: &str) -> Result<(), SqlFluentError> {
    let tx = pg_client.transaction().await?;
    tx.batch_execute(sql).await?;
    tx.commit().await?;
    Ok(())
}

/// Execute a single SELECT with parameters.
///
/// # Errors
/// Returns an error when preparation or execution fails.
pub async fn execute_select(
    pg_client: &mut Object,
    sql: &str,
    params: &[SqlValue],
) -> Result<ResultSet, SqlFluentError> {
    let params = Params::convert(params)?;
    let tx = pg_client.transaction().await?;
    let stmt = tx.prepare(sql).await?;
    let result_set = build_result_set(&stmt, params.as_refs(), &tx).await?;
    tx.commit().await?;
    Ok(result_set)
}

/// Execute a single DML statement with parameters, returning rows affected.
///
/// # Errors
/// Returns an error when preparation or execution fails.
pub async fn execute_dml(
    pg_client: &mut Object,
    sql: &str,
    params: &[SqlValue],
) -> Result<usize, SqlFluentError> {
    let params = Params::convert(params)?;
    let tx = pg_client.transaction().await?;
    let stmt = tx.prepare(sql).await?;
    let rows = tx.execute(&stmt, params.as_refs()).await?;
    tx.commit().await?;
    Ok(usize::try_from(rows).unwrap_or(usize::MAX))
}

/// The sequence value from the most recent insert in this session.
///
/// `lastval()` raises when no sequence has fired yet; that case maps to
/// `None` rather than an error.
pub async fn last_insert_id(pg_client: &mut Object) -> Result<Option<i64>, SqlFluentError> {
    match pg_client.query_one("SELECT lastval()", &[]).await {
        Ok(row) => Ok(row.try_get::<_, i64>(0).ok()),
        Err(_) => Ok(None),
    }
}

/// All base tables in the `public` schema.
///
/// # Errors
/// Returns an error when the catalog query fails.
pub async fn list_tables(pg_client: &mut Object) -> Result<Vec<String>, SqlFluentError> {
    let rows = pg_client
        .query(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
            &[],
        )
        .await?;
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        names.push(row.try_get::<_, String>(0)?);
    }
    Ok(names)
}

/// Column names of one table, in ordinal position order.
///
/// # Errors
/// Returns an error when the catalog query fails.
pub async fn table_columns(
    pg_client: &mut Object,
    table: &str,
) -> Result<Vec<String>, SqlFluentError> {
    let rows = pg_client
        .query(
            "SELECT column_name::text FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
            &[&table],
        )
        .await?;
    let mut names = Vec::with_capacity(rows.len());
    for row in rows {
        names.push(row.try_get::<_, String>(0)?);
    }
    Ok(names)
}

/// Synthesize a `CREATE TABLE` statement from the catalog.
///
/// The rendering covers column names, data types, nullability, and
/// defaults; constraints beyond NOT NULL are not reproduced.
///
/// # Errors
/// Returns `NotFound` when the table has no columns in the catalog.
pub async fn table_definition(
    pg_client: &mut Object,
    table: &str,
) -> Result<String, SqlFluentError> {
    let rows = pg_client
        .query(
            "SELECT column_name::text, data_type::text, is_nullable::text, column_default::text \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name = $1 \
             ORDER BY ordinal_position",
            &[&table],
        )
        .await?;

    if rows.is_empty() {
        return Err(SqlFluentError::NotFound(format!(
            "table \"{table}\" does not exist"
        )));
    }

    let mut columns = Vec::with_capacity(rows.len());
    for row in rows {
        let name: String = row.try_get(0)?;
        let data_type: String = row.try_get(1)?;
        let is_nullable: String = row.try_get(2)?;
        let default: Option<String> = row.try_get(3)?;

        let mut line = format!("  {name} {data_type}");
        if is_nullable == "NO" {
            line.push_str(" NOT NULL");
        }
        if let Some(default) = default {
            line.push_str(&format!(" DEFAULT {default}"));
        }
        columns.push(line);
    }

    Ok(format!("CREATE TABLE {table} (\n{}\n)", columns.join(",\n")))
}
