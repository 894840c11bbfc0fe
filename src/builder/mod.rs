//! The clause-accumulation state machine and SQL compiler.
//!
//! Every statement starts from an initiating constructor (`select`,
//! `insert`, `update`, `delete`, `raw`) that produces a fresh builder
//! owning its database handle. Chained clause calls accumulate into that
//! builder's state, and [`QueryBuilder::run`] consumes the builder,
//! compiles a single parameterized statement, and dispatches it. Because
//! each statement gets an independent value, there is no cross-statement
//! state to reset and concurrent chains cannot interfere.

mod conditions;
mod run;
#[cfg(test)]
mod tests;

pub use conditions::{ClauseValue, Connector};
pub(crate) use conditions::WhereClause;

use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;
use crate::translation::substitute_placeholders;
use crate::types::SqlValue;
use crate::validate::{ValidationOptions, ensure_column, ensure_table};

/// Which compilation and execution path a builder follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Select,
    Insert,
    Update,
    Delete,
    Raw,
}

/// The single-statement working state.
///
/// `values` holds bind values for INSERT column values or UPDATE SET
/// values, in the order the columns were supplied. `where_values` holds
/// the bind values for the placeholders inside `where_clauses`, in
/// clause order. The final statement is always filled left to right by
/// `values` then `where_values`.
#[derive(Debug, Clone)]
pub(crate) struct BuilderState {
    pub action: Action,
    pub table: String,
    pub base_sql: String,
    pub values: Vec<SqlValue>,
    pub where_clauses: Vec<WhereClause>,
    pub where_values: Vec<SqlValue>,
    pub group_by: Option<String>,
    pub having: Option<String>,
    pub order_by: Vec<String>,
    pub limit: Option<(u64, u64)>,
}

impl BuilderState {
    fn new(action: Action, table: &str, base_sql: String) -> Self {
        Self {
            action,
            table: table.to_string(),
            base_sql,
            values: Vec::new(),
            where_clauses: Vec::new(),
            where_values: Vec::new(),
            group_by: None,
            having: None,
            order_by: Vec::new(),
            limit: None,
        }
    }
}

/// Fluent single-statement builder over a database handle.
///
/// ```no_run
/// # use sql_fluent::prelude::*;
/// # async fn demo(client: &DbClient) -> Result<(), SqlFluentError> {
/// let outcome = client
///     .select("users", &["id", "name"])
///     .await?
///     .and_where("age", 21i64, ">")
///     .await?
///     .order_by("id", "desc")
///     .await?
///     .limit(10)
///     .run()
///     .await?;
/// # let _ = outcome;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct QueryBuilder<H> {
    pub(crate) handle: H,
    pub(crate) checks: ValidationOptions,
    pub(crate) state: BuilderState,
}

impl<H: DatabaseHandle> QueryBuilder<H> {
    /// Start a SELECT statement. An empty column list selects `*`.
    ///
    /// The base fragment is compiled immediately, so the table and
    /// columns must be known at call time.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty table name; `NotFound` when table
    /// validation is active and the table is absent.
    pub async fn select(
        handle: H,
        checks: ValidationOptions,
        table: &str,
        columns: &[&str],
    ) -> Result<Self, SqlFluentError> {
        let mut handle = handle;
        require_table_name(table)?;
        ensure_table(&mut handle, checks, table).await?;
        let columns = if columns.is_empty() {
            "*".to_string()
        } else {
            columns.join(",")
        };
        Ok(Self {
            handle,
            checks,
            state: BuilderState::new(Action::Select, table, format!("SELECT {columns} FROM {table}")),
        })
    }

    /// Start an INSERT statement with an explicit column list.
    ///
    /// `data` is an ordered column-to-value mapping; placeholders are
    /// bound in exactly this order. Empty values are stored as NULL.
    ///
    /// # Errors
    /// `InvalidArgument` when `data` is empty or the table name is
    /// missing; `NotFound` when table validation rejects the table.
    pub async fn insert(
        handle: H,
        checks: ValidationOptions,
        table: &str,
        data: &[(&str, SqlValue)],
    ) -> Result<Self, SqlFluentError> {
        let mut handle = handle;
        require_table_name(table)?;
        ensure_table(&mut handle, checks, table).await?;
        if data.is_empty() {
            return Err(SqlFluentError::InvalidArgument(
                "insert requires a non-empty data map".to_string(),
            ));
        }
        let keys: Vec<&str> = data.iter().map(|(key, _)| *key).collect();
        let marks = placeholder_list(data.len());
        let mut state = BuilderState::new(
            Action::Insert,
            table,
            format!("INSERT INTO {table} ({}) VALUES ({marks})", keys.join(",")),
        );
        state.values = data.iter().map(|(_, value)| value.clone().or_null()).collect();
        Ok(Self {
            handle,
            checks,
            state,
        })
    }

    /// Start an INSERT in the column-omitted positional form:
    /// `INSERT INTO t VALUES (?,?)`.
    ///
    /// Values must cover every column in table order; this is the
    /// compatibility mode for schemas addressed positionally (e.g. a
    /// leading auto-increment slot passed as NULL).
    ///
    /// # Errors
    /// `InvalidArgument` when `values` is empty or the table name is
    /// missing; `NotFound` when table validation rejects the table.
    pub async fn insert_values(
        handle: H,
        checks: ValidationOptions,
        table: &str,
        values: &[SqlValue],
    ) -> Result<Self, SqlFluentError> {
        let mut handle = handle;
        require_table_name(table)?;
        ensure_table(&mut handle, checks, table).await?;
        if values.is_empty() {
            return Err(SqlFluentError::InvalidArgument(
                "insert requires a non-empty value list".to_string(),
            ));
        }
        let marks = placeholder_list(values.len());
        let mut state = BuilderState::new(
            Action::Insert,
            table,
            format!("INSERT INTO {table} VALUES ({marks})"),
        );
        state.values = values.iter().map(|value| value.clone().or_null()).collect();
        Ok(Self {
            handle,
            checks,
            state,
        })
    }

    /// Start an UPDATE statement.
    ///
    /// `data` is an ordered column-to-value mapping rendered as `col=?`
    /// fragments; empty values are stored as NULL.
    ///
    /// # Errors
    /// `InvalidArgument` when `data` is empty or the table name is
    /// missing; `NotFound` when table validation rejects the table.
    pub async fn update(
        handle: H,
        checks: ValidationOptions,
        table: &str,
        data: &[(&str, SqlValue)],
    ) -> Result<Self, SqlFluentError> {
        let mut handle = handle;
        require_table_name(table)?;
        ensure_table(&mut handle, checks, table).await?;
        if data.is_empty() {
            return Err(SqlFluentError::InvalidArgument(
                "update requires a non-empty data map".to_string(),
            ));
        }
        let assignments: Vec<String> = data.iter().map(|(key, _)| format!("{key}=?")).collect();
        let mut state = BuilderState::new(
            Action::Update,
            table,
            format!("UPDATE {table} SET {}", assignments.join(",")),
        );
        state.values = data.iter().map(|(_, value)| value.clone().or_null()).collect();
        Ok(Self {
            handle,
            checks,
            state,
        })
    }

    /// Start a DELETE statement.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty table name; `NotFound` when table
    /// validation rejects the table.
    pub async fn delete(
        handle: H,
        checks: ValidationOptions,
        table: &str,
    ) -> Result<Self, SqlFluentError> {
        let mut handle = handle;
        require_table_name(table)?;
        ensure_table(&mut handle, checks, table).await?;
        Ok(Self {
            handle,
            checks,
            state: BuilderState::new(Action::Delete, table, format!("DELETE FROM {table}")),
        })
    }

    /// Start a raw statement: literal SQL text plus its bind values,
    /// bypassing all clause building.
    pub fn raw(handle: H, checks: ValidationOptions, sql: &str, params: Vec<SqlValue>) -> Self {
        let mut state = BuilderState::new(Action::Raw, "", sql.to_string());
        state.values = params;
        Self {
            handle,
            checks,
            state,
        }
    }

    /// Set the GROUP BY column.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty column; `NotFound` when column
    /// validation rejects it.
    pub async fn group_by(mut self, column: &str) -> Result<Self, SqlFluentError> {
        if column.is_empty() {
            return Err(SqlFluentError::InvalidArgument(
                "group by requires a column name".to_string(),
            ));
        }
        ensure_column(&mut self.handle, self.checks, &self.state.table, column).await?;
        self.state.group_by = Some(column.to_string());
        Ok(self)
    }

    /// Set the HAVING expression, stored verbatim (the caller is
    /// responsible for literal safety). Only emitted when a GROUP BY is
    /// also set.
    ///
    /// # Errors
    /// `InvalidArgument` for an empty expression.
    pub fn having(mut self, value: &str) -> Result<Self, SqlFluentError> {
        if value.is_empty() {
            return Err(SqlFluentError::InvalidArgument(
                "having requires an expression".to_string(),
            ));
        }
        self.state.having = Some(value.to_string());
        Ok(self)
    }

    /// Append an ORDER BY term.
    ///
    /// A column containing `RAND` (any case) with an empty direction is
    /// treated as a raw randomizing expression and appended verbatim.
    /// Otherwise the direction must be `ASC` or `DESC` (case-insensitive).
    ///
    /// # Errors
    /// `InvalidArgument` for an empty column or unrecognized direction;
    /// `NotFound` when column validation rejects the column.
    pub async fn order_by(mut self, column: &str, direction: &str) -> Result<Self, SqlFluentError> {
        if direction.trim().is_empty() && column.to_uppercase().contains("RAND") {
            self.state.order_by.push(column.to_string());
            return Ok(self);
        }
        let direction = direction.trim();
        if column.is_empty()
            || !(direction.eq_ignore_ascii_case("asc") || direction.eq_ignore_ascii_case("desc"))
        {
            return Err(SqlFluentError::InvalidArgument(
                "order by requires a column name and an ASC/DESC direction".to_string(),
            ));
        }
        ensure_column(&mut self.handle, self.checks, &self.state.table, column).await?;
        self.state
            .order_by
            .push(format!("{column} {}", direction.to_uppercase()));
        Ok(self)
    }

    /// Limit the statement to the first `count` rows.
    #[must_use]
    pub fn limit(mut self, count: u64) -> Self {
        self.state.limit = Some((0, count));
        self
    }

    /// Limit the statement to `count` rows starting at `offset`.
    #[must_use]
    pub fn limit_offset(mut self, offset: u64, count: u64) -> Self {
        self.state.limit = Some((offset, count));
        self
    }

    /// The action this builder compiles to.
    #[must_use]
    pub fn action(&self) -> Action {
        self.state.action
    }

    /// The target table (empty for raw statements).
    #[must_use]
    pub fn table(&self) -> &str {
        &self.state.table
    }

    /// Compile the accumulated state into one statement with neutral `?`
    /// placeholders. The backend-specific placeholder style is applied at
    /// dispatch time.
    #[must_use]
    pub fn to_sql(&self) -> String {
        let mut sql = self.state.base_sql.clone();
        if !self.state.where_clauses.is_empty() {
            sql.push_str(" WHERE ");
            for (idx, clause) in self.state.where_clauses.iter().enumerate() {
                if idx == 0 {
                    // The first clause never needs a boolean connector.
                    sql.push_str(&clause.body);
                } else {
                    sql.push(' ');
                    sql.push_str(clause.connector.as_str());
                    sql.push(' ');
                    sql.push_str(&clause.body);
                }
            }
        }
        if let Some(group_by) = &self.state.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
            if let Some(having) = &self.state.having {
                sql.push_str(" HAVING ");
                sql.push_str(having);
            }
        }
        if !self.state.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.state.order_by.join(","));
        }
        if let Some((offset, count)) = self.state.limit {
            sql.push_str(&format!(" LIMIT {count}"));
            if offset > 0 {
                sql.push_str(&format!(" OFFSET {offset}"));
            }
        }
        sql
    }

    /// The bind values for the compiled statement, in placeholder order:
    /// `values` then `where_values` for UPDATE, `values` alone for INSERT
    /// and raw statements, `where_values` alone for SELECT and DELETE.
    #[must_use]
    pub fn bind_params(&self) -> Vec<SqlValue> {
        match self.state.action {
            Action::Select | Action::Delete => self.state.where_values.clone(),
            Action::Insert | Action::Raw => self.state.values.clone(),
            Action::Update => self
                .state
                .values
                .iter()
                .chain(self.state.where_values.iter())
                .cloned()
                .collect(),
        }
    }

    /// Human-readable rendering of the compiled statement with
    /// placeholders replaced by their literal values.
    ///
    /// Diagnostics only: the rendering performs no escaping and must not
    /// be re-executed.
    #[must_use]
    pub fn preview(&self) -> String {
        if self.state.action == Action::Raw {
            return self.state.base_sql.clone();
        }
        substitute_placeholders(&self.to_sql(), &self.bind_params())
    }
}

fn require_table_name(table: &str) -> Result<(), SqlFluentError> {
    if table.is_empty() {
        return Err(SqlFluentError::InvalidArgument(
            "a table name is required".to_string(),
        ));
    }
    Ok(())
}

fn placeholder_list(count: usize) -> String {
    vec!["?"; count].join(",")
}
