//! WHERE-clause accumulation: operator dispatch, placeholder emission,
//! and bind-value collection.

use super::QueryBuilder;
use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;
use crate::types::SqlValue;
use crate::validate::ensure_column;

/// The logical connector tying a clause to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    And,
    Or,
}

impl Connector {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

/// One rendered clause fragment awaiting placement in the final
/// statement, tagged with its connector. The body already contains
/// placeholder markers, never literal values.
#[derive(Debug, Clone)]
pub(crate) struct WhereClause {
    pub connector: Connector,
    pub body: String,
}

/// The value side of a WHERE comparison: a single bind value for plain
/// operators, a sequence for BETWEEN (exactly two) and IN (one or more).
#[derive(Debug, Clone)]
pub enum ClauseValue {
    One(SqlValue),
    Many(Vec<SqlValue>),
}

impl From<SqlValue> for ClauseValue {
    fn from(value: SqlValue) -> Self {
        ClauseValue::One(value)
    }
}

impl From<Vec<SqlValue>> for ClauseValue {
    fn from(values: Vec<SqlValue>) -> Self {
        ClauseValue::Many(values)
    }
}

impl From<&[SqlValue]> for ClauseValue {
    fn from(values: &[SqlValue]) -> Self {
        ClauseValue::Many(values.to_vec())
    }
}

impl From<i64> for ClauseValue {
    fn from(value: i64) -> Self {
        ClauseValue::One(SqlValue::Int(value))
    }
}

impl From<f64> for ClauseValue {
    fn from(value: f64) -> Self {
        ClauseValue::One(SqlValue::Float(value))
    }
}

impl From<&str> for ClauseValue {
    fn from(value: &str) -> Self {
        ClauseValue::One(SqlValue::Text(value.to_string()))
    }
}

impl From<String> for ClauseValue {
    fn from(value: String) -> Self {
        ClauseValue::One(SqlValue::Text(value))
    }
}

impl From<bool> for ClauseValue {
    fn from(value: bool) -> Self {
        ClauseValue::One(SqlValue::Bool(value))
    }
}

impl<H: DatabaseHandle> QueryBuilder<H> {
    /// Add a WHERE condition joined with AND.
    ///
    /// The operator string selects the clause shape, matched
    /// case-insensitively: `between`/`not between` (two bounds),
    /// `in`/`not in` (non-empty list), anything else as a plain
    /// comparison with a single placeholder.
    ///
    /// A BETWEEN clause with an empty bound is silently dropped, binding
    /// nothing; the drop is logged at WARN level.
    ///
    /// # Errors
    /// `InvalidArgument` for a missing column/operator or a value of the
    /// wrong cardinality; `NotFound` when column validation rejects the
    /// column.
    pub async fn and_where(
        self,
        column: &str,
        value: impl Into<ClauseValue> + Send,
        operator: &str,
    ) -> Result<Self, SqlFluentError> {
        self.add_where(Connector::And, column, value.into(), operator)
            .await
    }

    /// Add a WHERE condition joined with OR. Same shapes as
    /// [`QueryBuilder::and_where`].
    ///
    /// # Errors
    /// Same as [`QueryBuilder::and_where`].
    pub async fn or_where(
        self,
        column: &str,
        value: impl Into<ClauseValue> + Send,
        operator: &str,
    ) -> Result<Self, SqlFluentError> {
        self.add_where(Connector::Or, column, value.into(), operator)
            .await
    }

    /// Append a caller-supplied boolean expression verbatim, joined with
    /// AND. Escape hatch for sub-expression grouping; nothing is
    /// validated and no placeholders are bound.
    #[must_use]
    pub fn and_where_raw(mut self, fragment: &str) -> Self {
        self.state.where_clauses.push(WhereClause {
            connector: Connector::And,
            body: fragment.to_string(),
        });
        self
    }

    /// Append a caller-supplied boolean expression verbatim, joined with
    /// OR.
    #[must_use]
    pub fn or_where_raw(mut self, fragment: &str) -> Self {
        self.state.where_clauses.push(WhereClause {
            connector: Connector::Or,
            body: fragment.to_string(),
        });
        self
    }

    async fn add_where(
        mut self,
        connector: Connector,
        column: &str,
        value: ClauseValue,
        operator: &str,
    ) -> Result<Self, SqlFluentError> {
        if column.is_empty() || operator.trim().is_empty() {
            return Err(SqlFluentError::InvalidArgument(
                "where clause requires a column and an operator".to_string(),
            ));
        }
        ensure_column(&mut self.handle, self.checks, &self.state.table, column).await?;

        // Plain comparisons interpolate the operator exactly as supplied
        // (so callers can pad word operators: `" like "`); only the shape
        // dispatch normalizes it.
        match operator.trim().to_lowercase().as_str() {
            op @ ("between" | "not between") => {
                let bounds = match value {
                    ClauseValue::Many(bounds) if bounds.len() == 2 => bounds,
                    _ => {
                        return Err(SqlFluentError::InvalidArgument(format!(
                            "{op} requires exactly two bound values"
                        )));
                    }
                };
                if bounds.iter().any(SqlValue::is_empty_like) {
                    // An empty bound drops the whole clause rather than
                    // erroring; nothing is appended and nothing binds.
                    tracing::warn!(column, "dropping {op} clause with an empty bound");
                    return Ok(self);
                }
                let keyword = if op == "between" {
                    "BETWEEN"
                } else {
                    "NOT BETWEEN"
                };
                self.state.where_values.extend(bounds);
                self.state.where_clauses.push(WhereClause {
                    connector,
                    body: format!("({column} {keyword} ? AND ?)"),
                });
            }
            op @ ("in" | "not in") => {
                let items = match value {
                    ClauseValue::Many(items) if !items.is_empty() => items,
                    _ => {
                        return Err(SqlFluentError::InvalidArgument(format!(
                            "{op} requires a non-empty value list"
                        )));
                    }
                };
                let keyword = if op == "in" { "IN" } else { "NOT IN" };
                let marks = super::placeholder_list(items.len());
                self.state.where_values.extend(items);
                self.state.where_clauses.push(WhereClause {
                    connector,
                    body: format!("({column} {keyword} ({marks}))"),
                });
            }
            _ => {
                let value = match value {
                    ClauseValue::One(value) => value,
                    ClauseValue::Many(_) => {
                        return Err(SqlFluentError::InvalidArgument(format!(
                            "operator \"{operator}\" takes a single value"
                        )));
                    }
                };
                self.state.where_values.push(value.or_null());
                self.state.where_clauses.push(WhereClause {
                    connector,
                    body: format!("({column}{operator}?)"),
                });
            }
        }
        Ok(self)
    }
}
