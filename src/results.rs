use std::sync::Arc;

use crate::types::SqlValue;

/// A single row from a query result.
///
/// Column names are shared across all rows of a result set through an
/// `Arc`, so each row only owns its values.
#[derive(Debug, Clone)]
pub struct DbRow {
    /// The column names for this row (shared across the result set)
    pub column_names: Arc<Vec<String>>,
    /// The values for this row
    pub values: Vec<SqlValue>,
}

impl DbRow {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, values: Vec<SqlValue>) -> Self {
        Self {
            column_names,
            values,
        }
    }

    /// Get the index of a column by name.
    #[must_use]
    pub fn column_index(&self, column_name: &str) -> Option<usize> {
        self.column_names.iter().position(|col| col == column_name)
    }

    /// Get a value from the row by column name.
    #[must_use]
    pub fn get(&self, column_name: &str) -> Option<&SqlValue> {
        self.column_index(column_name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Get a value from the row by column index.
    #[must_use]
    pub fn get_by_index(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }
}

/// The rows returned by a read statement, plus the row count the driver
/// reported for it.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub rows: Vec<DbRow>,
    /// The number of rows the statement touched
    pub rows_affected: usize,
    /// Column names shared by all rows
    column_names: Option<Arc<Vec<String>>>,
}

impl ResultSet {
    /// Create a new result set with a known row capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            rows: Vec::with_capacity(capacity),
            rows_affected: 0,
            column_names: None,
        }
    }

    /// Set the column names shared by all rows of this result set.
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set.
    #[must_use]
    pub fn column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Append a row built from the shared column names.
    ///
    /// A no-op when `set_column_names` has not been called yet.
    pub fn add_row_values(&mut self, values: Vec<SqlValue>) {
        if let Some(column_names) = &self.column_names {
            self.rows.push(DbRow::new(column_names.clone(), values));
            self.rows_affected += 1;
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Post-execution metadata for a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecSummary {
    /// Rows the statement touched
    pub rows_affected: usize,
    /// Auto-generated identifier, when the insert produced one
    pub last_insert_id: Option<i64>,
}

/// What a statement produced once dispatched: rows for reads, an
/// execution summary for writes.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// Result of a SELECT (or a raw statement that reads)
    Rows(ResultSet),
    /// Result of an INSERT/UPDATE/DELETE (or a raw statement that writes)
    Affected(ExecSummary),
}

impl QueryOutcome {
    /// The rows, when this outcome carries any.
    #[must_use]
    pub fn rows(&self) -> Option<&ResultSet> {
        match self {
            QueryOutcome::Rows(rs) => Some(rs),
            QueryOutcome::Affected(_) => None,
        }
    }

    /// Consume the outcome and take its rows.
    #[must_use]
    pub fn into_rows(self) -> Option<ResultSet> {
        match self {
            QueryOutcome::Rows(rs) => Some(rs),
            QueryOutcome::Affected(_) => None,
        }
    }

    /// Rows touched, for either outcome shape.
    #[must_use]
    pub fn rows_affected(&self) -> usize {
        match self {
            QueryOutcome::Rows(rs) => rs.rows_affected,
            QueryOutcome::Affected(summary) => summary.rows_affected,
        }
    }

    /// The auto-generated identifier, populated by inserts only.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        match self {
            QueryOutcome::Rows(_) => None,
            QueryOutcome::Affected(summary) => summary.last_insert_id,
        }
    }
}
