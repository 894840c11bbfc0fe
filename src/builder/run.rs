//! Statement dispatch: compile the accumulated state, apply the
//! backend's placeholder style, execute, and normalize the result shape.

use super::{Action, QueryBuilder};
use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;
use crate::results::{ExecSummary, QueryOutcome};
use crate::translation::finalize_placeholders;
use crate::types::SqlValue;

impl<H: DatabaseHandle> QueryBuilder<H> {
    /// Compile and execute the statement, consuming the builder.
    ///
    /// Clause order in the compiled text is fixed: base statement, WHERE,
    /// GROUP BY, HAVING (only with GROUP BY), ORDER BY, LIMIT. Reads
    /// return [`QueryOutcome::Rows`]; a single-row SELECT still returns a
    /// one-element result set. Writes return [`QueryOutcome::Affected`],
    /// with `last_insert_id` populated by inserts only. Raw statements
    /// pick their path from the first token of the SQL text, compared to
    /// `select` case-insensitively.
    ///
    /// # Errors
    /// Propagates execution errors from the database handle unchanged.
    /// There is no retry; one failure aborts the statement.
    pub async fn run(mut self) -> Result<QueryOutcome, SqlFluentError> {
        let compiled = self.to_sql();
        let sql = finalize_placeholders(&compiled, self.handle.placeholder_style());
        tracing::debug!(action = ?self.state.action, sql = %sql, "dispatching statement");

        match self.state.action {
            Action::Select => {
                let result_set = self
                    .handle
                    .execute_select(&sql, &self.state.where_values)
                    .await?;
                Ok(QueryOutcome::Rows(result_set))
            }
            Action::Insert => {
                let rows_affected = self.handle.execute_dml(&sql, &self.state.values).await?;
                let last_insert_id = self.handle.last_insert_id().await?;
                Ok(QueryOutcome::Affected(ExecSummary {
                    rows_affected,
                    last_insert_id,
                }))
            }
            Action::Update => {
                // The one case where both vectors are used: SET values
                // bind before WHERE values.
                let params: Vec<SqlValue> = self
                    .state
                    .values
                    .iter()
                    .chain(self.state.where_values.iter())
                    .cloned()
                    .collect();
                let rows_affected = self.handle.execute_dml(&sql, &params).await?;
                Ok(QueryOutcome::Affected(ExecSummary {
                    rows_affected,
                    last_insert_id: None,
                }))
            }
            Action::Delete => {
                let rows_affected = self
                    .handle
                    .execute_dml(&sql, &self.state.where_values)
                    .await?;
                Ok(QueryOutcome::Affected(ExecSummary {
                    rows_affected,
                    last_insert_id: None,
                }))
            }
            Action::Raw => {
                let is_select = sql
                    .split_whitespace()
                    .next()
                    .is_some_and(|token| token.eq_ignore_ascii_case("select"));
                if is_select {
                    let result_set = self
                        .handle
                        .execute_select(&sql, &self.state.values)
                        .await?;
                    Ok(QueryOutcome::Rows(result_set))
                } else {
                    let rows_affected =
                        self.handle.execute_dml(&sql, &self.state.values).await?;
                    Ok(QueryOutcome::Affected(ExecSummary {
                        rows_affected,
                        last_insert_id: None,
                    }))
                }
            }
        }
    }
}
