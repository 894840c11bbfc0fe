//! Backup engine output format, driven through a stub handle.

use async_trait::async_trait;
use std::sync::Arc;

use sql_fluent::prelude::*;
use sql_fluent::run_backup;

struct DumpHandle {
    tables: Vec<String>,
}

fn result_with(columns: &[&str], rows: &[&[SqlValue]]) -> ResultSet {
    let mut rs = ResultSet::with_capacity(rows.len());
    rs.set_column_names(Arc::new(
        columns.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
    ));
    for row in rows {
        rs.add_row_values(row.to_vec());
    }
    rs
}

#[async_trait]
impl DatabaseHandle for DumpHandle {
    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Sqlite
    }

    fn supports_introspection(&self) -> bool {
        true
    }

    fn supports_backup(&self) -> bool {
        true
    }

    async fn execute_batch(&mut self, _sql: &str) -> Result<(), SqlFluentError> {
        Ok(())
    }

    async fn execute_select(
        &mut self,
        sql: &str,
        _params: &[SqlValue],
    ) -> Result<ResultSet, SqlFluentError> {
        if sql.contains("FROM users") {
            Ok(result_with(
                &["id", "name"],
                &[
                    &[SqlValue::Int(1), SqlValue::Text("alice".into())],
                    &[SqlValue::Int(2), SqlValue::Text("bob <admin>".into())],
                ],
            ))
        } else {
            Ok(result_with(&["id"], &[]))
        }
    }

    async fn execute_dml(
        &mut self,
        _sql: &str,
        _params: &[SqlValue],
    ) -> Result<usize, SqlFluentError> {
        Ok(0)
    }

    async fn last_insert_id(&mut self) -> Result<Option<i64>, SqlFluentError> {
        Ok(None)
    }

    async fn list_tables(&mut self) -> Result<Vec<String>, SqlFluentError> {
        Ok(self.tables.clone())
    }

    async fn table_columns(&mut self, _table: &str) -> Result<Vec<String>, SqlFluentError> {
        Ok(vec![])
    }

    async fn table_definition(&mut self, table: &str) -> Result<String, SqlFluentError> {
        Ok(format!("CREATE TABLE {table} (\n  id bigint NOT NULL\n)"))
    }
}

#[tokio::test]
async fn excluded_tables_are_left_out_of_the_dump() {
    let mut handle = DumpHandle {
        tables: vec!["users".to_string(), "logs".to_string()],
    };
    let dir = tempfile::tempdir().unwrap();
    let stem = dir
        .path()
        .join("dump")
        .to_string_lossy()
        .into_owned();

    let options = BackupOptions {
        file_name: Some(stem.clone()),
        mode: BackupMode::Save,
        exclude_tables: vec!["logs".to_string()],
    };
    let output = run_backup(&mut handle, &options).await.unwrap();

    assert_eq!(output.file_name, format!("{stem}.sql"));
    assert_eq!(output.contents.matches("CREATE TABLE").count(), 1);
    assert!(output.contents.contains("CREATE TABLE users"));
    assert!(!output.contents.contains("logs"));
    assert!(
        output
            .contents
            .contains("INSERT INTO users VALUES ('1', 'alice');")
    );

    // Save mode writes the rendered text to disk verbatim.
    let written = std::fs::read_to_string(output.file_name).unwrap();
    assert_eq!(written, output.contents);
    assert!(written.starts_with("# sql-fluent Database Backup File\n# Backup Date: "));
}

#[tokio::test]
async fn empty_tables_still_contribute_their_ddl() {
    let mut handle = DumpHandle {
        tables: vec!["users".to_string(), "logs".to_string()],
    };
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("all").to_string_lossy().into_owned();

    let options = BackupOptions {
        file_name: Some(stem),
        mode: BackupMode::Save,
        exclude_tables: vec![],
    };
    let output = run_backup(&mut handle, &options).await.unwrap();

    assert_eq!(output.contents.matches("CREATE TABLE").count(), 2);
    assert!(output.contents.contains("CREATE TABLE logs"));
    assert!(!output.contents.contains("INSERT INTO logs"));
}

#[tokio::test]
async fn show_mode_renders_html_safe_text_without_touching_disk() {
    let mut handle = DumpHandle {
        tables: vec!["users".to_string()],
    };
    let options = BackupOptions {
        file_name: Some("never-written".to_string()),
        mode: BackupMode::Show,
        exclude_tables: vec![],
    };
    let output = run_backup(&mut handle, &options).await.unwrap();

    assert!(!std::path::Path::new("never-written.sql").exists());
    // No header comment block in inline mode.
    assert!(!output.contents.contains("Backup Date"));
    assert!(output.contents.contains("<br>"));
    // Values render HTML-escaped.
    assert!(output.contents.contains("bob &lt;admin&gt;"));
    assert!(!output.contents.contains("bob <admin>"));
}

#[tokio::test]
async fn value_rendering_is_plain_quoted_text() {
    let mut handle = DumpHandle {
        tables: vec!["users".to_string()],
    };
    let dir = tempfile::tempdir().unwrap();
    let stem = dir.path().join("values").to_string_lossy().into_owned();
    let options = BackupOptions {
        file_name: Some(stem),
        mode: BackupMode::Save,
        exclude_tables: vec![],
    };
    let output = run_backup(&mut handle, &options).await.unwrap();

    // Values are concatenated as quoted text with no escaping; this is
    // the documented trust boundary of the export format.
    assert!(
        output
            .contents
            .contains("INSERT INTO users VALUES ('2', 'bob <admin>');")
    );
}
