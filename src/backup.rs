//! Schema/data export: serialize table definitions and row data into
//! portable SQL text.
//!
//! The output is a trust boundary. Identifiers and values are
//! interpolated as-is with no type-aware escaping; callers must not feed
//! untrusted data through this path or re-execute the rendering against
//! a hostile schema. Output bytes are part of the format contract:
//! introducing escaping would be a format change, not a fix.

use chrono::Local;

use crate::error::SqlFluentError;
use crate::handle::DatabaseHandle;

/// How the export is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupMode {
    /// Write a `.sql` file with a timestamped header comment block.
    Save,
    /// Render inline HTML-safe text; nothing touches the filesystem.
    Show,
}

/// Options for one backup run.
#[derive(Debug, Clone)]
pub struct BackupOptions {
    /// File name stem; `.sql` is appended. Generated from a timestamp
    /// when absent.
    pub file_name: Option<String>,
    pub mode: BackupMode,
    /// Tables to leave out of the export.
    pub exclude_tables: Vec<String>,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            file_name: None,
            mode: BackupMode::Save,
            exclude_tables: Vec::new(),
        }
    }
}

/// What a backup run produced.
#[derive(Debug, Clone)]
pub struct BackupOutput {
    /// The target file name (written only in `Save` mode).
    pub file_name: String,
    /// The rendered backup text.
    pub contents: String,
}

/// Export every non-excluded table as one DDL statement followed by one
/// INSERT statement per row, sections separated by blank lines.
///
/// # Errors
/// `Unsupported` on engines without table dumps (for a file-based engine,
/// copy the database file directly); otherwise propagates handle errors,
/// and I/O errors when writing the file in `Save` mode.
pub async fn run_backup<H: DatabaseHandle>(
    handle: &mut H,
    options: &BackupOptions,
) -> Result<BackupOutput, SqlFluentError> {
    if !handle.supports_backup() {
        return Err(SqlFluentError::Unsupported(
            "database backup is not available for this driver; copy the database file directly"
                .to_string(),
        ));
    }

    let file_name = match &options.file_name {
        Some(stem) => format!("{stem}.sql"),
        None => format!(
            "SqlFluent-Backup-{}.sql",
            Local::now().format("%d%m%Y%H%M%S")
        ),
    };

    let mut sections = Vec::new();
    for table in handle.list_tables().await? {
        if options.exclude_tables.contains(&table) {
            continue;
        }
        let mut content = Vec::new();
        let definition = handle.table_definition(&table).await?;
        content.push(format!("{definition};\n"));

        let rows = handle
            .execute_select(&format!("SELECT * FROM {table}"), &[])
            .await?;
        for row in &rows.rows {
            if row.values.is_empty() {
                continue;
            }
            let body = row
                .values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("', '");
            content.push(format!("INSERT INTO {table} VALUES ('{body}');"));
        }
        sections.push(content.join("\n"));
    }

    tracing::info!(
        sections = sections.len(),
        file = %file_name,
        "database backup rendered"
    );

    let contents = match options.mode {
        BackupMode::Save => {
            let header = format!(
                "# sql-fluent Database Backup File\n# Backup Date: {}\n# Backup File: {}\n\n\n",
                Local::now().format("%Y-%m-%d %H:%M:%S"),
                file_name
            );
            let contents = format!("{header}{}", sections.join("\n\n"));
            tokio::fs::write(&file_name, &contents).await?;
            contents
        }
        BackupMode::Show => {
            let escaped: Vec<String> = sections.iter().map(|s| html_safe(s)).collect();
            escaped.join("<br><br>")
        }
    };

    Ok(BackupOutput {
        file_name,
        contents,
    })
}

/// Escape HTML metacharacters and convert newlines for inline rendering.
fn html_safe(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('\n', "<br>")
}
