//! Fluent SQL query builder and async execution middleware.
//!
//! Chained calls accumulate clause state into a per-statement
//! [`QueryBuilder`]; [`QueryBuilder::run`] compiles one parameterized
//! statement, dispatches it to the backing engine, and surfaces rows or
//! an execution summary (affected rows, last insert id). A [`backup`]
//! routine exports table definitions and row data as portable SQL text.
//!
//! Engines are reached through the [`DatabaseHandle`] contract; this
//! crate ships PostgreSQL (tokio-postgres + deadpool-postgres) and SQLite
//! (deadpool-sqlite/rusqlite) implementations behind cargo features.
//!
//! ```no_run
//! use sql_fluent::prelude::*;
//!
//! # async fn demo() -> Result<(), SqlFluentError> {
//! let client = DbClient::new_sqlite("app.db").await?;
//!
//! client
//!     .insert("users", &[("name", "alice".into()), ("age", 30i64.into())])
//!     .await?
//!     .run()
//!     .await?;
//!
//! let outcome = client
//!     .select("users", &["id", "name"])
//!     .await?
//!     .and_where("age", 21i64, ">")
//!     .await?
//!     .order_by("id", "desc")
//!     .await?
//!     .limit(10)
//!     .run()
//!     .await?;
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```

pub mod backup;
pub mod builder;
pub mod client;
pub mod error;
pub mod handle;
pub mod pool;
pub mod prelude;
pub mod results;
pub mod translation;
pub mod types;
pub mod validate;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use backup::{BackupMode, BackupOptions, BackupOutput, run_backup};
pub use builder::{Action, ClauseValue, Connector, QueryBuilder};
pub use client::DbClient;
pub use error::SqlFluentError;
pub use handle::DatabaseHandle;
pub use pool::{DbPool, PoolConnection};
pub use results::{DbRow, ExecSummary, QueryOutcome, ResultSet};
pub use translation::PlaceholderStyle;
pub use types::{DatabaseType, SqlValue};
pub use validate::ValidationOptions;
