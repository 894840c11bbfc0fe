//! Convenient imports for common functionality.

pub use crate::backup::{BackupMode, BackupOptions, BackupOutput};
pub use crate::builder::{Action, ClauseValue, QueryBuilder};
pub use crate::client::DbClient;
pub use crate::error::SqlFluentError;
pub use crate::handle::DatabaseHandle;
pub use crate::pool::{DbPool, PoolConnection};
pub use crate::results::{DbRow, ExecSummary, QueryOutcome, ResultSet};
pub use crate::translation::PlaceholderStyle;
pub use crate::types::{DatabaseType, SqlValue};
pub use crate::validate::ValidationOptions;
