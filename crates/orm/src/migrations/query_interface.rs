//! Capabilities a migration backend provides
//!
//! `QueryInterface` is what migration units see. `MigrationStorage` is the
//! runner's bookkeeping of applied units.

use async_trait::async_trait;

use super::types::{ColumnDescription, ColumnSpec};
use crate::error::OrmResult;

/// Schema-mutation handle passed to migrations
#[async_trait]
pub trait QueryInterface: Send + Sync {
    /// Alter `column` on `table` to match `spec`
    ///
    /// Implementations apply the change atomically: on error the column keeps
    /// its previous definition.
    async fn change_column(&self, table: &str, column: &str, spec: ColumnSpec) -> OrmResult<()>;

    /// Read the current definition of `column` on `table`
    async fn describe_column(&self, table: &str, column: &str) -> OrmResult<ColumnDescription>;
}

/// Meta table holding the names of applied migrations
#[async_trait]
pub trait MigrationStorage: Send + Sync {
    /// Create the meta table if needed
    async fn ensure_storage(&self) -> OrmResult<()>;

    /// Names of applied migrations in ascending order
    async fn executed(&self) -> OrmResult<Vec<String>>;

    /// Record `name` as applied
    async fn log_migration(&self, name: &str) -> OrmResult<()>;

    /// Forget `name`
    async fn unlog_migration(&self, name: &str) -> OrmResult<()>;
}
