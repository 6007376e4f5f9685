//! Migration Definitions - Core types and structures for migrations
//!
//! Defines the `Migration` trait every unit implements and the result and
//! status types the runner reports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::query_interface::QueryInterface;
use super::types::DataTypes;
use crate::error::OrmResult;

/// A versioned, reversible schema change
///
/// `name` is the identifier recorded in the meta table; units are applied in
/// ascending name order, so names start with a timestamp.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Unique, sortable identifier
    fn name(&self) -> &str;

    /// Apply the change
    async fn up(&self, query: &dyn QueryInterface, types: &DataTypes) -> OrmResult<()>;

    /// Revert the change
    async fn down(&self, query: &dyn QueryInterface, types: &DataTypes) -> OrmResult<()>;
}

/// Result of running migrations
#[derive(Debug, Serialize)]
pub struct MigrationRunResult {
    /// Number of migrations that were applied
    pub applied_count: usize,
    /// Names of migrations that were applied
    pub applied_migrations: Vec<String>,
    /// Number of migrations that were skipped (already applied)
    pub skipped_count: usize,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Result of rolling back migrations
#[derive(Debug, Serialize)]
pub struct RollbackResult {
    /// Number of migrations that were rolled back
    pub rolled_back_count: usize,
    /// Names of migrations that were rolled back, newest first
    pub rolled_back_migrations: Vec<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

/// Migration direction for execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationDirection {
    /// Apply the migration
    Up,
    /// Rollback the migration
    Down,
}

impl MigrationDirection {
    /// Run `migration` in this direction
    pub async fn run(
        self,
        migration: &dyn Migration,
        query: &dyn QueryInterface,
        types: &DataTypes,
    ) -> OrmResult<()> {
        match self {
            MigrationDirection::Up => migration.up(query, types).await,
            MigrationDirection::Down => migration.down(query, types).await,
        }
    }
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Up => write!(f, "up"),
            MigrationDirection::Down => write!(f, "down"),
        }
    }
}

/// Migration status in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MigrationStatus {
    /// Migration is pending (not yet applied)
    Pending,
    /// Migration has been applied
    Applied,
}

/// Status line for one registered migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationStatusEntry {
    pub name: String,
    pub status: MigrationStatus,
}
