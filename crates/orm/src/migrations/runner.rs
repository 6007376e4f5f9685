//! Migration Runner - Executes migrations against a backend
//!
//! Applies pending migrations one at a time in name order. A migration is
//! logged in the meta table only after its `up` succeeds, and the first
//! failure stops the run.

use std::collections::HashSet;
use std::sync::Arc;

use super::definitions::{
    Migration, MigrationDirection, MigrationRunResult, MigrationStatus, MigrationStatusEntry,
};
use super::manager::MigrationManager;
use super::query_interface::{MigrationStorage, QueryInterface};
use super::types::DataTypes;
use crate::error::{OrmError, OrmResult};

/// Migration runner that executes migrations against a backend
pub struct MigrationRunner<B> {
    manager: MigrationManager,
    backend: B,
    types: DataTypes,
}

impl<B> MigrationRunner<B>
where
    B: QueryInterface + MigrationStorage,
{
    /// Create a new migration runner
    pub fn new(manager: MigrationManager, backend: B) -> Self {
        Self {
            manager,
            backend,
            types: DataTypes::new(),
        }
    }

    /// Get the migration manager
    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> OrmResult<MigrationRunResult> {
        self.run_pending(None).await
    }

    /// Run pending migrations up to and including `target`
    pub async fn run_to(&self, target: &str) -> OrmResult<MigrationRunResult> {
        self.manager.position(target)?;
        self.run_pending(Some(target)).await
    }

    /// Run a specific migration by name
    pub async fn run_migration(&self, name: &str) -> OrmResult<()> {
        let migration = self
            .manager
            .find(name)
            .ok_or_else(|| OrmError::Migration(format!("Migration {} not found", name)))?
            .clone();

        self.backend.ensure_storage().await?;
        if self.executed_set().await?.contains(name) {
            return Err(OrmError::Migration(format!(
                "Migration {} is already applied",
                name
            )));
        }

        self.apply(&migration).await
    }

    /// Registered migrations not yet applied, in application order
    pub async fn pending(&self) -> OrmResult<Vec<Arc<dyn Migration>>> {
        self.backend.ensure_storage().await?;
        let executed = self.executed_set().await?;

        Ok(self
            .manager
            .migrations()
            .iter()
            .filter(|m| !executed.contains(m.name()))
            .cloned()
            .collect())
    }

    /// Status of every registered migration
    pub async fn status(&self) -> OrmResult<Vec<MigrationStatusEntry>> {
        self.backend.ensure_storage().await?;
        let executed = self.executed_set().await?;

        Ok(self
            .manager
            .migrations()
            .iter()
            .map(|m| MigrationStatusEntry {
                name: m.name().to_string(),
                status: if executed.contains(m.name()) {
                    MigrationStatus::Applied
                } else {
                    MigrationStatus::Pending
                },
            })
            .collect())
    }

    async fn run_pending(&self, target: Option<&str>) -> OrmResult<MigrationRunResult> {
        let start_time = std::time::Instant::now();

        self.backend.ensure_storage().await?;
        let executed = self.executed_set().await?;

        let pending: Vec<_> = self
            .manager
            .migrations()
            .iter()
            .filter(|m| !executed.contains(m.name()))
            .filter(|m| target.map_or(true, |t| m.name() <= t))
            .cloned()
            .collect();

        if pending.is_empty() {
            tracing::info!("No pending migrations");
        }

        // Meta rows without a registered unit are not counted as skipped
        let skipped_count = self
            .manager
            .migrations()
            .iter()
            .filter(|m| executed.contains(m.name()))
            .count();

        let mut applied_migrations = Vec::with_capacity(pending.len());
        for migration in &pending {
            self.apply(migration).await?;
            applied_migrations.push(migration.name().to_string());
        }

        Ok(MigrationRunResult {
            applied_count: applied_migrations.len(),
            applied_migrations,
            skipped_count,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    /// Apply one migration and record it
    async fn apply(&self, migration: &Arc<dyn Migration>) -> OrmResult<()> {
        self.execute(migration.as_ref(), MigrationDirection::Up).await?;
        self.backend.log_migration(migration.name()).await?;
        tracing::info!("Migrated {}", migration.name());
        Ok(())
    }

    /// Run `migration` in `direction`, wrapping any failure with its name
    pub(crate) async fn execute(
        &self,
        migration: &dyn Migration,
        direction: MigrationDirection,
    ) -> OrmResult<()> {
        tracing::info!("Running {} ({})", migration.name(), direction);

        direction
            .run(migration, &self.backend, &self.types)
            .await
            .map_err(|e| {
                tracing::error!("Migration {} ({}) failed: {}", migration.name(), direction, e);
                OrmError::MigrationFailed {
                    migration: migration.name().to_string(),
                    source: Box::new(e),
                }
            })
    }

    pub(crate) async fn executed_set(&self) -> OrmResult<HashSet<String>> {
        Ok(self.backend.executed().await?.into_iter().collect())
    }
}
