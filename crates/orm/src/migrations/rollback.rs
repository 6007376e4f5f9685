//! Migration Rollback - Handles rolling back applied migrations
//!
//! Reverts migrations newest first by running their `down`. A record is
//! removed from the meta table only after `down` succeeds.

use super::definitions::{MigrationDirection, RollbackResult};
use super::query_interface::{MigrationStorage, QueryInterface};
use super::runner::MigrationRunner;
use crate::error::{OrmError, OrmResult};

/// Extension trait for MigrationRunner to add rollback functionality
#[allow(async_fn_in_trait)]
pub trait MigrationRollback {
    /// Rollback the most recently applied migration
    async fn rollback_last(&self) -> OrmResult<RollbackResult>;

    /// Rollback applied migrations newer than `target`, and `target` itself
    async fn rollback_to(&self, target: &str) -> OrmResult<RollbackResult>;

    /// Rollback a specific migration; it must be the most recent one
    async fn rollback_migration(&self, name: &str) -> OrmResult<()>;

    /// Rollback all applied migrations
    async fn rollback_all(&self) -> OrmResult<RollbackResult>;
}

impl<B> MigrationRollback for MigrationRunner<B>
where
    B: QueryInterface + MigrationStorage,
{
    async fn rollback_last(&self) -> OrmResult<RollbackResult> {
        let start_time = std::time::Instant::now();
        let applied = self.applied_newest_first().await?;

        let mut rolled_back_migrations = Vec::new();
        if let Some(latest) = applied.first() {
            self.revert(latest).await?;
            rolled_back_migrations.push(latest.clone());
        }

        Ok(RollbackResult {
            rolled_back_count: rolled_back_migrations.len(),
            rolled_back_migrations,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    async fn rollback_to(&self, target: &str) -> OrmResult<RollbackResult> {
        let start_time = std::time::Instant::now();
        let applied = self.applied_newest_first().await?;

        if !applied.iter().any(|name| name == target) {
            return Err(OrmError::Migration(format!(
                "Migration {} is not applied",
                target
            )));
        }

        let mut rolled_back_migrations = Vec::new();
        for name in applied.iter().take_while(|name| name.as_str() >= target) {
            self.revert(name).await?;
            rolled_back_migrations.push(name.clone());
        }

        Ok(RollbackResult {
            rolled_back_count: rolled_back_migrations.len(),
            rolled_back_migrations,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }

    async fn rollback_migration(&self, name: &str) -> OrmResult<()> {
        let applied = self.applied_newest_first().await?;

        match applied.first() {
            None => Err(OrmError::Migration(format!("Migration {} is not applied", name))),
            Some(_) if !applied.iter().any(|n| n == name) => {
                Err(OrmError::Migration(format!("Migration {} is not applied", name)))
            }
            Some(most_recent) if most_recent != name => Err(OrmError::Migration(
                "Can only rollback the most recent migration. Use rollback_to for several."
                    .to_string(),
            )),
            Some(most_recent) => self.revert(most_recent).await,
        }
    }

    async fn rollback_all(&self) -> OrmResult<RollbackResult> {
        let start_time = std::time::Instant::now();
        let applied = self.applied_newest_first().await?;

        let mut rolled_back_migrations = Vec::with_capacity(applied.len());
        for name in &applied {
            self.revert(name).await?;
            rolled_back_migrations.push(name.clone());
        }

        Ok(RollbackResult {
            rolled_back_count: rolled_back_migrations.len(),
            rolled_back_migrations,
            execution_time_ms: start_time.elapsed().as_millis(),
        })
    }
}

// Extension methods for MigrationRunner
impl<B> MigrationRunner<B>
where
    B: QueryInterface + MigrationStorage,
{
    /// Applied migration names, most recent first
    async fn applied_newest_first(&self) -> OrmResult<Vec<String>> {
        self.backend().ensure_storage().await?;
        let mut applied = self.backend().executed().await?;
        applied.sort_unstable_by(|a, b| b.cmp(a));
        Ok(applied)
    }

    /// Run `down` for an applied migration and forget it
    async fn revert(&self, name: &str) -> OrmResult<()> {
        let migration = self.manager().find(name).cloned().ok_or_else(|| {
            OrmError::Migration(format!(
                "No registered migration for applied migration: {}",
                name
            ))
        })?;

        self.execute(migration.as_ref(), MigrationDirection::Down).await?;
        self.backend().unlog_migration(name).await?;
        tracing::info!("Reverted {}", name);
        Ok(())
    }
}
