//! Migration Manager - the ordered set of registered migrations

use std::sync::Arc;

use super::definitions::Migration;
use crate::config::MigrationConfig;
use crate::error::{OrmError, OrmResult};

/// Holds registered migrations sorted by name
#[derive(Clone)]
pub struct MigrationManager {
    config: MigrationConfig,
    migrations: Vec<Arc<dyn Migration>>,
}

impl MigrationManager {
    /// Create a new migration manager with default configuration
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    /// Create a new migration manager with custom configuration
    pub fn with_config(config: MigrationConfig) -> Self {
        Self {
            config,
            migrations: Vec::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Register a migration, keeping the set sorted by name
    pub fn register(&mut self, migration: Arc<dyn Migration>) -> OrmResult<&mut Self> {
        let name = migration.name().to_string();
        if name.trim().is_empty() {
            return Err(OrmError::Migration("Migration name cannot be empty".to_string()));
        }

        match self
            .migrations
            .binary_search_by(|m| m.name().cmp(name.as_str()))
        {
            Ok(_) => Err(OrmError::Migration(format!(
                "Migration {} is registered twice",
                name
            ))),
            Err(pos) => {
                self.migrations.insert(pos, migration);
                Ok(self)
            }
        }
    }

    /// Register every migration in `migrations`
    pub fn register_all<I>(&mut self, migrations: I) -> OrmResult<&mut Self>
    where
        I: IntoIterator<Item = Arc<dyn Migration>>,
    {
        for migration in migrations {
            self.register(migration)?;
        }
        Ok(self)
    }

    /// All migrations in application order
    pub fn migrations(&self) -> &[Arc<dyn Migration>] {
        &self.migrations
    }

    /// Find a migration by name
    pub fn find(&self, name: &str) -> Option<&Arc<dyn Migration>> {
        self.migrations
            .binary_search_by(|m| m.name().cmp(name))
            .ok()
            .map(|pos| &self.migrations[pos])
    }

    /// Position of `name` in application order
    pub fn position(&self, name: &str) -> OrmResult<usize> {
        self.migrations
            .binary_search_by(|m| m.name().cmp(name))
            .map_err(|_| OrmError::Migration(format!("Migration {} not found", name)))
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }
}

impl Default for MigrationManager {
    fn default() -> Self {
        Self::new()
    }
}
