//! Migration engine configuration
//!
//! Values come from defaults, then environment variables, then whatever the
//! caller sets explicitly (the CLI applies its flags last).

use std::env;

use crate::database::PoolConfig;
use crate::error::OrmError;

/// Meta table Sequelize created in existing deployments
pub const DEFAULT_MIGRATIONS_TABLE: &str = "SequelizeMeta";

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub const MIGRATIONS_TABLE_ENV: &str = "NMS_MIGRATIONS_TABLE";
pub const MAX_CONNECTIONS_ENV: &str = "NMS_DB_MAX_CONNECTIONS";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {field}")]
    MissingValue { field: String },

    #[error("Invalid value '{value}' for {field}: expected {expected}")]
    InvalidValue {
        field: String,
        value: String,
        expected: String,
    },
}

impl From<ConfigError> for OrmError {
    fn from(err: ConfigError) -> Self {
        OrmError::Configuration(err.to_string())
    }
}

/// Configuration for the migration system
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Table name for tracking applied migrations
    pub migrations_table: String,
    /// Connection string, required only by the Postgres backend
    pub database_url: Option<String>,
    /// Pool settings for the Postgres backend
    pub pool: PoolConfig,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_table: DEFAULT_MIGRATIONS_TABLE.to_string(),
            database_url: None,
            pool: PoolConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Load configuration from environment variables on top of the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            config.database_url = Some(url);
        }

        if let Some(table) = lookup(MIGRATIONS_TABLE_ENV).filter(|v| !v.trim().is_empty()) {
            config.migrations_table = table;
        }

        if let Some(raw) = lookup(MAX_CONNECTIONS_ENV) {
            config.pool.max_connections =
                raw.trim()
                    .parse::<u32>()
                    .map_err(|_| ConfigError::InvalidValue {
                        field: MAX_CONNECTIONS_ENV.to_string(),
                        value: raw.clone(),
                        expected: "a positive integer".to_string(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the meta table name
    pub fn with_migrations_table(mut self, table: impl Into<String>) -> Self {
        self.migrations_table = table.into();
        self
    }

    /// Set the database URL
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// The database URL, or an error naming the variable to set
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingValue {
                field: DATABASE_URL_ENV.to_string(),
            })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.migrations_table.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "migrations_table".to_string(),
                value: self.migrations_table.clone(),
                expected: "a non-empty table name".to_string(),
            });
        }

        if self.pool.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_connections".to_string(),
                value: "0".to_string(),
                expected: "at least 1".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = MigrationConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.migrations_table, "SequelizeMeta");
        assert!(config.database_url.is_none());
        assert_eq!(config.pool.max_connections, 10);
        assert!(config.require_database_url().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = MigrationConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://nms@localhost/nms"),
            ("NMS_MIGRATIONS_TABLE", "nms_migrations"),
            ("NMS_DB_MAX_CONNECTIONS", "2"),
        ]))
        .unwrap();

        assert_eq!(config.require_database_url().unwrap(), "postgres://nms@localhost/nms");
        assert_eq!(config.migrations_table, "nms_migrations");
        assert_eq!(config.pool.max_connections, 2);
    }

    #[test]
    fn test_invalid_max_connections() {
        let err = MigrationConfig::from_lookup(lookup_from(&[("NMS_DB_MAX_CONNECTIONS", "many")]))
            .unwrap_err();
        assert!(err.to_string().contains("NMS_DB_MAX_CONNECTIONS"));

        let err = MigrationConfig::from_lookup(lookup_from(&[("NMS_DB_MAX_CONNECTIONS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
