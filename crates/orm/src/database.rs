//! Database connectivity for the Postgres migration backend
//!
//! Builds the sqlx connection pool the runner executes migrations through.

use std::sync::Arc;
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::error::{OrmError, OrmResult};

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub idle_timeout: Option<u64>,
    pub max_lifetime: Option<u64>,
    pub test_before_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout: 30,
            idle_timeout: Some(600), // 10 minutes
            max_lifetime: Some(1800), // 30 minutes
            test_before_acquire: true,
        }
    }
}

/// Create a database pool with the default configuration
pub async fn create_database_pool(database_url: &str) -> OrmResult<Arc<PgPool>> {
    create_database_pool_with_config(database_url, &PoolConfig::default()).await
}

/// Create a database pool with a custom configuration
pub async fn create_database_pool_with_config(
    database_url: &str,
    config: &PoolConfig,
) -> OrmResult<Arc<PgPool>> {
    tracing::debug!(
        "Creating database pool with config: max={}, min={}, timeout={}s, idle_timeout={:?}s, max_lifetime={:?}s",
        config.max_connections,
        config.min_connections,
        config.acquire_timeout,
        config.idle_timeout,
        config.max_lifetime
    );

    let mut options = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout))
        .test_before_acquire(config.test_before_acquire);

    if let Some(idle_timeout) = config.idle_timeout {
        options = options.idle_timeout(Duration::from_secs(idle_timeout));
    }

    if let Some(max_lifetime) = config.max_lifetime {
        options = options.max_lifetime(Duration::from_secs(max_lifetime));
    }

    let pool = options.connect(database_url).await.map_err(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        OrmError::Connection(format!("Failed to create database pool: {}", e))
    })?;

    tracing::info!(
        "Database pool created with {} max connections",
        config.max_connections
    );
    Ok(Arc::new(pool))
}
