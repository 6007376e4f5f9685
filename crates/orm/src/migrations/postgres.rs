//! Postgres backend for migrations
//!
//! Runs schema changes through an sqlx pool. Postgres DDL is transactional, so
//! each `change_column` runs in its own transaction and either fully applies or
//! leaves the column untouched.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use super::query_interface::{MigrationStorage, QueryInterface};
use super::schema_builder::{self, SchemaBuilder};
use super::types::{ColumnDescription, ColumnSpec, DataType, DefaultValue};
use crate::config::MigrationConfig;
use crate::database::create_database_pool_with_config;
use crate::error::{OrmError, OrmResult};

/// Postgres implementation of `QueryInterface` and `MigrationStorage`
#[derive(Clone)]
pub struct PgQueryInterface {
    pool: Arc<PgPool>,
    migrations_table: String,
}

impl PgQueryInterface {
    /// Create a backend on an existing pool
    pub fn new(pool: Arc<PgPool>, migrations_table: impl Into<String>) -> Self {
        Self {
            pool,
            migrations_table: migrations_table.into(),
        }
    }

    /// Connect using the URL and pool settings in `config`
    pub async fn connect(config: &MigrationConfig) -> OrmResult<Self> {
        let url = config.require_database_url()?;
        let pool = create_database_pool_with_config(url, &config.pool).await?;
        Ok(Self::new(pool, config.migrations_table.clone()))
    }

    /// Get the database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn migrations_table(&self) -> &str {
        &self.migrations_table
    }

    async fn execute_in_transaction(&self, statements: Vec<String>) -> OrmResult<()> {
        let mut transaction = self.pool.begin().await.map_err(|e| {
            OrmError::Connection(format!("Failed to start transaction: {}", e))
        })?;

        for statement in &statements {
            tracing::debug!("Executing: {}", statement);
            // Dropping the transaction on error rolls it back
            sqlx::query(statement).execute(&mut *transaction).await?;
        }

        transaction.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl QueryInterface for PgQueryInterface {
    async fn change_column(&self, table: &str, column: &str, spec: ColumnSpec) -> OrmResult<()> {
        let statements = SchemaBuilder::new().change_column(table, column, &spec).to_sql();
        self.execute_in_transaction(statements).await
    }

    async fn describe_column(&self, table: &str, column: &str) -> OrmResult<ColumnDescription> {
        let row = sqlx::query(schema_builder::describe_column_sql())
            .bind(table)
            .bind(column)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or_else(|| {
                OrmError::Schema(format!("Column {}.{} does not exist", table, column))
            })?;

        let is_nullable: String = row.try_get("is_nullable")?;
        let column_default: Option<String> = row.try_get("column_default")?;
        let data_type: String = row.try_get("data_type")?;
        let max_length: Option<i32> = row.try_get("max_length")?;

        let data_type = DataType::from_information_schema(&data_type, max_length).ok_or_else(|| {
            OrmError::Schema(format!(
                "Column {}.{} has unsupported type {}",
                table, column, data_type
            ))
        })?;

        Ok(ColumnDescription {
            allow_null: is_nullable.eq_ignore_ascii_case("YES"),
            default_value: column_default.as_deref().map(DefaultValue::from_postgres),
            data_type,
        })
    }
}

#[async_trait]
impl MigrationStorage for PgQueryInterface {
    async fn ensure_storage(&self) -> OrmResult<()> {
        let sql = SchemaBuilder::new()
            .create_migrations_table(&self.migrations_table)
            .build();
        sqlx::query(&sql).execute(self.pool.as_ref()).await.map_err(|e| {
            OrmError::Migration(format!("Failed to create migrations table: {}", e))
        })?;
        Ok(())
    }

    async fn executed(&self) -> OrmResult<Vec<String>> {
        let sql = schema_builder::select_migrations_sql(&self.migrations_table);
        let rows = sqlx::query(&sql)
            .fetch_all(self.pool.as_ref())
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to query applied migrations: {}", e)))?;

        let mut names = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row
                .try_get("name")
                .map_err(|e| OrmError::Migration(format!("Failed to get migration name: {}", e)))?;
            names.push(name);
        }

        Ok(names)
    }

    async fn log_migration(&self, name: &str) -> OrmResult<()> {
        sqlx::query(&schema_builder::insert_migration_sql(&self.migrations_table))
            .bind(name)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| OrmError::Migration(format!("Failed to record migration {}: {}", name, e)))?;
        Ok(())
    }

    async fn unlog_migration(&self, name: &str) -> OrmResult<()> {
        sqlx::query(&schema_builder::delete_migration_sql(&self.migrations_table))
            .bind(name)
            .execute(self.pool.as_ref())
            .await
            .map_err(|e| {
                OrmError::Migration(format!("Failed to remove migration record {}: {}", name, e))
            })?;
        Ok(())
    }
}
