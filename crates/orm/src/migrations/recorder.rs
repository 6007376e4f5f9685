//! Dry-run backend that records SQL instead of executing it

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::query_interface::QueryInterface;
use super::schema_builder::SchemaBuilder;
use super::types::{ColumnDescription, ColumnSpec};
use crate::error::{OrmError, OrmResult};

/// Collects the statements migrations would run against Postgres
#[derive(Debug, Default)]
pub struct SqlRecorder {
    statements: Mutex<Vec<String>>,
    columns: Mutex<HashMap<(String, String), ColumnDescription>>,
}

impl SqlRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statements recorded so far, in call order
    pub fn statements(&self) -> Vec<String> {
        self.statements
            .lock()
            .map(|statements| statements.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl QueryInterface for SqlRecorder {
    async fn change_column(&self, table: &str, column: &str, spec: ColumnSpec) -> OrmResult<()> {
        let sql = SchemaBuilder::new().change_column(table, column, &spec).to_sql();

        self.statements
            .lock()
            .map_err(|_| OrmError::Migration("SQL recorder lock poisoned".to_string()))?
            .extend(sql);
        self.columns
            .lock()
            .map_err(|_| OrmError::Migration("SQL recorder lock poisoned".to_string()))?
            .insert((table.to_string(), column.to_string()), spec.into());
        Ok(())
    }

    /// Only columns changed earlier in the same dry run are known
    async fn describe_column(&self, table: &str, column: &str) -> OrmResult<ColumnDescription> {
        self.columns
            .lock()
            .map_err(|_| OrmError::Migration("SQL recorder lock poisoned".to_string()))?
            .get(&(table.to_string(), column.to_string()))
            .cloned()
            .ok_or_else(|| {
                OrmError::Schema(format!(
                    "Column {}.{} is unknown to a dry run",
                    table, column
                ))
            })
    }
}
