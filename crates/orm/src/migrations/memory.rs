//! In-memory migration backend
//!
//! Mirrors how Postgres treats `change_column`: NOT NULL is refused while any
//! row holds null, text that is not JSON cannot become a JSON column, and a
//! refused change leaves the column as it was. Used by tests and for
//! rehearsing migrations without a database.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::Mutex;

use super::query_interface::{MigrationStorage, QueryInterface};
use super::types::{ColumnDescription, ColumnSpec, DataType, DefaultValue};
use crate::error::{OrmError, OrmResult};

#[derive(Debug, Clone)]
struct Table {
    columns: BTreeMap<String, ColumnDescription>,
    rows: Vec<Map<String, Value>>,
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<String, Table>,
    executed: BTreeSet<String>,
}

/// Schema store kept entirely in memory
#[derive(Debug, Default)]
pub struct InMemorySchema {
    state: Mutex<State>,
}

impl InMemorySchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with the given columns
    pub async fn create_table<I, S>(&self, table: &str, columns: I) -> OrmResult<()>
    where
        I: IntoIterator<Item = (S, ColumnSpec)>,
        S: Into<String>,
    {
        let mut state = self.state.lock().await;
        if state.tables.contains_key(table) {
            return Err(OrmError::Schema(format!("Table {} already exists", table)));
        }

        let columns = columns
            .into_iter()
            .map(|(name, spec)| (name.into(), ColumnDescription::from(spec)))
            .collect();

        state.tables.insert(
            table.to_string(),
            Table {
                columns,
                rows: Vec::new(),
            },
        );
        Ok(())
    }

    /// Insert a row; missing columns take their default, or null
    pub async fn insert_row(&self, table: &str, values: Map<String, Value>) -> OrmResult<()> {
        let mut state = self.state.lock().await;
        let table_state = state
            .tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;

        if let Some(unknown) = values.keys().find(|k| !table_state.columns.contains_key(*k)) {
            return Err(OrmError::Schema(format!(
                "Column {}.{} does not exist",
                table, unknown
            )));
        }

        let mut row = Map::new();
        for (name, column) in &table_state.columns {
            let value = match values.get(name) {
                Some(value) => value.clone(),
                None => default_for(column)?,
            };

            if value.is_null() && !column.allow_null {
                return Err(OrmError::Constraint(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    name, table
                )));
            }
            row.insert(name.clone(), value);
        }

        table_state.rows.push(row);
        Ok(())
    }

    /// Snapshot of all rows in `table`
    pub async fn rows(&self, table: &str) -> OrmResult<Vec<Map<String, Value>>> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .ok_or_else(|| missing_table(table))
    }
}

fn missing_table(table: &str) -> OrmError {
    OrmError::Schema(format!("relation \"{}\" does not exist", table))
}

fn default_for(column: &ColumnDescription) -> OrmResult<Value> {
    let value = match &column.default_value {
        None => Value::Null,
        Some(DefaultValue::Text(text)) if column.data_type.is_json() => {
            serde_json::from_str::<Value>(text)?
        }
        Some(DefaultValue::Text(text)) => Value::String(text.clone()),
        Some(DefaultValue::Integer(n)) => Value::from(*n),
        Some(DefaultValue::Boolean(b)) => Value::Bool(*b),
        Some(DefaultValue::Expression(expr)) => {
            return Err(OrmError::Schema(format!(
                "Expression default {} cannot be evaluated in memory",
                expr
            )))
        }
    };
    Ok(value)
}

/// Convert a stored value from `source` to `target`, or explain why it cannot be
fn convert_value(value: &Value, source: DataType, target: DataType) -> Result<Value, String> {
    // json -> json and same-type changes keep the stored value as is
    if value.is_null() || source == target || (source.is_json() && target.is_json()) {
        return Ok(value.clone());
    }

    match target {
        DataType::Json | DataType::Jsonb => match value {
            Value::String(text) => serde_json::from_str::<Value>(text)
                .map_err(|_| format!("invalid input syntax for type json: {}", text)),
            other => Ok(other.clone()),
        },
        DataType::Text | DataType::String(_) => match value {
            Value::String(_) => Ok(value.clone()),
            other => Ok(Value::String(other.to_string())),
        },
        DataType::Integer | DataType::BigInt => match value {
            Value::Number(n) if n.is_i64() => Ok(value.clone()),
            Value::String(text) => text
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| format!("invalid input syntax for type integer: {}", text)),
            other => Err(format!("cannot cast {} to integer", other)),
        },
        DataType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(text) => match text.as_str() {
                "true" | "t" => Ok(Value::Bool(true)),
                "false" | "f" => Ok(Value::Bool(false)),
                _ => Err(format!("invalid input syntax for type boolean: {}", text)),
            },
            other => Err(format!("cannot cast {} to boolean", other)),
        },
        DataType::Date | DataType::Uuid => match value {
            Value::String(_) => Ok(value.clone()),
            other => Err(format!("cannot cast {} to {}", other, target)),
        },
    }
}

#[async_trait]
impl QueryInterface for InMemorySchema {
    async fn change_column(&self, table: &str, column: &str, spec: ColumnSpec) -> OrmResult<()> {
        let mut state = self.state.lock().await;
        let table_state = state
            .tables
            .get_mut(table)
            .ok_or_else(|| missing_table(table))?;

        let source = match table_state.columns.get(column) {
            Some(current) => current.data_type,
            None => {
                return Err(OrmError::Schema(format!(
                    "column \"{}\" of relation \"{}\" does not exist",
                    column, table
                )))
            }
        };

        // Validate everything before touching the table
        let mut converted = Vec::with_capacity(table_state.rows.len());
        for row in &table_state.rows {
            let current = row.get(column).cloned().unwrap_or(Value::Null);
            if current.is_null() && !spec.allow_null {
                return Err(OrmError::Constraint(format!(
                    "column \"{}\" of relation \"{}\" contains null values",
                    column, table
                )));
            }
            let value = convert_value(&current, source, spec.data_type).map_err(OrmError::Schema)?;
            converted.push(value);
        }

        for (row, value) in table_state.rows.iter_mut().zip(converted) {
            row.insert(column.to_string(), value);
        }
        table_state
            .columns
            .insert(column.to_string(), ColumnDescription::from(spec));

        tracing::debug!("Changed column {}.{} in memory", table, column);
        Ok(())
    }

    async fn describe_column(&self, table: &str, column: &str) -> OrmResult<ColumnDescription> {
        let state = self.state.lock().await;
        state
            .tables
            .get(table)
            .ok_or_else(|| missing_table(table))?
            .columns
            .get(column)
            .cloned()
            .ok_or_else(|| OrmError::Schema(format!("Column {}.{} does not exist", table, column)))
    }
}

#[async_trait]
impl MigrationStorage for InMemorySchema {
    async fn ensure_storage(&self) -> OrmResult<()> {
        Ok(())
    }

    async fn executed(&self) -> OrmResult<Vec<String>> {
        let state = self.state.lock().await;
        Ok(state.executed.iter().cloned().collect())
    }

    async fn log_migration(&self, name: &str) -> OrmResult<()> {
        let mut state = self.state.lock().await;
        if !state.executed.insert(name.to_string()) {
            return Err(OrmError::Migration(format!(
                "Migration {} is already recorded",
                name
            )));
        }
        Ok(())
    }

    async fn unlog_migration(&self, name: &str) -> OrmResult<()> {
        let mut state = self.state.lock().await;
        state.executed.remove(name);
        Ok(())
    }
}
