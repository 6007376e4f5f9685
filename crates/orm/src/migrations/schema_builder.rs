//! Schema Builder - SQL rendering for schema changes
//!
//! Turns column specifications into the Postgres statements a backend runs.
//! Identifiers are always quoted so mixed-case names such as `networkIDs`
//! survive.

use super::types::{quote_identifier, ColumnSpec};

/// Collects schema statements for migrations
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    statements: Vec<String>,
}

impl SchemaBuilder {
    /// Create a new schema builder
    pub fn new() -> Self {
        Self {
            statements: Vec::new(),
        }
    }

    /// Alter an existing column to match `spec`
    ///
    /// The default is dropped before the type change and set again after it:
    /// `USING` does not apply to defaults, so an old default would otherwise
    /// have to be cast implicitly (text to json is explicit-only).
    pub fn change_column(&mut self, table_name: &str, column_name: &str, spec: &ColumnSpec) -> &mut Self {
        let table = quote_identifier(table_name);
        let column = quote_identifier(column_name);
        let alter = format!("ALTER TABLE {} ALTER COLUMN {}", table, column);

        if spec.allow_null {
            self.statements.push(format!("{} DROP NOT NULL;", alter));
        } else {
            self.statements.push(format!("{} SET NOT NULL;", alter));
        }

        self.statements.push(format!("{} DROP DEFAULT;", alter));

        let sql_type = spec.data_type.sql_type();
        self.statements.push(format!(
            "{} TYPE {} USING ({}::{});",
            alter, sql_type, column, sql_type
        ));

        if let Some(default) = &spec.default_value {
            self.statements
                .push(format!("{} SET DEFAULT {};", alter, default.to_sql()));
        }
        self
    }

    /// Create the meta table recording applied migrations
    pub fn create_migrations_table(&mut self, table_name: &str) -> &mut Self {
        self.statements.push(format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \"name\" VARCHAR(255) NOT NULL PRIMARY KEY\n);",
            quote_identifier(table_name)
        ));
        self
    }

    /// Get all SQL statements
    pub fn to_sql(&self) -> Vec<String> {
        self.statements.clone()
    }

    /// All statements as a single SQL string
    pub fn build(&self) -> String {
        self.statements.join("\n")
    }
}

/// SQL to list applied migrations
pub fn select_migrations_sql(table_name: &str) -> String {
    format!(
        "SELECT \"name\" FROM {} ORDER BY \"name\" ASC",
        quote_identifier(table_name)
    )
}

/// SQL to record a migration as applied
pub fn insert_migration_sql(table_name: &str) -> String {
    format!(
        "INSERT INTO {} (\"name\") VALUES ($1)",
        quote_identifier(table_name)
    )
}

/// SQL to remove a migration record
pub fn delete_migration_sql(table_name: &str) -> String {
    format!(
        "DELETE FROM {} WHERE \"name\" = $1",
        quote_identifier(table_name)
    )
}

/// SQL to read a column's metadata from `information_schema`
pub fn describe_column_sql() -> &'static str {
    "SELECT is_nullable::text AS is_nullable, \
            column_default::text AS column_default, \
            data_type::text AS data_type, \
            character_maximum_length::integer AS max_length \
     FROM information_schema.columns \
     WHERE table_schema = current_schema() AND table_name = $1 AND column_name = $2"
}
