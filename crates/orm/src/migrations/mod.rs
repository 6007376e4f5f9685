//! Migration System
//!
//! Migrations are Rust values implementing [`Migration`], registered with a
//! [`MigrationManager`] and applied by a [`MigrationRunner`] through a backend
//! that implements [`QueryInterface`] and [`MigrationStorage`].

pub mod definitions;
pub mod manager;
pub mod memory;
pub mod postgres;
pub mod query_interface;
pub mod recorder;
pub mod rollback;
pub mod runner;
pub mod schema_builder;
pub mod types;

pub use definitions::{
    Migration, MigrationDirection, MigrationRunResult, MigrationStatus,
    MigrationStatusEntry, RollbackResult,
};
pub use manager::MigrationManager;
pub use memory::InMemorySchema;
pub use postgres::PgQueryInterface;
pub use query_interface::{MigrationStorage, QueryInterface};
pub use recorder::SqlRecorder;
pub use rollback::MigrationRollback;
pub use runner::MigrationRunner;
pub use schema_builder::SchemaBuilder;
pub use types::{ColumnDescription, ColumnSpec, DataType, DataTypes, DefaultValue};
