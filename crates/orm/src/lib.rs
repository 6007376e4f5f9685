//! # nms-orm: schema migrations for the NMS models
//!
//! Provides the migration engine the NMS model migrations plug into:
//! the `Migration` trait, the `QueryInterface` schema-mutation handle with
//! Postgres and in-memory backends, the migration manager, runner and
//! rollback support, plus configuration and error handling.

pub mod config;
pub mod database;
pub mod error;
pub mod migrations;

// Re-export core traits and types
pub use config::*;
pub use database::*;
pub use error::*;
pub use migrations::*;
