//! Error types for the migration engine
//!
//! Every failure a schema store can report while a migration runs ends up in
//! [`OrmError`]. Migrations never recover locally: the error a store returns is
//! what the runner sees.

use std::fmt;

/// ORM result type alias
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for schema and migration operations
#[derive(Debug, Clone)]
pub enum OrmError {
    /// Database connection or query error
    Database(String),
    /// A constraint rejected the change (e.g. NOT NULL over existing nulls)
    Constraint(String),
    /// Missing table/column or a type that cannot be converted
    Schema(String),
    /// Migration bookkeeping error (unknown name, already applied, ...)
    Migration(String),
    /// A migration unit failed; `source` is the unchanged store error
    MigrationFailed {
        migration: String,
        source: Box<OrmError>,
    },
    /// Connection pool error
    Connection(String),
    /// Configuration error
    Configuration(String),
    /// Serialization/deserialization error
    Serialization(String),
}

impl OrmError {
    /// The innermost error, looking through `MigrationFailed` wrappers.
    pub fn root_cause(&self) -> &OrmError {
        match self {
            OrmError::MigrationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Whether the schema store refused the change because of a constraint.
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self.root_cause(), OrmError::Constraint(_))
    }
}

impl fmt::Display for OrmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrmError::Database(msg) => write!(f, "Database error: {}", msg),
            OrmError::Constraint(msg) => write!(f, "Constraint violation: {}", msg),
            OrmError::Schema(msg) => write!(f, "Schema error: {}", msg),
            OrmError::Migration(msg) => write!(f, "Migration error: {}", msg),
            OrmError::MigrationFailed { migration, source } => {
                write!(f, "Migration {} failed: {}", migration, source)
            }
            OrmError::Connection(msg) => write!(f, "Connection error: {}", msg),
            OrmError::Configuration(msg) => write!(f, "Configuration error: {}", msg),
            OrmError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for OrmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OrmError::MigrationFailed { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// SQLSTATE codes the Postgres backend classifies
const NOT_NULL_VIOLATION: &str = "23502";
const UNDEFINED_TABLE: &str = "42P01";
const UNDEFINED_COLUMN: &str = "42703";
const DATATYPE_MISMATCH: &str = "42804";
const INVALID_TEXT_REPRESENTATION: &str = "22P02";
const CANNOT_COERCE: &str = "42846";

// Convert from sqlx errors
impl From<sqlx::Error> for OrmError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db| db.code())
            .map(|code| code.into_owned());

        match code.as_deref() {
            Some(NOT_NULL_VIOLATION) => OrmError::Constraint(err.to_string()),
            Some(UNDEFINED_TABLE)
            | Some(UNDEFINED_COLUMN)
            | Some(DATATYPE_MISMATCH)
            | Some(INVALID_TEXT_REPRESENTATION)
            | Some(CANNOT_COERCE) => OrmError::Schema(err.to_string()),
            _ => match err {
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                    OrmError::Connection(err.to_string())
                }
                other => OrmError::Database(other.to_string()),
            },
        }
    }
}

// Convert from serde_json errors
impl From<serde_json::Error> for OrmError {
    fn from(err: serde_json::Error) -> Self {
        OrmError::Serialization(err.to_string())
    }
}
