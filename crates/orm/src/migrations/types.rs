//! Column types, defaults and column specifications used by migrations

use serde::{Deserialize, Serialize};
use std::fmt;

/// Column type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Json,
    Jsonb,
    Text,
    /// Variable length string, 255 characters when no length is given
    String(Option<u32>),
    Integer,
    BigInt,
    Boolean,
    /// Timestamp with time zone
    Date,
    Uuid,
}

impl DataType {
    /// Postgres type name
    pub fn sql_type(&self) -> String {
        match self {
            DataType::Json => "JSON".to_string(),
            DataType::Jsonb => "JSONB".to_string(),
            DataType::Text => "TEXT".to_string(),
            DataType::String(len) => format!("VARCHAR({})", len.unwrap_or(255)),
            DataType::Integer => "INTEGER".to_string(),
            DataType::BigInt => "BIGINT".to_string(),
            DataType::Boolean => "BOOLEAN".to_string(),
            DataType::Date => "TIMESTAMP WITH TIME ZONE".to_string(),
            DataType::Uuid => "UUID".to_string(),
        }
    }

    /// Recognise a type from `information_schema.columns`
    pub fn from_information_schema(data_type: &str, max_length: Option<i32>) -> Option<Self> {
        let data_type = match data_type.to_lowercase().as_str() {
            "json" => DataType::Json,
            "jsonb" => DataType::Jsonb,
            "text" => DataType::Text,
            "character varying" => DataType::String(max_length.map(|len| len as u32)),
            "integer" => DataType::Integer,
            "bigint" => DataType::BigInt,
            "boolean" => DataType::Boolean,
            "timestamp with time zone" => DataType::Date,
            "uuid" => DataType::Uuid,
            _ => return None,
        };
        Some(data_type)
    }

    pub fn is_json(&self) -> bool {
        matches!(self, DataType::Json | DataType::Jsonb)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql_type())
    }
}

/// Type registry handed to migrations
///
/// Migrations ask the registry for the tags they need instead of naming
/// backend types directly.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataTypes;

impl DataTypes {
    pub fn new() -> Self {
        Self
    }

    pub fn json(&self) -> DataType {
        DataType::Json
    }

    pub fn jsonb(&self) -> DataType {
        DataType::Jsonb
    }

    pub fn text(&self) -> DataType {
        DataType::Text
    }

    pub fn string(&self, length: Option<u32>) -> DataType {
        DataType::String(length)
    }

    pub fn integer(&self) -> DataType {
        DataType::Integer
    }

    pub fn bigint(&self) -> DataType {
        DataType::BigInt
    }

    pub fn boolean(&self) -> DataType {
        DataType::Boolean
    }

    pub fn date(&self) -> DataType {
        DataType::Date
    }

    pub fn uuid(&self) -> DataType {
        DataType::Uuid
    }

    /// Look a tag up by name (`"JSON"`, `"STRING"`, ...), case-insensitive
    pub fn lookup(&self, name: &str) -> Option<DataType> {
        let data_type = match name.to_uppercase().as_str() {
            "JSON" => self.json(),
            "JSONB" => self.jsonb(),
            "TEXT" => self.text(),
            "STRING" => self.string(None),
            "INTEGER" => self.integer(),
            "BIGINT" => self.bigint(),
            "BOOLEAN" => self.boolean(),
            "DATE" => self.date(),
            "UUID" => self.uuid(),
            _ => return None,
        };
        Some(data_type)
    }
}

/// Column default value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DefaultValue {
    /// Literal text, stored verbatim and quoted when rendered
    Text(String),
    Integer(i64),
    Boolean(bool),
    /// Raw SQL expression such as `now()`
    Expression(String),
}

impl DefaultValue {
    pub fn text(value: impl Into<String>) -> Self {
        DefaultValue::Text(value.into())
    }

    /// SQL rendering for `SET DEFAULT`
    pub fn to_sql(&self) -> String {
        match self {
            DefaultValue::Text(text) => quote_literal(text),
            DefaultValue::Integer(value) => value.to_string(),
            DefaultValue::Boolean(value) => value.to_string(),
            DefaultValue::Expression(expr) => expr.clone(),
        }
    }

    /// Parse a Postgres `column_default` expression such as `'[]'::json`
    pub fn from_postgres(expr: &str) -> Self {
        let trimmed = expr.trim();

        // Strip trailing casts, e.g. '[]'::json or 'x'::character varying
        let value = match trimmed.rfind("::") {
            Some(pos) if trimmed.starts_with('\'') && trimmed[..pos].ends_with('\'') => {
                &trimmed[..pos]
            }
            _ => trimmed,
        };

        if value.len() >= 2 && value.starts_with('\'') && value.ends_with('\'') {
            return DefaultValue::Text(value[1..value.len() - 1].replace("''", "'"));
        }

        if let Ok(number) = value.parse::<i64>() {
            return DefaultValue::Integer(number);
        }

        match value {
            "true" => DefaultValue::Boolean(true),
            "false" => DefaultValue::Boolean(false),
            other => DefaultValue::Expression(other.to_string()),
        }
    }
}

/// Target state of one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub allow_null: bool,
    pub default_value: Option<DefaultValue>,
    pub data_type: DataType,
}

impl ColumnSpec {
    /// A nullable column of the given type with no default
    pub fn new(data_type: DataType) -> Self {
        Self {
            allow_null: true,
            default_value: None,
            data_type,
        }
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.allow_null = allow_null;
        self
    }

    pub fn default_value(mut self, default_value: DefaultValue) -> Self {
        self.default_value = Some(default_value);
        self
    }
}

/// Observed column metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub allow_null: bool,
    pub default_value: Option<DefaultValue>,
    pub data_type: DataType,
}

impl From<ColumnSpec> for ColumnDescription {
    fn from(spec: ColumnSpec) -> Self {
        Self {
            allow_null: spec.allow_null,
            default_value: spec.default_value,
            data_type: spec.data_type,
        }
    }
}

/// Quote an identifier for Postgres
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal for Postgres
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lookup() {
        let types = DataTypes::new();
        assert_eq!(types.lookup("JSON"), Some(DataType::Json));
        assert_eq!(types.lookup("json"), Some(DataType::Json));
        assert_eq!(types.lookup("STRING"), Some(DataType::String(None)));
        assert_eq!(types.lookup("GEOMETRY"), None);
    }

    #[test]
    fn test_sql_types() {
        assert_eq!(DataType::Json.sql_type(), "JSON");
        assert_eq!(DataType::String(None).sql_type(), "VARCHAR(255)");
        assert_eq!(DataType::String(Some(64)).sql_type(), "VARCHAR(64)");
        assert_eq!(
            DataType::from_information_schema("character varying", Some(64)),
            Some(DataType::String(Some(64)))
        );
        assert_eq!(DataType::from_information_schema("json", None), Some(DataType::Json));
        assert_eq!(DataType::from_information_schema("point", None), None);
    }

    #[test]
    fn test_default_value_rendering() {
        assert_eq!(DefaultValue::text("[]").to_sql(), "'[]'");
        assert_eq!(DefaultValue::text("it's").to_sql(), "'it''s'");
        assert_eq!(DefaultValue::Integer(3).to_sql(), "3");
        assert_eq!(DefaultValue::Expression("now()".into()).to_sql(), "now()");
    }

    #[test]
    fn test_default_value_from_postgres() {
        assert_eq!(DefaultValue::from_postgres("'[]'::json"), DefaultValue::text("[]"));
        assert_eq!(
            DefaultValue::from_postgres("'it''s'::character varying"),
            DefaultValue::text("it's")
        );
        assert_eq!(DefaultValue::from_postgres("42"), DefaultValue::Integer(42));
        assert_eq!(DefaultValue::from_postgres("false"), DefaultValue::Boolean(false));
        assert_eq!(
            DefaultValue::from_postgres("now()"),
            DefaultValue::Expression("now()".to_string())
        );
    }

    #[test]
    fn test_identifier_quoting_preserves_case() {
        assert_eq!(quote_identifier("networkIDs"), "\"networkIDs\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }
}
