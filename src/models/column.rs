//! Column definitions for staging and destination tables

use serde::{Deserialize, Serialize};

/// Semantic classification of a backend column type
///
/// Only the string/non-string split drives statement generation; the other
/// variants exist so callers can reason about destination layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BaseType {
    String,
    Integer,
    Numeric,
    Float,
    Boolean,
    Date,
    Time,
    Timestamp,
    Binary,
}

impl BaseType {
    /// Classify a backend type name. Unknown names are treated as strings.
    pub fn from_type_name(data_type: &str) -> Self {
        let upper = data_type.trim().to_uppercase();
        let head = upper
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or_default();

        match head {
            "INT" | "INTEGER" | "BIGINT" | "SMALLINT" | "TINYINT" | "BYTEINT" | "INT64"
            | "HUGEINT" | "UBIGINT" | "UINTEGER" | "USMALLINT" | "UTINYINT" | "INT2" | "INT4"
            | "INT8" => BaseType::Integer,
            "NUMBER" | "NUMERIC" | "DECIMAL" | "DEC" | "BIGNUMERIC" | "BIGDECIMAL" => {
                BaseType::Numeric
            }
            "FLOAT" | "FLOAT4" | "FLOAT8" | "FLOAT64" | "DOUBLE" | "REAL" => BaseType::Float,
            "BOOLEAN" | "BOOL" => BaseType::Boolean,
            "DATE" => BaseType::Date,
            "TIME" => BaseType::Time,
            "TIMESTAMP" | "TIMESTAMP_NTZ" | "TIMESTAMP_LTZ" | "TIMESTAMP_TZ" | "DATETIME"
            | "DATETIME2" | "DATETIMEOFFSET" | "SMALLDATETIME" | "TIMESTAMPTZ" => {
                BaseType::Timestamp
            }
            "BINARY" | "VARBINARY" | "BLOB" | "BYTES" | "BYTEA" => BaseType::Binary,
            _ => BaseType::String,
        }
    }

    pub fn is_string(self) -> bool {
        self == BaseType::String
    }
}

/// A single column of a table definition
///
/// # Example
///
/// ```rust
/// use warehouse_import::models::ColumnDefinition;
///
/// let column = ColumnDefinition::new("name", "varchar(255)");
/// assert_eq!(column.data_type, "VARCHAR");
/// assert_eq!(column.sql_type(), "VARCHAR(255)");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column name, matched case-sensitively
    pub name: String,
    /// Backend type name without length (e.g. "VARCHAR", "NUMBER")
    pub data_type: String,
    /// Whether the column allows NULL values (default: true)
    #[serde(default = "default_true")]
    pub nullable: bool,
    /// Length or precision, e.g. "255" or "38,0"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ColumnDefinition {
    /// Create a nullable column
    ///
    /// A length written inline (`VARCHAR(255)`) is split off into `length`.
    pub fn new(name: impl Into<String>, data_type: impl AsRef<str>) -> Self {
        let (data_type, length) = split_length(data_type.as_ref());
        Self {
            name: name.into(),
            data_type,
            nullable: true,
            length,
        }
    }

    /// Set the length or precision
    pub fn with_length(mut self, length: impl Into<String>) -> Self {
        self.length = Some(length.into());
        self
    }

    /// Mark the column NOT NULL
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Type as written in DDL and CAST expressions
    pub fn sql_type(&self) -> String {
        match &self.length {
            Some(length) if !length.is_empty() => format!("{}({})", self.data_type, length),
            _ => self.data_type.clone(),
        }
    }

    pub fn base_type(&self) -> BaseType {
        BaseType::from_type_name(&self.data_type)
    }

    pub fn is_string_like(&self) -> bool {
        self.base_type().is_string()
    }
}

fn split_length(data_type: &str) -> (String, Option<String>) {
    let trimmed = data_type.trim();
    if let Some(start) = trimmed.find('(')
        && let Some(end) = trimmed.rfind(')')
        && end > start
    {
        let length = trimmed[start + 1..end].replace(' ', "");
        let base = trimmed[..start].trim().to_uppercase();
        return (base, (!length.is_empty()).then_some(length));
    }
    (trimmed.to_uppercase(), None)
}
