//! Snowflake dialect

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DialectKind, SqlDialect};
use crate::error::ErrorClass;

static RE_FILE_NOT_FOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Remote file '.+' was not found").expect("Invalid regex"));
static RE_VALUE_CONVERSION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(NULL result in a non-nullable column)|( '.*' is not recognized)")
        .expect("Invalid regex")
});
static RE_ROW_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(out of range)|(cannot be inserted because it's bigger than column size)")
        .expect("Invalid regex")
});

/// Snowflake
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeDialect;

impl SqlDialect for SnowflakeDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Snowflake
    }

    fn text_type(&self) -> &'static str {
        "VARCHAR(16777216)"
    }

    fn timestamp_type(&self) -> &'static str {
        "TIMESTAMP_NTZ"
    }

    fn to_text(&self, expression: &str) -> String {
        format!("TO_VARCHAR({})", expression)
    }

    fn null_if_empty(&self, expression: &str) -> String {
        format!("IFF({e} = '', NULL, {e})", e = expression)
    }

    fn temporary_table_keyword(&self) -> Option<&'static str> {
        Some("TEMPORARY")
    }

    fn create_or_replace_as_select(&self, table_ref: &str, select: &str) -> Option<String> {
        Some(format!("CREATE OR REPLACE TABLE {} AS {}", table_ref, select))
    }

    fn delete_matched_statement(
        &self,
        staging_ref: &str,
        destination_ref: &str,
        destination_alias: &str,
        predicate: &str,
    ) -> String {
        format!(
            "DELETE FROM {} USING {} AS {} WHERE {}",
            staging_ref, destination_ref, destination_alias, predicate
        )
    }

    fn classify_error(&self, message: &str) -> ErrorClass {
        if RE_FILE_NOT_FOUND.is_match(message) {
            ErrorClass::MissingSource
        } else if RE_VALUE_CONVERSION.is_match(message) || RE_ROW_SIZE.is_match(message) {
            ErrorClass::InvalidSourceData
        } else {
            ErrorClass::Other
        }
    }
}
