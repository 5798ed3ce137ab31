//! BigQuery dialect
//!
//! Multi-statement transactions only span calls inside a session, so every
//! statement of an operation must share one.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DialectKind, SqlDialect};
use crate::error::ErrorClass;

static RE_NOT_FOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Not found: (Uris|Files)").expect("Invalid regex"));
static RE_INVALID_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(Required field .+ cannot be null)|(Required column value .* is missing)|(Could not parse)",
    )
    .expect("Invalid regex")
});

/// Google BigQuery
#[derive(Debug, Clone, Copy, Default)]
pub struct BigQueryDialect;

impl SqlDialect for BigQueryDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::BigQuery
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("`{}`", identifier.replace('`', "\\`"))
    }

    fn quote_value(&self, value: &str) -> String {
        format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
    }

    fn text_type(&self) -> &'static str {
        "STRING"
    }

    fn commit(&self) -> &'static str {
        "COMMIT TRANSACTION"
    }

    fn rollback(&self) -> &'static str {
        "ROLLBACK TRANSACTION"
    }

    fn create_or_replace_as_select(&self, table_ref: &str, select: &str) -> Option<String> {
        Some(format!("CREATE OR REPLACE TABLE {} AS {}", table_ref, select))
    }

    fn supports_incremental_dedup(&self) -> bool {
        false
    }

    fn requires_session(&self) -> bool {
        true
    }

    fn classify_error(&self, message: &str) -> ErrorClass {
        if RE_NOT_FOUND.is_match(message) {
            ErrorClass::MissingSource
        } else if RE_INVALID_DATA.is_match(message) {
            ErrorClass::InvalidSourceData
        } else {
            ErrorClass::Other
        }
    }
}
