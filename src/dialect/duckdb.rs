//! DuckDB dialect

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DialectKind, SqlDialect};
use crate::error::ErrorClass;

static RE_NO_FILES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"No files found that match the pattern").expect("Invalid regex"));
static RE_INVALID_DATA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(Conversion Error)|(NOT NULL constraint failed)|(Could not convert)")
        .expect("Invalid regex")
});

/// Embedded DuckDB
#[derive(Debug, Clone, Copy, Default)]
pub struct DuckDbDialect;

impl SqlDialect for DuckDbDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::DuckDB
    }

    fn text_type(&self) -> &'static str {
        "VARCHAR"
    }

    fn truncate_table(&self, table_ref: &str) -> String {
        format!("DELETE FROM {}", table_ref)
    }

    fn create_or_replace_as_select(&self, table_ref: &str, select: &str) -> Option<String> {
        Some(format!("CREATE OR REPLACE TABLE {} AS {}", table_ref, select))
    }

    fn classify_error(&self, message: &str) -> ErrorClass {
        if RE_NO_FILES.is_match(message) {
            ErrorClass::MissingSource
        } else if RE_INVALID_DATA.is_match(message) {
            ErrorClass::InvalidSourceData
        } else {
            ErrorClass::Other
        }
    }
}
