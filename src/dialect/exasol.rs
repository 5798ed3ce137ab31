//! Exasol dialect
//!
//! Exasol stores empty strings as NULL, so key and change comparisons use a
//! non-empty sentinel instead of `''`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DialectKind, SqlDialect, UpdateParts, distinct_by_null_checks};
use crate::error::ErrorClass;

static RE_FILE_NOT_FOUND: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"failed with error code=404").expect("Invalid regex"));
static RE_LOAD_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(constraint violation - not null)|(CSV Parser found at byte)")
        .expect("Invalid regex")
});

/// Exasol
#[derive(Debug, Clone, Copy, Default)]
pub struct ExasolDialect;

impl SqlDialect for ExasolDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Exasol
    }

    fn text_type(&self) -> &'static str {
        "VARCHAR(2000000)"
    }

    fn null_sentinel(&self) -> &'static str {
        "__null__"
    }

    fn distinct_predicate(&self, left: &str, right: &str) -> String {
        distinct_by_null_checks(left, right)
    }

    // Every session is transactional; the first statement opens the transaction
    fn begin_transaction(&self) -> Option<&'static str> {
        None
    }

    fn truncate_table(&self, table_ref: &str) -> String {
        format!("DELETE FROM {}", table_ref)
    }

    fn update_statement(&self, parts: &UpdateParts<'_>) -> String {
        let alias = parts.target_alias.unwrap_or("\"dest\"");
        format!(
            "UPDATE {target} AS {alias} SET {set} FROM ({source}) AS {src}, {target} AS {alias} WHERE {predicate}",
            target = parts.target,
            alias = alias,
            set = parts.assignments.join(", "),
            source = parts.source,
            src = parts.source_alias,
            predicate = parts.predicate
        )
    }

    fn classify_error(&self, message: &str) -> ErrorClass {
        if RE_FILE_NOT_FOUND.is_match(message) {
            ErrorClass::MissingSource
        } else if RE_LOAD_ERROR.is_match(message) {
            ErrorClass::InvalidSourceData
        } else {
            ErrorClass::Other
        }
    }
}
