//! SQL dialect adapters
//!
//! Each supported warehouse implements [`SqlDialect`]. The trait covers the
//! fragments that vary between backends:
//! - identifier and literal quoting
//! - NULL/empty handling expressions and casts
//! - transaction verbs
//! - DDL shapes (create, truncate, drop)
//! - the structural form of UPDATE ... FROM and correlated DELETE
//!
//! [`StatementBuilder`](crate::builder::StatementBuilder) composes complete
//! statements from these fragments and never branches on a backend name.

use serde::{Deserialize, Serialize};

use crate::error::ErrorClass;
use crate::models::TableDefinition;

pub mod bigquery;
pub mod duckdb;
pub mod exasol;
pub mod snowflake;
pub mod synapse;
pub mod teradata;

pub use bigquery::BigQueryDialect;
pub use duckdb::DuckDbDialect;
pub use exasol::ExasolDialect;
pub use snowflake::SnowflakeDialect;
pub use synapse::SynapseDialect;
pub use teradata::TeradataDialect;

/// Supported backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    Snowflake,
    Synapse,
    Exasol,
    Teradata,
    BigQuery,
    /// Embedded DuckDB (default)
    #[default]
    DuckDB,
}

impl DialectKind {
    pub fn name(self) -> &'static str {
        match self {
            DialectKind::Snowflake => "snowflake",
            DialectKind::Synapse => "synapse",
            DialectKind::Exasol => "exasol",
            DialectKind::Teradata => "teradata",
            DialectKind::BigQuery => "bigquery",
            DialectKind::DuckDB => "duckdb",
        }
    }

    /// Adapter for this backend
    pub fn dialect(self) -> Box<dyn SqlDialect> {
        match self {
            DialectKind::Snowflake => Box::new(SnowflakeDialect),
            DialectKind::Synapse => Box::new(SynapseDialect),
            DialectKind::Exasol => Box::new(ExasolDialect),
            DialectKind::Teradata => Box::new(TeradataDialect),
            DialectKind::BigQuery => Box::new(BigQueryDialect),
            DialectKind::DuckDB => Box::new(DuckDbDialect),
        }
    }
}

impl std::str::FromStr for DialectKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "snowflake" => Ok(DialectKind::Snowflake),
            "synapse" => Ok(DialectKind::Synapse),
            "exasol" => Ok(DialectKind::Exasol),
            "teradata" => Ok(DialectKind::Teradata),
            "bigquery" => Ok(DialectKind::BigQuery),
            "duckdb" => Ok(DialectKind::DuckDB),
            _ => Err(format!(
                "Unknown dialect: {}. Use 'snowflake', 'synapse', 'exasol', 'teradata', 'bigquery' or 'duckdb'.",
                s
            )),
        }
    }
}

impl std::fmt::Display for DialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Idempotent drop of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropStatement {
    /// Single statement that never fails on a missing table
    Direct(String),
    /// Backend without `IF EXISTS`: run `drop` only when `exists_query`
    /// returns a non-zero count
    Guarded { exists_query: String, drop: String },
}

/// Pieces of an `UPDATE ... FROM` statement, already quoted
#[derive(Debug, Clone)]
pub struct UpdateParts<'a> {
    /// Destination table reference
    pub target: &'a str,
    /// Destination alias, when the dialect uses one
    pub target_alias: Option<&'a str>,
    /// Source SELECT, without parentheses
    pub source: &'a str,
    pub source_alias: &'a str,
    /// `column = expression` assignments
    pub assignments: &'a [String],
    pub predicate: &'a str,
}

/// Backend-specific SQL fragments
pub trait SqlDialect {
    fn kind(&self) -> DialectKind;

    fn name(&self) -> &'static str {
        self.kind().name()
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("\"{}\"", identifier.replace('"', "\"\""))
    }

    fn quote_value(&self, value: &str) -> String {
        format!("'{}'", value.replace('\'', "''"))
    }

    fn table_ref(&self, schema: &str, table: &str) -> String {
        format!(
            "{}.{}",
            self.quote_identifier(schema),
            self.quote_identifier(table)
        )
    }

    /// Wide text type for staging columns without a destination type
    fn text_type(&self) -> &'static str;

    /// Type used for the timestamp column when the destination does not define it
    fn timestamp_type(&self) -> &'static str {
        "TIMESTAMP"
    }

    fn cast(&self, expression: &str, sql_type: &str) -> String {
        format!("CAST({} AS {})", expression, sql_type)
    }

    /// Text form of any value, used when comparing columns
    fn to_text(&self, expression: &str) -> String {
        self.cast(expression, self.text_type())
    }

    fn null_if_empty(&self, expression: &str) -> String {
        format!("NULLIF({}, '')", expression)
    }

    fn coalesce_empty(&self, expression: &str) -> String {
        format!("COALESCE({}, '')", expression)
    }

    /// Stand-in for NULL when comparing keys and values as text
    fn null_sentinel(&self) -> &'static str {
        ""
    }

    /// NULL-safe inequality
    fn distinct_predicate(&self, left: &str, right: &str) -> String {
        format!("{} IS DISTINCT FROM {}", left, right)
    }

    fn row_number_over(&self, partition_by: &[String], order_by: &[String]) -> String {
        format!(
            "ROW_NUMBER() OVER (PARTITION BY {} ORDER BY {})",
            partition_by.join(", "),
            order_by.join(", ")
        )
    }

    /// Statement opening a transaction; `None` when the backend is always transactional
    fn begin_transaction(&self) -> Option<&'static str> {
        Some("BEGIN TRANSACTION")
    }

    fn commit(&self) -> &'static str {
        "COMMIT"
    }

    fn rollback(&self) -> &'static str {
        "ROLLBACK"
    }

    fn truncate_table(&self, table_ref: &str) -> String {
        format!("TRUNCATE TABLE {}", table_ref)
    }

    fn drop_table_if_exists(&self, schema: &str, table: &str) -> DropStatement {
        DropStatement::Direct(format!(
            "DROP TABLE IF EXISTS {}",
            self.table_ref(schema, table)
        ))
    }

    fn create_table(&self, table: &TableDefinition) -> String {
        let mut definitions: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("{} {}", self.quote_identifier(&c.name), c.sql_type());
                if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();

        if !table.temporary && table.has_primary_keys() {
            let keys: Vec<String> = table
                .primary_keys
                .iter()
                .map(|k| self.quote_identifier(k))
                .collect();
            definitions.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }

        let keyword = match (table.temporary, self.temporary_table_keyword()) {
            (true, Some(keyword)) => format!("{} ", keyword),
            _ => String::new(),
        };

        format!(
            "CREATE {}TABLE {} ({})",
            keyword,
            self.table_ref(&table.schema, &table.name),
            definitions.join(", ")
        )
    }

    fn temporary_table_keyword(&self) -> Option<&'static str> {
        None
    }

    /// `CREATE OR REPLACE TABLE ... AS SELECT`, when supported
    fn create_or_replace_as_select(&self, _table_ref: &str, _select: &str) -> Option<String> {
        None
    }

    /// Destination alias in UPDATE; `None` means predicates use the table reference
    fn update_target_alias(&self) -> Option<&'static str> {
        Some("dest")
    }

    fn update_statement(&self, parts: &UpdateParts<'_>) -> String {
        let target = match parts.target_alias {
            Some(alias) => format!("{} AS {}", parts.target, alias),
            None => parts.target.to_string(),
        };
        format!(
            "UPDATE {} SET {} FROM ({}) AS {} WHERE {}",
            target,
            parts.assignments.join(", "),
            parts.source,
            parts.source_alias,
            parts.predicate
        )
    }

    /// Delete staging rows matched in the destination. `predicate` refers to
    /// the destination as `destination_alias` and to staging by table name.
    fn delete_matched_statement(
        &self,
        staging_ref: &str,
        destination_ref: &str,
        destination_alias: &str,
        predicate: &str,
    ) -> String {
        format!(
            "DELETE FROM {} WHERE EXISTS (SELECT 1 FROM {} AS {} WHERE {})",
            staging_ref, destination_ref, destination_alias, predicate
        )
    }

    /// Whether incremental load with primary keys is implemented
    fn supports_incremental_dedup(&self) -> bool {
        true
    }

    /// Whether statements of one operation must share an executor session
    fn requires_session(&self) -> bool {
        false
    }

    fn classify_error(&self, _message: &str) -> ErrorClass {
        ErrorClass::Other
    }
}

/// NULL-safe inequality for backends without `IS DISTINCT FROM`
pub(crate) fn distinct_by_null_checks(left: &str, right: &str) -> String {
    format!(
        "({l} <> {r} OR ({l} IS NULL AND {r} IS NOT NULL) OR ({l} IS NOT NULL AND {r} IS NULL))",
        l = left,
        r = right
    )
}
