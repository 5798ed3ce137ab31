//! Azure Synapse dialect

use once_cell::sync::Lazy;
use regex::Regex;

use super::{DialectKind, DropStatement, SqlDialect, distinct_by_null_checks};
use crate::error::ErrorClass;
use crate::models::TableDefinition;

static RE_LOAD_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\[SQL Server\]Bulk load)|(\[SQL Server\]Error converting data type)")
        .expect("Invalid regex")
});

/// Azure Synapse (dedicated SQL pool)
#[derive(Debug, Clone, Copy, Default)]
pub struct SynapseDialect;

impl SqlDialect for SynapseDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Synapse
    }

    fn quote_identifier(&self, identifier: &str) -> String {
        format!("[{}]", identifier.replace(']', "]]"))
    }

    fn text_type(&self) -> &'static str {
        "NVARCHAR(4000)"
    }

    fn timestamp_type(&self) -> &'static str {
        "DATETIME2"
    }

    fn distinct_predicate(&self, left: &str, right: &str) -> String {
        distinct_by_null_checks(left, right)
    }

    // TRUNCATE is not allowed inside a user transaction
    fn truncate_table(&self, table_ref: &str) -> String {
        format!("DELETE FROM {}", table_ref)
    }

    fn drop_table_if_exists(&self, schema: &str, table: &str) -> DropStatement {
        let table_ref = self.table_ref(schema, table);
        DropStatement::Direct(format!(
            "IF OBJECT_ID (N'{}', N'U') IS NOT NULL DROP TABLE {}",
            table_ref.replace('\'', "''"),
            table_ref
        ))
    }

    fn create_table(&self, table: &TableDefinition) -> String {
        let columns: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                let null = if c.nullable { "NULL" } else { "NOT NULL" };
                format!("{} {} {}", self.quote_identifier(&c.name), c.sql_type(), null)
            })
            .collect();

        format!(
            "CREATE TABLE {} ({}) WITH (DISTRIBUTION = ROUND_ROBIN, HEAP)",
            self.table_ref(&table.schema, &table.name),
            columns.join(", ")
        )
    }

    fn update_target_alias(&self) -> Option<&'static str> {
        None
    }

    fn delete_matched_statement(
        &self,
        staging_ref: &str,
        destination_ref: &str,
        destination_alias: &str,
        predicate: &str,
    ) -> String {
        format!(
            "DELETE {} WHERE EXISTS (SELECT * FROM {} AS {} WHERE {})",
            staging_ref, destination_ref, destination_alias, predicate
        )
    }

    fn classify_error(&self, message: &str) -> ErrorClass {
        if RE_LOAD_ERROR.is_match(message) {
            ErrorClass::InvalidSourceData
        } else {
            ErrorClass::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ColumnDefinition;

    #[test]
    fn test_bracket_quoting() {
        assert_eq!(SynapseDialect.table_ref("dbo", "a]b"), "[dbo].[a]]b]");
    }

    #[test]
    fn test_drop_uses_object_id() {
        assert_eq!(
            SynapseDialect.drop_table_if_exists("dbo", "t"),
            DropStatement::Direct(
                "IF OBJECT_ID (N'[dbo].[t]', N'U') IS NOT NULL DROP TABLE [dbo].[t]".to_string()
            )
        );
    }

    #[test]
    fn test_create_table_round_robin_heap() {
        let table = TableDefinition::new("dbo", "t", vec![ColumnDefinition::new("a", "INT")]);
        assert_eq!(
            SynapseDialect.create_table(&table),
            "CREATE TABLE [dbo].[t] ([a] INT NULL) WITH (DISTRIBUTION = ROUND_ROBIN, HEAP)"
        );
    }

    #[test]
    fn test_classify_error() {
        assert_eq!(
            SynapseDialect.classify_error(
                "[Microsoft][ODBC Driver 17 for SQL Server][SQL Server]Bulk load data conversion error"
            ),
            ErrorClass::InvalidSourceData
        );
        assert_eq!(
            SynapseDialect.classify_error("Invalid object name"),
            ErrorClass::Other
        );
    }
}
