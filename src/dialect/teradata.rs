//! Teradata dialect

use super::{DialectKind, DropStatement, SqlDialect, UpdateParts, distinct_by_null_checks};
use crate::models::TableDefinition;

/// Teradata
#[derive(Debug, Clone, Copy, Default)]
pub struct TeradataDialect;

impl SqlDialect for TeradataDialect {
    fn kind(&self) -> DialectKind {
        DialectKind::Teradata
    }

    fn text_type(&self) -> &'static str {
        "VARCHAR(32000)"
    }

    fn distinct_predicate(&self, left: &str, right: &str) -> String {
        distinct_by_null_checks(left, right)
    }

    fn commit(&self) -> &'static str {
        "END TRANSACTION"
    }

    fn truncate_table(&self, table_ref: &str) -> String {
        format!("DELETE {} ALL", table_ref)
    }

    fn drop_table_if_exists(&self, schema: &str, table: &str) -> DropStatement {
        DropStatement::Guarded {
            exists_query: format!(
                "SELECT COUNT(*) AS cnt FROM DBC.TablesVX WHERE DatabaseName = {} AND TableName = {}",
                self.quote_value(schema),
                self.quote_value(table)
            ),
            drop: format!("DROP TABLE {}", self.table_ref(schema, table)),
        }
    }

    fn create_table(&self, table: &TableDefinition) -> String {
        let columns: Vec<String> = table
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

        let index = if !table.temporary && table.has_primary_keys() {
            let keys: Vec<String> = table
                .primary_keys
                .iter()
                .map(|k| self.quote_identifier(k))
                .collect();
            format!("PRIMARY INDEX ({})", keys.join(", "))
        } else {
            "NO PRIMARY INDEX".to_string()
        };

        format!(
            "CREATE MULTISET TABLE {}, NO FALLBACK ({}) {}",
            self.table_ref(&table.schema, &table.name),
            columns.join(", "),
            index
        )
    }

    fn update_target_alias(&self) -> Option<&'static str> {
        None
    }

    fn update_statement(&self, parts: &UpdateParts<'_>) -> String {
        format!(
            "UPDATE {} FROM ({}) AS {} SET {} WHERE {}",
            parts.target,
            parts.source,
            parts.source_alias,
            parts.assignments.join(", "),
            parts.predicate
        )
    }

    fn delete_matched_statement(
        &self,
        staging_ref: &str,
        destination_ref: &str,
        destination_alias: &str,
        predicate: &str,
    ) -> String {
        format!(
            "DELETE {} FROM {} AS {} WHERE {}",
            staging_ref, destination_ref, destination_alias, predicate
        )
    }
}
