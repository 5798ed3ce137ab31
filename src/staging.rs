//! Staging and dedup table definitions
//!
//! Every definition produced here gets a fresh name, so two operations never
//! share a temporary table even when they target the same destination.

use uuid::Uuid;

use crate::dialect::SqlDialect;
use crate::models::{ColumnDefinition, TableDefinition};

const STAGING_PREFIX: &str = "__temp_";
const DEDUP_PREFIX: &str = "__temp_DEDUP_";

/// Unique name for a staging table
pub fn generate_staging_table_name() -> String {
    format!("{}{}", STAGING_PREFIX, Uuid::new_v4().simple())
}

/// Unique name for a dedup/working table
pub fn generate_dedup_table_name() -> String {
    format!("{}{}", DEDUP_PREFIX, Uuid::new_v4().simple())
}

/// Builds temporary table definitions for one dialect
pub struct StageTableDefinitionFactory<'d, D: SqlDialect + ?Sized> {
    dialect: &'d D,
}

impl<'d, D: SqlDialect + ?Sized> StageTableDefinitionFactory<'d, D> {
    pub fn new(dialect: &'d D) -> Self {
        Self { dialect }
    }

    fn text_column(&self, name: &str) -> ColumnDefinition {
        ColumnDefinition::new(name, self.dialect.text_type())
    }

    /// Staging table for loading `source_columns` into `destination`
    ///
    /// Columns follow the source order. A column typed in the destination
    /// keeps that type; any other column gets the dialect's wide text type.
    /// Every column is nullable and the destination primary key is inherited.
    pub fn create_staging_table_definition<S: AsRef<str>>(
        &self,
        destination: &TableDefinition,
        source_columns: &[S],
    ) -> TableDefinition {
        let columns = source_columns
            .iter()
            .map(|name| {
                let name = name.as_ref();
                match destination.column(name) {
                    Some(column) => ColumnDefinition {
                        nullable: true,
                        ..column.clone()
                    },
                    None => self.text_column(name),
                }
            })
            .collect();

        TableDefinition::new(
            destination.schema.clone(),
            generate_staging_table_name(),
            columns,
        )
        .with_primary_keys(destination.primary_keys.iter().cloned())
        .temporary()
    }

    /// Staging table where every column is wide text, for untyped sources
    pub fn create_varchar_staging_table_definition<S: AsRef<str>>(
        &self,
        schema: &str,
        source_columns: &[S],
    ) -> TableDefinition {
        let columns = source_columns
            .iter()
            .map(|name| self.text_column(name.as_ref()))
            .collect();

        TableDefinition::new(schema, generate_staging_table_name(), columns).temporary()
    }

    /// Working table with the staging layout, used to collapse duplicate keys
    pub fn create_dedup_table_definition(
        &self,
        staging: &TableDefinition,
        primary_keys: &[String],
    ) -> TableDefinition {
        TableDefinition::new(
            staging.schema.clone(),
            generate_dedup_table_name(),
            staging.columns.clone(),
        )
        .with_primary_keys(primary_keys.iter().cloned())
        .temporary()
    }
}
