//! Statement builder
//!
//! Composes every statement the importers issue from table definitions,
//! options and a [`SqlDialect`]. Building is pure: nothing here executes SQL
//! or keeps state between calls.
//!
//! Column rules applied when moving values from a source table into the
//! destination (null manipulation enabled):
//!
//! | listed in convert-empty | string-like | expression                         |
//! |-------------------------|-------------|------------------------------------|
//! | yes                     | yes         | `NULLIF(col, '')`                  |
//! | yes                     | no          | `col`                              |
//! | no                      | yes         | `CAST(COALESCE(col, '') AS type)`  |
//! | no                      | no          | `CAST(col AS type)`                |
//!
//! A typed source keeps its NULL strings: the COALESCE in the third row is
//! dropped and the value is only cast. With null manipulation disabled values
//! are copied as-is, cast only when the staging and destination types differ.

use crate::dialect::{DropStatement, SqlDialect, UpdateParts};
use crate::error::{ImportError, ImportResult};
use crate::models::{ColumnDefinition, TableDefinition};
use crate::options::{ImportOptions, TIMESTAMP_COLUMN_NAME};

const SOURCE_ALIAS: &str = "src";
const DESTINATION_ALIAS: &str = "dest";
const DEDUP_ALIAS: &str = "a";
const ROW_NUMBER_COLUMN: &str = "_row_number_";

/// SQL text builder over one dialect
pub struct StatementBuilder<'d, D: SqlDialect + ?Sized> {
    dialect: &'d D,
}

impl<'d, D: SqlDialect + ?Sized> StatementBuilder<'d, D> {
    pub fn new(dialect: &'d D) -> Self {
        Self { dialect }
    }

    fn quote(&self, identifier: &str) -> String {
        self.dialect.quote_identifier(identifier)
    }

    fn quote_all<S: AsRef<str>>(&self, identifiers: &[S]) -> Vec<String> {
        identifiers.iter().map(|i| self.quote(i.as_ref())).collect()
    }

    pub fn table_ref(&self, table: &TableDefinition) -> String {
        self.dialect.table_ref(&table.schema, &table.name)
    }

    /// Empty a table without dropping it
    pub fn truncate(&self, table: &TableDefinition) -> String {
        self.dialect.truncate_table(&self.table_ref(table))
    }

    /// Drop a table, never failing when it is absent
    pub fn drop_if_exists(&self, table: &TableDefinition) -> DropStatement {
        self.dialect.drop_table_if_exists(&table.schema, &table.name)
    }

    pub fn create_table(&self, table: &TableDefinition) -> String {
        self.dialect.create_table(table)
    }

    /// SELECT keeping one row per primary-key combination
    ///
    /// Rows are ranked with `ROW_NUMBER() OVER (PARTITION BY <keys> ORDER BY
    /// <every output column> DESC)` and rank 1 is kept, so the retained row
    /// is the greatest by full-row ordering.
    pub fn dedup_select<S: AsRef<str>>(
        &self,
        staging: &TableDefinition,
        output_columns: &[S],
        primary_keys: &[String],
    ) -> ImportResult<String> {
        if output_columns.is_empty() {
            return Err(ImportError::Configuration(format!(
                "No columns to select from table \"{}\"",
                staging.name
            )));
        }
        for column in output_columns {
            require_column(staging, column.as_ref())?;
        }
        validate_primary_keys(primary_keys, &[staging])?;

        let columns = self.quote_all(output_columns).join(", ");
        let partition = self.quote_all(primary_keys);
        let order: Vec<String> = self
            .quote_all(output_columns)
            .into_iter()
            .map(|c| format!("{} DESC", c))
            .collect();
        let alias = self.quote(DEDUP_ALIAS);
        let row_number = self.quote(ROW_NUMBER_COLUMN);

        Ok(format!(
            "SELECT {columns} FROM (SELECT {columns}, {window} AS {row_number} FROM {staging}) AS {alias} WHERE {alias}.{row_number} = 1",
            columns = columns,
            window = self.dialect.row_number_over(&partition, &order),
            row_number = row_number,
            staging = self.table_ref(staging),
            alias = alias,
        ))
    }

    /// Materialise the dedup SELECT of `staging` into `dedup_table`
    pub fn dedup_insert(
        &self,
        staging: &TableDefinition,
        dedup_table: &TableDefinition,
        primary_keys: &[String],
    ) -> ImportResult<String> {
        let columns = staging.column_names();
        for column in &columns {
            require_column(dedup_table, column)?;
        }
        let select = self.dedup_select(staging, &columns, primary_keys)?;

        Ok(format!(
            "INSERT INTO {} ({}) {}",
            self.table_ref(dedup_table),
            self.quote_all(&columns).join(", "),
            select
        ))
    }

    /// INSERT ... SELECT of every row of `source` into `destination`
    ///
    /// Column order follows `source`; types follow `destination`. When
    /// timestamps are enabled and `source` has no timestamp column, the
    /// supplied value is appended.
    pub fn insert_all_into_target(
        &self,
        source: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
    ) -> ImportResult<String> {
        require_columns_in_destination(source, destination)?;

        let src = self.quote(SOURCE_ALIAS);
        let mut columns = Vec::with_capacity(source.columns.len() + 1);
        let mut values = Vec::with_capacity(source.columns.len() + 1);

        for column in &source.columns {
            let target = require_column(destination, &column.name)?;
            columns.push(self.quote(&column.name));
            values.push(self.value_expression(column, target, options, &src));
        }

        if options.uses_timestamp() && !source.has_column(TIMESTAMP_COLUMN_NAME) {
            columns.push(self.quote(TIMESTAMP_COLUMN_NAME));
            values.push(self.timestamp_value(destination, timestamp)?);
        }

        Ok(format!(
            "INSERT INTO {} ({}) SELECT {} FROM {} AS {}",
            self.table_ref(destination),
            columns.join(", "),
            values.join(", "),
            self.table_ref(source),
            src
        ))
    }

    /// UPDATE of destination rows whose key exists in staging and whose
    /// values differ
    ///
    /// The update reads from the dedup SELECT of staging, so each destination
    /// row is matched at most once. Returns `None` when staging has no
    /// non-key column, as there is nothing that could change.
    pub fn update_with_primary_key(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
    ) -> ImportResult<Option<String>> {
        require_columns_in_destination(staging, destination)?;
        let primary_keys = &destination.primary_keys;
        validate_primary_keys(primary_keys, &[staging, destination])?;

        let updatable: Vec<&ColumnDefinition> = staging
            .columns
            .iter()
            .filter(|c| !destination.is_primary_key(&c.name))
            .collect();
        let compared: Vec<&ColumnDefinition> = updatable
            .iter()
            .copied()
            .filter(|c| c.name != TIMESTAMP_COLUMN_NAME)
            .collect();
        if compared.is_empty() {
            return Ok(None);
        }

        let target = self.table_ref(destination);
        let target_alias = self.dialect.update_target_alias().map(|a| self.quote(a));
        let dest_prefix = target_alias.clone().unwrap_or_else(|| target.clone());
        let src = self.quote(SOURCE_ALIAS);

        let mut assignments = Vec::with_capacity(updatable.len() + 1);
        for column in &updatable {
            let target_column = require_column(destination, &column.name)?;
            assignments.push(format!(
                "{} = {}",
                self.quote(&column.name),
                self.value_expression(column, target_column, options, &src)
            ));
        }
        if options.uses_timestamp() && !staging.has_column(TIMESTAMP_COLUMN_NAME) {
            assignments.push(format!(
                "{} = {}",
                self.quote(TIMESTAMP_COLUMN_NAME),
                self.timestamp_value(destination, timestamp)?
            ));
        }

        let changes: Vec<String> = compared
            .iter()
            .map(|c| self.change_predicate(&c.name, &dest_prefix, &src, options))
            .collect();
        let predicate = format!(
            "{} AND ({})",
            self.primary_key_predicate(primary_keys, &dest_prefix, &src, options),
            changes.join(" OR ")
        );

        let source = self.dedup_select(staging, &staging.column_names(), primary_keys)?;

        Ok(Some(self.dialect.update_statement(&UpdateParts {
            target: &target,
            target_alias: target_alias.as_deref(),
            source: &source,
            source_alias: &src,
            assignments: &assignments,
            predicate: &predicate,
        })))
    }

    /// DELETE of staging rows whose primary key already exists in the destination
    pub fn delete_matched(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        primary_keys: &[String],
        options: &ImportOptions,
    ) -> ImportResult<String> {
        validate_primary_keys(primary_keys, &[staging, destination])?;

        let dest_alias = self.quote(DESTINATION_ALIAS);
        let staging_prefix = self.quote(&staging.name);
        let predicate =
            self.primary_key_predicate(primary_keys, &dest_alias, &staging_prefix, options);

        Ok(self.dialect.delete_matched_statement(
            &self.table_ref(staging),
            &self.table_ref(destination),
            &dest_alias,
            &predicate,
        ))
    }

    /// Replace the destination with the staging content in one statement
    ///
    /// Columns keep the destination order. The timestamp column is filled
    /// with the supplied value when the destination has one or timestamps
    /// are enabled.
    pub fn ctas_replace(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
    ) -> ImportResult<String> {
        let mut values: Vec<String> = Vec::with_capacity(destination.columns.len() + 1);
        for column in destination
            .columns
            .iter()
            .filter(|c| c.name != TIMESTAMP_COLUMN_NAME)
        {
            require_column(staging, &column.name)?;
            values.push(self.quote(&column.name));
        }

        if destination.has_column(TIMESTAMP_COLUMN_NAME) || options.uses_timestamp() {
            values.push(format!(
                "{} AS {}",
                self.timestamp_literal(destination, timestamp),
                self.quote(TIMESTAMP_COLUMN_NAME)
            ));
        }

        let select = format!("SELECT {} FROM {}", values.join(", "), self.table_ref(staging));
        self.dialect
            .create_or_replace_as_select(&self.table_ref(destination), &select)
            .ok_or_else(|| ImportError::Unsupported {
                backend: self.dialect.name(),
                operation: "CREATE OR REPLACE TABLE AS SELECT".to_string(),
            })
    }

    fn value_expression(
        &self,
        source: &ColumnDefinition,
        destination: &ColumnDefinition,
        options: &ImportOptions,
        prefix: &str,
    ) -> String {
        let column = format!("{}.{}", prefix, self.quote(&source.name));
        let target_type = destination.sql_type();

        if !options.is_null_manipulation_enabled() {
            return if source.sql_type() == target_type {
                column
            } else {
                self.dialect.cast(&column, &target_type)
            };
        }

        match (
            options.converts_empty_to_null(&source.name),
            destination.is_string_like(),
        ) {
            (true, true) => self.dialect.null_if_empty(&column),
            (true, false) => column,
            (false, true) if options.is_using_typed_source() => {
                self.dialect.cast(&column, &target_type)
            }
            (false, true) => self
                .dialect
                .cast(&self.dialect.coalesce_empty(&column), &target_type),
            (false, false) => self.dialect.cast(&column, &target_type),
        }
    }

    fn timestamp_value(
        &self,
        destination: &TableDefinition,
        timestamp: &str,
    ) -> ImportResult<String> {
        if !destination.has_column(TIMESTAMP_COLUMN_NAME) {
            return Err(ImportError::Configuration(format!(
                "Timestamp column \"{}\" not found in destination table \"{}\"",
                TIMESTAMP_COLUMN_NAME, destination.name
            )));
        }
        Ok(self.timestamp_literal(destination, timestamp))
    }

    fn timestamp_literal(&self, destination: &TableDefinition, timestamp: &str) -> String {
        let sql_type = destination
            .column(TIMESTAMP_COLUMN_NAME)
            .map(|c| c.sql_type())
            .unwrap_or_else(|| self.dialect.timestamp_type().to_string());
        self.dialect.cast(&self.dialect.quote_value(timestamp), &sql_type)
    }

    fn coalesce_text(&self, expression: &str) -> String {
        format!(
            "COALESCE({}, {})",
            self.dialect.to_text(expression),
            self.dialect.quote_value(self.dialect.null_sentinel())
        )
    }

    fn primary_key_predicate(
        &self,
        primary_keys: &[String],
        dest_prefix: &str,
        src_prefix: &str,
        options: &ImportOptions,
    ) -> String {
        primary_keys
            .iter()
            .map(|key| {
                let quoted = self.quote(key);
                let dest = format!("{}.{}", dest_prefix, quoted);
                let src = format!("{}.{}", src_prefix, quoted);
                if options.is_null_manipulation_enabled() {
                    format!("{} = {}", self.coalesce_text(&dest), self.coalesce_text(&src))
                } else {
                    format!(
                        "({d} = {s} OR ({d} IS NULL AND {s} IS NULL))",
                        d = dest,
                        s = src
                    )
                }
            })
            .collect::<Vec<_>>()
            .join(" AND ")
    }

    fn change_predicate(
        &self,
        column: &str,
        dest_prefix: &str,
        src_prefix: &str,
        options: &ImportOptions,
    ) -> String {
        let quoted = self.quote(column);
        let dest = format!("{}.{}", dest_prefix, quoted);
        let src = format!("{}.{}", src_prefix, quoted);
        if options.is_null_manipulation_enabled() {
            format!("{} <> {}", self.coalesce_text(&dest), self.coalesce_text(&src))
        } else {
            self.dialect.distinct_predicate(&dest, &src)
        }
    }
}

fn require_column<'t>(
    table: &'t TableDefinition,
    name: &str,
) -> ImportResult<&'t ColumnDefinition> {
    table.column(name).ok_or_else(|| {
        ImportError::Configuration(format!(
            "Column \"{}\" not found in table \"{}\" (columns: \"{}\")",
            name,
            table.name,
            table.column_names().join(", ")
        ))
    })
}

fn require_columns_in_destination(
    source: &TableDefinition,
    destination: &TableDefinition,
) -> ImportResult<()> {
    if source.columns.is_empty() {
        return Err(ImportError::Configuration(format!(
            "Table \"{}\" has no columns to import",
            source.name
        )));
    }
    for column in &source.columns {
        if !destination.has_column(&column.name) {
            return Err(ImportError::Configuration(format!(
                "Column \"{}\" can not be imported as it was not found between columns \"{}\" of destination table",
                column.name,
                destination.column_names().join(", ")
            )));
        }
    }
    Ok(())
}

/// Fail unless `primary_keys` is non-empty and present in every table
pub fn validate_primary_keys(
    primary_keys: &[String],
    tables: &[&TableDefinition],
) -> ImportResult<()> {
    if primary_keys.is_empty() {
        return Err(ImportError::Configuration(
            "Primary key is required for deduplication".to_string(),
        ));
    }
    for table in tables {
        for key in primary_keys {
            if !table.has_column(key) {
                return Err(ImportError::Configuration(format!(
                    "Primary key column \"{}\" not found in table \"{}\"",
                    key, table.name
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{
        BigQueryDialect, DuckDbDialect, SnowflakeDialect, SynapseDialect, TeradataDialect,
    };

    fn staging() -> TableDefinition {
        TableDefinition::new(
            "s",
            "stg",
            vec![
                ColumnDefinition::new("id", "INTEGER"),
                ColumnDefinition::new("name", "VARCHAR"),
            ],
        )
        .temporary()
    }

    fn destination() -> TableDefinition {
        TableDefinition::new(
            "s",
            "dst",
            vec![
                ColumnDefinition::new("id", "INTEGER"),
                ColumnDefinition::new("name", "VARCHAR(50)"),
                ColumnDefinition::new("_timestamp", "TIMESTAMP"),
            ],
        )
        .with_primary_keys(["id"])
    }

    #[test]
    fn test_dedup_select_orders_by_all_columns_desc() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .dedup_select(&staging(), &["id", "name"], &["id".to_string()])
            .unwrap();
        assert_eq!(
            sql,
            "SELECT \"id\", \"name\" FROM (SELECT \"id\", \"name\", ROW_NUMBER() OVER (PARTITION BY \"id\" ORDER BY \"id\" DESC, \"name\" DESC) AS \"_row_number_\" FROM \"s\".\"stg\") AS \"a\" WHERE \"a\".\"_row_number_\" = 1"
        );
    }

    #[test]
    fn test_dedup_select_requires_primary_key() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let err = builder.dedup_select(&staging(), &["id"], &[]).unwrap_err();
        assert!(err.is_configuration());

        let err = builder
            .dedup_select(&staging(), &["id"], &["ID".to_string()])
            .unwrap_err();
        assert!(err.to_string().contains("\"ID\""));
    }

    #[test]
    fn test_insert_value_rules() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let staging = TableDefinition::new(
            "s",
            "stg",
            vec![
                ColumnDefinition::new("a", "VARCHAR"),
                ColumnDefinition::new("b", "VARCHAR"),
                ColumnDefinition::new("c", "VARCHAR"),
                ColumnDefinition::new("d", "VARCHAR"),
            ],
        );
        let destination = TableDefinition::new(
            "s",
            "dst",
            vec![
                ColumnDefinition::new("d", "INTEGER"),
                ColumnDefinition::new("c", "VARCHAR"),
                ColumnDefinition::new("b", "INTEGER"),
                ColumnDefinition::new("a", "VARCHAR"),
            ],
        );
        let options = ImportOptions::new().convert_empty_values_to_null(["a", "b"]);

        let sql = builder
            .insert_all_into_target(&staging, &destination, &options, "2024-01-01 00:00:00")
            .unwrap();
        assert_eq!(
            sql,
            "INSERT INTO \"s\".\"dst\" (\"a\", \"b\", \"c\", \"d\") SELECT NULLIF(\"src\".\"a\", ''), \"src\".\"b\", CAST(COALESCE(\"src\".\"c\", '') AS VARCHAR), CAST(\"src\".\"d\" AS INTEGER) FROM \"s\".\"stg\" AS \"src\""
        );
    }

    #[test]
    fn test_insert_appends_timestamp() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let options = ImportOptions::new().use_timestamp(true);
        let sql = builder
            .insert_all_into_target(&staging(), &destination(), &options, "2024-01-01 10:00:00")
            .unwrap();
        assert!(sql.contains("(\"id\", \"name\", \"_timestamp\")"));
        assert!(sql.contains("CAST('2024-01-01 10:00:00' AS TIMESTAMP) FROM"));
    }

    #[test]
    fn test_insert_timestamp_requires_destination_column() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let mut destination = destination();
        destination.columns.pop();
        let err = builder
            .insert_all_into_target(
                &staging(),
                &destination,
                &ImportOptions::new().use_timestamp(true),
                "2024-01-01 10:00:00",
            )
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_insert_rejects_unknown_column() {
        let dialect = SnowflakeDialect;
        let builder = StatementBuilder::new(&dialect);
        let mut staging = staging();
        staging.columns.push(ColumnDefinition::new("extra", "VARCHAR"));
        let err = builder
            .insert_all_into_target(&staging, &destination(), &ImportOptions::new(), "")
            .unwrap_err();
        assert!(err.to_string().contains("\"extra\""));
    }

    #[test]
    fn test_insert_typed_source_keeps_null_strings() {
        let dialect = SnowflakeDialect;
        let builder = StatementBuilder::new(&dialect);
        let options = ImportOptions::new().using_typed_source(true);
        let sql = builder
            .insert_all_into_target(&staging(), &destination(), &options, "")
            .unwrap();
        assert!(!sql.contains("COALESCE"), "{sql}");
        assert!(sql.contains("CAST(\"src\".\"name\" AS VARCHAR(50))"), "{sql}");

        let converted = options.convert_empty_values_to_null(["name"]);
        let sql = builder
            .insert_all_into_target(&staging(), &destination(), &converted, "")
            .unwrap();
        assert!(sql.contains("IFF(\"src\".\"name\" = '', NULL, \"src\".\"name\")"), "{sql}");
    }

    #[test]
    fn test_insert_without_null_manipulation() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let options = ImportOptions::new().null_manipulation(false);
        let sql = builder
            .insert_all_into_target(&staging(), &destination(), &options, "")
            .unwrap();
        assert!(sql.contains("SELECT \"src\".\"id\", CAST(\"src\".\"name\" AS VARCHAR(50)) FROM"));
    }

    #[test]
    fn test_update_with_primary_key_duckdb() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .update_with_primary_key(&staging(), &destination(), &ImportOptions::new(), "")
            .unwrap()
            .unwrap();
        assert!(sql.starts_with(
            "UPDATE \"s\".\"dst\" AS \"dest\" SET \"name\" = CAST(COALESCE(\"src\".\"name\", '') AS VARCHAR(50)) FROM (SELECT"
        ));
        assert!(sql.contains(
            "WHERE COALESCE(CAST(\"dest\".\"id\" AS VARCHAR), '') = COALESCE(CAST(\"src\".\"id\" AS VARCHAR), '')"
        ));
        assert!(sql.ends_with(
            "AND (COALESCE(CAST(\"dest\".\"name\" AS VARCHAR), '') <> COALESCE(CAST(\"src\".\"name\" AS VARCHAR), ''))"
        ));
        assert!(sql.contains("ROW_NUMBER() OVER (PARTITION BY \"id\""));
    }

    #[test]
    fn test_update_sets_timestamp() {
        let dialect = SnowflakeDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .update_with_primary_key(
                &staging(),
                &destination(),
                &ImportOptions::new().use_timestamp(true),
                "2024-01-01 10:00:00",
            )
            .unwrap()
            .unwrap();
        assert!(sql.contains("\"_timestamp\" = CAST('2024-01-01 10:00:00' AS TIMESTAMP)"));
        assert!(sql.contains("TO_VARCHAR(\"dest\".\"name\")"));
    }

    #[test]
    fn test_update_without_null_manipulation() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .update_with_primary_key(
                &staging(),
                &destination(),
                &ImportOptions::new().null_manipulation(false),
                "",
            )
            .unwrap()
            .unwrap();
        assert!(sql.contains(
            "(\"dest\".\"id\" = \"src\".\"id\" OR (\"dest\".\"id\" IS NULL AND \"src\".\"id\" IS NULL))"
        ));
        assert!(sql.contains("\"dest\".\"name\" IS DISTINCT FROM \"src\".\"name\""));
    }

    #[test]
    fn test_update_skipped_when_only_keys() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let staging = TableDefinition::new("s", "stg", vec![ColumnDefinition::new("id", "INTEGER")]);
        let update = builder
            .update_with_primary_key(&staging, &destination(), &ImportOptions::new(), "")
            .unwrap();
        assert!(update.is_none());
    }

    #[test]
    fn test_update_synapse_uses_table_reference() {
        let dialect = SynapseDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .update_with_primary_key(&staging(), &destination(), &ImportOptions::new(), "")
            .unwrap()
            .unwrap();
        assert!(sql.starts_with("UPDATE [s].[dst] SET [name] ="));
        assert!(sql.contains("COALESCE(CAST([s].[dst].[id] AS NVARCHAR(4000)), '')"));
        assert!(sql.contains("AS [src] WHERE"));
    }

    #[test]
    fn test_update_teradata_shape() {
        let dialect = TeradataDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .update_with_primary_key(&staging(), &destination(), &ImportOptions::new(), "")
            .unwrap()
            .unwrap();
        assert!(sql.starts_with("UPDATE \"s\".\"dst\" FROM (SELECT"));
        assert!(sql.contains(") AS \"src\" SET \"name\" ="));
        assert!(sql.contains("COALESCE(CAST(\"s\".\"dst\".\"name\" AS VARCHAR(32000)), '')"));
    }

    #[test]
    fn test_delete_matched() {
        let dialect = DuckDbDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .delete_matched(
                &staging(),
                &destination(),
                &["id".to_string()],
                &ImportOptions::new(),
            )
            .unwrap();
        assert_eq!(
            sql,
            "DELETE FROM \"s\".\"stg\" WHERE EXISTS (SELECT 1 FROM \"s\".\"dst\" AS \"dest\" WHERE COALESCE(CAST(\"dest\".\"id\" AS VARCHAR), '') = COALESCE(CAST(\"stg\".\"id\" AS VARCHAR), ''))"
        );
    }

    #[test]
    fn test_delete_matched_snowflake_using() {
        let dialect = SnowflakeDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .delete_matched(
                &staging(),
                &destination(),
                &["id".to_string()],
                &ImportOptions::new(),
            )
            .unwrap();
        assert!(sql.starts_with("DELETE FROM \"s\".\"stg\" USING \"s\".\"dst\" AS \"dest\" WHERE"));
    }

    #[test]
    fn test_dedup_insert() {
        let dialect = BigQueryDialect;
        let builder = StatementBuilder::new(&dialect);
        let mut dedup = staging();
        dedup.name = "__temp_DEDUP_x".to_string();
        let sql = builder
            .dedup_insert(&staging(), &dedup, &["id".to_string()])
            .unwrap();
        assert!(sql.starts_with("INSERT INTO `s`.`__temp_DEDUP_x` (`id`, `name`) SELECT `id`, `name` FROM"));
    }

    #[test]
    fn test_ctas_replace() {
        let dialect = SnowflakeDialect;
        let builder = StatementBuilder::new(&dialect);
        let sql = builder
            .ctas_replace(&staging(), &destination(), &ImportOptions::new(), "2024-01-01 00:00:00")
            .unwrap();
        assert_eq!(
            sql,
            "CREATE OR REPLACE TABLE \"s\".\"dst\" AS SELECT \"id\", \"name\", CAST('2024-01-01 00:00:00' AS TIMESTAMP) AS \"_timestamp\" FROM \"s\".\"stg\""
        );
    }

    #[test]
    fn test_ctas_unsupported() {
        let dialect = SynapseDialect;
        let builder = StatementBuilder::new(&dialect);
        let err = builder
            .ctas_replace(&staging(), &destination(), &ImportOptions::new(), "")
            .unwrap_err();
        assert!(matches!(err, ImportError::Unsupported { backend: "synapse", .. }));
    }
}
