//! Full and incremental import of a loaded staging table
//!
//! Both importers expect the stage loader to have created and filled the
//! staging table already. They own every statement issued afterwards:
//! dedup/working tables, the transaction, the rollback and the cleanup.
//!
//! ## Timers
//!
//! | importer    | branch             | timers                                   |
//! |-------------|--------------------|------------------------------------------|
//! | full        | no primary key     | `copyToTarget`                           |
//! | full        | primary key        | `dedupAndLoad`                           |
//! | full        | CTAS feature       | `ctasLoad`                               |
//! | incremental | no primary key     | `insertIntoTargetFromStaging`            |
//! | incremental | primary key        | `dedupTableCreate`, `updateTargetTable`, `deleteUpdatedRowsFromStaging`, `dedupStaging`, `insertIntoTargetFromStaging` |

mod full;
mod incremental;

pub use full::FullImporter;
pub use incremental::IncrementalImporter;

use chrono::{DateTime, Utc};

use crate::dialect::SqlDialect;
use crate::error::{ImportError, ImportResult};
use crate::executor::SqlExecutor;
use crate::models::TableDefinition;
use crate::options::{ImportOptions, TIMESTAMP_COLUMN_NAME};
use crate::state::{ImportReport, ImportState};
use crate::transaction::RetryPolicy;

/// Format of the value written to the timestamp column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format `at`, or the current UTC time when `None`
pub fn format_timestamp(at: Option<DateTime<Utc>>) -> String {
    at.unwrap_or_else(Utc::now).format(TIMESTAMP_FORMAT).to_string()
}

/// Check that two definitions describe the same table shape
///
/// The timestamp column is ignored. Column names, primary keys and column
/// types must all agree; the first mismatch is reported.
pub fn validate_definitions_match(
    staging: &TableDefinition,
    destination: &TableDefinition,
) -> ImportResult<()> {
    let staging_columns: Vec<_> = staging
        .columns
        .iter()
        .filter(|c| c.name != TIMESTAMP_COLUMN_NAME)
        .collect();
    let destination_columns: Vec<_> = destination
        .columns
        .iter()
        .filter(|c| c.name != TIMESTAMP_COLUMN_NAME)
        .collect();

    if staging_columns.len() != destination_columns.len() {
        return Err(ImportError::Configuration(format!(
            "Tables don't have same number of columns: staging has {}, destination \"{}\" has {}",
            staging_columns.len(),
            destination.name,
            destination_columns.len()
        )));
    }

    for column in &staging_columns {
        let Some(target) = destination.column(&column.name) else {
            return Err(ImportError::Configuration(format!(
                "Column \"{}\" not found in destination table \"{}\"",
                column.name, destination.name
            )));
        };
        if column.sql_type() != target.sql_type() {
            return Err(ImportError::Configuration(format!(
                "Column \"{}\" has type \"{}\" in staging but \"{}\" in destination",
                column.name,
                column.sql_type(),
                target.sql_type()
            )));
        }
    }

    let mut staging_keys = staging.primary_keys.clone();
    let mut destination_keys = destination.primary_keys.clone();
    staging_keys.sort();
    destination_keys.sort();
    if staging_keys != destination_keys {
        return Err(ImportError::Configuration(format!(
            "Primary keys do not match: staging has \"{}\", destination has \"{}\"",
            staging_keys.join(", "),
            destination_keys.join(", ")
        )));
    }

    Ok(())
}

/// Runs a full or incremental import depending on the options
pub struct Importer<'a, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> {
    executor: &'a E,
    dialect: &'a D,
    retry: RetryPolicy,
    timestamp: Option<DateTime<Utc>>,
}

impl<'a, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> Importer<'a, E, D> {
    pub fn new(executor: &'a E, dialect: &'a D) -> Self {
        Self {
            executor,
            dialect,
            retry: RetryPolicy::default(),
            timestamp: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Use a fixed timestamp instead of the current time
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn import_to_table(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        state: ImportState,
    ) -> ImportResult<ImportReport> {
        if options.is_incremental() {
            let mut importer = IncrementalImporter::new(self.executor, self.dialect)
                .with_retry_policy(self.retry.clone());
            if let Some(timestamp) = self.timestamp {
                importer = importer.with_timestamp(timestamp);
            }
            importer.import_to_table(staging, destination, options, state)
        } else {
            let mut importer =
                FullImporter::new(self.executor, self.dialect).with_retry_policy(self.retry.clone());
            if let Some(timestamp) = self.timestamp {
                importer = importer.with_timestamp(timestamp);
            }
            importer.import_to_table(staging, destination, options, state)
        }
    }
}
