//! Upsert import

use chrono::{DateTime, Utc};

use super::format_timestamp;
use crate::builder::{StatementBuilder, validate_primary_keys};
use crate::dialect::SqlDialect;
use crate::error::{ImportError, ImportResult};
use crate::executor::SqlExecutor;
use crate::models::TableDefinition;
use crate::options::ImportOptions;
use crate::staging::StageTableDefinitionFactory;
use crate::state::{ImportReport, ImportState};
use crate::transaction::{ImportSession, RetryPolicy, TempTableGuard};

const TIMER_DEDUP_TABLE_CREATE: &str = "dedupTableCreate";
const TIMER_UPDATE: &str = "updateTargetTable";
const TIMER_DELETE: &str = "deleteUpdatedRowsFromStaging";
const TIMER_DEDUP: &str = "dedupStaging";
const TIMER_INSERT: &str = "insertIntoTargetFromStaging";

/// Appends staging rows to the destination, updating rows whose key exists
///
/// Without a primary key every staging row is appended. With one, the
/// sequence inside a single transaction is: update changed rows, delete the
/// updated keys from staging, collapse the remaining duplicate keys into a
/// working table, append the working table.
pub struct IncrementalImporter<'a, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> {
    executor: &'a E,
    dialect: &'a D,
    retry: RetryPolicy,
    timestamp: Option<DateTime<Utc>>,
}

/// Statements of the primary-key path, built before anything runs
struct UpsertPlan {
    update: Option<String>,
    delete_matched: String,
    dedup_insert: String,
    truncate_staging: String,
    insert: String,
}

impl<'a, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> IncrementalImporter<'a, E, D> {
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

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn import_to_table(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        mut state: ImportState,
    ) -> ImportResult<ImportReport> {
        if destination.has_primary_keys() && !self.dialect.supports_incremental_dedup() {
            return Err(ImportError::Unsupported {
                backend: self.dialect.name(),
                operation: "incremental load with primary key deduplication".to_string(),
            });
        }

        let timestamp = format_timestamp(self.timestamp);
        let session = ImportSession::open(self.executor, self.dialect, options, self.retry.clone())?;

        tracing::info!(
            backend = self.dialect.name(),
            staging = %staging.name,
            destination = %destination.name,
            primary_keys = destination.primary_keys.len(),
            "Starting incremental load"
        );

        if destination.has_primary_keys() {
            self.upsert(&session, staging, destination, options, &timestamp, &mut state)?;
        } else {
            self.append(&session, staging, destination, options, &timestamp, &mut state)?;
        }

        state.set_imported_columns(staging.column_names());
        let report = state.into_report();
        tracing::info!(
            destination = %destination.name,
            rows_inserted = report.rows_inserted,
            rows_updated = report.rows_updated,
            duration_ms = report.total_duration().as_millis() as u64,
            "Incremental load finished"
        );
        Ok(report)
    }

    fn append(
        &self,
        session: &ImportSession<'a, E, D>,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
        state: &mut ImportState,
    ) -> ImportResult<()> {
        let insert = StatementBuilder::new(self.dialect).insert_all_into_target(
            staging,
            destination,
            options,
            timestamp,
        )?;

        state.start_timer(TIMER_INSERT);
        let inserted = session.transaction(|| session.execute(&insert))?;
        state.stop_timer(TIMER_INSERT);
        state.record_inserted(inserted);
        Ok(())
    }

    fn plan(
        &self,
        staging: &TableDefinition,
        working: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
    ) -> ImportResult<UpsertPlan> {
        let builder = StatementBuilder::new(self.dialect);
        let primary_keys = &destination.primary_keys;

        Ok(UpsertPlan {
            update: builder.update_with_primary_key(staging, destination, options, timestamp)?,
            delete_matched: builder.delete_matched(staging, destination, primary_keys, options)?,
            dedup_insert: builder.dedup_insert(staging, working, primary_keys)?,
            truncate_staging: builder.truncate(staging),
            insert: builder.insert_all_into_target(working, destination, options, timestamp)?,
        })
    }

    fn upsert(
        &self,
        session: &ImportSession<'a, E, D>,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
        state: &mut ImportState,
    ) -> ImportResult<()> {
        let primary_keys = &destination.primary_keys;
        validate_primary_keys(primary_keys, &[staging, destination])?;

        let working = StageTableDefinitionFactory::new(self.dialect)
            .create_dedup_table_definition(staging, primary_keys);
        let plan = self.plan(staging, &working, destination, options, timestamp)?;

        state.start_timer(TIMER_DEDUP_TABLE_CREATE);
        let guard = TempTableGuard::create(session, &working)?;
        state.stop_timer(TIMER_DEDUP_TABLE_CREATE);

        session.transaction(|| {
            if let Some(update) = &plan.update {
                state.start_timer(TIMER_UPDATE);
                let updated = session.execute(update)?;
                state.stop_timer(TIMER_UPDATE);
                state.record_updated(updated);
            }

            state.start_timer(TIMER_DELETE);
            session.execute(&plan.delete_matched)?;
            state.stop_timer(TIMER_DELETE);

            state.start_timer(TIMER_DEDUP);
            session.execute(&plan.dedup_insert)?;
            session.execute(&plan.truncate_staging)?;
            state.stop_timer(TIMER_DEDUP);

            state.start_timer(TIMER_INSERT);
            let inserted = session.execute(&plan.insert)?;
            state.stop_timer(TIMER_INSERT);
            state.record_inserted(inserted);
            Ok(())
        })?;

        guard.release(state);
        Ok(())
    }
}
