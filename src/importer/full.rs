//! Replace-all import

use chrono::{DateTime, Utc};

use super::{format_timestamp, validate_definitions_match};
use crate::builder::{StatementBuilder, validate_primary_keys};
use crate::dialect::SqlDialect;
use crate::error::ImportResult;
use crate::executor::SqlExecutor;
use crate::models::TableDefinition;
use crate::options::{ImportFeature, ImportOptions};
use crate::staging::StageTableDefinitionFactory;
use crate::state::{ImportReport, ImportState};
use crate::transaction::{ImportSession, RetryPolicy, TempTableGuard};

const TIMER_COPY: &str = "copyToTarget";
const TIMER_DEDUP: &str = "dedupAndLoad";
const TIMER_CTAS: &str = "ctasLoad";

/// Replaces the destination content with the staging content
///
/// Without a primary key the destination is truncated and refilled. With a
/// primary key, staging is first collapsed into a dedup table owned by this
/// operation and the truncate and insert run in one transaction.
pub struct FullImporter<'a, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> {
    executor: &'a E,
    dialect: &'a D,
    retry: RetryPolicy,
    timestamp: Option<DateTime<Utc>>,
}

impl<'a, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> FullImporter<'a, E, D> {
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

    /// Move every staging row into `destination`, replacing what it held
    pub fn import_to_table(
        &self,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        mut state: ImportState,
    ) -> ImportResult<ImportReport> {
        let timestamp = format_timestamp(self.timestamp);
        let session = ImportSession::open(self.executor, self.dialect, options, self.retry.clone())?;

        tracing::info!(
            backend = self.dialect.name(),
            staging = %staging.name,
            destination = %destination.name,
            primary_keys = destination.primary_keys.len(),
            "Starting full load"
        );

        if options.has_feature(ImportFeature::CtasFullLoad) {
            self.replace_with_ctas(&session, staging, destination, options, &timestamp, &mut state)?;
        } else if destination.has_primary_keys() {
            self.load_deduplicated(&session, staging, destination, options, &timestamp, &mut state)?;
        } else {
            self.truncate_and_copy(&session, staging, destination, options, &timestamp, &mut state)?;
        }

        state.set_imported_columns(staging.column_names());
        let report = state.into_report();
        tracing::info!(
            destination = %destination.name,
            rows_inserted = report.rows_inserted,
            duration_ms = report.total_duration().as_millis() as u64,
            "Full load finished"
        );
        Ok(report)
    }

    fn truncate_and_copy(
        &self,
        session: &ImportSession<'a, E, D>,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
        state: &mut ImportState,
    ) -> ImportResult<()> {
        let builder = StatementBuilder::new(self.dialect);
        let truncate = builder.truncate(destination);
        let insert = builder.insert_all_into_target(staging, destination, options, timestamp)?;

        state.start_timer(TIMER_COPY);
        let inserted = session.transaction(|| {
            session.execute(&truncate)?;
            session.execute(&insert)
        })?;
        state.stop_timer(TIMER_COPY);
        state.record_inserted(inserted);
        Ok(())
    }

    fn load_deduplicated(
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

        let builder = StatementBuilder::new(self.dialect);
        let dedup_table = StageTableDefinitionFactory::new(self.dialect)
            .create_dedup_table_definition(staging, primary_keys);
        let dedup_insert = builder.dedup_insert(staging, &dedup_table, primary_keys)?;
        let truncate = builder.truncate(destination);
        let insert = builder.insert_all_into_target(&dedup_table, destination, options, timestamp)?;

        state.start_timer(TIMER_DEDUP);
        let guard = TempTableGuard::create(session, &dedup_table)?;
        session.execute(&dedup_insert)?;
        let inserted = session.transaction(|| {
            session.execute(&truncate)?;
            session.execute(&insert)
        })?;
        state.stop_timer(TIMER_DEDUP);
        state.record_inserted(inserted);

        guard.release(state);
        Ok(())
    }

    fn replace_with_ctas(
        &self,
        session: &ImportSession<'a, E, D>,
        staging: &TableDefinition,
        destination: &TableDefinition,
        options: &ImportOptions,
        timestamp: &str,
        state: &mut ImportState,
    ) -> ImportResult<()> {
        validate_definitions_match(staging, destination)?;
        let sql = StatementBuilder::new(self.dialect).ctas_replace(
            staging,
            destination,
            options,
            timestamp,
        )?;

        state.start_timer(TIMER_CTAS);
        let inserted = session.execute(&sql)?;
        state.stop_timer(TIMER_CTAS);
        state.record_inserted(inserted);
        Ok(())
    }
}
