//! Per-operation bookkeeping returned to the caller

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Elapsed time of one named phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerRecord {
    pub name: String,
    pub duration_ms: u64,
}

/// Mutable accumulator for one import operation
///
/// Created by the caller before the stage loader runs, passed to the
/// importer, and turned into an [`ImportReport`] at the end.
#[derive(Debug, Default)]
pub struct ImportState {
    staging_table_name: String,
    running: HashMap<String, Instant>,
    timers: Vec<TimerRecord>,
    imported_rows_count: u64,
    imported_columns: Vec<String>,
    rows_inserted: u64,
    rows_updated: u64,
    warnings: Vec<String>,
}

impl ImportState {
    pub fn new(staging_table_name: impl Into<String>) -> Self {
        Self {
            staging_table_name: staging_table_name.into(),
            ..Default::default()
        }
    }

    pub fn staging_table_name(&self) -> &str {
        &self.staging_table_name
    }

    /// Start a named timer; a timer that is already running keeps its start
    pub fn start_timer(&mut self, name: &str) {
        if self.running.contains_key(name) {
            tracing::debug!(timer = name, "timer already running");
            return;
        }
        self.running.insert(name.to_string(), Instant::now());
    }

    /// Stop a named timer and record its elapsed time
    pub fn stop_timer(&mut self, name: &str) -> Option<Duration> {
        let started = self.running.remove(name)?;
        let elapsed = started.elapsed();
        self.timers.push(TimerRecord {
            name: name.to_string(),
            duration_ms: elapsed.as_millis() as u64,
        });
        Some(elapsed)
    }

    pub fn is_timer_running(&self, name: &str) -> bool {
        self.running.contains_key(name)
    }

    pub fn timers(&self) -> &[TimerRecord] {
        &self.timers
    }

    /// Add rows reported by the stage loader
    pub fn add_imported_rows_count(&mut self, rows: u64) {
        self.imported_rows_count += rows;
    }

    pub fn imported_rows_count(&self) -> u64 {
        self.imported_rows_count
    }

    pub fn set_imported_columns<I, S>(&mut self, columns: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.imported_columns = columns.into_iter().map(Into::into).collect();
    }

    pub fn imported_columns(&self) -> &[String] {
        &self.imported_columns
    }

    pub(crate) fn record_inserted(&mut self, rows: u64) {
        self.rows_inserted += rows;
    }

    pub(crate) fn record_updated(&mut self, rows: u64) {
        self.rows_updated += rows;
    }

    /// Attach a non-fatal problem to the result
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Finish the operation; timers still running are stopped
    pub fn into_report(mut self) -> ImportReport {
        let running: Vec<String> = self.running.keys().cloned().collect();
        for name in running {
            self.stop_timer(&name);
        }

        ImportReport {
            staging_table_name: self.staging_table_name,
            imported_rows_count: self.imported_rows_count,
            imported_columns: self.imported_columns,
            rows_inserted: self.rows_inserted,
            rows_updated: self.rows_updated,
            timers: self.timers,
            warnings: self.warnings,
        }
    }
}

/// Outcome of a successful import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub staging_table_name: String,
    /// Rows reported by the stage loader
    pub imported_rows_count: u64,
    pub imported_columns: Vec<String>,
    /// Rows inserted into the destination, as reported by the executor
    pub rows_inserted: u64,
    /// Rows updated in place during an incremental load
    pub rows_updated: u64,
    pub timers: Vec<TimerRecord>,
    pub warnings: Vec<String>,
}

impl ImportReport {
    pub fn timer(&self, name: &str) -> Option<&TimerRecord> {
        self.timers.iter().find(|t| t.name == name)
    }

    /// Total time across recorded phases
    pub fn total_duration(&self) -> Duration {
        Duration::from_millis(self.timers.iter().map(|t| t.duration_ms).sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_start_stop() {
        let mut state = ImportState::new("__temp_x");
        state.start_timer("copyFromStagingToTarget");
        assert!(state.is_timer_running("copyFromStagingToTarget"));
        assert!(state.stop_timer("copyFromStagingToTarget").is_some());
        assert!(!state.is_timer_running("copyFromStagingToTarget"));
        assert_eq!(state.timers().len(), 1);
    }

    #[test]
    fn test_stop_unknown_timer() {
        let mut state = ImportState::default();
        assert!(state.stop_timer("nothing").is_none());
        assert!(state.timers().is_empty());
    }

    #[test]
    fn test_into_report_stops_running_timers() {
        let mut state = ImportState::new("__temp_x");
        state.add_imported_rows_count(2);
        state.add_imported_rows_count(3);
        state.set_imported_columns(["id", "val"]);
        state.start_timer("dedupStaging");
        state.add_warning("cleanup failed");

        let result = state.into_report();
        assert_eq!(result.imported_rows_count, 5);
        assert_eq!(result.imported_columns, vec!["id", "val"]);
        assert!(result.timer("dedupStaging").is_some());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ImportState::new("stg").into_report();
        let json = serde_json::to_string(&result).unwrap();
        assert!(json.contains("importedRowsCount"));
        assert!(json.contains("stagingTableName"));
    }
}
