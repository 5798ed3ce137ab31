//! Transactions, retryable rollback and scoped temp-table cleanup
//!
//! A failed statement inside a transaction is followed by a ROLLBACK. The
//! rollback itself can fail while a statement of the failed transaction
//! (typically a TRUNCATE) still holds its lock, so it is retried with
//! exponential random backoff before giving up.

use rand::Rng;
use std::time::Duration;

use crate::dialect::{DropStatement, SqlDialect};
use crate::error::{ImportError, ImportResult};
use crate::executor::{ExecutorError, QueryResult, Session, SqlExecutor};
use crate::models::TableDefinition;
use crate::options::ImportOptions;
use crate::state::ImportState;

/// Default number of ROLLBACK attempts
pub const DEFAULT_ROLLBACK_ATTEMPTS: u32 = 10;
/// Default wait before the first retry
pub const DEFAULT_INITIAL_INTERVAL_MS: u64 = 500;
/// Default growth of the wait between retries
pub const DEFAULT_MULTIPLIER: f64 = 1.5;
/// Default cap on a single wait
pub const DEFAULT_MAX_INTERVAL_MS: u64 = 30_000;

/// Backoff policy for ROLLBACK retries
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub multiplier: f64,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_ROLLBACK_ATTEMPTS,
            initial_interval: Duration::from_millis(DEFAULT_INITIAL_INTERVAL_MS),
            multiplier: DEFAULT_MULTIPLIER,
            max_interval: Duration::from_millis(DEFAULT_MAX_INTERVAL_MS),
        }
    }
}

impl RetryPolicy {
    /// Retry without waiting
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_interval: Duration::ZERO,
            multiplier: 1.0,
            max_interval: Duration::ZERO,
        }
    }

    /// Wait before retry number `retry` (0-based)
    ///
    /// The interval grows by `multiplier` per retry, capped at
    /// `max_interval`; the actual wait is drawn between the interval and its
    /// next step.
    pub fn backoff(&self, retry: u32) -> Duration {
        let max = self.max_interval.as_millis() as u64;
        let base = (self.initial_interval.as_millis() as f64
            * self.multiplier.powi(retry.min(64) as i32))
        .min(max as f64) as u64;
        let upper = ((base as f64) * self.multiplier).min(max as f64) as u64;

        if upper <= base {
            return Duration::from_millis(base);
        }
        Duration::from_millis(rand::rng().random_range(base..=upper))
    }
}

/// Statement scope of one import operation
///
/// Pairs the executor session with the dialect so every failure is
/// classified the same way, and owns the transaction and rollback logic.
pub struct ImportSession<'e, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> {
    session: Session<'e, E>,
    dialect: &'e D,
    retry: RetryPolicy,
}

impl<'e, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> ImportSession<'e, E, D> {
    /// Open the statement scope, creating a backend session when the dialect needs one
    pub fn open(
        executor: &'e E,
        dialect: &'e D,
        options: &ImportOptions,
        retry: RetryPolicy,
    ) -> ImportResult<Self> {
        let session = Session::open(executor, options.session(), dialect.requires_session())
            .map_err(|e| match e {
                ExecutorError::Unsupported(message) => ImportError::Unsupported {
                    backend: dialect.name(),
                    operation: message,
                },
                other => ImportError::Execution {
                    sql: String::new(),
                    source: other,
                },
            })?;

        Ok(Self {
            session,
            dialect,
            retry,
        })
    }

    pub fn dialect(&self) -> &'e D {
        self.dialect
    }

    fn classify(&self, sql: &str, error: ExecutorError) -> ImportError {
        let class = self.dialect.classify_error(error.message());
        ImportError::from_execution(sql, error, class)
    }

    /// Execute one statement, returning affected rows
    pub fn execute(&self, sql: &str) -> ImportResult<u64> {
        self.session
            .execute(sql)
            .map_err(|e| self.classify(sql, e))
    }

    pub fn query(&self, sql: &str) -> ImportResult<QueryResult> {
        self.session.query(sql).map_err(|e| self.classify(sql, e))
    }

    /// Run an idempotent drop
    pub fn drop_table(&self, statement: &DropStatement) -> ImportResult<()> {
        match statement {
            DropStatement::Direct(sql) => self.execute(sql).map(|_| ()),
            DropStatement::Guarded { exists_query, drop } => {
                let exists = self.query(exists_query)?.scalar_u64().unwrap_or(0) > 0;
                if exists {
                    self.execute(drop)?;
                }
                Ok(())
            }
        }
    }

    /// Run `body` between BEGIN and COMMIT
    ///
    /// Any failure after BEGIN, including a failed COMMIT, triggers a
    /// retried ROLLBACK. The original failure is returned; if the rollback
    /// also gives up, both are reported with the original as primary cause.
    pub fn transaction<T>(&self, body: impl FnOnce() -> ImportResult<T>) -> ImportResult<T> {
        if let Some(begin) = self.dialect.begin_transaction() {
            self.execute(begin)?;
        }

        let value = match body() {
            Ok(value) => value,
            Err(e) => return Err(self.abort(e)),
        };

        if let Err(e) = self.execute(self.dialect.commit()) {
            return Err(self.abort(e));
        }
        Ok(value)
    }

    fn abort(&self, original: ImportError) -> ImportError {
        tracing::warn!(
            backend = self.dialect.name(),
            error = %original,
            "Transaction failed, rolling back"
        );
        match self.rollback_with_retry() {
            Ok(()) => original,
            Err(rollback) => {
                tracing::error!(
                    backend = self.dialect.name(),
                    attempts = self.retry.max_attempts,
                    error = %rollback,
                    "Rollback retries exhausted"
                );
                ImportError::RollbackFailed {
                    original: Box::new(original),
                    rollback,
                    attempts: self.retry.max_attempts.max(1),
                }
            }
        }
    }

    /// Issue ROLLBACK until it succeeds or the retry budget runs out
    pub fn rollback_with_retry(&self) -> Result<(), ExecutorError> {
        let sql = self.dialect.rollback();
        let attempts = self.retry.max_attempts.max(1);
        let mut retry = 0;

        loop {
            match self.session.execute(sql) {
                Ok(_) => return Ok(()),
                Err(e) if retry + 1 >= attempts => return Err(e),
                Err(e) => {
                    let backoff = self.retry.backoff(retry);
                    tracing::warn!(
                        attempt = retry + 1,
                        max_attempts = attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Rollback failed, backing off before retry"
                    );
                    std::thread::sleep(backoff);
                    retry += 1;
                }
            }
        }
    }
}

/// Drops a temporary table when the owning operation ends
///
/// The drop is registered before the table is created, so it runs on every
/// exit path: explicitly through [`TempTableGuard::release`], or on drop when
/// an error unwinds the operation early.
pub struct TempTableGuard<'s, 'e, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> {
    session: &'s ImportSession<'e, E, D>,
    table: String,
    drop: Option<DropStatement>,
}

impl<'s, 'e, E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> TempTableGuard<'s, 'e, E, D> {
    /// Create `table` and register its drop
    pub fn create(
        session: &'s ImportSession<'e, E, D>,
        table: &TableDefinition,
    ) -> ImportResult<Self> {
        let dialect = session.dialect();
        let guard = Self {
            session,
            table: dialect.table_ref(&table.schema, &table.name),
            drop: Some(dialect.drop_table_if_exists(&table.schema, &table.name)),
        };
        session.execute(&dialect.create_table(table))?;
        Ok(guard)
    }

    /// Drop the table now; a failure is logged and attached to `state`
    pub fn release(mut self, state: &mut ImportState) {
        if let Some(drop) = self.drop.take()
            && let Err(e) = self.session.drop_table(&drop)
        {
            tracing::warn!(table = %self.table, error = %e, "Failed to drop temporary table");
            state.add_warning(format!(
                "Failed to drop temporary table {}: {}",
                self.table, e
            ));
        }
    }
}

impl<E: SqlExecutor + ?Sized, D: SqlDialect + ?Sized> Drop for TempTableGuard<'_, '_, E, D> {
    fn drop(&mut self) {
        if let Some(drop) = self.drop.take()
            && let Err(e) = self.session.drop_table(&drop)
        {
            tracing::warn!(table = %self.table, error = %e, "Failed to drop temporary table");
        }
    }
}
