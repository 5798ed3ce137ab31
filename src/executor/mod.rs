//! SQL executor abstraction
//!
//! The engine never talks to a warehouse directly. It drives a synchronous
//! [`SqlExecutor`] supplied by the caller:
//! - `execute` for statements returning an affected-row count
//! - `query` for statements returning rows
//! - optional sessions for backends where a transaction must span calls
//!
//! An embedded DuckDB executor is available behind the `duckdb-backend`
//! feature.

use serde::{Deserialize, Serialize};

#[cfg(feature = "duckdb-backend")]
pub mod duckdb;

#[cfg(feature = "duckdb-backend")]
pub use self::duckdb::DuckDbExecutor;

/// Error type for executor operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExecutorError {
    /// Failed to connect or acquire the connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Statement execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// The executor does not provide the requested capability
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl ExecutorError {
    /// Backend message without the variant prefix
    pub fn message(&self) -> &str {
        match self {
            ExecutorError::ConnectionFailed(m)
            | ExecutorError::QueryFailed(m)
            | ExecutorError::Unsupported(m) => m,
        }
    }
}

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Opaque identifier of a backend session
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Query result row as a JSON value
pub type QueryRow = serde_json::Value;

/// Query result set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    /// Column names
    pub columns: Vec<String>,
    /// Rows of data
    pub rows: Vec<QueryRow>,
    /// Number of rows affected (for INSERT/UPDATE/DELETE)
    pub rows_affected: Option<u64>,
    /// Execution time in milliseconds
    pub execution_time_ms: u64,
}

impl QueryResult {
    /// Create a new query result
    pub fn new(columns: Vec<String>, rows: Vec<QueryRow>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: None,
            execution_time_ms: 0,
        }
    }

    /// Create an empty result
    pub fn empty() -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            rows_affected: None,
            execution_time_ms: 0,
        }
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First column of the first row, for `SELECT COUNT(*)` style queries
    pub fn scalar(&self) -> Option<&serde_json::Value> {
        let first = self.rows.first()?;
        match first {
            serde_json::Value::Object(map) => self
                .columns
                .first()
                .and_then(|c| map.get(c))
                .or_else(|| map.values().next()),
            serde_json::Value::Array(values) => values.first(),
            other => Some(other),
        }
    }

    /// Scalar interpreted as an unsigned count; numeric strings are accepted
    pub fn scalar_u64(&self) -> Option<u64> {
        match self.scalar()? {
            serde_json::Value::Number(n) => n.as_u64(),
            serde_json::Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Synchronous SQL executor consumed by the importers
pub trait SqlExecutor {
    /// Short backend name used in logs
    fn backend_type(&self) -> &'static str;

    /// Execute a statement and return the affected row count
    fn execute(&self, sql: &str) -> ExecutorResult<u64>;

    /// Execute a statement returning rows
    fn query(&self, sql: &str) -> ExecutorResult<QueryResult>;

    /// Execute a parameterised statement returning rows
    fn query_with_bindings(
        &self,
        _sql: &str,
        _bindings: &[serde_json::Value],
    ) -> ExecutorResult<QueryResult> {
        Err(ExecutorError::Unsupported(format!(
            "{} executor does not support bound parameters",
            self.backend_type()
        )))
    }

    /// Open a session spanning several statements, if the backend has them
    fn begin_session(&self) -> ExecutorResult<Option<SessionId>> {
        Ok(None)
    }

    fn execute_in_session(&self, _session: &SessionId, sql: &str) -> ExecutorResult<u64> {
        self.execute(sql)
    }

    fn query_in_session(&self, _session: &SessionId, sql: &str) -> ExecutorResult<QueryResult> {
        self.query(sql)
    }

    /// Close a session opened by [`SqlExecutor::begin_session`]
    fn end_session(&self, _session: &SessionId) -> ExecutorResult<()> {
        Ok(())
    }
}

/// Statement scope for one import operation
///
/// Every statement of an operation goes through one `Session`. A session
/// supplied by the caller is borrowed; one opened here is closed on drop.
pub struct Session<'e, E: SqlExecutor + ?Sized> {
    executor: &'e E,
    id: Option<SessionId>,
    owned: bool,
}

impl<'e, E: SqlExecutor + ?Sized> Session<'e, E> {
    /// Scope statements to `supplied`, or open a session when `required`
    pub fn open(
        executor: &'e E,
        supplied: Option<&SessionId>,
        required: bool,
    ) -> ExecutorResult<Self> {
        if let Some(id) = supplied {
            return Ok(Self {
                executor,
                id: Some(id.clone()),
                owned: false,
            });
        }

        if !required {
            return Ok(Self {
                executor,
                id: None,
                owned: false,
            });
        }

        match executor.begin_session()? {
            Some(id) => {
                tracing::debug!(backend = executor.backend_type(), session = %id, "Opened session");
                Ok(Self {
                    executor,
                    id: Some(id),
                    owned: true,
                })
            }
            None => Err(ExecutorError::Unsupported(format!(
                "{} executor cannot open a session",
                executor.backend_type()
            ))),
        }
    }

    pub fn id(&self) -> Option<&SessionId> {
        self.id.as_ref()
    }

    pub fn backend_type(&self) -> &'static str {
        self.executor.backend_type()
    }

    pub fn execute(&self, sql: &str) -> ExecutorResult<u64> {
        tracing::debug!(backend = self.backend_type(), sql, "Executing statement");
        match &self.id {
            Some(id) => self.executor.execute_in_session(id, sql),
            None => self.executor.execute(sql),
        }
    }

    pub fn query(&self, sql: &str) -> ExecutorResult<QueryResult> {
        tracing::debug!(backend = self.backend_type(), sql, "Running query");
        match &self.id {
            Some(id) => self.executor.query_in_session(id, sql),
            None => self.executor.query(sql),
        }
    }
}

impl<E: SqlExecutor + ?Sized> Drop for Session<'_, E> {
    fn drop(&mut self) {
        if self.owned
            && let Some(id) = &self.id
            && let Err(e) = self.executor.end_session(id)
        {
            tracing::warn!(session = %id, error = %e, "Failed to close session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[derive(Default)]
    struct SessionExecutor {
        calls: RefCell<Vec<String>>,
        sessions: bool,
    }

    impl SqlExecutor for SessionExecutor {
        fn backend_type(&self) -> &'static str {
            "test"
        }

        fn execute(&self, sql: &str) -> ExecutorResult<u64> {
            self.calls.borrow_mut().push(format!("plain:{sql}"));
            Ok(0)
        }

        fn query(&self, _sql: &str) -> ExecutorResult<QueryResult> {
            Ok(QueryResult::empty())
        }

        fn begin_session(&self) -> ExecutorResult<Option<SessionId>> {
            Ok(self.sessions.then(|| SessionId::new("s1")))
        }

        fn execute_in_session(&self, session: &SessionId, sql: &str) -> ExecutorResult<u64> {
            self.calls.borrow_mut().push(format!("{session}:{sql}"));
            Ok(1)
        }

        fn end_session(&self, session: &SessionId) -> ExecutorResult<()> {
            self.calls.borrow_mut().push(format!("end:{session}"));
            Ok(())
        }
    }

    #[test]
    fn test_query_result_scalar() {
        let result = QueryResult::new(vec!["cnt".to_string()], vec![json!({"cnt": 3})]);
        assert_eq!(result.scalar_u64(), Some(3));

        let result = QueryResult::new(vec!["cnt".to_string()], vec![json!({"cnt": "7"})]);
        assert_eq!(result.scalar_u64(), Some(7));

        assert_eq!(QueryResult::empty().scalar_u64(), None);
    }

    #[test]
    fn test_session_not_required() {
        let executor = SessionExecutor::default();
        let session = Session::open(&executor, None, false).unwrap();
        assert!(session.id().is_none());
        session.execute("SELECT 1").unwrap();
        assert_eq!(executor.calls.borrow()[0], "plain:SELECT 1");
    }

    #[test]
    fn test_owned_session_closed_on_drop() {
        let executor = SessionExecutor {
            sessions: true,
            ..Default::default()
        };
        {
            let session = Session::open(&executor, None, true).unwrap();
            assert_eq!(session.execute("SELECT 1").unwrap(), 1);
        }
        let calls = executor.calls.borrow();
        assert_eq!(calls.as_slice(), ["s1:SELECT 1", "end:s1"]);
    }

    #[test]
    fn test_supplied_session_not_closed() {
        let executor = SessionExecutor::default();
        let id = SessionId::new("caller");
        {
            let session = Session::open(&executor, Some(&id), true).unwrap();
            session.execute("SELECT 1").unwrap();
        }
        assert_eq!(executor.calls.borrow().as_slice(), ["caller:SELECT 1"]);
    }

    #[test]
    fn test_required_session_unavailable() {
        let executor = SessionExecutor::default();
        let err = Session::open(&executor, None, true).err().unwrap();
        assert!(matches!(err, ExecutorError::Unsupported(_)));
    }

    #[test]
    fn test_bindings_unsupported_by_default() {
        let executor = SessionExecutor::default();
        let err = executor.query_with_bindings("SELECT ?", &[json!(1)]).unwrap_err();
        assert!(matches!(err, ExecutorError::Unsupported(_)));
    }
}
