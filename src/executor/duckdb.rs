//! DuckDB executor implementation
//!
//! Runs import statements against an embedded DuckDB database, either
//! file-based or in memory.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{ExecutorError, ExecutorResult, QueryResult, SqlExecutor};

/// DuckDB executor
///
/// Holds one connection. Transactions issued through it as plain
/// `BEGIN`/`COMMIT`/`ROLLBACK` statements span calls, so no session support
/// is needed.
pub struct DuckDbExecutor {
    /// Path to the database file (None for in-memory)
    db_path: Option<PathBuf>,
    /// DuckDB connection (wrapped in Mutex for thread safety)
    connection: Mutex<duckdb::Connection>,
}

impl DuckDbExecutor {
    /// Create a new DuckDB executor with a file-based database
    ///
    /// # Arguments
    /// * `db_path` - Path to the DuckDB database file
    pub fn new(db_path: impl AsRef<Path>) -> ExecutorResult<Self> {
        let path = db_path.as_ref().to_path_buf();
        let connection = duckdb::Connection::open(&path).map_err(|e| {
            ExecutorError::ConnectionFailed(format!("Failed to open DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: Some(path),
            connection: Mutex::new(connection),
        })
    }

    /// Create an in-memory DuckDB executor
    pub fn in_memory() -> ExecutorResult<Self> {
        let connection = duckdb::Connection::open_in_memory().map_err(|e| {
            ExecutorError::ConnectionFailed(format!("Failed to create in-memory DuckDB: {}", e))
        })?;

        Ok(Self {
            db_path: None,
            connection: Mutex::new(connection),
        })
    }

    /// Get the database file path (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Execute multiple SQL statements, e.g. fixture setup
    pub fn execute_batch(&self, sql: &str) -> ExecutorResult<()> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| ExecutorError::ConnectionFailed(format!("Lock error: {}", e)))?;

        conn.execute_batch(sql)
            .map_err(|e| ExecutorError::QueryFailed(format!("Batch execute failed: {}", e)))
    }

    fn run_query(&self, sql: &str, params: &[&dyn duckdb::ToSql]) -> ExecutorResult<QueryResult> {
        let start = std::time::Instant::now();

        let conn = self
            .connection
            .lock()
            .map_err(|e| ExecutorError::ConnectionFailed(format!("Lock error: {}", e)))?;

        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| ExecutorError::QueryFailed(format!("Prepare failed: {}", e)))?;

        // In DuckDB 1.4+, we need to execute the query first, then get columns
        let mut result_rows = stmt
            .query(params)
            .map_err(|e| ExecutorError::QueryFailed(format!("Query failed: {}", e)))?;

        let column_count = result_rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let columns: Vec<String> = (0..column_count)
            .map(|i| {
                result_rows
                    .as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut rows = Vec::new();
        while let Some(row) = result_rows
            .next()
            .map_err(|e| ExecutorError::QueryFailed(format!("Row fetch error: {}", e)))?
        {
            rows.push(Self::row_to_json(row, &columns));
        }

        Ok(QueryResult {
            columns,
            rows,
            rows_affected: None,
            execution_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Convert a DuckDB row to a JSON value
    fn row_to_json(row: &duckdb::Row, columns: &[String]) -> serde_json::Value {
        let mut map = serde_json::Map::new();

        for (i, col_name) in columns.iter().enumerate() {
            let value: serde_json::Value = match row.get_ref(i) {
                Ok(value_ref) => Self::value_ref_to_json(value_ref),
                Err(_) => serde_json::Value::Null,
            };
            map.insert(col_name.clone(), value);
        }

        serde_json::Value::Object(map)
    }

    /// Convert a DuckDB ValueRef to a JSON value
    fn value_ref_to_json(value: duckdb::types::ValueRef) -> serde_json::Value {
        use duckdb::types::ValueRef;

        match value {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Boolean(b) => serde_json::Value::Bool(b),
            ValueRef::TinyInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::SmallInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::Int(i) => serde_json::Value::Number(i.into()),
            ValueRef::BigInt(i) => serde_json::Value::Number(i.into()),
            // i128 may not fit in a JSON number
            ValueRef::HugeInt(i) => serde_json::Value::String(i.to_string()),
            ValueRef::UTinyInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::USmallInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::UInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::UBigInt(i) => serde_json::Value::Number(i.into()),
            ValueRef::Float(f) => serde_json::Number::from_f64(f as f64)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Double(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Text(bytes) => String::from_utf8_lossy(bytes).into_owned().into(),
            ValueRef::Blob(bytes) => {
                use base64::Engine;
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(bytes))
            }
            ValueRef::Decimal(d) => serde_json::Value::String(d.to_string()),
            other => serde_json::Value::String(format!("{:?}", other)),
        }
    }
}

impl SqlExecutor for DuckDbExecutor {
    fn backend_type(&self) -> &'static str {
        "duckdb"
    }

    fn execute(&self, sql: &str) -> ExecutorResult<u64> {
        let conn = self
            .connection
            .lock()
            .map_err(|e| ExecutorError::ConnectionFailed(format!("Lock error: {}", e)))?;

        conn.execute(sql, [])
            .map(|rows| rows as u64)
            .map_err(|e| ExecutorError::QueryFailed(format!("Execute failed: {}", e)))
    }

    fn query(&self, sql: &str) -> ExecutorResult<QueryResult> {
        self.run_query(sql, &[])
    }

    fn query_with_bindings(
        &self,
        sql: &str,
        bindings: &[serde_json::Value],
    ) -> ExecutorResult<QueryResult> {
        // Bound as strings; DuckDB casts them to the parameter type
        let string_params: Vec<Option<String>> = bindings
            .iter()
            .map(|p| match p {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect();

        let param_refs: Vec<&dyn duckdb::ToSql> = string_params
            .iter()
            .map(|s| s as &dyn duckdb::ToSql)
            .collect();

        self.run_query(sql, &param_refs)
    }
}
