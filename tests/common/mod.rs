//! Shared test helpers

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;

use serde_json::json;
use warehouse_import::{
    ColumnDefinition, ExecutorError, ExecutorResult, QueryResult, SessionId, SqlExecutor,
    TableDefinition,
};

/// Executor that records statements instead of running them
///
/// Tables created and dropped through it are tracked by their reference so
/// tests can assert that nothing is left behind. Statements containing a
/// configured substring fail.
#[derive(Default)]
pub struct RecordingExecutor {
    statements: RefCell<Vec<String>>,
    failures: Vec<(String, String)>,
    rollback_failures: Cell<u32>,
    tables: RefCell<BTreeSet<String>>,
    sessions: bool,
    session_events: RefCell<Vec<String>>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement containing `fragment`
    pub fn failing_on(self, fragment: &str) -> Self {
        let message = format!("Injected failure on '{}'", fragment);
        self.failing_with(fragment, &message)
    }

    /// Fail every statement containing `fragment` with a backend message
    pub fn failing_with(mut self, fragment: &str, message: &str) -> Self {
        self.failures
            .push((fragment.to_string(), message.to_string()));
        self
    }

    /// Fail the next `count` rollbacks
    pub fn failing_rollbacks(self, count: u32) -> Self {
        self.rollback_failures.set(count);
        self
    }

    pub fn with_sessions(mut self) -> Self {
        self.sessions = true;
        self
    }

    pub fn statements(&self) -> Vec<String> {
        self.statements.borrow().clone()
    }

    /// First word of every statement
    pub fn verbs(&self) -> Vec<String> {
        self.statements
            .borrow()
            .iter()
            .map(|s| s.split_whitespace().next().unwrap_or_default().to_string())
            .collect()
    }

    pub fn count_matching(&self, fragment: &str) -> usize {
        self.statements
            .borrow()
            .iter()
            .filter(|s| s.contains(fragment))
            .count()
    }

    pub fn position(&self, prefix: &str) -> Option<usize> {
        self.statements
            .borrow()
            .iter()
            .position(|s| s.starts_with(prefix))
    }

    /// Tables created through this executor and not dropped
    pub fn live_tables(&self) -> Vec<String> {
        self.tables.borrow().iter().cloned().collect()
    }

    pub fn session_events(&self) -> Vec<String> {
        self.session_events.borrow().clone()
    }

    fn track(&self, sql: &str) {
        if sql.starts_with("CREATE ")
            && let Some(rest) = sql.split_once("TABLE ").map(|(_, rest)| rest)
        {
            let table = rest
                .split(|c: char| c == ' ' || c == ',')
                .next()
                .unwrap_or_default();
            self.tables.borrow_mut().insert(table.to_string());
        } else if let Some((_, rest)) = sql.split_once("DROP TABLE ") {
            let table = rest.trim_start_matches("IF EXISTS ").trim();
            self.tables.borrow_mut().remove(table);
        }
    }
}

impl SqlExecutor for RecordingExecutor {
    fn backend_type(&self) -> &'static str {
        "recording"
    }

    fn execute(&self, sql: &str) -> ExecutorResult<u64> {
        self.statements.borrow_mut().push(sql.to_string());

        if sql.starts_with("ROLLBACK") && self.rollback_failures.get() > 0 {
            self.rollback_failures.set(self.rollback_failures.get() - 1);
            return Err(ExecutorError::QueryFailed(
                "Transaction is blocked by a running statement".to_string(),
            ));
        }
        if let Some((_, message)) = self
            .failures
            .iter()
            .find(|(fragment, _)| sql.contains(fragment.as_str()))
        {
            return Err(ExecutorError::QueryFailed(message.clone()));
        }

        self.track(sql);
        Ok(1)
    }

    fn query(&self, sql: &str) -> ExecutorResult<QueryResult> {
        self.statements.borrow_mut().push(sql.to_string());

        let count = match sql.split_once("TableName = '") {
            Some((_, rest)) => {
                let name = rest.split('\'').next().unwrap_or_default();
                self.tables
                    .borrow()
                    .iter()
                    .filter(|t| t.contains(name))
                    .count()
            }
            None => 0,
        };
        Ok(QueryResult::new(
            vec!["cnt".to_string()],
            vec![json!({ "cnt": count })],
        ))
    }

    fn begin_session(&self) -> ExecutorResult<Option<SessionId>> {
        if !self.sessions {
            return Ok(None);
        }
        let id = SessionId::new("session-1");
        self.session_events.borrow_mut().push(format!("begin:{}", id));
        Ok(Some(id))
    }

    fn execute_in_session(&self, session: &SessionId, sql: &str) -> ExecutorResult<u64> {
        self.session_events
            .borrow_mut()
            .push(format!("{}:{}", session, sql));
        self.execute(sql)
    }

    fn end_session(&self, session: &SessionId) -> ExecutorResult<()> {
        self.session_events.borrow_mut().push(format!("end:{}", session));
        Ok(())
    }
}

/// Destination `(id, val)` in `schema`, optionally keyed on `id`
pub fn destination(schema: &str, text_type: &str, keyed: bool) -> TableDefinition {
    let table = TableDefinition::new(
        schema,
        "accounts",
        vec![
            ColumnDefinition::new("id", text_type).not_null(),
            ColumnDefinition::new("val", text_type),
            ColumnDefinition::new("_timestamp", "TIMESTAMP"),
        ],
    );
    if keyed {
        table.with_primary_keys(["id"])
    } else {
        table
    }
}
