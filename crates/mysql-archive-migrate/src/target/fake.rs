//! Scripted in-memory session for exercising the write path in tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::conn::TargetConnection;
use crate::core::value::{Row, SqlValue};
use crate::error::Result;

/// One captured statement with its bound parameters, in bind order.
#[derive(Debug, Clone)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<SqlValue<'static>>,
}

impl Statement {
    fn capture(sql: &str, params: &[SqlValue<'_>]) -> Self {
        Self {
            sql: sql.to_string(),
            params: params.iter().cloned().map(SqlValue::into_owned).collect(),
        }
    }
}

/// Scripted stand-in for the target session.
///
/// Records every statement and query it receives and replays queued results.
/// Without scripting, executes succeed with one affected row, queries return
/// no rows, and no generated id is available, so most tests only queue the
/// responses they care about.
#[derive(Default)]
pub struct FakeConnection {
    /// Statements received via `execute`, in order.
    pub executed: Mutex<Vec<Statement>>,
    /// Queries received via `fetch_all`/`fetch_first`, in order.
    pub queried: Mutex<Vec<Statement>>,
    /// Transaction boundary calls, in order ("begin"/"commit"/"rollback").
    pub transactions: Mutex<Vec<&'static str>>,
    execute_results: Mutex<VecDeque<Result<u64>>>,
    query_results: Mutex<VecDeque<Vec<Row<'static>>>>,
    last_insert_ids: Mutex<VecDeque<u64>>,
}

impl FakeConnection {
    /// Queue the outcome of the next `execute` call.
    pub fn push_execute_result(&self, result: Result<u64>) {
        self.execute_results.lock().unwrap().push_back(result);
    }

    /// Queue the result set of the next query.
    pub fn push_rows(&self, rows: Vec<Row<'static>>) {
        self.query_results.lock().unwrap().push_back(rows);
    }

    /// Queue a single-row result set for the next query.
    pub fn push_row(&self, cells: &[(&str, SqlValue<'static>)]) {
        let mut row = Row::new();
        for (name, value) in cells {
            row.insert((*name).to_string(), value.clone());
        }
        self.push_rows(vec![row]);
    }

    /// Queue an empty result set for the next query.
    pub fn push_no_rows(&self) {
        self.push_rows(Vec::new());
    }

    /// Queue the value returned by the next `last_insert_id` call.
    pub fn push_last_insert_id(&self, id: u64) {
        self.last_insert_ids.lock().unwrap().push_back(id);
    }

    /// SQL of every executed statement, in order.
    pub fn executed_sql(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|stmt| stmt.sql.clone())
            .collect()
    }

    /// SQL of every query, in order.
    pub fn queried_sql(&self) -> Vec<String> {
        self.queried
            .lock()
            .unwrap()
            .iter()
            .map(|stmt| stmt.sql.clone())
            .collect()
    }
}

#[async_trait]
impl TargetConnection for FakeConnection {
    async fn execute(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<u64> {
        self.executed
            .lock()
            .unwrap()
            .push(Statement::capture(sql, params));
        match self.execute_results.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(1),
        }
    }

    async fn fetch_all(&self, sql: &str, params: &[SqlValue<'_>]) -> Result<Vec<Row<'static>>> {
        self.queried
            .lock()
            .unwrap()
            .push(Statement::capture(sql, params));
        Ok(self
            .query_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_default())
    }

    async fn last_insert_id(&self) -> Result<Option<u64>> {
        Ok(self.last_insert_ids.lock().unwrap().pop_front())
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.transactions.lock().unwrap().push("begin");
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        self.transactions.lock().unwrap().push("commit");
        Ok(())
    }

    async fn roll_back(&self) -> Result<()> {
        self.transactions.lock().unwrap().push("rollback");
        Ok(())
    }
}
