//! Test doubles for the execution pipeline.
//!
//! Available under `cfg(test)` and with the `test-helpers` feature.

use crate::classify::NativeError;
use crate::events::{Event, EventSink};
use crate::executor::Executor;
use crate::value::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Executor that captures every statement instead of running it.
///
/// Each call returns `rows_affected` unless a failure was queued with
/// [`fail_with`](Self::fail_with); queued failures are returned first, one
/// per call, in the order they were queued.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    statements: Mutex<Vec<(String, Vec<Value>)>>,
    failures: Mutex<VecDeque<NativeError>>,
    rows_affected: u64,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rows_affected(mut self, rows: u64) -> Self {
        self.rows_affected = rows;
        self
    }

    pub fn fail_with(self, error: NativeError) -> Self {
        lock(&self.failures).push_back(error);
        self
    }

    /// Captured `(sql, params)` pairs, oldest first
    pub fn statements(&self) -> Vec<(String, Vec<Value>)> {
        lock(&self.statements).clone()
    }

    pub fn last_sql(&self) -> Option<String> {
        lock(&self.statements).last().map(|(sql, _)| sql.clone())
    }
}

impl Executor for RecordingExecutor {
    type Rows = u64;

    fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, NativeError> {
        lock(&self.statements).push((sql.to_string(), params.to_vec()));
        match lock(&self.failures).pop_front() {
            Some(error) => Err(error),
            None => Ok(self.rows_affected),
        }
    }
}

/// Sink that keeps every event; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        lock(&self.events).clone()
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &Event) {
        lock(&self.events).push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_failures_come_first() {
        let executor = RecordingExecutor::new()
            .rows_affected(3)
            .fail_with(NativeError::new("5", "database is locked"));
        assert!(executor.execute("DELETE FROM t", &[]).is_err());
        assert_eq!(executor.execute("DELETE FROM t", &[Value::Int(1)]), Ok(3));
        assert_eq!(executor.statements().len(), 2);
        assert_eq!(executor.last_sql().as_deref(), Some("DELETE FROM t"));
    }
}
