//! Recording test doubles for the executor and pool seams.

#![allow(dead_code)]

use pgfrag::{Error, Executor, Param, Pool, Result};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Reserve,
    Statement(String, Vec<Param>),
    Release,
}

/// Shared, ordered event log.
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<Event>>>);

impl Log {
    fn push(&self, event: Event) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.0.lock().unwrap().clone()
    }

    /// SQL text of every statement, in order.
    pub fn statements(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Statement(sql, _) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, event: &Event) -> usize {
        self.events().iter().filter(|e| *e == event).count()
    }
}

/// Hands out [`MockConn`]s that log to one shared [`Log`].
#[derive(Clone, Default)]
pub struct MockPool {
    log: Log,
    fail_on: Option<String>,
}

impl MockPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail any statement whose SQL is exactly `sql`.
    pub fn failing_on(sql: &str) -> Self {
        Self {
            log: Log::default(),
            fail_on: Some(sql.to_string()),
        }
    }

    pub fn log(&self) -> &Log {
        &self.log
    }
}

impl Pool for MockPool {
    type Connection = MockConn;

    async fn reserve(&self) -> Result<MockConn> {
        self.log.push(Event::Reserve);
        Ok(MockConn {
            log: self.log.clone(),
            fail_on: self.fail_on.clone(),
        })
    }
}

/// Statements outside a transaction each get their own connection.
impl Executor for MockPool {
    type Row = String;

    async fn execute_raw(&self, sql: &str, params: &[Param]) -> Result<Vec<String>> {
        let conn = self.reserve().await?;
        conn.execute_raw(sql, params).await
    }
}

/// Logs every statement and answers with one row holding the SQL text.
pub struct MockConn {
    log: Log,
    fail_on: Option<String>,
}

impl Executor for MockConn {
    type Row = String;

    async fn execute_raw(&self, sql: &str, params: &[Param]) -> Result<Vec<String>> {
        self.log
            .push(Event::Statement(sql.to_string(), params.to_vec()));
        if self.fail_on.as_deref() == Some(sql) {
            return Err(Error::Other(format!("mock failure on {sql}")));
        }
        Ok(vec![sql.to_string()])
    }
}

impl Drop for MockConn {
    fn drop(&mut self) {
        self.log.push(Event::Release);
    }
}

/// Error type of a caller's unit of work.
#[derive(Debug, PartialEq)]
pub enum AppError {
    Db(String),
    Boom,
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Db(err.to_string())
    }
}
