//! Prepared statements on a mock connection.

#![allow(clippy::result_large_err)]

use crate::argument::NamedValue;
use crate::driver::{MockShared, Resolved};
use crate::expectation::ExpectationKind;
use crate::result::MockResult;
use crate::rows::RowsCursor;
use sqlmock_core::{Error, Value};
use std::sync::Arc;

/// A statement returned by [`MockConnection::prepare_sync`](crate::MockConnection::prepare_sync).
///
/// Queries and execs on it are resolved like direct calls with the
/// statement's SQL. Closing it satisfies `will_be_closed` and returns the
/// configured close error, if any.
#[derive(Debug)]
pub struct MockStatement {
    shared: Arc<MockShared>,
    sql: String,
    prepare_index: usize,
    id: u64,
}

impl MockStatement {
    pub(crate) fn new(shared: Arc<MockShared>, sql: String, prepare_index: usize, id: u64) -> Self {
        Self {
            shared,
            sql,
            prepare_index,
            id,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn query(&self, params: &[Value]) -> Result<RowsCursor, Error> {
        self.query_named(&NamedValue::from_params(params))
    }

    pub fn query_named(&self, args: &[NamedValue]) -> Result<RowsCursor, Error> {
        match self
            .shared
            .dispatch(ExpectationKind::Query, Some(&self.sql), args)?
        {
            Resolved::Rows(cursor) => Ok(cursor),
            other => Err(Error::Custom(format!(
                "statement query resolved to an unexpected outcome: {:?}",
                other
            ))),
        }
    }

    pub fn exec(&self, params: &[Value]) -> Result<MockResult, Error> {
        self.exec_named(&NamedValue::from_params(params))
    }

    pub fn exec_named(&self, args: &[NamedValue]) -> Result<MockResult, Error> {
        match self
            .shared
            .dispatch(ExpectationKind::Exec, Some(&self.sql), args)?
        {
            Resolved::Result(result) => Ok(result),
            other => Err(Error::Custom(format!(
                "statement exec resolved to an unexpected outcome: {:?}",
                other
            ))),
        }
    }

    /// Close the statement.
    pub fn close(self) -> Result<(), Error> {
        let mut state = self.shared.lock();
        let Some(e) = state.queue.get_mut(self.prepare_index) else {
            return Ok(());
        };
        e.was_closed = true;
        tracing::debug!(dsn = %self.shared.dsn, statement = self.id, "statement closed");
        match &e.close_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}
