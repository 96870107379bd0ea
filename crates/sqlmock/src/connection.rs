//! Mock connection implementing `sqlmock_core::Connection`.
//!
//! Every operation resolves synchronously against the mock's expectation
//! queue. The sync helpers (`query_sync`, `exec_sync`, ...) are the primary
//! surface; the async `Connection` / `TransactionOps` impls wrap them.

#![allow(clippy::result_large_err)]

use crate::argument::NamedValue;
use crate::driver::{MockShared, Resolved};
use crate::expectation::ExpectationKind;
use crate::result::MockResult;
use crate::rows::RowsCursor;
use crate::statement::MockStatement;
use sqlmock_core::{
    Connection, Cx, IsolationLevel, MockErrorKind, Outcome, PreparedStatement, Row,
    TransactionOps, Value, error::Error,
};
use std::future::Future;
use std::sync::Arc;

/// A connection to a mock registered with the driver.
///
/// Obtained from [`crate::new`], [`crate::new_with_config`] or
/// [`crate::MockDriver::open`].
#[derive(Debug, Clone)]
pub struct MockConnection {
    shared: Arc<MockShared>,
}

impl MockConnection {
    pub(crate) fn new(shared: Arc<MockShared>) -> Self {
        Self { shared }
    }

    /// The DSN of the mock this connection talks to.
    pub fn dsn(&self) -> &str {
        &self.shared.dsn
    }

    /// Run a query with positional parameters.
    pub fn query_sync(&self, sql: &str, params: &[Value]) -> Result<RowsCursor, Error> {
        self.query_named(sql, &NamedValue::from_params(params))
    }

    /// Run a query with explicitly numbered, optionally named arguments.
    pub fn query_named(&self, sql: &str, args: &[NamedValue]) -> Result<RowsCursor, Error> {
        match self.shared.dispatch(ExpectationKind::Query, Some(sql), args)? {
            Resolved::Rows(cursor) => Ok(cursor),
            other => Err(unexpected_resolution("query", &other)),
        }
    }

    /// Run a statement with positional parameters.
    pub fn exec_sync(&self, sql: &str, params: &[Value]) -> Result<MockResult, Error> {
        self.exec_named(sql, &NamedValue::from_params(params))
    }

    pub fn exec_named(&self, sql: &str, args: &[NamedValue]) -> Result<MockResult, Error> {
        match self.shared.dispatch(ExpectationKind::Exec, Some(sql), args)? {
            Resolved::Result(result) => Ok(result),
            other => Err(unexpected_resolution("exec", &other)),
        }
    }

    /// Prepare a statement.
    pub fn prepare_sync(&self, sql: &str) -> Result<MockStatement, Error> {
        match self.shared.dispatch(ExpectationKind::Prepare, Some(sql), &[])? {
            Resolved::Prepared { index, id } => Ok(MockStatement::new(
                Arc::clone(&self.shared),
                sql.to_string(),
                index,
                id,
            )),
            other => Err(unexpected_resolution("prepare", &other)),
        }
    }

    pub fn begin_sync(&self) -> Result<(), Error> {
        self.simple(ExpectationKind::Begin)
    }

    pub fn commit_sync(&self) -> Result<(), Error> {
        self.simple(ExpectationKind::Commit)
    }

    pub fn rollback_sync(&self) -> Result<(), Error> {
        self.simple(ExpectationKind::Rollback)
    }

    /// Ping the mock.
    ///
    /// Succeeds without consulting the queue unless the mock was configured
    /// to monitor pings.
    pub fn ping_sync(&self) -> Result<(), Error> {
        if self.shared.config.monitor_pings {
            self.simple(ExpectationKind::Ping)
        } else {
            self.shared.ensure_open()
        }
    }

    /// Close the mock.
    ///
    /// The mock is closed and deregistered even when no close was expected;
    /// the returned result reports how the call matched.
    pub fn close_sync(&self) -> Result<(), Error> {
        let result = self.simple(ExpectationKind::Close);
        let already_closed =
            matches!(&result, Err(e) if e.mock_kind() == Some(MockErrorKind::Closed));
        if !already_closed {
            self.shared.shut_down();
        }
        result
    }

    fn simple(&self, kind: ExpectationKind) -> Result<(), Error> {
        self.shared.dispatch(kind, None, &[]).map(|_| ())
    }

    fn query_rows(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, Error> {
        self.query_sync(sql, params)?.collect()
    }

    fn execute_rows_affected(&self, sql: &str, params: &[Value]) -> Result<u64, Error> {
        self.exec_sync(sql, params)?.rows_affected()
    }
}

fn unexpected_resolution(op: &str, resolved: &Resolved) -> Error {
    Error::Custom(format!("{} resolved to an unexpected outcome: {:?}", op, resolved))
}

impl Connection for MockConnection {
    type Tx<'conn>
        = MockTransaction<'conn>
    where
        Self: 'conn;

    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let result = self.query_rows(sql, params);
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn query_one(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let result = self
            .query_sync(sql, params)
            .and_then(|mut cursor| cursor.next().transpose());
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn execute(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let result = self.execute_rows_affected(sql, params);
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn insert(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<i64, Error>> + Send {
        let result = self
            .exec_sync(sql, params)
            .and_then(|r| r.last_insert_id());
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn batch(
        &self,
        _cx: &Cx,
        statements: &[(String, Vec<Value>)],
    ) -> impl Future<Output = Outcome<Vec<u64>, Error>> + Send {
        let mut results = Vec::with_capacity(statements.len());
        let mut error = None;

        for (sql, params) in statements {
            match self.execute_rows_affected(sql, params) {
                Ok(n) => results.push(n),
                Err(e) => {
                    error = Some(e);
                    break;
                }
            }
        }

        async move {
            match error {
                Some(e) => Outcome::Err(e),
                None => Outcome::Ok(results),
            }
        }
    }

    fn begin(&self, cx: &Cx) -> impl Future<Output = Outcome<Self::Tx<'_>, Error>> + Send {
        self.begin_with(cx, IsolationLevel::default())
    }

    fn begin_with(
        &self,
        _cx: &Cx,
        isolation: IsolationLevel,
    ) -> impl Future<Output = Outcome<Self::Tx<'_>, Error>> + Send {
        tracing::debug!(dsn = %self.dsn(), isolation = isolation.as_sql(), "begin transaction");
        let result = self.begin_sync().map(|()| MockTransaction::new(self));
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn prepare(
        &self,
        _cx: &Cx,
        sql: &str,
    ) -> impl Future<Output = Outcome<PreparedStatement, Error>> + Send {
        let result = self
            .prepare_sync(sql)
            .map(|stmt| PreparedStatement::new(stmt.id(), stmt.sql().to_string()));
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn query_prepared(
        &self,
        cx: &Cx,
        stmt: &PreparedStatement,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        self.query(cx, stmt.sql(), params)
    }

    fn execute_prepared(
        &self,
        cx: &Cx,
        stmt: &PreparedStatement,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        self.execute(cx, stmt.sql(), params)
    }

    fn ping(&self, _cx: &Cx) -> impl Future<Output = Outcome<(), Error>> + Send {
        let result = self.ping_sync();
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn close(self, _cx: &Cx) -> impl Future<Output = sqlmock_core::Result<()>> + Send {
        let result = self.close_sync();
        async move { result }
    }
}

// ── Transaction ───────────────────────────────────────────────────────────

/// A transaction on a mock connection.
///
/// Dropped without commit or rollback, it issues a rollback.
pub struct MockTransaction<'conn> {
    conn: &'conn MockConnection,
    finished: bool,
}

impl<'conn> MockTransaction<'conn> {
    fn new(conn: &'conn MockConnection) -> Self {
        Self {
            conn,
            finished: false,
        }
    }
}

impl Drop for MockTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(dsn = %self.conn.dsn(), "transaction dropped, rolling back");
            let _ = self.conn.rollback_sync();
        }
    }
}

impl TransactionOps for MockTransaction<'_> {
    fn query(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Vec<Row>, Error>> + Send {
        let result = self.conn.query_rows(sql, params);
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn query_one(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<Option<Row>, Error>> + Send {
        let result = self
            .conn
            .query_sync(sql, params)
            .and_then(|mut cursor| cursor.next().transpose());
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn execute(
        &self,
        _cx: &Cx,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = Outcome<u64, Error>> + Send {
        let result = self.conn.execute_rows_affected(sql, params);
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn savepoint(&self, _cx: &Cx, name: &str) -> impl Future<Output = Outcome<(), Error>> + Send {
        let sql = format!("SAVEPOINT {name}");
        let result = self.conn.exec_sync(&sql, &[]).map(|_| ());
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn rollback_to(
        &self,
        _cx: &Cx,
        name: &str,
    ) -> impl Future<Output = Outcome<(), Error>> + Send {
        let sql = format!("ROLLBACK TO SAVEPOINT {name}");
        let result = self.conn.exec_sync(&sql, &[]).map(|_| ());
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    fn release(&self, _cx: &Cx, name: &str) -> impl Future<Output = Outcome<(), Error>> + Send {
        let sql = format!("RELEASE SAVEPOINT {name}");
        let result = self.conn.exec_sync(&sql, &[]).map(|_| ());
        async move { result.map_or_else(Outcome::Err, Outcome::Ok) }
    }

    async fn commit(mut self, _cx: &Cx) -> Outcome<(), Error> {
        self.finished = true;
        self.conn
            .commit_sync()
            .map_or_else(Outcome::Err, Outcome::Ok)
    }

    async fn rollback(mut self, _cx: &Cx) -> Outcome<(), Error> {
        self.finished = true;
        self.conn
            .rollback_sync()
            .map_or_else(Outcome::Err, Outcome::Ok)
    }
}
