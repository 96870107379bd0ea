//! The declaration and verification API.
//!
//! Every `expect_*` call appends an expectation to the queue right away and
//! returns a handle holding its index. Builder methods on the handle lock
//! the mock and edit that slot in place, so they may be chained in any
//! order before the call they describe is made.

#![allow(clippy::result_large_err)]

use crate::argument::ExpectedArg;
use crate::driver::MockShared;
use crate::expectation::{ArgsExpectation, Expectation, ExpectationKind};
use crate::matcher::SqlMatcher;
use crate::result::MockResult;
use crate::rows::Rows;
use sqlmock_core::{Error, Result};
use std::sync::Arc;

/// Handle for declaring expectations on a mock and verifying them.
///
/// Cloning the handle is cheap; all clones refer to the same mock.
#[derive(Debug, Clone)]
pub struct Sqlmock {
    shared: Arc<MockShared>,
}

impl Sqlmock {
    pub(crate) fn new(shared: Arc<MockShared>) -> Self {
        Self { shared }
    }

    /// The DSN the mock is registered under.
    pub fn dsn(&self) -> &str {
        &self.shared.dsn
    }

    /// Switch between strict and unordered matching.
    ///
    /// Applies to expectations declared after the call; those already in
    /// the queue keep the mode they were declared with.
    pub fn match_expectations_in_order(&self, ordered: bool) {
        self.shared.lock().ordered = ordered;
    }

    fn declare(&self, kind: ExpectationKind, sql: Option<SqlMatcher>) -> usize {
        let mut state = self.shared.lock();
        let e = Expectation::new(kind, sql, state.ordered);
        tracing::debug!(dsn = %self.shared.dsn, expectation = %e, ordered = e.ordered, "declared expectation");
        state.queue.push(e)
    }

    fn compile(&self, sql: &str) -> Result<SqlMatcher> {
        self.shared.config.query_matcher.compile(sql)
    }

    /// Expect a query whose SQL matches `sql`.
    ///
    /// # Errors
    ///
    /// Fails if `sql` is not a valid pattern for the configured matcher.
    pub fn expect_query(&self, sql: &str) -> Result<ExpectedQuery> {
        let matcher = self.compile(sql)?;
        let index = self.declare(ExpectationKind::Query, Some(matcher));
        Ok(ExpectedQuery(Slot::new(&self.shared, index)))
    }

    /// Expect an exec whose SQL matches `sql`.
    pub fn expect_exec(&self, sql: &str) -> Result<ExpectedExec> {
        let matcher = self.compile(sql)?;
        let index = self.declare(ExpectationKind::Exec, Some(matcher));
        Ok(ExpectedExec(Slot::new(&self.shared, index)))
    }

    /// Expect a statement whose SQL matches `sql` to be prepared.
    pub fn expect_prepare(&self, sql: &str) -> Result<ExpectedPrepare> {
        let matcher = self.compile(sql)?;
        let index = self.declare(ExpectationKind::Prepare, Some(matcher));
        Ok(ExpectedPrepare(Slot::new(&self.shared, index)))
    }

    pub fn expect_begin(&self) -> ExpectedCall {
        self.expect_call(ExpectationKind::Begin)
    }

    pub fn expect_commit(&self) -> ExpectedCall {
        self.expect_call(ExpectationKind::Commit)
    }

    pub fn expect_rollback(&self) -> ExpectedCall {
        self.expect_call(ExpectationKind::Rollback)
    }

    /// Expect a ping. Only consulted when the mock monitors pings.
    pub fn expect_ping(&self) -> ExpectedCall {
        self.expect_call(ExpectationKind::Ping)
    }

    pub fn expect_close(&self) -> ExpectedCall {
        self.expect_call(ExpectationKind::Close)
    }

    fn expect_call(&self, kind: ExpectationKind) -> ExpectedCall {
        let index = self.declare(kind, None);
        ExpectedCall(Slot::new(&self.shared, index))
    }

    /// Start a rows snapshot; shorthand for [`Rows::new`].
    pub fn new_rows<I, S>(&self, columns: I) -> Rows
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Rows::new(columns)
    }

    /// Check that every declared expectation was fulfilled.
    ///
    /// # Errors
    ///
    /// An `UnmetExpectations` error listing, in declaration order, every
    /// expectation that was never matched and every prepared statement
    /// that had to be closed but was not.
    pub fn expectations_were_met(&self) -> Result<()> {
        let state = self.shared.lock();
        let outcome = state.queue.all_fulfilled();
        if let Err(err) = &outcome {
            tracing::warn!(dsn = %self.shared.dsn, error = %err, "unmet expectations");
        }
        outcome
    }
}

/// A handle on one queue slot.
#[derive(Debug, Clone)]
struct Slot {
    shared: Arc<MockShared>,
    index: usize,
}

impl Slot {
    fn new(shared: &Arc<MockShared>, index: usize) -> Self {
        Self {
            shared: Arc::clone(shared),
            index,
        }
    }

    fn update(&self, f: impl FnOnce(&mut Expectation)) {
        let mut state = self.shared.lock();
        if let Some(e) = state.queue.get_mut(self.index) {
            f(e);
        }
    }

    fn set_args<I>(&self, args: I)
    where
        I: IntoIterator,
        I::Item: Into<ExpectedArg>,
    {
        let args = args.into_iter().map(Into::into).collect();
        self.update(|e| e.args = ArgsExpectation::Exactly(args));
    }
}

/// A declared query.
#[derive(Debug, Clone)]
pub struct ExpectedQuery(Slot);

impl ExpectedQuery {
    /// Require exactly these arguments, in order.
    ///
    /// Accepts anything convertible to a `Value`, an [`ArgSpec`](crate::ArgSpec),
    /// or a [`named`](crate::named) argument.
    pub fn with_args<I>(self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ExpectedArg>,
    {
        self.0.set_args(args);
        self
    }

    /// Require the call to carry no arguments.
    pub fn without_args(self) -> Self {
        self.0.update(|e| e.args = ArgsExpectation::Exactly(Vec::new()));
        self
    }

    /// Answer the query with `rows`.
    pub fn will_return_rows(self, rows: Rows) -> Self {
        let rows = Arc::new(rows);
        self.0.update(|e| e.rows = Some(rows));
        self
    }

    /// Fail the query with `err`, returned as is.
    pub fn will_return_error(self, err: Error) -> Self {
        self.0.update(|e| e.error = Some(err));
        self
    }
}

/// A declared exec.
#[derive(Debug, Clone)]
pub struct ExpectedExec(Slot);

impl ExpectedExec {
    pub fn with_args<I>(self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<ExpectedArg>,
    {
        self.0.set_args(args);
        self
    }

    pub fn without_args(self) -> Self {
        self.0.update(|e| e.args = ArgsExpectation::Exactly(Vec::new()));
        self
    }

    pub fn will_return_result(self, result: MockResult) -> Self {
        self.0.update(|e| e.result = Some(result));
        self
    }

    pub fn will_return_error(self, err: Error) -> Self {
        self.0.update(|e| e.error = Some(err));
        self
    }
}

/// A declared prepare.
#[derive(Debug, Clone)]
pub struct ExpectedPrepare(Slot);

impl ExpectedPrepare {
    /// Fail the prepare with `err`.
    pub fn will_return_error(self, err: Error) -> Self {
        self.0.update(|e| e.error = Some(err));
        self
    }

    /// Make closing the prepared statement fail with `err`.
    ///
    /// Only [`MockStatement::close`](crate::MockStatement::close) reports it.
    pub fn will_return_close_error(self, err: Error) -> Self {
        self.0.update(|e| e.close_error = Some(err));
        self
    }

    /// Require the prepared statement to be closed before verification.
    ///
    /// Only a [`MockStatement`](crate::MockStatement) from
    /// [`MockConnection::prepare_sync`](crate::MockConnection::prepare_sync)
    /// can be closed. `Connection::prepare` hands out a plain
    /// `PreparedStatement` with no close operation, so a prepare made through
    /// the trait leaves this requirement unmet.
    pub fn will_be_closed(self) -> Self {
        self.0.update(|e| e.must_be_closed = true);
        self
    }

    /// Expect a query on the prepared statement, with the same SQL pattern.
    pub fn expect_query(&self) -> ExpectedQuery {
        ExpectedQuery(self.follow_up(ExpectationKind::Query))
    }

    /// Expect an exec on the prepared statement, with the same SQL pattern.
    pub fn expect_exec(&self) -> ExpectedExec {
        ExpectedExec(self.follow_up(ExpectationKind::Exec))
    }

    fn follow_up(&self, kind: ExpectationKind) -> Slot {
        let slot = &self.0;
        let mut state = slot.shared.lock();
        let sql = state.queue.get(slot.index).and_then(|e| e.sql.clone());
        let e = Expectation::new(kind, sql, state.ordered);
        tracing::debug!(dsn = %slot.shared.dsn, expectation = %e, "declared statement expectation");
        let index = state.queue.push(e);
        drop(state);
        Slot::new(&slot.shared, index)
    }
}

/// A declared begin, commit, rollback, ping, or close.
#[derive(Debug, Clone)]
pub struct ExpectedCall(Slot);

impl ExpectedCall {
    pub fn will_return_error(self, err: Error) -> Self {
        self.0.update(|e| e.error = Some(err));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockConfig;
    use crate::matcher::QueryMatcher;
    use sqlmock_core::MockErrorKind;

    #[test]
    fn bad_pattern_fails_at_declaration() {
        let (_conn, mock) = crate::new().unwrap();
        let err = mock.expect_query("SELECT (").unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::Declaration));
        // Nothing was queued.
        mock.expectations_were_met().unwrap();
    }

    #[test]
    fn equal_matcher_never_fails_at_declaration() {
        let (_conn, mock) =
            crate::new_with_config(MockConfig::new().query_matcher(QueryMatcher::Equal)).unwrap();
        assert!(mock.expect_query("SELECT (").is_ok());
    }

    #[test]
    fn declarations_are_pending_until_fulfilled() {
        let (_conn, mock) = crate::new().unwrap();
        mock.expect_begin();
        mock.expect_exec("^INSERT").unwrap();
        mock.expect_commit();

        let err = mock.expectations_were_met().unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::UnmetExpectations));
        let text = err.to_string();
        assert!(text.contains("1. Begin"));
        assert!(text.contains("2. Exec matching '^INSERT'"));
        assert!(text.contains("3. Commit"));
    }

    #[test]
    fn order_mode_is_stamped_at_declaration() {
        let (_conn, mock) = crate::new().unwrap();
        mock.expect_begin();
        mock.match_expectations_in_order(false);
        mock.expect_commit();

        let state = mock.shared.lock();
        assert!(state.queue.get(0).unwrap().ordered);
        assert!(!state.queue.get(1).unwrap().ordered);
    }

    #[test]
    fn prepare_follow_ups_reuse_the_pattern() {
        let (_conn, mock) = crate::new().unwrap();
        let prep = mock.expect_prepare("^SELECT id FROM t").unwrap();
        prep.expect_query().with_args([1]);

        let state = mock.shared.lock();
        let follow = state.queue.get(1).unwrap();
        assert_eq!(follow.kind, ExpectationKind::Query);
        assert_eq!(follow.sql.as_ref().unwrap().pattern(), "^SELECT id FROM t");
        assert!(matches!(&follow.args, ArgsExpectation::Exactly(a) if a.len() == 1));
    }
}
