//! The mock driver: DSN registry and the state shared by every handle of
//! one mock.
//!
//! A mock is registered under a DSN when it is created. Any number of
//! [`MockConnection`]s may be opened against it; they all resolve calls
//! against the same expectation queue. Closing a connection closes the
//! mock and removes it from the registry.
//!
//! The registry only holds weak references: once every connection and
//! `Sqlmock` handle of a mock is dropped, its DSN is free again.

#![allow(clippy::result_large_err)]

use crate::argument::NamedValue;
use crate::config::MockConfig;
use crate::connection::MockConnection;
use crate::engine::{Call, ExpectationQueue};
use crate::expectation::ExpectationKind;
use crate::mock::Sqlmock;
use crate::result::MockResult;
use crate::rows::RowsCursor;
use sqlmock_core::error::{ConnectionError, ConnectionErrorKind};
use sqlmock_core::{Error, MockErrorKind, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, Weak};

static REGISTRY: LazyLock<Mutex<HashMap<String, Weak<MockShared>>>> =
    LazyLock::new(|| Mutex::new(HashMap::new()));

static NEXT_DSN: AtomicUsize = AtomicUsize::new(0);

/// Mutable state behind the mock's single lock.
#[derive(Debug)]
pub(crate) struct MockState {
    pub(crate) queue: ExpectationQueue,
    /// Mode stamped on newly declared expectations.
    pub(crate) ordered: bool,
    pub(crate) closed: bool,
    next_statement_id: u64,
}

/// What a resolved call hands back to the facade.
#[derive(Debug)]
pub(crate) enum Resolved {
    Rows(RowsCursor),
    Result(MockResult),
    Prepared { index: usize, id: u64 },
    Done,
}

#[derive(Debug)]
pub(crate) struct MockShared {
    pub(crate) dsn: String,
    pub(crate) config: MockConfig,
    state: Mutex<MockState>,
}

impl MockShared {
    fn new(dsn: String, config: MockConfig) -> Self {
        let state = MockState {
            queue: ExpectationQueue::default(),
            ordered: config.ordered,
            closed: false,
            next_statement_id: 1,
        };
        Self {
            dsn,
            config,
            state: Mutex::new(state),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Resolve one driver call against the queue and produce its outcome.
    ///
    /// Matching, fulfillment and reading the configured outcome all happen
    /// under one lock acquisition.
    pub(crate) fn dispatch(
        &self,
        kind: ExpectationKind,
        sql: Option<&str>,
        args: &[NamedValue],
    ) -> Result<Resolved> {
        let call = Call { kind, sql, args };
        let mut state = self.lock();

        if state.closed {
            tracing::warn!(dsn = %self.dsn, call = %call, "call on closed connection");
            return Err(Error::mock(
                MockErrorKind::Closed,
                format!("call to {} on closed connection '{}'", call, self.dsn),
            ));
        }

        let index = match state.queue.resolve(&call, self.config.converter.as_ref()) {
            Ok(index) => index,
            Err(err) => {
                tracing::warn!(dsn = %self.dsn, error = %err, "call rejected");
                return Err(err);
            }
        };
        tracing::debug!(dsn = %self.dsn, index, call = %call, "call matched expectation");

        let Some(e) = state.queue.get(index) else {
            return Err(Error::mock(
                MockErrorKind::UnexpectedCall,
                format!("expectation {} vanished while resolving {}", index, call),
            ));
        };

        if let Some(err) = &e.error {
            return Err(err.clone());
        }

        match kind {
            ExpectationKind::Query => match &e.rows {
                Some(rows) => Ok(Resolved::Rows(RowsCursor::new(Arc::clone(rows)))),
                None => Err(missing_outcome(&call, "rows", "will_return_rows")),
            },
            ExpectationKind::Exec => match &e.result {
                Some(result) => Ok(Resolved::Result(result.clone())),
                None => Err(missing_outcome(&call, "result", "will_return_result")),
            },
            ExpectationKind::Prepare => {
                let id = state.next_statement_id;
                state.next_statement_id += 1;
                Ok(Resolved::Prepared { index, id })
            }
            ExpectationKind::Begin
            | ExpectationKind::Commit
            | ExpectationKind::Rollback
            | ExpectationKind::Ping
            | ExpectationKind::Close => Ok(Resolved::Done),
        }
    }

    /// Fail with `Closed` if the mock has been closed.
    pub(crate) fn ensure_open(&self) -> Result<()> {
        if self.lock().closed {
            return Err(Error::mock(
                MockErrorKind::Closed,
                format!("connection '{}' is closed", self.dsn),
            ));
        }
        Ok(())
    }

    /// Close the mock and remove it from the registry.
    pub(crate) fn shut_down(&self) {
        self.lock().closed = true;
        let mut registry = REGISTRY.lock().unwrap_or_else(|e| e.into_inner());
        if registry
            .get(&self.dsn)
            .is_some_and(|weak| std::ptr::eq(weak.as_ptr(), self))
        {
            registry.remove(&self.dsn);
        }
        tracing::debug!(dsn = %self.dsn, "mock connection closed");
    }
}

fn missing_outcome(call: &Call<'_>, what: &str, hint: &str) -> Error {
    Error::mock(
        MockErrorKind::MissingOutcome,
        format!(
            "{} matched an expectation with no {} configured: use {} or will_return_error",
            call, what, hint
        ),
    )
}

/// Entry point for opening connections to registered mocks.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockDriver;

impl MockDriver {
    /// Open another connection to the mock registered under `dsn`.
    pub fn open(dsn: &str) -> Result<MockConnection> {
        let registry = REGISTRY.lock().unwrap_or_else(|e| e.into_inner());
        match registry.get(dsn).and_then(Weak::upgrade) {
            Some(shared) => Ok(MockConnection::new(shared)),
            None => Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Connect,
                message: format!(
                    "expected a connection to be available, but it is not: '{}'",
                    dsn
                ),
                source: None,
            })),
        }
    }

    /// Whether a mock is currently registered under `dsn`.
    pub fn is_registered(dsn: &str) -> bool {
        REGISTRY
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(dsn)
            .is_some_and(|weak| weak.strong_count() > 0)
    }
}

/// Create a mock with default options.
///
/// Returns the connection application code uses and the handle tests
/// declare expectations on.
///
/// ```
/// let (conn, mock) = sqlmock::new().unwrap();
/// mock.expect_begin();
/// conn.begin_sync().unwrap();
/// mock.expectations_were_met().unwrap();
/// ```
pub fn new() -> Result<(MockConnection, Sqlmock)> {
    new_with_config(MockConfig::default())
}

/// Create a mock with the given options.
///
/// # Errors
///
/// Fails if `config.dsn` names a DSN that is already registered.
pub fn new_with_config(config: MockConfig) -> Result<(MockConnection, Sqlmock)> {
    let mut registry = REGISTRY.lock().unwrap_or_else(|e| e.into_inner());
    registry.retain(|_, weak| weak.strong_count() > 0);

    let dsn = match &config.dsn {
        Some(dsn) if registry.contains_key(dsn) => {
            return Err(Error::Connection(ConnectionError {
                kind: ConnectionErrorKind::Refused,
                message: format!("cannot create driver connection, DSN '{}' is taken", dsn),
                source: None,
            }));
        }
        Some(dsn) => dsn.clone(),
        None => loop {
            let candidate = format!("sqlmock_db_{}", NEXT_DSN.fetch_add(1, Ordering::Relaxed));
            if !registry.contains_key(&candidate) {
                break candidate;
            }
        },
    };

    let shared = Arc::new(MockShared::new(dsn.clone(), config));
    registry.insert(dsn.clone(), Arc::downgrade(&shared));
    drop(registry);

    tracing::debug!(dsn = %dsn, "registered mock driver connection");
    Ok((
        MockConnection::new(Arc::clone(&shared)),
        Sqlmock::new(shared),
    ))
}
