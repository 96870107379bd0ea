//! A mock SQL driver for testing database code without a database.
//!
//! `sqlmock` registers an in-memory driver connection that answers calls
//! from a queue of declared expectations:
//!
//! - declare what the code under test should do with [`Sqlmock`]
//!   (`expect_query`, `expect_exec`, `expect_prepare`, `expect_begin`, ...)
//! - hand the [`MockConnection`] to the code under test; it implements
//!   `sqlmock_core::Connection`
//! - call [`Sqlmock::expectations_were_met`] at the end of the test
//!
//! # Example
//!
//! ```
//! use sqlmock::{MockResult, Rows, Value};
//!
//! let (conn, mock) = sqlmock::new().unwrap();
//! mock.expect_query("^SELECT name FROM users WHERE id")
//!     .unwrap()
//!     .with_args([1])
//!     .will_return_rows(Rows::new(["name"]).add_row(["Ann"]));
//! mock.expect_exec("^UPDATE users")
//!     .unwrap()
//!     .will_return_result(MockResult::new(0, 1));
//!
//! let mut rows = conn.query_sync("SELECT name FROM users WHERE id = ?", &[Value::Int(1)]).unwrap();
//! let name: String = rows.next().unwrap().unwrap().get_named("name").unwrap();
//! assert_eq!(name, "Ann");
//!
//! let result = conn.exec_sync("UPDATE users SET seen = 1", &[]).unwrap();
//! assert_eq!(result.rows_affected().unwrap(), 1);
//!
//! mock.expectations_were_met().unwrap();
//! ```
//!
//! By default calls must arrive in declaration order. Pass
//! `MockConfig::new().ordered(false)` to [`new_with_config`], or call
//! [`Sqlmock::match_expectations_in_order`], to let them arrive in any order.

pub mod argument;
pub mod config;
pub mod connection;
pub mod convert;
pub mod driver;
mod engine;
pub mod expectation;
pub mod matcher;
pub mod mock;
pub mod result;
pub mod rows;
pub mod statement;

pub use argument::{ArgSpec, Argument, ExpectedArg, NamedValue, Valuer, any_arg, named};
pub use config::MockConfig;
pub use connection::{MockConnection, MockTransaction};
pub use convert::{DefaultConverter, ValueConverter};
pub use driver::{MockDriver, new, new_with_config};
pub use expectation::ExpectationKind;
pub use matcher::{QueryMatcher, SqlMatcher};
pub use mock::{ExpectedCall, ExpectedExec, ExpectedPrepare, ExpectedQuery, Sqlmock};
pub use result::MockResult;
pub use rows::{ColumnDefinition, Rows, RowsCursor};
pub use statement::MockStatement;

pub use sqlmock_core::{
    Connection, Cx, Error, FromValue, MockError, MockErrorKind, Outcome, Result, Row, SqlType,
    TransactionOps, Value,
};
