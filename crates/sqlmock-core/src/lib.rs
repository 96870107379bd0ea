//! Core types and traits for SQLMock Rust.
//!
//! This crate provides the database-facing abstractions that application
//! code is written against and that the `sqlmock` driver impersonates:
//!
//! - `Value` for dynamically typed arguments and column values
//! - `Row` / `ColumnInfo` for result rows
//! - `Connection` / `TransactionOps` traits for driver calls
//! - `Error` with a structured `MockError` for expectation failures
//! - `Outcome` and `Cx` re-exported from asupersync

// Re-export asupersync primitives for structured concurrency
pub use asupersync::{Cx, Outcome};

pub mod connection;
pub mod error;
pub mod row;
pub mod types;
pub mod value;

pub use connection::{Connection, IsolationLevel, PreparedStatement, TransactionOps};
pub use error::{Error, MockError, MockErrorKind, Result};
pub use row::{ColumnInfo, FromValue, Row};
pub use types::SqlType;
pub use value::Value;
