//! Error types for SQLMock operations.
//!
//! Every error is `Clone`: sources are shared behind `Arc`, so an error
//! configured on an expectation can be handed back to the caller verbatim
//! as many times as the caller asks for it.

use std::fmt;
use std::sync::Arc;

/// Boxed error source shared between clones.
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync>;

/// The primary error type for all SQLMock operations.
#[derive(Debug, Clone)]
pub enum Error {
    /// Connection-related errors (open, closed, unknown DSN)
    Connection(ConnectionError),
    /// Query execution errors, usually injected by a test
    Query(QueryError),
    /// Type conversion errors
    Type(TypeError),
    /// Expectation matching and verification failures
    Mock(MockError),
    /// Custom error with message
    Custom(String),
}

#[derive(Debug, Clone)]
pub struct ConnectionError {
    pub kind: ConnectionErrorKind,
    pub message: String,
    pub source: Option<ErrorSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionErrorKind {
    /// Failed to establish connection
    Connect,
    /// Connection lost during operation
    Disconnected,
    /// Connection refused
    Refused,
}

#[derive(Debug, Clone)]
pub struct QueryError {
    pub kind: QueryErrorKind,
    pub sql: Option<String>,
    pub sqlstate: Option<String>,
    pub message: String,
    pub source: Option<ErrorSource>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// Syntax error in SQL
    Syntax,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// Table or column not found
    NotFound,
    /// Deadlock detected
    Deadlock,
    /// Other database error
    Database,
}

#[derive(Debug, Clone)]
pub struct TypeError {
    pub expected: &'static str,
    pub actual: String,
    pub column: Option<String>,
}

/// A failure raised by the mock itself rather than injected by a test.
#[derive(Debug, Clone)]
pub struct MockError {
    pub kind: MockErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockErrorKind {
    /// Malformed expectation (bad SQL pattern, bad row shape)
    Declaration,
    /// Argument count differs from the expectation
    ArgumentCount,
    /// A specific argument disagrees with the expectation
    ArgumentMismatch,
    /// No expectation accepts the call
    UnexpectedCall,
    /// Matched expectation has no rows/result configured
    MissingOutcome,
    /// Verification found pending expectations
    UnmetExpectations,
    /// The mock connection was already closed
    Closed,
}

impl MockError {
    pub fn new(kind: MockErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Build the verification error listing every pending expectation.
    pub fn unmet<I, S>(pending: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: fmt::Display,
    {
        let mut message = String::from("there are remaining expectations which were not met");
        for (i, item) in pending.into_iter().enumerate() {
            message.push_str(&format!("\n  {}. {}", i + 1, item));
        }
        Self::new(MockErrorKind::UnmetExpectations, message)
    }
}

impl Error {
    /// Shorthand for a mock failure.
    pub fn mock(kind: MockErrorKind, message: impl Into<String>) -> Self {
        Error::Mock(MockError::new(kind, message))
    }

    /// Shorthand for a generic database error, as a real driver would report it.
    pub fn database(message: impl Into<String>) -> Self {
        Error::Query(QueryError {
            kind: QueryErrorKind::Database,
            sql: None,
            sqlstate: None,
            message: message.into(),
            source: None,
        })
    }

    /// Get the mock failure kind, if this error was raised by the mock.
    pub fn mock_kind(&self) -> Option<MockErrorKind> {
        match self {
            Error::Mock(m) => Some(m.kind),
            _ => None,
        }
    }

    /// Is this a connection error that likely requires reconnection?
    pub fn is_connection_error(&self) -> bool {
        match self {
            Error::Connection(c) => matches!(
                c.kind,
                ConnectionErrorKind::Connect
                    | ConnectionErrorKind::Disconnected
                    | ConnectionErrorKind::Refused
            ),
            _ => false,
        }
    }

    /// Get SQLSTATE if available (e.g., "23505" for unique violation)
    pub fn sqlstate(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sqlstate.as_deref(),
            _ => None,
        }
    }

    /// Get the SQL that caused this error, if available
    pub fn sql(&self) -> Option<&str> {
        match self {
            Error::Query(q) => q.sql.as_deref(),
            _ => None,
        }
    }
}

impl QueryError {
    /// Is this a unique constraint violation?
    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate.as_deref() == Some("23505")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Connection(e) => write!(f, "Connection error: {}", e.message),
            Error::Query(e) => {
                if let Some(sqlstate) = &e.sqlstate {
                    write!(f, "Query error (SQLSTATE {}): {}", sqlstate, e.message)
                } else {
                    write!(f, "{}", e.message)
                }
            }
            Error::Type(e) => write!(f, "Type error: {}", e),
            Error::Mock(e) => write!(f, "{}", e.message),
            Error::Custom(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        let source = match self {
            Error::Connection(e) => e.source.as_ref(),
            Error::Query(e) => e.source.as_ref(),
            _ => None,
        };
        source.map(|err| &**err as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sqlstate) = &self.sqlstate {
            write!(f, "{} (SQLSTATE {})", self.message, sqlstate)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = &self.column {
            write!(
                f,
                "expected {} for column '{}', found {}",
                self.expected, col, self.actual
            )
        } else {
            write!(f, "expected {}, found {}", self.expected, self.actual)
        }
    }
}

impl fmt::Display for MockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl From<ConnectionError> for Error {
    fn from(err: ConnectionError) -> Self {
        Error::Connection(err)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        Error::Query(err)
    }
}

impl From<TypeError> for Error {
    fn from(err: TypeError) -> Self {
        Error::Type(err)
    }
}

impl From<MockError> for Error {
    fn from(err: MockError) -> Self {
        Error::Mock(err)
    }
}

/// Result type alias for SQLMock operations.
pub type Result<T> = std::result::Result<T, Error>;
