//! SQL text matching.

use regex::Regex;
use sqlmock_core::{Error, MockErrorKind, Result};
use std::fmt;

/// How an expectation's SQL pattern is compared with the text of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QueryMatcher {
    /// The pattern is a regular expression searched for anywhere in the
    /// SQL. Whitespace is not normalised.
    #[default]
    Regex,
    /// The trimmed pattern must equal the trimmed SQL.
    Equal,
}

impl QueryMatcher {
    /// Compile a pattern for repeated matching.
    ///
    /// # Errors
    ///
    /// A malformed regular expression is a `Declaration` error.
    #[allow(clippy::result_large_err)]
    pub fn compile(self, pattern: &str) -> Result<SqlMatcher> {
        let compiled = match self {
            QueryMatcher::Regex => Compiled::Regex(Regex::new(pattern).map_err(|e| {
                Error::mock(
                    MockErrorKind::Declaration,
                    format!("could not compile SQL pattern '{}': {}", pattern, e),
                )
            })?),
            QueryMatcher::Equal => Compiled::Equal(pattern.trim().to_string()),
        };
        Ok(SqlMatcher {
            pattern: pattern.to_string(),
            compiled,
        })
    }
}

#[derive(Debug, Clone)]
enum Compiled {
    Regex(Regex),
    Equal(String),
}

/// A compiled SQL pattern, cached on its expectation.
#[derive(Debug, Clone)]
pub struct SqlMatcher {
    pattern: String,
    compiled: Compiled,
}

impl SqlMatcher {
    /// The pattern as declared.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, sql: &str) -> bool {
        match &self.compiled {
            Compiled::Regex(re) => re.is_match(sql),
            Compiled::Equal(expected) => expected == sql.trim(),
        }
    }
}

impl fmt::Display for SqlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.pattern)
    }
}
