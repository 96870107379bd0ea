//! Mock construction options.

use crate::convert::{DefaultConverter, ValueConverter};
use crate::matcher::QueryMatcher;
use std::fmt;
use std::sync::Arc;

/// Mock configuration.
#[derive(Clone)]
pub struct MockConfig {
    /// Match expectations in declaration order
    pub ordered: bool,
    /// How SQL patterns are compared with call text
    pub query_matcher: QueryMatcher,
    /// Normalisation applied to both sides of an argument comparison
    pub converter: Arc<dyn ValueConverter>,
    /// Resolve pings against `expect_ping` instead of always succeeding
    pub monitor_pings: bool,
    /// Register under this DSN instead of a generated one
    pub dsn: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            ordered: true,
            query_matcher: QueryMatcher::Regex,
            converter: Arc::new(DefaultConverter),
            monitor_pings: false,
            dsn: None,
        }
    }
}

impl MockConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set strict (`true`) or unordered (`false`) matching.
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    /// Set the SQL matcher.
    pub fn query_matcher(mut self, matcher: QueryMatcher) -> Self {
        self.query_matcher = matcher;
        self
    }

    /// Set the value converter.
    pub fn converter(mut self, converter: impl ValueConverter + 'static) -> Self {
        self.converter = Arc::new(converter);
        self
    }

    /// Enable/disable ping monitoring.
    pub fn monitor_pings(mut self, enabled: bool) -> Self {
        self.monitor_pings = enabled;
        self
    }

    /// Set the DSN.
    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = Some(dsn.into());
        self
    }
}

impl fmt::Debug for MockConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockConfig")
            .field("ordered", &self.ordered)
            .field("query_matcher", &self.query_matcher)
            .field("converter", &"<converter>")
            .field("monitor_pings", &self.monitor_pings)
            .field("dsn", &self.dsn)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlmock_core::Value;

    #[test]
    fn defaults() {
        let config = MockConfig::default();
        assert!(config.ordered);
        assert_eq!(config.query_matcher, QueryMatcher::Regex);
        assert!(!config.monitor_pings);
        assert!(config.dsn.is_none());
        assert_eq!(
            config.converter.convert(&Value::Int(1)).unwrap(),
            Value::BigInt(1)
        );
    }

    #[test]
    fn builder() {
        let config = MockConfig::new()
            .ordered(false)
            .query_matcher(QueryMatcher::Equal)
            .monitor_pings(true)
            .dsn("orders_db")
            .converter(|v: &Value| -> sqlmock_core::Result<Value> { Ok(v.clone()) });
        assert!(!config.ordered);
        assert_eq!(config.query_matcher, QueryMatcher::Equal);
        assert!(config.monitor_pings);
        assert_eq!(config.dsn.as_deref(), Some("orders_db"));
        assert_eq!(config.converter.convert(&Value::Int(1)).unwrap(), Value::Int(1));
        assert!(format!("{config:?}").contains("orders_db"));
    }
}
