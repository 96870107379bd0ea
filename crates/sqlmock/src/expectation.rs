//! A single declared expectation.

use crate::argument::{ExpectedArg, NamedValue};
use crate::convert::ValueConverter;
use crate::matcher::SqlMatcher;
use crate::result::MockResult;
use crate::rows::Rows;
use sqlmock_core::{Error, MockErrorKind, Result};
use std::fmt;
use std::sync::Arc;

/// The driver call an expectation stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectationKind {
    Query,
    Exec,
    Prepare,
    Begin,
    Commit,
    Rollback,
    Ping,
    Close,
}

impl ExpectationKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ExpectationKind::Query => "Query",
            ExpectationKind::Exec => "Exec",
            ExpectationKind::Prepare => "Prepare",
            ExpectationKind::Begin => "Begin",
            ExpectationKind::Commit => "Commit",
            ExpectationKind::Rollback => "Rollback",
            ExpectationKind::Ping => "Ping",
            ExpectationKind::Close => "Close",
        }
    }
}

impl fmt::Display for ExpectationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which argument lists an expectation accepts.
#[derive(Debug, Clone, Default)]
pub(crate) enum ArgsExpectation {
    /// Nothing was declared: any list matches.
    #[default]
    Any,
    /// Exactly these arguments, in order.
    Exactly(Vec<ExpectedArg>),
}

#[derive(Debug, Clone)]
pub(crate) struct Expectation {
    pub(crate) kind: ExpectationKind,
    pub(crate) sql: Option<SqlMatcher>,
    pub(crate) args: ArgsExpectation,
    pub(crate) ordered: bool,
    pub(crate) rows: Option<Arc<Rows>>,
    pub(crate) result: Option<MockResult>,
    pub(crate) error: Option<Error>,
    pub(crate) fulfilled: bool,
    // Prepare only.
    pub(crate) close_error: Option<Error>,
    pub(crate) must_be_closed: bool,
    pub(crate) was_closed: bool,
}

impl Expectation {
    pub(crate) fn new(kind: ExpectationKind, sql: Option<SqlMatcher>, ordered: bool) -> Self {
        Self {
            kind,
            sql,
            args: ArgsExpectation::Any,
            ordered,
            rows: None,
            result: None,
            error: None,
            fulfilled: false,
            close_error: None,
            must_be_closed: false,
            was_closed: false,
        }
    }

    /// Whether the SQL text satisfies the declared pattern.
    ///
    /// Kinds declared without SQL accept any text.
    pub(crate) fn sql_matches(&self, sql: Option<&str>) -> bool {
        match (&self.sql, sql) {
            (None, _) => true,
            (Some(m), Some(sql)) => m.is_match(sql),
            (Some(_), None) => false,
        }
    }

    /// Check the supplied arguments against the declared ones.
    ///
    /// Stops at the first disagreement and reports it.
    #[allow(clippy::result_large_err)]
    pub(crate) fn args_match(
        &self,
        against: &[NamedValue],
        converter: &dyn ValueConverter,
    ) -> Result<()> {
        let expected = match &self.args {
            ArgsExpectation::Any => return Ok(()),
            ArgsExpectation::Exactly(expected) => expected,
        };
        if expected.len() != against.len() {
            return Err(Error::mock(
                MockErrorKind::ArgumentCount,
                format!(
                    "expected {} arguments, got {}",
                    expected.len(),
                    against.len()
                ),
            ));
        }

        for (pos, exp) in expected.iter().enumerate() {
            let ordinal = pos + 1;
            let Some(actual) = against.iter().find(|nv| nv.ordinal == ordinal) else {
                return Err(mismatch(format!("argument {} is missing", ordinal)));
            };

            if let Some(name) = &exp.name {
                if actual.name.as_deref() != Some(name.as_str()) {
                    return Err(mismatch(format!(
                        "named argument {} expected name '{}' does not match actual name '{}'",
                        ordinal,
                        name,
                        actual.name.as_deref().unwrap_or("")
                    )));
                }
            } else if let Some(actual_name) = &actual.name {
                tracing::trace!(
                    ordinal,
                    name = %actual_name,
                    "named argument matched positionally"
                );
            }

            if !exp.spec.matches(&actual.value, converter) {
                return Err(mismatch(format!(
                    "argument {} expected [{} - {}] does not match actual [{} - {}]",
                    ordinal,
                    spec_type(exp),
                    exp.spec,
                    actual.value.type_name(),
                    actual.value
                )));
            }
        }
        Ok(())
    }

    /// Still owed something at verification time.
    pub(crate) fn is_pending(&self) -> bool {
        !self.fulfilled || (self.must_be_closed && !self.was_closed)
    }
}

fn mismatch(message: String) -> Error {
    Error::mock(MockErrorKind::ArgumentMismatch, message)
}

fn spec_type(arg: &ExpectedArg) -> &'static str {
    use crate::argument::ArgSpec;
    match &arg.spec {
        ArgSpec::Value(v) => v.type_name(),
        ArgSpec::Any => "ANY",
        ArgSpec::Matcher(_) => "MATCHER",
        ArgSpec::Valuer(v) => v.driver_value().map_or("VALUER", |value| value.type_name()),
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(sql) = &self.sql {
            write!(f, " matching {}", sql)?;
        }
        if let ArgsExpectation::Exactly(args) = &self.args {
            if args.is_empty() {
                write!(f, " without arguments")?;
            } else {
                write!(f, " with args [")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, "]")?;
            }
        }
        if self.fulfilled && self.must_be_closed && !self.was_closed {
            write!(f, " (prepared statement was not closed)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::argument::{any_arg, named};
    use crate::convert::DefaultConverter;
    use crate::matcher::QueryMatcher;
    use sqlmock_core::Value;

    fn query(pattern: &str) -> Expectation {
        let sql = QueryMatcher::Regex.compile(pattern).unwrap();
        Expectation::new(ExpectationKind::Query, Some(sql), true)
    }

    fn with(mut e: Expectation, args: Vec<ExpectedArg>) -> Expectation {
        e.args = ArgsExpectation::Exactly(args);
        e
    }

    fn params(values: &[Value]) -> Vec<NamedValue> {
        NamedValue::from_params(values)
    }

    #[test]
    fn undeclared_args_accept_anything() {
        let e = query("SELECT");
        let c = DefaultConverter;
        assert!(e.args_match(&[], &c).is_ok());
        assert!(e.args_match(&params(&[Value::Int(1)]), &c).is_ok());
        assert!(
            e.args_match(&params(&[Value::Int(1), Value::Null, Value::Bool(true)]), &c)
                .is_ok()
        );
    }

    #[test]
    fn empty_declaration_requires_no_args() {
        let e = with(query("SELECT"), vec![]);
        let c = DefaultConverter;
        assert!(e.args_match(&[], &c).is_ok());
        let err = e.args_match(&params(&[Value::Int(1)]), &c).unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::ArgumentCount));
        assert_eq!(err.to_string(), "expected 0 arguments, got 1");
    }

    #[test]
    fn count_mismatch_reports_both_counts() {
        let e = with(query("SELECT"), crate::args![1, 2]);
        let err = e
            .args_match(&params(&[Value::Int(1)]), &DefaultConverter)
            .unwrap_err();
        assert_eq!(err.to_string(), "expected 2 arguments, got 1");
    }

    #[test]
    fn first_mismatch_names_the_ordinal() {
        let e = with(query("SELECT"), crate::args![5, "x", 7]);
        let err = e
            .args_match(
                &params(&[Value::Int(5), Value::Text("y".into()), Value::Int(8)]),
                &DefaultConverter,
            )
            .unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::ArgumentMismatch));
        assert_eq!(
            err.to_string(),
            "argument 2 expected [TEXT - \"x\"] does not match actual [TEXT - \"y\"]"
        );
    }

    #[test]
    fn changing_one_argument_flips_the_match() {
        let e = with(query("SELECT"), crate::args![1, "a", true]);
        let good = [Value::Int(1), Value::Text("a".into()), Value::Bool(true)];
        assert!(e.args_match(&params(&good), &DefaultConverter).is_ok());
        for i in 0..good.len() {
            let mut bad = good.clone();
            bad[i] = Value::Text("other".into());
            assert!(e.args_match(&params(&bad), &DefaultConverter).is_err());
        }
    }

    #[test]
    fn wildcard_position() {
        let e = with(query("SELECT"), crate::args![5, any_arg()]);
        let c = DefaultConverter;
        assert!(e.args_match(&params(&[Value::Int(5), Value::Text("x".into())]), &c).is_ok());
        assert!(e.args_match(&params(&[Value::Int(5), Value::Int(42)]), &c).is_ok());
        assert!(e.args_match(&params(&[Value::Int(6), Value::Text("x".into())]), &c).is_err());
    }

    #[test]
    fn named_args_check_name_and_position() {
        let e = with(query("SELECT"), vec![named("id", 1), named("name", "Ann")]);
        let c = DefaultConverter;
        let ok = [
            NamedValue::named("id", 1, 1),
            NamedValue::named("name", 2, "Ann"),
        ];
        assert!(e.args_match(&ok, &c).is_ok());

        let swapped = [
            NamedValue::named("name", 1, "Ann"),
            NamedValue::named("id", 2, 1),
        ];
        let err = e.args_match(&swapped, &c).unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::ArgumentMismatch));
        assert!(err.to_string().contains("expected name 'id'"));

        let unnamed = params(&[Value::Int(1), Value::Text("Ann".into())]);
        assert!(e.args_match(&unnamed, &c).is_err());
    }

    #[test]
    fn display_lists_args() {
        let e = with(query("^SELECT"), crate::args![5, any_arg()]);
        assert_eq!(e.to_string(), "Query matching '^SELECT' with args [5, <any>]");
        let begin = Expectation::new(ExpectationKind::Begin, None, true);
        assert_eq!(begin.to_string(), "Begin");
        assert_eq!(
            with(query("x"), vec![]).to_string(),
            "Query matching 'x' without arguments"
        );
    }

    #[test]
    fn pending_tracks_close_requirement() {
        let mut e = Expectation::new(
            ExpectationKind::Prepare,
            Some(QueryMatcher::Regex.compile("SELECT").unwrap()),
            true,
        );
        e.must_be_closed = true;
        assert!(e.is_pending());
        e.fulfilled = true;
        assert!(e.is_pending());
        assert!(e.to_string().ends_with("(prepared statement was not closed)"));
        e.was_closed = true;
        assert!(!e.is_pending());
    }
}
