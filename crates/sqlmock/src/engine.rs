//! The expectation queue and the matching engine.
//!
//! Expectations are appended in declaration order and never removed; the
//! only mutation after declaration is the one-way `fulfilled` flag. Callers
//! hold the queue behind the mock's single mutex, so finding a candidate
//! and marking it fulfilled happen as one step.
//!
//! For each call the candidates are every pending expectation declared
//! unordered plus the earliest pending ordered one. The earliest-declared
//! candidate whose kind, SQL and arguments all match is fulfilled. When
//! every expectation is ordered this is strict sequencing; when none is,
//! it is first-match-wins over the whole queue.

use crate::argument::NamedValue;
use crate::convert::ValueConverter;
use crate::expectation::{Expectation, ExpectationKind};
use sqlmock_core::{Error, MockError, MockErrorKind, Result};
use std::fmt;

/// An incoming driver call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Call<'a> {
    pub(crate) kind: ExpectationKind,
    pub(crate) sql: Option<&'a str>,
    pub(crate) args: &'a [NamedValue],
}

impl fmt::Display for Call<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(sql) = self.sql {
            write!(f, " '{}'", sql)?;
        }
        if !self.args.is_empty() {
            write!(f, " with args [")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                match &arg.name {
                    Some(name) => write!(f, "{}={}", name, arg.value)?,
                    None => write!(f, "{}", arg.value)?,
                }
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct ExpectationQueue {
    expectations: Vec<Expectation>,
}

impl ExpectationQueue {
    /// Append an expectation, returning its stable index.
    pub(crate) fn push(&mut self, expectation: Expectation) -> usize {
        self.expectations.push(expectation);
        self.expectations.len() - 1
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Expectation> {
        self.expectations.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Expectation> {
        self.expectations.get_mut(index)
    }

    /// Find the expectation `call` fulfills and mark it fulfilled.
    ///
    /// Returns the index of the fulfilled expectation.
    #[allow(clippy::result_large_err)]
    pub(crate) fn resolve(
        &mut self,
        call: &Call<'_>,
        converter: &dyn ValueConverter,
    ) -> Result<usize> {
        let mut blocking: Option<Error> = None;
        let mut any_pending = false;
        let mut found = None;

        for (index, e) in self.expectations.iter().enumerate() {
            if e.fulfilled {
                continue;
            }
            any_pending = true;
            if e.ordered && blocking.is_some() {
                continue;
            }
            tracing::trace!(index, expectation = %e, call = %call, "considering expectation");

            match Self::check(e, call, converter) {
                Ok(()) => {
                    found = Some(index);
                    break;
                }
                Err(err) if e.ordered => blocking = Some(err),
                Err(_) => {}
            }
        }

        if let Some(index) = found {
            self.expectations[index].fulfilled = true;
            return Ok(index);
        }

        Err(match blocking {
            Some(err) => err,
            None if !any_pending => Error::mock(
                MockErrorKind::UnexpectedCall,
                format!(
                    "all expectations were already fulfilled, call to {} was not expected",
                    call
                ),
            ),
            None => Error::mock(
                MockErrorKind::UnexpectedCall,
                format!(
                    "call to {} was not expected, no pending expectation matches it",
                    call
                ),
            ),
        })
    }

    /// Why `e` does not accept `call`, if it doesn't.
    #[allow(clippy::result_large_err)]
    fn check(e: &Expectation, call: &Call<'_>, converter: &dyn ValueConverter) -> Result<()> {
        if e.kind != call.kind {
            return Err(Error::mock(
                MockErrorKind::UnexpectedCall,
                format!(
                    "call to {} was not expected, next expectation is: {}",
                    call, e
                ),
            ));
        }
        if !e.sql_matches(call.sql) {
            return Err(Error::mock(
                MockErrorKind::UnexpectedCall,
                format!(
                    "{}: could not match actual sql '{}' with expected pattern {}",
                    e.kind,
                    call.sql.unwrap_or(""),
                    e.sql
                        .as_ref()
                        .map_or_else(String::new, ToString::to_string)
                ),
            ));
        }
        e.args_match(call.args, converter).map_err(|err| match err {
            Error::Mock(m) => Error::Mock(MockError::new(
                m.kind,
                format!(
                    "{} '{}', arguments do not match: {}",
                    e.kind,
                    call.sql.unwrap_or(""),
                    m.message
                ),
            )),
            other => other,
        })
    }

    /// Every expectation that is still owed, in declaration order.
    pub(crate) fn pending(&self) -> impl Iterator<Item = &Expectation> {
        self.expectations.iter().filter(|e| e.is_pending())
    }

    /// The terminal check: `Ok` iff nothing is pending.
    #[allow(clippy::result_large_err)]
    pub(crate) fn all_fulfilled(&self) -> Result<()> {
        let pending: Vec<String> = self.pending().map(ToString::to_string).collect();
        if pending.is_empty() {
            Ok(())
        } else {
            Err(Error::Mock(MockError::unmet(pending)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DefaultConverter;
    use crate::expectation::ArgsExpectation;
    use crate::matcher::QueryMatcher;
    use sqlmock_core::Value;

    fn declare(q: &mut ExpectationQueue, kind: ExpectationKind, sql: &str, ordered: bool) -> usize {
        let m = QueryMatcher::Regex.compile(sql).unwrap();
        q.push(Expectation::new(kind, Some(m), ordered))
    }

    fn call<'a>(kind: ExpectationKind, sql: &'a str, args: &'a [NamedValue]) -> Call<'a> {
        Call {
            kind,
            sql: Some(sql),
            args,
        }
    }

    #[test]
    fn strict_order_rejects_reversal() {
        let mut q = ExpectationQueue::default();
        declare(&mut q, ExpectationKind::Query, "^SELECT a", true);
        declare(&mut q, ExpectationKind::Query, "^SELECT b", true);

        let err = q
            .resolve(&call(ExpectationKind::Query, "SELECT b", &[]), &DefaultConverter)
            .unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::UnexpectedCall));
        assert!(err.to_string().contains("SELECT b"));
        assert!(err.to_string().contains("^SELECT a"));
        assert!(q.pending().count() == 2);
    }

    #[test]
    fn strict_order_names_the_next_expectation_on_kind_mismatch() {
        let mut q = ExpectationQueue::default();
        declare(&mut q, ExpectationKind::Exec, "^INSERT", true);

        let err = q
            .resolve(&call(ExpectationKind::Query, "SELECT 1", &[]), &DefaultConverter)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "call to Query 'SELECT 1' was not expected, next expectation is: Exec matching '^INSERT'"
        );
    }

    #[test]
    fn unordered_accepts_any_order_once() {
        let mut q = ExpectationQueue::default();
        let a = declare(&mut q, ExpectationKind::Query, "^SELECT a", false);
        let b = declare(&mut q, ExpectationKind::Query, "^SELECT b", false);
        let c = DefaultConverter;

        assert_eq!(q.resolve(&call(ExpectationKind::Query, "SELECT b", &[]), &c).unwrap(), b);
        assert_eq!(q.resolve(&call(ExpectationKind::Query, "SELECT a", &[]), &c).unwrap(), a);

        let err = q
            .resolve(&call(ExpectationKind::Query, "SELECT a", &[]), &c)
            .unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::UnexpectedCall));
        assert!(err.to_string().starts_with("all expectations were already fulfilled"));
        assert!(q.all_fulfilled().is_ok());
    }

    #[test]
    fn unordered_tie_break_is_declaration_order() {
        let mut q = ExpectationQueue::default();
        let first = declare(&mut q, ExpectationKind::Query, "SELECT", false);
        let second = declare(&mut q, ExpectationKind::Query, "SELECT", false);
        let c = DefaultConverter;
        assert_eq!(q.resolve(&call(ExpectationKind::Query, "SELECT 1", &[]), &c).unwrap(), first);
        assert_eq!(q.resolve(&call(ExpectationKind::Query, "SELECT 1", &[]), &c).unwrap(), second);
    }

    #[test]
    fn unordered_skips_expectations_with_other_args() {
        let mut q = ExpectationQueue::default();
        let a = declare(&mut q, ExpectationKind::Exec, "UPDATE", false);
        let b = declare(&mut q, ExpectationKind::Exec, "UPDATE", false);
        q.get_mut(a).unwrap().args = ArgsExpectation::Exactly(crate::args![1]);
        q.get_mut(b).unwrap().args = ArgsExpectation::Exactly(crate::args![2]);

        let two = NamedValue::from_params(&[Value::Int(2)]);
        let idx = q
            .resolve(&call(ExpectationKind::Exec, "UPDATE t", &two), &DefaultConverter)
            .unwrap();
        assert_eq!(idx, b);
    }

    #[test]
    fn strict_order_reports_argument_errors() {
        let mut q = ExpectationQueue::default();
        let i = declare(&mut q, ExpectationKind::Exec, "^INSERT", true);
        q.get_mut(i).unwrap().args = ArgsExpectation::Exactly(crate::args![1, 2]);

        let one = NamedValue::from_params(&[Value::Int(1)]);
        let err = q
            .resolve(&call(ExpectationKind::Exec, "INSERT INTO t", &one), &DefaultConverter)
            .unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::ArgumentCount));
        assert_eq!(
            err.to_string(),
            "Exec 'INSERT INTO t', arguments do not match: expected 2 arguments, got 1"
        );
    }

    #[test]
    fn unordered_expectations_can_jump_the_ordered_head() {
        let mut q = ExpectationQueue::default();
        let ordered = declare(&mut q, ExpectationKind::Query, "^SELECT a", true);
        let loose = declare(&mut q, ExpectationKind::Query, "^SELECT b", false);
        let c = DefaultConverter;

        assert_eq!(q.resolve(&call(ExpectationKind::Query, "SELECT b", &[]), &c).unwrap(), loose);
        assert_eq!(q.resolve(&call(ExpectationKind::Query, "SELECT a", &[]), &c).unwrap(), ordered);
    }

    #[test]
    fn ordered_expectations_behind_the_head_are_not_candidates() {
        let mut q = ExpectationQueue::default();
        declare(&mut q, ExpectationKind::Query, "^SELECT a", true);
        declare(&mut q, ExpectationKind::Query, "^SELECT b", true);
        declare(&mut q, ExpectationKind::Query, "^SELECT c", true);

        assert!(
            q.resolve(&call(ExpectationKind::Query, "SELECT c", &[]), &DefaultConverter)
                .is_err()
        );
    }

    #[test]
    fn empty_queue_rejects_everything() {
        let mut q = ExpectationQueue::default();
        let err = q
            .resolve(
                &Call {
                    kind: ExpectationKind::Begin,
                    sql: None,
                    args: &[],
                },
                &DefaultConverter,
            )
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "all expectations were already fulfilled, call to Begin was not expected"
        );
    }

    #[test]
    fn all_fulfilled_lists_pending_in_order() {
        let mut q = ExpectationQueue::default();
        declare(&mut q, ExpectationKind::Query, "^SELECT", true);
        declare(&mut q, ExpectationKind::Exec, "^DELETE", true);

        let err = q.all_fulfilled().unwrap_err();
        assert_eq!(err.mock_kind(), Some(MockErrorKind::UnmetExpectations));
        assert_eq!(
            err.to_string(),
            "there are remaining expectations which were not met\n  1. Query matching '^SELECT'\n  2. Exec matching '^DELETE'"
        );

        q.resolve(&call(ExpectationKind::Query, "SELECT 1", &[]), &DefaultConverter)
            .unwrap();
        let err = q.all_fulfilled().unwrap_err();
        assert!(!err.to_string().contains("SELECT"));
        assert!(q.get(0).unwrap().fulfilled);
    }

    #[test]
    fn call_display_includes_args() {
        let args = vec![
            NamedValue::positional(1, 5),
            NamedValue::named("name", 2, "x"),
        ];
        let c = call(ExpectationKind::Query, "SELECT", &args);
        assert_eq!(c.to_string(), "Query 'SELECT' with args [5, name=\"x\"]");
    }
}
