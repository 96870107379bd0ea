//! Expected and actual call arguments.
//!
//! An expectation lists one [`ExpectedArg`] per position. Each wraps an
//! [`ArgSpec`]: a concrete value, the "any value" wildcard, a custom
//! [`Argument`] predicate, or a [`Valuer`] that is unwrapped to its driver
//! value before comparison. Calls arrive as a slice of [`NamedValue`].

use crate::convert::ValueConverter;
use sqlmock_core::{Result, Value};
use std::fmt;
use std::sync::Arc;

/// A custom argument predicate.
///
/// ```
/// use sqlmock::{Argument, Value};
///
/// #[derive(Debug)]
/// struct Positive;
///
/// impl Argument for Positive {
///     fn matches(&self, value: &Value) -> bool {
///         value.as_i64().is_some_and(|v| v > 0)
///     }
/// }
///
/// assert!(Positive.matches(&Value::Int(3)));
/// assert!(!Positive.matches(&Value::Int(-3)));
/// ```
pub trait Argument: fmt::Debug + Send + Sync {
    /// Whether the supplied argument value is acceptable.
    fn matches(&self, value: &Value) -> bool;
}

/// A value wrapper that knows how to produce the driver value it stands for.
pub trait Valuer: fmt::Debug + Send + Sync {
    #[allow(clippy::result_large_err)]
    fn driver_value(&self) -> Result<Value>;
}

/// What an expectation accepts at one argument position.
#[derive(Debug, Clone)]
pub enum ArgSpec {
    /// Any value at all.
    Any,
    /// A value equal to this one after conversion.
    Value(Value),
    /// A value the predicate accepts.
    Matcher(Arc<dyn Argument>),
    /// A value equal to the wrapper's driver value after conversion.
    Valuer(Arc<dyn Valuer>),
}

impl ArgSpec {
    /// Wrap a custom predicate.
    pub fn matcher(argument: impl Argument + 'static) -> Self {
        ArgSpec::Matcher(Arc::new(argument))
    }

    /// Wrap a driver-value producer.
    pub fn valuer(valuer: impl Valuer + 'static) -> Self {
        ArgSpec::Valuer(Arc::new(valuer))
    }

    /// Decide whether `actual` satisfies this spec.
    ///
    /// Both sides go through `converter` before the comparison; a
    /// conversion failure on either side is a mismatch.
    pub fn matches(&self, actual: &Value, converter: &dyn ValueConverter) -> bool {
        match self {
            ArgSpec::Any => true,
            ArgSpec::Matcher(m) => m.matches(actual),
            ArgSpec::Value(expected) => converted_eq(expected, actual, converter),
            ArgSpec::Valuer(v) => v
                .driver_value()
                .is_ok_and(|expected| converted_eq(&expected, actual, converter)),
        }
    }
}

fn converted_eq(expected: &Value, actual: &Value, converter: &dyn ValueConverter) -> bool {
    match (converter.convert(expected), converter.convert(actual)) {
        (Ok(e), Ok(a)) => e == a,
        _ => false,
    }
}

impl fmt::Display for ArgSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgSpec::Any => write!(f, "<any>"),
            ArgSpec::Value(v) => write!(f, "{}", v),
            ArgSpec::Matcher(m) => write!(f, "<matcher {:?}>", m),
            ArgSpec::Valuer(v) => match v.driver_value() {
                Ok(value) => write!(f, "{}", value),
                Err(_) => write!(f, "<valuer {:?}>", v),
            },
        }
    }
}

/// The wildcard: matches any value at its position.
pub fn any_arg() -> ArgSpec {
    ArgSpec::Any
}

/// One declared argument, optionally bound to a parameter name.
#[derive(Debug, Clone)]
pub struct ExpectedArg {
    pub name: Option<String>,
    pub spec: ArgSpec,
}

impl ExpectedArg {
    pub fn positional(spec: ArgSpec) -> Self {
        Self { name: None, spec }
    }
}

impl From<ArgSpec> for ExpectedArg {
    fn from(spec: ArgSpec) -> Self {
        Self::positional(spec)
    }
}

impl<T: Into<Value>> From<T> for ExpectedArg {
    fn from(value: T) -> Self {
        Self::positional(ArgSpec::Value(value.into()))
    }
}

impl fmt::Display for ExpectedArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}={}", name, self.spec),
            None => write!(f, "{}", self.spec),
        }
    }
}

/// Declare a named argument.
///
/// The call must supply an argument with this name at the declared position.
pub fn named(name: impl Into<String>, spec: impl Into<ExpectedArg>) -> ExpectedArg {
    ExpectedArg {
        name: Some(name.into()),
        spec: spec.into().spec,
    }
}

/// An argument as supplied by a call.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedValue {
    pub name: Option<String>,
    /// 1-based position.
    pub ordinal: usize,
    pub value: Value,
}

impl NamedValue {
    pub fn positional(ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: None,
            ordinal,
            value: value.into(),
        }
    }

    pub fn named(name: impl Into<String>, ordinal: usize, value: impl Into<Value>) -> Self {
        Self {
            name: Some(name.into()),
            ordinal,
            value: value.into(),
        }
    }

    /// Number plain parameters from 1.
    pub fn from_params(params: &[Value]) -> Vec<Self> {
        params
            .iter()
            .enumerate()
            .map(|(i, v)| Self::positional(i + 1, v.clone()))
            .collect()
    }
}

/// Build a `Vec<ExpectedArg>` from mixed values and specs.
///
/// ```
/// use sqlmock::{any_arg, args};
///
/// let expected = args![5, any_arg(), "x"];
/// assert_eq!(expected.len(), 3);
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        ::std::vec![$($crate::ExpectedArg::from($arg)),*]
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::DefaultConverter;

    #[derive(Debug)]
    struct Even;

    impl Argument for Even {
        fn matches(&self, value: &Value) -> bool {
            value.as_i64().is_some_and(|v| v % 2 == 0)
        }
    }

    #[derive(Debug)]
    struct UserId(i64);

    impl Valuer for UserId {
        fn driver_value(&self) -> Result<Value> {
            Ok(Value::BigInt(self.0))
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Valuer for Broken {
        fn driver_value(&self) -> Result<Value> {
            Err(sqlmock_core::Error::Custom("no value".into()))
        }
    }

    #[test]
    fn wildcard_matches_everything() {
        let c = DefaultConverter;
        assert!(any_arg().matches(&Value::Null, &c));
        assert!(any_arg().matches(&Value::Text("x".into()), &c));
        assert!(any_arg().matches(&Value::Default, &c));
    }

    #[test]
    fn concrete_values_compare_after_conversion() {
        let c = DefaultConverter;
        let spec = ArgSpec::Value(Value::Int(5));
        assert!(spec.matches(&Value::BigInt(5), &c));
        assert!(spec.matches(&Value::SmallInt(5), &c));
        assert!(!spec.matches(&Value::BigInt(6), &c));
        assert!(!spec.matches(&Value::Text("5".into()), &c));
    }

    #[test]
    fn booleans_never_match_numbers() {
        let c = DefaultConverter;
        assert!(!ArgSpec::Value(Value::Bool(true)).matches(&Value::Int(1), &c));
        assert!(!ArgSpec::Value(Value::Int(0)).matches(&Value::Bool(false), &c));
    }

    #[test]
    fn conversion_failure_is_a_mismatch() {
        let c = DefaultConverter;
        assert!(!ArgSpec::Value(Value::Default).matches(&Value::Default, &c));
    }

    #[test]
    fn custom_matchers_and_valuers() {
        let c = DefaultConverter;
        let even = ArgSpec::matcher(Even);
        assert!(even.matches(&Value::Int(4), &c));
        assert!(!even.matches(&Value::Int(3), &c));

        let id = ArgSpec::valuer(UserId(7));
        assert!(id.matches(&Value::Int(7), &c));
        assert!(!id.matches(&Value::Int(8), &c));
        assert!(!ArgSpec::valuer(Broken).matches(&Value::Null, &c));
    }

    #[test]
    fn args_macro_mixes_values_and_specs() {
        let expected = args![5, any_arg(), named("id", 3)];
        assert_eq!(expected.len(), 3);
        assert!(matches!(expected[1].spec, ArgSpec::Any));
        assert_eq!(expected[2].name.as_deref(), Some("id"));
        assert_eq!(expected[0].to_string(), "5");
        assert_eq!(expected[1].to_string(), "<any>");
        assert_eq!(expected[2].to_string(), "id=3");
    }

    #[test]
    fn params_are_numbered_from_one() {
        let values = NamedValue::from_params(&[Value::Int(1), Value::Text("a".into())]);
        assert_eq!(values[0].ordinal, 1);
        assert_eq!(values[1].ordinal, 2);
        assert_eq!(values[1].name, None);
    }
}
