//! Pluggable value normalisation.
//!
//! Before an expected argument is compared with the one a call supplied,
//! both pass through a [`ValueConverter`]. The default converter folds the
//! representations a driver treats as the same value onto one canonical
//! variant; tests with domain-specific argument types install their own.

use sqlmock_core::error::TypeError;
use sqlmock_core::{Error, Result, Value};

/// Normalises a bound argument into the value the comparison sees.
///
/// Any `Fn(&Value) -> Result<Value>` closure is a converter.
pub trait ValueConverter: Send + Sync {
    /// Convert `value`, or fail if this converter does not accept it.
    ///
    /// A failure makes the argument a mismatch; it is never escalated.
    #[allow(clippy::result_large_err)]
    fn convert(&self, value: &Value) -> Result<Value>;
}

impl<F> ValueConverter for F
where
    F: Fn(&Value) -> Result<Value> + Send + Sync,
{
    fn convert(&self, value: &Value) -> Result<Value> {
        self(value)
    }
}

/// The converter used when none is configured.
///
/// - every integer width becomes `BigInt`
/// - `Float` widens to `Double`
/// - `Timestamp` is read as a UTC instant and becomes `TimestampTz`
/// - arrays are converted element by element
/// - `DEFAULT` is rejected, it cannot be bound as an argument
///
/// `Bool` stays `Bool`: a boolean never matches a number.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConverter;

impl ValueConverter for DefaultConverter {
    fn convert(&self, value: &Value) -> Result<Value> {
        Ok(match value {
            Value::TinyInt(v) => Value::BigInt(i64::from(*v)),
            Value::SmallInt(v) => Value::BigInt(i64::from(*v)),
            Value::Int(v) => Value::BigInt(i64::from(*v)),
            Value::Float(v) => Value::Double(f64::from(*v)),
            Value::Timestamp(v) => Value::TimestampTz(*v),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.convert(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Default => {
                return Err(Error::Type(TypeError {
                    expected: "bindable argument",
                    actual: "DEFAULT".to_string(),
                    column: None,
                }));
            }
            other => other.clone(),
        })
    }
}
