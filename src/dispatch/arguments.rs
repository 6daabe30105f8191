//! Argument binding and coercion.
//!
//! # Responsibilities
//! - Walk an operation's bindings in order and pull each named parameter
//! - Coerce raw text per `ParamKind`
//! - Give operation bodies typed, positional access to the result

use std::collections::HashMap;
use std::fmt;

use crate::dispatch::DispatchError;
use crate::registry::{ParamKind, ParameterBinding};

/// A bound argument or an operation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// No value; renders as an empty body.
    Unit,
    Integer(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unit => Ok(()),
            Value::Integer(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Unit
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(n.into())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Unit, Into::into)
    }
}

/// Positional access failed inside an operation body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    #[error("argument {index} is missing")]
    Missing { index: usize },

    #[error("argument {index} is not {expected}")]
    Kind { index: usize, expected: ParamKind },
}

/// Failure returned by an operation body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvokeError {
    /// Business-logic failure; reported to the caller as an internal error.
    #[error("{0}")]
    Failed(String),

    /// The body asked for arguments its bindings do not provide.
    #[error(transparent)]
    Argument(#[from] ArgumentError),

    /// The cached instance was not of the type the body expects.
    #[error("handler instance is not a {expected}")]
    HandlerMismatch { expected: &'static str },
}

impl InvokeError {
    pub fn failed(message: impl Into<String>) -> Self {
        InvokeError::Failed(message.into())
    }
}

/// Bound arguments in binding order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments(Vec<Value>);

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }

    pub fn integer(&self, index: usize) -> Result<i64, ArgumentError> {
        match self.0.get(index) {
            Some(Value::Integer(n)) => Ok(*n),
            Some(_) => Err(ArgumentError::Kind {
                index,
                expected: ParamKind::Integer,
            }),
            None => Err(ArgumentError::Missing { index }),
        }
    }

    pub fn text(&self, index: usize) -> Result<&str, ArgumentError> {
        match self.0.get(index) {
            Some(Value::Text(s)) => Ok(s),
            Some(_) => Err(ArgumentError::Kind {
                index,
                expected: ParamKind::String,
            }),
            None => Err(ArgumentError::Missing { index }),
        }
    }
}

/// Bind request parameters to arguments, in binding order.
///
/// The first binding whose parameter is absent is reported. Coercion happens
/// as each binding is visited, so a malformed earlier value wins over a
/// missing later one.
pub fn bind_arguments(
    bindings: &[ParameterBinding],
    params: &HashMap<String, String>,
) -> Result<Arguments, DispatchError> {
    let mut values = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let raw = params
            .get(&binding.name)
            .ok_or_else(|| DispatchError::MissingParameter {
                name: binding.name.clone(),
            })?;
        values.push(coerce(binding, raw)?);
    }
    Ok(Arguments(values))
}

fn coerce(binding: &ParameterBinding, raw: &str) -> Result<Value, DispatchError> {
    match binding.kind {
        ParamKind::Integer => raw.parse::<i64>().map(Value::Integer).map_err(|e| {
            DispatchError::InvocationFailure {
                message: format!("parameter '{}' expects an integer, got {raw:?}: {e}", binding.name),
            }
        }),
        ParamKind::String => Ok(Value::Text(raw.to_string())),
    }
}
