//! Parameter bindings: how named request parameters become positional
//! arguments.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::registry::RegistrationError;

/// Coercion applied to a raw parameter string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    /// Base-10 signed 64-bit integer.
    Integer,
    /// Passed through unchanged.
    String,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamKind::Integer => "integer",
            ParamKind::String => "string",
        }
    }
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParamKind {
    type Err = RegistrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int" | "integer" | "i64" => Ok(ParamKind::Integer),
            "string" | "str" | "text" => Ok(ParamKind::String),
            _ => Err(RegistrationError::UnsupportedKind {
                parameter: None,
                kind: s.to_string(),
            }),
        }
    }
}

/// One positional argument of an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterBinding {
    pub name: String,
    pub kind: ParamKind,
}

impl ParameterBinding {
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_aliases() {
        assert_eq!("int".parse::<ParamKind>().unwrap(), ParamKind::Integer);
        assert_eq!("Integer".parse::<ParamKind>().unwrap(), ParamKind::Integer);
        assert_eq!("str".parse::<ParamKind>().unwrap(), ParamKind::String);
    }

    #[test]
    fn unsupported_kind_is_a_registration_error() {
        let err = "float".parse::<ParamKind>().unwrap_err();
        assert!(matches!(err, RegistrationError::UnsupportedKind { ref kind, .. } if kind == "float"));
    }
}
