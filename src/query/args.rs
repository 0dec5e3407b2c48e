//! Positional argument conversion.
//!
//! Callers hand over arguments as raw text plus a type tag; this module turns
//! them into typed driver parameters before any statement is dispatched.

use crate::driver::Parameter;
use crate::error::QueryError;

/// Type tag attached to a positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ArgType {
    /// Text argument
    String = 0,
    /// Integer argument
    Integer = 1,
}

impl TryFrom<i32> for ArgType {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(ArgType::String),
            1 => Ok(ArgType::Integer),
            other => Err(other),
        }
    }
}

/// A positional argument as received from the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    /// Declared type
    pub arg_type: ArgType,
    /// Raw textual value
    pub raw: String,
}

impl Argument {
    /// Create a text argument.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            arg_type: ArgType::String,
            raw: value.into(),
        }
    }

    /// Create an integer argument from its textual form.
    pub fn integer(value: impl Into<String>) -> Self {
        Self {
            arg_type: ArgType::Integer,
            raw: value.into(),
        }
    }

    /// Create an argument from a numeric type tag.
    ///
    /// # Errors
    ///
    /// Returns `ArgConversionFailed` for an unknown tag.
    pub fn tagged(tag: i32, raw: impl Into<String>, index: usize) -> Result<Self, QueryError> {
        let arg_type = ArgType::try_from(tag).map_err(|tag| QueryError::ArgConversionFailed {
            index,
            message: format!("unknown argument type {}", tag),
        })?;
        Ok(Self {
            arg_type,
            raw: raw.into(),
        })
    }

    /// Convert to a driver parameter.
    fn to_parameter(&self, index: usize) -> Result<Parameter, QueryError> {
        match self.arg_type {
            ArgType::String => Ok(Parameter::Text(self.raw.clone())),
            ArgType::Integer => self
                .raw
                .trim()
                .parse::<i64>()
                .map(Parameter::Integer)
                .map_err(|e| QueryError::ArgConversionFailed {
                    index,
                    message: format!("'{}' is not an integer: {}", self.raw, e),
                }),
        }
    }
}

impl From<i64> for Argument {
    fn from(value: i64) -> Self {
        Argument::integer(value.to_string())
    }
}

impl From<&str> for Argument {
    fn from(value: &str) -> Self {
        Argument::string(value)
    }
}

impl From<String> for Argument {
    fn from(value: String) -> Self {
        Argument::string(value)
    }
}

/// Convert all arguments, failing on the first one that cannot be converted.
pub fn bind_arguments(args: &[Argument]) -> Result<Vec<Parameter>, QueryError> {
    args.iter()
        .enumerate()
        .map(|(index, arg)| arg.to_parameter(index))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_mixed_arguments() {
        let args = vec![Argument::string("alice"), Argument::integer("42"), 7_i64.into()];
        let params = bind_arguments(&args).unwrap();

        assert_eq!(
            params,
            vec![
                Parameter::Text("alice".to_string()),
                Parameter::Integer(42),
                Parameter::Integer(7),
            ]
        );
    }

    #[test]
    fn test_bind_invalid_integer() {
        let args = vec![Argument::string("ok"), Argument::integer("forty-two")];
        match bind_arguments(&args) {
            Err(QueryError::ArgConversionFailed { index, message }) => {
                assert_eq!(index, 1);
                assert!(message.contains("forty-two"));
            }
            other => panic!("Expected ArgConversionFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_tagged_arguments() {
        assert_eq!(
            Argument::tagged(1, "5", 0).unwrap().arg_type,
            ArgType::Integer
        );
        assert_eq!(
            Argument::tagged(0, "x", 0).unwrap().arg_type,
            ArgType::String
        );
        assert!(matches!(
            Argument::tagged(9, "x", 3),
            Err(QueryError::ArgConversionFailed { index: 3, .. })
        ));
    }

    #[test]
    fn test_empty_arguments() {
        assert!(bind_arguments(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_string_argument_kept_verbatim() {
        let params = bind_arguments(&[Argument::string(" 12 ")]).unwrap();
        assert_eq!(params, vec![Parameter::Text(" 12 ".to_string())]);
    }
}
