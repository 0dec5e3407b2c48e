//! Value types exchanged with the database driver.
//!
//! Parameters flow from the session layer into the driver; scanned values and
//! column type reports flow back out.

use std::fmt;

/// Typed parameter value handed to the driver for positional binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parameter {
    /// Text value
    Text(String),
    /// 64-bit integer value
    Integer(i64),
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Parameter::Integer(value)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Parameter::Text(value.to_string())
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Parameter::Text(value)
    }
}

/// A single scanned cell as reported by the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// Fixed-point value in its textual form
    Decimal(String),
    /// Text value (also used for dates and timestamps)
    Text(String),
    /// Binary value
    Bytes(Vec<u8>),
}

impl Value {
    /// Check if this value is SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Canonical display string, or `None` for SQL NULL.
    pub fn to_display(&self) -> Option<String> {
        match self {
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => f.write_str(d),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(b) => f.write_str(&hex::encode(b)),
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Column type information as reported by the driver.
///
/// Each optional field is `None` when the driver reports it as not applicable
/// to the column's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// Database type name, e.g. `NUMBER` or `TEXT`
    pub database_type_name: String,
    /// Nominal length for variable-length types
    pub length: Option<i64>,
    /// Precision and scale for fixed-point types
    pub decimal_size: Option<(i64, i64)>,
    /// Nullability, when known
    pub nullable: Option<bool>,
}

impl ColumnType {
    /// Create a column type with only a type name.
    pub fn new(database_type_name: impl Into<String>) -> Self {
        Self {
            database_type_name: database_type_name.into(),
            length: None,
            decimal_size: None,
            nullable: None,
        }
    }

    /// Set the nominal length.
    pub fn with_length(mut self, length: i64) -> Self {
        self.length = Some(length);
        self
    }

    /// Set precision and scale.
    pub fn with_decimal_size(mut self, precision: i64, scale: i64) -> Self {
        self.decimal_size = Some((precision, scale));
        self
    }

    /// Set nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }
}
