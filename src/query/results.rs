//! Execution outcomes, column metadata and rows.

use crate::driver::{ColumnType, Value};
use serde::{Deserialize, Serialize};

/// Text used for SQL NULL when rows are rendered as plain strings.
///
/// A column holding the four characters `NULL` renders identically; use
/// [`Row::values`] to tell them apart.
pub const NULL_SENTINEL: &str = "NULL";

/// Outcome of a blocking statement.
///
/// Metadata retrieval is best-effort: `None` means the driver could not report
/// the value, which is distinct from a reported zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Identifier generated by the statement
    pub last_insert_id: Option<i64>,
    /// Number of rows affected
    pub rows_affected: Option<i64>,
}

impl ExecOutcome {
    /// Last insert ID, or zero when unavailable.
    pub fn last_insert_id_or_zero(&self) -> i64 {
        self.last_insert_id.unwrap_or(0)
    }

    /// Rows affected, or zero when unavailable.
    pub fn rows_affected_or_zero(&self) -> i64 {
        self.rows_affected.unwrap_or(0)
    }
}

/// Outcome of an asynchronously dispatched statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncOutcome {
    query_id: String,
}

impl AsyncOutcome {
    /// Create an outcome; `None` if the identifier is empty.
    pub(crate) fn new(query_id: String) -> Option<Self> {
        if query_id.is_empty() {
            None
        } else {
            Some(Self { query_id })
        }
    }

    /// Tracking identifier assigned by the remote system. Never empty.
    pub fn query_id(&self) -> &str {
        &self.query_id
    }
}

/// Immutable description of one result column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ColumnDescriptor {
    /// Column name
    pub name: String,
    /// Database-reported type name
    pub type_name: String,
    /// Nominal length, for variable-length types
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub length: Option<i64>,
    /// Precision, for fixed-point types
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub precision: Option<i64>,
    /// Scale, for fixed-point types
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub scale: Option<i64>,
    /// Nullability, when the driver reports it
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub nullable: Option<bool>,
}

impl ColumnDescriptor {
    /// Build a descriptor from a column name and the driver's type report.
    pub fn from_driver(name: String, column_type: &ColumnType) -> Self {
        let (precision, scale) = match column_type.decimal_size {
            Some((p, s)) => (Some(p), Some(s)),
            None => (None, None),
        };

        Self {
            name,
            type_name: column_type.database_type_name.clone(),
            length: column_type.length,
            precision,
            scale,
            nullable: column_type.nullable,
        }
    }

    /// Serialize the type information as a compact JSON record.
    pub fn to_json(&self) -> String {
        // Serializing plain strings and integers cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// One materialized result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    values: Vec<Option<String>>,
}

impl Row {
    /// Build a row from scanned driver values.
    pub fn from_values(values: &[Value]) -> Self {
        Self {
            values: values.iter().map(Value::to_display).collect(),
        }
    }

    /// Display strings with out-of-band nulls.
    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Display strings with SQL NULL rendered as [`NULL_SENTINEL`].
    pub fn display_values(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| v.clone().unwrap_or_else(|| NULL_SENTINEL.to_string()))
            .collect()
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a column index; `None` for out-of-range, `Some(None)` for NULL.
    pub fn get(&self, index: usize) -> Option<Option<&str>> {
        self.values.get(index).map(|v| v.as_deref())
    }
}

/// A fully drained result set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSet {
    /// Column descriptors, in result order
    pub columns: Vec<ColumnDescriptor>,
    /// All rows
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Column names, in result order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
