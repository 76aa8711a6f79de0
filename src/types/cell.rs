//! Typed cell values as delivered by the remote query engine.

use chrono::{DateTime, NaiveDate, Utc};

/// One typed value in a result row.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// SQL NULL
    Null,
    /// BYTES
    Bytes(Vec<u8>),
    /// STRING
    String(String),
    /// INT64
    Int64(i64),
    /// FLOAT32
    Float32(f32),
    /// FLOAT64
    Float64(f64),
    /// BOOL
    Bool(bool),
    /// DATE
    Date(NaiveDate),
    /// TIMESTAMP, stored as a UTC instant
    Timestamp(DateTime<Utc>),
    /// ARRAY
    Array(Vec<Cell>),
    /// MAP, as ordered key/value pairs
    Map(Vec<(Cell, Cell)>),
    /// STRUCT, fields in declaration order
    Struct(Vec<Cell>),
}

impl Cell {
    /// Check for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Short type name used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Cell::Null => "NULL",
            Cell::Bytes(_) => "BYTES",
            Cell::String(_) => "STRING",
            Cell::Int64(_) => "INT64",
            Cell::Float32(_) => "FLOAT32",
            Cell::Float64(_) => "FLOAT64",
            Cell::Bool(_) => "BOOL",
            Cell::Date(_) => "DATE",
            Cell::Timestamp(_) => "TIMESTAMP",
            Cell::Array(_) => "ARRAY",
            Cell::Map(_) => "MAP",
            Cell::Struct(_) => "STRUCT",
        }
    }

    /// Look up a map entry by key.
    ///
    /// Returns `None` when this is not a map or the key is absent.
    pub fn map_get(&self, key: &Cell) -> Option<&Cell> {
        match self {
            Cell::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }
}

impl From<&[u8]> for Cell {
    fn from(value: &[u8]) -> Self {
        Cell::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Cell {
    fn from(value: Vec<u8>) -> Self {
        Cell::Bytes(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::String(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int64(value)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float64(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Bool(value)
    }
}

impl From<NaiveDate> for Cell {
    fn from(value: NaiveDate) -> Self {
        Cell::Date(value)
    }
}

impl From<DateTime<Utc>> for Cell {
    fn from(value: DateTime<Utc>) -> Self {
        Cell::Timestamp(value)
    }
}
