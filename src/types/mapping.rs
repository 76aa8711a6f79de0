//! SQL type descriptors for Bigtable query parameters and result columns.

use std::fmt;

/// Declared type of a query parameter or result column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SqlType {
    /// BYTES
    Bytes,
    /// STRING
    String,
    /// INT64
    Int64,
    /// FLOAT32
    Float32,
    /// FLOAT64
    Float64,
    /// BOOL
    Bool,
    /// DATE
    Date,
    /// TIMESTAMP
    Timestamp,
    /// ARRAY<element>
    Array(Box<SqlType>),
    /// MAP<key, value>, the shape of a column family in `SELECT *`
    Map(Box<SqlType>, Box<SqlType>),
    /// STRUCT<fields>
    Struct(Vec<StructField>),
}

/// Field of a STRUCT type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructField {
    /// Field name, absent for anonymous fields
    pub name: Option<String>,
    /// Field type
    pub field_type: SqlType,
}

impl SqlType {
    /// Shorthand for `ARRAY<element>`.
    pub fn array_of(element: SqlType) -> Self {
        SqlType::Array(Box::new(element))
    }

    /// Shorthand for `MAP<key, value>`.
    pub fn map_of(key: SqlType, value: SqlType) -> Self {
        SqlType::Map(Box::new(key), Box::new(value))
    }

    /// Whether this is a non-composite type.
    pub fn is_scalar(&self) -> bool {
        !matches!(
            self,
            SqlType::Array(_) | SqlType::Map(_, _) | SqlType::Struct(_)
        )
    }

    /// Whether a value of this type can be sent as a query parameter.
    ///
    /// Parameters may be scalars or arrays of scalars.
    pub fn is_bindable(&self) -> bool {
        match self {
            SqlType::Array(element) => element.is_scalar(),
            other => other.is_scalar(),
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlType::Bytes => write!(f, "BYTES"),
            SqlType::String => write!(f, "STRING"),
            SqlType::Int64 => write!(f, "INT64"),
            SqlType::Float32 => write!(f, "FLOAT32"),
            SqlType::Float64 => write!(f, "FLOAT64"),
            SqlType::Bool => write!(f, "BOOL"),
            SqlType::Date => write!(f, "DATE"),
            SqlType::Timestamp => write!(f, "TIMESTAMP"),
            SqlType::Array(element) => write!(f, "ARRAY<{}>", element),
            SqlType::Map(key, value) => write!(f, "MAP<{}, {}>", key, value),
            SqlType::Struct(fields) => {
                write!(f, "STRUCT<")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match &field.name {
                        Some(name) => write!(f, "{} {}", name, field.field_type)?,
                        None => write!(f, "{}", field.field_type)?,
                    }
                }
                write!(f, ">")
            }
        }
    }
}
