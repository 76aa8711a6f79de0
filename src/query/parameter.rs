//! Positional parameter values.

use crate::error::QueryError;
use crate::types::SqlType;
use chrono::{DateTime, NaiveDate, Utc};

/// A typed value bound to a statement position.
#[derive(Debug, Clone, PartialEq)]
pub enum Parameter {
    /// Typed NULL
    Null(SqlType),
    /// BOOL
    Bool(bool),
    /// INT64; narrower integers are promoted
    Int64(i64),
    /// FLOAT32
    Float32(f32),
    /// FLOAT64
    Float64(f64),
    /// STRING
    String(String),
    /// BYTES
    Bytes(Vec<u8>),
    /// DATE
    Date(NaiveDate),
    /// TIMESTAMP
    Timestamp(DateTime<Utc>),
    /// ARRAY of scalars
    Array(SqlArray),
    /// Arbitrary-precision decimal text. Never accepted for binding.
    Decimal(String),
    /// Structured value. Never accepted for binding.
    Struct(Vec<(String, Parameter)>),
}

impl Parameter {
    /// Short type name used in error messages.
    pub fn type_name(&self) -> String {
        match self {
            Parameter::Null(sql_type) => sql_type.to_string(),
            Parameter::Bool(_) => "BOOL".to_string(),
            Parameter::Int64(_) => "INT64".to_string(),
            Parameter::Float32(_) => "FLOAT32".to_string(),
            Parameter::Float64(_) => "FLOAT64".to_string(),
            Parameter::String(_) => "STRING".to_string(),
            Parameter::Bytes(_) => "BYTES".to_string(),
            Parameter::Date(_) => "DATE".to_string(),
            Parameter::Timestamp(_) => "TIMESTAMP".to_string(),
            Parameter::Array(array) => SqlType::array_of(array.element_type.clone()).to_string(),
            Parameter::Decimal(_) => "DECIMAL".to_string(),
            Parameter::Struct(_) => "STRUCT".to_string(),
        }
    }

    /// Declared SQL type, if the value has a bindable one.
    pub fn sql_type(&self) -> Option<SqlType> {
        match self {
            Parameter::Null(sql_type) => Some(sql_type.clone()),
            Parameter::Bool(_) => Some(SqlType::Bool),
            Parameter::Int64(_) => Some(SqlType::Int64),
            Parameter::Float32(_) => Some(SqlType::Float32),
            Parameter::Float64(_) => Some(SqlType::Float64),
            Parameter::String(_) => Some(SqlType::String),
            Parameter::Bytes(_) => Some(SqlType::Bytes),
            Parameter::Date(_) => Some(SqlType::Date),
            Parameter::Timestamp(_) => Some(SqlType::Timestamp),
            Parameter::Array(array) => Some(SqlType::array_of(array.element_type.clone())),
            Parameter::Decimal(_) | Parameter::Struct(_) => None,
        }
    }

    /// Check the value can be sent at `index`, promoting where lossless.
    pub(crate) fn into_bindable(self, index: usize) -> Result<Parameter, QueryError> {
        match self {
            Parameter::Decimal(_) | Parameter::Struct(_) => Err(QueryError::UnsupportedType {
                index,
                type_name: self.type_name(),
            }),
            Parameter::Null(ref sql_type) if !sql_type.is_bindable() => {
                Err(QueryError::UnsupportedType {
                    index,
                    type_name: sql_type.to_string(),
                })
            }
            Parameter::Array(array) => array.validated(index).map(Parameter::Array),
            other => Ok(other),
        }
    }
}

/// An array parameter with a declared scalar element type.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlArray {
    /// Element type
    pub element_type: SqlType,
    /// Elements; NULL entries use `Parameter::Null`
    pub elements: Vec<Parameter>,
}

impl SqlArray {
    /// Create an array value.
    pub fn new(element_type: SqlType, elements: Vec<Parameter>) -> Self {
        Self {
            element_type,
            elements,
        }
    }

    fn validated(self, index: usize) -> Result<SqlArray, QueryError> {
        if !self.element_type.is_scalar() {
            return Err(QueryError::UnsupportedType {
                index,
                type_name: SqlType::array_of(self.element_type).to_string(),
            });
        }

        let element_type = self.element_type;
        let elements = self
            .elements
            .into_iter()
            .enumerate()
            .map(|(position, element)| match (element, &element_type) {
                (Parameter::Null(_), t) => Ok(Parameter::Null(t.clone())),
                (Parameter::Float32(v), SqlType::Float64) => Ok(Parameter::Float64(f64::from(v))),
                (element, t) if element.sql_type().as_ref() == Some(t) => Ok(element),
                (element, t) => Err(QueryError::ParameterBindingError {
                    index,
                    message: format!(
                        "array element {} is {}, expected {}",
                        position,
                        element.type_name(),
                        t
                    ),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(SqlArray {
            element_type,
            elements,
        })
    }
}

impl From<bool> for Parameter {
    fn from(value: bool) -> Self {
        Parameter::Bool(value)
    }
}

impl From<i16> for Parameter {
    fn from(value: i16) -> Self {
        Parameter::Int64(i64::from(value))
    }
}

impl From<i32> for Parameter {
    fn from(value: i32) -> Self {
        Parameter::Int64(i64::from(value))
    }
}

impl From<i64> for Parameter {
    fn from(value: i64) -> Self {
        Parameter::Int64(value)
    }
}

impl From<f32> for Parameter {
    fn from(value: f32) -> Self {
        Parameter::Float32(value)
    }
}

impl From<f64> for Parameter {
    fn from(value: f64) -> Self {
        Parameter::Float64(value)
    }
}

impl From<String> for Parameter {
    fn from(value: String) -> Self {
        Parameter::String(value)
    }
}

impl From<&str> for Parameter {
    fn from(value: &str) -> Self {
        Parameter::String(value.to_string())
    }
}

impl From<Vec<u8>> for Parameter {
    fn from(value: Vec<u8>) -> Self {
        Parameter::Bytes(value)
    }
}

impl From<&[u8]> for Parameter {
    fn from(value: &[u8]) -> Self {
        Parameter::Bytes(value.to_vec())
    }
}

impl From<NaiveDate> for Parameter {
    fn from(value: NaiveDate) -> Self {
        Parameter::Date(value)
    }
}

impl From<DateTime<Utc>> for Parameter {
    fn from(value: DateTime<Utc>) -> Self {
        Parameter::Timestamp(value)
    }
}

impl From<SqlArray> for Parameter {
    fn from(value: SqlArray) -> Self {
        Parameter::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_narrow_integers_promote_without_loss() {
        assert_eq!(Parameter::from(i16::MIN), Parameter::Int64(-32768));
        assert_eq!(Parameter::from(i32::MAX), Parameter::Int64(2_147_483_647));
        assert_eq!(Parameter::from(1.5f32), Parameter::Float32(1.5));
    }

    #[test]
    fn test_decimal_and_struct_are_unsupported() {
        let err = Parameter::Decimal("1.10".to_string())
            .into_bindable(2)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);

        let err = Parameter::Struct(vec![("id".to_string(), Parameter::Int64(1))])
            .into_bindable(1)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn test_null_needs_bindable_type() {
        assert!(Parameter::Null(SqlType::String).into_bindable(1).is_ok());
        assert!(Parameter::Null(SqlType::array_of(SqlType::Int64))
            .into_bindable(1)
            .is_ok());

        let err = Parameter::Null(SqlType::map_of(SqlType::Bytes, SqlType::Bytes))
            .into_bindable(1)
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedType { index: 1, .. }));
    }

    #[test]
    fn test_array_validation() {
        let array = SqlArray::new(
            SqlType::Float64,
            vec![
                Parameter::Float32(0.5),
                Parameter::Null(SqlType::Float64),
                Parameter::Float64(2.0),
            ],
        );
        let bound = Parameter::from(array).into_bindable(1).unwrap();
        assert_eq!(
            bound,
            Parameter::Array(SqlArray::new(
                SqlType::Float64,
                vec![
                    Parameter::Float64(0.5),
                    Parameter::Null(SqlType::Float64),
                    Parameter::Float64(2.0),
                ],
            ))
        );

        let mixed = SqlArray::new(
            SqlType::Int64,
            vec![Parameter::Int64(1), Parameter::from("two")],
        );
        let err = Parameter::from(mixed).into_bindable(3).unwrap_err();
        assert!(matches!(
            err,
            QueryError::ParameterBindingError { index: 3, .. }
        ));
    }

    #[test]
    fn test_nested_arrays_are_unsupported() {
        let nested = SqlArray::new(SqlType::array_of(SqlType::Int64), vec![]);
        let err = Parameter::from(nested).into_bindable(1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Parameter::from(vec![1u8]).type_name(), "BYTES");
        assert_eq!(
            Parameter::from(SqlArray::new(SqlType::String, vec![])).type_name(),
            "ARRAY<STRING>"
        );
        assert_eq!(Parameter::Decimal("1".to_string()).sql_type(), None);
    }
}
