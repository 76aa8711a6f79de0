//! Cell coercion, one function per requested type.
//!
//! Every function returns `Ok(None)` for a NULL cell so callers can tell an
//! absent value apart from zero or `false`. `column` is the 1-based column
//! position and is only used for error reporting.

use crate::error::ConversionError;
use crate::types::Cell;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, SecondsFormat, TimeZone, Utc};

type Coerced<T> = Result<Option<T>, ConversionError>;

fn incompatible(cell: &Cell, column: usize, requested: &'static str) -> ConversionError {
    ConversionError::IncompatibleType {
        column,
        actual: cell.type_name().to_string(),
        requested,
    }
}

fn parse_text<T: std::str::FromStr>(text: &str, column: usize, requested: &'static str) -> Coerced<T> {
    text.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| ConversionError::InvalidFormat {
            column,
            value: text.to_string(),
            requested,
        })
}

fn fixed_width<const N: usize>(
    bytes: &[u8],
    column: usize,
    requested: &'static str,
    expected: &'static str,
) -> Result<[u8; N], ConversionError> {
    bytes
        .try_into()
        .map_err(|_| ConversionError::InvalidWidth {
            column,
            requested,
            expected,
            actual: bytes.len(),
        })
}

// INT64 to float conversions must not round.
fn exact_integer(
    value: i64,
    converted: i128,
    column: usize,
    requested: &'static str,
) -> Result<(), ConversionError> {
    if i128::from(value) == converted {
        Ok(())
    } else {
        Err(ConversionError::PrecisionLoss {
            column,
            value,
            requested,
        })
    }
}

/// Raw bytes. Byte cells are returned verbatim, strings as their UTF-8 encoding.
pub fn to_bytes(cell: &Cell, column: usize) -> Coerced<Vec<u8>> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Bytes(b) => Ok(Some(b.clone())),
        Cell::String(s) => Ok(Some(s.as_bytes().to_vec())),
        other => Err(incompatible(other, column, "BYTES")),
    }
}

/// Text. Byte cells are decoded as strict UTF-8; scalars use their canonical text form.
pub fn to_string(cell: &Cell, column: usize) -> Coerced<String> {
    match cell {
        Cell::Null => Ok(None),
        Cell::String(s) => Ok(Some(s.clone())),
        Cell::Bytes(b) => String::from_utf8(b.clone())
            .map(Some)
            .map_err(|_| ConversionError::InvalidUtf8 { column }),
        Cell::Int64(v) => Ok(Some(v.to_string())),
        Cell::Float32(v) => Ok(Some(v.to_string())),
        Cell::Float64(v) => Ok(Some(v.to_string())),
        Cell::Bool(v) => Ok(Some(v.to_string())),
        Cell::Date(d) => Ok(Some(d.format("%Y-%m-%d").to_string())),
        Cell::Timestamp(ts) => Ok(Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))),
        other => Err(incompatible(other, column, "STRING")),
    }
}

/// Boolean. Byte cells must be 1 or 8 bytes wide; any non-zero value is `true`.
pub fn to_bool(cell: &Cell, column: usize) -> Coerced<bool> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Bool(v) => Ok(Some(*v)),
        Cell::Int64(v) => Ok(Some(*v != 0)),
        Cell::Bytes(b) => match b.len() {
            1 => Ok(Some(b[0] != 0)),
            8 => {
                let raw = fixed_width::<8>(b, column, "BOOL", "1 or 8")?;
                Ok(Some(i64::from_be_bytes(raw) != 0))
            }
            actual => Err(ConversionError::InvalidWidth {
                column,
                requested: "BOOL",
                expected: "1 or 8",
                actual,
            }),
        },
        Cell::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(ConversionError::InvalidFormat {
                column,
                value: s.clone(),
                requested: "BOOL",
            }),
        },
        other => Err(incompatible(other, column, "BOOL")),
    }
}

/// 64-bit integer. Byte cells are read as 8-byte big-endian.
pub fn to_i64(cell: &Cell, column: usize) -> Coerced<i64> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Int64(v) => Ok(Some(*v)),
        Cell::Bytes(b) => {
            let raw = fixed_width::<8>(b, column, "INT64", "8")?;
            Ok(Some(i64::from_be_bytes(raw)))
        }
        Cell::String(s) => parse_text(s, column, "INT64"),
        other => Err(incompatible(other, column, "INT64")),
    }
}

/// 32-bit integer, narrowed from INT64 with an overflow check.
pub fn to_i32(cell: &Cell, column: usize) -> Coerced<i32> {
    to_i64(cell, column)?
        .map(|v| {
            i32::try_from(v).map_err(|_| ConversionError::NumericOverflow {
                column,
                requested: "INT32",
            })
        })
        .transpose()
}

/// 16-bit integer, narrowed from INT64 with an overflow check.
pub fn to_i16(cell: &Cell, column: usize) -> Coerced<i16> {
    to_i64(cell, column)?
        .map(|v| {
            i16::try_from(v).map_err(|_| ConversionError::NumericOverflow {
                column,
                requested: "INT16",
            })
        })
        .transpose()
}

/// 64-bit float. Byte cells are read as 8-byte big-endian IEEE-754.
pub fn to_f64(cell: &Cell, column: usize) -> Coerced<f64> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Float64(v) => Ok(Some(*v)),
        Cell::Float32(v) => Ok(Some(f64::from(*v))),
        Cell::Int64(v) => {
            let f = *v as f64;
            exact_integer(*v, f as i128, column, "FLOAT64").map(|_| Some(f))
        }
        Cell::Bytes(b) => {
            let raw = fixed_width::<8>(b, column, "FLOAT64", "8")?;
            Ok(Some(f64::from_be_bytes(raw)))
        }
        Cell::String(s) => parse_text(s, column, "FLOAT64"),
        other => Err(incompatible(other, column, "FLOAT64")),
    }
}

/// 32-bit float. Finite FLOAT64 values outside the f32 range overflow.
pub fn to_f32(cell: &Cell, column: usize) -> Coerced<f32> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Float32(v) => Ok(Some(*v)),
        Cell::Float64(v) => {
            if v.is_finite() && v.abs() > f64::from(f32::MAX) {
                Err(ConversionError::NumericOverflow {
                    column,
                    requested: "FLOAT32",
                })
            } else {
                Ok(Some(*v as f32))
            }
        }
        Cell::Int64(v) => {
            let f = *v as f32;
            exact_integer(*v, f as i128, column, "FLOAT32").map(|_| Some(f))
        }
        Cell::Bytes(b) => {
            let raw = fixed_width::<4>(b, column, "FLOAT32", "4")?;
            Ok(Some(f32::from_be_bytes(raw)))
        }
        Cell::String(s) => parse_text(s, column, "FLOAT32"),
        other => Err(incompatible(other, column, "FLOAT32")),
    }
}

/// Calendar day.
///
/// Timestamps are decomposed in `offset` (UTC when absent); the stored instant
/// is unchanged. DATE cells carry no instant and are returned as-is.
pub fn to_date(cell: &Cell, column: usize, offset: Option<FixedOffset>) -> Coerced<NaiveDate> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Date(d) => Ok(Some(*d)),
        Cell::Timestamp(ts) => Ok(Some(ts.with_timezone(&utc_or(offset)).date_naive())),
        other => Err(incompatible(other, column, "DATE")),
    }
}

/// Full date-time in `offset` (UTC when absent).
///
/// A DATE cell becomes midnight of that day in the requested offset.
pub fn to_timestamp(
    cell: &Cell,
    column: usize,
    offset: Option<FixedOffset>,
) -> Coerced<DateTime<FixedOffset>> {
    let offset = utc_or(offset);
    match cell {
        Cell::Null => Ok(None),
        Cell::Timestamp(ts) => Ok(Some(ts.with_timezone(&offset))),
        Cell::Date(d) => offset
            .from_local_datetime(&d.and_time(chrono::NaiveTime::MIN))
            .single()
            .map(Some)
            .ok_or_else(|| ConversionError::InvalidFormat {
                column,
                value: d.to_string(),
                requested: "TIMESTAMP",
            }),
        other => Err(incompatible(other, column, "TIMESTAMP")),
    }
}

/// Array elements.
pub fn to_array(cell: &Cell, column: usize) -> Coerced<Vec<Cell>> {
    match cell {
        Cell::Null => Ok(None),
        Cell::Array(elements) => Ok(Some(elements.clone())),
        other => Err(incompatible(other, column, "ARRAY")),
    }
}

/// Any cell, unconverted.
pub fn to_object(cell: &Cell) -> Option<Cell> {
    if cell.is_null() {
        None
    } else {
        Some(cell.clone())
    }
}

fn utc_or(offset: Option<FixedOffset>) -> FixedOffset {
    offset.unwrap_or_else(|| Utc.fix())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_bytes_round_trip_verbatim() {
        let raw = vec![0x00, 0xFF, 0x80, b'h'];
        assert_eq!(to_bytes(&Cell::Bytes(raw.clone()), 1).unwrap(), Some(raw));
        assert_eq!(
            to_bytes(&Cell::from("hotels#1"), 1).unwrap(),
            Some(b"hotels#1".to_vec())
        );
    }

    #[test]
    fn test_bytes_as_string_requires_utf8() {
        assert_eq!(
            to_string(&Cell::from(&b"Hilton Basel"[..]), 2).unwrap(),
            Some("Hilton Basel".to_string())
        );
        assert_eq!(
            to_string(&Cell::Bytes(vec![0xC3, 0x28]), 2).unwrap_err(),
            ConversionError::InvalidUtf8 { column: 2 }
        );
    }

    #[test]
    fn test_null_is_distinct_from_zero_and_false() {
        assert_eq!(to_bool(&Cell::Null, 1).unwrap(), None);
        assert_eq!(to_bool(&Cell::Bool(false), 1).unwrap(), Some(false));
        assert_eq!(to_i64(&Cell::Null, 1).unwrap(), None);
        assert_eq!(to_i64(&Cell::Int64(0), 1).unwrap(), Some(0));
        assert_eq!(to_f64(&Cell::Null, 1).unwrap(), None);
    }

    #[test]
    fn test_bool_from_fixed_width_bytes() {
        assert_eq!(to_bool(&Cell::Bytes(vec![0]), 1).unwrap(), Some(false));
        assert_eq!(to_bool(&Cell::Bytes(vec![1]), 1).unwrap(), Some(true));
        assert_eq!(
            to_bool(&Cell::Bytes(1i64.to_be_bytes().to_vec()), 1).unwrap(),
            Some(true)
        );
        assert_eq!(
            to_bool(&Cell::Bytes(0i64.to_be_bytes().to_vec()), 1).unwrap(),
            Some(false)
        );
        assert!(matches!(
            to_bool(&Cell::Bytes(vec![0, 1]), 4),
            Err(ConversionError::InvalidWidth {
                column: 4,
                actual: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_integer_narrowing() {
        let big = Cell::Int64(i64::from(i32::MAX) + 1);
        assert_eq!(to_i64(&big, 1).unwrap(), Some(2_147_483_648));
        assert!(matches!(
            to_i32(&big, 1),
            Err(ConversionError::NumericOverflow { .. })
        ));
        assert_eq!(to_i16(&Cell::Int64(-12), 1).unwrap(), Some(-12));
        assert!(to_i16(&Cell::Int64(40_000), 1).is_err());
    }

    #[test]
    fn test_integer_from_big_endian_bytes() {
        let cell = Cell::Bytes(1234i64.to_be_bytes().to_vec());
        assert_eq!(to_i64(&cell, 1).unwrap(), Some(1234));
        assert!(to_i64(&Cell::Bytes(vec![1, 2, 3]), 1).is_err());
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(to_f64(&Cell::Float32(1.5), 1).unwrap(), Some(1.5));
        assert_eq!(
            to_f64(&Cell::Bytes(2.25f64.to_be_bytes().to_vec()), 1).unwrap(),
            Some(2.25)
        );
        assert_eq!(to_f32(&Cell::Float64(0.5), 1).unwrap(), Some(0.5));
        assert!(matches!(
            to_f32(&Cell::Float64(1e300), 1),
            Err(ConversionError::NumericOverflow { .. })
        ));
        assert!(to_f32(&Cell::Float64(f64::INFINITY), 1)
            .unwrap()
            .unwrap()
            .is_infinite());
    }

    #[test]
    fn test_integer_to_float_rejects_rounding() {
        assert_eq!(to_f64(&Cell::Int64(1 << 53), 1).unwrap(), Some(9007199254740992.0));
        assert_eq!(to_f64(&Cell::Int64(-42), 1).unwrap(), Some(-42.0));
        assert!(matches!(
            to_f64(&Cell::Int64((1 << 53) + 1), 2),
            Err(ConversionError::PrecisionLoss { column: 2, requested: "FLOAT64", .. })
        ));
        assert!(matches!(
            to_f64(&Cell::Int64(i64::MAX), 1),
            Err(ConversionError::PrecisionLoss { .. })
        ));
        assert_eq!(to_f32(&Cell::Int64(1 << 24), 1).unwrap(), Some(16777216.0));
        assert!(matches!(
            to_f32(&Cell::Int64((1 << 24) + 1), 1),
            Err(ConversionError::PrecisionLoss { requested: "FLOAT32", .. })
        ));
    }

    #[test]
    fn test_utc_default_offset() {
        let instant = DateTime::parse_from_rfc3339("2024-04-20T23:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let cell = Cell::Timestamp(instant);
        let ts = to_timestamp(&cell, 1, None).unwrap().unwrap();
        assert_eq!(ts.offset().local_minus_utc(), 0);
        assert_eq!(ts, instant);
    }

    #[test]
    fn test_string_parsing() {
        assert_eq!(to_i64(&Cell::from(" 42 "), 1).unwrap(), Some(42));
        assert_eq!(to_bool(&Cell::from("TRUE"), 1).unwrap(), Some(true));
        assert!(matches!(
            to_i64(&Cell::from("forty-two"), 3),
            Err(ConversionError::InvalidFormat { column: 3, .. })
        ));
    }

    #[test]
    fn test_incompatible_type() {
        let err = to_bool(&Cell::Date(NaiveDate::from_ymd_opt(2024, 4, 20).unwrap()), 5)
            .unwrap_err();
        assert_eq!(
            err,
            ConversionError::IncompatibleType {
                column: 5,
                actual: "DATE".to_string(),
                requested: "BOOL",
            }
        );
    }

    #[test]
    fn test_offset_shifts_decomposition_not_instant() {
        let instant = Utc.with_ymd_and_hms(2024, 4, 20, 23, 30, 0).unwrap();
        let cell = Cell::Timestamp(instant);
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();

        let utc_day = to_date(&cell, 1, None).unwrap().unwrap();
        let shifted_day = to_date(&cell, 1, Some(plus_two)).unwrap().unwrap();
        assert_eq!(utc_day.day(), 20);
        assert_eq!(shifted_day.day(), 21);

        let shifted = to_timestamp(&cell, 1, Some(plus_two)).unwrap().unwrap();
        assert_eq!(shifted.hour(), 1);
        assert_eq!(shifted.with_timezone(&Utc), instant);
    }

    #[test]
    fn test_date_cell_views() {
        let day = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
        let cell = Cell::Date(day);

        assert_eq!(to_date(&cell, 1, None).unwrap(), Some(day));
        assert_eq!(to_string(&cell, 1).unwrap(), Some("2024-04-20".to_string()));

        let midnight = to_timestamp(&cell, 1, None).unwrap().unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-04-20T00:00:00+00:00");
    }

    #[test]
    fn test_array_and_object() {
        let cell = Cell::Array(vec![Cell::Int64(1), Cell::Null]);
        assert_eq!(
            to_array(&cell, 1).unwrap(),
            Some(vec![Cell::Int64(1), Cell::Null])
        );
        assert!(to_array(&Cell::Int64(1), 1).is_err());
        assert_eq!(to_object(&Cell::Null), None);
        assert_eq!(to_object(&Cell::Int64(7)), Some(Cell::Int64(7)));
    }
}
