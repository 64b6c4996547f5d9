//! Scalar values bound as query parameters.
//!
//! [`Value`] is the only thing the translator ever places in a parameter
//! list. Builders coerce caller-supplied values to the declared column type
//! with [`Value::coerce_to`], so a value that cannot be represented in the
//! column type is rejected while the descriptor is being built.
//!
//! ## Conversion
//!
//! Standard Rust types convert with `From`/`Into`:
//!
//! ```
//! use riptide::Value;
//!
//! assert_eq!(Value::from(42), Value::Int(42));
//! assert_eq!(Value::from("Grace"), Value::String("Grace".into()));
//! assert_eq!(Value::from(None::<i64>), Value::Null);
//! ```

mod sea;

pub use sea::to_sea_values;

use crate::model::{DataType, TypeFamily};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// Parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Date and time without time zone
    DateTime(NaiveDateTime),
    /// Date and time in UTC
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Uuid(_) => "uuid",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Timestamp(_) => "timestamp",
            Value::Json(_) => "json",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view used by range validation
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => d.to_f64(),
            _ => None,
        }
    }

    /// Convert a JSON scalar (or structure) into a value
    ///
    /// Integers that fit `i64` become `Int`, other numbers become `Float`,
    /// arrays and objects become `Json`.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::Json(other.clone()),
        }
    }

    /// JSON representation, used by the document target's literal columns
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::Decimal(d) => serde_json::Value::String(d.to_string()),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Uuid(u) => serde_json::Value::String(u.to_string()),
            Value::Date(d) => serde_json::Value::String(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => serde_json::Value::String(t.format("%H:%M:%S%.f").to_string()),
            Value::DateTime(dt) => {
                serde_json::Value::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
            }
            Value::Timestamp(ts) => serde_json::Value::String(ts.to_rfc3339()),
            Value::Json(j) => j.clone(),
        }
    }

    /// Coerce this value to the representation of `data_type`.
    ///
    /// `Null` passes through unchanged; whether a null is acceptable is the
    /// caller's decision.
    ///
    /// # Errors
    ///
    /// Returns a description of the mismatch when the value cannot represent
    /// the type (e.g. a string for an integer column, or an integer outside
    /// the `SMALLINT` range).
    pub fn coerce_to(self, data_type: DataType) -> Result<Value, String> {
        if self.is_null() {
            return Ok(self);
        }
        let mismatch = |v: &Value| format!("{} value is not compatible with {}", v.kind(), data_type);
        match data_type.family() {
            TypeFamily::Boolean => match self {
                Value::Bool(_) => Ok(self),
                other => Err(mismatch(&other)),
            },
            TypeFamily::Integer | TypeFamily::Serial => {
                let int = match self {
                    Value::Int(i) => i,
                    Value::Decimal(d) if d.fract().is_zero() => d
                        .to_i64()
                        .ok_or_else(|| format!("{d} is out of range for {data_type}"))?,
                    other => return Err(mismatch(&other)),
                };
                let in_range = match data_type {
                    DataType::SmallInt | DataType::SmallSerial => i16::try_from(int).is_ok(),
                    DataType::Integer | DataType::Serial => i32::try_from(int).is_ok(),
                    _ => true,
                };
                if in_range {
                    Ok(Value::Int(int))
                } else {
                    Err(format!("{int} is out of range for {data_type}"))
                }
            }
            TypeFamily::Decimal if data_type == DataType::Decimal => match self {
                Value::Decimal(_) => Ok(self),
                Value::Int(i) => Ok(Value::Decimal(Decimal::from(i))),
                Value::Float(f) => Decimal::try_from(f)
                    .map(Value::Decimal)
                    .map_err(|e| format!("{f} cannot be represented as DECIMAL: {e}")),
                Value::String(s) => Decimal::from_str(&s)
                    .map(Value::Decimal)
                    .map_err(|e| format!("`{s}` is not a decimal: {e}")),
                other => Err(mismatch(&other)),
            },
            TypeFamily::Decimal => match self {
                Value::Float(_) => Ok(self),
                Value::Int(i) => Ok(Value::Float(i as f64)),
                Value::Decimal(d) => d
                    .to_f64()
                    .map(Value::Float)
                    .ok_or_else(|| format!("{d} cannot be represented as {data_type}")),
                other => Err(mismatch(&other)),
            },
            TypeFamily::String => match self {
                Value::String(_) => Ok(self),
                other => Err(mismatch(&other)),
            },
            TypeFamily::Uuid => match self {
                Value::Uuid(_) => Ok(self),
                Value::String(s) => Uuid::parse_str(&s)
                    .map(Value::Uuid)
                    .map_err(|e| format!("`{s}` is not a UUID: {e}")),
                other => Err(mismatch(&other)),
            },
            TypeFamily::Temporal => coerce_temporal(self, data_type),
            TypeFamily::Json => Ok(match self {
                Value::Json(_) => self,
                other => Value::Json(other.to_json()),
            }),
        }
    }
}

fn coerce_temporal(value: Value, data_type: DataType) -> Result<Value, String> {
    let parse_err = |s: &str, e: chrono::ParseError| format!("`{s}` is not a valid {data_type}: {e}");
    match (data_type, value) {
        (DataType::Date, v @ Value::Date(_)) => Ok(v),
        (DataType::Date, Value::String(s)) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|e| parse_err(&s, e)),
        (DataType::Time, v @ Value::Time(_)) => Ok(v),
        (DataType::Time, Value::String(s)) => NaiveTime::parse_from_str(&s, "%H:%M:%S%.f")
            .map(Value::Time)
            .map_err(|e| parse_err(&s, e)),
        (DataType::DateTime, v @ Value::DateTime(_)) => Ok(v),
        (DataType::DateTime, Value::Timestamp(ts)) => Ok(Value::DateTime(ts.naive_utc())),
        (DataType::DateTime, Value::Date(d)) => Ok(Value::DateTime(d.and_time(NaiveTime::MIN))),
        (DataType::DateTime, Value::String(s)) => {
            NaiveDateTime::parse_from_str(&s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S%.f"))
                .map(Value::DateTime)
                .map_err(|e| parse_err(&s, e))
        }
        (DataType::Timestamp, v @ Value::Timestamp(_)) => Ok(v),
        (DataType::Timestamp, Value::DateTime(dt)) => Ok(Value::Timestamp(dt.and_utc())),
        (DataType::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(&s)
            .map(|ts| Value::Timestamp(ts.with_timezone(&Utc)))
            .map_err(|e| parse_err(&s, e)),
        (_, other) => Err(format!(
            "{} value is not compatible with {}",
            other.kind(),
            data_type
        )),
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(i64::from(v))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::Time(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::DateTime(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_range_checks() {
        assert_eq!(Value::Int(12).coerce_to(DataType::SmallInt), Ok(Value::Int(12)));
        assert!(Value::Int(40_000).coerce_to(DataType::SmallInt).is_err());
        assert!(Value::Int(i64::from(i32::MAX) + 1).coerce_to(DataType::Serial).is_err());
        assert!(Value::Int(i64::MAX).coerce_to(DataType::BigInt).is_ok());
    }

    #[test]
    fn test_string_is_not_an_integer() {
        let err = Value::from("18").coerce_to(DataType::Integer).unwrap_err();
        assert!(err.contains("string"));
        assert!(err.contains("INTEGER"));
    }

    #[test]
    fn test_decimal_coercions() {
        assert_eq!(
            Value::Int(3).coerce_to(DataType::Decimal),
            Ok(Value::Decimal(Decimal::from(3)))
        );
        assert_eq!(
            Value::from("19.99").coerce_to(DataType::Decimal),
            Ok(Value::Decimal(Decimal::new(1999, 2)))
        );
        assert_eq!(Value::Int(2).coerce_to(DataType::Double), Ok(Value::Float(2.0)));
        assert!(Value::Bool(true).coerce_to(DataType::Decimal).is_err());
    }

    #[test]
    fn test_temporal_parsing() {
        assert_eq!(
            Value::from("2024-02-29").coerce_to(DataType::Date),
            Ok(Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()))
        );
        assert!(Value::from("2023-02-29").coerce_to(DataType::Date).is_err());
        let ts = Value::from("2024-01-01T10:00:00+02:00")
            .coerce_to(DataType::Timestamp)
            .unwrap();
        match ts {
            Value::Timestamp(t) => assert_eq!(t.to_rfc3339(), "2024-01-01T08:00:00+00:00"),
            other => panic!("expected timestamp, got {other:?}"),
        }
        assert!(matches!(
            Value::from("2024-01-01 08:30:00").coerce_to(DataType::DateTime),
            Ok(Value::DateTime(_))
        ));
    }

    #[test]
    fn test_uuid_from_string() {
        let id = Uuid::new_v4();
        assert_eq!(
            Value::from(id.to_string()).coerce_to(DataType::Uuid),
            Ok(Value::Uuid(id))
        );
        assert!(Value::from("not-a-uuid").coerce_to(DataType::Uuid).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        assert_eq!(Value::Null.coerce_to(DataType::Uuid), Ok(Value::Null));
    }

    #[test]
    fn test_json_wraps_scalars() {
        assert_eq!(
            Value::Int(1).coerce_to(DataType::Json),
            Ok(Value::Json(serde_json::json!(1)))
        );
    }

    #[test]
    fn test_from_json() {
        assert_eq!(Value::from_json(&serde_json::json!(18)), Value::Int(18));
        assert_eq!(Value::from_json(&serde_json::json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from_json(&serde_json::json!("x")), Value::from("x"));
        assert_eq!(Value::from_json(&serde_json::json!(null)), Value::Null);
        assert!(matches!(
            Value::from_json(&serde_json::json!({"a": 1})),
            Value::Json(_)
        ));
    }
}
