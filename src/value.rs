//! Dynamically typed column values.
//!
//! [`Value`] is the currency between the composer (bound parameters), the
//! connection layer (cursor cells) and the materializer (entity fields).
//! Coercion toward a declared [`FieldType`] handles numeric widening,
//! range-checked narrowing and text parsing of dates, timestamps and UUIDs.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::sql::FieldType;

/// A single SQL value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
}

/// Why a value could not be coerced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: FieldType,
        found: &'static str,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { value: String, target: FieldType },

    #[error("cannot parse {input:?} as {target}")]
    Parse { input: String, target: FieldType },

    #[error("NULL is not allowed here")]
    UnexpectedNull,
}

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Text("")`, which UPDATE treats like NULL when configured to.
    pub fn is_empty_text(&self) -> bool {
        matches!(self, Value::Text(s) if s.is_empty())
    }

    /// Short name of the runtime variant, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I16(_) => "int16",
            Value::I32(_) => "int32",
            Value::I64(_) => "int64",
            Value::F32(_) => "float32",
            Value::F64(_) => "float64",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::Date(_) => "date",
            Value::Timestamp(_) => "timestamp",
            Value::Uuid(_) => "uuid",
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I16(v) => Some(i64::from(*v)),
            Value::I32(v) => Some(i64::from(*v)),
            Value::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Coerce into the representation of `target`.
    ///
    /// NULL passes through unchanged; nullability is the caller's concern.
    pub fn coerce(self, target: &FieldType) -> Result<Value, ValueError> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        let mismatch = |v: &Value| ValueError::TypeMismatch {
            expected: *target,
            found: v.type_name(),
        };
        let parse_failed = |s: &str| ValueError::Parse {
            input: s.to_string(),
            target: *target,
        };

        match target {
            FieldType::Bool => match self {
                Value::Bool(b) => Ok(Value::Bool(b)),
                ref v if v.as_i64().is_some() => Ok(Value::Bool(v.as_i64() != Some(0))),
                Value::Text(ref s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "1" => Ok(Value::Bool(true)),
                    "false" | "0" => Ok(Value::Bool(false)),
                    _ => Err(parse_failed(s)),
                },
                ref v => Err(mismatch(v)),
            },

            FieldType::Int16 | FieldType::Int32 | FieldType::Int64 => {
                let wide = match self {
                    ref v if v.as_i64().is_some() => v.as_i64().unwrap_or_default(),
                    Value::Text(ref s) => s.trim().parse::<i64>().map_err(|_| parse_failed(s))?,
                    ref v => return Err(mismatch(v)),
                };
                narrow_int(wide, target)
            }

            FieldType::Float32 => match self {
                Value::F32(v) => Ok(Value::F32(v)),
                Value::F64(v) => Ok(Value::F32(v as f32)),
                ref v if v.as_i64().is_some() => Ok(Value::F32(v.as_i64().unwrap_or_default() as f32)),
                Value::Text(ref s) => s
                    .trim()
                    .parse::<f32>()
                    .map(Value::F32)
                    .map_err(|_| parse_failed(s)),
                ref v => Err(mismatch(v)),
            },

            FieldType::Float64 => match self {
                Value::F64(v) => Ok(Value::F64(v)),
                Value::F32(v) => Ok(Value::F64(f64::from(v))),
                ref v if v.as_i64().is_some() => Ok(Value::F64(v.as_i64().unwrap_or_default() as f64)),
                Value::Text(ref s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::F64)
                    .map_err(|_| parse_failed(s)),
                ref v => Err(mismatch(v)),
            },

            FieldType::String | FieldType::Varchar(_) => match self {
                Value::Text(s) => Ok(Value::Text(s)),
                Value::Uuid(u) => Ok(Value::Text(u.to_string())),
                ref v => Err(mismatch(v)),
            },

            FieldType::Date => match self {
                Value::Date(d) => Ok(Value::Date(d)),
                Value::Timestamp(ts) => Ok(Value::Date(ts.date())),
                Value::Text(ref s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .map(Value::Date)
                    .map_err(|_| parse_failed(s)),
                ref v => Err(mismatch(v)),
            },

            FieldType::Timestamp => match self {
                Value::Timestamp(ts) => Ok(Value::Timestamp(ts)),
                Value::Date(d) => Ok(Value::Timestamp(d.and_time(NaiveTime::MIN))),
                Value::Text(ref s) => parse_timestamp(s.trim())
                    .map(Value::Timestamp)
                    .ok_or_else(|| parse_failed(s)),
                ref v => Err(mismatch(v)),
            },

            FieldType::Uuid => match self {
                Value::Uuid(u) => Ok(Value::Uuid(u)),
                Value::Text(ref s) => Uuid::parse_str(s.trim())
                    .map(Value::Uuid)
                    .map_err(|_| parse_failed(s)),
                Value::Bytes(ref b) => Uuid::from_slice(b).map(Value::Uuid).map_err(|_| {
                    ValueError::Parse {
                        input: format!("{} bytes", b.len()),
                        target: *target,
                    }
                }),
                ref v => Err(mismatch(v)),
            },

            FieldType::Binary => match self {
                Value::Bytes(b) => Ok(Value::Bytes(b)),
                ref v => Err(mismatch(v)),
            },
        }
    }

    /// Decode into a Rust type.
    pub fn decode<T: FromValue>(self) -> Result<T, ValueError> {
        T::from_value(self)
    }
}

fn narrow_int(wide: i64, target: &FieldType) -> Result<Value, ValueError> {
    let out_of_range = || ValueError::OutOfRange {
        value: wide.to_string(),
        target: *target,
    };
    match target {
        FieldType::Int16 => i16::try_from(wide).map(Value::I16).map_err(|_| out_of_range()),
        FieldType::Int32 => i32::try_from(wide).map(Value::I32).map_err(|_| out_of_range()),
        _ => Ok(Value::I64(wide)),
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

/// Conversion out of a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, ValueError>;
}

macro_rules! from_value_impl {
    ($ty:ty, $field:expr, $variant:ident) => {
        impl FromValue for $ty {
            fn from_value(value: Value) -> Result<Self, ValueError> {
                match value.coerce(&$field)? {
                    Value::$variant(v) => Ok(v),
                    Value::Null => Err(ValueError::UnexpectedNull),
                    other => Err(ValueError::TypeMismatch {
                        expected: $field,
                        found: other.type_name(),
                    }),
                }
            }
        }

        impl From<$ty> for Value {
            fn from(v: $ty) -> Self {
                Value::$variant(v)
            }
        }
    };
}

from_value_impl!(bool, FieldType::Bool, Bool);
from_value_impl!(i16, FieldType::Int16, I16);
from_value_impl!(i32, FieldType::Int32, I32);
from_value_impl!(i64, FieldType::Int64, I64);
from_value_impl!(f32, FieldType::Float32, F32);
from_value_impl!(f64, FieldType::Float64, F64);
from_value_impl!(String, FieldType::String, Text);
from_value_impl!(Vec<u8>, FieldType::Binary, Bytes);
from_value_impl!(NaiveDate, FieldType::Date, Date);
from_value_impl!(NaiveDateTime, FieldType::Timestamp, Timestamp);
from_value_impl!(Uuid, FieldType::Uuid, Uuid);

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ValueError> {
        Ok(value)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
