//! Semantic column types.
//!
//! `FieldType` is what an entity field declares. It drives value coercion in
//! the materializer and the native type-name mapping of each dialect (see
//! [`SqlDialect::emit_data_type`](super::dialect::SqlDialect::emit_data_type)).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared semantic type of an entity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Bool,

    /// 16-bit signed integer (SMALLINT).
    Int16,

    /// 32-bit signed integer (INT/INTEGER).
    Int32,

    /// 64-bit signed integer (BIGINT).
    Int64,

    /// 32-bit floating point (REAL).
    Float32,

    /// 64-bit floating point (DOUBLE PRECISION/FLOAT).
    Float64,

    /// Unbounded text.
    String,

    /// Text with a maximum length.
    Varchar(u16),

    /// Date without time.
    Date,

    /// Date and time without timezone.
    Timestamp,

    /// UUID/GUID.
    Uuid,

    /// Raw bytes.
    Binary,
}

impl FieldType {
    /// Returns true for integer types.
    pub fn is_integer(&self) -> bool {
        matches!(self, FieldType::Int16 | FieldType::Int32 | FieldType::Int64)
    }

    /// Returns true for integer and floating point types.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, FieldType::Float32 | FieldType::Float64)
    }

    /// Returns true for text types.
    pub fn is_text(&self) -> bool {
        matches!(self, FieldType::String | FieldType::Varchar(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, FieldType::Date | FieldType::Timestamp)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Int16 => write!(f, "int16"),
            FieldType::Int32 => write!(f, "int32"),
            FieldType::Int64 => write!(f, "int64"),
            FieldType::Float32 => write!(f, "float32"),
            FieldType::Float64 => write!(f, "float64"),
            FieldType::String => write!(f, "string"),
            FieldType::Varchar(n) => write!(f, "varchar({})", n),
            FieldType::Date => write!(f, "date"),
            FieldType::Timestamp => write!(f, "timestamp"),
            FieldType::Uuid => write!(f, "uuid"),
            FieldType::Binary => write!(f, "binary"),
        }
    }
}
