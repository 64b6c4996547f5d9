//! Logical data types.
//!
//! `DataType` is the closed enumeration every column is declared with. The
//! concrete keyword a type renders as is a per-dialect decision made by the
//! capability registry's type table, never by the model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Boolean,
    Date,
    Time,
    /// Date and time without time zone
    DateTime,
    /// Date and time with time zone
    Timestamp,
    SmallInt,
    Integer,
    BigInt,
    /// Exact numeric with optional precision/scale
    Decimal,
    Real,
    Double,
    /// Fixed-length string with optional length
    Char,
    /// Variable-length string with optional length
    Varchar,
    Text,
    Uuid,
    Json,
    SmallSerial,
    Serial,
    BigSerial,
}

/// Family a [`DataType`] belongs to; operator sets and constraint pairings are
/// decided per family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeFamily {
    Boolean,
    Temporal,
    Integer,
    Decimal,
    String,
    Uuid,
    Json,
    Serial,
}

impl DataType {
    /// Every logical type, in declaration order
    pub const ALL: [DataType; 19] = [
        DataType::Boolean,
        DataType::Date,
        DataType::Time,
        DataType::DateTime,
        DataType::Timestamp,
        DataType::SmallInt,
        DataType::Integer,
        DataType::BigInt,
        DataType::Decimal,
        DataType::Real,
        DataType::Double,
        DataType::Char,
        DataType::Varchar,
        DataType::Text,
        DataType::Uuid,
        DataType::Json,
        DataType::SmallSerial,
        DataType::Serial,
        DataType::BigSerial,
    ];

    pub fn family(self) -> TypeFamily {
        match self {
            DataType::Boolean => TypeFamily::Boolean,
            DataType::Date | DataType::Time | DataType::DateTime | DataType::Timestamp => {
                TypeFamily::Temporal
            }
            DataType::SmallInt | DataType::Integer | DataType::BigInt => TypeFamily::Integer,
            DataType::Decimal | DataType::Real | DataType::Double => TypeFamily::Decimal,
            DataType::Char | DataType::Varchar | DataType::Text => TypeFamily::String,
            DataType::Uuid => TypeFamily::Uuid,
            DataType::Json => TypeFamily::Json,
            DataType::SmallSerial | DataType::Serial | DataType::BigSerial => TypeFamily::Serial,
        }
    }

    /// Numeric types (integer, decimal and serial families)
    pub fn is_numeric(self) -> bool {
        matches!(
            self.family(),
            TypeFamily::Integer | TypeFamily::Decimal | TypeFamily::Serial
        )
    }

    /// Types with a meaningful ordering (range operators, MIN/MAX)
    pub fn is_ordered(self) -> bool {
        self.is_numeric() || matches!(self.family(), TypeFamily::Temporal | TypeFamily::String)
    }

    pub fn is_string(self) -> bool {
        self.family() == TypeFamily::String
    }

    /// Whether a length modifier (`VARCHAR(255)`) applies
    pub fn accepts_length(self) -> bool {
        matches!(self, DataType::Char | DataType::Varchar)
    }

    /// Whether a precision/scale modifier (`DECIMAL(10,2)`) applies
    pub fn accepts_precision(self) -> bool {
        self == DataType::Decimal
    }

    /// Serial columns are populated by the database
    pub fn is_serial(self) -> bool {
        self.family() == TypeFamily::Serial
    }

    /// Upper-case logical name, used in messages
    pub fn name(self) -> &'static str {
        match self {
            DataType::Boolean => "BOOLEAN",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::DateTime => "DATETIME",
            DataType::Timestamp => "TIMESTAMP",
            DataType::SmallInt => "SMALLINT",
            DataType::Integer => "INTEGER",
            DataType::BigInt => "BIGINT",
            DataType::Decimal => "DECIMAL",
            DataType::Real => "REAL",
            DataType::Double => "DOUBLE",
            DataType::Char => "CHAR",
            DataType::Varchar => "VARCHAR",
            DataType::Text => "TEXT",
            DataType::Uuid => "UUID",
            DataType::Json => "JSON",
            DataType::SmallSerial => "SMALLSERIAL",
            DataType::Serial => "SERIAL",
            DataType::BigSerial => "BIGSERIAL",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Length or precision/scale attached to a column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeModifier {
    Length(u32),
    Precision { precision: u32, scale: u32 },
}

impl TypeModifier {
    /// Argument list as rendered inside the type's parentheses
    pub fn args(&self) -> String {
        match self {
            TypeModifier::Length(len) => len.to_string(),
            TypeModifier::Precision { precision, scale } => format!("{precision},{scale}"),
        }
    }
}
