//! Column type tags and dynamic cell values.
//!
//! [`DbType`] is the closed set of storage types a cursor reports for a
//! column or a sink accepts for a parameter. [`DbValue`] carries one cell.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::enums::EnumValue;

/// Storage type of a column or parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Decimal,
    String,
    Bytes,
    Guid,
    Date,
    Time,
    DateTime,
    DateTimeOffset,
    TimeSpan,
}

impl DbType {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::I8 => "I8",
            Self::I16 => "I16",
            Self::I32 => "I32",
            Self::I64 => "I64",
            Self::U8 => "U8",
            Self::U16 => "U16",
            Self::U32 => "U32",
            Self::U64 => "U64",
            Self::F32 => "F32",
            Self::F64 => "F64",
            Self::Decimal => "Decimal",
            Self::String => "String",
            Self::Bytes => "Bytes",
            Self::Guid => "Guid",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::DateTime => "DateTime",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::TimeSpan => "TimeSpan",
        }
    }

    /// Check if the type is an integer type.
    #[must_use]
    pub const fn is_integral(&self) -> bool {
        matches!(
            self,
            Self::I8
                | Self::I16
                | Self::I32
                | Self::I64
                | Self::U8
                | Self::U16
                | Self::U32
                | Self::U64
        )
    }

    /// Check if the type takes part in generic numeric conversion.
    ///
    /// Booleans count as numeric (zero is false, anything else true).
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integral() || matches!(self, Self::Bool | Self::F32 | Self::F64 | Self::Decimal)
    }

    /// Check if the type is a date or time type.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::DateTime | Self::DateTimeOffset | Self::TimeSpan
        )
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DbValue {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    Guid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    TimeSpan(TimeDelta),
    /// An enum member (or, for open enums, any raw value of its type).
    Enum(EnumValue),
}

impl DbValue {
    /// Check if this value is NULL.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Storage type of the value. `None` for NULL; enums report their
    /// underlying integral type.
    #[must_use]
    pub const fn db_type(&self) -> Option<DbType> {
        Some(match self {
            Self::Null => return None,
            Self::Bool(_) => DbType::Bool,
            Self::I8(_) => DbType::I8,
            Self::I16(_) => DbType::I16,
            Self::I32(_) => DbType::I32,
            Self::I64(_) => DbType::I64,
            Self::U8(_) => DbType::U8,
            Self::U16(_) => DbType::U16,
            Self::U32(_) => DbType::U32,
            Self::U64(_) => DbType::U64,
            Self::F32(_) => DbType::F32,
            Self::F64(_) => DbType::F64,
            Self::Decimal(_) => DbType::Decimal,
            Self::String(_) => DbType::String,
            Self::Bytes(_) => DbType::Bytes,
            Self::Guid(_) => DbType::Guid,
            Self::Date(_) => DbType::Date,
            Self::Time(_) => DbType::Time,
            Self::DateTime(_) => DbType::DateTime,
            Self::DateTimeOffset(_) => DbType::DateTimeOffset,
            Self::TimeSpan(_) => DbType::TimeSpan,
            Self::Enum(e) => e.info.underlying,
        })
    }

    /// Short name of the value's variant, for error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Enum(e) => e.info.name,
            other => match other.db_type() {
                Some(t) => t.as_str(),
                None => "Null",
            },
        }
    }

    /// Integral payload widened to `i128`, if the value is an integer.
    #[must_use]
    pub const fn as_integral(&self) -> Option<i128> {
        Some(match *self {
            Self::I8(v) => v as i128,
            Self::I16(v) => v as i128,
            Self::I32(v) => v as i128,
            Self::I64(v) => v as i128,
            Self::U8(v) => v as i128,
            Self::U16(v) => v as i128,
            Self::U32(v) => v as i128,
            Self::U64(v) => v as i128,
            Self::Enum(e) => e.info.widen(e.raw),
            _ => return None,
        })
    }
}

impl From<bool> for DbValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for DbValue {
    fn from(v: i32) -> Self {
        Self::I32(v)
    }
}

impl From<i64> for DbValue {
    fn from(v: i64) -> Self {
        Self::I64(v)
    }
}

impl From<f64> for DbValue {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<&str> for DbValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for DbValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Decimal> for DbValue {
    fn from(v: Decimal) -> Self {
        Self::Decimal(v)
    }
}

impl From<Uuid> for DbValue {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

impl From<NaiveDateTime> for DbValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for DbValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
