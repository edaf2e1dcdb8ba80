//! Record field types and their conversion to and from [`DbValue`].

use std::any::TypeId;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use super::enums::{DbEnum, EnumInfo};
use super::value::{DbType, DbValue};
use crate::{MappingError, Result};

/// What a field holds, independent of nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar(DbType),
    Enum(&'static EnumInfo),
}

impl ValueKind {
    /// Kind of a concrete value; `None` for NULL.
    #[must_use]
    pub fn of(value: &DbValue) -> Option<Self> {
        match value {
            DbValue::Enum(e) => Some(Self::Enum(e.info)),
            other => other.db_type().map(Self::Scalar),
        }
    }

    /// Storage type; enums report their underlying integral type.
    #[must_use]
    pub const fn db_type(&self) -> DbType {
        match self {
            Self::Scalar(t) => *t,
            Self::Enum(info) => info.underlying,
        }
    }

    #[must_use]
    pub const fn enum_info(&self) -> Option<&'static EnumInfo> {
        match self {
            Self::Enum(info) => Some(info),
            Self::Scalar(_) => None,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(t) => write!(f, "{t}"),
            Self::Enum(info) => write!(f, "enum {}", info.name),
        }
    }
}

/// Declared type of a record field or constructor parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    kind: ValueKind,
    nullable: bool,
    type_id: TypeId,
    type_name: &'static str,
}

impl FieldType {
    /// Describe the Rust type `T`.
    #[must_use]
    pub fn of<T: 'static>(kind: ValueKind, nullable: bool) -> Self {
        Self {
            kind,
            nullable,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Whether the field can hold NULL (`Option<_>`).
    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Identity of the Rust type; keys type-wide handlers.
    #[must_use]
    pub const fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// A Rust type that can be stored in a record field.
///
/// `from_db` receives a value already coerced to the field's
/// [`ValueKind`]. NULL converts to the type's default (`None` for options).
pub trait FieldValue: Sized + Send + Sync + 'static {
    fn field_type() -> FieldType;

    fn from_db(value: DbValue) -> Result<Self>;

    fn to_db(&self) -> DbValue;
}

/// Conversion error for a value of the wrong variant.
///
/// The column is left empty; routines attach it with
/// [`MappingError::in_column`].
pub(crate) fn mismatch(expected: &str, found: &DbValue) -> MappingError {
    MappingError::value_conversion("", format!("expected {expected}, found {}", found.type_name()))
}

macro_rules! copy_field {
    ($($ty:ty => $variant:ident, $default:expr);* $(;)?) => {
        $(
            impl FieldValue for $ty {
                fn field_type() -> FieldType {
                    FieldType::of::<Self>(ValueKind::Scalar(DbType::$variant), false)
                }

                fn from_db(value: DbValue) -> Result<Self> {
                    match value {
                        DbValue::$variant(v) => Ok(v),
                        DbValue::Null => Ok($default),
                        other => Err(mismatch(stringify!($ty), &other)),
                    }
                }

                fn to_db(&self) -> DbValue {
                    DbValue::$variant(*self)
                }
            }
        )*
    };
}

copy_field! {
    bool => Bool, false;
    i8 => I8, 0;
    i16 => I16, 0;
    i32 => I32, 0;
    i64 => I64, 0;
    u8 => U8, 0;
    u16 => U16, 0;
    u32 => U32, 0;
    u64 => U64, 0;
    f32 => F32, 0.0;
    f64 => F64, 0.0;
    Decimal => Decimal, Decimal::ZERO;
    Uuid => Guid, Uuid::nil();
    NaiveDate => Date, NaiveDate::default();
    NaiveTime => Time, NaiveTime::default();
    NaiveDateTime => DateTime, NaiveDateTime::default();
    DateTime<FixedOffset> => DateTimeOffset, NaiveDateTime::default().and_utc().fixed_offset();
    TimeDelta => TimeSpan, TimeDelta::zero();
}

impl FieldValue for String {
    fn field_type() -> FieldType {
        FieldType::of::<Self>(ValueKind::Scalar(DbType::String), false)
    }

    fn from_db(value: DbValue) -> Result<Self> {
        match value {
            DbValue::String(v) => Ok(v),
            DbValue::Null => Ok(Self::new()),
            other => Err(mismatch("String", &other)),
        }
    }

    fn to_db(&self) -> DbValue {
        DbValue::String(self.clone())
    }
}

impl FieldValue for Vec<u8> {
    fn field_type() -> FieldType {
        FieldType::of::<Self>(ValueKind::Scalar(DbType::Bytes), false)
    }

    fn from_db(value: DbValue) -> Result<Self> {
        match value {
            DbValue::Bytes(v) => Ok(v),
            DbValue::Null => Ok(Self::new()),
            other => Err(mismatch("Vec<u8>", &other)),
        }
    }

    fn to_db(&self) -> DbValue {
        DbValue::Bytes(self.clone())
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn field_type() -> FieldType {
        FieldType::of::<Self>(T::field_type().kind(), true)
    }

    fn from_db(value: DbValue) -> Result<Self> {
        match value {
            DbValue::Null => Ok(None),
            other => T::from_db(other).map(Some),
        }
    }

    fn to_db(&self) -> DbValue {
        self.as_ref().map_or(DbValue::Null, FieldValue::to_db)
    }
}

/// `from_db` for [`DbEnum`] types; used by [`db_enum!`](crate::db_enum).
pub fn enum_from_db<E: DbEnum>(value: DbValue) -> Result<E> {
    match value {
        DbValue::Enum(e) => Ok(E::from_raw(e.raw)),
        DbValue::Null => Ok(E::from_raw(0)),
        other => match other.as_integral() {
            Some(wide) => EnumInfo::narrow(wide)
                .map(E::from_raw)
                .ok_or_else(|| mismatch(E::info().name, &other)),
            None => Err(mismatch(E::info().name, &other)),
        },
    }
}
