//! Type coercion rules.
//!
//! [`Conversion::resolve`] picks a strategy for a (source, target) pair once,
//! when a routine is built; [`Conversion::apply`] runs it per value. NULL
//! passes through every strategy untouched.
//!
//! | Source | Target | Strategy |
//! |---|---|---|
//! | same kind | same kind | identity |
//! | numeric or bool | numeric or bool | checked numeric convert |
//! | text | numeric or bool | invariant parse |
//! | any but bytes | text | invariant format |
//! | text | GUID, date/time | invariant parse |
//! | GUID | bytes, and back | 16-byte layout |
//! | date/time | date/time | see [`temporal`] |
//! | integral, text, enum | enum | membership check under the policy |
//! | enum | numeric, text | raw value, label |

mod enums;
mod numeric;
mod policy;
pub mod temporal;
pub mod text;

pub use policy::InvalidEnumValueHandling;

pub(crate) use numeric::zero;

use uuid::Uuid;

use crate::types::field::mismatch;
use crate::types::{DbType, DbValue, EnumInfo, ValueKind};
use crate::{MappingError, Result};

/// A resolved conversion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Identity,
    /// Numeric conversion, parsing text sources.
    Numeric(DbType),
    FormatText,
    /// Parse text into a GUID or temporal value.
    ParseText(DbType),
    GuidToBytes,
    BytesToGuid,
    Temporal(DbType),
    ToEnum {
        info: &'static EnumInfo,
        policy: InvalidEnumValueHandling,
    },
}

impl Conversion {
    /// Pick the strategy converting `source` into `target`.
    ///
    /// # Errors
    ///
    /// Returns an unsupported-coercion error naming both types and `context`
    /// (usually `Type.property`) when no rule applies.
    pub fn resolve(
        source: ValueKind,
        target: ValueKind,
        policy: InvalidEnumValueHandling,
        context: &str,
    ) -> Result<Self> {
        let unsupported =
            || MappingError::unsupported_coercion(source.to_string(), target.to_string(), context);

        if source == target {
            return Ok(Self::Identity);
        }

        match (source, target) {
            (ValueKind::Enum(_), ValueKind::Enum(info)) => Ok(Self::ToEnum { info, policy }),
            (ValueKind::Scalar(s), ValueKind::Enum(info)) => {
                if s.is_integral() || s == DbType::String {
                    Ok(Self::ToEnum { info, policy })
                } else {
                    Err(unsupported())
                }
            }
            (ValueKind::Enum(_), ValueKind::Scalar(t)) => {
                if t.is_numeric() {
                    Ok(Self::Numeric(t))
                } else if t == DbType::String {
                    Ok(Self::FormatText)
                } else {
                    Err(unsupported())
                }
            }
            (ValueKind::Scalar(s), ValueKind::Scalar(t)) => {
                Self::resolve_scalar(s, t).ok_or_else(unsupported)
            }
        }
    }

    fn resolve_scalar(source: DbType, target: DbType) -> Option<Self> {
        Some(match (source, target) {
            (s, t) if s == t => Self::Identity,
            (DbType::Bytes, DbType::String) => return None,
            (_, DbType::String) => Self::FormatText,
            (s, t) if t.is_numeric() && (s.is_numeric() || s == DbType::String) => Self::Numeric(t),
            (DbType::String, t) if t == DbType::Guid || t.is_temporal() => Self::ParseText(t),
            (DbType::Guid, DbType::Bytes) => Self::GuidToBytes,
            (DbType::Bytes, DbType::Guid) => Self::BytesToGuid,
            (s, t) if temporal::supported(s, t) => Self::Temporal(t),
            _ => return None,
        })
    }

    /// Convert one value.
    ///
    /// # Errors
    ///
    /// Returns a value-conversion error without a column name when the value
    /// does not fit, or an invalid-enum-value error under
    /// [`InvalidEnumValueHandling::ThrowError`].
    pub fn apply(&self, value: DbValue) -> Result<DbValue> {
        if value.is_null() {
            return Ok(value);
        }

        match *self {
            Self::Identity => Ok(value),
            Self::Numeric(t) => numeric::convert(value, t),
            Self::FormatText => text::to_text(value),
            Self::ParseText(t) => text::parse(value, t),
            Self::Temporal(t) => temporal::convert(value, t),
            Self::ToEnum { info, policy } => enums::to_enum(value, info, policy),
            Self::GuidToBytes => match value {
                DbValue::Guid(id) => Ok(DbValue::Bytes(id.as_bytes().to_vec())),
                other => Err(mismatch("Guid", &other)),
            },
            Self::BytesToGuid => match value {
                DbValue::Bytes(bytes) => Uuid::from_slice(&bytes).map(DbValue::Guid).map_err(|_| {
                    MappingError::value_conversion(
                        "",
                        format!("expected 16 bytes for Guid, found {}", bytes.len()),
                    )
                }),
                other => Err(mismatch("Bytes", &other)),
            },
        }
    }

    /// Convert a value whose type is only known at run time, such as the
    /// output of a handler. NULL passes through.
    ///
    /// # Errors
    ///
    /// Returns an unsupported-coercion error when no rule converts the
    /// value's kind to `target`, otherwise the errors of [`apply`](Self::apply).
    pub fn coerce(
        value: DbValue,
        target: ValueKind,
        policy: InvalidEnumValueHandling,
        context: &str,
    ) -> Result<DbValue> {
        match ValueKind::of(&value) {
            Some(source) if source != target => {
                Self::resolve(source, target, policy, context)?.apply(value)
            }
            _ => Ok(value),
        }
    }

    /// Returns true if the strategy never changes a value.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DbEnum;

    crate::db_enum! {
        struct Color(i32) {
            RED = 0 => "Red",
            GREEN = 1 => "Green",
            BLUE = 2 => "Blue",
        }
    }

    const POLICY: InvalidEnumValueHandling = InvalidEnumValueHandling::ThrowError;

    fn scalar(t: DbType) -> ValueKind {
        ValueKind::Scalar(t)
    }

    fn resolve(s: ValueKind, t: ValueKind) -> Result<Conversion> {
        Conversion::resolve(s, t, POLICY, "User.field")
    }

    #[test]
    fn test_resolve_identity() {
        assert!(resolve(scalar(DbType::I32), scalar(DbType::I32)).unwrap().is_identity());
        let color = ValueKind::Enum(Color::info());
        assert!(resolve(color, color).unwrap().is_identity());
    }

    #[test]
    fn test_resolve_matrix() {
        let pair = |s, t| resolve(scalar(s), scalar(t)).unwrap();
        assert_eq!(pair(DbType::I16, DbType::I64), Conversion::Numeric(DbType::I64));
        assert_eq!(pair(DbType::String, DbType::Decimal), Conversion::Numeric(DbType::Decimal));
        assert_eq!(pair(DbType::Guid, DbType::String), Conversion::FormatText);
        assert_eq!(pair(DbType::String, DbType::Guid), Conversion::ParseText(DbType::Guid));
        assert_eq!(
            pair(DbType::String, DbType::DateTimeOffset),
            Conversion::ParseText(DbType::DateTimeOffset)
        );
        assert_eq!(pair(DbType::Bytes, DbType::Guid), Conversion::BytesToGuid);
        assert_eq!(pair(DbType::Time, DbType::TimeSpan), Conversion::Temporal(DbType::TimeSpan));
    }

    #[test]
    fn test_resolve_enum() {
        let color = ValueKind::Enum(Color::info());
        assert!(matches!(resolve(scalar(DbType::I64), color).unwrap(), Conversion::ToEnum { .. }));
        let from_text = resolve(scalar(DbType::String), color).unwrap();
        assert!(matches!(from_text, Conversion::ToEnum { .. }));
        assert_eq!(resolve(color, scalar(DbType::I32)).unwrap(), Conversion::Numeric(DbType::I32));
        assert_eq!(resolve(color, scalar(DbType::String)).unwrap(), Conversion::FormatText);
        assert!(resolve(scalar(DbType::F64), color).unwrap_err().is_unsupported_coercion());
    }

    #[test]
    fn test_unsupported_names_both_types_and_context() {
        let err = resolve(scalar(DbType::Bytes), scalar(DbType::DateTime)).unwrap_err();
        assert!(err.is_unsupported_coercion());
        let msg = err.to_string();
        assert!(msg.contains("Bytes"));
        assert!(msg.contains("DateTime"));
        assert!(msg.contains("User.field"));
        assert!(resolve(scalar(DbType::Bytes), scalar(DbType::String)).is_err());
        assert!(resolve(scalar(DbType::Bool), scalar(DbType::Date)).is_err());
    }

    #[test]
    fn test_null_passes_through() {
        let conv = resolve(scalar(DbType::String), scalar(DbType::I32)).unwrap();
        assert_eq!(conv.apply(DbValue::Null).unwrap(), DbValue::Null);
        let conv = resolve(scalar(DbType::I32), ValueKind::Enum(Color::info())).unwrap();
        assert_eq!(conv.apply(DbValue::Null).unwrap(), DbValue::Null);
    }

    #[test]
    fn test_apply_enum_to_text_and_number() {
        let color = ValueKind::Enum(Color::info());
        let blue = Color::BLUE.raw();
        let value = DbValue::Enum(crate::types::EnumValue::new(Color::info(), blue));
        assert_eq!(
            resolve(color, scalar(DbType::String)).unwrap().apply(value.clone()).unwrap(),
            DbValue::from("Blue")
        );
        assert_eq!(
            resolve(color, scalar(DbType::I64)).unwrap().apply(value).unwrap(),
            DbValue::I64(2)
        );
    }

    #[test]
    fn test_coerce_by_runtime_kind() {
        let target = scalar(DbType::I64);
        let to_i64 = |v| Conversion::coerce(v, target, POLICY, "Counter.hits");
        assert_eq!(to_i64(DbValue::I32(7)).unwrap(), DbValue::I64(7));
        assert_eq!(to_i64(DbValue::I64(7)).unwrap(), DbValue::I64(7));
        assert_eq!(to_i64(DbValue::Null).unwrap(), DbValue::Null);

        let err = to_i64(DbValue::Bytes(vec![1])).unwrap_err();
        assert!(err.is_unsupported_coercion());
        assert!(err.to_string().contains("Counter.hits"));

        let color = ValueKind::Enum(Color::info());
        let v = Conversion::coerce(DbValue::from("blue"), color, POLICY, "c").unwrap();
        assert_eq!(v.as_integral(), Some(2));
    }

    #[test]
    fn test_apply_guid_bytes() {
        let id = Uuid::from_u128(42);
        let bytes = Conversion::GuidToBytes.apply(DbValue::Guid(id)).unwrap();
        assert_eq!(Conversion::BytesToGuid.apply(bytes).unwrap(), DbValue::Guid(id));
        let err = Conversion::BytesToGuid.apply(DbValue::Bytes(vec![1, 2])).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }
}
