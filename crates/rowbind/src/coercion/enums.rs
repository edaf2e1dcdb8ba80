//! Enum membership checks.

use super::InvalidEnumValueHandling;
use crate::types::field::mismatch;
use crate::types::{DbValue, EnumInfo, EnumValue, ParsedLabel};
use crate::{MappingError, Result};

/// Convert an integral, enum or text value to a member of `info`.
pub(super) fn to_enum(
    value: DbValue,
    info: &'static EnumInfo,
    policy: InvalidEnumValueHandling,
) -> Result<DbValue> {
    let raw = match &value {
        DbValue::String(text) => match info.parse_label(text) {
            ParsedLabel::Raw(raw) => raw,
            ParsedLabel::Unknown => {
                return match policy {
                    InvalidEnumValueHandling::ThrowError => {
                        Err(MappingError::invalid_enum_value(text.trim(), info.name))
                    }
                    InvalidEnumValueHandling::Cast | InvalidEnumValueHandling::UseDefault => {
                        Ok(DbValue::Enum(EnumValue::new(info, 0)))
                    }
                };
            }
        },
        other => {
            let wide = other.as_integral().ok_or_else(|| mismatch(info.name, other))?;
            EnumInfo::narrow(wide).ok_or_else(|| MappingError::invalid_enum_value(wide, info.name))?
        }
    };
    check(raw, info, policy)
}

/// Apply the policy to a raw value.
pub(super) fn check(
    raw: i64,
    info: &'static EnumInfo,
    policy: InvalidEnumValueHandling,
) -> Result<DbValue> {
    if info.flags || policy == InvalidEnumValueHandling::Cast || info.is_defined(raw) {
        return Ok(DbValue::Enum(EnumValue::new(info, raw)));
    }
    match policy {
        InvalidEnumValueHandling::ThrowError => {
            Err(MappingError::invalid_enum_value(info.widen(raw), info.name))
        }
        _ => Ok(DbValue::Enum(EnumValue::new(info, 0))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coercion::InvalidEnumValueHandling::{Cast, ThrowError, UseDefault};
    use crate::types::{DbEnum, DbType, EnumMember, FieldValue};

    crate::db_enum! {
        struct Color(i32) {
            RED = 0 => "Red",
            GREEN = 1 => "Green",
            BLUE = 2 => "Blue",
        }
    }

    static ACCESS: EnumInfo = EnumInfo {
        name: "Access",
        underlying: DbType::U8,
        flags: true,
        members: &[
            EnumMember { name: "Read", value: 1 },
            EnumMember { name: "Write", value: 2 },
        ],
    };

    fn raw_of(value: &DbValue) -> i64 {
        match value {
            DbValue::Enum(e) => e.raw,
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn test_policy_on_undefined_raw() {
        let info = Color::info();
        let err = to_enum(DbValue::I32(5), info, ThrowError).unwrap_err();
        assert!(err.is_invalid_enum_value());
        assert!(err.to_string().contains('5'));
        assert!(err.to_string().contains("Color"));

        let v = to_enum(DbValue::I32(5), info, UseDefault).unwrap();
        assert_eq!(raw_of(&v), 0);

        let v = to_enum(DbValue::I32(5), info, Cast).unwrap();
        assert_eq!(raw_of(&v), 5);
    }

    #[test]
    fn test_defined_passes_all_policies() {
        for policy in [Cast, ThrowError, UseDefault] {
            let v = to_enum(DbValue::I64(2), Color::info(), policy).unwrap();
            assert_eq!(raw_of(&v), 2);
        }
    }

    #[test]
    fn test_text_labels() {
        let v = to_enum(DbValue::from("green"), Color::info(), ThrowError).unwrap();
        assert_eq!(raw_of(&v), 1);
        let v = to_enum(DbValue::from("2"), Color::info(), ThrowError).unwrap();
        assert_eq!(raw_of(&v), 2);

        let err = to_enum(DbValue::from("Purple"), Color::info(), ThrowError).unwrap_err();
        assert!(err.to_string().contains("Purple"));
        let v = to_enum(DbValue::from("Purple"), Color::info(), UseDefault).unwrap();
        assert_eq!(raw_of(&v), 0);
    }

    #[test]
    fn test_flags_accept_any_value() {
        let v = to_enum(DbValue::U8(7), &ACCESS, ThrowError).unwrap();
        assert_eq!(raw_of(&v), 7);
        let v = to_enum(DbValue::from("Read, Write"), &ACCESS, ThrowError).unwrap();
        assert_eq!(raw_of(&v), 3);
    }

    crate::db_enum! {
        flags Wide(u64) {
            LOW = 1 => "Low",
            TOP = 0x8000_0000_0000_0000 => "Top",
        }
    }

    crate::db_enum! {
        struct Code(u64) {
            NONE = 0 => "None",
            MAX = 0xFFFF_FFFF_FFFF_FFFF => "Max",
        }
    }

    #[test]
    fn test_u64_flags_above_i64_max() {
        let wide = (1_u64 << 63) | 1;
        for policy in [Cast, ThrowError, UseDefault] {
            let v = to_enum(DbValue::U64(wide), Wide::info(), policy).unwrap();
            assert_eq!(v.as_integral(), Some(i128::from(wide)));
            assert_eq!(Wide::from_db(v).unwrap(), Wide(wide));
        }
        assert_eq!(Wide::info().format(Wide(wide).raw()), "Low, Top");
    }

    #[test]
    fn test_u64_enum_at_extremes() {
        let v = to_enum(DbValue::U64(u64::MAX), Code::info(), ThrowError).unwrap();
        assert_eq!(Code::from_db(v).unwrap(), Code::MAX);

        let undefined = u64::MAX - 1;
        let err = to_enum(DbValue::U64(undefined), Code::info(), ThrowError).unwrap_err();
        assert!(err.to_string().contains(&undefined.to_string()));

        let v = to_enum(DbValue::U64(undefined), Code::info(), Cast).unwrap();
        assert_eq!(Code::from_db(v).unwrap(), Code(undefined));
        let v = to_enum(DbValue::U64(undefined), Code::info(), UseDefault).unwrap();
        assert_eq!(Code::from_db(v).unwrap(), Code::NONE);

        let v = to_enum(DbValue::I64(i64::MIN), Code::info(), Cast).unwrap();
        assert!(matches!(v, DbValue::Enum(_)));
    }

    #[test]
    fn test_non_integral_source_rejected() {
        let err = to_enum(DbValue::F64(1.0), Color::info(), Cast).unwrap_err();
        assert!(err.is_value_conversion());
    }
}
