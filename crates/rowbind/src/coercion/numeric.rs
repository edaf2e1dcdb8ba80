//! Numeric conversions.
//!
//! Integers widen through `i128` and are range-checked on the way back.
//! Floats and decimals round half to even when the target is integral.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::types::field::mismatch;
use crate::types::{DbType, DbValue};
use crate::{MappingError, Result};

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i128),
    Float(f64),
    Dec(Decimal),
}

impl Number {
    fn of(value: &DbValue) -> Option<Self> {
        Some(match *value {
            DbValue::Bool(b) => Self::Int(i128::from(b)),
            DbValue::F32(f) => Self::Float(f64::from(f)),
            DbValue::F64(f) => Self::Float(f),
            DbValue::Decimal(d) => Self::Dec(d),
            ref other => Self::Int(other.as_integral()?),
        })
    }
}

impl std::fmt::Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Dec(d) => write!(f, "{d}"),
        }
    }
}

fn out_of_range(n: Number, target: DbType) -> MappingError {
    MappingError::value_conversion("", format!("{n} is out of range for {target}"))
}

/// Convert a numeric value (or text holding one) to `target`.
pub(super) fn convert(value: DbValue, target: DbType) -> Result<DbValue> {
    if let DbValue::String(text) = &value {
        return parse(text, target);
    }
    let n = Number::of(&value).ok_or_else(|| mismatch("number", &value))?;
    to_number(n, target)
}

/// Zero of a numeric type.
pub(crate) fn zero(target: DbType) -> Result<DbValue> {
    to_number(Number::Int(0), target)
}

fn parse(text: &str, target: DbType) -> Result<DbValue> {
    let t = text.trim();
    let fail = || MappingError::value_conversion("", format!("cannot parse '{t}' as {target}"));

    match target {
        DbType::Bool => {
            if t.eq_ignore_ascii_case("true") {
                Ok(DbValue::Bool(true))
            } else if t.eq_ignore_ascii_case("false") {
                Ok(DbValue::Bool(false))
            } else {
                Err(fail())
            }
        }
        DbType::F32 => t.parse::<f32>().map(DbValue::F32).map_err(|_| fail()),
        DbType::F64 => t.parse::<f64>().map(DbValue::F64).map_err(|_| fail()),
        DbType::Decimal => t
            .parse::<Decimal>()
            .or_else(|_| Decimal::from_scientific(t))
            .map(DbValue::Decimal)
            .map_err(|_| fail()),
        _ if target.is_integral() => to_number(Number::Int(t.parse().map_err(|_| fail())?), target),
        _ => Err(fail()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn to_number(n: Number, target: DbType) -> Result<DbValue> {
    let value = match target {
        DbType::Bool => DbValue::Bool(match n {
            Number::Int(i) => i != 0,
            Number::Float(f) => f != 0.0,
            Number::Dec(d) => !d.is_zero(),
        }),
        DbType::F32 => DbValue::F32(match n {
            Number::Int(i) => i as f32,
            Number::Float(f) => f as f32,
            Number::Dec(d) => d.to_f32().ok_or_else(|| out_of_range(n, target))?,
        }),
        DbType::F64 => DbValue::F64(match n {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
            Number::Dec(d) => d.to_f64().ok_or_else(|| out_of_range(n, target))?,
        }),
        DbType::Decimal => DbValue::Decimal(match n {
            Number::Int(i) => Decimal::from_i128(i),
            Number::Float(f) => Decimal::from_f64(f),
            Number::Dec(d) => Some(d),
        }
        .ok_or_else(|| out_of_range(n, target))?),
        _ if target.is_integral() => {
            let wide = match n {
                Number::Int(i) => Some(i),
                Number::Float(f) => {
                    let r = f.round_ties_even();
                    r.is_finite().then_some(r as i128)
                }
                Number::Dec(d) => d
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven)
                    .to_i128(),
            };
            wide.and_then(|i| integral(i, target))
                .ok_or_else(|| out_of_range(n, target))?
        }
        _ => {
            return Err(MappingError::value_conversion(
                "",
                format!("{target} is not a numeric type"),
            ));
        }
    };
    Ok(value)
}

fn integral(i: i128, target: DbType) -> Option<DbValue> {
    Some(match target {
        DbType::I8 => DbValue::I8(i8::try_from(i).ok()?),
        DbType::I16 => DbValue::I16(i16::try_from(i).ok()?),
        DbType::I32 => DbValue::I32(i32::try_from(i).ok()?),
        DbType::I64 => DbValue::I64(i64::try_from(i).ok()?),
        DbType::U8 => DbValue::U8(u8::try_from(i).ok()?),
        DbType::U16 => DbValue::U16(u16::try_from(i).ok()?),
        DbType::U32 => DbValue::U32(u32::try_from(i).ok()?),
        DbType::U64 => DbValue::U64(u64::try_from(i).ok()?),
        _ => return None,
    })
}
