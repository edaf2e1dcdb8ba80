//! Conversions between date and time types.

use chrono::{NaiveDate, NaiveTime, TimeDelta};

use crate::types::field::mismatch;
use crate::types::{DbType, DbValue};
use crate::{MappingError, Result};

/// Returns true if a rule converts `source` to `target`.
pub(super) const fn supported(source: DbType, target: DbType) -> bool {
    use DbType::{Date, DateTime, DateTimeOffset, Time, TimeSpan};
    matches!(
        (source, target),
        (Date, DateTime | DateTimeOffset)
            | (DateTime, Date | Time | TimeSpan | DateTimeOffset)
            | (DateTimeOffset, DateTime | Date | Time)
            | (Time, TimeSpan)
            | (TimeSpan, Time | DateTime)
    )
}

/// Apply a temporal rule.
///
/// Naive values are taken as UTC when an offset is required. Offset values
/// lose their offset and keep the local wall time. A time span turns into a
/// date-time counted from 0001-01-01.
pub(super) fn convert(value: DbValue, target: DbType) -> Result<DbValue> {
    let converted = match (value, target) {
        (DbValue::Date(d), DbType::DateTime) => DbValue::DateTime(d.and_time(NaiveTime::MIN)),
        (DbValue::Date(d), DbType::DateTimeOffset) => {
            DbValue::DateTimeOffset(d.and_time(NaiveTime::MIN).and_utc().fixed_offset())
        }
        (DbValue::DateTime(dt), DbType::Date) => DbValue::Date(dt.date()),
        (DbValue::DateTime(dt), DbType::Time) => DbValue::Time(dt.time()),
        (DbValue::DateTime(dt), DbType::TimeSpan) => {
            DbValue::TimeSpan(dt.time().signed_duration_since(NaiveTime::MIN))
        }
        (DbValue::DateTime(dt), DbType::DateTimeOffset) => {
            DbValue::DateTimeOffset(dt.and_utc().fixed_offset())
        }
        (DbValue::DateTimeOffset(o), DbType::DateTime) => DbValue::DateTime(o.naive_local()),
        (DbValue::DateTimeOffset(o), DbType::Date) => DbValue::Date(o.naive_local().date()),
        (DbValue::DateTimeOffset(o), DbType::Time) => DbValue::Time(o.naive_local().time()),
        (DbValue::Time(t), DbType::TimeSpan) => {
            DbValue::TimeSpan(t.signed_duration_since(NaiveTime::MIN))
        }
        (DbValue::TimeSpan(span), DbType::Time) => {
            if span < TimeDelta::zero() || span >= TimeDelta::seconds(86_400) {
                return Err(MappingError::value_conversion(
                    "",
                    format!("time span {span} is not a time of day"),
                ));
            }
            DbValue::Time(NaiveTime::MIN + span)
        }
        (DbValue::TimeSpan(span), DbType::DateTime) => NaiveDate::from_ymd_opt(1, 1, 1)
            .map(|d| d.and_time(NaiveTime::MIN))
            .and_then(|origin| origin.checked_add_signed(span))
            .map(DbValue::DateTime)
            .ok_or_else(|| {
                let msg = format!("time span {span} is out of range for DateTime");
                MappingError::value_conversion("", msg)
            })?,
        (other, _) if other.db_type() == Some(target) => other,
        (other, _) => return Err(mismatch(target.as_str(), &other)),
    };
    Ok(converted)
}
