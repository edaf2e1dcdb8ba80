//! Culture-invariant text formats.
//!
//! Every value formats to a string that parses back to the same value.
//! Temporal values use ISO-8601 with as many fractional digits as needed;
//! time spans use `[-][d.]hh:mm:ss[.fffffff]`.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use uuid::Uuid;

use crate::types::field::mismatch;
use crate::types::{DbType, DbValue};
use crate::{MappingError, Result};

const DATE: &str = "%Y-%m-%d";
const TIME: &str = "%H:%M:%S%.f";
const DATETIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const DATETIME_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%.f%:z";

const NAIVE_FORMATS: [&str; 4] = [
    DATETIME,
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const NANOS_PER_TICK: i32 = 100;
const SECONDS_PER_DAY: i64 = 86_400;

/// Render a value as invariant text. `None` for NULL and byte strings.
#[must_use]
pub fn format(value: &DbValue) -> Option<String> {
    Some(match value {
        DbValue::Null | DbValue::Bytes(_) => return None,
        DbValue::Bool(b) => b.to_string(),
        DbValue::I8(v) => v.to_string(),
        DbValue::I16(v) => v.to_string(),
        DbValue::I32(v) => v.to_string(),
        DbValue::I64(v) => v.to_string(),
        DbValue::U8(v) => v.to_string(),
        DbValue::U16(v) => v.to_string(),
        DbValue::U32(v) => v.to_string(),
        DbValue::U64(v) => v.to_string(),
        DbValue::F32(v) => v.to_string(),
        DbValue::F64(v) => v.to_string(),
        DbValue::Decimal(v) => v.to_string(),
        DbValue::String(v) => v.clone(),
        DbValue::Guid(v) => v.hyphenated().to_string(),
        DbValue::Date(v) => v.format(DATE).to_string(),
        DbValue::Time(v) => v.format(TIME).to_string(),
        DbValue::DateTime(v) => v.format(DATETIME).to_string(),
        DbValue::DateTimeOffset(v) => v.format(DATETIME_OFFSET).to_string(),
        DbValue::TimeSpan(v) => format_timespan(*v),
        DbValue::Enum(e) => e.info.format(e.raw),
    })
}

pub(super) fn to_text(value: DbValue) -> Result<DbValue> {
    match value {
        DbValue::String(_) => Ok(value),
        other => format(&other)
            .map(DbValue::String)
            .ok_or_else(|| mismatch("text", &other)),
    }
}

/// Parse text into a GUID or temporal value.
pub(super) fn parse(value: DbValue, target: DbType) -> Result<DbValue> {
    let text = match value {
        DbValue::String(text) => text,
        other if other.db_type() == Some(target) => return Ok(other),
        other => return Err(mismatch("text", &other)),
    };
    let t = text.trim();
    let fail = || MappingError::value_conversion("", format!("cannot parse '{t}' as {target}"));

    match target {
        DbType::Guid => Uuid::parse_str(t).map(DbValue::Guid).map_err(|_| fail()),
        DbType::Date => parse_date(t).map(DbValue::Date).ok_or_else(fail),
        DbType::Time => parse_time(t).map(DbValue::Time).ok_or_else(fail),
        DbType::DateTime => parse_datetime(t).map(DbValue::DateTime).ok_or_else(fail),
        DbType::DateTimeOffset => parse_offset(t)
            .or_else(|| parse_naive(t).map(|n| n.and_utc().fixed_offset()))
            .map(DbValue::DateTimeOffset)
            .ok_or_else(fail),
        DbType::TimeSpan => parse_timespan(t).map(DbValue::TimeSpan).ok_or_else(fail),
        _ => Err(fail()),
    }
}

fn parse_date(t: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(t, DATE)
        .ok()
        .or_else(|| parse_datetime(t).map(|dt| dt.date()))
}

fn parse_time(t: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(t, TIME)
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .ok()
}

fn parse_naive(t: &str) -> Option<NaiveDateTime> {
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(t, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(t, DATE)
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}

/// Offset-carrying text converts to its local wall time.
fn parse_datetime(t: &str) -> Option<NaiveDateTime> {
    parse_naive(t).or_else(|| parse_offset(t).map(|o| o.naive_local()))
}

fn parse_offset(t: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(t)
        .or_else(|_| DateTime::parse_from_str(t, DATETIME_OFFSET))
        .or_else(|_| DateTime::parse_from_str(t, "%Y-%m-%d %H:%M:%S%.f%:z"))
        .ok()
}

/// Format a span as `[-][d.]hh:mm:ss[.fffffff]`.
#[must_use]
pub fn format_timespan(span: TimeDelta) -> String {
    let negative = span < TimeDelta::zero();
    let abs = if negative { -span } else { span };

    let total = abs.num_seconds();
    let days = total / SECONDS_PER_DAY;
    let hours = (total % SECONDS_PER_DAY) / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    let ticks = abs.subsec_nanos() / NANOS_PER_TICK;

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}

/// Parse `[-][d.]hh:mm[:ss[.fffffff]]`, or a bare day count.
#[must_use]
pub fn parse_timespan(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    let (negative, rest) = text
        .strip_prefix('-')
        .map_or((false, text), |r| (true, r));

    let (days, clock) = match (rest.find('.'), rest.find(':')) {
        (_, None) => (rest.parse::<i64>().ok()?, None),
        (Some(dot), Some(colon)) if dot < colon => {
            (rest[..dot].parse::<i64>().ok()?, Some(&rest[dot + 1..]))
        }
        _ => (0, Some(rest)),
    };

    let mut seconds = days.checked_mul(SECONDS_PER_DAY)?;
    let mut nanos = 0_i64;
    if let Some(clock) = clock {
        let (hms, fraction) = match clock.split_once('.') {
            Some((hms, f)) => (hms, Some(f)),
            None => (clock, None),
        };
        let mut parts = hms.split(':');
        let hours: i64 = parts.next()?.parse().ok()?;
        let minutes: i64 = parts.next()?.parse().ok()?;
        let secs: i64 = parts.next().map_or(Some(0), |s| s.parse().ok())?;
        let in_range = (0..24).contains(&hours)
            && (0..60).contains(&minutes)
            && (0..60).contains(&secs);
        if parts.next().is_some() || !in_range {
            return None;
        }
        seconds = seconds.checked_add(hours * 3600 + minutes * 60 + secs)?;

        if let Some(fraction) = fraction {
            let digits = fraction.bytes().all(|b| b.is_ascii_digit());
            if fraction.is_empty() || fraction.len() > 7 || !digits {
                return None;
            }
            let ticks: i64 = format!("{fraction:0<7}").parse().ok()?;
            nanos = ticks * i64::from(NANOS_PER_TICK);
        }
    }

    let span = TimeDelta::try_seconds(seconds)?.checked_add(&TimeDelta::nanoseconds(nanos))?;
    Some(if negative { -span } else { span })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_temporal() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_milli_opt(14, 5, 6, 250)
            .unwrap();
        assert_eq!(format(&DbValue::DateTime(dt)).unwrap(), "2024-03-09T14:05:06.250");
        assert_eq!(format(&DbValue::Date(dt.date())).unwrap(), "2024-03-09");
        assert_eq!(
            format(&DbValue::DateTimeOffset(dt.and_utc().fixed_offset())).unwrap(),
            "2024-03-09T14:05:06.250+00:00"
        );
        assert!(format(&DbValue::Bytes(vec![1])).is_none());
    }

    #[test]
    fn test_datetime_text_roundtrip() {
        let dt = NaiveDate::from_ymd_opt(1999, 12, 31)
            .unwrap()
            .and_hms_nano_opt(23, 59, 58, 123_456_789)
            .unwrap();
        let text = format(&DbValue::DateTime(dt)).unwrap();
        assert_eq!(parse(DbValue::String(text), DbType::DateTime).unwrap(), DbValue::DateTime(dt));
    }

    #[test]
    fn test_parse_datetime_variants() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 0)
            .unwrap();
        for text in ["2024-01-02T03:04:00", "2024-01-02 03:04", "2024-01-02T03:04:00+00:00"] {
            assert_eq!(
                parse(DbValue::from(text), DbType::DateTime).unwrap(),
                DbValue::DateTime(expected),
                "{text}"
            );
        }
        let midnight = parse(DbValue::from("2024-01-02"), DbType::DateTime).unwrap();
        assert_eq!(midnight, DbValue::DateTime(expected.date().and_time(NaiveTime::MIN)));
    }

    #[test]
    fn test_parse_offset_assumes_utc() {
        let offset_of = |text: &str| match parse(DbValue::from(text), DbType::DateTimeOffset) {
            Ok(DbValue::DateTimeOffset(o)) => o.offset().local_minus_utc(),
            other => panic!("expected offset, got {other:?}"),
        };
        assert_eq!(offset_of("2024-01-02T03:04:05"), 0);
        assert_eq!(offset_of("2024-01-02T03:04:05+02:00"), 7200);
    }

    #[test]
    fn test_guid_text() {
        let id = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let text = format(&DbValue::Guid(id)).unwrap();
        assert_eq!(text, "01234567-89ab-cdef-0123-456789abcdef");
        let upper = parse(DbValue::String(text.to_uppercase()), DbType::Guid).unwrap();
        assert_eq!(upper, DbValue::Guid(id));
        assert!(parse(DbValue::from("nope"), DbType::Guid).unwrap_err().is_value_conversion());
    }

    #[test]
    fn test_timespan_format() {
        assert_eq!(format_timespan(TimeDelta::seconds(3661)), "01:01:01");
        assert_eq!(format_timespan(TimeDelta::seconds(90_061)), "1.01:01:01");
        assert_eq!(format_timespan(TimeDelta::milliseconds(-1500)), "-00:00:01.5000000");
    }

    #[test]
    fn test_timespan_parse() {
        assert_eq!(parse_timespan("01:01:01"), Some(TimeDelta::seconds(3661)));
        assert_eq!(parse_timespan("1.01:01:01"), Some(TimeDelta::seconds(90_061)));
        assert_eq!(parse_timespan("-00:00:01.5"), Some(TimeDelta::milliseconds(-1500)));
        assert_eq!(parse_timespan("00:30"), Some(TimeDelta::minutes(30)));
        assert_eq!(parse_timespan("3"), Some(TimeDelta::days(3)));
        assert_eq!(parse_timespan("25:00:00"), None);
        assert_eq!(parse_timespan("aa:bb"), None);
    }

    #[test]
    fn test_timespan_roundtrip() {
        let span = TimeDelta::days(2) + TimeDelta::nanoseconds(123_456_700);
        assert_eq!(parse_timespan(&format_timespan(span)), Some(span));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(to_text(DbValue::Bool(true)).unwrap(), DbValue::from("true"));
        assert_eq!(to_text(DbValue::F64(0.1)).unwrap(), DbValue::from("0.1"));
        assert!(to_text(DbValue::Bytes(vec![])).is_err());
    }
}
