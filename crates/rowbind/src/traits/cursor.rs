//! Tabular cursor boundary.
//!
//! A [`Cursor`] is a forward-only view over result rows as exposed by a
//! database client. Column metadata is available before the first
//! [`advance`](Cursor::advance); cell accessors read the current row.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::types::field::mismatch;
use crate::types::{DbType, DbValue};
use crate::Result;

macro_rules! typed_accessor {
    ($($(#[$meta:meta])* $name:ident -> $ty:ty, $variant:ident;)*) => {
        $(
            $(#[$meta])*
            fn $name(&self, ordinal: usize) -> Result<$ty> {
                match self.get_value(ordinal)? {
                    DbValue::$variant(v) => Ok(v),
                    other => Err(mismatch(stringify!($ty), &other)),
                }
            }
        )*
    };
}

/// Forward-only result cursor.
///
/// Only the metadata methods, [`is_null`](Self::is_null),
/// [`get_value`](Self::get_value) and [`advance`](Self::advance) are
/// required. The typed accessors default to unwrapping `get_value`;
/// drivers with a cheaper typed path override them.
pub trait Cursor {
    /// Number of columns in the result.
    fn field_count(&self) -> usize;

    /// Column name at `ordinal`.
    fn field_name(&self, ordinal: usize) -> &str;

    /// Storage type of the column at `ordinal`.
    fn field_type(&self, ordinal: usize) -> DbType;

    /// Returns true if the cell at `ordinal` in the current row is NULL.
    fn is_null(&self, ordinal: usize) -> Result<bool>;

    /// Generic boxed accessor for the current row.
    fn get_value(&self, ordinal: usize) -> Result<DbValue>;

    /// Move to the next row. Returns false when the rows are exhausted.
    fn advance(&mut self) -> Result<bool>;

    typed_accessor! {
        get_bool -> bool, Bool;
        get_i16 -> i16, I16;
        get_i32 -> i32, I32;
        get_i64 -> i64, I64;
        get_f32 -> f32, F32;
        get_f64 -> f64, F64;
        get_decimal -> Decimal, Decimal;
        get_string -> String, String;
        get_bytes -> Vec<u8>, Bytes;
        get_guid -> Uuid, Guid;
        get_date -> NaiveDate, Date;
        get_time -> NaiveTime, Time;
        get_datetime -> NaiveDateTime, DateTime;
        get_datetime_offset -> DateTime<FixedOffset>, DateTimeOffset;
        get_timespan -> TimeDelta, TimeSpan;
    }
}

/// Reads one cell as a [`DbValue`].
pub(crate) type CellReader = fn(&dyn Cursor, usize) -> Result<DbValue>;

/// Pick the accessor for a column type.
///
/// Types with a typed accessor use it; the rest fall back to
/// [`Cursor::get_value`].
pub(crate) fn reader_for(db_type: DbType) -> CellReader {
    match db_type {
        DbType::Bool => |c: &dyn Cursor, o: usize| c.get_bool(o).map(DbValue::Bool),
        DbType::I16 => |c: &dyn Cursor, o: usize| c.get_i16(o).map(DbValue::I16),
        DbType::I32 => |c: &dyn Cursor, o: usize| c.get_i32(o).map(DbValue::I32),
        DbType::I64 => |c: &dyn Cursor, o: usize| c.get_i64(o).map(DbValue::I64),
        DbType::F32 => |c: &dyn Cursor, o: usize| c.get_f32(o).map(DbValue::F32),
        DbType::F64 => |c: &dyn Cursor, o: usize| c.get_f64(o).map(DbValue::F64),
        DbType::Decimal => |c: &dyn Cursor, o: usize| c.get_decimal(o).map(DbValue::Decimal),
        DbType::String => |c: &dyn Cursor, o: usize| c.get_string(o).map(DbValue::String),
        DbType::Bytes => |c: &dyn Cursor, o: usize| c.get_bytes(o).map(DbValue::Bytes),
        DbType::Guid => |c: &dyn Cursor, o: usize| c.get_guid(o).map(DbValue::Guid),
        DbType::Date => |c: &dyn Cursor, o: usize| c.get_date(o).map(DbValue::Date),
        DbType::Time => |c: &dyn Cursor, o: usize| c.get_time(o).map(DbValue::Time),
        DbType::DateTime => |c: &dyn Cursor, o: usize| c.get_datetime(o).map(DbValue::DateTime),
        DbType::DateTimeOffset => |c: &dyn Cursor, o: usize| {
            c.get_datetime_offset(o).map(DbValue::DateTimeOffset)
        },
        DbType::TimeSpan => |c: &dyn Cursor, o: usize| c.get_timespan(o).map(DbValue::TimeSpan),
        DbType::I8 | DbType::U8 | DbType::U16 | DbType::U32 | DbType::U64 => {
            |c: &dyn Cursor, o: usize| c.get_value(o)
        }
    }
}
