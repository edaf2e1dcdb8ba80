//! Value model shared by every mapping component.
//!
//! - [`value`] - column type tags and dynamic cell values
//! - [`field`] - record field types and the [`FieldValue`] trait
//! - [`enums`] - enum metadata and the `db_enum!` macro

pub mod enums;
pub mod field;
pub mod value;

pub use enums::{DbEnum, EnumInfo, EnumMember, EnumRepr, EnumValue, ParsedLabel};
pub use field::{FieldType, FieldValue, ValueKind, enum_from_db};
pub use value::{DbType, DbValue};
