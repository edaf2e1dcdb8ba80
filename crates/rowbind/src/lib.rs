//! Compiled, cached mapping between result rows, typed records and statement
//! parameters.
//!
//! The first time a record type meets a result shape, rowbind resolves
//! every decision once (which column feeds which member, how each value is
//! coerced, which handler runs) and caches the resulting routine. Later rows
//! of the same shape only run that routine.
//!
//! # Features
//!
//! - Row-to-record routines keyed by result shape, with null-test elision
//!   for columns a schema catalog proves non-nullable
//! - Record-to-parameter routines with batch naming (`Id`, `Id_1`, ...)
//! - A coercion matrix covering numeric, text, GUID, temporal and enum
//!   conversions, with a selectable policy for undefined enum values
//! - Per-property, type-wide and per-instance handlers
//! - Lock-free reads of built routines, at most one build per key
//!
//! # Example
//!
//! ```rust
//! use rowbind::memory::MemoryCursor;
//! use rowbind::{DbType, DbValue, InvalidEnumValueHandling, Mapper, MapperConfig};
//!
//! rowbind::db_enum! {
//!     pub struct Color(i32) {
//!         RED = 0 => "Red",
//!         GREEN = 1 => "Green",
//!         BLUE = 2 => "Blue",
//!     }
//! }
//!
//! rowbind::record! {
//!     #[derive(Debug)]
//!     pub struct Swatch {
//!         pub id: i64 => "Id",
//!         pub status: Color => "Status",
//!     }
//! }
//!
//! let mapper = Mapper::new(
//!     MapperConfig::builder()
//!         .enum_handling(InvalidEnumValueHandling::UseDefault)
//!         .build(),
//! );
//! let mut cursor = MemoryCursor::new([("Id", DbType::I64), ("Status", DbType::I32)])
//!     .with_row(vec![DbValue::I64(1), DbValue::I32(5)]);
//!
//! let rows: Vec<Swatch> = mapper.map_rows(&mut cursor).unwrap();
//! assert_eq!(rows[0].status, Color::RED);
//! ```
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod cache;
pub mod coercion;
pub mod compiler;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod handler;
pub mod mapper;
pub mod memory;
pub mod observability;
pub mod schema;
pub mod traits;
pub mod types;

// Re-export main types for convenience
pub use cache::{CacheStats, RoutineCache, RoutineKey, RoutineKind};
pub use coercion::{Conversion, InvalidEnumValueHandling};
pub use compiler::{
    MapsToParameters, ObjectsToParameters, OutboundField, ParameterMap, RowToObject,
};
pub use config::{ConfigBuilder, MapperConfig};
pub use descriptor::{
    ConstructorDescriptor, ParamDescriptor, PropertyDescriptor, Record, TypeDescriptor,
    TypeDescriptorBuilder, describe,
};
pub use error::{ErrorCategory, MappingError, Result};
pub use handler::{ClassHandler, FnHandler, HandlerContext, HandlerRegistry, Phase, PropertyHandler};
pub use mapper::{Mapper, MapperBuilder, global};
pub use schema::{ColumnDescriptor, CursorShape, PhysicalField, extract_shape};
pub use traits::{CommandSink, Cursor, Parameter, ParameterDirection};
pub use types::{DbEnum, DbType, DbValue, EnumInfo, EnumValue, FieldType, FieldValue, ValueKind};
