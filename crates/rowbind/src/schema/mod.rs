//! Result shapes and physical column metadata.

pub mod physical;
pub mod shape;

pub use physical::{PhysicalField, unquote};
pub use shape::{ColumnDescriptor, CursorShape, extract_shape};
