//! Collaborator boundaries.
//!
//! - [`cursor`] - forward-only result cursor read by inbound routines
//! - [`sink`] - parameter collection written by outbound routines

pub mod cursor;
pub mod sink;

pub use cursor::Cursor;
pub use sink::{CommandSink, Parameter, ParameterDirection};
