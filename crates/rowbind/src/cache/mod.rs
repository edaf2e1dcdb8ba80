//! Compiled-routine cache.
//!
//! - [`key`] - routine identity
//! - [`routine`] - concurrent get-or-build store and its statistics

pub mod key;
pub mod routine;

pub use key::{RoutineKey, RoutineKind};
pub use routine::{CacheStats, RoutineCache};
