//! In-memory cursor and command adapters.
//!
//! [`MemoryCursor`] serves rows of [`DbValue`]s and counts how often it is
//! asked for null tests and cell reads. [`MemoryCommand`] records the
//! parameters written to it. Both are used by tests and benchmarks, and by
//! callers that already hold materialized rows.

use std::cell::Cell;

use crate::traits::{CommandSink, Cursor, Parameter};
use crate::types::{DbType, DbValue};
use crate::{MappingError, Result};

/// A cursor over rows held in memory.
///
/// ```rust
/// use rowbind::memory::MemoryCursor;
/// use rowbind::{Cursor, DbType, DbValue};
///
/// let mut cursor = MemoryCursor::new([("Id", DbType::I32)])
///     .with_row(vec![DbValue::I32(1)]);
/// assert!(cursor.advance().unwrap());
/// assert_eq!(cursor.get_i32(0).unwrap(), 1);
/// assert!(!cursor.advance().unwrap());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    columns: Vec<(String, DbType)>,
    rows: Vec<Vec<DbValue>>,
    position: Option<usize>,
    null_checks: Cell<usize>,
    reads: Cell<usize>,
}

impl MemoryCursor {
    /// Create an empty cursor with the given columns.
    #[must_use]
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = (S, DbType)>) -> Self {
        Self {
            columns: columns.into_iter().map(|(n, t)| (n.into(), t)).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_row(mut self, row: Vec<DbValue>) -> Self {
        self.rows.push(row);
        self
    }

    pub fn push_row(&mut self, row: Vec<DbValue>) {
        self.rows.push(row);
    }

    /// Move back before the first row and reset the counters.
    pub fn rewind(&mut self) {
        self.position = None;
        self.null_checks.set(0);
        self.reads.set(0);
    }

    /// Number of [`Cursor::is_null`] calls so far.
    #[must_use]
    pub fn null_checks(&self) -> usize {
        self.null_checks.get()
    }

    /// Number of cell reads so far, typed or boxed.
    #[must_use]
    pub fn reads(&self) -> usize {
        self.reads.get()
    }

    fn cell(&self, ordinal: usize) -> Result<&DbValue> {
        let row = self
            .position
            .and_then(|p| self.rows.get(p))
            .ok_or_else(|| MappingError::cursor("no current row"))?;
        row.get(ordinal)
            .ok_or_else(|| MappingError::cursor(format!("ordinal {ordinal} out of range")))
    }
}

impl Cursor for MemoryCursor {
    fn field_count(&self) -> usize {
        self.columns.len()
    }

    fn field_name(&self, ordinal: usize) -> &str {
        self.columns.get(ordinal).map_or("", |(n, _)| n.as_str())
    }

    fn field_type(&self, ordinal: usize) -> DbType {
        self.columns.get(ordinal).map_or(DbType::String, |(_, t)| *t)
    }

    fn is_null(&self, ordinal: usize) -> Result<bool> {
        self.null_checks.set(self.null_checks.get() + 1);
        self.cell(ordinal).map(DbValue::is_null)
    }

    fn get_value(&self, ordinal: usize) -> Result<DbValue> {
        self.reads.set(self.reads.get() + 1);
        self.cell(ordinal).cloned()
    }

    fn advance(&mut self) -> Result<bool> {
        let next = self.position.map_or(0, |p| p + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }
}

/// A parameter sink that records what it receives.
#[derive(Debug, Clone, Default)]
pub struct MemoryCommand {
    parameters: Vec<Parameter>,
    prefix: String,
    native_enums: bool,
    clears: usize,
}

impl MemoryCommand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `prefix` as the dialect's placeholder prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Report native enum support.
    #[must_use]
    pub const fn with_native_enums(mut self) -> Self {
        self.native_enums = true;
        self
    }

    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Find a parameter by exact name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Parameter names in insertion order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// How many times the parameters were cleared.
    #[must_use]
    pub const fn clear_count(&self) -> usize {
        self.clears
    }
}

impl CommandSink for MemoryCommand {
    fn clear_parameters(&mut self) {
        self.clears += 1;
        self.parameters.clear();
    }

    fn add_parameter(&mut self, parameter: Parameter) -> Result<()> {
        self.parameters.push(parameter);
        Ok(())
    }

    fn parameter_prefix(&self) -> &str {
        &self.prefix
    }

    fn supports_native_enums(&self) -> bool {
        self.native_enums
    }
}
