//! Parameterized command boundary.

use crate::Result;
use crate::types::{DbType, DbValue};

/// Direction of a statement parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

impl ParameterDirection {
    /// Returns true if the statement writes a value back through the parameter.
    #[must_use]
    pub const fn is_output(&self) -> bool {
        !matches!(self, Self::Input)
    }
}

/// A statement parameter as handed to a [`CommandSink`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Parameter {
    pub name: String,
    pub value: DbValue,
    pub direction: ParameterDirection,
    pub size: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    /// Storage type tag; `None` lets the driver infer it.
    pub db_type: Option<DbType>,
    /// Provider-specific type name, e.g. a native enum type.
    pub type_name: Option<String>,
}

impl Parameter {
    #[must_use]
    pub fn new(name: impl Into<String>, value: DbValue) -> Self {
        Self {
            name: name.into(),
            value,
            ..Self::default()
        }
    }
}

/// Parameter collection of a command about to be executed.
pub trait CommandSink {
    /// Remove every parameter.
    fn clear_parameters(&mut self);

    /// Create a blank parameter. Drivers may pre-fill defaults.
    fn create_parameter(&self) -> Parameter {
        Parameter::default()
    }

    /// Append a parameter.
    fn add_parameter(&mut self, parameter: Parameter) -> Result<()>;

    /// Placeholder prefix of the dialect, e.g. `"@"` or `":"`.
    fn parameter_prefix(&self) -> &str {
        ""
    }

    /// Whether the back-end stores enums as native user-defined types.
    ///
    /// When true, enum values are passed through as [`DbValue::Enum`]
    /// instead of being converted to their number or label.
    fn supports_native_enums(&self) -> bool {
        false
    }
}
