//! Error hierarchy for rowbind.
//!
//! Follows the "canonical error struct" pattern: a single public error type
//! with `is_xxx()` predicates, keeping the `ErrorKind` enum internal so new
//! failure modes can be added without breaking callers.
//!
//! Errors fall into three categories (see [`ErrorCategory`]):
//!
//! - **Configuration** errors are raised while a routine is being built and
//!   never leave a partial entry in the routine cache.
//! - **Data** errors are raised while a routine runs against a concrete row or
//!   instance and are returned to the caller unmodified.
//! - **Collaborator** errors are reported by a cursor or parameter sink.

use thiserror::Error;

/// Root error type for rowbind.
///
/// # Example
///
/// ```rust,ignore
/// use rowbind::MappingError;
///
/// fn handle_error(err: &MappingError) {
///     if err.is_invalid_enum_value() {
///         eprintln!("row carried an undefined enum value: {err}");
///     } else if err.is_unsupported_coercion() {
///         eprintln!("record type does not fit the result shape: {err}");
///     }
/// }
/// ```
#[derive(Error, Debug)]
#[error("{kind}")]
pub struct MappingError {
    kind: ErrorKind,
}

/// Broad classification of a [`MappingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Raised while building a routine; reflects a mismatch between types.
    Configuration,
    /// Raised while mapping a concrete row or instance.
    Data,
    /// Raised by a cursor or parameter sink.
    Collaborator,
}

/// Internal error classification.
///
/// This enum is `pub(crate)` to allow adding variants without breaking changes.
/// External code should use the `is_xxx()` predicate methods instead.
#[derive(Error, Debug)]
#[non_exhaustive]
pub(crate) enum ErrorKind {
    /// No coercion rule exists between the two types.
    #[error("no coercion from {source_type} to {target_type} (declared by {context})")]
    UnsupportedCoercion {
        source_type: String,
        target_type: String,
        context: String,
    },

    /// Nothing in the result shape binds to the record type.
    #[error("no member of '{type_name}' binds to any column of the result")]
    NoBindableMembers { type_name: String },

    /// The type exposes neither a constructor nor a default factory.
    #[error("type '{type_name}' has no usable constructor")]
    NoConstructor { type_name: String },

    /// An outbound field is not present on the source type.
    #[error("property '{field}' not found on '{type_name}'")]
    PropertyNotFound { field: String, type_name: String },

    /// An enum handling policy string could not be parsed.
    #[error("invalid enum handling policy: '{value}'")]
    InvalidPolicy { value: String },

    /// Any other configuration value was rejected.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// A batch routine was invoked with the wrong number of instances.
    #[error("batch size mismatch: routine expects {expected} instances, got {actual}")]
    BatchSizeMismatch { expected: usize, actual: usize },

    /// A raw value is not a member of the target enum.
    #[error("invalid value '{value}' for enum '{enum_name}'")]
    InvalidEnumValue { value: String, enum_name: String },

    /// A class-level hook returned no instance.
    #[error("class handler for '{type_name}' returned no instance")]
    NullHookResult { type_name: String },

    /// Value conversion failure for a specific column or property.
    #[error("value conversion failed for '{column}': {message}")]
    ValueConversion { column: String, message: String },

    /// Error reported by a cursor or parameter sink.
    #[error("cursor error: {message}")]
    Cursor { message: String },
}

impl MappingError {
    // ═══════════════════════════════════════════════════════════════════════
    // Constructors
    // ═══════════════════════════════════════════════════════════════════════

    /// Create error for a missing coercion rule.
    #[must_use]
    pub fn unsupported_coercion(
        source: impl Into<String>,
        target: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            kind: ErrorKind::UnsupportedCoercion {
                source_type: source.into(),
                target_type: target.into(),
                context: context.into(),
            },
        }
    }

    /// Create error for a record type with no bound members.
    #[must_use]
    pub fn no_bindable_members(type_name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NoBindableMembers {
                type_name: type_name.into(),
            },
        }
    }

    /// Create error for a type without constructor or default factory.
    #[must_use]
    pub fn no_constructor(type_name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NoConstructor {
                type_name: type_name.into(),
            },
        }
    }

    /// Create error for an outbound field absent from the source type.
    #[must_use]
    pub fn property_not_found(field: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::PropertyNotFound {
                field: field.into(),
                type_name: type_name.into(),
            },
        }
    }

    /// Create error for an unparsable enum handling policy.
    #[must_use]
    pub fn invalid_policy(value: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidPolicy {
                value: value.into(),
            },
        }
    }

    /// Create error for a rejected configuration value.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidConfig {
                message: message.into(),
            },
        }
    }

    /// Create error for a batch routine invoked with the wrong instance count.
    #[must_use]
    pub const fn batch_size_mismatch(expected: usize, actual: usize) -> Self {
        Self {
            kind: ErrorKind::BatchSizeMismatch { expected, actual },
        }
    }

    /// Create error for an undefined enum value.
    #[must_use]
    pub fn invalid_enum_value(value: impl ToString, enum_name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::InvalidEnumValue {
                value: value.to_string(),
                enum_name: enum_name.into(),
            },
        }
    }

    /// Create error for a class-level hook that produced no instance.
    #[must_use]
    pub fn null_hook_result(type_name: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::NullHookResult {
                type_name: type_name.into(),
            },
        }
    }

    /// Create error for value conversion failure.
    #[must_use]
    pub fn value_conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::ValueConversion {
                column: column.into(),
                message: message.into(),
            },
        }
    }

    /// Create error reported by a cursor or sink.
    #[must_use]
    pub fn cursor(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Cursor {
                message: message.into(),
            },
        }
    }

    /// Attach a column or property name to a conversion or cursor error.
    ///
    /// Conversion errors raised below the synthesizer do not know which
    /// column they belong to; the routine fills it in on the way out. Cursor
    /// errors get the column prepended to their message. Other kinds pass
    /// through untouched.
    #[must_use]
    pub fn in_column(self, column: &str) -> Self {
        match self.kind {
            ErrorKind::ValueConversion { column: inner, message } if inner.is_empty() => {
                Self::value_conversion(column, message)
            }
            ErrorKind::Cursor { message } => Self::cursor(format!("column '{column}': {message}")),
            kind => Self { kind },
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Predicate Methods (is_xxx)
    // ═══════════════════════════════════════════════════════════════════════

    /// Returns true if this is an unsupported coercion error.
    #[must_use]
    pub const fn is_unsupported_coercion(&self) -> bool {
        matches!(self.kind, ErrorKind::UnsupportedCoercion { .. })
    }

    /// Returns true if no member could be bound.
    #[must_use]
    pub const fn is_no_bindable_members(&self) -> bool {
        matches!(self.kind, ErrorKind::NoBindableMembers { .. })
    }

    /// Returns true if the type has no usable constructor.
    #[must_use]
    pub const fn is_no_constructor(&self) -> bool {
        matches!(self.kind, ErrorKind::NoConstructor { .. })
    }

    /// Returns true if this is a property-not-found error.
    #[must_use]
    pub const fn is_property_not_found(&self) -> bool {
        matches!(self.kind, ErrorKind::PropertyNotFound { .. })
    }

    /// Returns true if this is an invalid policy error.
    #[must_use]
    pub const fn is_invalid_policy(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidPolicy { .. })
    }

    /// Returns true if this is an invalid configuration error.
    #[must_use]
    pub const fn is_invalid_config(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidConfig { .. })
    }

    /// Returns true if this is a batch size mismatch.
    #[must_use]
    pub const fn is_batch_size_mismatch(&self) -> bool {
        matches!(self.kind, ErrorKind::BatchSizeMismatch { .. })
    }

    /// Returns true if this is an invalid enum value error.
    #[must_use]
    pub const fn is_invalid_enum_value(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidEnumValue { .. })
    }

    /// Returns true if a class-level hook returned no instance.
    #[must_use]
    pub const fn is_null_hook_result(&self) -> bool {
        matches!(self.kind, ErrorKind::NullHookResult { .. })
    }

    /// Returns true if this is a value conversion error.
    #[must_use]
    pub const fn is_value_conversion(&self) -> bool {
        matches!(self.kind, ErrorKind::ValueConversion { .. })
    }

    /// Returns true if the error was reported by a cursor or sink.
    #[must_use]
    pub const fn is_cursor_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Cursor { .. })
    }

    /// Classify the error.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self.kind {
            ErrorKind::UnsupportedCoercion { .. }
            | ErrorKind::NoBindableMembers { .. }
            | ErrorKind::NoConstructor { .. }
            | ErrorKind::PropertyNotFound { .. }
            | ErrorKind::InvalidPolicy { .. }
            | ErrorKind::InvalidConfig { .. }
            | ErrorKind::BatchSizeMismatch { .. } => ErrorCategory::Configuration,
            ErrorKind::InvalidEnumValue { .. }
            | ErrorKind::NullHookResult { .. }
            | ErrorKind::ValueConversion { .. } => ErrorCategory::Data,
            ErrorKind::Cursor { .. } => ErrorCategory::Collaborator,
        }
    }
}

/// Result type alias for mapping operations.
pub type Result<T> = std::result::Result<T, MappingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_coercion_names_both_types() {
        let err = MappingError::unsupported_coercion("Bytes", "DateTime", "User.created");
        assert!(err.is_unsupported_coercion());
        let msg = err.to_string();
        assert!(msg.contains("Bytes"));
        assert!(msg.contains("DateTime"));
        assert!(msg.contains("User.created"));
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_invalid_enum_value() {
        let err = MappingError::invalid_enum_value(5, "Color");
        assert!(err.is_invalid_enum_value());
        assert!(!err.is_value_conversion());
        let msg = err.to_string();
        assert!(msg.contains('5'));
        assert!(msg.contains("Color"));
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_property_not_found() {
        let err = MappingError::property_not_found("Missing", "User");
        assert!(err.is_property_not_found());
        assert!(err.to_string().contains("'Missing'"));
        assert!(err.to_string().contains("'User'"));
    }

    #[test]
    fn test_batch_size_mismatch() {
        let err = MappingError::batch_size_mismatch(3, 2);
        assert!(err.is_batch_size_mismatch());
        assert!(err.to_string().contains("expects 3 instances, got 2"));
    }

    #[test]
    fn test_in_column_fills_missing_column() {
        let err = MappingError::value_conversion("", "expected i32").in_column("Id");
        assert!(err.to_string().contains("'Id'"));

        let kept = MappingError::value_conversion("Name", "boom").in_column("Id");
        assert!(kept.to_string().contains("'Name'"));

        let other = MappingError::invalid_enum_value(9, "Color").in_column("Id");
        assert!(other.is_invalid_enum_value());
    }

    #[test]
    fn test_in_column_prefixes_cursor_error() {
        let err = MappingError::cursor("connection reset").in_column("Name");
        assert!(err.is_cursor_error());
        assert!(err.to_string().contains("column 'Name': connection reset"));
    }

    #[test]
    fn test_cursor_error_category() {
        let err = MappingError::cursor("connection reset");
        assert!(err.is_cursor_error());
        assert_eq!(err.category(), ErrorCategory::Collaborator);
    }

    #[test]
    fn test_null_hook_result() {
        let err = MappingError::null_hook_result("User");
        assert!(err.is_null_hook_result());
        assert_eq!(err.category(), ErrorCategory::Data);
    }

    #[test]
    fn test_error_debug() {
        let err = MappingError::no_bindable_members("User");
        let debug_str = format!("{err:?}");
        assert!(debug_str.contains("MappingError"));
    }
}
