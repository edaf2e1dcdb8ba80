//! Mapping synthesizer.
//!
//! Builds the two kinds of routine the mapper caches:
//!
//! - [`inbound`] - cursor row to record instance
//! - [`outbound`] - record instances (or string-keyed maps) to parameters
//!
//! All type decisions (which column feeds which member, which coercion
//! applies, which handler runs) are taken once at build time and captured in
//! per-member bindings. The returned closure only walks those bindings.

pub mod inbound;
pub mod outbound;

pub use inbound::{RowToObject, build_row_to_object};
pub use outbound::{
    MapsToParameters, ObjectsToParameters, ParameterMap, build_maps_to_parameters,
    build_objects_to_parameters,
};

use crate::schema::PhysicalField;
use crate::traits::ParameterDirection;

/// One field an outbound routine writes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OutboundField {
    /// Property name, mapped name or dictionary key.
    pub name: String,
    /// Column metadata refining the parameter type, size and nullability.
    pub physical: Option<PhysicalField>,
    pub direction: ParameterDirection,
}

impl OutboundField {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            physical: None,
            direction: ParameterDirection::Input,
        }
    }

    #[must_use]
    pub fn with_physical(mut self, physical: PhysicalField) -> Self {
        self.physical = Some(physical);
        self
    }

    #[must_use]
    pub const fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }
}

impl From<&str> for OutboundField {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<PhysicalField> for OutboundField {
    fn from(physical: PhysicalField) -> Self {
        Self::new(physical.name.clone()).with_physical(physical)
    }
}

/// Case-, then underscore-insensitive name comparison used for column and
/// key matching.
pub(crate) fn names_match(a: &str, b: &str, ignore_underscores: bool) -> bool {
    if a.eq_ignore_ascii_case(b) {
        return true;
    }
    ignore_underscores
        && a.chars()
            .filter(|c| *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .eq(b.chars().filter(|c| *c != '_').map(|c| c.to_ascii_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbType;

    #[test]
    fn test_names_match() {
        assert!(names_match("UserName", "username", false));
        assert!(!names_match("user_name", "UserName", false));
        assert!(names_match("user_name", "UserName", true));
        assert!(!names_match("user_id", "UserName", true));
    }

    #[test]
    fn test_field_from_physical() {
        let f = OutboundField::from(PhysicalField::new("Id").with_type(DbType::I64).identity());
        assert_eq!(f.name, "Id");
        assert!(f.physical.as_ref().is_some_and(|p| p.is_identity));
        assert_eq!(f.direction, ParameterDirection::Input);
        assert_ne!(f, OutboundField::from("Id"));
    }
}
