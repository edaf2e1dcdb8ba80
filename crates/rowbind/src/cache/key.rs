//! Routine cache keys

use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::coercion::InvalidEnumValueHandling;
use crate::compiler::OutboundField;
use crate::schema::CursorShape;

/// Kind of compiled routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutineKind {
    /// Cursor row to record instance.
    RowToObject,
    /// Record instances to statement parameters.
    ObjectsToParameters,
}

impl RoutineKind {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RowToObject => "row_to_object",
            Self::ObjectsToParameters => "objects_to_parameters",
        }
    }
}

/// Identity of a compiled routine.
///
/// Inbound routines are keyed by target type and result shape, outbound
/// routines by source type, discriminator, field list and batch size. Both
/// carry the settings baked into the routine at build time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutineKey {
    kind: RoutineKind,
    type_id: TypeId,
    type_name: String,
    shape: Option<CursorShape>,
    discriminator: Option<String>,
    fields: Vec<OutboundField>,
    batch_size: usize,
    policy: InvalidEnumValueHandling,
    match_underscores: bool,
}

impl RoutineKey {
    /// Key for a row-to-object routine.
    #[must_use]
    pub fn row_to_object(
        type_id: TypeId,
        type_name: &str,
        shape: &CursorShape,
        policy: InvalidEnumValueHandling,
        match_underscores: bool,
    ) -> Self {
        Self {
            kind: RoutineKind::RowToObject,
            type_id,
            type_name: type_name.to_string(),
            shape: Some(shape.clone()),
            discriminator: None,
            fields: Vec::new(),
            batch_size: 1,
            policy,
            match_underscores,
        }
    }

    /// Key for an objects-to-parameters routine.
    ///
    /// `discriminator` separates routines that share type and fields but
    /// differ in something only the caller knows, e.g. the statement.
    #[must_use]
    pub fn objects_to_parameters(
        type_id: TypeId,
        type_name: &str,
        discriminator: Option<&str>,
        fields: &[OutboundField],
        batch_size: usize,
        policy: InvalidEnumValueHandling,
    ) -> Self {
        Self {
            kind: RoutineKind::ObjectsToParameters,
            type_id,
            type_name: type_name.to_string(),
            shape: None,
            discriminator: discriminator.map(ToString::to_string),
            fields: fields.to_vec(),
            batch_size,
            policy,
            match_underscores: false,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> RoutineKind {
        self.kind
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Structural hash of the key.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl fmt::Display for RoutineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{:016x}",
            self.kind.as_str(),
            self.type_name,
            self.fingerprint()
        )
    }
}
