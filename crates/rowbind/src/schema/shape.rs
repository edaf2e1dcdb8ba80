//! Cursor shape extraction.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::physical::{PhysicalField, unquote};
use crate::traits::Cursor;
use crate::types::DbType;

/// One column of a [`CursorShape`].
///
/// Equality and hashing cover name, type, ordinal and nullability. The
/// attached physical field only refines metadata and is not part of the
/// identity.
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub name: String,
    pub db_type: DbType,
    pub ordinal: usize,
    /// False only when a catalog proves the column can never hold NULL.
    pub nullable: bool,
    pub physical: Option<PhysicalField>,
}

impl PartialEq for ColumnDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal
            && self.db_type == other.db_type
            && self.nullable == other.nullable
            && self.name == other.name
    }
}

impl Eq for ColumnDescriptor {}

impl Hash for ColumnDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.ordinal.hash(state);
        self.db_type.hash(state);
        self.nullable.hash(state);
    }
}

/// Ordered column description of a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct CursorShape {
    columns: Vec<ColumnDescriptor>,
}

impl CursorShape {
    #[must_use]
    pub const fn new(columns: Vec<ColumnDescriptor>) -> Self {
        Self { columns }
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Structural hash of the shape.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Derive the shape of `cursor`.
///
/// When a catalog is supplied, each column is matched to a physical field by
/// case-insensitive, quote-stripped name. A matched non-nullable field marks
/// the column non-nullable, which lets inbound routines skip the null test.
/// Unmatched columns stay nullable.
#[must_use]
pub fn extract_shape(cursor: &dyn Cursor, catalog: Option<&[PhysicalField]>) -> CursorShape {
    let columns = (0..cursor.field_count())
        .map(|ordinal| {
            let name = cursor.field_name(ordinal).to_string();
            let physical = catalog.and_then(|fields| {
                let wanted = unquote(&name);
                fields
                    .iter()
                    .find(|f| f.unquoted_name().eq_ignore_ascii_case(wanted))
                    .cloned()
            });
            let nullable = physical.as_ref().is_none_or(|f| f.is_nullable);

            ColumnDescriptor {
                db_type: cursor.field_type(ordinal),
                name,
                ordinal,
                nullable,
                physical,
            }
        })
        .collect();

    CursorShape::new(columns)
}
