//! Schema-sourced column metadata.

use crate::types::DbType;

/// Metadata about a database column as reported by schema introspection.
///
/// Read-only input to shape extraction and parameter writing. Only `name`
/// is required; everything else refines the mapping when present.
///
/// # Example
///
/// ```rust
/// use rowbind::schema::PhysicalField;
/// use rowbind::DbType;
///
/// let id = PhysicalField::new("Id")
///     .with_type(DbType::I64)
///     .not_null()
///     .primary_key()
///     .identity();
/// assert!(!id.is_nullable);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PhysicalField {
    pub name: String,
    pub db_type: Option<DbType>,
    pub is_nullable: bool,
    pub is_primary: bool,
    pub is_identity: bool,
    /// Native type name, e.g. `NVARCHAR` or `mood_enum`.
    pub database_type: Option<String>,
    pub provider: Option<String>,
    pub size: Option<u32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

impl PhysicalField {
    /// Create a nullable field with no further metadata.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: None,
            is_nullable: true,
            is_primary: false,
            is_identity: false,
            database_type: None,
            provider: None,
            size: None,
            precision: None,
            scale: None,
        }
    }

    #[must_use]
    pub const fn with_type(mut self, db_type: DbType) -> Self {
        self.db_type = Some(db_type);
        self
    }

    #[must_use]
    pub const fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.is_primary = true;
        self
    }

    /// Mark as identity. Identity columns are also non-nullable.
    #[must_use]
    pub const fn identity(mut self) -> Self {
        self.is_identity = true;
        self.is_nullable = false;
        self
    }

    #[must_use]
    pub fn with_database_type(mut self, name: impl Into<String>) -> Self {
        self.database_type = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub const fn with_precision(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Column name with quoting removed, for matching.
    #[must_use]
    pub fn unquoted_name(&self) -> &str {
        unquote(&self.name)
    }
}

/// Strip one layer of identifier quoting: `"x"`, `[x]` or `` `x` ``.
#[must_use]
pub fn unquote(name: &str) -> &str {
    let name = name.trim();
    let bytes = name.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if matches!((first, last), (b'"', b'"') | (b'[', b']') | (b'`', b'`')) {
            return &name[1..name.len() - 1];
        }
    }
    name
}
