//! Mapper facade.
//!
//! A [`Mapper`] ties the pieces together: it extracts the shape of a cursor,
//! looks up the descriptor of the record type, and fetches or builds the
//! routine from its cache. Configuration and handlers are fixed when the
//! mapper is built, so every routine it caches stays valid for its lifetime.

use std::any::TypeId;
use std::sync::LazyLock;

use crate::cache::{CacheStats, RoutineCache, RoutineKey};
use crate::compiler::{
    MapsToParameters, ObjectsToParameters, OutboundField, ParameterMap, RowToObject,
    build_maps_to_parameters, build_objects_to_parameters, build_row_to_object,
};
use crate::config::{self, MapperConfig};
use crate::descriptor::{Record, describe};
use crate::handler::{ClassHandler, HandlerRegistry, PropertyHandler};
use crate::observability;
use crate::schema::{PhysicalField, extract_shape};
use crate::traits::{CommandSink, Cursor};
use crate::types::FieldValue;
use crate::Result;

const MAP_TYPE_NAME: &str = "dictionary";

/// Maps rows to records and records to parameters, caching every routine.
///
/// # Example
///
/// ```rust
/// use rowbind::memory::{MemoryCommand, MemoryCursor};
/// use rowbind::{DbType, DbValue, Mapper, OutboundField};
///
/// rowbind::record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct User {
///         pub id: i32 => "Id",
///         pub name: String => "Name",
///     }
/// }
///
/// let mapper = Mapper::default();
/// let mut cursor = MemoryCursor::new([("Id", DbType::I32), ("Name", DbType::String)])
///     .with_row(vec![DbValue::I32(1), DbValue::from("Ada")]);
/// let users: Vec<User> = mapper.map_rows(&mut cursor).unwrap();
/// assert_eq!(users[0].name, "Ada");
///
/// let mut cmd = MemoryCommand::new().with_prefix("@");
/// mapper
///     .write_parameters(&mut cmd, &[OutboundField::new("Id")], &users)
///     .unwrap();
/// assert_eq!(cmd.names(), vec!["@Id"]);
/// ```
#[derive(Debug, Default)]
pub struct Mapper {
    config: MapperConfig,
    handlers: HandlerRegistry,
    routines: RoutineCache,
}

impl Mapper {
    /// Create a mapper without handlers.
    #[must_use]
    pub fn new(config: MapperConfig) -> Self {
        Self::with_handlers(config, HandlerRegistry::new())
    }

    #[must_use]
    pub fn with_handlers(config: MapperConfig, handlers: HandlerRegistry) -> Self {
        let routines = RoutineCache::with_warn_threshold(config.routine_warn_threshold);
        Self {
            config,
            handlers,
            routines,
        }
    }

    #[must_use]
    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    #[must_use]
    pub const fn config(&self) -> &MapperConfig {
        &self.config
    }

    #[must_use]
    pub const fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inbound
    // ═══════════════════════════════════════════════════════════════════════

    /// Routine mapping rows of `cursor`'s current shape to `T`.
    ///
    /// # Errors
    ///
    /// Returns the build error when `T` does not fit the shape.
    pub fn row_mapper<T: Record>(&self, cursor: &dyn Cursor) -> Result<RowToObject<T>> {
        self.row_mapper_inner(cursor, None)
    }

    /// Like [`row_mapper`](Self::row_mapper), with a physical-field catalog
    /// that lets non-nullable columns skip the null test.
    ///
    /// # Errors
    ///
    /// Returns the build error when `T` does not fit the shape.
    pub fn row_mapper_with_catalog<T: Record>(
        &self,
        cursor: &dyn Cursor,
        catalog: &[PhysicalField],
    ) -> Result<RowToObject<T>> {
        self.row_mapper_inner(cursor, Some(catalog))
    }

    fn row_mapper_inner<T: Record>(
        &self,
        cursor: &dyn Cursor,
        catalog: Option<&[PhysicalField]>,
    ) -> Result<RowToObject<T>> {
        let descriptor = describe::<T>();
        let shape = extract_shape(cursor, catalog);
        let key = RoutineKey::row_to_object(
            TypeId::of::<T>(),
            descriptor.type_name(),
            &shape,
            self.config.enum_handling,
            self.config.match_names_with_underscores,
        );
        self.routines.get_or_build(&key, || {
            build_row_to_object(&descriptor, &shape, &self.config, &self.handlers)
        })
    }

    /// Map every remaining row of `cursor`.
    ///
    /// # Errors
    ///
    /// Fails on the first row that does not map; no partial result is
    /// returned.
    pub fn map_rows<T: Record>(&self, cursor: &mut dyn Cursor) -> Result<Vec<T>> {
        let routine = self.row_mapper::<T>(&*cursor)?;
        drain(cursor, &routine)
    }

    /// [`map_rows`](Self::map_rows) with a physical-field catalog.
    ///
    /// # Errors
    ///
    /// Fails on the first row that does not map.
    pub fn map_rows_with_catalog<T: Record>(
        &self,
        cursor: &mut dyn Cursor,
        catalog: &[PhysicalField],
    ) -> Result<Vec<T>> {
        let routine = self.row_mapper_with_catalog::<T>(&*cursor, catalog)?;
        drain(cursor, &routine)
    }

    /// Map the row the cursor is positioned on.
    ///
    /// # Errors
    ///
    /// Returns the build error, or the error of the row.
    pub fn map_current_row<T: Record>(&self, cursor: &dyn Cursor) -> Result<T> {
        self.row_mapper::<T>(cursor)?(cursor)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Outbound
    // ═══════════════════════════════════════════════════════════════════════

    /// Routine writing `fields` of `batch_size` instances of `T`.
    ///
    /// `discriminator` separates routines that would otherwise share a key,
    /// e.g. two statements over the same fields.
    ///
    /// # Errors
    ///
    /// Returns the build error, e.g. a field naming no property of `T`.
    pub fn parameter_writer<T: Record>(
        &self,
        fields: &[OutboundField],
        batch_size: usize,
        discriminator: Option<&str>,
    ) -> Result<ObjectsToParameters<T>> {
        let descriptor = describe::<T>();
        let key = RoutineKey::objects_to_parameters(
            TypeId::of::<T>(),
            descriptor.type_name(),
            discriminator,
            fields,
            batch_size,
            self.config.enum_handling,
        );
        let (config, handlers) = (&self.config, &self.handlers);
        self.routines.get_or_build(&key, || {
            build_objects_to_parameters(&descriptor, fields, batch_size, config, handlers)
        })
    }

    /// Write `fields` of every instance to `sink`, as one batch.
    ///
    /// # Errors
    ///
    /// Returns the build error or the first conversion error; the sink is
    /// left untouched in both cases.
    pub fn write_parameters<T: Record>(
        &self,
        sink: &mut dyn CommandSink,
        fields: &[OutboundField],
        instances: &[T],
    ) -> Result<()> {
        self.parameter_writer::<T>(fields, instances.len(), None)?(sink, instances)
    }

    /// Routine writing `fields` of `batch_size` string-keyed maps.
    ///
    /// # Errors
    ///
    /// Returns invalid configuration when `batch_size` is zero.
    pub fn map_parameter_writer(
        &self,
        fields: &[OutboundField],
        batch_size: usize,
        discriminator: Option<&str>,
    ) -> Result<MapsToParameters> {
        let key = RoutineKey::objects_to_parameters(
            TypeId::of::<ParameterMap>(),
            MAP_TYPE_NAME,
            discriminator,
            fields,
            batch_size,
            self.config.enum_handling,
        );
        self.routines
            .get_or_build(&key, || build_maps_to_parameters(fields, batch_size, &self.config))
    }

    /// Write `fields` of every map to `sink`, as one batch.
    ///
    /// # Errors
    ///
    /// Returns property-not-found for a missing key, or the first conversion
    /// error; the sink is left untouched in both cases.
    pub fn write_map_parameters(
        &self,
        sink: &mut dyn CommandSink,
        fields: &[OutboundField],
        instances: &[ParameterMap],
    ) -> Result<()> {
        self.map_parameter_writer(fields, instances.len(), None)?(sink, instances)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Cache
    // ═══════════════════════════════════════════════════════════════════════

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.routines.stats()
    }

    /// Drop every cached routine. Routines already handed out keep working.
    pub fn clear_routines(&self) {
        self.routines.clear();
    }
}

fn drain<T>(cursor: &mut dyn Cursor, routine: &RowToObject<T>) -> Result<Vec<T>> {
    let mut rows = Vec::new();
    while cursor.advance()? {
        rows.push(routine(&*cursor)?);
    }
    Ok(rows)
}

/// Builder for [`Mapper`].
#[derive(Debug, Default)]
pub struct MapperBuilder {
    config: MapperConfig,
    handlers: HandlerRegistry,
}

impl MapperBuilder {
    #[must_use]
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// See [`HandlerRegistry::bind_property`].
    #[must_use]
    pub fn bind_property<T: 'static>(
        mut self,
        property: &str,
        handler: impl PropertyHandler + 'static,
    ) -> Self {
        self.handlers.bind_property::<T>(property, handler);
        self
    }

    /// See [`HandlerRegistry::bind_type`].
    #[must_use]
    pub fn bind_type<V: FieldValue>(mut self, handler: impl PropertyHandler + 'static) -> Self {
        self.handlers.bind_type::<V>(handler);
        self
    }

    /// See [`HandlerRegistry::bind_class`].
    #[must_use]
    pub fn bind_class<T: 'static>(mut self, handler: impl ClassHandler<T> + 'static) -> Self {
        self.handlers.bind_class::<T>(handler);
        self
    }

    #[must_use]
    pub fn build(self) -> Mapper {
        Mapper::with_handlers(self.config, self.handlers)
    }
}

static GLOBAL: LazyLock<Mapper> = LazyLock::new(|| {
    observability::describe_metrics();
    match config::load_config() {
        Ok(builder) => Mapper::new(builder.build()),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring invalid rowbind configuration");
            Mapper::default()
        }
    }
});

/// The process-wide mapper, configured on first use from `rowbind.toml`
/// (see [`config::find_config_file`]) and `ROWBIND_*` variables.
#[must_use]
pub fn global() -> &'static Mapper {
    &GLOBAL
}
