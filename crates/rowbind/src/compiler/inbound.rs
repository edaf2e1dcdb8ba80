//! Row-to-object routines.

use std::sync::Arc;
use std::time::Instant;

use crate::coercion::{Conversion, InvalidEnumValueHandling};
use crate::config::MapperConfig;
use crate::descriptor::{Construct, Factory, Setter, TypeDescriptor};
use crate::handler::{ClassHandler, HandlerContext, HandlerRegistry, Phase, PropertyHandler};
use crate::schema::{ColumnDescriptor, CursorShape, unquote};
use crate::traits::Cursor;
use crate::traits::cursor::{CellReader, reader_for};
use crate::types::{DbType, DbValue, FieldType, ValueKind};
use crate::{MappingError, Result};

use super::names_match;

/// Maps the current row of a cursor to a `T`.
pub type RowToObject<T> = Arc<dyn Fn(&dyn Cursor) -> Result<T> + Send + Sync>;

enum Slot<T> {
    /// Constructor argument at this position.
    Arg(usize),
    /// Assigned after construction.
    Assign(Setter<T>),
}

/// One member bound to one column.
struct Binding<T> {
    column: String,
    ordinal: usize,
    check_null: bool,
    read: CellReader,
    conversion: Conversion,
    handler: Option<Arc<dyn PropertyHandler>>,
    /// Member kind the handler output is coerced to.
    kind: ValueKind,
    member: String,
    /// `Type.member`, for coercion errors.
    context: String,
    slot: Slot<T>,
}

enum Creation<T> {
    Construct { build: Construct<T>, arity: usize },
    Factory(Factory<T>),
}

/// A member that may bind: a constructor parameter or a writable property.
struct Candidate<'a, T> {
    member: &'a str,
    mapped: &'a str,
    field_type: FieldType,
    storage: Option<DbType>,
    handler: Option<Arc<dyn PropertyHandler>>,
    slot: Slot<T>,
}

fn find_column<'s>(
    shape: &'s CursorShape,
    mapped: &str,
    ignore_underscores: bool,
) -> Option<&'s ColumnDescriptor> {
    let columns = shape.columns();
    columns
        .iter()
        .find(|c| unquote(&c.name) == mapped)
        .or_else(|| {
            columns
                .iter()
                .find(|c| names_match(unquote(&c.name), mapped, false))
        })
        .or_else(|| {
            ignore_underscores
                .then(|| {
                    columns
                        .iter()
                        .find(|c| names_match(unquote(&c.name), mapped, true))
                })
                .flatten()
        })
}

/// Build a routine mapping rows of `shape` to `T`.
///
/// Constructor parameters bind first, then writable properties the
/// constructor does not cover. A member binds to the first column whose name
/// equals its mapped name, else the first that matches ignoring case, else
/// (when enabled) ignoring underscores too. Columns nobody binds are ignored;
/// members no column feeds keep their default.
///
/// # Errors
///
/// - unsupported coercion when a column cannot become its member's type
/// - no bindable members when nothing matched
/// - no constructor when `T` has neither a constructor nor a default factory
pub fn build_row_to_object<T: 'static>(
    descriptor: &TypeDescriptor<T>,
    shape: &CursorShape,
    config: &MapperConfig,
    handlers: &HandlerRegistry,
) -> Result<RowToObject<T>> {
    let started = Instant::now();
    let type_name: Arc<str> = Arc::from(descriptor.type_name());

    let mut candidates = Vec::new();
    if let Some(ctor) = descriptor.constructor() {
        for (position, param) in ctor.params().iter().enumerate() {
            let property = descriptor.property(param.name());
            candidates.push(Candidate {
                member: param.name(),
                mapped: param.mapped_name(),
                field_type: param.field_type(),
                storage: property.and_then(|p| p.storage_type()),
                handler: property.and_then(|p| handlers.resolve_property(p)),
                slot: Slot::Arg(position),
            });
        }
    }
    for property in descriptor.properties() {
        let covered = descriptor
            .constructor()
            .is_some_and(|ctor| ctor.covers(property.name()));
        let Some(setter) = property.setter() else {
            continue;
        };
        if covered {
            continue;
        }
        candidates.push(Candidate {
            member: property.name(),
            mapped: property.mapped_name(),
            field_type: property.field_type(),
            storage: property.storage_type(),
            handler: handlers.resolve_property(property),
            slot: Slot::Assign(Arc::clone(setter)),
        });
    }

    let mut bindings = Vec::new();
    for candidate in candidates {
        let Some(column) = find_column(shape, candidate.mapped, config.match_names_with_underscores)
        else {
            continue;
        };

        let context = format!("{type_name}.{}", candidate.member);
        let kind = candidate.field_type.kind();
        // A handled member is read as its storage type and handed over as
        // that; the handler output is coerced to the member kind afterwards.
        let intermediate = match (&candidate.handler, candidate.storage) {
            (Some(_), Some(storage)) => ValueKind::Scalar(storage),
            _ => kind,
        };
        let conversion = Conversion::resolve(
            ValueKind::Scalar(column.db_type),
            intermediate,
            config.enum_handling,
            &context,
        )?;

        bindings.push(Binding {
            column: column.name.clone(),
            ordinal: column.ordinal,
            check_null: column.nullable,
            read: reader_for(column.db_type),
            conversion,
            handler: candidate.handler,
            kind,
            member: candidate.member.to_string(),
            context,
            slot: candidate.slot,
        });
    }

    if bindings.is_empty() {
        return Err(MappingError::no_bindable_members(&*type_name));
    }

    let creation = match (descriptor.constructor(), descriptor.default_factory()) {
        (Some(ctor), _) => Creation::Construct {
            build: Arc::clone(ctor.build_fn()),
            arity: ctor.params().len(),
        },
        (None, Some(factory)) => Creation::Factory(Arc::clone(factory)),
        (None, None) => return Err(MappingError::no_constructor(&*type_name)),
    };
    let class_handler = handlers.class_handler::<T>();

    tracing::debug!(
        routine.kind = "row_to_object",
        routine.target = %type_name,
        columns = shape.len(),
        bound = bindings.len(),
        duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        "row routine built"
    );

    let routine = RowRoutine {
        type_name,
        policy: config.enum_handling,
        bindings,
        creation,
        class_handler,
    };
    Ok(Arc::new(move |cursor: &dyn Cursor| routine.map(cursor)))
}

struct RowRoutine<T> {
    type_name: Arc<str>,
    policy: InvalidEnumValueHandling,
    bindings: Vec<Binding<T>>,
    creation: Creation<T>,
    class_handler: Option<Arc<dyn ClassHandler<T>>>,
}

impl<T> RowRoutine<T> {
    fn map(&self, cursor: &dyn Cursor) -> Result<T> {
        let mut instance = match &self.creation {
            Creation::Construct { build, arity } => {
                let mut args = vec![DbValue::Null; *arity];
                for binding in &self.bindings {
                    if let Slot::Arg(position) = binding.slot {
                        args[position] = self.fetch(binding, cursor)?;
                    }
                }
                build(args)?
            }
            Creation::Factory(factory) => factory(),
        };

        for binding in &self.bindings {
            if let Slot::Assign(setter) = &binding.slot {
                let value = self.fetch(binding, cursor)?;
                setter(&mut instance, value)
                    .map_err(|e| e.in_column(&format!("{}.{}", self.type_name, binding.member)))?;
            }
        }

        match &self.class_handler {
            Some(handler) => {
                let ctx = HandlerContext {
                    field: "",
                    declaring_type: &self.type_name,
                    property: "",
                    phase: Phase::Read,
                };
                handler
                    .get(instance, &ctx)?
                    .ok_or_else(|| MappingError::null_hook_result(&*self.type_name))
            }
            None => Ok(instance),
        }
    }

    /// Null test, read, coerce, then hand to the handler and cast its
    /// output to the member kind.
    fn fetch(&self, binding: &Binding<T>, cursor: &dyn Cursor) -> Result<DbValue> {
        let at = |e: MappingError| e.in_column(&binding.column);

        let is_null = binding.check_null && cursor.is_null(binding.ordinal).map_err(at)?;
        let value = if is_null {
            DbValue::Null
        } else {
            let raw = (binding.read)(cursor, binding.ordinal).map_err(at)?;
            binding.conversion.apply(raw).map_err(at)?
        };

        let Some(handler) = &binding.handler else {
            return Ok(value);
        };
        let ctx = HandlerContext {
            field: &binding.column,
            declaring_type: &self.type_name,
            property: &binding.member,
            phase: Phase::Read,
        };
        let handled = handler.get(value, &ctx)?;
        Conversion::coerce(handled, binding.kind, self.policy, &binding.context).map_err(at)
    }
}
