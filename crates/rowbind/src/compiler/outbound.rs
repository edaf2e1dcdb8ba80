//! Objects-to-parameters routines.
//!
//! A routine built for batch size N writes, for every instance slot `i` and
//! every field, one parameter named `<prefix><field>` for slot 0 and
//! `<prefix><field>_<i>` after that. All parameters are computed first; the
//! sink is cleared and filled only once every value converted, so a failing
//! batch never leaves half-written parameters behind.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::coercion::{Conversion, InvalidEnumValueHandling, zero};
use crate::config::MapperConfig;
use crate::descriptor::{Getter, PropertyDescriptor, TypeDescriptor};
use crate::handler::{ClassHandler, HandlerContext, HandlerRegistry, Phase, PropertyHandler};
use crate::traits::{CommandSink, Parameter, ParameterDirection};
use crate::types::{DbType, DbValue, ValueKind};
use crate::{MappingError, Result};

use super::OutboundField;

/// Writes a batch of `T` instances to a command's parameters.
pub type ObjectsToParameters<T> =
    Arc<dyn Fn(&mut dyn CommandSink, &[T]) -> Result<()> + Send + Sync>;

/// A string-keyed outbound source.
pub type ParameterMap = BTreeMap<String, DbValue>;

/// Writes a batch of [`ParameterMap`]s to a command's parameters.
pub type MapsToParameters =
    Arc<dyn Fn(&mut dyn CommandSink, &[ParameterMap]) -> Result<()> + Send + Sync>;

/// Parameter metadata shared by both routine flavours.
#[derive(Debug, Clone)]
struct Slot {
    field: String,
    direction: ParameterDirection,
    size: Option<u32>,
    precision: Option<u8>,
    scale: Option<u8>,
    /// NULL becomes zero of this type.
    zero_fill: Option<DbValue>,
}

impl Slot {
    fn new(field: &OutboundField, target: Option<DbType>) -> Result<Self> {
        let physical = field.physical.as_ref();
        let keeps_null = field.direction.is_output() || physical.is_some_and(|p| p.is_identity);
        let zero_fill = match (physical, target) {
            (Some(p), Some(t)) if !p.is_nullable && t.is_numeric() && !keeps_null => Some(zero(t)?),
            _ => None,
        };
        Ok(Self {
            field: field.name.clone(),
            direction: field.direction,
            size: physical.and_then(|p| p.size),
            precision: physical.and_then(|p| p.precision),
            scale: physical.and_then(|p| p.scale),
            zero_fill,
        })
    }

    fn name(&self, prefix: &str, index: usize) -> String {
        if index == 0 {
            format!("{prefix}{}", self.field)
        } else {
            format!("{prefix}{}_{index}", self.field)
        }
    }

    fn fill(&self, value: DbValue) -> DbValue {
        match (&self.zero_fill, value) {
            (Some(zero), DbValue::Null) => zero.clone(),
            (_, value) => value,
        }
    }

    fn parameter(
        &self,
        sink: &dyn CommandSink,
        prefix: &str,
        index: usize,
        value: DbValue,
        db_type: Option<DbType>,
    ) -> Parameter {
        let mut parameter = sink.create_parameter();
        parameter.name = self.name(prefix, index);
        parameter.value = self.fill(value);
        parameter.direction = self.direction;
        parameter.size = self.size;
        parameter.precision = self.precision;
        parameter.scale = self.scale;
        parameter.db_type = db_type;
        parameter
    }
}

struct FieldPlan<T> {
    slot: Slot,
    member: String,
    getter: Getter<T>,
    handler: Option<Arc<dyn PropertyHandler>>,
    conversion: Conversion,
    target: DbType,
    /// `Type.property`, for coercion errors.
    context: String,
    /// Type name to pass enum values under when the sink stores enums natively.
    native_enum: Option<String>,
}

fn find_property<'d, T>(
    descriptor: &'d TypeDescriptor<T>,
    field: &str,
) -> Option<&'d PropertyDescriptor<T>> {
    let properties = descriptor.properties();
    properties
        .iter()
        .find(|p| p.mapped_name() == field)
        .or_else(|| properties.iter().find(|p| p.name() == field))
        .or_else(|| {
            properties.iter().find(|p| {
                p.mapped_name().eq_ignore_ascii_case(field) || p.name().eq_ignore_ascii_case(field)
            })
        })
}

fn check_batch_size(batch_size: usize) -> Result<()> {
    if batch_size == 0 {
        return Err(MappingError::invalid_config("batch size must be at least 1"));
    }
    Ok(())
}

fn effective_prefix<'a>(configured: Option<&'a str>, sink: &'a dyn CommandSink) -> &'a str {
    configured.unwrap_or_else(|| sink.parameter_prefix())
}

/// Replace the sink's parameters. A sink that rejects one is cleared again,
/// so it never keeps part of a batch.
fn flush(sink: &mut dyn CommandSink, parameters: Vec<Parameter>) -> Result<()> {
    sink.clear_parameters();
    for parameter in parameters {
        if let Err(e) = sink.add_parameter(parameter) {
            sink.clear_parameters();
            return Err(e);
        }
    }
    Ok(())
}

/// Build a routine writing `fields` of `batch_size` instances of `T`.
///
/// Each field names a property by mapped name or property name (exact match
/// first, then ignoring case). The parameter type is the physical field's
/// type when given, else the property's storage type, else its natural type;
/// enums go out as their underlying integer unless a physical type says
/// otherwise. Enums go out natively to sinks that support it, unless a
/// physical or storage type names a scalar column. A handled property's value
/// goes to the handler's `set` as is, and the handler output is coerced to
/// the parameter type.
///
/// # Errors
///
/// - property not found when a field names no property of `T`
/// - unsupported coercion when a property cannot become its parameter type
/// - invalid configuration when `batch_size` is zero
pub fn build_objects_to_parameters<T: 'static>(
    descriptor: &TypeDescriptor<T>,
    fields: &[OutboundField],
    batch_size: usize,
    config: &MapperConfig,
    handlers: &HandlerRegistry,
) -> Result<ObjectsToParameters<T>> {
    let started = Instant::now();
    check_batch_size(batch_size)?;
    let type_name: Arc<str> = Arc::from(descriptor.type_name());

    let mut plans = Vec::with_capacity(fields.len());
    for field in fields {
        let property = find_property(descriptor, &field.name)
            .ok_or_else(|| MappingError::property_not_found(&field.name, &*type_name))?;
        let kind = property.field_type().kind();
        let declared = field
            .physical
            .as_ref()
            .and_then(|p| p.db_type)
            .or(property.storage_type());
        let target = declared.unwrap_or_else(|| kind.db_type());
        let handler = handlers.resolve_property(property);

        let context = format!("{type_name}.{}", property.name());
        let conversion = if handler.is_some() {
            Conversion::Identity
        } else {
            Conversion::resolve(kind, ValueKind::Scalar(target), config.enum_handling, &context)?
        };
        let native_enum = match (kind, &handler, declared) {
            (ValueKind::Enum(info), None, None) => Some(
                field
                    .physical
                    .as_ref()
                    .and_then(|p| p.database_type.clone())
                    .unwrap_or_else(|| info.name.to_string()),
            ),
            _ => None,
        };

        plans.push(FieldPlan {
            slot: Slot::new(field, Some(target))?,
            member: property.name().to_string(),
            getter: Arc::clone(property.getter()),
            handler,
            conversion,
            target,
            context,
            native_enum,
        });
    }

    tracing::debug!(
        routine.kind = "objects_to_parameters",
        routine.target = %type_name,
        fields = plans.len(),
        batch_size,
        duration_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX),
        "parameter routine built"
    );

    let routine = ObjectRoutine {
        type_name,
        plans,
        batch_size,
        prefix: config.parameter_prefix.clone(),
        policy: config.enum_handling,
        class_handler: handlers.class_handler::<T>(),
    };
    Ok(Arc::new(move |sink: &mut dyn CommandSink, instances: &[T]| {
        routine.write(sink, instances)
    }))
}

struct ObjectRoutine<T> {
    type_name: Arc<str>,
    plans: Vec<FieldPlan<T>>,
    batch_size: usize,
    prefix: Option<String>,
    policy: InvalidEnumValueHandling,
    class_handler: Option<Arc<dyn ClassHandler<T>>>,
}

impl<T> ObjectRoutine<T> {
    fn write(&self, sink: &mut dyn CommandSink, instances: &[T]) -> Result<()> {
        if instances.len() != self.batch_size {
            return Err(MappingError::batch_size_mismatch(self.batch_size, instances.len()));
        }

        if let Some(handler) = &self.class_handler {
            let ctx = HandlerContext {
                field: "",
                declaring_type: &self.type_name,
                property: "",
                phase: Phase::Write,
            };
            for instance in instances {
                handler.set(instance, &ctx)?;
            }
        }

        let parameters = {
            let sink: &dyn CommandSink = sink;
            let prefix = effective_prefix(self.prefix.as_deref(), sink);
            let native = sink.supports_native_enums();

            let mut parameters = Vec::with_capacity(self.plans.len() * instances.len());
            for (index, instance) in instances.iter().enumerate() {
                for plan in &self.plans {
                    let value = (plan.getter)(instance);
                    let parameter = match (&plan.native_enum, value) {
                        (Some(type_name), value @ DbValue::Enum(_)) if native => {
                            let mut p = plan.slot.parameter(sink, prefix, index, value, None);
                            p.type_name = Some(type_name.clone());
                            p
                        }
                        (_, value) => {
                            let value = self.convert(plan, value)?;
                            plan.slot
                                .parameter(sink, prefix, index, value, Some(plan.target))
                        }
                    };
                    parameters.push(parameter);
                }
            }
            parameters
        };

        flush(sink, parameters)
    }

    fn convert(&self, plan: &FieldPlan<T>, value: DbValue) -> Result<DbValue> {
        let at = |e: MappingError| e.in_column(&plan.slot.field);
        let Some(handler) = &plan.handler else {
            return plan.conversion.apply(value).map_err(at);
        };
        let ctx = HandlerContext {
            field: &plan.slot.field,
            declaring_type: &self.type_name,
            property: &plan.member,
            phase: Phase::Write,
        };
        let handled = handler.set(value, &ctx)?;
        Conversion::coerce(handled, ValueKind::Scalar(plan.target), self.policy, &plan.context)
            .map_err(at)
    }
}

/// Build a routine writing `fields` of `batch_size` string-keyed maps.
///
/// Keys are looked up exactly, then ignoring case. Values are coerced to
/// the physical field type when one is given; otherwise they are written as
/// they are, except enums, which become their underlying integer unless the
/// sink stores enums natively.
///
/// # Errors
///
/// Returns invalid configuration when `batch_size` is zero. Missing keys
/// and unconvertible values are reported when the routine runs.
pub fn build_maps_to_parameters(
    fields: &[OutboundField],
    batch_size: usize,
    config: &MapperConfig,
) -> Result<MapsToParameters> {
    check_batch_size(batch_size)?;

    let plans = fields
        .iter()
        .map(|field| {
            let target = field.physical.as_ref().and_then(|p| p.db_type);
            Ok(MapPlan {
                slot: Slot::new(field, target)?,
                target,
                database_type: field.physical.as_ref().and_then(|p| p.database_type.clone()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::debug!(
        routine.kind = "objects_to_parameters",
        routine.target = "dictionary",
        fields = plans.len(),
        batch_size,
        "parameter routine built"
    );

    let routine = MapRoutine {
        plans,
        batch_size,
        prefix: config.parameter_prefix.clone(),
        policy: config.enum_handling,
    };
    Ok(Arc::new(move |sink: &mut dyn CommandSink, instances: &[ParameterMap]| {
        routine.write(sink, instances)
    }))
}

struct MapPlan {
    slot: Slot,
    target: Option<DbType>,
    database_type: Option<String>,
}

struct MapRoutine {
    plans: Vec<MapPlan>,
    batch_size: usize,
    prefix: Option<String>,
    policy: InvalidEnumValueHandling,
}

impl MapRoutine {
    fn write(&self, sink: &mut dyn CommandSink, instances: &[ParameterMap]) -> Result<()> {
        if instances.len() != self.batch_size {
            return Err(MappingError::batch_size_mismatch(self.batch_size, instances.len()));
        }

        let parameters = {
            let sink: &dyn CommandSink = sink;
            let prefix = effective_prefix(self.prefix.as_deref(), sink);
            let native = sink.supports_native_enums();

            let mut parameters = Vec::with_capacity(self.plans.len() * instances.len());
            for (index, instance) in instances.iter().enumerate() {
                for plan in &self.plans {
                    let value = lookup(instance, &plan.slot.field)?.clone();
                    let parameter = match value {
                        DbValue::Enum(e) if native && plan.target.is_none() => {
                            let mut p =
                                plan.slot.parameter(sink, prefix, index, DbValue::Enum(e), None);
                            p.type_name = Some(
                                plan.database_type
                                    .clone()
                                    .unwrap_or_else(|| e.info.name.to_string()),
                            );
                            p
                        }
                        value => {
                            let (value, db_type) = self.convert(plan, value)?;
                            plan.slot.parameter(sink, prefix, index, value, db_type)
                        }
                    };
                    parameters.push(parameter);
                }
            }
            parameters
        };

        flush(sink, parameters)
    }

    fn convert(&self, plan: &MapPlan, value: DbValue) -> Result<(DbValue, Option<DbType>)> {
        let Some(source) = ValueKind::of(&value) else {
            return Ok((value, plan.target));
        };
        let target = plan.target.unwrap_or_else(|| source.db_type());
        let conversion = Conversion::resolve(
            source,
            ValueKind::Scalar(target),
            self.policy,
            &format!("dictionary.{}", plan.slot.field),
        )?;
        let value = conversion
            .apply(value)
            .map_err(|e| e.in_column(&plan.slot.field))?;
        Ok((value, Some(target)))
    }
}

fn lookup<'m>(map: &'m ParameterMap, field: &str) -> Result<&'m DbValue> {
    map.get(field)
        .or_else(|| {
            map.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(field))
                .map(|(_, value)| value)
        })
        .ok_or_else(|| MappingError::property_not_found(field, "dictionary"))
}
