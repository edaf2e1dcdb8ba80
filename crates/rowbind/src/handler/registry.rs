//! Handler bindings.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{ClassHandler, PropertyHandler};
use crate::descriptor::PropertyDescriptor;
use crate::types::FieldValue;

/// Handlers bound outside the record descriptors.
///
/// Property bindings are keyed by declaring type and case-insensitive
/// property name; type-wide bindings by the declared Rust type of the
/// property (`Option<T>` and `T` are distinct). A registry is consulted only
/// while a routine is built.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    properties: HashMap<(TypeId, String), Arc<dyn PropertyHandler>>,
    types: HashMap<TypeId, Arc<dyn PropertyHandler>>,
    classes: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `handler` to one property of `T`. Replaces any earlier binding.
    pub fn bind_property<T: 'static>(
        &mut self,
        property: &str,
        handler: impl PropertyHandler + 'static,
    ) {
        self.properties.insert(
            (TypeId::of::<T>(), property.to_ascii_lowercase()),
            Arc::new(handler),
        );
    }

    /// Bind `handler` to every property declared as `V`.
    pub fn bind_type<V: FieldValue>(&mut self, handler: impl PropertyHandler + 'static) {
        self.types
            .insert(V::field_type().type_id(), Arc::new(handler));
    }

    /// Bind an instance-level handler for `T`.
    pub fn bind_class<T: 'static>(&mut self, handler: impl ClassHandler<T> + 'static) {
        let handler: Arc<dyn ClassHandler<T>> = Arc::new(handler);
        self.classes.insert(TypeId::of::<T>(), Arc::new(handler));
    }

    /// The handler that runs for `property` of `T`, if any.
    #[must_use]
    pub fn resolve_property<T: 'static>(
        &self,
        property: &PropertyDescriptor<T>,
    ) -> Option<Arc<dyn PropertyHandler>> {
        self.properties
            .get(&(TypeId::of::<T>(), property.name().to_ascii_lowercase()))
            .or_else(|| property.handler())
            .or_else(|| self.types.get(&property.field_type().type_id()))
            .cloned()
    }

    /// The instance-level handler for `T`, if any.
    #[must_use]
    pub fn class_handler<T: 'static>(&self) -> Option<Arc<dyn ClassHandler<T>>> {
        self.classes
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn ClassHandler<T>>>())
            .cloned()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.types.is_empty() && self.classes.is_empty()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("properties", &self.properties.len())
            .field("types", &self.types.len())
            .field("classes", &self.classes.len())
            .finish()
    }
}
