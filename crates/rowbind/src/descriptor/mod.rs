//! Per-type record metadata.
//!
//! A [`TypeDescriptor`] lists the properties of a record type, its preferred
//! constructor and default factory. Descriptors are supplied by the
//! [`Record`] trait (usually via [`record!`](crate::record)) and memoized
//! process-wide by [`describe`].

mod cache;
mod record;

pub use cache::describe;
pub use record::Record;

use std::fmt;
use std::sync::Arc;

use crate::Result;
use crate::handler::PropertyHandler;
use crate::types::{DbType, DbValue, FieldType, FieldValue};

/// Reads a property as a [`DbValue`].
pub type Getter<T> = Arc<dyn Fn(&T) -> DbValue + Send + Sync>;

/// Assigns a property from a [`DbValue`] already coerced to its kind.
pub type Setter<T> = Arc<dyn Fn(&mut T, DbValue) -> Result<()> + Send + Sync>;

/// Builds an instance from constructor arguments, in parameter order.
pub type Construct<T> = Arc<dyn Fn(Vec<DbValue>) -> Result<T> + Send + Sync>;

/// Creates a default instance to assign properties on.
pub type Factory<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// One property of a record type.
pub struct PropertyDescriptor<T> {
    name: String,
    mapped_name: String,
    field_type: FieldType,
    storage_type: Option<DbType>,
    handler: Option<Arc<dyn PropertyHandler>>,
    getter: Getter<T>,
    setter: Option<Setter<T>>,
}

impl<T: 'static> PropertyDescriptor<T> {
    /// A readable and writable property backed by a field of type `V`.
    ///
    /// ```rust
    /// use rowbind::PropertyDescriptor;
    ///
    /// #[derive(Default)]
    /// struct User {
    ///     id: i32,
    /// }
    ///
    /// let p = PropertyDescriptor::field("id", |u: &User| &u.id, |u: &mut User, v| u.id = v)
    ///     .mapped_as("UserId");
    /// assert_eq!(p.mapped_name(), "UserId");
    /// ```
    pub fn field<V, G, S>(name: impl Into<String>, get: G, set: S) -> Self
    where
        V: FieldValue,
        G: Fn(&T) -> &V + Send + Sync + 'static,
        S: Fn(&mut T, V) + Send + Sync + 'static,
    {
        let mut property = Self::read_only(name, get);
        property.setter = Some(Arc::new(move |instance: &mut T, value: DbValue| {
            set(instance, V::from_db(value)?);
            Ok(())
        }));
        property
    }

    /// A property that is only read, for outbound statements or to feed a
    /// constructor parameter of the same name.
    pub fn read_only<V, G>(name: impl Into<String>, get: G) -> Self
    where
        V: FieldValue,
        G: Fn(&T) -> &V + Send + Sync + 'static,
    {
        let name = name.into();
        Self {
            mapped_name: name.clone(),
            name,
            field_type: V::field_type(),
            storage_type: None,
            handler: None,
            getter: Arc::new(move |instance: &T| get(instance).to_db()),
            setter: None,
        }
    }

    /// Override the external column or parameter name.
    #[must_use]
    pub fn mapped_as(mut self, name: impl Into<String>) -> Self {
        self.mapped_name = name.into();
        self
    }

    /// Attach a handler to this property.
    #[must_use]
    pub fn with_handler(mut self, handler: impl PropertyHandler + 'static) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }

    /// Declare the storage type the value is kept as.
    ///
    /// Outbound, it is the parameter type when no physical field says
    /// otherwise. For handled properties it is also the type the cell is
    /// coerced to before the handler sees it.
    #[must_use]
    pub const fn stored_as(mut self, db_type: DbType) -> Self {
        self.storage_type = Some(db_type);
        self
    }
}

impl<T> PropertyDescriptor<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mapped_name(&self) -> &str {
        &self.mapped_name
    }

    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }

    #[must_use]
    pub const fn storage_type(&self) -> Option<DbType> {
        self.storage_type
    }

    #[must_use]
    pub const fn handler(&self) -> Option<&Arc<dyn PropertyHandler>> {
        self.handler.as_ref()
    }

    #[must_use]
    pub const fn getter(&self) -> &Getter<T> {
        &self.getter
    }

    #[must_use]
    pub const fn setter(&self) -> Option<&Setter<T>> {
        self.setter.as_ref()
    }

    #[must_use]
    pub const fn is_writable(&self) -> bool {
        self.setter.is_some()
    }
}

impl<T> fmt::Debug for PropertyDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("mapped_name", &self.mapped_name)
            .field("kind", &self.field_type.kind())
            .field("nullable", &self.field_type.is_nullable())
            .field("storage_type", &self.storage_type)
            .field("handler", &self.handler.is_some())
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

/// One constructor parameter.
#[derive(Debug, Clone)]
pub struct ParamDescriptor {
    name: String,
    mapped_name: Option<String>,
    field_type: FieldType,
}

impl ParamDescriptor {
    /// A parameter of type `V`.
    #[must_use]
    pub fn of<V: FieldValue>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mapped_name: None,
            field_type: V::field_type(),
        }
    }

    /// Override the external column name. Without an override the mapped
    /// name of the same-named property is used, else the parameter name.
    #[must_use]
    pub fn mapped_as(mut self, name: impl Into<String>) -> Self {
        self.mapped_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn mapped_name(&self) -> &str {
        self.mapped_name.as_deref().unwrap_or(&self.name)
    }

    #[must_use]
    pub const fn field_type(&self) -> FieldType {
        self.field_type
    }
}

/// A constructor: parameters plus the function that calls it.
pub struct ConstructorDescriptor<T> {
    params: Vec<ParamDescriptor>,
    build: Construct<T>,
}

impl<T> ConstructorDescriptor<T> {
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    #[must_use]
    pub const fn build_fn(&self) -> &Construct<T> {
        &self.build
    }

    /// Returns true if some parameter has the given name, ignoring ASCII case.
    #[must_use]
    pub fn covers(&self, property: &str) -> bool {
        self.params
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(property))
    }
}

impl<T> fmt::Debug for ConstructorDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Metadata of a record type. Immutable once built.
pub struct TypeDescriptor<T> {
    type_name: String,
    properties: Vec<PropertyDescriptor<T>>,
    constructor: Option<ConstructorDescriptor<T>>,
    default_factory: Option<Factory<T>>,
}

impl<T: 'static> TypeDescriptor<T> {
    /// Start describing a type.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> TypeDescriptorBuilder<T> {
        TypeDescriptorBuilder {
            type_name: type_name.into(),
            properties: Vec::new(),
            constructors: Vec::new(),
            default_factory: None,
        }
    }
}

impl<T> TypeDescriptor<T> {
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor<T>] {
        &self.properties
    }

    /// Find a property by name, ignoring ASCII case.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor<T>> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .or_else(|| self.properties.iter().find(|p| p.name.eq_ignore_ascii_case(name)))
    }

    /// The constructor with the most parameters, if any was declared.
    #[must_use]
    pub const fn constructor(&self) -> Option<&ConstructorDescriptor<T>> {
        self.constructor.as_ref()
    }

    #[must_use]
    pub const fn default_factory(&self) -> Option<&Factory<T>> {
        self.default_factory.as_ref()
    }

    /// Returns true if the type declares no properties and no constructor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.constructor.is_none()
    }
}

impl<T> fmt::Debug for TypeDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties)
            .field("constructor", &self.constructor)
            .field("default_factory", &self.default_factory.is_some())
            .finish()
    }
}

/// Builder for [`TypeDescriptor`].
pub struct TypeDescriptorBuilder<T> {
    type_name: String,
    properties: Vec<PropertyDescriptor<T>>,
    constructors: Vec<ConstructorDescriptor<T>>,
    default_factory: Option<Factory<T>>,
}

impl<T> fmt::Debug for TypeDescriptorBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptorBuilder")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties.len())
            .field("constructors", &self.constructors.len())
            .finish_non_exhaustive()
    }
}

impl<T: 'static> TypeDescriptorBuilder<T> {
    #[must_use]
    pub fn property(mut self, property: PropertyDescriptor<T>) -> Self {
        self.properties.push(property);
        self
    }

    /// Declare a constructor. When several are declared the one with the
    /// most parameters wins; the first declared wins a tie.
    #[must_use]
    pub fn constructor<F>(mut self, params: Vec<ParamDescriptor>, build: F) -> Self
    where
        F: Fn(Vec<DbValue>) -> Result<T> + Send + Sync + 'static,
    {
        self.constructors.push(ConstructorDescriptor {
            params,
            build: Arc::new(build),
        });
        self
    }

    #[must_use]
    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.default_factory = Some(Arc::new(factory));
        self
    }

    /// Use [`Default`] as the factory.
    #[must_use]
    pub fn default_construct(self) -> Self
    where
        T: Default,
    {
        self.default_factory(T::default)
    }

    /// Finish the descriptor.
    ///
    /// Constructor parameters without an explicit mapped name take the
    /// mapped name of the property with the same case-insensitive name.
    #[must_use]
    pub fn build(self) -> TypeDescriptor<T> {
        let Self {
            type_name,
            properties,
            constructors,
            default_factory,
        } = self;

        let mut constructor = None::<ConstructorDescriptor<T>>;
        for candidate in constructors {
            if constructor
                .as_ref()
                .is_none_or(|best| candidate.params.len() > best.params.len())
            {
                constructor = Some(candidate);
            }
        }

        if let Some(ctor) = constructor.as_mut() {
            for param in &mut ctor.params {
                if param.mapped_name.is_some() {
                    continue;
                }
                if let Some(prop) = properties
                    .iter()
                    .find(|p| p.name.eq_ignore_ascii_case(&param.name))
                    && prop.mapped_name != prop.name
                {
                    param.mapped_name = Some(prop.mapped_name.clone());
                }
            }
        }

        TypeDescriptor {
            type_name,
            properties,
            constructor,
            default_factory,
        }
    }
}
