use std::any::{Any, TypeId};
use std::borrow::Cow;
use std::fmt;

use serde_json::{Map, Value};

use crate::MarshalError;
use crate::registry::{Direction, Registry};

// -----------------------------------------------------------------------------
// Erased hooks

/// Reads one field out of an erased instance and runs its scheme's serializer.
pub(crate) type PropertySerializeFn =
    Box<dyn Fn(&Registry, &dyn Any) -> Result<Value, MarshalError> + Send + Sync>;

/// Runs one field's scheme deserializer and stores the result into an erased
/// instance.
pub(crate) type PropertyDeserializeFn =
    Box<dyn Fn(&Registry, &mut dyn Any, &Value) -> Result<(), MarshalError> + Send + Sync>;

/// A captured `Default` impl, stored type-erased.
pub(crate) type ConstructFn = Box<dyn Fn() -> Box<dyn Any> + Send + Sync>;

/// A caller-supplied deserialization factory, stored type-erased.
pub(crate) type FactoryFn =
    Box<dyn Fn(&Registry, &Value) -> Result<Box<dyn Any>, MarshalError> + Send + Sync>;

/// A caller-supplied post-deserialize hook, stored type-erased.
pub(crate) type PostDeserializeFn = Box<dyn Fn(&mut dyn Any) + Send + Sync>;

pub(crate) type ParentSerializeFn =
    Box<dyn Fn(&Registry, &dyn Any) -> Result<Map<String, Value>, MarshalError> + Send + Sync>;

pub(crate) type ParentDeserializeFn =
    Box<dyn Fn(&Registry, &mut dyn Any, &Value) -> Result<(), MarshalError> + Send + Sync>;

/// Recovers the concrete instance behind the erased walk.
pub(crate) fn downcast_instance_ref<T: 'static>(
    instance: &dyn Any,
) -> Result<&T, MarshalError> {
    instance
        .downcast_ref::<T>()
        .ok_or_else(|| MarshalError::MismatchedInstance {
            expected: Cow::Borrowed(std::any::type_name::<T>()),
        })
}

pub(crate) fn downcast_instance_mut<T: 'static>(
    instance: &mut dyn Any,
) -> Result<&mut T, MarshalError> {
    instance
        .downcast_mut::<T>()
        .ok_or_else(|| MarshalError::MismatchedInstance {
            expected: Cow::Borrowed(std::any::type_name::<T>()),
        })
}

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// Registered metadata for one serializable field of a type.
///
/// Created through [`Registry::register_property`]; immutable thereafter.
/// Re-registering the same serialized name replaces the descriptor in place.
///
/// [`Registry::register_property`]: crate::Registry::register_property
pub struct PropertyDescriptor {
    pub(crate) property_name: Cow<'static, str>,
    pub(crate) serialized_name: Cow<'static, str>,
    pub(crate) direction: Direction,
    pub(crate) serialize: PropertySerializeFn,
    pub(crate) deserialize: PropertyDeserializeFn,
}

impl PropertyDescriptor {
    /// The field's identifier in the runtime type.
    #[inline]
    pub fn property_name(&self) -> &str {
        &self.property_name
    }

    /// The key used in the JSON representation.
    ///
    /// Defaults to the property name.
    #[inline]
    pub fn serialized_name(&self) -> &str {
        &self.serialized_name
    }

    /// Which marshalling directions this property participates in.
    #[inline]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[inline]
    pub(crate) fn serialize(
        &self,
        registry: &Registry,
        instance: &dyn Any,
    ) -> Result<Value, MarshalError> {
        (self.serialize)(registry, instance)
    }

    #[inline]
    pub(crate) fn deserialize(
        &self,
        registry: &Registry,
        instance: &mut dyn Any,
        raw: &Value,
    ) -> Result<(), MarshalError> {
        (self.deserialize)(registry, instance, raw)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("property_name", &self.property_name)
            .field("serialized_name", &self.serialized_name)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// ParentLink

/// An explicit declared parent type, stored at registration time.
///
/// Rust has no inheritance, so "Derived extends Base" is declared as an
/// embedded parent value plus projections to it. The marshalling core applies
/// the parent's descriptors through these projections before the child's own
/// properties, which is what lets a re-declared serialized name resolve to
/// the most derived value.
pub struct ParentLink {
    parent_type_name: &'static str,
    serialize: ParentSerializeFn,
    deserialize: ParentDeserializeFn,
}

impl ParentLink {
    pub(crate) fn new<T, P>(project: fn(&T) -> &P, project_mut: fn(&mut T) -> &mut P) -> Self
    where
        T: 'static,
        P: 'static,
    {
        Self {
            parent_type_name: std::any::type_name::<P>(),
            serialize: Box::new(move |registry, instance| {
                let instance = downcast_instance_ref::<T>(instance)?;
                crate::graph::serialize_fields(registry, TypeId::of::<P>(), project(instance))
            }),
            deserialize: Box::new(move |registry, instance, raw| {
                let instance = downcast_instance_mut::<T>(instance)?;
                *project_mut(instance) = registry.deserialize::<P>(raw)?;
                Ok(())
            }),
        }
    }

    /// The declared parent's type name, for diagnostics.
    #[inline]
    pub fn parent_type_name(&self) -> &'static str {
        self.parent_type_name
    }

    #[inline]
    pub(crate) fn serialize(
        &self,
        registry: &Registry,
        instance: &dyn Any,
    ) -> Result<Map<String, Value>, MarshalError> {
        (self.serialize)(registry, instance)
    }

    #[inline]
    pub(crate) fn deserialize(
        &self,
        registry: &Registry,
        instance: &mut dyn Any,
        raw: &Value,
    ) -> Result<(), MarshalError> {
        (self.deserialize)(registry, instance, raw)
    }
}

impl fmt::Debug for ParentLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentLink")
            .field("parent_type_name", &self.parent_type_name)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptor

/// Registered metadata for one type: its properties, construction hooks and
/// declared parent link.
///
/// A descriptor exists logically for every type ever queried from the
/// [`Registry`]; the read path substitutes a shared empty descriptor for
/// types that were never registered, so an undecorated type still marshals
/// predictably (to an empty object) rather than erroring.
pub struct TypeDescriptor {
    pub(crate) type_name: Cow<'static, str>,
    pub(crate) properties: Vec<PropertyDescriptor>,
    pub(crate) parent: Option<ParentLink>,
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) factory: Option<FactoryFn>,
    pub(crate) post_deserialize: Option<PostDeserializeFn>,
}

impl TypeDescriptor {
    /// The shared descriptor handed out for types that were never registered.
    pub(crate) const fn empty() -> Self {
        Self {
            type_name: Cow::Borrowed("<unregistered>"),
            properties: Vec::new(),
            parent: None,
            construct: None,
            factory: None,
            post_deserialize: None,
        }
    }

    pub(crate) fn of<T: 'static>() -> Self {
        Self {
            type_name: Cow::Borrowed(std::any::type_name::<T>()),
            ..Self::empty()
        }
    }

    /// The registered type's name, for diagnostics.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The registered properties, in registration order.
    pub fn properties(&self) -> impl ExactSizeIterator<Item = &PropertyDescriptor> {
        self.properties.iter()
    }

    /// Looks up a property by its serialized name.
    pub fn property(&self, serialized_name: &str) -> Option<&PropertyDescriptor> {
        self.properties
            .iter()
            .find(|property| property.serialized_name == serialized_name)
    }

    /// Whether this type declares a parent link.
    #[inline]
    pub fn has_parent(&self) -> bool {
        self.parent.is_some()
    }

    #[inline]
    pub(crate) fn parent(&self) -> Option<&ParentLink> {
        self.parent.as_ref()
    }

    /// Inserts a property descriptor, keyed by serialized name.
    ///
    /// Re-registering a serialized name replaces the existing descriptor in
    /// place, preserving its position relative to unrelated properties.
    pub(crate) fn insert_property(&mut self, property: PropertyDescriptor) {
        match self
            .properties
            .iter_mut()
            .find(|existing| existing.serialized_name == property.serialized_name)
        {
            Some(slot) => *slot = property,
            None => self.properties.push(property),
        }
    }

    /// Merges type-level settings; unset fields keep their current value.
    pub(crate) fn merge_settings(
        &mut self,
        construct: Option<ConstructFn>,
        factory: Option<FactoryFn>,
        post_deserialize: Option<PostDeserializeFn>,
        parent: Option<ParentLink>,
    ) {
        if let Some(construct) = construct {
            self.construct = Some(construct);
        }
        if let Some(factory) = factory {
            self.factory = Some(factory);
        }
        if let Some(post_deserialize) = post_deserialize {
            self.post_deserialize = Some(post_deserialize);
        }
        if let Some(parent) = parent {
            self.parent = Some(parent);
        }
    }

    /// Builds a fresh instance: the deserialization factory if one is
    /// registered, the captured default constructor otherwise.
    pub(crate) fn build_instance(
        &self,
        registry: &Registry,
        raw: &Value,
        type_name: &'static str,
    ) -> Result<Box<dyn Any>, MarshalError> {
        if let Some(factory) = &self.factory {
            return factory(registry, raw);
        }
        match &self.construct {
            Some(construct) => Ok(construct()),
            None => Err(MarshalError::NotConstructible {
                type_name: Cow::Borrowed(type_name),
            }),
        }
    }

    pub(crate) fn run_post_deserialize(&self, instance: &mut dyn Any) {
        if let Some(hook) = &self.post_deserialize {
            hook(instance);
        }
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties)
            .field("parent", &self.parent)
            .field("has_construct", &self.construct.is_some())
            .field("has_factory", &self.factory.is_some())
            .field("has_post_deserialize", &self.post_deserialize.is_some())
            .finish()
    }
}
