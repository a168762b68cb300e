use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::MarshalError;
use crate::registry::Registry;
use crate::registry::descriptor::{
    ConstructFn, FactoryFn, ParentLink, PostDeserializeFn, PropertyDescriptor,
    downcast_instance_mut, downcast_instance_ref,
};
use crate::scheme::{Scheme, primitive};

// -----------------------------------------------------------------------------
// Direction

/// Which marshalling directions a property participates in.
///
/// The default is [`Both`](Direction::Both). Serialize-only properties are
/// skipped during deserialization even when the raw input carries their key;
/// deserialize-only properties never appear in serialized output. Useful for
/// round-trip asymmetry such as write-only secrets or server-computed fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Serialized and deserialized (the default).
    #[default]
    Both,
    /// Written to serialized output only.
    SerializeOnly,
    /// Read from raw input only.
    DeserializeOnly,
}

impl Direction {
    /// Whether properties with this direction appear in serialized output.
    #[inline]
    pub const fn serializes(self) -> bool {
        matches!(self, Self::Both | Self::SerializeOnly)
    }

    /// Whether properties with this direction are read from raw input.
    #[inline]
    pub const fn deserializes(self) -> bool {
        matches!(self, Self::Both | Self::DeserializeOnly)
    }
}

// -----------------------------------------------------------------------------
// TypeSettings

/// Type-level registration settings for [`Registry::register_type`].
///
/// Settings merge: registering a type twice only overwrites the hooks the
/// second registration actually sets, so a construction hook registered
/// early is not clobbered by a later call that adds only a post-deserialize
/// hook.
///
/// # Examples
///
/// ```
/// use vc_marshal::{Registry, TypeSettings};
///
/// #[derive(Default)]
/// struct Account {
///     name: String,
///     display_name: String,
/// }
///
/// let mut registry = Registry::new();
/// registry.register_type::<Account>(TypeSettings::new().post_deserialize(
///     |account: &mut Account| account.display_name = account.name.to_uppercase(),
/// ));
/// ```
///
/// [`Registry::register_type`]: crate::Registry::register_type
pub struct TypeSettings<T> {
    pub(crate) construct: Option<ConstructFn>,
    pub(crate) factory: Option<FactoryFn>,
    pub(crate) post_deserialize: Option<PostDeserializeFn>,
    pub(crate) parent: Option<ParentLink>,
    marker: PhantomData<fn() -> T>,
}

impl<T: 'static> TypeSettings<T> {
    /// Settings that capture `T`'s [`Default`] impl as its constructor.
    pub fn new() -> Self
    where
        T: Default,
    {
        Self {
            construct: Some(Box::new(|| Box::new(T::default()) as Box<dyn Any>)),
            ..Self::empty()
        }
    }

    /// Settings with nothing set.
    ///
    /// Use this for types built exclusively through a
    /// [`factory`](Self::factory), or to merge a single hook into an
    /// existing registration without touching the rest.
    pub fn empty() -> Self {
        Self {
            construct: None,
            factory: None,
            post_deserialize: None,
            parent: None,
            marker: PhantomData,
        }
    }

    /// Sets a deserialization factory, used in place of default construction.
    ///
    /// The factory receives the raw value being deserialized, which lets
    /// types with required constructor arguments pull them out of the
    /// payload. Registered property values are applied on top of the
    /// returned instance afterwards.
    pub fn factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(&Registry, &Value) -> Result<T, MarshalError> + Send + Sync + 'static,
    {
        self.factory = Some(Box::new(move |registry, raw| {
            factory(registry, raw).map(|instance| Box::new(instance) as Box<dyn Any>)
        }));
        self
    }

    /// Sets a hook invoked after an instance is fully populated during
    /// deserialization, for derived or computed state.
    pub fn post_deserialize<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.post_deserialize = Some(Box::new(move |instance| {
            if let Some(instance) = instance.downcast_mut::<T>() {
                hook(instance);
            }
        }));
        self
    }

    /// Declares `P` as this type's parent, embedded behind the given
    /// projections.
    ///
    /// Ancestor fields marshal before own fields, so a serialized name
    /// re-declared on the child overwrites the parent's value in the output
    /// (derived wins). `P`'s own registration applies to the projected
    /// value, including any parent link of its own.
    pub fn parent<P: 'static>(
        mut self,
        project: fn(&T) -> &P,
        project_mut: fn(&mut T) -> &mut P,
    ) -> Self {
        self.parent = Some(ParentLink::new(project, project_mut));
        self
    }
}

impl<T: 'static + Default> Default for TypeSettings<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TypeSettings<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSettings")
            .field("type", &std::any::type_name::<T>())
            .field("has_construct", &self.construct.is_some())
            .field("has_factory", &self.factory.is_some())
            .field("has_post_deserialize", &self.post_deserialize.is_some())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// PropertySettings

/// Property-level registration settings for [`Registry::register_property`].
///
/// The scheme defaults to [`primitive`] and the serialized name to the
/// property name. Rust has no dynamic property access, so each property
/// carries a typed getter/setter pair; both are plain field projections in
/// practice.
///
/// When a builder method is chained onto the constructor, the getter's
/// parameter needs a type annotation (`|post: &Post| &post.tags` below);
/// the chained receiver is resolved before the registration call can supply
/// the settings' type parameters.
///
/// # Examples
///
/// ```
/// use vc_marshal::{PropertySettings, Registry, array, primitive};
///
/// #[derive(Default)]
/// struct Post {
///     title: String,
///     tags: Vec<String>,
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Post>();
/// registry.register_property::<Post, String>(
///     "title",
///     PropertySettings::new(|post| &post.title, |post, value| post.title = value),
/// );
/// registry.register_property::<Post, Vec<String>>(
///     "tags",
///     PropertySettings::with_scheme(
///         array(primitive()),
///         |post: &Post| &post.tags,
///         |post, value| post.tags = value,
///     )
///     .serialized_name("tagList"),
/// );
/// ```
///
/// [`Registry::register_property`]: crate::Registry::register_property
pub struct PropertySettings<T, F> {
    pub(crate) scheme: Scheme<F>,
    pub(crate) serialized_name: Option<Cow<'static, str>>,
    pub(crate) direction: Direction,
    pub(crate) get: fn(&T) -> &F,
    pub(crate) set: fn(&mut T, F),
}

impl<T: 'static, F: 'static> PropertySettings<T, F> {
    /// Settings with the default [`primitive`] scheme.
    pub fn new(get: fn(&T) -> &F, set: fn(&mut T, F)) -> Self
    where
        F: Serialize + DeserializeOwned,
    {
        Self::with_scheme(primitive(), get, set)
    }

    /// Settings with an explicit scheme.
    pub fn with_scheme(scheme: Scheme<F>, get: fn(&T) -> &F, set: fn(&mut T, F)) -> Self {
        Self {
            scheme,
            serialized_name: None,
            direction: Direction::Both,
            get,
            set,
        }
    }

    /// Overrides the key used in the JSON representation.
    pub fn serialized_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.serialized_name = Some(name.into());
        self
    }

    /// Restricts the property to one marshalling direction.
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Builds the erased property descriptor registered into the store.
    pub(crate) fn into_descriptor(self, property_name: &'static str) -> PropertyDescriptor {
        let property_name = Cow::Borrowed(property_name);
        let serialized_name = self
            .serialized_name
            .unwrap_or_else(|| property_name.clone());
        let get = self.get;
        let set = self.set;
        let deserialize_scheme = self.scheme.clone();
        let serialize_scheme = self.scheme;

        PropertyDescriptor {
            property_name,
            serialized_name,
            direction: self.direction,
            serialize: Box::new(move |registry, instance| {
                let instance = downcast_instance_ref::<T>(instance)?;
                serialize_scheme.serialize(registry, get(instance))
            }),
            deserialize: Box::new(move |registry, instance, raw| {
                let value = deserialize_scheme.deserialize(registry, raw)?;
                let instance = downcast_instance_mut::<T>(instance)?;
                set(instance, value);
                Ok(())
            }),
        }
    }
}

impl<T, F> fmt::Debug for PropertySettings<T, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySettings")
            .field("scheme", &self.scheme)
            .field("serialized_name", &self.serialized_name)
            .field("direction", &self.direction)
            .finish_non_exhaustive()
    }
}
