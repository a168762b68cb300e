//! The metadata registry: type descriptors, property descriptors and the
//! registration API that populates them.

use std::any::TypeId;
use std::fmt;

pub(crate) mod descriptor;
mod settings;
mod type_id_map;

pub use descriptor::{ParentLink, PropertyDescriptor, TypeDescriptor};
pub use settings::{Direction, PropertySettings, TypeSettings};

use type_id_map::TypeIdMap;

// -----------------------------------------------------------------------------
// Registry

/// Handed out on the read path for types that were never registered, so
/// lookups never allocate or fail.
static EMPTY_DESCRIPTOR: TypeDescriptor = TypeDescriptor::empty();

/// The central store of marshalling metadata, keyed by [`TypeId`].
///
/// All registration and marshalling flows through an explicit `Registry`
/// value; there is no process-global store. Tests get full isolation by
/// constructing their own, and applications that need distinct wire formats
/// for the same types can hold several side by side.
///
/// Registration is get-or-create: the first `register_type` or
/// `register_property` call for a type creates its descriptor, later calls
/// extend it. Lookups for unknown types yield a shared empty descriptor, so
/// serializing an unregistered type produces `{}` rather than an error
/// (deserializing one fails, since nothing recorded how to construct it).
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vc_marshal::{PropertySettings, Registry};
///
/// #[derive(Default)]
/// struct Sprite {
///     frame: u32,
/// }
///
/// let mut registry = Registry::new();
/// registry.register::<Sprite>();
/// registry.register_property::<Sprite, u32>(
///     "frame",
///     PropertySettings::new(|sprite| &sprite.frame, |sprite, value| sprite.frame = value),
/// );
///
/// let value = registry.serialize(&Sprite { frame: 4 }).unwrap();
/// assert_eq!(value, json!({ "frame": 4 }));
/// ```
pub struct Registry {
    table: TypeIdMap<TypeDescriptor>,
}

impl Registry {
    /// Creates an empty registry.
    #[inline]
    pub fn new() -> Self {
        Self {
            table: TypeIdMap::new(),
        }
    }

    /// Creates a registry pre-populated with every registration submitted
    /// through [`inventory`], in arbitrary order.
    #[cfg(feature = "auto_register")]
    pub fn collected() -> Self {
        let mut registry = Self::new();
        for registration in inventory::iter::<Registration> {
            (registration.register)(&mut registry);
        }
        registry
    }

    /// Registers type-level settings for `T`, merging into any existing
    /// descriptor.
    ///
    /// Hooks the settings leave unset keep their current value, so property
    /// registrations and earlier type registrations survive.
    pub fn register_type<T: 'static>(&mut self, settings: TypeSettings<T>) -> &mut Self {
        self.descriptor_mut::<T>().merge_settings(
            settings.construct,
            settings.factory,
            settings.post_deserialize,
            settings.parent,
        );
        self
    }

    /// Registers one property of `T`, keyed by its serialized name.
    ///
    /// Registering a serialized name that is already present replaces the
    /// earlier descriptor in place, keeping its position in the output order.
    pub fn register_property<T: 'static, F: 'static>(
        &mut self,
        property_name: &'static str,
        settings: PropertySettings<T, F>,
    ) -> &mut Self {
        self.descriptor_mut::<T>()
            .insert_property(settings.into_descriptor(property_name));
        self
    }

    /// Shorthand for [`register_type`](Self::register_type) with
    /// [`TypeSettings::new`], for types that only need their `Default` impl.
    #[inline]
    pub fn register<T: Default + 'static>(&mut self) -> &mut Self {
        self.register_type(TypeSettings::<T>::new())
    }

    /// The descriptor registered for `T`, or the shared empty descriptor.
    #[inline]
    pub fn get_type<T: 'static>(&self) -> &TypeDescriptor {
        self.get(TypeId::of::<T>())
    }

    /// The descriptor registered under `type_id`, or the shared empty
    /// descriptor.
    pub fn get(&self, type_id: TypeId) -> &TypeDescriptor {
        self.table.get(&type_id).unwrap_or(&EMPTY_DESCRIPTOR)
    }

    /// Whether `T` has a descriptor of its own.
    #[inline]
    pub fn contains<T: 'static>(&self) -> bool {
        self.table.contains(&TypeId::of::<T>())
    }

    /// The number of registered types.
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no types are registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    fn descriptor_mut<T: 'static>(&mut self) -> &mut TypeDescriptor {
        self.table
            .get_or_insert(TypeId::of::<T>(), TypeDescriptor::of::<T>)
    }
}

impl Default for Registry {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.values()).finish()
    }
}

// -----------------------------------------------------------------------------
// Registration

/// A registration hook collected at link time through [`inventory`].
///
/// Submitting one per type lets [`Registry::collected`] build a fully
/// populated registry without a hand-maintained call list:
///
/// ```
/// use vc_marshal::{PropertySettings, Registration, Registry};
///
/// #[derive(Default)]
/// struct Marker {
///     label: String,
/// }
///
/// inventory::submit!(Registration::new(|registry| {
///     registry.register::<Marker>();
///     registry.register_property::<Marker, String>(
///         "label",
///         PropertySettings::new(|marker| &marker.label, |marker, value| marker.label = value),
///     );
/// }));
///
/// let registry = Registry::collected();
/// assert!(registry.contains::<Marker>());
/// ```
#[cfg(feature = "auto_register")]
pub struct Registration {
    register: fn(&mut Registry),
}

#[cfg(feature = "auto_register")]
impl Registration {
    /// Wraps a registration function for submission.
    pub const fn new(register: fn(&mut Registry)) -> Self {
        Self { register }
    }
}

#[cfg(feature = "auto_register")]
inventory::collect!(Registration);

// -----------------------------------------------------------------------------
// Tests
