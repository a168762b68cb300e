use std::any::{Any, TypeId};

use serde_json::Value;

use crate::MarshalError;
use crate::error::value_kind;
use crate::registry::Registry;

impl Registry {
    /// Deserializes a JSON object into a fresh `T` using its registered
    /// metadata.
    ///
    /// A new instance comes from the registered deserialization factory if
    /// there is one, otherwise from the captured `Default` constructor.
    /// Declared ancestors populate their embedded values first, then each of
    /// the instance's own properties whose serialized name is present in the
    /// raw object is applied; absent keys leave the constructed value
    /// untouched, so defaults survive partial payloads. Properties restricted
    /// to [`Direction::SerializeOnly`] are skipped even when their key is
    /// present. The post-deserialize hook, if registered, runs last.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use vc_marshal::{PropertySettings, Registry};
    ///
    /// #[derive(Default)]
    /// struct Beat {
    ///     offset: f64,
    /// }
    ///
    /// let mut registry = Registry::new();
    /// registry.register::<Beat>();
    /// registry.register_property::<Beat, f64>(
    ///     "offset",
    ///     PropertySettings::new(|beat| &beat.offset, |beat, value| beat.offset = value),
    /// );
    ///
    /// let beat: Beat = registry.deserialize(&json!({ "offset": 0.5 })).unwrap();
    /// assert_eq!(beat.offset, 0.5);
    /// ```
    ///
    /// # Errors
    ///
    /// Fails with [`MarshalError::ExpectedObject`] when `raw` is not a JSON
    /// object and [`MarshalError::NotConstructible`] when neither a factory
    /// nor a constructor is registered for `T`.
    ///
    /// [`Direction::SerializeOnly`]: crate::Direction::SerializeOnly
    pub fn deserialize<T: 'static>(&self, raw: &Value) -> Result<T, MarshalError> {
        let type_name = std::any::type_name::<T>();
        let instance = deserialize_instance(self, TypeId::of::<T>(), type_name, raw)?;
        match instance.downcast::<T>() {
            Ok(instance) => Ok(*instance),
            Err(_) => Err(MarshalError::MismatchedInstance {
                expected: type_name.into(),
            }),
        }
    }

    /// Deserializes an optional instance, mapping JSON `null` onto `None`.
    pub fn deserialize_opt<T: 'static>(&self, raw: &Value) -> Result<Option<T>, MarshalError> {
        match raw {
            Value::Null => Ok(None),
            other => self.deserialize(other).map(Some),
        }
    }
}

/// Builds and populates one erased instance.
///
/// Split out from [`Registry::deserialize`] so parent links and polymorphic
/// schemes can reuse the walk without knowing the concrete type up front.
pub(crate) fn deserialize_instance(
    registry: &Registry,
    type_id: TypeId,
    type_name: &'static str,
    raw: &Value,
) -> Result<Box<dyn Any>, MarshalError> {
    let Some(fields) = raw.as_object() else {
        return Err(MarshalError::ExpectedObject {
            type_name: type_name.into(),
            found: value_kind(raw),
        });
    };

    let descriptor = registry.get(type_id);
    let mut instance = descriptor.build_instance(registry, raw, type_name)?;

    if let Some(parent) = descriptor.parent() {
        parent.deserialize(registry, instance.as_mut(), raw)?;
    }

    for property in descriptor.properties() {
        if !property.direction().deserializes() {
            continue;
        }
        if let Some(value) = fields.get(property.serialized_name()) {
            property.deserialize(registry, instance.as_mut(), value)?;
        }
    }

    descriptor.run_post_deserialize(instance.as_mut());
    Ok(instance)
}

// -----------------------------------------------------------------------------
// Tests
