use std::any::{Any, TypeId};

use serde_json::{Map, Value};

use crate::MarshalError;
use crate::registry::Registry;

impl Registry {
    /// Serializes `instance` into a JSON object using its registered
    /// metadata.
    ///
    /// Declared ancestors contribute their fields first, most distant
    /// ancestor leading; the instance's own properties follow in
    /// registration order and overwrite any ancestor entry that shares a
    /// serialized name. Properties restricted to
    /// [`Direction::DeserializeOnly`] are skipped. An unregistered type
    /// serializes to `{}`.
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
    /// let value = registry.serialize(&Beat { offset: 0.5 }).unwrap();
    /// assert_eq!(value, json!({ "offset": 0.5 }));
    /// ```
    ///
    /// [`Direction::DeserializeOnly`]: crate::Direction::DeserializeOnly
    pub fn serialize<T: 'static>(&self, instance: &T) -> Result<Value, MarshalError> {
        serialize_fields(self, TypeId::of::<T>(), instance).map(Value::Object)
    }

    /// Serializes an optional instance, mapping `None` onto JSON `null`.
    pub fn serialize_opt<T: 'static>(
        &self,
        instance: Option<&T>,
    ) -> Result<Value, MarshalError> {
        match instance {
            Some(instance) => self.serialize(instance),
            None => Ok(Value::Null),
        }
    }
}

/// Collects the serialized fields of one instance, ancestors first.
///
/// Split out from [`Registry::serialize`] so parent links can merge their
/// projected fields into the child's map instead of nesting an object.
pub(crate) fn serialize_fields(
    registry: &Registry,
    type_id: TypeId,
    instance: &dyn Any,
) -> Result<Map<String, Value>, MarshalError> {
    let descriptor = registry.get(type_id);

    let mut fields = match descriptor.parent() {
        Some(parent) => parent.serialize(registry, instance)?,
        None => Map::new(),
    };

    for property in descriptor.properties() {
        if !property.direction().serializes() {
            continue;
        }
        let value = property.serialize(registry, instance)?;
        fields.insert(property.serialized_name().to_owned(), value);
    }

    Ok(fields)
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{Direction, PropertySettings, Registry, TypeSettings, array, primitive};

    #[derive(Default)]
    struct Vehicle {
        name: String,
        wheels: u32,
    }

    fn register_vehicle(registry: &mut Registry) {
        registry.register::<Vehicle>();
        registry.register_property::<Vehicle, String>(
            "name",
            PropertySettings::new(|vehicle| &vehicle.name, |vehicle, value| vehicle.name = value),
        );
        registry.register_property::<Vehicle, u32>(
            "wheels",
            PropertySettings::new(
                |vehicle| &vehicle.wheels,
                |vehicle, value| vehicle.wheels = value,
            ),
        );
    }

    #[test]
    fn serializes_registered_properties_in_registration_order() {
        let mut registry = Registry::new();
        register_vehicle(&mut registry);

        let value = registry
            .serialize(&Vehicle {
                name: "van".to_owned(),
                wheels: 4,
            })
            .unwrap();

        assert_eq!(value, json!({ "name": "van", "wheels": 4 }));
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["name", "wheels"]);
    }

    #[test]
    fn unregistered_types_serialize_to_an_empty_object() {
        struct Opaque;

        let registry = Registry::new();
        assert_eq!(registry.serialize(&Opaque).unwrap(), json!({}));
    }

    #[test]
    fn serialize_opt_maps_none_onto_null() {
        let mut registry = Registry::new();
        register_vehicle(&mut registry);

        assert_eq!(
            registry.serialize_opt::<Vehicle>(None).unwrap(),
            Value::Null
        );

        let trike = Vehicle {
            name: "trike".to_owned(),
            wheels: 3,
        };
        assert_eq!(
            registry.serialize_opt(Some(&trike)).unwrap(),
            json!({ "name": "trike", "wheels": 3 })
        );
    }

    #[test]
    fn honors_serialized_name_overrides() {
        #[derive(Default)]
        struct Track {
            tags: Vec<String>,
        }

        let mut registry = Registry::new();
        registry.register::<Track>();
        registry.register_property::<Track, Vec<String>>(
            "tags",
            PropertySettings::with_scheme(
                array(primitive()),
                |track: &Track| &track.tags,
                |track, value| track.tags = value,
            )
            .serialized_name("tagList"),
        );

        let value = registry
            .serialize(&Track {
                tags: vec!["lo-fi".to_owned()],
            })
            .unwrap();
        assert_eq!(value, json!({ "tagList": ["lo-fi"] }));
    }

    #[test]
    fn skips_deserialize_only_properties() {
        #[derive(Default)]
        struct Session {
            token: String,
            user: String,
        }

        let mut registry = Registry::new();
        registry.register::<Session>();
        registry.register_property::<Session, String>(
            "token",
            PropertySettings::new(
                |session: &Session| &session.token,
                |session, value| session.token = value,
            )
            .direction(Direction::DeserializeOnly),
        );
        registry.register_property::<Session, String>(
            "user",
            PropertySettings::new(
                |session| &session.user,
                |session, value| session.user = value,
            ),
        );

        let value = registry
            .serialize(&Session {
                token: "secret".to_owned(),
                user: "ada".to_owned(),
            })
            .unwrap();
        assert_eq!(value, json!({ "user": "ada" }));
    }

    #[test]
    fn ancestor_fields_come_first_and_derived_values_win() {
        #[derive(Default)]
        struct Base {
            kind: String,
            base_only: u32,
        }

        #[derive(Default)]
        struct Derived {
            base: Base,
            kind: String,
            extra: u32,
        }

        let mut registry = Registry::new();
        registry.register::<Base>();
        registry.register_property::<Base, String>(
            "kind",
            PropertySettings::new(|base| &base.kind, |base, value| base.kind = value),
        );
        registry.register_property::<Base, u32>(
            "baseOnly",
            PropertySettings::new(|base| &base.base_only, |base, value| base.base_only = value),
        );

        registry.register_type::<Derived>(
            TypeSettings::new()
                .parent::<Base>(|derived: &Derived| &derived.base, |derived| &mut derived.base),
        );
        registry.register_property::<Derived, String>(
            "kind",
            PropertySettings::new(|derived| &derived.kind, |derived, value| derived.kind = value),
        );
        registry.register_property::<Derived, u32>(
            "extra",
            PropertySettings::new(
                |derived| &derived.extra,
                |derived, value| derived.extra = value,
            ),
        );

        let value = registry
            .serialize(&Derived {
                base: Base {
                    kind: "base".to_owned(),
                    base_only: 1,
                },
                kind: "derived".to_owned(),
                extra: 2,
            })
            .unwrap();

        // The re-declared "kind" resolves to the derived value but keeps the
        // ancestor's position in the output.
        assert_eq!(
            value,
            json!({ "kind": "derived", "baseOnly": 1, "extra": 2 })
        );
        let keys: Vec<&String> = value.as_object().unwrap().keys().collect();
        assert_eq!(keys, ["kind", "baseOnly", "extra"]);
    }
}
