//! Built-in scheme constructors.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{Scheme, custom};
use crate::MarshalError;

// -----------------------------------------------------------------------------
// primitive

/// Primitive scheme, the default for registered properties.
///
/// Leaf values pass through serde: anything implementing [`Serialize`] and
/// [`DeserializeOwned`] maps onto its plain `serde_json` representation
/// as-is. This is the closest JSON marshalling comes to an identity
/// transform, so numbers, strings, booleans and serde-derived leaf types all
/// use it unchanged.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vc_marshal::{Registry, primitive};
///
/// let registry = Registry::new();
/// let scheme = primitive::<String>();
///
/// let value = scheme.serialize(&registry, &"hello".to_owned()).unwrap();
/// assert_eq!(value, json!("hello"));
/// ```
pub fn primitive<T>() -> Scheme<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    custom(
        |_, value| serde_json::to_value(value).map_err(MarshalError::from),
        |_, raw| serde_json::from_value(raw.clone()).map_err(MarshalError::from),
    )
}

// -----------------------------------------------------------------------------
// date

/// Date scheme: [`DateTime<Utc>`] as an RFC 3339 string with millisecond
/// precision.
///
/// The epoch marshals to `"1970-01-01T00:00:00.000Z"`. Deserializing accepts
/// any RFC 3339 offset and normalizes to UTC; non-string input is an error.
/// Nullable date fields compose with [`optional`]:
/// `optional(date())` maps `None` onto JSON `null`.
///
/// # Examples
///
/// ```
/// use chrono::DateTime;
/// use serde_json::json;
/// use vc_marshal::{Registry, date};
///
/// let registry = Registry::new();
/// let scheme = date();
///
/// let epoch = DateTime::from_timestamp(0, 0).unwrap();
/// let value = scheme.serialize(&registry, &epoch).unwrap();
/// assert_eq!(value, json!("1970-01-01T00:00:00.000Z"));
///
/// let back = scheme.deserialize(&registry, &value).unwrap();
/// assert_eq!(back, epoch);
/// ```
pub fn date() -> Scheme<DateTime<Utc>> {
    custom(
        |_, value: &DateTime<Utc>| {
            Ok(Value::String(
                value.to_rfc3339_opts(SecondsFormat::Millis, true),
            ))
        },
        |_, raw| match raw {
            Value::String(text) => DateTime::parse_from_rfc3339(text)
                .map(|parsed| parsed.with_timezone(&Utc))
                .map_err(|source| MarshalError::InvalidDate {
                    text: text.clone(),
                    source,
                }),
            other => Err(MarshalError::unexpected("an RFC 3339 date string", other)),
        },
    )
}

// -----------------------------------------------------------------------------
// array

/// Array scheme: applies `child` to every element of a `Vec` field.
///
/// Serializing always produces a fresh JSON array. An absent key in the raw
/// input never reaches this scheme at all; the deserialization walk skips
/// missing keys so a field's default value survives partial payloads.
///
/// Plain sequences use `array(primitive())`; nesting composes the same way
/// as any other scheme, e.g. `array(object::<Point>())`.
pub fn array<T: 'static>(child: Scheme<T>) -> Scheme<Vec<T>> {
    let serialize_child = child.clone();
    custom(
        move |registry, values: &Vec<T>| {
            let mut output = Vec::with_capacity(values.len());
            for value in values {
                output.push(serialize_child.serialize(registry, value)?);
            }
            Ok(Value::Array(output))
        },
        move |registry, raw| match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| child.deserialize(registry, item))
                .collect(),
            other => Err(MarshalError::unexpected("an array", other)),
        },
    )
}

// -----------------------------------------------------------------------------
// object

/// Object scheme: delegates a nested field to the marshalling core.
///
/// This is how nesting composes without the caller writing recursive code:
/// the serializer forwards to [`Registry::serialize`] and the deserializer to
/// [`Registry::deserialize`] for `T`, so `T`'s own registered metadata
/// applies. Nullable nested objects compose with [`optional`].
///
/// [`Registry::serialize`]: crate::Registry::serialize
/// [`Registry::deserialize`]: crate::Registry::deserialize
pub fn object<T: 'static>() -> Scheme<T> {
    custom(
        |registry, value: &T| registry.serialize(value),
        |registry, raw| registry.deserialize::<T>(raw),
    )
}

// -----------------------------------------------------------------------------
// optional

/// Optional scheme: maps `None` onto JSON `null` and defers to `child`
/// otherwise.
///
/// Nullable fields round-trip as `null`, never as an empty object, matching
/// the null-in/null-out contract of [`Registry::serialize_opt`] and
/// [`Registry::deserialize_opt`] at field granularity.
///
/// [`Registry::serialize_opt`]: crate::Registry::serialize_opt
/// [`Registry::deserialize_opt`]: crate::Registry::deserialize_opt
pub fn optional<T: 'static>(child: Scheme<T>) -> Scheme<Option<T>> {
    let serialize_child = child.clone();
    custom(
        move |registry, value: &Option<T>| match value {
            Some(inner) => serialize_child.serialize(registry, inner),
            None => Ok(Value::Null),
        },
        move |registry, raw| match raw {
            Value::Null => Ok(None),
            other => child.deserialize(registry, other).map(Some),
        },
    )
}

// -----------------------------------------------------------------------------
// object_map

/// Object-map scheme: a string-keyed map field marshalled as a JSON object,
/// value-wise through `child`.
///
/// Composes with itself for multi-level maps (`object_map(object_map(..))`)
/// and with [`object`] for maps of registered types.
pub fn object_map<T: 'static>(child: Scheme<T>) -> Scheme<BTreeMap<String, T>> {
    let serialize_child = child.clone();
    custom(
        move |registry, entries: &BTreeMap<String, T>| {
            let mut output = Map::with_capacity(entries.len());
            for (key, value) in entries {
                output.insert(key.clone(), serialize_child.serialize(registry, value)?);
            }
            Ok(Value::Object(output))
        },
        move |registry, raw| match raw {
            Value::Object(fields) => fields
                .iter()
                .map(|(key, value)| {
                    Ok::<_, MarshalError>((key.clone(), child.deserialize(registry, value)?))
                })
                .collect(),
            other => Err(MarshalError::unexpected("an object", other)),
        },
    )
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{DateTime, Utc};
    use serde_json::{Value, json};

    use super::{array, date, object_map, optional, primitive};
    use crate::{MarshalError, PropertySettings, Registry};

    #[test]
    fn primitive_round_trips_leaf_values() {
        let registry = Registry::new();

        let numbers = primitive::<i64>();
        assert_eq!(numbers.serialize(&registry, &-3).unwrap(), json!(-3));
        assert_eq!(numbers.deserialize(&registry, &json!(-3)).unwrap(), -3);

        let strings = primitive::<String>();
        assert_eq!(
            strings.deserialize(&registry, &json!("chai")).unwrap(),
            "chai"
        );
    }

    #[test]
    fn primitive_supports_serde_derived_leaves() {
        #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq)]
        struct Rgb(u8, u8, u8);

        let registry = Registry::new();
        let scheme = primitive::<Rgb>();

        let value = scheme.serialize(&registry, &Rgb(1, 2, 3)).unwrap();
        assert_eq!(value, json!([1, 2, 3]));
        assert_eq!(scheme.deserialize(&registry, &value).unwrap(), Rgb(1, 2, 3));
    }

    #[test]
    fn primitive_rejects_mismatched_input() {
        let registry = Registry::new();
        let scheme = primitive::<u32>();

        let error = scheme.deserialize(&registry, &json!("nope")).unwrap_err();
        assert!(matches!(error, MarshalError::Primitive(_)));
    }

    #[test]
    fn date_formats_epoch_with_millisecond_precision() {
        let registry = Registry::new();
        let scheme = date();
        let epoch = DateTime::from_timestamp(0, 0).unwrap();

        assert_eq!(
            scheme.serialize(&registry, &epoch).unwrap(),
            json!("1970-01-01T00:00:00.000Z")
        );
        assert_eq!(
            scheme
                .deserialize(&registry, &json!("1970-01-01T00:00:00.000Z"))
                .unwrap(),
            epoch
        );
    }

    #[test]
    fn date_normalizes_offsets_to_utc() {
        let registry = Registry::new();
        let scheme = date();

        let parsed = scheme
            .deserialize(&registry, &json!("1970-01-01T01:00:00.000+01:00"))
            .unwrap();
        assert_eq!(parsed.timestamp(), 0);
    }

    #[test]
    fn date_rejects_non_string_input() {
        let registry = Registry::new();
        let scheme = date();

        let error = scheme.deserialize(&registry, &json!(0)).unwrap_err();
        assert!(matches!(error, MarshalError::UnexpectedValue { .. }));

        let error = scheme.deserialize(&registry, &json!("yesterday")).unwrap_err();
        assert!(matches!(error, MarshalError::InvalidDate { .. }));
    }

    #[test]
    fn array_maps_element_wise_into_a_fresh_array() {
        let registry = Registry::new();
        let scheme = array(primitive::<u32>());

        let input = vec![1, 2, 3];
        let value = scheme.serialize(&registry, &input).unwrap();
        assert_eq!(value, json!([1, 2, 3]));

        let back = scheme.deserialize(&registry, &value).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn array_rejects_non_array_input() {
        let registry = Registry::new();
        let scheme = array(primitive::<u32>());

        let error = scheme.deserialize(&registry, &json!({})).unwrap_err();
        assert!(matches!(error, MarshalError::UnexpectedValue { .. }));
    }

    #[test]
    fn optional_maps_none_onto_null() {
        let registry = Registry::new();
        let scheme = optional(primitive::<String>());

        assert_eq!(scheme.serialize(&registry, &None).unwrap(), Value::Null);
        assert_eq!(scheme.deserialize(&registry, &Value::Null).unwrap(), None);
        assert_eq!(
            scheme.deserialize(&registry, &json!("set")).unwrap(),
            Some("set".to_owned())
        );
    }

    #[test]
    fn nullable_date_fields_round_trip_through_null() {
        #[derive(Default)]
        struct Event {
            at: Option<DateTime<Utc>>,
        }

        let mut registry = Registry::new();
        registry.register::<Event>();
        registry.register_property::<Event, Option<DateTime<Utc>>>(
            "at",
            PropertySettings::with_scheme(
                optional(date()),
                |event| &event.at,
                |event, value| event.at = value,
            ),
        );

        let value = registry.serialize(&Event { at: None }).unwrap();
        assert_eq!(value, json!({ "at": null }));
        let back: Event = registry.deserialize(&value).unwrap();
        assert!(back.at.is_none());

        let epoch = DateTime::from_timestamp(0, 0).unwrap();
        let value = registry.serialize(&Event { at: Some(epoch) }).unwrap();
        assert_eq!(value, json!({ "at": "1970-01-01T00:00:00.000Z" }));
        let back: Event = registry.deserialize(&value).unwrap();
        assert_eq!(back.at, Some(epoch));
    }

    #[test]
    fn object_map_round_trips_string_maps() {
        let registry = Registry::new();
        let scheme = object_map(primitive::<String>());

        let mut entries = BTreeMap::new();
        entries.insert("a".to_owned(), "a".to_owned());
        entries.insert("b".to_owned(), "b".to_owned());

        let value = scheme.serialize(&registry, &entries).unwrap();
        assert_eq!(value, json!({ "a": "a", "b": "b" }));
        assert_eq!(scheme.deserialize(&registry, &value).unwrap(), entries);

        let empty = BTreeMap::new();
        assert_eq!(scheme.serialize(&registry, &empty).unwrap(), json!({}));
    }

    #[test]
    fn object_map_composes_with_itself() {
        let registry = Registry::new();
        let scheme = object_map(object_map(primitive::<String>()));

        let mut inner = BTreeMap::new();
        inner.insert("a1".to_owned(), "a1".to_owned());
        inner.insert("a2".to_owned(), "a2".to_owned());
        let mut entries = BTreeMap::new();
        entries.insert("a".to_owned(), inner);

        let value = scheme.serialize(&registry, &entries).unwrap();
        assert_eq!(value, json!({ "a": { "a1": "a1", "a2": "a2" } }));
        assert_eq!(scheme.deserialize(&registry, &value).unwrap(), entries);
    }
}
