//! Schemes: the composable serializer/deserializer pairs that govern how a
//! single field (or nested structure) maps onto its JSON representation.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::MarshalError;
use crate::registry::Registry;

mod builtin;

pub use builtin::{array, date, object, object_map, optional, primitive};

// -----------------------------------------------------------------------------
// Scheme

/// Shared serializer half of a [`Scheme`].
pub type SchemeSerializeFn<T> =
    Arc<dyn Fn(&Registry, &T) -> Result<Value, MarshalError> + Send + Sync>;

/// Shared deserializer half of a [`Scheme`].
pub type SchemeDeserializeFn<T> =
    Arc<dyn Fn(&Registry, &Value) -> Result<T, MarshalError> + Send + Sync>;

/// A pair of a serializer and a deserializer governing one field's transform.
///
/// Both halves receive the [`Registry`] so that composed schemes (nested
/// objects, polymorphic dispatch) can recurse into the marshalling core.
/// A scheme is immutable after construction and cheap to clone; the built-in
/// constructors ([`primitive`], [`date`], [`array`], [`object`], [`optional`],
/// [`object_map`]) and the [`custom`] escape hatch cover most field shapes.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use vc_marshal::{Registry, array, primitive};
///
/// let registry = Registry::new();
/// let scheme = array(primitive::<u32>());
///
/// let value = scheme.serialize(&registry, &vec![1, 2, 3]).unwrap();
/// assert_eq!(value, json!([1, 2, 3]));
///
/// let back = scheme.deserialize(&registry, &value).unwrap();
/// assert_eq!(back, vec![1, 2, 3]);
/// ```
pub struct Scheme<T> {
    serializer: SchemeSerializeFn<T>,
    deserializer: SchemeDeserializeFn<T>,
}

impl<T> Scheme<T> {
    /// Creates a scheme from already shared halves.
    ///
    /// Most callers want [`custom`] instead, which boxes plain closures.
    #[inline]
    pub fn new(serializer: SchemeSerializeFn<T>, deserializer: SchemeDeserializeFn<T>) -> Self {
        Self {
            serializer,
            deserializer,
        }
    }

    /// Runs the serializer half.
    #[inline]
    pub fn serialize(&self, registry: &Registry, value: &T) -> Result<Value, MarshalError> {
        (self.serializer)(registry, value)
    }

    /// Runs the deserializer half.
    #[inline]
    pub fn deserialize(&self, registry: &Registry, raw: &Value) -> Result<T, MarshalError> {
        (self.deserializer)(registry, raw)
    }
}

impl<T> Clone for Scheme<T> {
    fn clone(&self) -> Self {
        Self {
            serializer: Arc::clone(&self.serializer),
            deserializer: Arc::clone(&self.deserializer),
        }
    }
}

impl<T> fmt::Debug for Scheme<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Scheme<{}>", std::any::type_name::<T>())
    }
}

// -----------------------------------------------------------------------------
// custom

/// Wraps two caller-supplied closures verbatim as a [`Scheme`].
///
/// This is the escape hatch for polymorphic and union-typed fields: the
/// deserializer closure inspects a discriminator on the raw value and
/// dispatches to the correct concrete type's [`Registry::deserialize`] call.
/// Errors returned by either closure propagate to the caller unmodified.
///
/// # Examples
///
/// ```
/// use serde_json::{Value, json};
/// use vc_marshal::{MarshalError, Registry, custom};
///
/// // Store a count as a JSON string on the wire.
/// let scheme = custom::<u64, _, _>(
///     |_, value| Ok(Value::String(value.to_string())),
///     |_, raw| match raw {
///         Value::String(text) => text
///             .parse()
///             .map_err(|_| MarshalError::custom("not a number")),
///         other => Err(MarshalError::unexpected("a numeric string", other)),
///     },
/// );
///
/// let registry = Registry::new();
/// assert_eq!(scheme.serialize(&registry, &7).unwrap(), json!("7"));
/// assert_eq!(scheme.deserialize(&registry, &json!("7")).unwrap(), 7);
/// ```
pub fn custom<T, S, D>(serializer: S, deserializer: D) -> Scheme<T>
where
    S: Fn(&Registry, &T) -> Result<Value, MarshalError> + Send + Sync + 'static,
    D: Fn(&Registry, &Value) -> Result<T, MarshalError> + Send + Sync + 'static,
{
    Scheme {
        serializer: Arc::new(serializer),
        deserializer: Arc::new(deserializer),
    }
}
