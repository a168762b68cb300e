use std::borrow::Cow;
use std::{error, fmt};

use serde_json::Value;

// -----------------------------------------------------------------------------
// MarshalError

/// An enumeration of all error outcomes that might happen when marshalling
/// or unmarshalling an object graph.
///
/// Errors raised by caller-supplied schemes, factories or hooks propagate
/// through [`Registry::serialize`] and [`Registry::deserialize`] without
/// wrapping or translation.
///
/// [`Registry::serialize`]: crate::Registry::serialize
/// [`Registry::deserialize`]: crate::Registry::deserialize
#[derive(Debug)]
pub enum MarshalError {
    /// Tried to deserialize a type with neither a captured default
    /// constructor nor a deserialization factory.
    NotConstructible { type_name: Cow<'static, str> },
    /// The raw input for a registered type was not a JSON object.
    ExpectedObject {
        type_name: Cow<'static, str>,
        found: &'static str,
    },
    /// A scheme received input of a JSON kind it cannot handle.
    UnexpectedValue {
        expected: Cow<'static, str>,
        found: &'static str,
    },
    /// An instance passed through the erased marshalling walk did not match
    /// the type its descriptor was registered for.
    MismatchedInstance { expected: Cow<'static, str> },
    /// A date string failed to parse as RFC 3339.
    InvalidDate {
        text: String,
        source: chrono::ParseError,
    },
    /// A leaf value failed serde conversion in the `primitive` scheme.
    Primitive(serde_json::Error),
    /// An error raised by a caller-supplied scheme, factory or hook.
    Custom(Cow<'static, str>),
}

impl MarshalError {
    /// Creates a [`MarshalError::Custom`] from a message.
    ///
    /// Intended for [`custom`](crate::custom) schemes and deserialization
    /// factories that need to reject their input.
    #[inline]
    pub fn custom(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom(message.into())
    }

    /// Creates a [`MarshalError::UnexpectedValue`] describing the JSON kind
    /// of `found`.
    #[inline]
    pub fn unexpected(expected: impl Into<Cow<'static, str>>, found: &Value) -> Self {
        Self::UnexpectedValue {
            expected: expected.into(),
            found: value_kind(found),
        }
    }
}

impl fmt::Display for MarshalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConstructible { type_name } => {
                write!(
                    f,
                    "type `{type_name}` has neither a default constructor nor a deserialization factory registered"
                )
            }
            Self::ExpectedObject { type_name, found } => {
                write!(f, "expected a JSON object for `{type_name}`, found {found}")
            }
            Self::UnexpectedValue { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::MismatchedInstance { expected } => {
                write!(f, "instance does not match registered type `{expected}`")
            }
            Self::InvalidDate { text, .. } => {
                write!(f, "`{text}` is not an RFC 3339 date string")
            }
            Self::Primitive(source) => {
                write!(f, "primitive value conversion failed: {source}")
            }
            Self::Custom(message) => f.write_str(message),
        }
    }
}

impl error::Error for MarshalError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::InvalidDate { source, .. } => Some(source),
            Self::Primitive(source) => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for MarshalError {
    #[inline]
    fn from(source: serde_json::Error) -> Self {
        Self::Primitive(source)
    }
}

/// The JSON kind of a value, for error messages.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
