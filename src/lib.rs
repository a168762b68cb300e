#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod error;
mod graph;

pub mod registry;
pub mod scheme;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use error::MarshalError;
#[cfg(feature = "auto_register")]
pub use registry::Registration;
pub use registry::{Direction, PropertySettings, Registry, TypeSettings};
pub use scheme::{Scheme, array, custom, date, object, object_map, optional, primitive};
