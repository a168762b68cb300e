//! The recursive marshalling core: walks registered metadata to turn object
//! graphs into JSON values and back.

mod de;
mod ser;

pub(crate) use ser::serialize_fields;
