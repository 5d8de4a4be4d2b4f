//! XML text helpers shared by the reader and the writer side.

mod escape;

pub use escape::{decode_entities, escape_xml, resolve_entity};
