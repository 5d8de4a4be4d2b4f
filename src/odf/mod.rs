//! OpenDocument side of the conversion.
//!
//! The target vocabulary ([`OdfTag`]), the style objects attached to
//! converted elements, and the collaborators receiving generated style
//! declarations.

pub mod registry;
pub mod style;
pub mod tags;

pub use registry::{DynamicStyles, NameAllocator, SequentialNames, StyleRegistry, StyleTarget};
pub use style::{ColumnModifier, ListKind, ListProperties, Style, StyleFamily, TableProperties};
pub use tags::OdfTag;
