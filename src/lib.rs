//! xhtml-odf - A streaming converter from XHTML fragments to ODF text markup
//!
//! This library converts the rich-text XHTML produced by web editors into the
//! markup of an OpenDocument text body (`text:p`, `text:span`, `text:list`,
//! `table:table`, ...), ready to be inserted in a document template.
//!
//! # Features
//!
//! - **Single pass**: events are translated as they arrive; only tables are
//!   buffered, until their column widths are known
//! - **Nesting repair**: XHTML nestings ODF forbids (a table in a list item,
//!   a paragraph in a span) are closed and reopened around the offender
//! - **No empty spans**: style-only tags are written only once they get text
//! - **Column sizing**: relative column widths computed from declared widths
//!   and content, summing to 65534
//! - **Pluggable styles**: class and tag mapping to template styles, with
//!   automatic styles generated for inline CSS
//!
//! # Example - Converting a fragment
//!
//! ```rust
//! # fn main() -> Result<(), xhtml_odf::Error> {
//! let content = xhtml_odf::convert("<p>Hello <b>World</b></p>")?;
//! assert_eq!(content, "<text:p>Hello <text:span text:style-name=\"gen1pod\">World</text:span></text:p>");
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Sharing styles between fragments
//!
//! ```rust
//! use std::sync::Arc;
//! use xhtml_odf::odf::{DynamicStyles, StyleTarget};
//! use xhtml_odf::xhtml::{Converter, ConverterOptions};
//!
//! # fn main() -> Result<(), xhtml_odf::Error> {
//! let styles = Arc::new(DynamicStyles::new());
//! let converter = Converter::new(ConverterOptions::default()).with_registry(styles.clone());
//!
//! converter.convert("<ul><li>One</li></ul>")?;
//! converter.convert("<p style=\"color: red\">Two</p>")?;
//!
//! // Automatic styles for content.xml, list styles for styles.xml
//! assert!(!styles.declarations(StyleTarget::Content).is_empty());
//! assert!(!styles.is_empty());
//! # Ok(())
//! # }
//! ```

/// Shared error type, units and XML helpers
pub mod common;

/// CSS declarations of source elements and their ODF mapping
pub mod css;

/// ODF vocabulary, style objects and the style registry
pub mod odf;

/// The XHTML converter itself
pub mod xhtml;

// Re-export commonly used types for convenience
pub use common::{Error, Result};
pub use xhtml::{Conversion, Converter, ConverterOptions, StreamingConverter};

/// Convert a fragment with default options and collaborators.
///
/// Generated styles are discarded: use a [`Converter`] with a shared
/// registry to keep them.
pub fn convert(input: &str) -> Result<String> {
    Converter::default().convert(input).map(|c| c.content)
}
