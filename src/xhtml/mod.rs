//! XHTML to ODF conversion.
//!
//! This module turns a rich-text XHTML fragment into the ODF markup of a text
//! document body, in a single pass over the fragment's events.
//!
//! # Quick Start
//!
//! ```rust
//! use xhtml_odf::xhtml::{Converter, ConverterOptions};
//!
//! # fn main() -> Result<(), xhtml_odf::Error> {
//! let converter = Converter::new(ConverterOptions::new().with_html(true));
//! let result = converter.convert("<p>Hello<br>World</p>")?;
//! assert_eq!(result.content, "<text:p>Hello<text:line-break/>World</text:p>");
//! assert!(!result.post_processor_required);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`preprocess`]: wraps the fragment and fixes HTML void tags
//! - [`parser`]: reads the XML and feeds events to the converter
//! - [`StreamingConverter`]: translates events, resolving nesting conflicts
//! - [`table`]: buffers tables until their column widths are known
//! - [`StyleResolver`]: maps source styles to ODF style names
//!
//! Styles generated during a conversion are declared to a [`StyleRegistry`];
//! the caller injects them in the document once every fragment is converted.

// Module declarations
mod attributes;
mod config;
mod context;
mod converter;
mod element;
mod image;
pub mod parser;
pub mod preprocess;
pub mod resolver;
pub mod table;
mod tags;
pub mod whitespace;


// Re-export public API
pub use attributes::Attributes;
pub use config::ConverterOptions;
pub use context::{ConversionContext, Place, default_list_style};
pub use converter::{Conversion, StreamingConverter};
pub use element::{DumpStatus, ElementNode, NodeId};
pub use image::{ImageImporter, ImageRequest};
pub use resolver::{DefaultStyleResolver, Resolution, StyleRequest, StyleResolver, StylesMapping};
pub use table::{TOTAL_COLUMN_WIDTH, TableBuilder};
pub use tags::{TagKind, TagSpec};

use crate::common::Result;
use crate::odf::registry::{DynamicStyles, NameAllocator, SequentialNames, StyleRegistry};
use std::borrow::Cow;
use std::sync::Arc;

/// Converter of XHTML fragments, with its collaborators.
///
/// A `Converter` can be shared between threads and reused for every
/// fragment of a document: generated style and table names stay unique
/// because the registry and the name allocator are shared.
#[derive(Clone)]
pub struct Converter {
    options: ConverterOptions,
    resolver: Arc<dyn StyleResolver>,
    registry: Arc<dyn StyleRegistry>,
    names: Arc<dyn NameAllocator>,
    images: Option<Arc<dyn ImageImporter>>,
}

impl Converter {
    /// Create a converter with the default resolver, an in-memory registry
    /// and no image importer
    pub fn new(options: ConverterOptions) -> Self {
        Self {
            options,
            resolver: Arc::new(DefaultStyleResolver::default()),
            registry: Arc::new(DynamicStyles::new()),
            names: Arc::new(SequentialNames::new()),
            images: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn StyleResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_registry(mut self, registry: Arc<dyn StyleRegistry>) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_names(mut self, names: Arc<dyn NameAllocator>) -> Self {
        self.names = names;
        self
    }

    pub fn with_images(mut self, images: Arc<dyn ImageImporter>) -> Self {
        self.images = Some(images);
        self
    }

    #[inline]
    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    #[inline]
    pub fn registry(&self) -> &Arc<dyn StyleRegistry> {
        &self.registry
    }

    /// Convert one fragment.
    ///
    /// # Errors
    ///
    /// [`Error::XmlError`](crate::Error::XmlError) when the fragment is not
    /// well-formed, [`Error::UnbalancedClose`](crate::Error::UnbalancedClose)
    /// when its end tags do not match, and the importer's error when an image
    /// cannot be imported.
    pub fn convert(&self, input: &str) -> Result<Conversion> {
        let input = if self.options.keep_with_next {
            preprocess::apply_keep_with_next(input)
        } else {
            Cow::Borrowed(input)
        };
        let xml = preprocess::preprocess(&input, self.options.html);

        let mut converter = StreamingConverter::new(
            &self.options,
            self.resolver.as_ref(),
            self.registry.as_ref(),
            self.names.as_ref(),
            self.images.as_deref(),
        );
        parser::parse_into(&xml, &mut converter)?;
        let mut conversion = converter.finish()?;
        if self.options.unwrap
            && let Some(inner) = unwrap_paragraph(&conversion.content)
        {
            conversion.content = inner.to_string();
        }
        Ok(conversion)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ConverterOptions::default())
    }
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .field("images", &self.images.is_some())
            .finish_non_exhaustive()
    }
}

/// Content of the paragraph wrapping the whole of `content`, if a single one
/// does
fn unwrap_paragraph(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("<text:p")?;
    if !rest.starts_with(['>', ' ']) {
        return None;
    }
    let end = rest.find('>')?;
    if rest[..end].ends_with('/') {
        return None;
    }
    let body = rest[end + 1..].strip_suffix("</text:p>")?;
    if body.contains("</text:p>") {
        return None;
    }
    Some(body)
}
