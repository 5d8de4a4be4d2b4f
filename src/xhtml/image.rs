//! Image import hook.
//!
//! Turning an `img` into ODF needs the image bytes in the output package, which
//! is outside the converter's reach. An [`ImageImporter`] does that work and
//! returns the markup (typically a `draw:frame`) to insert in place of the
//! image.

use crate::common::Result;
use crate::css::CssStyles;

/// What the importer receives for one `img` element
#[derive(Debug, Clone, Copy)]
pub struct ImageRequest<'a> {
    /// Trimmed `src` attribute, never empty
    pub src: &'a str,
    /// Styles of the `img` element (`width`, `height`, ...)
    pub styles: &'a CssStyles,
    /// Maximum width, in cm
    pub max_width: Option<f64>,
    /// Whether resizing keeps the aspect ratio
    pub keep_ratio: bool,
}

/// Imports images referenced by the fragment.
///
/// An error aborts the whole conversion.
pub trait ImageImporter: Send + Sync {
    /// Import the image and return the markup that replaces the `img`
    fn import(&self, request: &ImageRequest<'_>) -> Result<String>;
}

impl<F> ImageImporter for F
where
    F: Fn(&ImageRequest<'_>) -> Result<String> + Send + Sync,
{
    fn import(&self, request: &ImageRequest<'_>) -> Result<String> {
        self(request)
    }
}
