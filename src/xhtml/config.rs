//! Configuration types for XHTML to ODF conversion.
//!
//! Options are plain data: they can be built in code with the `with_*`
//! setters or loaded from YAML.
//!
//! # Examples
//!
//! ```rust
//! use xhtml_odf::xhtml::ConverterOptions;
//!
//! // Create with defaults
//! let options = ConverterOptions::default();
//! assert_eq!(options.page_width, 17.0);
//!
//! // Or customize
//! let options = ConverterOptions::new()
//!     .with_html(true)
//!     .with_unwrap(true)
//!     .with_page_width(16.0);
//! ```

use crate::common::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    /// Input is HTML: void tags (`<br>`, `<img ...>`) are self-closed before
    /// parsing
    pub html: bool,
    /// Strip the paragraph wrapping the whole result, if there is one
    pub unwrap: bool,
    /// Keep the last paragraph or list item with the content that follows
    pub keep_with_next: bool,
    /// Width available to tables, in cm, page margins excluded
    pub page_width: f64,
    /// Maximum image width, in cm
    pub images_max_width: Option<f64>,
    /// Whether resized images keep their aspect ratio
    pub keep_images_ratio: bool,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            html: false,
            unwrap: false,
            keep_with_next: false,
            page_width: 17.0,
            images_max_width: None,
            keep_images_ratio: true,
        }
    }
}

impl ConverterOptions {
    /// Create a new `ConverterOptions` with default values.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a YAML document. Missing keys keep their defaults.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use xhtml_odf::xhtml::ConverterOptions;
    ///
    /// let options = ConverterOptions::from_yaml("html: true\npage_width: 15.5\n").unwrap();
    /// assert!(options.html);
    /// assert_eq!(options.page_width, 15.5);
    /// ```
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| Error::Config(format!("Invalid converter options: {}", e)))
    }

    /// Serialize the options to YAML.
    pub fn to_yaml(&self) -> Result<String> {
        serde_saphyr::to_string(self)
            .map_err(|e| Error::Config(format!("Failed to serialize options to YAML: {}", e)))
    }

    /// Set whether the input is HTML rather than XHTML.
    #[inline]
    pub fn with_html(mut self, html: bool) -> Self {
        self.html = html;
        self
    }

    /// Set whether the outer paragraph is stripped from the result.
    #[inline]
    pub fn with_unwrap(mut self, unwrap: bool) -> Self {
        self.unwrap = unwrap;
        self
    }

    /// Set whether the last paragraph or item keeps with the next content.
    #[inline]
    pub fn with_keep_with_next(mut self, keep: bool) -> Self {
        self.keep_with_next = keep;
        self
    }

    /// Set the page width, in cm.
    #[inline]
    pub fn with_page_width(mut self, cm: f64) -> Self {
        self.page_width = cm;
        self
    }

    /// Set the maximum image width, in cm.
    #[inline]
    pub fn with_images_max_width(mut self, cm: Option<f64>) -> Self {
        self.images_max_width = cm;
        self
    }

    /// Set whether resized images keep their ratio.
    #[inline]
    pub fn with_keep_images_ratio(mut self, keep: bool) -> Self {
        self.keep_images_ratio = keep;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let options = ConverterOptions::new()
            .with_keep_with_next(true)
            .with_images_max_width(Some(10.0))
            .with_keep_images_ratio(false);
        assert!(options.keep_with_next);
        assert_eq!(options.images_max_width, Some(10.0));
        assert!(!options.keep_images_ratio);
        assert!(!options.html);
    }

    #[test]
    fn test_yaml_round_trip() {
        let options = ConverterOptions::new().with_unwrap(true).with_page_width(12.0);
        let yaml = options.to_yaml().unwrap();
        assert_eq!(ConverterOptions::from_yaml(&yaml).unwrap(), options);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = ConverterOptions::from_yaml("page_width: [1, 2]").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
