//! Unified error type for the converter.
//!
//! Only conditions that invalidate the whole conversion are errors. Degraded
//! inputs (unparseable style declarations, unknown tags or list keywords) are
//! logged and converted with reduced fidelity instead.
use thiserror::Error;

/// Main error type for conversion operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The input fragment is not well-formed XML after preprocessing
    #[error("XML error: {0}")]
    XmlError(String),

    /// A close event arrived with no matching open element on the stack
    #[error("Unbalanced close tag </{tag}>: {reason}")]
    UnbalancedClose { tag: String, reason: String },

    /// The image importer failed
    #[error("Image import failed for '{src}': {reason}")]
    ImageImport { src: String, reason: String },

    /// Converter options or a style mapping could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;
