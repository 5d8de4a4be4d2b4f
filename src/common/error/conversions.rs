//! Error conversion implementations.
//!
//! This module contains From trait implementations to convert errors of the
//! underlying crates to the unified Error type.

use super::types::Error;

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::XmlError(err.to_string())
    }
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::XmlError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbalanced_close_message() {
        let err = Error::UnbalancedClose {
            tag: "p".to_string(),
            reason: "no element is open".to_string(),
        };
        assert_eq!(err.to_string(), "Unbalanced close tag </p>: no element is open");
    }
}
