//! Event source: drives a [`StreamingConverter`] from XML text.
//!
//! Tag and attribute names are lower-cased. Entities are resolved against
//! the XML and HTML entity tables; an unknown entity is kept literally.
//! Comments, processing instructions and declarations are skipped.

use super::converter::StreamingConverter;
use crate::common::xml::{decode_entities, resolve_entity};
use crate::common::{Error, Result};
use crate::xhtml::Attributes;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

/// Nesting depth beyond which the input is rejected
const MAX_DEPTH: usize = 1000;

/// Feed every event of `xml` to `converter`.
///
/// End names are not checked by the reader: the converter reports
/// mismatches itself, as [`Error::UnbalancedClose`].
pub fn parse_into(xml: &str, converter: &mut StreamingConverter<'_>) -> Result<()> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.expand_empty_elements = false;

    let mut depth = 0usize;
    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(Error::XmlError(format!(
                        "Maximum nesting depth {} exceeded",
                        MAX_DEPTH
                    )));
                }
                let (name, attrs) = read_start(e)?;
                converter.open(&name, attrs)?;
            }
            Ok(Event::Empty(ref e)) => {
                let (name, attrs) = read_start(e)?;
                converter.open(&name, attrs)?;
                converter.close(&name)?;
            }
            Ok(Event::End(ref e)) => {
                let name = utf8(e.name().as_ref())?.to_ascii_lowercase();
                converter.close(&name)?;
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(ref t)) => {
                let text = utf8(t)?;
                converter.text(&decode_entities(text));
            }
            Ok(Event::CData(ref t)) => {
                converter.text(utf8(t)?);
            }
            Ok(Event::GeneralRef(ref r)) => {
                let name = utf8(r)?;
                match resolve_entity(name) {
                    Some(value) => converter.text(&value),
                    None => {
                        log::debug!("Unknown entity '&{};' kept as text", name);
                        converter.text(&format!("&{};", name));
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "XML parsing error at position {}: {}",
                    reader.error_position(),
                    e
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Lower-cased name and decoded attributes of a start tag
fn read_start(e: &BytesStart<'_>) -> Result<(String, Attributes)> {
    let name = utf8(e.name().as_ref())?.to_ascii_lowercase();
    let mut attrs = Attributes::new();
    for attr in e.html_attributes() {
        let attr = attr?;
        let key = utf8(attr.key.as_ref())?.to_ascii_lowercase();
        let value = utf8(&attr.value)?;
        attrs.set(key, decode_entities(value).into_owned());
    }
    Ok((name, attrs))
}

#[inline]
fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| Error::XmlError(format!("Invalid UTF-8: {}", e)))
}
