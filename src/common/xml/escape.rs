use aho_corasick::AhoCorasick;
use memchr::memchr;
use once_cell::sync::Lazy;
use phf::{Map, phf_map};
use std::borrow::Cow;

// Static initialization: automaton is built only once, thread-safe
static XML_ESCAPER: Lazy<AhoCorasick> = Lazy::new(|| {
    AhoCorasick::builder()
        .build(["&", "<", ">", "\"", "'"])
        .expect("Failed to build XML escaper")
});

/// Named character references accepted in source fragments.
///
/// The five XML entities plus the HTML ones that rich-text editors commonly
/// produce. Anything else is kept verbatim.
static ENTITIES: Map<&'static str, &'static str> = phf_map! {
    "amp" => "&", "lt" => "<", "gt" => ">", "quot" => "\"", "apos" => "'",
    "nbsp" => "\u{a0}", "ensp" => "\u{2002}", "emsp" => "\u{2003}",
    "thinsp" => "\u{2009}", "zwnj" => "\u{200c}", "zwj" => "\u{200d}",
    "lrm" => "\u{200e}", "rlm" => "\u{200f}", "shy" => "\u{ad}",
    "copy" => "©", "reg" => "®", "trade" => "™", "euro" => "€",
    "pound" => "£", "yen" => "¥", "cent" => "¢", "sect" => "§",
    "para" => "¶", "deg" => "°", "plusmn" => "±", "times" => "×",
    "divide" => "÷", "middot" => "·", "bull" => "•", "hellip" => "…",
    "ndash" => "–", "mdash" => "—", "lsquo" => "‘", "rsquo" => "’",
    "sbquo" => "‚", "ldquo" => "“", "rdquo" => "”", "bdquo" => "„",
    "laquo" => "«", "raquo" => "»", "iexcl" => "¡", "iquest" => "¿",
    "ordf" => "ª", "ordm" => "º", "sup1" => "¹", "sup2" => "²",
    "sup3" => "³", "frac14" => "¼", "frac12" => "½", "frac34" => "¾",
    "agrave" => "à", "aacute" => "á", "acirc" => "â", "atilde" => "ã",
    "auml" => "ä", "aring" => "å", "aelig" => "æ", "ccedil" => "ç",
    "egrave" => "è", "eacute" => "é", "ecirc" => "ê", "euml" => "ë",
    "igrave" => "ì", "iacute" => "í", "icirc" => "î", "iuml" => "ï",
    "ntilde" => "ñ", "ograve" => "ò", "oacute" => "ó", "ocirc" => "ô",
    "otilde" => "õ", "ouml" => "ö", "oslash" => "ø", "ugrave" => "ù",
    "uacute" => "ú", "ucirc" => "û", "uuml" => "ü", "yacute" => "ý",
    "yuml" => "ÿ", "szlig" => "ß", "Agrave" => "À", "Aacute" => "Á",
    "Acirc" => "Â", "Auml" => "Ä", "Ccedil" => "Ç", "Egrave" => "È",
    "Eacute" => "É", "Ecirc" => "Ê", "Ouml" => "Ö", "Uuml" => "Ü",
    "larr" => "←", "rarr" => "→", "uarr" => "↑", "darr" => "↓",
    "harr" => "↔", "le" => "≤", "ge" => "≥", "ne" => "≠", "infin" => "∞",
};

/// Escape XML special characters.
///
/// # Examples
///
/// ```
/// use xhtml_odf::common::xml::escape_xml;
/// assert_eq!(escape_xml("a & b"), "a &amp; b");
/// assert_eq!(escape_xml("<tag>\"hello\"</tag>"), "&lt;tag&gt;&quot;hello&quot;&lt;/tag&gt;");
/// ```
#[inline]
pub fn escape_xml(s: &str) -> String {
    XML_ESCAPER.replace_all(s, &["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"])
}

/// Resolve a single character reference body (the part between `&` and `;`).
///
/// Handles numeric references (`#160`, `#xA0`) and the named entities of
/// [`ENTITIES`]. Returns `None` for anything unknown.
pub fn resolve_entity(name: &str) -> Option<Cow<'static, str>> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(|c| Cow::Owned(c.to_string()));
    }
    ENTITIES.get(name).map(|s| Cow::Borrowed(*s))
}

/// Decode character references in raw markup text or attribute values.
///
/// Unknown or malformed references are left unchanged.
///
/// # Examples
///
/// ```
/// use xhtml_odf::common::xml::decode_entities;
/// assert_eq!(decode_entities("&lt;a &amp; b&gt;"), "<a & b>");
/// assert_eq!(decode_entities("caf&eacute;&#33;"), "café!");
/// assert_eq!(decode_entities("&invalid;"), "&invalid;");
/// assert_eq!(decode_entities("a & b"), "a & b");
/// ```
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    let Some(first) = memchr(b'&', bytes) else {
        return Cow::Borrowed(s);
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut pos = first;
    while pos < bytes.len() {
        let Some(rel) = memchr(b'&', &bytes[pos..]) else {
            out.push_str(&s[pos..]);
            break;
        };
        let amp = pos + rel;
        out.push_str(&s[pos..amp]);
        // References longer than this are not references
        let window_end = (amp + 34).min(bytes.len());
        let resolved = memchr(b';', &bytes[amp + 1..window_end]).and_then(|semi| {
            let name = &s[amp + 1..amp + 1 + semi];
            resolve_entity(name).map(|value| (value, semi))
        });
        match resolved {
            Some((value, semi)) => {
                out.push_str(&value);
                pos = amp + semi + 2;
            }
            None => {
                out.push('&');
                pos = amp + 1;
            }
        }
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_numeric_entities() {
        assert_eq!(resolve_entity("#160").as_deref(), Some("\u{a0}"));
        assert_eq!(resolve_entity("#x41").as_deref(), Some("A"));
        assert_eq!(resolve_entity("#xZZ"), None);
    }

    #[test]
    fn test_decode_entities_borrowed_when_plain() {
        assert!(matches!(decode_entities("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_decode_trailing_ampersand() {
        assert_eq!(decode_entities("fish &"), "fish &");
        assert_eq!(decode_entities("&nbsp"), "&nbsp");
    }
}
