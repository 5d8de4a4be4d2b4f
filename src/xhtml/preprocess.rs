//! Text-level preparation of a fragment before parsing.
//!
//! The event source needs a single root element and well-formed XML. This
//! module wraps the fragment in a root paragraph, drops the control
//! characters XML forbids, optionally turns HTML void tags into self-closing
//! ones, and implements the keep-with-next class injection.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

/// HTML void tag, with an optional self-closing slash
static VOID_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)<(area|base|br|col|hr|img|input|link|meta|param|command|keygen|source)\b([^>]*?)(/)?\s*>",
    )
    .expect("Failed to compile void tag pattern")
});

/// Wrap a fragment in a root `<p>` and, for HTML input, self-close void tags.
///
/// # Examples
///
/// ```
/// use xhtml_odf::xhtml::preprocess::preprocess;
///
/// assert_eq!(preprocess("a<br>b", true), "<p>a<br/>b</p>");
/// assert_eq!(preprocess("a\u{c}b", false), "<p>ab</p>");
/// ```
pub fn preprocess(fragment: &str, html: bool) -> String {
    let mut wrapped = String::with_capacity(fragment.len() + 7);
    wrapped.push_str("<p>");
    wrapped.extend(fragment.chars().filter(|c| !matches!(c, '\u{c}' | '\u{b}')));
    wrapped.push_str("</p>");
    if html && let Cow::Owned(fixed) = html_to_xhtml(&wrapped) {
        return fixed;
    }
    wrapped
}

/// Self-close every HTML void tag that is not already self-closed
pub fn html_to_xhtml(s: &str) -> Cow<'_, str> {
    VOID_TAG.replace_all(s, |caps: &Captures<'_>| {
        if caps.get(3).is_some() {
            caps[0].to_string()
        } else {
            format!("<{}{}/>", &caps[1], &caps[2])
        }
    })
}

/// Add a keep-with-next class to the last paragraph or list item.
///
/// The last `<p` gets `ParaKWN`, the last `<li` gets `podItemKeepWithNext`,
/// whichever comes last. Nothing changes when that element, or anything after
/// it, already declares a class.
pub fn apply_keep_with_next(s: &str) -> Cow<'_, str> {
    let last_para = s.rfind("<p");
    let last_item = s.rfind("<li");
    let (index, tag_len, class) = match (last_para, last_item) {
        (None, None) => return Cow::Borrowed(s),
        (Some(p), Some(li)) if p > li => (p, 2, "ParaKWN"),
        (Some(p), None) => (p, 2, "ParaKWN"),
        (_, Some(li)) => (li, 3, "podItemKeepWithNext"),
    };
    if s[index..].contains("class=\"") {
        return Cow::Borrowed(s);
    }
    let at = index + tag_len;
    Cow::Owned(format!("{} class=\"{}\" {}", &s[..at], class, &s[at..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_void_tags() {
        assert_eq!(
            html_to_xhtml("<img src=\"a.png\"><br/><hr ><col span=\"2\">"),
            "<img src=\"a.png\"/><br/><hr/><col span=\"2\"/>"
        );
        // Prefix matches are not void tags
        assert_eq!(html_to_xhtml("<brief>x</brief>"), "<brief>x</brief>");
        assert_eq!(html_to_xhtml("<BR>"), "<BR/>");
    }

    #[test]
    fn test_xhtml_input_untouched() {
        assert_eq!(preprocess("<br>", false), "<p><br></p>");
    }

    #[test]
    fn test_keep_with_next_on_paragraph() {
        let s = preprocess("<p>a</p><p>b</p>", false);
        assert_eq!(apply_keep_with_next(&s), "<p><p>a</p><p class=\"ParaKWN\" >b</p></p>");
    }

    #[test]
    fn test_keep_with_next_on_item() {
        let s = "<p><ul><li>a</li></ul></p>";
        assert_eq!(
            apply_keep_with_next(s),
            "<p><ul><li class=\"podItemKeepWithNext\" >a</li></ul></p>"
        );
    }

    #[test]
    fn test_keep_with_next_respects_existing_class() {
        let s = "<p><p class=\"x\">a</p></p>";
        assert_eq!(apply_keep_with_next(s), s);
    }
}
