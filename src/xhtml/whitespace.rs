//! Whitespace collapsing for text runs.

/// Collapse every whitespace run of `text` into a single space.
///
/// `previous` is the text already pending in front of `text`: when it ends
/// with whitespace, a leading run of `text` is dropped entirely, so runs
/// spanning several text events still collapse to one space.
///
/// # Examples
///
/// ```
/// use xhtml_odf::xhtml::whitespace::crunch;
///
/// assert_eq!(crunch("  a \n\t b ", ""), " a b ");
/// assert_eq!(crunch("  b", "a "), "b");
/// ```
pub fn crunch(text: &str, previous: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = previous.chars().next_back().is_some_and(|c| c.is_ascii_whitespace());
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
                in_space = true;
            }
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crunch_runs() {
        assert_eq!(crunch("a  b\n\nc", ""), "a b c");
        assert_eq!(crunch("\n", ""), " ");
        assert_eq!(crunch("", "x "), "");
    }

    #[test]
    fn test_crunch_against_previous() {
        assert_eq!(crunch(" \n b", "a"), " b");
        assert_eq!(crunch(" \n b", "a\t"), "b");
        assert_eq!(crunch("   ", "a "), "");
    }
}
