//! CSS declarations attached to source elements.
//!
//! A [`CssStyles`] gathers everything that styles one element: declarations
//! implied by the tag itself (`b` is bold), presentational HTML attributes
//! (`align`, `bgcolor`, ...), the `class` attribute and the inline `style`
//! attribute, in increasing order of precedence. No cascade is computed; the
//! converter folds styles explicitly where nesting matters.

pub mod odf;

use crate::common::unit::Length;
use crate::xhtml::Attributes;
use smallvec::SmallVec;

/// One CSS property value, kept as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssValue {
    raw: String,
}

impl CssValue {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The value as written, trimmed
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The value as a length, when it is one
    pub fn length(&self) -> Option<Length> {
        self.raw.parse().ok()
    }

    /// Whether the value is a space-separated list (`underline overline`)
    #[inline]
    pub fn is_multiple(&self) -> bool {
        self.raw.contains(' ')
    }
}

/// Presentational HTML attributes and the CSS property each one stands for
const HTML_ATTRIBUTES: &[(&str, &str)] = &[
    ("width", "width"),
    ("height", "height"),
    ("border", "border"),
    ("align", "text-align"),
    ("valign", "vertical-align"),
    ("cellspacing", "border-spacing"),
    ("bgcolor", "background-color"),
];

/// Declarations implied by a tag, before any attribute is considered
fn implied_declarations(tag: &str) -> Option<(&'static str, &'static str)> {
    match tag {
        "b" | "strong" => Some(("font-weight", "bold")),
        "i" | "em" => Some(("font-style", "italic")),
        "u" => Some(("text-decoration", "underline")),
        "s" | "strike" => Some(("text-decoration", "line-through")),
        "sub" => Some(("vertical-align", "sub")),
        "sup" => Some(("vertical-align", "super")),
        _ => None,
    }
}

/// Styles of one element: ordered declarations plus CSS classes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssStyles {
    declarations: SmallVec<[(String, CssValue); 4]>,
    classes: SmallVec<[String; 2]>,
}

impl CssStyles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect the styles of an element from its tag and attributes.
    ///
    /// Never fails: malformed declarations are skipped.
    ///
    /// # Examples
    ///
    /// ```
    /// use xhtml_odf::css::CssStyles;
    /// use xhtml_odf::xhtml::Attributes;
    ///
    /// let attrs: Attributes = [("style", "color: red; font-weight: normal"), ("class", "note")]
    ///     .into_iter()
    ///     .collect();
    /// let styles = CssStyles::from_element("b", &attrs);
    /// assert_eq!(styles.get("font-weight").map(|v| v.as_str()), Some("normal"));
    /// assert_eq!(styles.get("color").map(|v| v.as_str()), Some("red"));
    /// assert!(styles.has_class("note"));
    /// ```
    pub fn from_element(tag: &str, attrs: &Attributes) -> Self {
        let mut styles = Self::new();
        if let Some((name, value)) = implied_declarations(tag) {
            styles.set(name, value);
        }
        for (attr, property) in HTML_ATTRIBUTES {
            if let Some(value) = attrs.get(attr) {
                let value = value.trim();
                if !value.is_empty() {
                    styles.set(*property, value);
                }
            }
        }
        if let Some(classes) = attrs.get("class") {
            for class in classes.split_whitespace() {
                styles.add_class(class, true);
            }
        }
        if let Some(style) = attrs.get("style") {
            styles.parse_declarations(style);
        }
        styles
    }

    /// Parse a `style` attribute (`name: value; ...`) into these styles.
    pub fn parse_declarations(&mut self, style: &str) {
        for declaration in style.split(';') {
            let declaration = declaration.trim();
            if declaration.is_empty() {
                continue;
            }
            let Some((name, value)) = declaration.split_once(':') else {
                log::debug!("ignoring malformed CSS declaration '{}'", declaration);
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            let value = value.strip_suffix("!important").map(str::trim_end).unwrap_or(value);
            if name.is_empty() || value.is_empty() {
                log::debug!("ignoring malformed CSS declaration '{}'", declaration);
                continue;
            }
            self.set(name, value);
        }
    }

    /// Set a declaration, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = CssValue::new(value.into());
        match self.declarations.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.declarations.push((name, value)),
        }
    }

    /// Value of a declaration
    pub fn get(&self, name: &str) -> Option<&CssValue> {
        self.declarations.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Whether a declaration is present
    #[inline]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Remove a declaration, returning its value
    pub fn remove(&mut self, name: &str) -> Option<CssValue> {
        let pos = self.declarations.iter().position(|(n, _)| n == name)?;
        Some(self.declarations.remove(pos).1)
    }

    /// Declarations in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CssValue)> {
        self.declarations.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// CSS classes, in order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// The class used for style lookups: the last one
    pub fn last_class(&self) -> Option<&str> {
        self.classes.last().map(String::as_str)
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class at the end (`append`) or at the front of the class list.
    ///
    /// A class added at the front never takes precedence over the classes
    /// the element declares itself.
    pub fn add_class(&mut self, class: impl Into<String>, append: bool) {
        let class = class.into();
        if self.has_class(&class) {
            return;
        }
        if append {
            self.classes.push(class);
        } else {
            self.classes.insert(0, class);
        }
    }

    /// Merge other styles into these; the other declarations win.
    pub fn merge(&mut self, other: &CssStyles) {
        for (name, value) in &other.declarations {
            self.set(name.clone(), value.raw.clone());
        }
        for class in &other.classes {
            self.add_class(class.clone(), true);
        }
    }

    /// Whether there are neither declarations nor classes
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty() && self.classes.is_empty()
    }

    /// Whether at least one declaration is present (classes ignored)
    pub fn has_declarations(&self) -> bool {
        !self.declarations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attributes {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_implied_and_html_attributes() {
        let styles =
            CssStyles::from_element("td", &attrs(&[("align", "center"), ("bgcolor", "#eee")]));
        assert_eq!(styles.get("text-align").unwrap().as_str(), "center");
        assert_eq!(styles.get("background-color").unwrap().as_str(), "#eee");

        let styles = CssStyles::from_element("sup", &Attributes::new());
        assert_eq!(styles.get("vertical-align").unwrap().as_str(), "super");
    }

    #[test]
    fn test_malformed_declarations_are_skipped() {
        let styles =
            CssStyles::from_element("p", &attrs(&[("style", "color; :red; margin-left: 2cm;;")]));
        assert_eq!(styles.iter().count(), 1);
        assert_eq!(styles.get("margin-left").unwrap().length().unwrap().value(), 2.0);
    }

    #[test]
    fn test_important_is_stripped() {
        let styles = CssStyles::from_element("p", &attrs(&[("style", "Color: blue !important")]));
        assert_eq!(styles.get("color").unwrap().as_str(), "blue");
    }

    #[test]
    fn test_classes() {
        let mut styles = CssStyles::from_element("p", &attrs(&[("class", "a  b")]));
        assert_eq!(styles.last_class(), Some("b"));
        styles.add_class("podCellContent", false);
        assert_eq!(styles.classes(), ["podCellContent", "a", "b"]);
        styles.add_class("b", false);
        assert_eq!(styles.classes().len(), 3);
    }

    #[test]
    fn test_merge_overrides() {
        let mut outer = CssStyles::from_element("b", &Attributes::new());
        let inner = CssStyles::from_element(
            "span",
            &attrs(&[("style", "font-weight: normal; color: red")]),
        );
        outer.merge(&inner);
        assert_eq!(outer.get("font-weight").unwrap().as_str(), "normal");
        assert_eq!(outer.get("color").unwrap().as_str(), "red");
        assert!(!outer.is_empty());
        assert!(CssStyles::new().is_empty());
    }
}
