//! CSS to ODF property mapping.
//!
//! Translates the declarations of a [`CssStyles`] into `fo:`/`style:`
//! formatting properties. Only properties with an ODF counterpart survive;
//! lengths are converted to centimetres, keyword values are mapped to their
//! ODF spelling and unsupported keywords are dropped.

use super::{CssStyles, CssValue};
use crate::common::unit::{Length, LengthUnit, PX_PER_CM, format_number};
use phf::{Map, phf_map};
use smallvec::SmallVec;

/// An ODF formatting property, e.g. `("fo:font-weight", "bold")`
pub type OdfProperty = (&'static str, String);

/// How a CSS property translates
enum Target {
    /// Same value, converted, under another name
    Property(&'static str),
    /// The ODF property depends on the keyword
    Keyword(&'static Map<&'static str, (&'static str, &'static str)>),
}

static VERTICAL_ALIGN: Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "top" => ("style:vertical-align", "top"),
    "middle" => ("style:vertical-align", "middle"),
    "bottom" => ("style:vertical-align", "bottom"),
    "super" => ("style:text-position", "super 58%"),
    "sub" => ("style:text-position", "sub 58%"),
};

static TEXT_DECORATION: Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "underline" => ("style:text-underline-style", "solid"),
    "line-through" => ("style:text-line-through-style", "solid"),
    "overline" => ("style:text-overline-style", "solid"),
};

static BREAK_AFTER: Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "always" => ("fo:break-after", "page"),
};

static BREAK_BEFORE: Map<&'static str, (&'static str, &'static str)> = phf_map! {
    "always" => ("fo:break-before", "page"),
};

fn target(name: &str) -> Option<Target> {
    let property = match name {
        "margin-left" => "fo:margin-left",
        "margin-right" => "fo:margin-right",
        "margin-top" => "fo:margin-top",
        "margin-bottom" => "fo:margin-bottom",
        "text-align" => "fo:text-align",
        "text-indent" => "fo:text-indent",
        "background-color" => "fo:background-color",
        "color" => "fo:color",
        "font-size" => "fo:font-size",
        "font-variant" => "fo:font-variant",
        "font-weight" => "fo:font-weight",
        "font-style" => "fo:font-style",
        "border" => "fo:border",
        "border-spacing" => "fo:padding",
        "line-height" => "style:line-spacing",
        "vertical-align" => return Some(Target::Keyword(&VERTICAL_ALIGN)),
        "text-decoration" => return Some(Target::Keyword(&TEXT_DECORATION)),
        "page-break-after" => return Some(Target::Keyword(&BREAK_AFTER)),
        "page-break-before" => return Some(Target::Keyword(&BREAK_BEFORE)),
        _ => return None,
    };
    Some(Target::Property(property))
}

/// Keyword translations for unitless values. `*` keeps unknown keywords.
static TEXT_ALIGN_VALUES: Map<&'static str, &'static str> = phf_map! {
    "left" => "start",
    "start" => "start",
    "center" => "center",
    "right" => "end",
    "end" => "end",
    "justify" => "justify",
    "match-parent" => "start",
};

static BORDER_VALUES: Map<&'static str, &'static str> = phf_map! {
    "0" => "none",
    "undefined" => "none",
    "*" => "*",
};

static FONT_SIZE_VALUES: Map<&'static str, &'static str> = phf_map! {
    "medium" => "100%",
    "xx-small" => "55%",
    "x-small" => "70%",
    "small" => "85%",
    "large" => "115%",
    "x-large" => "130%",
    "xx-large" => "145%",
    "smaller" => "85%",
    "larger" => "115%",
    "initial" => "100%",
    "inherit" => "100%",
};

static LINE_HEIGHT_VALUES: Map<&'static str, &'static str> = phf_map! {
    "normal" => "normal",
    "initial" => "normal",
    "inherit" => "normal",
};

fn keyword_values(name: &str) -> Option<&'static Map<&'static str, &'static str>> {
    match name {
        "text-align" => Some(&TEXT_ALIGN_VALUES),
        "border" => Some(&BORDER_VALUES),
        "font-size" => Some(&FONT_SIZE_VALUES),
        "line-height" => Some(&LINE_HEIGHT_VALUES),
        _ => None,
    }
}

/// Properties that always belong to `style:text-properties`
const TEXT_PROPERTIES: &[&str] = &[
    "fo:color",
    "fo:font-size",
    "fo:font-variant",
    "fo:font-weight",
    "fo:font-style",
    "style:text-underline-style",
    "style:text-line-through-style",
    "style:text-overline-style",
    "style:text-position",
];

/// Properties of a table cell that do not move to its inner paragraph
pub const CELL_PROPERTIES: &[&str] = &[
    "fo:padding",
    "fo:border",
    "fo:background-color",
    "style:vertical-align",
];

/// Whether an ODF property goes to `style:text-properties`.
///
/// A background colour is a text property except on paragraph-like and list
/// elements (`block` set), where it colours the whole block.
pub fn is_text_property(name: &str, block: bool) -> bool {
    if name == "fo:background-color" {
        return !block;
    }
    TEXT_PROPERTIES.contains(&name)
}

/// Translate the declarations of `styles` into ODF properties.
///
/// `in_table` tells whether the element lies in a table, where negative
/// indents and left margins are ignored.
///
/// # Examples
///
/// ```
/// use xhtml_odf::css::{CssStyles, odf::to_odf};
///
/// let mut styles = CssStyles::new();
/// styles.parse_declarations("text-align: right; font-size: 12pt; text-decoration: underline overline");
/// let props = to_odf(&styles, false);
/// assert!(props.contains(&("fo:text-align", "end".to_string())));
/// assert!(props.contains(&("style:text-overline-style", "solid".to_string())));
/// ```
pub fn to_odf(styles: &CssStyles, in_table: bool) -> SmallVec<[OdfProperty; 4]> {
    let mut out = SmallVec::new();
    for (name, value) in styles.iter() {
        if is_combined(name, value) {
            // Shorthand values are only understood for borders
            if name == "border" {
                convert(&mut out, name, value.as_str(), in_table);
            }
        } else if value.is_multiple() {
            for part in value.as_str().split_whitespace() {
                convert(&mut out, name, part, in_table);
            }
        } else {
            convert(&mut out, name, value.as_str(), in_table);
        }
    }
    out
}

fn is_combined(name: &str, value: &CssValue) -> bool {
    matches!(name, "background" | "border") && value.is_multiple()
}

fn convert(out: &mut SmallVec<[OdfProperty; 4]>, name: &str, value: &str, in_table: bool) {
    let Some(target) = target(name) else {
        return;
    };
    let odf_name = match target {
        Target::Keyword(map) => {
            if let Some((odf_name, odf_value)) = map.get(value) {
                out.push((*odf_name, (*odf_value).to_string()));
            }
            return;
        }
        Target::Property(odf_name) => odf_name,
    };

    let length: Option<Length> = value.parse().ok();
    if in_table
        && matches!(name, "text-indent" | "margin-left")
        && length.is_some_and(|l| l.value() < 0.0)
    {
        return;
    }

    match length.and_then(|l| l.unit().map(|unit| (l, unit))) {
        Some((length, LengthUnit::Percent)) => {
            out.push((odf_name, format!("{}%", format_number(length.value(), 2, true))));
        }
        Some((length, _)) => {
            let ratio = if name == "line-height" { PX_PER_CM * 2.0 } else { PX_PER_CM };
            match length.to_cm(ratio) {
                Some(cm) => out.push((odf_name, format!("{}cm", format_number(cm, 2, true)))),
                None => log::debug!("ignoring relative length '{}' for {}", value, name),
            }
        }
        None => {
            let Some(values) = keyword_values(name) else {
                out.push((odf_name, value.to_string()));
                return;
            };
            if let Some(mapped) = values.get(value) {
                out.push((odf_name, (*mapped).to_string()));
            } else if let Some(fallback) = values.get("*") {
                let kept = if *fallback == "*" { value } else { fallback };
                out.push((odf_name, kept.to_string()));
            } else {
                log::debug!("ignoring unsupported value '{}' for {}", value, name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn odf(style: &str, in_table: bool) -> Vec<OdfProperty> {
        let mut styles = CssStyles::new();
        styles.parse_declarations(style);
        to_odf(&styles, in_table).into_vec()
    }

    fn prop(name: &'static str, value: &str) -> OdfProperty {
        (name, value.to_string())
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            odf("vertical-align: super", false),
            vec![prop("style:text-position", "super 58%")]
        );
        assert_eq!(odf("vertical-align: baseline", false), vec![]);
        assert_eq!(odf("page-break-before: always", false), vec![prop("fo:break-before", "page")]);
        assert_eq!(odf("text-align: left", false), vec![prop("fo:text-align", "start")]);
        assert_eq!(odf("text-align: inherit", false), vec![]);
    }

    #[test]
    fn test_lengths_become_cm() {
        assert_eq!(odf("margin-top: 10mm", false), vec![prop("fo:margin-top", "1cm")]);
        assert_eq!(odf("font-size: 150%", false), vec![prop("fo:font-size", "150%")]);
        assert_eq!(odf("font-size: x-large", false), vec![prop("fo:font-size", "130%")]);
        assert_eq!(odf("text-indent: 2em", false), vec![]);
    }

    #[test]
    fn test_borders() {
        assert_eq!(odf("border: 0", false), vec![prop("fo:border", "none")]);
        assert_eq!(odf("border: 1px solid #000", false), vec![prop("fo:border", "1px solid #000")]);
        assert_eq!(odf("border: thin", false), vec![prop("fo:border", "thin")]);
    }

    #[test]
    fn test_negative_indent_in_tables() {
        assert_eq!(odf("margin-left: -1cm", true), vec![]);
        assert_eq!(odf("margin-left: -1cm", false), vec![prop("fo:margin-left", "-1cm")]);
    }

    #[test]
    fn test_unknown_properties_and_plain_values() {
        assert_eq!(odf("float: left; color: #ff0000", false), vec![prop("fo:color", "#ff0000")]);
    }

    #[test]
    fn test_text_property_classification() {
        assert!(is_text_property("fo:font-weight", true));
        assert!(!is_text_property("fo:margin-left", false));
        assert!(is_text_property("fo:background-color", false));
        assert!(!is_text_property("fo:background-color", true));
    }
}
