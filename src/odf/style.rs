//! ODF style objects used while converting.
//!
//! [`Style`] is a reference to a named paragraph, text or cell style, and knows
//! how to render itself as attributes of the element it applies to.
//! [`ListProperties`] and [`TableProperties`] describe the geometry of lists
//! and tables; list properties also render full `text:list-style` declarations.

use crate::common::unit::{Length, LengthUnit, PX_PER_CM, format_number};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Style family of a named ODF style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StyleFamily {
    Paragraph,
    Text,
    Table,
    TableColumn,
    TableCell,
}

impl StyleFamily {
    /// Value of the `style:family` attribute
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Text => "text",
            Self::Table => "table",
            Self::TableColumn => "table-column",
            Self::TableCell => "table-cell",
        }
    }

    /// Namespace of the `*:style-name` attribute referencing a style of this
    /// family
    const fn name_ns(&self) -> &'static str {
        match self {
            Self::TableCell | Self::Table | Self::TableColumn => "table",
            Self::Paragraph | Self::Text => "text",
        }
    }
}

/// A named ODF style, as applied to one converted element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Style {
    pub name: String,
    pub family: StyleFamily,
    /// Outline level, for heading styles
    pub outline_level: Option<u8>,
    /// Properties that child styles must copy, since cell styles cannot
    /// inherit them through `style:parent-style-name`
    pub defaults: Vec<(String, String)>,
}

impl Style {
    /// Create a style reference without defaults
    pub fn new(name: impl Into<String>, family: StyleFamily) -> Self {
        Self {
            name: name.into(),
            family,
            outline_level: None,
            defaults: Vec::new(),
        }
    }

    /// Set the outline level
    pub fn with_outline_level(mut self, level: u8) -> Self {
        self.outline_level = Some(level);
        self
    }

    /// Set the properties copied into child styles
    pub fn with_defaults<I, K, V>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.defaults = defaults.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Attributes applying this style to an element, e.g.
    /// ` text:style-name="podH1" text:outline-level="1"`.
    pub fn odf_attributes(&self) -> String {
        let mut out = String::with_capacity(self.name.len() + 24);
        let _ = write!(out, " {}:style-name=\"{}\"", self.family.name_ns(), self.name);
        if let Some(level) = self.outline_level {
            let _ = write!(out, " text:outline-level=\"{}\"", level);
        }
        out
    }

    /// Attributes a child style uses to derive from this one.
    ///
    /// Families supporting inheritance get `style:parent-style-name`. Cell
    /// styles do not inherit reliably in office suites, so their defaults are
    /// copied in extenso, minus the properties the child redefines.
    pub fn parent_attributes(&self, child_properties: &[&str]) -> String {
        if self.family != StyleFamily::TableCell {
            return format!(" style:parent-style-name=\"{}\"", self.name);
        }
        let mut out = String::new();
        for (name, value) in &self.defaults {
            if child_properties.contains(&name.as_str()) {
                continue;
            }
            let _ = write!(out, " {}=\"{}\"", name, value);
        }
        out
    }
}

// ============================================================================
// LIST PROPERTIES
// ============================================================================

/// Whether a list renders bullets or numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    #[default]
    Bulleted,
    Numbered,
}

impl ListKind {
    /// Kind implied by a source list tag (`ul` or `ol`)
    pub fn from_tag(tag: &str) -> Self {
        if tag == "ol" { Self::Numbered } else { Self::Bulleted }
    }

    fn level_type(&self) -> &'static str {
        match self {
            Self::Bulleted => "bullet",
            Self::Numbered => "number",
        }
    }

    fn text_style(&self) -> &'static str {
        match self {
            Self::Bulleted => "podBulletStyle",
            Self::Numbered => "podNumberStyle",
        }
    }

    /// Bullet characters or number formats used when none are configured
    pub fn default_formats(&self) -> &'static [&'static str] {
        match self {
            Self::Bulleted => &["\u{2022}", "\u{25e6}", "\u{25aa}"],
            Self::Numbered => &["1"],
        }
    }
}

/// Geometry and numbering of a list style.
///
/// Distances are in inches. When there are fewer formats (or suffixes) than
/// levels, they are applied cyclically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListProperties {
    pub kind: ListKind,
    /// Number of indentation levels declared
    pub levels: u8,
    /// Bullet characters or number formats; empty means the kind's defaults
    pub formats: Vec<String>,
    /// Number suffixes, numbered lists only
    pub suffixes: Vec<String>,
    /// Indentation added at every level
    pub delta: f64,
    /// Indentation of the first level, when different from `delta`
    pub first_delta: Option<f64>,
    /// Space between the label and the text
    pub space: f64,
    /// Paragraph style applied to the implicit paragraphs of the items
    pub para_style: Option<String>,
}

impl Default for ListProperties {
    fn default() -> Self {
        Self::new(ListKind::Bulleted)
    }
}

impl ListProperties {
    /// Create list properties with the default geometry for a kind
    pub fn new(kind: ListKind) -> Self {
        Self {
            kind,
            levels: 4,
            formats: Vec::new(),
            suffixes: vec![".".to_string()],
            delta: 0.32,
            first_delta: None,
            space: 0.32,
            para_style: None,
        }
    }

    /// Set explicit formats
    pub fn with_formats<I: IntoIterator<Item = S>, S: Into<String>>(mut self, formats: I) -> Self {
        self.formats = formats.into_iter().map(Into::into).collect();
        self
    }

    /// Set the style of the items' inner paragraphs
    pub fn with_para_style(mut self, style: impl Into<String>) -> Self {
        self.para_style = Some(style.into());
        self
    }

    fn format_at(&self, level: usize) -> &str {
        if self.formats.is_empty() {
            let defaults = self.kind.default_formats();
            defaults[level % defaults.len()]
        } else {
            &self.formats[level % self.formats.len()]
        }
    }

    fn suffix_at(&self, level: usize) -> &str {
        if self.suffixes.is_empty() {
            return ".";
        }
        &self.suffixes[level % self.suffixes.len()]
    }

    /// Render the `text:list-style` declaration named `name`
    ///
    /// # Examples
    ///
    /// ```
    /// use xhtml_odf::odf::style::{ListKind, ListProperties};
    ///
    /// let decl = ListProperties::new(ListKind::Numbered).dump_style("L1");
    /// assert!(decl.starts_with("<text:list-style style:name=\"L1\">"));
    /// assert!(decl.contains("style:num-suffix=\".\" style:num-format=\"1\""));
    /// ```
    pub fn dump_style(&self, name: &str) -> String {
        let level_type = self.kind.level_type();
        let space = format_number(self.space, 2, true);
        let mut levels = Vec::with_capacity(self.levels as usize);
        let mut space_before = 0.0;
        for i in 0..self.levels as usize {
            space_before += match self.first_delta {
                Some(first) if i == 0 => first,
                _ => self.delta,
            };
            let label = match self.kind {
                ListKind::Bulleted => format!("text:bullet-char=\"{}\"", self.format_at(i)),
                ListKind::Numbered => format!(
                    "style:num-suffix=\"{}\" style:num-format=\"{}\"",
                    self.suffix_at(i),
                    self.format_at(i)
                ),
            };
            levels.push(format!(
                "  <text:list-level-style-{lt} text:level=\"{lvl}\" text:style-name=\"{ts}\" {label}>\n    \
                 <style:list-level-properties text:space-before=\"{sb}in\" text:min-label-width=\"{space}in\"/>\n  \
                 </text:list-level-style-{lt}>",
                lt = level_type,
                lvl = i + 1,
                ts = self.kind.text_style(),
                sb = format_number(space_before, 2, true),
            ));
        }
        format!(
            "<text:list-style style:name=\"{}\">\n{}\n</text:list-style>",
            name,
            levels.join("\n")
        )
    }
}

// ============================================================================
// TABLE PROPERTIES
// ============================================================================

/// Column sizing delegated to the office suite instead of computed here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnModifier {
    /// Optimal column widths
    Optimize,
    /// Evenly distributed columns
    Distribute,
}

impl ColumnModifier {
    /// Prefix added to the table name so the post-processing step recognises it
    pub const fn prefix(&self) -> &'static str {
        match self {
            Self::Optimize => "OCW",
            Self::Distribute => "DC",
        }
    }
}

/// Geometry settings applied to converted tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProperties {
    /// Width available to tables, in cm; the converter's page width if unset
    pub page_width: Option<f64>,
    /// Pixels per centimetre for table widths
    pub px_per_cm: f64,
    /// Pixels per centimetre for cell paddings
    pub cell_px_per_cm: f64,
    /// Pixel widths above this are widened to 100%
    pub wide_above: Option<f64>,
    /// Minimum column width, as a fraction of the table width
    pub min_column_width: f64,
    pub column_modifier: Option<ColumnModifier>,
    /// Minimum cell padding, in cm
    pub min_cell_padding: f64,
    /// Inner paragraph style of `td` cells
    pub cell_content_style: String,
    /// Inner paragraph style of `th` cells
    pub header_content_style: String,
    /// Top, right, bottom and left margins, in cm
    pub margins: [f64; 4],
    /// Whether the table may not be split across pages
    pub unbreakable: bool,
    /// Whether a single row may not be split across pages
    pub unbreakable_rows: bool,
    /// Border applied to every cell, overriding the CSS border
    pub border: Option<String>,
    /// Whether these properties win over CSS values
    pub prevails: bool,
}

impl Default for TableProperties {
    fn default() -> Self {
        Self {
            page_width: None,
            px_per_cm: PX_PER_CM,
            cell_px_per_cm: 10.0,
            wide_above: Some(495.0),
            min_column_width: 0.07,
            column_modifier: None,
            min_cell_padding: 0.0,
            cell_content_style: "podCellContent".to_string(),
            header_content_style: "podHeaderCellContent".to_string(),
            margins: [0.0; 4],
            unbreakable: false,
            unbreakable_rows: false,
            border: None,
            prevails: false,
        }
    }
}

/// Margin directions, in the order of [`TableProperties::margins`]
pub const DIRECTIONS: [&str; 4] = ["top", "right", "bottom", "left"];

impl TableProperties {
    /// Effective table width.
    ///
    /// An absent or zero width means 100%. Unless `original` is set, pixel
    /// widths above `wide_above` are widened to 100% too.
    pub fn width(&self, declared: Option<Length>, original: bool) -> Length {
        let full = Length::new(100.0, LengthUnit::Percent);
        let Some(width) = declared.filter(|w| w.value() != 0.0) else {
            return full;
        };
        if original {
            return width;
        }
        if let Some(limit) = self.wide_above
            && width.unit_or_px() == LengthUnit::Pixel
            && width.value() > limit
        {
            return full;
        }
        width
    }

    /// Cell padding in cm for a `border-spacing` value, never below
    /// `min_cell_padding`
    pub fn cell_padding(&self, spacing: &Length) -> f64 {
        let value = match spacing.unit_or_px() {
            LengthUnit::Centimeter => spacing.value(),
            LengthUnit::Pixel => spacing.value() / self.cell_px_per_cm,
            _ => self.min_cell_padding,
        };
        value.max(self.min_cell_padding)
    }

    /// Margin attributes, e.g. ` fo:margin-top="0.50cm"`.
    ///
    /// `css` holds the CSS margins in cm, in [`DIRECTIONS`] order. Zero
    /// margins are omitted; `prevails` decides which source wins.
    pub fn margins(&self, css: [Option<f64>; 4]) -> String {
        let mut out = String::new();
        for (i, direction) in DIRECTIONS.iter().enumerate() {
            let css_value = css[i].filter(|v| *v != 0.0);
            let own = Some(self.margins[i]).filter(|v| *v != 0.0);
            let value = if self.prevails { own.or(css_value) } else { css_value.or(own) };
            if let Some(value) = value {
                let _ = write!(out, " fo:margin-{}=\"{:.2}cm\"", direction, value);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_attributes() {
        let heading = Style::new("podH2", StyleFamily::Paragraph).with_outline_level(2);
        assert_eq!(heading.odf_attributes(), " text:style-name=\"podH2\" text:outline-level=\"2\"");

        let cell = Style::new("podCell", StyleFamily::TableCell);
        assert_eq!(cell.odf_attributes(), " table:style-name=\"podCell\"");
    }

    #[test]
    fn test_parent_attributes() {
        let para = Style::new("Standard", StyleFamily::Paragraph);
        assert_eq!(para.parent_attributes(&[]), " style:parent-style-name=\"Standard\"");

        let cell = Style::new("podCell", StyleFamily::TableCell)
            .with_defaults([("fo:padding", "0.1cm"), ("fo:border", "0.018cm solid #000000")]);
        assert_eq!(cell.parent_attributes(&["fo:border"]), " fo:padding=\"0.1cm\"");
    }

    #[test]
    fn test_bulleted_list_style() {
        let decl = ListProperties::new(ListKind::Bulleted).dump_style("podBulletedList");
        assert_eq!(decl.matches("<text:list-level-style-bullet ").count(), 4);
        assert!(decl.contains(
            "text:level=\"1\" text:style-name=\"podBulletStyle\" text:bullet-char=\"\u{2022}\""
        ));
        // Formats cycle past the third level
        assert!(decl.contains(
            "text:level=\"4\" text:style-name=\"podBulletStyle\" text:bullet-char=\"\u{2022}\""
        ));
        assert!(decl.contains("text:space-before=\"0.64in\" text:min-label-width=\"0.32in\""));
    }

    #[test]
    fn test_first_delta() {
        let mut props = ListProperties::new(ListKind::Numbered).with_formats(["a"]);
        props.first_delta = Some(0.1);
        props.levels = 2;
        let decl = props.dump_style("L-lower-alpha");
        assert!(decl.contains("text:space-before=\"0.1in\""));
        assert!(decl.contains("text:space-before=\"0.42in\""));
        assert!(decl.contains("style:num-format=\"a\""));
    }

    #[test]
    fn test_table_width() {
        let props = TableProperties::default();
        assert!(props.width(None, false).is_percent());
        assert!(props.width(Some(Length::new(0.0, LengthUnit::Pixel)), false).is_percent());

        let wide = Length::new(600.0, LengthUnit::Pixel);
        assert!(props.width(Some(wide), false).is_percent());
        assert_eq!(props.width(Some(wide), true), wide);

        let narrow = Length::new(300.0, LengthUnit::Pixel);
        assert_eq!(props.width(Some(narrow), false), narrow);
    }

    #[test]
    fn test_cell_padding() {
        let mut props = TableProperties::default();
        assert_eq!(props.cell_padding(&Length::new(2.0, LengthUnit::Pixel)), 0.2);
        props.min_cell_padding = 0.3;
        assert_eq!(props.cell_padding(&Length::new(2.0, LengthUnit::Pixel)), 0.3);
        assert_eq!(props.cell_padding(&Length::new(1.0, LengthUnit::Em)), 0.3);
    }

    #[test]
    fn test_margins_precedence() {
        let mut props = TableProperties {
            margins: [0.5, 0.0, 0.0, 0.0],
            ..Default::default()
        };
        assert_eq!(props.margins([None; 4]), " fo:margin-top=\"0.50cm\"");
        assert_eq!(props.margins([Some(1.0), None, None, None]), " fo:margin-top=\"1.00cm\"");
        props.prevails = true;
        assert_eq!(props.margins([Some(1.0), None, None, None]), " fo:margin-top=\"0.50cm\"");
        assert_eq!(TableProperties::default().margins([None; 4]), "");
    }
}
