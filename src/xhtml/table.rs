//! Table conversion state.
//!
//! A [`TableBuilder`] is opened per source `table`. It owns the table's output
//! buffer, tracks the column cursor and the amount of text found in every
//! column, and computes relative column widths once the table is closed.
//!
//! Column declarations (`table:table-column`) must precede the rows, but the
//! number of columns is only known once the first row is complete. Output
//! produced before that point goes to a temporary buffer, moved after the
//! column declarations when the first row closes.

use crate::common::unit::{Length, LengthUnit, format_number};
use crate::css::CssStyles;
use crate::odf::registry::{NameAllocator, StyleRegistry, StyleTarget};
use crate::odf::style::TableProperties;
use crate::xhtml::Attributes;
use std::fmt::Write;

/// Sum of the relative widths of all columns of a table
pub const TOTAL_COLUMN_WIDTH: u32 = 65534;

/// Longest word accounted for in a column
const MAX_LONGEST_WORD: usize = 25;

/// Minimum content size of a visited column
const MIN_CONTENT_SIZE: usize = 5;

/// Where the table is placed and what the page offers
#[derive(Debug, Clone, Copy)]
pub struct TableGeometry {
    /// Available page width, in cm
    pub page_width: f64,
}

#[derive(Debug)]
pub struct TableBuilder {
    /// Name of the ODF table, modifier prefix included
    pub(crate) name: String,
    /// Name of the table style
    pub(crate) style: String,
    pub(crate) props: TableProperties,
    /// Whether cells get a default border
    pub(crate) border: bool,
    pub(crate) border_spacing: Option<Length>,
    /// Table start tag, column declarations, then rows
    res: String,
    /// Output produced before the first row is complete
    temp: String,
    first_row_parsed: bool,
    columns: usize,
    /// Index of the last column covered by the current cell
    cell_index: Option<usize>,
    /// Column span of the current cell, 0 outside cells
    in_cell: usize,
    cell_content_size: usize,
    cell_longest_word: usize,
    column_sizes: Vec<Option<usize>>,
    column_longest_words: Vec<Option<usize>>,
    column_widths: Vec<Option<Length>>,
    width_px: f64,
    original_width_px: Option<f64>,
    /// The name carries row-keeping information for a post-processing step
    pub(crate) keep_rows: bool,
}

impl TableBuilder {
    /// Open a table.
    ///
    /// `styles` are the table's styles; `border-spacing` is taken out of
    /// them since it configures cells. The table style, if one is needed, is
    /// registered right away.
    pub fn open(
        styles: &mut CssStyles,
        attrs: &Attributes,
        props: TableProperties,
        geometry: TableGeometry,
        names: &dyn NameAllocator,
        registry: &dyn StyleRegistry,
    ) -> Self {
        let mut name = names.unique_name("table");
        let keep_rows = match attrs.get("keeprows") {
            Some(rows) => {
                name = format!("{}({})", name, rows);
                true
            }
            None => false,
        };
        let border = has_border(styles);
        let border_spacing = styles.remove("border-spacing").and_then(|v| v.length());
        let mut table = Self {
            name,
            style: "podTable".to_string(),
            props,
            border,
            border_spacing,
            res: String::new(),
            temp: String::new(),
            first_row_parsed: false,
            columns: 0,
            cell_index: None,
            in_cell: 0,
            cell_content_size: 0,
            cell_longest_word: 0,
            column_sizes: Vec::new(),
            column_longest_words: Vec::new(),
            column_widths: Vec::new(),
            width_px: 0.0,
            original_width_px: None,
            keep_rows,
        };
        table.set_table_style(styles, geometry, registry);
        if let Some(modifier) = table.props.column_modifier {
            table.name = format!("{}_{}", modifier.prefix(), table.name);
        }
        table
    }

    fn set_table_style(
        &mut self,
        styles: &CssStyles,
        geometry: TableGeometry,
        registry: &dyn StyleRegistry,
    ) {
        let props = &self.props;
        let has_width = styles.has("width");
        let declared = styles.get("width").and_then(|v| v.length());
        let width = props.width(declared, false);
        let original = props.width(declared, true);
        let align = styles.get("text-align").map_or("left", |v| v.as_str());
        let page_width = props.page_width.unwrap_or(geometry.page_width);
        let ratio = props.px_per_cm;

        let (table_cm, percentage) = if width.is_percent() {
            (page_width * width.value() / 100.0, format_number(width.value(), 2, true))
        } else {
            let cm = width.to_cm(ratio).unwrap_or(width.value() / ratio).min(page_width);
            (cm, format_number(cm / page_width * 100.0, 2, true))
        };
        self.width_px = (table_cm * ratio).trunc();
        if !original.is_percent() && original.unit_or_px() == LengthUnit::Pixel {
            self.original_width_px = Some(original.value().trunc());
        }

        let mut css_margins = [None; 4];
        for (i, direction) in crate::odf::style::DIRECTIONS.iter().enumerate() {
            css_margins[i] = styles
                .get(&format!("margin-{}", direction))
                .and_then(|v| v.length())
                .and_then(|l| l.to_cm(ratio));
        }
        let margins = props.margins(css_margins);
        let keep_with_next = if styles.has_class("TableKWN") {
            " fo:keep-with-next=\"always\""
        } else {
            ""
        };
        let unbreakable = if props.unbreakable {
            " style:may-break-between-rows=\"false\""
        } else {
            ""
        };
        if !has_width
            && margins.is_empty()
            && keep_with_next.is_empty()
            && unbreakable.is_empty()
            && align == "left"
        {
            return;
        }
        registry.register(
            StyleTarget::Content,
            format!(
                "<style:style style:name=\"{name}\" style:family=\"table\" style:parent-style-name=\"podTable\">\
                 <style:table-properties style:width=\"{width}cm\" style:rel-width=\"{percentage}%\" \
                 table:align=\"{align}\"{margins}{keep_with_next}{unbreakable}/></style:style>",
                name = self.name,
                width = format_number(table_cm, 2, true),
            ),
        );
        self.style = self.name.clone();
    }

    /// Start tag of the ODF table
    pub fn start_tag(&self) -> String {
        format!("<table:table table:name=\"{}\" table:style-name=\"{}\">", self.name, self.style)
    }

    /// Number of columns, known once the first row is complete
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Whether text is currently written inside a cell of this table
    #[inline]
    pub fn in_cell(&self) -> bool {
        self.in_cell > 0
    }

    /// Border written on cells when neither the cell nor the properties
    /// define one
    pub fn cell_border(&self) -> &str {
        match &self.props.border {
            Some(border) => border,
            None if self.border => "0.05pt solid #000000",
            None => "0",
        }
    }

    /// Buffer output currently goes to
    pub(crate) fn buffer_mut(&mut self) -> &mut String {
        if self.res.is_empty() || self.first_row_parsed { &mut self.res } else { &mut self.temp }
    }

    /// Buffer output currently goes to, for reading
    pub(crate) fn buffer(&self) -> &str {
        if self.res.is_empty() || self.first_row_parsed { &self.res } else { &self.temp }
    }

    pub(crate) fn write(&mut self, s: &str) {
        self.buffer_mut().push_str(s);
    }

    /// Enter a cell (or `col`) spanning `colspan` columns. `width` is the
    /// cell's declared width; it sizes the column when the cell spans one
    /// column and no earlier cell sized it.
    pub fn enter_cell(&mut self, colspan: usize, width: Option<Length>) {
        let colspan = colspan.max(1);
        self.in_cell = colspan;
        let index = self.cell_index.map_or(colspan - 1, |i| i + colspan);
        self.cell_index = Some(index);
        if !self.first_row_parsed {
            self.columns += colspan;
        }
        if let Some(width) = width
            && colspan == 1
        {
            if self.column_widths.len() <= index {
                self.column_widths.resize(index + 1, None);
            }
            if self.column_widths[index].is_none() {
                self.column_widths[index] = Some(width);
            }
        }
    }

    /// Account text written in the current cell
    pub fn add_content(&mut self, size: usize, longest_word: usize) {
        self.cell_content_size += size;
        self.cell_longest_word = self.cell_longest_word.max(longest_word);
    }

    /// Leave a cell, recording its content size in its column
    pub fn exit_cell(&mut self) {
        let colspan = self.in_cell.max(1);
        if let Some(index) = self.cell_index {
            let size = self.cell_content_size / colspan;
            let longest = self.cell_longest_word / colspan;
            if self.column_sizes.len() <= index {
                self.column_sizes.resize(index + 1, None);
                self.column_longest_words.resize(index + 1, None);
            }
            let current = self.column_sizes[index].unwrap_or(0);
            self.column_sizes[index] = Some(current.max(size).max(MIN_CONTENT_SIZE));
            let word = self.column_longest_words[index].unwrap_or(0);
            self.column_longest_words[index] =
                Some(word.max(longest).max(MIN_CONTENT_SIZE).min(MAX_LONGEST_WORD));
        }
        self.leave_column();
    }

    /// Leave a `col`, or a cell whose content does not count
    pub fn leave_column(&mut self) {
        self.in_cell = 0;
        self.cell_content_size = 0;
        self.cell_longest_word = 0;
    }

    /// End of a row: the column cursor goes back to the start. The first
    /// complete row fixes the number of columns and releases the column
    /// declarations.
    pub fn close_row(&mut self) {
        self.cell_index = None;
        if self.first_row_parsed || self.columns == 0 {
            return;
        }
        self.first_row_parsed = true;
        for i in 1..=self.columns {
            let _ = write!(
                self.res,
                "<table:table-column table:style-name=\"{}.{}\"/>",
                self.name, i
            );
        }
        let temp = std::mem::take(&mut self.temp);
        self.res.push_str(&temp);
    }

    /// Compute and register the relative width of every column.
    ///
    /// Declared widths are used when they are usable (pixels or percentages,
    /// strictly between the minimum and maximum fractions); the remaining
    /// width is shared by the other columns in proportion to their softened
    /// content size. Weights always sum to [`TOTAL_COLUMN_WIDTH`].
    pub fn compute_column_styles(&self, registry: &dyn StyleRegistry) -> Vec<u32> {
        let weights = self.column_weights();
        for (i, weight) in weights.iter().enumerate() {
            registry.register(
                StyleTarget::Content,
                format!(
                    "<style:style style:name=\"{}.{}\" style:family=\"table-column\">\
                     <style:table-column-properties style:rel-column-width=\"{}*\"/></style:style>",
                    self.name,
                    i + 1,
                    weight
                ),
            );
        }
        weights
    }

    fn column_weights(&self) -> Vec<u32> {
        let n = self.columns;
        if n == 0 {
            return Vec::new();
        }
        let min = (1.0 / (2.0 * n as f64)).min(self.props.min_column_width);
        let max = 1.0 - min;
        let table_width = self.original_width_px.filter(|w| *w > 0.0).unwrap_or(self.width_px);

        let mut widths: Vec<Option<f64>> = (0..n)
            .map(|i| {
                let width = self.column_widths.get(i).copied().flatten()?;
                let fraction = match width.unit_or_px() {
                    LengthUnit::Pixel if table_width > 0.0 => width.value() / table_width,
                    LengthUnit::Percent => width.value() / 100.0,
                    _ => return None,
                };
                (fraction > min && fraction < max).then_some(fraction)
            })
            .collect();
        let mut remaining = 1.0 - widths.iter().flatten().sum::<f64>();
        let unset = widths.iter().filter(|w| w.is_none()).count();
        if unset > 0 && remaining < min * unset as f64 {
            log::debug!(
                "Declared column widths of table {} leave no room; ignoring them",
                self.name
            );
            widths.iter_mut().for_each(|w| *w = None);
            remaining = 1.0;
        }

        let declared: Vec<bool> = widths.iter().map(Option::is_some).collect();
        let sizes: Vec<f64> = (0..n)
            .map(|i| soften(self.column_sizes.get(i).copied().flatten().unwrap_or(0)))
            .collect();
        let content_total: f64 = (0..n).filter(|i| widths[*i].is_none()).map(|i| sizes[i]).sum();

        // Columns below the minimum are raised to it; the surplus comes out of
        // the other content-sized columns
        let mut forced = vec![false; n];
        let mut surplus = 0.0;
        let mut free = 0usize;
        for i in 0..n {
            if widths[i].is_some() {
                continue;
            }
            let share = if content_total > 0.0 {
                sizes[i] / content_total * remaining
            } else {
                0.0
            };
            if sizes[i] == 0.0 || share < min {
                surplus += min - share.min(min);
                forced[i] = true;
                widths[i] = Some(min);
            } else {
                free += 1;
                widths[i] = Some(share);
            }
        }
        if surplus > 0.0 && free > 0 {
            let deduction = surplus / free as f64;
            for i in (0..n).filter(|i| !forced[*i] && !declared[*i]) {
                if let Some(w) = widths[i].as_mut() {
                    *w = (*w - deduction).max(0.0);
                }
            }
        }
        let fractions: Vec<f64> = widths.into_iter().map(|w| w.unwrap_or(0.0)).collect();
        log::trace!("Table {} column fractions: {:?}", self.name, fractions);
        scale_weights(&fractions, TOTAL_COLUMN_WIDTH)
    }

    /// Complete output of the table, end tag excluded
    pub fn finish(mut self) -> String {
        if !self.first_row_parsed {
            let temp = std::mem::take(&mut self.temp);
            self.res.push_str(&temp);
        }
        self.res
    }
}

/// Dampen content sizes so long cells do not crush short ones
fn soften(size: usize) -> f64 {
    if size == 0 {
        return 0.0;
    }
    let size = size as f64;
    let value = if size < 5.0 {
        10.0
    } else if size < 50.0 {
        size * 2.5
    } else {
        size.min(1000.0)
    };
    value.ln().powi(3).floor()
}

/// Scale fractions to integers summing exactly to `total`, distributing the
/// rounding remainder by largest fractional part. All-zero fractions give
/// equal weights.
pub fn scale_weights(fractions: &[f64], total: u32) -> Vec<u32> {
    let n = fractions.len();
    if n == 0 {
        return Vec::new();
    }
    let sum: f64 = fractions.iter().filter(|f| f.is_finite() && **f > 0.0).sum();
    let exact: Vec<f64> = if sum > 0.0 {
        fractions
            .iter()
            .map(|f| if f.is_finite() && *f > 0.0 { f / sum * total as f64 } else { 0.0 })
            .collect()
    } else {
        vec![total as f64 / n as f64; n]
    };
    let mut weights: Vec<u32> = exact.iter().map(|e| e.floor() as u32).collect();
    let assigned: u32 = weights.iter().sum();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|a, b| {
        let ra = exact[*a] - exact[*a].floor();
        let rb = exact[*b] - exact[*b].floor();
        rb.total_cmp(&ra).then(a.cmp(b))
    });
    for i in order.into_iter().cycle().take(total.saturating_sub(assigned) as usize) {
        weights[i] += 1;
    }
    weights
}

/// A table has a border unless its CSS says otherwise
fn has_border(styles: &CssStyles) -> bool {
    match styles.get("border") {
        Some(value) => {
            let value = value.as_str();
            value != "0" && !value.contains("none") && !value.contains("undefined")
        }
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odf::registry::{DynamicStyles, SequentialNames};
    use crate::odf::style::ColumnModifier;

    fn open(pairs: &[(&str, &str)], props: TableProperties) -> (TableBuilder, DynamicStyles) {
        let attrs: Attributes = pairs.iter().copied().collect();
        let mut styles = CssStyles::from_element("table", &attrs);
        let registry = DynamicStyles::new();
        let names = SequentialNames::new();
        let geometry = TableGeometry { page_width: 17.0 };
        let table = TableBuilder::open(&mut styles, &attrs, props, geometry, &names, &registry);
        (table, registry)
    }

    fn cell(table: &mut TableBuilder, text: &str, width: Option<&str>) {
        table.enter_cell(1, width.and_then(|w| w.parse().ok()));
        table.add_content(text.chars().count(), 0);
        table.exit_cell();
    }

    #[test]
    fn test_default_table_style() {
        let (table, registry) = open(&[], TableProperties::default());
        assert_eq!(
            table.start_tag(),
            "<table:table table:name=\"Table1\" table:style-name=\"podTable\">"
        );
        assert!(registry.is_empty());
        assert!(table.border);
    }

    #[test]
    fn test_table_style_with_width() {
        let (table, registry) =
            open(&[("style", "width: 50%; text-align: center")], TableProperties::default());
        assert_eq!(table.style, "Table1");
        let decls = registry.declarations(StyleTarget::Content);
        assert_eq!(
            decls[0],
            "<style:style style:name=\"Table1\" style:family=\"table\" style:parent-style-name=\"podTable\">\
             <style:table-properties style:width=\"8.5cm\" style:rel-width=\"50%\" table:align=\"center\"/>\
             </style:style>"
        );
    }

    #[test]
    fn test_pixel_width_is_capped() {
        let props = TableProperties {
            wide_above: None,
            ..Default::default()
        };
        let (table, registry) = open(&[("width", "2000px")], props);
        let decl = &registry.declarations(StyleTarget::Content)[0];
        assert!(decl.contains("style:width=\"17cm\""));
        assert!(decl.contains("style:rel-width=\"100%\""));
        assert_eq!(table.original_width_px, Some(2000.0));
    }

    #[test]
    fn test_keep_rows_and_modifier() {
        let props = TableProperties {
            column_modifier: Some(ColumnModifier::Optimize),
            ..Default::default()
        };
        let (table, _) = open(&[("keeprows", "2")], props);
        assert!(table.keep_rows);
        assert_eq!(table.name, "OCW_Table1(2)");
    }

    #[test]
    fn test_border_detection() {
        let (table, _) = open(&[("border", "0")], TableProperties::default());
        assert!(!table.border);
        assert_eq!(table.cell_border(), "0");
        let (table, _) = open(&[("style", "border: 1px solid red")], TableProperties::default());
        assert_eq!(table.cell_border(), "0.05pt solid #000000");
    }

    #[test]
    fn test_columns_released_after_first_row() {
        let (mut table, _) = open(&[], TableProperties::default());
        let start = table.start_tag();
        table.write(&start);
        table.write("<table:table-row>");
        cell(&mut table, "a", None);
        cell(&mut table, "b", None);
        table.write("</table:table-row>");
        table.close_row();
        table.write("<table:table-row/>");
        assert_eq!(table.columns(), 2);
        assert_eq!(
            table.finish(),
            "<table:table table:name=\"Table1\" table:style-name=\"podTable\">\
             <table:table-column table:style-name=\"Table1.1\"/><table:table-column table:style-name=\"Table1.2\"/>\
             <table:table-row></table:table-row><table:table-row/>"
        );
    }

    #[test]
    fn test_temp_flushed_without_rows() {
        let (mut table, _) = open(&[], TableProperties::default());
        let start = table.start_tag();
        table.write(&start);
        table.write("<table:table-header-rows>");
        assert!(table.finish().ends_with("<table:table-header-rows>"));
    }

    #[test]
    fn test_equal_content_gives_equal_weights() {
        let (mut table, registry) = open(&[], TableProperties::default());
        cell(&mut table, "1", None);
        cell(&mut table, "22", None);
        table.close_row();
        let weights = table.compute_column_styles(&registry);
        assert_eq!(weights, vec![32767, 32767]);
        let decls = registry.declarations(StyleTarget::Content);
        assert!(decls[0].contains("style:name=\"Table1.1\""));
        assert!(decls[1].contains("style:rel-column-width=\"32767*\""));
    }

    #[test]
    fn test_unusable_percentage_falls_back_to_content() {
        let (mut table, registry) = open(&[], TableProperties::default());
        cell(&mut table, "a", Some("150%"));
        cell(&mut table, "b", None);
        table.close_row();
        let weights = table.compute_column_styles(&registry);
        assert_eq!(weights.iter().sum::<u32>(), TOTAL_COLUMN_WIDTH);
        assert_eq!(weights[0], weights[1]);
    }

    #[test]
    fn test_declared_width_is_honoured() {
        let (mut table, registry) = open(&[], TableProperties::default());
        cell(&mut table, "a", Some("25%"));
        cell(&mut table, "some longer content here", None);
        table.close_row();
        let weights = table.compute_column_styles(&registry);
        assert_eq!(weights.iter().sum::<u32>(), TOTAL_COLUMN_WIDTH);
        assert!((weights[0] as f64 / TOTAL_COLUMN_WIDTH as f64 - 0.25).abs() < 0.001);
    }

    #[test]
    fn test_longer_content_gets_wider_column() {
        let (mut table, registry) = open(&[], TableProperties::default());
        cell(&mut table, "x", None);
        cell(&mut table, &"word ".repeat(40), None);
        table.close_row();
        let weights = table.compute_column_styles(&registry);
        assert!(weights[1] > weights[0]);
        assert_eq!(weights.iter().sum::<u32>(), TOTAL_COLUMN_WIDTH);
    }

    #[test]
    fn test_colspan_advances_cursor() {
        let (mut table, _) = open(&[], TableProperties::default());
        table.enter_cell(2, None);
        table.add_content(40, 0);
        table.exit_cell();
        cell(&mut table, "c", None);
        table.close_row();
        assert_eq!(table.columns(), 3);
        assert_eq!(table.column_sizes, vec![None, Some(20), Some(5)]);
    }

    #[test]
    fn test_scale_weights() {
        assert_eq!(scale_weights(&[0.0, 0.0, 0.0], 65534), vec![21845, 21845, 21844]);
        assert_eq!(scale_weights(&[1.0, 1.0, 1.0], 65534).iter().sum::<u32>(), 65534);
        assert_eq!(scale_weights(&[0.5, 0.3], 10), vec![6, 4]);
        assert!(scale_weights(&[], 10).is_empty());
    }
}
