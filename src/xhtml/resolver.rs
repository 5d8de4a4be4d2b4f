//! Style resolution for converted elements.
//!
//! A [`StyleResolver`] decides which named ODF style an element gets. The
//! default implementation, [`DefaultStyleResolver`], searches in order:
//!
//! 1. the [`StylesMapping`] (`tag.class`, then class, then tag keys);
//! 2. styles known to exist in the target document, by class name;
//! 3. the converter's own styles (`podCellContent`, `podBulletItem`, ...),
//!    by class name;
//! 4. default styles: `podH<n>` for headings, `podCell` / `podHeader` for
//!    cells.
//!
//! When the element carries CSS declarations with an ODF counterpart, an
//! automatic style deriving from the style found is then generated; its
//! declaration is returned with the resolution so the caller can register it.

use crate::css::CssStyles;
use crate::css::odf::{CELL_PROPERTIES, OdfProperty, is_text_property, to_odf};
use crate::odf::registry::StyleTarget;
use crate::odf::style::{ListProperties, Style, StyleFamily, TableProperties};
use crate::xhtml::tags::{TagKind, TagSpec};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Everything a resolver knows about the element being styled
#[derive(Debug, Clone, Copy)]
pub struct StyleRequest<'r> {
    pub tag: &'r str,
    pub spec: TagSpec,
    /// Styles to resolve, already folded for nested inline elements
    pub styles: &'r CssStyles,
    /// Tags of the open ancestors, outermost first
    pub ancestors: &'r [&'r str],
    pub in_table: bool,
    /// Current inner-paragraph style of a cell
    pub inner_style: Option<&'r str>,
}

/// Outcome of resolving one element
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    pub style: Option<Style>,
    /// Replacement inner-paragraph style, for cells whose CSS carries
    /// paragraph properties
    pub inner_style: Option<String>,
    /// Generated declarations to register
    pub declarations: Vec<(StyleTarget, String)>,
}

/// Maps elements to named ODF styles
pub trait StyleResolver: Send + Sync {
    /// Resolve the style of a paragraph, heading, span, anchor or cell
    fn resolve(&self, request: &StyleRequest<'_>) -> Resolution;

    /// List properties configured for a `ul` / `ol`, if any
    fn resolve_list(&self, request: &StyleRequest<'_>) -> Option<ListProperties>;

    /// Table geometry for a `table`
    fn resolve_table(&self, request: &StyleRequest<'_>) -> TableProperties;
}

/// Configuration of [`DefaultStyleResolver`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesMapping {
    /// ODF style names keyed by `tag.class`, class or tag
    pub styles: HashMap<String, String>,
    /// Names of the styles defined in the target document
    pub template_styles: HashSet<String>,
    /// Added to heading levels before choosing a heading style
    pub outline_delta: i8,
    /// Table properties keyed by class, or `table` for all tables
    pub tables: HashMap<String, TableProperties>,
    /// List properties keyed by class, or `ul` / `ol`
    pub lists: HashMap<String, ListProperties>,
}

impl StylesMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping from YAML
    pub fn from_yaml(yaml: &str) -> crate::common::Result<Self> {
        serde_saphyr::from_str(yaml)
            .map_err(|e| crate::common::Error::Config(format!("Invalid styles mapping: {}", e)))
    }

    /// Map a class, tag or `tag.class` key to a style name
    pub fn with_style(mut self, key: impl Into<String>, style: impl Into<String>) -> Self {
        self.styles.insert(key.into(), style.into());
        self
    }

    pub fn with_table(mut self, key: impl Into<String>, props: TableProperties) -> Self {
        self.tables.insert(key.into(), props);
        self
    }

    pub fn with_list(mut self, key: impl Into<String>, props: ListProperties) -> Self {
        self.lists.insert(key.into(), props);
        self
    }
}

/// Paragraph styles the converter relies on being present in the template
const POD_SPECIFIC_STYLES: &[&str] = &[
    "ParaKWN",
    "podItemKeepWithNext",
    "podCellContent",
    "podHeaderCellContent",
    "podBulletItem",
    "podNumberItem",
];

const DEFAULT_CELL_PARAMS: [(&str, &str); 3] = [
    ("fo:padding", "0.1cm"),
    ("fo:border", "0.018cm solid #000000"),
    ("style:vertical-align", "middle"),
];

fn default_style(spec: TagSpec, outline_delta: i8) -> Option<Style> {
    match spec.kind {
        TagKind::Heading(level) => {
            let level = (level as i16 + outline_delta as i16).clamp(1, 10) as u8;
            Some(
                Style::new(format!("podH{}", level.min(6)), StyleFamily::Paragraph)
                    .with_outline_level(level),
            )
        }
        TagKind::Cell => {
            Some(Style::new("podCell", StyleFamily::TableCell).with_defaults(DEFAULT_CELL_PARAMS))
        }
        TagKind::HeaderCell => {
            let background = [("fo:background-color", "#e6e6e6")];
            Some(
                Style::new("podHeader", StyleFamily::TableCell)
                    .with_defaults(DEFAULT_CELL_PARAMS.into_iter().chain(background)),
            )
        }
        _ => None,
    }
}

/// Family of the style an element refers to
fn family_of(spec: TagSpec) -> StyleFamily {
    match spec.kind {
        TagKind::Heading(_) | TagKind::Paragraph | TagKind::ListItem => StyleFamily::Paragraph,
        TagKind::Cell | TagKind::HeaderCell => StyleFamily::TableCell,
        _ => StyleFamily::Text,
    }
}

/// Automatic style generator state
#[derive(Debug)]
struct Generator {
    prefix: String,
    last: usize,
    /// Generated names keyed by tag, properties and base style
    generated: HashMap<String, String>,
    /// Generated paragraph styles, usable as classes afterwards
    known: HashSet<String>,
}

impl Generator {
    fn name_for(
        &mut self,
        tag: &str,
        props: &mut [OdfProperty],
        base: Option<&Style>,
    ) -> (bool, String) {
        props.sort();
        let mut key = String::from(tag);
        for (name, value) in props.iter() {
            key.push_str(name);
            key.push_str(value);
        }
        if let Some(base) = base {
            key.push('*');
            key.push_str(&base.name);
        }
        if let Some(name) = self.generated.get(&key) {
            return (false, name.clone());
        }
        self.last += 1;
        let name = format!("{}{}pod", self.prefix, self.last);
        self.generated.insert(key, name.clone());
        (true, name)
    }

    /// Paragraph or text style
    fn get_any(
        &mut self,
        tag: &str,
        family: StyleFamily,
        block: bool,
        mut props: Vec<OdfProperty>,
        base: Option<&Style>,
        declarations: &mut Vec<(StyleTarget, String)>,
    ) -> String {
        let (fresh, name) = self.name_for(tag, &mut props, base);
        if !fresh {
            return name;
        }
        let standard = Style::new("Standard", StyleFamily::Paragraph);
        let parent_style = base.or((matches!(tag, "p" | "div")).then_some(&standard));
        let names: Vec<&str> = props.iter().map(|(n, _)| *n).collect();
        let parent = parent_style.map(|s| s.parent_attributes(&names)).unwrap_or_default();

        let (text, para): (Vec<_>, Vec<_>) =
            props.iter().partition(|(n, _)| is_text_property(n, block));
        let mut decl = format!(
            "<style:style style:name=\"{}\" style:family=\"{}\"{}>",
            name,
            family.as_str(),
            parent
        );
        if !text.is_empty() {
            decl.push_str(&format!("<style:text-properties {}/>", flatten(&text)));
        }
        if !para.is_empty() && family == StyleFamily::Paragraph {
            decl.push_str(&format!("<style:paragraph-properties {}/>", flatten(&para)));
        }
        decl.push_str("</style:style>");
        declarations.push((StyleTarget::StylesBase, decl));
        if family == StyleFamily::Paragraph {
            self.known.insert(name.clone());
        }
        name
    }

    /// Cell style, plus an inner paragraph style for paragraph properties
    fn get_cell(
        &mut self,
        request: &StyleRequest<'_>,
        props: Vec<OdfProperty>,
        base: Option<&Style>,
        resolution: &mut Resolution,
    ) -> Option<String> {
        let mut para = Vec::new();
        let mut cell = Vec::new();
        for (name, value) in props {
            if name == "fo:text-align" {
                para.push((name, value));
            } else if CELL_PROPERTIES.contains(&name) {
                cell.push((name, value));
            } else if is_text_property(name, false) {
                para.push((name, value));
            }
        }
        if !para.is_empty() {
            let inner_base = request.inner_style.map(|s| Style::new(s, StyleFamily::Paragraph));
            let inner = self.get_any(
                "p",
                StyleFamily::Paragraph,
                true,
                para,
                inner_base.as_ref(),
                &mut resolution.declarations,
            );
            resolution.inner_style = Some(inner);
        }
        if cell.is_empty() {
            return None;
        }
        let (fresh, name) = self.name_for(request.tag, &mut cell, base);
        if fresh {
            let names: Vec<&str> = cell.iter().map(|(n, _)| *n).collect();
            let parent = base.map(|s| s.parent_attributes(&names)).unwrap_or_default();
            let refs: Vec<&OdfProperty> = cell.iter().collect();
            resolution.declarations.push((
                StyleTarget::Content,
                format!(
                    "<style:style style:name=\"{}\" style:family=\"table-cell\"><style:table-cell-properties{} {}/></style:style>",
                    name,
                    parent,
                    flatten(&refs)
                ),
            ));
        }
        Some(name)
    }
}

fn flatten(props: &[&OdfProperty]) -> String {
    props
        .iter()
        .map(|(name, value)| format!("{}=\"{}\"", name, value))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Default [`StyleResolver`]: a [`StylesMapping`] plus an automatic style
/// generator.
///
/// Generated style names are `<prefix><n>pod`; use distinct prefixes when
/// fragments converted by different resolvers end up in one document.
#[derive(Debug)]
pub struct DefaultStyleResolver {
    mapping: StylesMapping,
    generator: Mutex<Generator>,
}

impl Default for DefaultStyleResolver {
    fn default() -> Self {
        Self::new(StylesMapping::default())
    }
}

impl DefaultStyleResolver {
    pub fn new(mapping: StylesMapping) -> Self {
        Self::with_prefix(mapping, "gen")
    }

    /// Resolver whose generated style names start with `prefix`
    pub fn with_prefix(mapping: StylesMapping, prefix: impl Into<String>) -> Self {
        Self {
            mapping,
            generator: Mutex::new(Generator {
                prefix: prefix.into(),
                last: 0,
                generated: HashMap::new(),
                known: HashSet::new(),
            }),
        }
    }

    pub fn mapping(&self) -> &StylesMapping {
        &self.mapping
    }

    fn find_base(&self, request: &StyleRequest<'_>) -> Option<Style> {
        let family = family_of(request.spec);
        let class = request.styles.last_class();
        let mapped = class
            .and_then(|c| self.mapping.styles.get(&format!("{}.{}", request.tag, c)))
            .or_else(|| class.and_then(|c| self.mapping.styles.get(c)))
            .or_else(|| self.mapping.styles.get(request.tag));
        if let Some(name) = mapped {
            let mut style = Style::new(name.clone(), family);
            if let TagKind::Heading(level) = request.spec.kind {
                style = style.with_outline_level(level);
            }
            return Some(style);
        }
        if let Some(class) = class {
            let known = self.mapping.template_styles.contains(class)
                || self.generator.lock().known.contains(class);
            if known || POD_SPECIFIC_STYLES.contains(&class) {
                return Some(Style::new(class, family));
            }
        }
        default_style(request.spec, self.mapping.outline_delta)
    }
}

impl StyleResolver for DefaultStyleResolver {
    fn resolve(&self, request: &StyleRequest<'_>) -> Resolution {
        let base = self.find_base(request);
        let mut resolution = Resolution::default();
        let props = to_odf(request.styles, request.in_table).into_vec();
        if props.is_empty() {
            resolution.style = base;
            return resolution;
        }

        let mut generator = self.generator.lock();
        let generated = if request.spec.is_cell() {
            generator.get_cell(request, props, base.as_ref(), &mut resolution)
        } else {
            let family = family_of(request.spec);
            let block = request.spec.is_para_type() || request.spec.is_list();
            Some(generator.get_any(
                request.tag,
                family,
                block,
                props,
                base.as_ref(),
                &mut resolution.declarations,
            ))
        };
        resolution.style = match generated {
            Some(name) => {
                let mut style = Style::new(name, family_of(request.spec));
                style.outline_level = base.as_ref().and_then(|b| b.outline_level);
                Some(style)
            }
            None => base,
        };
        log::trace!(
            "{} resolved to {:?}",
            request.ancestors.iter().chain([&request.tag]).copied().collect::<Vec<_>>().join(">"),
            resolution.style.as_ref().map(|s| s.name.as_str())
        );
        resolution
    }

    fn resolve_list(&self, request: &StyleRequest<'_>) -> Option<ListProperties> {
        request
            .styles
            .last_class()
            .and_then(|c| self.mapping.lists.get(c))
            .or_else(|| self.mapping.lists.get(request.tag))
            .cloned()
    }

    fn resolve_table(&self, request: &StyleRequest<'_>) -> TableProperties {
        request
            .styles
            .last_class()
            .and_then(|c| self.mapping.tables.get(c))
            .or_else(|| self.mapping.tables.get("table"))
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xhtml::Attributes;

    fn styles(tag: &str, pairs: &[(&str, &str)]) -> CssStyles {
        let attrs: Attributes = pairs.iter().copied().collect();
        CssStyles::from_element(tag, &attrs)
    }

    fn request<'r>(tag: &'r str, styles: &'r CssStyles) -> StyleRequest<'r> {
        StyleRequest {
            tag,
            spec: TagSpec::lookup(tag),
            styles,
            ancestors: &[],
            in_table: false,
            inner_style: None,
        }
    }

    #[test]
    fn test_default_styles() {
        let resolver = DefaultStyleResolver::default();
        let empty = CssStyles::new();
        let h2 = resolver.resolve(&request("h2", &empty)).style.unwrap();
        assert_eq!(h2.odf_attributes(), " text:style-name=\"podH2\" text:outline-level=\"2\"");
        assert!(resolver.resolve(&request("p", &empty)).style.is_none());
    }

    #[test]
    fn test_mapping_precedence() {
        let mapping = StylesMapping::new()
            .with_style("p", "Body")
            .with_style("note", "Note")
            .with_style("p.note", "ParaNote");
        let resolver = DefaultStyleResolver::new(mapping);
        let plain = CssStyles::new();
        assert_eq!(resolver.resolve(&request("p", &plain)).style.unwrap().name, "Body");
        let note = styles("p", &[("class", "note")]);
        assert_eq!(resolver.resolve(&request("p", &note)).style.unwrap().name, "ParaNote");
        assert_eq!(resolver.resolve(&request("div", &note)).style.unwrap().name, "Note");
    }

    #[test]
    fn test_pod_specific_class() {
        let resolver = DefaultStyleResolver::default();
        let css = styles("p", &[("class", "podCellContent")]);
        let style = resolver.resolve(&request("p", &css)).style.unwrap();
        assert_eq!(style.odf_attributes(), " text:style-name=\"podCellContent\"");
    }

    #[test]
    fn test_generated_styles_are_reused() {
        let resolver = DefaultStyleResolver::default();
        let css = styles("p", &[("style", "text-align: center; color: #ff0000")]);
        let first = resolver.resolve(&request("p", &css));
        assert_eq!(first.style.as_ref().unwrap().name, "gen1pod");
        assert_eq!(first.declarations.len(), 1);
        let (target, decl) = &first.declarations[0];
        assert_eq!(*target, StyleTarget::StylesBase);
        assert!(decl.contains("style:parent-style-name=\"Standard\""));
        assert!(decl.contains("<style:text-properties fo:color=\"#ff0000\"/>"));
        assert!(decl.contains("<style:paragraph-properties fo:text-align=\"center\"/>"));

        let second = resolver.resolve(&request("p", &css));
        assert_eq!(second.style, first.style);
        assert!(second.declarations.is_empty());
    }

    #[test]
    fn test_span_style_is_text_family() {
        let resolver = DefaultStyleResolver::default();
        let css = styles("b", &[]);
        let res = resolver.resolve(&request("b", &css));
        let style = res.style.unwrap();
        assert_eq!(style.family, StyleFamily::Text);
        assert!(res.declarations[0].1.contains("style:family=\"text\""));
        assert!(res.declarations[0].1.contains("fo:font-weight=\"bold\""));
    }

    #[test]
    fn test_cell_splits_properties() {
        let resolver = DefaultStyleResolver::default();
        let css = styles(
            "td",
            &[("style", "text-align: right; background-color: #eee"), ("border", "0")],
        );
        let req = StyleRequest {
            in_table: true,
            inner_style: Some("podCellContent"),
            ..request("td", &css)
        };
        let res = resolver.resolve(&req);
        let inner = res.inner_style.clone().unwrap();
        let cell = res.style.unwrap();
        assert_eq!(cell.family, StyleFamily::TableCell);
        assert_ne!(inner, cell.name);

        let para_decl =
            res.declarations.iter().find(|(t, _)| *t == StyleTarget::StylesBase).unwrap();
        assert!(para_decl.1.contains("style:parent-style-name=\"podCellContent\""));
        let cell_decl = res.declarations.iter().find(|(t, _)| *t == StyleTarget::Content).unwrap();
        // Defaults of podCell are copied, minus the redefined border
        assert!(cell_decl.1.contains("fo:padding=\"0.1cm\""));
        assert!(cell_decl.1.contains("fo:border=\"none\""));
        assert!(!cell_decl.1.contains("0.018cm"));

        // The generated inner style is now a known class
        let p = styles("p", &[("class", inner.as_str())]);
        assert_eq!(resolver.resolve(&request("p", &p)).style.unwrap().name, inner);
    }

    #[test]
    fn test_tables_and_lists() {
        let mapping = StylesMapping::new()
            .with_table("wide", TableProperties { min_column_width: 0.2, ..Default::default() })
            .with_list("ol", ListProperties::default().with_para_style("Item"));
        let resolver = DefaultStyleResolver::new(mapping);
        let wide = styles("table", &[("class", "wide")]);
        assert_eq!(resolver.resolve_table(&request("table", &wide)).min_column_width, 0.2);
        let plain = CssStyles::new();
        assert_eq!(resolver.resolve_table(&request("table", &plain)), TableProperties::default());
        assert!(resolver.resolve_list(&request("ul", &plain)).is_none());
        assert_eq!(
            resolver.resolve_list(&request("ol", &plain)).unwrap().para_style.as_deref(),
            Some("Item")
        );
    }
}
