//! Mutable state of one conversion.
//!
//! [`ConversionContext`] owns every [`ElementNode`] created while converting,
//! in an arena indexed by [`NodeId`], together with the stack of open
//! elements, the open lists and tables, the pending text and the output
//! buffer. The streaming converter drives it; the mechanics shared by start
//! and end events live here: lazy span emission, implicit paragraphs, closing
//! and reopening conflicting elements.

use super::config::ConverterOptions;
use super::element::{DumpStatus, ElementNode, NodeId};
use super::image::ImageImporter;
use super::resolver::{Resolution, StyleRequest, StyleResolver};
use super::table::TableBuilder;
use super::tags::{TagKind, TagSpec};
use super::whitespace::crunch;
use crate::common::xml::escape_xml;
use crate::css::CssStyles;
use crate::odf::registry::{NameAllocator, StyleRegistry, StyleTarget};
use crate::odf::style::{ListKind, ListProperties, TableProperties};
use crate::xhtml::Attributes;
use phf::{Map, phf_map};
use std::fmt::Write;

pub(crate) const LINE_BREAK: &str = "<text:line-break/>";

/// Where pending text is flushed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    /// Before a start tag
    Start,
    /// Before an end tag
    End,
}

/// HTML `type` attribute of lists, as a `list-style-type` keyword
static LIST_TYPES: Map<&'static str, &'static str> = phf_map! {
    "1" => "decimal",
    "a" => "lower-alpha",
    "A" => "upper-alpha",
    "i" => "lower-roman",
    "I" => "upper-roman",
    "disc" => "disc",
    "circle" => "circle",
    "square" => "square",
};

/// `list-style-type` keywords: list kind and ODF format or bullet
static LIST_FORMATS: Map<&'static str, (ListKind, &'static str)> = phf_map! {
    "lower-alpha" => (ListKind::Numbered, "a"),
    "upper-alpha" => (ListKind::Numbered, "A"),
    "lower-latin" => (ListKind::Numbered, "a"),
    "upper-latin" => (ListKind::Numbered, "A"),
    "lower-roman" => (ListKind::Numbered, "i"),
    "upper-roman" => (ListKind::Numbered, "I"),
    "decimal" => (ListKind::Numbered, "1"),
    "disc" => (ListKind::Bulleted, "\u{2022}"),
    "circle" => (ListKind::Bulleted, "\u{25e6}"),
    "square" => (ListKind::Bulleted, "\u{25aa}"),
    "none" => (ListKind::Bulleted, ""),
};

/// Default list style of a kind, defined by the converter's own styles
pub fn default_list_style(kind: ListKind) -> &'static str {
    match kind {
        ListKind::Bulleted => "podBulletedList",
        ListKind::Numbered => "podNumberedList",
    }
}

/// Paragraph style of list items
fn item_style(kind: ListKind, keep_with_next: bool) -> &'static str {
    match (kind, keep_with_next) {
        (ListKind::Bulleted, false) => "podBulletItem",
        (ListKind::Bulleted, true) => "podBulletItemKeepWithNext",
        (ListKind::Numbered, false) => "podNumberItem",
        (ListKind::Numbered, true) => "podNumberItemKeepWithNext",
    }
}

pub struct ConversionContext<'a> {
    pub(crate) options: &'a ConverterOptions,
    pub(crate) resolver: &'a dyn StyleResolver,
    pub(crate) registry: &'a dyn StyleRegistry,
    pub(crate) names: &'a dyn NameAllocator,
    pub(crate) images: Option<&'a dyn ImageImporter>,
    nodes: Vec<ElementNode>,
    /// Open elements, innermost last
    pub(crate) stack: Vec<NodeId>,
    /// Open lists, innermost last
    pub(crate) lists: Vec<NodeId>,
    /// Open tables, innermost last
    pub(crate) tables: Vec<TableBuilder>,
    /// Open style-only elements whose styles fold into nested spans
    inline: Vec<NodeId>,
    pub(crate) last_closed: Option<NodeId>,
    /// Depth inside ignorable elements; text is dropped while positive
    pub(crate) ignore_depth: usize,
    pending: String,
    res: String,
    /// List styles used so far, written once the conversion is over
    list_styles: Vec<(String, ListProperties)>,
    pub(crate) post_processor: bool,
}

impl<'a> ConversionContext<'a> {
    pub fn new(
        options: &'a ConverterOptions,
        resolver: &'a dyn StyleResolver,
        registry: &'a dyn StyleRegistry,
        names: &'a dyn NameAllocator,
        images: Option<&'a dyn ImageImporter>,
    ) -> Self {
        Self {
            options,
            resolver,
            registry,
            names,
            images,
            nodes: Vec::with_capacity(64),
            stack: Vec::with_capacity(16),
            lists: Vec::new(),
            tables: Vec::new(),
            inline: Vec::new(),
            last_closed: None,
            ignore_depth: 0,
            pending: String::new(),
            res: String::with_capacity(1024),
            list_styles: Vec::new(),
            post_processor: false,
        }
    }

    pub(crate) fn alloc(&mut self, node: ElementNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> &ElementNode {
        &self.nodes[id.0]
    }

    #[inline]
    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut ElementNode {
        &mut self.nodes[id.0]
    }

    /// Innermost open element whose tag is written, skipping unwrapped and
    /// unknown ones
    pub fn current(&self) -> Option<NodeId> {
        self.stack.iter().rev().copied().find(|id| !self.node(*id).is_transparent())
    }

    /// Output written outside any table so far
    pub fn output(&self) -> &str {
        &self.res
    }

    /// Depth of the open elements, for traces
    pub(crate) fn depth(&self) -> usize {
        self.stack.len()
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    /// Buffer output currently goes to: the innermost table's, if any
    pub(crate) fn buffer_mut(&mut self) -> &mut String {
        match self.tables.last_mut() {
            Some(table) => table.buffer_mut(),
            None => &mut self.res,
        }
    }

    pub(crate) fn write(&mut self, s: &str) {
        if !s.is_empty() {
            self.buffer_mut().push_str(s);
        }
    }

    /// Write the start tag of a node and remember it for reopening
    pub(crate) fn write_start(&mut self, id: NodeId, tag: String) {
        self.write(&tag);
        self.node_mut(id).written_start = Some(tag);
    }

    /// Remove `tail` from the end of the active buffer, if it ends with it
    fn strip_tail(&mut self, tail: &str) -> bool {
        if tail.is_empty() {
            return false;
        }
        let buffer = self.buffer_mut();
        if !buffer.ends_with(tail) {
            return false;
        }
        let len = buffer.len() - tail.len();
        buffer.truncate(len);
        true
    }

    // ------------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------------

    /// Queue text, collapsed against the pending run or, when nothing is
    /// pending, against the text last written
    pub(crate) fn push_text(&mut self, text: &str) {
        let crunched = if self.pending.is_empty() {
            let written = match self.tables.last() {
                Some(table) => table.buffer(),
                None => &self.res,
            };
            crunch(text, if written.ends_with(' ') { " " } else { "" })
        } else {
            crunch(text, &self.pending)
        };
        self.pending.push_str(&crunched);
    }

    fn trim_leading(&self, place: Place, spec: TagSpec) -> bool {
        if place == Place::End && spec.is_inner() {
            let after_break = self
                .last_closed
                .is_some_and(|id| self.node(id).spec.kind == TagKind::LineBreak);
            return match self.current().and_then(|c| self.node(c).parent) {
                None => true,
                Some(parent) => {
                    let parent = self.node(parent);
                    (!parent.spec.is_inner() && !parent.content_dumped) || after_break
                }
            };
        }
        self.last_closed.is_none_or(|id| !self.node(id).spec.is_inner_no_br())
    }

    /// Write the pending text, if any.
    ///
    /// `spec` is the element whose start or end tag comes next; it decides
    /// whether boundary spaces are significant. The innermost element gets its
    /// implicit paragraph or its deferred start tag first.
    pub(crate) fn dump_pending(&mut self, place: Place, spec: TagSpec) {
        if self.pending.is_empty() {
            return;
        }
        if place == Place::Start
            && self.pending.ends_with(' ')
            && (!spec.is_inner_no_br() || spec.kind == TagKind::Image)
        {
            self.pending.pop();
        }
        if self.pending.starts_with(' ') && self.trim_leading(place, spec) {
            self.pending.remove(0);
        }
        if self.pending.is_empty() {
            return;
        }
        let current = self.current();
        if let Some(outer) = current
            && self.element_is_missing(Some(outer), None)
        {
            self.add_inner_paragraph(outer);
        }
        if let Some(owner) = current
            && self.node(owner).line_break_on_inner
        {
            self.write(LINE_BREAK);
            self.node_mut(owner).line_break_on_inner = false;
        }
        if let Some(owner) = current
            && self.node(owner).is_deferred()
        {
            self.emit_deferred(owner);
        }
        let text = std::mem::take(&mut self.pending);
        if self.tables.last().is_some_and(TableBuilder::in_cell) {
            let size = text.chars().count();
            let longest = text.split_whitespace().map(|w| w.chars().count()).max().unwrap_or(0);
            for table in &mut self.tables {
                table.add_content(size, longest);
            }
        }
        self.write(&escape_xml(&text));
        let Self { stack, nodes, .. } = self;
        for id in stack.iter() {
            nodes[id.0].content_dumped = true;
        }
    }

    // ------------------------------------------------------------------------
    // Inline styles
    // ------------------------------------------------------------------------

    pub(crate) fn merge_inline(&mut self, id: NodeId) {
        self.inline.push(id);
    }

    pub(crate) fn unmerge_inline(&mut self, id: NodeId) {
        if let Some(pos) = self.inline.iter().rposition(|i| *i == id) {
            self.inline.remove(pos);
        }
    }

    #[inline]
    pub(crate) fn has_merged(&self) -> bool {
        !self.inline.is_empty()
    }

    pub(crate) fn reset_inline(&mut self) {
        self.inline.clear();
    }

    /// Styles of a style-only element, folded with the style-only elements
    /// enclosing it: its span is never nested in theirs
    fn folded_styles(&self, id: NodeId) -> CssStyles {
        let Some(pos) = self.inline.iter().position(|i| *i == id) else {
            return self.node(id).styles.clone();
        };
        let mut styles = CssStyles::new();
        for i in &self.inline[..=pos] {
            styles.merge(&self.node(*i).styles);
        }
        styles
    }

    /// Whether an ancestor of the node is inline
    pub(crate) fn in_inner_tag(&self, id: NodeId) -> bool {
        let mut parent = self.node(id).parent;
        while let Some(p) = parent {
            let node = self.node(p);
            if node.spec.is_inner() {
                return true;
            }
            parent = node.parent;
        }
        false
    }

    /// Emit the start tag of a waiting or suspended element
    fn emit_deferred(&mut self, id: NodeId) {
        let tag = match self.node(id).written_start.clone() {
            Some(tag) => Some(tag),
            None => self.simple_start_tag(id),
        };
        if let Some(tag) = tag {
            self.write_start(id, tag);
        }
        let node = self.node_mut(id);
        node.status = DumpStatus::Emitted;
        node.suspended = false;
    }

    // ------------------------------------------------------------------------
    // Styles
    // ------------------------------------------------------------------------

    /// Run `f` with a style request describing a node
    fn with_request<R>(
        &self,
        id: NodeId,
        styles: &CssStyles,
        f: impl FnOnce(&StyleRequest<'_>) -> R,
    ) -> R {
        let node = self.node(id);
        let ancestors: Vec<&str> = self.stack.iter().map(|i| self.node(*i).tag.as_str()).collect();
        let request = StyleRequest {
            tag: &node.tag,
            spec: node.spec,
            styles,
            ancestors: &ancestors,
            in_table: !self.tables.is_empty(),
            inner_style: node.inner_style.as_deref(),
        };
        f(&request)
    }

    /// Resolve a node's style and register the declarations it generated
    fn resolve(&self, id: NodeId, styles: &CssStyles) -> Resolution {
        let resolution = self.with_request(id, styles, |request| self.resolver.resolve(request));
        for (target, declaration) in &resolution.declarations {
            self.registry.register(*target, declaration.clone());
        }
        resolution
    }

    pub(crate) fn resolve_table(&self, id: NodeId) -> TableProperties {
        let styles = &self.node(id).styles;
        self.with_request(id, styles, |request| self.resolver.resolve_table(request))
    }

    /// ODF attributes of a node: style reference plus, for cells, spans.
    /// Resolved once; later calls return the cached value.
    pub(crate) fn odf_attributes(&mut self, id: NodeId) -> String {
        if let Some(cached) = self.node(id).cached_attributes() {
            return cached.to_string();
        }
        let spec = self.node(id).spec;
        if spec.is_cell() {
            if let Some(table) = self.tables.last() {
                let border = table.cell_border().to_string();
                let padding = table
                    .border_spacing
                    .map(|spacing| format!("{:.2}cm", table.props.cell_padding(&spacing)));
                let styles = &mut self.node_mut(id).styles;
                styles.set("border", border);
                if let Some(padding) = padding {
                    styles.set("border-spacing", padding);
                }
            }
        } else if let Some(parent) = self.node(id).parent
            && self.node(parent).spec.is_cell()
            && spec.is_para_tag()
        {
            let parent = self.node(parent);
            let (inner_style, inner_css) = (parent.inner_style.clone(), parent.inner_css.clone());
            let styles = &mut self.node_mut(id).styles;
            if let Some(inner_style) = inner_style {
                styles.add_class(inner_style, false);
            }
            if let Some(inner_css) = inner_css {
                styles.merge(&inner_css);
            }
        }

        let styles = if spec.is_style_only() {
            self.folded_styles(id)
        } else {
            self.node(id).styles.clone()
        };
        let resolution = self.resolve(id, &styles);
        let node = self.node_mut(id);
        let mut attributes = resolution.style.map(|s| s.odf_attributes()).unwrap_or_default();
        if spec.is_cell() {
            if let Some(inner) = resolution.inner_style {
                node.inner_style = Some(inner);
            }
            let colspan = node.attrs.get_u32("colspan").unwrap_or(1).max(1);
            let rowspan = node.attrs.get_u32("rowspan").unwrap_or(1).max(1);
            let _ = write!(
                attributes,
                " table:number-columns-spanned=\"{}\" table:number-rows-spanned=\"{}\"",
                colspan, rowspan
            );
        }
        node.cache_attributes(attributes.clone());
        attributes
    }

    /// Start tag of an element written as `<odf-tag attributes>`
    pub(crate) fn simple_start_tag(&mut self, id: NodeId) -> Option<String> {
        let odf = self.node(id).spec.odf?;
        if odf.is_void() {
            return Some(format!("<{}/>", odf.as_str()));
        }
        let attributes = self.odf_attributes(id);
        Some(format!("<{}{}>", odf.as_str(), attributes))
    }

    // ------------------------------------------------------------------------
    // Implicit paragraphs
    // ------------------------------------------------------------------------

    /// Whether inline content (or text, when `current` is `None`) placed in
    /// `previous` needs an implicit paragraph
    pub(crate) fn element_is_missing(
        &self,
        previous: Option<NodeId>,
        current: Option<TagSpec>,
    ) -> bool {
        previous.is_some_and(|p| self.node(p).spec.is_outer())
            && current.is_none_or(|s| s.is_inner())
    }

    /// Open the implicit paragraph of a cell or list item. No-op if one is
    /// already open.
    pub(crate) fn add_inner_paragraph(&mut self, outer: NodeId) {
        if !self.node(outer).tags_to_close.is_empty() {
            return;
        }
        let mut paragraph = ElementNode::new("p", Attributes::new(), Some(outer));
        let outer_node = self.node(outer);
        let explicit = if outer_node.spec.kind == TagKind::ListItem {
            let list = self.lists.last().copied();
            let kind = list.map_or(ListKind::Bulleted, |l| ListKind::from_tag(&self.node(l).tag));
            if outer_node.styles.last_class().is_some() {
                let styles = outer_node.styles.clone();
                let resolved = self.resolve(outer, &styles).style.map(|s| s.name);
                let name = match resolved.as_deref() {
                    Some("podItemKeepWithNext") => item_style(kind, true).to_string(),
                    Some(name) => name.to_string(),
                    None => item_style(kind, false).to_string(),
                };
                Some(format!(" text:style-name=\"{}\"", name))
            } else {
                if let Some(inner_css) = &outer_node.inner_css {
                    paragraph.styles.merge(inner_css);
                }
                let para_style = list.and_then(|l| self.node(l).para_style.clone());
                let class = para_style.unwrap_or_else(|| item_style(kind, false).to_string());
                paragraph.styles.add_class(class, true);
                None
            }
        } else {
            None
        };
        let id = self.alloc(paragraph);
        let attributes = match explicit {
            Some(attributes) => {
                self.node_mut(id).cache_attributes(attributes.clone());
                attributes
            }
            None => self.odf_attributes(id),
        };
        log::trace!("{}+p{}", "  ".repeat(self.depth()), attributes);
        self.write_start(id, format!("<text:p{}>", attributes));
        self.node_mut(outer).tags_to_close.push(id);
    }

    // ------------------------------------------------------------------------
    // Conflicts
    // ------------------------------------------------------------------------

    /// Start tags currently open for a node, implicit paragraphs included
    fn open_tags(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut out = String::new();
        if node.remove_tag || node.is_deferred() {
            return out;
        }
        if let Some(start) = &node.written_start {
            out.push_str(start);
        }
        for child in &node.tags_to_close {
            out.push_str(&self.open_tags(*child));
        }
        out
    }

    /// End tags closing a node, implicit paragraphs included
    pub(crate) fn close_tags(&self, id: NodeId) -> String {
        let node = self.node(id);
        let mut out = String::new();
        if node.remove_tag || node.is_deferred() {
            return out;
        }
        for child in node.tags_to_close.iter().rev() {
            out.push_str(&self.close_tags(*child));
        }
        if node.written_start.is_some()
            && let Some(odf) = node.spec.odf
            && !odf.is_void()
        {
            match node.spec.kind {
                TagKind::Footnote => out.push_str("</text:note-body></text:note>"),
                _ => out.push_str(&odf.end_tag()),
            }
        }
        out
    }

    /// Close conflicting elements, given outermost first.
    ///
    /// When nothing was written since their start tags, the start tags are
    /// removed instead, so no empty element is left behind.
    pub(crate) fn close_conflictual(&mut self, nodes: &[NodeId]) {
        let starts: String = nodes.iter().map(|id| self.open_tags(*id)).collect();
        if self.strip_tail(&starts) {
            return;
        }
        let ends: String = nodes.iter().rev().map(|id| self.close_tags(*id)).collect();
        self.write(&ends);
    }

    /// Remove a node's start tags if nothing was written after them
    pub(crate) fn strip_if_empty(&mut self, id: NodeId) -> bool {
        let starts = self.open_tags(id);
        self.strip_tail(&starts)
    }

    /// Reopen elements closed by a conflict, outermost first, with the start
    /// tags they were first written with
    pub(crate) fn reopen(&mut self, nodes: &[NodeId]) {
        let mut out = String::new();
        for &id in nodes {
            let node = self.node(id);
            if node.remove_tag || node.is_deferred() {
                continue;
            }
            let tag = match node.spec.kind {
                TagKind::List(kind) => Some(format!(
                    "<text:list text:style-name=\"{}\"{}>",
                    node.list_style.as_deref().unwrap_or(default_list_style(kind)),
                    if kind == ListKind::Numbered {
                        " text:continue-numbering=\"true\""
                    } else {
                        ""
                    }
                )),
                TagKind::ListItem => Some("<text:list-item>".to_string()),
                _ => node.written_start.clone(),
            };
            let Some(tag) = tag else {
                continue;
            };
            out.push_str(&tag);
            for child in &node.tags_to_close {
                out.push_str(&self.open_tags(*child));
            }
            self.node_mut(id).written_start = Some(tag);
        }
        log::trace!("{}reopen {}", "  ".repeat(self.depth()), out);
        self.write(&out);
    }

    // ------------------------------------------------------------------------
    // Lists
    // ------------------------------------------------------------------------

    /// Name of the list style of a `ul` / `ol`
    pub(crate) fn list_style(&mut self, id: NodeId) -> String {
        let kind = match self.node(id).spec.kind {
            TagKind::List(kind) => kind,
            _ => ListKind::Bulleted,
        };
        let styles = &self.node(id).styles;
        let configured =
            self.with_request(id, styles, |request| self.resolver.resolve_list(request));
        let name = match configured {
            Some(props) => {
                self.node_mut(id).para_style = props.para_style.clone();
                self.add_list_properties(props)
            }
            None => {
                let node = self.node(id);
                let keyword = node
                    .styles
                    .get("list-style-type")
                    .map(|v| v.as_str())
                    .filter(|v| !matches!(*v, "initial" | "inherit"))
                    .or_else(|| node.attrs.get("type").and_then(|t| LIST_TYPES.get(t).copied()))
                    .map(str::to_string);
                match keyword {
                    Some(keyword) => self.add_list_properties_by_name(kind, &keyword),
                    None => default_list_style(kind).to_string(),
                }
            }
        };
        self.node_mut(id).list_style = Some(name.clone());
        name
    }

    /// Name of a list style with these properties, created if needed
    fn add_list_properties(&mut self, props: ListProperties) -> String {
        if let Some((name, _)) = self.list_styles.iter().find(|(_, p)| *p == props) {
            return name.clone();
        }
        let name = self.names.unique_name("list");
        self.list_styles.push((name.clone(), props));
        name
    }

    /// Name of the list style for a `list-style-type` keyword, created if
    /// needed
    fn add_list_properties_by_name(&mut self, kind: ListKind, keyword: &str) -> String {
        let name = format!("L-{}", keyword);
        if self.list_styles.iter().any(|(n, _)| *n == name) {
            return name;
        }
        let props = match LIST_FORMATS.get(keyword) {
            Some((kind, format)) => ListProperties::new(*kind).with_formats([*format]),
            None => {
                log::debug!("Unknown list style type '{}', using default formats", keyword);
                ListProperties::new(kind)
            }
        };
        self.list_styles.push((name.clone(), props));
        name
    }

    /// Register the list styles used and hand over the output
    pub(crate) fn into_output(self) -> (String, bool) {
        for (name, props) in &self.list_styles {
            self.registry.register(StyleTarget::StylesBase, props.dump_style(name));
        }
        (self.res, self.post_processor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odf::registry::{DynamicStyles, SequentialNames};
    use crate::xhtml::resolver::DefaultStyleResolver;
    use crate::xhtml::table::TableGeometry;

    struct Fixture {
        options: ConverterOptions,
        resolver: DefaultStyleResolver,
        registry: DynamicStyles,
        names: SequentialNames,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                options: ConverterOptions::default(),
                resolver: DefaultStyleResolver::default(),
                registry: DynamicStyles::new(),
                names: SequentialNames::new(),
            }
        }

        fn context(&self) -> ConversionContext<'_> {
            ConversionContext::new(&self.options, &self.resolver, &self.registry, &self.names, None)
        }
    }

    fn push(ctx: &mut ConversionContext<'_>, tag: &str, pairs: &[(&str, &str)]) -> NodeId {
        let attrs: Attributes = pairs.iter().copied().collect();
        let parent = ctx.current();
        let id = ctx.alloc(ElementNode::new(tag, attrs, parent));
        ctx.stack.push(id);
        id
    }

    #[test]
    fn test_strip_empty_conflict() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        let p = push(&mut ctx, "p", &[]);
        ctx.write_start(p, "<text:p>".to_string());
        ctx.close_conflictual(&[p]);
        assert_eq!(ctx.output(), "");

        ctx.write_start(p, "<text:p>".to_string());
        ctx.write("x");
        ctx.close_conflictual(&[p]);
        assert_eq!(ctx.output(), "<text:p>x</text:p>");
        ctx.reopen(&[p]);
        assert_eq!(ctx.output(), "<text:p>x</text:p><text:p>");
    }

    #[test]
    fn test_deferred_nodes_are_skipped() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        let p = push(&mut ctx, "p", &[]);
        ctx.write_start(p, "<text:p>".to_string());
        ctx.write("a");
        let b = push(&mut ctx, "b", &[]);
        ctx.node_mut(b).status = DumpStatus::Waiting;
        ctx.close_conflictual(&[p, b]);
        assert_eq!(ctx.output(), "<text:p>a</text:p>");
        ctx.reopen(&[p, b]);
        assert_eq!(ctx.output(), "<text:p>a</text:p><text:p>");
    }

    #[test]
    fn test_pending_text_emits_waiting_span() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        let p = push(&mut ctx, "p", &[]);
        ctx.write_start(p, "<text:p>".to_string());
        let b = push(&mut ctx, "b", &[]);
        ctx.merge_inline(b);
        ctx.node_mut(b).status = DumpStatus::Waiting;
        ctx.push_text("  bold  ");
        ctx.dump_pending(Place::End, ctx.node(b).spec());
        assert_eq!(ctx.output(), "<text:p><text:span text:style-name=\"gen1pod\">bold ");
        assert_eq!(ctx.node(b).status(), DumpStatus::Emitted);
        assert!(ctx.node(p).content_dumped);
    }

    #[test]
    fn test_folded_styles() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        push(&mut ctx, "p", &[]);
        let span = push(&mut ctx, "span", &[("style", "color: red")]);
        ctx.merge_inline(span);
        let b = push(&mut ctx, "b", &[]);
        ctx.merge_inline(b);
        let folded = ctx.folded_styles(b);
        assert_eq!(folded.get("color").unwrap().as_str(), "red");
        assert_eq!(folded.get("font-weight").unwrap().as_str(), "bold");
        assert!(ctx.folded_styles(span).get("font-weight").is_none());
        ctx.unmerge_inline(b);
        ctx.unmerge_inline(span);
        assert!(!ctx.has_merged());
    }

    #[test]
    fn test_inner_paragraph_of_list_item() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        let ol = push(&mut ctx, "ol", &[]);
        ctx.lists.push(ol);
        let li = push(&mut ctx, "li", &[]);
        assert!(ctx.element_is_missing(Some(li), None));
        assert!(!ctx.element_is_missing(Some(li), Some(TagSpec::lookup("p"))));
        ctx.add_inner_paragraph(li);
        ctx.add_inner_paragraph(li);
        assert_eq!(ctx.output(), "<text:p text:style-name=\"podNumberItem\">");
        assert_eq!(ctx.close_tags(li), "</text:p>");
    }

    #[test]
    fn test_list_style_keywords() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        let ul = push(&mut ctx, "ul", &[]);
        assert_eq!(ctx.list_style(ul), "podBulletedList");
        let ol = push(&mut ctx, "ol", &[("type", "a")]);
        assert_eq!(ctx.list_style(ol), "L-lower-alpha");
        let other = push(&mut ctx, "ol", &[("style", "list-style-type: lower-alpha")]);
        assert_eq!(ctx.list_style(other), "L-lower-alpha");
        let unknown = push(&mut ctx, "ul", &[("style", "list-style-type: hebrew")]);
        assert_eq!(ctx.list_style(unknown), "L-hebrew");

        let (_, post) = ctx.into_output();
        assert!(!post);
        let decls = fixture.registry.declarations(StyleTarget::StylesBase);
        assert_eq!(decls.len(), 2);
        assert!(decls[0].contains("style:name=\"L-lower-alpha\""));
        assert!(decls[0].contains("style:num-format=\"a\""));
    }

    #[test]
    fn test_cell_attributes() {
        let fixture = Fixture::new();
        let mut ctx = fixture.context();
        let table = push(&mut ctx, "table", &[]);
        let mut styles = ctx.node(table).styles.clone();
        let builder = TableBuilder::open(
            &mut styles,
            &Attributes::new(),
            TableProperties::default(),
            TableGeometry { page_width: 17.0 },
            &fixture.names,
            &fixture.registry,
        );
        ctx.tables.push(builder);
        push(&mut ctx, "tr", &[]);
        let td = push(&mut ctx, "td", &[("colspan", "2")]);
        let attributes = ctx.odf_attributes(td);
        assert!(attributes.starts_with(" table:style-name=\"gen1pod\""));
        assert!(
            attributes.ends_with(" table:number-columns-spanned=\"2\" table:number-rows-spanned=\"1\"")
        );
        let decls = fixture.registry.declarations(StyleTarget::Content);
        assert!(decls.iter().any(|d| d.contains("fo:border=\"0.05pt solid #000000\"")));
        // Cached
        assert_eq!(ctx.odf_attributes(td), attributes);
    }
}
