//! Event-driven XHTML to ODF conversion.
//!
//! [`StreamingConverter`] receives start-element, text and end-element
//! events, in document order, and writes ODF markup as it goes. Nothing is
//! buffered beyond what lazy emission requires: the text pending since the
//! last event, and the output of tables whose column count is not known yet.
//!
//! # Conflicts
//!
//! Some XHTML nestings have no ODF equivalent: a paragraph inside a
//! paragraph, a table inside a list item, a paragraph inside a span. When an
//! element opens in such a position, the enclosing elements standing in the
//! way are closed first and reopened, with identical start tags, once the
//! element closes.

use super::config::ConverterOptions;
use super::context::{ConversionContext, LINE_BREAK, Place};
use super::element::{DumpStatus, ElementNode, NodeId};
use super::image::{ImageImporter, ImageRequest};
use super::resolver::StyleResolver;
use super::table::{TableBuilder, TableGeometry};
use super::tags::{TagKind, TagSpec};
use crate::common::xml::escape_xml;
use crate::common::{Error, Result};
use crate::odf::OdfTag;
use crate::odf::registry::{NameAllocator, StyleRegistry};
use crate::odf::style::ListKind;
use crate::xhtml::Attributes;
use smallvec::SmallVec;

/// Result of converting one fragment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    /// ODF markup, to be inserted in a document body
    pub content: String,
    /// Whether the markup relies on a post-processing step (row keeping,
    /// column width modifiers)
    pub post_processor_required: bool,
}

/// Streaming converter over XHTML events
pub struct StreamingConverter<'a> {
    ctx: ConversionContext<'a>,
}

impl<'a> StreamingConverter<'a> {
    pub fn new(
        options: &'a ConverterOptions,
        resolver: &'a dyn StyleResolver,
        registry: &'a dyn StyleRegistry,
        names: &'a dyn NameAllocator,
        images: Option<&'a dyn ImageImporter>,
    ) -> Self {
        Self {
            ctx: ConversionContext::new(options, resolver, registry, names, images),
        }
    }

    /// Conversion state, for inspection
    pub fn context(&self) -> &ConversionContext<'a> {
        &self.ctx
    }

    // ------------------------------------------------------------------------
    // Start events
    // ------------------------------------------------------------------------

    /// Handle a start-element event. `tag` must be lower-cased.
    ///
    /// Fails only when the image importer fails.
    pub fn open(&mut self, tag: &str, attrs: Attributes) -> Result<()> {
        let spec = TagSpec::lookup(tag);
        if self.ctx.ignore_depth > 0 {
            let parent = self.ctx.stack.last().copied();
            let mut node = ElementNode::new(tag, attrs, parent);
            node.ignored = true;
            let id = self.ctx.alloc(node);
            self.ctx.stack.push(id);
            if spec.kind == TagKind::Ignorable {
                self.ctx.ignore_depth += 1;
            }
            return Ok(());
        }

        self.ctx.dump_pending(Place::Start, spec);
        let parent = self.ctx.current();
        let id = self.ctx.alloc(ElementNode::new(tag, attrs, parent));
        if let Some(parent) = parent
            && spec.kind != TagKind::Unknown
            && self.ctx.node(parent).line_break_on_inner
        {
            if spec.is_inner() {
                self.ctx.write(LINE_BREAK);
            }
            self.ctx.node_mut(parent).line_break_on_inner = false;
        }

        let conflicts = self.conflicts(id, parent);
        if !conflicts.is_empty() {
            for conflict in &conflicts {
                self.ctx.node_mut(*conflict).set_conflictual();
            }
            self.ctx.close_conflictual(&conflicts);
            if let Some(last) = conflicts.last() {
                self.ctx.node_mut(*last).tags_to_close.clear();
            }
            self.ctx.node_mut(id).tags_to_reopen = conflicts;
        }
        if let Some(parent) = parent
            && self.ctx.element_is_missing(Some(parent), Some(spec))
        {
            self.ctx.add_inner_paragraph(parent);
        }
        self.ctx.stack.push(id);
        log::trace!("{}<{}", "  ".repeat(self.ctx.depth() - 1), self.ctx.node(id).label());

        match spec.kind {
            TagKind::List(_) => self.ctx.lists.push(id),
            TagKind::Table => self.open_table(id),
            TagKind::Cell | TagKind::HeaderCell | TagKind::Column => self.enter_column(id),
            _ => {}
        }
        self.start_element(id)
    }

    /// Elements to close before `id` can open in `parent`, outermost first
    fn conflicts(&mut self, id: NodeId, parent: Option<NodeId>) -> SmallVec<[NodeId; 2]> {
        let mut set = SmallVec::new();
        let Some(parent) = parent else {
            return set;
        };
        let ctx = &mut self.ctx;
        let spec = ctx.node(id).spec;
        let parent_node = ctx.node(parent);
        let parent_spec = parent_node.spec;

        if parent_spec.kind == TagKind::ListItem {
            if spec.is_para_tag() {
                // Unwrapped: its content goes to the item's implicit paragraph
                let styles = ctx.node(id).styles.clone();
                ctx.node_mut(id).remove_tag = true;
                ctx.node_mut(parent).add_inner_css(&styles);
                return set;
            }
            if spec.not_inside_li() {
                if let Some(list) = parent_node.parent {
                    set.push(list);
                }
                set.push(parent);
            }
        } else if parent_spec.is_para_type() && spec.not_inside_p_or_p() {
            set.push(parent);
        } else if parent_spec.is_inner() && spec.is_para_type() {
            // Close every inline ancestor up to the enclosing paragraph. The
            // walk stops below cells and items: they are never closed, but
            // their implicit paragraph is.
            let mut chain: SmallVec<[NodeId; 2]> = SmallVec::new();
            chain.push(parent);
            if let Some(pos) = ctx.stack.iter().rposition(|i| *i == parent) {
                for &ancestor in ctx.stack[..pos].iter().rev() {
                    let ancestor_node = ctx.node(ancestor);
                    if ancestor_node.is_transparent() {
                        continue;
                    }
                    if ancestor_node.spec.is_outer() {
                        if let Some(&inner) = ancestor_node.tags_to_close.last()
                            && ctx.node(inner).spec.is_para_type()
                        {
                            chain.insert(0, inner);
                        }
                        break;
                    }
                    chain.insert(0, ancestor);
                    if ancestor_node.spec.is_para_type() {
                        break;
                    }
                }
            }
            set = chain;
        }
        if set.is_empty()
            && let Some(&inner) = parent_node.tags_to_close.last()
            && ctx.node(inner).spec.is_para_type()
            && spec.not_inside_p_or_p()
        {
            set.push(inner);
        }
        if set.is_empty() && parent_spec.is_list() && spec.not_inside_list() {
            set.push(parent);
        }
        set
    }

    fn open_table(&mut self, id: NodeId) {
        let ctx = &mut self.ctx;
        let props = ctx.resolve_table(id);
        let geometry = TableGeometry {
            page_width: ctx.options.page_width,
        };
        let mut styles = std::mem::take(&mut ctx.node_mut(id).styles);
        let table = TableBuilder::open(
            &mut styles,
            &ctx.node(id).attrs,
            props,
            geometry,
            ctx.names,
            ctx.registry,
        );
        if table.keep_rows || table.props.column_modifier.is_some() {
            ctx.post_processor = true;
        }
        ctx.node_mut(id).styles = styles;
        ctx.tables.push(table);
    }

    fn enter_column(&mut self, id: NodeId) {
        let ctx = &mut self.ctx;
        let node = ctx.node(id);
        let kind = node.spec.kind;
        let colspan = node.attrs.get_u32("colspan").unwrap_or(1).max(1) as usize;
        let width = node.styles.get("width").and_then(|v| v.length());
        if ctx.tables.is_empty() {
            log::debug!("<{}> outside any table", node.tag);
            return;
        }
        let Some(table) = ctx.tables.last_mut() else {
            return;
        };
        table.enter_cell(colspan, width);
        let inner_style = match kind {
            TagKind::Cell => Some(table.props.cell_content_style.clone()),
            TagKind::HeaderCell => Some(table.props.header_content_style.clone()),
            _ => None,
        };
        ctx.node_mut(id).inner_style = inner_style;
    }

    /// Write what the start of an element translates to
    fn start_element(&mut self, id: NodeId) -> Result<()> {
        let ctx = &mut self.ctx;
        let node = ctx.node(id);
        let spec = node.spec;
        let parent = node.parent;
        if node.remove_tag {
            if let Some(parent) = parent
                && ctx.node(parent).content_dumped
            {
                ctx.write(LINE_BREAK);
                ctx.node_mut(parent).line_break_on_inner = false;
            }
            return Ok(());
        }

        match spec.kind {
            TagKind::StyleOnly => {
                // A span never nests in another: close the enclosing one
                if let Some(parent) = parent
                    && ctx.has_merged()
                {
                    let parent_node = ctx.node(parent);
                    if parent_node.spec.is_style_only()
                        && parent_node.status == DumpStatus::Emitted
                        && !parent_node.suspended
                    {
                        ctx.write(&OdfTag::TextSpan.end_tag());
                        ctx.node_mut(parent).suspended = true;
                    }
                }
                ctx.merge_inline(id);
                ctx.node_mut(id).status = DumpStatus::Waiting;
            }
            _ if spec.is_simple() => {
                if let Some(tag) = ctx.simple_start_tag(id) {
                    ctx.write_start(id, tag);
                }
            }
            TagKind::Anchor => {
                let href = escape_xml(node.attrs.get("href").unwrap_or_default());
                let tag = format!("<text:a xlink:type=\"simple\" xlink:href=\"{}\">", href);
                ctx.write_start(id, tag);
            }
            TagKind::List(kind) => {
                let nested = parent.is_some_and(|p| ctx.node(p).spec.is_list());
                let style = ctx.list_style(id);
                if nested {
                    ctx.write("<text:list-item>");
                }
                let numbering = if kind == ListKind::Numbered {
                    " text:continue-numbering=\"false\""
                } else {
                    ""
                };
                let tag = format!("<text:list text:style-name=\"{}\"{}>", style, numbering);
                ctx.write_start(id, tag);
            }
            TagKind::ListItem => {
                let mut start_value = None;
                if let Some(&list) = ctx.lists.last() {
                    let list = ctx.node_mut(list);
                    list.sub_number += 1;
                    if list.spec.kind == TagKind::List(ListKind::Numbered) {
                        start_value = list.start.take().or((list.sub_number == 1).then_some(1));
                    }
                }
                let tag = match start_value {
                    Some(value) => {
                        let mut buffer = itoa::Buffer::new();
                        format!("<text:list-item text:start-value=\"{}\">", buffer.format(value))
                    }
                    None => "<text:list-item>".to_string(),
                };
                ctx.write_start(id, tag);
            }
            TagKind::Table => {
                if let Some(tag) = ctx.tables.last().map(TableBuilder::start_tag) {
                    ctx.write_start(id, tag);
                }
            }
            TagKind::TableHead => ctx.write_start(id, "<table:table-header-rows>".to_string()),
            TagKind::TableRow => {
                let unbreakable = ctx.tables.last().is_some_and(|t| t.props.unbreakable_rows);
                let tag = if unbreakable {
                    "<table:table-row table:style-name=\"podUnbreakableRow\">"
                } else {
                    "<table:table-row>"
                };
                ctx.write_start(id, tag.to_string());
            }
            TagKind::Image => self.import_image(id)?,
            TagKind::Footnote => {
                let nb = escape_xml(node.attrs.get("nb").unwrap_or_default());
                ctx.write_start(
                    id,
                    format!(
                        "<text:note text:id=\"ftn{nb}\" text:note-class=\"footnote\">\
                         <text:note-citation>{nb}</text:note-citation><text:note-body>"
                    ),
                );
            }
            TagKind::Tab => ctx.write_start(id, "<text:tab/>".to_string()),
            TagKind::Ignorable => ctx.ignore_depth += 1,
            _ => {}
        }
        Ok(())
    }

    fn import_image(&mut self, id: NodeId) -> Result<()> {
        let ctx = &mut self.ctx;
        let node = ctx.node(id);
        let Some(src) = node.attrs.get("src").map(str::trim).filter(|s| !s.is_empty()) else {
            log::debug!("Image without source skipped");
            return Ok(());
        };
        let Some(importer) = ctx.images else {
            log::warn!("No image importer configured, image '{}' skipped", src);
            return Ok(());
        };
        let request = ImageRequest {
            src,
            styles: &node.styles,
            max_width: ctx.options.images_max_width,
            keep_ratio: ctx.options.keep_images_ratio,
        };
        let markup = importer.import(&request).map_err(|e| match e {
            Error::ImageImport { .. } => e,
            other => Error::ImageImport {
                src: src.to_string(),
                reason: other.to_string(),
            },
        })?;
        ctx.write(&markup);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Text events
    // ------------------------------------------------------------------------

    /// Handle a text event. Text is collapsed and held until the next
    /// element event.
    pub fn text(&mut self, text: &str) {
        if self.ctx.ignore_depth > 0 {
            return;
        }
        self.ctx.push_text(text);
    }

    // ------------------------------------------------------------------------
    // End events
    // ------------------------------------------------------------------------

    /// Handle an end-element event. `tag` must be lower-cased and match the
    /// innermost open element.
    pub fn close(&mut self, tag: &str) -> Result<()> {
        let ctx = &mut self.ctx;
        let Some(&id) = ctx.stack.last() else {
            return Err(Error::UnbalancedClose {
                tag: tag.to_string(),
                reason: "no element is open".to_string(),
            });
        };
        let node = ctx.node(id);
        if node.tag != tag {
            return Err(Error::UnbalancedClose {
                tag: tag.to_string(),
                reason: format!("<{}> is still open", node.tag),
            });
        }
        let spec = node.spec;
        if node.ignored {
            ctx.stack.pop();
            if spec.kind == TagKind::Ignorable {
                ctx.ignore_depth = ctx.ignore_depth.saturating_sub(1);
            }
            return Ok(());
        }

        ctx.dump_pending(Place::End, spec);
        ctx.stack.pop();
        match spec.kind {
            TagKind::List(_) => {
                ctx.lists.pop();
            }
            TagKind::Table => {
                if let Some(table) = ctx.tables.pop() {
                    if table.columns() > 0 {
                        table.compute_column_styles(ctx.registry);
                    }
                    let content = table.finish();
                    ctx.write(&content);
                }
            }
            TagKind::TableRow | TagKind::ColumnGroup => {
                if let Some(table) = ctx.tables.last_mut() {
                    table.close_row();
                }
            }
            TagKind::Cell | TagKind::HeaderCell => {
                if let Some(table) = ctx.tables.last_mut() {
                    table.exit_cell();
                }
            }
            TagKind::Column => {
                if let Some(table) = ctx.tables.last_mut() {
                    table.leave_column();
                }
            }
            _ => {}
        }

        let to_close = std::mem::take(&mut ctx.node_mut(id).tags_to_close);
        if !to_close.is_empty() {
            ctx.close_conflictual(&to_close);
        }
        let to_reopen = std::mem::take(&mut ctx.node_mut(id).tags_to_reopen);

        let node = ctx.node(id);
        let parent = node.parent;
        let nested_list = spec.is_list() && parent.is_some_and(|p| ctx.node(p).spec.is_list());
        let stripped = node.conflictual && ctx.strip_if_empty(id);
        if !stripped {
            let end = ctx.close_tags(id);
            ctx.write(&end);
        }
        if nested_list {
            ctx.write("</text:list-item>");
        }

        if spec.is_style_only() {
            ctx.unmerge_inline(id);
            if ctx.has_merged()
                && let Some(parent) = parent
            {
                let parent_node = ctx.node_mut(parent);
                if parent_node.spec.is_style_only() && parent_node.status == DumpStatus::Emitted {
                    parent_node.suspended = true;
                }
            }
        } else if !spec.is_inner() && !ctx.in_inner_tag(id) {
            ctx.reset_inline();
        }
        if spec.kind == TagKind::Ignorable {
            ctx.ignore_depth = ctx.ignore_depth.saturating_sub(1);
        }
        if ctx.node(id).remove_tag
            && let Some(parent) = parent
        {
            ctx.node_mut(parent).line_break_on_inner = true;
        }
        ctx.last_closed = Some(id);
        log::trace!("{}</{}>", "  ".repeat(ctx.depth()), ctx.node(id).label());
        if !to_reopen.is_empty() {
            ctx.reopen(&to_reopen);
        }
        Ok(())
    }

    /// End of the event stream: register the list styles used and return
    /// the markup
    pub fn finish(self) -> Result<Conversion> {
        if let Some(&id) = self.ctx.stack.last() {
            return Err(Error::XmlError(format!("Unclosed element <{}>", self.ctx.node(id).tag)));
        }
        let (content, post_processor_required) = self.ctx.into_output();
        Ok(Conversion {
            content,
            post_processor_required,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::odf::registry::{DynamicStyles, SequentialNames};
    use crate::xhtml::resolver::DefaultStyleResolver;

    fn run(events: &[(&str, &str)]) -> String {
        let options = ConverterOptions::default();
        let resolver = DefaultStyleResolver::default();
        let registry = DynamicStyles::new();
        let names = SequentialNames::new();
        let mut converter = StreamingConverter::new(&options, &resolver, &registry, &names, None);
        for (kind, value) in events {
            match *kind {
                "open" => converter.open(value, Attributes::new()).unwrap(),
                "close" => converter.close(value).unwrap(),
                _ => converter.text(value),
            }
        }
        converter.finish().unwrap().content
    }

    #[test]
    fn test_nested_paragraph_is_flattened() {
        let out = run(&[
            ("open", "p"),
            ("open", "p"),
            ("text", "a"),
            ("close", "p"),
            ("close", "p"),
        ]);
        assert_eq!(out, "<text:p>a</text:p>");
    }

    #[test]
    fn test_unbalanced_close() {
        let options = ConverterOptions::default();
        let resolver = DefaultStyleResolver::default();
        let registry = DynamicStyles::new();
        let names = SequentialNames::new();
        let mut converter = StreamingConverter::new(&options, &resolver, &registry, &names, None);
        assert!(matches!(converter.close("p"), Err(Error::UnbalancedClose { .. })));
        converter.open("p", Attributes::new()).unwrap();
        let err = converter.close("div").unwrap_err();
        assert!(err.to_string().contains("<p> is still open"));
        assert!(matches!(converter.finish(), Err(Error::XmlError(_))));
    }

    #[test]
    fn test_ignorable_content_is_dropped() {
        let out = run(&[
            ("open", "p"),
            ("open", "style"),
            ("text", "p { color: red }"),
            ("open", "title"),
            ("text", "x"),
            ("close", "title"),
            ("close", "style"),
            ("text", "kept"),
            ("close", "p"),
        ]);
        assert_eq!(out, "<text:p>kept</text:p>");
    }

    #[test]
    fn test_empty_span_is_never_written() {
        let out = run(&[
            ("open", "p"),
            ("text", "a"),
            ("open", "b"),
            ("close", "b"),
            ("close", "p"),
        ]);
        assert_eq!(out, "<text:p>a</text:p>");
    }

    #[test]
    fn test_line_break_and_tab() {
        let out = run(&[
            ("open", "p"),
            ("text", "a "),
            ("open", "br"),
            ("close", "br"),
            ("text", " b"),
            ("open", "tab"),
            ("close", "tab"),
            ("close", "p"),
        ]);
        assert_eq!(out, "<text:p>a<text:line-break/>b<text:tab/></text:p>");
    }
}
