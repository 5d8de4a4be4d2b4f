//! Conversion state of one open source element.

use crate::css::CssStyles;
use crate::odf::OdfTag;
use crate::xhtml::Attributes;
use crate::xhtml::tags::{TagKind, TagSpec};
use smallvec::SmallVec;

/// Index of a node in the context's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

/// Whether an element's start tag was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpStatus {
    /// Nothing decided yet
    #[default]
    Pending,
    /// Style-only element whose start tag waits for content
    Waiting,
    /// Start tag written
    Emitted,
}

/// One source element, from its start tag to its end tag.
///
/// Nodes are owned by the context's arena; `parent` is a plain index.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub(crate) tag: String,
    pub(crate) spec: TagSpec,
    pub(crate) parent: Option<NodeId>,
    /// Own styles, never aliased with anything else
    pub(crate) styles: CssStyles,
    pub(crate) attrs: Attributes,
    /// ODF attributes, resolved once
    attributes: Option<String>,
    /// Exact start tag last written for this node
    pub(crate) written_start: Option<String>,
    /// Content is kept, the wrapping tag is not written
    pub(crate) remove_tag: bool,
    pub(crate) content_dumped: bool,
    pub(crate) status: DumpStatus,
    /// Emitted span closed by a nested style-only element; reopened on the
    /// next text
    pub(crate) suspended: bool,
    /// Created inside an ignorable region
    pub(crate) ignored: bool,
    /// Implicit inner paragraphs, closed before this node
    pub(crate) tags_to_close: SmallVec<[NodeId; 1]>,
    /// Ancestors closed when this node opened, outermost first
    pub(crate) tags_to_reopen: SmallVec<[NodeId; 2]>,
    pub(crate) conflictual: bool,
    /// Style of the implicit paragraphs of a cell
    pub(crate) inner_style: Option<String>,
    /// Styles handed down to the implicit paragraph
    pub(crate) inner_css: Option<CssStyles>,
    /// Style of the items' paragraphs, for lists
    pub(crate) para_style: Option<String>,
    /// Name of the list style written on `text:list`
    pub(crate) list_style: Option<String>,
    /// Number of items seen, for lists
    pub(crate) sub_number: u32,
    /// `ol start=`, consumed by the first item
    pub(crate) start: Option<u32>,
    /// Write a line break before the next inline child
    pub(crate) line_break_on_inner: bool,
}

impl ElementNode {
    /// Create the node of a source element. Never fails: unusable style
    /// input yields empty styles.
    pub fn new(tag: &str, attrs: Attributes, parent: Option<NodeId>) -> Self {
        let spec = TagSpec::lookup(tag);
        let styles = CssStyles::from_element(tag, &attrs);
        let start = match spec.kind {
            TagKind::List(_) if tag == "ol" => attrs.get_u32("start"),
            _ => None,
        };
        let inner_css =
            (spec.kind == TagKind::ListItem && !styles.is_empty()).then(|| styles.clone());
        Self {
            tag: tag.to_string(),
            spec,
            parent,
            styles,
            attrs,
            attributes: None,
            written_start: None,
            remove_tag: false,
            content_dumped: false,
            status: DumpStatus::Pending,
            suspended: false,
            ignored: false,
            tags_to_close: SmallVec::new(),
            tags_to_reopen: SmallVec::new(),
            conflictual: false,
            inner_style: None,
            inner_css,
            para_style: None,
            list_style: None,
            sub_number: 0,
            start,
            line_break_on_inner: false,
        }
    }

    #[inline]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    #[inline]
    pub fn spec(&self) -> TagSpec {
        self.spec
    }

    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[inline]
    pub fn styles(&self) -> &CssStyles {
        &self.styles
    }

    #[inline]
    pub fn odf_tag(&self) -> Option<OdfTag> {
        self.spec.odf
    }

    #[inline]
    pub fn status(&self) -> DumpStatus {
        self.status
    }

    /// Mark the node as closed by a conflict. Idempotent.
    #[inline]
    pub fn set_conflictual(&mut self) {
        self.conflictual = true;
    }

    #[inline]
    pub fn is_conflictual(&self) -> bool {
        self.conflictual
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        self.remove_tag
    }

    /// Unwrapped or unknown: no tag is written, content goes to the nearest
    /// written ancestor
    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.remove_tag || self.spec.kind == TagKind::Unknown
    }

    /// Waiting for content, or suspended by a nested span: not currently
    /// open in the output
    #[inline]
    pub fn is_deferred(&self) -> bool {
        self.status == DumpStatus::Waiting || self.suspended
    }

    /// Remember the styles of an unwrapped child for the implicit paragraph.
    /// The first styles captured win.
    pub fn add_inner_css(&mut self, styles: &CssStyles) {
        if self.inner_css.is_none() && !styles.is_empty() {
            self.inner_css = Some(styles.clone());
        }
    }

    /// Cached ODF attributes, if already resolved
    #[inline]
    pub fn cached_attributes(&self) -> Option<&str> {
        self.attributes.as_deref()
    }

    pub(crate) fn cache_attributes(&mut self, attributes: String) {
        self.attributes = Some(attributes);
    }

    /// Label used in conversion traces: `p`, `li+p`, `p-` (removed),
    /// `p*` (conflictual)
    pub fn label(&self) -> String {
        let mut label = self.tag.clone();
        if !self.tags_to_close.is_empty() {
            label.push_str("+p");
        }
        if self.remove_tag {
            label.push('-');
        }
        if self.conflictual {
            label.push('*');
        }
        label
    }
}
