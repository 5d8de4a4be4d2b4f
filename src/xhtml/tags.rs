//! Source tag vocabulary.
//!
//! Every source tag the converter understands maps, through a compile-time
//! `phf` table, to a [`TagSpec`]: its category, which drives dispatch and
//! conflict detection, and the ODF element it becomes. Unknown tags get
//! [`TagSpec::UNKNOWN`]; their content is kept and their wrapper dropped.

use crate::odf::OdfTag;
use crate::odf::style::ListKind;
use phf::{Map, phf_map};

/// Category of a source tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    /// `h1` to `h6`, with the level
    Heading(u8),
    /// `p`, `div`, `blockquote`, `address`
    Paragraph,
    /// `sub`, `sup`: spans written eagerly
    Script,
    LineBreak,
    /// Inline tags that only carry styling, written lazily
    StyleOnly,
    Anchor,
    Image,
    /// `acronym`: inline, with no ODF counterpart
    InlineOther,
    List(ListKind),
    ListItem,
    Table,
    TableHead,
    TableRow,
    ColumnGroup,
    Column,
    Cell,
    HeaderCell,
    /// `footnote nb="..."`, not an HTML tag
    Footnote,
    /// `tab`, not an HTML tag
    Tab,
    /// `meta`, `title`, `style`, `script`: dropped with their content
    Ignorable,
    Unknown,
}

/// What the converter knows about one source tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpec {
    pub kind: TagKind,
    pub odf: Option<OdfTag>,
}

const fn spec(kind: TagKind, odf: Option<OdfTag>) -> TagSpec {
    TagSpec { kind, odf }
}

const SPAN: Option<OdfTag> = Some(OdfTag::TextSpan);
const PARA: Option<OdfTag> = Some(OdfTag::TextP);
const HEADING: Option<OdfTag> = Some(OdfTag::TextH);

static TAGS: Map<&'static str, TagSpec> = phf_map! {
    "h1" => spec(TagKind::Heading(1), HEADING),
    "h2" => spec(TagKind::Heading(2), HEADING),
    "h3" => spec(TagKind::Heading(3), HEADING),
    "h4" => spec(TagKind::Heading(4), HEADING),
    "h5" => spec(TagKind::Heading(5), HEADING),
    "h6" => spec(TagKind::Heading(6), HEADING),
    "p" => spec(TagKind::Paragraph, PARA),
    "div" => spec(TagKind::Paragraph, PARA),
    "blockquote" => spec(TagKind::Paragraph, PARA),
    "address" => spec(TagKind::Paragraph, PARA),
    "sub" => spec(TagKind::Script, SPAN),
    "sup" => spec(TagKind::Script, SPAN),
    "br" => spec(TagKind::LineBreak, Some(OdfTag::TextLineBreak)),

    "b" => spec(TagKind::StyleOnly, SPAN),
    "strong" => spec(TagKind::StyleOnly, SPAN),
    "i" => spec(TagKind::StyleOnly, SPAN),
    "em" => spec(TagKind::StyleOnly, SPAN),
    "strike" => spec(TagKind::StyleOnly, SPAN),
    "s" => spec(TagKind::StyleOnly, SPAN),
    "u" => spec(TagKind::StyleOnly, SPAN),
    "span" => spec(TagKind::StyleOnly, SPAN),
    "q" => spec(TagKind::StyleOnly, SPAN),
    "code" => spec(TagKind::StyleOnly, SPAN),
    "font" => spec(TagKind::StyleOnly, SPAN),
    "samp" => spec(TagKind::StyleOnly, SPAN),
    "kbd" => spec(TagKind::StyleOnly, SPAN),
    "var" => spec(TagKind::StyleOnly, SPAN),
    "label" => spec(TagKind::StyleOnly, SPAN),
    "abbr" => spec(TagKind::StyleOnly, SPAN),

    "a" => spec(TagKind::Anchor, Some(OdfTag::TextA)),
    "img" => spec(TagKind::Image, None),
    "acronym" => spec(TagKind::InlineOther, None),

    "ul" => spec(TagKind::List(ListKind::Bulleted), Some(OdfTag::TextList)),
    "ol" => spec(TagKind::List(ListKind::Numbered), Some(OdfTag::TextList)),
    "li" => spec(TagKind::ListItem, Some(OdfTag::TextListItem)),

    "table" => spec(TagKind::Table, Some(OdfTag::TableTable)),
    "thead" => spec(TagKind::TableHead, Some(OdfTag::TableTableHeaderRows)),
    "tr" => spec(TagKind::TableRow, Some(OdfTag::TableTableRow)),
    "colgroup" => spec(TagKind::ColumnGroup, None),
    "col" => spec(TagKind::Column, None),
    "td" => spec(TagKind::Cell, Some(OdfTag::TableTableCell)),
    "th" => spec(TagKind::HeaderCell, Some(OdfTag::TableTableCell)),

    "footnote" => spec(TagKind::Footnote, Some(OdfTag::TextNote)),
    "tab" => spec(TagKind::Tab, Some(OdfTag::TextTab)),

    "meta" => spec(TagKind::Ignorable, None),
    "title" => spec(TagKind::Ignorable, None),
    "style" => spec(TagKind::Ignorable, None),
    "script" => spec(TagKind::Ignorable, None),
};

impl TagSpec {
    pub const UNKNOWN: TagSpec = spec(TagKind::Unknown, None);

    /// Spec of a lower-cased source tag
    #[inline]
    pub fn lookup(tag: &str) -> TagSpec {
        TAGS.get(tag).copied().unwrap_or(Self::UNKNOWN)
    }

    /// Inline content other than line breaks
    #[inline]
    pub fn is_inner_no_br(&self) -> bool {
        matches!(
            self.kind,
            TagKind::StyleOnly
                | TagKind::Script
                | TagKind::Anchor
                | TagKind::Image
                | TagKind::InlineOther
        )
    }

    /// Inline content, line breaks included
    #[inline]
    pub fn is_inner(&self) -> bool {
        self.is_inner_no_br() || self.kind == TagKind::LineBreak
    }

    #[inline]
    pub fn is_style_only(&self) -> bool {
        self.kind == TagKind::StyleOnly
    }

    /// Paragraph-like block tags
    #[inline]
    pub fn is_para_tag(&self) -> bool {
        self.kind == TagKind::Paragraph
    }

    /// Element type "para": paragraph-like tags and list items
    #[inline]
    pub fn is_para_type(&self) -> bool {
        matches!(self.kind, TagKind::Paragraph | TagKind::ListItem)
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self.kind, TagKind::List(_))
    }

    #[inline]
    pub fn is_heading(&self) -> bool {
        matches!(self.kind, TagKind::Heading(_))
    }

    /// Tags translated by writing their ODF start tag right away
    #[inline]
    pub fn is_simple(&self) -> bool {
        matches!(
            self.kind,
            TagKind::Heading(_)
                | TagKind::Paragraph
                | TagKind::Script
                | TagKind::LineBreak
                | TagKind::Cell
                | TagKind::HeaderCell
        )
    }

    /// `td`, `th`
    #[inline]
    pub fn is_cell(&self) -> bool {
        matches!(self.kind, TagKind::Cell | TagKind::HeaderCell)
    }

    /// Tags advancing the column cursor: cells and `col`
    #[inline]
    pub fn is_column(&self) -> bool {
        self.is_cell() || self.kind == TagKind::Column
    }

    /// Tags ending a row: `tr`, `colgroup`
    #[inline]
    pub fn is_row(&self) -> bool {
        matches!(self.kind, TagKind::TableRow | TagKind::ColumnGroup)
    }

    /// Containers whose inline content needs an implicit paragraph
    #[inline]
    pub fn is_outer(&self) -> bool {
        self.is_cell() || self.kind == TagKind::ListItem
    }

    /// Cannot appear inside a paragraph
    #[inline]
    pub fn not_inside_p(&self) -> bool {
        self.is_heading() || self.is_list() || self.kind == TagKind::Table
    }

    /// Cannot appear inside a paragraph, paragraphs included
    #[inline]
    pub fn not_inside_p_or_p(&self) -> bool {
        self.not_inside_p() || self.is_para_tag()
    }

    /// Cannot appear inside a list item
    #[inline]
    pub fn not_inside_li(&self) -> bool {
        self.is_heading() || self.kind == TagKind::Table || self.is_para_tag()
    }

    /// Cannot appear directly inside a list
    #[inline]
    pub fn not_inside_list(&self) -> bool {
        self.kind == TagKind::Table
    }
}
