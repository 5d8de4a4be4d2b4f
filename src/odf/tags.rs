//! ODF target vocabulary.
//!
//! The converter only ever writes a small subset of the OpenDocument text and
//! table namespaces. Each element it can produce is an [`OdfTag`] variant, and
//! the qualified names are resolved through a compile-time `phf` map so the
//! writer never builds tag names from fragments.
//!
//! # References
//!
//! - OpenDocument 1.3, part 3, sections 5 (text) and 9 (tables)

use phf::{Map, phf_map};

// ============================================================================
// TAG TYPE ENUMERATION
// ============================================================================

/// ODF elements emitted by the converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OdfTag {
    // Text elements
    TextP,
    TextH,
    TextSpan,
    TextA,
    TextLineBreak,
    TextTab,
    TextList,
    TextListItem,
    TextNote,
    TextNoteCitation,
    TextNoteBody,

    // Table elements
    TableTable,
    TableTableHeaderRows,
    TableTableRow,
    TableTableCell,
    TableTableColumn,
}

// ============================================================================
// COMPILE-TIME TAG MAPPING
// ============================================================================

/// Qualified name to [`OdfTag`] mapping
static TAG_MAP: Map<&'static str, OdfTag> = phf_map! {
    "text:p" => OdfTag::TextP,
    "text:h" => OdfTag::TextH,
    "text:span" => OdfTag::TextSpan,
    "text:a" => OdfTag::TextA,
    "text:line-break" => OdfTag::TextLineBreak,
    "text:tab" => OdfTag::TextTab,
    "text:list" => OdfTag::TextList,
    "text:list-item" => OdfTag::TextListItem,
    "text:note" => OdfTag::TextNote,
    "text:note-citation" => OdfTag::TextNoteCitation,
    "text:note-body" => OdfTag::TextNoteBody,

    "table:table" => OdfTag::TableTable,
    "table:table-header-rows" => OdfTag::TableTableHeaderRows,
    "table:table-row" => OdfTag::TableTableRow,
    "table:table-cell" => OdfTag::TableTableCell,
    "table:table-column" => OdfTag::TableTableColumn,
};

impl OdfTag {
    /// Qualified element name, including the namespace prefix
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::TextP => "text:p",
            Self::TextH => "text:h",
            Self::TextSpan => "text:span",
            Self::TextA => "text:a",
            Self::TextLineBreak => "text:line-break",
            Self::TextTab => "text:tab",
            Self::TextList => "text:list",
            Self::TextListItem => "text:list-item",
            Self::TextNote => "text:note",
            Self::TextNoteCitation => "text:note-citation",
            Self::TextNoteBody => "text:note-body",
            Self::TableTable => "table:table",
            Self::TableTableHeaderRows => "table:table-header-rows",
            Self::TableTableRow => "table:table-row",
            Self::TableTableCell => "table:table-cell",
            Self::TableTableColumn => "table:table-column",
        }
    }

    /// Look up a qualified name
    #[inline]
    pub fn from_name(name: &str) -> Option<Self> {
        TAG_MAP.get(name).copied()
    }

    /// Elements that never carry content and are written self-closed
    #[inline]
    pub const fn is_void(&self) -> bool {
        matches!(self, Self::TextLineBreak | Self::TextTab | Self::TableTableColumn)
    }

    /// Closing tag, e.g. `</text:p>`
    #[inline]
    pub fn end_tag(&self) -> String {
        format!("</{}>", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip_through_map() {
        for tag in [OdfTag::TextP, OdfTag::TextSpan, OdfTag::TableTableCell, OdfTag::TextNoteBody] {
            assert_eq!(OdfTag::from_name(tag.as_str()), Some(tag));
        }
        assert_eq!(OdfTag::from_name("draw:frame"), None);
    }

    #[test]
    fn test_void_tags() {
        assert!(OdfTag::TextLineBreak.is_void());
        assert!(!OdfTag::TextList.is_void());
        assert_eq!(OdfTag::TextH.end_tag(), "</text:h>");
    }
}
