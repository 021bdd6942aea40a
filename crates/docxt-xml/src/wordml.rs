//! WordprocessingML vocabulary used by the template engine.

use crate::document::Document;
use crate::node::NodeId;

/// Paragraph.
pub const PARAGRAPH: &str = "w:p";
/// Paragraph properties.
pub const PARAGRAPH_PROPERTIES: &str = "w:pPr";
/// Numbering properties of a list paragraph.
pub const NUMBERING_PROPERTIES: &str = "w:numPr";
/// Numbering definition reference.
pub const NUMBERING_ID: &str = "w:numId";
/// Run of uniformly formatted text.
pub const RUN: &str = "w:r";
/// Run properties.
pub const RUN_PROPERTIES: &str = "w:rPr";
/// Text of a run.
pub const TEXT: &str = "w:t";
/// Table.
pub const TABLE: &str = "w:tbl";
/// Table row.
pub const TABLE_ROW: &str = "w:tr";
/// Table cell.
pub const TABLE_CELL: &str = "w:tc";

/// Generic value attribute.
pub const VAL_ATTR: &str = "w:val";
/// Whitespace handling attribute.
pub const SPACE_ATTR: &str = "xml:space";

/// Elements that can be repeated for list data.
pub const ROW_TYPES: &[&str] = &[TABLE_ROW, PARAGRAPH];

/// Numbering id of a list paragraph, read from `w:pPr/w:numPr/w:numId`.
pub fn numbering_id(doc: &Document, paragraph: NodeId) -> Option<String> {
    if doc.tag(paragraph) != PARAGRAPH {
        return None;
    }
    let props = child_by_tag(doc, paragraph, PARAGRAPH_PROPERTIES)?;
    let numbering = child_by_tag(doc, props, NUMBERING_PROPERTIES)?;
    let id = child_by_tag(doc, numbering, NUMBERING_ID)?;
    doc.attr(id, VAL_ATTR).map(str::to_owned)
}

/// First direct child with the given tag.
pub fn child_by_tag(doc: &Document, parent: NodeId, tag: &str) -> Option<NodeId> {
    doc.children(parent)
        .iter()
        .copied()
        .find(|&child| doc.tag(child) == tag)
}

/// Mark a text node to keep leading and trailing whitespace.
pub fn preserve_space(doc: &mut Document, text: NodeId) {
    let value = doc.text(text);
    if value.starts_with(char::is_whitespace) || value.ends_with(char::is_whitespace) {
        doc.set_attr(text, SPACE_ATTR, "preserve");
    }
}
