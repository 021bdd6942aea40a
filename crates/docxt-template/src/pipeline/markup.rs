//! Synthetic list markup and run repair.

use docxt_xml::merge::{MARKER_OPEN, merge_adjacent_runs, merge_broken_placeholders};
use docxt_xml::wordml::{self, PARAGRAPH};
use docxt_xml::{Document, NodeId};

/// Attribute holding the numbering id of a list paragraph during expansion.
pub(crate) const LIST_ID_ATTR: &str = "docxt:list";

/// Tag every list paragraph with its numbering id.
pub(crate) fn mark_lists(doc: &mut Document) -> usize {
    let root = doc.root();
    let mut marked = 0;
    for paragraph in doc.find_all(root, &[PARAGRAPH]) {
        if let Some(id) = wordml::numbering_id(doc, paragraph) {
            doc.set_attr(paragraph, LIST_ID_ATTR, id);
            marked += 1;
        }
    }
    marked
}

/// List identity of a paragraph, `None` for ordinary paragraphs.
pub(crate) fn list_id(doc: &Document, paragraph: NodeId) -> Option<String> {
    doc.attr(paragraph, LIST_ID_ATTR)
        .map(str::to_owned)
        .or_else(|| wordml::numbering_id(doc, paragraph))
}

/// Merge runs of every paragraph that holds a placeholder marker.
pub(crate) fn repair_runs(doc: &mut Document) {
    let root = doc.root();
    let mut paragraphs = doc.find_all(root, &[PARAGRAPH]);
    if doc.is(root, &[PARAGRAPH]) {
        paragraphs.insert(0, root);
    }
    for paragraph in paragraphs {
        if doc.is_live(paragraph) && doc.all_text(paragraph).contains(MARKER_OPEN) {
            merge_adjacent_runs(doc, paragraph);
            merge_broken_placeholders(doc, paragraph);
        }
    }
}

/// Remove the synthetic list markup.
pub(crate) fn strip_marks(doc: &mut Document) {
    let root = doc.root();
    doc.remove_attr_deep(root, LIST_ID_ATTR);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const LIST: &str = r#"<w:body><w:p><w:pPr><w:numPr><w:numId w:val="4" /></w:numPr></w:pPr><w:r><w:t>a</w:t></w:r></w:p><w:p><w:r><w:t>b</w:t></w:r></w:p></w:body>"#;

    #[test]
    fn test_mark_and_strip_lists() {
        let mut doc = Document::parse(LIST).unwrap();
        assert_eq!(mark_lists(&mut doc), 1);

        let paragraphs = doc.find_all(doc.root(), &[PARAGRAPH]);
        assert_eq!(doc.attr(paragraphs[0], LIST_ID_ATTR), Some("4"));
        assert_eq!(list_id(&doc, paragraphs[1]), None);

        strip_marks(&mut doc);
        assert_eq!(doc.to_xml(), LIST);
    }

    #[test]
    fn test_repair_only_touches_placeholder_paragraphs() {
        let mut doc = Document::parse(
            "<w:body><w:p><w:r><w:t>a</w:t></w:r><w:r><w:t>b</w:t></w:r></w:p><w:p><w:r><w:t>{{Na</w:t></w:r><w:r><w:t>me}}</w:t></w:r></w:p></w:body>",
        )
        .unwrap();
        repair_runs(&mut doc);
        assert_eq!(
            doc.to_xml(),
            "<w:body><w:p><w:r><w:t>a</w:t></w:r><w:r><w:t>b</w:t></w:r></w:p><w:p><w:r><w:t>{{Name}}</w:t></w:r></w:p></w:body>"
        );
    }

    #[test]
    fn test_repair_is_idempotent() {
        let mut doc = Document::parse(
            "<w:p><w:r><w:t>{</w:t></w:r><w:r><w:rPr><w:i /></w:rPr><w:t>{Name}} x</w:t></w:r></w:p>",
        )
        .unwrap();
        repair_runs(&mut doc);
        let once = doc.to_xml();
        assert_eq!(doc.all_text(doc.root()), "{{Name}} x");
        repair_runs(&mut doc);
        assert_eq!(doc.to_xml(), once);
    }
}
