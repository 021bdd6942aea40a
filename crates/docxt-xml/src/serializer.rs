//! Arena to markup conversion.

use crate::document::Document;
use crate::node::NodeId;

/// Declaration emitted for documents that carried one.
const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

/// Serialize the live tree of a document.
pub(crate) fn serialize_document(doc: &Document) -> String {
    let mut out = String::with_capacity(4096);
    if doc.has_declaration() {
        out.push_str(XML_DECLARATION);
        out.push_str("\r\n");
    }
    if doc.is_live(doc.root()) {
        serialize_node(doc, doc.root(), &mut out);
    }
    out
}

/// Serialize a single subtree.
pub(crate) fn serialize_subtree(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    if doc.is_live(id) {
        serialize_node(doc, id, &mut out);
    }
    out
}

/// Serialize a single node recursively.
///
/// Children lists only hold live nodes, so tombstoned subtrees never reach
/// the output.
fn serialize_node(doc: &Document, id: NodeId, out: &mut String) {
    let tag = doc.tag(id);

    // Opening tag
    out.push('<');
    out.push_str(tag);

    // Attributes
    for attr in doc.attrs(id) {
        out.push(' ');
        out.push_str(&attr.key);
        out.push_str("=\"");
        out.push_str(&escape_attr(&attr.value));
        out.push('"');
    }

    let text = doc.text(id);
    let children = doc.children(id);
    if children.is_empty() && text.is_empty() {
        // Self-closing tag
        out.push_str(" />");
        return;
    }
    out.push('>');

    // Text content
    if !text.is_empty() {
        out.push_str(&escape_text(text));
    }

    // Children
    for &child in children {
        serialize_node(doc, child, out);
    }

    // Closing tag
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

/// Escape text for XML content.
fn escape_text(text: &str) -> String {
    escape_xml(text, false)
}

/// Escape text for XML attribute values.
fn escape_attr(text: &str) -> String {
    escape_xml(text, true)
}

/// Escape XML special characters.
fn escape_xml(text: &str, escape_quotes: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if escape_quotes => result.push_str("&quot;"),
            '\'' if escape_quotes => result.push_str("&apos;"),
            _ => result.push(ch),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_serialize_round_trip() {
        let xml = r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t xml:space="preserve">Hi </w:t></w:r></w:p><w:sectPr /></w:body></w:document>"#;
        let doc = Document::parse(xml).unwrap();
        assert_eq!(doc.to_xml(), xml);
    }

    #[test]
    fn test_serialize_with_declaration() {
        let doc = Document::parse("<?xml version=\"1.0\"?>\n<root><a/></root>").unwrap();
        assert_eq!(
            doc.to_xml(),
            format!("{XML_DECLARATION}\r\n<root><a /></root>")
        );
    }

    #[test]
    fn test_escape_special_chars() {
        let mut doc = Document::new("w:t");
        let root = doc.root();
        doc.set_text(root, "a < b & c > d");
        doc.set_attr(root, "alt", "say \"hi\"");
        assert_eq!(
            doc.to_xml(),
            r#"<w:t alt="say &quot;hi&quot;">a &lt; b &amp; c &gt; d</w:t>"#
        );
    }

    #[test]
    fn test_deleted_nodes_are_skipped() {
        let mut doc = Document::parse("<r><a>1</a><b>2</b></r>").unwrap();
        let a = doc.first_child(doc.root()).unwrap();
        doc.delete(a);
        assert_eq!(doc.to_xml(), "<r><b>2</b></r>");
    }

    #[test]
    fn test_serialize_subtree() {
        let doc = Document::parse("<r><a x=\"1\"><b /></a></r>").unwrap();
        let a = doc.first_child(doc.root()).unwrap();
        assert_eq!(doc.node_to_xml(a), r#"<a x="1"><b /></a>"#);
    }
}
