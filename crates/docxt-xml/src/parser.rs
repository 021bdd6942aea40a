//! Markup to arena conversion using quick-xml.

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::document::Document;
use crate::error::XmlError;
use crate::node::{Attribute, Node, NodeId};

/// Parse XML into an arena document.
///
/// Qualified names and namespace declarations are kept verbatim. On a parse
/// error after the root element was opened, the partial tree is returned and
/// a warning is logged.
pub(crate) fn parse_document(xml: &str) -> Result<Document, XmlError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut nodes: Vec<Node> = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut root: Option<NodeId> = None;
    let mut declaration = false;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(err) => {
                if root.is_none() {
                    return Err(err.into());
                }
                tracing::warn!(
                    position = reader.buffer_position(),
                    error = %err,
                    "Malformed XML, keeping partial tree"
                );
                break;
            }
        };

        match event {
            Event::Start(e) => {
                let Some(id) = open_element(&reader, &e, &mut nodes, &stack, &mut root) else {
                    continue;
                };
                stack.push(id);
            }
            Event::Empty(e) => {
                open_element(&reader, &e, &mut nodes, &stack, &mut root);
            }
            Event::Text(e) => {
                let Some(&current) = stack.last() else {
                    continue;
                };
                let text = decode_text(&reader, &e);
                nodes[current.0].text.push_str(&text);
            }
            Event::GeneralRef(e) => {
                let Some(&current) = stack.last() else {
                    continue;
                };
                let entity = decode_text(&reader, &e);
                nodes[current.0].text.push_str(&decode_entity(&entity));
            }
            Event::CData(e) => {
                let Some(&current) = stack.last() else {
                    continue;
                };
                nodes[current.0]
                    .text
                    .push_str(&String::from_utf8_lossy(&e));
            }
            Event::End(_) => {
                if let Some(closed) = stack.pop() {
                    drop_layout_whitespace(&mut nodes[closed.0]);
                }
            }
            Event::Decl(_) => declaration = true,
            Event::Eof => break,
            Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if !stack.is_empty() {
        tracing::warn!(open = stack.len(), "Unclosed elements at end of XML");
    }

    let root = root.ok_or(XmlError::NoRootElement)?;
    Ok(Document::from_parts(nodes, root, declaration))
}

/// Create a node for a start tag and link it to the current parent.
///
/// Elements after a closed root element are ignored.
fn open_element(
    reader: &Reader<&[u8]>,
    e: &BytesStart,
    nodes: &mut Vec<Node>,
    stack: &[NodeId],
    root: &mut Option<NodeId>,
) -> Option<NodeId> {
    let parent = stack.last().copied();
    if parent.is_none() && root.is_some() {
        tracing::warn!("Ignoring element after document root");
        return None;
    }

    let mut node = Node::element(decode_name(reader, e.name().as_ref()));
    node.attrs = decode_attrs(reader, e);
    node.parent = parent;

    let id = NodeId(nodes.len());
    nodes.push(node);
    match parent {
        Some(parent) => nodes[parent.0].children.push(id),
        None => *root = Some(id),
    }
    Some(id)
}

/// Drop indentation text of elements that hold child elements.
fn drop_layout_whitespace(node: &mut Node) {
    if !node.children.is_empty() && node.text.trim().is_empty() {
        node.text.clear();
    }
}

fn decode_name(reader: &Reader<&[u8]>, name: &[u8]) -> String {
    reader.decoder().decode(name).map_or_else(
        |_| String::from_utf8_lossy(name).into_owned(),
        std::borrow::Cow::into_owned,
    )
}

/// Character data as a string, replacing undecodable bytes.
fn decode_text(reader: &Reader<&[u8]>, bytes: &[u8]) -> String {
    match reader.decoder().decode(bytes) {
        Ok(text) => text.into_owned(),
        Err(err) => {
            tracing::warn!(
                position = reader.buffer_position(),
                error = %err,
                "Undecodable character data"
            );
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

fn decode_attrs(reader: &Reader<&[u8]>, e: &BytesStart) -> Vec<Attribute> {
    let mut attrs = Vec::new();
    for attr in e.attributes().flatten() {
        let key = decode_name(reader, attr.key.as_ref());
        let value = attr.unescape_value().map_or_else(
            |_| String::from_utf8_lossy(&attr.value).into_owned(),
            std::borrow::Cow::into_owned,
        );
        attrs.push(Attribute { key, value });
    }
    attrs
}

/// Decode XML entity references to their character values.
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        // Numeric character references
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        // Unknown entity - preserve as-is
        _ => format!("&{entity};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_simple_document() {
        let doc = parse_document(r#"<w:document xmlns:w="urn:w"><w:body><w:p><w:r><w:t>Hello</w:t></w:r></w:p></w:body></w:document>"#).unwrap();

        let root = doc.root();
        assert_eq!(doc.tag(root), "w:document");
        assert_eq!(doc.attr(root, "xmlns:w"), Some("urn:w"));

        let text = doc.find_first(root, &["w:t"]).unwrap();
        assert_eq!(doc.text(text), "Hello");
    }

    #[test]
    fn test_parse_entities() {
        let doc = parse_document("<w:t>a &lt; b &amp; c &#169; &#x41;</w:t>").unwrap();
        assert_eq!(doc.text(doc.root()), "a < b & c \u{a9} A");
    }

    #[test]
    fn test_parse_attribute_escapes() {
        let doc = parse_document(r#"<a title="x &quot;y&quot;" other='1'/>"#).unwrap();
        assert_eq!(doc.attr(doc.root(), "title"), Some("x \"y\""));
        assert_eq!(doc.attr(doc.root(), "other"), Some("1"));
    }

    #[test]
    fn test_parse_keeps_leaf_whitespace() {
        let doc = parse_document(
            "<w:p>\n  <w:r><w:t xml:space=\"preserve\">  two  </w:t></w:r>\n</w:p>",
        )
        .unwrap();
        assert_eq!(doc.text(doc.root()), "");
        let text = doc.find_first(doc.root(), &["w:t"]).unwrap();
        assert_eq!(doc.text(text), "  two  ");
    }

    #[test]
    fn test_parse_declaration_detected() {
        let doc = parse_document(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<root/>",
        )
        .unwrap();
        assert!(doc.has_declaration());
        assert_eq!(doc.tag(doc.root()), "root");
    }

    #[test]
    fn test_parse_malformed_keeps_partial_tree() {
        let doc = parse_document("<w:body><w:p><w:t>kept</w:t></w:p><w:p></w:q>").unwrap();
        assert_eq!(doc.tag(doc.root()), "w:body");
        assert!(doc.all_text(doc.root()).contains("kept"));
    }

    #[test]
    fn test_parse_without_root_fails() {
        assert!(matches!(
            parse_document("just text"),
            Err(XmlError::NoRootElement)
        ));
    }

    #[test]
    fn test_undecodable_text_is_replaced() {
        let reader = Reader::from_str("");
        assert_eq!(decode_text(&reader, &[b'a', 0xff, b'b']), "a\u{fffd}b");
    }
}
