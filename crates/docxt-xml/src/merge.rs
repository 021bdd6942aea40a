//! Repair of text that a word processor split across several runs.
//!
//! Editors split one logical run into several `w:r` elements whenever
//! revision ids, spell checking or formatting boundaries change. A
//! placeholder typed in one go can end up as `{{Na` + `me}}` in two text
//! nodes, which no single-node matcher can see.

use crate::document::Document;
use crate::node::NodeId;
use crate::wordml::{self, PARAGRAPH, RUN, RUN_PROPERTIES, TEXT};

/// Opening placeholder marker.
pub const MARKER_OPEN: &str = "{{";
/// Closing placeholder marker.
pub const MARKER_CLOSE: &str = "}}";

/// Whether `text` leaves a placeholder marker open.
///
/// `{{` and `}}` are scanned as single tokens and nesting depth is tracked.
/// A trailing lone `{` also counts as open, since the second brace may sit in
/// the next node.
pub fn has_open_marker(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i..].starts_with(MARKER_OPEN.as_bytes()) {
            depth += 1;
            i += MARKER_OPEN.len();
            continue;
        }
        if bytes[i..].starts_with(MARKER_CLOSE.as_bytes()) {
            depth = depth.saturating_sub(1);
            i += MARKER_CLOSE.len();
            continue;
        }
        if i == bytes.len() - 1 && bytes[i] == b'{' {
            return true;
        }
        i += 1;
    }
    depth > 0
}

/// Paragraphs inside `scope`, including `scope` itself.
fn paragraphs(doc: &Document, scope: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    if doc.tag(scope) == PARAGRAPH {
        out.push(scope);
    }
    out.extend(doc.find_all(scope, &[PARAGRAPH]));
    out
}

/// Text nodes whose nearest paragraph is `paragraph`.
fn own_texts(doc: &Document, paragraph: NodeId) -> Vec<NodeId> {
    doc.find_all(paragraph, &[TEXT])
        .into_iter()
        .filter(|&text| {
            doc.parent(text)
                .and_then(|parent| doc.closest_ancestor_of_type(parent, &[PARAGRAPH]))
                == Some(paragraph)
        })
        .collect()
}

/// Formatting fingerprint of a run: its serialized properties.
fn fingerprint(doc: &Document, run: NodeId) -> String {
    wordml::child_by_tag(doc, run, RUN_PROPERTIES)
        .map(|props| doc.node_to_xml(props))
        .unwrap_or_default()
}

/// Text node of a run that holds nothing but properties and one text.
fn sole_text(doc: &Document, run: NodeId) -> Option<NodeId> {
    let mut text = None;
    for &child in doc.children(run) {
        match doc.tag(child) {
            RUN_PROPERTIES => {}
            TEXT if text.is_none() => text = Some(child),
            _ => return None,
        }
    }
    text
}

/// Merge neighbouring runs with identical formatting inside `scope`.
///
/// The text of each absorbed run is appended to the first run of the group
/// and the absorbed run is deleted. Returns the number of deleted runs.
pub fn merge_adjacent_runs(doc: &mut Document, scope: NodeId) -> usize {
    let mut merged = 0;
    for paragraph in paragraphs(doc, scope) {
        if !doc.is_live(paragraph) {
            continue;
        }
        let mut anchor: Option<(NodeId, String)> = None;
        for child in doc.children(paragraph).to_vec() {
            let Some(text) = (doc.tag(child) == RUN)
                .then(|| sole_text(doc, child))
                .flatten()
            else {
                anchor = None;
                continue;
            };

            let print = fingerprint(doc, child);
            let target = anchor
                .as_ref()
                .filter(|(_, anchor_print)| *anchor_print == print)
                .map(|&(anchor_text, _)| anchor_text);
            if let Some(anchor_text) = target {
                let absorbed = doc.text(text).to_owned();
                doc.push_text(anchor_text, &absorbed);
                wordml::preserve_space(doc, anchor_text);
                doc.delete(child);
                merged += 1;
            } else {
                anchor = Some((text, print));
            }
        }
    }
    if merged > 0 {
        tracing::debug!(merged, "Merged adjacent runs");
    }
    merged
}

/// Join text nodes that together complete a placeholder marker.
///
/// A text node that leaves `{{` open absorbs the following text nodes of the
/// same paragraph until the marker closes. Absorbed text nodes are deleted,
/// and so are runs left without text. Nothing is merged when the paragraph
/// never closes the marker. Returns the number of absorbed text nodes.
pub fn merge_broken_placeholders(doc: &mut Document, scope: NodeId) -> usize {
    let mut absorbed = 0;
    for paragraph in paragraphs(doc, scope) {
        if !doc.is_live(paragraph) {
            continue;
        }
        let texts = own_texts(doc, paragraph);
        let mut i = 0;
        while i < texts.len() {
            if !has_open_marker(doc.text(texts[i])) {
                i += 1;
                continue;
            }
            let Some(end) = closing_index(doc, &texts, i) else {
                i += 1;
                continue;
            };
            for &text in &texts[i + 1..=end] {
                let content = doc.text(text).to_owned();
                doc.push_text(texts[i], &content);
                consume(doc, text);
                absorbed += 1;
            }
            wordml::preserve_space(doc, texts[i]);
            i = end + 1;
        }
    }
    if absorbed > 0 {
        tracing::debug!(absorbed, "Merged broken placeholders");
    }
    absorbed
}

/// Index of the text node that closes the marker opened in `texts[start]`.
fn closing_index(doc: &Document, texts: &[NodeId], start: usize) -> Option<usize> {
    let mut joined = doc.text(texts[start]).to_owned();
    for (offset, &text) in texts[start + 1..].iter().enumerate() {
        joined.push_str(doc.text(text));
        if !has_open_marker(&joined) {
            return Some(start + 1 + offset);
        }
    }
    None
}

/// Delete an absorbed text node and its run when nothing else remains in it.
fn consume(doc: &mut Document, text: NodeId) {
    let run = doc.parent(text);
    doc.delete(text);
    if let Some(run) = run
        && doc.tag(run) == RUN
        && doc
            .children(run)
            .iter()
            .all(|&child| doc.tag(child) == RUN_PROPERTIES)
    {
        doc.delete(run);
    }
}
