//! Line breaks in substituted values.
//!
//! A line feed inside `w:t` is not rendered as a break, so a paragraph whose
//! text holds one is cloned once per line. Each clone keeps the content
//! before the line (first clone) or after it (last clone) and the line
//! itself in place of the original text.

use std::collections::HashSet;

use docxt_xml::wordml::{self, PARAGRAPH, TEXT};
use docxt_xml::{Document, NodeId};

use super::{delete_text, own_texts};

/// Split paragraphs at line feeds in their text. Returns the number of
/// paragraphs split.
pub(crate) fn split_lines(doc: &mut Document) -> usize {
    let root = doc.root();
    let mut split = 0;
    let mut skipped = HashSet::new();
    loop {
        let found = doc
            .find_all(root, &[TEXT])
            .into_iter()
            .find(|&text| !skipped.contains(&text) && doc.text(text).contains('\n'));
        let Some(text) = found else {
            break;
        };
        let located = doc
            .closest_ancestor_of_type(text, &[PARAGRAPH])
            .and_then(|paragraph| Some((paragraph, doc.path_from(paragraph, text)?)));
        let Some((paragraph, path)) = located else {
            skipped.insert(text);
            continue;
        };
        let value = doc.text(text).to_owned();
        split_paragraph(doc, paragraph, &path, &value);
        split += 1;
    }
    split
}

fn split_paragraph(doc: &mut Document, paragraph: NodeId, path: &[usize], value: &str) {
    let lines: Vec<&str> = value
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let last_line = lines.len() - 1;

    let mut anchor = paragraph;
    for (n, line) in lines.iter().enumerate() {
        let clone = doc.clone_subtree(paragraph);
        doc.insert_after(anchor, clone);
        anchor = clone;

        let Some(twin) = doc.follow_path(clone, path) else {
            continue;
        };
        doc.set_text(twin, *line);
        doc.remove_attr(twin, wordml::SPACE_ATTR);
        wordml::preserve_space(doc, twin);

        let texts = own_texts(doc, clone);
        let Some(position) = texts.iter().position(|&text| text == twin) else {
            continue;
        };
        for (k, &text) in texts.iter().enumerate() {
            if (n > 0 && k < position) || (n < last_line && k > position) {
                delete_text(doc, text);
            }
        }
    }
    doc.delete(paragraph);
}
