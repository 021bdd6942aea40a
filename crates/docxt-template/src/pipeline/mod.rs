//! Expansion pipeline run over one document part.
//!
//! The passes run in a fixed order, each over the whole tree:
//!
//! 1. **Markup** ([`markup::mark_lists`]): tag list paragraphs with their
//!    numbering id
//! 2. **Run repair** ([`markup::repair_runs`]): join placeholders split across
//!    runs
//! 3. **Singles** ([`replace::replace_singles`]): scalar, key and image
//!    placeholders that need no cloning
//! 4. **Expansion** ([`expand::expand`]): clone rows once per list item and
//!    index their placeholders, nested lists included
//! 5. **Leftover rows** ([`expand::expand_leftovers`]): list placeholders the
//!    expansion did not own
//! 6. **Inline lists** ([`replace::replace_inline`]): `{{Key sep}}` joined in
//!    place
//! 7. **Singles again**: everything uncovered by cloning, images split into
//!    their own nodes
//! 8. **Trigger sweep** ([`triggers::sweep_unset`]): triggers of placeholders
//!    whose parameter was never supplied
//! 9. **Line breaks** ([`content::split_lines`]): one paragraph per line of a
//!    multi-line value
//!
//! The synthetic list markup is stripped at the end.

pub(crate) mod content;
pub(crate) mod expand;
pub(crate) mod markup;
pub(crate) mod replace;
pub(crate) mod triggers;

use docxt_params::Params;
use docxt_xml::wordml::{PARAGRAPH, RUN, RUN_PROPERTIES, TABLE_ROW, TEXT};
use docxt_xml::{Document, NodeId};

/// Run every pass over `doc`.
pub(crate) fn run(doc: &mut Document, params: &Params) {
    markup::mark_lists(doc);
    markup::repair_runs(doc);

    let singles = replace::replace_singles(doc, params);
    let rows = expand::expand(doc, params);
    let leftovers = expand::expand_leftovers(doc, params);
    let inline = replace::replace_inline(doc, params);
    let late_singles = replace::replace_singles(doc, params);
    let swept = triggers::sweep_unset(doc, params);
    let lines = content::split_lines(doc);

    markup::strip_marks(doc);
    tracing::debug!(
        singles = singles + late_singles,
        rows = rows + leftovers,
        inline,
        swept,
        lines,
        "Expanded document"
    );
}

/// Row that repeats for the placeholder in `node`: the enclosing table row,
/// else the enclosing paragraph.
pub(crate) fn owning_row(doc: &Document, node: NodeId) -> Option<NodeId> {
    doc.closest_ancestor_of_type(node, &[TABLE_ROW])
        .or_else(|| doc.closest_ancestor_of_type(node, &[PARAGRAPH]))
}

/// Text nodes whose nearest paragraph is `paragraph`, in document order.
pub(crate) fn own_texts(doc: &Document, paragraph: NodeId) -> Vec<NodeId> {
    doc.find_all(paragraph, &[TEXT])
        .into_iter()
        .filter(|&text| doc.closest_ancestor_of_type(text, &[PARAGRAPH]) == Some(paragraph))
        .collect()
}

/// Delete a text node, and its run when only properties remain.
pub(crate) fn delete_text(doc: &mut Document, text: NodeId) {
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_owning_row_prefers_table_row() {
        let doc = Document::parse(
            "<w:tbl><w:tr><w:tc><w:p><w:r><w:t>x</w:t></w:r></w:p></w:tc></w:tr></w:tbl>",
        )
        .unwrap();
        let text = doc.find_first(doc.root(), &[TEXT]).unwrap();
        let row = owning_row(&doc, text).unwrap();
        assert_eq!(doc.tag(row), TABLE_ROW);
    }

    #[test]
    fn test_own_texts_skip_nested_paragraphs() {
        let doc = Document::parse(
            "<w:p><w:r><w:t>a</w:t></w:r><w:r><w:txbx><w:p><w:r><w:t>b</w:t></w:r></w:p></w:txbx></w:r><w:r><w:t>c</w:t></w:r></w:p>",
        )
        .unwrap();
        let texts: Vec<&str> = own_texts(&doc, doc.root())
            .into_iter()
            .map(|id| doc.text(id))
            .collect();
        assert_eq!(texts, vec!["a", "c"]);
    }

    #[test]
    fn test_delete_text_drops_empty_run() {
        let mut doc = Document::parse(
            "<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>a</w:t></w:r><w:r><w:t>b</w:t><w:tab/></w:r></w:p>",
        )
        .unwrap();
        let texts = doc.find_all(doc.root(), &[TEXT]);
        delete_text(&mut doc, texts[0]);
        delete_text(&mut doc, texts[1]);
        assert_eq!(doc.to_xml(), "<w:p><w:r><w:tab /></w:r></w:p>");
    }
}
