//! Row expansion for list parameters.
//!
//! A row (table row, else paragraph) whose placeholders address a list
//! without an item position is cloned once per item. Each clone gets the
//! placeholders rewritten to the absolute key of its item, so
//! `{{Users.Friends.Name}}` becomes `{{Users.1.Friends.Name}}` in the first
//! clone. The clones are then expanded again, which takes care of nested
//! lists one level at a time.

use std::collections::HashSet;

use docxt_params::{Param, Params, Placeholder};
use docxt_xml::wordml::{ROW_TYPES, TEXT};
use docxt_xml::{Document, NodeId, Walk};

use super::owning_row;

/// Which text nodes of a row decide whether it repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
    /// Text whose own row is the candidate.
    Own,
    /// Any text below the candidate.
    Subtree,
}

/// Expand every row of the document. Returns the number of rows expanded.
pub(crate) fn expand(doc: &mut Document, params: &Params) -> usize {
    let root = doc.root();
    let mut expanded = 0;
    expand_within(doc, root, params, &mut expanded);
    expanded
}

/// Expand rows below `scope`, descending into rows that do not repeat.
fn expand_within(doc: &mut Document, scope: NodeId, params: &Params, expanded: &mut usize) {
    let mut clones = Vec::new();
    doc.walk(scope, |doc, node| {
        if !doc.is(node, ROW_TYPES) {
            return Walk::Continue;
        }
        match expand_row(doc, node, params, Ownership::Own) {
            Some(new_rows) => {
                *expanded += 1;
                clones.extend(new_rows);
                Walk::Skip
            }
            None => Walk::Continue,
        }
    });
    for clone in clones {
        expand_clone(doc, clone, params, expanded);
    }
}

/// A fresh clone may repeat again for a deeper list, or hold rows that do.
fn expand_clone(doc: &mut Document, row: NodeId, params: &Params, expanded: &mut usize) {
    match expand_row(doc, row, params, Ownership::Own) {
        Some(clones) => {
            *expanded += 1;
            for clone in clones {
                expand_clone(doc, clone, params, expanded);
            }
        }
        None => expand_within(doc, row, params, expanded),
    }
}

/// Expand list placeholders that the row walk did not own.
///
/// Each leftover is expanded with its nearest row of any kind, taking every
/// text of that row into account. Returns the number of rows expanded.
pub(crate) fn expand_leftovers(doc: &mut Document, params: &Params) -> usize {
    let root = doc.root();
    let mut expanded = 0;
    let mut skipped = HashSet::new();
    loop {
        let leftover = doc.find_all(root, &[TEXT]).into_iter().find(|&text| {
            !skipped.contains(&text)
                && Placeholder::scan(doc.text(text))
                    .iter()
                    .any(|token| !token.is_inline() && params.pending_list(token.key()).is_some())
        });
        let Some(text) = leftover else {
            break;
        };
        let clones = doc
            .closest_ancestor_of_type(text, ROW_TYPES)
            .and_then(|row| expand_row(doc, row, params, Ownership::Subtree));
        let Some(clones) = clones else {
            tracing::warn!(text = %doc.text(text), "List placeholder outside of any row");
            skipped.insert(text);
            continue;
        };
        expanded += 1;
        for clone in clones {
            expand_clone(doc, clone, params, &mut expanded);
        }
    }
    expanded
}

/// Clone `row` once per item of the lists its placeholders are pending on.
///
/// Returns the clones in order, or `None` when the row does not repeat. A
/// row bound to an empty list is deleted and yields no clones. With several
/// lists the longest decides the count; shorter lists get positions past
/// their end, which stay unresolved.
fn expand_row(
    doc: &mut Document,
    row: NodeId,
    params: &Params,
    ownership: Ownership,
) -> Option<Vec<NodeId>> {
    let lists = pending_lists(doc, row, params, ownership);
    if lists.is_empty() {
        return None;
    }
    let count = lists.iter().map(|list| list.item_count()).max().unwrap_or(0);

    let mut clones = Vec::with_capacity(count);
    let mut anchor = row;
    for position in 0..count {
        let clone = doc.clone_subtree(row);
        doc.insert_after(anchor, clone);
        anchor = clone;
        index_markers(doc, clone, params, &lists, position);
        clones.push(clone);
    }
    doc.delete(row);

    tracing::debug!(
        list = %lists[0].absolute_key(),
        lists = lists.len(),
        items = count,
        "Expanded row"
    );
    Some(clones)
}

/// Distinct lists the row placeholders are pending on, in order of use.
fn pending_lists<'a>(
    doc: &Document,
    row: NodeId,
    params: &'a Params,
    ownership: Ownership,
) -> Vec<&'a Param> {
    let mut lists: Vec<&Param> = Vec::new();
    let texts = doc
        .find_all(row, &[TEXT])
        .into_iter()
        .filter(|&text| ownership == Ownership::Subtree || owning_row(doc, text) == Some(row));
    for text in texts {
        for token in Placeholder::scan(doc.text(text)) {
            if token.is_inline() {
                continue;
            }
            let Some(pending) = params.pending_list(token.key()) else {
                continue;
            };
            if !lists
                .iter()
                .any(|list| list.absolute_key() == pending.list.absolute_key())
            {
                lists.push(pending.list);
            }
        }
    }
    lists
}

/// Give every placeholder below `clone` that waits on one of `lists` the
/// item at `position`.
fn index_markers(
    doc: &mut Document,
    clone: NodeId,
    params: &Params,
    lists: &[&Param],
    position: usize,
) {
    let mut nodes = vec![clone];
    nodes.extend(doc.descendants(clone));
    for node in nodes {
        if doc.tag(node) == TEXT
            && let Some(text) = indexed(doc.text(node), params, lists, position)
        {
            doc.set_text(node, text);
        }
        let updates: Vec<(usize, String)> = doc
            .attrs(node)
            .iter()
            .enumerate()
            .filter_map(|(index, attr)| {
                indexed(&attr.value, params, lists, position).map(|value| (index, value))
            })
            .collect();
        let attrs = doc.attrs_mut(node);
        for (index, value) in updates {
            attrs[index].value = value;
        }
    }
}

/// `text` with the markers of `lists` pointed at the item at `position`.
fn indexed(text: &str, params: &Params, lists: &[&Param], position: usize) -> Option<String> {
    let mut out = String::new();
    let mut last = 0;
    for token in Placeholder::scan(text) {
        let Some(pending) = params.pending_list(token.key()) else {
            continue;
        };
        let Some(list) = lists
            .iter()
            .find(|list| list.absolute_key() == pending.list.absolute_key())
        else {
            continue;
        };
        let item = list
            .children()
            .get(position)
            .map_or_else(|| (position + 1).to_string(), |item| item.key().to_owned());
        let span = token.span();
        out.push_str(&text[last..span.start]);
        out.push_str(&token.with_key(&pending.indexed(&item)));
        last = span.end;
    }
    if last == 0 {
        return None;
    }
    out.push_str(&text[last..]);
    Some(out)
}
