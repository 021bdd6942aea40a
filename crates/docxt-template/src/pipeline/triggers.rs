//! Trigger engine.
//!
//! A trigger resolves its scope from the placeholder position, picks the
//! target nodes and applies its command, but only when its condition matches
//! the value the placeholder received.

use docxt_params::{Params, Placeholder, Trigger, TriggerCommand, TriggerScope};
use docxt_xml::wordml::{PARAGRAPH, TABLE, TABLE_CELL, TABLE_ROW, TEXT};
use docxt_xml::{Document, NodeId};

use super::markup::list_id;

/// Apply `trigger` for a placeholder at `origin` when it fires for `value`.
///
/// Returns whether anything was changed.
pub(crate) fn evaluate(doc: &mut Document, origin: NodeId, trigger: Trigger, value: &str) -> bool {
    if !trigger.fires(value) || !doc.is_live(origin) {
        return false;
    }
    let targets = targets(doc, origin, trigger.scope);
    if targets.is_empty() {
        tracing::debug!(trigger = %trigger, "Trigger scope not found");
        return false;
    }
    for &target in &targets {
        match trigger.command {
            TriggerCommand::Remove => doc.delete(target),
            TriggerCommand::Clear => doc.clear_text_deep(target),
        }
    }
    tracing::debug!(trigger = %trigger, targets = targets.len(), "Trigger fired");
    true
}

/// Nodes a trigger scope covers, seen from `origin`.
fn targets(doc: &Document, origin: NodeId, scope: TriggerScope) -> Vec<NodeId> {
    let nearest = |tags: &[&str]| doc.closest_ancestor_of_type(origin, tags);
    match scope {
        TriggerScope::Placeholder => vec![nearest(&[TEXT]).unwrap_or(origin)],
        TriggerScope::Cell => nearest(&[TABLE_CELL]).into_iter().collect(),
        TriggerScope::Row => nearest(&[TABLE_ROW])
            .or_else(|| nearest(&[PARAGRAPH]))
            .into_iter()
            .collect(),
        TriggerScope::List => nearest(&[PARAGRAPH])
            .filter(|&paragraph| list_id(doc, paragraph).is_some())
            .map(|paragraph| list_members(doc, paragraph))
            .unwrap_or_default(),
        TriggerScope::Table => nearest(&[TABLE]).into_iter().collect(),
        TriggerScope::Section => match nearest(&[TABLE]) {
            Some(table) => vec![table],
            None => nearest(&[PARAGRAPH])
                .map(|paragraph| list_members(doc, paragraph))
                .unwrap_or_default(),
        },
    }
}

/// Sibling paragraphs sharing the list identity of `paragraph`.
///
/// An ordinary paragraph stands for itself.
fn list_members(doc: &Document, paragraph: NodeId) -> Vec<NodeId> {
    let Some(id) = list_id(doc, paragraph) else {
        return vec![paragraph];
    };
    let Some(parent) = doc.parent(paragraph) else {
        return vec![paragraph];
    };
    doc.children(parent)
        .iter()
        .copied()
        .filter(|&sibling| {
            doc.tag(sibling) == PARAGRAPH && list_id(doc, sibling).as_deref() == Some(id.as_str())
        })
        .collect()
}

/// Evaluate triggers of placeholders whose parameter is absent.
///
/// Such placeholders keep their text; only the trigger runs, with the empty
/// string as value.
pub(crate) fn sweep_unset(doc: &mut Document, params: &Params) -> usize {
    let root = doc.root();
    let mut pending: Vec<(NodeId, Trigger)> = Vec::new();
    for text in doc.find_all(root, &[TEXT]) {
        for token in Placeholder::scan(doc.text(text)) {
            if let Some(trigger) = token.trigger()
                && params.resolve(token.key()).is_empty()
            {
                pending.push((text, trigger));
            }
        }
    }

    pending
        .into_iter()
        .filter(|&(text, trigger)| evaluate(doc, text, trigger, ""))
        .count()
}
