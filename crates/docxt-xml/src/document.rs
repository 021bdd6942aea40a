//! Arena document with navigation and mutation primitives.

use crate::error::XmlError;
use crate::node::{Attribute, Node, NodeId};
use crate::{parser, serializer};

/// Tag of the synthetic wrapper used by [`Document::parse_fragment`].
const FRAGMENT_TAG: &str = "docxt:fragment";

/// Visitor decision for [`Document::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    /// Visit the children of the current node.
    Continue,
    /// Do not descend into the current node.
    Skip,
}

/// XML document stored as an arena of nodes.
///
/// Parent and child relations are indices into the arena. Deleting a node
/// tombstones it together with its whole subtree and unlinks it from its
/// parent, so every traversal sees only live nodes while stale handles held
/// by callers stay safe to query.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    declaration: bool,
}

impl Document {
    /// Create a document with a single empty root element.
    #[must_use]
    pub fn new(root_tag: impl Into<String>) -> Self {
        Self {
            nodes: vec![Node::element(root_tag)],
            root: NodeId(0),
            declaration: false,
        }
    }

    /// Parse a complete XML document.
    ///
    /// Malformed markup is logged and the tree built up to the failure point is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`XmlError::NoRootElement`] when no element could be read.
    pub fn parse(xml: &str) -> Result<Self, XmlError> {
        parser::parse_document(xml)
    }

    /// Parse a markup fragment that may hold several top-level elements.
    ///
    /// The elements become children of a synthetic root; graft them into
    /// another document with [`Document::import`].
    ///
    /// # Errors
    ///
    /// Returns an error when the fragment cannot be read at all.
    pub fn parse_fragment(xml: &str) -> Result<Self, XmlError> {
        let mut doc = parser::parse_document(&format!("<{FRAGMENT_TAG}>{xml}</{FRAGMENT_TAG}>"))?;
        doc.declaration = false;
        Ok(doc)
    }

    /// Serialize the live tree back to markup.
    #[must_use]
    pub fn to_xml(&self) -> String {
        serializer::serialize_document(self)
    }

    /// Serialize one live subtree.
    #[must_use]
    pub fn node_to_xml(&self, id: NodeId) -> String {
        serializer::serialize_subtree(self, id)
    }

    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId, declaration: bool) -> Self {
        Self {
            nodes,
            root,
            declaration,
        }
    }

    pub(crate) fn has_declaration(&self) -> bool {
        self.declaration
    }

    /// Root element.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Access a node by handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Number of slots in the arena, including tombstoned ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Qualified tag name of a node.
    #[must_use]
    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    /// Whether the node tag is one of `tags`.
    #[must_use]
    pub fn is(&self, id: NodeId, tags: &[&str]) -> bool {
        tags.contains(&self.tag(id))
    }

    /// Direct character data of a node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> &str {
        &self.nodes[id.0].text
    }

    /// Replace the character data of a node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
        self.nodes[id.0].text = text.into();
    }

    /// Append character data to a node.
    pub fn push_text(&mut self, id: NodeId, text: &str) {
        self.nodes[id.0].text.push_str(text);
    }

    /// Concatenated character data of a node and all its live descendants.
    #[must_use]
    pub fn all_text(&self, id: NodeId) -> String {
        let mut out = self.nodes[id.0].text.clone();
        for child in self.descendants(id) {
            out.push_str(&self.nodes[child.0].text);
        }
        out
    }

    /// Empty the character data of a node and every descendant.
    ///
    /// Structural nodes stay in place.
    pub fn clear_text_deep(&mut self, id: NodeId) {
        self.nodes[id.0].text.clear();
        for child in self.descendants(id) {
            self.nodes[child.0].text.clear();
        }
    }

    /// Attribute value by qualified name.
    #[must_use]
    pub fn attr(&self, id: NodeId, key: &str) -> Option<&str> {
        self.nodes[id.0]
            .attrs
            .iter()
            .find(|attr| attr.key == key)
            .map(|attr| attr.value.as_str())
    }

    /// Attributes of a node in document order.
    #[must_use]
    pub fn attrs(&self, id: NodeId) -> &[Attribute] {
        &self.nodes[id.0].attrs
    }

    /// Mutable attribute list of a node.
    pub fn attrs_mut(&mut self, id: NodeId) -> &mut Vec<Attribute> {
        &mut self.nodes[id.0].attrs
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, id: NodeId, key: &str, value: impl Into<String>) {
        let value = value.into();
        let attrs = &mut self.nodes[id.0].attrs;
        match attrs.iter_mut().find(|attr| attr.key == key) {
            Some(attr) => attr.value = value,
            None => attrs.push(Attribute::new(key, value)),
        }
    }

    /// Remove an attribute and return its value.
    pub fn remove_attr(&mut self, id: NodeId, key: &str) -> Option<String> {
        let attrs = &mut self.nodes[id.0].attrs;
        let pos = attrs.iter().position(|attr| attr.key == key)?;
        Some(attrs.remove(pos).value)
    }

    /// Whether the node is still part of the tree.
    #[must_use]
    pub fn is_live(&self, id: NodeId) -> bool {
        self.nodes[id.0].live
    }

    /// Whether the node was produced by cloning.
    #[must_use]
    pub fn is_new(&self, id: NodeId) -> bool {
        self.nodes[id.0].is_new
    }

    /// Parent of a node, `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Live children in document order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// First live child.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].children.first().copied()
    }

    /// Sibling directly after a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.position(id)?;
        siblings.get(pos + 1).copied()
    }

    /// Sibling directly before a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        let (siblings, pos) = self.position(id)?;
        pos.checked_sub(1).map(|prev| siblings[prev])
    }

    /// Siblings list of a node and its position inside it.
    fn position(&self, id: NodeId) -> Option<(&[NodeId], usize)> {
        let parent = self.nodes[id.0].parent?;
        let siblings = &self.nodes[parent.0].children;
        let pos = siblings.iter().position(|&child| child == id)?;
        Some((siblings, pos))
    }

    /// Live descendants of a node in document order, excluding the node.
    ///
    /// The result is a snapshot: later mutation does not change it, but
    /// callers must re-check [`Document::is_live`] after mutating.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if !self.nodes[current.0].live {
                continue;
            }
            out.push(current);
            stack.extend(self.nodes[current.0].children.iter().rev());
        }
        out
    }

    /// Visit every live descendant of `from` in document order.
    ///
    /// The visitor may mutate the document. Children are collected when their
    /// parent is entered, so siblings inserted after the visited node (for
    /// example fresh clones) are not visited during the same walk, and nodes
    /// deleted before their turn are skipped. Returning [`Walk::Skip`] keeps
    /// the walk out of the visited node's subtree.
    pub fn walk<F>(&mut self, from: NodeId, mut visit: F)
    where
        F: FnMut(&mut Self, NodeId) -> Walk,
    {
        let mut stack: Vec<NodeId> = self.nodes[from.0].children.iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if !self.nodes[current.0].live {
                continue;
            }
            if visit(self, current) == Walk::Skip || !self.nodes[current.0].live {
                continue;
            }
            stack.extend(self.nodes[current.0].children.iter().rev());
        }
    }

    /// All live descendants of `from` whose tag is one of `tags`.
    #[must_use]
    pub fn find_all(&self, from: NodeId, tags: &[&str]) -> Vec<NodeId> {
        self.descendants(from)
            .into_iter()
            .filter(|&id| self.is(id, tags))
            .collect()
    }

    /// First live descendant of `from` whose tag is one of `tags`.
    #[must_use]
    pub fn find_first(&self, from: NodeId, tags: &[&str]) -> Option<NodeId> {
        self.descendants(from)
            .into_iter()
            .find(|&id| self.is(id, tags))
    }

    /// Nearest node, starting with `id` itself and walking up through its
    /// ancestors, whose tag is one of `tags`.
    ///
    /// The nearest matching level wins regardless of the order of `tags`.
    #[must_use]
    pub fn closest_ancestor_of_type(&self, id: NodeId, tags: &[&str]) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if self.is(node, tags) {
                return Some(node);
            }
            current = self.nodes[node.0].parent;
        }
        None
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeId {
        self.push(Node::element(tag))
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Remove a node from its parent's child list without tombstoning it.
    fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&child| child != id);
        }
    }

    /// Append `child` as the last child of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Insert `node` as the sibling directly after `anchor`.
    ///
    /// Returns `false` and leaves `node` detached when `anchor` has no parent.
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> bool {
        self.insert_at_offset(anchor, node, 1)
    }

    /// Insert `node` as the sibling directly before `anchor`.
    ///
    /// Returns `false` and leaves `node` detached when `anchor` has no parent.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> bool {
        self.insert_at_offset(anchor, node, 0)
    }

    fn insert_at_offset(&mut self, anchor: NodeId, node: NodeId, offset: usize) -> bool {
        self.detach(node);
        let Some(parent) = self.nodes[anchor.0].parent else {
            return false;
        };
        let Some(pos) = self.nodes[parent.0]
            .children
            .iter()
            .position(|&child| child == anchor)
        else {
            return false;
        };
        self.nodes[parent.0].children.insert(pos + offset, node);
        self.nodes[node.0].parent = Some(parent);
        true
    }

    /// Deep-copy a live subtree into new detached slots marked as new.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let mut copy = self.nodes[id.0].clone();
        copy.parent = None;
        copy.children = Vec::new();
        copy.is_new = true;
        let new_id = self.push(copy);

        let children = self.nodes[id.0].children.clone();
        for child in children {
            if !self.nodes[child.0].live {
                continue;
            }
            let child_copy = self.clone_subtree(child);
            self.nodes[child_copy.0].parent = Some(new_id);
            self.nodes[new_id.0].children.push(child_copy);
        }
        new_id
    }

    /// Deep-copy a node and insert the copy directly after it.
    ///
    /// The copy shares no storage with the original. When the node has no
    /// parent the copy is still returned but stays detached and never
    /// reaches the output.
    pub fn clone_and_insert_after(&mut self, id: NodeId) -> NodeId {
        let copy = self.clone_subtree(id);
        self.insert_after(id, copy);
        copy
    }

    /// Copy a subtree of another document into this one, detached.
    pub fn import(&mut self, other: &Document, id: NodeId) -> NodeId {
        let mut copy = other.nodes[id.0].clone();
        copy.parent = None;
        copy.children = Vec::new();
        copy.is_new = true;
        let new_id = self.push(copy);

        for &child in &other.nodes[id.0].children {
            if !other.nodes[child.0].live {
                continue;
            }
            let child_copy = self.import(other, child);
            self.nodes[child_copy.0].parent = Some(new_id);
            self.nodes[new_id.0].children.push(child_copy);
        }
        new_id
    }

    /// Tombstone a node and its whole subtree and unlink it from its parent.
    ///
    /// Deleting the root empties the document output. Deleting a node twice
    /// is a no-op.
    pub fn delete(&mut self, id: NodeId) {
        if !self.nodes[id.0].live {
            return;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let node = &mut self.nodes[current.0];
            node.live = false;
            stack.extend(node.children.drain(..));
        }
        self.detach(id);
    }

    /// Child positions leading from `ancestor` down to `id`.
    ///
    /// Returns `None` when `id` is not inside `ancestor`.
    #[must_use]
    pub fn path_from(&self, ancestor: NodeId, id: NodeId) -> Option<Vec<usize>> {
        let mut path = Vec::new();
        let mut current = id;
        while current != ancestor {
            let (_, pos) = self.position(current)?;
            path.push(pos);
            current = self.nodes[current.0].parent?;
        }
        path.reverse();
        Some(path)
    }

    /// Follow child positions from `from`, the inverse of [`Document::path_from`].
    #[must_use]
    pub fn follow_path(&self, from: NodeId, path: &[usize]) -> Option<NodeId> {
        let mut current = from;
        for &pos in path {
            current = *self.nodes[current.0].children.get(pos)?;
        }
        Some(current)
    }

    /// Remove an attribute from a node and all its descendants.
    pub fn remove_attr_deep(&mut self, from: NodeId, key: &str) {
        self.remove_attr(from, key);
        for id in self.descendants(from) {
            self.remove_attr(id, key);
        }
    }
}
