//! Node storage for the arena document.

/// Stable handle of a node inside a [`Document`](crate::Document).
///
/// Handles stay valid for the lifetime of the document. A deleted node keeps
/// its slot, so a stale handle never points at a different node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the slot in the arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Element attribute as it appears in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Qualified attribute name (e.g. `w:val`, `xmlns:w`).
    pub key: String,
    /// Unescaped attribute value.
    pub value: String,
}

impl Attribute {
    /// Create a new attribute.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// One element of the document.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) tag: String,
    pub(crate) attrs: Vec<Attribute>,
    pub(crate) text: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) is_new: bool,
    pub(crate) live: bool,
}

impl Node {
    pub(crate) fn element(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            is_new: false,
            live: true,
        }
    }

    /// Qualified tag name (e.g. `w:p`).
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Namespace prefix of the tag, if any.
    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.tag.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Local part of the tag name.
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.tag
            .split_once(':')
            .map_or(self.tag.as_str(), |(_, local)| local)
    }

    /// Attributes in document order.
    #[must_use]
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }

    /// Direct character data of the element.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the node was produced by cloning.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Whether the node is still part of the tree.
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_and_local_name() {
        let node = Node::element("w:tbl");
        assert_eq!(node.prefix(), Some("w"));
        assert_eq!(node.local_name(), "tbl");
    }

    #[test]
    fn test_unprefixed_tag() {
        let node = Node::element("Relationship");
        assert_eq!(node.prefix(), None);
        assert_eq!(node.local_name(), "Relationship");
    }
}
