//! Parameter tree nodes.

use crate::image::Image;
use crate::key;

/// Shape of a parameter, decided once when the tree is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// Text value; numbers and booleans are stored in their text form.
    Scalar,
    /// Named fields.
    Object,
    /// Items keyed by their 1-based position.
    List,
    /// Image; the value holds inline markup once the image is resolved.
    Image(Image),
}

/// One node of the parameter tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub(crate) key: String,
    pub(crate) value: String,
    pub(crate) kind: ParamKind,
    pub(crate) children: Vec<Param>,
    pub(crate) absolute_key: String,
    pub(crate) compact_key: String,
    pub(crate) level: usize,
}

impl Param {
    pub(crate) fn new(key: impl Into<String>, kind: ParamKind) -> Self {
        let key = key.into().trim_end().to_owned();
        Self {
            absolute_key: key.clone(),
            compact_key: key.clone(),
            key,
            value: String::new(),
            kind,
            children: Vec::new(),
            level: 1,
        }
    }

    pub(crate) fn scalar(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut param = Self::new(key, ParamKind::Scalar);
        param.value = value.into();
        param
    }

    /// Assign absolute and compact keys to all descendants.
    pub(crate) fn assign_keys(&mut self) {
        let is_list = self.is_list();
        for child in &mut self.children {
            child.absolute_key = key::join(&self.absolute_key, &child.key);
            child.compact_key = if is_list {
                self.compact_key.clone()
            } else {
                key::join(&self.compact_key, &child.key)
            };
            child.level = self.level + 1;
            child.assign_keys();
        }
    }

    /// Own key segment; list items use their 1-based position.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Text value. Empty for objects and lists.
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    pub fn children(&self) -> &[Param] {
        &self.children
    }

    /// Direct child by key segment.
    pub fn child(&self, key: &str) -> Option<&Param> {
        self.children.iter().find(|child| child.key == key)
    }

    /// Key path with list positions, e.g. `Users.1.Name`.
    pub fn absolute_key(&self) -> &str {
        &self.absolute_key
    }

    /// Key path without list positions, e.g. `Users.Name`.
    pub fn compact_key(&self) -> &str {
        &self.compact_key
    }

    /// Depth in the tree, 1 for top-level parameters.
    pub fn level(&self) -> usize {
        self.level
    }

    pub fn is_list(&self) -> bool {
        self.kind == ParamKind::List
    }

    /// Image descriptor, when this is an image parameter.
    pub fn image(&self) -> Option<&Image> {
        match &self.kind {
            ParamKind::Image(image) => Some(image),
            _ => None,
        }
    }

    /// Whether the value holds markup rather than text.
    pub fn is_resolved_image(&self) -> bool {
        matches!(self.kind, ParamKind::Image(_)) && !self.value.is_empty()
    }

    /// Store the inline markup of a resolved image.
    pub fn resolve_image(&mut self, markup: impl Into<String>) {
        self.value = markup.into();
    }

    /// Turn an image that could not be resolved into an empty text value.
    pub fn drop_image(&mut self) {
        self.kind = ParamKind::Scalar;
        self.value.clear();
    }

    /// Number of list items, 0 for other kinds.
    pub fn item_count(&self) -> usize {
        if self.is_list() {
            self.children.len()
        } else {
            0
        }
    }

    pub(crate) fn walk<F: FnMut(&Param)>(&self, visit: &mut F) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    pub(crate) fn walk_mut<F: FnMut(&mut Param)>(&mut self, visit: &mut F) {
        visit(self);
        for child in &mut self.children {
            child.walk_mut(visit);
        }
    }
}
