//! Parameter tree construction and lookup.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ParamsError;
use crate::image::Image;
use crate::key::{self, KEY_SEPARATOR};
use crate::param::{Param, ParamKind};

/// Parameter matched by [`Params::find_all_by_key`] with its running position.
#[derive(Debug, Clone, Copy)]
pub struct Indexed<'a> {
    /// 1-based position across all list branches.
    pub index: usize,
    pub param: &'a Param,
}

/// List found by [`Params::pending_list`] with the key path below it.
#[derive(Debug, Clone)]
pub struct PendingList<'a> {
    pub list: &'a Param,
    /// Segments after the list, possibly empty.
    pub rest: String,
}

impl PendingList<'_> {
    /// Key path with the missing position filled in by `item`.
    pub fn indexed(&self, item: &str) -> String {
        let key = key::join(self.list.absolute_key(), item);
        if self.rest.is_empty() {
            key
        } else {
            key::join(&key, &self.rest)
        }
    }
}

/// Hierarchical parameter values bound to a template.
///
/// Objects become [`ParamKind::Object`], arrays become [`ParamKind::List`]
/// with items keyed `1..=N` by their position, `{"$image": ...}` maps become
/// [`ParamKind::Image`] and everything else is a text [`ParamKind::Scalar`].
/// `null` values are skipped, so list keys keep the original position of each
/// remaining item. Empty strings are kept.
///
/// Absolute and compact keys are assigned once during construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    params: Vec<Param>,
}

impl Params {
    /// Parse parameters from JSON bytes holding an object.
    pub fn from_json(json: &[u8]) -> Result<Self, ParamsError> {
        let value: Value = serde_json::from_slice(json)?;
        Self::from_value(value)
    }

    /// Parse parameters from JSON, falling back to an empty tree.
    pub fn from_json_lossy(json: &[u8]) -> Self {
        Self::from_json(json).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Ignoring malformed parameters");
            Self::default()
        })
    }

    /// Build parameters from any serializable value, typically a struct.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, ParamsError> {
        Self::from_value(serde_json::to_value(value)?)
    }

    /// Build parameters from a JSON object.
    pub fn from_value(value: Value) -> Result<Self, ParamsError> {
        match value {
            Value::Object(map) => Ok(Self::from_object(map)),
            Value::Null => Err(ParamsError::NotAnObject("null")),
            Value::Bool(_) => Err(ParamsError::NotAnObject("boolean")),
            Value::Number(_) => Err(ParamsError::NotAnObject("number")),
            Value::String(_) => Err(ParamsError::NotAnObject("string")),
            Value::Array(_) => Err(ParamsError::NotAnObject("array")),
        }
    }

    /// Build parameters from a flat map of top-level values.
    pub fn from_map(map: HashMap<String, Value>) -> Self {
        Self::from_object(map.into_iter().collect())
    }

    fn from_object(map: Map<String, Value>) -> Self {
        let mut params: Vec<Param> = map
            .into_iter()
            .filter_map(|(key, value)| build(key, value))
            .collect();
        for param in &mut params {
            param.assign_keys();
        }
        Self { params }
    }

    /// Top-level parameters.
    pub fn iter(&self) -> std::slice::Iter<'_, Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Visit every parameter depth-first, parents before children.
    pub fn walk<F: FnMut(&Param)>(&self, mut visit: F) {
        for param in &self.params {
            param.walk(&mut visit);
        }
    }

    /// Visit every parameter mutably. Keys cannot be changed.
    pub fn walk_mut<F: FnMut(&mut Param)>(&mut self, mut visit: F) {
        for param in &mut self.params {
            param.walk_mut(&mut visit);
        }
    }

    /// Parameter by absolute key (`Users.1.Name`).
    pub fn get(&self, absolute_key: &str) -> Option<&Param> {
        let mut level = self.params.as_slice();
        loop {
            let param = level
                .iter()
                .find(|param| key::has_prefix(absolute_key, &param.absolute_key))?;
            if param.absolute_key == absolute_key {
                return Some(param);
            }
            level = &param.children;
        }
    }

    /// Parameters addressed by a key path mixing compact and absolute forms.
    ///
    /// At a list, a following segment naming an item selects that item;
    /// otherwise the path continues in every item. `Users.Name` yields the
    /// name of every user, `Users.2.Name` only the second one.
    pub fn resolve(&self, key: &str) -> Vec<&Param> {
        self.matches(key).into_iter().map(|(_, param)| param).collect()
    }

    /// Outermost list on the path of `key` whose item position is missing.
    ///
    /// `Users.Friends.Name` yields `Users`, `Users.1.Friends.Name` yields the
    /// friends of the first user. Returns `None` when every list on the path
    /// is indexed or when the path addresses nothing. An empty list is always
    /// pending, since there is nothing below it to address.
    pub fn pending_list(&self, key: &str) -> Option<PendingList<'_>> {
        let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        let (first, mut rest) = segments.split_first()?;
        let mut current = self.params.iter().find(|param| param.key == *first)?;
        loop {
            if current.is_list() {
                let item = rest.first().and_then(|segment| current.child(segment));
                let Some(item) = item else {
                    let pending = current.children.is_empty() || !self.resolve(key).is_empty();
                    return pending.then(|| PendingList {
                        list: current,
                        rest: rest.join("."),
                    });
                };
                rest = &rest[1..];
                current = item;
                continue;
            }
            let (segment, tail) = rest.split_first()?;
            current = current.child(segment)?;
            rest = tail;
        }
    }

    /// Every parameter matching `key` with a running 1-based position.
    ///
    /// Positions continue across list branches: with two users holding two
    /// and one friends, `Users.Friends.Name` yields positions 1, 2 and 3.
    pub fn find_all_by_key(&self, key: &str) -> Vec<Indexed<'_>> {
        let mut out = Vec::new();
        let mut offset = 0;
        let mut previous: Option<(Vec<&str>, usize)> = None;

        for (route, param) in self.matches(key) {
            let (outer, last) = match route.split_last() {
                Some((last, outer)) => (outer.to_vec(), last.parse::<usize>().unwrap_or(1)),
                None => (Vec::new(), 1),
            };
            if let Some((previous_outer, previous_last)) = &previous
                && *previous_outer != outer
            {
                offset += previous_last;
            }
            out.push(Indexed {
                index: last + offset,
                param,
            });
            previous = Some((outer, last));
        }
        out
    }

    /// Matches of `key` with the list item keys passed on the way.
    fn matches(&self, key: &str) -> Vec<(Vec<&str>, &Param)> {
        let segments: Vec<&str> = key.split(KEY_SEPARATOR).collect();
        let Some((first, rest)) = segments.split_first() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let Some(param) = self.params.iter().find(|param| param.key == *first) {
            collect(param, rest, &mut Vec::new(), &mut out);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Params {
    type Item = &'a Param;
    type IntoIter = std::slice::Iter<'a, Param>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn collect<'a>(
    param: &'a Param,
    rest: &[&str],
    route: &mut Vec<&'a str>,
    out: &mut Vec<(Vec<&'a str>, &'a Param)>,
) {
    let Some((next, tail)) = rest.split_first() else {
        out.push((route.clone(), param));
        return;
    };

    if param.is_list() {
        if let Some(item) = param.child(next) {
            route.push(&item.key);
            collect(item, tail, route, out);
            route.pop();
            return;
        }
        for item in &param.children {
            route.push(&item.key);
            collect(item, rest, route, out);
            route.pop();
        }
        return;
    }

    if let Some(child) = param.child(next) {
        collect(child, tail, route, out);
    }
}

/// Build a parameter node; `null` yields nothing.
fn build(key: String, value: Value) -> Option<Param> {
    let param = match value {
        Value::Null => return None,
        Value::String(text) => Param::scalar(key, text),
        Value::Bool(flag) => Param::scalar(key, flag.to_string()),
        Value::Number(number) => Param::scalar(key, number.to_string()),
        Value::Array(items) => {
            let mut list = Param::new(key, ParamKind::List);
            list.children = items
                .into_iter()
                .enumerate()
                .filter_map(|(i, item)| build((i + 1).to_string(), item))
                .collect();
            list
        }
        Value::Object(map) => {
            if let Some(image) = Image::from_tagged(&map) {
                Param::new(key, ParamKind::Image(image))
            } else {
                let mut object = Param::new(key, ParamKind::Object);
                object.children = map
                    .into_iter()
                    .filter_map(|(key, value)| build(key, value))
                    .collect();
                object
            }
        }
    };
    Some(param)
}
