//! Segment trie that maps `(method, path)` to a route record.
//!
//! Every node has any number of static children, at most one dynamic child
//! (a `:name` segment) and one record per method. Resolution prefers the static
//! child at each level and never backtracks: once a static child matched, its
//! dynamic sibling is not tried for the rest of the path.

use std::collections::HashMap;

use http::Method;

use crate::router::RouteError;
use crate::PathParams;

const PARAM_PREFIX: char = ':';

/// The non-empty segments of `path`.
///
/// Leading and trailing slashes and runs of slashes are ignored, so `/a/b/`,
/// `a/b` and `//a//b` have the same segments and `/` has none.
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|segment| !segment.is_empty())
}

/// `path` in canonical `/a/b` form.
pub(crate) fn normalize(path: &str) -> String {
    let mut normalized = String::with_capacity(path.len() + 1);
    for segment in segments(path) {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

#[derive(Debug)]
pub(crate) struct TrieNode<T> {
    static_children: HashMap<String, TrieNode<T>>,
    dynamic_child: Option<(String, Box<TrieNode<T>>)>,
    records: HashMap<Method, T>,
}

impl<T> Default for TrieNode<T> {
    fn default() -> Self {
        Self { static_children: HashMap::new(), dynamic_child: None, records: HashMap::new() }
    }
}

impl<T: Clone> TrieNode<T> {
    /// Stores `record` for every method in `methods` at the node for `path`.
    ///
    /// Nothing is stored if any of the methods is already taken.
    pub(crate) fn insert(&mut self, path: &str, methods: &[Method], record: T) -> Result<(), RouteError> {
        let mut node = self;
        for segment in segments(path) {
            node = match segment.strip_prefix(PARAM_PREFIX) {
                Some("") => return Err(RouteError::EmptyParamName { path: normalize(path) }),
                Some(name) => node.dynamic_child_mut(name, path)?,
                None => node.static_children.entry(segment.to_owned()).or_default(),
            };
        }

        if let Some(method) = methods.iter().find(|method| node.records.contains_key(*method)) {
            return Err(RouteError::DuplicateRoute { method: method.clone(), path: normalize(path) });
        }

        for method in methods {
            node.records.insert(method.clone(), record.clone());
        }
        Ok(())
    }
}

impl<T> TrieNode<T> {
    fn dynamic_child_mut(&mut self, name: &str, path: &str) -> Result<&mut TrieNode<T>, RouteError> {
        let (existing, child) = self.dynamic_child.get_or_insert_with(|| (name.to_owned(), Box::default()));
        if existing.as_str() != name {
            return Err(RouteError::ConflictingParam {
                path: normalize(path),
                existing: existing.clone(),
                requested: name.to_owned(),
            });
        }
        Ok(&mut **child)
    }

    /// Finds the record for `method` at `path`, binding every dynamic segment.
    ///
    /// `None` when a segment matches neither a static nor a dynamic child, or
    /// when the final node has no record for `method`.
    pub(crate) fn resolve(&self, method: &Method, path: &str) -> Option<(&T, PathParams)> {
        let mut node = self;
        let mut params = PathParams::empty();

        for segment in segments(path) {
            node = match node.static_children.get(segment) {
                Some(child) => child,
                None => {
                    let (name, child) = node.dynamic_child.as_ref()?;
                    params.push(name.as_str(), segment);
                    &**child
                }
            };
        }

        node.records.get(method).map(|record| (record, params))
    }

    /// Number of stored `(method, path)` records.
    pub(crate) fn len(&self) -> usize {
        self.records.len()
            + self.static_children.values().map(TrieNode::len).sum::<usize>()
            + self.dynamic_child.as_ref().map_or(0, |(_, child)| child.len())
    }
}
