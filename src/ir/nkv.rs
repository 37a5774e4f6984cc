//! Nested key/value store, the canonical in-memory form of a translation fragment.

use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Errors raised by structural operations on a [`NestedKeyValue`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NkvError {
    /// A path needs at least one segment.
    #[error("Key path cannot be empty")]
    EmptyPath,

    /// A prefix of the requested path already holds a leaf value.
    #[error("Cannot set '{path}': '{leaf}' already holds a value")]
    LeafConflict {
        /// Requested path, dot-joined.
        path: String,
        /// The prefix holding a leaf.
        leaf: String,
    },

    /// The requested path itself names a subtree.
    #[error("Cannot set '{path}': it already contains nested keys")]
    SubtreeConflict {
        /// Requested path, dot-joined.
        path: String,
    },

    /// A document root other than a mapping.
    #[error("Top level of a fragment must be a mapping, found {found}")]
    NotAMapping {
        /// Kind of value found instead.
        found: &'static str,
    },
}

/// A node of the tree: either a translated string or a nested mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Translated text.
    Leaf(String),
    /// Named children; never empty once built from a document.
    Branch(BTreeMap<String, Node>),
}

/// Tree keyed by path segments.
///
/// Every path either resolves to a leaf or does not exist. Intermediate
/// mappings are not addressable as keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedKeyValue {
    /// Top-level segments.
    root: BTreeMap<String, Node>,
}

impl NestedKeyValue {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the leaf at `path`, creating intermediate mappings as needed.
    ///
    /// Overwrites an existing leaf at the same path. Fails when a prefix of
    /// `path` is already a leaf, or when `path` itself is a mapping.
    pub fn set<S: AsRef<str>>(
        &mut self,
        path: &[S],
        value: impl Into<String>,
    ) -> Result<(), NkvError> {
        let Some((last, parents)) = path.split_last() else {
            return Err(NkvError::EmptyPath);
        };

        let mut current = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let node = current
                .entry(segment.as_ref().to_string())
                .or_insert_with(|| Node::Branch(BTreeMap::new()));
            current = match node {
                Node::Branch(children) => children,
                Node::Leaf(_) => {
                    return Err(NkvError::LeafConflict {
                        path: join_path(path),
                        leaf: join_path(path.get(..=depth).unwrap_or_default()),
                    });
                }
            };
        }

        match current.get_mut(last.as_ref()) {
            Some(Node::Branch(_)) => Err(NkvError::SubtreeConflict { path: join_path(path) }),
            Some(Node::Leaf(existing)) => {
                *existing = value.into();
                Ok(())
            }
            None => {
                current.insert(last.as_ref().to_string(), Node::Leaf(value.into()));
                Ok(())
            }
        }
    }

    /// Returns the leaf value at `path`, or `None` if the path does not
    /// resolve to a leaf.
    #[must_use]
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&str> {
        let (last, parents) = path.split_last()?;
        let mut current = &self.root;
        for segment in parents {
            match current.get(segment.as_ref())? {
                Node::Branch(children) => current = children,
                Node::Leaf(_) => return None,
            }
        }
        match current.get(last.as_ref())? {
            Node::Leaf(value) => Some(value),
            Node::Branch(_) => None,
        }
    }

    /// Returns every full leaf path.
    ///
    /// Callers must not rely on the order.
    #[must_use]
    pub fn keys(&self) -> Vec<Vec<String>> {
        let mut keys = Vec::new();
        let mut prefix = Vec::new();
        collect_keys(&self.root, &mut prefix, &mut keys);
        keys
    }

    /// Number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        /// Leaves below `map`.
        fn count(map: &BTreeMap<String, Node>) -> usize {
            map.values()
                .map(|node| match node {
                    Node::Leaf(_) => 1,
                    Node::Branch(children) => count(children),
                })
                .sum()
        }
        count(&self.root)
    }

    /// Whether the tree has no leaves.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies every leaf of `other` into `self`.
    ///
    /// Leaves already present are overwritten, and the paths whose value
    /// changed that way are returned. Structural conflicts abort the merge
    /// with the first offending path.
    pub fn merge(&mut self, other: &Self) -> Result<Vec<Vec<String>>, NkvError> {
        let mut overridden = Vec::new();
        for path in other.keys() {
            let Some(value) = other.get(&path) else {
                continue;
            };
            if self.get(&path).is_some_and(|previous| previous != value) {
                overridden.push(path.clone());
            }
            self.set(&path, value)?;
        }
        Ok(overridden)
    }

    /// Returns a copy with every path prefixed by `segment`.
    #[must_use]
    pub fn nested_under(&self, segment: &str) -> Self {
        let mut root = BTreeMap::new();
        if !self.root.is_empty() {
            root.insert(segment.to_string(), Node::Branch(self.root.clone()));
        }
        Self { root }
    }

    /// Builds a tree from a parsed document.
    ///
    /// The document root must be a mapping. Sequence elements become segments
    /// named by their index and non-string scalars keep their textual form.
    pub fn from_value(value: &Value) -> Result<Self, NkvError> {
        let Value::Object(map) = value else {
            return Err(NkvError::NotAMapping { found: value_kind(value) });
        };
        let mut root = BTreeMap::new();
        for (key, child) in map {
            if let Some(node) = node_from_value(child) {
                root.insert(key.clone(), node);
            }
        }
        Ok(Self { root })
    }
}

/// Appends every leaf path below `map` to `out`.
fn collect_keys(map: &BTreeMap<String, Node>, prefix: &mut Vec<String>, out: &mut Vec<Vec<String>>) {
    for (segment, node) in map {
        prefix.push(segment.clone());
        match node {
            Node::Leaf(_) => out.push(prefix.clone()),
            Node::Branch(children) => collect_keys(children, prefix, out),
        }
        prefix.pop();
    }
}

/// Empty mappings and sequences carry no leaves and are dropped.
fn node_from_value(value: &Value) -> Option<Node> {
    match value {
        Value::Object(map) => {
            let children: BTreeMap<_, _> = map
                .iter()
                .filter_map(|(key, child)| node_from_value(child).map(|node| (key.clone(), node)))
                .collect();
            (!children.is_empty()).then_some(Node::Branch(children))
        }
        Value::Array(items) => {
            let children: BTreeMap<_, _> = items
                .iter()
                .enumerate()
                .filter_map(|(index, child)| {
                    node_from_value(child).map(|node| (index.to_string(), node))
                })
                .collect();
            (!children.is_empty()).then_some(Node::Branch(children))
        }
        Value::String(text) => Some(Node::Leaf(text.clone())),
        other => Some(Node::Leaf(other.to_string())),
    }
}

/// Describes a JSON value kind for error messages.
const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

/// Dot-joined path for error messages.
fn join_path<S: AsRef<str>>(path: &[S]) -> String {
    path.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".")
}
