//! Key-path index
//!
//! An eagerly built tree mirroring the dot structure of a catalog's
//! keys. Each leaf holds the full original dotted key, so splitting a
//! leaf value on `.` reproduces the path from the root to that leaf.
//! This replaces dynamic property-trap magic with plain, inspectable,
//! serializable data.

use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

use crate::catalog::Catalog;

/// A node in the key-path tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum KeyPathNode {
    /// Full original dotted key
    Leaf(String),
    /// Nested segments
    Branch(BTreeMap<String, KeyPathNode>),
}

/// Key-path tree for one catalog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct KeyPathIndex {
    root: BTreeMap<String, KeyPathNode>,
}

impl KeyPathIndex {
    /// Builds the index from a flat catalog.
    ///
    /// Keys are processed in sorted order so the result is
    /// deterministic. A key that needs to be both a leaf and an
    /// intermediate node (e.g. `"a.b"` alongside `"a.b.c"`) signals an
    /// ambiguous key set upstream; the last-processed entry at that
    /// path wins and a warning is logged.
    pub fn build(catalog: &Catalog) -> Self {
        let mut keys: Vec<&str> = catalog.keys().collect();
        keys.sort_unstable();

        let mut root = BTreeMap::new();
        for key in keys {
            insert_key(&mut root, key);
        }
        Self { root }
    }

    /// Walks the tree along `path` segments, returning the full dotted
    /// key stored at the leaf.
    pub fn get(&self, path: &[&str]) -> Option<&str> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(*first)?;
        for segment in rest {
            match node {
                KeyPathNode::Branch(children) => node = children.get(*segment)?,
                KeyPathNode::Leaf(_) => return None,
            }
        }
        match node {
            KeyPathNode::Leaf(key) => Some(key),
            KeyPathNode::Branch(_) => None,
        }
    }

    /// Top-level segments of the tree
    pub fn root(&self) -> &BTreeMap<String, KeyPathNode> {
        &self.root
    }

    /// Whether the index has no entries
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}

fn insert_key(root: &mut BTreeMap<String, KeyPathNode>, key: &str) {
    let parts: Vec<&str> = key.split('.').collect();
    let (leaf_part, branch_parts) = parts.split_last().expect("split never yields empty");

    let mut node = root;
    for part in branch_parts {
        let entry = node
            .entry((*part).to_string())
            .or_insert_with(|| KeyPathNode::Branch(BTreeMap::new()));
        if let KeyPathNode::Leaf(existing) = entry {
            warn!(
                key,
                existing = existing.as_str(),
                "ambiguous translation keys: leaf replaced by branch"
            );
            *entry = KeyPathNode::Branch(BTreeMap::new());
        }
        node = match entry {
            KeyPathNode::Branch(children) => children,
            KeyPathNode::Leaf(_) => unreachable!("leaf replaced above"),
        };
    }

    if let Some(KeyPathNode::Branch(_)) = node.get(*leaf_part) {
        warn!(key, "ambiguous translation keys: branch replaced by leaf");
    }
    node.insert((*leaf_part).to_string(), KeyPathNode::Leaf(key.to_string()));
}
