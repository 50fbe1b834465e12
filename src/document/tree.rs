//! Arena storage for YAML document trees.
//!
//! `DocumentArena` owns every node of every document loaded for one evaluation
//! pass, plus the nodes operators synthesize along the way. Nodes are addressed
//! by [`NodeId`]; a parent relation (child → parent + key) is kept next to the
//! node storage so candidates can find their context without owning it.
//!
//! # Example
//!
//! ```
//! use yamlquery::document::tree::DocumentArena;
//! use yamlquery::document::node::{NodeOrigin, YamlValue, YamlNumber};
//!
//! let mut arena = DocumentArena::new();
//! let root = arena.new_mapping(NodeOrigin::Document);
//! let one = arena.alloc(YamlValue::Number(YamlNumber::Integer(1)), NodeOrigin::Document);
//! arena.insert_key(root, "a", one);
//!
//! assert_eq!(arena.child_by_key(root, "a"), Some(one));
//! assert_eq!(arena.parent_of(one), Some(root));
//! ```

use super::node::{NodeId, NodeMetadata, NodeOrigin, YamlNode, YamlValue};
use indexmap::IndexMap;
use std::fmt;

/// Key under which a node sits in its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathKey {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathKey::Key(k) => write!(f, "{}", k),
            PathKey::Index(i) => write!(f, "{}", i),
        }
    }
}

/// Back-reference from a child to the collection holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentLink {
    pub parent: NodeId,
    pub key: PathKey,
}

/// Upper bound on alias hops when resolving, guards against malformed alias chains.
const MAX_ALIAS_HOPS: usize = 64;

/// Owner of all nodes for one evaluation pass.
#[derive(Debug, Default)]
pub struct DocumentArena {
    nodes: Vec<YamlNode>,
    links: Vec<Option<ParentLink>>,
}

impl DocumentArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes allocated so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Stores a node and returns its handle. Children referenced by `node` get
    /// their parent links set.
    pub fn insert(&mut self, node: YamlNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        let children = entries_of(&node.value);
        self.nodes.push(node);
        self.links.push(None);
        for (key, child) in children {
            self.links[child.0] = Some(ParentLink { parent: id, key });
        }
        id
    }

    /// Allocates a node with default metadata.
    pub fn alloc(&mut self, value: YamlValue, origin: NodeOrigin) -> NodeId {
        self.insert(YamlNode::new(value, origin))
    }

    /// Allocates an empty mapping.
    pub fn new_mapping(&mut self, origin: NodeOrigin) -> NodeId {
        self.alloc(YamlValue::Mapping(IndexMap::new()), origin)
    }

    /// Allocates an empty sequence.
    pub fn new_sequence(&mut self, origin: NodeOrigin) -> NodeId {
        self.alloc(YamlValue::Sequence(Vec::new()), origin)
    }

    pub fn get(&self, id: NodeId) -> &YamlNode {
        &self.nodes[id.0]
    }

    pub fn value(&self, id: NodeId) -> &YamlValue {
        &self.nodes[id.0].value
    }

    pub fn metadata(&self, id: NodeId) -> &NodeMetadata {
        &self.nodes[id.0].metadata
    }

    pub fn metadata_mut(&mut self, id: NodeId) -> &mut NodeMetadata {
        &mut self.nodes[id.0].metadata
    }

    pub fn origin(&self, id: NodeId) -> NodeOrigin {
        self.nodes[id.0].origin
    }

    /// Follows aliases until a non-alias node is reached.
    pub fn resolve(&self, id: NodeId) -> NodeId {
        let mut current = id;
        for _ in 0..MAX_ALIAS_HOPS {
            match self.value(current) {
                YamlValue::Alias(target) => current = *target,
                _ => return current,
            }
        }
        current
    }

    /// Value of the node after alias resolution.
    pub fn resolved_value(&self, id: NodeId) -> &YamlValue {
        self.value(self.resolve(id))
    }

    /// Child of a mapping by key (aliases on `id` are followed).
    pub fn child_by_key(&self, id: NodeId, key: &str) -> Option<NodeId> {
        match self.resolved_value(id) {
            YamlValue::Mapping(entries) => entries.get(key).copied(),
            _ => None,
        }
    }

    /// Child of a sequence by index; negative indices count from the end.
    pub fn child_by_index(&self, id: NodeId, index: i64) -> Option<NodeId> {
        match self.resolved_value(id) {
            YamlValue::Sequence(items) => {
                let len = items.len() as i64;
                let normalized = if index < 0 { len + index } else { index };
                if normalized >= 0 && normalized < len {
                    Some(items[normalized as usize])
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Direct children in traversal order (aliases on `id` are followed).
    pub fn all_children(&self, id: NodeId) -> Vec<NodeId> {
        self.resolved_value(id).child_ids()
    }

    /// Direct children with the keys they sit under.
    pub fn entries(&self, id: NodeId) -> Vec<(PathKey, NodeId)> {
        entries_of(self.resolved_value(id))
    }

    pub fn link(&self, id: NodeId) -> Option<&ParentLink> {
        self.links[id.0].as_ref()
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.link(id).map(|link| link.parent)
    }

    pub fn key_of(&self, id: NodeId) -> Option<&PathKey> {
        self.link(id).map(|link| &link.key)
    }

    /// Keys from the top-most ancestor down to `id`.
    pub fn path_of(&self, id: NodeId) -> Vec<PathKey> {
        let mut path = Vec::new();
        let mut current = id;
        while let Some(link) = self.link(current) {
            path.push(link.key.clone());
            current = link.parent;
        }
        path.reverse();
        path
    }

    /// The top-most ancestor of `id`.
    pub fn root_of(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        current
    }

    /// A node may be mutated in place when it belongs to a document or sits
    /// inside some collection; free-standing computed values may not.
    pub fn is_addressable(&self, id: NodeId) -> bool {
        self.origin(id) == NodeOrigin::Document || self.link(id).is_some()
    }

    /// Inserts (or replaces) `key` in the mapping `mapping`, linking `child` to it.
    ///
    /// Returns false when `mapping` is not a mapping.
    pub fn insert_key(&mut self, mapping: NodeId, key: &str, child: NodeId) -> bool {
        let previous = match &mut self.nodes[mapping.0].value {
            YamlValue::Mapping(entries) => entries.insert(key.to_string(), child),
            _ => return false,
        };
        if let Some(old) = previous {
            if old != child {
                self.links[old.0] = None;
            }
        }
        self.links[child.0] = Some(ParentLink {
            parent: mapping,
            key: PathKey::Key(key.to_string()),
        });
        true
    }

    /// Appends `child` to the sequence `sequence`.
    ///
    /// Returns false when `sequence` is not a sequence.
    pub fn push_item(&mut self, sequence: NodeId, child: NodeId) -> bool {
        let index = match &mut self.nodes[sequence.0].value {
            YamlValue::Sequence(items) => {
                items.push(child);
                items.len() - 1
            }
            _ => return false,
        };
        self.links[child.0] = Some(ParentLink {
            parent: sequence,
            key: PathKey::Index(index),
        });
        true
    }

    /// Removes the child under `key` from `parent`, re-indexing later sequence
    /// elements. Returns the detached child.
    pub fn remove_child(&mut self, parent: NodeId, key: &PathKey) -> Option<NodeId> {
        let removed = match (&mut self.nodes[parent.0].value, key) {
            (YamlValue::Mapping(entries), PathKey::Key(k)) => entries.shift_remove(k),
            (YamlValue::Sequence(items), PathKey::Index(i)) if *i < items.len() => {
                Some(items.remove(*i))
            }
            _ => None,
        }?;
        self.links[removed.0] = None;
        self.relink_children(parent);
        Some(removed)
    }

    /// Replaces the raw value of `id`. Former children lose their parent link and
    /// new children are linked to `id`.
    pub fn replace_value(&mut self, id: NodeId, value: YamlValue) {
        let old = std::mem::replace(&mut self.nodes[id.0].value, value);
        for child in old.child_ids() {
            if self.parent_of(child) == Some(id) {
                self.links[child.0] = None;
            }
        }
        self.relink_children(id);
    }

    /// Writes a deep copy of `source`'s value (and presentation style) into
    /// `target`. The target keeps its own comments, anchor and parent link, so
    /// every candidate aliasing `target` sees the new value.
    pub fn set_value(&mut self, target: NodeId, source: NodeId) {
        if target == source {
            return;
        }
        let origin = self.origin(target);
        let copy = self.clone_subtree(source, origin);
        let value = std::mem::replace(&mut self.nodes[copy.0].value, YamlValue::Null);
        let source_meta = self.nodes[copy.0].metadata.clone();
        self.replace_value(target, value);
        let meta = &mut self.nodes[target.0].metadata;
        meta.style = source_meta.style;
        meta.tag = source_meta.tag;
        meta.original_formatting = source_meta.original_formatting;
    }

    /// Deep copy of the subtree rooted at `id`. Aliases are copied as aliases to
    /// the same anchored node. The copy has no parent.
    pub fn clone_subtree(&mut self, id: NodeId, origin: NodeOrigin) -> NodeId {
        let node = self.get(id).clone();
        let value = match node.value {
            YamlValue::Mapping(entries) => {
                let mut copied = IndexMap::with_capacity(entries.len());
                for (key, child) in entries {
                    copied.insert(key, self.clone_subtree(child, origin));
                }
                YamlValue::Mapping(copied)
            }
            YamlValue::Sequence(items) => YamlValue::Sequence(
                items
                    .into_iter()
                    .map(|child| self.clone_subtree(child, origin))
                    .collect(),
            ),
            other => other,
        };
        self.insert(YamlNode {
            value,
            metadata: node.metadata,
            origin,
        })
    }

    fn relink_children(&mut self, id: NodeId) {
        for (key, child) in entries_of(&self.nodes[id.0].value) {
            self.links[child.0] = Some(ParentLink { parent: id, key });
        }
    }
}

fn entries_of(value: &YamlValue) -> Vec<(PathKey, NodeId)> {
    match value {
        YamlValue::Mapping(entries) => entries
            .iter()
            .map(|(k, v)| (PathKey::Key(k.clone()), *v))
            .collect(),
        YamlValue::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (PathKey::Index(i), *v))
            .collect(),
        _ => Vec::new(),
    }
}
