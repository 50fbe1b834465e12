//! Candidate nodes: the values that flow between operators.
//!
//! A `CandidateNode` is a view of one arena node together with the provenance of
//! the document it came from. Candidates are cheap to clone and several of them
//! may point at the same node; parent and key are looked up in the arena when
//! needed rather than stored.

use super::node::NodeId;
use super::tree::{DocumentArena, PathKey};
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateNode {
    /// Position of the originating document in the input stream
    pub document_index: usize,
    /// File name (or `-` for stdin) the document was read from
    pub source_id: Rc<str>,
    /// Handle of the underlying node
    pub node: NodeId,
}

/// Ordered results of one evaluation stage.
pub type CandidateSequence = Vec<CandidateNode>;

impl CandidateNode {
    pub fn new(document_index: usize, source_id: impl Into<Rc<str>>, node: NodeId) -> Self {
        Self {
            document_index,
            source_id: source_id.into(),
            node,
        }
    }

    /// A candidate for `node` carrying this candidate's provenance.
    pub fn derive(&self, node: NodeId) -> Self {
        Self {
            document_index: self.document_index,
            source_id: Rc::clone(&self.source_id),
            node,
        }
    }

    /// Key under which the node sits in its parent, `None` at a root.
    pub fn key<'a>(&self, arena: &'a DocumentArena) -> Option<&'a PathKey> {
        arena.key_of(self.node)
    }

    /// The candidate for the containing collection, if any.
    pub fn parent(&self, arena: &DocumentArena) -> Option<CandidateNode> {
        arena.parent_of(self.node).map(|parent| self.derive(parent))
    }

    /// Breadcrumb path from the document root.
    pub fn path(&self, arena: &DocumentArena) -> Vec<PathKey> {
        arena.path_of(self.node)
    }

    /// Returns true if both candidates view the same node.
    pub fn aliases(&self, other: &CandidateNode) -> bool {
        self.node == other.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::node::{NodeOrigin, YamlValue};

    #[test]
    fn test_derive_keeps_provenance() {
        let mut arena = DocumentArena::new();
        let root = arena.new_mapping(NodeOrigin::Document);
        let child = arena.alloc(YamlValue::Null, NodeOrigin::Document);
        arena.insert_key(root, "a", child);

        let candidate = CandidateNode::new(3, "sample.yml", root);
        let derived = candidate.derive(child);

        assert_eq!(derived.document_index, 3);
        assert_eq!(&*derived.source_id, "sample.yml");
        assert_eq!(derived.key(&arena), Some(&PathKey::Key("a".to_string())));
        assert_eq!(derived.parent(&arena), Some(candidate.clone()));
        assert!(candidate.key(&arena).is_none());
    }
}
