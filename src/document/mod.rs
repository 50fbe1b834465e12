//! Document model: arena-backed YAML trees and the candidates that view them.
//!
//! - [`node`]: node values and formatting metadata
//! - [`tree`]: the [`DocumentArena`](tree::DocumentArena) owning all nodes plus the parent relation
//! - [`candidate`]: [`CandidateNode`](candidate::CandidateNode), a node handle with provenance
//! - [`parser`]: YAML text to arena documents

pub mod candidate;
pub mod node;
pub mod parser;
pub mod tree;

pub use candidate::{CandidateNode, CandidateSequence};
pub use node::{NodeId, NodeOrigin, NodeStyle, Scalar, YamlNode, YamlNumber, YamlValue};
pub use tree::{DocumentArena, PathKey};
