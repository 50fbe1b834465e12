//! YAML node representation with metadata tracking.
//!
//! Every node of every loaded document lives in a [`DocumentArena`](super::tree::DocumentArena)
//! and is addressed by a [`NodeId`]. Collections refer to their children by id, so
//! several candidates can point at the same node and observe each other's writes.
//!
//! Formatting details the query engine does not interpret (scalar style, anchors,
//! tags, comments, the original spelling of numbers) ride along in [`NodeMetadata`]
//! so the printer can reproduce them.
//!
//! # Example
//!
//! ```
//! use yamlquery::document::node::{YamlNode, YamlValue, YamlNumber, NodeOrigin};
//!
//! let node = YamlNode::new(YamlValue::Number(YamlNumber::Integer(42)), NodeOrigin::Computed);
//! assert_eq!(node.value().kind_name(), "number");
//! assert!(!node.is_document_node());
//! ```

use indexmap::IndexMap;
use std::fmt;
use std::str::FromStr;

/// Stable handle of a node inside a [`DocumentArena`](super::tree::DocumentArena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Returns the raw arena slot of this node.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Line and column of a node in its source text (1-based line, 0-based column).
#[derive(Debug, Clone, PartialEq, Eq, Copy, Default)]
pub struct TextPosition {
    pub line: usize,
    pub column: usize,
}

/// Represents YAML numbers (integer or float)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum YamlNumber {
    Integer(i64),
    Float(f64),
}

impl fmt::Display for YamlNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YamlNumber::Integer(i) => write!(f, "{}", i),
            YamlNumber::Float(fl) => write!(f, "{}", format_float(*fl)),
        }
    }
}

impl YamlNumber {
    pub fn as_f64(&self) -> f64 {
        match self {
            YamlNumber::Integer(i) => *i as f64,
            YamlNumber::Float(f) => *f,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, YamlNumber::Integer(_))
    }

    pub fn is_float(&self) -> bool {
        matches!(self, YamlNumber::Float(_))
    }
}

/// Formats a float the way YAML writers expect (`1.0` rather than `1`, `.inf` for infinity).
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_string()
    } else if value.is_infinite() {
        if value > 0.0 {
            ".inf".to_string()
        } else {
            "-.inf".to_string()
        }
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}

/// A scalar value that exists outside of any arena, e.g. a literal in an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    String(String),
    Number(YamlNumber),
    Boolean(bool),
    Null,
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{:?}", s),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Boolean(b) => write!(f, "{}", b),
            Scalar::Null => write!(f, "null"),
        }
    }
}

impl From<Scalar> for YamlValue {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::String(s) => YamlValue::String(s),
            Scalar::Number(n) => YamlValue::Number(n),
            Scalar::Boolean(b) => YamlValue::Boolean(b),
            Scalar::Null => YamlValue::Null,
        }
    }
}

/// The value held by one arena node.
///
/// Mappings and sequences hold the ids of their children; an alias holds the id
/// of the anchored node it refers to.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// Key/value pairs in source order
    Mapping(IndexMap<String, NodeId>),
    /// Ordered elements
    Sequence(Vec<NodeId>),
    String(String),
    Number(YamlNumber),
    Boolean(bool),
    Null,
    /// Reference to an anchored node (`*name`)
    Alias(NodeId),
}

impl YamlValue {
    /// Returns true if this value is a mapping.
    pub fn is_mapping(&self) -> bool {
        matches!(self, YamlValue::Mapping(_))
    }

    /// Returns true if this value is a sequence.
    pub fn is_sequence(&self) -> bool {
        matches!(self, YamlValue::Sequence(_))
    }

    /// Returns true if this value is a mapping or a sequence.
    pub fn is_collection(&self) -> bool {
        matches!(self, YamlValue::Mapping(_) | YamlValue::Sequence(_))
    }

    /// Returns true for strings, numbers, booleans and null.
    pub fn is_scalar(&self) -> bool {
        !self.is_collection() && !matches!(self, YamlValue::Alias(_))
    }

    /// Human readable name of the value's kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            YamlValue::Mapping(_) => "mapping",
            YamlValue::Sequence(_) => "sequence",
            YamlValue::String(_) => "string",
            YamlValue::Number(_) => "number",
            YamlValue::Boolean(_) => "boolean",
            YamlValue::Null => "null",
            YamlValue::Alias(_) => "alias",
        }
    }

    /// The implicit YAML tag of this value.
    pub fn default_tag(&self) -> &'static str {
        match self {
            YamlValue::Mapping(_) => "!!map",
            YamlValue::Sequence(_) => "!!seq",
            YamlValue::String(_) => "!!str",
            YamlValue::Number(YamlNumber::Integer(_)) => "!!int",
            YamlValue::Number(YamlNumber::Float(_)) => "!!float",
            YamlValue::Boolean(_) => "!!bool",
            YamlValue::Null => "!!null",
            YamlValue::Alias(_) => "!!alias",
        }
    }

    /// Returns the scalar form of this value, if it is one.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            YamlValue::String(s) => Some(Scalar::String(s.clone())),
            YamlValue::Number(n) => Some(Scalar::Number(*n)),
            YamlValue::Boolean(b) => Some(Scalar::Boolean(*b)),
            YamlValue::Null => Some(Scalar::Null),
            _ => None,
        }
    }

    /// Ids of the direct children in traversal order.
    pub fn child_ids(&self) -> Vec<NodeId> {
        match self {
            YamlValue::Mapping(entries) => entries.values().copied().collect(),
            YamlValue::Sequence(items) => items.clone(),
            _ => Vec::new(),
        }
    }
}

/// Presentation style of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeStyle {
    #[default]
    Default,
    DoubleQuoted,
    SingleQuoted,
    Literal,
    Folded,
    Flow,
}

impl NodeStyle {
    /// The name used by the `style` function.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStyle::Default => "",
            NodeStyle::DoubleQuoted => "double",
            NodeStyle::SingleQuoted => "single",
            NodeStyle::Literal => "literal",
            NodeStyle::Folded => "folded",
            NodeStyle::Flow => "flow",
        }
    }
}

impl FromStr for NodeStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "default" | "plain" => Ok(NodeStyle::Default),
            "double" => Ok(NodeStyle::DoubleQuoted),
            "single" => Ok(NodeStyle::SingleQuoted),
            "literal" => Ok(NodeStyle::Literal),
            "folded" => Ok(NodeStyle::Folded),
            "flow" => Ok(NodeStyle::Flow),
            other => Err(format!("unknown style '{}'", other)),
        }
    }
}

/// Whether a node was loaded from a document or synthesized during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    Document,
    Computed,
}

/// Metadata associated with a YAML node.
///
/// None of it affects navigation; it is carried so output can reproduce the input's
/// formatting and so metadata functions (`style`, `anchor`, ...) can read and write it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMetadata {
    pub style: NodeStyle,
    /// Explicit tag; `None` means the implicit tag of the value
    pub tag: Option<String>,
    pub anchor: Option<String>,
    /// Comment lines above the node (or above its key), without `#`
    pub head_comment: Option<String>,
    /// Comment at the end of the node's line, without `#`
    pub line_comment: Option<String>,
    /// The scalar exactly as written in the source (`0x1F`, `1.50`, `~`)
    pub original_formatting: Option<String>,
    pub position: Option<TextPosition>,
}

/// A YAML value wrapped with metadata and provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlNode {
    pub(crate) value: YamlValue,
    pub(crate) metadata: NodeMetadata,
    pub(crate) origin: NodeOrigin,
}

impl YamlNode {
    /// Creates a new node with empty metadata.
    pub fn new(value: YamlValue, origin: NodeOrigin) -> Self {
        Self {
            value,
            metadata: NodeMetadata::default(),
            origin,
        }
    }

    /// Returns an immutable reference to the node's value.
    pub fn value(&self) -> &YamlValue {
        &self.value
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    pub fn origin(&self) -> NodeOrigin {
        self.origin
    }

    /// Returns true if the node belongs to a loaded (or null-input) document.
    pub fn is_document_node(&self) -> bool {
        self.origin == NodeOrigin::Document
    }

    /// Returns the anchor name if this node has one.
    pub fn anchor(&self) -> Option<&str> {
        self.metadata.anchor.as_deref()
    }

    /// The explicit tag, falling back to the value's implicit tag.
    pub fn tag(&self) -> &str {
        self.metadata
            .tag
            .as_deref()
            .unwrap_or_else(|| self.value.default_tag())
    }
}
