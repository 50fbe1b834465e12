//! Abstract syntax tree for compiled expressions.
//!
//! An expression compiles to a tree of [`OperatorNode`]s. Every node has a
//! [`OperatorKind`] and up to two operands; function arguments and object
//! entries are chained through [`OperatorKind::Block`] nodes.

use crate::document::node::Scalar;
use crate::error::{EvalResult, EvaluationError};
use std::fmt;

/// Byte range of the expression text a node was compiled from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: usize,
    pub len: usize,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self { offset, len }
    }

    /// Smallest span covering both.
    pub fn to(self, other: Span) -> Span {
        let start = self.offset.min(other.offset);
        let end = (self.offset + self.len).max(other.offset + other.len);
        Span::new(start, end - start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithmeticOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl ArithmeticOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "+",
            ArithmeticOp::Subtract => "-",
            ArithmeticOp::Multiply => "*",
            ArithmeticOp::Divide => "/",
            ArithmeticOp::Modulo => "%",
        }
    }

    /// Verb used in type-mismatch messages ("cannot add mapping with number").
    pub fn verb(&self) -> &'static str {
        match self {
            ArithmeticOp::Add => "add",
            ArithmeticOp::Subtract => "subtract",
            ArithmeticOp::Multiply => "multiply",
            ArithmeticOp::Divide => "divide",
            ArithmeticOp::Modulo => "take the remainder of",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl ComparisonOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOp::Equal => "==",
            ComparisonOp::NotEqual => "!=",
            ComparisonOp::Less => "<",
            ComparisonOp::LessOrEqual => "<=",
            ComparisonOp::Greater => ">",
            ComparisonOp::GreaterOrEqual => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `|=`
    Update,
    /// `+=`, `-=`, ...
    Arithmetic(ArithmeticOp),
    /// `style=`, `tag=`, ...
    Metadata(MetadataField),
}

/// Node metadata that can be read and written by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataField {
    Style,
    Tag,
    Anchor,
    LineComment,
    HeadComment,
}

impl MetadataField {
    pub const ALL: [MetadataField; 5] = [
        MetadataField::Style,
        MetadataField::Tag,
        MetadataField::Anchor,
        MetadataField::LineComment,
        MetadataField::HeadComment,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MetadataField::Style => "style",
            MetadataField::Tag => "tag",
            MetadataField::Anchor => "anchor",
            MetadataField::LineComment => "line_comment",
            MetadataField::HeadComment => "head_comment",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

/// Key of a [`OperatorKind::Selector`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SelectorKey {
    Key(String),
    Index(i64),
}

impl fmt::Display for SelectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorKey::Key(k) => write!(f, "{}", k),
            SelectorKey::Index(i) => write!(f, "{}", i),
        }
    }
}

/// The closed set of operator kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorKind {
    /// `.`
    Identity,
    /// `.a`, `.[0]`, `."a b"`; `optional` is set by a trailing `?`
    Selector { key: SelectorKey, optional: bool },
    /// `.[expr]`: key or index computed by `lhs`
    Lookup,
    /// `.[a:b]`
    Slice(Option<i64>, Option<i64>),
    /// `.[]`
    Splat,
    /// `..`
    RecurseDescend,
    Pipe,
    Union,
    /// `select(lhs)`
    Filter,
    Assign(AssignOp),
    Arithmetic(ArithmeticOp),
    Comparison(ComparisonOp),
    Logical(LogicalOp),
    /// `lhs // rhs`
    Alternative,
    Literal(Scalar),
    /// `[lhs]`
    Collect,
    /// `{...}`; entries chained through `Block` in `lhs`
    CollectObject,
    /// `key: value` with key in `lhs` and value in `rhs`
    ObjectEntry,
    /// `name(args)`; arguments chained through `Block` in `lhs`
    FunctionCall(String),
    /// `lhs; rhs`
    Block,
}

/// Fieldless tag of an [`OperatorKind`], the key operators are registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindTag {
    Identity,
    Selector,
    Lookup,
    Slice,
    Splat,
    RecurseDescend,
    Pipe,
    Union,
    Filter,
    Assign,
    Arithmetic,
    Comparison,
    Logical,
    Alternative,
    Literal,
    Collect,
    CollectObject,
    ObjectEntry,
    FunctionCall,
    Block,
}

impl OperatorKind {
    pub fn tag(&self) -> KindTag {
        match self {
            OperatorKind::Identity => KindTag::Identity,
            OperatorKind::Selector { .. } => KindTag::Selector,
            OperatorKind::Lookup => KindTag::Lookup,
            OperatorKind::Slice(..) => KindTag::Slice,
            OperatorKind::Splat => KindTag::Splat,
            OperatorKind::RecurseDescend => KindTag::RecurseDescend,
            OperatorKind::Pipe => KindTag::Pipe,
            OperatorKind::Union => KindTag::Union,
            OperatorKind::Filter => KindTag::Filter,
            OperatorKind::Assign(_) => KindTag::Assign,
            OperatorKind::Arithmetic(_) => KindTag::Arithmetic,
            OperatorKind::Comparison(_) => KindTag::Comparison,
            OperatorKind::Logical(_) => KindTag::Logical,
            OperatorKind::Alternative => KindTag::Alternative,
            OperatorKind::Literal(_) => KindTag::Literal,
            OperatorKind::Collect => KindTag::Collect,
            OperatorKind::CollectObject => KindTag::CollectObject,
            OperatorKind::ObjectEntry => KindTag::ObjectEntry,
            OperatorKind::FunctionCall(_) => KindTag::FunctionCall,
            OperatorKind::Block => KindTag::Block,
        }
    }

    /// Short name for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            OperatorKind::Identity => "identity",
            OperatorKind::Selector { .. } => "selector",
            OperatorKind::Lookup => "lookup",
            OperatorKind::Slice(..) => "slice",
            OperatorKind::Splat => "splat",
            OperatorKind::RecurseDescend => "recurse",
            OperatorKind::Pipe => "pipe",
            OperatorKind::Union => "union",
            OperatorKind::Filter => "select",
            OperatorKind::Assign(_) => "assign",
            OperatorKind::Arithmetic(_) => "arithmetic",
            OperatorKind::Comparison(_) => "comparison",
            OperatorKind::Logical(LogicalOp::And) => "and",
            OperatorKind::Logical(LogicalOp::Or) => "or",
            OperatorKind::Alternative => "alternative",
            OperatorKind::Literal(_) => "literal",
            OperatorKind::Collect => "collect",
            OperatorKind::CollectObject => "object",
            OperatorKind::ObjectEntry => "object entry",
            OperatorKind::FunctionCall(_) => "function call",
            OperatorKind::Block => "block",
        }
    }
}

/// One node of a compiled expression.
#[derive(Debug, Clone, PartialEq)]
pub struct OperatorNode {
    pub kind: OperatorKind,
    pub lhs: Option<Box<OperatorNode>>,
    pub rhs: Option<Box<OperatorNode>>,
    pub span: Span,
}

impl OperatorNode {
    pub fn leaf(kind: OperatorKind, span: Span) -> Self {
        Self {
            kind,
            lhs: None,
            rhs: None,
            span,
        }
    }

    pub fn unary(kind: OperatorKind, lhs: OperatorNode, span: Span) -> Self {
        Self {
            kind,
            lhs: Some(Box::new(lhs)),
            rhs: None,
            span,
        }
    }

    pub fn binary(kind: OperatorKind, lhs: OperatorNode, rhs: OperatorNode) -> Self {
        let span = lhs.span.to(rhs.span);
        Self {
            kind,
            lhs: Some(Box::new(lhs)),
            rhs: Some(Box::new(rhs)),
            span,
        }
    }

    /// `lhs | rhs`, dropping an identity on the left.
    pub fn pipe(lhs: OperatorNode, rhs: OperatorNode) -> Self {
        if lhs.kind == OperatorKind::Identity {
            rhs
        } else {
            OperatorNode::binary(OperatorKind::Pipe, lhs, rhs)
        }
    }

    /// Left operand, or an error naming this operator.
    pub fn lhs(&self) -> EvalResult<&OperatorNode> {
        self.lhs.as_deref().ok_or(EvaluationError::MissingOperand {
            operator: self.kind.name(),
            operand: "left",
        })
    }

    /// Right operand, or an error naming this operator.
    pub fn rhs(&self) -> EvalResult<&OperatorNode> {
        self.rhs.as_deref().ok_or(EvaluationError::MissingOperand {
            operator: self.kind.name(),
            operand: "right",
        })
    }

    /// Arguments of a function call (or entries of an object), flattened out of
    /// the `Block` chain held in `lhs`.
    pub fn arguments(&self) -> Vec<&OperatorNode> {
        let mut args = Vec::new();
        let mut current = self.lhs.as_deref();
        while let Some(node) = current {
            if node.kind == OperatorKind::Block {
                if let Some(first) = node.lhs.as_deref() {
                    args.push(first);
                }
                current = node.rhs.as_deref();
            } else {
                args.push(node);
                current = None;
            }
        }
        args
    }

    /// Stages of a pipe chain in evaluation order. Nested pipes on either side
    /// are flattened, so `a | (b | c)` and `(a | b) | c` both give `[a, b, c]`.
    pub fn pipe_stages(&self) -> EvalResult<Vec<&OperatorNode>> {
        let mut stages = Vec::new();
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if node.kind == OperatorKind::Pipe {
                pending.push(node.rhs()?);
                pending.push(node.lhs()?);
            } else {
                stages.push(node);
            }
        }
        Ok(stages)
    }

    /// Returns true if `predicate` holds for this node or any node below it.
    pub fn any(&self, predicate: &dyn Fn(&OperatorNode) -> bool) -> bool {
        let mut pending = vec![self];
        while let Some(node) = pending.pop() {
            if predicate(node) {
                return true;
            }
            pending.extend(node.lhs.as_deref());
            pending.extend(node.rhs.as_deref());
        }
        false
    }
}

// Long pipe chains nest tens of thousands of boxes deep; dropping them
// recursively would exhaust the stack.
impl Drop for OperatorNode {
    fn drop(&mut self) {
        let mut pending: Vec<Box<OperatorNode>> = Vec::new();
        pending.extend(self.lhs.take());
        pending.extend(self.rhs.take());
        while let Some(mut node) = pending.pop() {
            pending.extend(node.lhs.take());
            pending.extend(node.rhs.take());
        }
    }
}

/// Chains nodes with `Block` (`a; b; c` becomes `Block(a, Block(b, c))`).
pub fn block_chain(mut nodes: Vec<OperatorNode>) -> Option<OperatorNode> {
    let mut chain = nodes.pop()?;
    while let Some(node) = nodes.pop() {
        chain = OperatorNode::binary(OperatorKind::Block, node, chain);
    }
    Some(chain)
}
