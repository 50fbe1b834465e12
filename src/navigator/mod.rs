//! Tree navigator: evaluates an operator tree against candidate sequences.
//!
//! The navigator knows nothing about individual operators. Every node of the
//! tree is looked up in the [`OperatorRegistry`] and handed the navigator back,
//! so nested operands are evaluated through the same entry point. Nesting is
//! bounded by [`NavigatorOptions::max_depth`].
//!
//! # Example
//!
//! ```
//! use yamlquery::document::parser::parse_documents;
//! use yamlquery::document::tree::DocumentArena;
//! use yamlquery::document::node::{YamlValue, YamlNumber};
//! use yamlquery::expression::compile;
//! use yamlquery::navigator::{NavigatorOptions, TreeNavigator};
//! use yamlquery::operators::OperatorRegistry;
//!
//! let mut arena = DocumentArena::new();
//! let roots = parse_documents("a: 1\nb: 2\n", "sample.yml", 0, &mut arena).unwrap();
//! let registry = OperatorRegistry::standard();
//! let ast = compile(".a").unwrap();
//!
//! let mut navigator = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
//! let results = navigator.evaluate(&roots, &ast).unwrap();
//! assert_eq!(navigator.arena().value(results[0].node), &YamlValue::Number(YamlNumber::Integer(1)));
//! ```

use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeOrigin, YamlValue};
use crate::document::tree::DocumentArena;
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::OperatorNode;
use crate::operators::OperatorRegistry;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Default bound on operator nesting during evaluation.
///
/// Brackets, function arguments and operands of binary operators each add a
/// level. A pipe chain or dotted path counts once however long it is.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// What a selector does when the key or index it names is absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKeyPolicy {
    /// Emit nothing for that candidate
    #[default]
    Skip,
    /// Emit a computed null
    Null,
    /// Fail with [`EvaluationError::MissingKey`]
    Error,
}

impl MissingKeyPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissingKeyPolicy::Skip => "skip",
            MissingKeyPolicy::Null => "null",
            MissingKeyPolicy::Error => "error",
        }
    }
}

impl fmt::Display for MissingKeyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MissingKeyPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "skip" => Ok(MissingKeyPolicy::Skip),
            "null" => Ok(MissingKeyPolicy::Null),
            "error" => Ok(MissingKeyPolicy::Error),
            other => Err(format!(
                "unknown missing-key policy '{}' (expected skip, null or error)",
                other
            )),
        }
    }
}

/// Tunables for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorOptions {
    pub missing_key: MissingKeyPolicy,
    pub max_depth: usize,
}

impl Default for NavigatorOptions {
    fn default() -> Self {
        Self {
            missing_key: MissingKeyPolicy::Skip,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

/// Evaluation context threaded through every operator.
pub struct TreeNavigator<'a> {
    arena: &'a mut DocumentArena,
    registry: &'a OperatorRegistry,
    options: NavigatorOptions,
    depth: usize,
    auto_create: bool,
}

impl<'a> TreeNavigator<'a> {
    pub fn new(
        arena: &'a mut DocumentArena,
        registry: &'a OperatorRegistry,
        options: NavigatorOptions,
    ) -> Self {
        Self {
            arena,
            registry,
            options,
            depth: 0,
            auto_create: false,
        }
    }

    pub fn arena(&self) -> &DocumentArena {
        &*self.arena
    }

    pub fn arena_mut(&mut self) -> &mut DocumentArena {
        &mut *self.arena
    }

    pub fn options(&self) -> NavigatorOptions {
        self.options
    }

    /// True while evaluating the target path of an assignment; selectors then
    /// create what is missing instead of skipping it.
    pub fn auto_create(&self) -> bool {
        self.auto_create
    }

    /// Evaluates `node` against `input`.
    ///
    /// # Errors
    ///
    /// Fails with [`EvaluationError::RecursionLimit`] when operators nest deeper
    /// than the configured limit, or with whatever the operators report.
    pub fn evaluate(
        &mut self,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        if self.depth >= self.options.max_depth {
            return Err(EvaluationError::RecursionLimit {
                limit: self.options.max_depth,
            });
        }

        let registry = self.registry;
        let operator = registry.resolve(node)?;
        trace!(
            operator = node.kind.name(),
            depth = self.depth,
            inputs = input.len(),
            "evaluating"
        );

        let saved = self.auto_create;
        if !operator.addresses_input() {
            self.auto_create = false;
        }
        self.depth += 1;
        let result = operator.evaluate(self, input, node);
        self.depth -= 1;
        self.auto_create = saved;
        result
    }

    /// Evaluates an assignment target, creating missing path segments.
    pub fn evaluate_target(
        &mut self,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let saved = std::mem::replace(&mut self.auto_create, true);
        let result = self.evaluate(input, node);
        self.auto_create = saved;
        result
    }

    /// Evaluates a value operand (a predicate, key or right-hand side) without
    /// creating anything, even inside an assignment target.
    pub fn evaluate_value(
        &mut self,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let saved = std::mem::replace(&mut self.auto_create, false);
        let result = self.evaluate(input, node);
        self.auto_create = saved;
        result
    }

    /// Evaluates `node` against a single candidate.
    pub fn evaluate_one(
        &mut self,
        candidate: &CandidateNode,
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        self.evaluate_value(std::slice::from_ref(candidate), node)
    }

    /// Allocates a computed node carrying `source`'s provenance.
    pub fn computed(&mut self, source: &CandidateNode, value: YamlValue) -> CandidateNode {
        let id = self.arena.alloc(value, NodeOrigin::Computed);
        source.derive(id)
    }

    /// Deep copy of `candidate`'s node as a detached computed subtree.
    pub fn clone_computed(&mut self, candidate: &CandidateNode) -> CandidateNode {
        let id = self.arena.clone_subtree(candidate.node, NodeOrigin::Computed);
        candidate.derive(id)
    }

    /// The candidate's value with aliases resolved.
    pub fn value(&self, candidate: &CandidateNode) -> &YamlValue {
        self.arena.resolved_value(candidate.node)
    }
}
