//! Operator library: the evaluation behaviour behind every operator kind and
//! built-in function.
//!
//! Each behaviour implements [`Operator`] and is registered in an
//! [`OperatorRegistry`], keyed by [`KindTag`] for syntax-level operators and by
//! name for functions. The navigator dispatches through the registry only.
//!
//! Modules:
//!
//! - [`path`]: identity, selectors, slices, splat, recursive descent
//! - [`combinators`]: pipe, union, filter, alternative, block
//! - [`logic`]: comparison and boolean operators, value ordering
//! - [`arithmetic`]: `+ - * / %`
//! - [`assign`]: `=`, `|=`, `op=`
//! - [`collect`]: literals and collection constructors
//! - [`builtins`], [`collection`], [`strings`], [`metadata`]: named functions

pub mod arithmetic;
pub mod assign;
pub mod builtins;
pub mod collect;
pub mod collection;
pub mod combinators;
pub mod logic;
pub mod metadata;
pub mod path;
pub mod strings;

use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeId, NodeOrigin, YamlValue};
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::{KindTag, OperatorKind, OperatorNode};
use crate::navigator::TreeNavigator;
use indexmap::IndexMap;
use std::collections::HashMap;

/// One evaluation behaviour.
pub trait Operator {
    /// Produces the output candidates of `node` for `input`.
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence>;

    /// True for operators whose results are (or lead to) locations inside their
    /// input. Only these keep path auto-creation on inside assignment targets.
    fn addresses_input(&self) -> bool {
        false
    }

    /// True for operators that must see every document of the stream at once.
    fn cross_document(&self) -> bool {
        false
    }
}

/// Signature of a built-in function body: navigator, input, arguments.
pub type FunctionBody = fn(
    &mut TreeNavigator<'_>,
    &[CandidateNode],
    &[&OperatorNode],
) -> EvalResult<CandidateSequence>;

/// A named function with an arity range.
pub struct BuiltinFunction {
    name: &'static str,
    min_args: usize,
    max_args: usize,
    cross_document: bool,
    addresses_input: bool,
    body: FunctionBody,
}

impl BuiltinFunction {
    pub fn new(name: &'static str, args: usize, body: FunctionBody) -> Self {
        Self::with_range(name, args, args, body)
    }

    pub fn with_range(
        name: &'static str,
        min_args: usize,
        max_args: usize,
        body: FunctionBody,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            cross_document: false,
            addresses_input: false,
            body,
        }
    }

    /// Marks the function as a reduction over the whole stream.
    pub fn across_documents(mut self) -> Self {
        self.cross_document = true;
        self
    }

    /// Marks the function as returning locations inside its input
    /// (`parent`, `root`, `first`, ...), so it may appear in assignment targets.
    pub fn addressing(mut self) -> Self {
        self.addresses_input = true;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn expected(&self) -> String {
        if self.min_args == self.max_args {
            self.min_args.to_string()
        } else {
            format!("{} to {}", self.min_args, self.max_args)
        }
    }
}

impl Operator for BuiltinFunction {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let args = node.arguments();
        if args.len() < self.min_args || args.len() > self.max_args {
            return Err(EvaluationError::Arity {
                name: self.name.to_string(),
                expected: self.expected(),
                found: args.len(),
            });
        }
        (self.body)(nav, input, &args)
    }

    fn addresses_input(&self) -> bool {
        self.addresses_input
    }

    fn cross_document(&self) -> bool {
        self.cross_document
    }
}

/// Lookup table from operator kinds and function names to behaviours.
#[derive(Default)]
pub struct OperatorRegistry {
    kinds: HashMap<KindTag, Box<dyn Operator>>,
    functions: IndexMap<String, Box<dyn Operator>>,
}

impl OperatorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry with every built-in operator and function.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        path::register(&mut registry);
        combinators::register(&mut registry);
        logic::register(&mut registry);
        arithmetic::register(&mut registry);
        assign::register(&mut registry);
        collect::register(&mut registry);
        builtins::register(&mut registry);
        collection::register(&mut registry);
        strings::register(&mut registry);
        metadata::register(&mut registry);
        registry
    }

    pub fn register_kind(&mut self, tag: KindTag, operator: impl Operator + 'static) {
        self.kinds.insert(tag, Box::new(operator));
    }

    pub fn register_function(&mut self, function: BuiltinFunction) {
        self.functions
            .insert(function.name().to_string(), Box::new(function));
    }

    /// Registers `function` under an additional name.
    pub fn register_alias(&mut self, alias: &str, function: BuiltinFunction) {
        self.functions.insert(alias.to_string(), Box::new(function));
    }

    /// Names of all registered functions, in registration order.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    /// Finds the behaviour for `node`.
    ///
    /// # Errors
    ///
    /// [`EvaluationError::UnknownFunction`] when nothing is registered for it.
    pub fn resolve(&self, node: &OperatorNode) -> EvalResult<&dyn Operator> {
        let found = match &node.kind {
            OperatorKind::FunctionCall(name) => self.functions.get(name),
            kind => self.kinds.get(&kind.tag()),
        };
        found
            .map(|operator| operator.as_ref())
            .ok_or_else(|| EvaluationError::UnknownFunction {
                name: match &node.kind {
                    OperatorKind::FunctionCall(name) => name.clone(),
                    kind => kind.name().to_string(),
                },
            })
    }

    /// True when any node of `ast` resolves to a cross-document operator.
    pub fn is_cross_document(&self, ast: &OperatorNode) -> bool {
        ast.any(&|node| {
            self.resolve(node)
                .map(|operator| operator.cross_document())
                .unwrap_or(false)
        })
    }
}

/// `false` and `null` are falsy; everything else is truthy.
pub fn is_truthy(value: &YamlValue) -> bool {
    !matches!(value, YamlValue::Boolean(false) | YamlValue::Null)
}

/// Pairs the results of two operands by position.
///
/// # Errors
///
/// [`EvaluationError::LengthMismatch`] unless both sides have the same length.
pub fn pair_results(
    operation: &'static str,
    lhs: CandidateSequence,
    rhs: CandidateSequence,
) -> EvalResult<Vec<(CandidateNode, CandidateNode)>> {
    if lhs.len() != rhs.len() {
        return Err(EvaluationError::LengthMismatch {
            operation,
            lhs: lhs.len(),
            rhs: rhs.len(),
        });
    }
    Ok(lhs.into_iter().zip(rhs).collect())
}

/// Applies `f` to every input candidate, emitting each returned value as a
/// computed node with that candidate's provenance.
pub(crate) fn map_scalars(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    mut f: impl FnMut(&mut TreeNavigator<'_>, &CandidateNode) -> EvalResult<YamlValue>,
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let value = f(nav, candidate)?;
        results.push(nav.computed(candidate, value));
    }
    Ok(results)
}

/// A computed sequence of scalar values.
pub(crate) fn computed_sequence(
    nav: &mut TreeNavigator<'_>,
    source: &CandidateNode,
    values: Vec<YamlValue>,
) -> CandidateNode {
    let arena = nav.arena_mut();
    let sequence = arena.new_sequence(NodeOrigin::Computed);
    for value in values {
        let item = arena.alloc(value, NodeOrigin::Computed);
        arena.push_item(sequence, item);
    }
    source.derive(sequence)
}

/// A computed sequence holding deep copies of `items`.
pub(crate) fn sequence_of_copies(
    nav: &mut TreeNavigator<'_>,
    source: &CandidateNode,
    items: &[NodeId],
) -> CandidateNode {
    let arena = nav.arena_mut();
    let sequence = arena.new_sequence(NodeOrigin::Computed);
    for item in items {
        let copy = arena.clone_subtree(*item, NodeOrigin::Computed);
        arena.push_item(sequence, copy);
    }
    source.derive(sequence)
}

/// Elements of a sequence candidate, or an `InvalidArgument` error for `function`.
pub(crate) fn sequence_items(
    nav: &TreeNavigator<'_>,
    function: &str,
    candidate: &CandidateNode,
) -> EvalResult<Vec<NodeId>> {
    match nav.value(candidate) {
        YamlValue::Sequence(items) => Ok(items.clone()),
        other => Err(EvaluationError::invalid_argument(
            function,
            format!("expected a sequence, got {}", other.kind_name()),
        )),
    }
}

/// First string produced by `arg` for `candidate`, for functions taking a
/// string parameter.
pub(crate) fn string_argument(
    nav: &mut TreeNavigator<'_>,
    function: &str,
    candidate: &CandidateNode,
    arg: &OperatorNode,
) -> EvalResult<String> {
    let results = nav.evaluate_one(candidate, arg)?;
    let first = results
        .first()
        .ok_or_else(|| EvaluationError::invalid_argument(function, "argument produced no value"))?;
    match nav.value(first) {
        YamlValue::String(s) => Ok(s.clone()),
        other => Err(EvaluationError::invalid_argument(
            function,
            format!("expected a string argument, got {}", other.kind_name()),
        )),
    }
}
