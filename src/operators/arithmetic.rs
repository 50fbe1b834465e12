//! `+ - * / %` over numbers, strings, sequences and mappings.

use super::logic::deep_equal;
use super::{pair_results, Operator, OperatorRegistry};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeId, NodeOrigin, YamlNumber, YamlValue};
use crate::document::tree::DocumentArena;
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::{ArithmeticOp, KindTag, OperatorKind, OperatorNode};
use crate::navigator::TreeNavigator;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_kind(KindTag::Arithmetic, ArithmeticOperator);
}

pub struct ArithmeticOperator;

impl Operator for ArithmeticOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let op = match node.kind {
            OperatorKind::Arithmetic(op) => op,
            _ => ArithmeticOp::Add,
        };
        let (lhs, rhs) = (node.lhs()?, node.rhs()?);
        let mut results = Vec::new();
        for candidate in input {
            let left = nav.evaluate_one(candidate, lhs)?;
            let right = nav.evaluate_one(candidate, rhs)?;
            for (l, r) in pair_results(op.symbol(), left, right)? {
                let id = combine(nav.arena_mut(), op, l.node, r.node)?;
                results.push(candidate.derive(id));
            }
        }
        Ok(results)
    }
}

/// Applies `op` to two nodes and allocates the result as a computed node.
///
/// # Errors
///
/// [`EvaluationError::TypeMismatch`] for unsupported kind pairs and
/// [`EvaluationError::DivisionByZero`].
pub fn combine(
    arena: &mut DocumentArena,
    op: ArithmeticOp,
    left: NodeId,
    right: NodeId,
) -> EvalResult<NodeId> {
    let (l, r) = (arena.resolve(left), arena.resolve(right));
    let value = match (op, arena.value(l), arena.value(r)) {
        (ArithmeticOp::Add, YamlValue::Null, _) => {
            return Ok(arena.clone_subtree(r, NodeOrigin::Computed))
        }
        (ArithmeticOp::Add, _, YamlValue::Null) => {
            return Ok(arena.clone_subtree(l, NodeOrigin::Computed))
        }
        (_, YamlValue::Number(a), YamlValue::Number(b)) => {
            YamlValue::Number(numeric(op, *a, *b)?)
        }
        (ArithmeticOp::Add, YamlValue::String(a), YamlValue::String(b)) => {
            YamlValue::String(format!("{}{}", a, b))
        }
        (ArithmeticOp::Divide, YamlValue::String(a), YamlValue::String(b)) => {
            let parts: Vec<String> = split_string(a, b);
            let sequence = arena.new_sequence(NodeOrigin::Computed);
            for part in parts {
                let item = arena.alloc(YamlValue::String(part), NodeOrigin::Computed);
                arena.push_item(sequence, item);
            }
            return Ok(sequence);
        }
        (ArithmeticOp::Add, YamlValue::Sequence(a), YamlValue::Sequence(b)) => {
            let items: Vec<NodeId> = a.iter().chain(b.iter()).copied().collect();
            return Ok(sequence_of_clones(arena, &items));
        }
        (ArithmeticOp::Subtract, YamlValue::Sequence(a), YamlValue::Sequence(b)) => {
            let (a, b) = (a.clone(), b.clone());
            let kept: Vec<NodeId> = a
                .into_iter()
                .filter(|item| !b.iter().any(|other| deep_equal(arena, *item, *other)))
                .collect();
            return Ok(sequence_of_clones(arena, &kept));
        }
        (ArithmeticOp::Add, YamlValue::Mapping(_), YamlValue::Mapping(_)) => {
            return Ok(shallow_merge(arena, l, r));
        }
        (ArithmeticOp::Multiply, YamlValue::Mapping(_), YamlValue::Mapping(_)) => {
            return Ok(deep_merge(arena, l, r));
        }
        (op, a, b) => {
            return Err(EvaluationError::TypeMismatch {
                operation: op.verb(),
                lhs: a.kind_name(),
                rhs: b.kind_name(),
            })
        }
    };
    Ok(arena.alloc(value, NodeOrigin::Computed))
}

fn numeric(op: ArithmeticOp, a: YamlNumber, b: YamlNumber) -> EvalResult<YamlNumber> {
    use YamlNumber::{Float, Integer};

    if matches!(op, ArithmeticOp::Divide | ArithmeticOp::Modulo) && b.as_f64() == 0.0 {
        return Err(EvaluationError::DivisionByZero);
    }
    let result = match (op, a, b) {
        (ArithmeticOp::Add, Integer(x), Integer(y)) => {
            x.checked_add(y).map_or(Float(x as f64 + y as f64), Integer)
        }
        (ArithmeticOp::Subtract, Integer(x), Integer(y)) => {
            x.checked_sub(y).map_or(Float(x as f64 - y as f64), Integer)
        }
        (ArithmeticOp::Multiply, Integer(x), Integer(y)) => {
            x.checked_mul(y).map_or(Float(x as f64 * y as f64), Integer)
        }
        (ArithmeticOp::Divide, Integer(x), Integer(y)) if x.checked_rem(y) == Some(0) => {
            x.checked_div(y).map_or(Float(x as f64 / y as f64), Integer)
        }
        (ArithmeticOp::Modulo, x, y) => {
            let (x, y) = (truncate(x), truncate(y));
            if y == 0 {
                return Err(EvaluationError::DivisionByZero);
            }
            Integer(x.checked_rem(y).unwrap_or(0))
        }
        (ArithmeticOp::Add, x, y) => Float(x.as_f64() + y.as_f64()),
        (ArithmeticOp::Subtract, x, y) => Float(x.as_f64() - y.as_f64()),
        (ArithmeticOp::Multiply, x, y) => Float(x.as_f64() * y.as_f64()),
        (ArithmeticOp::Divide, x, y) => Float(x.as_f64() / y.as_f64()),
    };
    Ok(result)
}

fn truncate(number: YamlNumber) -> i64 {
    match number {
        YamlNumber::Integer(i) => i,
        YamlNumber::Float(f) => f as i64,
    }
}

pub(crate) fn split_string(text: &str, separator: &str) -> Vec<String> {
    if text.is_empty() {
        Vec::new()
    } else if separator.is_empty() {
        text.chars().map(String::from).collect()
    } else {
        text.split(separator).map(String::from).collect()
    }
}

fn sequence_of_clones(arena: &mut DocumentArena, items: &[NodeId]) -> NodeId {
    let sequence = arena.new_sequence(NodeOrigin::Computed);
    for item in items {
        let copy = arena.clone_subtree(*item, NodeOrigin::Computed);
        arena.push_item(sequence, copy);
    }
    sequence
}

fn mapping_entries(arena: &DocumentArena, id: NodeId) -> Vec<(String, NodeId)> {
    match arena.resolved_value(id) {
        YamlValue::Mapping(entries) => entries.iter().map(|(k, v)| (k.clone(), *v)).collect(),
        _ => Vec::new(),
    }
}

/// Keys of `right` replace those of `left`; new keys are appended.
fn shallow_merge(arena: &mut DocumentArena, left: NodeId, right: NodeId) -> NodeId {
    let merged = arena.new_mapping(NodeOrigin::Computed);
    for (key, child) in mapping_entries(arena, left)
        .into_iter()
        .chain(mapping_entries(arena, right))
    {
        let copy = arena.clone_subtree(child, NodeOrigin::Computed);
        arena.insert_key(merged, &key, copy);
    }
    merged
}

/// Like [`shallow_merge`], but keys holding mappings on both sides are merged
/// recursively.
fn deep_merge(arena: &mut DocumentArena, left: NodeId, right: NodeId) -> NodeId {
    let merged = arena.new_mapping(NodeOrigin::Computed);
    for (key, child) in mapping_entries(arena, left) {
        let copy = arena.clone_subtree(child, NodeOrigin::Computed);
        arena.insert_key(merged, &key, copy);
    }
    for (key, child) in mapping_entries(arena, right) {
        let existing = arena.child_by_key(merged, &key);
        let both_mappings = existing.is_some_and(|e| arena.resolved_value(e).is_mapping())
            && arena.resolved_value(child).is_mapping();
        let value = match existing {
            Some(existing) if both_mappings => deep_merge(arena, existing, child),
            _ => arena.clone_subtree(child, NodeOrigin::Computed),
        };
        arena.insert_key(merged, &key, value);
    }
    merged
}
