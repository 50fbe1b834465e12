//! General-purpose functions: `length`, `keys`, `has`, `not`, `type`, `add`,
//! `to_string`, `to_number`.

use super::arithmetic::combine;
use super::collect::scalar_key;
use super::{
    computed_sequence, is_truthy, map_scalars, sequence_items, BuiltinFunction, OperatorRegistry,
};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeOrigin, YamlNumber, YamlValue};
use crate::document::parser::resolve_plain_scalar;
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::{ArithmeticOp, OperatorNode};
use crate::file::printer::to_json_value;
use crate::navigator::TreeNavigator;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_function(BuiltinFunction::new("length", 0, length));
    registry.register_function(BuiltinFunction::new("keys", 0, keys));
    registry.register_function(BuiltinFunction::new("has", 1, has));
    registry.register_function(BuiltinFunction::new("not", 0, not));
    registry.register_function(BuiltinFunction::new("type", 0, type_tag));
    registry.register_function(BuiltinFunction::new("add", 0, add));
    registry.register_function(BuiltinFunction::new("to_string", 0, to_string));
    registry.register_function(BuiltinFunction::new("to_number", 0, to_number));
}

fn length(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        let count = match nav.value(candidate) {
            YamlValue::Mapping(entries) => entries.len() as i64,
            YamlValue::Sequence(items) => items.len() as i64,
            YamlValue::String(s) => s.chars().count() as i64,
            YamlValue::Null => 0,
            YamlValue::Number(YamlNumber::Integer(i)) => i.saturating_abs(),
            YamlValue::Number(YamlNumber::Float(f)) => {
                return Ok(YamlValue::Number(YamlNumber::Float(f.abs())))
            }
            other => {
                return Err(EvaluationError::invalid_argument(
                    "length",
                    format!("{} has no length", other.kind_name()),
                ))
            }
        };
        Ok(YamlValue::Number(YamlNumber::Integer(count)))
    })
}

fn keys(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let values = match nav.value(candidate) {
            YamlValue::Mapping(entries) => entries
                .keys()
                .map(|k| YamlValue::String(k.clone()))
                .collect(),
            YamlValue::Sequence(items) => (0..items.len() as i64)
                .map(|i| YamlValue::Number(YamlNumber::Integer(i)))
                .collect(),
            other => {
                return Err(EvaluationError::invalid_argument(
                    "keys",
                    format!("{} has no keys", other.kind_name()),
                ))
            }
        };
        results.push(computed_sequence(nav, candidate, values));
    }
    Ok(results)
}

fn has(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let key_expr = args[0];
    map_scalars(nav, input, |nav, candidate| {
        let keys = nav.evaluate_one(candidate, key_expr)?;
        let Some(key) = keys.first() else {
            return Ok(YamlValue::Boolean(false));
        };
        let found = match (nav.value(candidate), nav.value(key)) {
            (YamlValue::Mapping(entries), YamlValue::String(k)) => entries.contains_key(k),
            (YamlValue::Sequence(items), YamlValue::Number(YamlNumber::Integer(i))) => {
                *i >= 0 && (*i as usize) < items.len()
            }
            (container, key) => {
                return Err(EvaluationError::TypeMismatch {
                    operation: "check key of",
                    lhs: container.kind_name(),
                    rhs: key.kind_name(),
                })
            }
        };
        Ok(YamlValue::Boolean(found))
    })
}

fn not(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        Ok(YamlValue::Boolean(!is_truthy(nav.value(candidate))))
    })
}

fn type_tag(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        let arena = nav.arena();
        let tag = arena.get(arena.resolve(candidate.node)).tag().to_string();
        Ok(YamlValue::String(tag))
    })
}

/// Folds `+` over the elements of a sequence; an empty sequence adds up to null.
fn add(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let items = sequence_items(nav, "add", candidate)?;
        let arena = nav.arena_mut();
        let mut total = arena.alloc(YamlValue::Null, NodeOrigin::Computed);
        for item in items {
            total = combine(arena, ArithmeticOp::Add, total, item)?;
        }
        results.push(candidate.derive(total));
    }
    Ok(results)
}

fn to_string(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        let text = match scalar_key(nav.value(candidate)) {
            Some(text) => text,
            None => to_json_value(nav.arena(), candidate.node).to_string(),
        };
        Ok(YamlValue::String(text))
    })
}

fn to_number(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| match nav.value(candidate) {
        YamlValue::Number(n) => Ok(YamlValue::Number(*n)),
        YamlValue::String(s) => match resolve_plain_scalar(s.trim()) {
            YamlValue::Number(n) => Ok(YamlValue::Number(n)),
            _ => Err(EvaluationError::invalid_argument(
                "to_number",
                format!("cannot parse '{}' as a number", s),
            )),
        },
        other => Err(EvaluationError::invalid_argument(
            "to_number",
            format!("cannot convert {} to a number", other.kind_name()),
        )),
    })
}
