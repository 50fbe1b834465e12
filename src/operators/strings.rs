//! String functions and encoders.

use super::arithmetic::split_string;
use super::collect::scalar_key;
use super::{
    computed_sequence, map_scalars, sequence_items, string_argument, BuiltinFunction,
    OperatorRegistry,
};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeOrigin, YamlValue};
use crate::document::parser::parse_documents;
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::OperatorNode;
use crate::file::printer::{render_yaml, to_json_value, PrintOptions};
use crate::navigator::TreeNavigator;
use regex::Regex;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_function(BuiltinFunction::new("ascii_downcase", 0, ascii_downcase));
    registry.register_function(BuiltinFunction::new("ascii_upcase", 0, ascii_upcase));
    registry.register_function(BuiltinFunction::new("split", 1, split));
    registry.register_function(BuiltinFunction::new("join", 1, join));
    registry.register_function(BuiltinFunction::new("test", 1, regex_test));
    registry.register_function(BuiltinFunction::new("startswith", 1, startswith));
    registry.register_function(BuiltinFunction::new("endswith", 1, endswith));
    registry.register_function(BuiltinFunction::new("to_json", 0, to_json));
    registry.register_function(BuiltinFunction::new("to_yaml", 0, to_yaml));
    registry.register_function(BuiltinFunction::new("from_yaml", 0, from_yaml));
}

fn input_string(
    nav: &TreeNavigator<'_>,
    function: &str,
    candidate: &CandidateNode,
) -> EvalResult<String> {
    match nav.value(candidate) {
        YamlValue::String(s) => Ok(s.clone()),
        other => Err(EvaluationError::invalid_argument(
            function,
            format!("expected a string, got {}", other.kind_name()),
        )),
    }
}

fn ascii_downcase(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        let text = input_string(nav, "ascii_downcase", candidate)?;
        Ok(YamlValue::String(text.to_ascii_lowercase()))
    })
}

fn ascii_upcase(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        let text = input_string(nav, "ascii_upcase", candidate)?;
        Ok(YamlValue::String(text.to_ascii_uppercase()))
    })
}

fn split(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let text = input_string(nav, "split", candidate)?;
        let separator = string_argument(nav, "split", candidate, args[0])?;
        let parts = split_string(&text, &separator)
            .into_iter()
            .map(YamlValue::String)
            .collect();
        results.push(computed_sequence(nav, candidate, parts));
    }
    Ok(results)
}

fn join(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let separator_expr = args[0];
    map_scalars(nav, input, |nav, candidate| {
        let separator = string_argument(nav, "join", candidate, separator_expr)?;
        let items = sequence_items(nav, "join", candidate)?;
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            let part = match nav.arena().resolved_value(item) {
                YamlValue::Null => String::new(),
                other => scalar_key(other).ok_or_else(|| {
                    EvaluationError::invalid_argument(
                        "join",
                        format!("cannot join a {}", other.kind_name()),
                    )
                })?,
            };
            parts.push(part);
        }
        Ok(YamlValue::String(parts.join(&separator)))
    })
}

fn regex_test(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let pattern_expr = args[0];
    map_scalars(nav, input, |nav, candidate| {
        let text = input_string(nav, "test", candidate)?;
        let pattern = string_argument(nav, "test", candidate, pattern_expr)?;
        let regex = Regex::new(&pattern)
            .map_err(|err| EvaluationError::invalid_argument("test", err.to_string()))?;
        Ok(YamlValue::Boolean(regex.is_match(&text)))
    })
}

fn startswith(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let prefix_expr = args[0];
    map_scalars(nav, input, |nav, candidate| {
        let text = input_string(nav, "startswith", candidate)?;
        let prefix = string_argument(nav, "startswith", candidate, prefix_expr)?;
        Ok(YamlValue::Boolean(text.starts_with(&prefix)))
    })
}

fn endswith(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let suffix_expr = args[0];
    map_scalars(nav, input, |nav, candidate| {
        let text = input_string(nav, "endswith", candidate)?;
        let suffix = string_argument(nav, "endswith", candidate, suffix_expr)?;
        Ok(YamlValue::Boolean(text.ends_with(&suffix)))
    })
}

fn to_json(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        Ok(YamlValue::String(
            to_json_value(nav.arena(), candidate.node).to_string(),
        ))
    })
}

fn to_yaml(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let options = PrintOptions {
        unwrap_scalars: false,
        ..PrintOptions::default()
    };
    map_scalars(nav, input, |nav, candidate| {
        Ok(YamlValue::String(render_yaml(
            nav.arena(),
            candidate.node,
            &options,
        )))
    })
}

/// Parses a string as YAML; the first document becomes a computed node.
fn from_yaml(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let text = input_string(nav, "from_yaml", candidate)?;
        let arena = nav.arena_mut();
        let roots = parse_documents(&text, &candidate.source_id, candidate.document_index, arena)
            .map_err(|err| EvaluationError::invalid_argument("from_yaml", err.message))?;
        let parsed = match roots.first() {
            Some(root) => arena.clone_subtree(root.node, NodeOrigin::Computed),
            None => arena.alloc(YamlValue::Null, NodeOrigin::Computed),
        };
        results.push(candidate.derive(parsed));
    }
    Ok(results)
}
