//! Literals and collection constructors: `1`, `"s"`, `[e]`, `{k: v}`.

use super::{Operator, OperatorRegistry};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeId, NodeOrigin, YamlValue};
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::{KindTag, OperatorKind, OperatorNode};
use crate::navigator::TreeNavigator;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_kind(KindTag::Literal, LiteralOperator);
    registry.register_kind(KindTag::Collect, CollectOperator);
    registry.register_kind(KindTag::CollectObject, CollectObjectOperator);
    registry.register_kind(KindTag::ObjectEntry, CollectObjectOperator);
}

/// String form of a scalar used as a mapping key; `None` for collections.
pub(crate) fn scalar_key(value: &YamlValue) -> Option<String> {
    match value {
        YamlValue::String(s) => Some(s.clone()),
        YamlValue::Number(n) => Some(n.to_string()),
        YamlValue::Boolean(b) => Some(b.to_string()),
        YamlValue::Null => Some("null".to_string()),
        _ => None,
    }
}

/// One computed scalar per input candidate.
pub struct LiteralOperator;

impl Operator for LiteralOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let OperatorKind::Literal(scalar) = &node.kind else {
            return Ok(Vec::new());
        };
        Ok(input
            .iter()
            .map(|candidate| nav.computed(candidate, scalar.clone().into()))
            .collect())
    }
}

/// `[e]`: a single sequence holding copies of every result of `e` over the
/// whole input.
pub struct CollectOperator;

impl Operator for CollectOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let items = match node.lhs.as_deref() {
            Some(inner) => nav.evaluate_value(input, inner)?,
            None => Vec::new(),
        };
        let sequence = nav.arena_mut().new_sequence(NodeOrigin::Computed);
        for item in &items {
            let copy = nav
                .arena_mut()
                .clone_subtree(item.node, NodeOrigin::Computed);
            nav.arena_mut().push_item(sequence, copy);
        }
        let collected = match input.first() {
            Some(first) => first.derive(sequence),
            None => CandidateNode::new(0, "", sequence),
        };
        Ok(vec![collected])
    }
}

/// `{k: v, ...}`: one mapping per combination of key and value results,
/// built separately for each input candidate.
pub struct CollectObjectOperator;

impl Operator for CollectObjectOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let entries = match node.kind {
            OperatorKind::ObjectEntry => vec![node],
            _ => node.arguments(),
        };
        let mut results = Vec::new();
        for candidate in input {
            let mut partial: Vec<Vec<(String, NodeId)>> = vec![Vec::new()];
            for entry in &entries {
                let keys = nav.evaluate_one(candidate, entry.lhs()?)?;
                let values = nav.evaluate_one(candidate, entry.rhs()?)?;
                let mut next = Vec::with_capacity(partial.len() * keys.len() * values.len());
                for prefix in &partial {
                    for key in &keys {
                        let name = scalar_key(nav.value(key)).ok_or_else(|| {
                            EvaluationError::invalid_argument(
                                "object",
                                format!("keys must be scalars, got {}", nav.value(key).kind_name()),
                            )
                        })?;
                        for value in &values {
                            let mut combination = prefix.clone();
                            combination.push((name.clone(), value.node));
                            next.push(combination);
                        }
                    }
                }
                partial = next;
            }

            for combination in partial {
                let arena = nav.arena_mut();
                let mapping = arena.new_mapping(NodeOrigin::Computed);
                for (key, value) in combination {
                    let copy = arena.clone_subtree(value, NodeOrigin::Computed);
                    arena.insert_key(mapping, &key, copy);
                }
                results.push(candidate.derive(mapping));
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;
    use crate::document::tree::DocumentArena;
    use crate::expression::compile;
    use crate::file::printer::to_json_value;
    use crate::navigator::NavigatorOptions;

    fn eval_json(yaml: &str, expression: &str) -> Vec<String> {
        let mut arena = DocumentArena::new();
        let roots = parse_documents(yaml, "test.yml", 0, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let ast = compile(expression).unwrap();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        let results = nav.evaluate(&roots, &ast).unwrap();
        results
            .iter()
            .map(|c| to_json_value(nav.arena(), c.node).to_string())
            .collect()
    }

    #[test]
    fn test_literals() {
        assert_eq!(
            eval_json("a: 1\n", "\"x\", 2, 2.5, true, null"),
            vec!["\"x\"", "2", "2.5", "true", "null"]
        );
    }

    #[test]
    fn test_collect() {
        let yaml = "items: [{n: 1}, {n: 2}]\n";
        assert_eq!(eval_json(yaml, "[.items[] | .n]"), vec!["[1,2]"]);
        assert_eq!(eval_json(yaml, "[]"), vec!["[]"]);
        assert_eq!(eval_json(yaml, "[.missing]"), vec!["[]"]);
    }

    #[test]
    fn test_collect_copies_values() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("a: 1\n", "test.yml", 0, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        let collected = nav.evaluate(&roots, &compile("[.a]").unwrap()).unwrap();
        let element = nav.arena().child_by_index(collected[0].node, 0).unwrap();
        let original = nav.arena().child_by_key(roots[0].node, "a").unwrap();
        assert_ne!(element, original);
        assert_eq!(collected[0].document_index, 0);
    }

    #[test]
    fn test_objects() {
        let yaml = "name: app\nports: [80, 443]\n";
        assert_eq!(
            eval_json(yaml, "{n: .name, \"kind\": \"svc\"}"),
            vec![r#"{"n":"app","kind":"svc"}"#]
        );
        assert_eq!(eval_json(yaml, "{name}"), vec![r#"{"name":"app"}"#]);
        assert_eq!(
            eval_json(yaml, "{(.name): 1}"),
            vec![r#"{"app":1}"#]
        );
        assert_eq!(eval_json(yaml, "{}"), vec!["{}"]);
    }

    #[test]
    fn test_object_cartesian_product() {
        let yaml = "name: app\nports: [80, 443]\n";
        assert_eq!(
            eval_json(yaml, "{name, port: .ports[]}"),
            vec![
                r#"{"name":"app","port":80}"#,
                r#"{"name":"app","port":443}"#
            ]
        );
    }

    #[test]
    fn test_object_key_must_be_scalar() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("a: [1]\n", "test.yml", 0, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        let err = nav
            .evaluate(&roots, &compile("{(.a): 1}").unwrap())
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidArgument { .. }));
    }
}
