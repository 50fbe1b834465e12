//! Comparison and boolean operators, plus the value ordering shared with the
//! sorting functions.
//!
//! Values of different kinds order as
//! `null < false < true < numbers < strings < sequences < mappings`.
//! Integers and floats compare numerically, so `1 == 1.0`.

use super::{is_truthy, pair_results, Operator, OperatorRegistry};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeId, YamlNumber, YamlValue};
use crate::document::tree::DocumentArena;
use crate::error::EvalResult;
use crate::expression::ast::{ComparisonOp, KindTag, LogicalOp, OperatorKind, OperatorNode};
use crate::navigator::TreeNavigator;
use std::cmp::Ordering;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_kind(KindTag::Comparison, ComparisonOperator);
    registry.register_kind(KindTag::Logical, LogicalOperator);
}

fn kind_rank(value: &YamlValue) -> u8 {
    match value {
        YamlValue::Null => 0,
        YamlValue::Boolean(false) => 1,
        YamlValue::Boolean(true) => 2,
        YamlValue::Number(_) => 3,
        YamlValue::String(_) => 4,
        YamlValue::Sequence(_) => 5,
        YamlValue::Mapping(_) => 6,
        // resolved away before ranking
        YamlValue::Alias(_) => 7,
    }
}

fn compare_numbers(a: &YamlNumber, b: &YamlNumber) -> Ordering {
    match (a, b) {
        (YamlNumber::Integer(x), YamlNumber::Integer(y)) => x.cmp(y),
        _ => a
            .as_f64()
            .partial_cmp(&b.as_f64())
            .unwrap_or(Ordering::Equal),
    }
}

/// Total order over two nodes (aliases are followed).
pub fn compare_nodes(arena: &DocumentArena, a: NodeId, b: NodeId) -> Ordering {
    let (left, right) = (arena.resolved_value(a), arena.resolved_value(b));
    let rank = kind_rank(left).cmp(&kind_rank(right));
    if rank != Ordering::Equal {
        return rank;
    }
    match (left, right) {
        (YamlValue::Number(x), YamlValue::Number(y)) => compare_numbers(x, y),
        (YamlValue::String(x), YamlValue::String(y)) => x.cmp(y),
        (YamlValue::Sequence(xs), YamlValue::Sequence(ys)) => {
            for (x, y) in xs.iter().zip(ys) {
                let ordering = compare_nodes(arena, *x, *y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (YamlValue::Mapping(xs), YamlValue::Mapping(ys)) => {
            let mut left_keys: Vec<&String> = xs.keys().collect();
            let mut right_keys: Vec<&String> = ys.keys().collect();
            left_keys.sort();
            right_keys.sort();
            let keys = left_keys.cmp(&right_keys);
            if keys != Ordering::Equal {
                return keys;
            }
            for key in left_keys {
                let ordering = compare_nodes(arena, xs[key], ys[key]);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        }
        _ => Ordering::Equal,
    }
}

/// Structural equality: same kind and same content, key order ignored.
pub fn deep_equal(arena: &DocumentArena, a: NodeId, b: NodeId) -> bool {
    compare_nodes(arena, a, b) == Ordering::Equal
}

/// `==`, `!=`, `<`, `<=`, `>`, `>=`
pub struct ComparisonOperator;

impl Operator for ComparisonOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let op = match node.kind {
            OperatorKind::Comparison(op) => op,
            _ => ComparisonOp::Equal,
        };
        let (lhs, rhs) = (node.lhs()?, node.rhs()?);
        let mut results = Vec::new();
        for candidate in input {
            let left = nav.evaluate_one(candidate, lhs)?;
            let right = nav.evaluate_one(candidate, rhs)?;
            for (l, r) in pair_results(op.symbol(), left, right)? {
                let ordering = compare_nodes(nav.arena(), l.node, r.node);
                let verdict = match op {
                    ComparisonOp::Equal => ordering == Ordering::Equal,
                    ComparisonOp::NotEqual => ordering != Ordering::Equal,
                    ComparisonOp::Less => ordering == Ordering::Less,
                    ComparisonOp::LessOrEqual => ordering != Ordering::Greater,
                    ComparisonOp::Greater => ordering == Ordering::Greater,
                    ComparisonOp::GreaterOrEqual => ordering != Ordering::Less,
                };
                results.push(nav.computed(candidate, YamlValue::Boolean(verdict)));
            }
        }
        Ok(results)
    }
}

/// `and` / `or`. Each left result that already decides the outcome yields it
/// directly; otherwise every right result yields its truthiness.
pub struct LogicalOperator;

impl Operator for LogicalOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let op = match node.kind {
            OperatorKind::Logical(op) => op,
            _ => LogicalOp::And,
        };
        let (lhs, rhs) = (node.lhs()?, node.rhs()?);
        let mut results = Vec::new();
        for candidate in input {
            let mut right: Option<Vec<bool>> = None;
            for l in nav.evaluate_one(candidate, lhs)? {
                let truthy = is_truthy(nav.value(&l));
                let decided = match op {
                    LogicalOp::And if !truthy => Some(false),
                    LogicalOp::Or if truthy => Some(true),
                    _ => None,
                };
                let verdicts = match decided {
                    Some(verdict) => vec![verdict],
                    None => {
                        if right.is_none() {
                            let values = nav.evaluate_one(candidate, rhs)?;
                            right = Some(values.iter().map(|r| is_truthy(nav.value(r))).collect());
                        }
                        right.clone().unwrap_or_default()
                    }
                };
                for verdict in verdicts {
                    results.push(nav.computed(candidate, YamlValue::Boolean(verdict)));
                }
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;
    use crate::error::EvaluationError;
    use crate::expression::compile;
    use crate::navigator::NavigatorOptions;

    fn eval(yaml: &str, expression: &str) -> EvalResult<Vec<YamlValue>> {
        let mut arena = DocumentArena::new();
        let roots = parse_documents(yaml, "test.yml", 0, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let ast = compile(expression).unwrap();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        let results = nav.evaluate(&roots, &ast)?;
        Ok(results.iter().map(|c| nav.value(c).clone()).collect())
    }

    fn bools(values: &[bool]) -> Vec<YamlValue> {
        values.iter().map(|b| YamlValue::Boolean(*b)).collect()
    }

    #[test]
    fn test_scalar_comparisons() {
        let yaml = "n: 3\ns: abc\n";
        assert_eq!(eval(yaml, ".n == 3").unwrap(), bools(&[true]));
        assert_eq!(eval(yaml, ".n == 3.0").unwrap(), bools(&[true]));
        assert_eq!(eval(yaml, ".n != 3").unwrap(), bools(&[false]));
        assert_eq!(eval(yaml, ".n < 10").unwrap(), bools(&[true]));
        assert_eq!(eval(yaml, ".n >= 3").unwrap(), bools(&[true]));
        assert_eq!(eval(yaml, ".s > \"abb\"").unwrap(), bools(&[true]));
        assert_eq!(eval(yaml, ".s == \"abc\"").unwrap(), bools(&[true]));
    }

    #[test]
    fn test_cross_kind_order() {
        assert_eq!(eval("a: 1\n", "null < false").unwrap(), bools(&[true]));
        assert_eq!(eval("a: 1\n", "true < 0").unwrap(), bools(&[true]));
        assert_eq!(eval("a: 1\n", "99 < \"1\"").unwrap(), bools(&[true]));
        assert_eq!(eval("a: 1\n", "\"z\" < []").unwrap(), bools(&[true]));
        assert_eq!(eval("a: 1\n", "[] < {}").unwrap(), bools(&[true]));
    }

    #[test]
    fn test_structural_equality_ignores_key_order() {
        let yaml = "x: {a: 1, b: [1, 2]}\ny: {b: [1, 2], a: 1}\nz: {a: 1, b: [2, 1]}\n";
        assert_eq!(eval(yaml, ".x == .y").unwrap(), bools(&[true]));
        assert_eq!(eval(yaml, ".x == .z").unwrap(), bools(&[false]));
    }

    #[test]
    fn test_comparison_pairs_by_position() {
        let yaml = "items: [1, 5, 9]\n";
        assert_eq!(
            eval(yaml, ".items[] | select(. > 4)").unwrap().len(),
            2
        );
        assert_eq!(
            eval(yaml, "(.items[]) == (1, 4, 9)").unwrap(),
            bools(&[true, false, true])
        );
        assert_eq!(
            eval(yaml, "(1, 2, 3) == 1").unwrap_err(),
            EvaluationError::LengthMismatch {
                operation: "==",
                lhs: 3,
                rhs: 1
            }
        );
        let err = eval(yaml, "(.items[]) == (1, 2)").unwrap_err();
        assert_eq!(
            err,
            EvaluationError::LengthMismatch {
                operation: "==",
                lhs: 3,
                rhs: 2
            }
        );
    }

    #[test]
    fn test_logical_operators() {
        let yaml = "t: true\nf: false\n";
        assert_eq!(eval(yaml, ".t and .f").unwrap(), bools(&[false]));
        assert_eq!(eval(yaml, ".t or .f").unwrap(), bools(&[true]));
        assert_eq!(eval(yaml, ".f and .missing").unwrap(), bools(&[false]));
        assert_eq!(eval(yaml, ".f or null").unwrap(), bools(&[false]));
        assert_eq!(eval(yaml, "(.t, .f) and true").unwrap(), bools(&[true, false]));
    }

    #[test]
    fn test_or_short_circuits_errors() {
        assert_eq!(eval("a: 1\n", "true or frobnicate").unwrap(), bools(&[true]));
    }
}
