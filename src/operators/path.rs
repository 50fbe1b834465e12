//! Path operators: identity, selectors, computed lookups, slices, splat and
//! recursive descent.

use super::{Operator, OperatorRegistry};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeId, YamlNumber, YamlValue};
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::{KindTag, OperatorKind, OperatorNode, SelectorKey};
use crate::navigator::{MissingKeyPolicy, TreeNavigator};
use indexmap::IndexMap;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_kind(KindTag::Identity, IdentityOperator);
    registry.register_kind(KindTag::Selector, SelectorOperator);
    registry.register_kind(KindTag::Lookup, LookupOperator);
    registry.register_kind(KindTag::Slice, SliceOperator);
    registry.register_kind(KindTag::Splat, SplatOperator);
    registry.register_kind(KindTag::RecurseDescend, RecurseOperator);
}

/// `.`
pub struct IdentityOperator;

impl Operator for IdentityOperator {
    fn evaluate(
        &self,
        _nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        _node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        Ok(input.to_vec())
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// `.key`, `.[index]`
pub struct SelectorOperator;

impl Operator for SelectorOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let OperatorKind::Selector { key, optional } = &node.kind else {
            return Ok(Vec::new());
        };
        let mut results = Vec::new();
        for candidate in input {
            results.extend(select_child(nav, candidate, key, *optional)?);
        }
        Ok(results)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// `.[expr]`: the key expression is evaluated against each candidate.
pub struct LookupOperator;

impl Operator for LookupOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let key_expr = node.lhs()?;
        let mut results = Vec::new();
        for candidate in input {
            for key in nav.evaluate_one(candidate, key_expr)? {
                let selector = match nav.value(&key) {
                    YamlValue::String(s) => SelectorKey::Key(s.clone()),
                    YamlValue::Number(YamlNumber::Integer(i)) => SelectorKey::Index(*i),
                    other => {
                        return Err(EvaluationError::TypeMismatch {
                            operation: "index",
                            lhs: nav.value(candidate).kind_name(),
                            rhs: other.kind_name(),
                        })
                    }
                };
                results.extend(select_child(nav, candidate, &selector, false)?);
            }
        }
        Ok(results)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// Child of `candidate` under `key`, honouring the missing-key policy and
/// creating the child when the navigator is resolving an assignment target.
pub fn select_child(
    nav: &mut TreeNavigator<'_>,
    candidate: &CandidateNode,
    key: &SelectorKey,
    optional: bool,
) -> EvalResult<Option<CandidateNode>> {
    let container = nav.arena().resolve(candidate.node);

    if nav.auto_create() && matches!(nav.arena().value(container), YamlValue::Null) {
        let empty = match key {
            SelectorKey::Key(_) => YamlValue::Mapping(IndexMap::new()),
            SelectorKey::Index(_) => YamlValue::Sequence(Vec::new()),
        };
        nav.arena_mut().replace_value(container, empty);
    }

    let found = match (nav.arena().value(container), key) {
        (YamlValue::Mapping(_), SelectorKey::Key(k)) => nav.arena().child_by_key(container, k),
        (YamlValue::Mapping(_), SelectorKey::Index(i)) => {
            nav.arena().child_by_key(container, &i.to_string())
        }
        (YamlValue::Sequence(_), SelectorKey::Index(i)) => {
            nav.arena().child_by_index(container, *i)
        }
        (YamlValue::Sequence(_), SelectorKey::Key(_)) => None,
        _ => return Ok(None),
    };
    if let Some(child) = found {
        return Ok(Some(candidate.derive(child)));
    }

    if nav.auto_create() {
        if let Some(child) = create_child(nav, container, key)? {
            return Ok(Some(candidate.derive(child)));
        }
    }

    match nav.options().missing_key {
        MissingKeyPolicy::Skip => Ok(None),
        MissingKeyPolicy::Null => Ok(Some(nav.computed(candidate, YamlValue::Null))),
        MissingKeyPolicy::Error if optional => Ok(None),
        MissingKeyPolicy::Error => Err(EvaluationError::MissingKey {
            key: key.to_string(),
        }),
    }
}

/// Most nulls an assignment may append to reach the index it names.
pub const MAX_SEQUENCE_PADDING: usize = 100_000;

/// Inserts a null child under `key`; sequences are padded with nulls up to a
/// non-negative index.
///
/// # Errors
///
/// [`EvaluationError::InvalidArgument`] when padding would exceed
/// [`MAX_SEQUENCE_PADDING`].
fn create_child(
    nav: &mut TreeNavigator<'_>,
    container: NodeId,
    key: &SelectorKey,
) -> EvalResult<Option<NodeId>> {
    let origin = nav.arena().origin(container);
    let arena = nav.arena_mut();
    match (arena.value(container).is_mapping(), key) {
        (true, SelectorKey::Key(k)) => {
            let child = arena.alloc(YamlValue::Null, origin);
            arena.insert_key(container, k, child);
            Ok(Some(child))
        }
        (true, SelectorKey::Index(i)) => {
            let child = arena.alloc(YamlValue::Null, origin);
            arena.insert_key(container, &i.to_string(), child);
            Ok(Some(child))
        }
        (false, SelectorKey::Index(i)) if *i >= 0 => {
            let len = match arena.value(container) {
                YamlValue::Sequence(items) => items.len(),
                _ => 0,
            };
            let missing = usize::try_from(*i)
                .ok()
                .and_then(|wanted| wanted.checked_sub(len))
                .map(|gap| gap.saturating_add(1))
                .unwrap_or(0);
            if missing > MAX_SEQUENCE_PADDING {
                return Err(EvaluationError::invalid_argument(
                    "assignment",
                    format!(
                        "index {} would pad a sequence of {} items by more than {} entries",
                        i, len, MAX_SEQUENCE_PADDING
                    ),
                ));
            }
            let mut last = None;
            for _ in 0..missing {
                let child = arena.alloc(YamlValue::Null, origin);
                arena.push_item(container, child);
                last = Some(child);
            }
            Ok(last)
        }
        _ => Ok(None),
    }
}

/// `.[start:end]` over sequences and strings.
pub struct SliceOperator;

impl Operator for SliceOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let OperatorKind::Slice(start, end) = node.kind else {
            return Ok(Vec::new());
        };
        let mut results = Vec::new();
        for candidate in input {
            match nav.value(candidate) {
                YamlValue::Sequence(items) => {
                    let (from, to) = slice_bounds(items.len(), start, end);
                    let picked: Vec<NodeId> = items[from..to].to_vec();
                    results.extend(picked.into_iter().map(|id| candidate.derive(id)));
                }
                YamlValue::String(s) => {
                    let chars: Vec<char> = s.chars().collect();
                    let (from, to) = slice_bounds(chars.len(), start, end);
                    let sliced: String = chars[from..to].iter().collect();
                    results.push(nav.computed(candidate, YamlValue::String(sliced)));
                }
                _ => {}
            }
        }
        Ok(results)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// Normalizes half-open slice bounds against `len`; negative bounds count from
/// the end and the result never runs backwards.
pub fn slice_bounds(len: usize, start: Option<i64>, end: Option<i64>) -> (usize, usize) {
    let len = len as i64;
    let clamp = |bound: i64| -> usize {
        let absolute = if bound < 0 { len + bound } else { bound };
        absolute.clamp(0, len) as usize
    };
    let from = start.map_or(0, clamp);
    let to = end.map_or(len as usize, clamp);
    (from, to.max(from))
}

/// `.[]`
pub struct SplatOperator;

impl Operator for SplatOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        _node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let mut results = Vec::new();
        for candidate in input {
            let children = nav.arena().all_children(candidate.node);
            results.extend(children.into_iter().map(|child| candidate.derive(child)));
        }
        Ok(results)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

/// `..`: each candidate followed by all of its descendants, depth first. Aliases
/// are emitted but not entered.
pub struct RecurseOperator;

impl Operator for RecurseOperator {
    fn evaluate(
        &self,
        nav: &mut TreeNavigator<'_>,
        input: &[CandidateNode],
        _node: &OperatorNode,
    ) -> EvalResult<CandidateSequence> {
        let mut results = Vec::new();
        for candidate in input {
            let mut stack = vec![candidate.node];
            while let Some(id) = stack.pop() {
                results.push(candidate.derive(id));
                let children = nav.arena().value(id).child_ids();
                stack.extend(children.into_iter().rev());
            }
        }
        Ok(results)
    }

    fn addresses_input(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;
    use crate::document::tree::DocumentArena;
    use crate::expression::compile;
    use crate::navigator::NavigatorOptions;
    use pretty_assertions::assert_eq;

    fn eval_strings(yaml: &str, expression: &str) -> Vec<String> {
        let mut arena = DocumentArena::new();
        let roots = parse_documents(yaml, "test.yml", 0, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let ast = compile(expression).unwrap();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        let results = nav.evaluate(&roots, &ast).unwrap();
        results
            .iter()
            .map(|c| match nav.value(c) {
                YamlValue::String(s) => s.clone(),
                YamlValue::Number(n) => n.to_string(),
                other => other.kind_name().to_string(),
            })
            .collect()
    }

    #[test]
    fn test_selectors() {
        let yaml = "store:\n  book:\n    - title: A\n    - title: B\n";
        assert_eq!(eval_strings(yaml, ".store.book[0].title"), vec!["A"]);
        assert_eq!(eval_strings(yaml, ".store.book[-1].title"), vec!["B"]);
        assert_eq!(eval_strings(yaml, ".store.book[5]"), Vec::<String>::new());
        assert_eq!(eval_strings(yaml, ".store.missing"), Vec::<String>::new());
    }

    #[test]
    fn test_selector_on_scalar_emits_nothing() {
        assert!(eval_strings("a: 1\n", ".a.b").is_empty());
    }

    #[test]
    fn test_numeric_mapping_key() {
        assert_eq!(eval_strings("\"0\": zero\n", ".[0]"), vec!["zero"]);
    }

    #[test]
    fn test_lookup() {
        let yaml = "k: name\nname: found\n";
        assert_eq!(eval_strings(yaml, ".[.k]"), vec!["found"]);
    }

    #[test]
    fn test_splat_order() {
        assert_eq!(eval_strings("b: 2\na: 1\n", ".[]"), vec!["2", "1"]);
        assert!(eval_strings("5\n", ".[]").is_empty());
    }

    #[test]
    fn test_slice() {
        assert_eq!(eval_strings("[1, 2, 3, 4]\n", ".[1:3]"), vec!["2", "3"]);
        assert_eq!(eval_strings("[1, 2, 3, 4]\n", ".[-2:]"), vec!["3", "4"]);
        assert_eq!(eval_strings("hello\n", ".[1:3]"), vec!["el"]);
        assert!(eval_strings("[1, 2]\n", ".[3:1]").is_empty());
    }

    #[test]
    fn test_slice_bounds() {
        assert_eq!(slice_bounds(5, None, None), (0, 5));
        assert_eq!(slice_bounds(5, Some(-10), Some(2)), (0, 2));
        assert_eq!(slice_bounds(5, Some(4), Some(1)), (4, 4));
    }

    #[test]
    fn test_recursive_descent_is_preorder() {
        let found = eval_strings("a:\n  b: 1\nc: [2]\n", "..");
        assert_eq!(found, vec!["mapping", "mapping", "1", "sequence", "2"]);
    }

    #[test]
    fn test_recursive_descent_does_not_enter_aliases() {
        let yaml = "base: &b\n  x: 1\nref: *b\n";
        let found = eval_strings(yaml, "..");
        assert_eq!(found, vec!["mapping", "mapping", "1", "mapping"]);
    }
}
