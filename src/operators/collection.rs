//! Functions over sequences and mappings: mapping, entries, ordering,
//! reducers, deletion and `slurp`.

use super::collect::scalar_key;
use super::logic::compare_nodes;
use super::{
    is_truthy, sequence_items, sequence_of_copies, BuiltinFunction, OperatorRegistry,
};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeId, NodeOrigin, YamlNumber, YamlValue};
use crate::document::tree::{DocumentArena, PathKey};
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::OperatorNode;
use crate::navigator::TreeNavigator;
use std::cmp::Ordering;

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_function(BuiltinFunction::new("map", 1, map));
    registry.register_function(BuiltinFunction::new("map_values", 1, map_values));
    registry.register_function(BuiltinFunction::new("to_entries", 0, to_entries));
    registry.register_function(BuiltinFunction::new("from_entries", 0, from_entries));
    registry.register_function(BuiltinFunction::new("with_entries", 1, with_entries));
    registry.register_function(BuiltinFunction::new("sort", 0, sort));
    registry.register_function(BuiltinFunction::new("sort_by", 1, sort_by));
    registry.register_function(BuiltinFunction::new("unique", 0, unique));
    registry.register_function(BuiltinFunction::new("unique_by", 1, unique_by));
    registry.register_function(BuiltinFunction::new("group_by", 1, group_by));
    registry.register_function(BuiltinFunction::new("reverse", 0, reverse));
    registry.register_function(BuiltinFunction::new("min", 0, min));
    registry.register_function(BuiltinFunction::new("max", 0, max));
    registry.register_function(BuiltinFunction::new("first", 0, first).addressing());
    registry.register_function(BuiltinFunction::new("last", 0, last).addressing());
    registry.register_function(BuiltinFunction::new("any", 0, any));
    registry.register_function(BuiltinFunction::new("all", 0, all));
    registry.register_function(BuiltinFunction::new("del", 1, del));
    registry.register_function(BuiltinFunction::new("slurp", 0, slurp).across_documents());
}

/// Children of a mapping or sequence candidate as candidates.
fn children(nav: &TreeNavigator<'_>, candidate: &CandidateNode) -> Vec<CandidateNode> {
    nav.arena()
        .all_children(candidate.node)
        .into_iter()
        .map(|child| candidate.derive(child))
        .collect()
}

/// `[.[] | f]`
fn map(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let mut mapped = Vec::new();
        for child in children(nav, candidate) {
            mapped.extend(nav.evaluate_one(&child, args[0])?.into_iter().map(|c| c.node));
        }
        results.push(sequence_of_copies(nav, candidate, &mapped));
    }
    Ok(results)
}

/// `.[] |= f`, in place.
fn map_values(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    for candidate in input {
        for child in children(nav, candidate) {
            if let Some(value) = nav.evaluate_one(&child, args[0])?.first() {
                nav.arena_mut().set_value(child.node, value.node);
            }
        }
    }
    Ok(input.to_vec())
}

fn entries_node(arena: &mut DocumentArena, id: NodeId) -> NodeId {
    let sequence = arena.new_sequence(NodeOrigin::Computed);
    for (key, child) in arena.entries(id) {
        let key_value = match key {
            PathKey::Key(k) => YamlValue::String(k),
            PathKey::Index(i) => YamlValue::Number(YamlNumber::Integer(i as i64)),
        };
        let entry = arena.new_mapping(NodeOrigin::Computed);
        let key_node = arena.alloc(key_value, NodeOrigin::Computed);
        let value_node = arena.clone_subtree(child, NodeOrigin::Computed);
        arena.insert_key(entry, "key", key_node);
        arena.insert_key(entry, "value", value_node);
        arena.push_item(sequence, entry);
    }
    sequence
}

fn from_entries_node(arena: &mut DocumentArena, entries: &[NodeId]) -> EvalResult<NodeId> {
    let mapping = arena.new_mapping(NodeOrigin::Computed);
    for entry in entries {
        let key = ["key", "k", "name"]
            .iter()
            .find_map(|field| arena.child_by_key(*entry, field))
            .ok_or_else(|| {
                EvaluationError::invalid_argument("from_entries", "entry has no key field")
            })?;
        let name = scalar_key(arena.resolved_value(key)).ok_or_else(|| {
            EvaluationError::invalid_argument("from_entries", "entry key must be a scalar")
        })?;
        let value = match ["value", "v"]
            .iter()
            .find_map(|field| arena.child_by_key(*entry, field))
        {
            Some(value) => arena.clone_subtree(value, NodeOrigin::Computed),
            None => arena.alloc(YamlValue::Null, NodeOrigin::Computed),
        };
        arena.insert_key(mapping, &name, value);
    }
    Ok(mapping)
}

fn require_collection(
    nav: &TreeNavigator<'_>,
    function: &str,
    candidate: &CandidateNode,
) -> EvalResult<()> {
    if nav.value(candidate).is_collection() {
        Ok(())
    } else {
        Err(EvaluationError::invalid_argument(
            function,
            format!("expected a mapping or sequence, got {}", nav.value(candidate).kind_name()),
        ))
    }
}

fn to_entries(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        require_collection(nav, "to_entries", candidate)?;
        let entries = entries_node(nav.arena_mut(), candidate.node);
        results.push(candidate.derive(entries));
    }
    Ok(results)
}

fn from_entries(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let items = sequence_items(nav, "from_entries", candidate)?;
        let mapping = from_entries_node(nav.arena_mut(), &items)?;
        results.push(candidate.derive(mapping));
    }
    Ok(results)
}

/// `to_entries | map(f) | from_entries`
fn with_entries(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        require_collection(nav, "with_entries", candidate)?;
        let entries = entries_node(nav.arena_mut(), candidate.node);
        let mut mapped = Vec::new();
        for entry in nav.arena().all_children(entries) {
            let entry = candidate.derive(entry);
            mapped.extend(nav.evaluate_one(&entry, args[0])?.into_iter().map(|c| c.node));
        }
        let mapping = from_entries_node(nav.arena_mut(), &mapped)?;
        results.push(candidate.derive(mapping));
    }
    Ok(results)
}

/// Sort key of each element: every result of `f` for it.
fn keyed_items(
    nav: &mut TreeNavigator<'_>,
    function: &str,
    candidate: &CandidateNode,
    f: &OperatorNode,
) -> EvalResult<Vec<(NodeId, Vec<NodeId>)>> {
    let items = sequence_items(nav, function, candidate)?;
    let mut keyed = Vec::with_capacity(items.len());
    for item in items {
        let key = nav
            .evaluate_one(&candidate.derive(item), f)?
            .into_iter()
            .map(|c| c.node)
            .collect();
        keyed.push((item, key));
    }
    Ok(keyed)
}

fn compare_keys(arena: &DocumentArena, a: &[NodeId], b: &[NodeId]) -> Ordering {
    for (x, y) in a.iter().zip(b) {
        let ordering = compare_nodes(arena, *x, *y);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    a.len().cmp(&b.len())
}

/// Stable sort of the elements by their keys.
fn sorted_by_key(
    nav: &mut TreeNavigator<'_>,
    function: &str,
    candidate: &CandidateNode,
    f: Option<&OperatorNode>,
) -> EvalResult<Vec<(NodeId, Vec<NodeId>)>> {
    let mut keyed = match f {
        Some(f) => keyed_items(nav, function, candidate, f)?,
        None => sequence_items(nav, function, candidate)?
            .into_iter()
            .map(|item| (item, vec![item]))
            .collect(),
    };
    let arena = nav.arena();
    keyed.sort_by(|(_, a), (_, b)| compare_keys(arena, a, b));
    Ok(keyed)
}

/// Runs of elements with equal keys, in key order.
fn grouped(
    nav: &mut TreeNavigator<'_>,
    function: &str,
    candidate: &CandidateNode,
    f: Option<&OperatorNode>,
) -> EvalResult<Vec<Vec<NodeId>>> {
    let sorted = sorted_by_key(nav, function, candidate, f)?;
    let arena = nav.arena();
    let mut groups: Vec<(Vec<NodeId>, Vec<NodeId>)> = Vec::new();
    for (item, key) in sorted {
        let same = groups
            .last()
            .is_some_and(|(group_key, _)| compare_keys(arena, group_key, &key) == Ordering::Equal);
        match groups.last_mut() {
            Some((_, members)) if same => members.push(item),
            _ => groups.push((key, vec![item])),
        }
    }
    Ok(groups.into_iter().map(|(_, members)| members).collect())
}

fn sort(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    sort_impl(nav, input, "sort", None)
}

fn sort_by(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    sort_impl(nav, input, "sort_by", Some(args[0]))
}

fn sort_impl(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    function: &str,
    f: Option<&OperatorNode>,
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let sorted: Vec<NodeId> = sorted_by_key(nav, function, candidate, f)?
            .into_iter()
            .map(|(item, _)| item)
            .collect();
        results.push(sequence_of_copies(nav, candidate, &sorted));
    }
    Ok(results)
}

fn unique(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    unique_impl(nav, input, "unique", None)
}

fn unique_by(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    unique_impl(nav, input, "unique_by", Some(args[0]))
}

/// First element of each group of equal keys, in key order.
fn unique_impl(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    function: &str,
    f: Option<&OperatorNode>,
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let firsts: Vec<NodeId> = grouped(nav, function, candidate, f)?
            .into_iter()
            .filter_map(|group| group.first().copied())
            .collect();
        results.push(sequence_of_copies(nav, candidate, &firsts));
    }
    Ok(results)
}

fn group_by(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let groups = grouped(nav, "group_by", candidate, Some(args[0]))?;
        let arena = nav.arena_mut();
        let outer = arena.new_sequence(NodeOrigin::Computed);
        for group in groups {
            let inner = arena.new_sequence(NodeOrigin::Computed);
            for item in group {
                let copy = arena.clone_subtree(item, NodeOrigin::Computed);
                arena.push_item(inner, copy);
            }
            arena.push_item(outer, inner);
        }
        results.push(candidate.derive(outer));
    }
    Ok(results)
}

fn reverse(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        if let YamlValue::String(s) = nav.value(candidate) {
            let reversed = s.chars().rev().collect();
            results.push(nav.computed(candidate, YamlValue::String(reversed)));
            continue;
        }
        let mut items = sequence_items(nav, "reverse", candidate)?;
        items.reverse();
        results.push(sequence_of_copies(nav, candidate, &items));
    }
    Ok(results)
}

fn extreme(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    function: &str,
    wanted: Ordering,
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let items = sequence_items(nav, function, candidate)?;
        let arena = nav.arena();
        let best = items.into_iter().reduce(|best, item| {
            if compare_nodes(arena, item, best) == wanted {
                item
            } else {
                best
            }
        });
        results.push(match best {
            Some(item) => candidate.derive(item),
            None => nav.computed(candidate, YamlValue::Null),
        });
    }
    Ok(results)
}

fn min(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    extreme(nav, input, "min", Ordering::Less)
}

fn max(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    extreme(nav, input, "max", Ordering::Greater)
}

fn first(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::new();
    for candidate in input {
        if let Some(item) = sequence_items(nav, "first", candidate)?.first() {
            results.push(candidate.derive(*item));
        }
    }
    Ok(results)
}

fn last(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::new();
    for candidate in input {
        if let Some(item) = sequence_items(nav, "last", candidate)?.last() {
            results.push(candidate.derive(*item));
        }
    }
    Ok(results)
}

fn any(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    super::map_scalars(nav, input, |nav, candidate| {
        let items = sequence_items(nav, "any", candidate)?;
        let arena = nav.arena();
        Ok(YamlValue::Boolean(
            items.iter().any(|item| is_truthy(arena.resolved_value(*item))),
        ))
    })
}

fn all(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    super::map_scalars(nav, input, |nav, candidate| {
        let items = sequence_items(nav, "all", candidate)?;
        let arena = nav.arena();
        Ok(YamlValue::Boolean(
            items.iter().all(|item| is_truthy(arena.resolved_value(*item))),
        ))
    })
}

/// Removes every node selected by the path argument from its parent and emits
/// the (now smaller) input candidates.
fn del(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    for candidate in input {
        let selected = nav.evaluate_one(candidate, args[0])?;
        let mut removals: Vec<(NodeId, PathKey)> = Vec::new();
        for target in &selected {
            let Some(link) = nav.arena().link(target.node) else {
                continue;
            };
            let removal = (link.parent, link.key.clone());
            if !removals.contains(&removal) {
                removals.push(removal);
            }
        }
        // later sequence indices first, so earlier removals do not shift them
        removals.sort_by(|(pa, ka), (pb, kb)| {
            pa.cmp(pb).then_with(|| match (ka, kb) {
                (PathKey::Index(a), PathKey::Index(b)) => b.cmp(a),
                (PathKey::Key(a), PathKey::Key(b)) => a.cmp(b),
                (PathKey::Key(_), PathKey::Index(_)) => Ordering::Less,
                (PathKey::Index(_), PathKey::Key(_)) => Ordering::Greater,
            })
        });
        for (parent, key) in removals {
            nav.arena_mut().remove_child(parent, &key);
        }
    }
    Ok(input.to_vec())
}

/// Every input candidate of the stream, copied into one sequence.
fn slurp(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let items: Vec<NodeId> = input.iter().map(|c| c.node).collect();
    let source = input
        .first()
        .cloned()
        .unwrap_or_else(|| CandidateNode::new(0, "", NodeId(0)));
    Ok(vec![sequence_of_copies(nav, &source, &items)])
}
