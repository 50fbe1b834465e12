//! Provenance and node metadata: `key`, `path`, `parent`, `root`,
//! `document_index`, `filename`, `line`, `column`, the style/tag/anchor/comment
//! accessors and `explode`.
//!
//! The metadata accessors read with no argument and write with one:
//! `.a | style` yields `"double"`, `.a | style("literal")` changes the node in
//! place and yields it. The infix form `.a style= "literal"` is handled by the
//! assignment operator through [`write_metadata`].

use super::{
    computed_sequence, map_scalars, string_argument, BuiltinFunction, OperatorRegistry,
};
use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeId, NodeMetadata, NodeStyle, YamlNumber, YamlValue};
use crate::document::tree::{DocumentArena, PathKey};
use crate::error::{EvalResult, EvaluationError};
use crate::expression::ast::{MetadataField, OperatorNode};
use crate::navigator::TreeNavigator;

/// Upper bound on alias expansions performed by one `explode`.
const MAX_EXPANSIONS: usize = 10_000;

/// Key under which YAML merge entries (`<<: *base`) are written.
const MERGE_KEY: &str = "<<";

pub(super) fn register(registry: &mut OperatorRegistry) {
    registry.register_function(BuiltinFunction::new("key", 0, key));
    registry.register_function(BuiltinFunction::new("path", 0, path));
    registry.register_function(BuiltinFunction::new("parent", 0, parent).addressing());
    registry.register_function(BuiltinFunction::new("root", 0, root).addressing());
    registry.register_function(BuiltinFunction::new("document_index", 0, document_index));
    registry.register_alias("di", BuiltinFunction::new("di", 0, document_index));
    registry.register_function(BuiltinFunction::new("filename", 0, filename));
    registry.register_function(BuiltinFunction::new("line", 0, line));
    registry.register_function(BuiltinFunction::new("column", 0, column));
    registry.register_function(BuiltinFunction::with_range("style", 0, 1, style));
    registry.register_function(BuiltinFunction::with_range("tag", 0, 1, tag));
    registry.register_function(BuiltinFunction::with_range("anchor", 0, 1, anchor));
    registry.register_function(BuiltinFunction::with_range("line_comment", 0, 1, line_comment));
    registry.register_function(BuiltinFunction::with_range("head_comment", 0, 1, head_comment));
    registry.register_function(BuiltinFunction::new("explode", 0, explode));
}

fn path_key_value(key: &PathKey) -> YamlValue {
    match key {
        PathKey::Key(k) => YamlValue::String(k.clone()),
        PathKey::Index(i) => YamlValue::Number(YamlNumber::Integer(*i as i64)),
    }
}

fn key(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        Ok(candidate
            .key(nav.arena())
            .map(path_key_value)
            .unwrap_or(YamlValue::Null))
    })
}

fn path(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    let mut results = Vec::with_capacity(input.len());
    for candidate in input {
        let keys = candidate
            .path(nav.arena())
            .iter()
            .map(path_key_value)
            .collect();
        results.push(computed_sequence(nav, candidate, keys));
    }
    Ok(results)
}

fn parent(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    Ok(input
        .iter()
        .filter_map(|candidate| candidate.parent(nav.arena()))
        .collect())
}

fn root(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    Ok(input
        .iter()
        .map(|candidate| candidate.derive(nav.arena().root_of(candidate.node)))
        .collect())
}

fn document_index(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |_, candidate| {
        Ok(YamlValue::Number(YamlNumber::Integer(
            candidate.document_index as i64,
        )))
    })
}

fn filename(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |_, candidate| {
        Ok(YamlValue::String(candidate.source_id.to_string()))
    })
}

/// 1-based line of the node in its source; 0 for computed nodes.
fn line(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        let line = nav
            .arena()
            .metadata(candidate.node)
            .position
            .map_or(0, |p| p.line);
        Ok(YamlValue::Number(YamlNumber::Integer(line as i64)))
    })
}

/// 1-based column of the node in its source; 0 for computed nodes.
fn column(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    map_scalars(nav, input, |nav, candidate| {
        let column = nav
            .arena()
            .metadata(candidate.node)
            .position
            .map_or(0, |p| p.column + 1);
        Ok(YamlValue::Number(YamlNumber::Integer(column as i64)))
    })
}

/// Reads `field` of a node as a string; unset fields read as `""`, except the
/// tag, which falls back to the default tag of the node's kind.
fn read_metadata(metadata: &NodeMetadata, value: &YamlValue, field: MetadataField) -> String {
    match field {
        MetadataField::Style => metadata.style.as_str().to_string(),
        MetadataField::Tag => metadata
            .tag
            .clone()
            .unwrap_or_else(|| value.default_tag().to_string()),
        MetadataField::Anchor => metadata.anchor.clone().unwrap_or_default(),
        MetadataField::LineComment => metadata.line_comment.clone().unwrap_or_default(),
        MetadataField::HeadComment => metadata.head_comment.clone().unwrap_or_default(),
    }
}

/// Writes `field` of `node` in place. An empty string clears it.
///
/// # Errors
///
/// [`EvaluationError::NotAddressable`] for computed nodes, and
/// [`EvaluationError::InvalidArgument`] for an unknown style or a malformed
/// anchor name.
pub(crate) fn write_metadata(
    arena: &mut DocumentArena,
    node: NodeId,
    field: MetadataField,
    text: String,
) -> EvalResult<()> {
    if !arena.is_addressable(node) {
        tracing::trace!(node = node.index(), field = field.name(), "rejecting metadata write");
        return Err(EvaluationError::NotAddressable {
            operation: "metadata update",
        });
    }
    let metadata = arena.metadata_mut(node);
    match field {
        MetadataField::Style => {
            metadata.style = text
                .parse::<NodeStyle>()
                .map_err(|message| EvaluationError::invalid_argument(field.name(), message))?;
        }
        MetadataField::Tag => metadata.tag = non_empty(text),
        MetadataField::Anchor => {
            if text.chars().any(|c| c.is_whitespace() || "[]{},".contains(c)) {
                return Err(EvaluationError::invalid_argument(
                    field.name(),
                    format!("'{}' is not a valid anchor name", text),
                ));
            }
            metadata.anchor = non_empty(text);
        }
        MetadataField::LineComment => metadata.line_comment = non_empty(text),
        MetadataField::HeadComment => metadata.head_comment = non_empty(text),
    }
    Ok(())
}

/// Shared shape of the metadata functions: read with no argument, write the
/// string the argument evaluates to with one.
fn accessor(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
    field: MetadataField,
) -> EvalResult<CandidateSequence> {
    let Some(value_expr) = args.first() else {
        return map_scalars(nav, input, |nav, candidate| {
            let arena = nav.arena();
            let metadata = arena.metadata(candidate.node);
            let text = read_metadata(metadata, arena.value(candidate.node), field);
            Ok(YamlValue::String(text))
        });
    };
    for candidate in input {
        let text = string_argument(nav, field.name(), candidate, value_expr)?;
        write_metadata(nav.arena_mut(), candidate.node, field, text)?;
    }
    Ok(input.to_vec())
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn style(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    accessor(nav, input, args, MetadataField::Style)
}

fn tag(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    accessor(nav, input, args, MetadataField::Tag)
}

fn anchor(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    accessor(nav, input, args, MetadataField::Anchor)
}

fn line_comment(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    accessor(nav, input, args, MetadataField::LineComment)
}

fn head_comment(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    accessor(nav, input, args, MetadataField::HeadComment)
}

/// Replaces every alias below each candidate with a copy of its target,
/// applies `<<` merge keys and drops anchors. Works in place.
fn explode(
    nav: &mut TreeNavigator<'_>,
    input: &[CandidateNode],
    _args: &[&OperatorNode],
) -> EvalResult<CandidateSequence> {
    for candidate in input {
        let arena = nav.arena_mut();
        expand_aliases(arena, candidate.node)?;
        apply_merge_keys(arena, candidate.node);
        clear_anchors(arena, candidate.node);
    }
    Ok(input.to_vec())
}

fn expand_aliases(arena: &mut DocumentArena, start: NodeId) -> EvalResult<()> {
    let mut expansions = 0;
    let mut pending = vec![start];
    while let Some(id) = pending.pop() {
        if let YamlValue::Alias(target) = arena.value(id) {
            let target = *target;
            expansions += 1;
            if expansions > MAX_EXPANSIONS {
                return Err(EvaluationError::invalid_argument(
                    "explode",
                    format!("more than {} alias expansions", MAX_EXPANSIONS),
                ));
            }
            arena.set_value(id, target);
            // the copy may itself contain aliases
            pending.push(id);
            continue;
        }
        pending.extend(arena.value(id).child_ids());
    }
    Ok(())
}

/// Post-order, so nested merges are resolved before their parents use them.
fn apply_merge_keys(arena: &mut DocumentArena, id: NodeId) {
    for child in arena.value(id).child_ids() {
        apply_merge_keys(arena, child);
    }
    let Some(merge) = arena.child_by_key(id, MERGE_KEY) else {
        return;
    };
    let sources = match arena.value(merge) {
        YamlValue::Sequence(items) => items.clone(),
        YamlValue::Mapping(_) => vec![merge],
        _ => return,
    };
    arena.remove_child(id, &PathKey::Key(MERGE_KEY.to_string()));
    for source in sources {
        let entries: Vec<(String, NodeId)> = match arena.value(source) {
            YamlValue::Mapping(entries) => entries.iter().map(|(k, v)| (k.clone(), *v)).collect(),
            _ => continue,
        };
        for (key, value) in entries {
            if arena.child_by_key(id, &key).is_none() {
                let origin = arena.origin(id);
                let copy = arena.clone_subtree(value, origin);
                arena.insert_key(id, &key, copy);
            }
        }
    }
}

fn clear_anchors(arena: &mut DocumentArena, start: NodeId) {
    let mut pending = vec![start];
    while let Some(id) = pending.pop() {
        arena.metadata_mut(id).anchor = None;
        pending.extend(arena.value(id).child_ids());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;
    use crate::expression::compile;
    use crate::file::printer::to_json_value;
    use crate::navigator::NavigatorOptions;

    fn eval_json(yaml: &str, expression: &str) -> EvalResult<Vec<String>> {
        let mut arena = DocumentArena::new();
        let roots = parse_documents(yaml, "deploy.yml", 4, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let ast = compile(expression).unwrap();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        let results = nav.evaluate(&roots, &ast)?;
        Ok(results
            .iter()
            .map(|c| to_json_value(nav.arena(), c.node).to_string())
            .collect())
    }

    const SAMPLE: &str = "spec:\n  ports:\n    - 80\n    - 443\n";

    #[test]
    fn test_key_and_path() {
        assert_eq!(
            eval_json(SAMPLE, ".spec.ports[1] | key, path").unwrap(),
            vec!["1", r#"["spec","ports",1]"#]
        );
        assert_eq!(eval_json(SAMPLE, "key").unwrap(), vec!["null"]);
        assert_eq!(eval_json(SAMPLE, "path").unwrap(), vec!["[]"]);
    }

    #[test]
    fn test_parent_and_root() {
        assert_eq!(
            eval_json(SAMPLE, ".spec.ports[0] | parent | length").unwrap(),
            vec!["2"]
        );
        assert!(eval_json(SAMPLE, "parent").unwrap().is_empty());
        assert_eq!(
            eval_json(SAMPLE, ".spec.ports[0] | root | keys").unwrap(),
            vec![r#"["spec"]"#]
        );
    }

    #[test]
    fn test_provenance() {
        assert_eq!(
            eval_json(SAMPLE, "document_index, di, filename").unwrap(),
            vec!["4", "4", r#""deploy.yml""#]
        );
    }

    #[test]
    fn test_positions() {
        assert_eq!(
            eval_json(SAMPLE, ".spec.ports[1] | line, column").unwrap(),
            vec!["4", "7"]
        );
        assert_eq!(eval_json(SAMPLE, "1 | line").unwrap(), vec!["0"]);
    }

    #[test]
    fn test_metadata_getters() {
        let yaml = "a: &base 'quoted' # note\nb: !custom x\n";
        assert_eq!(
            eval_json(yaml, ".a | style, anchor, line_comment").unwrap(),
            vec![r#""single""#, r#""base""#, r#""note""#]
        );
        assert_eq!(
            eval_json(yaml, ".b | tag").unwrap(),
            vec![r#""!custom""#]
        );
    }

    #[test]
    fn test_metadata_setters_write_in_place() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("a: x\n", "test.yml", 0, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        nav.evaluate(&roots, &compile(".a | style(\"double\") | head_comment(\"hi\")").unwrap())
            .unwrap();
        let a = nav.arena().child_by_key(roots[0].node, "a").unwrap();
        assert_eq!(nav.arena().metadata(a).style, NodeStyle::DoubleQuoted);
        assert_eq!(nav.arena().metadata(a).head_comment.as_deref(), Some("hi"));

        let err = nav
            .evaluate(&roots, &compile(".a | style(\"wavy\")").unwrap())
            .unwrap_err();
        assert!(matches!(err, EvaluationError::InvalidArgument { .. }));
    }

    #[test]
    fn test_metadata_setters_reject_computed_nodes() {
        for expression in ["1 | style(\"double\")", "(.a + \"y\") | anchor(\"z\")"] {
            assert_eq!(
                eval_json("a: x\n", expression),
                Err(EvaluationError::NotAddressable {
                    operation: "metadata update"
                })
            );
        }
        // reading a computed node is fine
        assert_eq!(eval_json("a: x\n", "1 | style").unwrap(), vec![r#""""#]);
    }

    #[test]
    fn test_explode() {
        let yaml = "\
base: &base
  image: nginx
  port: 80
web:
  <<: *base
  port: 8080
copy: *base
";
        assert_eq!(
            eval_json(yaml, "explode | .web, .copy").unwrap(),
            vec![
                r#"{"port":8080,"image":"nginx"}"#,
                r#"{"image":"nginx","port":80}"#
            ]
        );
        let mut arena = DocumentArena::new();
        let roots = parse_documents(yaml, "test.yml", 0, &mut arena).unwrap();
        let registry = OperatorRegistry::standard();
        let mut nav = TreeNavigator::new(&mut arena, &registry, NavigatorOptions::default());
        nav.evaluate(&roots, &compile("explode").unwrap()).unwrap();
        let copy = nav.arena().child_by_key(roots[0].node, "copy").unwrap();
        assert!(nav.arena().value(copy).is_mapping());
        let base = nav.arena().child_by_key(roots[0].node, "base").unwrap();
        assert_eq!(nav.arena().metadata(base).anchor, None);
    }
}
