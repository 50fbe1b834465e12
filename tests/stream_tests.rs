//! End-to-end runs: sources in, printed text out.

use pretty_assertions::assert_eq;
use std::io;
use yamlquery::document::candidate::CandidateNode;
use yamlquery::document::tree::DocumentArena;
use yamlquery::error::{EvaluationError, StreamError};
use yamlquery::expression::compile;
use yamlquery::file::printer::{to_json_value, JsonPrinter, PrintOptions, YamlPrinter};
use yamlquery::navigator::{MissingKeyPolicy, NavigatorOptions};
use yamlquery::stream::{InputSource, OutputSink, StreamEvaluator};

/// Collects `(document_index, source_id, json)` for every result.
#[derive(Default)]
struct Collector {
    results: Vec<(usize, String, String)>,
}

impl OutputSink for Collector {
    fn write_results(
        &mut self,
        arena: &DocumentArena,
        candidates: &[CandidateNode],
    ) -> io::Result<()> {
        for candidate in candidates {
            self.results.push((
                candidate.document_index,
                candidate.source_id.to_string(),
                to_json_value(arena, candidate.node).to_string(),
            ));
        }
        Ok(())
    }
}

fn collect(sources: &[InputSource], expression: &str) -> Vec<(usize, String, String)> {
    let mut sink = Collector::default();
    StreamEvaluator::new(NavigatorOptions::default())
        .run(sources, &compile(expression).unwrap(), &mut sink)
        .unwrap();
    sink.results
}

fn yaml_output(yaml: &str, expression: &str) -> String {
    let mut printer = YamlPrinter::new(Vec::new(), PrintOptions::default());
    StreamEvaluator::new(NavigatorOptions::default())
        .run(
            &[InputSource::new("in.yml", yaml)],
            &compile(expression).unwrap(),
            &mut printer,
        )
        .unwrap();
    String::from_utf8(printer.into_inner()).unwrap()
}

fn json_output(yaml: &str, expression: &str, indent_size: usize) -> String {
    let options = PrintOptions {
        indent_size,
        unwrap_scalars: false,
        ..PrintOptions::default()
    };
    let mut printer = JsonPrinter::new(Vec::new(), options);
    StreamEvaluator::new(NavigatorOptions::default())
        .run(
            &[InputSource::new("in.yml", yaml)],
            &compile(expression).unwrap(),
            &mut printer,
        )
        .unwrap();
    String::from_utf8(printer.into_inner()).unwrap()
}

#[test]
fn test_select_key_from_mapping() {
    let results = collect(&[InputSource::new("a.yml", "{a: 1, b: 2}")], ".a");
    assert_eq!(results, vec![(0, "a.yml".to_string(), "1".to_string())]);
}

#[test]
fn test_splat_sequence() {
    let results = collect(&[InputSource::new("a.yml", "[1, 2, 3]")], ".[]");
    let values: Vec<&str> = results.iter().map(|(_, _, v)| v.as_str()).collect();
    assert_eq!(values, vec!["1", "2", "3"]);
}

#[test]
fn test_two_documents_get_increasing_indices() {
    let results = collect(&[InputSource::new("a.yml", "a: 1\n---\na: 2\n")], ".a");
    assert_eq!(
        results,
        vec![
            (0, "a.yml".to_string(), "1".to_string()),
            (1, "a.yml".to_string(), "2".to_string()),
        ]
    );
}

#[test]
fn test_provenance_functions_across_sources() {
    let sources = vec![
        InputSource::new("first.yml", "x: 1\n---\nx: 2\n"),
        InputSource::new("second.yml", "x: 3\n"),
    ];
    let results = collect(&sources, "[document_index, filename]");
    let values: Vec<&str> = results.iter().map(|(_, _, v)| v.as_str()).collect();
    assert_eq!(
        values,
        vec![
            r#"[0,"first.yml"]"#,
            r#"[1,"first.yml"]"#,
            r#"[2,"second.yml"]"#
        ]
    );
}

#[test]
fn test_slurp_sees_all_sources() {
    let sources = vec![
        InputSource::new("first.yml", "name: a\n---\nname: b\n"),
        InputSource::new("second.yml", "name: c\n"),
    ];
    let results = collect(&sources, "slurp | map(.name) | join(\",\")");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].2, r#""a,b,c""#);
}

#[test]
fn test_yaml_output_keeps_formatting() {
    let yaml = "\
# deployment
metadata:
  name: web # service name
  labels: {app: web, tier: front}
spec:
  replicas: 0x03
  ports:
    - 80
    - 443
";
    assert_eq!(yaml_output(yaml, "."), yaml);
    assert_eq!(
        yaml_output(yaml, ".spec.replicas = 5"),
        yaml.replace("0x03", "5")
    );
}

#[test]
fn test_yaml_output_of_multiple_documents() {
    let yaml = "a: 1\n---\na: 2\n";
    assert_eq!(yaml_output(yaml, "."), "a: 1\n---\na: 2\n");
    assert_eq!(yaml_output(yaml, ".a"), "1\n---\n2\n");
}

#[test]
fn test_yaml_output_unwraps_strings() {
    assert_eq!(yaml_output("s: \"quoted\"\n", ".s"), "quoted\n");
    assert_eq!(
        yaml_output("items: [a, b]\n", ".items[]"),
        "a\nb\n"
    );
}

#[test]
fn test_json_output() {
    assert_eq!(
        json_output("a: {b: [1, x]}\n", ".a", 0),
        "{\"b\":[1,\"x\"]}\n"
    );
    assert_eq!(
        json_output("a: {b: 1}\n", ".a", 2),
        "{\n  \"b\": 1\n}\n"
    );
    assert_eq!(json_output("s: text\n", ".s", 2), "\"text\"\n");
}

#[test]
fn test_update_through_pipeline() {
    let yaml = "items:\n  - name: a\n    price: 10\n  - name: b\n    price: 20\n";
    assert_eq!(
        yaml_output(yaml, "(.items[] | select(.price > 15) | .price) |= . * 2"),
        "items:\n  - name: a\n    price: 10\n  - name: b\n    price: 40\n"
    );
}

#[test]
fn test_delete_and_sort() {
    let yaml = "b: 2\na: 1\nc: 3\n";
    assert_eq!(yaml_output(yaml, "del(.c)"), "b: 2\na: 1\n");
    assert_eq!(
        yaml_output(yaml, "to_entries | sort_by(.key) | from_entries"),
        "a: 1\nb: 2\nc: 3\n"
    );
}

#[test]
fn test_missing_key_policies() {
    let sources = [InputSource::new("m.yml", "a: 1\n")];
    let ast = compile(".missing").unwrap();

    let mut sink = Collector::default();
    StreamEvaluator::new(NavigatorOptions::default())
        .run(&sources, &ast, &mut sink)
        .unwrap();
    assert!(sink.results.is_empty());

    let null_policy = NavigatorOptions {
        missing_key: MissingKeyPolicy::Null,
        ..NavigatorOptions::default()
    };
    let mut sink = Collector::default();
    StreamEvaluator::new(null_policy)
        .run(&sources, &ast, &mut sink)
        .unwrap();
    assert_eq!(sink.results[0].2, "null");

    let error_policy = NavigatorOptions {
        missing_key: MissingKeyPolicy::Error,
        ..NavigatorOptions::default()
    };
    let mut sink = Collector::default();
    let err = StreamEvaluator::new(error_policy)
        .run(&sources, &ast, &mut sink)
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::Evaluation {
            error: EvaluationError::MissingKey { .. },
            ..
        }
    ));
}

#[test]
fn test_recursion_limit_is_an_error() {
    let shallow = NavigatorOptions {
        max_depth: 4,
        ..NavigatorOptions::default()
    };
    let mut sink = Collector::default();
    let err = StreamEvaluator::new(shallow)
        .run(
            &[InputSource::new("d.yml", "a: 1\n")],
            &compile("[[[[[.a]]]]]").unwrap(),
            &mut sink,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        StreamError::Evaluation {
            error: EvaluationError::RecursionLimit { limit: 4 },
            ..
        }
    ));
}

#[test]
fn test_null_input_builds_a_document() {
    let mut printer = YamlPrinter::new(Vec::new(), PrintOptions::default());
    StreamEvaluator::new(NavigatorOptions::default())
        .run_null_input(
            &compile(".name = \"demo\" | .tags = [\"a\", \"b\"]").unwrap(),
            &mut printer,
        )
        .unwrap();
    assert_eq!(
        String::from_utf8(printer.into_inner()).unwrap(),
        "name: demo\ntags:\n  - a\n  - b\n"
    );
}
