//! Stream evaluator: runs one compiled expression over a stream of documents.
//!
//! Sources are read in order and split into documents whose indices keep
//! increasing across sources. Normally every document is evaluated on its own
//! and its results are handed to the [`OutputSink`] before the next one is
//! touched. When the expression contains a cross-document operator (such as
//! `slurp`) all documents are parsed first and evaluated as one batch.

use crate::document::candidate::{CandidateNode, CandidateSequence};
use crate::document::node::{NodeOrigin, YamlValue};
use crate::document::parser::{parse_documents, DocumentReader};
use crate::document::tree::DocumentArena;
use crate::error::StreamError;
use crate::expression::ast::OperatorNode;
use crate::navigator::{NavigatorOptions, TreeNavigator};
use crate::operators::OperatorRegistry;
use std::io;
use tracing::debug;

/// Receives evaluation results in arrival order.
pub trait OutputSink {
    /// Writes `candidates`, whose nodes live in `arena`.
    fn write_results(
        &mut self,
        arena: &DocumentArena,
        candidates: &[CandidateNode],
    ) -> io::Result<()>;
}

/// One named chunk of YAML text, e.g. a file or stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    /// File name, or `-` for stdin
    pub source_id: String,
    pub content: String,
}

impl InputSource {
    pub fn new(source_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            content: content.into(),
        }
    }
}

/// Evaluates an expression over input sources and forwards the results.
pub struct StreamEvaluator {
    registry: OperatorRegistry,
    options: NavigatorOptions,
}

impl StreamEvaluator {
    /// An evaluator using the standard operator registry.
    pub fn new(options: NavigatorOptions) -> Self {
        Self::with_registry(OperatorRegistry::standard(), options)
    }

    pub fn with_registry(registry: OperatorRegistry, options: NavigatorOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &OperatorRegistry {
        &self.registry
    }

    /// Runs `ast` over every document of every source.
    ///
    /// # Errors
    ///
    /// Stops at the first malformed document ([`StreamError::Parse`]), failed
    /// evaluation ([`StreamError::Evaluation`]) or write error
    /// ([`StreamError::Io`]). Results already written stay written.
    pub fn run(
        &self,
        sources: &[InputSource],
        ast: &OperatorNode,
        sink: &mut dyn OutputSink,
    ) -> Result<(), StreamError> {
        if self.registry.is_cross_document(ast) {
            self.run_batch(sources, ast, sink)
        } else {
            self.run_each(sources, ast, sink)
        }
    }

    /// Runs `ast` once against a single null document (index 0, empty source id).
    pub fn run_null_input(
        &self,
        ast: &OperatorNode,
        sink: &mut dyn OutputSink,
    ) -> Result<(), StreamError> {
        let mut arena = DocumentArena::new();
        let root = arena.alloc(YamlValue::Null, NodeOrigin::Document);
        let input = [CandidateNode::new(0, "", root)];
        debug!("evaluating against null input");

        let results = self.evaluate(&mut arena, &input, ast)?;
        sink.write_results(&arena, &results)?;
        Ok(())
    }

    /// Each document is evaluated and flushed before the next one is parsed,
    /// so a malformed document leaves the output of earlier ones in place.
    fn run_each(
        &self,
        sources: &[InputSource],
        ast: &OperatorNode,
        sink: &mut dyn OutputSink,
    ) -> Result<(), StreamError> {
        let mut next_index = 0;
        for source in sources {
            let mut arena = DocumentArena::new();
            let mut reader = DocumentReader::new(&source.content, &source.source_id, next_index);
            debug!(source = %source.source_id, first_index = next_index, "reading source");

            while let Some(root) = reader.next_document(&mut arena)? {
                next_index = root.document_index + 1;
                let results = self.evaluate(&mut arena, std::slice::from_ref(&root), ast)?;
                debug!(
                    source = %source.source_id,
                    document_index = root.document_index,
                    results = results.len(),
                    "evaluated document"
                );
                sink.write_results(&arena, &results)?;
            }
        }
        Ok(())
    }

    fn run_batch(
        &self,
        sources: &[InputSource],
        ast: &OperatorNode,
        sink: &mut dyn OutputSink,
    ) -> Result<(), StreamError> {
        let mut arena = DocumentArena::new();
        let mut roots = Vec::new();
        for source in sources {
            let parsed = parse_documents(&source.content, &source.source_id, roots.len(), &mut arena)?;
            debug!(
                source = %source.source_id,
                documents = parsed.len(),
                "parsed source for batch evaluation"
            );
            roots.extend(parsed);
        }

        debug!(documents = roots.len(), "evaluating cross-document expression");
        let results = self.evaluate(&mut arena, &roots, ast)?;
        sink.write_results(&arena, &results)?;
        Ok(())
    }

    fn evaluate(
        &self,
        arena: &mut DocumentArena,
        input: &[CandidateNode],
        ast: &OperatorNode,
    ) -> Result<CandidateSequence, StreamError> {
        let mut navigator = TreeNavigator::new(arena, &self.registry, self.options);
        navigator
            .evaluate(input, ast)
            .map_err(|error| {
                let (source_id, document_index) = match input.first() {
                    Some(first) => (first.source_id.to_string(), first.document_index),
                    None => (String::new(), 0),
                };
                StreamError::Evaluation {
                    source_id,
                    document_index,
                    error,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EvaluationError;
    use crate::expression::compile;
    use crate::file::printer::to_json_value;
    use pretty_assertions::assert_eq;

    /// Records each result as `(document_index, json)`.
    #[derive(Default)]
    struct Recorder {
        results: Vec<(usize, String)>,
        batches: usize,
    }

    impl OutputSink for Recorder {
        fn write_results(
            &mut self,
            arena: &DocumentArena,
            candidates: &[CandidateNode],
        ) -> io::Result<()> {
            self.batches += 1;
            for candidate in candidates {
                self.results.push((
                    candidate.document_index,
                    to_json_value(arena, candidate.node).to_string(),
                ));
            }
            Ok(())
        }
    }

    fn sources() -> Vec<InputSource> {
        vec![
            InputSource::new("one.yml", "a: 1\n---\na: 2\n"),
            InputSource::new("two.yml", "a: 3\n"),
        ]
    }

    #[test]
    fn test_documents_are_numbered_across_sources() {
        let evaluator = StreamEvaluator::new(NavigatorOptions::default());
        let mut sink = Recorder::default();
        evaluator
            .run(&sources(), &compile(".a").unwrap(), &mut sink)
            .unwrap();
        assert_eq!(
            sink.results,
            vec![
                (0, "1".to_string()),
                (1, "2".to_string()),
                (2, "3".to_string())
            ]
        );
        assert_eq!(sink.batches, 3);
    }

    #[test]
    fn test_cross_document_expression_sees_every_document() {
        let evaluator = StreamEvaluator::new(NavigatorOptions::default());
        let mut sink = Recorder::default();
        evaluator
            .run(&sources(), &compile("slurp | map(.a) | add").unwrap(), &mut sink)
            .unwrap();
        assert_eq!(sink.results, vec![(0, "6".to_string())]);
        assert_eq!(sink.batches, 1);
    }

    #[test]
    fn test_parse_error_keeps_earlier_results() {
        let evaluator = StreamEvaluator::new(NavigatorOptions::default());
        let mut sink = Recorder::default();
        let sources = vec![
            InputSource::new("good.yml", "a: 1\n"),
            InputSource::new("bad.yml", "a: [1\n"),
        ];
        let err = evaluator
            .run(&sources, &compile(".a").unwrap(), &mut sink)
            .unwrap_err();
        match err {
            StreamError::Parse(parse) => {
                assert_eq!(parse.source_id, "bad.yml");
                assert_eq!(parse.document_index, 1);
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
        assert_eq!(sink.results, vec![(0, "1".to_string())]);
    }

    #[test]
    fn test_parse_error_in_later_document_keeps_earlier_documents() {
        let evaluator = StreamEvaluator::new(NavigatorOptions::default());
        let mut sink = Recorder::default();
        let sources = vec![InputSource::new("one.yml", "a: 1\n---\na: [1\n")];
        let err = evaluator
            .run(&sources, &compile(".a").unwrap(), &mut sink)
            .unwrap_err();
        match err {
            StreamError::Parse(parse) => {
                assert_eq!(parse.source_id, "one.yml");
                assert_eq!(parse.document_index, 1);
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
        assert_eq!(sink.results, vec![(0, "1".to_string())]);
        assert_eq!(sink.batches, 1);
    }

    #[test]
    fn test_evaluation_error_names_document() {
        let evaluator = StreamEvaluator::new(NavigatorOptions::default());
        let mut sink = Recorder::default();
        let err = evaluator
            .run(&sources(), &compile(".a / 0").unwrap(), &mut sink)
            .unwrap_err();
        match err {
            StreamError::Evaluation {
                source_id,
                document_index,
                error,
            } => {
                assert_eq!(source_id, "one.yml");
                assert_eq!(document_index, 0);
                assert_eq!(error, EvaluationError::DivisionByZero);
            }
            other => panic!("expected an evaluation error, got {other:?}"),
        }
    }

    #[test]
    fn test_null_input() {
        let evaluator = StreamEvaluator::new(NavigatorOptions::default());
        let mut sink = Recorder::default();
        evaluator
            .run_null_input(&compile(".a = 1 | .").unwrap(), &mut sink)
            .unwrap();
        assert_eq!(sink.results, vec![(0, r#"{"a":1}"#.to_string())]);
    }
}
