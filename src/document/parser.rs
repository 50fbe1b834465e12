//! YAML parsing with metadata preservation.
//!
//! Documents are built from `yaml-rust2`'s event stream directly into a
//! [`DocumentArena`], one document per [`DocumentReader::next_document`] call.
//! The event API reports anchors by numeric id and drops comments. Anchor
//! names are read back from the scanner's token stream (ids are handed out in
//! order of appearance), and a light pre-scan of the text recovers comments,
//! which are then attached to nodes by line number.
//!
//! # Example
//!
//! ```
//! use yamlquery::document::parser::parse_documents;
//! use yamlquery::document::tree::DocumentArena;
//!
//! let mut arena = DocumentArena::new();
//! let roots = parse_documents("a: 1\n---\na: 2\n", "sample.yml", 0, &mut arena).unwrap();
//! assert_eq!(roots.len(), 2);
//! assert_eq!(roots[1].document_index, 1);
//! ```

use super::candidate::CandidateNode;
use super::node::{
    NodeId, NodeOrigin, NodeStyle, TextPosition, YamlNode, YamlNumber, YamlValue,
};
use super::tree::DocumentArena;
use crate::error::ParseError;
use std::collections::HashMap;
use std::rc::Rc;
use std::str::Chars;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, Scanner, TScalarStyle, Token, TokenType};

/// Parses every document in `text` into `arena`.
///
/// Document indices start at `start_index` and increase by one per `---`
/// separated document.
///
/// # Errors
///
/// Returns a [`ParseError`] naming the source and the index of the document
/// that could not be parsed.
pub fn parse_documents(
    text: &str,
    source_id: &str,
    start_index: usize,
    arena: &mut DocumentArena,
) -> Result<Vec<CandidateNode>, ParseError> {
    let mut reader = DocumentReader::new(text, source_id, start_index);
    let mut roots = Vec::new();
    while let Some(root) = reader.next_document(arena)? {
        roots.push(root);
    }
    Ok(roots)
}

/// Reads the documents of one source lazily, so each can be evaluated before
/// the next is parsed.
///
/// # Example
///
/// ```
/// use yamlquery::document::parser::DocumentReader;
/// use yamlquery::document::tree::DocumentArena;
///
/// let mut arena = DocumentArena::new();
/// let mut reader = DocumentReader::new("a: 1\n---\na: [\n", "sample.yml", 0);
/// let first = reader.next_document(&mut arena).unwrap();
/// assert!(first.is_some());
/// assert_eq!(reader.next_document(&mut arena).unwrap_err().document_index, 1);
/// ```
pub struct DocumentReader<'t> {
    parser: Parser<Chars<'t>>,
    source: SourceState,
    source_id: Rc<str>,
    next_index: usize,
    done: bool,
}

impl<'t> DocumentReader<'t> {
    pub fn new(text: &'t str, source_id: &str, start_index: usize) -> Self {
        Self {
            parser: Parser::new_from_str(text),
            source: SourceState {
                chars: text.chars().collect(),
                scan: SourceScan::new(text),
                anchored: HashMap::new(),
            },
            source_id: Rc::from(source_id),
            next_index: start_index,
            done: false,
        }
    }

    /// Parses the next document into `arena`. Returns `Ok(None)` once the
    /// source is exhausted; after an error the reader stays exhausted.
    ///
    /// # Errors
    ///
    /// A [`ParseError`] carrying the index of the document being read.
    pub fn next_document(
        &mut self,
        arena: &mut DocumentArena,
    ) -> Result<Option<CandidateNode>, ParseError> {
        if self.done {
            return Ok(None);
        }
        let mut builder = ArenaBuilder::new(arena, &mut self.source);
        let outcome = self.parser.load(&mut builder, false);
        let (finished, failure) = (builder.finished, builder.failure);

        if let Err(err) = outcome {
            self.done = true;
            let marker = err.marker();
            return Err(self.error(err.info().to_string(), marker.line(), marker.col()));
        }
        if let Some(failure) = failure {
            self.done = true;
            return Err(self.error(failure.message, failure.position.line, failure.position.column));
        }
        let Some(root) = finished else {
            self.done = true;
            return Ok(None);
        };

        let index = self.next_index;
        self.next_index += 1;
        Ok(Some(CandidateNode::new(index, Rc::clone(&self.source_id), root)))
    }

    fn error(&self, message: String, line: usize, column: usize) -> ParseError {
        ParseError {
            source_id: self.source_id.to_string(),
            document_index: self.next_index,
            message,
            line,
            column: column + 1,
        }
    }
}

/// Resolves an unquoted scalar to its YAML 1.2 core-schema value.
pub fn resolve_plain_scalar(text: &str) -> YamlValue {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return YamlValue::Null,
        "true" | "True" | "TRUE" => return YamlValue::Boolean(true),
        "false" | "False" | "FALSE" => return YamlValue::Boolean(false),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return YamlValue::Number(YamlNumber::Float(f64::INFINITY))
        }
        "-.inf" | "-.Inf" | "-.INF" => {
            return YamlValue::Number(YamlNumber::Float(f64::NEG_INFINITY))
        }
        ".nan" | ".NaN" | ".NAN" => return YamlValue::Number(YamlNumber::Float(f64::NAN)),
        _ => {}
    }

    if let Some(hex) = text.strip_prefix("0x") {
        if let Ok(n) = i64::from_str_radix(hex, 16) {
            return YamlValue::Number(YamlNumber::Integer(n));
        }
    }
    if let Some(octal) = text.strip_prefix("0o") {
        if let Ok(n) = i64::from_str_radix(octal, 8) {
            return YamlValue::Number(YamlNumber::Integer(n));
        }
    }

    if looks_numeric(text) {
        if let Ok(n) = text.parse::<i64>() {
            return YamlValue::Number(YamlNumber::Integer(n));
        }
        if let Ok(f) = text.parse::<f64>() {
            return YamlValue::Number(YamlNumber::Float(f));
        }
    }

    YamlValue::String(text.to_string())
}

/// `f64::from_str` also accepts words like `inf` and `NaN`; only digit-led
/// strings are treated as numbers.
fn looks_numeric(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let body = body.strip_prefix('.').unwrap_or(body);
    body.chars().next().is_some_and(|c| c.is_ascii_digit())
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E'))
}

/// Anchor names and comments recovered from the raw text.
#[derive(Debug, Default)]
struct SourceScan {
    /// Anchor names in order of appearance; anchor id `n` is `anchors[n - 1]`
    anchors: Vec<String>,
    /// Comment-only lines, keyed by the line of the content that follows them
    head_comments: HashMap<usize, String>,
    /// Trailing comments keyed by line
    line_comments: HashMap<usize, String>,
}

impl SourceScan {
    fn new(text: &str) -> Self {
        let mut scan = SourceScan {
            anchors: Scanner::new(text.chars())
                .filter_map(|Token(_, token)| match token {
                    TokenType::Anchor(name) => Some(name),
                    _ => None,
                })
                .collect(),
            ..SourceScan::default()
        };
        let mut pending_head: Vec<String> = Vec::new();
        let mut block_scalar_indent: Option<usize> = None;

        for (offset, line) in text.lines().enumerate() {
            let line_number = offset + 1;
            let indent = line.len() - line.trim_start().len();
            let trimmed = line.trim();

            if let Some(block_indent) = block_scalar_indent {
                if trimmed.is_empty() || indent > block_indent {
                    continue;
                }
                block_scalar_indent = None;
            }

            if trimmed.is_empty() || trimmed == "---" || trimmed == "..." {
                continue;
            }
            if let Some(comment) = trimmed.strip_prefix('#') {
                pending_head.push(comment.trim().to_string());
                continue;
            }

            let content = scan.scan_content(line, line_number);
            if !pending_head.is_empty() {
                scan.head_comments
                    .insert(line_number, std::mem::take(&mut pending_head).join("\n"));
            }
            if opens_block_scalar(content) {
                block_scalar_indent = Some(indent);
            }
        }
        scan
    }

    /// Records a trailing comment on one content line, returning the line with
    /// the comment stripped.
    fn scan_content<'a>(&mut self, line: &'a str, line_number: usize) -> &'a str {
        let mut quote: Option<char> = None;
        let mut previous = ' ';
        for (at, ch) in line.char_indices() {
            match quote {
                Some(q) => {
                    if ch == q {
                        quote = None;
                    }
                }
                None => match ch {
                    '"' | '\'' if is_token_start(previous) => quote = Some(ch),
                    '#' if previous.is_whitespace() => {
                        let comment = line[at + 1..].trim();
                        self.line_comments.insert(line_number, comment.to_string());
                        return line[..at].trim_end();
                    }
                    _ => {}
                },
            }
            previous = ch;
        }
        line
    }
}

fn is_token_start(previous: char) -> bool {
    previous.is_whitespace() || matches!(previous, '[' | '{' | ',' | ':' | '-')
}

fn opens_block_scalar(content: &str) -> bool {
    let last = content.trim_end();
    let indicator = last.trim_end_matches(|c: char| c == '-' || c == '+' || c.is_ascii_digit());
    (indicator.ends_with('|') || indicator.ends_with('>'))
        && indicator[..indicator.len() - 1]
            .chars()
            .last()
            .map_or(true, |c| c.is_whitespace() || c == ':' || c == '-')
}

enum Frame {
    Sequence(NodeId),
    Mapping {
        node: NodeId,
        pending_key: Option<(String, usize)>,
    },
}

struct BuildFailure {
    message: String,
    position: TextPosition,
}

/// What outlives a single document: the raw text, the pre-scan and the nodes
/// registered under each anchor id.
struct SourceState {
    chars: Vec<char>,
    scan: SourceScan,
    anchored: HashMap<usize, NodeId>,
}

/// Event receiver assembling one document in the arena.
struct ArenaBuilder<'a> {
    arena: &'a mut DocumentArena,
    source: &'a mut SourceState,
    stack: Vec<Frame>,
    current_root: Option<NodeId>,
    finished: Option<NodeId>,
    failure: Option<BuildFailure>,
}

impl<'a> ArenaBuilder<'a> {
    fn new(arena: &'a mut DocumentArena, source: &'a mut SourceState) -> Self {
        Self {
            arena,
            source,
            stack: Vec::new(),
            current_root: None,
            finished: None,
            failure: None,
        }
    }

    fn fail(&mut self, message: &str, mark: &Marker) {
        if self.failure.is_none() {
            self.failure = Some(BuildFailure {
                message: message.to_string(),
                position: position_of(mark),
            });
        }
    }

    /// True when the collection starting at `mark` is written in flow style.
    fn is_flow_at(&self, mark: &Marker, open: char) -> bool {
        let mut index = mark.index();
        while let Some(&ch) = self.source.chars.get(index) {
            if ch.is_whitespace() {
                index += 1;
            } else if ch == '&' || ch == '!' {
                while self.source.chars.get(index).is_some_and(|c| !c.is_whitespace()) {
                    index += 1;
                }
            } else {
                return ch == open;
            }
        }
        false
    }

    fn new_node(&mut self, value: YamlValue, style: NodeStyle, anchor_id: usize, mark: &Marker) -> NodeId {
        let mut node = YamlNode::new(value, NodeOrigin::Document);
        node.metadata.style = style;
        node.metadata.position = Some(position_of(mark));
        if anchor_id > 0 {
            node.metadata.anchor = self.source.scan.anchors.get(anchor_id - 1).cloned();
        }
        let id = self.arena.insert(node);
        if anchor_id > 0 {
            self.source.anchored.insert(anchor_id, id);
        }
        id
    }

    /// Places a finished node under its parent (or as the document root) and
    /// attaches comments found on its lines.
    fn attach(&mut self, id: NodeId, mark: &Marker) {
        let node_line = mark.line();
        let comment_line = match self.stack.last() {
            Some(Frame::Mapping {
                pending_key: Some((_, key_line)),
                ..
            }) => *key_line,
            _ => node_line,
        };
        self.attach_comments(id, comment_line, node_line);

        match self.stack.last_mut() {
            None => self.current_root = Some(id),
            Some(Frame::Sequence(parent)) => {
                let parent = *parent;
                self.arena.push_item(parent, id);
            }
            Some(Frame::Mapping { node, pending_key }) => {
                let parent = *node;
                match pending_key.take() {
                    Some((key, _)) => {
                        self.arena.insert_key(parent, &key, id);
                    }
                    None => self.fail("complex mapping keys are not supported", mark),
                }
            }
        }
    }

    fn attach_comments(&mut self, id: NodeId, comment_line: usize, node_line: usize) {
        let is_block_collection = {
            let node = self.arena.get(id);
            node.value().is_collection() && node.metadata().style != NodeStyle::Flow
        };
        let head = self.source.scan.head_comments.remove(&comment_line);
        let line = if !is_block_collection {
            self.source.scan.line_comments.remove(&node_line)
        } else if node_line != comment_line {
            self.source.scan.line_comments.remove(&comment_line)
        } else {
            None
        };
        let meta = self.arena.metadata_mut(id);
        if head.is_some() {
            meta.head_comment = head;
        }
        if line.is_some() {
            meta.line_comment = line;
        }
    }

    /// A scalar arriving while a mapping waits for a key becomes that key.
    fn take_as_key(&mut self, text: &str, mark: &Marker) -> bool {
        if let Some(Frame::Mapping { pending_key, .. }) = self.stack.last_mut() {
            if pending_key.is_none() {
                *pending_key = Some((text.to_string(), mark.line()));
                return true;
            }
        }
        false
    }

    fn scalar(
        &mut self,
        text: String,
        style: TScalarStyle,
        anchor_id: usize,
        tag: Option<String>,
        mark: &Marker,
    ) {
        if self.take_as_key(&text, mark) {
            return;
        }
        let (value, node_style) = match style {
            TScalarStyle::Plain if tag.as_deref() == Some("!!str") => {
                (YamlValue::String(text.clone()), NodeStyle::Default)
            }
            TScalarStyle::Plain => (resolve_plain_scalar(&text), NodeStyle::Default),
            TScalarStyle::SingleQuoted => (YamlValue::String(text.clone()), NodeStyle::SingleQuoted),
            TScalarStyle::DoubleQuoted => (YamlValue::String(text.clone()), NodeStyle::DoubleQuoted),
            TScalarStyle::Literal => (YamlValue::String(text.clone()), NodeStyle::Literal),
            _ => (YamlValue::String(text.clone()), NodeStyle::Folded),
        };
        let keep_spelling = matches!(value, YamlValue::Number(_) | YamlValue::Null);
        let id = self.new_node(value, node_style, anchor_id, mark);
        let meta = self.arena.metadata_mut(id);
        meta.tag = tag;
        if keep_spelling {
            meta.original_formatting = Some(text);
        }
        self.attach(id, mark);
    }

    fn start_collection(
        &mut self,
        value: YamlValue,
        open: char,
        anchor_id: usize,
        tag: Option<String>,
        mark: &Marker,
    ) {
        let style = if self.is_flow_at(mark, open) {
            NodeStyle::Flow
        } else {
            NodeStyle::Default
        };
        let is_mapping = value.is_mapping();
        let id = self.new_node(value, style, anchor_id, mark);
        self.arena.metadata_mut(id).tag = tag;
        self.attach(id, mark);
        self.stack.push(if is_mapping {
            Frame::Mapping {
                node: id,
                pending_key: None,
            }
        } else {
            Frame::Sequence(id)
        });
    }
}

impl MarkedEventReceiver for ArenaBuilder<'_> {
    fn on_event(&mut self, event: Event, mark: Marker) {
        if self.failure.is_some() {
            return;
        }
        match event {
            Event::DocumentStart { .. } => {
                self.stack.clear();
                self.current_root = None;
            }
            Event::DocumentEnd => {
                let root = match self.current_root.take() {
                    Some(root) => root,
                    None => self.arena.alloc(YamlValue::Null, NodeOrigin::Document),
                };
                self.finished = Some(root);
            }
            Event::Scalar(text, style, anchor_id, tag) => {
                self.scalar(text, style, anchor_id, tag.as_ref().map(tag_text), &mark)
            }
            Event::SequenceStart(anchor_id, tag) => self.start_collection(
                YamlValue::Sequence(Vec::new()),
                '[',
                anchor_id,
                tag.as_ref().map(tag_text),
                &mark,
            ),
            Event::MappingStart(anchor_id, tag) => self.start_collection(
                YamlValue::Mapping(Default::default()),
                '{',
                anchor_id,
                tag.as_ref().map(tag_text),
                &mark,
            ),
            Event::SequenceEnd | Event::MappingEnd => {
                self.stack.pop();
            }
            Event::Alias(anchor_id) => {
                let Some(target) = self.source.anchored.get(&anchor_id).copied() else {
                    self.fail("alias refers to an unknown anchor", &mark);
                    return;
                };
                if matches!(self.stack.last(), Some(Frame::Mapping { pending_key: None, .. })) {
                    self.fail("aliases used as mapping keys are not supported", &mark);
                    return;
                }
                let id = self.new_node(YamlValue::Alias(target), NodeStyle::Default, 0, &mark);
                self.attach(id, &mark);
            }
            _ => {}
        }
    }
}

/// Short form of a resolved tag: `!!str` for core-schema tags, the handle and
/// suffix as written otherwise.
fn tag_text(tag: &Tag) -> String {
    match tag.handle.as_str() {
        "tag:yaml.org,2002:" => format!("!!{}", tag.suffix),
        handle => format!("{}{}", handle, tag.suffix),
    }
}

fn position_of(mark: &Marker) -> TextPosition {
    TextPosition {
        line: mark.line(),
        column: mark.col(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(text: &str) -> (DocumentArena, NodeId) {
        let mut arena = DocumentArena::new();
        let roots = parse_documents(text, "test.yml", 0, &mut arena).unwrap();
        assert_eq!(roots.len(), 1);
        let root = roots[0].node;
        (arena, root)
    }

    #[test]
    fn test_parse_simple_mapping() {
        let (arena, root) = parse_one("name: Test\ncount: 42\nenabled: true\n");
        let count = arena.child_by_key(root, "count").unwrap();
        assert_eq!(arena.value(count), &YamlValue::Number(YamlNumber::Integer(42)));
        let enabled = arena.child_by_key(root, "enabled").unwrap();
        assert_eq!(arena.value(enabled), &YamlValue::Boolean(true));
    }

    #[test]
    fn test_parse_sequence() {
        let (arena, root) = parse_one("- Alice\n- Bob\n- Carol\n");
        assert_eq!(arena.all_children(root).len(), 3);
        let bob = arena.child_by_index(root, 1).unwrap();
        assert_eq!(arena.value(bob), &YamlValue::String("Bob".to_string()));
    }

    #[test]
    fn test_parse_multiple_documents() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("a: 1\n---\na: 2\n---\na: 3\n", "s.yml", 5, &mut arena).unwrap();
        let indices: Vec<usize> = roots.iter().map(|r| r.document_index).collect();
        assert_eq!(indices, vec![5, 6, 7]);
        assert!(roots.iter().all(|r| &*r.source_id == "s.yml"));
    }

    #[test]
    fn test_parse_empty_text_has_no_documents() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("", "empty.yml", 0, &mut arena).unwrap();
        assert!(roots.is_empty());
    }

    #[test]
    fn test_quoted_scalars_stay_strings() {
        let (arena, root) = parse_one("a: \"42\"\nb: 'true'\n");
        let a = arena.child_by_key(root, "a").unwrap();
        assert_eq!(arena.value(a), &YamlValue::String("42".to_string()));
        assert_eq!(arena.metadata(a).style, NodeStyle::DoubleQuoted);
        let b = arena.child_by_key(root, "b").unwrap();
        assert_eq!(arena.metadata(b).style, NodeStyle::SingleQuoted);
    }

    #[test]
    fn test_flow_style_detected() {
        let (arena, root) = parse_one("items: [1, 2]\nmeta: {x: 1}\n");
        let items = arena.child_by_key(root, "items").unwrap();
        assert_eq!(arena.metadata(items).style, NodeStyle::Flow);
        let meta = arena.child_by_key(root, "meta").unwrap();
        assert_eq!(arena.metadata(meta).style, NodeStyle::Flow);
        assert_eq!(arena.metadata(root).style, NodeStyle::Default);
    }

    #[test]
    fn test_anchor_and_alias() {
        let (arena, root) = parse_one("defaults: &config\n  timeout: 30\nprod:\n  settings: *config\n");
        let defaults = arena.child_by_key(root, "defaults").unwrap();
        assert_eq!(arena.metadata(defaults).anchor.as_deref(), Some("config"));
        let prod = arena.child_by_key(root, "prod").unwrap();
        let settings = arena.child_by_key(prod, "settings").unwrap();
        assert_eq!(arena.value(settings), &YamlValue::Alias(defaults));
        assert!(arena.child_by_key(settings, "timeout").is_some());
    }

    #[test]
    fn test_comments_attached() {
        let (arena, root) = parse_one("# about a\na: 1 # one\nb: 2\n");
        let a = arena.child_by_key(root, "a").unwrap();
        assert_eq!(arena.metadata(a).line_comment.as_deref(), Some("one"));
        let b = arena.child_by_key(root, "b").unwrap();
        assert!(arena.metadata(b).line_comment.is_none());
        let head = arena
            .metadata(root)
            .head_comment
            .clone()
            .or_else(|| arena.metadata(a).head_comment.clone());
        assert_eq!(head.as_deref(), Some("about a"));
    }

    #[test]
    fn test_explicit_tags_kept() {
        let (arena, root) = parse_one("a: !!str 123\nb: !custom x\nc: 5\n");
        let a = arena.child_by_key(root, "a").unwrap();
        assert_eq!(arena.value(a), &YamlValue::String("123".to_string()));
        assert_eq!(arena.metadata(a).tag.as_deref(), Some("!!str"));
        let b = arena.child_by_key(root, "b").unwrap();
        assert_eq!(arena.get(b).tag(), "!custom");
        let c = arena.child_by_key(root, "c").unwrap();
        assert_eq!(arena.metadata(c).tag, None);
    }

    #[test]
    fn test_hash_inside_quotes_is_not_comment() {
        let (arena, root) = parse_one("a: \"x # y\"\n");
        let a = arena.child_by_key(root, "a").unwrap();
        assert_eq!(arena.value(a), &YamlValue::String("x # y".to_string()));
        assert!(arena.metadata(a).line_comment.is_none());
    }

    #[test]
    fn test_resolve_plain_scalar() {
        assert_eq!(resolve_plain_scalar("~"), YamlValue::Null);
        assert_eq!(resolve_plain_scalar("FALSE"), YamlValue::Boolean(false));
        assert_eq!(
            resolve_plain_scalar("0x1F"),
            YamlValue::Number(YamlNumber::Integer(31))
        );
        assert_eq!(
            resolve_plain_scalar("-2.5"),
            YamlValue::Number(YamlNumber::Float(-2.5))
        );
        assert_eq!(
            resolve_plain_scalar("inf"),
            YamlValue::String("inf".to_string())
        );
        assert_eq!(
            resolve_plain_scalar("1.2.3"),
            YamlValue::String("1.2.3".to_string())
        );
    }

    #[test]
    fn test_ampersand_inside_plain_scalar_is_not_an_anchor() {
        let (arena, root) = parse_one("a: Tom &Jerry\nb: &x 1\nc: *x\n");
        let a = arena.child_by_key(root, "a").unwrap();
        assert_eq!(arena.value(a), &YamlValue::String("Tom &Jerry".to_string()));
        assert_eq!(arena.metadata(a).anchor, None);
        let b = arena.child_by_key(root, "b").unwrap();
        assert_eq!(arena.metadata(b).anchor.as_deref(), Some("x"));
        let c = arena.child_by_key(root, "c").unwrap();
        assert_eq!(arena.value(c), &YamlValue::Alias(b));
    }

    #[test]
    fn test_anchor_names_across_documents() {
        let mut arena = DocumentArena::new();
        let roots =
            parse_documents("a: &first 1\n---\nb: &second [x]\n", "s.yml", 0, &mut arena).unwrap();
        let a = arena.child_by_key(roots[0].node, "a").unwrap();
        let b = arena.child_by_key(roots[1].node, "b").unwrap();
        assert_eq!(arena.metadata(a).anchor.as_deref(), Some("first"));
        assert_eq!(arena.metadata(b).anchor.as_deref(), Some("second"));
    }

    #[test]
    fn test_reader_yields_documents_before_a_later_error() {
        let mut arena = DocumentArena::new();
        let mut reader = DocumentReader::new("a: 1\n---\na: [1\n", "one.yml", 4);

        let first = reader.next_document(&mut arena).unwrap().unwrap();
        assert_eq!(first.document_index, 4);
        let a = arena.child_by_key(first.node, "a").unwrap();
        assert_eq!(arena.value(a), &YamlValue::Number(YamlNumber::Integer(1)));

        let err = reader.next_document(&mut arena).unwrap_err();
        assert_eq!(err.source_id, "one.yml");
        assert_eq!(err.document_index, 5);
        assert_eq!(reader.next_document(&mut arena).unwrap(), None);
    }

    #[test]
    fn test_reader_stops_at_end_of_stream() {
        let mut arena = DocumentArena::new();
        let mut reader = DocumentReader::new("a: 1\n", "one.yml", 0);
        assert!(reader.next_document(&mut arena).unwrap().is_some());
        assert_eq!(reader.next_document(&mut arena).unwrap(), None);
        assert_eq!(reader.next_document(&mut arena).unwrap(), None);
    }

    #[test]
    fn test_parse_error_reports_document() {
        let mut arena = DocumentArena::new();
        let err = parse_documents("a: 1\n---\nb: [1, 2\n", "bad.yml", 0, &mut arena).unwrap_err();
        assert_eq!(err.source_id, "bad.yml");
        assert_eq!(err.document_index, 1);
    }
}
