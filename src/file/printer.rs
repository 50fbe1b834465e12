//! Result printers.
//!
//! This module turns evaluation results back into text. The YAML printer
//! reproduces the formatting metadata carried on each node (scalar and flow
//! style, anchors, aliases, explicit tags, comments, the original spelling of
//! numbers); the JSON printer goes through `serde_json`.
//!
//! Both printers implement [`OutputSink`] so the stream evaluator can hand them
//! results as they are produced.

use crate::document::candidate::CandidateNode;
use crate::document::node::{NodeId, NodeStyle, YamlNode, YamlNumber, YamlValue};
use crate::document::parser::resolve_plain_scalar;
use crate::document::tree::DocumentArena;
use crate::stream::OutputSink;
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

/// Formatting knobs shared by both printers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintOptions {
    /// Spaces per nesting level (0 selects compact JSON)
    pub indent_size: usize,
    /// Print top-level strings without quotes
    pub unwrap_scalars: bool,
    /// Emit head and line comments
    pub preserve_comments: bool,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            indent_size: 2,
            unwrap_scalars: true,
            preserve_comments: true,
        }
    }
}

/// Output encodings understood by the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Yaml,
    Json,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Yaml => write!(f, "yaml"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yaml" | "yml" | "y" => Ok(OutputFormat::Yaml),
            "json" | "j" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// Converts the subtree at `id` to a `serde_json::Value`.
///
/// Aliases are followed, mapping order is kept and integers stay integers.
/// Non-finite floats and alias cycles become `null`.
pub fn to_json_value(arena: &DocumentArena, id: NodeId) -> serde_json::Value {
    let mut visiting = Vec::new();
    json_value(arena, id, &mut visiting)
}

fn json_value(arena: &DocumentArena, id: NodeId, visiting: &mut Vec<NodeId>) -> serde_json::Value {
    let target = arena.resolve(id);
    if visiting.contains(&target) {
        return serde_json::Value::Null;
    }
    match arena.value(target) {
        YamlValue::Mapping(entries) => {
            visiting.push(target);
            let mut map = serde_json::Map::with_capacity(entries.len());
            for (key, child) in entries {
                map.insert(key.clone(), json_value(arena, *child, visiting));
            }
            visiting.pop();
            serde_json::Value::Object(map)
        }
        YamlValue::Sequence(items) => {
            visiting.push(target);
            let values = items
                .iter()
                .map(|child| json_value(arena, *child, visiting))
                .collect();
            visiting.pop();
            serde_json::Value::Array(values)
        }
        YamlValue::String(s) => serde_json::Value::String(s.clone()),
        YamlValue::Number(YamlNumber::Integer(i)) => serde_json::Value::from(*i),
        YamlValue::Number(YamlNumber::Float(f)) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        YamlValue::Boolean(b) => serde_json::Value::Bool(*b),
        YamlValue::Null | YamlValue::Alias(_) => serde_json::Value::Null,
    }
}

/// Renders the node at `id` as a YAML document body, ending with a newline.
///
/// A top-level alias is rendered as the node it refers to.
pub fn render_yaml(arena: &DocumentArena, id: NodeId, options: &PrintOptions) -> String {
    let mut writer = YamlWriter::new(arena, options);
    writer.document(arena.resolve(id));
    writer.out
}

/// Serializes JSON with `indent_size` spaces per level, or compactly for 0.
pub fn render_json(arena: &DocumentArena, id: NodeId, options: &PrintOptions) -> String {
    let value = to_json_value(arena, id);
    if options.unwrap_scalars {
        if let serde_json::Value::String(s) = &value {
            return format!("{}\n", s);
        }
    }
    if options.indent_size == 0 {
        return format!("{}\n", value);
    }

    let indent = " ".repeat(options.indent_size);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    match value.serialize(&mut serializer) {
        Ok(()) => {
            let mut text = String::from_utf8_lossy(&buffer).into_owned();
            text.push('\n');
            text
        }
        Err(_) => format!("{}\n", value),
    }
}

/// Streams results as YAML, separating documents with `---`.
pub struct YamlPrinter<W: Write> {
    writer: W,
    options: PrintOptions,
    last_document: Option<usize>,
}

impl<W: Write> YamlPrinter<W> {
    pub fn new(writer: W, options: PrintOptions) -> Self {
        Self {
            writer,
            options,
            last_document: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for YamlPrinter<W> {
    fn write_results(
        &mut self,
        arena: &DocumentArena,
        candidates: &[CandidateNode],
    ) -> io::Result<()> {
        for candidate in candidates {
            if self
                .last_document
                .is_some_and(|last| last != candidate.document_index)
            {
                self.writer.write_all(b"---\n")?;
            }
            self.last_document = Some(candidate.document_index);
            let text = render_yaml(arena, candidate.node, &self.options);
            self.writer.write_all(text.as_bytes())?;
        }
        self.writer.flush()
    }
}

/// Streams results as JSON values, one after another.
pub struct JsonPrinter<W: Write> {
    writer: W,
    options: PrintOptions,
}

impl<W: Write> JsonPrinter<W> {
    pub fn new(writer: W, options: PrintOptions) -> Self {
        Self { writer, options }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OutputSink for JsonPrinter<W> {
    fn write_results(
        &mut self,
        arena: &DocumentArena,
        candidates: &[CandidateNode],
    ) -> io::Result<()> {
        for candidate in candidates {
            let text = render_json(arena, candidate.node, &self.options);
            self.writer.write_all(text.as_bytes())?;
        }
        self.writer.flush()
    }
}

/// Where a value is being written; flow context forbids block constructs and
/// a few more plain characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Block,
    Flow,
}

struct YamlWriter<'a> {
    arena: &'a DocumentArena,
    options: &'a PrintOptions,
    out: String,
    /// Collections currently being written, to stop at alias cycles
    visiting: Vec<NodeId>,
}

impl<'a> YamlWriter<'a> {
    fn new(arena: &'a DocumentArena, options: &'a PrintOptions) -> Self {
        Self {
            arena,
            options,
            out: String::new(),
            visiting: Vec::new(),
        }
    }

    fn node(&self, id: NodeId) -> &'a YamlNode {
        self.arena.get(id)
    }

    fn document(&mut self, id: NodeId) {
        let node = self.node(id);
        self.head_comment(node, 0);
        let props = self.properties(node);

        match node.value() {
            YamlValue::String(s)
                if self.options.unwrap_scalars && props.is_empty() =>
            {
                self.out.push_str(s);
                self.line_comment(node);
                self.out.push('\n');
            }
            value if self.is_block_collection(id) => {
                if !props.is_empty() {
                    self.out.push_str(&props);
                    self.line_comment(node);
                    self.out.push('\n');
                }
                if value.is_mapping() {
                    self.mapping_entries(id, 0, false);
                } else {
                    self.sequence_items(id, 0, false);
                }
            }
            _ => {
                self.out.push_str(&props);
                if !props.is_empty() {
                    self.out.push(' ');
                }
                self.inline_value(id, self.options.indent_size);
            }
        }
    }

    fn is_block_collection(&self, id: NodeId) -> bool {
        let node = self.node(id);
        match node.value() {
            YamlValue::Mapping(entries) => {
                !entries.is_empty() && node.metadata().style != NodeStyle::Flow
            }
            YamlValue::Sequence(items) => {
                !items.is_empty() && node.metadata().style != NodeStyle::Flow
            }
            _ => false,
        }
    }

    /// Anchor and explicit tag, space separated.
    fn properties(&self, node: &YamlNode) -> String {
        let mut parts = Vec::new();
        if let Some(anchor) = node.anchor().filter(|a| !a.is_empty()) {
            parts.push(format!("&{}", anchor));
        }
        if let Some(tag) = node.metadata().tag.as_deref() {
            if tag != node.value().default_tag() {
                parts.push(tag.to_string());
            }
        }
        parts.join(" ")
    }

    fn head_comment(&mut self, node: &YamlNode, indent: usize) {
        if !self.options.preserve_comments {
            return;
        }
        if let Some(comment) = node.metadata().head_comment.as_deref() {
            for line in comment.lines() {
                self.indent(indent);
                if line.is_empty() {
                    self.out.push_str("#\n");
                } else {
                    self.out.push_str("# ");
                    self.out.push_str(line);
                    self.out.push('\n');
                }
            }
        }
    }

    fn line_comment(&mut self, node: &YamlNode) {
        if !self.options.preserve_comments {
            return;
        }
        if let Some(comment) = node.metadata().line_comment.as_deref() {
            self.out.push_str(" # ");
            self.out.push_str(comment);
        }
    }

    fn indent(&mut self, width: usize) {
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    /// Writes `key: value` lines at `indent`. With `inline_first` the cursor is
    /// already positioned after a `- ` and the first entry must not be indented.
    fn mapping_entries(&mut self, id: NodeId, indent: usize, inline_first: bool) {
        let YamlValue::Mapping(entries) = self.node(id).value() else {
            return;
        };
        self.visiting.push(id);
        for (position, (key, child)) in entries.iter().enumerate() {
            let child_node = self.node(*child);
            if position > 0 || !inline_first {
                self.head_comment(child_node, indent);
                self.indent(indent);
            }
            self.out.push_str(&key_text(key));
            self.out.push(':');
            self.nested_value(*child, indent);
        }
        self.visiting.pop();
    }

    fn sequence_items(&mut self, id: NodeId, indent: usize, inline_first: bool) {
        let YamlValue::Sequence(items) = self.node(id).value() else {
            return;
        };
        self.visiting.push(id);
        for (position, item) in items.iter().enumerate() {
            let item_node = self.node(*item);
            if position > 0 || !inline_first {
                self.head_comment(item_node, indent);
                self.indent(indent);
            }
            self.out.push('-');
            let props = self.properties(item_node);
            let nested = indent + 2;
            if self.is_block_collection(*item) && !self.visiting.contains(item) {
                if props.is_empty() && !self.has_line_comment(item_node) {
                    self.out.push(' ');
                    if item_node.value().is_mapping() {
                        self.mapping_entries(*item, nested, true);
                    } else {
                        self.sequence_items(*item, nested, true);
                    }
                } else {
                    if !props.is_empty() {
                        self.out.push(' ');
                        self.out.push_str(&props);
                    }
                    self.line_comment(item_node);
                    self.out.push('\n');
                    self.block_collection(*item, nested);
                }
            } else {
                self.out.push(' ');
                if !props.is_empty() {
                    self.out.push_str(&props);
                    self.out.push(' ');
                }
                self.inline_value(*item, nested);
            }
        }
        self.visiting.pop();
    }

    fn has_line_comment(&self, node: &YamlNode) -> bool {
        self.options.preserve_comments && node.metadata().line_comment.is_some()
    }

    fn block_collection(&mut self, id: NodeId, indent: usize) {
        if self.node(id).value().is_mapping() {
            self.mapping_entries(id, indent, false);
        } else {
            self.sequence_items(id, indent, false);
        }
    }

    /// Writes the value of a mapping entry whose `key:` is already out.
    fn nested_value(&mut self, id: NodeId, indent: usize) {
        let node = self.node(id);
        let props = self.properties(node);

        if self.is_block_collection(id) && !self.visiting.contains(&id) {
            if !props.is_empty() {
                self.out.push(' ');
                self.out.push_str(&props);
            }
            self.line_comment(node);
            self.out.push('\n');
            let nested = indent + self.options.indent_size;
            if node.value().is_mapping() {
                self.mapping_entries(id, nested, false);
            } else {
                self.sequence_items(id, nested, false);
            }
            return;
        }

        self.out.push(' ');
        if !props.is_empty() {
            self.out.push_str(&props);
            self.out.push(' ');
        }
        self.inline_value(id, indent + self.options.indent_size);
    }

    /// Writes a scalar, alias or flow collection followed by its line comment
    /// and a newline. Block scalars continue on the following lines at
    /// `content_indent`.
    fn inline_value(&mut self, id: NodeId, content_indent: usize) {
        let node = self.node(id);
        if let YamlValue::String(s) = node.value() {
            if let Some(header) = block_scalar_header(s, node.metadata().style) {
                self.out.push_str(&header);
                self.line_comment(node);
                self.out.push('\n');
                self.block_scalar_body(s, node.metadata().style, content_indent);
                return;
            }
        }
        let text = self.flow_text(id, Context::Block);
        self.out.push_str(&text);
        self.line_comment(node);
        self.out.push('\n');
    }

    fn block_scalar_body(&mut self, text: &str, style: NodeStyle, indent: usize) {
        let body = text.trim_end_matches('\n');
        let separator = if style == NodeStyle::Folded { "\n\n" } else { "\n" };
        for (position, line) in body.split('\n').enumerate() {
            if position > 0 && separator.len() > 1 {
                self.out.push('\n');
            }
            if !line.is_empty() {
                self.indent(indent);
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }

    /// Single-line rendering of any node.
    fn flow_text(&mut self, id: NodeId, context: Context) -> String {
        let node = self.node(id);
        match node.value() {
            YamlValue::Alias(target) => match self.node(*target).anchor() {
                Some(name) if !name.is_empty() => format!("*{}", name),
                _ if self.visiting.contains(target) => "null".to_string(),
                _ => self.flow_text(*target, context),
            },
            YamlValue::Mapping(entries) => {
                if entries.is_empty() {
                    return "{}".to_string();
                }
                if self.visiting.contains(&id) {
                    return "null".to_string();
                }
                self.visiting.push(id);
                let parts: Vec<String> = entries
                    .iter()
                    .map(|(key, child)| {
                        let props = self.properties(self.node(*child));
                        let value = self.flow_text(*child, Context::Flow);
                        format!("{}: {}", flow_key_text(key), prefixed(&props, value))
                    })
                    .collect();
                self.visiting.pop();
                format!("{{{}}}", parts.join(", "))
            }
            YamlValue::Sequence(items) => {
                if items.is_empty() {
                    return "[]".to_string();
                }
                if self.visiting.contains(&id) {
                    return "null".to_string();
                }
                self.visiting.push(id);
                let parts: Vec<String> = items
                    .iter()
                    .map(|child| {
                        let props = self.properties(self.node(*child));
                        let value = self.flow_text(*child, Context::Flow);
                        prefixed(&props, value)
                    })
                    .collect();
                self.visiting.pop();
                format!("[{}]", parts.join(", "))
            }
            _ => scalar_text(node, context),
        }
    }
}

fn prefixed(props: &str, value: String) -> String {
    if props.is_empty() {
        value
    } else {
        format!("{} {}", props, value)
    }
}

/// `|` / `>` header with chomping indicator, or `None` when the string cannot
/// be written as a block scalar.
fn block_scalar_header(text: &str, style: NodeStyle) -> Option<String> {
    let indicator = match style {
        NodeStyle::Literal => '|',
        NodeStyle::Folded => '>',
        _ => return None,
    };
    if text.is_empty()
        || text.starts_with([' ', '\t'])
        || text.chars().any(|c| c.is_control() && c != '\n')
    {
        return None;
    }
    if style == NodeStyle::Folded && text.split('\n').any(|line| line.starts_with([' ', '\t'])) {
        return None;
    }
    let chomp = if !text.ends_with('\n') {
        "-"
    } else if text.ends_with("\n\n") {
        "+"
    } else {
        ""
    };
    Some(format!("{}{}", indicator, chomp))
}

fn scalar_text(node: &YamlNode, context: Context) -> String {
    match node.value() {
        YamlValue::Null => original_spelling(node).unwrap_or_else(|| "null".to_string()),
        YamlValue::Boolean(b) => b.to_string(),
        YamlValue::Number(n) => original_spelling(node).unwrap_or_else(|| n.to_string()),
        YamlValue::String(s) => match node.metadata().style {
            NodeStyle::DoubleQuoted => double_quoted(s),
            NodeStyle::SingleQuoted if !s.chars().any(|c| c.is_control()) => single_quoted(s),
            _ if is_plain_safe(s, context) => s.clone(),
            _ => double_quoted(s),
        },
        _ => "null".to_string(),
    }
}

/// The source spelling of a number or null, when it still denotes the node's value.
fn original_spelling(node: &YamlNode) -> Option<String> {
    let spelling = node.metadata().original_formatting.as_deref()?;
    let matches = match (resolve_plain_scalar(spelling), node.value()) {
        (YamlValue::Null, YamlValue::Null) => true,
        (YamlValue::Number(YamlNumber::Integer(a)), YamlValue::Number(YamlNumber::Integer(b))) => {
            a == *b
        }
        (YamlValue::Number(YamlNumber::Float(a)), YamlValue::Number(YamlNumber::Float(b))) => {
            a == *b || (a.is_nan() && b.is_nan())
        }
        _ => false,
    };
    matches.then(|| spelling.to_string())
}

fn key_text(key: &str) -> String {
    if is_plain_safe(key, Context::Block) {
        key.to_string()
    } else {
        double_quoted(key)
    }
}

fn flow_key_text(key: &str) -> String {
    if is_plain_safe(key, Context::Flow) {
        key.to_string()
    } else {
        double_quoted(key)
    }
}

/// True when `s` reads back as the same string if written without quotes.
fn is_plain_safe(s: &str, context: Context) -> bool {
    if s.is_empty() || s != s.trim() {
        return false;
    }
    if !matches!(resolve_plain_scalar(s), YamlValue::String(_)) {
        return false;
    }
    if s.chars().any(|c| c.is_control()) {
        return false;
    }
    if s.starts_with([
        '[', ']', '{', '}', ',', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@', '`',
    ]) {
        return false;
    }
    if matches!(s, "-" | "?" | ":" | "---" | "...")
        || s.starts_with("- ")
        || s.starts_with("? ")
        || s.starts_with(": ")
    {
        return false;
    }
    if s.contains(": ") || s.contains(" #") || s.ends_with(':') {
        return false;
    }
    if context == Context::Flow && s.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    true
}

fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Double-quoted YAML scalar; the escapes are a superset of JSON's.
fn double_quoted(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 2);
    result.push('"');
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '"' => result.push_str("\\\""),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            '\x08' => result.push_str("\\b"),
            '\x0C' => result.push_str("\\f"),
            '\0' => result.push_str("\\0"),
            c if c.is_control() => {
                result.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => result.push(c),
        }
    }
    result.push('"');
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_documents;
    use pretty_assertions::assert_eq;

    fn round_trip(yaml: &str) -> String {
        let mut arena = DocumentArena::new();
        let roots = parse_documents(yaml, "test.yml", 0, &mut arena).unwrap();
        render_yaml(&arena, roots[0].node, &PrintOptions::default())
    }

    #[test]
    fn test_block_mapping_and_sequence() {
        let yaml = "name: app\nports:\n  - 80\n  - 443\nenv:\n  debug: true\n";
        assert_eq!(round_trip(yaml), yaml);
    }

    #[test]
    fn test_sequence_of_mappings() {
        let yaml = "- name: a\n  port: 1\n- name: b\n  port: 2\n";
        assert_eq!(round_trip(yaml), yaml);
    }

    #[test]
    fn test_nested_sequences() {
        let yaml = "- - 1\n  - 2\n- - 3\n";
        assert_eq!(round_trip(yaml), yaml);
    }

    #[test]
    fn test_flow_style_is_kept() {
        let yaml = "a: [1, 2, 3]\nb: {x: 1, y: two}\n";
        assert_eq!(round_trip(yaml), yaml);
    }

    #[test]
    fn test_scalar_styles_are_kept() {
        let yaml = "a: 'single'\nb: \"double\"\nc: 0x1F\nd: ~\ne: \"123\"\n";
        assert_eq!(round_trip(yaml), yaml);
    }

    #[test]
    fn test_strings_that_need_quotes() {
        let mut arena = DocumentArena::new();
        let root = arena.new_mapping(crate::document::node::NodeOrigin::Computed);
        for (key, text) in [("a", "true"), ("b", "x: y"), ("c", ""), ("d", "- item")] {
            let child = arena.alloc(
                YamlValue::String(text.to_string()),
                crate::document::node::NodeOrigin::Computed,
            );
            arena.insert_key(root, key, child);
        }
        assert_eq!(
            render_yaml(&arena, root, &PrintOptions::default()),
            "a: \"true\"\nb: \"x: y\"\nc: \"\"\nd: \"- item\"\n"
        );
    }

    #[test]
    fn test_literal_block_scalar() {
        let yaml = "script: |\n  echo one\n  echo two\nnote: >-\n  folded\n";
        assert_eq!(round_trip(yaml), yaml);
    }

    #[test]
    fn test_anchors_aliases_and_tags() {
        let yaml = "base: &base\n  x: 1\nother: *base\nsecret: !vault abc\n";
        assert_eq!(round_trip(yaml), yaml);
    }

    #[test]
    fn test_comments() {
        let yaml = "# the app\nname: app # inline\n# ports below\nports:\n  - 80\n";
        assert_eq!(round_trip(yaml), yaml);

        let mut arena = DocumentArena::new();
        let roots = parse_documents(yaml, "test.yml", 0, &mut arena).unwrap();
        let options = PrintOptions {
            preserve_comments: false,
            ..PrintOptions::default()
        };
        assert_eq!(
            render_yaml(&arena, roots[0].node, &options),
            "name: app\nports:\n  - 80\n"
        );
    }

    #[test]
    fn test_indent_size() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("a:\n  b:\n    - 1\n", "test.yml", 0, &mut arena).unwrap();
        let options = PrintOptions {
            indent_size: 4,
            ..PrintOptions::default()
        };
        assert_eq!(
            render_yaml(&arena, roots[0].node, &options),
            "a:\n    b:\n        - 1\n"
        );
    }

    #[test]
    fn test_unwrap_scalars() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("\"true\"\n", "test.yml", 0, &mut arena).unwrap();
        let root = roots[0].node;
        assert_eq!(render_yaml(&arena, root, &PrintOptions::default()), "true\n");
        let quoted = PrintOptions {
            unwrap_scalars: false,
            ..PrintOptions::default()
        };
        assert_eq!(render_yaml(&arena, root, &quoted), "\"true\"\n");
    }

    #[test]
    fn test_json_value_keeps_order_and_integers() {
        let mut arena = DocumentArena::new();
        let roots =
            parse_documents("z: 1\na: 1.5\nm: &m [x]\nr: *m\n", "test.yml", 0, &mut arena).unwrap();
        assert_eq!(
            to_json_value(&arena, roots[0].node).to_string(),
            r#"{"z":1,"a":1.5,"m":["x"],"r":["x"]}"#
        );
    }

    #[test]
    fn test_render_json_indent() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("a: [1]\n", "test.yml", 0, &mut arena).unwrap();
        let compact = PrintOptions {
            indent_size: 0,
            ..PrintOptions::default()
        };
        assert_eq!(render_json(&arena, roots[0].node, &compact), "{\"a\":[1]}\n");
        assert_eq!(
            render_json(&arena, roots[0].node, &PrintOptions::default()),
            "{\n  \"a\": [\n    1\n  ]\n}\n"
        );
    }

    #[test]
    fn test_yaml_printer_separates_documents() {
        let mut arena = DocumentArena::new();
        let roots = parse_documents("a: 1\n---\na: 2\n", "test.yml", 0, &mut arena).unwrap();
        let mut printer = YamlPrinter::new(Vec::new(), PrintOptions::default());
        printer.write_results(&arena, &roots[..1]).unwrap();
        printer.write_results(&arena, &roots[1..]).unwrap();
        let text = String::from_utf8(printer.into_inner()).unwrap();
        assert_eq!(text, "a: 1\n---\na: 2\n");
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("YAML".parse::<OutputFormat>(), Ok(OutputFormat::Yaml));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("toml".parse::<OutputFormat>().is_err());
    }
}
