//! YAML serialization and file saving.
//!
//! This module turns `YamlTree` structures back into YAML text and writes it
//! to files or any writer. Output is block style with the configured
//! indentation; comments, anchors, aliases, scalar styles and flow
//! collections are carried over from the tree. Generated text is re-parsed
//! before anything is written.

use crate::config::Config;
use crate::document::node::{
    Comments, MappingEntry, ScalarStyle, ScalarTag, YamlNode, YamlScalar, YamlValue,
};
use crate::document::parser::parse_yaml;
use crate::document::tree::YamlTree;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Saves a YAML stream to a file.
///
/// The stream is serialized, validated by parsing it again, and written
/// atomically: the text goes to a temporary file that is then renamed over
/// the target. Targets ending in `.gz` are gzip-compressed.
///
/// # Examples
///
/// ```no_run
/// use crd_gates::config::Config;
/// use crd_gates::file::loader::load_yaml_file;
/// use crd_gates::file::saver::save_yaml_stream;
///
/// let tree = load_yaml_file("crds.yaml").unwrap();
/// save_yaml_stream("crds.gated.yaml", &tree, &Config::default()).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The generated YAML does not parse (a serialization bug)
/// - Writing to the temp file fails
/// - Renaming the temp file to the target fails
pub fn save_yaml_stream<P: AsRef<Path>>(path: P, tree: &YamlTree, config: &Config) -> Result<()> {
    let path = path.as_ref();
    let should_compress = path.to_string_lossy().ends_with(".gz");

    let yaml = serialize_validated(tree, config)?;
    write_file_atomic(path, yaml.as_bytes(), should_compress)
}

/// Writes a YAML stream to `writer` after validating it.
pub fn write_yaml_stream<W: Write>(mut writer: W, tree: &YamlTree, config: &Config) -> Result<()> {
    let yaml = serialize_validated(tree, config)?;
    writer
        .write_all(yaml.as_bytes())
        .context("Failed to write output")?;
    writer.flush().context("Failed to write output")?;
    Ok(())
}

fn serialize_validated(tree: &YamlTree, config: &Config) -> Result<String> {
    let yaml = serialize_stream(tree, config);

    // Catch serialization bugs before they reach the output.
    parse_yaml(&yaml)
        .context("Generated invalid YAML - this is a bug in crd-gates' serialization")?;

    Ok(yaml)
}

/// Writes data to a file atomically, optionally compressing with gzip.
///
/// # Errors
///
/// Returns an error if:
/// - Creating the temp file fails
/// - Writing or compressing fails
/// - Renaming the temp file fails
fn write_file_atomic<P: AsRef<Path>>(path: P, data: &[u8], compress: bool) -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;

    let path = path.as_ref();
    // Temp file is the full file name plus `.tmp`, e.g. `crd.yaml.tmp`.
    let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}

/// Serializes every document of `tree`, each as `---`, the document, and an
/// empty line.
pub fn serialize_stream(tree: &YamlTree, config: &Config) -> String {
    let mut out = String::new();
    for doc in tree.documents() {
        out.push_str("---");
        if let Some(text) = doc.comments().line.as_deref() {
            out.push_str(" # ");
            out.push_str(&single_line(text));
        }
        out.push('\n');
        out.push_str(&serialize_document(doc, config));
        out.push('\n');
    }
    out
}

/// Serializes one document without its `---` separator.
///
/// A node that is not a `Document` is serialized as document content.
pub fn serialize_document(doc: &YamlNode, config: &Config) -> String {
    let mut emitter = Emitter::new(config);
    emitter.emit_document(doc);
    emitter.out
}

/// Where a scalar is written; decides which styles are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Block,
    Flow,
    Key,
}

/// Text of a node written on the current line, plus the body lines of a
/// block scalar.
struct Inline {
    head: String,
    body: Vec<String>,
}

struct Emitter<'c> {
    out: String,
    config: &'c Config,
}

impl<'c> Emitter<'c> {
    fn new(config: &'c Config) -> Self {
        Self {
            out: String::new(),
            config,
        }
    }

    /// Indentation step, kept within what a block scalar indicator allows.
    fn step(&self) -> usize {
        self.config.indent_size.clamp(1, 9)
    }

    fn pad(&mut self, indent: usize) {
        self.out.extend(std::iter::repeat(' ').take(indent));
    }

    fn comment_lines(&mut self, text: Option<&str>, indent: usize) {
        let Some(text) = text else {
            return;
        };
        for line in text.split('\n') {
            self.pad(indent);
            self.out.push('#');
            if !line.is_empty() {
                self.out.push(' ');
                self.out.push_str(line);
            }
            self.out.push('\n');
        }
    }

    /// Writes the first line comment among `sources`, if any.
    fn line_comment(&mut self, sources: &[&Comments]) {
        if let Some(text) = sources.iter().find_map(|c| c.line.as_deref()) {
            self.out.push_str(" # ");
            self.out.push_str(&single_line(text));
        }
    }

    fn finish_line(&mut self, inline: Inline, sources: &[&Comments]) {
        self.line_comment(sources);
        self.out.push('\n');
        for line in inline.body {
            self.out.push_str(&line);
            self.out.push('\n');
        }
    }

    fn emit_document(&mut self, doc: &YamlNode) {
        let content = doc.content();
        let is_document = !std::ptr::eq(content, doc);
        if is_document {
            self.comment_lines(doc.comments().head.as_deref(), 0);
        }
        self.comment_lines(content.comments().head.as_deref(), 0);

        if is_block(content) {
            if let Some(anchor) = content.anchor() {
                self.out.push('&');
                self.out.push_str(anchor);
                self.line_comment(&[content.comments()]);
                self.out.push('\n');
            } else if let Some(text) = content.comments().line.as_deref() {
                self.comment_lines(Some(&single_line(text)), 0);
            }
            self.emit_body(content, 0);
        } else {
            let inline = self.inline(content, 0, Placement::Block);
            if !inline.head.is_empty() || content.comments().line.is_some() {
                self.out.push_str(&inline.head);
                self.finish_line(inline, &[content.comments()]);
            }
        }

        self.comment_lines(content.comments().foot.as_deref(), 0);
        if is_document {
            self.comment_lines(doc.comments().foot.as_deref(), 0);
        }
    }

    /// Writes the entries or items of a block collection at `indent`.
    fn emit_body(&mut self, node: &YamlNode, indent: usize) {
        match node.value() {
            YamlValue::Mapping(entries) => {
                for entry in entries.values() {
                    self.emit_entry(entry, indent, true);
                }
            }
            YamlValue::Sequence(items) => {
                for item in items {
                    self.emit_item(item, indent);
                }
            }
            _ => {}
        }
    }

    fn emit_entry(&mut self, entry: &MappingEntry, indent: usize, pad_first: bool) {
        let key = &entry.key;
        let value = &entry.value;

        if pad_first {
            self.comment_lines(key.comments().head.as_deref(), indent);
            self.comment_lines(value.comments().head.as_deref(), indent);
            self.pad(indent);
        }
        let key_text = self.inline(key, indent, Placement::Key).head;
        self.out.push_str(&key_text);
        self.out.push(':');

        if is_block(value) {
            if let Some(anchor) = value.anchor() {
                self.out.push_str(" &");
                self.out.push_str(anchor);
            }
            self.line_comment(&[key.comments(), value.comments()]);
            self.out.push('\n');
            let child = match value.value() {
                YamlValue::Sequence(_) if !self.config.indent_sequences => indent,
                _ => indent + self.step(),
            };
            self.emit_body(value, child);
        } else {
            let inline = self.inline(value, indent, Placement::Block);
            if !inline.head.is_empty() {
                self.out.push(' ');
                self.out.push_str(&inline.head);
            }
            self.finish_line(inline, &[value.comments(), key.comments()]);
        }

        self.comment_lines(value.comments().foot.as_deref(), indent);
        self.comment_lines(key.comments().foot.as_deref(), indent);
    }

    fn emit_item(&mut self, item: &YamlNode, indent: usize) {
        self.comment_lines(item.comments().head.as_deref(), indent);
        self.pad(indent);
        self.out.push('-');

        if is_block(item) {
            match item.value() {
                YamlValue::Mapping(entries) if is_compact_item(item) => {
                    self.out.push(' ');
                    for (i, entry) in entries.values().enumerate() {
                        self.emit_entry(entry, indent + 2, i > 0);
                    }
                }
                _ => {
                    if let Some(anchor) = item.anchor() {
                        self.out.push_str(" &");
                        self.out.push_str(anchor);
                    }
                    self.line_comment(&[item.comments()]);
                    self.out.push('\n');
                    self.emit_body(item, indent + 2);
                }
            }
        } else {
            let inline = self.inline(item, indent, Placement::Block);
            if !inline.head.is_empty() {
                self.out.push(' ');
                self.out.push_str(&inline.head);
            }
            self.finish_line(inline, &[item.comments()]);
        }

        self.comment_lines(item.comments().foot.as_deref(), indent);
    }

    /// Renders a node that fits on the current line: scalars, aliases, flow
    /// and empty collections.
    fn inline(&self, node: &YamlNode, indent: usize, ctx: Placement) -> Inline {
        let mut head = String::new();
        if let Some(anchor) = node.anchor() {
            head.push('&');
            head.push_str(anchor);
            head.push(' ');
        }

        let mut body = Vec::new();
        match node.value() {
            YamlValue::Document(content) => return self.inline(content, indent, ctx),
            YamlValue::Alias(name) => {
                head.push('*');
                head.push_str(name);
            }
            YamlValue::Scalar(scalar) => {
                if scalar.explicit_tag || matches!(scalar.tag, ScalarTag::Custom(_)) {
                    head.push_str(&scalar.tag.as_yaml_tag());
                    head.push(' ');
                }
                let (text, lines) = self.scalar(scalar, indent, ctx);
                head.push_str(&text);
                body = lines;
            }
            YamlValue::Mapping(entries) => {
                let parts: Vec<String> = entries
                    .values()
                    .map(|entry| {
                        format!(
                            "{}: {}",
                            self.inline(&entry.key, indent, Placement::Key).head,
                            self.inline(&entry.value, indent, Placement::Flow).head
                        )
                    })
                    .collect();
                head.push('{');
                head.push_str(&parts.join(", "));
                head.push('}');
            }
            YamlValue::Sequence(items) => {
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| self.inline(item, indent, Placement::Flow).head)
                    .collect();
                head.push('[');
                head.push_str(&parts.join(", "));
                head.push(']');
            }
        }

        let trimmed = head.trim_end().len();
        head.truncate(trimmed);
        Inline { head, body }
    }

    fn scalar(&self, scalar: &YamlScalar, indent: usize, ctx: Placement) -> (String, Vec<String>) {
        let value = scalar.value.as_str();

        if scalar.tag == ScalarTag::Null && value.is_empty() {
            let text = match ctx {
                Placement::Block => "",
                Placement::Flow => "null",
                Placement::Key => "\"\"",
            };
            return (text.to_string(), Vec::new());
        }

        let block = ctx == Placement::Block;
        match scalar.style {
            ScalarStyle::Literal if block => {
                if let Some(rendered) = self.literal(value, indent) {
                    return rendered;
                }
            }
            ScalarStyle::Folded if block => {
                if let Some(rendered) = self.folded(value, indent) {
                    return rendered;
                }
            }
            ScalarStyle::SingleQuoted if single_quotable(value) => {
                return (single_quoted(value), Vec::new());
            }
            ScalarStyle::DoubleQuoted => return (double_quoted(value), Vec::new()),
            ScalarStyle::Plain if plain_allowed(scalar, ctx) => {
                return (value.to_string(), Vec::new());
            }
            _ => {}
        }

        if block && value.contains('\n') {
            if let Some(rendered) = self.literal(value, indent) {
                return rendered;
            }
        }
        (double_quoted(value), Vec::new())
    }

    /// Renders `value` as a literal block scalar, if it can be one.
    fn literal(&self, value: &str, indent: usize) -> Option<(String, Vec<String>)> {
        let (content, chomp) = block_content(value)?;

        let step = self.step();
        let first = content.split('\n').find(|line| !line.is_empty())?;
        let indicator = if first.starts_with(' ') {
            step.to_string()
        } else {
            String::new()
        };

        let pad = " ".repeat(indent + step);
        let body = content
            .split('\n')
            .map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", pad, line)
                }
            })
            .collect();
        Some((format!("|{}{}", indicator, chomp), body))
    }

    /// Renders `value` as a folded block scalar, if it can be one.
    ///
    /// Each line break of the value becomes an empty line in the body.
    fn folded(&self, value: &str, indent: usize) -> Option<(String, Vec<String>)> {
        if value.starts_with('\n') {
            return None;
        }
        let (content, chomp) = block_content(value)?;
        if content
            .split('\n')
            .any(|line| line.starts_with([' ', '\t']) || line.ends_with([' ', '\t']))
        {
            return None;
        }

        let pad = " ".repeat(indent + self.step());
        let mut body = Vec::new();
        for (i, line) in content.split('\n').enumerate() {
            if i > 0 {
                body.push(String::new());
            }
            if !line.is_empty() {
                body.push(format!("{}{}", pad, line));
            }
        }
        Some((format!(">{}", chomp), body))
    }
}

/// Splits a block scalar value into its content and chomping indicator.
///
/// Values a block scalar cannot reproduce exactly yield `None`.
fn block_content(value: &str) -> Option<(&str, &'static str)> {
    if value
        .chars()
        .any(|c| c == '\r' || (c.is_control() && c != '\n' && c != '\t'))
    {
        return None;
    }
    let content = value.trim_end_matches('\n');
    if content.is_empty() {
        return None;
    }
    let chomp = match value.len() - content.len() {
        0 => "-",
        1 => "",
        _ => return None,
    };
    Some((content, chomp))
}

/// Whether a collection is written in block layout.
///
/// Flow collections switch to block layout when something inside them
/// carries comments, since flow layout has nowhere to put them.
fn is_block(node: &YamlNode) -> bool {
    let non_empty = match node.value() {
        YamlValue::Mapping(entries) => !entries.is_empty(),
        YamlValue::Sequence(items) => !items.is_empty(),
        _ => false,
    };
    non_empty && (!node.metadata().flow || has_inner_comments(node))
}

fn has_inner_comments(node: &YamlNode) -> bool {
    match node.value() {
        YamlValue::Mapping(entries) => entries.values().any(|entry| {
            !entry.key.comments().is_empty()
                || !entry.value.comments().is_empty()
                || has_inner_comments(&entry.value)
        }),
        YamlValue::Sequence(items) => items
            .iter()
            .any(|item| !item.comments().is_empty() || has_inner_comments(item)),
        _ => false,
    }
}

/// A mapping item can start on the `- ` line when nothing has to be written
/// between the dash and its first key.
fn is_compact_item(item: &YamlNode) -> bool {
    if item.anchor().is_some() || item.comments().line.is_some() {
        return false;
    }
    match item.value() {
        YamlValue::Mapping(entries) => entries.values().next().is_some_and(|first| {
            first.key.comments().head.is_none() && first.value.comments().head.is_none()
        }),
        _ => false,
    }
}

fn single_line(text: &str) -> String {
    text.split('\n').collect::<Vec<_>>().join(" ")
}

/// Whether `scalar` can be written unquoted in `ctx` and read back with the
/// same text and tag.
fn plain_allowed(scalar: &YamlScalar, ctx: Placement) -> bool {
    let value = scalar.value.as_str();
    if !is_plain_safe(value, ctx == Placement::Flow) {
        return false;
    }
    scalar.explicit_tag
        || matches!(scalar.tag, ScalarTag::Custom(_))
        || ScalarTag::resolve_plain(value) == scalar.tag
}

fn is_plain_safe(value: &str, flow: bool) -> bool {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if value.starts_with("---") || value.starts_with("...") {
        return false;
    }
    if first.is_whitespace() || value.ends_with([' ', '\t']) {
        return false;
    }
    if value.chars().any(|c| c.is_control()) {
        return false;
    }
    match first {
        '[' | ']' | '{' | '}' | ',' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
        | '@' | '`' => return false,
        '-' | '?' | ':' => match chars.next() {
            None => return false,
            Some(next) if next.is_whitespace() => return false,
            Some(next) if flow && matches!(next, ',' | '[' | ']' | '{' | '}') => return false,
            _ => {}
        },
        _ => {}
    }
    if value.contains(": ") || value.contains(" #") || value.ends_with(':') {
        return false;
    }
    if flow && value.contains([',', '[', ']', '{', '}']) {
        return false;
    }
    true
}

fn single_quotable(value: &str) -> bool {
    !value.chars().any(|c| c.is_control() && c != '\t')
}

fn single_quoted(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn double_quoted(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            c if c.is_control() && (c as u32) <= 0xff => {
                out.push_str(&format!("\\x{:02x}", c as u32))
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn round_trip(yaml: &str) -> String {
        let tree = parse_yaml(yaml).unwrap();
        serialize_stream(&tree, &Config::default())
    }

    fn mapping(entries: Vec<(&str, YamlNode)>) -> YamlNode {
        let mut fields = IndexMap::new();
        for (key, value) in entries {
            fields.insert(key.to_string(), MappingEntry::new(YamlNode::string(key), value));
        }
        YamlNode::new(YamlValue::Mapping(fields))
    }

    fn scalar_doc(value: YamlNode) -> String {
        serialize_document(&mapping(vec![("k", value)]), &Config::default())
    }

    #[test]
    fn test_round_trip_crd_layout() {
        let yaml = r#"# top comment
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: widgets.example.com # the name
spec:
  group: example.com
  versions:
  - name: v1
    served: true
    schema:
      openAPIV3Schema:
        type: object
        properties:
          replicas:
            description: 'Number of replicas.'
            type: integer
"#;
        assert_eq!(round_trip(yaml), format!("---\n{}\n", yaml));
    }

    #[test]
    fn test_stream_separators() {
        let out = round_trip("a: 1\n---\nb: 2\n");
        assert_eq!(out, "---\na: 1\n\n---\nb: 2\n\n");
    }

    #[test]
    fn test_empty_stream() {
        assert_eq!(round_trip(""), "");
    }

    #[test]
    fn test_head_and_foot_comments() {
        let mut key = YamlNode::string("replicas");
        key.comments_mut().head = Some("{{- if .scaling }}".into());
        key.comments_mut().foot = Some("{{- end }}".into());
        let mut fields = IndexMap::new();
        fields.insert(
            "replicas".to_string(),
            MappingEntry::new(
                key,
                mapping(vec![("description", YamlNode::string("Number of replicas."))]),
            ),
        );
        let root = mapping(vec![(
            "properties",
            YamlNode::new(YamlValue::Mapping(fields)),
        )]);

        assert_eq!(
            serialize_document(&root, &Config::default()),
            "properties:\n  # {{- if .scaling }}\n  replicas:\n    description: Number of replicas.\n  # {{- end }}\n"
        );
    }

    #[test]
    fn test_quotes_strings_that_would_change_type() {
        assert_eq!(scalar_doc(YamlNode::string("42")), "k: \"42\"\n");
        assert_eq!(scalar_doc(YamlNode::string("true")), "k: \"true\"\n");
        assert_eq!(scalar_doc(YamlNode::string("")), "k: \"\"\n");
        assert_eq!(scalar_doc(YamlNode::string("a: b")), "k: \"a: b\"\n");
        assert_eq!(scalar_doc(YamlNode::string("- x")), "k: \"- x\"\n");
        assert_eq!(scalar_doc(YamlNode::string("[[GATE:x]]")), "k: \"[[GATE:x]]\"\n");
        assert_eq!(scalar_doc(YamlNode::string("plain text")), "k: plain text\n");
    }

    #[test]
    fn test_multiline_string_becomes_literal() {
        assert_eq!(
            scalar_doc(YamlNode::string("line one\nline two\n")),
            "k: |\n  line one\n  line two\n"
        );
        assert_eq!(
            scalar_doc(YamlNode::string("no newline\nat end")),
            "k: |-\n  no newline\n  at end\n"
        );
        assert_eq!(
            scalar_doc(YamlNode::string("  indented\nfirst\n")),
            "k: |2\n    indented\n  first\n"
        );
    }

    #[test]
    fn test_unrepresentable_block_falls_back_to_double_quotes() {
        assert_eq!(scalar_doc(YamlNode::string("a\n\n")), "k: \"a\\n\\n\"\n");
        assert_eq!(scalar_doc(YamlNode::string("tab\there\r")), "k: \"tab\\there\\r\"\n");
    }

    #[test]
    fn test_block_scalars_round_trip() {
        let yaml = "a: |\n  keep # this\n  text\nb: >\n  folded\n\n  lines\n";
        let out = round_trip(yaml);
        assert_eq!(out, format!("---\n{}\n", yaml));
        let tree = parse_yaml(&out).unwrap();
        let root = tree.documents()[0].content();
        assert_eq!(root.get("a").unwrap().as_str(), Some("keep # this\ntext\n"));
        assert_eq!(root.get("b").unwrap().as_str(), Some("folded\nlines\n"));
    }

    #[test]
    fn test_flow_collections_stay_flow() {
        let yaml = "list: [a, b, 'c d']\nmap: {x: 1, y: [2, 3]}\nempty: {}\nnone: []\n";
        assert_eq!(round_trip(yaml), format!("---\n{}\n", yaml));
    }

    #[test]
    fn test_flow_mapping_with_comments_becomes_block() {
        let tree = parse_yaml("p: {r: {description: x}}\n").unwrap();
        let mut doc = tree.documents()[0].clone();
        doc.content_mut()
            .get_mut("p")
            .unwrap()
            .entry_mut("r")
            .unwrap()
            .key
            .comments_mut()
            .head = Some("gate".into());

        assert_eq!(
            serialize_document(&doc, &Config::default()),
            "p:\n  # gate\n  r: {description: x}\n"
        );
    }

    #[test]
    fn test_anchors_and_aliases() {
        let yaml = "base: &defaults\n  replicas: 1\ncopy: *defaults\nname: &n value\nother: *n\n";
        assert_eq!(round_trip(yaml), format!("---\n{}\n", yaml));
    }

    #[test]
    fn test_sequence_items() {
        let yaml = "items:\n- a # first\n- - nested\n- k: v\n  other: w\n-\n";
        let out = round_trip(yaml);
        assert_eq!(out, "---\nitems:\n- a # first\n-\n  - nested\n- k: v\n  other: w\n-\n\n");
        assert!(parse_yaml(&out).is_ok());
    }

    #[test]
    fn test_indent_sequences_option() {
        let config = Config {
            indent_sequences: true,
            indent_size: 4,
            ..Config::default()
        };
        let tree = parse_yaml("a:\n- x\nb:\n  c: 1\n").unwrap();
        assert_eq!(
            serialize_document(&tree.documents()[0], &config),
            "a:\n    - x\nb:\n    c: 1\n"
        );
    }

    #[test]
    fn test_document_comments() {
        let yaml = "--- # start\n# head\na: 1\n# foot\n";
        let out = round_trip(yaml);
        assert_eq!(out, "--- # start\n# head\na: 1\n# foot\n\n");
    }

    #[test]
    fn test_explicit_tags_kept() {
        let yaml = "port: !!str 8080\nsecret: !vault path/to/key\n";
        assert_eq!(round_trip(yaml), format!("---\n{}\n", yaml));
    }

    #[test]
    fn test_double_quoted_escapes() {
        assert_eq!(double_quoted("a\"b\\c\u{7}"), "\"a\\\"b\\\\c\\x07\"");
    }

    #[test]
    fn test_write_yaml_stream_to_writer() {
        let tree = parse_yaml("a: 1\n").unwrap();
        let mut buffer = Vec::new();
        write_yaml_stream(&mut buffer, &tree, &Config::default()).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "---\na: 1\n\n");
    }

    #[test]
    fn test_write_file_atomic_uncompressed() {
        use tempfile::NamedTempFile;

        let temp_file = NamedTempFile::new().unwrap();
        let target_path = temp_file.path();
        let data = b"test content";

        write_file_atomic(target_path, data, false).unwrap();

        let written = fs::read_to_string(target_path).unwrap();
        assert_eq!(written, "test content");
    }

    #[test]
    fn test_save_yaml_as_gzipped() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let tree = parse_yaml("name: v1\n").unwrap();
        let dir = tempfile::tempdir().unwrap();
        let gz_path = dir.path().join("out.yaml.gz");
        save_yaml_stream(&gz_path, &tree, &Config::default()).unwrap();

        let file = fs::File::open(&gz_path).unwrap();
        let mut decoder = GzDecoder::new(file);
        let mut decompressed = String::new();
        decoder.read_to_string(&mut decompressed).unwrap();
        assert_eq!(decompressed, "---\nname: v1\n\n");
        assert!(!dir.path().join("out.yaml.gz.tmp").exists());
    }
}
