//! YAML parsing with comment, anchor and position preservation.
//!
//! This module turns YAML text into a `YamlTree`. Structure comes from
//! `yaml-rust2`'s event parser, which reports the source position of every
//! node. Parser events only carry numeric anchor ids, so anchor names are
//! read back from the source text preceding the anchored node. Comments are not part
//! of the event stream at all, so they are recovered from the source lines
//! and attached to the nodes around them:
//!
//! - a run of full-line comments becomes the head comment of the next mapping
//!   key, sequence item or document,
//! - a comment after content on the same line becomes the line comment of the
//!   last node starting on that line,
//! - comments after the last node of a document become its foot comment.
//!
//! `#` characters inside quoted or block scalars are content and are masked
//! out before the comment scan.
//!
//! # Example
//!
//! ```
//! use crd_gates::document::parser::parse_yaml;
//!
//! let yaml = "# served versions\nversions:\n  - name: v1 # current\n";
//! let tree = parse_yaml(yaml).unwrap();
//!
//! let root = tree.documents()[0].content();
//! let entry = root.entry("versions").unwrap();
//! assert_eq!(entry.key.comments().head.as_deref(), Some("served versions"));
//! ```

use super::error::DocumentError;
use super::node::{
    MappingEntry, NodeMetadata, Position, ScalarStyle, ScalarTag, YamlNode, YamlScalar,
    YamlValue,
};
use super::tree::YamlTree;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Parses a YAML stream into a `YamlTree`.
///
/// Every document of the stream becomes one `Document` node. Empty input
/// yields an empty tree.
///
/// # Errors
///
/// Returns a `DocumentError` if the input is not well-formed YAML, if a
/// mapping repeats a key, uses a non-scalar key, or if an alias refers to an
/// unknown anchor.
pub fn parse_yaml(source: &str) -> Result<YamlTree, DocumentError> {
    let lines = SourceLines::new(source);

    let mut builder = TreeBuilder::new(&lines);
    let mut parser = Parser::new_from_str(source);
    parser
        .load(&mut builder, true)
        .map_err(|e| DocumentError::Scan {
            line: e.marker().line(),
            column: e.marker().col() + 1,
            message: e.info().to_string(),
        })?;

    if let Some(err) = builder.error {
        return Err(err);
    }

    let comments = scan_comments(&lines, &builder.masks);
    let mut documents = builder.documents;
    attach_comments(&mut documents, comments);

    Ok(YamlTree::new(documents))
}

/// Finds the last anchor declared in `text`, ignoring comments.
fn find_anchor(text: &str) -> Option<String> {
    let mut found = None;
    for line in text.split('\n') {
        let mut prev: Option<char> = None;
        let mut chars = line.char_indices().peekable();
        while let Some((idx, c)) = chars.next() {
            let boundary = matches!(prev, None | Some(' ' | '\t' | '[' | '{' | ','));
            if c == '#' && boundary {
                break;
            }
            if c == '&' && boundary {
                let name: String = line[idx + 1..]
                    .chars()
                    .take_while(|c| !c.is_whitespace() && !matches!(c, ',' | '[' | ']' | '{' | '}'))
                    .collect();
                if !name.is_empty() {
                    found = Some(name);
                }
            }
            prev = Some(c);
        }
    }
    found
}

/// Line-oriented view of the source text.
struct SourceLines<'a> {
    source: &'a str,
    starts: Vec<usize>,
    lines: Vec<&'a str>,
}

impl<'a> SourceLines<'a> {
    fn new(source: &'a str) -> Self {
        let mut starts = Vec::new();
        let mut lines = Vec::new();
        let mut offset = 0;
        for line in source.split('\n') {
            starts.push(offset);
            offset += line.len() + 1;
            lines.push(line.strip_suffix('\r').unwrap_or(line));
        }
        Self {
            source,
            starts,
            lines,
        }
    }

    fn len(&self) -> usize {
        self.lines.len()
    }

    fn line(&self, idx: usize) -> &'a str {
        self.lines.get(idx).copied().unwrap_or("")
    }

    /// Byte offset of the character at (`line`, `column`), both 0-based.
    fn offset(&self, line: usize, column: usize) -> usize {
        let Some(start) = self.starts.get(line) else {
            return self.source.len();
        };
        let text = self.line(line);
        let within = text
            .char_indices()
            .nth(column)
            .map(|(idx, _)| idx)
            .unwrap_or(text.len());
        start + within
    }

    fn char_at(&self, position: Position) -> Option<char> {
        self.line(position.line).chars().nth(position.column)
    }
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Source regions whose `#` characters belong to scalar content.
#[derive(Default)]
struct ContentMasks {
    /// Byte ranges of quoted scalars
    quoted: Vec<(usize, usize)>,
    /// Content lines of block scalars
    block_lines: HashSet<usize>,
}

impl ContentMasks {
    fn is_quoted(&self, offset: usize) -> bool {
        self.quoted
            .iter()
            .any(|&(start, end)| offset >= start && offset < end)
    }
}

/// A collection under construction.
enum Frame {
    Document {
        content: Option<YamlNode>,
        position: Position,
    },
    Mapping {
        node: YamlNode,
        pending_key: Option<YamlNode>,
    },
    Sequence {
        node: YamlNode,
    },
}

/// Receives parser events and assembles the node tree.
struct TreeBuilder<'s> {
    lines: &'s SourceLines<'s>,
    anchors: HashMap<usize, String>,
    /// Position of the previous event
    last: Position,
    stack: Vec<Frame>,
    documents: Vec<YamlNode>,
    masks: ContentMasks,
    error: Option<DocumentError>,
}

impl<'s> TreeBuilder<'s> {
    fn new(lines: &'s SourceLines<'s>) -> Self {
        Self {
            lines,
            anchors: HashMap::new(),
            last: Position { line: 0, column: 0 },
            stack: Vec::new(),
            documents: Vec::new(),
            masks: ContentMasks::default(),
            error: None,
        }
    }

    fn position(mark: &Marker) -> Position {
        Position {
            line: mark.line().saturating_sub(1),
            column: mark.col(),
        }
    }

    /// Maps a parser anchor id to its source name.
    ///
    /// The anchor token sits between the previous event and the anchored
    /// node, so the name is read from that stretch of source.
    fn anchor_name(&mut self, anchor_id: usize, position: Position) -> Option<String> {
        if anchor_id == 0 {
            return None;
        }
        if let Some(name) = self.anchors.get(&anchor_id) {
            return Some(name.clone());
        }
        let end = self.lines.offset(position.line, position.column);
        let mut start = self.lines.offset(self.last.line, self.last.column);
        // A block mapping's start event sits at its first `:`, past the key.
        if start > end {
            start = self.lines.offset(position.line, 0);
        }
        let name = self
            .lines
            .source
            .get(start..end)
            .and_then(find_anchor)
            .unwrap_or_else(|| format!("anchor{}", anchor_id));
        self.anchors.insert(anchor_id, name.clone());
        Some(name)
    }

    fn collection_metadata(&self, position: Position) -> NodeMetadata {
        NodeMetadata {
            position: Some(position),
            flow: matches!(self.lines.char_at(position), Some('{') | Some('[')),
        }
    }

    fn on_scalar(
        &mut self,
        value: String,
        style: TScalarStyle,
        anchor_id: usize,
        tag: Option<Tag>,
        position: Position,
    ) {
        let style = match style {
            TScalarStyle::SingleQuoted => ScalarStyle::SingleQuoted,
            TScalarStyle::DoubleQuoted => ScalarStyle::DoubleQuoted,
            TScalarStyle::Literal => ScalarStyle::Literal,
            TScalarStyle::Folded => ScalarStyle::Folded,
            _ => ScalarStyle::Plain,
        };

        // The parser reports an empty value as a plain "~" positioned at the
        // following token.
        let is_empty = style == ScalarStyle::Plain
            && tag.is_none()
            && value == "~"
            && self.lines.char_at(position) != Some('~');

        let (value, scalar_tag, explicit_tag) = if is_empty {
            (String::new(), ScalarTag::Null, false)
        } else {
            let (scalar_tag, explicit) = resolve_tag(tag.as_ref(), style, &value);
            (value, scalar_tag, explicit)
        };

        match style {
            ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
                self.mask_quoted(position, style)
            }
            ScalarStyle::Literal | ScalarStyle::Folded => self.mask_block(position),
            ScalarStyle::Plain => {}
        }

        let metadata = NodeMetadata {
            position: (!is_empty).then_some(position),
            flow: false,
        };
        let mut node = YamlNode::with_metadata(
            YamlValue::Scalar(YamlScalar {
                value,
                tag: scalar_tag,
                style,
                explicit_tag,
            }),
            metadata,
        );
        node.anchor = self.anchor_name(anchor_id, position);
        self.add_node(node);
    }

    /// Masks a quoted scalar from its opening quote to its closing quote.
    fn mask_quoted(&mut self, position: Position, style: ScalarStyle) {
        let bytes = self.lines.source.as_bytes();
        let start = self.lines.offset(position.line, position.column);
        let quote = if style == ScalarStyle::SingleQuoted {
            b'\''
        } else {
            b'"'
        };
        if bytes.get(start) != Some(&quote) {
            return;
        }

        let mut idx = start + 1;
        while idx < bytes.len() {
            match bytes[idx] {
                b'\\' if quote == b'"' => idx += 2,
                b'\'' if quote == b'\'' && bytes.get(idx + 1) == Some(&b'\'') => idx += 2,
                b if b == quote => {
                    idx += 1;
                    break;
                }
                _ => idx += 1,
            }
        }
        self.masks.quoted.push((start, idx.min(bytes.len())));
    }

    /// Masks the content lines of a block scalar whose header is at `position`.
    fn mask_block(&mut self, position: Position) {
        // Content must be indented past the owning key, or past the line
        // holding the header for sequence items and document roots.
        let owner_indent = match self.stack.last() {
            Some(Frame::Mapping {
                pending_key: Some(key),
                ..
            }) => key
                .metadata
                .position
                .map(|p| p.column)
                .unwrap_or_else(|| indentation(self.lines.line(position.line))),
            _ => indentation(self.lines.line(position.line)),
        };

        let mut line = position.line + 1;
        while line < self.lines.len() {
            let text = self.lines.line(line);
            if text.trim().is_empty() || indentation(text) > owner_indent {
                self.masks.block_lines.insert(line);
                line += 1;
            } else {
                break;
            }
        }
    }

    fn add_node(&mut self, node: YamlNode) {
        let line = node.metadata.position.map(|p| p.line + 1).unwrap_or(0);
        match self.stack.last_mut() {
            Some(Frame::Document { content, .. }) => *content = Some(node),
            Some(Frame::Sequence { node: seq }) => {
                if let YamlValue::Sequence(items) = &mut seq.value {
                    items.push(node);
                }
            }
            Some(Frame::Mapping { node: map, pending_key }) => match pending_key.take() {
                Some(key) => {
                    let name = key.as_str().unwrap_or_default().to_string();
                    if let YamlValue::Mapping(entries) = &mut map.value {
                        if entries.contains_key(&name) {
                            let line = key.metadata.position.map(|p| p.line + 1).unwrap_or(0);
                            self.error = Some(DocumentError::DuplicateKey { key: name, line });
                            return;
                        }
                        entries.insert(name, MappingEntry::new(key, node));
                    }
                }
                None => {
                    if node.as_scalar().is_none() {
                        self.error = Some(DocumentError::ComplexKey { line });
                        return;
                    }
                    *pending_key = Some(node);
                }
            },
            None => {}
        }
    }
}

impl MarkedEventReceiver for TreeBuilder<'_> {
    fn on_event(&mut self, ev: Event, mark: Marker) {
        if self.error.is_some() {
            return;
        }
        let position = Self::position(&mark);

        match ev {
            Event::DocumentStart { .. } => self.stack.push(Frame::Document {
                content: None,
                position,
            }),
            Event::DocumentEnd => {
                if let Some(Frame::Document { content, position }) = self.stack.pop() {
                    let content = content
                        .unwrap_or_else(|| YamlNode::new(YamlValue::Scalar(YamlScalar::plain(""))));
                    let mut doc = YamlNode::document(content);
                    doc.metadata.position = Some(position);
                    self.documents.push(doc);
                }
            }
            Event::Alias(anchor_id) => match self.anchors.get(&anchor_id).cloned() {
                Some(name) => {
                    let node = YamlNode::with_metadata(
                        YamlValue::Alias(name),
                        NodeMetadata {
                            position: Some(position),
                            flow: false,
                        },
                    );
                    self.add_node(node);
                }
                None => {
                    self.error = Some(DocumentError::UnknownAlias {
                        line: position.line + 1,
                    })
                }
            },
            Event::Scalar(value, style, anchor_id, tag) => {
                self.on_scalar(value, style, anchor_id, tag, position)
            }
            Event::SequenceStart(anchor_id, _) => {
                let mut node = YamlNode::with_metadata(
                    YamlValue::Sequence(Vec::new()),
                    self.collection_metadata(position),
                );
                node.anchor = self.anchor_name(anchor_id, position);
                self.stack.push(Frame::Sequence { node });
            }
            Event::MappingStart(anchor_id, _) => {
                let mut node = YamlNode::with_metadata(
                    YamlValue::Mapping(IndexMap::new()),
                    self.collection_metadata(position),
                );
                node.anchor = self.anchor_name(anchor_id, position);
                self.stack.push(Frame::Mapping {
                    node,
                    pending_key: None,
                });
            }
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Sequence { node }) | Some(Frame::Mapping { node, .. }) => {
                    self.add_node(node)
                }
                Some(frame) => self.stack.push(frame),
                None => {}
            },
            _ => {}
        }
        self.last = position;
    }
}

/// Resolves the tag of a scalar and whether it was written explicitly.
fn resolve_tag(tag: Option<&Tag>, style: ScalarStyle, value: &str) -> (ScalarTag, bool) {
    let Some(tag) = tag else {
        let resolved = if style == ScalarStyle::Plain {
            ScalarTag::resolve_plain(value)
        } else {
            ScalarTag::Str
        };
        return (resolved, false);
    };

    let core = tag.handle == "!!" || tag.handle == "tag:yaml.org,2002:";
    let resolved = if core {
        match tag.suffix.as_str() {
            "str" => ScalarTag::Str,
            "int" => ScalarTag::Int,
            "float" => ScalarTag::Float,
            "bool" => ScalarTag::Bool,
            "null" => ScalarTag::Null,
            other => ScalarTag::Custom(format!("!!{}", other)),
        }
    } else {
        ScalarTag::Custom(format!("{}{}", tag.handle, tag.suffix))
    };
    (resolved, true)
}

/// Comments found in the source, by 0-based line.
#[derive(Debug, Default)]
struct SourceComments {
    full_line: Vec<(usize, String)>,
    trailing: Vec<(usize, String)>,
}

fn scan_comments(lines: &SourceLines<'_>, masks: &ContentMasks) -> SourceComments {
    let mut comments = SourceComments::default();

    for idx in 0..lines.len() {
        if masks.block_lines.contains(&idx) {
            continue;
        }
        let text = lines.line(idx);
        let bytes = text.as_bytes();
        let start = lines.starts[idx];

        let found = (0..bytes.len()).find(|&col| {
            bytes[col] == b'#'
                && (col == 0 || bytes[col - 1] == b' ' || bytes[col - 1] == b'\t')
                && !masks.is_quoted(start + col)
        });
        let Some(col) = found else {
            continue;
        };

        let body = &text[col + 1..];
        let body = body.strip_prefix(' ').unwrap_or(body).trim_end().to_string();
        if text[..col].trim().is_empty() {
            comments.full_line.push((idx, body));
        } else {
            comments.trailing.push((idx, body));
        }
    }

    comments
}

/// Records the line of every node in the order `CommentAttacher` visits them.
fn preorder_lines(node: &YamlNode, out: &mut Vec<Option<usize>>) {
    out.push(node.metadata.position.map(|p| p.line));
    if node.metadata.flow {
        return;
    }
    match &node.value {
        YamlValue::Document(content) => preorder_lines(content, out),
        YamlValue::Mapping(entries) => {
            for entry in entries.values() {
                preorder_lines(&entry.key, out);
                preorder_lines(&entry.value, out);
            }
        }
        YamlValue::Sequence(items) => {
            for item in items {
                preorder_lines(item, out);
            }
        }
        YamlValue::Scalar(_) | YamlValue::Alias(_) => {}
    }
}

struct CommentAttacher {
    /// Line comments keyed by the pre-order index of the owning node
    line_comments: HashMap<usize, String>,
    /// Full-line comments sorted by line
    full_line: Vec<(usize, String)>,
    cursor: usize,
    counter: usize,
}

impl CommentAttacher {
    /// Takes all pending full-line comments above `line`.
    fn take_before(&mut self, line: usize) -> Option<String> {
        let start = self.cursor;
        while self.cursor < self.full_line.len() && self.full_line[self.cursor].0 < line {
            self.cursor += 1;
        }
        if start == self.cursor {
            return None;
        }
        let taken: Vec<&str> = self.full_line[start..self.cursor]
            .iter()
            .map(|(_, text)| text.as_str())
            .collect();
        Some(taken.join("\n"))
    }

    fn attach(&mut self, node: &mut YamlNode, headable: bool) {
        let id = self.counter;
        self.counter += 1;

        if headable {
            if let Some(position) = node.metadata.position {
                if let Some(head) = self.take_before(position.line) {
                    node.comments.head = Some(head);
                }
            }
        }
        if let Some(text) = self.line_comments.remove(&id) {
            node.comments.line = Some(text);
        }
        if node.metadata.flow {
            return;
        }

        match &mut node.value {
            YamlValue::Document(content) => self.attach(content, false),
            YamlValue::Mapping(entries) => {
                for entry in entries.values_mut() {
                    self.attach(&mut entry.key, true);
                    self.attach(&mut entry.value, false);
                }
            }
            YamlValue::Sequence(items) => {
                for item in items {
                    self.attach(item, true);
                }
            }
            YamlValue::Scalar(_) | YamlValue::Alias(_) => {}
        }
    }
}

fn attach_comments(documents: &mut [YamlNode], comments: SourceComments) {
    let mut lines = Vec::new();
    for doc in documents.iter() {
        preorder_lines(doc, &mut lines);
    }

    // The last node starting on a line owns that line's trailing comment.
    let mut owner_by_line: HashMap<usize, usize> = HashMap::new();
    for (id, line) in lines.iter().enumerate() {
        if let Some(line) = line {
            owner_by_line.insert(*line, id);
        }
    }

    let mut full_line = comments.full_line;
    let mut line_comments = HashMap::new();
    for (line, text) in comments.trailing {
        match owner_by_line.get(&line) {
            Some(id) => {
                line_comments.insert(*id, text);
            }
            None => full_line.push((line, text)),
        }
    }
    full_line.sort_by_key(|(line, _)| *line);

    let mut attacher = CommentAttacher {
        line_comments,
        full_line,
        cursor: 0,
        counter: 0,
    };

    let starts: Vec<Option<usize>> = documents
        .iter()
        .map(|doc| doc.metadata.position.map(|p| p.line))
        .collect();
    for (idx, doc) in documents.iter_mut().enumerate() {
        attacher.attach(doc, true);
        let next_start = starts
            .get(idx + 1)
            .copied()
            .flatten()
            .unwrap_or(usize::MAX);
        if let Some(foot) = attacher.take_before(next_start) {
            doc.comments.foot = Some(foot);
        }
    }
}
