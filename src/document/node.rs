//! YAML node representation with comment and formatting metadata.
//!
//! This module provides the core data structures for representing YAML documents
//! in crd-gates. Each YAML value is wrapped in a `YamlNode` that carries its source
//! position, anchor, scalar style and the comments attached to it, so that a
//! document can be rewritten and serialized again without dropping comments,
//! ordering or anchors.
//!
//! # Example
//!
//! ```
//! use crd_gates::document::node::{MappingEntry, YamlNode, YamlScalar, YamlValue};
//! use indexmap::IndexMap;
//!
//! let mut fields = IndexMap::new();
//! fields.insert(
//!     "name".to_string(),
//!     MappingEntry::new(YamlNode::string("name"), YamlNode::string("v1")),
//! );
//! let mut node = YamlNode::new(YamlValue::Mapping(fields));
//!
//! node.comments_mut().head = Some("served version".to_string());
//! assert_eq!(node.get("name").and_then(|n| n.as_str()), Some("v1"));
//! assert!(matches!(
//!     node.get("name").unwrap().value(),
//!     YamlValue::Scalar(YamlScalar { .. })
//! ));
//! ```

use indexmap::IndexMap;

/// A position in the original YAML source (0-based line and column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Presentation style of a scalar in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScalarStyle {
    #[default]
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// Resolved type tag of a scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarTag {
    Str,
    Int,
    Float,
    Bool,
    Null,
    /// A non-core tag, kept as written (e.g. `!secret`).
    Custom(String),
}

impl ScalarTag {
    /// Resolves the tag of a plain scalar using the YAML 1.2 core schema.
    ///
    /// ```
    /// use crd_gates::document::node::ScalarTag;
    ///
    /// assert_eq!(ScalarTag::resolve_plain("true"), ScalarTag::Bool);
    /// assert_eq!(ScalarTag::resolve_plain("0x1f"), ScalarTag::Int);
    /// assert_eq!(ScalarTag::resolve_plain(".inf"), ScalarTag::Float);
    /// assert_eq!(ScalarTag::resolve_plain("~"), ScalarTag::Null);
    /// assert_eq!(ScalarTag::resolve_plain("v1beta1"), ScalarTag::Str);
    /// ```
    pub fn resolve_plain(value: &str) -> ScalarTag {
        match value {
            "" | "~" | "null" | "Null" | "NULL" => return ScalarTag::Null,
            "true" | "True" | "TRUE" | "false" | "False" | "FALSE" => return ScalarTag::Bool,
            ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" | "-.inf" | "-.Inf"
            | "-.INF" | ".nan" | ".NaN" | ".NAN" => return ScalarTag::Float,
            _ => {}
        }
        if is_core_int(value) {
            ScalarTag::Int
        } else if is_core_float(value) {
            ScalarTag::Float
        } else {
            ScalarTag::Str
        }
    }

    /// Returns the tag as it would be written explicitly in YAML.
    pub fn as_yaml_tag(&self) -> String {
        match self {
            ScalarTag::Str => "!!str".to_string(),
            ScalarTag::Int => "!!int".to_string(),
            ScalarTag::Float => "!!float".to_string(),
            ScalarTag::Bool => "!!bool".to_string(),
            ScalarTag::Null => "!!null".to_string(),
            ScalarTag::Custom(tag) => tag.clone(),
        }
    }
}

fn is_core_int(value: &str) -> bool {
    if let Some(hex) = value.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    if let Some(oct) = value.strip_prefix("0o") {
        return !oct.is_empty() && oct.chars().all(|c| ('0'..='7').contains(&c));
    }
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn is_core_float(value: &str) -> bool {
    let body = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };
    let mantissa_ok = match mantissa.split_once('.') {
        Some((int, frac)) => {
            (!int.is_empty() || !frac.is_empty())
                && int.chars().all(|c| c.is_ascii_digit())
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => !mantissa.is_empty() && mantissa.chars().all(|c| c.is_ascii_digit()),
    };
    let exponent_ok = match exponent {
        Some(exp) => {
            let digits = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
        }
        None => true,
    };
    mantissa_ok && exponent_ok
}

/// A scalar value with its tag and presentation style.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlScalar {
    pub value: String,
    pub tag: ScalarTag,
    pub style: ScalarStyle,
    /// Whether the tag was written explicitly in the source.
    pub explicit_tag: bool,
}

impl YamlScalar {
    /// Creates a plain string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tag: ScalarTag::Str,
            style: ScalarStyle::Plain,
            explicit_tag: false,
        }
    }

    /// Creates a plain scalar whose tag is resolved from its text.
    pub fn plain(value: impl Into<String>) -> Self {
        let value = value.into();
        let tag = ScalarTag::resolve_plain(&value);
        Self {
            value,
            tag,
            style: ScalarStyle::Plain,
            explicit_tag: false,
        }
    }
}

/// A key/value pair in a mapping. Both halves are full nodes so that
/// comments can be attached to the key.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub key: YamlNode,
    pub value: YamlNode,
}

impl MappingEntry {
    pub fn new(key: YamlNode, value: YamlNode) -> Self {
        Self { key, value }
    }
}

/// Comments attached to a node.
///
/// Each field holds one comment line per `\n`-separated line, without the
/// leading `# `.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Comments {
    /// Rendered on the lines before the node.
    pub head: Option<String>,
    /// Rendered at the end of the node's first line.
    pub line: Option<String>,
    /// Rendered on the lines after the node.
    pub foot: Option<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        self.head.is_none() && self.line.is_none() && self.foot.is_none()
    }

    /// Adds `text` as the last head comment line.
    pub fn push_head(&mut self, text: &str) {
        self.head = Some(match self.head.take() {
            Some(existing) => format!("{}\n{}", existing, text),
            None => text.to_string(),
        });
    }

    /// Adds `text` as the first foot comment line.
    pub fn push_foot_front(&mut self, text: &str) {
        self.foot = Some(match self.foot.take() {
            Some(existing) => format!("{}\n{}", text, existing),
            None => text.to_string(),
        });
    }
}

/// The kind of a node, without its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Mapping,
    Sequence,
    Scalar,
    Alias,
}

/// A YAML value without metadata.
///
/// Mappings and sequences contain `YamlNode` instances so that metadata and
/// comments are preserved throughout the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum YamlValue {
    /// One document of a stream, wrapping its content node
    Document(Box<YamlNode>),
    /// A mapping, keyed by the key scalar's text, in source order
    Mapping(IndexMap<String, MappingEntry>),
    /// A sequence of nodes
    Sequence(Vec<YamlNode>),
    /// A scalar with tag and style
    Scalar(YamlScalar),
    /// An alias reference (`*name`)
    Alias(String),
}

impl YamlValue {
    pub fn kind(&self) -> NodeKind {
        match self {
            YamlValue::Document(_) => NodeKind::Document,
            YamlValue::Mapping(_) => NodeKind::Mapping,
            YamlValue::Sequence(_) => NodeKind::Sequence,
            YamlValue::Scalar(_) => NodeKind::Scalar,
            YamlValue::Alias(_) => NodeKind::Alias,
        }
    }
}

/// Source metadata of a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeMetadata {
    /// Where the node starts in the original source (None for built nodes)
    pub position: Option<Position>,
    /// Whether a collection was written in flow style (`{}` / `[]`)
    pub flow: bool,
}

/// A YAML value wrapped with comments, anchor and source metadata.
///
/// `YamlNode` is the primary type used throughout crd-gates to represent YAML
/// data. Equality compares content, anchors and comments; source positions
/// are ignored so that a re-parsed document compares equal to the original.
#[derive(Debug, Clone)]
pub struct YamlNode {
    pub(crate) value: YamlValue,
    pub(crate) metadata: NodeMetadata,
    pub(crate) anchor: Option<String>,
    pub(crate) comments: Comments,
}

impl PartialEq for YamlNode {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
            && self.anchor == other.anchor
            && self.comments == other.comments
            && self.metadata.flow == other.metadata.flow
    }
}

impl YamlNode {
    /// Creates a new `YamlNode` with the given value and no metadata.
    pub fn new(value: YamlValue) -> Self {
        Self {
            value,
            metadata: NodeMetadata::default(),
            anchor: None,
            comments: Comments::default(),
        }
    }

    /// Creates a node holding a plain string scalar.
    pub fn string(value: impl Into<String>) -> Self {
        Self::new(YamlValue::Scalar(YamlScalar::string(value)))
    }

    /// Creates a document node around `content`.
    pub fn document(content: YamlNode) -> Self {
        Self::new(YamlValue::Document(Box::new(content)))
    }

    pub(crate) fn with_metadata(value: YamlValue, metadata: NodeMetadata) -> Self {
        Self {
            value,
            metadata,
            anchor: None,
            comments: Comments::default(),
        }
    }

    /// Returns an immutable reference to the node's value.
    pub fn value(&self) -> &YamlValue {
        &self.value
    }

    /// Returns a mutable reference to the node's value.
    pub fn value_mut(&mut self) -> &mut YamlValue {
        &mut self.value
    }

    pub fn kind(&self) -> NodeKind {
        self.value.kind()
    }

    pub fn metadata(&self) -> &NodeMetadata {
        &self.metadata
    }

    /// Returns where the node started in the source, if it was parsed.
    pub fn position(&self) -> Option<Position> {
        self.metadata.position
    }

    /// Returns the anchor name if this node has one.
    pub fn anchor(&self) -> Option<&str> {
        self.anchor.as_deref()
    }

    /// Sets the anchor name for this node.
    pub fn set_anchor(&mut self, anchor: Option<String>) {
        self.anchor = anchor;
    }

    pub fn comments(&self) -> &Comments {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut Comments {
        &mut self.comments
    }

    /// Returns the content node of a document, or the node itself otherwise.
    pub fn content(&self) -> &YamlNode {
        match &self.value {
            YamlValue::Document(content) => content,
            _ => self,
        }
    }

    /// Mutable counterpart of [`YamlNode::content`].
    pub fn content_mut(&mut self) -> &mut YamlNode {
        if matches!(self.value, YamlValue::Document(_)) {
            if let YamlValue::Document(content) = &mut self.value {
                return content;
            }
            unreachable!()
        }
        self
    }

    /// Returns the scalar, if this node is one.
    pub fn as_scalar(&self) -> Option<&YamlScalar> {
        match &self.value {
            YamlValue::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    /// Returns the scalar text, if this node is a scalar.
    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().map(|s| s.value.as_str())
    }

    /// Looks up the mapping entry for `key`.
    pub fn entry(&self, key: &str) -> Option<&MappingEntry> {
        match &self.value {
            YamlValue::Mapping(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Looks up the mapping entry for `key` mutably.
    pub fn entry_mut(&mut self, key: &str) -> Option<&mut MappingEntry> {
        match &mut self.value {
            YamlValue::Mapping(entries) => entries.get_mut(key),
            _ => None,
        }
    }

    /// Returns the value stored under `key` in a mapping.
    pub fn get(&self, key: &str) -> Option<&YamlNode> {
        self.entry(key).map(|entry| &entry.value)
    }

    /// Returns the value stored under `key` in a mapping, mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut YamlNode> {
        self.entry_mut(key).map(|entry| &mut entry.value)
    }
}
