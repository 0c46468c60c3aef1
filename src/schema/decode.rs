//! Conversion of generic schema subtrees into typed `JSONSchemaProps`.
//!
//! The subtree is first turned into a `serde_yaml::Value`, with aliases
//! expanded from the anchors of the enclosing document, and then
//! deserialized into the `apiextensions.k8s.io/v1` schema type.

use crate::document::node::{ScalarTag, YamlNode, YamlScalar, YamlValue};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;
use serde_yaml::{Mapping, Number, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Aliases nested deeper than this are treated as cyclic.
const MAX_ALIAS_DEPTH: usize = 64;

/// Errors raised while converting a node tree into a generic value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    #[error("alias '*{name}' refers to an unknown anchor")]
    UnknownAnchor { name: String },
    #[error("alias '*{name}' nests too deeply (cyclic anchor?)")]
    AliasDepth { name: String },
}

/// Anchored nodes of one document, by anchor name.
///
/// A name defined more than once resolves to its last definition.
#[derive(Debug, Default)]
pub struct AnchorTable<'a> {
    anchors: HashMap<&'a str, &'a YamlNode>,
}

impl<'a> AnchorTable<'a> {
    /// Collects every anchor under `root`.
    pub fn collect(root: &'a YamlNode) -> Self {
        let mut table = Self::default();
        table.visit(root);
        table
    }

    fn visit(&mut self, node: &'a YamlNode) {
        if let Some(name) = node.anchor() {
            self.anchors.insert(name, node);
        }
        match node.value() {
            YamlValue::Document(content) => self.visit(content),
            YamlValue::Mapping(entries) => {
                for entry in entries.values() {
                    self.visit(&entry.key);
                    self.visit(&entry.value);
                }
            }
            YamlValue::Sequence(items) => {
                for item in items {
                    self.visit(item);
                }
            }
            YamlValue::Scalar(_) | YamlValue::Alias(_) => {}
        }
    }

    pub fn get(&self, name: &str) -> Option<&'a YamlNode> {
        self.anchors.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}

/// Converts `node` into a `serde_yaml::Value`, expanding aliases.
pub fn to_value(node: &YamlNode, anchors: &AnchorTable<'_>) -> Result<Value, ConvertError> {
    convert(node, anchors, 0)
}

fn convert(node: &YamlNode, anchors: &AnchorTable<'_>, depth: usize) -> Result<Value, ConvertError> {
    match node.value() {
        YamlValue::Document(content) => convert(content, anchors, depth),
        YamlValue::Mapping(entries) => {
            let mut mapping = Mapping::new();
            // Keys stay strings, as in JSON: `1:` names the property "1".
            for (key, entry) in entries {
                mapping.insert(
                    Value::String(key.clone()),
                    convert(&entry.value, anchors, depth)?,
                );
            }
            Ok(Value::Mapping(mapping))
        }
        YamlValue::Sequence(items) => items
            .iter()
            .map(|item| convert(item, anchors, depth))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Sequence),
        YamlValue::Scalar(scalar) => Ok(scalar_value(scalar)),
        YamlValue::Alias(name) => {
            if depth >= MAX_ALIAS_DEPTH {
                return Err(ConvertError::AliasDepth { name: name.clone() });
            }
            let target = anchors
                .get(name)
                .ok_or_else(|| ConvertError::UnknownAnchor { name: name.clone() })?;
            convert(target, anchors, depth + 1)
        }
    }
}

/// Interprets a scalar according to its resolved tag.
fn scalar_value(scalar: &YamlScalar) -> Value {
    let text = scalar.value.as_str();
    match scalar.tag {
        ScalarTag::Null => Value::Null,
        ScalarTag::Bool => match text.to_ascii_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(text.to_string()),
        },
        ScalarTag::Int => parse_int(text)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        ScalarTag::Float => parse_float(text)
            .map(|f| Value::Number(Number::from(f)))
            .unwrap_or_else(|| Value::String(text.to_string())),
        ScalarTag::Str | ScalarTag::Custom(_) => Value::String(text.to_string()),
    }
}

fn parse_int(text: &str) -> Option<Number> {
    if let Some(hex) = text.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(Number::from);
    }
    if let Some(oct) = text.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(Number::from);
    }
    text.parse::<i64>()
        .map(Number::from)
        .or_else(|_| text.parse::<u64>().map(Number::from))
        .ok()
}

fn parse_float(text: &str) -> Option<f64> {
    match text.to_ascii_lowercase().as_str() {
        ".inf" | "+.inf" => Some(f64::INFINITY),
        "-.inf" => Some(f64::NEG_INFINITY),
        ".nan" => Some(f64::NAN),
        lower => lower.parse::<f64>().ok(),
    }
}

/// Decodes a generic value into the typed schema model.
pub fn decode_schema(value: Value) -> Result<JSONSchemaProps, serde_yaml::Error> {
    serde_yaml::from_value(value)
}
