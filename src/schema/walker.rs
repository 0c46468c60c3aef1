//! Lock-step traversal of a typed schema and its generic node tree.
//!
//! The typed `JSONSchemaProps` decides where to go; the generic tree is
//! followed by matching keys. Wherever the generic tree lacks a counterpart
//! for a typed branch, that branch is skipped.

use crate::document::node::{YamlNode, YamlValue};
use crate::yamlpath::{PathSegment, YamlPath};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSONSchemaProps, JSONSchemaPropsOrArray,
};

/// One step of the walk, handed to the visitor.
pub struct SchemaField<'a> {
    /// Key node of the field in its parent mapping; `None` for sequence
    /// elements and the walk root
    pub key: Option<&'a mut YamlNode>,
    /// Generic node holding the field's schema
    pub node: &'a mut YamlNode,
    pub schema: &'a JSONSchemaProps,
    /// Path from the walk root, e.g. `properties.spec.properties.replicas`
    pub path: &'a YamlPath,
}

/// Walks `schema` and `node` together, calling `visitor` pre-order on every
/// pair.
///
/// Properties are visited in lexicographic order. A single-schema `items`
/// is applied to every element of a generic `items` sequence.
pub fn walk_schema<F>(
    key: Option<&mut YamlNode>,
    node: &mut YamlNode,
    schema: &JSONSchemaProps,
    visitor: &mut F,
) where
    F: FnMut(SchemaField<'_>),
{
    walk(key, node, schema, &YamlPath::default(), visitor);
}

fn walk<F>(
    key: Option<&mut YamlNode>,
    node: &mut YamlNode,
    schema: &JSONSchemaProps,
    path: &YamlPath,
    visitor: &mut F,
) where
    F: FnMut(SchemaField<'_>),
{
    visitor(SchemaField {
        key,
        node: &mut *node,
        schema,
        path,
    });

    if let Some(properties) = schema.properties.as_ref().filter(|p| !p.is_empty()) {
        if let Some(generic) = node.get_mut("properties") {
            for (name, property) in properties {
                let Some(entry) = generic.entry_mut(name) else {
                    continue;
                };
                let child = path
                    .child(PathSegment::Field("properties".to_string()))
                    .child(PathSegment::Field(name.clone()));
                walk(
                    Some(&mut entry.key),
                    &mut entry.value,
                    property,
                    &child,
                    visitor,
                );
            }
        }
    }

    if let Some(JSONSchemaPropsOrArray::Schema(items)) = &schema.items {
        let items: &JSONSchemaProps = items;
        if let Some(YamlValue::Sequence(elements)) = node.get_mut("items").map(|n| n.value_mut())
        {
            let base = path.child(PathSegment::Field("items".to_string()));
            for (i, element) in elements.iter_mut().enumerate() {
                let child = base.child(PathSegment::Index(i));
                walk(None, element, items, &child, visitor);
            }
        }
    }
}
