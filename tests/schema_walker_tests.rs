//! Integration tests for walking typed schemas alongside parsed YAML.

use crd_gates::document::node::YamlNode;
use crd_gates::document::parser::parse_yaml;
use crd_gates::schema::{decode_schema, to_value, walk_schema, AnchorTable, SchemaField};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::{
    JSONSchemaProps, JSONSchemaPropsOrArray,
};
use std::collections::BTreeMap;

fn content(yaml: &str) -> YamlNode {
    parse_yaml(yaml).unwrap().documents()[0].content().clone()
}

fn decoded(node: &YamlNode) -> JSONSchemaProps {
    let anchors = AnchorTable::collect(node);
    decode_schema(to_value(node, &anchors).unwrap()).unwrap()
}

fn visited_paths(node: &mut YamlNode, schema: &JSONSchemaProps) -> Vec<String> {
    let mut paths = Vec::new();
    walk_schema(None, node, schema, &mut |field: SchemaField<'_>| {
        paths.push(field.path.to_string())
    });
    paths
}

#[test]
fn test_walk_visits_properties_lexicographically() {
    let mut node = content(
        r#"type: object
properties:
  spec:
    type: object
    properties:
      size:
        type: string
      replicas:
        type: integer
  status:
    type: object
"#,
    );
    let schema = decoded(&node);

    assert_eq!(
        visited_paths(&mut node, &schema),
        vec![
            "",
            "properties.spec",
            "properties.spec.properties.replicas",
            "properties.spec.properties.size",
            "properties.status",
        ]
    );
}

#[test]
fn test_typed_property_without_generic_key_is_skipped() {
    let mut node = content("properties:\n  present:\n    type: string\n");
    let mut properties = BTreeMap::new();
    properties.insert("absent".to_string(), JSONSchemaProps::default());
    properties.insert("present".to_string(), JSONSchemaProps::default());
    let schema = JSONSchemaProps {
        properties: Some(properties),
        ..Default::default()
    };

    assert_eq!(
        visited_paths(&mut node, &schema),
        vec!["", "properties.present"]
    );
}

#[test]
fn test_single_items_schema_fans_out_over_sequence() {
    let mut node = content(
        r#"items:
- description: first
- description: second
- description: third
"#,
    );
    let element = JSONSchemaProps {
        type_: Some("string".to_string()),
        ..Default::default()
    };
    let schema = JSONSchemaProps {
        items: Some(JSONSchemaPropsOrArray::Schema(Box::new(element.clone()))),
        ..Default::default()
    };

    let mut seen = Vec::new();
    walk_schema(None, &mut node, &schema, &mut |field: SchemaField<'_>| {
        if !field.path.is_empty() {
            assert!(field.key.is_none());
            assert_eq!(field.schema, &element);
            seen.push((
                field.path.to_string(),
                field.node.get("description").unwrap().as_str().unwrap().to_string(),
            ));
        }
    });

    assert_eq!(
        seen,
        vec![
            ("items[0]".to_string(), "first".to_string()),
            ("items[1]".to_string(), "second".to_string()),
            ("items[2]".to_string(), "third".to_string()),
        ]
    );
}

#[test]
fn test_visitor_can_edit_key_comments() {
    let mut node = content("properties:\n  replicas:\n    type: integer\n");
    let schema = decoded(&node);

    walk_schema(None, &mut node, &schema, &mut |field: SchemaField<'_>| {
        if let Some(key) = field.key {
            key.comments_mut().push_head("gated");
        }
    });

    let entry = node.get("properties").unwrap().entry("replicas").unwrap();
    assert_eq!(entry.key.comments().head.as_deref(), Some("gated"));
}

#[test]
fn test_decode_resolves_aliases() {
    let root = content(
        r#"shared: &str
  type: string
schema:
  properties:
    name: *str
"#,
    );
    let anchors = AnchorTable::collect(&root);
    let value = to_value(root.get("schema").unwrap(), &anchors).unwrap();
    let schema = decode_schema(value).unwrap();

    let name = &schema.properties.unwrap()["name"];
    assert_eq!(name.type_.as_deref(), Some("string"));
}
