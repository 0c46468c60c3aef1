//! Rewrites marked schema fields into template-conditional blocks.

use super::marker::Marker;
use super::{GateDiscovery, GateOptions};
use crate::document::node::{YamlNode, YamlValue};
use crate::schema::SchemaField;

/// Schema walk visitor for one CRD version.
///
/// Each marked field has its description replaced by the text after the
/// marker and is wrapped in the configured directives: the "if" directive
/// becomes the last head comment line of the field's key, the "end"
/// directive the first foot comment line. Sequence elements have no key and
/// carry the comments themselves.
pub struct GateRewriter<'a, R> {
    version: String,
    options: &'a GateOptions,
    reporter: &'a mut R,
    discoveries: Vec<GateDiscovery>,
}

impl<'a, R> GateRewriter<'a, R>
where
    R: FnMut(&GateDiscovery),
{
    pub fn new(version: impl Into<String>, options: &'a GateOptions, reporter: &'a mut R) -> Self {
        Self {
            version: version.into(),
            options,
            reporter,
            discoveries: Vec::new(),
        }
    }

    pub fn visit(&mut self, field: SchemaField<'_>) {
        let Some(description) = field.schema.description.as_deref() else {
            return;
        };
        let Some(marker) = Marker::parse(description) else {
            return;
        };

        let discovery = GateDiscovery {
            version: self.version.clone(),
            path: field.path.clone(),
            gate: marker.gate.clone(),
        };
        tracing::debug!(
            version = %self.version,
            path = %field.path,
            gate = %marker.gate,
            "Found gate marker"
        );
        (self.reporter)(&discovery);
        self.discoveries.push(discovery);

        if !set_description(&mut *field.node, &marker.rest) {
            tracing::warn!(
                version = %self.version,
                path = %field.path,
                "Marked field has no description value to rewrite"
            );
        }

        let target = match field.key {
            Some(key) => key,
            None => field.node,
        };
        let comments = target.comments_mut();
        comments.push_head(&self.options.render_if(&marker.gate));
        comments.push_foot_front(&self.options.render_end(&marker.gate));
    }

    /// Returns the discoveries recorded so far, in visit order.
    pub fn discoveries(&self) -> &[GateDiscovery] {
        &self.discoveries
    }

    pub fn into_discoveries(self) -> Vec<GateDiscovery> {
        self.discoveries
    }
}

/// Replaces the text of the `description` scalar under `node`.
///
/// Returns false if there is no such scalar (missing, or an alias).
fn set_description(node: &mut YamlNode, text: &str) -> bool {
    match node.get_mut("description").map(|n| n.value_mut()) {
        Some(YamlValue::Scalar(scalar)) => {
            scalar.value = text.to_string();
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_yaml;
    use crate::yamlpath::{PathSegment, YamlPath};
    use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;

    fn field_node(yaml: &str) -> YamlNode {
        parse_yaml(yaml).unwrap().documents()[0].content().clone()
    }

    fn schema(description: &str) -> JSONSchemaProps {
        JSONSchemaProps {
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_visit_rewrites_marked_field() {
        let options = GateOptions::default();
        let mut reported = Vec::new();
        let mut reporter = |d: &GateDiscovery| reported.push(d.to_string());

        let mut key = YamlNode::string("replicas");
        let mut node = field_node("type: integer\ndescription: '[[GATE:scaling]] Number of replicas.'\n");
        let schema = schema("[[GATE:scaling]] Number of replicas.");
        let path = YamlPath::new(vec![
            PathSegment::Field("properties".into()),
            PathSegment::Field("replicas".into()),
        ]);

        let mut rewriter = GateRewriter::new("v1", &options, &mut reporter);
        rewriter.visit(SchemaField {
            key: Some(&mut key),
            node: &mut node,
            schema: &schema,
            path: &path,
        });
        assert_eq!(rewriter.discoveries().len(), 1);
        drop(rewriter);

        assert_eq!(
            reported,
            vec!["spec.versions[v1].openAPIV3Schema.properties.replicas: scaling"]
        );
        assert_eq!(node.get("description").unwrap().as_str(), Some("Number of replicas."));
        assert_eq!(key.comments().head.as_deref(), Some("{{- if .scaling }}"));
        assert_eq!(key.comments().foot.as_deref(), Some("{{- end }}"));
        assert!(node.comments().is_empty());
    }

    #[test]
    fn test_visit_without_marker_is_noop() {
        let options = GateOptions::default();
        let mut reporter = |_: &GateDiscovery| {
            panic!("nothing to report");
        };

        let mut node = field_node("description: Plain text.\n");
        let before = node.clone();
        let schema = schema("Plain text.");
        let path = YamlPath::default();

        let mut rewriter = GateRewriter::new("v1", &options, &mut reporter);
        rewriter.visit(SchemaField {
            key: None,
            node: &mut node,
            schema: &schema,
            path: &path,
        });
        assert!(rewriter.into_discoveries().is_empty());
        assert_eq!(node, before);
    }

    #[test]
    fn test_visit_without_key_comments_node() {
        let options = GateOptions::default();
        let mut reporter = |_: &GateDiscovery| {};

        let mut node = field_node("description: '[[GATE:g]] Item.'\n");
        let schema = schema("[[GATE:g]] Item.");
        let path = YamlPath::new(vec![PathSegment::Field("items".into()), PathSegment::Index(0)]);

        let mut rewriter = GateRewriter::new("v1", &options, &mut reporter);
        rewriter.visit(SchemaField {
            key: None,
            node: &mut node,
            schema: &schema,
            path: &path,
        });

        assert_eq!(node.comments().head.as_deref(), Some("{{- if .g }}"));
        assert_eq!(node.comments().foot.as_deref(), Some("{{- end }}"));
    }

    #[test]
    fn test_visit_keeps_existing_comments() {
        let options = GateOptions::default();
        let mut reporter = |_: &GateDiscovery| {};

        let mut key = YamlNode::string("field");
        key.comments_mut().head = Some("existing head".into());
        key.comments_mut().foot = Some("existing foot".into());
        let mut node = field_node("description: '[[GATE:g]] Text.'\n");
        let schema = schema("[[GATE:g]] Text.");
        let path = YamlPath::default();

        let mut rewriter = GateRewriter::new("v1", &options, &mut reporter);
        rewriter.visit(SchemaField {
            key: Some(&mut key),
            node: &mut node,
            schema: &schema,
            path: &path,
        });

        assert_eq!(
            key.comments().head.as_deref(),
            Some("existing head\n{{- if .g }}")
        );
        assert_eq!(
            key.comments().foot.as_deref(),
            Some("{{- end }}\nexisting foot")
        );
    }

    #[test]
    fn test_visit_missing_description_value_still_reports() {
        let options = GateOptions::default();
        let mut count = 0;
        let mut reporter = |_: &GateDiscovery| count += 1;

        let mut key = YamlNode::string("field");
        let mut node = field_node("type: string\n");
        let schema = schema("[[GATE:g]] Text.");
        let path = YamlPath::default();

        let mut rewriter = GateRewriter::new("v1", &options, &mut reporter);
        rewriter.visit(SchemaField {
            key: Some(&mut key),
            node: &mut node,
            schema: &schema,
            path: &path,
        });
        drop(rewriter);

        assert_eq!(count, 1);
        assert!(node.get("description").is_none());
        assert!(key.comments().head.is_some());
    }
}
