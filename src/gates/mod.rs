//! Feature-gate rewriting for CustomResourceDefinition documents.
//!
//! For every served version of a CRD, the typed OpenAPI v3 schema is decoded
//! and walked together with its YAML nodes. Fields whose description starts
//! with a `[[GATE:<name>]]` marker are wrapped in template directives, so the
//! CRD can later be rendered with that gate switched on or off:
//!
//! ```yaml
//! properties:
//!   # {{- if .scaling }}
//!   replicas:
//!     description: Number of replicas.
//!   # {{- end }}
//! ```
//!
//! # Example
//!
//! ```
//! use crd_gates::document::parser::parse_yaml;
//! use crd_gates::gates::{process_tree, GateDiscovery, GateOptions};
//!
//! let yaml = r#"
//! spec:
//!   versions:
//!     - name: v1
//!       schema:
//!         openAPIV3Schema:
//!           properties:
//!             replicas:
//!               description: "[[GATE:scaling]] Number of replicas."
//! "#;
//! let mut tree = parse_yaml(yaml).unwrap();
//! let discoveries = process_tree(&mut tree, &GateOptions::default(), &mut |_: &GateDiscovery| {}).unwrap();
//!
//! assert_eq!(discoveries.len(), 1);
//! assert_eq!(
//!     discoveries[0].to_string(),
//!     "spec.versions[v1].openAPIV3Schema.properties.replicas: scaling"
//! );
//! ```

pub mod marker;
pub mod rewriter;

pub use marker::Marker;
pub use rewriter::GateRewriter;

use crate::config::{self, Config};
use crate::document::node::{ScalarTag, YamlNode, YamlValue};
use crate::document::tree::YamlTree;
use crate::schema::{decode_schema, to_value, walk_schema, AnchorTable, ConvertError};
use crate::yamlpath::{resolve, resolve_mut, YamlPath};
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::JSONSchemaProps;
use std::fmt;
use thiserror::Error;

/// Path of the version list within a CRD.
const VERSIONS_PATH: &str = "spec.versions";
/// Path of the schema root within one version entry.
const SCHEMA_PATH: &str = "schema.openAPIV3Schema";

/// Errors that abort processing of a document.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("failed to find spec.versions: {reason}")]
    MissingVersions { reason: String },
    #[error("failed to convert schema for version \"{version}\"")]
    Conversion {
        version: String,
        #[source]
        source: ConvertError,
    },
    #[error("failed to decode schema for version \"{version}\"")]
    SchemaDecode {
        version: String,
        #[source]
        source: serde_yaml::Error,
    },
}

/// A marked field found while processing a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDiscovery {
    /// Name of the CRD version
    pub version: String,
    /// Path of the field from the schema root
    pub path: YamlPath,
    /// Gate name from the marker
    pub gate: String,
}

impl fmt::Display for GateDiscovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "spec.versions[{}].openAPIV3Schema", self.version)?;
        if !self.path.is_empty() {
            write!(f, ".{}", self.path)?;
        }
        write!(f, ": {}", self.gate)
    }
}

/// Directive templates applied to gated fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOptions {
    pub if_directive: String,
    pub end_directive: String,
}

impl GateOptions {
    pub fn render_if(&self, gate: &str) -> String {
        config::render_directive(&self.if_directive, gate)
    }

    pub fn render_end(&self, gate: &str) -> String {
        config::render_directive(&self.end_directive, gate)
    }
}

impl Default for GateOptions {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for GateOptions {
    fn from(config: &Config) -> Self {
        Self {
            if_directive: config.if_directive.clone(),
            end_directive: config.end_directive.clone(),
        }
    }
}

/// A version whose schema decoded successfully.
struct VersionSchema {
    index: usize,
    name: String,
    schema: JSONSchemaProps,
}

/// Rewrites all gate markers in one CRD document.
///
/// `reporter` is called for each marker as soon as it is found. Every
/// version's schema is decoded before any node is changed, so a decode
/// error leaves the document untouched.
///
/// # Errors
///
/// Fails if `spec.versions` is missing or not a sequence, or if a version's
/// schema cannot be decoded. A version without a schema is skipped with a
/// warning.
pub fn process_document<R>(
    doc: &mut YamlNode,
    options: &GateOptions,
    reporter: &mut R,
) -> Result<Vec<GateDiscovery>, GateError>
where
    R: FnMut(&GateDiscovery),
{
    let content = doc.content_mut();
    if is_empty_document(content) {
        tracing::debug!("Skipping empty document");
        return Ok(Vec::new());
    }

    let schemas = decode_versions(content)?;

    let mut discoveries = Vec::new();
    for version in schemas {
        let path = format!("{}[{}].{}", VERSIONS_PATH, version.index, SCHEMA_PATH);
        let Ok(schema_node) = resolve_mut(content, &path) else {
            continue;
        };

        tracing::debug!(version = %version.name, "Processing version");
        let mut rewriter = GateRewriter::new(version.name, options, reporter);
        walk_schema(None, schema_node, &version.schema, &mut |field| {
            rewriter.visit(field)
        });
        discoveries.extend(rewriter.into_discoveries());
    }

    Ok(discoveries)
}

/// Runs [`process_document`] over every document of `tree`, in order.
pub fn process_tree<R>(
    tree: &mut YamlTree,
    options: &GateOptions,
    reporter: &mut R,
) -> Result<Vec<GateDiscovery>, GateError>
where
    R: FnMut(&GateDiscovery),
{
    let mut discoveries = Vec::new();
    for doc in tree.documents_mut() {
        discoveries.extend(process_document(doc, options, reporter)?);
    }
    Ok(discoveries)
}

/// A document with no content, such as the one after a trailing `---`.
fn is_empty_document(content: &YamlNode) -> bool {
    content
        .as_scalar()
        .is_some_and(|s| s.tag == ScalarTag::Null)
}

fn decode_versions(content: &YamlNode) -> Result<Vec<VersionSchema>, GateError> {
    let versions = resolve(content, VERSIONS_PATH).map_err(|err| GateError::MissingVersions {
        reason: err.to_string(),
    })?;
    let YamlValue::Sequence(entries) = versions.value() else {
        return Err(GateError::MissingVersions {
            reason: "spec.versions is not a sequence".to_string(),
        });
    };

    let anchors = AnchorTable::collect(content);
    let mut schemas = Vec::new();
    for (index, entry) in entries.iter().enumerate() {
        let Some(name) = version_name(entry) else {
            tracing::debug!(index, "Skipping version without a string name");
            continue;
        };

        let schema_node = match resolve(entry, SCHEMA_PATH) {
            Ok(node) => node,
            Err(err) => {
                tracing::warn!(version = %name, "Failed to find schema for version: {}", err);
                continue;
            }
        };

        let value = to_value(schema_node, &anchors).map_err(|source| GateError::Conversion {
            version: name.clone(),
            source,
        })?;
        let schema = decode_schema(value).map_err(|source| GateError::SchemaDecode {
            version: name.clone(),
            source,
        })?;

        schemas.push(VersionSchema {
            index,
            name,
            schema,
        });
    }
    Ok(schemas)
}

/// Returns the version's `name` if it is a string scalar.
fn version_name(entry: &YamlNode) -> Option<String> {
    let scalar = entry.get("name")?.as_scalar()?;
    (scalar.tag == ScalarTag::Str).then(|| scalar.value.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_yaml;

    fn first_doc(yaml: &str) -> YamlNode {
        parse_yaml(yaml).unwrap().documents()[0].clone()
    }

    #[test]
    fn test_discovery_display() {
        let discovery = GateDiscovery {
            version: "v1".into(),
            path: YamlPath::parse("properties.spec"),
            gate: "g".into(),
        };
        assert_eq!(
            discovery.to_string(),
            "spec.versions[v1].openAPIV3Schema.properties.spec: g"
        );

        let root = GateDiscovery {
            path: YamlPath::default(),
            ..discovery
        };
        assert_eq!(root.to_string(), "spec.versions[v1].openAPIV3Schema: g");
    }

    #[test]
    fn test_missing_versions_is_fatal() {
        let mut doc = first_doc("kind: CustomResourceDefinition\nspec: {}\n");
        let err = process_document(&mut doc, &GateOptions::default(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, GateError::MissingVersions { .. }));
    }

    #[test]
    fn test_versions_must_be_sequence() {
        let mut doc = first_doc("spec:\n  versions: v1\n");
        let err = process_document(&mut doc, &GateOptions::default(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, GateError::MissingVersions { .. }));
    }

    #[test]
    fn test_skips_versions_without_string_name() {
        let yaml = r#"
spec:
  versions:
    - schema:
        openAPIV3Schema:
          description: "[[GATE:a]] unnamed"
    - name: 1
      schema:
        openAPIV3Schema:
          description: "[[GATE:b]] numeric name"
"#;
        let mut doc = first_doc(yaml);
        let found = process_document(&mut doc, &GateOptions::default(), &mut |_| {}).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_skips_version_without_schema() {
        let yaml = r#"
spec:
  versions:
    - name: v1beta1
    - name: v1
      schema:
        openAPIV3Schema:
          properties:
            x:
              description: "[[GATE:g]] x"
"#;
        let mut doc = first_doc(yaml);
        let found = process_document(&mut doc, &GateOptions::default(), &mut |_| {}).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].version, "v1");
    }

    #[test]
    fn test_decode_failure_leaves_document_untouched() {
        let yaml = r#"
spec:
  versions:
    - name: v1
      schema:
        openAPIV3Schema:
          properties:
            x:
              description: "[[GATE:g]] x"
    - name: v2
      schema:
        openAPIV3Schema:
          description: [not, a, string]
"#;
        let mut doc = first_doc(yaml);
        let before = doc.clone();
        let err = process_document(&mut doc, &GateOptions::default(), &mut |_| {}).unwrap_err();
        match err {
            GateError::SchemaDecode { version, .. } => assert_eq!(version, "v2"),
            other => panic!("Expected SchemaDecode, got {:?}", other),
        }
        assert_eq!(doc, before);
    }

    #[test]
    fn test_unknown_alias_in_schema_is_conversion_error() {
        let mut doc = first_doc("spec:\n  versions:\n    - name: v1\n      schema:\n        openAPIV3Schema: {}\n");
        if let Some(schema) = doc
            .content_mut()
            .get_mut("spec")
            .and_then(|s| s.get_mut("versions"))
            .and_then(|v| match v.value_mut() {
                YamlValue::Sequence(items) => items.get_mut(0),
                _ => None,
            })
            .and_then(|v| v.get_mut("schema"))
            .and_then(|s| s.get_mut("openAPIV3Schema"))
        {
            *schema = YamlNode::new(YamlValue::Alias("nowhere".into()));
        }

        let err = process_document(&mut doc, &GateOptions::default(), &mut |_| {}).unwrap_err();
        assert!(matches!(err, GateError::Conversion { .. }));
    }

    #[test]
    fn test_empty_document_is_skipped() {
        let tree = parse_yaml("---\n---\nspec: {}\n").unwrap();
        let mut doc = tree.documents()[0].clone();
        let found = process_document(&mut doc, &GateOptions::default(), &mut |_| {}).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_custom_directives() {
        let yaml = r#"
spec:
  versions:
    - name: v1
      schema:
        openAPIV3Schema:
          properties:
            x:
              description: "[[GATE:beta]] x"
"#;
        let options = GateOptions {
            if_directive: "{{ if .Values.{gate} }}".into(),
            end_directive: "{{ end }}".into(),
        };
        let mut doc = first_doc(yaml);
        process_document(&mut doc, &options, &mut |_| {}).unwrap();

        let key = &crate::yamlpath::resolve(
            doc.content(),
            "spec.versions[0].schema.openAPIV3Schema.properties",
        )
        .unwrap()
        .entry("x")
        .unwrap()
        .key;
        assert_eq!(key.comments().head.as_deref(), Some("{{ if .Values.beta }}"));
        assert_eq!(key.comments().foot.as_deref(), Some("{{ end }}"));
    }
}
