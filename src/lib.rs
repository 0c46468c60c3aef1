//! crd-gates wraps feature-gated fields of Kubernetes CustomResourceDefinition
//! schemas in template conditionals.
//!
//! A schema field whose description starts with `[[GATE:<name>]]` is
//! surrounded by an opening and a closing directive comment, and the marker
//! is stripped from its description. Everything else in the YAML stream,
//! comments included, is written back as it was read.
//!
//! ```
//! use crd_gates::config::Config;
//! use crd_gates::document::parser::parse_yaml;
//! use crd_gates::file::saver::serialize_stream;
//! use crd_gates::gates::{process_tree, GateDiscovery, GateOptions};
//!
//! let yaml = "\
//! spec:
//!   versions:
//!   - name: v1
//!     schema:
//!       openAPIV3Schema:
//!         properties:
//!           replicas:
//!             description: '[[GATE:scaling]] Number of replicas.'
//! ";
//! let mut tree = parse_yaml(yaml).unwrap();
//! let found = process_tree(&mut tree, &GateOptions::default(), &mut |_: &GateDiscovery| {}).unwrap();
//! assert_eq!(found[0].gate, "scaling");
//!
//! let out = serialize_stream(&tree, &Config::default());
//! assert!(out.contains("# {{- if .scaling }}\n          replicas:"));
//! ```

pub mod config;
pub mod document;
pub mod file;
pub mod gates;
pub mod logging;
pub mod schema;
pub mod yamlpath;
