//! Typed OpenAPI v3 schemas alongside their generic YAML nodes.
//!
//! `decode` turns a schema subtree into `k8s-openapi`'s `JSONSchemaProps`;
//! `walker` then visits the typed schema and the generic subtree together so
//! callers can inspect typed fields while editing the generic nodes.

pub mod decode;
pub mod walker;

pub use decode::{decode_schema, to_value, AnchorTable, ConvertError};
pub use walker::{walk_schema, SchemaField};
