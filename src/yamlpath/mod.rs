//! Field path resolution over YAML node trees.
//!
//! Paths locate nodes by structure: field names separated by `.`, with
//! sequence elements selected by a numeric segment or a bracketed index.
//!
//! # Supported Syntax
//!
//! - `spec.versions` - Named mapping fields
//! - `versions.0` - Sequence element by bare numeric segment
//! - `versions[0]` - Sequence element by bracketed index
//!
//! # Examples
//!
//! ```
//! use crd_gates::document::parser::parse_yaml;
//! use crd_gates::yamlpath::resolve;
//!
//! let tree = parse_yaml("spec:\n  versions:\n    - name: v1\n").unwrap();
//! let root = tree.documents()[0].content();
//!
//! let name = resolve(root, "spec.versions[0].name").unwrap();
//! assert_eq!(name.as_str(), Some("v1"));
//! ```

pub mod ast;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{PathSegment, YamlPath};
pub use error::YamlPathError;
pub use evaluator::{resolve, resolve_mut, Evaluator};
pub use parser::Parser;
