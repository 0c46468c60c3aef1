//! In-memory YAML document model.
//!
//! `node` holds the tree types, `tree` the multi-document stream, and
//! `parser` turns YAML text into a tree while keeping comments, anchors,
//! scalar styles and source positions.

pub mod error;
pub mod node;
pub mod parser;
pub mod tree;

pub use error::DocumentError;
