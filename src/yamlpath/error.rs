//! Error types for path resolution.

use thiserror::Error;

/// Errors that can occur while resolving a path against a node.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum YamlPathError {
    /// A segment did not match any child of the current node.
    #[error("path segment '{segment}' not found")]
    PathNotFound { segment: String },
    /// Paths resolve against a document's content, not the document itself.
    #[error("cannot resolve a path against a document node; pass its content")]
    DocumentRoot,
}
