//! Error types for YAML document parsing.

use thiserror::Error;

/// Errors that can occur while parsing a YAML stream into a `YamlTree`.
///
/// Line and column numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// The input is not well-formed YAML.
    #[error("invalid YAML at line {line}, column {column}: {message}")]
    Scan {
        line: usize,
        column: usize,
        message: String,
    },
    /// A mapping repeats a key.
    #[error("duplicate mapping key '{key}' at line {line}")]
    DuplicateKey { key: String, line: usize },
    /// A mapping key is a collection or alias instead of a scalar.
    #[error("unsupported non-scalar mapping key at line {line}")]
    ComplexKey { line: usize },
    /// An alias refers to an anchor that was never defined.
    #[error("alias at line {line} refers to an unknown anchor")]
    UnknownAlias { line: usize },
}
