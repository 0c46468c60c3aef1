//! File I/O for YAML streams.
//!
//! This module loads YAML streams from disk or stdin, and writes rewritten
//! trees back to stdout or to files with atomic write operations.

pub mod loader;
pub mod saver;
