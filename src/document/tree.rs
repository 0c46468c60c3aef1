//! Multi-document YAML streams.
//!
//! A `YamlTree` is the parsed form of one input stream: an ordered list of
//! `Document` nodes, each owning its content tree.
//!
//! # Example
//!
//! ```
//! use crd_gates::document::tree::YamlTree;
//! use crd_gates::document::node::YamlNode;
//!
//! let mut tree = YamlTree::default();
//! tree.push_document(YamlNode::document(YamlNode::string("hello")));
//!
//! assert_eq!(tree.len(), 1);
//! assert_eq!(tree.documents()[0].content().as_str(), Some("hello"));
//! ```

use super::node::{NodeKind, YamlNode};

/// A parsed YAML stream.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YamlTree {
    documents: Vec<YamlNode>,
}

impl YamlTree {
    /// Creates a tree from document nodes.
    ///
    /// Nodes that are not `Document` nodes are wrapped in one.
    pub fn new(documents: Vec<YamlNode>) -> Self {
        let documents = documents
            .into_iter()
            .map(|node| match node.kind() {
                NodeKind::Document => node,
                _ => YamlNode::document(node),
            })
            .collect();
        Self { documents }
    }

    /// Returns the documents in stream order.
    pub fn documents(&self) -> &[YamlNode] {
        &self.documents
    }

    /// Returns the documents in stream order, mutably.
    pub fn documents_mut(&mut self) -> &mut [YamlNode] {
        &mut self.documents
    }

    /// Appends a document, wrapping it in a `Document` node if needed.
    pub fn push_document(&mut self, node: YamlNode) {
        let node = match node.kind() {
            NodeKind::Document => node,
            _ => YamlNode::document(node),
        };
        self.documents.push(node);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
