use super::ast::{PathSegment, YamlPath};
use super::error::YamlPathError;
use crate::document::node::{NodeKind, YamlNode, YamlValue};

/// Resolves `path` against `root` and returns the node it names.
///
/// `root` must be a content node, not a `Document` node.
pub fn resolve<'a>(root: &'a YamlNode, path: &str) -> Result<&'a YamlNode, YamlPathError> {
    Evaluator::new(root).evaluate(&YamlPath::parse(path))
}

/// Mutable counterpart of [`resolve`].
pub fn resolve_mut<'a>(
    root: &'a mut YamlNode,
    path: &str,
) -> Result<&'a mut YamlNode, YamlPathError> {
    if root.kind() == NodeKind::Document {
        return Err(YamlPathError::DocumentRoot);
    }
    let path = YamlPath::parse(path);
    let mut current = root;
    for segment in &path.segments {
        current = step_mut(current, segment)?;
    }
    Ok(current)
}

pub struct Evaluator<'a> {
    root: &'a YamlNode,
}

impl<'a> Evaluator<'a> {
    pub fn new(root: &'a YamlNode) -> Self {
        Evaluator { root }
    }

    /// Walks the segments of `path` from the root, one child at a time.
    pub fn evaluate(&self, path: &YamlPath) -> Result<&'a YamlNode, YamlPathError> {
        if self.root.kind() == NodeKind::Document {
            return Err(YamlPathError::DocumentRoot);
        }
        let mut current = self.root;
        for segment in &path.segments {
            current = step(current, segment)?;
        }
        Ok(current)
    }
}

fn not_found(segment: &PathSegment) -> YamlPathError {
    let segment = match segment {
        PathSegment::Field(name) => name.clone(),
        PathSegment::Index(idx) => idx.to_string(),
    };
    YamlPathError::PathNotFound { segment }
}

fn step<'a>(node: &'a YamlNode, segment: &PathSegment) -> Result<&'a YamlNode, YamlPathError> {
    let found = match (node.value(), segment) {
        (YamlValue::Mapping(entries), PathSegment::Field(name)) => {
            entries.get(name.as_str()).map(|e| &e.value)
        }
        (YamlValue::Mapping(entries), PathSegment::Index(idx)) => {
            entries.get(idx.to_string().as_str()).map(|e| &e.value)
        }
        (YamlValue::Sequence(items), PathSegment::Index(idx)) => items.get(*idx),
        _ => None,
    };
    found.ok_or_else(|| not_found(segment))
}

fn step_mut<'a>(
    node: &'a mut YamlNode,
    segment: &PathSegment,
) -> Result<&'a mut YamlNode, YamlPathError> {
    let found = match (node.value_mut(), segment) {
        (YamlValue::Mapping(entries), PathSegment::Field(name)) => {
            entries.get_mut(name.as_str()).map(|e| &mut e.value)
        }
        (YamlValue::Mapping(entries), PathSegment::Index(idx)) => {
            entries.get_mut(idx.to_string().as_str()).map(|e| &mut e.value)
        }
        (YamlValue::Sequence(items), PathSegment::Index(idx)) => items.get_mut(*idx),
        _ => None,
    };
    found.ok_or_else(|| not_found(segment))
}
