//! Gate markers embedded in schema descriptions.
//!
//! A marked description starts with `[[GATE:<name>]]`; whatever follows,
//! minus leading whitespace, is the description the field should keep.

use once_cell::sync::Lazy;
use regex::Regex;

/// Matches a leading `[[GATE:<name>]]` and captures the name and the rest.
///
/// The name is non-greedy, so it ends at the first `]]`. It may be empty.
static MARKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\[\[GATE:(.*?)\]\]\s*(.*)$").expect("valid regex"));

/// A gate marker parsed from a description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Gate name between `[[GATE:` and `]]`
    pub gate: String,
    /// Description text after the marker
    pub rest: String,
}

impl Marker {
    /// Parses the marker prefix of `description`.
    ///
    /// Returns `None` when the description does not start with a marker.
    /// Only the first marker is considered.
    ///
    /// ```
    /// use crd_gates::gates::marker::Marker;
    ///
    /// let marker = Marker::parse("[[GATE:betaFeature]] Enables beta behavior.").unwrap();
    /// assert_eq!(marker.gate, "betaFeature");
    /// assert_eq!(marker.rest, "Enables beta behavior.");
    ///
    /// assert!(Marker::parse("Plain description.").is_none());
    /// ```
    pub fn parse(description: &str) -> Option<Marker> {
        let captures = MARKER_PATTERN.captures(description)?;
        Some(Marker {
            gate: captures.get(1)?.as_str().to_string(),
            rest: captures.get(2)?.as_str().to_string(),
        })
    }
}
