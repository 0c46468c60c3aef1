//! Field path string parser.

use super::ast::{PathSegment, YamlPath};

/// Parser for dot-separated field paths with optional bracketed indices.
pub struct Parser<'a> {
    input: &'a str,
}

impl<'a> Parser<'a> {
    /// Creates a new parser for the given path string.
    pub fn new(input: &'a str) -> Self {
        Self { input }
    }

    /// Parses the path string into a `YamlPath`.
    ///
    /// Parsing never fails: text that is not a well-formed index stays part
    /// of a field name and simply won't match during resolution.
    pub fn parse(input: &str) -> YamlPath {
        Parser::new(input).parse_path()
    }

    fn parse_path(&self) -> YamlPath {
        let mut segments = Vec::new();
        for part in self.input.split('.').filter(|p| !p.is_empty()) {
            Self::parse_part(part, &mut segments);
        }
        YamlPath::new(segments)
    }

    /// Splits `name[0][1]` into a field followed by index segments.
    fn parse_part(part: &str, segments: &mut Vec<PathSegment>) {
        let (name, mut rest) = match part.find('[') {
            Some(idx) => (&part[..idx], &part[idx..]),
            None => (part, ""),
        };

        let mut indices = Vec::new();
        while let Some(body) = rest.strip_prefix('[') {
            let Some(close) = body.find(']') else {
                break;
            };
            match body[..close].trim().parse::<usize>() {
                Ok(idx) => indices.push(idx),
                Err(_) => break,
            }
            rest = &body[close + 1..];
        }

        if !rest.is_empty() {
            // Not a clean index suffix; keep the part as a literal field name.
            segments.push(Self::bare(part));
            return;
        }
        if !name.is_empty() {
            segments.push(Self::bare(name));
        }
        segments.extend(indices.into_iter().map(PathSegment::Index));
    }

    /// A bare segment: canonical numeric text may index a sequence, anything
    /// else is a field.
    fn bare(text: &str) -> PathSegment {
        match text.parse::<usize>() {
            Ok(idx) if idx.to_string() == text => PathSegment::Index(idx),
            _ => PathSegment::Field(text.to_string()),
        }
    }
}

impl YamlPath {
    /// Parses a dot-separated path such as `spec.versions[0].name`.
    ///
    /// ```
    /// use crd_gates::yamlpath::{PathSegment, YamlPath};
    ///
    /// let path = YamlPath::parse("spec.versions[0]");
    /// assert_eq!(
    ///     path.segments,
    ///     vec![
    ///         PathSegment::Field("spec".into()),
    ///         PathSegment::Field("versions".into()),
    ///         PathSegment::Index(0),
    ///     ]
    /// );
    /// ```
    pub fn parse(input: &str) -> YamlPath {
        Parser::parse(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str) -> PathSegment {
        PathSegment::Field(name.to_string())
    }

    #[test]
    fn test_parse_dotted_fields() {
        let path = Parser::parse("schema.openAPIV3Schema");
        assert_eq!(path.segments, vec![field("schema"), field("openAPIV3Schema")]);
    }

    #[test]
    fn test_parse_skips_empty_segments() {
        let path = Parser::parse(".a..b.");
        assert_eq!(path.segments, vec![field("a"), field("b")]);
        assert!(Parser::parse("").is_empty());
    }

    #[test]
    fn test_parse_bracket_indices() {
        let path = Parser::parse("items[1][2].name");
        assert_eq!(
            path.segments,
            vec![
                field("items"),
                PathSegment::Index(1),
                PathSegment::Index(2),
                field("name")
            ]
        );
    }

    #[test]
    fn test_parse_numeric_segment() {
        let path = Parser::parse("versions.0");
        assert_eq!(path.segments, vec![field("versions"), PathSegment::Index(0)]);
    }

    #[test]
    fn test_parse_malformed_brackets_stay_literal() {
        assert_eq!(Parser::parse("a[x]").segments, vec![field("a[x]")]);
        assert_eq!(Parser::parse("a[1").segments, vec![field("a[1")]);
        assert_eq!(Parser::parse("-1").segments, vec![field("-1")]);
        assert_eq!(Parser::parse("+1").segments, vec![field("+1")]);
        assert_eq!(Parser::parse("01").segments, vec![field("01")]);
    }

    #[test]
    fn test_parse_display_round_trip() {
        let text = "spec.versions[3].schema";
        assert_eq!(Parser::parse(text).to_string(), text);
    }
}
