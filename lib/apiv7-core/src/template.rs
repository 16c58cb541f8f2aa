//! URL templates with `:name` placeholders.
//!
//! A placeholder is a colon followed by a letter or underscore, then word
//! characters: `/item/:id`. A colon followed by anything else stays literal
//! (`http://host:8080`), and `\:` escapes a colon explicitly.

use std::collections::BTreeMap;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

/// Characters kept verbatim when a value fills a path segment.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'@')
    .remove(b':')
    .remove(b'$')
    .remove(b',')
    .remove(b';')
    .remove(b'=')
    .remove(b'&')
    .remove(b'+');

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    Placeholder(String),
}

/// Parsed URL template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    parts: Vec<Part>,
}

impl UrlTemplate {
    /// Parse a template.
    #[must_use]
    pub fn parse(template: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' if chars.peek() == Some(&':') => {
                    chars.next();
                    literal.push(':');
                }
                ':' if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') => {
                    let mut name = String::new();
                    while let Some(&n) = chars.peek() {
                        if !(n.is_ascii_alphanumeric() || n == '_') {
                            break;
                        }
                        name.push(n);
                        chars.next();
                    }
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(Part::Placeholder(name));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Self { parts }
    }

    /// Placeholder names, in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            Part::Placeholder(name) => Some(name.as_str()),
            Part::Literal(_) => None,
        })
    }

    /// Returns `true` if the template has a placeholder with this name.
    #[must_use]
    pub fn has_placeholder(&self, name: &str) -> bool {
        self.placeholders().any(|placeholder| placeholder == name)
    }

    /// Replace every `:name` placeholder with a literal `*`.
    #[must_use]
    pub fn with_wildcard(&self, name: &str) -> Self {
        let mut parts: Vec<Part> = Vec::with_capacity(self.parts.len());
        for part in &self.parts {
            let text = match part {
                Part::Placeholder(placeholder) if placeholder == name => "*",
                Part::Placeholder(_) => {
                    parts.push(part.clone());
                    continue;
                }
                Part::Literal(text) => text.as_str(),
            };
            if let Some(Part::Literal(previous)) = parts.last_mut() {
                previous.push_str(text);
            } else {
                parts.push(Part::Literal(text.to_string()));
            }
        }
        Self { parts }
    }

    /// Recover placeholder values from a concrete path.
    ///
    /// Segments are aligned from the end, so a template carrying a host or a
    /// base path still matches the path an API reports. Placeholders left as
    /// `*` or empty are skipped; values are percent-decoded. Returns `None`
    /// when an aligned segment does not match.
    #[must_use]
    pub fn capture(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let rendered = self.to_string();
        let path = path.split(['?', '#']).next().unwrap_or_default();

        let mut values = BTreeMap::new();
        let template_segments = rendered.trim_end_matches('/').rsplit('/');
        let path_segments = path.trim_matches('/').rsplit('/');
        for (pattern, text) in template_segments.zip(path_segments) {
            let segment = Self::parse(pattern);
            if !match_parts(&segment.parts, text, &mut values) {
                return None;
            }
        }
        Some(values)
    }

    /// Fill placeholders with `values`.
    ///
    /// Values are percent-encoded as path segments. A missing placeholder is
    /// dropped, along with its leading slash when a slash follows it. A
    /// trailing `/.ext` collapses to `.ext`, and trailing slashes are removed
    /// when `strip_trailing_slashes` is set.
    #[must_use]
    pub fn expand(&self, values: &BTreeMap<String, String>, strip_trailing_slashes: bool) -> String {
        let mut url = String::new();

        for (index, part) in self.parts.iter().enumerate() {
            match part {
                Part::Literal(text) => url.push_str(text),
                Part::Placeholder(name) => {
                    if let Some(value) = values.get(name) {
                        url.extend(utf8_percent_encode(value, SEGMENT));
                    } else if matches!(
                        self.parts.get(index + 1),
                        Some(Part::Literal(next)) if next.starts_with('/')
                    ) {
                        while url.ends_with('/') {
                            url.pop();
                        }
                    }
                }
            }
        }

        collapse_extension(&mut url);
        url = url.replace("/\\.", "/.");

        if strip_trailing_slashes {
            let trimmed = url.trim_end_matches('/');
            url = if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            };
        }

        url
    }
}

/// Match one path segment against its template parts.
fn match_parts(parts: &[Part], mut text: &str, values: &mut BTreeMap<String, String>) -> bool {
    let mut parts = parts.iter().peekable();
    while let Some(part) = parts.next() {
        match part {
            Part::Literal(literal) => match text.strip_prefix(literal.as_str()) {
                Some(rest) => text = rest,
                None => return false,
            },
            Part::Placeholder(name) => {
                let end = match parts.peek() {
                    Some(Part::Literal(next)) => match text.find(next.as_str()) {
                        Some(end) => end,
                        None => return false,
                    },
                    _ => text.len(),
                };
                let Some((value, rest)) = text.split_at_checked(end) else {
                    return false;
                };
                if !value.is_empty() && value != "*" {
                    values.insert(
                        name.clone(),
                        percent_decode_str(value).decode_utf8_lossy().into_owned(),
                    );
                }
                text = rest;
            }
        }
    }
    text.is_empty()
}

/// `/item/.json` becomes `/item.json`.
fn collapse_extension(url: &mut String) {
    if let Some(position) = url.rfind("/.") {
        let is_extension = url.get(position + 2..).is_some_and(|extension| {
            !extension.is_empty()
                && extension
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if is_extension {
            url.remove(position);
        }
    }
}

impl std::fmt::Display for UrlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for part in &self.parts {
            match part {
                Part::Placeholder(name) => write!(f, ":{name}")?,
                Part::Literal(text) => {
                    let mut chars = text.chars().peekable();
                    while let Some(c) = chars.next() {
                        if c == ':' && chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') {
                            f.write_str("\\")?;
                        }
                        write!(f, "{c}")?;
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
            .collect()
    }

    #[test]
    fn placeholders_in_order() {
        let template = UrlTemplate::parse("/me/:service/:id/detail");
        assert_eq!(
            template.placeholders().collect::<Vec<_>>(),
            vec!["service", "id"]
        );
        assert!(template.has_placeholder("id"));
        assert!(!template.has_placeholder("detail"));
    }

    #[test]
    fn ports_and_escaped_colons_are_literal() {
        let template = UrlTemplate::parse("http://localhost:8080/time\\:zone/:id");
        assert_eq!(template.placeholders().collect::<Vec<_>>(), vec!["id"]);
        assert_eq!(
            template.expand(&values(&[("id", "1")]), true),
            "http://localhost:8080/time:zone/1"
        );
    }

    #[test]
    fn expand_encodes_segments() {
        let template = UrlTemplate::parse("/item/:id");
        assert_eq!(
            template.expand(&values(&[("id", "a b/c@d")]), true),
            "/item/a%20b%2Fc@d"
        );
    }

    #[test]
    fn missing_placeholders_are_removed() {
        let template = UrlTemplate::parse("/item/:id/detail/:part");
        assert_eq!(template.expand(&values(&[]), true), "/item/detail");
        assert_eq!(template.expand(&values(&[]), false), "/item/detail/");
        assert_eq!(
            template.expand(&values(&[("part", "x")]), true),
            "/item/detail/x"
        );
    }

    #[test]
    fn extension_collapses_when_placeholder_missing() {
        let template = UrlTemplate::parse("/item/:id.json");
        assert_eq!(template.expand(&values(&[]), true), "/item.json");
        assert_eq!(template.expand(&values(&[("id", "7")]), true), "/item/7.json");
    }

    #[test]
    fn capture_reads_placeholders_back() {
        let template = UrlTemplate::parse("/dedicated/:serviceName/ip/:ip");
        assert_eq!(
            template.capture("/dedicated/ns%201/ip/10.0.0.1"),
            Some(values(&[("serviceName", "ns 1"), ("ip", "10.0.0.1")]))
        );
        assert_eq!(template.capture("/dedicated/ns1/vrack/10.0.0.1"), None);
    }

    #[test]
    fn capture_aligns_from_the_end() {
        let template = UrlTemplate::parse("https://api.example.com/1.0/me/bill/:billId.json");
        assert_eq!(
            template.capture("/me/bill/b1.json?lang=fr"),
            Some(values(&[("billId", "b1")]))
        );

        let wildcard = UrlTemplate::parse("/dedicated/*/ip");
        assert_eq!(wildcard.capture("/dedicated/ns1/ip"), None);
    }

    #[test]
    fn empty_result_is_root() {
        let template = UrlTemplate::parse("/:id");
        assert_eq!(template.expand(&values(&[]), true), "/");
    }

    #[test]
    fn wildcard_replaces_placeholder() {
        let template = UrlTemplate::parse("/dedicated/:serviceName/ip/:ip").with_wildcard("serviceName");
        assert_eq!(template.to_string(), "/dedicated/*/ip/:ip");
        assert!(!template.has_placeholder("serviceName"));
        assert_eq!(
            template.expand(&values(&[("ip", "10.0.0.1")]), true),
            "/dedicated/*/ip/10.0.0.1"
        );
    }

    #[test]
    fn display_round_trips_escaped_colons() {
        let raw = "/time\\:zone/:id";
        assert_eq!(UrlTemplate::parse(raw).to_string(), raw);
    }
}
