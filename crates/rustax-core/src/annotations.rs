//! Declaration scanner for annotation-style handler metadata.
//!
//! Handler methods can be described with the same annotation text that a
//! doc comment would carry:
//!
//! ```text
//! /**
//!  * Fetch one item.
//!  *
//!  * @GET
//!  * @Path(/items/{id:\d+})
//!  * @Produces(application/json)
//!  * @Produces(text/plain)
//!  */
//! ```
//!
//! Each `@Name` starts an annotation; an optional parenthesised argument is its
//! value. Repeated annotations accumulate values in declaration order. Text that
//! is not an annotation (descriptions, comment decoration) is ignored. The scan
//! runs once, at registration time.

use crate::types::Verb;

/// Annotation carrying a method's sub-path template.
pub const PATH: &str = "Path";
/// Annotation carrying an accepted request media type.
pub const CONSUMES: &str = "Consumes";
/// Annotation carrying a producible response media type.
pub const PRODUCES: &str = "Produces";

/// Parsed annotations, keyed by name in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: Vec<(String, Vec<String>)>,
}

impl Annotations {
    /// Scan annotation text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut annotations = Self::default();
        for line in text.lines() {
            annotations.scan_line(strip_decoration(line));
        }
        annotations
    }

    /// Whether the annotation appears at least once.
    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == name)
    }

    /// All values of an annotation in declaration order; empty when absent.
    #[must_use]
    pub fn values(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or_default()
    }

    /// The first value of an annotation, if any.
    #[must_use]
    pub fn first_value(&self, name: &str) -> Option<&str> {
        self.values(name).first().map(String::as_str)
    }

    /// Annotation names in first-appearance order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Bare upper-case annotations (`@GET`, `@DELETE`), read as HTTP verbs.
    #[must_use]
    pub fn verbs(&self) -> Vec<Verb> {
        self.names()
            .filter(|name| name.chars().all(|c| c.is_ascii_uppercase()))
            .filter_map(|name| Verb::new(name).ok())
            .collect()
    }

    fn push(&mut self, name: &str, value: Option<String>) {
        let idx = match self.entries.iter().position(|(k, _)| k == name) {
            Some(idx) => idx,
            None => {
                self.entries.push((name.to_owned(), Vec::new()));
                self.entries.len() - 1
            }
        };
        if let Some(value) = value {
            self.entries[idx].1.push(value);
        }
    }

    fn scan_line(&mut self, line: &str) {
        let mut rest = line;
        while let Some(at) = find_annotation_start(rest) {
            let after = &rest[at + 1..];
            let name_len = after
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
                .unwrap_or(after.len());
            if name_len == 0 {
                rest = after;
                continue;
            }
            let name = &after[..name_len];
            let tail = &after[name_len..];

            if let Some(arg) = tail.strip_prefix('(') {
                let (value, remaining) = split_argument(arg);
                self.push(name, Some(value.trim().to_owned()));
                rest = remaining;
            } else {
                self.push(name, None);
                rest = tail;
            }
        }
    }
}

/// Remove doc-comment framing (`/**`, `*/`, leading `*`) from a line.
fn strip_decoration(line: &str) -> &str {
    let line = line.trim();
    let line = line.strip_prefix("/**").unwrap_or(line);
    let line = line.strip_suffix("*/").unwrap_or(line);
    let line = line.trim_start();
    line.strip_prefix('*').unwrap_or(line).trim()
}

/// Find an `@` that begins a token (start of line or after whitespace).
fn find_annotation_start(s: &str) -> Option<usize> {
    let mut prev_is_space = true;
    for (idx, c) in s.char_indices() {
        if c == '@' && prev_is_space {
            return Some(idx);
        }
        prev_is_space = c.is_whitespace();
    }
    None
}

/// Split `arg)...` at the parenthesis closing the argument.
///
/// Nested parentheses inside the argument are balanced, so regular-expression
/// groups in path templates survive. An unclosed argument runs to end of line.
fn split_argument(arg: &str) -> (&str, &str) {
    let mut depth = 0usize;
    let mut escaped = false;
    for (idx, c) in arg.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '(' => depth += 1,
            ')' if depth == 0 => return (&arg[..idx], &arg[idx + 1..]),
            ')' => depth -= 1,
            _ => {}
        }
    }
    (arg, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_doc_comment() {
        let text = "/** @GET\n *\n *\n * @Consumes(/abs/{id:[0-9]+})\n * @Consumes(/uhk)\n */";
        let ann = Annotations::parse(text);
        assert!(ann.is_present("GET"));
        assert!(ann.values("GET").is_empty());
        assert_eq!(ann.values(CONSUMES), ["/abs/{id:[0-9]+}", "/uhk"]);
        assert_eq!(ann.names().collect::<Vec<_>>(), ["GET", CONSUMES]);
    }

    #[test]
    fn test_should_keep_nested_parentheses_in_value() {
        let ann = Annotations::parse("@Path(/a/{a:([0-9a-z_@]+a)+})");
        assert_eq!(ann.first_value(PATH), Some("/a/{a:([0-9a-z_@]+a)+}"));
    }

    #[test]
    fn test_should_scan_several_annotations_per_line() {
        let ann = Annotations::parse("@POST @Path(/items) @Consumes(application/json)");
        assert!(ann.is_present("POST"));
        assert_eq!(ann.first_value(PATH), Some("/items"));
        assert_eq!(ann.values(CONSUMES), ["application/json"]);
    }

    #[test]
    fn test_should_ignore_descriptions_and_mid_word_at() {
        let ann = Annotations::parse(" * Mail admin@example.com for access.\n * @GET");
        assert_eq!(ann.names().collect::<Vec<_>>(), ["GET"]);
    }

    #[test]
    fn test_should_collect_uppercase_names_as_verbs() {
        let ann = Annotations::parse("@GET\n@HEAD\n@Path(/x)\n@Produces(text/plain)");
        let verbs: Vec<String> = ann.verbs().iter().map(ToString::to_string).collect();
        assert_eq!(verbs, ["GET", "HEAD"]);
    }

    #[test]
    fn test_should_return_defaults_for_missing_annotation() {
        let ann = Annotations::parse("@GET");
        assert!(ann.values(PRODUCES).is_empty());
        assert_eq!(ann.first_value(PATH), None);
    }
}
