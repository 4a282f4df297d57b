//! Path template compilation and matching.
//!
//! Template grammar:
//!
//! ```text
//! template    = "/" { literal | placeholder }
//! placeholder = "{" name [ ":" pattern ] "}"
//! name        = 1*( ALPHA | "_" )
//! ```
//!
//! A placeholder without a pattern matches one or more non-slash characters.
//! A pattern is a regular expression applied to exactly the span the
//! placeholder occupies; it may contain balanced braces (`\d{2,4}`) and its own
//! groups, but it must not be able to consume a `/`.

use std::fmt;
use std::fmt::Write as _;
use std::str::{CharIndices, FromStr};

use regex::Regex;
use regex_syntax::hir::{Class, Hir, HirKind};

use crate::error::TemplateError;
use crate::path;

/// Pattern used for placeholders declared without one.
const DEFAULT_PATTERN: &str = "[^/]+";

/// A named capture slot of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    name: String,
    pattern: Option<String>,
}

impl Placeholder {
    /// The placeholder name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit pattern, if one was declared.
    #[must_use]
    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}

#[derive(Debug)]
enum Piece {
    Literal(String),
    Capture(Placeholder),
}

/// A compiled path template.
///
/// Compilation validates the whole template once; matching afterwards never
/// fails, it only reports whether and how a concrete path fits.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    source: String,
    placeholders: Vec<Placeholder>,
    slots: Vec<String>,
    regex: Regex,
}

impl PathTemplate {
    /// Compile a template.
    ///
    /// # Errors
    /// Returns a [`TemplateError`] describing the first defect found.
    pub fn compile(template: &str) -> Result<Self, TemplateError> {
        let pieces = parse(template)?;

        let mut regex_source = String::from("^");
        let mut placeholders = Vec::new();
        let mut slots = Vec::new();
        for piece in pieces {
            match piece {
                Piece::Literal(text) => regex_source.push_str(&regex::escape(&text)),
                Piece::Capture(placeholder) => {
                    let slot = format!("rustax_slot{}", slots.len());
                    let pattern = placeholder.pattern.as_deref().unwrap_or(DEFAULT_PATTERN);
                    let _ = write!(regex_source, "(?P<{slot}>(?:{pattern}))");
                    slots.push(slot);
                    placeholders.push(placeholder);
                }
            }
        }
        regex_source.push('$');

        let regex = Regex::new(&regex_source).map_err(|e| TemplateError::InvalidPattern {
            name: placeholders
                .last()
                .map(|p| p.name.clone())
                .unwrap_or_default(),
            message: e.to_string(),
        })?;

        Ok(Self {
            source: template.to_owned(),
            placeholders,
            slots,
            regex,
        })
    }

    /// Match a concrete path, returning the captured values in placeholder order.
    ///
    /// The path is canonicalized first: repeated slashes collapse and a trailing
    /// slash is ignored. A path with extra segments does not match.
    #[must_use]
    pub fn matches(&self, concrete: &str) -> Option<Vec<String>> {
        let concrete = path::canonical(concrete);
        let captures = self.regex.captures(&concrete)?;
        self.slots
            .iter()
            .map(|slot| captures.name(slot).map(|m| m.as_str().to_owned()))
            .collect()
    }

    /// The template text as declared.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholders in left-to-right order.
    #[must_use]
    pub fn placeholders(&self) -> &[Placeholder] {
        &self.placeholders
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Whether `template` would compile.
#[must_use]
pub fn is_valid_template(template: &str) -> bool {
    PathTemplate::compile(template).is_ok()
}

/// Split a template into literal runs and placeholders.
///
/// Literal slashes are collapsed and a trailing slash is dropped, so the
/// pieces describe the canonical form used by [`PathTemplate::matches`].
fn parse(template: &str) -> Result<Vec<Piece>, TemplateError> {
    if !template.starts_with('/') {
        return Err(TemplateError::NotRooted(template.to_owned()));
    }

    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut chars = template.char_indices();

    while let Some((position, c)) = chars.next() {
        match c {
            '{' => {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                let placeholder = parse_placeholder(position, &mut chars)?;
                let duplicate = pieces.iter().any(|p| {
                    matches!(p, Piece::Capture(existing) if existing.name == placeholder.name)
                });
                if duplicate {
                    return Err(TemplateError::DuplicatePlaceholder {
                        name: placeholder.name,
                    });
                }
                pieces.push(Piece::Capture(placeholder));
            }
            '}' => return Err(TemplateError::UnbalancedBrace { position }),
            '/' => {
                if !literal.ends_with('/') {
                    literal.push('/');
                }
            }
            c if path::is_path_char(c) => literal.push(c),
            character => {
                return Err(TemplateError::IllegalCharacter {
                    character,
                    position,
                });
            }
        }
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }

    let is_root = matches!(pieces.as_slice(), [Piece::Literal(text)] if text == "/");
    if !is_root {
        if let Some(Piece::Literal(text)) = pieces.last_mut() {
            if text.ends_with('/') {
                text.pop();
            }
            if text.is_empty() {
                pieces.pop();
            }
        }
    }
    Ok(pieces)
}

/// Parse the rest of a placeholder after its opening brace at `start`.
fn parse_placeholder(
    start: usize,
    chars: &mut CharIndices<'_>,
) -> Result<Placeholder, TemplateError> {
    let mut name = String::new();
    let mut has_pattern = false;
    loop {
        match chars.next() {
            Some((_, '}')) => break,
            Some((_, ':')) => {
                has_pattern = true;
                break;
            }
            Some((_, c)) => name.push(c),
            None => return Err(TemplateError::UnterminatedPlaceholder { position: start }),
        }
    }
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic() || c == '_') {
        return Err(TemplateError::InvalidPlaceholderName { name });
    }

    let pattern = if has_pattern {
        let pattern = read_pattern(start, chars)?;
        if pattern.is_empty() {
            return Err(TemplateError::EmptyPattern { name });
        }
        check_pattern(&name, &pattern)?;
        Some(pattern)
    } else {
        None
    };

    Ok(Placeholder { name, pattern })
}

/// Read a placeholder pattern up to the brace closing the placeholder.
fn read_pattern(
    start: usize,
    chars: &mut CharIndices<'_>,
) -> Result<String, TemplateError> {
    let mut pattern = String::new();
    let mut depth = 0usize;
    let mut escaped = false;
    for (_, c) in chars.by_ref() {
        if escaped {
            escaped = false;
            pattern.push(c);
            continue;
        }
        match c {
            '\\' => escaped = true,
            '{' => depth += 1,
            '}' if depth == 0 => return Ok(pattern),
            '}' => depth -= 1,
            _ => {}
        }
        pattern.push(c);
    }
    Err(TemplateError::UnterminatedPlaceholder { position: start })
}

/// Reject patterns that fail to parse or that could consume a slash.
fn check_pattern(name: &str, pattern: &str) -> Result<(), TemplateError> {
    let hir = regex_syntax::Parser::new()
        .parse(pattern)
        .map_err(|e| TemplateError::InvalidPattern {
            name: name.to_owned(),
            message: e.to_string(),
        })?;
    if can_match_slash(&hir) {
        return Err(TemplateError::PatternMatchesSlash {
            name: name.to_owned(),
            pattern: pattern.to_owned(),
        });
    }
    Ok(())
}

/// Whether any string matched by `hir` could contain `/`.
fn can_match_slash(hir: &Hir) -> bool {
    match hir.kind() {
        HirKind::Empty | HirKind::Look(_) => false,
        HirKind::Literal(literal) => literal.0.contains(&b'/'),
        HirKind::Class(Class::Unicode(class)) => class
            .ranges()
            .iter()
            .any(|r| r.start() <= '/' && '/' <= r.end()),
        HirKind::Class(Class::Bytes(class)) => class
            .ranges()
            .iter()
            .any(|r| r.start() <= b'/' && b'/' <= r.end()),
        HirKind::Repetition(repetition) => {
            repetition.max != Some(0) && can_match_slash(&repetition.sub)
        }
        HirKind::Capture(capture) => can_match_slash(&capture.sub),
        HirKind::Concat(subs) | HirKind::Alternation(subs) => subs.iter().any(can_match_slash),
    }
}
