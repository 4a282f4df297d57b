//! Media type and HTTP verb definitions shared across RustAx crates.

use std::fmt;
use std::str::FromStr;

use crate::error::{RustAxError, RustAxResult};

/// A MIME type reduced to its lower-cased essence (`type/subtype`).
///
/// Parameters such as `charset` are dropped, so `Application/JSON; charset=utf-8`
/// and `application/json` compare equal. Wildcard ranges (`*/*`, `text/*`) are
/// representable and are only meaningful on the matching side, see
/// [`MediaType::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaType(String);

impl MediaType {
    /// The `*/*` range.
    pub const ANY: &str = "*/*";

    /// Parse a media type, discarding parameters.
    ///
    /// # Errors
    /// Returns an error if the input is empty or not of the form `type/subtype`.
    pub fn parse(raw: &str) -> RustAxResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RustAxError::InvalidMediaType(raw.to_owned()));
        }
        let parsed = mime::Mime::from_str(trimmed)
            .map_err(|_| RustAxError::InvalidMediaType(raw.to_owned()))?;
        Ok(Self::from_mime(&parsed))
    }

    /// Build a media type from an already parsed [`mime::Mime`].
    #[must_use]
    pub fn from_mime(mime: &mime::Mime) -> Self {
        Self(mime.essence_str().to_ascii_lowercase())
    }

    /// Get the essence as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The top-level type, e.g. `application`.
    #[must_use]
    pub fn type_(&self) -> &str {
        self.0.split_once('/').map_or(self.0.as_str(), |(t, _)| t)
    }

    /// The subtype, e.g. `json`.
    #[must_use]
    pub fn subtype(&self) -> &str {
        self.0.split_once('/').map_or("", |(_, s)| s)
    }

    /// Whether this is a range (`*/*` or `type/*`) rather than a concrete type.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.type_() == "*" || self.subtype() == "*"
    }

    /// Whether `other` falls inside this type when this type is read as a range.
    ///
    /// A concrete type only matches itself; `text/*` matches every `text`
    /// subtype; `*/*` matches everything.
    #[must_use]
    pub fn matches(&self, other: &MediaType) -> bool {
        let type_ok = self.type_() == "*" || self.type_() == other.type_();
        let subtype_ok = self.subtype() == "*" || self.subtype() == other.subtype();
        type_ok && subtype_ok
    }
}

impl FromStr for MediaType {
    type Err = RustAxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An HTTP request method token, stored upper-cased.
///
/// Comparison against request methods is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Verb(String);

impl Verb {
    /// Create a verb from a method token.
    ///
    /// # Errors
    /// Returns an error if the token is empty or contains characters other
    /// than ASCII alphanumerics, `-` and `_`.
    pub fn new(token: impl AsRef<str>) -> RustAxResult<Self> {
        let token = token.as_ref().trim();
        let valid = !token.is_empty()
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(RustAxError::InvalidVerb(token.to_owned()));
        }
        Ok(Self(token.to_ascii_uppercase()))
    }

    /// Get the verb as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison with a raw request method.
    #[must_use]
    pub fn is(&self, method: &str) -> bool {
        self.0.eq_ignore_ascii_case(method.trim())
    }
}

impl FromStr for Verb {
    type Err = RustAxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_normalize_media_type_essence() {
        let mt = MediaType::parse(" Application/JSON; charset=utf-8 ").unwrap();
        assert_eq!(mt.as_str(), "application/json");
        assert_eq!(mt.type_(), "application");
        assert_eq!(mt.subtype(), "json");
        assert!(!mt.is_wildcard());
    }

    #[test]
    fn test_should_reject_invalid_media_type() {
        assert!(MediaType::parse("").is_err());
        assert!(MediaType::parse("   ").is_err());
        assert!(MediaType::parse("json").is_err());
    }

    #[test]
    fn test_should_match_media_ranges() {
        let json = MediaType::parse("application/json").unwrap();
        let xml = MediaType::parse("application/xml").unwrap();
        let text = MediaType::parse("text/plain").unwrap();
        let any = MediaType::parse(MediaType::ANY).unwrap();
        let app_any = MediaType::parse("application/*").unwrap();

        assert!(any.is_wildcard());
        assert!(any.matches(&json));
        assert!(app_any.matches(&json));
        assert!(app_any.matches(&xml));
        assert!(!app_any.matches(&text));
        assert!(json.matches(&json));
        assert!(!json.matches(&xml));
    }

    #[test]
    fn test_should_uppercase_verb() {
        let verb = Verb::new("get").unwrap();
        assert_eq!(verb.as_str(), "GET");
        assert!(verb.is("Get"));
        assert!(!verb.is("POST"));
    }

    #[test]
    fn test_should_reject_invalid_verb() {
        assert!(Verb::new("").is_err());
        assert!(Verb::new("GE T").is_err());
        assert!(Verb::new("GET/").is_err());
    }
}
