//! URL path validation, normalization, and relativization.
//!
//! Two canonical forms are used:
//!
//! - [`normalize`]: rooted, repeated slashes collapsed, always ending with `/`
//!   (`/a/b/`). Base paths are stored and prefix-compared in this form, so
//!   `/a/` never prefix-matches `/aa/`.
//! - [`canonical`]: the same but without the trailing slash (`/a/b`, or `/` for
//!   the root). Templates are matched in this form, which makes a trailing slash
//!   on a concrete path irrelevant.

/// Punctuation allowed in a path besides ASCII alphanumerics.
const PATH_PUNCTUATION: &str = "-._~!$&'()*+,;=:@%/";

/// Whether `c` may appear in a URL path.
#[must_use]
pub fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || PATH_PUNCTUATION.contains(c)
}

/// Whether `path` is a well-formed absolute path.
#[must_use]
pub fn is_valid(path: &str) -> bool {
    path.starts_with('/') && path.chars().all(is_path_char)
}

/// Rooted form with a trailing slash. The empty path normalizes to `/`.
#[must_use]
pub fn normalize(path: &str) -> String {
    let mut out = canonical(path);
    if out.len() > 1 {
        out.push('/');
    }
    out
}

/// Rooted form without a trailing slash. The empty path is `/`.
#[must_use]
pub fn canonical(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    for segment in path.split('/').filter(|s| !s.is_empty()) {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// The part of `path` below `parent`, normalized, or `None` if `path` is not
/// under `parent`.
///
/// Both sides are normalized first, so `/api` and `/api/` are the same parent
/// and `/aa` is not under `/a`.
#[must_use]
pub fn relative(parent: &str, path: &str) -> Option<String> {
    let parent = normalize(parent);
    let path = normalize(path);
    path.strip_prefix(parent.as_str()).map(normalize)
}
