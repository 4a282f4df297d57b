//! Error types for the RustAx core.

/// Core error type for RustAx infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum RustAxError {
    /// A media type string was empty or not of the form `type/subtype`.
    #[error("invalid media type: {0:?}")]
    InvalidMediaType(String),

    /// An HTTP verb token was empty or contained non-token characters.
    #[error("invalid HTTP verb: {0:?}")]
    InvalidVerb(String),
}

/// Convenience result type for RustAx operations.
pub type RustAxResult<T> = Result<T, RustAxError>;
