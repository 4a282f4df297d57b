//! Template compilation errors.

/// Why a path template was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// The template does not start with `/`.
    #[error("template {0:?} must start with '/'")]
    NotRooted(String),

    /// A character outside the URL path alphabet appeared in literal text.
    #[error("illegal character {character:?} at byte {position}")]
    IllegalCharacter {
        /// The offending character.
        character: char,
        /// Byte offset in the template.
        position: usize,
    },

    /// A `}` appeared outside a placeholder.
    #[error("unbalanced '}}' at byte {position}")]
    UnbalancedBrace {
        /// Byte offset in the template.
        position: usize,
    },

    /// A `{` was never closed.
    #[error("placeholder opened at byte {position} is not closed")]
    UnterminatedPlaceholder {
        /// Byte offset of the opening brace.
        position: usize,
    },

    /// A placeholder name was empty or contained characters other than ASCII letters and `_`.
    #[error("invalid placeholder name {name:?}")]
    InvalidPlaceholderName {
        /// The rejected name.
        name: String,
    },

    /// The same placeholder name appeared twice.
    #[error("placeholder {name:?} is declared more than once")]
    DuplicatePlaceholder {
        /// The repeated name.
        name: String,
    },

    /// `{name:}` with nothing after the colon.
    #[error("placeholder {name:?} has an empty pattern")]
    EmptyPattern {
        /// The placeholder name.
        name: String,
    },

    /// The placeholder pattern could consume a `/` and so span segments.
    #[error("pattern {pattern:?} of placeholder {name:?} can match '/'")]
    PatternMatchesSlash {
        /// The placeholder name.
        name: String,
        /// The offending pattern.
        pattern: String,
    },

    /// The placeholder pattern is not a valid regular expression.
    #[error("pattern of placeholder {name:?} does not compile: {message}")]
    InvalidPattern {
        /// The placeholder name.
        name: String,
        /// The regex parser's diagnostic.
        message: String,
    },
}
