//! Registration-time and per-request error types.

use http::StatusCode;
use rustax_core::RustAxError;
use rustax_template::TemplateError;

use crate::response::Response;

/// Boxed cause attached to internal and configuration failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A registration was rejected. Raised while building the dispatcher, never
/// while serving.
#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// A base path is empty, not rooted, or contains non-path characters.
    #[error("invalid path {0:?}")]
    InvalidPath(String),

    /// The same key was registered twice after normalization.
    #[error("{kind} {key:?} is already registered")]
    DuplicateRegistration {
        /// What was being registered (`endpoint base path`, `serializer`).
        kind: &'static str,
        /// The normalized key.
        key: String,
    },

    /// An argument was empty or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A media type or verb declaration could not be parsed.
    #[error("invalid declaration on method {method:?}")]
    InvalidDeclaration {
        /// The method carrying the declaration.
        method: String,
        /// The parse failure.
        #[source]
        source: RustAxError,
    },

    /// A method's path template failed to compile.
    #[error("invalid path template {template:?} on method {method:?}")]
    InvalidTemplate {
        /// The method carrying the template.
        method: String,
        /// The template text.
        template: String,
        /// Why compilation failed.
        #[source]
        source: TemplateError,
    },
}

/// Why a request could not be served.
///
/// Every variant maps to one HTTP status. Causes attached to
/// [`DispatchError::Configuration`] and [`DispatchError::Internal`] are kept
/// for diagnostics and never rendered to the client.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// No endpoint or no method matches the path and verb.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request content type is not consumable.
    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// No producible type satisfies the Accept preferences.
    #[error("not acceptable: {0}")]
    NotAcceptable(String),

    /// The request itself is malformed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The registered handlers or serializers are inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is inconsistent.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },

    /// Deserialization, invocation, or serialization failed.
    #[error("internal server error: {message}")]
    Internal {
        /// The stage that failed.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<BoxError>,
    },
}

impl DispatchError {
    /// A configuration fault without a cause.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// An internal failure with its cause attached.
    #[must_use]
    pub fn internal(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// The HTTP status this outcome is rendered with.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotAcceptable(_) => StatusCode::NOT_ACCEPTABLE,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Configuration { .. } | Self::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Render as a generic error response carrying only the reason phrase.
    #[must_use]
    pub fn into_response(self) -> Response {
        Response::error(self.status_code())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_should_map_outcomes_to_status_codes() {
        let cases = [
            (DispatchError::NotFound("x".into()), 404),
            (DispatchError::UnsupportedMediaType("x".into()), 415),
            (DispatchError::NotAcceptable("x".into()), 406),
            (DispatchError::BadRequest("x".into()), 400),
            (DispatchError::configuration("x"), 500),
            (DispatchError::internal("x", anyhow::anyhow!("boom")), 500),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status_code().as_u16(), expected, "failed for {err}");
        }
    }

    #[test]
    fn test_should_keep_internal_cause_out_of_rendered_body() {
        let err =
            DispatchError::internal("handler failed", anyhow::anyhow!("db password is hunter2"));
        assert_eq!(
            err.source().map(ToString::to_string).as_deref(),
            Some("db password is hunter2")
        );

        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            response.raw_body().map(|b| &b[..]),
            Some(&b"Internal Server Error"[..])
        );
    }

    #[test]
    fn test_should_describe_duplicate_registration() {
        let err = RegistrationError::DuplicateRegistration {
            kind: "serializer",
            key: "application/json".to_owned(),
        };
        assert_eq!(err.to_string(), "serializer \"application/json\" is already registered");
    }
}
