//! Request context consumed by the dispatcher.

use std::str::FromStr;

use bytes::Bytes;
use rustax_core::MediaType;

use crate::error::DispatchError;

/// Everything the dispatcher reads from a request.
///
/// An empty body is the same as no body.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    method: String,
    path: String,
    content_type: Option<MediaType>,
    accept: Vec<MediaType>,
    body: Option<Bytes>,
}

impl RequestContext {
    /// A request without content type, Accept preferences, or body.
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Self::default()
        }
    }

    /// Set the request content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: MediaType) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Set the Accept preferences, most preferred first.
    #[must_use]
    pub fn with_accept(mut self, accept: Vec<MediaType>) -> Self {
        self.accept = accept;
        self
    }

    /// Set the Accept preferences from a raw `Accept` header value.
    #[must_use]
    pub fn with_accept_header(self, header: &str) -> Self {
        self.with_accept(parse_accept(header))
    }

    /// Set the request body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        self.body = (!body.is_empty()).then_some(body);
        self
    }

    /// Build a context from the parts of an `http::Request` and its collected
    /// body.
    ///
    /// # Errors
    /// Returns [`DispatchError::UnsupportedMediaType`] when a `Content-Type`
    /// header is present but unparsable. A blank header counts as absent.
    pub fn from_http(parts: &http::request::Parts, body: Bytes) -> Result<Self, DispatchError> {
        let mut context = Self::new(parts.method.as_str(), parts.uri.path()).with_body(body);

        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .filter(|value| !value.as_bytes().trim_ascii().is_empty());
        if let Some(value) = content_type {
            let media_type = value
                .to_str()
                .ok()
                .and_then(|raw| MediaType::parse(raw).ok())
                .ok_or_else(|| {
                    DispatchError::UnsupportedMediaType(format!("malformed content type {value:?}"))
                })?;
            context.content_type = Some(media_type);
        }

        let accept = parts
            .headers
            .get_all(http::header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .collect::<Vec<_>>()
            .join(",");
        Ok(context.with_accept_header(&accept))
    }

    /// The HTTP method as sent.
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// The URL path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The request content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&MediaType> {
        self.content_type.as_ref()
    }

    /// Accept preferences, most preferred first. Empty means anything.
    #[must_use]
    pub fn accept(&self) -> &[MediaType] {
        &self.accept
    }

    /// The request body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Whether the request carries a body.
    #[must_use]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }
}

/// Parse an `Accept` header into media ranges, most preferred first.
///
/// Entries are ordered by descending `q` (default 1). Entries with equal `q`
/// keep their header order. Entries with `q=0` and unparsable entries are
/// dropped.
#[must_use]
pub fn parse_accept(header: &str) -> Vec<MediaType> {
    let mut ranked: Vec<(MediaType, f32)> = header
        .split(',')
        .filter(|entry| !entry.trim().is_empty())
        .filter_map(|entry| mime::Mime::from_str(entry.trim()).ok())
        .map(|mime| {
            let quality = mime
                .get_param("q")
                .and_then(|q| q.as_str().parse::<f32>().ok())
                .unwrap_or(1.0);
            (MediaType::from_mime(&mime), quality)
        })
        .filter(|(_, quality)| *quality > 0.0)
        .collect();

    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.into_iter().map(|(media_type, _)| media_type).collect()
}
