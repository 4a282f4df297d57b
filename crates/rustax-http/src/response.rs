//! Response value object, handler return values, and rendering to `http`.

use std::collections::BTreeMap;

use bytes::Bytes;
use http::{HeaderName, HeaderValue, StatusCode};
use http_body_util::Full;
use serde_json::Value;

/// Body type of rendered responses. Bodies are always buffered.
pub type ResponseBody = Full<Bytes>;

/// Content type of the generic error bodies.
pub const ERROR_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// A response body before rendering.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// A value still to be marshalled by a serializer.
    Value(Value),
    /// Bytes that are sent as they are.
    Raw(Bytes),
}

/// A structured response: status, headers, and an optional body.
///
/// Header names are stored as given. They are only validated (and
/// lower-cased) when the response is rendered with [`Response::into_http`].
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: BTreeMap<String, String>,
    body: Option<Payload>,
}

impl Response {
    /// An empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// A `200 OK` carrying `value`. `null` means no body.
    #[must_use]
    pub fn ok(value: Value) -> Self {
        let body = (!value.is_null()).then_some(Payload::Value(value));
        Self {
            body,
            ..Self::new(StatusCode::OK)
        }
    }

    /// A generic error response whose body is the canonical reason phrase.
    #[must_use]
    pub fn error(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or("Error");
        Self::new(status)
            .with_header("Content-Type", ERROR_CONTENT_TYPE)
            .with_body(Payload::Raw(Bytes::from_static(reason.as_bytes())))
    }

    /// Builder-style [`Response::set_header`].
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_header(name, value);
        self
    }

    /// Builder-style [`Response::set_body`].
    #[must_use]
    pub fn with_body(mut self, body: Payload) -> Self {
        self.body = Some(body);
        self
    }

    /// The status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// All headers.
    #[must_use]
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// A header by its exact name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// Set a header, replacing any previous value under the same name.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Remove every header whose name equals `name` ignoring ASCII case.
    /// Returns the value of the last one removed.
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let names: Vec<_> = self
            .headers
            .keys()
            .filter(|key| key.eq_ignore_ascii_case(name))
            .cloned()
            .collect();
        names
            .into_iter()
            .filter_map(|key| self.headers.remove(&key))
            .last()
    }

    /// The body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Payload> {
        self.body.as_ref()
    }

    /// The body when it is already raw bytes.
    #[must_use]
    pub fn raw_body(&self) -> Option<&Bytes> {
        match &self.body {
            Some(Payload::Raw(bytes)) => Some(bytes),
            _ => None,
        }
    }

    /// Replace the body.
    pub fn set_body(&mut self, body: Option<Payload>) {
        self.body = body;
    }

    /// Remove and return the body.
    pub fn take_body(&mut self) -> Option<Payload> {
        self.body.take()
    }

    /// Render to an `http::Response`.
    ///
    /// A [`Payload::Value`] that was never marshalled is written as JSON.
    /// Headers that are not valid HTTP are dropped with a warning.
    #[must_use]
    pub fn into_http(self) -> http::Response<ResponseBody> {
        let bytes = match self.body {
            Some(Payload::Raw(bytes)) => bytes,
            Some(Payload::Value(value)) => Bytes::from(value.to_string()),
            None => Bytes::new(),
        };

        let mut response = http::Response::new(Full::new(bytes));
        *response.status_mut() = self.status;
        for (name, value) in self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!(header = %name, "dropping invalid response header"),
            }
        }
        response
    }
}

/// What a handler method returns: a bare value, wrapped into `200 OK` by the
/// dispatcher, or a complete [`Response`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// A bare return value.
    Value(Value),
    /// A structured response, used as is.
    Response(Response),
}

impl Reply {
    /// The structured response for this reply.
    #[must_use]
    pub fn into_response(self) -> Response {
        match self {
            Self::Value(value) => Response::ok(value),
            Self::Response(response) => response,
        }
    }
}

impl From<Value> for Reply {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Response> for Reply {
    fn from(response: Response) -> Self {
        Self::Response(response)
    }
}

impl From<()> for Reply {
    fn from((): ()) -> Self {
        Self::Value(Value::Null)
    }
}

impl From<String> for Reply {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<&str> for Reply {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_owned()))
    }
}
