//! RustAx HTTP service implementing the hyper `Service` trait.

use std::convert::Infallible;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::dispatch::Dispatcher;
use crate::error::BoxError;
use crate::request::RequestContext;
use crate::response::{Response, ResponseBody};

/// Header carrying the per-request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Configuration for the RustAx HTTP service.
#[derive(Debug, Clone)]
pub struct RustAxHttpConfig {
    /// Largest request body buffered before answering `413`.
    pub max_body_bytes: usize,
}

impl Default for RustAxHttpConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Hyper `Service` serving requests through a [`Dispatcher`].
///
/// Bodies are buffered, converted into a [`RequestContext`], and dispatched on
/// the blocking pool since handlers are synchronous.
#[derive(Debug, Clone)]
pub struct RustAxHttpService {
    dispatcher: Arc<Dispatcher>,
    config: Arc<RustAxHttpConfig>,
}

impl RustAxHttpService {
    /// Create a new `RustAxHttpService`.
    pub fn new(dispatcher: Arc<Dispatcher>, config: RustAxHttpConfig) -> Self {
        Self {
            dispatcher,
            config: Arc::new(config),
        }
    }
}

impl<B> hyper::service::Service<http::Request<B>> for RustAxHttpService
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    type Response = http::Response<ResponseBody>;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: http::Request<B>) -> Self::Future {
        let dispatcher = Arc::clone(&self.dispatcher);
        let config = Arc::clone(&self.config);
        let request_id = uuid::Uuid::new_v4().to_string();

        Box::pin(async move {
            let method = req.method().clone();
            let path = req.uri().path().to_owned();

            let response = process_request(req, dispatcher, &config).await;

            let status = response.status();
            if status.is_server_error() {
                tracing::warn!(
                    %method,
                    %path,
                    status = status.as_u16(),
                    %request_id,
                    "request failed"
                );
            } else {
                tracing::debug!(
                    %method,
                    %path,
                    status = status.as_u16(),
                    %request_id,
                    "request served"
                );
            }
            Ok(add_common_headers(response.into_http(), &request_id))
        })
    }
}

/// Process a single HTTP request through the dispatcher.
async fn process_request<B>(
    req: http::Request<B>,
    dispatcher: Arc<Dispatcher>,
    config: &RustAxHttpConfig,
) -> Response
where
    B: http_body::Body<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (parts, incoming) = req.into_parts();

    let body = match collect_body(incoming, config.max_body_bytes).await {
        Ok(body) => body,
        Err(status) => return Response::error(status),
    };

    let request = match RequestContext::from_http(&parts, body) {
        Ok(request) => request,
        Err(err) => return err.into_response(),
    };

    match tokio::task::spawn_blocking(move || dispatcher.serve(&request)).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(error = %err, "dispatch task failed");
            Response::error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Collect the incoming body, refusing bodies over `limit` bytes.
async fn collect_body<B>(incoming: B, limit: usize) -> Result<Bytes, StatusCode>
where
    B: http_body::Body<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    Limited::new(incoming, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                tracing::debug!(error = %e, "failed to read request body");
                StatusCode::BAD_REQUEST
            }
        })
}

/// Add common response headers to every response.
fn add_common_headers(
    mut response: http::Response<ResponseBody>,
    request_id: &str,
) -> http::Response<ResponseBody> {
    let headers = response.headers_mut();

    if let Ok(hv) = http::HeaderValue::from_str(request_id) {
        headers.insert(REQUEST_ID_HEADER, hv);
    }
    headers.insert("server", http::HeaderValue::from_static("RustAx"));

    response
}
