//! Integration tests for RustAx.
//!
//! Most tests drive a fixture dispatcher in-process. Tests marked `#[ignore]`
//! need a running `rustax-server` (demo endpoints, API root `/`) at
//! `localhost:8080`.
//!
//! Run them with:
//! ```text
//! cargo test -p rustax-integration -- --ignored
//! ```

use std::sync::Once;

use http::StatusCode;
use rustax_core::MediaType;
use rustax_http::{
    Dispatcher, EndpointBuilder, EndpointDescriptor, Invocation, MethodSpec, Payload,
    RequestContext, Response, SerializerRegistry,
};
use serde_json::{Value, json};

static INIT: Once = Once::new();

/// Initialize tracing (once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .init();
    });
}

/// Base URL of a running server.
#[must_use]
pub fn endpoint_url() -> String {
    std::env::var("RUSTAX_ENDPOINT_URL").unwrap_or_else(|_| "http://localhost:8080".to_owned())
}

/// HTTP client for tests against a running server.
#[must_use]
pub fn http_client() -> reqwest::Client {
    init_tracing();
    reqwest::Client::new()
}

/// A unique key for tests that must not collide.
#[must_use]
pub fn unique_key(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().to_string()[..8].to_owned();
    format!("{prefix}-{id}")
}

/// Parse a media type, panicking on malformed input.
#[must_use]
pub fn media(raw: &str) -> MediaType {
    MediaType::parse(raw).unwrap_or_else(|e| panic!("bad media type {raw}: {e}"))
}

/// Raw body of a dispatched response, empty when there is none.
#[must_use]
pub fn body_text(response: &Response) -> String {
    response
        .raw_body()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

/// Body of a dispatched response parsed as JSON.
#[must_use]
pub fn body_json(response: &Response) -> Value {
    let bytes = response.raw_body().cloned().unwrap_or_default();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| panic!("body is not JSON: {e}"))
}

/// Product catalog with overlapping routes and media types.
fn catalog() -> EndpointDescriptor {
    EndpointBuilder::new("catalog", || ())
        .method(
            MethodSpec::from_annotations(
                "list",
                "@GET @Produces(application/json) @Produces(text/plain)",
            ),
            |_, _| Ok("all products"),
        )
        .method(
            MethodSpec::from_annotations(
                "show",
                r"@GET @Path(/{id:\d+}) @Produces(application/json)",
            ),
            |_, invocation| Ok(json!({ "id": invocation.arg(0) })),
        )
        .method(
            MethodSpec::from_annotations(
                "show_text",
                r"@GET @Path(/{id:\d+}) @Produces(text/plain)",
            ),
            |_, invocation| Ok(format!("product {}", invocation.arg(0).unwrap_or_default())),
        )
        .method(
            MethodSpec::from_annotations(
                "featured",
                "@GET @Path(/featured) @Produces(application/json)",
            ),
            |_, _| Ok(json!("featured")),
        )
        .method(
            MethodSpec::from_annotations(
                "by_slug",
                "@GET @Path(/{slug}) @Produces(application/json)",
            ),
            |_, invocation| Ok(json!({ "slug": invocation.arg(0) })),
        )
        .method(
            MethodSpec::from_annotations(
                "create",
                "@POST @Consumes(application/json) @Produces(application/json)",
            ),
            |_, mut invocation: Invocation| {
                let product = invocation.take_body().unwrap_or_default();
                Ok(Response::new(StatusCode::CREATED).with_body(Payload::Value(product)))
            },
        )
        .method(
            MethodSpec::from_annotations(
                "import_csv",
                "@POST @Consumes(text/csv) @Produces(text/plain)",
            ),
            |_, _| Ok("imported"),
        )
        .method(
            MethodSpec::from_annotations(
                "rename",
                r"@PUT @Path(/{id:\d+}/name) @Consumes(text/plain) @Produces(application/json)",
            ),
            |_, invocation: Invocation| Ok(Value::Array(invocation.into_arguments())),
        )
        .method(
            MethodSpec::from_annotations(
                "sheet",
                "@GET @Path(/{id}/sheet) @Produces(application/vnd.ms-excel)",
            ),
            |_, _| Ok(json!([["id"], [1]])),
        )
        .method(
            MethodSpec::from_annotations("remove", r"@DELETE @Path(/{id:\d+})"),
            |_, _| Ok(()),
        )
        .build()
        .unwrap_or_else(|e| panic!("catalog fixture: {e}"))
}

fn plain(name: &'static str, reply: &'static str) -> EndpointDescriptor {
    EndpointBuilder::new(name, || ())
        .produces("text/plain")
        .method(MethodSpec::new("index").verb("GET"), move |_, _| Ok(reply))
        .build()
        .unwrap_or_else(|e| panic!("{name} fixture: {e}"))
}

/// Dispatcher with the catalog at `/api/products`, reviews nested at
/// `/api/products/reviews`, and a fallback at the API root.
#[must_use]
pub fn fixture_dispatcher() -> Dispatcher {
    init_tracing();
    Dispatcher::builder("/api")
        .and_then(|builder| builder.endpoint("/", plain("root", "root")))
        .and_then(|builder| builder.endpoint("/products", catalog()))
        .and_then(|builder| builder.endpoint("/products/reviews", plain("reviews", "reviews")))
        .map(|builder| builder.serializers(SerializerRegistry::with_defaults()).build())
        .unwrap_or_else(|e| panic!("fixture dispatcher: {e}"))
}

/// Shorthand for a request without headers or body.
#[must_use]
pub fn request(method: &str, path: &str) -> RequestContext {
    RequestContext::new(method, path)
}

mod test_dispatch;
mod test_negotiation;
mod test_server;
mod test_service;
