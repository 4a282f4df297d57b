//! Endpoint registration, content negotiation, and dispatch for RustAx.
//!
//! This crate maps an HTTP request to exactly one handler method, providing:
//!
//! - **Endpoints**: declarative method tables with per-request instances
//! - **Registries**: base path and serializer lookup, frozen after startup
//! - **Negotiation**: path, `Content-Type`, and `Accept` filtering with ranking
//! - **Dispatcher**: body decoding, invocation, and response encoding
//! - **Service**: hyper `Service` rendering dispatcher outcomes over HTTP
//!
//! ```
//! use rustax_http::{Dispatcher, EndpointBuilder, MethodSpec, RequestContext, SerializerRegistry};
//! use serde_json::json;
//!
//! let greetings = EndpointBuilder::new("greetings", || ())
//!     .method(
//!         MethodSpec::from_annotations(
//!             "hello",
//!             "@GET @Path(/{name}) @Produces(application/json)",
//!         ),
//!         |_, invocation| Ok(json!({ "hello": invocation.arg(0) })),
//!     )
//!     .build()
//!     .unwrap();
//!
//! let dispatcher = Dispatcher::builder("/api")
//!     .unwrap()
//!     .endpoint("/greetings", greetings)
//!     .unwrap()
//!     .serializers(SerializerRegistry::with_defaults())
//!     .build();
//!
//! let response = dispatcher.serve(&RequestContext::new("GET", "/api/greetings/ada"));
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.header("Content-Type"), Some("application/json"));
//! ```

pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod negotiate;
pub mod request;
pub mod resolver;
pub mod response;
pub mod serializer;
pub mod service;

pub use dispatch::{Dispatcher, DispatcherBuilder, Stage};
pub use endpoint::{
    EndpointBuilder, EndpointDescriptor, EndpointRegistry, Invocation, MethodDescriptor,
    MethodSpec,
};
pub use error::{DispatchError, RegistrationError};
pub use request::RequestContext;
pub use resolver::{ACCEPT_ANY_RATING, Candidate};
pub use response::{Payload, Reply, Response};
pub use serializer::{
    JsonSerializer, PlainTextSerializer, SerializationError, Serializer, SerializerRegistry,
};
pub use service::{REQUEST_ID_HEADER, RustAxHttpConfig, RustAxHttpService};
