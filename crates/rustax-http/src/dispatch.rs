//! The dispatcher: endpoint resolution, negotiation, invocation, and body
//! (de)serialization for one request.
//!
//! Registries are filled through [`DispatcherBuilder`] and frozen by
//! [`DispatcherBuilder::build`]. A built [`Dispatcher`] is read-only and can be
//! shared across threads.

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use rustax_core::MediaType;
use rustax_template::path;

use crate::endpoint::{EndpointDescriptor, EndpointRegistry, Invocation};
use crate::error::{DispatchError, RegistrationError};
use crate::negotiate::{filter_by_consumes, filter_by_path, filter_by_produces, select_best};
use crate::request::RequestContext;
use crate::resolver::{Candidate, methods_for_verb};
use crate::response::{Payload, Response};
use crate::serializer::{Serializer, SerializerRegistry};

/// Pipeline stages, in order. Used to label debug events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Finding the endpoint by base path.
    ResolvingEndpoint,
    /// Listing methods for the request verb.
    ResolvingMethods,
    /// Matching method templates against the remaining path.
    FilteringByPath,
    /// Matching the request content type.
    FilteringByConsumes,
    /// Matching Accept preferences.
    FilteringByProduces,
    /// Ranking the survivors.
    SelectingMethod,
    /// Decoding the request body.
    Deserializing,
    /// Running the handler.
    Invoking,
    /// Encoding the response body.
    Serializing,
}

impl Stage {
    /// Stage name for logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ResolvingEndpoint => "resolving_endpoint",
            Self::ResolvingMethods => "resolving_methods",
            Self::FilteringByPath => "filtering_by_path",
            Self::FilteringByConsumes => "filtering_by_consumes",
            Self::FilteringByProduces => "filtering_by_produces",
            Self::SelectingMethod => "selecting_method",
            Self::Deserializing => "deserializing",
            Self::Invoking => "invoking",
            Self::Serializing => "serializing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collects endpoints and serializers for a [`Dispatcher`].
#[derive(Debug)]
pub struct DispatcherBuilder {
    base_path: String,
    endpoints: EndpointRegistry,
    serializers: SerializerRegistry,
}

impl DispatcherBuilder {
    /// Start a dispatcher serving below the API root `base_path`.
    ///
    /// # Errors
    /// [`RegistrationError::InvalidPath`] for a malformed root.
    pub fn new(base_path: &str) -> Result<Self, RegistrationError> {
        if !path::is_valid(base_path) {
            return Err(RegistrationError::InvalidPath(base_path.to_owned()));
        }
        Ok(Self {
            base_path: path::normalize(base_path),
            endpoints: EndpointRegistry::new(),
            serializers: SerializerRegistry::new(),
        })
    }

    /// Register an endpoint under `base_path`, relative to the API root.
    ///
    /// # Errors
    /// See [`EndpointRegistry::register`].
    pub fn endpoint(
        mut self,
        base_path: &str,
        endpoint: EndpointDescriptor,
    ) -> Result<Self, RegistrationError> {
        self.endpoints.register(base_path, endpoint)?;
        Ok(self)
    }

    /// Register a serializer factory.
    ///
    /// # Errors
    /// See [`SerializerRegistry::register`].
    pub fn serializer<F>(mut self, media_type: &str, factory: F) -> Result<Self, RegistrationError>
    where
        F: Fn() -> anyhow::Result<Box<dyn Serializer>> + Send + Sync + 'static,
    {
        self.serializers.register(media_type, factory)?;
        Ok(self)
    }

    /// Replace the serializer registry wholesale.
    #[must_use]
    pub fn serializers(mut self, serializers: SerializerRegistry) -> Self {
        self.serializers = serializers;
        self
    }

    /// Freeze the registries.
    #[must_use]
    pub fn build(self) -> Dispatcher {
        tracing::debug!(
            base_path = %self.base_path,
            endpoints = self.endpoints.len(),
            serializers = self.serializers.len(),
            "built dispatcher"
        );
        Dispatcher {
            base_path: self.base_path,
            endpoints: self.endpoints,
            serializers: self.serializers,
        }
    }
}

/// Maps requests to handler methods and runs them.
#[derive(Debug)]
pub struct Dispatcher {
    base_path: String,
    endpoints: EndpointRegistry,
    serializers: SerializerRegistry,
}

impl Dispatcher {
    /// Start building a dispatcher for the API root `base_path`.
    ///
    /// # Errors
    /// [`RegistrationError::InvalidPath`] for a malformed root.
    pub fn builder(base_path: &str) -> Result<DispatcherBuilder, RegistrationError> {
        DispatcherBuilder::new(base_path)
    }

    /// The normalized API root.
    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// The endpoint registry.
    #[must_use]
    pub fn endpoints(&self) -> &EndpointRegistry {
        &self.endpoints
    }

    /// The serializer registry.
    #[must_use]
    pub fn serializers(&self) -> &SerializerRegistry {
        &self.serializers
    }

    /// Serve a request. Every failure is turned into an error response.
    #[must_use]
    pub fn serve(&self, request: &RequestContext) -> Response {
        self.dispatch(request)
            .unwrap_or_else(DispatchError::into_response)
    }

    /// Serve a request, keeping the failure as an error value.
    ///
    /// # Errors
    /// One [`DispatchError`] per failure category; see the variants.
    pub fn dispatch(&self, request: &RequestContext) -> Result<Response, DispatchError> {
        let relative = path::relative(&self.base_path, request.path()).ok_or_else(|| {
            DispatchError::NotFound(format!("{} is outside {}", request.path(), self.base_path))
        })?;

        let (base_path, endpoint) = self.endpoints.resolve(&relative).ok_or_else(|| {
            DispatchError::NotFound(format!("no endpoint serves {}", request.path()))
        })?;
        tracing::debug!(
            stage = %Stage::ResolvingEndpoint,
            endpoint = %endpoint.name(),
            base_path,
            "resolved endpoint"
        );

        let sub_path = path::relative(base_path, &relative).unwrap_or_else(|| "/".to_owned());
        let candidates = methods_for_verb(endpoint, request.method());
        log_stage(Stage::ResolvingMethods, &candidates);
        if candidates.is_empty() {
            return Err(DispatchError::NotFound(format!(
                "{} has no {} method",
                endpoint.name(),
                request.method()
            )));
        }

        let candidates = filter_by_path(candidates, &sub_path)?;
        log_stage(Stage::FilteringByPath, &candidates);
        let candidates =
            filter_by_consumes(candidates, request.content_type(), endpoint.default_consumes())?;
        log_stage(Stage::FilteringByConsumes, &candidates);
        let candidates =
            filter_by_produces(candidates, request.accept(), endpoint.default_produces())?;
        log_stage(Stage::FilteringByProduces, &candidates);

        let selected = select_best(candidates).ok_or_else(|| {
            DispatchError::NotFound(format!("no method serves {}", request.path()))
        })?;
        tracing::debug!(
            stage = %Stage::SelectingMethod,
            method = %selected.method().name(),
            args = selected.args().len(),
            rating = selected.produces_rating(),
            "selected method"
        );

        let body = self.deserialize(request, &selected)?;
        let invocation = Invocation::new(body, selected.args().to_vec());
        let response = invoke(&selected, invocation)?;
        self.serialize(response, selected.produces())
    }

    fn deserialize(
        &self,
        request: &RequestContext,
        selected: &Candidate<'_>,
    ) -> Result<Option<serde_json::Value>, DispatchError> {
        let Some(bytes) = request.body() else {
            return Ok(None);
        };

        let Some(media_type) = selected.consumes().and_then(<[MediaType]>::first) else {
            if request.content_type().is_none() {
                return Err(DispatchError::BadRequest(
                    "request body without Content-Type".to_owned(),
                ));
            }
            return Err(DispatchError::configuration("@Consumes not defined"));
        };

        let serializer = self.serializers.create(media_type)?.ok_or_else(|| {
            DispatchError::UnsupportedMediaType(format!("no serializer for {media_type}"))
        })?;
        tracing::debug!(stage = %Stage::Deserializing, media_type = %media_type, "decoding body");
        serializer
            .unmarshal(bytes)
            .map(Some)
            .map_err(|e| DispatchError::internal("failed to decode request body", e))
    }

    fn serialize(
        &self,
        mut response: Response,
        produces: &[MediaType],
    ) -> Result<Response, DispatchError> {
        let value = match response.take_body() {
            Some(Payload::Value(value)) => value,
            other => {
                response.set_body(other);
                return Ok(response);
            }
        };

        for media_type in produces {
            let Some(serializer) = self.serializers.create(media_type)? else {
                continue;
            };
            tracing::debug!(stage = %Stage::Serializing, media_type = %media_type, "encoding body");
            let bytes = serializer
                .marshal(&value)
                .map_err(|e| DispatchError::internal("failed to encode response body", e))?;
            response.remove_header("Content-Type");
            response.set_header("Content-Type", media_type.as_str());
            response.set_body(Some(Payload::Raw(bytes)));
            return Ok(response);
        }

        let produces: Vec<_> = produces.iter().map(MediaType::as_str).collect();
        Err(DispatchError::NotAcceptable(format!(
            "no serializer for any of [{}]",
            produces.join(", ")
        )))
    }
}

/// Run the selected method. Errors and panics become internal errors.
fn invoke(selected: &Candidate<'_>, invocation: Invocation) -> Result<Response, DispatchError> {
    let method = selected.method();
    tracing::debug!(stage = %Stage::Invoking, method = %method.name(), "invoking handler");
    match catch_unwind(AssertUnwindSafe(|| method.invoke(invocation))) {
        Ok(Ok(reply)) => Ok(reply.into_response()),
        Ok(Err(e)) => Err(DispatchError::internal(
            format!("handler {} failed", method.name()),
            e,
        )),
        Err(payload) => Err(DispatchError::internal(
            format!("handler {} panicked", method.name()),
            panic_message(payload.as_ref()),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_owned())
}

fn log_stage(stage: Stage, candidates: &[Candidate<'_>]) {
    tracing::debug!(stage = %stage, candidates = candidates.len(), "narrowed candidates");
}
