//! Endpoint declarations and the endpoint registry.
//!
//! An endpoint is a set of handler methods sharing one base path and one
//! handler type `E`. Methods are declared with a [`MethodSpec`] (built in code
//! or scanned from annotation text) and bound to a closure over `&mut E`.
//! [`EndpointBuilder::build`] validates every declaration once and erases `E`,
//! keeping the factory so a fresh `E` is created for every invocation.

use std::fmt;
use std::sync::Arc;

use rustax_core::{Annotations, CONSUMES, MediaType, PATH, PRODUCES, Verb};
use rustax_template::{PathTemplate, path};
use serde_json::Value;

use crate::error::RegistrationError;
use crate::response::Reply;

/// A type-erased handler method: creates its endpoint instance and runs.
pub type MethodHandler = Arc<dyn Fn(Invocation) -> anyhow::Result<Reply> + Send + Sync>;

type EndpointFactory<E> = Arc<dyn Fn() -> E + Send + Sync>;
type BoundHandler<E> = Arc<dyn Fn(&mut E, Invocation) -> anyhow::Result<Reply> + Send + Sync>;

/// Arguments passed to a handler method: the deserialized body, if the
/// request had one, and the captured path segments in template order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Invocation {
    body: Option<Value>,
    path_args: Vec<String>,
}

impl Invocation {
    /// Create an invocation.
    #[must_use]
    pub fn new(body: Option<Value>, path_args: Vec<String>) -> Self {
        Self { body, path_args }
    }

    /// The deserialized request body.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Take ownership of the body.
    pub fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }

    /// Captured path segments.
    #[must_use]
    pub fn path_args(&self) -> &[String] {
        &self.path_args
    }

    /// One captured path segment by position.
    #[must_use]
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.path_args.get(index).map(String::as_str)
    }

    /// The positional argument list: the body (if any) followed by the
    /// captured segments.
    #[must_use]
    pub fn into_arguments(self) -> Vec<Value> {
        self.body
            .into_iter()
            .chain(self.path_args.into_iter().map(Value::String))
            .collect()
    }
}

/// Declaration of one handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSpec {
    name: String,
    verbs: Vec<String>,
    path: String,
    consumes: Vec<String>,
    produces: Vec<String>,
}

impl MethodSpec {
    /// A method with no verbs, the root sub-path, and no media types.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verbs: Vec::new(),
            path: "/".to_owned(),
            consumes: Vec::new(),
            produces: Vec::new(),
        }
    }

    /// Read the declaration from annotation text such as
    /// `@GET @Path(/{id}) @Produces(application/json)`.
    ///
    /// Missing `@Path` means `/`; missing `@Consumes`/`@Produces` mean none.
    #[must_use]
    pub fn from_annotations(name: impl Into<String>, text: &str) -> Self {
        let annotations = Annotations::parse(text);
        Self {
            name: name.into(),
            verbs: annotations
                .verbs()
                .iter()
                .map(|verb| verb.as_str().to_owned())
                .collect(),
            path: annotations.first_value(PATH).unwrap_or("/").to_owned(),
            consumes: annotations.values(CONSUMES).to_vec(),
            produces: annotations.values(PRODUCES).to_vec(),
        }
    }

    /// Add an HTTP verb this method responds to.
    #[must_use]
    pub fn verb(mut self, verb: impl Into<String>) -> Self {
        self.verbs.push(verb.into());
        self
    }

    /// Set the sub-path template.
    #[must_use]
    pub fn path(mut self, template: impl Into<String>) -> Self {
        self.path = template.into();
        self
    }

    /// Add an accepted request media type. Order is priority.
    #[must_use]
    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes.push(media_type.into());
        self
    }

    /// Add a producible response media type. Order is priority.
    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces.push(media_type.into());
        self
    }

    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A validated handler method.
#[derive(Clone)]
pub struct MethodDescriptor {
    name: String,
    verbs: Vec<Verb>,
    template: PathTemplate,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
    handler: MethodHandler,
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("verbs", &self.verbs)
            .field("template", &self.template.as_str())
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .finish_non_exhaustive()
    }
}

impl MethodDescriptor {
    /// The method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Verbs this method responds to.
    #[must_use]
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    /// Whether the method responds to a request method, case-insensitively.
    #[must_use]
    pub fn responds_to(&self, method: &str) -> bool {
        self.verbs.iter().any(|verb| verb.is(method))
    }

    /// The compiled sub-path template.
    #[must_use]
    pub fn template(&self) -> &PathTemplate {
        &self.template
    }

    /// Declared request media types; empty when none were declared.
    #[must_use]
    pub fn consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    /// Declared response media types; empty when none were declared.
    #[must_use]
    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    /// Create a fresh endpoint instance and run the method on it.
    pub fn invoke(&self, invocation: Invocation) -> anyhow::Result<Reply> {
        (self.handler)(invocation)
    }
}

/// A validated endpoint: default media types plus its methods.
#[derive(Debug, Clone)]
pub struct EndpointDescriptor {
    name: String,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
    methods: Vec<MethodDescriptor>,
}

impl EndpointDescriptor {
    /// The endpoint name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Request media types used by methods that declare none.
    #[must_use]
    pub fn default_consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    /// Response media types used by methods that declare none.
    #[must_use]
    pub fn default_produces(&self) -> &[MediaType] {
        &self.produces
    }

    /// Methods in declaration order.
    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }
}

/// Declares an endpoint whose methods run on a fresh `E` per request.
pub struct EndpointBuilder<E> {
    name: String,
    factory: EndpointFactory<E>,
    consumes: Vec<String>,
    produces: Vec<String>,
    methods: Vec<(MethodSpec, BoundHandler<E>)>,
}

impl<E> fmt::Debug for EndpointBuilder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EndpointBuilder")
            .field("name", &self.name)
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field(
                "methods",
                &self.methods.iter().map(|(spec, _)| spec).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

impl<E: 'static> EndpointBuilder<E> {
    /// Start an endpoint. `factory` is called once per invocation.
    pub fn new<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> E + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(factory),
            consumes: Vec::new(),
            produces: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Add a default request media type.
    #[must_use]
    pub fn consumes(mut self, media_type: impl Into<String>) -> Self {
        self.consumes.push(media_type.into());
        self
    }

    /// Add a default response media type.
    #[must_use]
    pub fn produces(mut self, media_type: impl Into<String>) -> Self {
        self.produces.push(media_type.into());
        self
    }

    /// Read default `@Consumes`/`@Produces` from endpoint-level annotation
    /// text. Other annotations are ignored.
    #[must_use]
    pub fn annotated(mut self, text: &str) -> Self {
        let annotations = Annotations::parse(text);
        self.consumes.extend_from_slice(annotations.values(CONSUMES));
        self.produces.extend_from_slice(annotations.values(PRODUCES));
        self
    }

    /// Bind a handler method. Anything convertible into a [`Reply`] may be
    /// returned; bare values are wrapped into `200 OK`.
    #[must_use]
    pub fn method<F, R>(mut self, spec: MethodSpec, handler: F) -> Self
    where
        F: Fn(&mut E, Invocation) -> anyhow::Result<R> + Send + Sync + 'static,
        R: Into<Reply>,
    {
        let bound: BoundHandler<E> =
            Arc::new(move |endpoint, invocation| handler(endpoint, invocation).map(Into::into));
        self.methods.push((spec, bound));
        self
    }

    /// Validate every declaration and erase the endpoint type.
    ///
    /// # Errors
    /// Fails on the first unparsable verb or media type, or template that does
    /// not compile.
    pub fn build(self) -> Result<EndpointDescriptor, RegistrationError> {
        let consumes = parse_media_types(&self.name, &self.consumes)?;
        let produces = parse_media_types(&self.name, &self.produces)?;
        let methods = self
            .methods
            .into_iter()
            .map(|(spec, bound)| compile_method(&self.name, &self.factory, spec, bound))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(endpoint = %self.name, methods = methods.len(), "built endpoint");
        Ok(EndpointDescriptor {
            name: self.name,
            consumes,
            produces,
            methods,
        })
    }
}

fn compile_method<E: 'static>(
    endpoint: &str,
    factory: &EndpointFactory<E>,
    spec: MethodSpec,
    bound: BoundHandler<E>,
) -> Result<MethodDescriptor, RegistrationError> {
    let verbs = spec
        .verbs
        .iter()
        .map(Verb::new)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| RegistrationError::InvalidDeclaration {
            method: spec.name.clone(),
            source,
        })?;
    let template =
        PathTemplate::compile(&spec.path).map_err(|source| RegistrationError::InvalidTemplate {
            method: spec.name.clone(),
            template: spec.path.clone(),
            source,
        })?;
    let consumes = parse_media_types(&spec.name, &spec.consumes)?;
    let produces = parse_media_types(&spec.name, &spec.produces)?;

    if verbs.is_empty() {
        tracing::warn!(
            endpoint,
            method = %spec.name,
            "method declares no HTTP verb and will never be selected"
        );
    }

    let factory = Arc::clone(factory);
    let handler: MethodHandler = Arc::new(move |invocation| {
        let mut instance = factory();
        bound(&mut instance, invocation)
    });

    Ok(MethodDescriptor {
        name: spec.name,
        verbs,
        template,
        consumes,
        produces,
        handler,
    })
}

fn parse_media_types(owner: &str, raw: &[String]) -> Result<Vec<MediaType>, RegistrationError> {
    raw.iter()
        .map(|media_type| MediaType::parse(media_type))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| RegistrationError::InvalidDeclaration {
            method: owner.to_owned(),
            source,
        })
}

/// Base path to endpoint map with longest-prefix lookup.
///
/// Base paths are stored normalized (leading and trailing slash) and must be
/// unique after normalization.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<(String, EndpointDescriptor)>,
}

impl EndpointRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint under `base_path`.
    ///
    /// # Errors
    /// [`RegistrationError::InvalidPath`] for a malformed path,
    /// [`RegistrationError::DuplicateRegistration`] when the normalized path is
    /// taken.
    pub fn register(
        &mut self,
        base_path: &str,
        endpoint: EndpointDescriptor,
    ) -> Result<(), RegistrationError> {
        if !path::is_valid(base_path) {
            return Err(RegistrationError::InvalidPath(base_path.to_owned()));
        }
        let key = path::normalize(base_path);
        if self.endpoints.iter().any(|(registered, _)| *registered == key) {
            return Err(RegistrationError::DuplicateRegistration {
                kind: "endpoint base path",
                key,
            });
        }

        tracing::debug!(base_path = %key, endpoint = %endpoint.name(), "registered endpoint");
        self.endpoints.push((key, endpoint));
        Ok(())
    }

    /// The endpoint with the longest base path that prefixes `request_path`,
    /// together with that normalized base path.
    #[must_use]
    pub fn resolve(&self, request_path: &str) -> Option<(&str, &EndpointDescriptor)> {
        let request_path = path::normalize(request_path);
        let mut best: Option<(&str, &EndpointDescriptor)> = None;
        for (base_path, endpoint) in &self.endpoints {
            if request_path.starts_with(base_path.as_str())
                && best.is_none_or(|(found, _)| base_path.len() > found.len())
            {
                best = Some((base_path, endpoint));
            }
        }
        best
    }

    /// Registered base paths in registration order.
    pub fn base_paths(&self) -> impl Iterator<Item = &str> {
        self.endpoints.iter().map(|(base_path, _)| base_path.as_str())
    }

    /// Number of registered endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Whether no endpoint is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
