//! Demo endpoints served by the binary.
//!
//! Method metadata is declared as annotation text and scanned once when the
//! dispatcher is built.

use anyhow::Context;
use http::StatusCode;
use rustax_http::{
    Dispatcher, EndpointBuilder, EndpointDescriptor, Invocation, MethodSpec, Payload,
    RegistrationError, Response, SerializerRegistry,
};
use serde_json::{Value, json};

use crate::VERSION;

/// Greets by name. A new `Greeter` is created for every request.
#[derive(Debug)]
struct Greeter {
    salutation: &'static str,
}

impl Default for Greeter {
    fn default() -> Self {
        Self {
            salutation: "Hello",
        }
    }
}

impl Greeter {
    fn greet(&self, name: &str) -> String {
        format!("{}, {name}!", self.salutation)
    }

    fn greet_many(&self, invocation: &Invocation) -> anyhow::Result<Value> {
        let name = invocation.arg(0).context("missing name")?;
        let times: usize = invocation
            .arg(1)
            .context("missing count")?
            .parse()
            .context("count out of range")?;
        Ok(Value::Array(
            std::iter::repeat_n(self.greet(name), times.min(10))
                .map(Value::String)
                .collect(),
        ))
    }
}

const GREETINGS: &str = "
/**
 * Greetings in text or JSON.
 *
 * @Produces(text/plain)
 * @Produces(application/json)
 */";

const GREET_WORLD: &str = "/** @GET */";

const GREET_NAME: &str = "
/**
 * @GET
 * @Path(/{name})
 */";

const GREET_MANY: &str = "
/**
 * Repeat the greeting, at most ten times.
 *
 * @GET
 * @Path(/{name}/{times:\\d{1,3}})
 * @Produces(application/json)
 */";

/// `/greetings`: text or JSON greetings.
pub fn greetings() -> Result<EndpointDescriptor, RegistrationError> {
    EndpointBuilder::new("greetings", Greeter::default)
        .annotated(GREETINGS)
        .method(MethodSpec::from_annotations("world", GREET_WORLD), |greeter, _| {
            Ok(greeter.greet("world"))
        })
        .method(
            MethodSpec::from_annotations("name", GREET_NAME),
            |greeter, invocation| Ok(greeter.greet(invocation.arg(0).unwrap_or_default())),
        )
        .method(
            MethodSpec::from_annotations("many", GREET_MANY),
            |greeter, invocation| greeter.greet_many(&invocation),
        )
        .build()
}

const ECHO: &str = "
/**
 * Send the body back in the negotiated format.
 *
 * @POST
 * @Consumes(application/json)
 * @Consumes(text/plain)
 * @Produces(application/json)
 * @Produces(text/plain)
 */";

const STORE: &str = "
/**
 * Echo the body wrapped under a key, as if it had been stored.
 *
 * @PUT
 * @Path(/{key})
 * @Consumes(application/json)
 * @Produces(application/json)
 */";

/// `/echo`: returns what it receives.
pub fn echo() -> Result<EndpointDescriptor, RegistrationError> {
    EndpointBuilder::new("echo", || ())
        .method(MethodSpec::from_annotations("echo", ECHO), |_, mut invocation| {
            Ok(invocation.take_body().unwrap_or_default())
        })
        .method(MethodSpec::from_annotations("store", STORE), |_, mut invocation| {
            let value = invocation.take_body().unwrap_or_default();
            let key = invocation.arg(0).unwrap_or_default().to_owned();
            Ok(Response::new(StatusCode::CREATED)
                .with_header("Location", format!("echo/{key}"))
                .with_body(Payload::Value(json!({ "key": key, "value": value }))))
        })
        .build()
}

/// `/health`: liveness probe used by `--health-check`.
pub fn health() -> Result<EndpointDescriptor, RegistrationError> {
    EndpointBuilder::new("health", || ())
        .produces("application/json")
        .method(MethodSpec::new("status").verb("GET"), |_, _| {
            Ok(json!({ "status": "running", "version": VERSION }))
        })
        .build()
}

/// Build the dispatcher serving every demo endpoint below `base_path`.
pub fn dispatcher(base_path: &str) -> Result<Dispatcher, RegistrationError> {
    Ok(Dispatcher::builder(base_path)?
        .endpoint("/greetings", greetings()?)?
        .endpoint("/echo", echo()?)?
        .endpoint("/health", health()?)?
        .serializers(SerializerRegistry::with_defaults())
        .build())
}
