//! Serializer capability, the serializer registry, and bundled serializers.
//!
//! A serializer converts request bodies into [`Value`]s and handler results
//! back into bytes for one media type. The registry maps media types to
//! factories; a fresh serializer is created for every use.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use rustax_core::MediaType;
use serde_json::Value;

use crate::error::{BoxError, DispatchError, RegistrationError};

/// Converts between wire bytes and values for one media type.
pub trait Serializer: Send + Sync {
    /// Decode a request body.
    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, SerializationError>;

    /// Encode a response value.
    fn marshal(&self, value: &Value) -> Result<Bytes, SerializationError>;
}

/// A serializer failed to decode or encode.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SerializationError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl SerializationError {
    /// An error without an underlying cause.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Produces a fresh serializer. May fail, which surfaces as a configuration
/// error when the serializer is first needed.
pub type SerializerFactory = Arc<dyn Fn() -> anyhow::Result<Box<dyn Serializer>> + Send + Sync>;

/// Media type to serializer factory map.
///
/// Filled during startup and read-only afterwards.
#[derive(Default, Clone)]
pub struct SerializerRegistry {
    factories: HashMap<MediaType, SerializerFactory>,
}

impl fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut media_types: Vec<_> = self.factories.keys().map(MediaType::as_str).collect();
        media_types.sort_unstable();
        f.debug_struct("SerializerRegistry")
            .field("media_types", &media_types)
            .finish()
    }
}

impl SerializerRegistry {
    /// An empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with [`JsonSerializer`] and [`PlainTextSerializer`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register(JsonSerializer::MEDIA_TYPE, || Ok(Box::new(JsonSerializer)))
            .expect("built-in JSON media type is valid");
        registry
            .register(PlainTextSerializer::MEDIA_TYPE, || {
                Ok(Box::new(PlainTextSerializer))
            })
            .expect("built-in text media type is valid");
        registry
    }

    /// Register a factory for a concrete media type.
    ///
    /// The media type is compared trimmed, lower-cased, and without
    /// parameters.
    ///
    /// # Errors
    /// [`RegistrationError::InvalidArgument`] for an empty, malformed, or
    /// wildcard media type; [`RegistrationError::DuplicateRegistration`] when
    /// the media type is already registered.
    pub fn register<F>(&mut self, media_type: &str, factory: F) -> Result<(), RegistrationError>
    where
        F: Fn() -> anyhow::Result<Box<dyn Serializer>> + Send + Sync + 'static,
    {
        if media_type.trim().is_empty() {
            return Err(RegistrationError::InvalidArgument(
                "serializer media type is empty".to_owned(),
            ));
        }
        let key = MediaType::parse(media_type)
            .map_err(|e| RegistrationError::InvalidArgument(e.to_string()))?;
        if key.is_wildcard() {
            return Err(RegistrationError::InvalidArgument(format!(
                "serializer media type {key} is a range"
            )));
        }
        if self.factories.contains_key(&key) {
            return Err(RegistrationError::DuplicateRegistration {
                kind: "serializer",
                key: key.to_string(),
            });
        }

        tracing::debug!(media_type = %key, "registered serializer");
        self.factories.insert(key, Arc::new(factory));
        Ok(())
    }

    /// Create a serializer for `media_type`, or `None` when nothing is
    /// registered for it.
    ///
    /// # Errors
    /// [`DispatchError::Configuration`] when the registered factory fails.
    pub fn create(
        &self,
        media_type: &MediaType,
    ) -> Result<Option<Box<dyn Serializer>>, DispatchError> {
        let Some(factory) = self.factories.get(media_type) else {
            return Ok(None);
        };
        factory().map(Some).map_err(|e| DispatchError::Configuration {
            message: format!("serializer factory for {media_type} did not produce a serializer"),
            source: Some(e.into()),
        })
    }

    /// Whether a factory is registered for `media_type`.
    #[must_use]
    pub fn contains(&self, media_type: &MediaType) -> bool {
        self.factories.contains_key(media_type)
    }

    /// Number of registered media types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// `application/json` via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    /// The media type this serializer is registered under by default.
    pub const MEDIA_TYPE: &str = "application/json";
}

impl Serializer for JsonSerializer {
    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, SerializationError> {
        serde_json::from_slice(bytes)
            .map_err(|e| SerializationError::new("malformed JSON body").with_source(e))
    }

    fn marshal(&self, value: &Value) -> Result<Bytes, SerializationError> {
        serde_json::to_vec(value)
            .map(Bytes::from)
            .map_err(|e| SerializationError::new("failed to encode JSON").with_source(e))
    }
}

/// `text/plain`: bodies are UTF-8 strings; strings, numbers, and booleans
/// are written as text.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSerializer;

impl PlainTextSerializer {
    /// The media type this serializer is registered under by default.
    pub const MEDIA_TYPE: &str = "text/plain";
}

impl Serializer for PlainTextSerializer {
    fn unmarshal(&self, bytes: &[u8]) -> Result<Value, SerializationError> {
        std::str::from_utf8(bytes)
            .map(|text| Value::String(text.to_owned()))
            .map_err(|e| SerializationError::new("body is not UTF-8 text").with_source(e))
    }

    fn marshal(&self, value: &Value) -> Result<Bytes, SerializationError> {
        match value {
            Value::String(text) => Ok(Bytes::from(text.clone())),
            Value::Number(_) | Value::Bool(_) => Ok(Bytes::from(value.to_string())),
            Value::Null => Ok(Bytes::new()),
            Value::Array(_) | Value::Object(_) => Err(SerializationError::new(
                "structured values have no plain text form",
            )),
        }
    }
}
