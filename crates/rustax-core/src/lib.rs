//! Core types, declaration scanning, and configuration for RustAx.
//!
//! This crate provides the vocabulary shared by the template matcher and the
//! HTTP dispatch layer: normalized media types, HTTP verbs, the annotation
//! scanner used to declare handler metadata as text, and environment-driven
//! configuration.

mod annotations;
mod config;
mod error;
mod types;

pub use annotations::{Annotations, CONSUMES, PATH, PRODUCES};
pub use config::RustAxConfig;
pub use error::{RustAxError, RustAxResult};
pub use types::{MediaType, Verb};
