//! Method resolution by HTTP verb.

use rustax_core::MediaType;

use crate::endpoint::{EndpointDescriptor, MethodDescriptor};

/// Produces rating of a candidate when the request has no Accept
/// preferences: the worst rating, since anything is accepted.
pub const ACCEPT_ANY_RATING: usize = usize::MAX;

/// A handler method under consideration for one request.
///
/// Created per request by [`methods_for_verb`] and narrowed by the
/// negotiation stages, which fill in the captured arguments and the
/// filtered media types.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub(crate) method: &'a MethodDescriptor,
    pub(crate) args: Vec<String>,
    pub(crate) consumes: Option<Vec<MediaType>>,
    pub(crate) produces: Vec<MediaType>,
    pub(crate) produces_rating: usize,
}

impl<'a> Candidate<'a> {
    /// A candidate for `method` before any filtering.
    #[must_use]
    pub fn new(method: &'a MethodDescriptor) -> Self {
        Self {
            method,
            args: Vec::new(),
            consumes: None,
            produces: Vec::new(),
            produces_rating: ACCEPT_ANY_RATING,
        }
    }

    /// The handler method.
    #[must_use]
    pub fn method(&self) -> &'a MethodDescriptor {
        self.method
    }

    /// Path segments captured by the method's template.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Request media types matched by the consumes stage, most preferred
    /// first. `None` when the request had no content type.
    #[must_use]
    pub fn consumes(&self) -> Option<&[MediaType]> {
        self.consumes.as_deref()
    }

    /// Response media types matched by the produces stage, in client
    /// preference order.
    #[must_use]
    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    /// Index of the best Accept preference matched; lower is better.
    #[must_use]
    pub fn produces_rating(&self) -> usize {
        self.produces_rating
    }
}

/// Candidates for every method of `endpoint` that responds to `verb`, in
/// declaration order. The verb is compared case-insensitively.
#[must_use]
pub fn methods_for_verb<'a>(endpoint: &'a EndpointDescriptor, verb: &str) -> Vec<Candidate<'a>> {
    endpoint
        .methods()
        .iter()
        .filter(|method| method.responds_to(verb))
        .map(Candidate::new)
        .collect()
}
