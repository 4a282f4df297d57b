//! Negotiation stages narrowing candidates by path, content type, and Accept
//! preferences, and the final ranking.
//!
//! Each filter keeps the relative order of the survivors and fails with the
//! outcome for its stage when nothing survives.

use rustax_core::MediaType;

use crate::error::DispatchError;
use crate::resolver::{ACCEPT_ANY_RATING, Candidate};

/// Keep candidates whose template matches `path`, recording the captures.
///
/// # Errors
/// [`DispatchError::NotFound`] when no candidate matches.
pub fn filter_by_path<'a>(
    candidates: Vec<Candidate<'a>>,
    path: &str,
) -> Result<Vec<Candidate<'a>>, DispatchError> {
    let matched: Vec<_> = candidates
        .into_iter()
        .filter_map(|mut candidate| {
            candidate.args = candidate.method.template().matches(path)?;
            Some(candidate)
        })
        .collect();

    if matched.is_empty() {
        return Err(DispatchError::NotFound(format!("no method matches {path}")));
    }
    Ok(matched)
}

/// Keep candidates able to consume `content_type`.
///
/// A candidate's declared list (or `defaults` when it declares none) may hold
/// ranges such as `text/*`. Without a content type this stage keeps every
/// candidate and leaves their consumes unset.
///
/// # Errors
/// [`DispatchError::UnsupportedMediaType`] when no candidate qualifies.
pub fn filter_by_consumes<'a>(
    candidates: Vec<Candidate<'a>>,
    content_type: Option<&MediaType>,
    defaults: &[MediaType],
) -> Result<Vec<Candidate<'a>>, DispatchError> {
    let Some(content_type) = content_type else {
        return Ok(candidates);
    };

    let matched: Vec<_> = candidates
        .into_iter()
        .filter_map(|mut candidate| {
            let method = candidate.method;
            let accepted = declared_or(method.consumes(), defaults)
                .iter()
                .any(|declared| declared.matches(content_type));
            accepted.then(|| {
                candidate.consumes = Some(vec![content_type.clone()]);
                candidate
            })
        })
        .collect();

    if matched.is_empty() {
        return Err(DispatchError::UnsupportedMediaType(content_type.to_string()));
    }
    Ok(matched)
}

/// Keep candidates producing something the client accepts, rating each.
///
/// With no Accept preferences every candidate keeps its full declared list
/// (or `defaults`) and gets [`ACCEPT_ANY_RATING`].
///
/// # Errors
/// [`DispatchError::NotAcceptable`] when no candidate qualifies.
pub fn filter_by_produces<'a>(
    candidates: Vec<Candidate<'a>>,
    accept: &[MediaType],
    defaults: &[MediaType],
) -> Result<Vec<Candidate<'a>>, DispatchError> {
    let matched: Vec<_> = candidates
        .into_iter()
        .filter_map(|mut candidate| {
            let method = candidate.method;
            let declared = declared_or(method.produces(), defaults);
            if accept.is_empty() {
                candidate.produces = declared.to_vec();
                candidate.produces_rating = ACCEPT_ANY_RATING;
            } else {
                let (rating, produces) = rate_produces(accept, declared)?;
                candidate.produces = produces;
                candidate.produces_rating = rating;
            }
            Some(candidate)
        })
        .collect();

    if matched.is_empty() {
        let accept: Vec<_> = accept.iter().map(MediaType::as_str).collect();
        return Err(DispatchError::NotAcceptable(accept.join(", ")));
    }
    Ok(matched)
}

/// Rate `produced` against Accept preferences.
///
/// Returns the index of the first preference matching any produced type, and
/// every matching produced type ordered by preference (declaration order
/// within one preference), without duplicates. `None` when nothing matches.
#[must_use]
pub fn rate_produces(
    accept: &[MediaType],
    produced: &[MediaType],
) -> Option<(usize, Vec<MediaType>)> {
    let mut rating = None;
    let mut matched: Vec<MediaType> = Vec::new();
    for (position, range) in accept.iter().enumerate() {
        for media_type in produced.iter().filter(|m| range.matches(m)) {
            rating.get_or_insert(position);
            if !matched.contains(media_type) {
                matched.push(media_type.clone());
            }
        }
    }
    rating.map(|rating| (rating, matched))
}

/// Pick the best candidate: fewest captured arguments, then lowest produces
/// rating. Ties keep declaration order.
#[must_use]
pub fn select_best(mut candidates: Vec<Candidate<'_>>) -> Option<Candidate<'_>> {
    candidates.sort_by_key(|candidate| (candidate.args.len(), candidate.produces_rating));
    candidates.into_iter().next()
}

fn declared_or<'m>(declared: &'m [MediaType], defaults: &'m [MediaType]) -> &'m [MediaType] {
    if declared.is_empty() {
        defaults
    } else {
        declared
    }
}
