//! Pre-dispatch request validation: identifier shape and payload emptiness,
//! checked before any store call.

use crate::error::ResourceError;
use crate::resource::ResourceRequest;
use crate::service::id;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

/// Per-verb rules. No I/O, no side effects; anything not covered is a
/// valid request.
pub fn validate(verb: Verb, request: &ResourceRequest) -> Result<(), ResourceError> {
    let id = request.id.as_deref();
    if verb == Verb::Get {
        if let Some(id) = id {
            if !id::is_valid(id) {
                return Err(ResourceError::InvalidId);
            }
        }
    }
    if matches!(verb, Verb::Put | Verb::Delete) && !id.is_some_and(id::is_valid) {
        return Err(ResourceError::InvalidId);
    }
    if matches!(verb, Verb::Put | Verb::Post)
        && request.body.as_ref().map_or(true, |body| body.is_empty())
    {
        return Err(ResourceError::EmptyRequestBody);
    }
    Ok(())
}
