//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Closed set of request/storage failures. Every variant is a fixed
/// (status, message) pair shared by all resources; comparing two
/// descriptors is a plain value comparison.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceError {
    #[error("Id should be a string of 24 hex characters.")]
    InvalidId,
    #[error("Request body cannot be empty.")]
    EmptyRequestBody,
    #[error("resource not found")]
    ResourceNotFound,
    #[error("Failed to connect to database.")]
    DbUnavailable,
    #[error("Unexpected server error.")]
    UnexpectedError,
}

impl ResourceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ResourceError::InvalidId | ResourceError::EmptyRequestBody => StatusCode::BAD_REQUEST,
            ResourceError::ResourceNotFound => StatusCode::NOT_FOUND,
            ResourceError::DbUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ResourceError::UnexpectedError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Fixed body message. Not-found responses carry no body.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            ResourceError::InvalidId => Some("Id should be a string of 24 hex characters."),
            ResourceError::EmptyRequestBody => Some("Request body cannot be empty."),
            ResourceError::ResourceNotFound => None,
            ResourceError::DbUnavailable => Some("Failed to connect to database."),
            ResourceError::UnexpectedError => Some("Unexpected server error."),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub message: &'static str,
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        match self.message() {
            Some(message) => (self.status(), Json(ErrorBody { message })).into_response(),
            None => self.status().into_response(),
        }
    }
}
