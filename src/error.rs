//! Error taxonomy for the practice core.
//!
//! Three terminal classes: a card id that does not resolve, a caller mistake,
//! and a record-store failure. Nothing in the core retries or recovers; every
//! operation surfaces the first error it hits.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Failures raised at the record-store boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The id does not resolve to any stored card.
    #[error("no card with id {0}")]
    MissingCard(String),
    /// The backend could not complete a read or write.
    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Caller-facing errors for every practice operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Card id (or owner/card pair) does not resolve.
    #[error("card not found: {0}")]
    NotFound(String),
    /// The caller supplied an unusable parameter.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The record store failed mid-operation. Passed through unchanged.
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        match e {
            // Id-resolution failures keep their class no matter which
            // operation noticed them.
            StoreError::MissingCard(id) => Error::NotFound(id),
            other => Error::Store(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorOut {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Error::Store(_) => StatusCode::BAD_GATEWAY,
        };
        (status, Json(ErrorOut { error: self.to_string() })).into_response()
    }
}
