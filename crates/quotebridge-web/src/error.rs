use std::net::SocketAddr;

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use quotebridge_core::{SourceError, ValidationError};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

/// Gateway failure surfaced to an HTTP caller.
///
/// Every error kind maps to 400 with `{"detail": message}`; callers are not
/// told which upstream condition occurred beyond the message.
#[derive(Debug)]
pub struct ApiError(pub SourceError);

impl From<SourceError> for ApiError {
    fn from(error: SourceError) -> Self {
        Self(error)
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self(error.into())
    }
}

/// Unreadable or incomplete JSON bodies are reported like any other bad input.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(SourceError::invalid_input(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!(code = self.0.code(), message = self.0.message(), "request failed");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "detail": self.0.message() })),
        )
            .into_response()
    }
}

/// Server start-up errors mapped to exit codes.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

impl ServerError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Bind { .. } => 2,
            Self::Serve(_) => 10,
        }
    }
}
