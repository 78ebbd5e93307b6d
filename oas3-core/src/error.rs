use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Config file missing, unreadable, or structurally invalid. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] figment::Error),
}

/// OpenAPI document missing, unparsable, or declaring an operation the compiler
/// cannot safely expose. Fatal at startup.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load OpenAPI document {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    #[error("operation {operation_id:?} parameter {name:?} has no schema")]
    MissingSchema { operation_id: String, name: String },
    #[error("operation {operation_id:?} parameter {name:?} has no value")]
    MissingValue { operation_id: String, name: String },
    #[error("operation {operation_id:?} has an invalid compiled schema: {reason}")]
    InvalidSchema { operation_id: String, reason: String },
}

/// `HandleFunc`/`Handle` called for an id the document never declared. Returned
/// to the caller, never fatal.
#[derive(Debug, Error)]
pub enum BindError {
    #[error("unknown operation id: {0}")]
    UnknownOperation(String),
}

/// Per-request parameter validation failure. Mapped to `400 Bad Request`.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("parameter validation failed: {0}")]
    Validation(String),
}

/// `oas3.model` requested in a representation the server does not produce.
/// Mapped to `415 Unsupported Media Type`.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported media type: {0}")]
    Unsupported(String),
    #[error("failed to render document: {0}")]
    Render(#[source] anyhow::Error),
}

/// Listener bind or serve-loop failure.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Aggregate startup error surfaced from `Config::load` / `Server::new`.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        tracing::warn!(error = %self, "request validation failed");
        let body = ErrorBody {
            code: "bad_request",
            message: &self.to_string(),
        };
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

impl IntoResponse for MediaError {
    fn into_response(self) -> Response {
        let status = match &self {
            MediaError::Unsupported(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            MediaError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        tracing::warn!(error = %self, "built-in endpoint failed");
        let body = ErrorBody {
            code: if status == StatusCode::UNSUPPORTED_MEDIA_TYPE {
                "unsupported_media_type"
            } else {
                "internal_error"
            },
            message: &self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl IntoResponse for BindError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            code: "not_found",
            message: &self.to_string(),
        };
        (StatusCode::NOT_FOUND, Json(body)).into_response()
    }
}
