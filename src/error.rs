//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config read: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("endpoint name must not be empty")]
    EmptyEndpointName,
    #[error("duplicate endpoint name: {0}")]
    DuplicateEndpoint(String),
}

/// Failure while enumerating or describing catalog objects. Scoped to one
/// endpoint: the caller logs it and skips that endpoint's registration.
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("connect: {0}")]
    Connect(String),
    #[error("catalog query: {0}")]
    Catalog(#[from] tiberius::error::Error),
}

impl From<bb8_tiberius::Error> for DiscoveryError {
    fn from(e: bb8_tiberius::Error) -> Self {
        DiscoveryError::Connect(e.to_string())
    }
}

impl From<bb8::RunError<bb8_tiberius::Error>> for DiscoveryError {
    fn from(e: bb8::RunError<bb8_tiberius::Error>) -> Self {
        DiscoveryError::Connect(e.to_string())
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("database: {0}")]
    Db(#[from] tiberius::error::Error),
    #[error("execution: {0}")]
    Execution(String),
}

impl From<bb8::RunError<bb8_tiberius::Error>> for AppError {
    fn from(e: bb8::RunError<bb8_tiberius::Error>) -> Self {
        AppError::Execution(e.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Db(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::Execution(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
