//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// A client request that violates one of the intent rules. Always a client error.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("field name must not be empty")]
    EmptyField,
    #[error("invalid field name {0:?}")]
    InvalidField(String),
    #[error("invalid filter operator {0:?}")]
    InvalidOperator(String),
    #[error("invalid sort direction {0:?}, expected ASC or DESC")]
    InvalidDirection(String),
    #[error("invalid limit {0:?}, expected a positive integer")]
    InvalidLimit(String),
    #[error("invalid offset {0:?}, expected a non-negative integer")]
    InvalidOffset(String),
    #[error("filter value for {0:?} must be a scalar")]
    InvalidValue(String),
}

impl ParseError {
    /// Stable machine-readable code reported to the client.
    pub fn code(&self) -> &'static str {
        match self {
            ParseError::EmptyField => "empty_field",
            ParseError::InvalidField(_) => "invalid_field",
            ParseError::InvalidOperator(_) => "invalid_operator",
            ParseError::InvalidDirection(_) => "invalid_direction",
            ParseError::InvalidLimit(_) => "invalid_limit",
            ParseError::InvalidOffset(_) => "invalid_offset",
            ParseError::InvalidValue(_) => "invalid_value",
        }
    }
}

/// Statement construction broke an internal invariant. Not reachable from a parsed intent.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("statement has {placeholders} placeholders but {params} bound values: {sql}")]
    PlaceholderMismatch {
        sql: String,
        placeholders: usize,
        params: usize,
    },
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("store: {0}")]
    Store(#[from] sqlx::Error),
    #[error("query timed out after {0:?}")]
    Timeout(Duration),
    #[error("count query returned no integer 'count' column: {0}")]
    MissingCount(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid table identifier {0:?}")]
    InvalidTable(String),
    #[error("duplicate route name {0:?}")]
    DuplicateRoute(String),
    #[error("route name {0:?} is reserved")]
    ReservedRoute(String),
    #[error("table allow-list is empty")]
    NoTables,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
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
        let (status, code, message) = match &self {
            AppError::Parse(e) => (StatusCode::BAD_REQUEST, e.code(), e.to_string()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found", self.to_string()),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request", self.to_string()),
            AppError::Config(_) => {
                tracing::error!(error = %self, "configuration error");
                (StatusCode::INTERNAL_SERVER_ERROR, "config_error", "server misconfigured".to_string())
            }
            AppError::Build(_) => {
                tracing::error!(error = %self, "statement build failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error".to_string())
            }
            AppError::Execution(ExecutionError::Timeout(_)) => {
                tracing::error!(error = %self, "query timed out");
                (StatusCode::GATEWAY_TIMEOUT, "timeout", "query timed out".to_string())
            }
            AppError::Execution(_) => {
                tracing::error!(error = %self, "query execution failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "execution_error", "query execution failed".to_string())
            }
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
