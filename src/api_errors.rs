use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::errors::MembraneError;

/// Error returned by the JSON endpoints
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }
}

#[derive(Serialize)]
struct ErrBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, msg) = match &self {
            ApiError::BadRequest(s) => (StatusCode::BAD_REQUEST, s),
            ApiError::Internal(s) => (StatusCode::INTERNAL_SERVER_ERROR, s),
        };
        (code, Json(ErrBody { error: msg.clone() })).into_response()
    }
}

impl From<MembraneError> for ApiError {
    fn from(err: MembraneError) -> Self {
        match err {
            MembraneError::Validation { field, message } => {
                ApiError::BadRequest(format!("Validation error for {field}: {message}"))
            }
            e => ApiError::Internal(e.to_string()),
        }
    }
}
