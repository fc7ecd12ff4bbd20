//! HTTP error responses for the web adapter.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::domain::error::GapError;

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

pub fn status_from_error(err: &GapError) -> StatusCode {
    match err {
        GapError::InvalidParameter { .. }
        | GapError::ConfigMissing { .. }
        | GapError::ConfigInvalid { .. }
        | GapError::ConfigParse { .. } => StatusCode::BAD_REQUEST,
        GapError::InsufficientData { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        GapError::Upstream { .. } | GapError::Decode { .. } => StatusCode::BAD_GATEWAY,
        GapError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<GapError> for WebError {
    fn from(err: GapError) -> Self {
        Self::new(status_from_error(&err), err.to_string())
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: &self.message,
        };
        (self.status, Json(body)).into_response()
    }
}
