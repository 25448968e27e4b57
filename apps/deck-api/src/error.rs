//! Error types for the deck API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use deck_core::PersonalizeError;
use drive_storage::StorageError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    MissingInput(String),

    #[error("Invalid base64 in {field}: {source}")]
    Decode {
        field: &'static str,
        source: base64::DecodeError,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("Could not fetch template: {0}")]
    TemplateFetch(StorageError),

    #[error(transparent)]
    Personalize(#[from] PersonalizeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("Document storage is not configured")]
    StorageNotConfigured,

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput(_)
            | ApiError::Decode { .. }
            | ApiError::InvalidRequest(_)
            | ApiError::TemplateFetch(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Personalize(_)
            | ApiError::Storage(_)
            | ApiError::StorageNotConfigured
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!(error = %message, "Request failed");
        } else {
            tracing::warn!(error = %message, "Rejected request");
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
