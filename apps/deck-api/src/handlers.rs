//! HTTP handlers for the deck API

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use deck_core::PPTX_CONTENT_TYPE;

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Liveness message
pub async fn home() -> &'static str {
    "Deck personalization service is running"
}

/// Health check endpoint
pub async fn health() -> &'static str {
    "OK"
}

/// Personalize a template and return it in the requested output mode
pub async fn generate(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GenerateQuery>, QueryRejection>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let Json(req) = payload.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::InvalidRequest(e.body_text())
        }
    })?;
    let mode = query.output.unwrap_or(state.config.output_mode);
    let file_name = req.file_name();

    let logo = req.logo_bytes()?;
    let template = load_template(&state, &req).await?;
    let fields = req.fields();

    tracing::info!(
        file_name = %file_name,
        mode = %mode,
        template_bytes = template.len(),
        logo_bytes = logo.as_ref().map(Vec::len),
        "Generating presentation"
    );

    let personalizer = state.personalizer;
    let personalized = tokio::task::spawn_blocking(move || {
        personalizer.apply_with_report(&template, &fields, logo.as_deref())
    })
    .await
    .context("Personalization task did not complete")??;
    let bytes = personalized.bytes;

    match mode {
        OutputMode::Base64 => Ok(Json(GenerateResponse {
            status: "ok".to_string(),
            file_name,
            file_content: BASE64.encode(&bytes),
        })
        .into_response()),
        OutputMode::Download => {
            let disposition = content_disposition(&file_name)?;
            Ok((
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(PPTX_CONTENT_TYPE)),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response())
        }
        OutputMode::Upload => {
            let storage = state.storage.as_ref().ok_or(ApiError::StorageNotConfigured)?;
            let path = storage.config().output_path(&file_name);
            let uploaded = storage.upload(&path, bytes, PPTX_CONTENT_TYPE).await?;
            tracing::info!(path = %path, url = %uploaded.url, "Stored presentation");
            Ok(Json(UploadResponse {
                status: "ok".to_string(),
                file_name,
                url: uploaded.url,
            })
            .into_response())
        }
    }
}

/// Inline template first, then the drive (explicit path or configured default)
async fn load_template(state: &AppState, req: &GenerateRequest) -> Result<Vec<u8>, ApiError> {
    if let Some(template) = req.inline_template()? {
        return Ok(template);
    }

    let requested = req
        .template_path
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty());

    match &state.storage {
        Some(storage) => {
            let path = requested
                .map(str::to_string)
                .or_else(|| storage.config().template_path.clone())
                .ok_or_else(|| {
                    ApiError::MissingInput(format!(
                        "Missing template: send {} or {}",
                        FIELD_TEMPLATE_BASE64, FIELD_TEMPLATE_PATH
                    ))
                })?;
            storage.download(&path).await.map_err(ApiError::TemplateFetch)
        }
        None if requested.is_some() => Err(ApiError::MissingInput(format!(
            "{} requires document storage; send {} instead",
            FIELD_TEMPLATE_PATH, FIELD_TEMPLATE_BASE64
        ))),
        None => Err(ApiError::MissingInput(format!(
            "Missing template: {} is required",
            FIELD_TEMPLATE_BASE64
        ))),
    }
}

/// `attachment; filename="<name>"` with characters that cannot appear in a
/// quoted header value removed
pub fn content_disposition(file_name: &str) -> Result<HeaderValue, ApiError> {
    let safe: String = file_name
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '"' || c == '\\' { '_' } else { c })
        .collect();
    HeaderValue::from_bytes(format!("attachment; filename=\"{}\"", safe).as_bytes())
        .context("Invalid Content-Disposition header")
        .map_err(ApiError::from)
}
