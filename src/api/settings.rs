//! Global settings endpoints. Mounted behind `require_admin`.

use axum::{Json, body::Bytes, extract::State};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::validation::validate_settings_form;
use super::{ApiError, ApiResponse, AppState, CountResponse};
use crate::services::SettingEntry;

#[derive(Debug, Default, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub key: Option<String>,
}

/// GET /admin/settings
pub async fn list_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<SettingEntry>>>, ApiError> {
    let entries = state.settings_service().list_entries().await?;
    Ok(Json(ApiResponse::success(entries)))
}

/// PUT /admin/settings
///
/// Keys outside the schema that were never stored are skipped.
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(form): Json<BTreeMap<String, Value>>,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let values = validate_settings_form(&form)?;
    let count = state.settings_service().save_bulk(values).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}

/// POST /admin/settings/reset
///
/// Resets one key when `key` is given, every schema key otherwise.
pub async fn reset_settings(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    let request: ResetRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ResetRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::validation(format!("Invalid reset request: {e}")))?
    };
    let key = request
        .key
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let count = state.settings_service().reset_to_default(key).await?;
    Ok(Json(ApiResponse::success(CountResponse { count })))
}
